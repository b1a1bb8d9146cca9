use crate::config::MongoConfig;
use crate::models::Document;
use crate::services::store::DocumentStore;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{self, doc},
    options::{ClientOptions, Credential, FindOptions},
    Client as MongoClient, Collection, Database,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    /// Builds the client handle. The driver connects lazily, so an unreachable
    /// server surfaces on the first operation rather than here.
    pub async fn connect(config: &MongoConfig, app_name: &str) -> Result<Self, AppError> {
        let mut client_options = ClientOptions::parse(&config.uri).await.map_err(|e| {
            tracing::error!("Failed to parse MongoDB connection string: {}", e);
            AppError::from(e)
        })?;
        client_options.app_name = Some(app_name.to_string());

        apply_credentials(&mut client_options, config);

        let client = MongoClient::with_options(client_options).map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(&config.database);
        tracing::info!(database = %config.database, "MongoDB client ready");
        Ok(Self { client, db })
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn collection(&self, name: &str) -> Collection<bson::Document> {
        self.db.collection(name)
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }
}

/// Overrides the username and password from the environment when a user is
/// set. Everything else the connection string specified (auth source,
/// mechanism and its properties) is kept.
fn apply_credentials(client_options: &mut ClientOptions, config: &MongoConfig) {
    let Some(user) = &config.user else {
        return;
    };

    tracing::info!(user = %user, "Using MongoDB credentials from environment");
    let credential = client_options
        .credential
        .get_or_insert_with(Credential::default);
    credential.username = Some(user.clone());
    credential.password = config
        .password
        .as_ref()
        .map(|p| p.expose_secret().clone());
}

/// Stores every document in a single collection.
#[derive(Clone)]
pub struct MongoDocumentStore {
    db: MongoDb,
    collection: Collection<bson::Document>,
}

impl MongoDocumentStore {
    pub fn new(db: MongoDb, collection: &str) -> Self {
        let collection = db.collection(collection);
        Self { db, collection }
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    async fn insert(&self, document: Document) -> Result<(), AppError> {
        let record = document.to_bson()?;
        let result = self.collection.insert_one(record, None).await.map_err(|e| {
            tracing::error!(
                collection = %self.collection.name(),
                "Failed to insert document: {}",
                e
            );
            AppError::from(e)
        })?;
        tracing::debug!(id = %result.inserted_id, "Inserted document");
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<Document>, AppError> {
        let options = FindOptions::builder()
            .projection(doc! { "_id": 0 })
            .build();

        let records: Vec<bson::Document> = self
            .collection
            .find(doc! {}, options)
            .await
            .map_err(AppError::from)?
            .try_collect()
            .await
            .map_err(AppError::from)?;

        records.into_iter().map(Document::from_bson).collect()
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.db.health_check().await
    }
}
