use crate::models::document::{Document, ID_FIELD};
use async_trait::async_trait;
use service_core::error::AppError;
use tokio::sync::RwLock;

/// Persistence seam for the gateway.
///
/// Implementations own identity assignment. A client-supplied `_id` is kept
/// as the identifier, so inserting it twice fails. Documents handed back by
/// `find_all` must not carry the identifier field.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, document: Document) -> Result<(), AppError>;
    async fn find_all(&self) -> Result<Vec<Document>, AppError>;
    async fn health_check(&self) -> Result<(), AppError>;
}

/// Process-local store with the same `_id` rules as MongoDB. Contents are lost
/// on restart.
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<Vec<Document>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, document: Document) -> Result<(), AppError> {
        let mut documents = self.documents.write().await;
        if let Some(id) = document.0.get(ID_FIELD) {
            if documents.iter().any(|d| d.0.get(ID_FIELD) == Some(id)) {
                return Err(AppError::StoreUnavailable(anyhow::anyhow!(
                    "duplicate key error: {} {}",
                    ID_FIELD,
                    id
                )));
            }
        }
        documents.push(document);
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<Document>, AppError> {
        Ok(self
            .documents
            .read()
            .await
            .iter()
            .cloned()
            .map(Document::without_id)
            .collect())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
