use crate::models::Document;
use crate::startup::AppState;
use axum::{
    async_trait,
    extract::{FromRequest, Request, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use service_core::error::AppError;

/// JSON object request body. A body over the router's size limit is
/// `PayloadTooLarge`; every other decoding failure, including a missing body
/// or content type, is `MalformedInput`.
pub struct JsonDocument(pub Document);

#[async_trait]
impl<S> FromRequest<S> for JsonDocument
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(document) = Json::<Document>::from_request(req, state)
            .await
            .map_err(|rejection| {
                let message = anyhow::anyhow!(rejection.body_text());
                if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    AppError::PayloadTooLarge(message)
                } else {
                    AppError::MalformedInput(message)
                }
            })?;
        Ok(Self(document))
    }
}

pub async fn list_documents(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let documents = state.store.find_all().await?;
    tracing::debug!(count = documents.len(), "Listing documents");
    Ok((StatusCode::OK, Json(documents)))
}

pub async fn insert_document(
    State(state): State<AppState>,
    JsonDocument(document): JsonDocument,
) -> Result<impl IntoResponse, AppError> {
    state.store.insert(document).await?;
    metrics::counter!("documents_inserted_total").increment(1);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "Data inserted" })),
    ))
}
