//! Route handlers
//!
//! One handler per service operation; success bodies mirror the service's
//! typed results directly.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::message::{CreateMessage, ListMessages, Message, MessagePage, UpdateMessage};
use crate::service::MessageService;

use super::ApiError;

/// POST /messages
pub(super) async fn create_message(
    State(service): State<Arc<MessageService>>,
    Json(input): Json<CreateMessage>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let message = service.create(input)?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /messages?page&limit
pub(super) async fn list_messages(
    State(service): State<Arc<MessageService>>,
    Query(query): Query<ListMessages>,
) -> Result<Json<MessagePage>, ApiError> {
    Ok(Json(service.list(query)?))
}

/// GET /messages/{id}
pub(super) async fn get_message(
    State(service): State<Arc<MessageService>>,
    Path(id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    Ok(Json(service.get(&id)?))
}

/// PUT /messages/{id}
pub(super) async fn update_message(
    State(service): State<Arc<MessageService>>,
    Path(id): Path<String>,
    Json(input): Json<UpdateMessage>,
) -> Result<Json<Message>, ApiError> {
    Ok(Json(service.update(&id, input)?))
}

/// Body of a successful delete
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DeleteResponse {
    message: &'static str,
    deleted_message: Message,
}

/// DELETE /messages/{id}
pub(super) async fn delete_message(
    State(service): State<Arc<MessageService>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let deleted = service.delete(&id)?;
    Ok(Json(DeleteResponse {
        message: "message deleted",
        deleted_message: deleted,
    }))
}
