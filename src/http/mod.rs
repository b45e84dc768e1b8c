//! HTTP Layer
//!
//! Thin REST glue over the message service. No business rules live here:
//! handlers deserialize inputs, call the service, and map the error taxonomy
//! to status codes.
//!
//! | Operation | Route                  | Success | Failure    |
//! |-----------|------------------------|---------|------------|
//! | Create    | POST /messages         | 201     | 400        |
//! | List      | GET /messages          | 200     | 400        |
//! | GetById   | GET /messages/{id}     | 200     | 404        |
//! | Update    | PUT /messages/{id}     | 200     | 404 or 400 |
//! | Delete    | DELETE /messages/{id}  | 200     | 404        |

mod handlers;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::service::MessageService;
use crate::CorkboardError;

/// Build the application router over a shared service
pub fn build_router(service: Arc<MessageService>, config: &Config) -> Router {
    Router::new()
        .route(
            "/messages",
            get(handlers::list_messages).post(handlers::create_message),
        )
        .route(
            "/messages/{id}",
            get(handlers::get_message)
                .put(handlers::update_message)
                .delete(handlers::delete_message),
        )
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Response-side wrapper mapping the error taxonomy to status codes
pub struct ApiError(CorkboardError);

impl From<CorkboardError> for ApiError {
    fn from(err: CorkboardError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            CorkboardError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "errors": errors })),
            )
                .into_response(),
            err @ CorkboardError::NotFound { .. } => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response(),
            err => {
                // Fatal class: log the detail, leak nothing to the client
                tracing::error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
