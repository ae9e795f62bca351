//! HTTP front end. Both original deployment paths route to the same handler.

use crate::error::RoastError;
use crate::pipeline::{RoastReport, Roaster};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

pub const ROAST_PATHS: [&str; 2] = ["/api/generate-roast", "/.netlify/functions/generate-roast"];

#[derive(Debug, Deserialize)]
pub struct RoastRequest {
    #[serde(default)]
    pub username: Option<String>,
}

/// A JSON `{"error": ...}` body with a status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<RoastError> for ApiError {
    fn from(err: RoastError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            error!(error = %err, "roast request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub fn router(roaster: Roaster) -> Router {
    let mut app = Router::new().route("/health", get(health));
    for path in ROAST_PATHS {
        app = app.route(
            path,
            post(generate_roast)
                .options(preflight)
                .fallback(method_not_allowed),
        );
    }

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(roaster)
}

async fn health() -> &'static str {
    "ok"
}

/// Bare `OPTIONS` requests that the CORS layer doesn't treat as preflight.
async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> ApiError {
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

async fn generate_roast(
    State(roaster): State<Roaster>,
    body: Result<Json<RoastRequest>, JsonRejection>,
) -> Result<Json<RoastReport>, ApiError> {
    let Json(request) =
        body.map_err(|_| ApiError::new(StatusCode::BAD_REQUEST, "Invalid JSON"))?;
    let username = request.username.unwrap_or_default();

    let report = roaster.roast(&username).await?;
    Ok(Json(report))
}
