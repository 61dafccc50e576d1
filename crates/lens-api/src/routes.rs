use std::sync::Arc;

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::cloudinary::{CloudinaryClient, ImageUpload};
use crate::config::AppConfig;
use crate::error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    cloudinary: Arc<CloudinaryClient>,
}

impl AppState {
    pub fn from_config(config: Arc<AppConfig>) -> Self {
        Self {
            cloudinary: Arc::new(CloudinaryClient::new(config.clone())),
            config,
        }
    }
}

pub fn app_router(state: AppState) -> Router {
    // The proxy surface dispatches on method alone; unsupported methods and
    // unknown paths both fall through to the plain-text 404.
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/",
            post(upload_image)
                .delete(delete_image)
                .options(preflight)
                .fallback(not_found),
        )
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().timestamp(),
    })
}

async fn preflight() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, DELETE, OPTIONS"),
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                "Content-Type, Authorization",
            ),
        ],
    )
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    #[serde(rename = "imageUrl")]
    image_url: String,
    public_id: String,
}

async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    // The only multipart rejection is a missing or malformed multipart
    // content type, which is exactly the first precondition.
    let mut multipart = multipart.map_err(|_| AppError::bad_request("Invalid content type"))?;

    let mut image: Option<ImageUpload> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::bad_request("Invalid multipart form data"))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field.file_name().map(ToString::to_string);
        let content_type = field.content_type().map(ToString::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|_| AppError::bad_request("Invalid multipart form data"))?;
        image = Some(ImageUpload {
            bytes,
            file_name,
            content_type,
        });
        break;
    }
    let image = image.ok_or_else(|| AppError::bad_request("No image provided"))?;

    let image_size = image.bytes.len();
    let uploaded = state.cloudinary.upload(image).await?;
    tracing::info!(
        endpoint = "upload",
        image_size,
        public_id_len = uploaded.public_id.len(),
        "Uploaded image"
    );
    Ok(Json(UploadResponse {
        image_url: uploaded.secure_url,
        public_id: uploaded.public_id,
    }))
}

#[derive(Debug, Deserialize)]
struct DeleteRequest {
    // Optional so that a well-formed body without the field reports the
    // missing identifier instead of a JSON parse failure.
    public_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct DeleteResponse {
    result: &'static str,
}

async fn delete_image(
    State(state): State<AppState>,
    payload: Result<Json<DeleteRequest>, JsonRejection>,
) -> Result<Json<DeleteResponse>, AppError> {
    let Json(request) = payload.map_err(|_| AppError::bad_request("Invalid JSON"))?;
    let public_id = request
        .public_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::bad_request("No public_id provided"))?;

    state.cloudinary.destroy(&public_id).await?;
    tracing::info!(
        endpoint = "delete",
        public_id_len = public_id.len(),
        "Deleted image"
    );
    Ok(Json(DeleteResponse { result: "ok" }))
}
