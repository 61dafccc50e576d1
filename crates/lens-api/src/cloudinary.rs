use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use serde::Deserialize;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::signature;

const UPLOAD_FALLBACK: &str = "Cloudinary upload failed";
const DELETE_FALLBACK: &str = "Cloudinary delete failed";

/// Outbound broker for the Cloudinary media API. Owns the HTTP client and
/// builds the signed request bodies; the shared secret never leaves this
/// module except as hash input to [`signature::sign`].
#[derive(Debug, Clone)]
pub struct CloudinaryClient {
    client: reqwest::Client,
    config: Arc<AppConfig>,
}

/// An image extracted from the inbound multipart form, ready to forward.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Bytes,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub secure_url: String,
    pub public_id: String,
}

#[derive(Debug, Deserialize)]
struct UploadApiResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct DestroyApiResponse {
    result: Option<String>,
    error: Option<ApiErrorInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorEnvelope {
    error: Option<ApiErrorInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorInfo {
    message: Option<String>,
}

impl CloudinaryClient {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Forward an image to Cloudinary's upload endpoint with a freshly signed
    /// parameter set.
    pub async fn upload(&self, image: ImageUpload) -> Result<UploadedImage, AppError> {
        let credentials = &self.config.cloudinary;
        let timestamp = Utc::now().timestamp();
        let signature = signature::sign(&signature::upload_params(
            timestamp,
            &credentials.api_secret,
        ));

        let mut file_part = reqwest::multipart::Part::bytes(image.bytes.to_vec())
            .file_name(image.file_name.unwrap_or_else(|| "image".to_string()));
        if let Some(content_type) = image.content_type.as_deref() {
            file_part = file_part.mime_str(content_type).map_err(|error| {
                AppError::bad_request(format!("Invalid image content type: {}", sanitize(&error)))
            })?;
        }

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("api_key", credentials.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature", signature);

        let response = self
            .client
            .post(self.endpoint_url("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|error| {
                tracing::warn!(error = %sanitize(&error), "Cloudinary upload request failed");
                AppError::upstream(UPLOAD_FALLBACK)
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            tracing::warn!(
                status = status.as_u16(),
                body = compact_body(&body),
                "Cloudinary upload rejected"
            );
            return Err(AppError::upstream(error_message(&body, UPLOAD_FALLBACK)));
        }

        let payload: UploadApiResponse = serde_json::from_str(&body)
            .map_err(|_| AppError::upstream(error_message(&body, UPLOAD_FALLBACK)))?;
        Ok(UploadedImage {
            secure_url: payload.secure_url,
            public_id: payload.public_id,
        })
    }

    /// Ask Cloudinary to destroy an uploaded image. Anything other than the
    /// literal `"ok"` result marker counts as an upstream failure.
    pub async fn destroy(&self, public_id: &str) -> Result<(), AppError> {
        let credentials = &self.config.cloudinary;
        let timestamp = Utc::now().timestamp();
        let signature = signature::sign(&signature::destroy_params(
            public_id,
            timestamp,
            &credentials.api_secret,
        ));

        let form = [
            ("public_id", public_id),
            ("api_key", credentials.api_key.as_str()),
            ("timestamp", &timestamp.to_string()),
            ("signature", &signature),
        ];

        let response = self
            .client
            .post(self.endpoint_url("destroy"))
            .form(&form)
            .send()
            .await
            .map_err(|error| {
                tracing::warn!(error = %sanitize(&error), "Cloudinary destroy request failed");
                AppError::upstream(DELETE_FALLBACK)
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let payload: DestroyApiResponse = serde_json::from_str(&body).unwrap_or_default();

        if !status.is_success() || payload.result.as_deref() != Some("ok") {
            tracing::warn!(
                status = status.as_u16(),
                result = payload.result.as_deref().unwrap_or("none"),
                body = compact_body(&body),
                "Cloudinary destroy rejected"
            );
            let message = payload
                .error
                .and_then(|error| error.message)
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| DELETE_FALLBACK.to_string());
            return Err(AppError::upstream(message));
        }
        Ok(())
    }

    fn endpoint_url(&self, action: &str) -> String {
        format!(
            "{}/v1_1/{}/image/{action}",
            self.config.api_base_url, self.config.cloudinary.cloud_name,
        )
    }
}

/// Pull `error.message` out of an upstream body, falling back to the generic
/// message when the body is not JSON or carries no message.
fn error_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|error| error.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

fn sanitize(error: &impl std::fmt::Display) -> String {
    error.to_string().replace('\n', " ").trim().to_string()
}

fn compact_body(body: &str) -> String {
    body.trim().chars().take(180).collect()
}
