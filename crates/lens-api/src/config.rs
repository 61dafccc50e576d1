use std::collections::HashMap;
use std::env;
use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_base_url: String,
    pub cloudinary: CloudinaryCredentials,
}

/// The credential set shared with Cloudinary. The secret is only ever hashed
/// into request signatures; it must never be transmitted or logged.
#[derive(Clone, PartialEq, Eq)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl fmt::Debug for CloudinaryCredentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CloudinaryCredentials")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("api_base_url", &self.api_base_url)
            .field("cloudinary", &self.cloudinary)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = value_or_default(&lookup, "LENS_API_BIND_ADDR", "127.0.0.1:8080");

        let api_base_url = value_or_default(
            &lookup,
            "CLOUDINARY_API_BASE_URL",
            "https://api.cloudinary.com",
        );
        let api_base_url = trim_trailing(&api_base_url).to_string();
        if !is_http_url(&api_base_url) {
            return Err(ConfigError::Invalid(
                "CLOUDINARY_API_BASE_URL must start with http:// or https://".to_string(),
            ));
        }

        let cloud_name = required_trimmed(&lookup, "CLOUDINARY_CLOUD_NAME")?;
        let api_key = required_trimmed(&lookup, "CLOUDINARY_API_KEY")?;
        let api_secret = required_trimmed(&lookup, "CLOUDINARY_API_SECRET")?;

        Ok(Self {
            bind_addr,
            api_base_url,
            cloudinary: CloudinaryCredentials {
                cloud_name,
                api_key,
                api_secret,
            },
        })
    }
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn required_trimmed(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    optional_trimmed(lookup, name).ok_or(ConfigError::MissingVar(name))
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn trim_trailing(value: &str) -> &str {
    value.trim_end_matches('/')
}
