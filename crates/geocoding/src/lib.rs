use std::error;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

pub mod client;
pub mod model;
pub mod place;

/// A resolved free-text address. `city` and `country` fall back to
/// `"unknown"` when the provider returns no usable component.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPlace {
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub country: String,
}

/// Interchangeable geocoding backends. "No match" is `Ok(None)`, never an
/// error; transport failures are errors and must not block further typing on
/// the caller's side. Callers are expected to length-gate their queries.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(
        &self,
        address: &str,
    ) -> Result<Option<ResolvedPlace>, GeocodeError>;
}

#[derive(Debug, Clone)]
pub enum GeocodeError {
    RequestError(Arc<reqwest::Error>),
    JsonError(Arc<serde_json::Error>),
    InvalidResponse {
        status_code: reqwest::StatusCode,
        url: String,
        response: Option<String>,
    },
    RateLimitReached,
    TokenUnavailable(String),
}

impl error::Error for GeocodeError {}

impl fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GeocodeError::RequestError(e) => write!(f, "HTTP request error: {}", e),
            GeocodeError::JsonError(e) => write!(f, "JSON parse error: {}", e),
            GeocodeError::InvalidResponse {
                status_code,
                url,
                response,
            } => match response {
                Some(text) => {
                    write!(f, "Invalid Response ({}) {}: {}", status_code, url, text)
                }
                None => write!(f, "Invalid Response ({}) {}", status_code, url),
            },
            GeocodeError::RateLimitReached => write!(f, "Rate limit reached."),
            GeocodeError::TokenUnavailable(why) => {
                write!(f, "Geocoding token unavailable: {}", why)
            }
        }
    }
}

impl From<reqwest::Error> for GeocodeError {
    fn from(e: reqwest::Error) -> Self {
        GeocodeError::RequestError(Arc::new(e))
    }
}

impl From<serde_json::Error> for GeocodeError {
    fn from(e: serde_json::Error) -> Self {
        GeocodeError::JsonError(Arc::new(e))
    }
}
