//! Client for the hosted identity service. Authentication itself is
//! delegated entirely; this crate only maps a session's access token to the
//! user id behind it.

use std::{env, error, fmt, sync::Arc};

use log::debug;
use prayer_spots::auth::Identity;
use serde::Deserialize;

#[derive(Debug, Clone)]
pub enum AuthApiError {
    RequestError(Arc<reqwest::Error>),
    InvalidResponse {
        status_code: reqwest::StatusCode,
        url: String,
    },
}

impl error::Error for AuthApiError {}

impl fmt::Display for AuthApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthApiError::RequestError(e) => write!(f, "HTTP request error: {}", e),
            AuthApiError::InvalidResponse { status_code, url } => {
                write!(f, "Invalid Response ({}) {}", status_code, url)
            }
        }
    }
}

impl From<reqwest::Error> for AuthApiError {
    fn from(e: reqwest::Error) -> Self {
        AuthApiError::RequestError(Arc::new(e))
    }
}

#[derive(Clone, Debug)]
pub struct IdentityCredentials {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl IdentityCredentials {
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("AUTH_BASE_URL").ok()?;
        let api_key = env::var("AUTH_API_KEY").ok();
        Some(Self { base_url, api_key })
    }
}

/// Wire shape of the identity service's current-user endpoint.
#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
}

pub struct HostedIdentityClient {
    credentials: IdentityCredentials,
    http: reqwest::Client,
}

impl HostedIdentityClient {
    pub fn new(credentials: IdentityCredentials) -> Self {
        Self {
            credentials,
            http: reqwest::Client::new(),
        }
    }

    /// Resolves an access token to the user behind it. An expired or
    /// malformed token is `Ok(None)`, not an error: the caller treats it the
    /// same as no session at all.
    pub async fn current_user(
        &self,
        access_token: &str,
    ) -> Result<Option<Identity>, AuthApiError> {
        let url = format!("{}/auth/v1/user", self.credentials.base_url);
        let mut request = self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {}", access_token));
        if let Some(api_key) = &self.credentials.api_key {
            request = request.header("apikey", api_key);
        }

        let response = request.send().await?;
        match response.status() {
            reqwest::StatusCode::OK => {
                let user: UserResponse = response.json().await?;
                debug!("session resolved to user {}", user.id);
                Ok(Some(Identity::new(user.id)))
            }
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Ok(None)
            }
            other => Err(AuthApiError::InvalidResponse {
                status_code: other,
                url,
            }),
        }
    }
}
