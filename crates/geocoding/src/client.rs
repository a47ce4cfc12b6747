use std::env;
use std::fmt::Write as _;

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use tokio::sync::RwLock;

use chrono::Local;

use crate::{model::FeatureCollection, GeocodeError, Geocoder, ResolvedPlace};

pub const MAPBOX_GEOCODING_URL: &str =
    "https://api.mapbox.com/geocoding/v5/mapbox.places";

/// Where the provider token comes from. The token never ships with the
/// client build; it is either read from the server's environment or fetched
/// from a shielding endpoint per request.
#[derive(Clone, Debug)]
pub enum TokenSource {
    Env(String),
    Proxy { endpoint: String },
}

impl TokenSource {
    /// `MAPBOX_ACCESS_TOKEN` wins over `GEOCODER_TOKEN_ENDPOINT`.
    pub fn from_env() -> Option<Self> {
        if let Ok(token) = env::var("MAPBOX_ACCESS_TOKEN") {
            return Some(Self::Env(token));
        }
        env::var("GEOCODER_TOKEN_ENDPOINT")
            .ok()
            .map(|endpoint| Self::Proxy { endpoint })
    }

    async fn token(&self, http: &reqwest::Client) -> Result<String, GeocodeError> {
        match self {
            Self::Env(token) => Ok(token.clone()),
            Self::Proxy { endpoint } => {
                #[derive(Deserialize)]
                struct TokenResponse {
                    token: String,
                }
                let response = http.post(endpoint).send().await?;
                if response.status() != reqwest::StatusCode::OK {
                    return Err(GeocodeError::TokenUnavailable(format!(
                        "endpoint returned {}",
                        response.status()
                    )));
                }
                let body: TokenResponse = response.json().await?;
                Ok(body.token)
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct GeocoderCredentials {
    pub token_source: TokenSource,
    pub rate_limit_per_minute: Option<u64>,
}

struct GeocoderState {
    available_requests: u64,
    last_refill: chrono::DateTime<Local>,
}

/// Forward-geocoding client for the Mapbox places API, with an optional
/// per-minute request budget so address typing cannot exhaust the account.
pub struct MapboxGeocoder {
    pub credentials: GeocoderCredentials,
    http: reqwest::Client,
    state: RwLock<GeocoderState>,
}

impl MapboxGeocoder {
    pub fn new(credentials: GeocoderCredentials) -> Self {
        Self {
            state: RwLock::new(GeocoderState {
                available_requests: credentials.rate_limit_per_minute.unwrap_or(0),
                last_refill: chrono::offset::Local::now(),
            }),
            credentials,
            http: reqwest::Client::new(),
        }
    }

    async fn try_decrement_available_requests(&self) -> Result<(), GeocodeError> {
        if let Some(rate_limit_minutes) = self.credentials.rate_limit_per_minute {
            let mut state = self.state.write().await;

            let minutes_since_last_refill =
                (chrono::offset::Local::now() - state.last_refill).num_minutes();
            if minutes_since_last_refill >= 1 {
                state.available_requests = rate_limit_minutes;
                state.last_refill = chrono::offset::Local::now();
            }

            if state.available_requests != 0 {
                state.available_requests -= 1;
            } else {
                return Err(GeocodeError::RateLimitReached);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Geocoder for MapboxGeocoder {
    async fn resolve(
        &self,
        address: &str,
    ) -> Result<Option<ResolvedPlace>, GeocodeError> {
        self.try_decrement_available_requests().await?;

        let token = self.credentials.token_source.token(&self.http).await?;
        let url = format!(
            "{}/{}.json?access_token={}&limit=1",
            MAPBOX_GEOCODING_URL,
            encode_path_segment(address),
            token
        );
        debug!("geocoding '{}'", address);

        let response = self.http.get(&url).send().await?;
        match response.status() {
            reqwest::StatusCode::OK => {
                let collection: FeatureCollection = response.json().await?;
                Ok(collection
                    .into_best_match()
                    .map(|feature| feature.into_resolved()))
            }
            other => match response.text().await {
                Ok(val) => Err(GeocodeError::InvalidResponse {
                    status_code: other,
                    url,
                    response: Some(val),
                }),
                Err(_) => Err(GeocodeError::InvalidResponse {
                    status_code: other,
                    url,
                    response: None,
                }),
            },
        }
    }
}

/// Percent-encodes a free-text address for use as a URL path segment.
fn encode_path_segment(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => {
                let _ = write!(&mut out, "%{:02X}", byte);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_segment_encoding() {
        assert_eq!(encode_path_segment("1 Main St"), "1%20Main%20St");
        assert_eq!(encode_path_segment("a/b?c"), "a%2Fb%3Fc");
        assert_eq!(encode_path_segment("plain-text_1.0~x"), "plain-text_1.0~x");
    }

    #[test]
    fn test_non_ascii_is_utf8_encoded() {
        assert_eq!(encode_path_segment("Köln"), "K%C3%B6ln");
    }

    #[tokio::test]
    async fn test_rate_limit_budget_is_enforced() {
        let geocoder = MapboxGeocoder::new(GeocoderCredentials {
            token_source: TokenSource::Env("test-token".to_owned()),
            rate_limit_per_minute: Some(2),
        });

        assert!(geocoder.try_decrement_available_requests().await.is_ok());
        assert!(geocoder.try_decrement_available_requests().await.is_ok());
        match geocoder.try_decrement_available_requests().await {
            Err(GeocodeError::RateLimitReached) => {}
            other => panic!("expected rate limit error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_budget_means_no_limit() {
        let geocoder = MapboxGeocoder::new(GeocoderCredentials {
            token_source: TokenSource::Env("test-token".to_owned()),
            rate_limit_per_minute: None,
        });
        for _ in 0..100 {
            assert!(geocoder.try_decrement_available_requests().await.is_ok());
        }
    }
}
