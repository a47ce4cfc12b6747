use axum::{
    extract::{OriginalUri, Query, Request},
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::MethodFilter,
    Json,
};
use geocoding::GeocodeError;
use model::ExampleData;
use prayer_spots::RequestError;
use schemars::{schema_for, schema_for_value, JsonSchema};
use serde::{Deserialize, Serialize};

use crate::hateoas;

pub type RouteResult<O> = Result<O, RouteErrorResponse>;
pub type HateoasResult<O> = RouteResult<Json<hateoas::Response<O>>>;

/// A `MethodFilter` that matches all http methods.
pub(crate) const METHOD_FILTER_ALL: MethodFilter = MethodFilter::GET
    .or(MethodFilter::POST)
    .or(MethodFilter::PATCH)
    .or(MethodFilter::PUT)
    .or(MethodFilter::DELETE);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub page_size: usize,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VecResponse<T> {
    pub data: Vec<T>,
    pub pagination: Option<Pagination>,
}

impl<T> VecResponse<T> {
    pub fn non_paginated(data: Vec<T>) -> Self {
        Self {
            data,
            pagination: None,
        }
    }

    pub fn hateoas(self) -> hateoas::Response<Self> {
        hateoas::Response::new(self)
    }

    pub fn json(self) -> Json<Self> {
        Json(self)
    }
}

// - Services returning commonly used responses -

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SchemaParams {
    #[serde(default = "Default::default")]
    example_data: bool,
}

pub(crate) async fn schema<T: ExampleData + JsonSchema + Serialize>(
    Query(params): Query<SchemaParams>,
) -> impl IntoResponse {
    if params.example_data {
        Json(schema_for_value!(T::example_data()))
    } else {
        Json(schema_for!(T))
    }
}

pub(crate) async fn schema_no_example<T: JsonSchema + Serialize>(
    Query(_params): Query<SchemaParams>,
) -> impl IntoResponse {
    Json(schema_for!(T))
}

pub(crate) async fn route_not_implemented(
    OriginalUri(original_uri): OriginalUri,
    req: Request,
) -> impl IntoResponse {
    RouteErrorResponse::not_implemented(req.method(), original_uri.path())
}

pub(crate) async fn route_not_found(
    OriginalUri(original_uri): OriginalUri,
    req: Request,
) -> impl IntoResponse {
    RouteErrorResponse::not_found(req.method(), original_uri.path())
}

// - Commonly used responses -

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteErrorResponse {
    #[serde(skip)]
    pub status_code: StatusCode,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_uri: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RouteErrorResponse {
    pub fn new(status_code: StatusCode) -> Self {
        Self {
            status_code,
            http_method: None,
            requested_uri: None,
            message: None,
        }
    }

    pub fn not_implemented(method: &Method, uri: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_IMPLEMENTED)
            .with_method(method)
            .with_uri(uri)
            .with_default_message()
    }

    pub fn not_found(method: &Method, uri: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND)
            .with_method(method)
            .with_uri(uri)
            .with_default_message()
    }

    pub fn with_method(mut self, method: &Method) -> Self {
        self.http_method = Some(method.to_string());
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.requested_uri = Some(uri.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_default_message(self) -> Self {
        let message = self
            .status_code
            .canonical_reason()
            .unwrap_or("something unexpected happened");
        self.with_message(message)
    }
}

impl From<RequestError> for RouteErrorResponse {
    fn from(value: RequestError) -> Self {
        match value {
            RequestError::NotFound => Self::new(StatusCode::NOT_FOUND)
                .with_message("The requested item does not exist."),
            RequestError::Forbidden => Self::new(StatusCode::FORBIDDEN)
                .with_message("You are not allowed to change this record."),
            RequestError::AuthRequired => {
                Self::new(StatusCode::UNAUTHORIZED).with_message("Sign-in required.")
            }
            RequestError::Validation(why) => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY)
                    .with_message(format!("{}", why))
            }
            RequestError::Other(other) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR)
                    .with_message(format!("{}", other))
            }
        }
    }
}

impl From<GeocodeError> for RouteErrorResponse {
    fn from(value: GeocodeError) -> Self {
        match value {
            GeocodeError::RateLimitReached => {
                Self::new(StatusCode::TOO_MANY_REQUESTS).with_default_message()
            }
            other => Self::new(StatusCode::BAD_GATEWAY)
                .with_message(format!("{}", other)),
        }
    }
}

impl IntoResponse for RouteErrorResponse {
    fn into_response(self) -> axum::response::Response {
        (self.status_code, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::spot::DraftError;

    #[test]
    fn test_request_error_status_mapping() {
        assert_eq!(
            RouteErrorResponse::from(RequestError::NotFound).status_code,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            RouteErrorResponse::from(RequestError::Forbidden).status_code,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            RouteErrorResponse::from(RequestError::AuthRequired).status_code,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            RouteErrorResponse::from(RequestError::Validation(
                DraftError::MissingName
            ))
            .status_code,
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_geocode_error_status_mapping() {
        assert_eq!(
            RouteErrorResponse::from(GeocodeError::RateLimitReached).status_code,
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_error_payload_skips_unset_fields() {
        let response =
            RouteErrorResponse::not_found(&Method::GET, "/api/v1/spots/slug/a/b/c");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json.get("message").unwrap(), "Not Found");
        assert_eq!(json.get("requestedUri").unwrap(), "/api/v1/spots/slug/a/b/c");
        // the status code travels in the http layer, not the body
        assert!(json.get("statusCode").is_none());
    }
}
