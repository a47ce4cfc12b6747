use axum::{
    extract::{OriginalUri, State},
    http::{header, HeaderValue, Method, StatusCode},
    routing::{on, post},
    Json, Router,
};
use log::warn;
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{
    common::{route_not_found, RouteErrorResponse, RouteResult, METHOD_FILTER_ALL},
    WebConfig, WebState,
};

/// Key hand-out for the browser-side map SDK. Unlike the geocoding token,
/// this one cannot stay on the server, so the endpoint is scoped to an
/// origin allowlist instead of answering every origin.
pub(crate) fn routes(state: WebState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_origin(allowed_origins(&state.config));

    Router::new()
        .route("/map", post(map_key))
        .layer(cors)
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

fn allowed_origins(config: &WebConfig) -> AllowOrigin {
    let origins = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("ignoring unparsable allowed origin '{}'", origin);
                None
            }
        })
        .collect::<Vec<_>>();
    AllowOrigin::list(origins)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct MapKeyDto {
    key: String,
}

async fn map_key(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { config, .. }): State<WebState>,
) -> RouteResult<Json<MapKeyDto>> {
    match &config.map_provider_key {
        Some(key) => Ok(Json(MapKeyDto { key: key.clone() })),
        None => Err(RouteErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR)
            .with_method(&Method::POST)
            .with_uri(original_uri.path())
            .with_message("Map provider key not configured.")),
    }
}
