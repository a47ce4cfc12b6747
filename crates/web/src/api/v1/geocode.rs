use axum::{
    extract::{OriginalUri, Query, State},
    http::Method,
    routing::{get, on},
    Json, Router,
};
use prayer_spots::form::MIN_GEOCODE_QUERY_LEN;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    common::{
        route_not_found, schema_no_example, RouteErrorResponse, RouteResult,
        METHOD_FILTER_ALL,
    },
    WebState,
};

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route("/", get(geocode))
        .route("/schema", get(schema_no_example::<GeocodeDto>))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

#[derive(Deserialize)]
struct GeocodeQuery {
    q: String,
}

/// What the address form gets back. `result` is absent when the provider
/// found nothing or the query was too short to bother with.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct GeocodeDto {
    query: String,
    result: Option<ResolvedDto>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ResolvedDto {
    latitude: f64,
    longitude: f64,
    city: String,
    country: String,
}

/// Server-side geocoding. The provider token stays on the server; the
/// browser only ever sees resolved coordinates.
async fn geocode(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { geocoder, .. }): State<WebState>,
    Query(params): Query<GeocodeQuery>,
) -> RouteResult<Json<GeocodeDto>> {
    if params.q.trim().len() < MIN_GEOCODE_QUERY_LEN {
        return Ok(Json(GeocodeDto {
            query: params.q,
            result: None,
        }));
    }

    geocoder
        .resolve(&params.q)
        .await
        .map(|resolved| {
            Json(GeocodeDto {
                result: resolved.map(|place| ResolvedDto {
                    latitude: place.latitude,
                    longitude: place.longitude,
                    city: place.city,
                    country: place.country,
                }),
                query: params.q,
            })
        })
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::GET)
                .with_uri(original_uri.path())
        })
}
