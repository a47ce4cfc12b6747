use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, on, post},
    Extension, Json, Router,
};
use database::PgDatabase;
use itertools::Itertools;
use model::{
    profile::Profile,
    spot::{PrayerSpot, SpotDraft},
    WithDistance, WithId,
};
use prayer_spots::{
    auth::{Identity, SIGN_IN_ROUTE},
    client::Client,
    renderer::{popup_for, ModerationAction},
};
use serde::Deserialize;
use tower_cookies::CookieManagerLayer;
use utility::{id::Id, let_also::LetAlso};

use crate::{
    common::{
        route_not_found, schema, schema_no_example, HateoasResult,
        RouteErrorResponse, RouteResult, VecResponse, METHOD_FILTER_ALL,
    },
    hateoas,
    middleware::{
        base_url::{base_url_middleware, BaseUrl},
        session::{session_middleware, Session},
    },
    WebState,
};

macro_rules! resource {
    ($($arg:tt)*) => {
        crate::api::v1::resource!("/spots{}", format_args!($($arg)*))
    };
}
pub(crate) use resource;

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route("/schema", get(schema::<PrayerSpot>))
        .route("/schema/draft", get(schema_no_example::<SpotDraft>))
        .route("/", get(get_spots).post(create_spot))
        .route("/countries", get(get_countries))
        .route("/nearby", get(nearby))
        .route("/slug/:country/:city/:name", get(get_spot_by_slug))
        .route("/:id/delete", post(delete_spot))
        .route("/:id/restore", post(restore_spot))
        .layer(axum::middleware::from_fn(base_url_middleware))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .layer(CookieManagerLayer::new())
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

async fn get_spots(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { spots_client, .. }): State<WebState>,
    Extension(session): Extension<Session>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<VecResponse<hateoas::Response<WithId<PrayerSpot>>>> {
    let profile = viewer_profile(&spots_client, session.identity.as_ref()).await;
    spots_client
        .list()
        .await
        .map(|spots| {
            spots
                .into_iter()
                .map(|spot| {
                    spot_hateoas(
                        spot,
                        base_url.clone(),
                        session.identity.as_ref().map(|i| (i, profile.as_ref())),
                    )
                })
                .collect::<Vec<_>>()
                .let_owned(|data| VecResponse::non_paginated(data).hateoas().json())
        })
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::GET)
                .with_uri(original_uri.path())
        })
}

async fn get_spot_by_slug(
    OriginalUri(original_uri): OriginalUri,
    Path((country, city, name)): Path<(String, String, String)>,
    State(WebState { spots_client, .. }): State<WebState>,
    Extension(session): Extension<Session>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<WithId<PrayerSpot>> {
    let slug = format!("{}/{}/{}", country, city, name);
    let spot = spots_client.get_by_slug(&slug).await.map_err(|why| {
        RouteErrorResponse::from(why)
            .with_method(&Method::GET)
            .with_uri(original_uri.path())
    })?;
    match spot {
        Some(spot) => {
            let profile =
                viewer_profile(&spots_client, session.identity.as_ref()).await;
            Ok(spot_hateoas(
                spot,
                base_url,
                session.identity.as_ref().map(|i| (i, profile.as_ref())),
            )
            .json())
        }
        None => Err(RouteErrorResponse::not_found(
            &Method::GET,
            original_uri.path(),
        )),
    }
}

async fn create_spot(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { spots_client, .. }): State<WebState>,
    Extension(session): Extension<Session>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
    Json(draft): Json<SpotDraft>,
) -> Response {
    let identity = match &session.identity {
        Some(identity) => identity.clone(),
        None => return Redirect::to(SIGN_IN_ROUTE).into_response(),
    };
    match spots_client.create(&draft, &identity).await {
        Ok(created) => {
            let profile = viewer_profile(&spots_client, Some(&identity)).await;
            let body =
                spot_hateoas(created, base_url, Some((&identity, profile.as_ref())));
            (StatusCode::CREATED, body.json()).into_response()
        }
        Err(why) => RouteErrorResponse::from(why)
            .with_method(&Method::POST)
            .with_uri(original_uri.path())
            .into_response(),
    }
}

async fn delete_spot(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<String>,
    State(WebState { spots_client, .. }): State<WebState>,
    Extension(session): Extension<Session>,
) -> Response {
    moderate_spot(spots_client, session, id, true, original_uri.path()).await
}

async fn restore_spot(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<String>,
    State(WebState { spots_client, .. }): State<WebState>,
    Extension(session): Extension<Session>,
) -> Response {
    moderate_spot(spots_client, session, id, false, original_uri.path()).await
}

async fn moderate_spot(
    spots_client: Client<PgDatabase>,
    session: Session,
    id: String,
    deleted: bool,
    uri: &str,
) -> Response {
    let identity = match session.identity {
        Some(identity) => identity,
        None => return Redirect::to(SIGN_IN_ROUTE).into_response(),
    };
    let id: Id<PrayerSpot> = Id::new(id);
    let result = if deleted {
        spots_client.soft_delete(&id, &identity).await
    } else {
        spots_client.restore(&id, &identity).await
    };
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(why) => RouteErrorResponse::from(why)
            .with_method(&Method::POST)
            .with_uri(uri)
            .into_response(),
    }
}

/// Distinct countries with at least one spot, for the browse index.
async fn get_countries(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { spots_client, .. }): State<WebState>,
) -> RouteResult<Json<Vec<String>>> {
    spots_client
        .list()
        .await
        .map(|spots| {
            spots
                .into_iter()
                .map(|spot| spot.content.country)
                .unique()
                .sorted()
                .collect::<Vec<_>>()
                .let_owned(Json)
        })
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::GET)
                .with_uri(original_uri.path())
        })
}

#[derive(Deserialize)]
struct NearbyQuery {
    latitude: f64,
    longitude: f64,
    radius: Option<f64>,
}

async fn nearby(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { spots_client, .. }): State<WebState>,
    Query(params): Query<NearbyQuery>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<VecResponse<hateoas::Response<WithDistance<WithId<PrayerSpot>>>>>
{
    spots_client
        .find_nearby(
            params.latitude,
            params.longitude,
            params.radius.unwrap_or(1.0),
        )
        .await
        .map(|spots| {
            spots
                .into_iter()
                .map(|spot| spot_with_distance_hateoas(spot, base_url.clone()))
                .collect::<Vec<_>>()
                .let_owned(|data| VecResponse::non_paginated(data).hateoas().json())
        })
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::GET)
                .with_uri(original_uri.path())
        })
}

/// Profile of the signed-in viewer, if any. Only affects which moderation
/// links show up, so lookup failures degrade to "no profile".
async fn viewer_profile(
    spots_client: &Client<PgDatabase>,
    identity: Option<&Identity>,
) -> Option<Profile> {
    match identity {
        Some(identity) => spots_client
            .profile(&identity.user_id)
            .await
            .ok()
            .flatten()
            .map(|profile| profile.content),
        None => None,
    }
}

fn spot_hateoas(
    spot: WithId<PrayerSpot>,
    base_url: Arc<BaseUrl>,
    viewer: Option<(&Identity, Option<&Profile>)>,
) -> hateoas::Response<WithId<PrayerSpot>> {
    let popup = popup_for(&spot, viewer);
    let (delete_href, restore_href) = match popup.moderation {
        Some(ModerationAction::Delete) => {
            (Some(resource!("/{}/delete", spot.id.raw())), None)
        }
        Some(ModerationAction::Restore) => {
            (None, Some(resource!("/{}/restore", spot.id.raw())))
        }
        None => (None, None),
    };
    let slug = spot.content.slug.clone();
    let latitude = spot.content.latitude;
    let longitude = spot.content.longitude;
    hateoas::Response::builder(spot, base_url)
        .link("self", resource!("/slug/{}", slug))
        .link("page", format!("/{}", slug))
        .link(
            "nearby",
            resource!(
                "/nearby?latitude={}&longitude={}&radius=1",
                latitude,
                longitude
            ),
        )
        .link_option("delete", delete_href)
        .link_option("restore", restore_href)
        .build()
}

fn spot_with_distance_hateoas(
    spot: WithDistance<WithId<PrayerSpot>>,
    base_url: Arc<BaseUrl>,
) -> hateoas::Response<WithDistance<WithId<PrayerSpot>>> {
    let slug = spot.content.content.slug.clone();
    hateoas::Response::builder(spot, base_url)
        .link("self", resource!("/slug/{}", slug))
        .link("page", format!("/{}", slug))
        .build()
}
