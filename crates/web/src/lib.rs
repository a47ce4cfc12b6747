pub use crate::common::RouteResult;

use std::{env, sync::Arc};

use axum::{
    extract::FromRef,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, get_service},
    Extension, Router,
};
use database::PgDatabase;
use geocoding::Geocoder;
use identity::HostedIdentityClient;
use prayer_spots::{auth::SIGN_IN_ROUTE, client::Client};
use tokio::net::TcpListener;
use tower_cookies::CookieManagerLayer;
use tower_http::services::{ServeDir, ServeFile};

use crate::middleware::session::{session_middleware, Session};

pub mod api;
pub mod common;
pub mod hateoas;
pub mod middleware;

#[derive(Clone, FromRef)]
pub struct WebState {
    pub spots_client: Client<PgDatabase>,
    pub geocoder: Arc<dyn Geocoder>,
    pub identity_client: Arc<HostedIdentityClient>,
    pub config: Arc<WebConfig>,
}

#[derive(Clone, Debug, Default)]
pub struct WebConfig {
    /// Key handed to the map SDK in the browser. Server-held; only shipped
    /// through the scoped key endpoint.
    pub map_provider_key: Option<String>,
    /// Origins allowed to call the key endpoint. No entry means same-origin
    /// only; a wildcard is deliberately not supported.
    pub allowed_origins: Vec<String>,
}

impl WebConfig {
    pub fn from_env() -> Self {
        let map_provider_key = env::var("MAP_PROVIDER_KEY").ok();
        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|origin| origin.trim().to_owned())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Self {
            map_provider_key,
            allowed_origins,
        }
    }
}

pub async fn start_web_server(state: WebState) -> std::io::Result<()> {
    let pages = Router::new()
        .route("/add", get(add_page))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .layer(CookieManagerLayer::new())
        .with_state(state.clone());

    let routes = Router::new()
        .nest_service("/api", api::routes(state))
        .merge(pages)
        .fallback_service(static_content_router());

    let listener = TcpListener::bind("0.0.0.0:8080").await?;
    axum::serve(listener, routes.into_make_service()).await?;

    Ok(())
}

/// The create form is only reachable with a session; everyone else lands on
/// the sign-in page instead.
async fn add_page(Extension(session): Extension<Session>) -> Response {
    if session.identity.is_none() {
        return Redirect::to(SIGN_IN_ROUTE).into_response();
    }
    match tokio::fs::read_to_string("./resources/www/index.html").await {
        Ok(shell) => Html(shell).into_response(),
        Err(_) => axum::http::StatusCode::NOT_FOUND.into_response(),
    }
}

/// Serves the SPA shell. Unknown paths fall back to the shell as well, so
/// the client router can handle `/auth` and `/{country}/{city}/{name}`.
fn static_content_router() -> Router {
    Router::new().nest_service(
        "/",
        get_service(
            ServeDir::new("./resources/www/")
                .not_found_service(ServeFile::new("./resources/www/index.html")),
        ),
    )
}
