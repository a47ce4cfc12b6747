use axum::{
    extract::{Request, State},
    middleware::Next,
    response::IntoResponse,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use log::warn;
use prayer_spots::auth::Identity;
use tower_cookies::Cookies;

use crate::WebState;

/// Cookie the hosted auth widget stores the access token under.
pub const SESSION_COOKIE: &str = "sb-access-token";

/// Session attached to every request. Empty for anonymous visitors; a failed
/// identity lookup degrades to anonymous instead of failing the request, so
/// the map always renders.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub identity: Option<Identity>,
}

pub async fn session_middleware(
    State(state): State<WebState>,
    cookies: Cookies,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    req: Request,
    next: Next,
) -> impl IntoResponse {
    let access_token = bearer
        .map(|TypedHeader(header)| header.token().to_owned())
        .or_else(|| {
            cookies
                .get(SESSION_COOKIE)
                .map(|cookie| cookie.value().to_owned())
        });

    let identity = match access_token {
        Some(token) => match state.identity_client.current_user(&token).await {
            Ok(identity) => identity,
            Err(why) => {
                warn!("identity lookup failed, treating as signed out: {}", why);
                None
            }
        },
        None => None,
    };

    // spots reference profiles, so make sure one exists for this user
    if let Some(identity) = &identity {
        if let Err(why) = state.spots_client.ensure_profile(identity).await {
            warn!("could not ensure profile for {}: {}", identity.user_id, why);
        }
    }

    let mut req = req;
    req.extensions_mut().insert(Session { identity });

    next.run(req).await
}
