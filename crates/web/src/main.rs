use std::sync::Arc;

use database::{DatabaseConnectionInfo, PgDatabase};
use geocoding::client::{GeocoderCredentials, MapboxGeocoder, TokenSource};
use identity::{HostedIdentityClient, IdentityCredentials};
use prayer_spots::client::Client;
use web::{start_web_server, WebConfig, WebState};

#[tokio::main]
async fn main() {
    env_logger::init();

    // database
    let database_connection_info = DatabaseConnectionInfo::from_env()
        .expect("expected database connection info in env.");
    let database = PgDatabase::connect(database_connection_info)
        .await
        .expect("could not connect to database.");

    // geocoder
    let token_source =
        TokenSource::from_env().expect("expected geocoder token config in env.");
    let geocoder = MapboxGeocoder::new(GeocoderCredentials {
        token_source,
        rate_limit_per_minute: Some(300),
    });

    // hosted identity service
    let identity_credentials = IdentityCredentials::from_env()
        .expect("expected identity service config in env.");

    // web server
    let web_future = start_web_server(WebState {
        spots_client: Client::new(database),
        geocoder: Arc::new(geocoder),
        identity_client: Arc::new(HostedIdentityClient::new(identity_credentials)),
        config: Arc::new(WebConfig::from_env()),
    });

    let _ = web_future.await;
}
