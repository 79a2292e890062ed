//! Entry point: configuration, upstream client construction, server
//! startup.

use std::sync::Arc;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use backend::inbound::http::state::HttpState;
use backend::outbound::api::UserApiClient;
use backend::server::{self, BuildMode, UpstreamSettings};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    // Settings come from the environment (and optional config file); CLI
    // arguments are not part of this binary's surface.
    let settings = UpstreamSettings::load_from_iter(std::env::args_os().take(1))
        .map_err(std::io::Error::other)?;
    let api_url = settings.api_url().map_err(std::io::Error::other)?;
    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;
    let session = server::session_settings(BuildMode::from_debug_assertions())
        .map_err(std::io::Error::other)?;

    let client = Arc::new(
        UserApiClient::new(
            api_url,
            settings.timeout(),
            settings.import_token().map(ToOwned::to_owned),
        )
        .map_err(std::io::Error::other)?,
    );
    let state = web::Data::new(HttpState::new(client.clone(), client));

    server::run(state, session, bind_addr).await
}
