//! Server construction and route wiring.
//!
//! Dependencies are built once and passed by value into the app factory;
//! handlers never reach for globals.

mod config;

pub use config::{
    BuildMode, ConfigError, SessionConfigError, SessionSettings, UpstreamSettings,
    session_settings,
};

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use std::net::SocketAddr;

use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::{
    create_user, delete_user, edit_user_form, import_users, list_users, new_user_form, update_user,
};
use crate::middleware::RequestLog;

/// Assemble the actix application with session middleware and all routes.
pub fn build_app(
    state: web::Data<HttpState>,
    key: Key,
    cookie_secure: bool,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".to_owned())
        .cookie_path("/".to_owned())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_same_site(SameSite::Lax)
        .build();

    App::new()
        .app_data(state)
        .wrap(session)
        .wrap(RequestLog)
        .service(list_users)
        .service(new_user_form)
        .service(create_user)
        .service(edit_user_form)
        .service(update_user)
        .service(import_users)
        .service(delete_user)
}

/// Bind and serve until shutdown.
///
/// # Errors
///
/// Returns an error when the listener cannot bind.
pub async fn run(
    state: web::Data<HttpState>,
    session: SessionSettings,
    bind_addr: SocketAddr,
) -> std::io::Result<()> {
    let SessionSettings { key, cookie_secure } = session;
    HttpServer::new(move || build_app(state.clone(), key.clone(), cookie_secure))
        .bind(bind_addr)?
        .run()
        .await
}
