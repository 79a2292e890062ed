//! Shared HTTP adapter state.
//!
//! Handlers receive this bundle via `actix_web::web::Data` so they depend
//! only on the domain ports and stay testable with mocks. Both ports are
//! normally backed by one `UserApiClient` instance.

use std::sync::Arc;

use crate::domain::{UsersCommand, UsersQuery};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Read side of the upstream user directory.
    pub queries: Arc<dyn UsersQuery>,
    /// Write side of the upstream user directory.
    pub commands: Arc<dyn UsersCommand>,
}

impl HttpState {
    /// Bundle the ports used by the handlers.
    pub fn new(queries: Arc<dyn UsersQuery>, commands: Arc<dyn UsersCommand>) -> Self {
        Self { queries, commands }
    }
}
