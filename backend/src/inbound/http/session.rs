//! Session-backed flash messages and the per-session form secret.
//!
//! Wraps the Actix session so handlers only deal with console-level
//! operations: queueing one-shot notifications and fetching the secret that
//! anti-forgery tokens are derived from.

use actix_session::{Session, SessionGetError, SessionInsertError};
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::domain::Error;

pub(crate) const FLASH_KEY: &str = "flash_messages";
pub(crate) const FORM_SECRET_KEY: &str = "form_secret";
const FORM_SECRET_BYTES: usize = 32;

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    /// Operation completed.
    Success,
    /// Operation failed or was refused.
    Error,
}

impl FlashLevel {
    /// CSS class rendered on the flash element.
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Success => "flash-success",
            Self::Error => "flash-error",
        }
    }
}

/// One-shot notification shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    /// Severity.
    pub level: FlashLevel,
    /// Text shown to the user.
    pub message: String,
}

/// Newtype wrapper exposing console-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Queue a success flash for the next rendered page.
    pub fn flash_success(&self, message: impl Into<String>) -> Result<(), Error> {
        self.push_flash(FlashLevel::Success, message.into())
    }

    /// Queue an error flash for the next rendered page.
    pub fn flash_error(&self, message: impl Into<String>) -> Result<(), Error> {
        self.push_flash(FlashLevel::Error, message.into())
    }

    fn push_flash(&self, level: FlashLevel, message: String) -> Result<(), Error> {
        let mut pending = self
            .0
            .get::<Vec<Flash>>(FLASH_KEY)
            .map_err(read_error)?
            .unwrap_or_default();
        pending.push(Flash { level, message });
        self.0.insert(FLASH_KEY, pending).map_err(write_error)
    }

    /// Read and clear all pending flashes.
    pub fn take_flashes(&self) -> Result<Vec<Flash>, Error> {
        let pending = self
            .0
            .get::<Vec<Flash>>(FLASH_KEY)
            .map_err(read_error)?
            .unwrap_or_default();
        self.0.remove(FLASH_KEY);
        Ok(pending)
    }

    /// Per-session secret used to derive anti-forgery tokens.
    ///
    /// Created on first use and stable for the session's lifetime.
    pub fn form_secret(&self) -> Result<String, Error> {
        if let Some(secret) = self
            .0
            .get::<String>(FORM_SECRET_KEY)
            .map_err(read_error)?
        {
            return Ok(secret);
        }
        let mut bytes = [0u8; FORM_SECRET_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let secret = hex::encode(bytes);
        self.0
            .insert(FORM_SECRET_KEY, &secret)
            .map_err(write_error)?;
        Ok(secret)
    }
}

fn read_error(error: SessionGetError) -> Error {
    Error::internal(format!("failed to read session: {error}"))
}

fn write_error(error: SessionInsertError) -> Error {
    Error::internal(format!("failed to persist session: {error}"))
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
