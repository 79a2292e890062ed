//! Transport-agnostic core: the user model, typed form input and its
//! validation, list-query normalization, and the ports the HTTP layer and
//! the upstream gateway plug into.

pub mod draft;
pub mod error;
pub mod ports;
pub mod query;
pub mod user;

pub use draft::{FORM_FIELDS, FormErrors, UserDraft, UserForm};
pub use error::{Error, ErrorCode};
pub use ports::{
    GatewayError, ImportOutcome, PageMeta, UserPage, UsersCommand, UsersQuery,
};
pub use query::{ListParams, ListQuery};
pub use user::{Gender, User};
