//! Driving ports for user listing and mutation.
//!
//! HTTP handlers depend on these traits only; the reqwest adapter in
//! `outbound::api` supplies the production implementation and tests plug in
//! mocks.

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::draft::UserDraft;
use super::query::ListQuery;
use super::user::User;

/// One page of users with the upstream pagination envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPage {
    /// Users on this page.
    pub users: Vec<User>,
    /// Pagination metadata reported by the upstream.
    pub meta: PageMeta,
}

impl UserPage {
    /// Empty result set with default pagination metadata, rendered when the
    /// upstream is unreachable.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Pagination metadata returned by the upstream list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    /// Total matching users across all pages.
    pub total_count: u64,
    /// Current page, 1-based.
    pub page: u32,
    /// Users per page.
    pub page_size: u32,
}

impl Default for PageMeta {
    fn default() -> Self {
        Self {
            total_count: 0,
            page: 1,
            page_size: 10,
        }
    }
}

impl PageMeta {
    /// Number of pages implied by the metadata, at least one.
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 1;
        }
        self.total_count.div_ceil(u64::from(self.page_size)).max(1)
    }
}

/// Result of triggering a bulk import upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Upstream-provided summary, when one was returned.
    pub message: Option<String>,
}

/// Failures surfaced by the upstream gateway.
///
/// Handlers special-case [`GatewayError::Rejected`]; every other variant
/// collapses into a one-line flash message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Network transport failed before a response arrived.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The configured request timeout elapsed.
    #[error("upstream timed out: {0}")]
    Timeout(String),
    /// The response body could not be decoded.
    #[error("invalid upstream response: {0}")]
    Decode(String),
    /// The upstream rejected the payload with per-field messages (HTTP 422).
    #[error("upstream rejected the submitted data")]
    Rejected {
        /// Field name to messages, as returned by the upstream.
        errors: BTreeMap<String, Vec<String>>,
    },
    /// Any other non-success HTTP status.
    #[error("upstream returned status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated body preview for the flash message and logs.
        message: String,
    },
}

/// Read side of the upstream user directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersQuery: Send + Sync {
    /// List users matching the normalized query.
    async fn list(&self, query: &ListQuery) -> Result<UserPage, GatewayError>;

    /// Fetch one user by id.
    ///
    /// Not-found surfaces as an ordinary [`GatewayError::Status`]; the
    /// caller decides how to present it.
    async fn fetch(&self, id: i64) -> Result<User, GatewayError>;
}

/// Write side of the upstream user directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersCommand: Send + Sync {
    /// Create a user from a validated draft.
    async fn create(&self, draft: &UserDraft) -> Result<User, GatewayError>;

    /// Replace a user's fields with a validated draft.
    async fn update(&self, id: i64, draft: &UserDraft) -> Result<User, GatewayError>;

    /// Delete a user by id.
    async fn delete(&self, id: i64) -> Result<(), GatewayError>;

    /// Trigger the upstream bulk import.
    async fn import_users(&self) -> Result<ImportOutcome, GatewayError>;
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, 10, 1)]
    #[case(1, 10, 1)]
    #[case(10, 10, 1)]
    #[case(11, 10, 2)]
    #[case(95, 10, 10)]
    #[case(5, 0, 1)]
    fn total_pages_rounds_up(#[case] total: u64, #[case] size: u32, #[case] expected: u64) {
        let meta = PageMeta {
            total_count: total,
            page: 1,
            page_size: size,
        };
        assert_eq!(meta.total_pages(), expected);
    }

    #[test]
    fn empty_page_uses_default_meta() {
        let page = UserPage::empty();
        assert!(page.users.is_empty());
        assert_eq!(page.meta, PageMeta::default());
    }

    #[test]
    fn gateway_errors_render_for_flash_messages() {
        let error = GatewayError::Status {
            status: 503,
            message: "service unavailable".to_owned(),
        };
        assert_eq!(
            error.to_string(),
            "upstream returned status 503: service unavailable"
        );
    }
}
