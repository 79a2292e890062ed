//! Anti-forgery tokens for state-mutating form submissions.
//!
//! Tokens are derived by hashing the action name with the per-session
//! secret, so a token issued for one action (or one user id) is useless for
//! any other. The check is an explicit function of (action, submitted,
//! secret); nothing here touches framework state.

use sha2::{Digest, Sha256};

/// Action scope for the create/edit user form.
pub const USER_FORM_ACTION: &str = "user";
/// Action scope for the bulk import form.
pub const IMPORT_ACTION: &str = "import";

/// Action scope for deleting one user.
pub fn delete_action(id: i64) -> String {
    format!("delete{id}")
}

/// Token embedded in a form for the given action.
pub fn form_token(action: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(action.as_bytes());
    hasher.update(b":");
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Whether a submitted token is valid for the given action.
///
/// A missing token never matches.
pub fn token_matches(action: &str, submitted: Option<&str>, secret: &str) -> bool {
    submitted.is_some_and(|token| constant_eq(token, &form_token(action, secret)))
}

// Comparison over the full length regardless of where the first mismatch
// occurs.
fn constant_eq(left: &str, right: &str) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.bytes()
        .zip(right.bytes())
        .fold(0u8, |acc, (l, r)| acc | (l ^ r))
        == 0
}
