//! Shared helpers for HTTP adapter tests.

use actix_session::SessionMiddleware;
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::Key;

use crate::domain::{Gender, PageMeta, User, UserPage};

/// Cookie-session middleware with a throwaway key for tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Deterministic user fixture.
pub fn sample_user(id: i64) -> User {
    User {
        id,
        first_name: "Jan".to_owned(),
        last_name: "Kowalski".to_owned(),
        birthdate: "1990-01-01".to_owned(),
        gender: Gender::Male,
    }
}

/// One-user page matching the fixture upstream response.
pub fn single_user_page() -> UserPage {
    UserPage {
        users: vec![sample_user(1)],
        meta: PageMeta {
            total_count: 1,
            page: 1,
            page_size: 10,
        },
    }
}

/// Extract the session cookie set on a response.
pub fn session_cookie(
    response: &actix_web::dev::ServiceResponse,
) -> actix_web::cookie::Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set")
        .into_owned()
}

/// Extract the first `_token` hidden-input value after `marker`.
///
/// Pages can carry several tokens (import plus one per delete form); the
/// marker pins which form the token belongs to.
pub fn extract_token_after(body: &str, marker: &str) -> String {
    let start = body.find(marker).expect("marker present in page");
    let tail = body.get(start..).expect("marker offset in bounds");
    let field = "name=\"_token\" value=\"";
    let value_start = tail.find(field).expect("token field after marker") + field.len();
    let value_tail = tail.get(value_start..).expect("token value in bounds");
    let value_end = value_tail.find('"').expect("token value terminated");
    value_tail
        .get(..value_end)
        .expect("token value in bounds")
        .to_owned()
}
