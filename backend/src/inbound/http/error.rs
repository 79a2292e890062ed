//! HTTP adapter mapping for domain errors.
//!
//! Nearly every failure in this service ends as a flash message or a field
//! error on a rendered page; this mapping covers the remainder (session
//! I/O, malformed requests) without leaking internals to the browser.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use tracing::error;

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::render;

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        // Do not leak implementation details to clients.
        let message = match self.code() {
            ErrorCode::Internal => {
                error!(error = %self, "internal error reached the HTTP boundary");
                "Internal server error"
            }
            ErrorCode::InvalidRequest => self.message(),
        };
        HttpResponse::build(self.status_code())
            .content_type("text/html; charset=utf-8")
            .body(render::error_page(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn internal_errors_are_redacted() {
        let response = Error::internal("session store exploded").error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = actix_web::body::to_bytes(response.into_body())
            .await
            .expect("body readable");
        let text = String::from_utf8(body.to_vec()).expect("utf8 body");
        assert!(text.contains("Internal server error"));
        assert!(!text.contains("exploded"));
    }

    #[test]
    fn invalid_request_keeps_its_message() {
        let response = Error::invalid_request("missing field").error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
