//! Reqwest-backed adapter for the upstream users API.
//!
//! This adapter owns transport details only: URL construction, the
//! whole-request timeout, HTTP status mapping, and JSON decoding of the
//! wire envelopes. No retry, caching, or backoff.

mod dto;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use crate::domain::{
    GatewayError, ImportOutcome, ListQuery, User, UserDraft, UserPage, UsersCommand, UsersQuery,
};
use dto::{ErrorsDto, ImportResponseDto, ListEnvelopeDto, UserBodyDto, UserEnvelopeDto};

/// Header carrying the import secret, as expected by the upstream API.
pub const IMPORT_TOKEN_HEADER: &str = "x-api-token";

const BODY_PREVIEW_CHARS: usize = 200;

/// HTTP client for the upstream users API.
///
/// Cheap to clone per request via its inner reqwest client; one instance is
/// shared behind `Arc` for both ports.
pub struct UserApiClient {
    client: Client,
    base_url: Url,
    import_token: Option<String>,
}

impl UserApiClient {
    /// Build a client with an explicit whole-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying reqwest client cannot be
    /// constructed.
    pub fn new(
        base_url: Url,
        timeout: Duration,
        import_token: Option<String>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            import_token,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GatewayError::Transport("upstream base URL cannot be a base".to_owned()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn request_bytes(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Vec<u8>, GatewayError> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok(body.to_vec())
    }

    async fn request_json<T>(&self, request: reqwest::RequestBuilder) -> Result<T, GatewayError>
    where
        T: serde::de::DeserializeOwned,
    {
        let body = self.request_bytes(request).await?;
        serde_json::from_slice(&body)
            .map_err(|error| GatewayError::Decode(format!("invalid JSON payload: {error}")))
    }
}

#[async_trait]
impl UsersQuery for UserApiClient {
    async fn list(&self, query: &ListQuery) -> Result<UserPage, GatewayError> {
        let url = self.endpoint(&["users"])?;
        let envelope: ListEnvelopeDto = self
            .request_json(self.client.get(url).query(query.params()))
            .await?;
        Ok(envelope.into_domain())
    }

    async fn fetch(&self, id: i64) -> Result<User, GatewayError> {
        let url = self.endpoint(&["users", &id.to_string()])?;
        let envelope: UserEnvelopeDto = self.request_json(self.client.get(url)).await?;
        Ok(envelope.data.into_domain())
    }
}

#[async_trait]
impl UsersCommand for UserApiClient {
    async fn create(&self, draft: &UserDraft) -> Result<User, GatewayError> {
        let url = self.endpoint(&["users"])?;
        let envelope: UserEnvelopeDto = self
            .request_json(self.client.post(url).json(&UserBodyDto::from_draft(draft)))
            .await?;
        Ok(envelope.data.into_domain())
    }

    async fn update(&self, id: i64, draft: &UserDraft) -> Result<User, GatewayError> {
        let url = self.endpoint(&["users", &id.to_string()])?;
        let envelope: UserEnvelopeDto = self
            .request_json(self.client.put(url).json(&UserBodyDto::from_draft(draft)))
            .await?;
        Ok(envelope.data.into_domain())
    }

    async fn delete(&self, id: i64) -> Result<(), GatewayError> {
        let url = self.endpoint(&["users", &id.to_string()])?;
        self.request_bytes(self.client.delete(url)).await?;
        Ok(())
    }

    async fn import_users(&self) -> Result<ImportOutcome, GatewayError> {
        let url = self.endpoint(&["import"])?;
        let mut request = self.client.post(url);
        if let Some(token) = &self.import_token {
            request = request.header(IMPORT_TOKEN_HEADER, token);
        }
        let response: ImportResponseDto = self.request_json(request).await?;
        Ok(ImportOutcome {
            message: response.message,
        })
    }
}

fn map_transport_error(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::Timeout(error.to_string())
    } else {
        GatewayError::Transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> GatewayError {
    if status == StatusCode::UNPROCESSABLE_ENTITY {
        if let Ok(dto) = serde_json::from_slice::<ErrorsDto>(body) {
            return GatewayError::Rejected { errors: dto.errors };
        }
    }
    GatewayError::Status {
        status: status.as_u16(),
        message: body_preview(body),
    }
}

fn body_preview(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();
    if trimmed.chars().count() <= BODY_PREVIEW_CHARS {
        trimmed.to_owned()
    } else {
        let preview: String = trimmed.chars().take(BODY_PREVIEW_CHARS).collect();
        format!("{preview}…")
    }
}
