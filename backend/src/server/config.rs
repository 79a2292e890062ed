//! Environment-driven configuration.
//!
//! Upstream settings load through OrthoConfig so they can come from the
//! environment or a config file; session toggles are read directly so they
//! can be validated against the build mode.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use actix_web::cookie::Key;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use tracing::warn;
use url::Url;
use zeroize::Zeroize;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/session_key";
const SESSION_KEY_MIN_LEN: usize = 64;
const KEY_FILE_ENV: &str = "SESSION_KEY_FILE";
const COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
const ALLOW_EPHEMERAL_ENV: &str = "SESSION_ALLOW_EPHEMERAL";

/// Settings for reaching the upstream users API.
///
/// Environment variables carry the `USER_ADMIN_` prefix, e.g.
/// `USER_ADMIN_API_URL`.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "USER_ADMIN")]
pub struct UpstreamSettings {
    /// Base URL of the upstream users API. Required.
    pub api_url: Option<String>,
    /// Whole-request timeout for upstream calls, in seconds.
    pub timeout_secs: Option<u64>,
    /// Secret sent as the `x-api-token` header on import calls. When unset
    /// the header is omitted and the upstream rejection surfaces like any
    /// other gateway error.
    pub import_token: Option<String>,
    /// Socket address the HTTP server binds.
    pub bind_addr: Option<String>,
}

/// Errors raised while validating upstream settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The upstream base URL was not configured.
    #[error("missing required configuration: USER_ADMIN_API_URL")]
    MissingApiUrl,
    /// The upstream base URL does not parse.
    #[error("invalid USER_ADMIN_API_URL '{value}': {source}")]
    InvalidApiUrl {
        /// Offending value.
        value: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },
    /// The upstream base URL cannot carry path segments.
    #[error("USER_ADMIN_API_URL '{value}' cannot be used as a base URL")]
    ApiUrlNotABase {
        /// Offending value.
        value: String,
    },
    /// The bind address does not parse.
    #[error("invalid USER_ADMIN_BIND_ADDR '{value}': {source}")]
    InvalidBindAddr {
        /// Offending value.
        value: String,
        /// Parse failure.
        #[source]
        source: std::net::AddrParseError,
    },
}

impl UpstreamSettings {
    /// Validated upstream base URL.
    ///
    /// # Errors
    ///
    /// Fails when the URL is missing, unparseable, or cannot carry path
    /// segments.
    pub fn api_url(&self) -> Result<Url, ConfigError> {
        let raw = self.api_url.as_deref().ok_or(ConfigError::MissingApiUrl)?;
        let url = Url::parse(raw).map_err(|source| ConfigError::InvalidApiUrl {
            value: raw.to_owned(),
            source,
        })?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::ApiUrlNotABase {
                value: raw.to_owned(),
            });
        }
        Ok(url)
    }

    /// Request timeout for the upstream client.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Import secret, when configured.
    pub fn import_token(&self) -> Option<&str> {
        self.import_token.as_deref()
    }

    /// Address the HTTP server binds.
    ///
    /// # Errors
    ///
    /// Fails when the configured address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse()
            .map_err(|source| ConfigError::InvalidBindAddr {
                value: raw.to_owned(),
                source,
            })
    }
}

/// Build mode controlling how strict session settings are.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds fall back to an ephemeral session key with a warning.
    Debug,
    /// Release builds require a readable key file unless ephemeral keys are
    /// explicitly allowed.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Session cookie settings derived from the environment.
pub struct SessionSettings {
    /// Signing key for cookie sessions.
    pub key: Key,
    /// Whether session cookies are marked `Secure`.
    pub cookie_secure: bool,
}

/// Errors raised while loading session settings.
#[derive(Debug, thiserror::Error)]
pub enum SessionConfigError {
    /// Reading the session key file failed and ephemeral keys are not
    /// allowed.
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        /// Key file path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The session key file exists but is too short.
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        /// Key file path.
        path: PathBuf,
        /// Bytes found.
        length: usize,
        /// Bytes required.
        min_len: usize,
    },
}

/// Load session settings from the environment.
///
/// # Errors
///
/// Fails when the key file is unreadable (outside debug/ephemeral mode) or
/// shorter than the minimum derivation length.
pub fn session_settings(mode: BuildMode) -> Result<SessionSettings, SessionConfigError> {
    let path = PathBuf::from(
        std::env::var(KEY_FILE_ENV).unwrap_or_else(|_| SESSION_KEY_DEFAULT_PATH.to_owned()),
    );
    let key = match std::fs::read(&path) {
        Ok(mut bytes) => {
            if bytes.len() < SESSION_KEY_MIN_LEN {
                let length = bytes.len();
                bytes.zeroize();
                return Err(SessionConfigError::KeyTooShort {
                    path,
                    length,
                    min_len: SESSION_KEY_MIN_LEN,
                });
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            key
        }
        Err(source) => {
            let allow_ephemeral = mode.is_debug() || env_bool(ALLOW_EPHEMERAL_ENV);
            if !allow_ephemeral {
                return Err(SessionConfigError::KeyRead { path, source });
            }
            warn!(path = %path.display(), error = %source, "using ephemeral session key");
            Key::generate()
        }
    };

    let cookie_secure = std::env::var(COOKIE_SECURE_ENV)
        .ok()
        .and_then(|value| parse_bool(&value))
        .unwrap_or(true);

    Ok(SessionSettings { key, cookie_secure })
}

fn env_bool(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|value| parse_bool(&value))
        .unwrap_or(false)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;
    use std::io::Write;

    use env_lock::lock_env;
    use rstest::rstest;

    use super::*;

    fn load_from_empty_args() -> UpstreamSettings {
        UpstreamSettings::load_from_iter([OsString::from("backend")]).expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_env_is_empty() {
        let _guard = lock_env([
            ("USER_ADMIN_API_URL", None::<String>),
            ("USER_ADMIN_TIMEOUT_SECS", None::<String>),
            ("USER_ADMIN_IMPORT_TOKEN", None::<String>),
            ("USER_ADMIN_BIND_ADDR", None::<String>),
        ]);

        let settings = load_from_empty_args();
        assert!(matches!(
            settings.api_url(),
            Err(ConfigError::MissingApiUrl)
        ));
        assert_eq!(settings.timeout(), Duration::from_secs(30));
        assert!(settings.import_token().is_none());
        assert_eq!(
            settings.bind_addr().expect("default addr parses"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("literal addr")
        );
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            (
                "USER_ADMIN_API_URL",
                Some("http://api.example.test/v1".to_owned()),
            ),
            ("USER_ADMIN_TIMEOUT_SECS", Some("5".to_owned())),
            ("USER_ADMIN_IMPORT_TOKEN", Some("sekrit".to_owned())),
            ("USER_ADMIN_BIND_ADDR", Some("127.0.0.1:9000".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.api_url().expect("valid url").as_str(),
            "http://api.example.test/v1"
        );
        assert_eq!(settings.timeout(), Duration::from_secs(5));
        assert_eq!(settings.import_token(), Some("sekrit"));
        assert_eq!(
            settings.bind_addr().expect("valid addr"),
            "127.0.0.1:9000".parse::<SocketAddr>().expect("literal addr")
        );
    }

    #[rstest]
    fn unparseable_api_url_is_rejected() {
        let settings = UpstreamSettings {
            api_url: Some("not a url".to_owned()),
            timeout_secs: None,
            import_token: None,
            bind_addr: None,
        };
        assert!(matches!(
            settings.api_url(),
            Err(ConfigError::InvalidApiUrl { .. })
        ));
    }

    #[rstest]
    fn session_key_file_is_used_when_long_enough() {
        let mut file = tempfile::NamedTempFile::new().expect("temp key file");
        file.write_all(&[0x42; 64]).expect("write key bytes");
        let path = file.path().to_str().expect("utf8 path").to_owned();
        let _guard = lock_env([
            ("SESSION_KEY_FILE", Some(path)),
            ("SESSION_COOKIE_SECURE", Some("0".to_owned())),
            ("SESSION_ALLOW_EPHEMERAL", None::<String>),
        ]);

        let settings = session_settings(BuildMode::Release).expect("key file accepted");
        assert!(!settings.cookie_secure);
    }

    #[rstest]
    fn short_session_key_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp key file");
        file.write_all(&[0x42; 16]).expect("write key bytes");
        let path = file.path().to_str().expect("utf8 path").to_owned();
        let _guard = lock_env([
            ("SESSION_KEY_FILE", Some(path)),
            ("SESSION_COOKIE_SECURE", None::<String>),
            ("SESSION_ALLOW_EPHEMERAL", None::<String>),
        ]);

        assert!(matches!(
            session_settings(BuildMode::Release),
            Err(SessionConfigError::KeyTooShort { length: 16, .. })
        ));
    }

    #[rstest]
    fn release_mode_requires_a_key_file() {
        let _guard = lock_env([
            (
                "SESSION_KEY_FILE",
                Some("/nonexistent/session_key".to_owned()),
            ),
            ("SESSION_COOKIE_SECURE", None::<String>),
            ("SESSION_ALLOW_EPHEMERAL", None::<String>),
        ]);

        assert!(matches!(
            session_settings(BuildMode::Release),
            Err(SessionConfigError::KeyRead { .. })
        ));
    }

    #[rstest]
    #[case(BuildMode::Debug, None)]
    #[case(BuildMode::Release, Some("1".to_owned()))]
    fn ephemeral_keys_are_allowed_when_opted_in(
        #[case] mode: BuildMode,
        #[case] allow: Option<String>,
    ) {
        let _guard = lock_env([
            (
                "SESSION_KEY_FILE",
                Some("/nonexistent/session_key".to_owned()),
            ),
            ("SESSION_COOKIE_SECURE", None::<String>),
            ("SESSION_ALLOW_EPHEMERAL", allow),
        ]);

        let settings = session_settings(mode).expect("ephemeral key allowed");
        assert!(settings.cookie_secure);
    }
}
