//! Error types for the `linkedin-auth` crate.
//!
//! A root Error struct tagged with a short wire code, carrying the last raw
//! provider payload for diagnostics and an optional source for error chaining.

use std::error::Error as StdError;
use std::fmt;

use serde_json::Value;

/// Short codes surfaced to the host broker alongside every failure.
///
/// Codes come in per-revision pairs where the two strategies fail at the
/// same stage: `OauthVerifier`/`Oauth2CallbackError` for a malformed
/// exchange, `OauthTokenExpected`/`AccessTokenError` for a failed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// A required config key is missing; raised before any network call.
    InvalidConfig,
    /// OAuth1 request-token fetch failed.
    TokenRequestFailed,
    /// Inbound callback token missing or not matching the session token.
    AccessDenied,
    /// OAuth1 access-token exchange returned 200 without the token pair.
    OauthVerifier,
    /// OAuth2 callback arrived without a `code` parameter.
    Oauth2CallbackError,
    /// OAuth2 token exchange failed or returned no `access_token`.
    AccessTokenError,
    /// OAuth1 access-token exchange failed at the transport/status level.
    OauthTokenExpected,
    /// Profile or email endpoint returned an unreadable payload.
    UserinfoError,
    /// Profile payload carried no user id.
    VerifyCredentials,
}

impl ErrorCode {
    /// Get the wire string for this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidConfig => "invalid_config",
            ErrorCode::TokenRequestFailed => "token_request_failed",
            ErrorCode::AccessDenied => "access_denied",
            ErrorCode::OauthVerifier => "oauth_verifier",
            ErrorCode::Oauth2CallbackError => "oauth2callback_error",
            ErrorCode::AccessTokenError => "access_token_error",
            ErrorCode::OauthTokenExpected => "oauth_token_expected",
            ErrorCode::UserinfoError => "userinfo_error",
            ErrorCode::VerifyCredentials => "verify_credentials",
        }
    }
}

/// Top-level error type for linkedin-auth.
///
/// Every failure is returned to the caller as one of these; nothing is
/// retried and nothing is thrown across the host boundary.
#[derive(Debug)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    /// Last raw provider response (status/headers/body) or the inbound
    /// callback parameters, kept for diagnostics.
    pub raw: Option<Value>,
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    /// Create an error with a code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            raw: None,
            source: None,
        }
    }

    /// Attach the raw provider payload.
    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = Some(raw);
        self
    }

    /// Attach an underlying source error.
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

/// Helper function to create a config error.
pub fn config_error(message: &str) -> Error {
    Error::new(ErrorCode::InvalidConfig, message)
}
