//! Strategy configuration.
//!
//! Required keys are `api_key` and `secret_key`; their absence is a
//! configuration error raised before any network call. Everything else is
//! optional or defaulted, including the per-revision LinkedIn endpoints.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::{config_error, Error};
use crate::http::HttpClientConfig;

/// Endpoints for the OAuth 1.0a revision.
#[derive(Debug, Clone)]
pub struct OAuth1Endpoints {
    pub request_token_url: String,
    pub authorize_url: String,
    pub access_token_url: String,
    pub profile_url: String,
}

impl Default for OAuth1Endpoints {
    fn default() -> Self {
        Self {
            request_token_url: "https://api.linkedin.com/uas/oauth/requestToken".to_string(),
            authorize_url: "https://www.linkedin.com/uas/oauth/authenticate".to_string(),
            access_token_url: "https://api.linkedin.com/uas/oauth/accessToken".to_string(),
            profile_url: "https://api.linkedin.com/v1/people/~".to_string(),
        }
    }
}

/// Endpoints for the OAuth 2.0 revision.
#[derive(Debug, Clone)]
pub struct OAuth2Endpoints {
    pub authorization_url: String,
    pub token_url: String,
    pub profile_url: String,
    pub email_url: String,
}

impl Default for OAuth2Endpoints {
    fn default() -> Self {
        Self {
            authorization_url: "https://www.linkedin.com/uas/oauth2/authorization".to_string(),
            token_url: "https://www.linkedin.com/uas/oauth2/accessToken".to_string(),
            profile_url: "https://api.linkedin.com/v2/me".to_string(),
            email_url:
                "https://api.linkedin.com/v2/emailAddress?q=members&projection=(elements*(handle~))"
                    .to_string(),
        }
    }
}

/// Default profile field list for the v1 (OAuth1) people API.
pub const DEFAULT_PROFILE_FIELDS_V1: &[&str] = &[
    "id",
    "first-name",
    "last-name",
    "formatted-name",
    "headline",
    "picture-url",
    "summary",
    "location",
    "public-profile-url",
    "site-standard-profile-request",
    "email-address",
];

/// Default profile field list for the v2 (OAuth2) profile API.
pub const DEFAULT_PROFILE_FIELDS_V2: &[&str] = &[
    "id",
    "firstName",
    "lastName",
    "profilePicture(displayImage~:playableStreams)",
];

/// Default scope requested by the OAuth2 revision.
pub const DEFAULT_SCOPE: &str = "r_emailaddress r_liteprofile";

/// Strategy configuration consumed from the host broker.
#[derive(Debug, Clone)]
pub struct Config {
    /// LinkedIn application key (consumer key / client id).
    pub api_key: String,
    /// LinkedIn application secret (consumer secret / client secret).
    pub secret_key: String,
    /// Callback URL the provider redirects back to.
    pub redirect_uri: Option<String>,
    /// Space-separated scope string; defaults per revision when unset.
    pub scope: Option<String>,
    /// Fixed `state` value; a fresh random token is generated when unset.
    pub state: Option<String>,
    /// OAuth2 `response_type`; defaults to `code`.
    pub response_type: Option<String>,
    /// Profile field selectors; revision defaults apply when unset.
    pub profile_fields: Option<Vec<String>>,
    pub oauth1: OAuth1Endpoints,
    pub oauth2: OAuth2Endpoints,
    /// Transport tuning, passed verbatim to the HTTP client.
    pub http: HttpClientConfig,
}

impl Config {
    /// Create a configuration from the two required keys, with defaults for
    /// everything else.
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            redirect_uri: None,
            scope: None,
            state: None,
            response_type: None,
            profile_fields: None,
            oauth1: OAuth1Endpoints::default(),
            oauth2: OAuth2Endpoints::default(),
            http: HttpClientConfig::default(),
        }
    }

    /// Build a configuration from the host's loose key/value map.
    ///
    /// Fails with `invalid_config` when a required key is missing or empty;
    /// no network object is constructed before this validation passes.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, Error> {
        let api_key = require(params, "api_key")?;
        let secret_key = require(params, "secret_key")?;

        let mut config = Config::new(api_key, secret_key);
        config.redirect_uri = optional(params, "redirect_uri");
        config.scope = optional(params, "scope");
        config.state = optional(params, "state");
        config.response_type = optional(params, "response_type");
        config.profile_fields = optional(params, "profile_fields")
            .map(|s| s.split(',').map(|f| f.trim().to_string()).collect());

        if let Some(secs) = optional(params, "timeout").and_then(|s| s.parse().ok()) {
            config.http.timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = optional(params, "connect_timeout").and_then(|s| s.parse().ok()) {
            config.http.connect_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Set the callback URL.
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    /// Set the requested scope.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Set an explicit profile field list.
    pub fn with_profile_fields(mut self, fields: Vec<String>) -> Self {
        self.profile_fields = Some(fields);
        self
    }

    /// Resolve the profile field list against a revision default.
    pub(crate) fn profile_fields_or(&self, default: &[&str]) -> Vec<String> {
        match &self.profile_fields {
            Some(fields) if !fields.is_empty() => fields.clone(),
            _ => default.iter().map(|f| f.to_string()).collect(),
        }
    }
}

fn require(params: &HashMap<String, String>, key: &str) -> Result<String, Error> {
    match params.get(key) {
        Some(value) if !value.is_empty() => Ok(value.clone()),
        _ => Err(config_error(&format!("missing required config key: {key}"))),
    }
}

fn optional(params: &HashMap<String, String>, key: &str) -> Option<String> {
    params.get(key).filter(|v| !v.is_empty()).cloned()
}
