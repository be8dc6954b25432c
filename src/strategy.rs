//! Strategy trait and the normalized result types.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::Error;
use crate::session::SessionStore;

/// Browser redirect the host must issue to continue the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectAction {
    /// Destination URL with the query string already encoded.
    pub url: String,
}

/// Inbound query parameters from the provider's callback redirect.
#[derive(Debug, Clone, Default)]
pub struct CallbackParams(HashMap<String, String>);

impl CallbackParams {
    /// Look up a parameter, treating empty values as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// The raw parameter map as a JSON value, for error diagnostics.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(&self.0).unwrap_or(Value::Null)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CallbackParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<HashMap<String, String>> for CallbackParams {
    fn from(params: HashMap<String, String>) -> Self {
        Self(params)
    }
}

/// Normalized user details mapped out of the provider profile.
///
/// Any field whose source is absent from the provider payload is simply
/// left unset; mapping never fails on missing data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Named profile URLs (e.g. `linkedin`, `website`).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub urls: BTreeMap<String, String>,
}

/// Credentials obtained for the authenticated user.
///
/// OAuth1 yields a token/secret pair; OAuth2 yields a token with an
/// absolute expiry computed from `expires_in` at receipt time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Credentials {
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credentials {
    /// OAuth1-style token/secret pair.
    pub fn token_pair(token: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            secret: Some(secret.into()),
            expires_at: None,
        }
    }

    /// OAuth2-style expiring bearer token.
    pub fn expiring(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            secret: None,
            expires_at: Some(expires_at),
        }
    }
}

/// Normalized authentication result, produced exactly once per successful
/// callback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthResult {
    /// Provider-unique user id.
    pub uid: String,
    pub info: UserInfo,
    pub credentials: Credentials,
    /// Raw provider profile payload.
    pub raw: Value,
}

/// Contract every LinkedIn strategy revision implements.
///
/// The two historical revisions (OAuth 1.0a and OAuth 2.0) are mutually
/// exclusive implementations of this trait; the host broker drives one
/// `request()` and later one `callback()` per auth attempt, issuing the
/// returned redirect and feeding back the provider's callback parameters.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Strategy identifier, e.g. for broker routing and logs.
    fn name(&self) -> &'static str;

    /// Begin an auth attempt: build the provider redirect, persisting any
    /// state the callback will need into `session`.
    async fn request(&self, session: &dyn SessionStore) -> Result<RedirectAction, Error>;

    /// Complete an auth attempt from the provider's callback parameters.
    ///
    /// Session state from `request()` is consumed and cleared on entry,
    /// regardless of outcome; callers must not retry a callback.
    async fn callback(
        &self,
        session: &dyn SessionStore,
        params: &CallbackParams,
    ) -> Result<AuthResult, Error>;
}
