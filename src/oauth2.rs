//! OAuth 2.0 revision of the LinkedIn strategy.
//!
//! `request()` builds the authorization redirect directly (no pre-request
//! round trip); `callback()` exchanges the `code` for an access token,
//! fetches email and profile from the v2 API, flattens and maps the result.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use crate::config::{Config, DEFAULT_PROFILE_FIELDS_V2, DEFAULT_SCOPE};
use crate::error::{Error, ErrorCode};
use crate::profile::{apply_map, flatten_profile, lookup_path, OAUTH2_RESPONSE_MAP};
use crate::session::{generate_state_token, SessionStore};
use crate::strategy::{AuthResult, CallbackParams, Credentials, RedirectAction, Strategy};

/// LinkedIn OAuth 2.0 strategy.
pub struct OAuth2Strategy {
    config: Config,
    client: reqwest::Client,
}

impl OAuth2Strategy {
    /// Configure the strategy and build its HTTP client.
    pub fn new(config: Config) -> Result<Self, Error> {
        let client = config.http.build().map_err(|e| {
            Error::new(ErrorCode::InvalidConfig, "failed to build HTTP client").with_source(e)
        })?;
        Ok(Self { config, client })
    }

    /// Exchange an authorization code for an access token payload.
    async fn exchange_code(&self, code: &str) -> Result<Value, Error> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.api_key.as_str()),
            ("client_secret", self.config.secret_key.as_str()),
        ];
        if let Some(redirect_uri) = &self.config.redirect_uri {
            form.push(("redirect_uri", redirect_uri.as_str()));
        }

        debug!("exchanging authorization code for access token");

        let response = self
            .client
            .post(&self.config.oauth2.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                warn!("access token request failed: {e:?}");
                Error::new(
                    ErrorCode::AccessTokenError,
                    "Failed when attempting to obtain access token",
                )
                .with_source(e)
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();
        let raw = raw_response(status, &headers, &body);

        if !status.is_success() {
            warn!("access token endpoint returned {status}");
            return Err(Error::new(
                ErrorCode::AccessTokenError,
                "Failed when attempting to obtain access token",
            )
            .with_raw(raw));
        }

        let payload: Value = serde_json::from_str(&body).map_err(|e| {
            warn!("access token response was not valid JSON: {e}");
            Error::new(
                ErrorCode::AccessTokenError,
                "Failed when attempting to obtain access token",
            )
            .with_raw(raw.clone())
            .with_source(e)
        })?;

        if payload.get("access_token").and_then(Value::as_str).is_none() {
            return Err(Error::new(
                ErrorCode::AccessTokenError,
                "Access token missing from token endpoint response",
            )
            .with_raw(raw));
        }

        Ok(payload)
    }

    /// Fetch and normalize the user profile: one call for the email
    /// address, one for the projected profile fields, merged into a single
    /// flattened mapping.
    async fn fetch_profile(&self, access_token: &str) -> Result<Value, Error> {
        let email = self.fetch_email(access_token).await?;

        let fields = self.config.profile_fields_or(DEFAULT_PROFILE_FIELDS_V2);
        let url = format!(
            "{}?projection=({})",
            self.config.oauth2.profile_url,
            fields.join(",")
        );

        let payload = self
            .get_json(&url, access_token, "user information")
            .await?;

        // The v2 API wraps some projections in an elements array.
        let profile = match payload.get("elements").and_then(|e| e.get(0)) {
            Some(element) => element.clone(),
            None => payload,
        };

        let mut flat = flatten_profile(&profile);
        if let Some(map) = flat.as_object_mut() {
            map.insert("emailAddress".to_string(), Value::String(email));
        }
        Ok(flat)
    }

    async fn fetch_email(&self, access_token: &str) -> Result<String, Error> {
        let payload = self
            .get_json(
                &self.config.oauth2.email_url,
                access_token,
                "user email information",
            )
            .await?;

        // elements[0]."handle~".emailAddress, or the bare shape when the
        // projection wrapper is absent.
        let element = match payload.get("elements").and_then(|e| e.get(0)) {
            Some(element) => element,
            None => &payload,
        };

        lookup_path(element, "handle~.emailAddress")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                Error::new(
                    ErrorCode::UserinfoError,
                    "Failed when attempting to query for user email information",
                )
                .with_raw(payload.clone())
            })
    }

    async fn get_json(&self, url: &str, access_token: &str, what: &str) -> Result<Value, Error> {
        debug!("fetching {what}");

        let response = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                warn!("request for {what} failed: {e:?}");
                Error::new(
                    ErrorCode::UserinfoError,
                    format!("Failed when attempting to query for {what}"),
                )
                .with_source(e)
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            warn!("{what} endpoint returned {status}");
            return Err(Error::new(
                ErrorCode::UserinfoError,
                format!("Failed when attempting to query for {what}"),
            )
            .with_raw(raw_response(status, &headers, &body)));
        }

        serde_json::from_str(&body).map_err(|e| {
            warn!("{what} response was not valid JSON: {e}");
            Error::new(
                ErrorCode::UserinfoError,
                format!("Failed when attempting to query for {what}"),
            )
            .with_raw(raw_response(status, &headers, &body))
            .with_source(e)
        })
    }
}

#[async_trait]
impl Strategy for OAuth2Strategy {
    fn name(&self) -> &'static str {
        "linkedin"
    }

    async fn request(&self, _session: &dyn SessionStore) -> Result<RedirectAction, Error> {
        let mut url = Url::parse(&self.config.oauth2.authorization_url).map_err(|e| {
            Error::new(ErrorCode::InvalidConfig, "invalid authorization URL").with_source(e)
        })?;

        let state = self
            .config
            .state
            .clone()
            .unwrap_or_else(generate_state_token);
        let scope = self.config.scope.as_deref().unwrap_or(DEFAULT_SCOPE);
        let response_type = self.config.response_type.as_deref().unwrap_or("code");

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("client_id", &self.config.api_key);
            query.append_pair("state", &state);
            query.append_pair("scope", scope);
            query.append_pair("response_type", response_type);
            if let Some(redirect_uri) = &self.config.redirect_uri {
                query.append_pair("redirect_uri", redirect_uri);
            }
        }

        debug!("redirecting to LinkedIn authorization endpoint");
        Ok(RedirectAction {
            url: url.into(),
        })
    }

    async fn callback(
        &self,
        session: &dyn SessionStore,
        params: &CallbackParams,
    ) -> Result<AuthResult, Error> {
        // Any state from a previous attempt dies here, success or not.
        session.clear();

        let Some(code) = params.get("code") else {
            return Err(Error::new(
                ErrorCode::Oauth2CallbackError,
                "Callback did not carry an authorization code",
            )
            .with_raw(params.to_value()));
        };

        let token_payload = self.exchange_code(code).await?;
        let access_token = token_payload["access_token"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        // An out-of-range expires_in is treated as absent, not a failure:
        // the token itself is usable, only its expiry is unrepresentable.
        let expires_at = token_payload
            .get("expires_in")
            .and_then(Value::as_i64)
            .and_then(Duration::try_seconds)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl));

        let profile = self.fetch_profile(&access_token).await?;

        let uid = profile
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                Error::new(ErrorCode::VerifyCredentials, "Profile carried no user id")
                    .with_raw(profile.clone())
            })?;

        Ok(AuthResult {
            uid,
            info: apply_map(&profile, OAUTH2_RESPONSE_MAP),
            credentials: Credentials {
                token: access_token,
                secret: None,
                expires_at,
            },
            raw: profile,
        })
    }
}

/// Capture a provider response for error diagnostics.
pub(crate) fn raw_response(status: StatusCode, headers: &HeaderMap, body: &str) -> Value {
    let headers: serde_json::Map<String, Value> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()),
            )
        })
        .collect();

    json!({
        "status": status.as_u16(),
        "headers": headers,
        "response": body,
    })
}
