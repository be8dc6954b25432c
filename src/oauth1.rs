//! OAuth 1.0a revision of the LinkedIn strategy.
//!
//! Signing and transport are delegated to an [`OAuth1Client`] collaborator
//! the host supplies over its OAuth library; the strategy owns the flow:
//! request-token fetch, session round trip, verifier exchange, and the
//! signed XML profile fetch.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::form_urlencoded;
use url::Url;

use crate::config::{Config, DEFAULT_PROFILE_FIELDS_V1};
use crate::error::{Error, ErrorCode};
use crate::profile::{apply_map, xml_to_value, OAUTH1_RESPONSE_MAP};
use crate::session::{SessionStore, SESSION_OAUTH_TOKEN, SESSION_OAUTH_TOKEN_SECRET};
use crate::strategy::{AuthResult, CallbackParams, Credentials, RedirectAction, Strategy};

/// A token/secret pair used to sign a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub token: String,
    pub secret: String,
}

/// One signed request handed to the collaborator.
#[derive(Debug, Clone)]
pub struct OAuth1Request<'a> {
    pub method: reqwest::Method,
    pub url: &'a str,
    /// Protocol/body parameters to include in the signature base string.
    pub params: Vec<(&'a str, &'a str)>,
    /// User token pair to sign with; `None` signs with the consumer key only.
    pub token: Option<&'a TokenPair>,
}

/// Response metadata the collaborator tracked for the last call.
#[derive(Debug, Clone)]
pub struct OAuth1Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl OAuth1Response {
    /// Capture the response for error diagnostics.
    pub fn to_value(&self) -> Value {
        let headers: serde_json::Map<String, Value> = self
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        json!({
            "status": self.status,
            "headers": headers,
            "response": self.body,
        })
    }
}

/// External collaborator that signs and sends OAuth 1.0a requests.
///
/// The consumer key/secret are fixed at construction by the host; the
/// strategy passes the per-call user token pair explicitly. Implementations
/// must not retry: a failed call terminates the auth attempt.
#[async_trait]
pub trait OAuth1Client: Send + Sync {
    async fn request(&self, request: OAuth1Request<'_>) -> Result<OAuth1Response, Error>;
}

/// LinkedIn OAuth 1.0a strategy.
pub struct OAuth1Strategy {
    config: Config,
    client: Box<dyn OAuth1Client>,
}

impl OAuth1Strategy {
    /// Configure the strategy over a host-supplied signing client.
    pub fn new(config: Config, client: Box<dyn OAuth1Client>) -> Self {
        Self { config, client }
    }

    /// Parse a form-encoded token response body into a pair, if complete.
    fn parse_token_pair(body: &str) -> Option<TokenPair> {
        let fields: HashMap<String, String> =
            form_urlencoded::parse(body.as_bytes()).into_owned().collect();
        let token = fields.get("oauth_token").filter(|v| !v.is_empty())?;
        let secret = fields.get("oauth_token_secret").filter(|v| !v.is_empty())?;
        Some(TokenPair {
            token: token.clone(),
            secret: secret.clone(),
        })
    }

    /// POST to the request-token endpoint and extract the temporary pair.
    async fn fetch_request_token(&self) -> Result<TokenPair, Error> {
        let callback = self.config.redirect_uri.as_deref().unwrap_or_default();
        let mut params = vec![("oauth_callback", callback)];
        if let Some(scope) = &self.config.scope {
            params.push(("scope", scope.as_str()));
        }

        debug!("requesting temporary token");

        let response = self
            .client
            .request(OAuth1Request {
                method: reqwest::Method::POST,
                url: &self.config.oauth1.request_token_url,
                params,
                token: None,
            })
            .await
            .map_err(|e| {
                warn!("request token call failed: {e}");
                Error::new(
                    ErrorCode::TokenRequestFailed,
                    "Could not obtain token from request_token_url",
                )
                .with_source(e)
            })?;

        if response.status != 200 {
            warn!("request token endpoint returned {}", response.status);
            return Err(Error::new(
                ErrorCode::TokenRequestFailed,
                "Could not obtain token from request_token_url",
            )
            .with_raw(response.to_value()));
        }

        Self::parse_token_pair(&response.body).ok_or_else(|| {
            Error::new(
                ErrorCode::TokenRequestFailed,
                "Could not obtain token from request_token_url",
            )
            .with_raw(response.to_value())
        })
    }

    /// Exchange the verifier for the permanent token pair.
    async fn exchange_verifier(
        &self,
        request_token: &TokenPair,
        verifier: &str,
    ) -> Result<TokenPair, Error> {
        debug!("exchanging verifier for access token");

        let response = self
            .client
            .request(OAuth1Request {
                method: reqwest::Method::POST,
                url: &self.config.oauth1.access_token_url,
                params: vec![("oauth_verifier", verifier)],
                token: Some(request_token),
            })
            .await
            .map_err(|e| {
                warn!("access token exchange failed: {e}");
                Error::new(ErrorCode::OauthTokenExpected, "Oauth_verifier error.").with_source(e)
            })?;

        if response.status != 200 {
            warn!("access token endpoint returned {}", response.status);
            return Err(Error::new(ErrorCode::OauthTokenExpected, "Oauth_verifier error.")
                .with_raw(response.to_value()));
        }

        Self::parse_token_pair(&response.body).ok_or_else(|| {
            Error::new(ErrorCode::OauthVerifier, "Oauth_verifier error.")
                .with_raw(response.to_value())
        })
    }

    /// Authenticated GET to the profile endpoint; XML decoded recursively.
    async fn verify_credentials(&self, access_token: &TokenPair) -> Result<Value, Error> {
        let fields = self.config.profile_fields_or(DEFAULT_PROFILE_FIELDS_V1);
        let url = format!("{}:({})", self.config.oauth1.profile_url, fields.join(","));

        debug!("fetching profile");

        let response = self
            .client
            .request(OAuth1Request {
                method: reqwest::Method::GET,
                url: &url,
                params: vec![],
                token: Some(access_token),
            })
            .await
            .map_err(|e| {
                warn!("profile fetch failed: {e}");
                Error::new(ErrorCode::VerifyCredentials, "Verify_credentials error.")
                    .with_source(e)
            })?;

        if response.status != 200 {
            warn!("profile endpoint returned {}", response.status);
            return Err(Error::new(ErrorCode::VerifyCredentials, "Verify_credentials error.")
                .with_raw(response.to_value()));
        }

        xml_to_value(&response.body).map_err(|e| {
            warn!("profile response was not valid XML: {e}");
            Error::new(ErrorCode::VerifyCredentials, "Verify_credentials error.")
                .with_raw(response.to_value())
                .with_source(e)
        })
    }
}

#[async_trait]
impl Strategy for OAuth1Strategy {
    fn name(&self) -> &'static str {
        "linkedin"
    }

    async fn request(&self, session: &dyn SessionStore) -> Result<RedirectAction, Error> {
        let request_token = self.fetch_request_token().await?;

        session.put(SESSION_OAUTH_TOKEN, request_token.token.clone());
        session.put(SESSION_OAUTH_TOKEN_SECRET, request_token.secret.clone());

        let mut url = Url::parse(&self.config.oauth1.authorize_url).map_err(|e| {
            Error::new(ErrorCode::InvalidConfig, "invalid authorize URL").with_source(e)
        })?;
        url.query_pairs_mut()
            .append_pair("oauth_token", &request_token.token);

        debug!("redirecting to LinkedIn authorize endpoint");
        Ok(RedirectAction { url: url.into() })
    }

    async fn callback(
        &self,
        session: &dyn SessionStore,
        params: &CallbackParams,
    ) -> Result<AuthResult, Error> {
        // Consume the session pair before any validation; it must not
        // survive this attempt regardless of outcome.
        let stored_token = session.take(SESSION_OAUTH_TOKEN);
        let stored_secret = session.take(SESSION_OAUTH_TOKEN_SECRET);
        session.clear();

        let denied = || {
            Error::new(ErrorCode::AccessDenied, "User denied access.")
                .with_raw(params.to_value())
        };

        let (stored_token, stored_secret) = match (stored_token, stored_secret) {
            (Some(token), Some(secret)) => (token, secret),
            _ => return Err(denied()),
        };
        let inbound_token = params.get("oauth_token").ok_or_else(denied)?;
        if inbound_token != stored_token {
            return Err(denied());
        }
        let verifier = params.get("oauth_verifier").ok_or_else(denied)?;

        let request_token = TokenPair {
            token: stored_token,
            secret: stored_secret,
        };
        let access_token = self.exchange_verifier(&request_token, verifier).await?;

        let profile = self.verify_credentials(&access_token).await?;
        let uid = profile
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                Error::new(ErrorCode::VerifyCredentials, "Verify_credentials error.")
                    .with_raw(profile.clone())
            })?;

        Ok(AuthResult {
            uid,
            info: apply_map(&profile, OAUTH1_RESPONSE_MAP),
            credentials: Credentials::token_pair(access_token.token, access_token.secret),
            raw: profile,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStore;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// What one collaborator call looked like.
    #[derive(Debug, Clone)]
    struct RecordedRequest {
        method: reqwest::Method,
        url: String,
        params: Vec<(String, String)>,
        token: Option<TokenPair>,
    }

    /// Trait double returning a scripted response per call.
    #[derive(Default)]
    struct ScriptedClient {
        responses: Mutex<VecDeque<Result<OAuth1Response, Error>>>,
        requests: Mutex<Vec<RecordedRequest>>,
    }

    impl ScriptedClient {
        fn push_ok(&self, status: u16, body: &str) {
            self.responses.lock().unwrap().push_back(Ok(OAuth1Response {
                status,
                headers: vec![],
                body: body.to_string(),
            }));
        }

        fn push_err(&self) {
            self.responses.lock().unwrap().push_back(Err(Error::new(
                ErrorCode::TokenRequestFailed,
                "connection refused",
            )));
        }
    }

    #[async_trait]
    impl OAuth1Client for &ScriptedClient {
        async fn request(&self, request: OAuth1Request<'_>) -> Result<OAuth1Response, Error> {
            self.requests.lock().unwrap().push(RecordedRequest {
                method: request.method.clone(),
                url: request.url.to_string(),
                params: request
                    .params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                token: request.token.cloned(),
            });
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("scripted response available")
        }
    }

    fn strategy_over(client: &'static ScriptedClient) -> OAuth1Strategy {
        let config = Config::new("consumer_key", "consumer_secret")
            .with_redirect_uri("https://host.example/auth/linkedin/callback");
        OAuth1Strategy::new(config, Box::new(client))
    }

    fn leaked_client() -> &'static ScriptedClient {
        Box::leak(Box::new(ScriptedClient::default()))
    }

    fn callback_params(pairs: &[(&str, &str)]) -> CallbackParams {
        pairs.iter().copied().collect()
    }

    #[tokio::test]
    async fn test_request_stores_token_and_redirects() {
        let client = leaked_client();
        client.push_ok(200, "oauth_token=req_tok&oauth_token_secret=req_sec");
        let strategy = strategy_over(client);
        let session = MemorySessionStore::new();

        let action = strategy.request(&session).await.expect("redirect");

        assert_eq!(session.get(SESSION_OAUTH_TOKEN), Some("req_tok".to_string()));
        assert_eq!(
            session.get(SESSION_OAUTH_TOKEN_SECRET),
            Some("req_sec".to_string())
        );
        assert!(action
            .url
            .starts_with("https://www.linkedin.com/uas/oauth/authenticate?oauth_token=req_tok"));

        let recorded = client.requests.lock().unwrap();
        assert_eq!(recorded[0].method, reqwest::Method::POST);
        assert!(recorded[0]
            .params
            .contains(&("oauth_callback".to_string(), "https://host.example/auth/linkedin/callback".to_string())));
        assert_eq!(recorded[0].token, None);
    }

    #[tokio::test]
    async fn test_request_token_transport_failure() {
        let client = leaked_client();
        client.push_err();
        let strategy = strategy_over(client);
        let session = MemorySessionStore::new();

        let err = strategy.request(&session).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenRequestFailed);
        assert_eq!(session.get(SESSION_OAUTH_TOKEN), None);
    }

    #[tokio::test]
    async fn test_request_token_missing_fields() {
        let client = leaked_client();
        client.push_ok(200, "oauth_token=req_tok");
        let strategy = strategy_over(client);

        let err = strategy.request(&MemorySessionStore::new()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenRequestFailed);
        assert!(err.raw.is_some());
    }

    #[tokio::test]
    async fn test_callback_token_mismatch_is_denied() {
        let client = leaked_client();
        let strategy = strategy_over(client);
        let session = MemorySessionStore::new();
        session.put(SESSION_OAUTH_TOKEN, "expected".to_string());
        session.put(SESSION_OAUTH_TOKEN_SECRET, "sec".to_string());

        let err = strategy
            .callback(
                &session,
                &callback_params(&[("oauth_token", "other"), ("oauth_verifier", "v")]),
            )
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::AccessDenied);
        // Session is consumed even on the denied path.
        assert_eq!(session.get(SESSION_OAUTH_TOKEN), None);
    }

    #[tokio::test]
    async fn test_callback_missing_verifier_is_denied() {
        let client = leaked_client();
        let strategy = strategy_over(client);
        let session = MemorySessionStore::new();
        session.put(SESSION_OAUTH_TOKEN, "req_tok".to_string());
        session.put(SESSION_OAUTH_TOKEN_SECRET, "req_sec".to_string());

        let err = strategy
            .callback(&session, &callback_params(&[("oauth_token", "req_tok")]))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::AccessDenied);
    }

    #[tokio::test]
    async fn test_callback_exchange_rejection() {
        let client = leaked_client();
        client.push_ok(401, "oauth_problem=token_rejected");
        let strategy = strategy_over(client);
        let session = MemorySessionStore::new();
        session.put(SESSION_OAUTH_TOKEN, "req_tok".to_string());
        session.put(SESSION_OAUTH_TOKEN_SECRET, "req_sec".to_string());

        let err = strategy
            .callback(
                &session,
                &callback_params(&[("oauth_token", "req_tok"), ("oauth_verifier", "v")]),
            )
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::OauthTokenExpected);
        assert_eq!(err.raw.unwrap()["status"], 401);
    }

    #[tokio::test]
    async fn test_callback_exchange_missing_token_pair() {
        let client = leaked_client();
        client.push_ok(200, "oauth_callback_confirmed=true");
        let strategy = strategy_over(client);
        let session = MemorySessionStore::new();
        session.put(SESSION_OAUTH_TOKEN, "req_tok".to_string());
        session.put(SESSION_OAUTH_TOKEN_SECRET, "req_sec".to_string());

        let err = strategy
            .callback(
                &session,
                &callback_params(&[("oauth_token", "req_tok"), ("oauth_verifier", "v")]),
            )
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::OauthVerifier);
    }

    #[tokio::test]
    async fn test_callback_end_to_end() {
        let client = leaked_client();
        client.push_ok(200, "oauth_token=acc_tok&oauth_token_secret=acc_sec");
        client.push_ok(
            200,
            r#"<person>
                 <id>42</id>
                 <first-name>Jane</first-name>
                 <last-name>Doe</last-name>
                 <formatted-name>Jane Doe</formatted-name>
                 <location><name>Singapore</name></location>
                 <public-profile-url>https://linkedin.example/jane</public-profile-url>
                 <email-address>jane@example.com</email-address>
               </person>"#,
        );
        let strategy = strategy_over(client);
        let session = MemorySessionStore::new();
        session.put(SESSION_OAUTH_TOKEN, "req_tok".to_string());
        session.put(SESSION_OAUTH_TOKEN_SECRET, "req_sec".to_string());

        let result = strategy
            .callback(
                &session,
                &callback_params(&[("oauth_token", "req_tok"), ("oauth_verifier", "ver123")]),
            )
            .await
            .expect("auth succeeds");

        assert_eq!(result.uid, "42");
        assert_eq!(result.info.name, Some("Jane Doe".to_string()));
        assert_eq!(result.info.first_name, Some("Jane".to_string()));
        assert_eq!(result.info.location, Some("Singapore".to_string()));
        assert_eq!(result.info.email, Some("jane@example.com".to_string()));
        assert_eq!(
            result.info.urls.get("linkedin"),
            Some(&"https://linkedin.example/jane".to_string())
        );
        assert_eq!(
            result.credentials,
            Credentials::token_pair("acc_tok", "acc_sec")
        );

        // Exchange was signed with the request token, profile fetch with
        // the permanent token.
        let recorded = client.requests.lock().unwrap();
        assert_eq!(recorded[0].token.as_ref().unwrap().token, "req_tok");
        assert!(recorded[0]
            .params
            .contains(&("oauth_verifier".to_string(), "ver123".to_string())));
        assert_eq!(recorded[1].token.as_ref().unwrap().token, "acc_tok");
        assert!(recorded[1].url.ends_with(&format!(
            ":({})",
            crate::config::DEFAULT_PROFILE_FIELDS_V1.join(",")
        )));
        assert_eq!(session.get(SESSION_OAUTH_TOKEN), None);
    }

    #[tokio::test]
    async fn test_callback_profile_missing_id() {
        let client = leaked_client();
        client.push_ok(200, "oauth_token=acc_tok&oauth_token_secret=acc_sec");
        client.push_ok(200, "<person><first-name>Jane</first-name></person>");
        let strategy = strategy_over(client);
        let session = MemorySessionStore::new();
        session.put(SESSION_OAUTH_TOKEN, "req_tok".to_string());
        session.put(SESSION_OAUTH_TOKEN_SECRET, "req_sec".to_string());

        let err = strategy
            .callback(
                &session,
                &callback_params(&[("oauth_token", "req_tok"), ("oauth_verifier", "v")]),
            )
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::VerifyCredentials);
    }
}
