//! # linkedin-auth
//!
//! LinkedIn sign-in strategies for a pluggable authentication broker:
//! - OAuth 2.0 authorization-code flow against the v2 profile API
//! - OAuth 1.0a flow against the v1 profile API, with signing delegated to
//!   a host-supplied [`oauth1::OAuth1Client`]
//! - A common [`Strategy`] contract: `request()` returns the browser
//!   redirect, `callback()` turns the provider's redirect parameters into
//!   a normalized [`AuthResult`]
//! - Session-scoped state handling across the redirect round trip
//!
//! The two revisions are mutually exclusive implementations of the same
//! trait; hosts pick one per configured provider. Hosting concerns
//! (routing, cookies, issuing the redirect) stay with the broker.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use linkedin_auth::{Config, MemorySessionStore, OAuth2Strategy, Strategy};
//!
//! let config = Config::new(api_key, secret_key)
//!     .with_redirect_uri("https://host.example/auth/linkedin/callback");
//! let strategy = OAuth2Strategy::new(config)?;
//!
//! let redirect = strategy.request(&session).await?;
//! // ...browser round trip...
//! let result = strategy.callback(&session, &params).await?;
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod oauth1;
pub mod oauth2;
pub mod session;
pub mod strategy;

mod profile;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, ErrorCode};
pub use oauth1::OAuth1Strategy;
pub use oauth2::OAuth2Strategy;
pub use session::{MemorySessionStore, SessionStore};
pub use strategy::{AuthResult, CallbackParams, Credentials, RedirectAction, Strategy, UserInfo};
