//! Session-scoped key/value state for the redirect round trip.
//!
//! The OAuth1 flow persists its request-token pair between `request()` and
//! `callback()`. The store is passed by reference into both calls rather
//! than living in ambient global state, and is consumed-then-cleared at the
//! start of `callback()` so nothing outlives a single auth attempt.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rand::Rng;

/// Key under which the OAuth1 request token is stored.
pub const SESSION_OAUTH_TOKEN: &str = "oauth_token";
/// Key under which the OAuth1 request token secret is stored.
pub const SESSION_OAUTH_TOKEN_SECRET: &str = "oauth_token_secret";

/// Transient key/value storage scoped to one browser session.
pub trait SessionStore: Send + Sync {
    /// Store a value.
    fn put(&self, key: &str, value: String);

    /// Read a value without removing it.
    fn get(&self, key: &str) -> Option<String>;

    /// Remove and return a value.
    fn take(&self, key: &str) -> Option<String>;

    /// Drop all stored state.
    fn clear(&self);
}

/// In-memory session store backed by a mutexed map.
///
/// Suitable for tests and single-process hosts; broker frameworks with a
/// real session layer implement [`SessionStore`] over it instead.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn put(&self, key: &str, value: String) {
        let mut values = self.values.lock().unwrap();
        values.insert(key.to_string(), value);
    }

    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.lock().unwrap();
        values.get(key).cloned()
    }

    fn take(&self, key: &str) -> Option<String> {
        let mut values = self.values.lock().unwrap();
        values.remove(key)
    }

    fn clear(&self) {
        let mut values = self.values.lock().unwrap();
        values.clear();
    }
}

/// Generate a random state token for CSRF protection.
///
/// 32 random bytes, hex encoded. The original strategy derived this from a
/// timestamp hash, which is predictable; a configured `state` value still
/// overrides generation for hosts that need fixed values.
pub(crate) fn generate_state_token() -> String {
    let random_bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(random_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let store = MemorySessionStore::new();
        store.put("oauth_token", "abc".to_string());
        assert_eq!(store.get("oauth_token"), Some("abc".to_string()));
    }

    #[test]
    fn test_take_removes_value() {
        let store = MemorySessionStore::new();
        store.put("oauth_token", "abc".to_string());
        assert_eq!(store.take("oauth_token"), Some("abc".to_string()));
        assert_eq!(store.get("oauth_token"), None);
    }

    #[test]
    fn test_clear() {
        let store = MemorySessionStore::new();
        store.put("a", "1".to_string());
        store.put("b", "2".to_string());
        store.clear();
        assert_eq!(store.get("a"), None);
        assert_eq!(store.get("b"), None);
    }

    #[test]
    fn test_state_token_shape() {
        let token = generate_state_token();
        assert_eq!(token.len(), 64); // 32 bytes hex encoded
        assert_ne!(token, generate_state_token());
    }
}
