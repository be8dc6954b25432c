//! HTTP client construction for the OAuth2 transport.

use std::time::Duration;

/// HTTP client configuration.
///
/// The timeout defaults mirror the transport knobs the original strategy
/// exposed (30s connect, 10s request); hosts tune them through
/// [`crate::Config`] and they are passed to the client verbatim.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Full request timeout.
    pub timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            timeout: Duration::from_secs(10),
            user_agent: format!("linkedin-auth/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Build a reqwest client from this configuration.
    ///
    /// No retry middleware is attached: a failed exchange terminates the
    /// auth attempt and the caller restarts from `request()`.
    pub fn build(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let config = HttpClientConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_with_timeout() {
        let config = HttpClientConfig::default().with_timeout(Duration::from_secs(60));
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_build_client() {
        let config = HttpClientConfig::default();
        assert!(config.build().is_ok());
    }
}
