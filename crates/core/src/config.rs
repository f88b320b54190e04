//! Client and session configuration.

use std::collections::HashMap;
use std::time::Duration;

use nai_protocol::Host;

/// Default transport timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default idle period before an auto-closing session shuts down.
pub const DEFAULT_CLOSE_DELAY: Duration = Duration::from_secs(300);

/// Options applied when a session logs in.
///
/// They are stored on the session and reused for every lazy re-login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Per-request timeout of the transport.
    pub timeout: Duration,
    /// Close the session after `close_delay` without successful requests.
    pub auto_close: bool,
    /// Idle period for `auto_close`, and default wait of `close`.
    pub close_delay: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            auto_close: false,
            close_delay: DEFAULT_CLOSE_DELAY,
        }
    }
}

impl SessionOptions {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables idle auto-close after `close_delay`.
    pub fn auto_close(mut self, close_delay: Duration) -> Self {
        self.auto_close = true;
        self.close_delay = close_delay;
        self
    }

    pub fn close_delay(mut self, close_delay: Duration) -> Self {
        self.close_delay = close_delay;
        self
    }
}

/// Where and how the client connects.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    base_urls: HashMap<Host, String>,
    proxy: Option<String>,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes requests for `host` to `url` instead of the production address.
    ///
    /// A trailing slash is ignored.
    pub fn base_url(mut self, host: Host, url: impl Into<String>) -> Self {
        let mut url = url.into();
        while url.ends_with('/') {
            url.pop();
        }
        self.base_urls.insert(host, url);
        self
    }

    /// Sends every request through an HTTP(S) proxy.
    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.proxy = Some(url.into());
        self
    }

    /// Base URL used for `host`.
    pub fn url_for(&self, host: Host) -> &str {
        self.base_urls.get(&host).map(String::as_str).unwrap_or(host.default_url())
    }

    /// Base URL used for login. Authentication always goes through the API host.
    pub fn login_url(&self) -> &str {
        self.url_for(Host::Api)
    }

    pub fn proxy_url(&self) -> Option<&str> {
        self.proxy.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_defaults() {
        let opts = SessionOptions::default();
        assert_eq!(opts.timeout, Duration::from_secs(30));
        assert!(!opts.auto_close);
        assert_eq!(opts.close_delay, Duration::from_secs(300));
    }

    #[test]
    fn auto_close_sets_delay() {
        let opts = SessionOptions::default().auto_close(Duration::from_secs(5));
        assert!(opts.auto_close);
        assert_eq!(opts.close_delay, Duration::from_secs(5));
    }

    #[test]
    fn base_url_overrides_per_host() {
        let config = ClientConfig::new().base_url(Host::Web, "http://127.0.0.1:9000/");
        assert_eq!(config.url_for(Host::Web), "http://127.0.0.1:9000");
        assert_eq!(config.url_for(Host::Api), "https://api.novelai.net");
        assert_eq!(config.login_url(), "https://api.novelai.net");
        assert!(config.proxy_url().is_none());
    }
}
