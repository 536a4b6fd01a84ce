//! Sheets client configuration

use std::time::Duration;

/// Default endpoint for the Sheets v4 REST API
pub const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";

/// Default OAuth userinfo endpoint
pub const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// Configuration for [`crate::SheetsClient`]
#[derive(Clone)]
pub struct SheetsClientConfig {
    /// Base URL of the Sheets API (overridden in tests)
    pub sheets_base_url: String,

    /// OAuth userinfo endpoint
    pub userinfo_url: String,

    /// API key sent as the `key` query parameter
    pub api_key: Option<String>,

    /// OAuth access token sent as a bearer credential
    pub access_token: Option<String>,

    /// Total request timeout; `None` waits until the transport gives up
    pub timeout: Option<Duration>,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Idle connection timeout
    pub pool_idle_timeout: Duration,

    /// User-Agent header value
    pub user_agent: String,

    /// Enable gzip compression
    pub gzip: bool,
}

impl Default for SheetsClientConfig {
    fn default() -> Self {
        Self {
            sheets_base_url: SHEETS_BASE_URL.to_string(),
            userinfo_url: USERINFO_URL.to_string(),
            api_key: None,
            access_token: None,
            timeout: None,
            connect_timeout: Duration::from_secs(10),
            pool_max_idle_per_host: 10,
            pool_idle_timeout: Duration::from_secs(90),
            user_agent: format!("gundeshapur-sheets/{}", env!("CARGO_PKG_VERSION")),
            gzip: true,
        }
    }
}

impl SheetsClientConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the client at a different Sheets endpoint
    pub fn sheets_base_url(mut self, url: impl Into<String>) -> Self {
        self.sheets_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn userinfo_url(mut self, url: impl Into<String>) -> Self {
        self.userinfo_url = url.into();
        self
    }

    /// Set the API key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the OAuth access token
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the total timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set max idle connections per host
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Set the User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Enable/disable gzip compression
    pub fn gzip(mut self, enabled: bool) -> Self {
        self.gzip = enabled;
        self
    }
}

// Credentials never reach logs.
impl std::fmt::Debug for SheetsClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsClientConfig")
            .field("sheets_base_url", &self.sheets_base_url)
            .field("userinfo_url", &self.userinfo_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}
