use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};

use crate::catalog::CatalogConfig;
use crate::error::SourceError;

const DEFAULT_USER_AGENT: &str = concat!("content-sources/", env!("CARGO_PKG_VERSION"));

/// Configurable options for HTTP transports and catalogers
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Overall timeout for the entire HTTP request
    pub timeout: Duration,

    /// Connection timeout (time to establish initial connection)
    pub connect_timeout: Duration,

    /// Whether to follow redirects
    pub follow_redirects: bool,

    /// User agent string
    pub user_agent: String,

    /// Custom HTTP headers for requests
    pub headers: HeaderMap,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            follow_redirects: true,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: TransportConfig::default_headers(),
        }
    }
}

impl TransportConfig {
    pub fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT_ENCODING,
            HeaderValue::from_static("gzip, deflate"),
        );
        headers.insert(
            reqwest::header::CONNECTION,
            HeaderValue::from_static("keep-alive"),
        );
        headers
    }
}

/// Create a reqwest Client with the provided configuration
pub fn create_client(config: &TransportConfig) -> Result<Client, SourceError> {
    let mut builder = Client::builder()
        .pool_max_idle_per_host(5)
        .user_agent(&config.user_agent)
        .default_headers(config.headers.clone())
        .redirect(if config.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        });

    if !config.timeout.is_zero() {
        builder = builder.timeout(config.timeout);
    }
    if !config.connect_timeout.is_zero() {
        builder = builder.connect_timeout(config.connect_timeout);
    }

    builder.build().map_err(SourceError::from)
}

/// Configuration for a [`Coordinator`](crate::coordinator::Coordinator)
#[derive(Debug, Clone, Default)]
pub struct CoordinatorConfig {
    /// Directory of content source descriptor files. `None` selects the
    /// platform default.
    pub sources_path: Option<PathBuf>,

    /// Catalog storage configuration
    pub catalog: CatalogConfig,

    /// HTTP options shared by transports and catalogers
    pub transport: TransportConfig,
}
