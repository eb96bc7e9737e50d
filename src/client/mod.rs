pub mod spotify;
pub mod ytmusic;

pub use spotify::SpotifyClient;
pub use ytmusic::YouTubeMusicClient;

use crate::config::Config;
use crate::models::{CandidateTrack, Catalog};
use std::time::Duration;
use thiserror::Error;
use ureq::{Agent, AgentBuilder};

/// Failure of a single catalog API call
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },
    #[error("server error {status}: {body}")]
    Server { status: u16, body: String },
    #[error("request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("could not decode response: {0}")]
    Decode(String),
}

impl CatalogError {
    /// Rate limits and server errors are worth another attempt.
    ///
    /// A transport failure is not: the request may already have been applied,
    /// and resending a playlist add would duplicate its tracks.
    pub fn is_transient(&self) -> bool {
        matches!(self, CatalogError::RateLimited { .. } | CatalogError::Server { .. })
    }

    /// The server's own wait hint, when it sent one
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            CatalogError::RateLimited {
                retry_after: Some(secs),
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}

impl From<ureq::Error> for CatalogError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(429, response) => CatalogError::RateLimited {
                retry_after: response
                    .header("Retry-After")
                    .and_then(|v| v.trim().parse::<u64>().ok()),
            },
            ureq::Error::Status(status, response) if status >= 500 => CatalogError::Server {
                status,
                body: response.into_string().unwrap_or_default(),
            },
            ureq::Error::Status(status, response) => CatalogError::Rejected {
                status,
                body: response.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(transport) => CatalogError::Transport(transport.to_string()),
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Decode(err.to_string())
    }
}

/// The calls this pipeline makes against a streaming catalog.
///
/// Implementations hold the access token and are shared read-only between
/// resolution workers.
#[cfg_attr(test, mockall::automock)]
pub trait CatalogClient: Send + Sync {
    /// Search for tracks matching `query`, returning at most `limit` hits
    fn search(&self, query: &str, limit: usize) -> Result<Vec<CandidateTrack>, CatalogError>;

    /// Append `uris` to the playlist in one call
    fn add_items(&self, playlist_id: &str, uris: &[String]) -> Result<(), CatalogError>;

    /// Create a private playlist and return its id
    fn create_playlist(&self, name: &str, description: &str) -> Result<String, CatalogError>;
}

/// Build the client matching the configured catalog
pub fn connect(config: Config) -> Box<dyn CatalogClient> {
    match config.catalog {
        Catalog::Spotify => Box::new(SpotifyClient::new(config)),
        Catalog::YouTubeMusic => Box::new(YouTubeMusicClient::new(config)),
    }
}

/// HTTP agent with the request-level timeout applied to every call
fn build_agent(config: &Config) -> Agent {
    AgentBuilder::new()
        .timeout(config.request_timeout)
        .user_agent(concat!("mood-playlist/", env!("CARGO_PKG_VERSION")))
        .build()
}
