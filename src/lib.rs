//! Simple Stream - Find a movie or an episode and get one playable stream URL
//!
//! This library ties together three very different content providers: a
//! credentialed file search service (Webshare), a scraped movie catalog (CSFD)
//! and a token-authenticated stream resolver (FedAPI). Catalog entries are
//! turned into file search queries, the queries are aggregated into one flat
//! candidate list, and a candidate is resolved to a URL only once picked.

pub mod action;
pub mod aggregator;
pub mod browse;
pub mod candidate;
pub mod catalog;
pub mod config;
pub mod csfd;
pub mod error;
pub mod fedapi;
pub mod host;
mod http;
pub mod md5crypt;
pub mod webshare;

// Re-export error types
pub use action::ActionError;
pub use config::ConfigError;
pub use error::ProviderError;
pub use host::HostError;

// Re-export the types most callers need
pub use action::Action;
pub use aggregator::{SearchEvent, search_all};
pub use browse::{Browser, Outcome, Session};
pub use candidate::SearchCandidate;
pub use catalog::{
    CatalogEntry, Credentials, Episode, ExternalTitle, QualityMap, Season, SeriesRef, Title,
    TitleKind, search_queries,
};
pub use config::Config;
pub use csfd::{CatalogProvider, Csfd};
pub use fedapi::FedApi;
pub use host::{Host, ListItem, NoticeLevel, TerminalHost};
pub use webshare::{FileSearchProvider, SearchPage, SearchRequest, Webshare, WebshareSession};

use thiserror::Error;

/// Top-level error type for Simple Stream operations
#[derive(Debug, Error)]
pub enum SimpleStreamError {
    /// Error reported by a content provider
    #[error("{0}")]
    Provider(#[from] ProviderError),

    /// Error while loading the configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error while decoding an action payload
    #[error("{0}")]
    Action(#[from] ActionError),

    /// Error while interacting with the user or the player
    #[error("{0}")]
    Host(#[from] HostError),

    /// File search was requested but no Webshare credentials are configured
    #[error(
        "Webshare credentials are not configured (set [webshare] username and password, or SIMPLE_STREAM_WS_USERNAME and SIMPLE_STREAM_WS_PASSWORD)"
    )]
    MissingCredentials,

    /// Stream resolution was requested but no FedAPI UI token is configured
    #[error("FedAPI UI token is not configured (set [fedapi] ui_token or SIMPLE_STREAM_UI_TOKEN)")]
    MissingUiToken,
}
