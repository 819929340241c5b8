//! Error taxonomy shared by all content providers

use thiserror::Error;

/// Errors that can occur while talking to a content provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider rejected the credentials or answered a login with a non-OK status
    #[error("Authentication failed ({code}): {message}")]
    Auth { code: String, message: String },

    /// The provider answered with a non-success HTTP status
    #[error("Request to {url} failed with HTTP {status}\nResponse: {body}")]
    Transport {
        url: String,
        status: u16,
        body: String,
    },

    /// The request could not be sent or its body could not be read
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The response body was not the XML or JSON the provider promises
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Nothing was found where at least one result is required
    #[error("Not found: {0}")]
    NotFound(String),

    /// A mandatory field could not be extracted from scraped markup
    #[error("Failed to parse markup: {0}")]
    Parse(String),

    /// The caller passed input the provider cannot work with
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ProviderError {
    /// Returns true for failures of the transport layer (HTTP status, I/O, malformed bodies)
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ProviderError::Transport { .. } | ProviderError::Request(_) | ProviderError::Malformed(_)
        )
    }

    /// Returns true for authentication failures
    pub fn is_auth(&self) -> bool {
        matches!(self, ProviderError::Auth { .. })
    }

    /// Returns true when the provider had nothing to offer
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound(_))
    }
}
