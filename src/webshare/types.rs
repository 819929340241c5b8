/// Webshare API response types for deserialization.
///
/// Every endpoint answers with a `<response>` document carrying a `<status>`
/// element plus endpoint specific fields; these structures mirror that shape.
use crate::error::ProviderError;
use serde::Deserialize;

/// Status value of a successful response
const STATUS_OK: &str = "OK";

/// The `<response>` document returned by every Webshare endpoint.
#[derive(Debug, Default, Deserialize)]
pub(super) struct WsResponse {
    /// "OK" on success, "ERROR" or "FATAL" otherwise
    pub status: String,
    /// Machine readable error code (e.g. `LOGIN_FATAL_1`)
    #[serde(default)]
    pub code: Option<String>,
    /// Human readable error message
    #[serde(default)]
    pub message: Option<String>,
    /// Password salt (`/api/salt/`)
    #[serde(default)]
    pub salt: Option<String>,
    /// Session token (`/api/login/`)
    #[serde(default)]
    pub token: Option<String>,
    /// Direct download link (`/api/file_link/`)
    #[serde(default)]
    pub link: Option<String>,
    /// Total number of search hits (`/api/search/`)
    #[serde(default)]
    pub total: Option<u64>,
    /// Search hits (`/api/search/`)
    #[serde(default, rename = "file")]
    pub files: Vec<WsFile>,
}

/// A single `<file>` entry of a search response.
#[derive(Debug, Deserialize)]
pub(super) struct WsFile {
    /// File identifier used to request a download link
    pub ident: String,
    /// File name
    pub name: String,
    /// Size in bytes
    #[serde(default)]
    pub size: u64,
    /// Preview image URL (may be empty)
    #[serde(default)]
    pub img: Option<String>,
}

impl WsResponse {
    /// Parses a response body
    pub fn parse(body: &str) -> Result<Self, ProviderError> {
        quick_xml::de::from_str(body)
            .map_err(|e| ProviderError::Malformed(format!("Invalid Webshare XML: {}", e)))
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Error code, or the status itself when the server sent no code
    pub fn error_code(&self) -> String {
        self.code
            .clone()
            .filter(|code| !code.is_empty())
            .unwrap_or_else(|| self.status.clone())
    }

    pub fn error_message(&self) -> String {
        self.message.clone().unwrap_or_default()
    }

    /// Converts a non-OK response into an authentication error
    pub fn require_ok_for_auth(self) -> Result<Self, ProviderError> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(ProviderError::Auth {
                code: self.error_code(),
                message: self.error_message(),
            })
        }
    }

    /// Converts a non-OK response into a malformed-response error
    pub fn require_ok(self) -> Result<Self, ProviderError> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(ProviderError::Malformed(format!(
                "Webshare returned status {} ({}): {}",
                self.status,
                self.error_code(),
                self.error_message()
            )))
        }
    }
}
