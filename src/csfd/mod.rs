//! CSFD catalog scraper
//!
//! Searches the CSFD movie database and walks series down to their seasons and
//! episodes by scraping the public HTML pages.
mod parse;

use crate::catalog::{Episode, Season, SeriesRef, Title, TitleKind};
use crate::error::ProviderError;
use crate::http::{build_client, ensure_success, random_user_agent};
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default base URL of the CSFD website
pub const DEFAULT_BASE_URL: &str = "https://www.csfd.cz";

/// Trait for catalogs that describe titles, seasons and episodes.
///
/// Every call builds fresh entities; nothing is cached between calls.
pub trait CatalogProvider {
    /// Searches titles of the given kind
    ///
    /// Entries that fail to load are skipped rather than failing the search.
    fn search(&self, query: &str, kind: TitleKind) -> Result<Vec<Title>, ProviderError>;

    /// Loads the full description of one title
    fn detail(&self, id: &str) -> Result<Title, ProviderError>;

    /// Lists the seasons of a series, sorted by season number
    fn seasons(&self, series_id: &str) -> Result<Vec<Season>, ProviderError>;

    /// Lists the episodes of one season, sorted by episode number
    fn episodes(&self, series: &SeriesRef, season_id: &str) -> Result<Vec<Episode>, ProviderError>;
}

/// Scraper for csfd.cz
pub struct Csfd {
    client: Client,
    base_url: String,
}

impl Csfd {
    /// Creates a scraper for the public CSFD website
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    /// Creates a scraper against a different site root
    pub fn with_base_url(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(timeout, None)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetches a page, failing on any non-success status
    fn fetch(&self, path: &str, query: &[(&str, &str)]) -> Result<String, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "CSFD request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .header(USER_AGENT, random_user_agent())
            .send()?;
        Ok(ensure_success(response)?.text()?)
    }
}

impl CatalogProvider for Csfd {
    fn search(&self, query: &str, kind: TitleKind) -> Result<Vec<Title>, ProviderError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ProviderError::InvalidInput(
                "search query must not be empty".to_string(),
            ));
        }

        let html = self.fetch("/hledat/", &[("q", query)])?;
        let hits = parse::parse_search(&html, kind)?;

        let mut titles = Vec::with_capacity(hits.len());
        for hit in hits {
            match self.detail(&hit.id) {
                Ok(mut title) => {
                    title.kind = hit.kind;
                    titles.push(title);
                }
                Err(e) => {
                    warn!(id = %hit.id, error = %e, "Skipping search result whose detail failed to load");
                }
            }
        }

        info!(query, %kind, count = titles.len(), "CSFD search finished");
        Ok(titles)
    }

    fn detail(&self, id: &str) -> Result<Title, ProviderError> {
        let html = self.fetch(&format!("/film/{}/prehled/", id), &[])?;
        parse::parse_detail(&html, id)
    }

    fn seasons(&self, series_id: &str) -> Result<Vec<Season>, ProviderError> {
        let html = self.fetch(&format!("/film/{}/prehled/", series_id), &[])?;
        parse::parse_seasons(&html, series_id)
    }

    fn episodes(&self, series: &SeriesRef, season_id: &str) -> Result<Vec<Episode>, ProviderError> {
        let html = self.fetch(&format!("/film/{}/{}/prehled/", series.id, season_id), &[])?;
        parse::parse_episodes(&html, series)
    }
}
