//! Search candidates and their lazy resolution to playable URLs

use crate::error::ProviderError;
use crate::webshare::FileSearchProvider;
use std::cell::OnceCell;

/// Where a candidate's playable URL comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateSource {
    /// A file identifier that still has to be resolved by the provider
    Ident(String),
    /// A URL that is already playable
    Resolved(String),
}

/// One search result that may or may not have a playable URL yet
///
/// Resolution happens on demand and at most once: the first successful call
/// to [`SearchCandidate::resolve`] asks the provider, later calls return the
/// remembered answer.
#[derive(Debug, Clone)]
pub struct SearchCandidate {
    /// File name as shown by the provider
    pub name: String,
    /// File size in bytes
    pub size: u64,
    /// Preview image URL
    pub poster: Option<String>,
    source: CandidateSource,
    resolved: OnceCell<String>,
}

impl SearchCandidate {
    /// Creates a candidate that must be resolved through the provider
    pub fn from_ident(
        name: impl Into<String>,
        size: u64,
        poster: Option<String>,
        ident: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            size,
            poster,
            source: CandidateSource::Ident(ident.into()),
            resolved: OnceCell::new(),
        }
    }

    /// Creates a candidate whose URL is already known
    pub fn from_url(
        name: impl Into<String>,
        size: u64,
        poster: Option<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            size,
            poster,
            source: CandidateSource::Resolved(url.into()),
            resolved: OnceCell::new(),
        }
    }

    pub fn source(&self) -> &CandidateSource {
        &self.source
    }

    /// Provider-internal file identifier, if this candidate has one
    pub fn ident(&self) -> Option<&str> {
        match &self.source {
            CandidateSource::Ident(ident) => Some(ident),
            CandidateSource::Resolved(_) => None,
        }
    }

    /// Listing label: file name followed by a human readable size
    pub fn label(&self) -> String {
        format!(
            "{} [{}]",
            self.name,
            humansize::format_size(self.size, humansize::DECIMAL)
        )
    }

    /// Returns the playable URL, asking the provider on first use
    ///
    /// `Ok(None)` means the provider has no link for this file. That answer is
    /// remembered as well, so a candidate never causes more than one round trip.
    pub fn resolve<P>(&self, provider: &P) -> Result<Option<&str>, ProviderError>
    where
        P: FileSearchProvider + ?Sized,
    {
        let url = match &self.source {
            CandidateSource::Resolved(url) => url.as_str(),
            CandidateSource::Ident(ident) => match self.resolved.get() {
                Some(url) => url.as_str(),
                None => {
                    let link = provider.file_link(ident)?;
                    self.resolved.get_or_init(|| link).as_str()
                }
            },
        };

        Ok(if url.is_empty() { None } else { Some(url) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webshare::{SearchPage, SearchRequest};
    use std::cell::Cell;

    struct CountingProvider {
        calls: Cell<usize>,
        link: &'static str,
    }

    impl FileSearchProvider for CountingProvider {
        fn search(&self, _request: &SearchRequest) -> Result<SearchPage, ProviderError> {
            unreachable!("search is not used by candidates")
        }

        fn file_link(&self, ident: &str) -> Result<String, ProviderError> {
            self.calls.set(self.calls.get() + 1);
            assert_eq!(ident, "abc123");
            Ok(self.link.to_string())
        }
    }

    #[test]
    fn test_resolution_is_memoized() {
        let provider = CountingProvider {
            calls: Cell::new(0),
            link: "https://cdn.example.test/file.mkv",
        };
        let candidate = SearchCandidate::from_ident("file.mkv", 1_000, None, "abc123");

        let first = candidate.resolve(&provider).unwrap().map(str::to_string);
        let second = candidate.resolve(&provider).unwrap().map(str::to_string);

        assert_eq!(provider.calls.get(), 1);
        assert_eq!(first, second);
        assert_eq!(first.as_deref(), Some("https://cdn.example.test/file.mkv"));
    }

    #[test]
    fn test_missing_link_is_unavailable_and_memoized() {
        let provider = CountingProvider {
            calls: Cell::new(0),
            link: "",
        };
        let candidate = SearchCandidate::from_ident("file.mkv", 1_000, None, "abc123");

        assert_eq!(candidate.resolve(&provider).unwrap(), None);
        assert_eq!(candidate.resolve(&provider).unwrap(), None);
        assert_eq!(provider.calls.get(), 1);
    }

    #[test]
    fn test_pre_resolved_url_skips_provider() {
        let provider = CountingProvider {
            calls: Cell::new(0),
            link: "unused",
        };
        let candidate =
            SearchCandidate::from_url("stream", 0, None, "https://stream.example.test/a.m3u8");

        assert_eq!(
            candidate.resolve(&provider).unwrap(),
            Some("https://stream.example.test/a.m3u8")
        );
        assert_eq!(provider.calls.get(), 0);
        assert_eq!(candidate.ident(), None);
    }

    #[test]
    fn test_label_contains_human_size() {
        let candidate = SearchCandidate::from_ident("Movie.2010.mkv", 1_500_000_000, None, "x");
        let label = candidate.label();
        assert!(label.starts_with("Movie.2010.mkv ["));
        assert!(label.ends_with("GB]"));
    }
}
