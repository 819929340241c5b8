//! FedAPI stream resolver
//!
//! Resolves an external title identifier (IMDb style `tt…`) to stream URLs by
//! quality, plus subtitles. Authentication is a static UI token obtained out of
//! band; there is no login call. Titles are looked up through the public IMDb
//! suggestion endpoint, which answers with JSONP.
mod types;

use crate::catalog::{ExternalTitle, QualityMap};
use crate::error::ProviderError;
use crate::http::{ensure_success, random_user_agent};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN, USER_AGENT};
use std::time::Duration;
use tracing::{debug, info};
use types::{FedStreams, Suggestions};

/// Default base URL of the stream API
pub const DEFAULT_BASE_URL: &str = "https://fed-api-europe.pstream.org";

/// Default base URL of the title suggestion service
pub const DEFAULT_SUGGEST_URL: &str = "https://sg.media-imdb.com";

/// Origin the stream API expects
const ORIGIN_VALUE: &str = "https://pstream.org";

/// Prefix of title identifiers in suggestion results
const TITLE_ID_PREFIX: &str = "tt";

/// Client for the FedAPI stream service
pub struct FedApi {
    client: Client,
    base_url: String,
    suggest_url: String,
}

impl FedApi {
    /// Creates a resolver for the public endpoints using the given UI token
    pub fn new(ui_token: &str, timeout: Duration) -> Result<Self, ProviderError> {
        Self::with_base_urls(ui_token, DEFAULT_BASE_URL, DEFAULT_SUGGEST_URL, timeout)
    }

    /// Creates a resolver against different stream and suggestion roots
    pub fn with_base_urls(
        ui_token: &str,
        base_url: impl Into<String>,
        suggest_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let ui_token = ui_token.trim();
        if ui_token.is_empty() {
            return Err(ProviderError::InvalidInput(
                "UI token must not be empty".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            "ui-token",
            HeaderValue::from_str(ui_token)
                .map_err(|e| ProviderError::InvalidInput(format!("invalid UI token: {e}")))?,
        );
        headers.insert(ORIGIN, HeaderValue::from_static(ORIGIN_VALUE));
        headers.insert(USER_AGENT, HeaderValue::from_static(random_user_agent()));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            suggest_url: suggest_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Resolves the streams of a movie
    ///
    /// A response without any stream is an error: once an identifier is known
    /// to exist the service is expected to offer at least one rendition.
    pub fn movie_streams(&self, external_id: &str) -> Result<QualityMap, ProviderError> {
        let url = format!("{}/movie/{}", self.base_url, external_id);
        self.fetch_streams(&url, external_id)
    }

    /// Resolves the streams of one episode of a series
    pub fn episode_streams(
        &self,
        external_id: &str,
        season: u32,
        episode: u32,
    ) -> Result<QualityMap, ProviderError> {
        let url = format!("{}/tv/{}/{}/{}", self.base_url, external_id, season, episode);
        self.fetch_streams(&url, &format!("{external_id} S{season:02}E{episode:02}"))
    }

    /// Looks up titles matching a free-text query
    ///
    /// Only entries with a title identifier are returned. An empty suggestion
    /// list is an error.
    pub fn search_external_id(&self, query: &str) -> Result<Vec<ExternalTitle>, ProviderError> {
        let query = query.trim();
        let Some(first) = query.chars().next() else {
            return Err(ProviderError::InvalidInput(
                "search query must not be empty".to_string(),
            ));
        };

        let url = format!("{}/suggests/{}/{}.json", self.suggest_url, first, query);
        debug!(%url, "Suggestion request");
        let body = ensure_success(self.client.get(&url).send()?)?.text()?;

        let suggestions: Suggestions = serde_json::from_str(unwrap_jsonp(&body)?)
            .map_err(|e| ProviderError::Malformed(format!("Invalid suggestion JSON: {e}")))?;
        if suggestions.d.is_empty() {
            return Err(ProviderError::NotFound(format!("No results found for {query}")));
        }

        let titles: Vec<ExternalTitle> = suggestions
            .d
            .into_iter()
            .filter(|s| s.id.starts_with(TITLE_ID_PREFIX))
            .map(|s| ExternalTitle {
                id: s.id,
                title: s.l,
                year: s.y.map(|y| y.to_string()).unwrap_or_default(),
                kind: s.qid.unwrap_or_default(),
            })
            .collect();

        info!(query, count = titles.len(), "Suggestion search finished");
        Ok(titles)
    }

    fn fetch_streams(&self, url: &str, what: &str) -> Result<QualityMap, ProviderError> {
        debug!(%url, "FedAPI request");
        let response = ensure_success(self.client.get(url).send()?)?;
        let body: FedStreams = response
            .json()
            .map_err(|e| ProviderError::Malformed(format!("Invalid FedAPI JSON: {e}")))?;

        let map = QualityMap {
            streams: body.stream_map(),
            subtitles: body.subtitle_map(),
        };
        if map.is_empty() {
            return Err(ProviderError::NotFound(format!("No streams found for {what}")));
        }

        info!(
            what,
            qualities = map.streams.len(),
            subtitles = map.subtitles.len(),
            "Streams resolved"
        );
        Ok(map)
    }
}

/// Strips the callback wrapper of a JSONP body
///
/// Keeps everything from the first `{` and drops the single trailing character
/// (the closing parenthesis of the callback).
fn unwrap_jsonp(body: &str) -> Result<&str, ProviderError> {
    let start = body.find('{').ok_or_else(|| {
        ProviderError::Malformed("Suggestion response holds no JSON object".to_string())
    })?;
    let inner = &body[start..];
    let mut chars = inner.chars();
    chars.next_back();
    Ok(chars.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::DEFAULT_TIMEOUT;
    use crate::http::stub::{Route, StubServer};

    const SUGGESTIONS: &str = r#"imdb$breaking_bad({"v":1,"q":"breaking_bad","d":[
        {"l":"Breaking Bad","id":"tt0903747","s":"Bryan Cranston, Aaron Paul","y":2008,"q":"TV series","qid":"tvSeries"},
        {"l":"Bryan Cranston","id":"nm0186505","s":"Actor"},
        {"l":"El Camino: A Breaking Bad Movie","id":"tt9243946","y":2019,"qid":"movie"}
    ]})"#;

    fn resolver(server: &StubServer) -> FedApi {
        FedApi::with_base_urls("secret-token", &server.base_url, &server.base_url, DEFAULT_TIMEOUT)
            .unwrap()
    }

    #[test]
    fn test_unwrap_jsonp() {
        assert_eq!(unwrap_jsonp(r#"cb({"d":[]})"#).unwrap(), r#"{"d":[]}"#);
        assert!(unwrap_jsonp("no json here").is_err());
    }

    #[test]
    fn test_movie_streams_send_token_and_origin() {
        let server = StubServer::start(vec![Route::ok(
            "/movie/tt9243946",
            r#"{"streams":{"ORG":"https://s.example.test/org.m3u8"},"subtitles":{"English":{"subtitle_link":"https://sub.example.test/en.srt"}}}"#,
        )]);

        let map = resolver(&server).movie_streams("tt9243946").unwrap();
        assert_eq!(map.stream("ORG"), Some("https://s.example.test/org.m3u8"));
        assert_eq!(map.subtitles["English"], "https://sub.example.test/en.srt");

        let request = &server.requests()[0];
        assert_eq!(request.header("ui-token"), Some("secret-token"));
        assert_eq!(request.header("origin"), Some("https://pstream.org"));
    }

    #[test]
    fn test_episode_without_streams_is_not_found() {
        let server = StubServer::start(vec![Route::ok(
            "/tv/tt0903747/2/9",
            r#"{"streams":{},"subtitles":{}}"#,
        )]);

        let err = resolver(&server).episode_streams("tt0903747", 2, 9).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("tt0903747 S02E09"));
    }

    #[test]
    fn test_stream_http_failure_is_transport_error() {
        let server = StubServer::start(vec![Route::status("/movie/tt1", 401, "bad token")]);
        let err = resolver(&server).movie_streams("tt1").unwrap_err();
        assert!(matches!(err, ProviderError::Transport { status: 401, .. }));
    }

    #[test]
    fn test_search_external_id_filters_titles() {
        let server = StubServer::start(vec![Route::ok("/suggests/b/breaking.json", SUGGESTIONS)]);

        let titles = resolver(&server).search_external_id("breaking").unwrap();
        assert_eq!(titles.len(), 2);
        assert_eq!(titles[0].id, "tt0903747");
        assert_eq!(titles[0].title, "Breaking Bad");
        assert_eq!(titles[0].year, "2008");
        assert_eq!(titles[0].kind, "tvSeries");
        assert_eq!(titles[1].kind, "movie");
    }

    #[test]
    fn test_search_external_id_empty_list_is_not_found() {
        let server = StubServer::start(vec![Route::ok(
            "/suggests/z/zzzz.json",
            r#"imdb$zzzz({"v":1,"q":"zzzz","d":[]})"#,
        )]);
        let err = resolver(&server).search_external_id("zzzz").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_empty_token_is_rejected() {
        let result = FedApi::new("   ", DEFAULT_TIMEOUT);
        assert!(matches!(result, Err(ProviderError::InvalidInput(_))));
    }
}
