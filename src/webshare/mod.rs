//! Webshare file-search provider
//!
//! Webshare is a credentialed file hosting service with a form-encoded,
//! XML-answering API. Logging in is a two step dance: fetch the account's
//! password salt, then submit the salted hash (see [`crate::md5crypt`]). The
//! returned session token authorizes searching and resolving download links.
mod types;

use crate::candidate::SearchCandidate;
use crate::catalog::Credentials;
use crate::error::ProviderError;
use crate::http::{DEFAULT_TIMEOUT, build_client, ensure_success};
use crate::md5crypt;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use types::WsResponse;

/// Default base URL of the Webshare API
pub const DEFAULT_BASE_URL: &str = "https://webshare.cz/api";

/// Sort order of search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sort {
    Recent,
    Rating,
    #[default]
    Largest,
    Smallest,
}

impl Sort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sort::Recent => "recent",
            Sort::Rating => "rating",
            Sort::Largest => "largest",
            Sort::Smallest => "smallest",
        }
    }
}

/// Content category to search in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Video,
    Images,
    Audio,
    Archives,
    Docs,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Video => "video",
            Category::Images => "images",
            Category::Audio => "audio",
            Category::Archives => "archives",
            Category::Docs => "docs",
        }
    }
}

/// Parameters of one free-text search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub limit: u32,
    pub offset: u32,
    pub sort: Sort,
    pub category: Category,
}

impl SearchRequest {
    /// Creates a request with the default paging (7 results), sort and category
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: 7,
            offset: 0,
            sort: Sort::default(),
            category: Category::default(),
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self::new("")
    }
}

/// One page of search results
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    /// Total number of hits reported by the provider; zero means nothing was found
    pub total: u64,
    /// Candidates on this page, in provider order
    pub candidates: Vec<SearchCandidate>,
}

impl SearchPage {
    pub fn is_empty(&self) -> bool {
        self.total == 0 || self.candidates.is_empty()
    }
}

/// Trait for providers that can search files and resolve them to URLs.
///
/// Both operations require an authenticated provider. An empty result set is
/// a normal outcome, not an error.
pub trait FileSearchProvider {
    /// Runs one free-text search
    fn search(&self, request: &SearchRequest) -> Result<SearchPage, ProviderError>;

    /// Resolves a file identifier to a time-limited download URL
    ///
    /// Returns an empty string when the provider has no link for the file.
    fn file_link(&self, ident: &str) -> Result<String, ProviderError>;
}

/// An unauthenticated Webshare client
///
/// The only thing it can do is log in, which yields a [`WebshareSession`].
pub struct Webshare {
    client: Client,
    base_url: String,
}

impl Webshare {
    /// Creates a client for the public Webshare API
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    /// Creates a client against a different API root (without trailing slash)
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(timeout, None)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Logs in and returns an authenticated session
    ///
    /// Fetches the account salt, derives the password digest and submits it.
    /// Any non-OK status, or an OK answer without a token, is an
    /// authentication failure. Failures are never retried.
    pub fn login(self, credentials: &Credentials) -> Result<WebshareSession, ProviderError> {
        if credentials.username.is_empty() || credentials.password.is_empty() {
            return Err(ProviderError::InvalidInput(
                "username and password must not be empty".to_string(),
            ));
        }

        let salt = self.salt(&credentials.username)?;
        let digest = md5crypt::login_digest(&credentials.password, &salt);

        let response = post(
            &self.client,
            &self.base_url,
            "login",
            &[
                ("username_or_email", credentials.username.as_str()),
                ("password", digest.as_str()),
                ("keep_logged_in", "1"),
            ],
        )?
        .require_ok_for_auth()?;

        let token = response.token.unwrap_or_default();
        if token.is_empty() {
            return Err(ProviderError::Auth {
                code: "EMPTY_TOKEN".to_string(),
                message: "Webshare returned an empty token, check credentials".to_string(),
            });
        }

        info!(username = %credentials.username, "Logged in to Webshare");
        Ok(WebshareSession {
            client: self.client,
            base_url: self.base_url,
            token,
        })
    }

    /// Fetches the password salt for an account
    fn salt(&self, username: &str) -> Result<String, ProviderError> {
        let response = post(
            &self.client,
            &self.base_url,
            "salt",
            &[("username_or_email", username)],
        )?
        .require_ok_for_auth()?;

        response
            .salt
            .filter(|salt| !salt.is_empty())
            .ok_or_else(|| ProviderError::Malformed("Webshare returned an empty salt".to_string()))
    }
}

/// An authenticated Webshare session
///
/// Holds the session token obtained at login; it is reused for every call
/// made through this session and never re-derived.
pub struct WebshareSession {
    client: Client,
    base_url: String,
    token: String,
}

impl WebshareSession {
    /// Logs in against the public Webshare API with the default timeout
    pub fn login(credentials: &Credentials) -> Result<Self, ProviderError> {
        Webshare::new(DEFAULT_TIMEOUT)?.login(credentials)
    }
}

impl FileSearchProvider for WebshareSession {
    fn search(&self, request: &SearchRequest) -> Result<SearchPage, ProviderError> {
        let limit = request.limit.to_string();
        let offset = request.offset.to_string();
        let response = post(
            &self.client,
            &self.base_url,
            "search",
            &[
                ("what", request.query.as_str()),
                ("sort", request.sort.as_str()),
                ("limit", limit.as_str()),
                ("offset", offset.as_str()),
                ("category", request.category.as_str()),
                ("wst", self.token.as_str()),
            ],
        )?
        .require_ok()?;

        let total = response.total.unwrap_or(response.files.len() as u64);
        let candidates: Vec<SearchCandidate> = if total == 0 {
            Vec::new()
        } else {
            response
                .files
                .into_iter()
                .map(|file| {
                    SearchCandidate::from_ident(
                        file.name,
                        file.size,
                        file.img.filter(|img| !img.is_empty()),
                        file.ident,
                    )
                })
                .collect()
        };

        info!(
            query = %request.query,
            total,
            returned = candidates.len(),
            "Webshare search finished"
        );
        Ok(SearchPage { total, candidates })
    }

    fn file_link(&self, ident: &str) -> Result<String, ProviderError> {
        let response = post(
            &self.client,
            &self.base_url,
            "file_link",
            &[("ident", ident), ("wst", self.token.as_str())],
        )?;

        match response.link {
            Some(link) if !link.is_empty() => Ok(link),
            _ => {
                warn!(
                    ident,
                    status = %response.status,
                    code = %response.error_code(),
                    "Webshare has no download link for file"
                );
                Ok(String::new())
            }
        }
    }
}

/// Posts a form to `{base_url}/{endpoint}/` and parses the XML answer
fn post(
    client: &Client,
    base_url: &str,
    endpoint: &str,
    form: &[(&str, &str)],
) -> Result<WsResponse, ProviderError> {
    let url = format!("{}/{}/", base_url, endpoint);
    debug!(%url, "Webshare request");

    let response = client.post(&url).form(form).send()?;
    let body = ensure_success(response)?.text()?;
    WsResponse::parse(&body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::stub::{Route, StubServer};

    const SALT_OK: &str = "<response><status>OK</status><salt>3azHgidD</salt></response>";
    const LOGIN_OK: &str = "<response><status>OK</status><token>tok-123</token></response>";

    fn logged_in(extra: Vec<Route>) -> (StubServer, WebshareSession) {
        let mut routes = vec![Route::ok("/api/salt/", SALT_OK), Route::ok("/api/login/", LOGIN_OK)];
        routes.extend(extra);
        let server = StubServer::start(routes);
        let session = Webshare::with_base_url(format!("{}/api", server.base_url), DEFAULT_TIMEOUT)
            .unwrap()
            .login(&Credentials::new("user", "password"))
            .unwrap();
        (server, session)
    }

    #[test]
    fn test_login_sends_salted_digest() {
        let (server, _session) = logged_in(Vec::new());

        let login = server
            .requests()
            .into_iter()
            .find(|r| r.path == "/api/login/")
            .unwrap();
        assert!(login.body.contains("username_or_email=user"));
        assert!(login
            .body
            .contains("password=6157ea89ae1fa90c3e2f73ecf9e21fb7dbb42cab"));
        assert!(login.body.contains("keep_logged_in=1"));
        assert!(!login.body.contains("password=password"));
    }

    #[test]
    fn test_login_rejected() {
        let server = StubServer::start(vec![
            Route::ok("/api/salt/", SALT_OK),
            Route::ok(
                "/api/login/",
                "<response><status>FATAL</status><code>LOGIN_FATAL_1</code>\
                 <message>Incorrect username or password.</message></response>",
            ),
        ]);
        let result = Webshare::with_base_url(format!("{}/api", server.base_url), DEFAULT_TIMEOUT)
            .unwrap()
            .login(&Credentials::new("user", "wrong"));

        match result {
            Err(ProviderError::Auth { code, .. }) => assert_eq!(code, "LOGIN_FATAL_1"),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("login should have failed"),
        }
        assert_eq!(server.hits("/api/login/"), 1);
    }

    #[test]
    fn test_salt_rejected_is_auth_error() {
        let server = StubServer::start(vec![Route::ok(
            "/api/salt/",
            "<response><status>FATAL</status><code>SALT_FATAL_1</code>\
             <message>User not found.</message></response>",
        )]);
        let result = Webshare::with_base_url(format!("{}/api", server.base_url), DEFAULT_TIMEOUT)
            .unwrap()
            .login(&Credentials::new("nobody", "password"));

        match result {
            Err(ProviderError::Auth { code, message }) => {
                assert_eq!(code, "SALT_FATAL_1");
                assert_eq!(message, "User not found.");
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("login should have failed"),
        }
        assert_eq!(server.hits("/api/login/"), 0);
    }

    #[test]
    fn test_login_http_failure_is_transport_error() {
        let server = StubServer::start(vec![Route::status("/api/salt/", 500, "oops")]);
        let result = Webshare::with_base_url(format!("{}/api", server.base_url), DEFAULT_TIMEOUT)
            .unwrap()
            .login(&Credentials::new("user", "password"));

        assert!(matches!(result, Err(ProviderError::Transport { status: 500, .. })));
    }

    #[test]
    fn test_login_rejects_empty_credentials() {
        let result = Webshare::with_base_url("http://127.0.0.1:9", DEFAULT_TIMEOUT)
            .unwrap()
            .login(&Credentials::new("user", ""));
        assert!(matches!(result, Err(ProviderError::InvalidInput(_))));
    }

    #[test]
    fn test_search_parses_candidates_and_sends_token() {
        let (server, session) = logged_in(vec![Route::ok(
            "/api/search/",
            "<response><status>OK</status><total>1</total>\
             <file><ident>abc</ident><name>Show.S01E02.mkv</name><img></img><size>1024</size></file>\
             </response>",
        )]);

        let page = session
            .search(&SearchRequest::new("Show S01E02").limit(5).sort(Sort::Recent))
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.candidates.len(), 1);
        assert_eq!(page.candidates[0].ident(), Some("abc"));
        assert_eq!(page.candidates[0].poster, None);

        let search = server
            .requests()
            .into_iter()
            .find(|r| r.path == "/api/search/")
            .unwrap();
        assert!(search.body.contains("what=Show+S01E02"));
        assert!(search.body.contains("sort=recent"));
        assert!(search.body.contains("limit=5"));
        assert!(search.body.contains("category=video"));
        assert!(search.body.contains("wst=tok-123"));
    }

    #[test]
    fn test_search_zero_total_is_empty_not_error() {
        let (_server, session) = logged_in(vec![Route::ok(
            "/api/search/",
            "<response><status>OK</status><total>0</total></response>",
        )]);

        let page = session.search(&SearchRequest::new("nothing")).unwrap();
        assert_eq!(page.total, 0);
        assert!(page.is_empty());
    }

    #[test]
    fn test_search_fatal_status_is_malformed() {
        let (_server, session) = logged_in(vec![Route::ok(
            "/api/search/",
            "<response><status>FATAL</status><code>SEARCH_FATAL_1</code>\
             <message>Session expired.</message></response>",
        )]);

        let err = session.search(&SearchRequest::new("Show")).unwrap_err();
        assert!(err.is_transport());
        match err {
            ProviderError::Malformed(message) => {
                assert!(message.contains("SEARCH_FATAL_1"));
                assert!(message.contains("Session expired."));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_search_http_failure_is_transport_error() {
        let (_server, session) = logged_in(vec![Route::status("/api/search/", 503, "busy")]);

        let err = session.search(&SearchRequest::new("Show")).unwrap_err();
        match err {
            ProviderError::Transport { status, body, .. } => {
                assert_eq!(status, 503);
                assert_eq!(body, "busy");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_file_link_and_missing_link() {
        let (server, session) = logged_in(vec![Route::ok(
            "/api/file_link/",
            "<response><status>OK</status><link>https://dl.example.test/abc</link></response>",
        )]);
        assert_eq!(session.file_link("abc").unwrap(), "https://dl.example.test/abc");
        assert_eq!(server.hits("/api/file_link/"), 1);

        let (_server, session) = logged_in(vec![Route::ok(
            "/api/file_link/",
            "<response><status>FATAL</status><code>FILE_LINK_FATAL_1</code>\
             <message>File not found.</message></response>",
        )]);
        assert_eq!(session.file_link("gone").unwrap(), "");
    }
}
