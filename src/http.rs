//! Shared HTTP plumbing for the provider clients

use crate::error::ProviderError;
use rand::seq::IndexedRandom;
use reqwest::blocking::{Client, Response};
use std::time::Duration;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Browser user agents rotated by the scraping clients
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/87.0.4280.88 Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 14_3 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) CriOS/87.0.4280.77 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 10; SM-A205U) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/87.0.4280.101 Mobile Safari/537.36",
    "Mozilla/5.0 (Linux; Android 10) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/87.0.4280.101 Mobile Safari/537.36",
];

/// Picks one of the known browser user agents at random
pub(crate) fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Builds a blocking client with the given per-request timeout
pub(crate) fn build_client(
    timeout: Duration,
    user_agent: Option<&str>,
) -> Result<Client, ProviderError> {
    let mut builder = Client::builder().timeout(timeout);
    if let Some(user_agent) = user_agent {
        builder = builder.user_agent(user_agent);
    }
    Ok(builder.build()?)
}

/// Passes successful responses through and turns anything else into a transport error
///
/// The error carries the URL, the status code and the raw body so callers can
/// show what the server actually said.
pub(crate) fn ensure_success(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().unwrap_or_default();
    Err(ProviderError::Transport {
        url,
        status: status.as_u16(),
        body,
    })
}

/// Minimal in-process HTTP server used by the provider tests
#[cfg(test)]
pub(crate) mod stub {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::{Arc, Mutex};
    use std::thread;

    /// A canned response for one request path
    #[derive(Debug, Clone)]
    pub struct Route {
        pub path: &'static str,
        pub status: u16,
        pub body: String,
    }

    impl Route {
        pub fn ok(path: &'static str, body: impl Into<String>) -> Self {
            Self {
                path,
                status: 200,
                body: body.into(),
            }
        }

        pub fn status(path: &'static str, status: u16, body: impl Into<String>) -> Self {
            Self {
                path,
                status,
                body: body.into(),
            }
        }
    }

    /// A request as seen by the stub
    #[derive(Debug, Clone)]
    pub struct Recorded {
        pub path: String,
        pub headers: Vec<(String, String)>,
        pub body: String,
    }

    impl Recorded {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str())
        }
    }

    /// Serves the given routes on an ephemeral port until the test process exits
    pub struct StubServer {
        pub base_url: String,
        requests: Arc<Mutex<Vec<Recorded>>>,
    }

    impl StubServer {
        pub fn start(routes: Vec<Route>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let base_url = format!("http://{}", listener.local_addr().unwrap());
            let requests = Arc::new(Mutex::new(Vec::new()));
            let recorded = Arc::clone(&requests);

            thread::spawn(move || {
                for stream in listener.incoming() {
                    let Ok(stream) = stream else { break };
                    handle(stream, &routes, &recorded);
                }
            });

            Self { base_url, requests }
        }

        pub fn requests(&self) -> Vec<Recorded> {
            self.requests.lock().unwrap().clone()
        }

        pub fn hits(&self, path: &str) -> usize {
            self.requests()
                .iter()
                .filter(|r| r.path.split('?').next() == Some(path))
                .count()
        }
    }

    fn handle(mut stream: TcpStream, routes: &[Route], recorded: &Mutex<Vec<Recorded>>) {
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut request_line = String::new();
        if reader.read_line(&mut request_line).is_err() {
            return;
        }
        let target = request_line
            .split_whitespace()
            .nth(1)
            .unwrap_or("/")
            .to_string();

        let mut headers = Vec::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).is_err() || line == "\r\n" || line.is_empty() {
                break;
            }
            if let Some((key, value)) = line.trim_end().split_once(':') {
                let value = value.trim().to_string();
                if key.eq_ignore_ascii_case("content-length") {
                    content_length = value.parse().unwrap_or(0);
                }
                headers.push((key.to_string(), value));
            }
        }

        let mut body = vec![0u8; content_length];
        let _ = reader.read_exact(&mut body);

        recorded.lock().unwrap().push(Recorded {
            path: target.clone(),
            headers,
            body: String::from_utf8_lossy(&body).to_string(),
        });

        let path = target.split('?').next().unwrap_or("/");
        let (status, body) = routes
            .iter()
            .find(|route| route.path == path)
            .map(|route| (route.status, route.body.clone()))
            .unwrap_or((404, "not found".to_string()));

        let response = format!(
            "HTTP/1.1 {} Stub\r\nContent-Length: {}\r\nContent-Type: text/plain; charset=utf-8\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::stub::{Route, StubServer};
    use super::*;

    #[test]
    fn test_random_user_agent_is_from_list() {
        for _ in 0..10 {
            assert!(USER_AGENTS.contains(&random_user_agent()));
        }
    }

    #[test]
    fn test_ensure_success_reports_url_status_and_body() {
        let server = StubServer::start(vec![Route::status("/broken", 503, "maintenance")]);
        let client = build_client(DEFAULT_TIMEOUT, None).unwrap();

        let response = client
            .get(format!("{}/broken", server.base_url))
            .send()
            .unwrap();
        match ensure_success(response) {
            Err(ProviderError::Transport { url, status, body }) => {
                assert!(url.ends_with("/broken"));
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("expected transport error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_ensure_success_passes_ok_responses() {
        let server = StubServer::start(vec![Route::ok("/fine", "hello")]);
        let client = build_client(DEFAULT_TIMEOUT, Some("test-agent")).unwrap();

        let response = client.get(format!("{}/fine", server.base_url)).send().unwrap();
        let text = ensure_success(response).unwrap().text().unwrap();
        assert_eq!(text, "hello");
        assert_eq!(
            server.requests()[0].header("user-agent"),
            Some("test-agent")
        );
    }
}
