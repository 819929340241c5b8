//! Multi-query search aggregation
//!
//! Runs a batch of query strings against a file search provider and flattens
//! the results. A query without hits is a soft outcome reported through the
//! event callback; any provider error aborts the whole batch.

use crate::candidate::SearchCandidate;
use crate::error::ProviderError;
use crate::webshare::{FileSearchProvider, SearchRequest};
use tracing::{info, warn};

/// Event emitted while a batch of queries is executed
///
/// These let callers show progress or surface the soft "nothing found"
/// notices without the aggregation itself deciding how to render them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    /// A query is about to be sent
    Searching {
        index: usize,
        total: usize,
        query: String,
    },

    /// The provider reported zero results for a query
    NoResults { query: String },

    /// A query produced candidates
    Found { query: String, count: usize },
}

/// Runs every query in order and returns all candidates flattened
///
/// Each query is built from `template`, replacing only its query text, so
/// limit, sort and category are shared by the whole batch. Candidates keep
/// query order first and provider order within a query. An empty result is a
/// valid outcome.
///
/// # Examples
///
/// ```no_run
/// use simple_stream::aggregator::{SearchEvent, search_all};
/// use simple_stream::webshare::{SearchRequest, WebshareSession};
/// use simple_stream::Credentials;
///
/// let session = WebshareSession::login(&Credentials::new("user", "secret")).unwrap();
/// let queries = vec!["Show S01E02".to_string(), "Puvodni S01E02".to_string()];
/// let candidates = search_all(&session, &queries, &SearchRequest::default(), |event| {
///     if let SearchEvent::NoResults { query } = event {
///         eprintln!("Nothing found for {}", query);
///     }
/// })
/// .unwrap();
/// ```
pub fn search_all<P, F>(
    provider: &P,
    queries: &[String],
    template: &SearchRequest,
    mut on_event: F,
) -> Result<Vec<SearchCandidate>, ProviderError>
where
    P: FileSearchProvider + ?Sized,
    F: FnMut(SearchEvent),
{
    let mut candidates = Vec::new();

    for (index, query) in queries.iter().enumerate() {
        on_event(SearchEvent::Searching {
            index,
            total: queries.len(),
            query: query.clone(),
        });

        let request = SearchRequest {
            query: query.clone(),
            ..template.clone()
        };
        let page = provider.search(&request)?;

        if page.is_empty() {
            warn!(query = %query, "No results for query");
            on_event(SearchEvent::NoResults {
                query: query.clone(),
            });
            continue;
        }

        on_event(SearchEvent::Found {
            query: query.clone(),
            count: page.candidates.len(),
        });
        candidates.extend(page.candidates);
    }

    info!(
        queries = queries.len(),
        candidates = candidates.len(),
        "Aggregated search finished"
    );
    Ok(candidates)
}
