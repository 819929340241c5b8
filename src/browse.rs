//! Browse flow
//!
//! A [`Browser`] turns one [`Action`] into an [`Outcome`]: a listing of
//! further actions, a URL to play, or nothing. It works against an explicit
//! [`Session`] that owns the configuration and every provider client. The
//! file search provider is logged in on first use and reused afterwards.

use crate::SimpleStreamError;
use crate::action::Action;
use crate::aggregator::{SearchEvent, search_all};
use crate::candidate::{CandidateSource, SearchCandidate};
use crate::catalog::{CatalogEntry, TitleKind, search_queries};
use crate::config::Config;
use crate::csfd::{CatalogProvider, Csfd};
use crate::error::ProviderError;
use crate::fedapi::FedApi;
use crate::host::{Host, ListItem, NoticeLevel};
use crate::webshare::{FileSearchProvider, Webshare, WebshareSession};
use std::cell::OnceCell;
use tracing::{debug, info};

/// Result of dispatching one action
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Entries to show; choosing one yields the next action
    Listing { title: String, items: Vec<ListItem> },

    /// A playable URL with optional subtitle URLs
    Play { url: String, subtitles: Vec<String> },

    /// Nothing to show, e.g. after a cancelled prompt
    Done,
}

type Connect<W> = Box<dyn Fn() -> Result<W, SimpleStreamError>>;

/// Provider clients and configuration for one process run
pub struct Session<C = Csfd, W = WebshareSession> {
    config: Config,
    catalog: C,
    connect: Connect<W>,
    files: OnceCell<W>,
    streams: OnceCell<FedApi>,
}

impl Session {
    /// Creates a session talking to the configured public services
    ///
    /// No network call happens here; the file search login is deferred until
    /// the first search.
    pub fn new(config: Config) -> Result<Self, SimpleStreamError> {
        let catalog = Csfd::with_base_url(config.csfd.base_url.as_str(), config.timeout())?;

        let credentials = config.credentials();
        let base_url = config.webshare.base_url.clone();
        let timeout = config.timeout();
        let connect = move || -> Result<WebshareSession, SimpleStreamError> {
            let credentials = credentials
                .as_ref()
                .ok_or(SimpleStreamError::MissingCredentials)?;
            let session = Webshare::with_base_url(base_url.as_str(), timeout)?.login(credentials)?;
            Ok(session)
        };

        Ok(Self::with_providers(config, catalog, connect))
    }
}

impl<C, W> Session<C, W>
where
    C: CatalogProvider,
    W: FileSearchProvider,
{
    /// Creates a session from an existing catalog and a file search login
    pub fn with_providers<F>(config: Config, catalog: C, connect: F) -> Self
    where
        F: Fn() -> Result<W, SimpleStreamError> + 'static,
    {
        Self {
            config,
            catalog,
            connect: Box::new(connect),
            files: OnceCell::new(),
            streams: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// The logged-in file search provider, logging in on first use
    pub fn files(&self) -> Result<&W, SimpleStreamError> {
        if let Some(files) = self.files.get() {
            return Ok(files);
        }

        let files = (self.connect)()?;
        info!("File search session established");
        Ok(self.files.get_or_init(|| files))
    }

    /// The stream resolver, created on first use from the configured token
    pub fn streams(&self) -> Result<&FedApi, SimpleStreamError> {
        if let Some(streams) = self.streams.get() {
            return Ok(streams);
        }

        let token = self
            .config
            .ui_token()
            .ok_or(SimpleStreamError::MissingUiToken)?;
        let streams = FedApi::with_base_urls(
            token,
            self.config.fedapi.base_url.as_str(),
            self.config.fedapi.suggest_url.as_str(),
            self.config.timeout(),
        )?;
        Ok(self.streams.get_or_init(|| streams))
    }
}

/// Runs actions against a session
///
/// The candidates of the last file search are kept, so picking one of them
/// reuses its memoized URL instead of asking the provider again.
pub struct Browser<C = Csfd, W = WebshareSession> {
    session: Session<C, W>,
    candidates: Vec<SearchCandidate>,
}

impl<C, W> Browser<C, W>
where
    C: CatalogProvider,
    W: FileSearchProvider,
{
    pub fn new(session: Session<C, W>) -> Self {
        Self {
            session,
            candidates: Vec::new(),
        }
    }

    pub fn session(&self) -> &Session<C, W> {
        &self.session
    }

    /// Runs a single action
    ///
    /// Prompts, quality choices and notices go through `host`; listings and
    /// playback are returned to the caller.
    pub fn dispatch(
        &mut self,
        action: Action,
        host: &mut dyn Host,
    ) -> Result<Outcome, SimpleStreamError> {
        debug!(?action, "Dispatching action");

        match action {
            Action::Root => Ok(root_menu()),
            Action::SearchFiles => {
                self.session.files()?;
                match host.prompt_text("Search files")? {
                    Some(query) => self.search_files(vec![query], host),
                    None => Ok(Outcome::Done),
                }
            }
            Action::SearchCatalog { kind } => {
                let prompt = match kind {
                    TitleKind::Movie => "Search movies",
                    TitleKind::Series => "Search series",
                };
                match host.prompt_text(prompt)? {
                    Some(query) => self.search_catalog(&query, kind, host),
                    None => Ok(Outcome::Done),
                }
            }
            Action::SelectTitle { id, kind } => self.select_title(&id, kind, host),
            Action::ListEpisodes { series, season_id } => {
                let episodes = self.session.catalog.episodes(&series, &season_id)?;
                if episodes.is_empty() {
                    return Err(ProviderError::NotFound(format!(
                        "No episodes found for {}",
                        series.title
                    ))
                    .into());
                }

                let items = episodes
                    .into_iter()
                    .map(|episode| {
                        let label = episode.label();
                        let queries = search_queries(&CatalogEntry::Episode(episode));
                        ListItem::folder(label, Action::SearchQueries { queries })
                    })
                    .collect();
                Ok(Outcome::Listing {
                    title: series.title,
                    items,
                })
            }
            Action::SearchQueries { queries } => self.search_files(queries, host),
            Action::PickCandidate { index, ident } => self.pick_candidate(index, &ident, host),
            Action::SearchExternal => {
                self.session.streams()?;
                match host.prompt_text("Search by title")? {
                    Some(query) => self.search_external(&query),
                    None => Ok(Outcome::Done),
                }
            }
            Action::SelectExternal { id, kind } => self.select_external(&id, kind, host),
            Action::Play { url } => Ok(Outcome::Play {
                url,
                subtitles: Vec::new(),
            }),
        }
    }

    /// Drives the interactive loop starting at the root menu
    ///
    /// Cancelling a listing goes back to the previous one; cancelling the root
    /// menu ends the loop. Provider failures are shown as notices and the
    /// current listing stays open. Only host failures end the loop early.
    pub fn run(&mut self, host: &mut dyn Host) -> Result<(), SimpleStreamError> {
        let mut stack: Vec<(String, Vec<ListItem>)> = Vec::new();
        let mut next = Some(Action::Root);

        loop {
            if let Some(action) = next.take() {
                match self.dispatch(action, host) {
                    Ok(Outcome::Listing { title, items }) => {
                        if !items.is_empty() {
                            stack.push((title, items));
                        }
                    }
                    Ok(Outcome::Play { url, subtitles }) => {
                        if let Err(e) = host.play(&url, &subtitles) {
                            host.notify(NoticeLevel::Error, &e.to_string());
                        }
                    }
                    Ok(Outcome::Done) => {}
                    Err(SimpleStreamError::Host(e)) => return Err(SimpleStreamError::Host(e)),
                    Err(e) => host.notify(NoticeLevel::Error, &e.to_string()),
                }
            }

            let Some((title, items)) = stack.last() else {
                return Ok(());
            };
            match host.render(title, items)? {
                Some(action) => next = Some(action),
                None => {
                    stack.pop();
                }
            }
        }
    }

    /// Lists catalog titles of one kind matching `query`
    pub fn search_catalog(
        &self,
        query: &str,
        kind: TitleKind,
        host: &mut dyn Host,
    ) -> Result<Outcome, SimpleStreamError> {
        let titles = self.session.catalog.search(query, kind)?;
        if titles.is_empty() {
            host.notify(NoticeLevel::Warning, &format!("No results for {}", query));
        }

        let items = titles
            .into_iter()
            .map(|title| {
                let action = Action::SelectTitle {
                    id: title.id.clone(),
                    kind: title.kind,
                };
                ListItem::folder(title.label(), action)
                    .with_info(title.info())
                    .with_thumbnail(title.poster)
            })
            .collect();
        Ok(Outcome::Listing {
            title: query.to_string(),
            items,
        })
    }

    /// Lists titles known to the stream resolver matching `query`
    pub fn search_external(&self, query: &str) -> Result<Outcome, SimpleStreamError> {
        let items = self
            .session
            .streams()?
            .search_external_id(query)?
            .into_iter()
            .map(|title| {
                let action = Action::SelectExternal {
                    kind: title.title_kind(),
                    id: title.id.clone(),
                };
                ListItem::folder(title.label(), action)
            })
            .collect();
        Ok(Outcome::Listing {
            title: query.to_string(),
            items,
        })
    }

    fn select_title(
        &mut self,
        id: &str,
        kind: TitleKind,
        host: &mut dyn Host,
    ) -> Result<Outcome, SimpleStreamError> {
        let mut title = self.session.catalog.detail(id)?;
        title.kind = kind;

        match CatalogEntry::from(title) {
            CatalogEntry::Series(series) => {
                let seasons = self.session.catalog.seasons(&series.id)?;
                if seasons.is_empty() {
                    return Err(ProviderError::NotFound(format!(
                        "No seasons found for {}",
                        series.title
                    ))
                    .into());
                }

                let series_ref = series.series_ref();
                let items = seasons
                    .into_iter()
                    .map(|season| {
                        let action = Action::ListEpisodes {
                            series: series_ref.clone(),
                            season_id: season.id.clone(),
                        };
                        ListItem::folder(season.label(), action)
                            .with_info(season.info())
                            .with_thumbnail(series.poster.clone())
                    })
                    .collect();
                Ok(Outcome::Listing {
                    title: series.title,
                    items,
                })
            }
            movie @ CatalogEntry::Movie(_) => {
                let queries = search_queries(&movie);
                self.search_files(queries, host)
            }
            CatalogEntry::Season(_) | CatalogEntry::Episode(_) => {
                Err(ProviderError::InvalidInput(format!("{} is not a movie or a series", id)).into())
            }
        }
    }

    /// Runs the queries against the file search provider and lists the candidates
    pub fn search_files(
        &mut self,
        queries: Vec<String>,
        host: &mut dyn Host,
    ) -> Result<Outcome, SimpleStreamError> {
        let files = self.session.files()?;
        let template = self.session.config.search_template();

        let candidates = search_all(files, &queries, &template, |event| {
            if let SearchEvent::NoResults { query } = event {
                host.notify(NoticeLevel::Info, &format!("No results for {}", query));
            }
        })?;

        if candidates.is_empty() {
            host.notify(NoticeLevel::Warning, "Nothing found");
        }

        let items = candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| {
                let action = match candidate.source() {
                    CandidateSource::Ident(ident) => Action::PickCandidate {
                        index,
                        ident: ident.clone(),
                    },
                    CandidateSource::Resolved(url) => Action::Play { url: url.clone() },
                };
                ListItem::playable(candidate.label(), action)
                    .with_thumbnail(candidate.poster.clone())
            })
            .collect();

        self.candidates = candidates;
        Ok(Outcome::Listing {
            title: queries.join(" / "),
            items,
        })
    }

    fn pick_candidate(
        &self,
        index: usize,
        ident: &str,
        host: &mut dyn Host,
    ) -> Result<Outcome, SimpleStreamError> {
        let files = self.session.files()?;

        // A payload from an earlier run may not match the current listing
        let fresh;
        let candidate = match self
            .candidates
            .get(index)
            .filter(|candidate| candidate.ident() == Some(ident))
        {
            Some(candidate) => candidate,
            None => {
                fresh = SearchCandidate::from_ident(ident, 0, None, ident);
                &fresh
            }
        };

        match candidate.resolve(files)? {
            Some(url) => Ok(Outcome::Play {
                url: url.to_string(),
                subtitles: Vec::new(),
            }),
            None => {
                host.notify(NoticeLevel::Warning, "File is not available");
                Ok(Outcome::Done)
            }
        }
    }

    fn select_external(
        &self,
        id: &str,
        kind: TitleKind,
        host: &mut dyn Host,
    ) -> Result<Outcome, SimpleStreamError> {
        let streams = self.session.streams()?;

        let map = match kind {
            TitleKind::Movie => streams.movie_streams(id)?,
            TitleKind::Series => {
                let Some(season) = prompt_number(host, "Season number")? else {
                    return Ok(Outcome::Done);
                };
                let Some(episode) = prompt_number(host, "Episode number")? else {
                    return Ok(Outcome::Done);
                };
                streams.episode_streams(id, season, episode)?
            }
        };

        let labels: Vec<String> = map.labels().into_iter().map(str::to_string).collect();
        let Some(choice) = host.select("Quality", &labels)? else {
            return Ok(Outcome::Done);
        };

        match labels.get(choice).and_then(|label| map.stream(label)) {
            Some(url) => Ok(Outcome::Play {
                url: url.to_string(),
                subtitles: map.subtitles.values().cloned().collect(),
            }),
            None => Ok(Outcome::Done),
        }
    }
}

fn root_menu() -> Outcome {
    Outcome::Listing {
        title: "Simple Stream".to_string(),
        items: vec![
            ListItem::folder("Search files", Action::SearchFiles),
            ListItem::folder(
                "Search movies",
                Action::SearchCatalog {
                    kind: TitleKind::Movie,
                },
            ),
            ListItem::folder(
                "Search series",
                Action::SearchCatalog {
                    kind: TitleKind::Series,
                },
            ),
            ListItem::folder("Search by IMDb title", Action::SearchExternal),
        ],
    }
}

/// Asks for a positive number; anything else counts as cancelled
fn prompt_number(host: &mut dyn Host, title: &str) -> Result<Option<u32>, SimpleStreamError> {
    let Some(text) = host.prompt_text(title)? else {
        return Ok(None);
    };

    match text.trim().parse::<u32>() {
        Ok(number) if number > 0 => Ok(Some(number)),
        _ => {
            host.notify(NoticeLevel::Warning, &format!("Not a valid number: {}", text));
            Ok(None)
        }
    }
}
