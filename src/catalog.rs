//! Catalog entities and search query generation
//!
//! Titles, seasons and episodes as produced by the catalog scraper, the stream
//! quality maps produced by the stream resolver, and the rule that turns a
//! catalog leaf (a movie or an episode) into file-search queries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Whether a title is a single movie or a series with seasons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitleKind {
    Movie,
    Series,
}

impl TitleKind {
    /// Returns the lowercase name used in CLI arguments and payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            TitleKind::Movie => "movie",
            TitleKind::Series => "series",
        }
    }
}

impl fmt::Display for TitleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A movie or a series as described by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
    /// Catalog identifier (the slug used in catalog URLs)
    pub id: String,
    /// Localized display title
    pub title: String,
    /// Title in the original language, if the title is foreign
    pub original_title: Option<String>,
    /// Release year
    pub year: Option<String>,
    /// Short plot summary
    pub plot: Option<String>,
    /// Average rating as shown by the catalog (e.g. "87%")
    pub rating: Option<String>,
    /// Absolute poster URL
    pub poster: Option<String>,
    /// Genre names
    pub genres: Vec<String>,
    /// Movie or series
    pub kind: TitleKind,
}

impl Title {
    /// Returns the reference a season or episode listing needs about its series
    pub fn series_ref(&self) -> SeriesRef {
        SeriesRef {
            id: self.id.clone(),
            title: self.title.clone(),
            original_title: self.original_title.clone(),
        }
    }

    /// Label for listings: `Title (Year)` when the year is known
    pub fn label(&self) -> String {
        match &self.year {
            Some(year) => format!("{} ({})", self.title, year),
            None => self.title.clone(),
        }
    }

    /// Secondary listing line: `year · rating · genres`, then the first plot line
    pub fn info(&self) -> Option<String> {
        let genres = self.genres.join(" / ");
        let mut facts: Vec<&str> = Vec::new();
        facts.extend(self.year.as_deref());
        facts.extend(self.rating.as_deref());
        if !genres.is_empty() {
            facts.push(&genres);
        }

        let plot = self
            .plot
            .as_deref()
            .and_then(|plot| plot.lines().map(str::trim).find(|line| !line.is_empty()));

        join_info(&facts.join(" · "), plot)
    }
}

/// The parts of a series that its seasons and episodes carry along
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesRef {
    /// Catalog identifier of the series
    pub id: String,
    /// Localized series title
    pub title: String,
    /// Original series title, if known
    pub original_title: Option<String>,
}

/// A season of a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    /// Catalog identifier of the season
    pub id: String,
    /// Catalog identifier of the parent series
    pub series_id: String,
    /// Season number; falls back to the discovery position when unparseable
    pub number: u32,
    /// Display title as shown by the catalog
    pub title: String,
    /// Year the season aired
    pub year: Option<String>,
    /// Number of episodes, when the catalog states it
    pub episode_count: Option<u32>,
}

impl Season {
    pub fn label(&self) -> String {
        if self.title.is_empty() || self.title == "Season" {
            format!("Season {}", self.number)
        } else {
            self.title.clone()
        }
    }

    /// Secondary listing line: year and episode count, when known
    pub fn info(&self) -> Option<String> {
        let episodes = self.episode_count.map(|count| match count {
            1 => "1 episode".to_string(),
            count => format!("{} episodes", count),
        });
        join_info(self.year.as_deref().unwrap_or_default(), episodes.as_deref())
    }
}

/// An episode of a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// Catalog identifier of the episode
    pub id: String,
    /// Season number, if the catalog lists one
    pub season_number: Option<u32>,
    /// Episode number within the season, if the catalog lists one
    pub episode_number: Option<u32>,
    /// Episode title
    pub title: String,
    /// The series this episode belongs to
    pub series: SeriesRef,
}

impl Episode {
    pub fn label(&self) -> String {
        match self.episode_number {
            Some(number) => format!("{}. {}", number, self.title),
            None => self.title.clone(),
        }
    }
}

/// Any entity the catalog can hand out
///
/// Only `Movie` and `Episode` are leaves that can be searched for; `Series`
/// and `Season` only lead further down the hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEntry {
    Movie(Title),
    Series(Title),
    Season(Season),
    Episode(Episode),
}

impl From<Title> for CatalogEntry {
    fn from(title: Title) -> Self {
        match title.kind {
            TitleKind::Movie => CatalogEntry::Movie(title),
            TitleKind::Series => CatalogEntry::Series(title),
        }
    }
}

/// Generates the file-search queries for a catalog entry
///
/// Movies yield `"{title} {year}"`, episodes yield
/// `"{series} S{season:02}E{episode:02}"`. A second query with the original
/// title is added when it exists and differs from the localized one. Series
/// and seasons are not leaves and yield no queries.
///
/// # Examples
///
/// ```
/// use simple_stream::catalog::{search_queries, CatalogEntry, Episode, SeriesRef};
///
/// let episode = Episode {
///     id: "123".to_string(),
///     season_number: Some(1),
///     episode_number: Some(2),
///     title: "Pilot, part two".to_string(),
///     series: SeriesRef {
///         id: "42".to_string(),
///         title: "Show".to_string(),
///         original_title: None,
///     },
/// };
/// assert_eq!(search_queries(&CatalogEntry::Episode(episode)), vec!["Show S01E02"]);
/// ```
pub fn search_queries(entry: &CatalogEntry) -> Vec<String> {
    match entry {
        CatalogEntry::Movie(title) => {
            let year = title.year.as_deref().unwrap_or_default();
            let mut queries = vec![join_nonempty(&title.title, year)];
            if let Some(original) = differing_original(&title.title, &title.original_title) {
                queries.push(join_nonempty(original, year));
            }
            queries
        }
        CatalogEntry::Episode(episode) => {
            // Unknown numbers are formatted as zero
            let marker = format!(
                "S{:02}E{:02}",
                episode.season_number.unwrap_or(0),
                episode.episode_number.unwrap_or(0)
            );
            let series = &episode.series;
            let mut queries = vec![format!("{} {}", series.title, marker)];
            if let Some(original) = differing_original(&series.title, &series.original_title) {
                queries.push(format!("{} {}", original, marker));
            }
            queries
        }
        CatalogEntry::Series(_) | CatalogEntry::Season(_) => Vec::new(),
    }
}

fn differing_original<'a>(title: &str, original: &'a Option<String>) -> Option<&'a str> {
    original
        .as_deref()
        .filter(|original| !original.is_empty() && *original != title)
}

fn join_info(first: &str, second: Option<&str>) -> Option<String> {
    match (first.is_empty(), second.filter(|s| !s.is_empty())) {
        (true, None) => None,
        (true, Some(second)) => Some(second.to_string()),
        (false, None) => Some(first.to_string()),
        (false, Some(second)) => Some(format!("{} · {}", first, second)),
    }
}

fn join_nonempty(title: &str, year: &str) -> String {
    if year.is_empty() {
        title.to_string()
    } else {
        format!("{} {}", title, year)
    }
}

/// Stream URLs for one movie or episode, keyed by quality label
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMap {
    /// Quality label (e.g. "ORG", "1080p") to stream URL
    pub streams: BTreeMap<String, String>,
    /// Subtitle language label to subtitle URL
    pub subtitles: BTreeMap<String, String>,
}

impl QualityMap {
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Quality labels in a stable order
    pub fn labels(&self) -> Vec<&str> {
        self.streams.keys().map(String::as_str).collect()
    }

    pub fn stream(&self, label: &str) -> Option<&str> {
        self.streams.get(label).map(String::as_str)
    }
}

/// A title found through the external-identifier suggestion service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalTitle {
    /// External identifier (e.g. `tt0903747`)
    pub id: String,
    /// Display title
    pub title: String,
    /// Release year, empty when unknown
    pub year: String,
    /// Raw kind label reported by the service (e.g. `movie`, `tvSeries`)
    pub kind: String,
}

impl ExternalTitle {
    /// Maps the raw kind label onto movie or series
    ///
    /// Only the series labels map to a series. Other non-movie kinds such as
    /// `short` or `tvSpecial` have no seasons to ask for and play as movies.
    pub fn title_kind(&self) -> TitleKind {
        match self.kind.as_str() {
            "tvSeries" | "tvMiniSeries" => TitleKind::Series,
            _ => TitleKind::Movie,
        }
    }

    pub fn label(&self) -> String {
        if self.year.is_empty() {
            format!("{} | {}", self.title, self.kind)
        } else {
            format!("{} ({}) | {}", self.title, self.year, self.kind)
        }
    }
}

/// Login credentials for the file-search provider
///
/// Never persisted by the library; consumed by a single login call.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
