/// Markup parsing for CSFD pages.
///
/// CSFD has no API; everything is read from class-named elements of the public
/// pages. Optional fields degrade to `None`, malformed list entries are skipped.
use crate::catalog::{Episode, Season, SeriesRef, Title, TitleKind};
use crate::error::ProviderError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

/// Markers in a search result's text that identify a series
const SERIES_MARKERS: [&str; 2] = ["seriál", "epizoda"];

/// Info-line markers of season and episode entries, which would double-count results
const EXCLUDED_INFO_MARKERS: [&str; 2] = ["(série)", "(epizoda)"];

/// Country name that marks a domestic production
const HOME_LOCALE: &str = "Česko";

/// A search result before its detail page has been fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct SearchHit {
    pub id: String,
    pub kind: TitleKind,
}

fn selector(css: &str) -> Result<Selector, ProviderError> {
    Selector::parse(css).map_err(|e| ProviderError::Parse(format!("invalid selector {css}: {e}")))
}

fn regex(pattern: &str) -> Result<Regex, ProviderError> {
    Regex::new(pattern).map_err(|e| ProviderError::Parse(format!("invalid pattern {pattern}: {e}")))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}

/// Extracts the identifier from a link like `/film/10135-forrest-gump/prehled/`
///
/// The identifier is the path segment after `film`, or the last segment when
/// there is none.
fn id_from_href(href: &str) -> Option<String> {
    let segments: Vec<&str> = href.split('/').filter(|s| !s.is_empty()).collect();
    let id = match segments.iter().position(|s| *s == "film") {
        Some(pos) => segments.get(pos + 1).copied(),
        None => segments.last().copied(),
    }?;
    Some(id.to_string())
}

/// Same as [`id_from_href`], but for nested links returns the innermost id
fn nested_id_from_href(href: &str) -> Option<String> {
    href.split('/')
        .filter(|s| !s.is_empty() && *s != "prehled")
        .next_back()
        .map(str::to_string)
}

/// Parses the search results page into hits of the requested kind
pub(super) fn parse_search(html: &str, kind: TitleKind) -> Result<Vec<SearchHit>, ProviderError> {
    let document = Html::parse_document(html);
    let article_selector = selector("article.article-poster-50")?;
    let info_selector = selector("span.film-title-info")?;
    let link_selector = selector("a.film-title-name")?;

    let mut hits = Vec::new();
    for article in document.select(&article_selector) {
        let text: String = article.text().collect();
        let is_series = SERIES_MARKERS.iter().any(|marker| text.contains(marker));
        let entry_kind = if is_series {
            TitleKind::Series
        } else {
            TitleKind::Movie
        };
        if entry_kind != kind {
            continue;
        }

        let excluded = article
            .select(&info_selector)
            .next()
            .map(text_of)
            .is_some_and(|info| EXCLUDED_INFO_MARKERS.iter().any(|m| info.contains(m)));
        if excluded {
            continue;
        }

        let Some(id) = article
            .select(&link_selector)
            .next()
            .and_then(|link| link.value().attr("href"))
            .and_then(id_from_href)
        else {
            warn!("Skipping search result without a title link");
            continue;
        };

        hits.push(SearchHit {
            id,
            kind: entry_kind,
        });
    }

    Ok(hits)
}

/// Parses a title's overview page
///
/// The heading is mandatory; everything else is optional. A page listing
/// episodes or seasons is a series.
pub(super) fn parse_detail(html: &str, id: &str) -> Result<Title, ProviderError> {
    let document = Html::parse_document(html);

    let title = document
        .select(&selector("h1")?)
        .next()
        .map(text_of)
        .and_then(non_empty)
        .ok_or_else(|| ProviderError::Parse(format!("no title heading on detail page of {id}")))?;

    let poster = document
        .select(&selector("img.prev-img")?)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(|src| {
            if src.starts_with("//") {
                format!("https:{src}")
            } else {
                src.to_string()
            }
        });

    let plot = document
        .select(&selector("div.plot-full")?)
        .next()
        .map(text_of)
        .and_then(|text| text.lines().next().map(|line| line.trim().to_string()))
        .and_then(non_empty);

    let origin = document
        .select(&selector("div.origin")?)
        .next()
        .map(|el| el.text().collect::<String>());

    let year = match &origin {
        Some(origin) => regex(r"\d{4}")?
            .find(origin)
            .map(|m| m.as_str().to_string()),
        None => None,
    };

    let rating = document
        .select(&selector("div.film-rating-average")?)
        .next()
        .map(text_of)
        .and_then(non_empty);

    let genres = match document.select(&selector("div.genres")?).next() {
        Some(genres) => genres
            .select(&selector("a")?)
            .map(text_of)
            .filter(|genre| !genre.is_empty())
            .collect(),
        None => Vec::new(),
    };

    let original_title = match &origin {
        Some(origin) if !origin.contains(HOME_LOCALE) => document
            .select(&selector("ul.film-names li")?)
            .next()
            .map(text_of)
            .and_then(non_empty),
        _ => None,
    };

    let kind = if document
        .select(&selector("div.film-episodes-list")?)
        .next()
        .is_some()
    {
        TitleKind::Series
    } else {
        TitleKind::Movie
    };

    Ok(Title {
        id: id.to_string(),
        title,
        original_title,
        year,
        plot,
        rating,
        poster,
        genres,
        kind,
    })
}

/// Parses the season list of a series overview page, sorted by season number
pub(super) fn parse_seasons(html: &str, series_id: &str) -> Result<Vec<Season>, ProviderError> {
    let document = Html::parse_document(html);
    let list_selector = selector("div.film-episodes-list")?;
    let item_selector = selector("li")?;
    let link_selector = selector("a.film-title-name")?;
    let info_selector = selector("span.film-title-info")?;
    let year_pattern = regex(r"\((\d{4})\)")?;
    let count_pattern = regex(r"(\d+)\s+epizod")?;

    let mut seasons = Vec::new();
    let Some(list) = document.select(&list_selector).next() else {
        return Ok(seasons);
    };

    for item in list.select(&item_selector) {
        let Some(link) = item.select(&link_selector).next() else {
            continue;
        };
        let Some(id) = link.value().attr("href").and_then(nested_id_from_href) else {
            warn!(series_id, "Skipping season without a link");
            continue;
        };

        let title = text_of(link);
        let position = seasons.len() as u32 + 1;
        let number = title
            .split_whitespace()
            .next_back()
            .and_then(|token| token.parse::<u32>().ok())
            .unwrap_or(position);

        let info = item.select(&info_selector).next().map(text_of);
        let year = info
            .as_deref()
            .and_then(|info| year_pattern.captures(info))
            .map(|caps| caps[1].to_string());
        let episode_count = info
            .as_deref()
            .and_then(|info| count_pattern.captures(info))
            .and_then(|caps| caps[1].parse().ok());

        seasons.push(Season {
            id,
            series_id: series_id.to_string(),
            number,
            title,
            year,
            episode_count,
        });
    }

    seasons.sort_by_key(|season| season.number);
    Ok(seasons)
}

/// Parses the episode list of a season page
///
/// Episodes without a recognizable `S##E##` marker keep `None` numbers and
/// sort after all numbered episodes.
pub(super) fn parse_episodes(html: &str, series: &SeriesRef) -> Result<Vec<Episode>, ProviderError> {
    let document = Html::parse_document(html);
    let list_selector = selector("div.film-episodes-list")?;
    let item_selector = selector("li")?;
    let link_selector = selector("a.film-title-name")?;
    let info_selector = selector("span.film-title-info span.info")?;
    let marker_pattern = regex(r"S(\d+)E(\d+)")?;

    let mut episodes = Vec::new();
    let Some(list) = document.select(&list_selector).next() else {
        return Ok(episodes);
    };

    for item in list.select(&item_selector) {
        let Some(link) = item.select(&link_selector).next() else {
            continue;
        };
        let Some(id) = link.value().attr("href").and_then(nested_id_from_href) else {
            warn!(series_id = %series.id, "Skipping episode without a link");
            continue;
        };

        let numbers = item
            .select(&info_selector)
            .next()
            .map(text_of)
            .and_then(|info| {
                let caps = marker_pattern.captures(&info)?;
                Some((caps[1].parse::<u32>().ok(), caps[2].parse::<u32>().ok()))
            });
        let (season_number, episode_number) = numbers.unwrap_or((None, None));

        episodes.push(Episode {
            id,
            season_number,
            episode_number,
            title: text_of(link),
            series: series.clone(),
        });
    }

    episodes.sort_by_key(|episode| (episode.episode_number.is_none(), episode.episode_number));
    Ok(episodes)
}
