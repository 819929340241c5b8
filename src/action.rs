//! Typed continuation payloads
//!
//! Every listing item carries the [`Action`] to run when it is chosen. An
//! action can be encoded into one opaque string and handed back later, which
//! lets a stateless caller resume the browse flow step by step.

use crate::catalog::{SeriesRef, TitleKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while decoding an action payload
#[derive(Debug, Error)]
pub enum ActionError {
    /// The payload is empty
    #[error("Action payload is empty")]
    Empty,

    /// The payload is not a valid action
    #[error("Invalid action payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// One step of the browse flow together with its arguments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Top-level menu
    #[default]
    Root,

    /// Prompt for a free-text file search
    SearchFiles,

    /// Prompt for a catalog search of one kind
    SearchCatalog { kind: TitleKind },

    /// Open a catalog title: movies go to file search, series list seasons
    SelectTitle { id: String, kind: TitleKind },

    /// List the episodes of one season
    ListEpisodes { series: SeriesRef, season_id: String },

    /// Run a batch of file searches and list the candidates
    SearchQueries { queries: Vec<String> },

    /// Resolve one candidate of the last listing and play it
    PickCandidate { index: usize, ident: String },

    /// Prompt for an external identifier search
    SearchExternal,

    /// Resolve streams of an external title, prompting for season and episode of series
    SelectExternal { id: String, kind: TitleKind },

    /// Play a URL that is already known
    Play { url: String },
}

impl Action {
    /// Encodes the action into a single string parameter
    pub fn encode(&self) -> String {
        // Serializing plain strings, numbers and enums cannot fail
        serde_json::to_string(self).unwrap_or_else(|_| String::from(r#"{"action":"root"}"#))
    }

    /// Decodes an action produced by [`Action::encode`]
    pub fn decode(payload: &str) -> Result<Self, ActionError> {
        let payload = payload.trim();
        if payload.is_empty() {
            return Err(ActionError::Empty);
        }
        Ok(serde_json::from_str(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_episodes_survives_encoding() {
        let action = Action::ListEpisodes {
            series: SeriesRef {
                id: "1-show".to_string(),
                title: "Show".to_string(),
                original_title: Some("Das Show".to_string()),
            },
            season_id: "11-season-1".to_string(),
        };

        assert_eq!(Action::decode(&action.encode()).unwrap(), action);
    }

    #[test]
    fn test_queries_keep_punctuation() {
        // Queries travel as a typed list, so separators inside them are harmless
        let action = Action::SearchQueries {
            queries: vec!["Show, the \"best\" S01E02".to_string(), "Other's S01E02".to_string()],
        };
        let decoded = Action::decode(&action.encode()).unwrap();
        match decoded {
            Action::SearchQueries { queries } => {
                assert_eq!(queries[0], "Show, the \"best\" S01E02");
                assert_eq!(queries.len(), 2);
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn test_payload_shape() {
        let encoded = Action::SearchCatalog {
            kind: TitleKind::Series,
        }
        .encode();
        assert_eq!(encoded, r#"{"action":"search_catalog","kind":"series"}"#);
        assert_eq!(Action::Root.encode(), r#"{"action":"root"}"#);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(Action::decode("  "), Err(ActionError::Empty)));
        assert!(matches!(Action::decode("not json"), Err(ActionError::Decode(_))));
        assert!(matches!(
            Action::decode(r#"{"action":"launch_rockets"}"#),
            Err(ActionError::Decode(_))
        ));
    }
}
