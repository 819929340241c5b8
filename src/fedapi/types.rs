/// FedAPI and suggestion-service response types for deserialization.
///
/// These structures mirror the JSON response formats of the stream API and of
/// the public title suggestion endpoint.
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// The stream response for a movie or an episode.
///
/// Both maps are kept as raw values: an empty map may arrive as `[]` or `""`.
#[derive(Debug, Default, Deserialize)]
pub(super) struct FedStreams {
    /// Quality label to stream URL
    #[serde(default)]
    pub streams: Value,
    /// Subtitle language label to a URL or an object carrying `subtitle_link`
    #[serde(default)]
    pub subtitles: Value,
}

impl FedStreams {
    /// Quality label to URL, skipping entries that are not non-empty strings
    pub fn stream_map(&self) -> BTreeMap<String, String> {
        string_entries(&self.streams, |value| value.as_str())
    }

    /// Subtitle label to URL
    pub fn subtitle_map(&self) -> BTreeMap<String, String> {
        string_entries(&self.subtitles, |value| match value {
            Value::String(url) => Some(url.as_str()),
            Value::Object(entry) => entry.get("subtitle_link").and_then(Value::as_str),
            _ => None,
        })
    }
}

fn string_entries<'a, F>(value: &'a Value, extract: F) -> BTreeMap<String, String>
where
    F: Fn(&'a Value) -> Option<&'a str>,
{
    let Some(object) = value.as_object() else {
        return BTreeMap::new();
    };

    object
        .iter()
        .filter_map(|(label, entry)| {
            extract(entry)
                .filter(|url| !url.is_empty())
                .map(|url| (label.clone(), url.to_string()))
        })
        .collect()
}

/// The payload of the suggestion endpoint once unwrapped from its callback.
#[derive(Debug, Deserialize)]
pub(super) struct Suggestions {
    /// Suggested entries (titles and people mixed)
    #[serde(default)]
    pub d: Vec<Suggestion>,
}

/// A single suggestion entry.
#[derive(Debug, Deserialize)]
pub(super) struct Suggestion {
    /// Identifier; titles start with `tt`, people with `nm`
    pub id: String,
    /// Label (title or name)
    #[serde(default)]
    pub l: String,
    /// Release year
    #[serde(default)]
    pub y: Option<i64>,
    /// Kind of title (`movie`, `tvSeries`, ...)
    #[serde(default)]
    pub qid: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_and_subtitle_maps() {
        let body = r#"{
            "streams": {"ORG": "https://s.example.test/org.m3u8", "1080p": "https://s.example.test/1080.mp4", "4K": null, "720p": ""},
            "subtitles": {
                "English": {"subtitle_link": "https://sub.example.test/en.srt", "subtitle_name": "en"},
                "Czech": "https://sub.example.test/cs.srt",
                "German": {"subtitle_name": "de"}
            }
        }"#;
        let parsed: FedStreams = serde_json::from_str(body).unwrap();

        let streams = parsed.stream_map();
        assert_eq!(streams.len(), 2);
        assert_eq!(streams["ORG"], "https://s.example.test/org.m3u8");
        assert_eq!(streams["1080p"], "https://s.example.test/1080.mp4");

        let subtitles = parsed.subtitle_map();
        assert_eq!(subtitles.len(), 2);
        assert_eq!(subtitles["English"], "https://sub.example.test/en.srt");
        assert_eq!(subtitles["Czech"], "https://sub.example.test/cs.srt");
    }

    #[test]
    fn test_empty_maps_in_array_shape() {
        let parsed: FedStreams = serde_json::from_str(r#"{"streams": [], "subtitles": []}"#).unwrap();
        assert!(parsed.stream_map().is_empty());
        assert!(parsed.subtitle_map().is_empty());

        let parsed: FedStreams = serde_json::from_str("{}").unwrap();
        assert!(parsed.stream_map().is_empty());
    }
}
