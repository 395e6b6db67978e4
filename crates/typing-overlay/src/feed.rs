//! Upstream comment feed records and batch preparation.
//!
//! The comment aggregator delivers, on every update, the latest N comments it
//! knows about. Records are camelCase JSON objects; only the fields the
//! overlay uses are modelled, everything else is ignored.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::OverlayConfig;
use crate::error::{OverlayError, Result};

/// A single comment record from the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedComment {
    /// Identifier of the stream source (viewing frame) the comment came from
    pub id: String,
    /// Streaming service identifier
    #[serde(default)]
    pub service: String,
    /// Display name of the stream source
    #[serde(default)]
    pub name: String,
    /// Viewing URL
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    /// Per-comment payload
    pub data: CommentData,
    /// Stable display index, assigned by [`CommentIndexer`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_index: Option<u64>,
}

/// Per-comment payload of a feed record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentData {
    /// Unique comment ID
    pub id: String,
    /// Platform user ID (not guaranteed for anonymous users)
    #[serde(default)]
    pub user_id: String,
    /// Author name
    #[serde(default)]
    pub name: String,
    /// Shortened author name, if the aggregator made one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub has_gift: bool,
    #[serde(default)]
    pub profile_image: String,
    /// Body: HTML-escaped by the aggregator except for embedded `<img>` tags
    #[serde(default)]
    pub comment: String,
}

impl FeedComment {
    /// Create a chat comment record.
    pub fn new(id: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            id: "source".to_string(),
            service: String::new(),
            name: String::new(),
            url: String::new(),
            data: CommentData {
                id: id.into(),
                comment: comment.into(),
                ..Default::default()
            },
            comment_index: None,
        }
    }

    /// Set the stream source this comment came from.
    pub fn with_source(mut self, id: impl Into<String>, service: impl Into<String>) -> Self {
        self.id = id.into();
        self.service = service.into();
        self
    }

    /// Set the display index.
    pub fn with_index(mut self, index: u64) -> Self {
        self.comment_index = Some(index);
        self
    }

    /// The comment's own identity, used to re-associate it across updates.
    pub fn comment_id(&self) -> &str {
        &self.data.id
    }

    pub fn body(&self) -> &str {
        &self.data.comment
    }

    /// Interpret one JSON value as a feed record.
    ///
    /// A body that is present but not a string is rejected instead of being
    /// coerced; a missing or `null` body is read as an empty comment.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        if let Some(body) = value.pointer("/data/comment")
            && !(body.is_string() || body.is_null())
        {
            let id = value
                .pointer("/data/id")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("<unknown>");
            return Err(OverlayError::invalid_input(format!(
                "comment body for {id} is not a string"
            )));
        }

        let mut value = value;
        if let Some(data) = value.get_mut("data").and_then(|d| d.as_object_mut())
            && data.get("comment").is_some_and(serde_json::Value::is_null)
        {
            data.remove("comment");
        }

        serde_json::from_value(value)
            .map_err(|e| OverlayError::invalid_input(format!("malformed feed record: {e}")))
    }
}

/// Parse a JSON array of feed records.
///
/// Records that cannot be interpreted are logged and skipped so that one bad
/// comment does not hide the rest of the batch. Fails only if the payload is
/// not a JSON array.
pub fn parse_batch(json: &str) -> Result<Vec<FeedComment>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(json)?;
    Ok(collect_records(values))
}

/// Interpret already-decoded JSON values as feed records, skipping bad ones.
pub fn collect_records(values: Vec<serde_json::Value>) -> Vec<FeedComment> {
    values
        .into_iter()
        .filter_map(|value| match FeedComment::from_value(value) {
            Ok(comment) => Some(comment),
            Err(e) => {
                warn!("Skipping feed record: {}", e);
                None
            }
        })
        .collect()
}

/// Assigns stable display indices to comments.
///
/// A comment keeps its index for as long as the feed keeps reporting it;
/// new comments take the next counter value. Ids that leave the feed are
/// forgotten, so a comment that comes back is treated as new.
#[derive(Debug, Default)]
pub struct CommentIndexer {
    indices: FxHashMap<String, u64>,
    next_index: u64,
}

impl CommentIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `comment_index` on every comment of the batch.
    pub fn assign(&mut self, batch: &mut [FeedComment]) {
        let mut indices = FxHashMap::default();
        for comment in batch.iter_mut() {
            let index = match self.indices.get(comment.comment_id()) {
                Some(&index) => index,
                None => {
                    let index = self.next_index;
                    self.next_index += 1;
                    index
                }
            };
            comment.comment_index = Some(index);
            indices.insert(comment.comment_id().to_string(), index);
        }
        self.indices = indices;
    }
}

/// Prepares raw feed batches for the scheduler.
#[derive(Debug)]
pub struct FeedAdapter {
    max_comments: usize,
    indexer: CommentIndexer,
}

impl FeedAdapter {
    pub fn new(config: &OverlayConfig) -> Self {
        Self {
            max_comments: config.max_comments,
            indexer: CommentIndexer::new(),
        }
    }

    /// Keep the most recent `max_comments` records and index them.
    pub fn prepare(&mut self, mut batch: Vec<FeedComment>) -> Vec<FeedComment> {
        if batch.len() > self.max_comments {
            batch.drain(..batch.len() - self.max_comments);
        }
        self.indexer.assign(&mut batch);
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(batch: &[FeedComment]) -> Vec<&str> {
        batch.iter().map(FeedComment::comment_id).collect()
    }

    #[test]
    fn test_deserialize_record() {
        let comment: FeedComment = serde_json::from_value(json!({
            "id": "frame-1",
            "service": "youtube",
            "name": "Main",
            "url": "https://example.com/live",
            "data": {
                "id": "c1",
                "userId": "u1",
                "name": "Alice",
                "hasGift": false,
                "profileImage": "https://example.com/a.png",
                "comment": "hello <img src=\"e.png\" alt=\"e\">",
                "isOwner": false
            },
            "commentIndex": 3
        }))
        .unwrap();

        assert_eq!(comment.id, "frame-1");
        assert_eq!(comment.comment_id(), "c1");
        assert_eq!(comment.data.user_id, "u1");
        assert_eq!(comment.comment_index, Some(3));
        assert!(comment.body().starts_with("hello"));
    }

    #[test]
    fn test_missing_body_is_empty() {
        let comment = FeedComment::from_value(json!({
            "id": "frame-1",
            "data": { "id": "c1" }
        }))
        .unwrap();
        assert_eq!(comment.body(), "");

        let comment = FeedComment::from_value(json!({
            "id": "frame-1",
            "data": { "id": "c2", "comment": null }
        }))
        .unwrap();
        assert_eq!(comment.body(), "");
    }

    #[test]
    fn test_non_string_body_is_invalid_input() {
        let err = FeedComment::from_value(json!({
            "id": "frame-1",
            "data": { "id": "c1", "comment": 42 }
        }))
        .unwrap_err();

        assert!(matches!(err, OverlayError::InvalidInput(_)));
        assert!(err.to_string().contains("c1"));
    }

    #[test]
    fn test_parse_batch_skips_bad_records() {
        let batch = parse_batch(
            r#"[
                {"id": "f", "data": {"id": "c1", "comment": "a"}},
                {"id": "f", "data": {"id": "c2", "comment": ["not", "text"]}},
                {"id": "f"},
                {"id": "f", "data": {"id": "c3", "comment": "b"}}
            ]"#,
        )
        .unwrap();

        assert_eq!(ids(&batch), vec!["c1", "c3"]);
        assert!(parse_batch(r#"{"id": "f"}"#).is_err());
    }

    #[test]
    fn test_indexer_keeps_indices_stable() {
        let mut indexer = CommentIndexer::new();

        let mut first = vec![FeedComment::new("a", "1"), FeedComment::new("b", "2")];
        indexer.assign(&mut first);
        assert_eq!(first[0].comment_index, Some(0));
        assert_eq!(first[1].comment_index, Some(1));

        // Order changes and a new comment arrives; known ids keep their index.
        let mut second = vec![
            FeedComment::new("c", "3"),
            FeedComment::new("b", "2"),
            FeedComment::new("a", "1"),
        ];
        indexer.assign(&mut second);
        assert_eq!(second[0].comment_index, Some(2));
        assert_eq!(second[1].comment_index, Some(1));
        assert_eq!(second[2].comment_index, Some(0));

        // "a" drops out and comes back: it is new again.
        let mut third = vec![FeedComment::new("b", "2")];
        indexer.assign(&mut third);
        assert_eq!(third[0].comment_index, Some(1));
        let mut fourth = vec![FeedComment::new("a", "1")];
        indexer.assign(&mut fourth);
        assert_eq!(fourth[0].comment_index, Some(3));
    }

    #[test]
    fn test_adapter_keeps_most_recent() {
        let config = OverlayConfig {
            max_comments: 2,
            ..Default::default()
        };
        let mut adapter = FeedAdapter::new(&config);

        let batch = adapter.prepare(vec![
            FeedComment::new("old", "x"),
            FeedComment::new("mid", "y"),
            FeedComment::new("new", "z"),
        ]);

        assert_eq!(ids(&batch), vec!["mid", "new"]);
        assert_eq!(batch[0].comment_index, Some(0));
        assert_eq!(batch[1].comment_index, Some(1));
    }

    #[test]
    fn test_builder_helpers() {
        let comment = FeedComment::new("c1", "hi")
            .with_source("frame-2", "twitch")
            .with_index(9);

        assert_eq!(comment.id, "frame-2");
        assert_eq!(comment.service, "twitch");
        assert_eq!(comment.comment_index, Some(9));
    }
}
