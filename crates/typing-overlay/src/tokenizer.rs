//! Comment tokenizer.
//!
//! Turns a comment body into the ordered display units that the scheduler
//! reveals one by one. The body is HTML-bearing text coming from the feed:
//! user text is still raw, while pictures (emotes, stickers) were already
//! replaced upstream by complete `<img ...>` tags. Each grapheme of user text
//! becomes one escaped text unit; each image tag becomes one opaque unit.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::GiftStickerMode;
use crate::escape::escape_html;
use crate::grapheme::graphemes;

/// Anchored, non-greedy, single-line image tag.
static IMG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<img\s.+?>").expect("valid img tag regex"));

/// Marker class the feed puts on gift sticker images.
const GIFT_STICKER_CLASS: &str = r#"class="gift-image gift-sticker""#;

/// Kind of a display unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// One escaped grapheme
    Text,
    /// One verbatim `<img>` tag
    Image,
}

/// One animatable piece of a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayUnit {
    id: String,
    content: String,
    kind: UnitKind,
    is_last: bool,
    revealed: bool,
}

impl DisplayUnit {
    fn new(comment_id: &str, ordinal: usize, content: String, kind: UnitKind) -> Self {
        Self {
            id: format!("{comment_id}-{ordinal}"),
            content,
            kind,
            is_last: false,
            revealed: false,
        }
    }

    /// Element id, unique within the overlay: `{comment_id}-{ordinal}`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Markup content of the unit (escaped text or a raw image tag).
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    pub fn is_image(&self) -> bool {
        self.kind == UnitKind::Image
    }

    /// Whether this is the final unit of its comment.
    pub fn is_last(&self) -> bool {
        self.is_last
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Mark the unit revealed. Returns `false` if it already was.
    pub(crate) fn reveal(&mut self) -> bool {
        !std::mem::replace(&mut self.revealed, true)
    }
}

/// Leading `<img>` tag of `body` when that tag carries the gift sticker class.
fn gift_sticker_tag(body: &str) -> Option<&str> {
    IMG_TAG
        .find(body)
        .map(|tag| tag.as_str())
        .filter(|tag| tag.contains(GIFT_STICKER_CLASS))
}

/// Whether `body` starts with a gift sticker image.
pub fn is_gift_sticker(body: &str) -> bool {
    gift_sticker_tag(body).is_some()
}

/// Split a comment body into display units in reading order.
///
/// Never fails: an `<` that does not start a complete image tag is emitted
/// as an escaped `&lt;` text unit.
///
/// With [`GiftStickerMode::Atomic`] a body opening with a gift sticker is a
/// single image unit: the sticker tag followed by the rest of the body,
/// escaped and split exactly as [`GiftStickerMode::PerUnit`] would.
pub fn tokenize(comment_id: &str, body: &str, gift_sticker: GiftStickerMode) -> Vec<DisplayUnit> {
    let mut units = Vec::new();

    if gift_sticker == GiftStickerMode::Atomic
        && let Some(tag) = gift_sticker_tag(body)
    {
        let mut content = tag.to_string();
        content.extend(
            tokenize(comment_id, &body[tag.len()..], GiftStickerMode::PerUnit)
                .iter()
                .map(DisplayUnit::content),
        );
        units.push(DisplayUnit::new(comment_id, 0, content, UnitKind::Image));
    } else {
        let mut rest = body;
        while let Some(grapheme) = graphemes(rest).next() {
            if grapheme == "<"
                && let Some(tag) = IMG_TAG.find(rest)
            {
                units.push(DisplayUnit::new(
                    comment_id,
                    units.len(),
                    tag.as_str().to_string(),
                    UnitKind::Image,
                ));
                rest = &rest[tag.end()..];
                continue;
            }

            units.push(DisplayUnit::new(
                comment_id,
                units.len(),
                escape_html(grapheme),
                UnitKind::Text,
            ));
            rest = &rest[grapheme.len()..];
        }
    }

    if let Some(last) = units.last_mut() {
        last.is_last = true;
    }
    units
}
