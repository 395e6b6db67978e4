//! Animated comments.
//!
//! An [`AnimatedComment`] wraps one feed comment for its whole time on screen:
//! its random placement, its display units with their reveal state, and the
//! markup the presentation layer renders.

use std::fmt::Write as _;

use rand::RngExt;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::config::OverlayConfig;
use crate::feed::FeedComment;
use crate::tokenizer::{DisplayUnit, tokenize};

const TYPING_BLOCK_CLASS: &str = "typing-block";
const IS_ACTIVE_CLASS: &str = "is-active";
const HIDDEN_CLASS: &str = "hidden";

/// Vertical edge a comment is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAnchor {
    Top,
    Bottom,
}

impl VerticalAnchor {
    pub fn css_property(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
}

/// Horizontal edge a comment is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalAnchor {
    Left,
    Right,
}

impl HorizontalAnchor {
    pub fn css_property(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Where and how tilted a comment block is drawn. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Rotation (degrees)
    pub rotation_deg: i32,
    pub vertical: VerticalAnchor,
    /// Distance from the vertical edge (vh)
    pub vertical_offset: u32,
    pub horizontal: HorizontalAnchor,
    /// Distance from the horizontal edge (vw)
    pub horizontal_offset: u32,
}

impl Placement {
    /// Draw a random placement within the configured ranges.
    pub fn random(rng: &mut StdRng, config: &OverlayConfig) -> Self {
        let rotation = config.rotation_max_deg;
        let offsets = config.offset_min_percent..=config.offset_max_percent;

        Self {
            rotation_deg: rng.random_range(-rotation..=rotation),
            vertical: if rng.random_bool(0.5) {
                VerticalAnchor::Top
            } else {
                VerticalAnchor::Bottom
            },
            vertical_offset: rng.random_range(offsets.clone()),
            horizontal: if rng.random_bool(0.5) {
                HorizontalAnchor::Left
            } else {
                HorizontalAnchor::Right
            },
            horizontal_offset: rng.random_range(offsets),
        }
    }

    /// Inline CSS for the comment block.
    pub fn style(&self) -> String {
        format!(
            "position: absolute; transform: rotate({}deg); {}: {}vh; {}: {}vw; ",
            self.rotation_deg,
            self.vertical.css_property(),
            self.vertical_offset,
            self.horizontal.css_property(),
            self.horizontal_offset,
        )
    }
}

/// Lifecycle state of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentState {
    /// Nothing revealed yet
    Pending,
    /// Some units revealed
    Revealing,
    /// Every unit revealed, not yet faded
    FullyRevealed,
    /// Fading out (terminal)
    Deactivated,
}

/// Snapshot of a comment for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentView {
    /// Comment ID (`data.id` of the feed record)
    pub comment_id: String,
    /// Stream source ID
    pub id: String,
    pub service: String,
    pub name: String,
    pub comment_index: u64,
    pub class_name: String,
    pub placement: Placement,
    pub style: String,
    /// Per-unit markup for the typing animation
    pub animation_content: String,
    /// Flat markup for read-aloud rendering
    pub speech_content: String,
    pub state: CommentState,
    pub deactivated: bool,
}

/// One comment on screen.
#[derive(Debug, Clone)]
pub struct AnimatedComment {
    source_id: String,
    instance: u64,
    stream_id: String,
    service: String,
    name: String,
    render_order: u64,
    placement: Placement,
    style: String,
    units: Vec<DisplayUnit>,
    animation_content: String,
    speech_content: String,
    deactivated: bool,
}

impl AnimatedComment {
    /// Build a comment from a feed record.
    ///
    /// `instance` distinguishes this object from any earlier one created for
    /// the same comment ID.
    pub fn create(
        source: &FeedComment,
        instance: u64,
        config: &OverlayConfig,
        rng: &mut StdRng,
    ) -> Self {
        let placement = Placement::random(rng, config);
        let units = tokenize(source.comment_id(), source.body(), config.gift_sticker);
        let speech_content = units.iter().map(DisplayUnit::content).collect();

        let mut comment = Self {
            source_id: source.comment_id().to_string(),
            instance,
            stream_id: source.id.clone(),
            service: source.service.clone(),
            name: source.name.clone(),
            render_order: source.comment_index.unwrap_or(instance),
            style: placement.style(),
            placement,
            units,
            animation_content: String::new(),
            speech_content,
            deactivated: false,
        };
        comment.rebuild_markup();
        comment
    }

    /// Comment ID this object was created for.
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn instance(&self) -> u64 {
        self.instance
    }

    pub fn render_order(&self) -> u64 {
        self.render_order
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn style(&self) -> &str {
        &self.style
    }

    pub fn units(&self) -> &[DisplayUnit] {
        &self.units
    }

    pub fn animation_content(&self) -> &str {
        &self.animation_content
    }

    pub fn speech_content(&self) -> &str {
        &self.speech_content
    }

    pub fn is_deactivated(&self) -> bool {
        self.deactivated
    }

    /// Alternating class for even/odd styling.
    pub fn class_name(&self) -> &'static str {
        if self.render_order % 2 == 0 {
            "comment even"
        } else {
            "comment odd"
        }
    }

    pub fn state(&self) -> CommentState {
        if self.deactivated {
            return CommentState::Deactivated;
        }
        let revealed = self.units.iter().filter(|u| u.is_revealed()).count();
        if revealed == self.units.len() {
            CommentState::FullyRevealed
        } else if revealed == 0 {
            CommentState::Pending
        } else {
            CommentState::Revealing
        }
    }

    /// Recompute the typing markup from the current reveal state.
    ///
    /// Image units get a hidden shadow copy so their space is reserved before
    /// they are revealed.
    pub fn rebuild_markup(&mut self) {
        let mut markup = String::with_capacity(self.animation_content.len().max(64));
        for unit in &self.units {
            let active = if unit.is_revealed() {
                format!(" {IS_ACTIVE_CLASS}")
            } else {
                String::new()
            };
            let hidden = if unit.is_image() {
                format!(" {HIDDEN_CLASS}")
            } else {
                String::new()
            };
            let _ = write!(
                markup,
                r#"<div id="{id}" class="{TYPING_BLOCK_CLASS}{active}"><span class="comment-text-front">{content}</span><span class="comment-text-shadow{hidden}">{content}</span></div>"#,
                id = unit.id(),
                content = unit.content(),
            );
        }
        self.animation_content = markup;
    }

    /// Reveal the unit at `index`.
    ///
    /// Returns `true` only when the unit actually changed; revealing twice or
    /// an out-of-range index is a no-op.
    pub fn activate_unit(&mut self, index: usize) -> bool {
        self.units.get_mut(index).is_some_and(DisplayUnit::reveal)
    }

    /// Start the fade-out. Returns `true` only on the first call.
    pub fn deactivate(&mut self) -> bool {
        !std::mem::replace(&mut self.deactivated, true)
    }

    pub fn view(&self) -> CommentView {
        CommentView {
            comment_id: self.source_id.clone(),
            id: self.stream_id.clone(),
            service: self.service.clone(),
            name: self.name.clone(),
            comment_index: self.render_order,
            class_name: self.class_name().to_string(),
            placement: self.placement,
            style: self.style.clone(),
            animation_content: self.animation_content.clone(),
            speech_content: self.speech_content.clone(),
            state: self.state(),
            deactivated: self.deactivated,
        }
    }
}
