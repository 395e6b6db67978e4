//! Overlay configuration.
//!
//! All timings are in milliseconds and all placement ranges in degrees or
//! percent of the viewport axis. Every field has a default, so a TOML file
//! only needs to mention what it overrides.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{OverlayError, Result};

/// How comments made of a single gift sticker image are tokenized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GiftStickerMode {
    /// Tokenize like any other comment.
    #[default]
    PerUnit,
    /// Reveal the whole sticker body as one image unit.
    Atomic,
}

/// Configuration for the typing overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Delay between two revealed units (ms)
    pub reveal_interval_ms: u64,
    /// Interval of the jitter restyle (ms)
    pub jitter_interval_ms: u64,
    /// Whether the jitter effect runs at all
    pub jitter_enabled: bool,
    /// Maximum jitter rotation in either direction (degrees)
    pub jitter_max_deg: i32,
    /// Time a fully revealed comment stays before fading out (ms)
    pub dwell_ms: u64,
    /// Pause after a comment finishes before the next one starts typing (ms, 0 = none).
    /// A refresh cancels a pause that is still running.
    pub next_comment_pause_ms: u64,
    /// Maximum comment rotation in either direction (degrees)
    pub rotation_max_deg: i32,
    /// Lower bound of the anchor offsets (percent of viewport axis)
    pub offset_min_percent: u32,
    /// Upper bound of the anchor offsets (percent of viewport axis)
    pub offset_max_percent: u32,
    /// Maximum number of comments displayed at once
    pub max_comments: usize,
    /// Tokenizer policy for gift sticker comments
    pub gift_sticker: GiftStickerMode,
    /// Fixed seed for placement and jitter randomness
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            reveal_interval_ms: 150,
            jitter_interval_ms: 300,
            jitter_enabled: true,
            jitter_max_deg: 3,
            dwell_ms: 10_000,
            next_comment_pause_ms: 0,
            rotation_max_deg: 30,
            offset_min_percent: 0,
            offset_max_percent: 50,
            max_comments: 5,
            gift_sticker: GiftStickerMode::PerUnit,
            rng_seed: None,
        }
    }
}

impl OverlayConfig {
    /// Load a configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Parse a configuration from TOML text and validate it.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that all values are usable by the scheduler.
    pub fn validate(&self) -> Result<()> {
        if self.reveal_interval_ms == 0 {
            return Err(OverlayError::config("reveal_interval_ms must be positive"));
        }
        if self.jitter_enabled && self.jitter_interval_ms == 0 {
            return Err(OverlayError::config("jitter_interval_ms must be positive"));
        }
        if self.jitter_max_deg < 0 || self.rotation_max_deg < 0 {
            return Err(OverlayError::config("rotation ranges must not be negative"));
        }
        if self.offset_min_percent > self.offset_max_percent {
            return Err(OverlayError::config(format!(
                "offset_min_percent ({}) exceeds offset_max_percent ({})",
                self.offset_min_percent, self.offset_max_percent
            )));
        }
        if self.offset_max_percent > 100 {
            return Err(OverlayError::config("offset_max_percent must be at most 100"));
        }
        if self.max_comments == 0 {
            return Err(OverlayError::config("max_comments must be positive"));
        }
        Ok(())
    }

    pub fn reveal_interval(&self) -> Duration {
        Duration::from_millis(self.reveal_interval_ms)
    }

    pub fn jitter_interval(&self) -> Duration {
        Duration::from_millis(self.jitter_interval_ms)
    }

    pub fn dwell(&self) -> Duration {
        Duration::from_millis(self.dwell_ms)
    }

    pub fn next_comment_pause(&self) -> Duration {
        Duration::from_millis(self.next_comment_pause_ms)
    }
}
