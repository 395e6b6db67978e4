//! Replay scripts: timed feed batches.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use typing_overlay::{FeedComment, feed::collect_records};

/// One feed update, delivered `at_ms` after the replay starts.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayStep {
    pub at_ms: u64,
    /// Raw feed records; bad ones are skipped when the step is delivered
    #[serde(default)]
    pub comments: Vec<serde_json::Value>,
}

impl ReplayStep {
    pub fn batch(&self) -> Vec<FeedComment> {
        collect_records(self.comments.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReplayScript {
    steps: Vec<ReplayStep>,
}

impl ReplayScript {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid script {}", path.display()))
    }

    /// Parse a JSON array of steps. Steps are replayed in time order; steps
    /// sharing a timestamp keep their file order.
    pub fn from_json(raw: &str) -> Result<Self> {
        let mut steps: Vec<ReplayStep> = serde_json::from_str(raw)?;
        steps.sort_by_key(|step| step.at_ms);
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[ReplayStep] {
        &self.steps
    }

    /// Timestamp of the last step.
    pub fn duration_ms(&self) -> u64 {
        self.steps.last().map_or(0, |step| step.at_ms)
    }
}
