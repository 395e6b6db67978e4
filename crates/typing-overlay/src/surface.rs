//! Presentation surface capability.
//!
//! The scheduler never touches rendered elements itself. It reports what
//! changed through [`RenderSurface`], and the presentation layer (a browser
//! page, a websocket bridge, a test recorder) applies it.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::comment::CommentView;
use crate::error::{OverlayError, Result};

/// Receiver of scheduler notifications.
///
/// Implementations may return [`OverlayError::MissingTarget`] when the
/// addressed element is already gone; the scheduler treats that as a no-op.
pub trait RenderSurface {
    /// The displayed comment list was replaced.
    fn comments_replaced(&mut self, comments: &[CommentView]) -> Result<()>;

    /// A display unit became visible.
    fn unit_revealed(&mut self, comment_id: &str, unit_id: &str) -> Result<()>;

    /// A display unit should be restyled with a small rotation.
    fn unit_jittered(&mut self, unit_id: &str, rotation_deg: i32) -> Result<()>;

    /// A comment started fading out.
    fn comment_deactivated(&mut self, comment_id: &str) -> Result<()>;
}

/// Serializable form of every surface notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverlayEvent {
    CommentsReplaced {
        comments: Vec<CommentView>,
    },
    UnitRevealed {
        comment_id: String,
        unit_id: String,
    },
    UnitJittered {
        unit_id: String,
        rotation_deg: i32,
    },
    CommentDeactivated {
        comment_id: String,
    },
}

impl OverlayEvent {
    /// Short name of the event kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CommentsReplaced { .. } => "comments_replaced",
            Self::UnitRevealed { .. } => "unit_revealed",
            Self::UnitJittered { .. } => "unit_jittered",
            Self::CommentDeactivated { .. } => "comment_deactivated",
        }
    }
}

/// Records every notification in order.
impl RenderSurface for Vec<OverlayEvent> {
    fn comments_replaced(&mut self, comments: &[CommentView]) -> Result<()> {
        self.push(OverlayEvent::CommentsReplaced {
            comments: comments.to_vec(),
        });
        Ok(())
    }

    fn unit_revealed(&mut self, comment_id: &str, unit_id: &str) -> Result<()> {
        self.push(OverlayEvent::UnitRevealed {
            comment_id: comment_id.to_string(),
            unit_id: unit_id.to_string(),
        });
        Ok(())
    }

    fn unit_jittered(&mut self, unit_id: &str, rotation_deg: i32) -> Result<()> {
        self.push(OverlayEvent::UnitJittered {
            unit_id: unit_id.to_string(),
            rotation_deg,
        });
        Ok(())
    }

    fn comment_deactivated(&mut self, comment_id: &str) -> Result<()> {
        self.push(OverlayEvent::CommentDeactivated {
            comment_id: comment_id.to_string(),
        });
        Ok(())
    }
}

/// Broadcasts notifications to any number of subscribers.
#[derive(Debug, Clone)]
pub struct ChannelSurface {
    tx: broadcast::Sender<OverlayEvent>,
}

impl ChannelSurface {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OverlayEvent> {
        self.tx.subscribe()
    }

    fn send(&self, event: OverlayEvent) -> Result<()> {
        self.tx
            .send(event)
            .map(|_| ())
            .map_err(|_| OverlayError::ChannelClosed("overlay events"))
    }
}

impl RenderSurface for ChannelSurface {
    fn comments_replaced(&mut self, comments: &[CommentView]) -> Result<()> {
        self.send(OverlayEvent::CommentsReplaced {
            comments: comments.to_vec(),
        })
    }

    fn unit_revealed(&mut self, comment_id: &str, unit_id: &str) -> Result<()> {
        self.send(OverlayEvent::UnitRevealed {
            comment_id: comment_id.to_string(),
            unit_id: unit_id.to_string(),
        })
    }

    fn unit_jittered(&mut self, unit_id: &str, rotation_deg: i32) -> Result<()> {
        self.send(OverlayEvent::UnitJittered {
            unit_id: unit_id.to_string(),
            rotation_deg,
        })
    }

    fn comment_deactivated(&mut self, comment_id: &str) -> Result<()> {
        self.send(OverlayEvent::CommentDeactivated {
            comment_id: comment_id.to_string(),
        })
    }
}
