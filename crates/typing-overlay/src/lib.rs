//! Typing overlay: typewriter-style animated live comments.
//!
//! This crate turns batches of live comments into a timeline of presentation
//! updates: each comment is split into display units that appear one at a
//! time, wobble while on screen, and fade out a fixed time after they finish.
//!
//! ## Text processing
//!
//! - [`grapheme::segment`] - Split text into user-perceived characters
//! - [`escape::escape_html`] - Escape text for markup, spaces included
//! - [`tokenizer::tokenize`] - Split a comment body into [`DisplayUnit`]s,
//!   keeping embedded `<img>` tags whole
//!
//! ## Animation
//!
//! - [`AnimatedComment`] - One on-screen comment with placement and markup
//! - [`Scheduler`] - Reveal queue, jitter and fade-out timers
//! - [`RenderSurface`] - Where the scheduler reports what changed
//! - [`OverlayRunner`] - Drives a scheduler from a tokio task
//!
//! ## Feed
//!
//! - [`FeedComment`] - One record from the comment aggregator
//! - [`FeedAdapter`] - Trims batches and assigns stable display indices

pub mod comment;
pub mod config;
pub mod error;
pub mod escape;
pub mod feed;
pub mod grapheme;
pub mod runner;
pub mod scheduler;
pub mod surface;
pub mod timer;
pub mod tokenizer;

pub use comment::{AnimatedComment, CommentState, CommentView, Placement};
pub use config::{GiftStickerMode, OverlayConfig};
pub use error::{OverlayError, Result};
pub use escape::escape_html;
pub use feed::{CommentData, CommentIndexer, FeedAdapter, FeedComment, parse_batch};
pub use grapheme::segment;
pub use runner::{OverlayCommand, OverlayHandle, OverlayRunner};
pub use scheduler::Scheduler;
pub use surface::{ChannelSurface, OverlayEvent, RenderSurface};
pub use tokenizer::{DisplayUnit, UnitKind, tokenize};
