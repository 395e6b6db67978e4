//! Event printing.

use clap::ValueEnum;
use serde::Serialize;
use typing_overlay::OverlayEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line
    Json,
    /// Human-readable lines
    Pretty,
}

#[derive(Serialize)]
struct TimedEvent<'a> {
    at_ms: u64,
    #[serde(flatten)]
    event: &'a OverlayEvent,
}

pub fn format_event(format: OutputFormat, at_ms: u64, event: &OverlayEvent) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string(&TimedEvent { at_ms, event })
            .unwrap_or_else(|e| format!(r#"{{"at_ms":{at_ms},"error":"{e}"}}"#)),
        OutputFormat::Pretty => format!("[{at_ms:>8}ms] {}", describe(event)),
    }
}

fn describe(event: &OverlayEvent) -> String {
    match event {
        OverlayEvent::CommentsReplaced { comments } => {
            let ids: Vec<&str> = comments.iter().map(|c| c.comment_id.as_str()).collect();
            format!("comments  {} [{}]", comments.len(), ids.join(", "))
        }
        OverlayEvent::UnitRevealed {
            comment_id,
            unit_id,
        } => format!("reveal    {unit_id} ({comment_id})"),
        OverlayEvent::UnitJittered {
            unit_id,
            rotation_deg,
        } => format!("jitter    {unit_id} {rotation_deg:+}deg"),
        OverlayEvent::CommentDeactivated { comment_id } => format!("fade      {comment_id}"),
    }
}

pub fn print_event(format: OutputFormat, at_ms: u64, event: &OverlayEvent) {
    println!("{}", format_event(format, at_ms, event));
}
