//! Virtual-clock and real-time replays.

use std::time::Duration;

use anyhow::Result;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Instant;
use tracing::{info, warn};
use typing_overlay::runner::DEFAULT_COMMAND_CAPACITY;
use typing_overlay::{
    ChannelSurface, FeedAdapter, OverlayConfig, OverlayEvent, OverlayRunner, Scheduler,
};

use crate::output::{OutputFormat, print_event};
use crate::script::ReplayScript;

/// Upper bound on how long a virtual replay keeps running after its last step.
const MAX_SETTLE_MS: u64 = 24 * 60 * 60 * 1000;
/// Extra time a real-time replay waits on top of the dwell time.
const REALTIME_SLACK_MS: u64 = 5_000;
const EVENT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub events: usize,
    /// Virtual time of the last emitted event
    pub last_event_ms: u64,
}

type Recorder = Scheduler<Vec<OverlayEvent>>;

/// Step a virtual clock through the script.
///
/// Every event is handed to `emit` with its virtual timestamp. Without
/// `tail_ms` the replay runs until no timer is left.
pub fn replay_virtual(
    script: &ReplayScript,
    config: OverlayConfig,
    tail_ms: Option<u64>,
    mut emit: impl FnMut(u64, &OverlayEvent),
) -> Result<ReplaySummary> {
    let mut adapter = FeedAdapter::new(&config);
    let mut scheduler = Scheduler::new(config, Vec::new())?;
    let start = Instant::now();
    let mut events = 0;
    let mut last_event_ms = 0;
    let mut emit = |at_ms: u64, event: &OverlayEvent| {
        last_event_ms = at_ms;
        emit(at_ms, event);
    };

    for step in script.steps() {
        let at = start + Duration::from_millis(step.at_ms);
        events += settle(&mut scheduler, start, at, &mut emit);

        let batch = adapter.prepare(step.batch());
        scheduler.refresh(&batch, at);
        events += drain(&mut scheduler, start, at, &mut emit);
    }

    let until = start
        + Duration::from_millis(script.duration_ms() + tail_ms.unwrap_or(MAX_SETTLE_MS));
    events += settle(&mut scheduler, start, until, &mut emit);

    info!(
        "Replayed {} steps, {} events, {} comments on screen",
        script.steps().len(),
        events,
        scheduler.display_order().len()
    );
    Ok(ReplaySummary {
        events,
        last_event_ms,
    })
}

/// Run every deadline up to `until`, emitting events as they happen.
fn settle(
    scheduler: &mut Recorder,
    start: Instant,
    until: Instant,
    emit: &mut impl FnMut(u64, &OverlayEvent),
) -> usize {
    let mut events = 0;
    while let Some(deadline) = scheduler.next_deadline()
        && deadline <= until
    {
        scheduler.advance_to(deadline);
        events += drain(scheduler, start, deadline, emit);
    }
    events
}

fn drain(
    scheduler: &mut Recorder,
    start: Instant,
    at: Instant,
    emit: &mut impl FnMut(u64, &OverlayEvent),
) -> usize {
    let at_ms = millis_since(start, at);
    let recorded = std::mem::take(scheduler.surface_mut());
    for event in &recorded {
        emit(at_ms, event);
    }
    recorded.len()
}

fn millis_since(start: Instant, at: Instant) -> u64 {
    at.saturating_duration_since(start).as_millis() as u64
}

/// Feed the script to a live runner with real sleeps.
pub async fn replay_realtime(
    script: &ReplayScript,
    config: OverlayConfig,
    tail_ms: Option<u64>,
    format: OutputFormat,
) -> Result<()> {
    let tail = Duration::from_millis(tail_ms.unwrap_or(config.dwell_ms + REALTIME_SLACK_MS));
    let surface = ChannelSurface::new(EVENT_CAPACITY);
    let mut rx = surface.subscribe();

    let scheduler = Scheduler::new(config, surface)?;
    let (handle, task) = OverlayRunner::new(scheduler)
        .with_feed_adapter()
        .spawn(DEFAULT_COMMAND_CAPACITY);

    let start = Instant::now();
    let printer = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => print_event(format, millis_since(start, Instant::now()), &event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Output fell behind, {} events dropped", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    for step in script.steps() {
        tokio::time::sleep_until(start + Duration::from_millis(step.at_ms)).await;
        handle.refresh(step.batch()).await?;
    }
    tokio::time::sleep_until(start + Duration::from_millis(script.duration_ms()) + tail).await;
    handle.shutdown().await?;

    // Dropping the scheduler drops the last sender and ends the printer.
    let scheduler = task.await??;
    info!(
        "Replay finished with {} comments on screen",
        scheduler.display_order().len()
    );
    drop(scheduler);
    printer.await?;
    Ok(())
}
