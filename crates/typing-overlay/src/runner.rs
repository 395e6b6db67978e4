//! Async driver for the scheduler.
//!
//! One task owns the [`Scheduler`] and multiplexes feed updates, cancellation
//! and the scheduler's own deadlines with `tokio::select!`. Because every
//! callback runs on that task, timer callbacks and refreshes never interleave.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{OverlayError, Result};
use crate::feed::{FeedAdapter, FeedComment};
use crate::scheduler::Scheduler;
use crate::surface::RenderSurface;

/// Default command channel capacity.
pub const DEFAULT_COMMAND_CAPACITY: usize = 32;

/// Commands accepted by a running overlay.
#[derive(Debug, Clone)]
pub enum OverlayCommand {
    /// A new feed batch arrived
    Refresh(Vec<FeedComment>),
    /// Stop the overlay loop
    Shutdown,
}

/// Result of command handling - indicates whether to continue or stop.
#[derive(Debug, PartialEq)]
enum CommandResult {
    Continue,
    Stop,
}

/// Cloneable handle to a running overlay.
#[derive(Debug, Clone)]
pub struct OverlayHandle {
    tx: mpsc::Sender<OverlayCommand>,
    cancel: CancellationToken,
}

impl OverlayHandle {
    /// Deliver a feed batch.
    pub async fn refresh(&self, batch: Vec<FeedComment>) -> Result<()> {
        self.send(OverlayCommand::Refresh(batch)).await
    }

    /// Ask the loop to stop after the commands already queued.
    pub async fn shutdown(&self) -> Result<()> {
        self.send(OverlayCommand::Shutdown).await
    }

    /// Stop the loop immediately.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn send(&self, command: OverlayCommand) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| OverlayError::ChannelClosed("overlay commands"))
    }
}

/// Event loop around a [`Scheduler`].
pub struct OverlayRunner<S> {
    scheduler: Scheduler<S>,
    adapter: Option<FeedAdapter>,
}

impl<S: RenderSurface> OverlayRunner<S> {
    pub fn new(scheduler: Scheduler<S>) -> Self {
        Self {
            scheduler,
            adapter: None,
        }
    }

    /// Trim and index incoming batches before they reach the scheduler.
    pub fn with_feed_adapter(mut self) -> Self {
        self.adapter = Some(FeedAdapter::new(self.scheduler.config()));
        self
    }

    /// Run until shut down, cancelled, or every handle is dropped.
    ///
    /// Returns the scheduler so callers can inspect its final state.
    pub async fn run(
        mut self,
        mut command_rx: mpsc::Receiver<OverlayCommand>,
        cancel_token: CancellationToken,
    ) -> Result<Scheduler<S>> {
        info!("Overlay runner started");

        loop {
            let deadline = self.scheduler.next_deadline();

            tokio::select! {
                biased;

                cmd = command_rx.recv() => {
                    if self.handle_command(cmd) == CommandResult::Stop {
                        break;
                    }
                }

                _ = cancel_token.cancelled() => {
                    debug!("Overlay runner cancelled");
                    break;
                }

                _ = wait_for(deadline) => {
                    self.scheduler.advance_to(Instant::now());
                }
            }
        }

        self.scheduler.stop();
        info!("Overlay runner stopped");
        Ok(self.scheduler)
    }

    fn handle_command(&mut self, cmd: Option<OverlayCommand>) -> CommandResult {
        match cmd {
            Some(OverlayCommand::Refresh(batch)) => {
                let batch = match self.adapter.as_mut() {
                    Some(adapter) => adapter.prepare(batch),
                    None => batch,
                };
                self.scheduler.refresh(&batch, Instant::now());
                CommandResult::Continue
            }
            Some(OverlayCommand::Shutdown) | None => CommandResult::Stop,
        }
    }
}

impl<S: RenderSurface + Send + 'static> OverlayRunner<S> {
    /// Spawn the loop on the current runtime.
    pub fn spawn(self, capacity: usize) -> (OverlayHandle, JoinHandle<Result<Scheduler<S>>>) {
        let (tx, rx) = mpsc::channel(capacity);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(self.run(rx, cancel.clone()));
        (OverlayHandle { tx, cancel }, task)
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
