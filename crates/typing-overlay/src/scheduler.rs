//! Animation scheduler.
//!
//! Owns every comment on screen and drives three timed behaviors on one
//! cooperative timeline:
//!
//! - the **reveal** timer pops one unit per tick from a single FIFO queue
//!   shared by all comments and cancels itself once the queue is empty;
//! - the **jitter** timer restyles every unit of every comment that has not
//!   faded yet;
//! - one **fade-out** per comment fires a fixed dwell time after its last unit
//!   was revealed.
//!
//! [`Scheduler::refresh`] is the only entry point driven by the feed. It stops
//! the interval timers, rebuilds the comment set, the display order and the
//! reveal queue from the new batch (reusing known comments so their progress
//! survives), and restarts the timers.
//!
//! Time is explicit: callers pass `now` to [`Scheduler::refresh`] and
//! [`Scheduler::advance_to`], and wait for [`Scheduler::next_deadline`]
//! between calls. The async [`crate::runner`] does exactly that with tokio's
//! clock; tests drive it with hand-picked instants.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use rustc_hash::FxHashMap;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::comment::{AnimatedComment, CommentView};
use crate::config::OverlayConfig;
use crate::error::Result;
use crate::feed::FeedComment;
use crate::surface::RenderSurface;
use crate::timer::{DeferredQueue, IntervalTimer};

/// Reference to one unit of one specific comment object.
#[derive(Debug, Clone, PartialEq, Eq)]
struct UnitKey {
    comment_id: String,
    instance: u64,
    index: usize,
}

/// Deferred deactivation of one specific comment object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FadeOut {
    pub comment_id: String,
    pub instance: u64,
}

/// Which timer a due deadline belongs to. Declaration order breaks ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum TimerKind {
    FadeOut,
    Reveal,
    Jitter,
}

/// Drives reveal, jitter and fade-out for the displayed comments.
pub struct Scheduler<S> {
    config: OverlayConfig,
    surface: S,
    rng: StdRng,
    comments: FxHashMap<String, AnimatedComment>,
    display_order: Vec<String>,
    reveal_queue: VecDeque<UnitKey>,
    reveal_timer: IntervalTimer,
    jitter_timer: IntervalTimer,
    fade_outs: DeferredQueue<FadeOut>,
    /// Reveals are held back until this instant after a comment completes
    paused_until: Option<Instant>,
    next_instance: u64,
}

impl<S: RenderSurface> Scheduler<S> {
    /// Create a scheduler reporting to `surface`.
    pub fn new(config: OverlayConfig, surface: S) -> Result<Self> {
        config.validate()?;

        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::random()),
        };

        Ok(Self {
            reveal_timer: IntervalTimer::new(config.reveal_interval()),
            jitter_timer: IntervalTimer::new(config.jitter_interval()),
            config,
            surface,
            rng,
            comments: FxHashMap::default(),
            display_order: Vec::new(),
            reveal_queue: VecDeque::new(),
            fade_outs: DeferredQueue::new(),
            paused_until: None,
            next_instance: 0,
        })
    }

    /// Replace the displayed comments with `batch`.
    ///
    /// Comments already on screen keep their placement, their revealed units
    /// and any pending fade-out; only their unrevealed units are queued again.
    /// Comments missing from `batch` are dropped. The reveal queue follows
    /// batch order exactly. A pause left by the previous batch's last
    /// completed comment is dropped, so the new queue types right away.
    pub fn refresh(&mut self, batch: &[FeedComment], now: Instant) {
        // Timers must be stopped before the queue they read is replaced.
        self.reveal_timer.stop();
        self.jitter_timer.stop();
        self.paused_until = None;

        let mut previous = std::mem::take(&mut self.comments);
        self.display_order.clear();
        self.reveal_queue.clear();

        let mut created = 0usize;
        let mut reused = 0usize;

        for source in batch {
            let id = source.comment_id();
            if self.comments.contains_key(id) {
                warn!("Comment {} appears twice in one batch, keeping the first", id);
                continue;
            }

            let mut comment = match previous.remove(id) {
                Some(comment) => {
                    reused += 1;
                    comment
                }
                None => {
                    created += 1;
                    self.create_comment(source, now)
                }
            };
            comment.rebuild_markup();

            self.reveal_queue.extend(
                comment
                    .units()
                    .iter()
                    .enumerate()
                    .filter(|(_, unit)| !unit.is_revealed())
                    .map(|(index, _)| UnitKey {
                        comment_id: id.to_string(),
                        instance: comment.instance(),
                        index,
                    }),
            );
            self.display_order.push(id.to_string());
            self.comments.insert(id.to_string(), comment);
        }

        debug!(
            "Refreshed overlay: {} comments ({} new, {} kept, {} dropped), {} units queued",
            self.display_order.len(),
            created,
            reused,
            previous.len(),
            self.reveal_queue.len()
        );

        let views = self.views();
        report(self.surface.comments_replaced(&views), "comments_replaced");

        if !self.reveal_queue.is_empty() {
            self.reveal_timer.start(now);
        }
        if self.config.jitter_enabled && self.has_live_comments() {
            self.jitter_timer.start(now);
        }
    }

    fn create_comment(&mut self, source: &FeedComment, now: Instant) -> AnimatedComment {
        let instance = self.next_instance;
        self.next_instance += 1;

        let comment = AnimatedComment::create(source, instance, &self.config, &mut self.rng);

        // Nothing to type: the comment is complete as soon as it appears.
        if comment.units().is_empty() {
            self.fade_outs.schedule(
                now + self.config.dwell(),
                FadeOut {
                    comment_id: comment.source_id().to_string(),
                    instance,
                },
            );
        }

        comment
    }

    /// Earliest instant at which any timer wants to fire.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.fade_outs.next_deadline(),
            self.reveal_timer.next_fire(),
            self.jitter_timer.next_fire(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Run every timer callback due at or before `now`, in deadline order.
    ///
    /// Each callback sees its own deadline as the current time, so a fade-out
    /// is always scheduled exactly one dwell after the reveal that caused it.
    /// Returns the number of callbacks run.
    pub fn advance_to(&mut self, now: Instant) -> usize {
        let mut fired = 0;

        loop {
            let due = [
                self.fade_outs
                    .next_deadline()
                    .map(|d| (d, TimerKind::FadeOut)),
                self.reveal_timer.next_fire().map(|d| (d, TimerKind::Reveal)),
                self.jitter_timer.next_fire().map(|d| (d, TimerKind::Jitter)),
            ]
            .into_iter()
            .flatten()
            .filter(|(deadline, _)| *deadline <= now)
            .min();

            let Some((deadline, kind)) = due else {
                break;
            };

            match kind {
                TimerKind::FadeOut => {
                    if let Some(deferred) = self.fade_outs.pop_due(deadline) {
                        self.fade_out(deferred.task);
                    }
                }
                TimerKind::Reveal => {
                    if self.reveal_timer.poll(deadline).is_some() {
                        self.reveal_next(deadline);
                    }
                }
                TimerKind::Jitter => {
                    if self.jitter_timer.poll(deadline).is_some() {
                        self.jitter();
                    }
                }
            }
            fired += 1;
        }

        fired
    }

    /// Reveal timer tick: activate the next queued unit.
    fn reveal_next(&mut self, at: Instant) {
        if let Some(until) = self.paused_until {
            if at < until {
                return;
            }
            self.paused_until = None;
        }

        let Some(key) = self.reveal_queue.pop_front() else {
            self.reveal_timer.stop();
            return;
        };
        if self.reveal_queue.is_empty() {
            self.reveal_timer.stop();
        }

        let Some(comment) = self
            .comments
            .get_mut(&key.comment_id)
            .filter(|c| c.instance() == key.instance)
        else {
            debug!("Queued unit {}#{} has no comment", key.comment_id, key.index);
            return;
        };

        if !comment.activate_unit(key.index) {
            return;
        }
        let unit = &comment.units()[key.index];
        let is_last = unit.is_last();
        let unit_id = unit.id().to_string();

        trace!("Revealed {}", unit_id);
        report(
            self.surface.unit_revealed(&key.comment_id, &unit_id),
            "unit_revealed",
        );

        if is_last {
            self.fade_outs.schedule(
                at + self.config.dwell(),
                FadeOut {
                    comment_id: key.comment_id,
                    instance: key.instance,
                },
            );

            let pause = self.config.next_comment_pause();
            if !pause.is_zero() && !self.reveal_queue.is_empty() {
                self.paused_until = Some(at + pause);
            }
        }
    }

    /// Jitter timer tick: restyle every unit of every comment still on show.
    fn jitter(&mut self) {
        let max = self.config.jitter_max_deg;
        let mut live = false;

        for id in &self.display_order {
            let Some(comment) = self.comments.get(id) else {
                continue;
            };
            if comment.is_deactivated() {
                continue;
            }
            live = true;

            for unit in comment.units() {
                let rotation = self.rng.random_range(-max..=max);
                report(
                    self.surface.unit_jittered(unit.id(), rotation),
                    "unit_jittered",
                );
            }
        }

        if !live {
            self.jitter_timer.stop();
        }
    }

    /// Fade-out callback. Stale callbacks for dropped or re-created comments
    /// are ignored.
    fn fade_out(&mut self, task: FadeOut) {
        match self.comments.get_mut(&task.comment_id) {
            Some(comment) if comment.instance() == task.instance => {
                if comment.deactivate() {
                    debug!("Comment {} fading out", task.comment_id);
                    report(
                        self.surface.comment_deactivated(&task.comment_id),
                        "comment_deactivated",
                    );
                }
            }
            _ => debug!(
                "Fade-out for {} skipped: comment no longer displayed",
                task.comment_id
            ),
        }
    }

    /// Stop the interval timers. Pending fade-outs are kept.
    pub fn stop(&mut self) {
        self.reveal_timer.stop();
        self.jitter_timer.stop();
    }

    fn has_live_comments(&self) -> bool {
        self.comments.values().any(|c| !c.is_deactivated())
    }

    /// Comments in display order.
    pub fn comments(&self) -> impl Iterator<Item = &AnimatedComment> {
        self.display_order
            .iter()
            .filter_map(|id| self.comments.get(id))
    }

    pub fn comment(&self, comment_id: &str) -> Option<&AnimatedComment> {
        self.comments.get(comment_id)
    }

    pub fn display_order(&self) -> &[String] {
        &self.display_order
    }

    /// Presentation snapshots in display order.
    pub fn views(&self) -> Vec<CommentView> {
        self.comments().map(AnimatedComment::view).collect()
    }

    /// Number of units waiting to be revealed.
    pub fn queued_units(&self) -> usize {
        self.reveal_queue.len()
    }

    /// IDs of the units waiting to be revealed, in reveal order.
    pub fn queued_unit_ids(&self) -> Vec<&str> {
        self.reveal_queue
            .iter()
            .filter_map(|key| {
                self.comments
                    .get(&key.comment_id)
                    .and_then(|c| c.units().get(key.index))
                    .map(|u| u.id())
            })
            .collect()
    }

    pub fn is_revealing(&self) -> bool {
        self.reveal_timer.is_running()
    }

    pub fn is_jittering(&self) -> bool {
        self.jitter_timer.is_running()
    }

    pub fn pending_fade_outs(&self) -> usize {
        self.fade_outs.len()
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }
}

/// Log a failed surface notification. A missing element is expected when the
/// presentation layer has already unmounted it.
fn report(result: Result<()>, what: &str) {
    match result {
        Ok(()) => {}
        Err(e) if e.is_missing_target() => debug!("{} ignored: {}", what, e),
        Err(e) => debug!("{} not delivered: {}", what, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::CommentState;
    use crate::error::OverlayError;
    use crate::surface::OverlayEvent;
    use std::time::Duration;

    const REVEAL: Duration = Duration::from_millis(100);
    const DWELL: Duration = Duration::from_millis(1000);

    fn config() -> OverlayConfig {
        OverlayConfig {
            reveal_interval_ms: 100,
            jitter_enabled: false,
            dwell_ms: 1000,
            rng_seed: Some(7),
            ..Default::default()
        }
    }

    fn scheduler(config: OverlayConfig) -> Scheduler<Vec<OverlayEvent>> {
        Scheduler::new(config, Vec::new()).unwrap()
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn revealed_ids(events: &[OverlayEvent]) -> Vec<&str> {
        events
            .iter()
            .filter_map(|e| match e {
                OverlayEvent::UnitRevealed { unit_id, .. } => Some(unit_id.as_str()),
                _ => None,
            })
            .collect()
    }

    fn deactivations(events: &[OverlayEvent], comment: &str) -> usize {
        events
            .iter()
            .filter(|e| {
                matches!(e, OverlayEvent::CommentDeactivated { comment_id } if comment_id == comment)
            })
            .count()
    }

    fn unit_revealed(s: &Scheduler<Vec<OverlayEvent>>, comment: &str, index: usize) -> bool {
        s.comment(comment).unwrap().units()[index].is_revealed()
    }

    #[test]
    fn test_refresh_queues_units_and_publishes() {
        let t0 = Instant::now();
        let mut s = scheduler(config());

        s.refresh(
            &[FeedComment::new("c1", "ab"), FeedComment::new("c2", "x")],
            t0,
        );

        assert_eq!(s.display_order(), ["c1", "c2"]);
        assert_eq!(s.queued_unit_ids(), vec!["c1-0", "c1-1", "c2-0"]);
        assert!(s.is_revealing());
        assert_eq!(s.next_deadline(), Some(t0 + REVEAL));

        match &s.surface()[0] {
            OverlayEvent::CommentsReplaced { comments } => {
                assert_eq!(comments.len(), 2);
                assert_eq!(comments[0].comment_id, "c1");
                assert_eq!(comments[1].comment_id, "c2");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_refresh_preserves_revealed_units() {
        let t0 = Instant::now();
        let mut s = scheduler(config());
        let batch = [FeedComment::new("c1", "abc")];

        s.refresh(&batch, t0);
        let style = s.comment("c1").unwrap().style().to_string();
        s.advance_to(t0 + REVEAL);
        assert!(unit_revealed(&s, "c1", 0));

        s.refresh(&batch, t0 + ms(150));

        assert!(unit_revealed(&s, "c1", 0));
        assert!(!unit_revealed(&s, "c1", 1));
        assert_eq!(s.queued_unit_ids(), vec!["c1-1", "c1-2"]);
        // Same object: placement and progress carried over.
        let comment = s.comment("c1").unwrap();
        assert_eq!(comment.style(), style);
        assert_eq!(comment.state(), CommentState::Revealing);
        assert!(
            comment
                .animation_content()
                .contains(r#"<div id="c1-0" class="typing-block is-active">"#)
        );
    }

    #[test]
    fn test_refresh_drops_omitted_comments() {
        let t0 = Instant::now();
        let mut s = scheduler(config());

        s.refresh(
            &[FeedComment::new("c1", "a"), FeedComment::new("c2", "b")],
            t0,
        );
        s.refresh(&[FeedComment::new("c2", "b")], t0 + ms(10));

        assert_eq!(s.display_order(), ["c2"]);
        assert!(s.comment("c1").is_none());
        assert_eq!(s.queued_unit_ids(), vec!["c2-0"]);
    }

    #[test]
    fn test_reveal_drains_queue_then_cancels() {
        let t0 = Instant::now();
        let mut s = scheduler(config());
        s.refresh(&[FeedComment::new("c1", "ab")], t0);

        s.advance_to(t0 + REVEAL);
        assert_eq!(s.queued_units(), 1);
        assert!(s.is_revealing());

        s.advance_to(t0 + REVEAL * 2);
        assert_eq!(s.queued_units(), 0);
        assert!(!s.is_revealing());
        assert_eq!(revealed_ids(s.surface()), vec!["c1-0", "c1-1"]);

        // Only the fade-out remains on the timeline.
        assert_eq!(s.next_deadline(), Some(t0 + REVEAL * 2 + DWELL));
        s.advance_to(t0 + REVEAL * 2 + DWELL - ms(1));
        assert_eq!(revealed_ids(s.surface()).len(), 2);
    }

    #[test]
    fn test_deactivate_once_after_dwell() {
        let t0 = Instant::now();
        let mut s = scheduler(config());
        let batch = [FeedComment::new("c1", "ab")];
        s.refresh(&batch, t0);

        let last_reveal = t0 + REVEAL * 2;
        s.advance_to(last_reveal + DWELL - ms(1));
        assert_eq!(deactivations(s.surface(), "c1"), 0);
        assert_eq!(
            s.comment("c1").unwrap().state(),
            CommentState::FullyRevealed
        );

        s.advance_to(last_reveal + DWELL);
        assert_eq!(deactivations(s.surface(), "c1"), 1);
        assert!(s.comment("c1").unwrap().is_deactivated());

        // Later refreshes and fires never deactivate it again.
        s.refresh(&batch, last_reveal + DWELL + ms(10));
        s.advance_to(last_reveal + DWELL * 5);
        assert_eq!(deactivations(s.surface(), "c1"), 1);
        assert_eq!(s.next_deadline(), None);
        assert_eq!(s.pending_fade_outs(), 0);
    }

    #[test]
    fn test_stale_fade_out_ignored_for_recreated_comment() {
        let t0 = Instant::now();
        let mut s = scheduler(config());
        let batch = [FeedComment::new("c1", "a")];

        s.refresh(&batch, t0);
        s.advance_to(t0 + REVEAL); // fade-out due at t0 + 1100ms
        s.refresh(&[], t0 + ms(200));
        s.refresh(&batch, t0 + ms(300)); // new object, revealed at t0 + 400ms

        s.advance_to(t0 + REVEAL + DWELL);
        assert!(!s.comment("c1").unwrap().is_deactivated());
        assert_eq!(deactivations(s.surface(), "c1"), 0);

        s.advance_to(t0 + ms(400) + DWELL);
        assert!(s.comment("c1").unwrap().is_deactivated());
        assert_eq!(deactivations(s.surface(), "c1"), 1);
    }

    #[test]
    fn test_empty_comment_fades_without_reveal() {
        let t0 = Instant::now();
        let mut s = scheduler(config());

        s.refresh(&[FeedComment::new("c1", "")], t0);
        assert!(!s.is_revealing());
        assert_eq!(s.pending_fade_outs(), 1);

        s.advance_to(t0 + DWELL);
        assert_eq!(deactivations(s.surface(), "c1"), 1);

        // A reused empty comment is not scheduled twice.
        s.refresh(&[FeedComment::new("c1", "")], t0 + DWELL + ms(1));
        assert_eq!(s.pending_fade_outs(), 0);
    }

    #[test]
    fn test_reveal_order_follows_batch_order() {
        let t0 = Instant::now();
        let mut s = scheduler(config());

        s.refresh(&[FeedComment::new("c1", "abc")], t0);
        s.advance_to(t0 + REVEAL);

        // A new comment placed earlier in the batch goes first.
        let now = t0 + ms(150);
        s.refresh(
            &[FeedComment::new("c2", "x"), FeedComment::new("c1", "abc")],
            now,
        );
        s.advance_to(now + REVEAL * 3);

        assert_eq!(
            revealed_ids(s.surface()),
            vec!["c1-0", "c2-0", "c1-1", "c1-2"]
        );
    }

    #[test]
    fn test_refresh_restarts_reveal_phase() {
        let t0 = Instant::now();
        let mut s = scheduler(config());
        let batch = [FeedComment::new("c1", "abc")];

        s.refresh(&batch, t0);
        s.refresh(&batch, t0 + ms(90));

        // The first tick moved from t0+100 to t0+190.
        s.advance_to(t0 + ms(150));
        assert!(!unit_revealed(&s, "c1", 0));
        s.advance_to(t0 + ms(190));
        assert!(unit_revealed(&s, "c1", 0));
    }

    #[test]
    fn test_duplicate_ids_in_batch() {
        let t0 = Instant::now();
        let mut s = scheduler(config());

        s.refresh(
            &[FeedComment::new("c1", "ab"), FeedComment::new("c1", "ab")],
            t0,
        );

        assert_eq!(s.display_order(), ["c1"]);
        assert_eq!(s.queued_units(), 2);
    }

    #[test]
    fn test_next_comment_pause() {
        let t0 = Instant::now();
        let mut s = scheduler(OverlayConfig {
            next_comment_pause_ms: 500,
            ..config()
        });

        s.refresh(
            &[FeedComment::new("c1", "a"), FeedComment::new("c2", "b")],
            t0,
        );

        s.advance_to(t0 + REVEAL);
        assert!(unit_revealed(&s, "c1", 0));

        // Ticks during the pause do not consume the queue.
        s.advance_to(t0 + ms(500));
        assert!(!unit_revealed(&s, "c2", 0));
        assert_eq!(s.queued_units(), 1);

        s.advance_to(t0 + ms(600));
        assert!(unit_revealed(&s, "c2", 0));
        assert!(!s.is_revealing());
    }

    #[test]
    fn test_refresh_drops_pending_pause() {
        let t0 = Instant::now();
        let mut s = scheduler(OverlayConfig {
            next_comment_pause_ms: 500,
            ..config()
        });

        s.refresh(
            &[FeedComment::new("c1", "a"), FeedComment::new("c2", "b")],
            t0,
        );
        s.advance_to(t0 + REVEAL);
        assert!(unit_revealed(&s, "c1", 0));

        // c1 completed and left a pause until 600ms; the new batch types on
        // the normal cadence instead.
        s.refresh(&[FeedComment::new("c2", "b")], t0 + ms(150));
        s.advance_to(t0 + ms(250));
        assert!(unit_revealed(&s, "c2", 0));
        assert_eq!(s.queued_units(), 0);
    }

    #[test]
    fn test_jitter_runs_until_all_deactivated() {
        let t0 = Instant::now();
        let mut s = scheduler(OverlayConfig {
            jitter_enabled: true,
            jitter_interval_ms: 300,
            jitter_max_deg: 3,
            ..config()
        });

        s.refresh(&[FeedComment::new("c1", "ab")], t0);
        assert!(s.is_jittering());

        s.advance_to(t0 + ms(300));
        let jitters: Vec<_> = s
            .surface()
            .iter()
            .filter_map(|e| match e {
                OverlayEvent::UnitJittered {
                    unit_id,
                    rotation_deg,
                } => Some((unit_id.clone(), *rotation_deg)),
                _ => None,
            })
            .collect();
        assert_eq!(jitters.len(), 2);
        assert_eq!(jitters[0].0, "c1-0");
        assert_eq!(jitters[1].0, "c1-1");
        assert!(jitters.iter().all(|(_, deg)| (-3..=3).contains(deg)));

        // Last reveal at 200ms, fade-out at 1200ms; the jitter tick at 1200ms
        // runs after the fade-out and finds nothing left to shake.
        s.advance_to(t0 + ms(1200));
        assert!(s.comment("c1").unwrap().is_deactivated());
        assert!(!s.is_jittering());
        assert!(s.comment("c1").unwrap().units().iter().all(|u| u.is_revealed()));
    }

    #[test]
    fn test_jitter_never_reveals() {
        let t0 = Instant::now();
        let mut s = scheduler(OverlayConfig {
            reveal_interval_ms: 5000,
            jitter_enabled: true,
            jitter_interval_ms: 300,
            ..config()
        });

        s.refresh(&[FeedComment::new("c1", "ab")], t0);
        let queued = s.queued_unit_ids().join(",");

        // Three jitter ticks, no reveal tick yet.
        assert_eq!(s.advance_to(t0 + ms(1000)), 3);

        let c1 = s.comment("c1").unwrap();
        assert!(c1.units().iter().all(|u| !u.is_revealed()));
        assert_eq!(c1.state(), CommentState::Pending);
        assert_eq!(s.queued_unit_ids().join(","), queued);

        let jittered = s
            .surface()
            .iter()
            .filter(|e| matches!(e, OverlayEvent::UnitJittered { .. }))
            .count();
        assert_eq!(jittered, 6);
        assert!(revealed_ids(s.surface()).is_empty());
        assert_eq!(s.next_deadline(), Some(t0 + ms(1200)));
    }

    struct ForgetfulSurface {
        revealed: usize,
    }

    impl RenderSurface for ForgetfulSurface {
        fn comments_replaced(&mut self, _comments: &[CommentView]) -> Result<()> {
            Ok(())
        }

        fn unit_revealed(&mut self, _comment_id: &str, unit_id: &str) -> Result<()> {
            self.revealed += 1;
            Err(OverlayError::missing_target(unit_id))
        }

        fn unit_jittered(&mut self, unit_id: &str, _rotation_deg: i32) -> Result<()> {
            Err(OverlayError::missing_target(unit_id))
        }

        fn comment_deactivated(&mut self, comment_id: &str) -> Result<()> {
            Err(OverlayError::missing_target(comment_id))
        }
    }

    #[test]
    fn test_missing_targets_do_not_stop_the_scheduler() {
        let t0 = Instant::now();
        let mut s = Scheduler::new(config(), ForgetfulSurface { revealed: 0 }).unwrap();

        s.refresh(&[FeedComment::new("c1", "abc")], t0);
        s.advance_to(t0 + REVEAL * 3 + DWELL);

        assert_eq!(s.surface().revealed, 3);
        let comment = s.comment("c1").unwrap();
        assert!(comment.units().iter().all(|u| u.is_revealed()));
        assert!(comment.is_deactivated());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = Scheduler::new(
            OverlayConfig {
                reveal_interval_ms: 0,
                ..config()
            },
            Vec::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_same_seed_same_placement() {
        let t0 = Instant::now();
        let mut a = scheduler(config());
        let mut b = scheduler(config());
        let batch = [FeedComment::new("c1", "a"), FeedComment::new("c2", "b")];

        a.refresh(&batch, t0);
        b.refresh(&batch, t0);

        let styles = |s: &Scheduler<Vec<OverlayEvent>>| {
            s.comments().map(|c| c.style().to_string()).collect::<Vec<_>>()
        };
        assert_eq!(styles(&a), styles(&b));
    }
}
