//! Merge coordinator for background-rendered pages.
//!
//! Background rendering keeps producing page images while the user is
//! free to flip through the pages already loaded. Splicing new images
//! into the live list mid-flip causes a visible reflow, so merges are
//! debounced through a small state machine:
//!
//! - `Idle`: merges may be scheduled.
//! - `Flipping`: a flip was reported; no merge until the settle window
//!   passes.
//! - `UpdateScheduled`: a merge is armed and fires once its settle
//!   deadline passes.
//!
//! `UpdateScheduled` is only reachable from `Idle`, and a flip always
//! wins: if one arrives while a merge is armed, the schedule is dropped
//! and re-evaluated after the flip settles. This makes "no merge during
//! a flip settle window" structural rather than a timer race, and it
//! guarantees at most one armed merge at any instant.
//!
//! The coordinator is the sole owner of both the live page list and the
//! pending buffer. The live list only ever grows, and always in page
//! order, which is what keeps the viewer widget's index bookkeeping
//! valid.

use std::time::{Duration, Instant};

/// How long after a flip notification merges stay suppressed.
pub const FLIP_SETTLE: Duration = Duration::from_millis(300);

/// How long an armed merge waits before firing.
pub const MERGE_SETTLE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Flipping { until: Instant },
    UpdateScheduled { at: Instant },
}

/// Observable coordinator phase, for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePhase {
    Idle,
    Flipping,
    UpdateScheduled,
}

/// Outcome of a [`MergeCoordinator::poll`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePoll {
    /// Nothing fired; the live list is unchanged.
    Quiet,
    /// The pending buffer was appended to the live list. The caller must
    /// now hand the full list back to the viewer widget, once per batch.
    Merged { appended: usize },
}

#[derive(Debug)]
pub struct MergeCoordinator<P> {
    state: State,
    pages: Vec<P>,
    pending: Vec<P>,
}

impl<P> MergeCoordinator<P> {
    /// Start with the initial batch already in the live list.
    pub fn new(initial: Vec<P>) -> Self {
        Self { state: State::Idle, pages: initial, pending: Vec::new() }
    }

    /// The live page image list, in page order. Append-only.
    pub fn pages(&self) -> &[P] {
        &self.pages
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn phase(&self) -> MergePhase {
        match self.state {
            State::Idle => MergePhase::Idle,
            State::Flipping { .. } => MergePhase::Flipping,
            State::UpdateScheduled { .. } => MergePhase::UpdateScheduled,
        }
    }

    /// The next instant at which [`poll`](Self::poll) can do something,
    /// if any. Callers that sleep between events can wake at this point.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            State::Idle => None,
            State::Flipping { until } => Some(until),
            State::UpdateScheduled { at } => Some(at),
        }
    }

    /// A flip started (or completed) in the viewer widget. Suppresses
    /// merges until `now + FLIP_SETTLE`; an armed merge is dropped and
    /// re-evaluated once the window passes.
    pub fn on_flip(&mut self, now: Instant) {
        self.state = State::Flipping { until: now + FLIP_SETTLE };
    }

    /// A background page finished rendering. Buffers the image and
    /// attempts to arm a merge; the attempt is a no-op unless the state
    /// is `Idle` (buffer non-empty is implied by the push).
    pub fn push_rendered(&mut self, image: P, now: Instant) {
        self.pending.push(image);
        self.try_schedule(now);
    }

    /// Advance the state machine to `now`.
    pub fn poll(&mut self, now: Instant) -> MergePoll {
        match self.state {
            State::Flipping { until } if now >= until => {
                self.state = State::Idle;
                self.try_schedule(now);
                MergePoll::Quiet
            }
            State::UpdateScheduled { at } if now >= at => {
                let appended = self.pending.len();
                self.pages.append(&mut self.pending);
                self.state = State::Idle;
                MergePoll::Merged { appended }
            }
            _ => MergePoll::Quiet,
        }
    }

    fn try_schedule(&mut self, now: Instant) {
        if matches!(self.state, State::Idle) && !self.pending.is_empty() {
            self.state = State::UpdateScheduled { at: now + MERGE_SETTLE };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> Instant {
        Instant::now()
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn starts_idle_with_initial_batch() {
        let coordinator = MergeCoordinator::new(vec!["p0", "p1", "p2", "p3"]);

        assert_eq!(coordinator.phase(), MergePhase::Idle);
        assert_eq!(coordinator.pages(), &["p0", "p1", "p2", "p3"]);
        assert_eq!(coordinator.pending_len(), 0);
        assert_eq!(coordinator.next_deadline(), None);
    }

    #[test]
    fn rendered_page_arms_exactly_one_merge() {
        let start = t0();
        let mut coordinator = MergeCoordinator::new(vec!["p0"]);

        coordinator.push_rendered("p1", start);
        assert_eq!(coordinator.phase(), MergePhase::UpdateScheduled);
        assert_eq!(coordinator.next_deadline(), Some(start + MERGE_SETTLE));

        // A second page while armed must not re-arm or postpone.
        coordinator.push_rendered("p2", start + ms(100));
        assert_eq!(coordinator.next_deadline(), Some(start + MERGE_SETTLE));

        assert_eq!(coordinator.poll(start + ms(249)), MergePoll::Quiet);
        assert_eq!(coordinator.poll(start + ms(250)), MergePoll::Merged { appended: 2 });
        assert_eq!(coordinator.pages(), &["p0", "p1", "p2"]);
        assert_eq!(coordinator.pending_len(), 0);
        assert_eq!(coordinator.phase(), MergePhase::Idle);
    }

    #[test]
    fn merge_preserves_page_order_across_batches() {
        let start = t0();
        let mut coordinator = MergeCoordinator::new(vec![0, 1, 2, 3]);

        coordinator.push_rendered(4, start);
        coordinator.push_rendered(5, start + ms(40));
        assert_eq!(coordinator.poll(start + ms(250)), MergePoll::Merged { appended: 2 });

        coordinator.push_rendered(6, start + ms(300));
        assert_eq!(coordinator.poll(start + ms(550)), MergePoll::Merged { appended: 1 });

        assert_eq!(coordinator.pages(), &[0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn no_merge_fires_inside_the_flip_settle_window() {
        let start = t0();
        let mut coordinator = MergeCoordinator::new(vec!["p0"]);

        coordinator.on_flip(start);
        coordinator.push_rendered("p1", start + ms(10));

        // Page arriving mid-flip must not arm a merge.
        assert_eq!(coordinator.phase(), MergePhase::Flipping);

        for elapsed in [50, 150, 299] {
            assert_eq!(coordinator.poll(start + ms(elapsed)), MergePoll::Quiet);
            assert_eq!(coordinator.pages().len(), 1);
        }

        // Settle window ends: flip state clears and a merge is armed,
        // firing one merge-settle later.
        assert_eq!(coordinator.poll(start + ms(300)), MergePoll::Quiet);
        assert_eq!(coordinator.phase(), MergePhase::UpdateScheduled);
        assert_eq!(coordinator.poll(start + ms(549)), MergePoll::Quiet);
        assert_eq!(coordinator.poll(start + ms(550)), MergePoll::Merged { appended: 1 });
    }

    #[test]
    fn flip_cancels_an_armed_merge() {
        let start = t0();
        let mut coordinator = MergeCoordinator::new(vec!["p0"]);

        coordinator.push_rendered("p1", start);
        assert_eq!(coordinator.phase(), MergePhase::UpdateScheduled);

        coordinator.on_flip(start + ms(100));
        assert_eq!(coordinator.phase(), MergePhase::Flipping);

        // The original merge deadline passes without a merge.
        assert_eq!(coordinator.poll(start + ms(250)), MergePoll::Quiet);
        assert_eq!(coordinator.pages().len(), 1);

        // Flip settles at +400, merge re-arms and fires at +650.
        assert_eq!(coordinator.poll(start + ms(400)), MergePoll::Quiet);
        assert_eq!(coordinator.poll(start + ms(650)), MergePoll::Merged { appended: 1 });
    }

    #[test]
    fn repeated_flips_extend_the_suppression_window() {
        let start = t0();
        let mut coordinator = MergeCoordinator::new(vec!["p0"]);

        coordinator.push_rendered("p1", start);
        coordinator.on_flip(start + ms(50));
        coordinator.on_flip(start + ms(200));

        // First flip would settle at +350; the second pushes it to +500.
        assert_eq!(coordinator.poll(start + ms(350)), MergePoll::Quiet);
        assert_eq!(coordinator.phase(), MergePhase::Flipping);

        assert_eq!(coordinator.poll(start + ms(500)), MergePoll::Quiet);
        assert_eq!(coordinator.phase(), MergePhase::UpdateScheduled);
        assert_eq!(coordinator.poll(start + ms(750)), MergePoll::Merged { appended: 1 });
    }

    #[test]
    fn flip_with_empty_buffer_returns_to_plain_idle() {
        let start = t0();
        let mut coordinator = MergeCoordinator::<&str>::new(vec!["p0"]);

        coordinator.on_flip(start);
        assert_eq!(coordinator.poll(start + ms(300)), MergePoll::Quiet);
        assert_eq!(coordinator.phase(), MergePhase::Idle);
        assert_eq!(coordinator.next_deadline(), None);
    }

    #[test]
    fn full_session_yields_every_page_in_order() {
        let start = t0();
        let mut coordinator = MergeCoordinator::new((0..4).collect::<Vec<_>>());

        let mut now = start;
        for page in 4..10 {
            now += ms(80);
            coordinator.push_rendered(page, now);

            // Drive the machine well past any deadline between pages.
            loop {
                now += ms(300);
                if coordinator.poll(now) == MergePoll::Quiet
                    && coordinator.phase() == MergePhase::Idle
                {
                    break;
                }
            }
        }

        assert_eq!(coordinator.pages(), &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(coordinator.pending_len(), 0);
    }
}
