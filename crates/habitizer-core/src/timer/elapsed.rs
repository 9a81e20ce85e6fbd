//! Pausable stopwatch.
//!
//! Same wall-clock-delta model as a countdown timer, running the other way:
//! nothing ticks internally, elapsed time is folded in whenever the timer
//! stops and computed on demand while it runs.
//!
//! ```text
//! (reset) -> running <-> paused -> (reset)
//! ```

use serde::{Deserialize, Serialize};

use super::clock::SharedClock;

/// Routine-level or task-level stopwatch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElapsedTimer {
    /// Time folded in from previous running spans, in milliseconds.
    accumulated_ms: u64,
    running: bool,
    /// Epoch ms when the current running span began.
    #[serde(default)]
    last_resume_ms: Option<u64>,
    /// False until the first start after a reset.
    #[serde(default)]
    started: bool,
    #[serde(skip)]
    clock: SharedClock,
}

impl PartialEq for ElapsedTimer {
    fn eq(&self, other: &Self) -> bool {
        self.accumulated_ms == other.accumulated_ms
            && self.running == other.running
            && self.last_resume_ms == other.last_resume_ms
            && self.started == other.started
    }
}

impl ElapsedTimer {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            ..Self::default()
        }
    }

    /// Point this timer at a different clock. Accumulated time is kept.
    pub fn set_clock(&mut self, clock: SharedClock) {
        self.clock = clock;
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    /// Live reading in milliseconds, including the current running span.
    pub fn elapsed_ms(&self) -> u64 {
        let live = match (self.running, self.last_resume_ms) {
            (true, Some(since)) => self.clock.now_ms().saturating_sub(since),
            _ => 0,
        };
        self.accumulated_ms.saturating_add(live)
    }

    /// Whole seconds, floored.
    pub fn rounded_down(&self) -> u64 {
        self.elapsed_ms() / 1000
    }

    /// Whole seconds, ceiled. Differs from [`rounded_down`](Self::rounded_down)
    /// only while a sub-second fraction is pending.
    pub fn rounded_up(&self) -> u64 {
        self.elapsed_ms().div_ceil(1000)
    }

    /// `MM:SS` readout, or `"-"` if the timer has not run since its last reset.
    pub fn formatted(&self) -> String {
        if self.started {
            format_elapsed(self.rounded_down())
        } else {
            NEVER_STARTED.to_string()
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.started = true;
        self.last_resume_ms = Some(self.clock.now_ms());
    }

    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.flush_elapsed();
        self.running = false;
        self.last_resume_ms = None;
    }

    pub fn pause(&mut self) {
        self.stop();
    }

    pub fn resume(&mut self) {
        self.start();
    }

    pub fn reset(&mut self) {
        self.accumulated_ms = 0;
        self.running = false;
        self.last_resume_ms = None;
        self.started = false;
    }

    /// Add time directly, whether or not the timer is running.
    pub fn advance(&mut self, delta_secs: u64) {
        self.accumulated_ms = self
            .accumulated_ms
            .saturating_add(delta_secs.saturating_mul(1000));
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn flush_elapsed(&mut self) {
        if let Some(since) = self.last_resume_ms {
            let now = self.clock.now_ms();
            self.accumulated_ms = self
                .accumulated_ms
                .saturating_add(now.saturating_sub(since));
            self.last_resume_ms = Some(now);
        }
    }
}

/// Readout for a timer that has never started.
pub const NEVER_STARTED: &str = "-";

/// Format whole seconds as `MM:SS`. Minutes are not wrapped into hours.
pub fn format_elapsed(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::ManualClock;
    use std::sync::Arc;

    fn timer() -> (ElapsedTimer, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        (ElapsedTimer::new(clock.clone().into()), clock)
    }

    #[test]
    fn accumulates_only_while_running() {
        let (mut t, clock) = timer();
        clock.advance_secs(10);
        assert_eq!(t.rounded_down(), 0);

        t.start();
        clock.advance_secs(5);
        assert_eq!(t.rounded_down(), 5);

        t.pause();
        clock.advance_secs(100);
        assert_eq!(t.rounded_down(), 5);

        t.resume();
        clock.advance_secs(2);
        assert_eq!(t.rounded_down(), 7);
    }

    #[test]
    fn start_while_running_keeps_time() {
        let (mut t, clock) = timer();
        t.start();
        clock.advance_secs(4);
        t.start();
        clock.advance_secs(1);
        assert_eq!(t.rounded_down(), 5);
    }

    #[test]
    fn rounding_with_sub_second_fraction() {
        let (mut t, clock) = timer();
        t.start();
        clock.advance_ms(12_400);
        assert_eq!(t.rounded_down(), 12);
        assert_eq!(t.rounded_up(), 13);

        clock.advance_ms(600);
        assert_eq!(t.rounded_down(), 13);
        assert_eq!(t.rounded_up(), 13);
    }

    #[test]
    fn advance_applies_when_stopped() {
        let (mut t, _clock) = timer();
        t.advance(30);
        assert!(!t.is_running());
        assert_eq!(t.rounded_down(), 30);
    }

    #[test]
    fn reset_zeroes_and_clears_started() {
        let (mut t, clock) = timer();
        t.start();
        clock.advance_secs(9);
        t.reset();
        assert_eq!(t.elapsed_ms(), 0);
        assert!(!t.is_running());
        assert_eq!(t.formatted(), "-");
    }

    #[test]
    fn formatted_readout() {
        let (mut t, _clock) = timer();
        assert_eq!(t.formatted(), NEVER_STARTED);
        t.start();
        t.advance(75);
        assert_eq!(t.formatted(), "01:15");
    }

    #[test]
    fn format_elapsed_does_not_wrap_minutes() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(59), "00:59");
        assert_eq!(format_elapsed(60), "01:00");
        assert_eq!(format_elapsed(100 * 60 + 5), "100:05");
    }

    #[test]
    fn serde_skips_clock() {
        let (mut t, clock) = timer();
        t.start();
        clock.advance_secs(5);
        t.stop();
        let json = serde_json::to_string(&t).unwrap();
        assert!(!json.contains("clock"));
        let back: ElapsedTimer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
        assert_eq!(back.rounded_down(), 5);
    }
}
