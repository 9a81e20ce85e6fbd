//! Periodic elapsed-time readouts.
//!
//! Each running timer gets one repeating tick on the ambient tokio runtime.
//! A tick owns a copy of its timer taken when it was scheduled and only
//! pushes the formatted reading to a subject. Any command that changes a
//! timer must therefore call [`Ticker::reschedule`] (or [`Ticker::cancel`])
//! afterwards, so the outstanding ticks are aborted before new ones start.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::routine::Routine;
use crate::subject::{RoutineObservers, Subject};
use crate::timer::ElapsedTimer;

#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    routine: Option<JoinHandle<()>>,
    task: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            routine: None,
            task: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// True while at least one tick stream is live.
    pub fn is_ticking(&self) -> bool {
        [&self.routine, &self.task]
            .into_iter()
            .flatten()
            .any(|h| !h.is_finished())
    }

    pub fn cancel(&mut self) {
        for handle in [self.routine.take(), self.task.take()].into_iter().flatten() {
            handle.abort();
        }
    }

    /// Cancel outstanding ticks, then start one stream per running timer of `routine`.
    pub fn reschedule(&mut self, routine: &Routine, observers: &RoutineObservers) {
        self.cancel();
        if routine.routine_timer().is_running() {
            self.routine = self.spawn(
                routine.routine_timer().clone(),
                observers.routine_elapsed.clone(),
            );
        }
        if routine.task_timer().is_running() {
            self.task = self.spawn(routine.task_timer().clone(), observers.task_elapsed.clone());
        }
    }

    fn spawn(&self, timer: ElapsedTimer, subject: Subject<String>) -> Option<JoinHandle<()>> {
        let Ok(runtime) = Handle::try_current() else {
            tracing::trace!("no tokio runtime, periodic readouts disabled");
            return None;
        };
        let period = self.period;
        Some(runtime.spawn(async move {
            let mut ticks = tokio::time::interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticks.tick().await;
                subject.set(timer.formatted());
            }
        }))
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::ManualClock;
    use std::sync::Arc;

    fn running_routine(clock: &Arc<ManualClock>) -> Routine {
        let mut routine = Routine::new(1, "Morning", 0);
        routine.set_clock(clock.clone().into());
        routine.add_task("Shower").unwrap();
        routine.start().unwrap();
        routine
    }

    #[test]
    fn without_runtime_nothing_is_scheduled() {
        let clock = Arc::new(ManualClock::new(0));
        let routine = running_routine(&clock);
        let mut ticker = Ticker::new(Duration::from_secs(1));
        ticker.reschedule(&routine, &RoutineObservers::default());
        assert!(!ticker.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_push_readouts_until_cancelled() {
        let clock = Arc::new(ManualClock::new(0));
        let routine = running_routine(&clock);
        let observers = RoutineObservers::default();
        let mut ticker = Ticker::new(Duration::from_secs(1));

        ticker.reschedule(&routine, &observers);
        assert!(ticker.is_ticking());

        clock.advance_secs(5);
        tokio::time::sleep(Duration::from_millis(1_100)).await;
        assert_eq!(observers.routine_elapsed.get(), "00:05");
        assert_eq!(observers.task_elapsed.get(), "00:05");

        ticker.cancel();
        tokio::task::yield_now().await;
        assert!(!ticker.is_ticking());

        clock.advance_secs(5);
        tokio::time::sleep(Duration::from_millis(3_000)).await;
        assert_eq!(observers.routine_elapsed.get(), "00:05");
    }

    #[tokio::test(start_paused = true)]
    async fn reschedule_replaces_streams() {
        let clock = Arc::new(ManualClock::new(0));
        let mut routine = running_routine(&clock);
        let observers = RoutineObservers::default();
        let mut ticker = Ticker::new(Duration::from_secs(1));
        ticker.reschedule(&routine, &observers);

        routine.pause().unwrap();
        ticker.reschedule(&routine, &observers);
        assert!(!ticker.is_ticking());
    }
}
