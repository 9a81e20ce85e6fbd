//! Command handling for routine runs.
//!
//! The engine loads a routine from its repository, applies one command,
//! persists the result, keeps the repository's in-progress reference and
//! the tick streams in step with the routine's state, and publishes derived
//! state to [`RoutineObservers`].
//!
//! Every command returns `Ok(Some(event))` when it changed something,
//! `Ok(None)` when it was an ignored no-op (pausing a paused routine,
//! re-checking a checked task), and `Err` when it was rejected.

use std::time::Duration;

use chrono::Utc;

use super::ticker::Ticker;
use crate::error::{EngineError, Result};
use crate::events::Event;
use crate::routine::{non_empty_title, Routine, RoutineId, RoutineSnapshot, RoutineSummary, Task, TaskId};
use crate::storage::{EngineConfig, RoutineRepository};
use crate::subject::RoutineObservers;
use crate::timer::SharedClock;

pub struct RoutineEngine<R> {
    repo: R,
    clock: SharedClock,
    config: EngineConfig,
    observers: RoutineObservers,
    ticker: Ticker,
    /// Routine whose state the observers currently reflect.
    viewing: Option<RoutineId>,
}

impl<R: RoutineRepository> RoutineEngine<R> {
    pub fn new(repo: R, config: EngineConfig) -> Self {
        Self::with_clock(repo, config, SharedClock::system())
    }

    pub fn with_clock(repo: R, config: EngineConfig, clock: SharedClock) -> Self {
        let ticker = Ticker::new(Duration::from_millis(config.tick_interval_ms));
        Self {
            repo,
            clock,
            config,
            observers: RoutineObservers::default(),
            ticker,
            viewing: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn observers(&self) -> &RoutineObservers {
        &self.observers
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn viewing(&self) -> Option<RoutineId> {
        self.viewing
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_ticking()
    }

    pub fn list_routines(&self) -> Result<Vec<RoutineSummary>> {
        self.repo.list_routines()
    }

    pub fn routine(&self, routine_id: RoutineId) -> Result<Routine> {
        self.load(routine_id)
    }

    pub fn in_progress(&self) -> Result<Option<Routine>> {
        Ok(self.repo.get_in_progress_routine()?.map(|mut routine| {
            routine.set_clock(self.clock.clone());
            routine
        }))
    }

    pub fn tasks(&self, routine_id: RoutineId) -> Result<Vec<Task>> {
        self.load(routine_id)?;
        self.repo.list_tasks(routine_id)
    }

    pub fn snapshot(&self, routine_id: RoutineId) -> Result<RoutineSnapshot> {
        Ok(self.load(routine_id)?.snapshot())
    }

    // ── Setup ────────────────────────────────────────────────────────

    pub fn add_routine(&mut self, title: &str) -> Result<Option<Event>> {
        let title = non_empty_title(title).inspect_err(|e| reject("add routine", e))?;
        if self.config.default_goal_time_secs == 0 {
            let err = EngineError::InvalidArgument {
                field: "default_goal_time_secs",
                message: "goal time must be positive".into(),
            };
            reject("add routine", &err);
            return Err(err.into());
        }
        let routine = self
            .repo
            .insert_routine(&title, self.config.default_goal_time_secs)?;
        tracing::info!(routine_id = routine.id(), title = %title, "routine added");
        self.observers.routines.set(self.repo.list_routines()?);
        Ok(Some(Event::RoutineAdded {
            routine_id: routine.id(),
            title,
            at: Utc::now(),
        }))
    }

    pub fn add_task(&mut self, routine_id: RoutineId, title: &str) -> Result<Option<Event>> {
        self.apply(routine_id, "add task", false, |r| r.add_task(title).map(Some))
    }

    /// Point the observers at `routine_id` without changing it.
    pub fn select(&mut self, routine_id: RoutineId) -> Result<RoutineSnapshot> {
        let routine = self.load(routine_id)?;
        self.viewing = Some(routine_id);
        self.refresh_ticks(&routine);
        self.publish(&routine)?;
        Ok(routine.snapshot())
    }

    /// Pick up the repository's in-progress routine after a restart.
    ///
    /// Timers persisted while running keep counting from their recorded
    /// resume instant, so the restored readouts include the time spent away.
    pub fn restore(&mut self) -> Result<Option<RoutineSnapshot>> {
        let Some(routine) = self.in_progress()? else {
            self.observers.routines.set(self.repo.list_routines()?);
            return Ok(None);
        };
        tracing::info!(
            routine_id = routine.id(),
            state = %routine.state(),
            "restored in-progress routine"
        );
        self.viewing = Some(routine.id());
        self.refresh_ticks(&routine);
        self.publish(&routine)?;
        Ok(Some(routine.snapshot()))
    }

    // ── Run commands ─────────────────────────────────────────────────

    pub fn start(&mut self, routine_id: RoutineId) -> Result<Option<Event>> {
        if let Some(active_id) = self.repo.in_progress_id()? {
            if active_id != routine_id {
                let err = EngineError::RoutineAlreadyActive {
                    routine_id,
                    active_id,
                };
                reject("start", &err);
                return Err(err.into());
            }
        }
        self.apply(routine_id, "start", true, |r| r.start().map(Some))
    }

    pub fn check_off(&mut self, routine_id: RoutineId, task_id: TaskId) -> Result<Option<Event>> {
        self.apply(routine_id, "check off", true, |r| r.check_off(task_id))
    }

    pub fn pause(&mut self, routine_id: RoutineId) -> Result<Option<Event>> {
        self.apply(routine_id, "pause", true, |r| Ok(r.pause()))
    }

    pub fn resume(&mut self, routine_id: RoutineId) -> Result<Option<Event>> {
        self.apply(routine_id, "resume", true, |r| Ok(r.resume()))
    }

    pub fn advance_time(&mut self, routine_id: RoutineId, secs: u64) -> Result<Option<Event>> {
        self.apply(routine_id, "advance", true, |r| r.advance_time(secs).map(Some))
    }

    /// Advance both timers by the configured step (the "+30s" control).
    pub fn advance_step(&mut self, routine_id: RoutineId) -> Result<Option<Event>> {
        self.advance_time(routine_id, self.config.advance_step_secs)
    }

    pub fn end(&mut self, routine_id: RoutineId) -> Result<Option<Event>> {
        self.apply(routine_id, "end", true, |r| r.end())
    }

    pub fn reinitialize(&mut self, routine_id: RoutineId) -> Result<Option<Event>> {
        self.apply(routine_id, "reinitialize", true, |r| r.reinitialize().map(Some))
    }

    // ── Edits allowed in any state ───────────────────────────────────

    pub fn retitle_task(
        &mut self,
        routine_id: RoutineId,
        task_id: TaskId,
        title: &str,
    ) -> Result<Option<Event>> {
        self.apply(routine_id, "retitle task", false, |r| {
            r.retitle_task(task_id, title).map(Some)
        })
    }

    pub fn set_goal_time(&mut self, routine_id: RoutineId, secs: u64) -> Result<Option<Event>> {
        self.apply(routine_id, "set goal time", false, |r| {
            r.set_goal_time(secs).map(Some)
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn load(&self, routine_id: RoutineId) -> Result<Routine> {
        let mut routine = self
            .repo
            .get_routine(routine_id)?
            .ok_or_else(|| EngineError::routine_not_found(routine_id))?;
        routine.set_clock(self.clock.clone());
        Ok(routine)
    }

    /// Run one command against a freshly loaded routine.
    ///
    /// Nothing is persisted or published unless the command produced an
    /// event. The tick streams are replaced by `touches_timers` commands and
    /// whenever the observers move to another routine.
    fn apply<F>(
        &mut self,
        routine_id: RoutineId,
        command: &'static str,
        touches_timers: bool,
        f: F,
    ) -> Result<Option<Event>>
    where
        F: FnOnce(&mut Routine) -> std::result::Result<Option<Event>, EngineError>,
    {
        let mut routine = self.load(routine_id)?;
        let event = match f(&mut routine) {
            Ok(Some(event)) => event,
            Ok(None) => {
                tracing::debug!(routine_id, command, state = %routine.state(), "ignored");
                return Ok(None);
            }
            Err(err) => {
                reject(command, &err);
                return Err(err.into());
            }
        };

        self.repo.save_routine(&routine)?;
        self.sync_in_progress(&routine)?;
        let switched = self.viewing.replace(routine_id) != Some(routine_id);
        if touches_timers || switched {
            self.refresh_ticks(&routine);
        }
        self.publish(&routine)?;

        if routine.is_done() && matches!(event, Event::TaskCheckedOff { .. } | Event::RoutineEnded { .. }) {
            tracing::info!(
                routine_id,
                elapsed_secs = routine.routine_timer().rounded_down(),
                checked = routine.checked_count(),
                "routine done"
            );
        } else {
            tracing::debug!(routine_id, command, state = %routine.state(), "applied");
        }
        Ok(Some(event))
    }

    /// Keep the repository's in-progress reference pointing at the open run.
    fn sync_in_progress(&mut self, routine: &Routine) -> Result<()> {
        let recorded = self.repo.in_progress_id()?;
        if routine.state().is_active() {
            if recorded != Some(routine.id()) {
                self.repo.set_in_progress(Some(routine.id()))?;
            }
        } else if recorded == Some(routine.id()) {
            self.repo.set_in_progress(None)?;
        }
        Ok(())
    }

    fn refresh_ticks(&mut self, routine: &Routine) {
        if routine.routine_timer().is_running() || routine.task_timer().is_running() {
            self.ticker.reschedule(routine, &self.observers);
        } else {
            self.ticker.cancel();
        }
    }

    fn publish(&self, routine: &Routine) -> Result<()> {
        self.observers.publish(routine);
        self.observers.routines.set(self.repo.list_routines()?);
        Ok(())
    }
}

fn reject(command: &'static str, err: &EngineError) {
    tracing::warn!(command, error = %err, "command rejected");
}
