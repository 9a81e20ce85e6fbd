//! The routine aggregate and its run state machine.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> InProgress <-> Paused
//!            |             |
//!            +--> Done <---+
//! Done -> Idle (reinitialize)
//! ```
//!
//! A routine owns its tasks and both timers. The routine timer measures the
//! whole run; the task timer restarts at every check-off and pauses with the
//! routine timer as a unit.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::snapshot::{RoutineSnapshot, RoutineSummary};
use super::task::{Task, TaskId};
use crate::error::EngineError;
use crate::events::Event;
use crate::timer::{format_elapsed, ElapsedTimer, SharedClock};

pub type RoutineId = i64;

/// Goal time for routines created without one.
pub const DEFAULT_GOAL_TIME_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutineState {
    Idle,
    InProgress,
    Paused,
    Done,
}

impl RoutineState {
    /// In progress or paused: the run is open and its timers are live.
    pub fn is_active(self) -> bool {
        matches!(self, RoutineState::InProgress | RoutineState::Paused)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoutineState::Idle => "idle",
            RoutineState::InProgress => "in_progress",
            RoutineState::Paused => "paused",
            RoutineState::Done => "done",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(RoutineState::Idle),
            "in_progress" => Some(RoutineState::InProgress),
            "paused" => Some(RoutineState::Paused),
            "done" => Some(RoutineState::Done),
            _ => None,
        }
    }
}

impl fmt::Display for RoutineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    pub(crate) id: RoutineId,
    pub(crate) title: String,
    pub(crate) sort_order: i32,
    pub(crate) state: RoutineState,
    /// Ordered by `sort_order`.
    pub(crate) tasks: Vec<Task>,
    /// First open task, or `tasks.len()` once the run has finished.
    pub(crate) current_task_index: usize,
    pub(crate) goal_time_secs: u64,
    pub(crate) routine_timer: ElapsedTimer,
    pub(crate) task_timer: ElapsedTimer,
}

impl Routine {
    pub fn new(id: RoutineId, title: impl Into<String>, sort_order: i32) -> Self {
        Self {
            id,
            title: title.into(),
            sort_order,
            state: RoutineState::Idle,
            tasks: Vec::new(),
            current_task_index: 0,
            goal_time_secs: DEFAULT_GOAL_TIME_SECS,
            routine_timer: ElapsedTimer::default(),
            task_timer: ElapsedTimer::default(),
        }
    }

    /// Set the goal time, raising 0 to 1 second. Callers that accept user
    /// input validate first, as [`Routine::set_goal_time`] does.
    pub fn with_goal_time(mut self, secs: u64) -> Self {
        self.goal_time_secs = secs.max(1);
        self
    }

    /// Keep `tasks` ordered by `sort_order`. Call after loading from storage.
    pub(crate) fn sort_tasks(&mut self) {
        self.tasks.sort_by_key(|t| t.sort_order);
    }

    /// Attach both timers to `clock`.
    pub fn set_clock(&mut self, clock: SharedClock) {
        self.routine_timer.set_clock(clock.clone());
        self.task_timer.set_clock(clock);
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> RoutineId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn sort_order(&self) -> i32 {
        self.sort_order
    }

    pub fn state(&self) -> RoutineState {
        self.state
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn current_task_index(&self) -> usize {
        self.current_task_index
    }

    pub fn current_task(&self) -> Option<&Task> {
        if self.state == RoutineState::Done {
            return None;
        }
        self.tasks.get(self.current_task_index)
    }

    pub fn goal_time_secs(&self) -> u64 {
        self.goal_time_secs
    }

    pub fn routine_timer(&self) -> &ElapsedTimer {
        &self.routine_timer
    }

    pub fn task_timer(&self) -> &ElapsedTimer {
        &self.task_timer
    }

    pub fn is_done(&self) -> bool {
        self.state == RoutineState::Done
    }

    pub fn checked_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_checked()).count()
    }

    pub fn summary(&self) -> RoutineSummary {
        RoutineSummary {
            id: self.id,
            title: self.title.clone(),
            sort_order: self.sort_order,
            state: self.state,
            task_count: self.tasks.len(),
        }
    }

    pub fn snapshot(&self) -> RoutineSnapshot {
        RoutineSnapshot {
            routine_id: self.id,
            title: self.title.clone(),
            state: self.state,
            current_task_index: self.current_task_index,
            current_task: self.current_task().cloned(),
            is_done: self.is_done(),
            routine_elapsed: self.routine_timer.formatted(),
            task_elapsed: self.task_timer.formatted(),
            goal_time: format_elapsed(self.goal_time_secs),
            tasks: self.tasks.clone(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Append a task. The task list is frozen once a run has begun.
    pub fn add_task(&mut self, title: &str) -> Result<Event, EngineError> {
        self.require(RoutineState::Idle, "add a task to")?;
        let title = non_empty_title(title)?;
        let id = self.tasks.iter().map(|t| t.id).max().map_or(1, |m| m + 1);
        let sort_order = self
            .tasks
            .iter()
            .map(|t| t.sort_order)
            .max()
            .map_or(0, |m| m + 1);
        self.tasks.push(Task::new(id, title.clone(), sort_order));
        Ok(Event::TaskAdded {
            routine_id: self.id,
            task_id: id,
            title,
            at: Utc::now(),
        })
    }

    pub fn start(&mut self) -> Result<Event, EngineError> {
        self.require(RoutineState::Idle, "start")?;
        self.routine_timer.reset();
        self.routine_timer.start();
        self.task_timer.reset();
        self.task_timer.start();
        self.current_task_index = 0;
        self.state = RoutineState::InProgress;
        if self.tasks.is_empty() {
            self.finish();
        }
        Ok(Event::RoutineStarted {
            routine_id: self.id,
            task_count: self.tasks.len(),
            at: Utc::now(),
        })
    }

    /// Check off `task_id`, which may sit at or after the cursor.
    ///
    /// Already-checked tasks are a no-op (`Ok(None)`), in any state. Open
    /// tasks left behind the cursor by an earlier out-of-order check-off are
    /// closed for the rest of the run.
    pub fn check_off(&mut self, task_id: TaskId) -> Result<Option<Event>, EngineError> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == task_id)
            .ok_or_else(|| EngineError::task_not_found(task_id))?;
        if self.tasks[index].is_checked() {
            return Ok(None);
        }
        self.require(RoutineState::InProgress, "check off a task of")?;
        if index < self.current_task_index {
            return Err(EngineError::OutOfOrderCheckoff {
                routine_id: self.id,
                task_id,
                cursor: self.current_task_index,
            });
        }

        let elapsed = self.task_timer.rounded_up();
        self.tasks[index].check_off(elapsed);
        self.current_task_index = index + 1;

        let routine_done = self.current_task_index >= self.tasks.len();
        if routine_done {
            self.finish();
        } else {
            self.task_timer.reset();
            self.task_timer.start();
        }
        Ok(Some(Event::TaskCheckedOff {
            routine_id: self.id,
            task_id,
            checkoff_elapsed_secs: elapsed,
            next_task_index: self.current_task_index,
            routine_done,
            at: Utc::now(),
        }))
    }

    /// Ignored unless in progress.
    pub fn pause(&mut self) -> Option<Event> {
        if self.state != RoutineState::InProgress {
            return None;
        }
        self.routine_timer.pause();
        self.task_timer.pause();
        self.state = RoutineState::Paused;
        Some(Event::RoutinePaused {
            routine_id: self.id,
            routine_elapsed_secs: self.routine_timer.rounded_down(),
            task_elapsed_secs: self.task_timer.rounded_down(),
            at: Utc::now(),
        })
    }

    /// Ignored unless paused.
    pub fn resume(&mut self) -> Option<Event> {
        if self.state != RoutineState::Paused {
            return None;
        }
        self.routine_timer.resume();
        self.task_timer.resume();
        self.state = RoutineState::InProgress;
        Some(Event::RoutineResumed {
            routine_id: self.id,
            routine_elapsed_secs: self.routine_timer.rounded_down(),
            task_elapsed_secs: self.task_timer.rounded_down(),
            at: Utc::now(),
        })
    }

    /// Add `secs` to both timers, paused or not.
    pub fn advance_time(&mut self, secs: u64) -> Result<Event, EngineError> {
        if !self.state.is_active() {
            return Err(self.invalid("advance the timers of"));
        }
        if secs == 0 {
            return Err(EngineError::InvalidArgument {
                field: "seconds",
                message: "advance amount must be positive".into(),
            });
        }
        self.routine_timer.advance(secs);
        self.task_timer.advance(secs);
        Ok(Event::TimeAdvanced {
            routine_id: self.id,
            delta_secs: secs,
            routine_elapsed_secs: self.routine_timer.rounded_down(),
            task_elapsed_secs: self.task_timer.rounded_down(),
            at: Utc::now(),
        })
    }

    /// End the run early. Ending a finished run is a no-op.
    pub fn end(&mut self) -> Result<Option<Event>, EngineError> {
        match self.state {
            RoutineState::Done => Ok(None),
            RoutineState::Idle => Err(self.invalid("end")),
            RoutineState::InProgress | RoutineState::Paused => {
                self.finish();
                Ok(Some(Event::RoutineEnded {
                    routine_id: self.id,
                    unchecked_tasks: self.tasks.len() - self.checked_count(),
                    routine_elapsed_secs: self.routine_timer.rounded_down(),
                    at: Utc::now(),
                }))
            }
        }
    }

    pub fn retitle_task(&mut self, task_id: TaskId, title: &str) -> Result<Event, EngineError> {
        let title = non_empty_title(title)?;
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| EngineError::task_not_found(task_id))?;
        task.title = title.clone();
        Ok(Event::TaskRetitled {
            routine_id: self.id,
            task_id,
            title,
            at: Utc::now(),
        })
    }

    pub fn set_goal_time(&mut self, secs: u64) -> Result<Event, EngineError> {
        if secs == 0 {
            return Err(EngineError::InvalidArgument {
                field: "goal_time_secs",
                message: "goal time must be positive".into(),
            });
        }
        self.goal_time_secs = secs;
        Ok(Event::GoalTimeSet {
            routine_id: self.id,
            goal_time_secs: secs,
            at: Utc::now(),
        })
    }

    /// Prepare a finished routine for a new run.
    pub fn reinitialize(&mut self) -> Result<Event, EngineError> {
        self.require(RoutineState::Done, "reinitialize")?;
        for task in &mut self.tasks {
            task.initialize();
        }
        self.routine_timer.reset();
        self.task_timer.reset();
        self.current_task_index = 0;
        self.state = RoutineState::Idle;
        Ok(Event::RoutineReinitialized {
            routine_id: self.id,
            at: Utc::now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn finish(&mut self) {
        self.routine_timer.stop();
        self.task_timer.stop();
        self.state = RoutineState::Done;
    }

    fn require(&self, state: RoutineState, command: &'static str) -> Result<(), EngineError> {
        if self.state == state {
            Ok(())
        } else {
            Err(self.invalid(command))
        }
    }

    fn invalid(&self, command: &'static str) -> EngineError {
        EngineError::InvalidTransition {
            routine_id: self.id,
            command,
            state: self.state,
        }
    }
}

pub(crate) fn non_empty_title(title: &str) -> Result<String, EngineError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(EngineError::InvalidArgument {
            field: "title",
            message: "title must not be empty".into(),
        });
    }
    Ok(title.to_string())
}
