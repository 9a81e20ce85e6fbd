use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::routine::{RoutineId, TaskId};

/// Every accepted command produces an Event.
/// Callers print or forward them; observers get derived state separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    RoutineAdded {
        routine_id: RoutineId,
        title: String,
        at: DateTime<Utc>,
    },
    TaskAdded {
        routine_id: RoutineId,
        task_id: TaskId,
        title: String,
        at: DateTime<Utc>,
    },
    RoutineStarted {
        routine_id: RoutineId,
        task_count: usize,
        at: DateTime<Utc>,
    },
    TaskCheckedOff {
        routine_id: RoutineId,
        task_id: TaskId,
        checkoff_elapsed_secs: u64,
        next_task_index: usize,
        /// The last open task was checked off and the routine is now done.
        routine_done: bool,
        at: DateTime<Utc>,
    },
    RoutinePaused {
        routine_id: RoutineId,
        routine_elapsed_secs: u64,
        task_elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    RoutineResumed {
        routine_id: RoutineId,
        routine_elapsed_secs: u64,
        task_elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    TimeAdvanced {
        routine_id: RoutineId,
        delta_secs: u64,
        routine_elapsed_secs: u64,
        task_elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// Ended by explicit command, possibly with tasks still open.
    RoutineEnded {
        routine_id: RoutineId,
        unchecked_tasks: usize,
        routine_elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    RoutineReinitialized {
        routine_id: RoutineId,
        at: DateTime<Utc>,
    },
    TaskRetitled {
        routine_id: RoutineId,
        task_id: TaskId,
        title: String,
        at: DateTime<Utc>,
    },
    GoalTimeSet {
        routine_id: RoutineId,
        goal_time_secs: u64,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn routine_id(&self) -> RoutineId {
        match self {
            Event::RoutineAdded { routine_id, .. }
            | Event::TaskAdded { routine_id, .. }
            | Event::RoutineStarted { routine_id, .. }
            | Event::TaskCheckedOff { routine_id, .. }
            | Event::RoutinePaused { routine_id, .. }
            | Event::RoutineResumed { routine_id, .. }
            | Event::TimeAdvanced { routine_id, .. }
            | Event::RoutineEnded { routine_id, .. }
            | Event::RoutineReinitialized { routine_id, .. }
            | Event::TaskRetitled { routine_id, .. }
            | Event::GoalTimeSet { routine_id, .. } => *routine_id,
        }
    }
}
