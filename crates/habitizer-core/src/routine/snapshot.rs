use serde::{Deserialize, Serialize};

use super::model::{RoutineId, RoutineState};
use super::task::Task;

/// Routine list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineSummary {
    pub id: RoutineId,
    pub title: String,
    pub sort_order: i32,
    pub state: RoutineState,
    pub task_count: usize,
}

/// Everything a view needs to render one routine.
///
/// Times are preformatted as `MM:SS`; a timer that has not started since its
/// last reset reads `"-"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineSnapshot {
    pub routine_id: RoutineId,
    pub title: String,
    pub state: RoutineState,
    pub current_task_index: usize,
    pub current_task: Option<Task>,
    pub is_done: bool,
    pub routine_elapsed: String,
    pub task_elapsed: String,
    pub goal_time: String,
    pub tasks: Vec<Task>,
}
