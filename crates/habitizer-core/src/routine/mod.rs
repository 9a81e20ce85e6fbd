mod model;
mod snapshot;
mod task;

pub(crate) use model::non_empty_title;
pub use model::{Routine, RoutineId, RoutineState, DEFAULT_GOAL_TIME_SECS};
pub use snapshot::{RoutineSnapshot, RoutineSummary};
pub use task::{Task, TaskId};
