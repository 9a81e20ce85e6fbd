use crate::error::Result;
use crate::routine::{Routine, RoutineId, RoutineSummary, Task};

/// Persistence boundary consumed by the engine.
///
/// Implementations store whole routines (tasks and timer state included)
/// and the id of the one routine that is in progress or paused, if any.
pub trait RoutineRepository {
    /// All routines, ordered by sort order.
    fn list_routines(&self) -> Result<Vec<RoutineSummary>>;

    fn get_routine(&self, id: RoutineId) -> Result<Option<Routine>>;

    /// Tasks of a routine, ordered by sort order. Empty for unknown routines.
    fn list_tasks(&self, routine_id: RoutineId) -> Result<Vec<Task>>;

    fn in_progress_id(&self) -> Result<Option<RoutineId>>;

    fn get_in_progress_routine(&self) -> Result<Option<Routine>> {
        match self.in_progress_id()? {
            Some(id) => self.get_routine(id),
            None => Ok(None),
        }
    }

    /// Create an idle routine at the end of the list.
    fn insert_routine(&mut self, title: &str, goal_time_secs: u64) -> Result<Routine>;

    /// Overwrite a stored routine. Fails with `NotFound` for unknown ids.
    fn save_routine(&mut self, routine: &Routine) -> Result<()>;

    fn set_in_progress(&mut self, id: Option<RoutineId>) -> Result<()>;
}
