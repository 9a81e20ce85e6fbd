//! In-process routine storage, for tests and embedding.

use std::collections::BTreeMap;

use super::repository::RoutineRepository;
use super::seed::seed_defaults;
use crate::error::{EngineError, Result};
use crate::routine::{Routine, RoutineId, RoutineSummary, Task};

#[derive(Debug, Default, Clone)]
pub struct InMemoryRoutineRepository {
    routines: BTreeMap<RoutineId, Routine>,
    in_progress: Option<RoutineId>,
}

impl InMemoryRoutineRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-filled with the default routines.
    pub fn with_default_routines(goal_time_secs: u64) -> Result<Self> {
        let mut repo = Self::new();
        seed_defaults(&mut repo, goal_time_secs)?;
        Ok(repo)
    }

    fn sorted(&self) -> Vec<&Routine> {
        let mut routines: Vec<&Routine> = self.routines.values().collect();
        routines.sort_by_key(|r| (r.sort_order(), r.id()));
        routines
    }
}

impl RoutineRepository for InMemoryRoutineRepository {
    fn list_routines(&self) -> Result<Vec<RoutineSummary>> {
        Ok(self.sorted().into_iter().map(Routine::summary).collect())
    }

    fn get_routine(&self, id: RoutineId) -> Result<Option<Routine>> {
        Ok(self.routines.get(&id).cloned())
    }

    fn list_tasks(&self, routine_id: RoutineId) -> Result<Vec<Task>> {
        Ok(self
            .routines
            .get(&routine_id)
            .map(|r| r.tasks().to_vec())
            .unwrap_or_default())
    }

    fn in_progress_id(&self) -> Result<Option<RoutineId>> {
        Ok(self.in_progress)
    }

    fn insert_routine(&mut self, title: &str, goal_time_secs: u64) -> Result<Routine> {
        let id = self.routines.keys().next_back().map_or(1, |last| last + 1);
        let sort_order = self
            .routines
            .values()
            .map(Routine::sort_order)
            .max()
            .map_or(0, |m| m + 1);
        let routine = Routine::new(id, title, sort_order).with_goal_time(goal_time_secs);
        self.routines.insert(id, routine.clone());
        Ok(routine)
    }

    fn save_routine(&mut self, routine: &Routine) -> Result<()> {
        let slot = self
            .routines
            .get_mut(&routine.id())
            .ok_or_else(|| EngineError::routine_not_found(routine.id()))?;
        let mut stored = routine.clone();
        stored.sort_tasks();
        *slot = stored;
        Ok(())
    }

    fn set_in_progress(&mut self, id: Option<RoutineId>) -> Result<()> {
        self.in_progress = id;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_assigns_increasing_ids_and_order() {
        let mut repo = InMemoryRoutineRepository::new();
        let a = repo.insert_routine("Morning", 60).unwrap();
        let b = repo.insert_routine("Evening", 60).unwrap();
        assert_eq!((a.id(), a.sort_order()), (1, 0));
        assert_eq!((b.id(), b.sort_order()), (2, 1));
        let titles: Vec<String> = repo
            .list_routines()
            .unwrap()
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, ["Morning", "Evening"]);
    }

    #[test]
    fn save_unknown_routine_fails() {
        let mut repo = InMemoryRoutineRepository::new();
        let stray = Routine::new(9, "Stray", 0);
        assert!(repo.save_routine(&stray).is_err());
    }

    #[test]
    fn in_progress_lookup() {
        let mut repo = InMemoryRoutineRepository::new();
        let r = repo.insert_routine("Morning", 60).unwrap();
        assert!(repo.get_in_progress_routine().unwrap().is_none());
        repo.set_in_progress(Some(r.id())).unwrap();
        assert_eq!(repo.get_in_progress_routine().unwrap().unwrap().id(), r.id());
    }

    #[test]
    fn default_routines_are_seeded() {
        let repo = InMemoryRoutineRepository::with_default_routines(60).unwrap();
        let routines = repo.list_routines().unwrap();
        assert_eq!(routines.len(), 2);
        assert!(routines.iter().all(|r| r.task_count > 0));
        assert!(repo.list_tasks(99).unwrap().is_empty());
    }
}
