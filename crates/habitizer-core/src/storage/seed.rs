//! First-run data.

use super::repository::RoutineRepository;
use crate::error::Result;

/// Routines created on first run, in display order.
pub const DEFAULT_ROUTINES: &[(&str, &[&str])] = &[
    (
        "Morning",
        &[
            "Shower",
            "Brush Teeth",
            "Dress",
            "Make Coffee",
            "Make Lunch",
            "Dinner Prep",
            "Pack Bag",
        ],
    ),
    (
        "Evening",
        &[
            "Charge Devices",
            "Prepare Dinner",
            "Eat Dinner",
            "Wash Dishes",
            "Pack Bag for Morning",
            "Homework",
        ],
    ),
];

/// Insert [`DEFAULT_ROUTINES`] into an empty repository.
///
/// Returns the number of routines created; a repository that already holds
/// routines is left alone.
pub fn seed_defaults<R: RoutineRepository + ?Sized>(repo: &mut R, goal_time_secs: u64) -> Result<usize> {
    if !repo.list_routines()?.is_empty() {
        return Ok(0);
    }
    for (title, tasks) in DEFAULT_ROUTINES {
        let mut routine = repo.insert_routine(title, goal_time_secs)?;
        for task in *tasks {
            routine.add_task(task)?;
        }
        repo.save_routine(&routine)?;
    }
    tracing::info!(count = DEFAULT_ROUTINES.len(), "seeded default routines");
    Ok(DEFAULT_ROUTINES.len())
}
