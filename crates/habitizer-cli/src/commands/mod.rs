pub mod config;
pub mod routine;
pub mod run;
pub mod task;

use habitizer_core::storage::seed_defaults;
use habitizer_core::{Config, Event, RoutineEngine, RoutineId, SqliteRoutineRepository};
use serde::Serialize;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Open the routine database and pick up any run left in progress.
pub fn open_engine(config: &Config) -> CliResult<RoutineEngine<SqliteRoutineRepository>> {
    let mut repo = SqliteRoutineRepository::open()?;
    if config.seed_defaults {
        seed_defaults(&mut repo, config.engine.default_goal_time_secs)?;
    }
    let mut engine = RoutineEngine::new(repo, config.engine.clone());
    engine.restore()?;
    Ok(engine)
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the event a command produced, or the routine's current snapshot
/// when the command was an ignored no-op.
pub fn print_outcome(
    engine: &RoutineEngine<SqliteRoutineRepository>,
    routine_id: RoutineId,
    event: Option<Event>,
) -> CliResult {
    match event {
        Some(event) => print_json(&event),
        None => print_json(&engine.snapshot(routine_id)?),
    }
}
