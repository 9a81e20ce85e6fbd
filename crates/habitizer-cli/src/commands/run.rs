//! Routine run commands.
//!
//! Commands that act on a running routine default to the run left in
//! progress; `--routine` selects another one.

use std::time::Duration;

use clap::Subcommand;
use habitizer_core::{Config, RoutineEngine, RoutineId, SqliteRoutineRepository, TaskId};

use super::{open_engine, print_json, print_outcome, CliResult};

#[derive(Subcommand)]
pub enum RunAction {
    /// Start a run of an idle routine
    Start {
        /// Routine ID
        routine: RoutineId,
    },
    /// Check off a task
    Check {
        /// Task ID
        task: TaskId,
        #[arg(long)]
        routine: Option<RoutineId>,
    },
    /// Pause both timers
    Pause {
        #[arg(long)]
        routine: Option<RoutineId>,
    },
    /// Resume both timers
    Resume {
        #[arg(long)]
        routine: Option<RoutineId>,
    },
    /// Add time to both timers (default: the configured step)
    Advance {
        /// Seconds to add
        #[arg(long)]
        secs: Option<u64>,
        #[arg(long)]
        routine: Option<RoutineId>,
    },
    /// End the run early
    End {
        #[arg(long)]
        routine: Option<RoutineId>,
    },
    /// Clear a finished run so the routine can start again
    Reinit {
        #[arg(long)]
        routine: Option<RoutineId>,
    },
    /// Set a routine's goal time
    Goal {
        /// Goal time in seconds
        secs: u64,
        #[arg(long)]
        routine: Option<RoutineId>,
    },
    /// Print the current run as JSON (null when nothing is in progress)
    Status {
        #[arg(long)]
        routine: Option<RoutineId>,
    },
    /// Stream elapsed-time readouts of the run in progress
    Watch {
        /// Stop after this many seconds
        #[arg(long, default_value = "10")]
        for_secs: u64,
    },
}

pub fn run(action: RunAction, config: &Config) -> CliResult {
    let mut engine = open_engine(config)?;
    match action {
        RunAction::Start { routine } => {
            let event = engine.start(routine)?;
            print_outcome(&engine, routine, event)
        }
        RunAction::Check { task, routine } => {
            let id = resolve(&engine, routine)?;
            let event = engine.check_off(id, task)?;
            print_outcome(&engine, id, event)
        }
        RunAction::Pause { routine } => {
            let id = resolve(&engine, routine)?;
            let event = engine.pause(id)?;
            print_outcome(&engine, id, event)
        }
        RunAction::Resume { routine } => {
            let id = resolve(&engine, routine)?;
            let event = engine.resume(id)?;
            print_outcome(&engine, id, event)
        }
        RunAction::Advance { secs, routine } => {
            let id = resolve(&engine, routine)?;
            let event = match secs {
                Some(secs) => engine.advance_time(id, secs)?,
                None => engine.advance_step(id)?,
            };
            print_outcome(&engine, id, event)
        }
        RunAction::End { routine } => {
            let id = resolve(&engine, routine)?;
            let event = engine.end(id)?;
            print_outcome(&engine, id, event)
        }
        RunAction::Reinit { routine } => {
            let id = resolve(&engine, routine)?;
            let event = engine.reinitialize(id)?;
            print_outcome(&engine, id, event)
        }
        RunAction::Goal { secs, routine } => {
            let id = resolve(&engine, routine)?;
            let event = engine.set_goal_time(id, secs)?;
            print_outcome(&engine, id, event)
        }
        RunAction::Status { routine } => match routine {
            Some(id) => print_json(&engine.snapshot(id)?),
            None => print_json(&engine.observers().current.get()),
        },
        RunAction::Watch { for_secs } => watch(&mut engine, Duration::from_secs(for_secs)),
    }
}

fn resolve(
    engine: &RoutineEngine<SqliteRoutineRepository>,
    routine: Option<RoutineId>,
) -> CliResult<RoutineId> {
    routine
        .or_else(|| engine.viewing())
        .ok_or_else(|| "no routine in progress; pass --routine <ID>".into())
}

/// Print a readout line each time the routine timer ticks, until `limit`.
fn watch(engine: &mut RoutineEngine<SqliteRoutineRepository>, limit: Duration) -> CliResult {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(watch_readouts(engine, limit))
}

async fn watch_readouts(
    engine: &mut RoutineEngine<SqliteRoutineRepository>,
    limit: Duration,
) -> CliResult {
    // Restored again inside the runtime so the tick streams get scheduled.
    if engine.restore()?.is_none() {
        return print_json(&serde_json::Value::Null);
    }

    let observers = engine.observers();
    let mut readout = observers.routine_elapsed.observe();
    let print_readout = || {
        let line = serde_json::json!({
            "routine_elapsed": observers.routine_elapsed.get(),
            "task_elapsed": observers.task_elapsed.get(),
            "goal_time": observers.goal_time.get(),
        });
        println!("{line}");
    };
    print_readout();

    let deadline = tokio::time::sleep(limit);
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            changed = readout.changed() => {
                if changed.is_err() {
                    break;
                }
                print_readout();
            }
        }
    }
    Ok(())
}
