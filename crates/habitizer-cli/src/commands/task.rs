//! Task management commands for CLI.

use clap::Subcommand;
use habitizer_core::{Config, RoutineId, TaskId};

use super::{open_engine, print_json, print_outcome, CliResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// List a routine's tasks in order
    List {
        /// Routine ID
        routine: RoutineId,
    },
    /// Append a task to an idle routine
    Add {
        /// Routine ID
        routine: RoutineId,
        /// Task title
        title: String,
    },
    /// Rename a task
    Retitle {
        /// Routine ID
        routine: RoutineId,
        /// Task ID
        task: TaskId,
        /// New title
        title: String,
    },
}

pub fn run(action: TaskAction, config: &Config) -> CliResult {
    let mut engine = open_engine(config)?;
    match action {
        TaskAction::List { routine } => print_json(&engine.tasks(routine)?),
        TaskAction::Add { routine, title } => {
            let event = engine.add_task(routine, &title)?;
            print_outcome(&engine, routine, event)
        }
        TaskAction::Retitle {
            routine,
            task,
            title,
        } => {
            let event = engine.retitle_task(routine, task, &title)?;
            print_outcome(&engine, routine, event)
        }
    }
}
