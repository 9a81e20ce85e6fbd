use clap::Subcommand;
use habitizer_core::{Config, RoutineId};

use super::{open_engine, print_json, CliResult};

#[derive(Subcommand)]
pub enum RoutineAction {
    /// List routines in display order
    List,
    /// Add an empty routine
    Add {
        /// Routine title
        title: String,
    },
    /// Print a routine with its tasks and timers as JSON
    Show {
        /// Routine ID
        id: RoutineId,
    },
}

pub fn run(action: RoutineAction, config: &Config) -> CliResult {
    let mut engine = open_engine(config)?;
    match action {
        RoutineAction::List => print_json(&engine.list_routines()?),
        RoutineAction::Add { title } => {
            let event = engine.add_routine(&title)?;
            print_json(&event)
        }
        RoutineAction::Show { id } => print_json(&engine.select(id)?),
    }
}
