mod routine_engine;
mod ticker;

pub use routine_engine::RoutineEngine;
pub use ticker::Ticker;
