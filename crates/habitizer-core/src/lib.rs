//! # Habitizer Core Library
//!
//! This library provides the core logic for Habitizer: ordered routines of
//! tasks, run one at a time, with a routine-level and a task-level stopwatch.
//! The CLI binary is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Timer**: a pausable stopwatch reading time from a pluggable clock
//! - **Routine**: the aggregate and its run state machine
//! - **Engine**: command handling, persistence, periodic readouts and
//!   observer publishing
//! - **Storage**: repository trait with in-memory and SQLite implementations,
//!   plus TOML-based configuration
//!
//! ## Key Components
//!
//! - [`RoutineEngine`]: Command entry point
//! - [`Routine`]: Run state machine
//! - [`ElapsedTimer`]: Stopwatch
//! - [`RoutineRepository`]: Persistence boundary
//! - [`RoutineObservers`]: Published state

pub mod engine;
pub mod error;
pub mod events;
pub mod routine;
pub mod storage;
pub mod subject;
pub mod timer;

pub use engine::RoutineEngine;
pub use error::{ConfigError, CoreError, EngineError, StorageError};
pub use events::Event;
pub use routine::{Routine, RoutineId, RoutineSnapshot, RoutineState, RoutineSummary, Task, TaskId};
pub use storage::{Config, EngineConfig, InMemoryRoutineRepository, RoutineRepository, SqliteRoutineRepository};
pub use subject::{RoutineObservers, Subject};
pub use timer::{ElapsedTimer, ManualClock, SharedClock};
