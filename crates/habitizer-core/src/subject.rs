//! Latest-value observables.
//!
//! A [`Subject`] holds the current value of one piece of derived state and
//! lets any number of observers wait for changes. Setting an equal value
//! does not wake observers.

use std::sync::Arc;

use tokio::sync::watch;

use crate::routine::{Routine, RoutineSnapshot, RoutineSummary, Task, DEFAULT_GOAL_TIME_SECS};
use crate::timer::{format_elapsed, NEVER_STARTED};

#[derive(Debug)]
pub struct Subject<T> {
    tx: Arc<watch::Sender<T>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T: Clone + PartialEq> Subject<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn set(&self, value: T) {
        self.tx.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Receiver that sees the current value and every later change.
    pub fn observe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

/// Everything the engine publishes for the routine being viewed.
#[derive(Debug, Clone)]
pub struct RoutineObservers {
    pub routines: Subject<Vec<RoutineSummary>>,
    pub current: Subject<Option<RoutineSnapshot>>,
    pub tasks: Subject<Vec<Task>>,
    pub is_done: Subject<bool>,
    /// Refreshed by commands and, while the timer runs, by periodic ticks.
    pub routine_elapsed: Subject<String>,
    /// Refreshed by commands and, while the timer runs, by periodic ticks.
    pub task_elapsed: Subject<String>,
    pub goal_time: Subject<String>,
}

impl Default for RoutineObservers {
    fn default() -> Self {
        Self {
            routines: Subject::new(Vec::new()),
            current: Subject::new(None),
            tasks: Subject::new(Vec::new()),
            is_done: Subject::new(false),
            routine_elapsed: Subject::new(NEVER_STARTED.to_string()),
            task_elapsed: Subject::new(NEVER_STARTED.to_string()),
            goal_time: Subject::new(format_elapsed(DEFAULT_GOAL_TIME_SECS)),
        }
    }
}

impl RoutineObservers {
    pub(crate) fn publish(&self, routine: &Routine) {
        let snapshot = routine.snapshot();
        self.tasks.set(snapshot.tasks.clone());
        self.is_done.set(snapshot.is_done);
        self.routine_elapsed.set(snapshot.routine_elapsed.clone());
        self.task_elapsed.set(snapshot.task_elapsed.clone());
        self.goal_time.set(snapshot.goal_time.clone());
        self.current.set(Some(snapshot));
    }
}
