//! Integration tests for routine runs through the engine.
//!
//! These tests drive full runs against both repositories and check the
//! published state, persistence across engine restarts, and rejections.

use std::sync::Arc;

use habitizer_core::storage::seed_defaults;
use habitizer_core::{
    EngineConfig, EngineError, Event, InMemoryRoutineRepository, ManualClock, RoutineEngine,
    RoutineId, RoutineRepository, RoutineState, SqliteRoutineRepository,
};

fn engine_with<R: RoutineRepository>(repo: R) -> (RoutineEngine<R>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let engine = RoutineEngine::with_clock(repo, EngineConfig::default(), clock.clone().into());
    (engine, clock)
}

fn add_routine<R: RoutineRepository>(engine: &mut RoutineEngine<R>, tasks: &[&str]) -> RoutineId {
    let id = engine
        .add_routine("Morning")
        .unwrap()
        .expect("routine added")
        .routine_id();
    for task in tasks {
        engine.add_task(id, task).unwrap();
    }
    id
}

#[test]
fn test_two_task_run_to_completion() {
    let (mut engine, clock) = engine_with(InMemoryRoutineRepository::new());
    let id = add_routine(&mut engine, &["A", "B"]);
    engine.set_goal_time(id, 60).unwrap();

    engine.start(id).unwrap();
    let r = engine.routine(id).unwrap();
    assert_eq!(r.state(), RoutineState::InProgress);
    assert_eq!(r.current_task_index(), 0);

    clock.advance_secs(12);
    engine.check_off(id, 1).unwrap();
    let r = engine.routine(id).unwrap();
    assert_eq!(r.task(1).unwrap().checkoff_elapsed_secs(), Some(12));
    assert_eq!(r.current_task_index(), 1);
    assert_eq!(r.task_timer().rounded_down(), 0);

    clock.advance_secs(8);
    let event = engine.check_off(id, 2).unwrap().unwrap();
    assert!(matches!(event, Event::TaskCheckedOff { routine_done: true, checkoff_elapsed_secs: 8, .. }));

    let r = engine.routine(id).unwrap();
    assert_eq!(r.task(2).unwrap().checkoff_elapsed_secs(), Some(8));
    assert_eq!(r.current_task_index(), 2);
    assert_eq!(r.state(), RoutineState::Done);
    assert!(!r.routine_timer().is_running());
    assert!(!r.task_timer().is_running());

    let observers = engine.observers();
    assert!(observers.is_done.get());
    assert_eq!(observers.routine_elapsed.get(), "00:20");
    assert_eq!(observers.goal_time.get(), "01:00");
}

#[test]
fn test_advance_while_paused_moves_both_timers() {
    let (mut engine, clock) = engine_with(InMemoryRoutineRepository::new());
    let id = add_routine(&mut engine, &["A"]);
    engine.start(id).unwrap();
    clock.advance_secs(5);
    engine.pause(id).unwrap();

    engine.advance_time(id, 30).unwrap();
    clock.advance_secs(100);

    let r = engine.routine(id).unwrap();
    assert_eq!(r.state(), RoutineState::Paused);
    assert_eq!(r.routine_timer().rounded_down(), 35);
    assert_eq!(r.task_timer().rounded_down(), 35);
    assert_eq!(engine.observers().routine_elapsed.get(), "00:35");
}

#[test]
fn test_checkoff_before_cursor_is_rejected() {
    let (mut engine, clock) = engine_with(InMemoryRoutineRepository::new());
    let id = add_routine(&mut engine, &["A", "B", "C"]);
    engine.start(id).unwrap();
    clock.advance_secs(4);
    // Skipping ahead to the last task finishes the run.
    engine.check_off(id, 3).unwrap();
    assert_eq!(engine.routine(id).unwrap().state(), RoutineState::Done);

    engine.reinitialize(id).unwrap();
    engine.start(id).unwrap();
    engine.check_off(id, 2).unwrap();
    let before = engine.routine(id).unwrap();
    let published = engine.observers().current.get();

    let err = engine.check_off(id, 1).unwrap_err();
    assert!(matches!(err.as_engine(), Some(EngineError::OutOfOrderCheckoff { cursor: 2, .. })));
    assert_eq!(engine.routine(id).unwrap(), before);
    assert_eq!(engine.observers().current.get(), published);
}

#[test]
fn test_recheck_is_noop() {
    let (mut engine, clock) = engine_with(InMemoryRoutineRepository::new());
    let id = add_routine(&mut engine, &["A", "B"]);
    engine.start(id).unwrap();
    clock.advance_secs(7);
    engine.check_off(id, 1).unwrap();
    let before = engine.snapshot(id).unwrap();

    assert_eq!(engine.check_off(id, 1).unwrap(), None);
    assert_eq!(engine.snapshot(id).unwrap(), before);
}

#[test]
fn test_commands_in_wrong_state() {
    let (mut engine, _clock) = engine_with(InMemoryRoutineRepository::new());
    let id = add_routine(&mut engine, &["A"]);

    assert_eq!(engine.pause(id).unwrap(), None);
    assert_eq!(engine.resume(id).unwrap(), None);
    assert!(engine.end(id).is_err());
    assert!(engine.reinitialize(id).is_err());
    assert!(engine.advance_time(id, 30).is_err());
    assert!(engine.check_off(id, 1).is_err());

    engine.start(id).unwrap();
    assert!(engine.start(id).is_err());
    assert!(engine.add_task(id, "B").is_err());
    assert!(engine.set_goal_time(id, 0).is_err());
    assert!(engine.retitle_task(id, 1, "").is_err());
    assert!(engine.retitle_task(id, 1, "Stretch").unwrap().is_some());
}

#[test]
fn test_end_early_then_new_run() {
    let (mut engine, clock) = engine_with(InMemoryRoutineRepository::new());
    let id = add_routine(&mut engine, &["A", "B"]);
    engine.start(id).unwrap();
    clock.advance_secs(3);
    engine.check_off(id, 1).unwrap();

    let event = engine.end(id).unwrap().unwrap();
    assert!(matches!(event, Event::RoutineEnded { unchecked_tasks: 1, .. }));
    assert_eq!(engine.end(id).unwrap(), None);
    assert!(engine.in_progress().unwrap().is_none());

    engine.reinitialize(id).unwrap();
    let snap = engine.snapshot(id).unwrap();
    assert_eq!(snap.state, RoutineState::Idle);
    assert_eq!(snap.routine_elapsed, "-");
    assert!(snap.tasks.iter().all(|t| !t.is_checked()));
    assert!(engine.start(id).unwrap().is_some());
}

#[test]
fn test_sqlite_run_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("habitizer.db");
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));

    let id = {
        let repo = SqliteRoutineRepository::open_at(&path).unwrap();
        let mut engine =
            RoutineEngine::with_clock(repo, EngineConfig::default(), clock.clone().into());
        let id = add_routine(&mut engine, &["Shower", "Dress"]);
        engine.start(id).unwrap();
        clock.advance_secs(10);
        engine.check_off(id, 1).unwrap();
        id
    };

    clock.advance_secs(25);

    let repo = SqliteRoutineRepository::open_at(&path).unwrap();
    let mut engine = RoutineEngine::with_clock(repo, EngineConfig::default(), clock.clone().into());
    let snap = engine.restore().unwrap().expect("run restored");
    assert_eq!(snap.routine_id, id);
    assert_eq!(snap.state, RoutineState::InProgress);
    assert_eq!(snap.current_task_index, 1);
    assert_eq!(snap.routine_elapsed, "00:35");
    assert_eq!(snap.task_elapsed, "00:25");

    engine.check_off(id, 2).unwrap();
    let r = engine.routine(id).unwrap();
    assert_eq!(r.task(2).unwrap().checkoff_elapsed_secs(), Some(25));
    assert!(r.is_done());
    assert!(engine.restore().unwrap().is_none());
}

#[test]
fn test_seeded_repository_lists_routines_in_order() {
    let mut repo = SqliteRoutineRepository::open_memory().unwrap();
    seed_defaults(&mut repo, 60).unwrap();
    let (mut engine, _clock) = engine_with(repo);

    let routines = engine.list_routines().unwrap();
    let titles: Vec<&str> = routines.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, ["Morning", "Evening"]);

    let snap = engine.select(routines[1].id).unwrap();
    assert_eq!(snap.title, "Evening");
    assert_eq!(engine.observers().tasks.get().len(), routines[1].task_count);
    assert_eq!(engine.observers().routines.get().len(), 2);
}
