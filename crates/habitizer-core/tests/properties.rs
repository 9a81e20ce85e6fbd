use std::sync::Arc;

use habitizer_core::timer::format_elapsed;
use habitizer_core::{ElapsedTimer, ManualClock, Routine, RoutineState, SharedClock};
use proptest::prelude::*;

fn clocked() -> (Arc<ManualClock>, SharedClock) {
    let clock = Arc::new(ManualClock::new(1_000_000));
    let shared = SharedClock::from(clock.clone());
    (clock, shared)
}

// Alternating stretches of running and paused time, in milliseconds.
fn stretches() -> impl Strategy<Value = Vec<(u64, u64)>> {
    proptest::collection::vec((0..120_000u64, 0..600_000u64), 1..12)
}

proptest! {
    #[test]
    fn advances_are_additive(a in 1..3_600u64, b in 1..3_600u64, run_ms in 0..100_000u64) {
        let (clock, shared) = clocked();
        let mut split = ElapsedTimer::new(shared.clone());
        let mut joined = ElapsedTimer::new(shared);
        split.start();
        joined.start();
        clock.advance_ms(run_ms);

        split.advance(a);
        split.advance(b);
        joined.advance(a + b);
        prop_assert_eq!(split.elapsed_ms(), joined.elapsed_ms());
        prop_assert_eq!(split.rounded_down(), (run_ms / 1000) + a + b);
    }

    #[test]
    fn paused_time_is_never_counted(plan in stretches()) {
        let (clock, shared) = clocked();
        let mut timer = ElapsedTimer::new(shared);
        timer.start();

        let mut running_ms = 0;
        for (run, idle) in plan {
            clock.advance_ms(run);
            running_ms += run;
            timer.pause();
            clock.advance_ms(idle);
            prop_assert_eq!(timer.elapsed_ms(), running_ms);
            timer.resume();
        }
        prop_assert_eq!(timer.rounded_down(), running_ms / 1000);
        prop_assert_eq!(timer.rounded_up(), running_ms.div_ceil(1000));
    }

    #[test]
    fn in_order_checkoffs_track_cursor_and_keep_stamps(
        durations in proptest::collection::vec(0..90_000u64, 1..10)
    ) {
        let (clock, shared) = clocked();
        let mut routine = Routine::new(1, "Morning", 0);
        routine.set_clock(shared);
        for i in 0..durations.len() {
            routine.add_task(&format!("Task {i}")).unwrap();
        }
        routine.start().unwrap();

        let ids: Vec<i64> = routine.tasks().iter().map(|t| t.id).collect();
        let mut stamps = Vec::new();
        for (id, ms) in ids.iter().zip(&durations) {
            clock.advance_ms(*ms);
            routine.check_off(*id).unwrap();
            stamps.push(ms.div_ceil(1000));

            prop_assert_eq!(routine.current_task_index(), routine.checked_count());
            let recorded: Vec<u64> = routine
                .tasks()
                .iter()
                .filter_map(|t| t.checkoff_elapsed_secs())
                .collect();
            prop_assert_eq!(&recorded, &stamps);
        }

        prop_assert_eq!(routine.state(), RoutineState::Done);
        let total_ms: u64 = durations.iter().sum();
        prop_assert_eq!(routine.routine_timer().rounded_down(), total_ms / 1000);
    }

    #[test]
    fn readout_is_minutes_and_seconds(secs in 0..400_000u64) {
        let text = format_elapsed(secs);
        let (minutes, seconds) = text.split_once(':').unwrap();
        prop_assert_eq!(minutes.parse::<u64>().unwrap(), secs / 60);
        prop_assert_eq!(seconds.parse::<u64>().unwrap(), secs % 60);
        prop_assert_eq!(seconds.len(), 2);
        prop_assert!(minutes.len() >= 2);
    }
}
