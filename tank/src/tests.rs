//! Tests for the tank process model.

use super::*;

#[test]
fn test_default_state_is_idle() {
    let state = ProcessState::default();
    assert!(!state.low_level);
    assert!(!state.high_level);
    assert!(!state.in_valve);
    assert!(!state.out_valve);
    assert!(!state.emergency);
    assert!(!state.latched);
    assert_eq!(state.step, 0);
}

#[test]
fn test_rich_table_walk() {
    let table = StepTable::rich();
    let mut state = ProcessState::default();

    // Step 0: fill lineup, inlet opens.
    assert_eq!(state.advance(&table).unwrap(), Some(Cue::Valve));
    assert!(state.low_level && !state.high_level);
    assert!(state.in_valve && !state.out_valve);
    assert_eq!(state.step, 1);

    // Step 1: still filling, no cue this time.
    assert_eq!(state.advance(&table).unwrap(), None);
    assert!(state.low_level && state.in_valve);
    assert_eq!(state.step, 2);

    // Step 2: level reaches high.
    assert_eq!(state.advance(&table).unwrap(), None);
    assert!(state.high_level && !state.low_level);
    assert_eq!(state.step, 3);

    // Step 3: drain lineup, outlet opens.
    assert_eq!(state.advance(&table).unwrap(), Some(Cue::Valve));
    assert!(state.high_level && state.out_valve);
    assert_eq!(state.step, 4);

    // Step 4: back to low, valves shut.
    assert_eq!(state.advance(&table).unwrap(), None);
    assert!(state.low_level && !state.out_valve);
    assert_eq!(state.step, 5);

    // Rest position: everything drops, step wraps.
    assert_eq!(state.advance(&table).unwrap(), None);
    assert_eq!(state, ProcessState::default());
}

#[test]
fn test_cycle_period_is_rows_plus_one() {
    let rich = StepTable::rich();
    let mut state = ProcessState::default();
    for _ in 0..rich.len() + 1 {
        state.advance(&rich).unwrap();
    }
    assert_eq!(state, ProcessState::default());

    let reduced = StepTable::reduced();
    let mut state = ProcessState::default();
    for _ in 0..reduced.len() + 1 {
        state.advance(&reduced).unwrap();
    }
    assert_eq!(state, ProcessState::default());
}

#[test]
fn test_reduced_table_rows() {
    let table = StepTable::reduced();
    let mut state = ProcessState::default();

    assert_eq!(state.advance(&table).unwrap(), Some(Cue::Valve));
    assert!(state.low_level && state.in_valve);
    assert!(!state.high_level && !state.out_valve);

    assert_eq!(state.advance(&table).unwrap(), Some(Cue::Valve));
    assert!(state.high_level && state.out_valve);
    assert!(!state.low_level && !state.in_valve);
}

#[test]
fn test_advance_is_total_over_any_step() {
    let table = StepTable::rich();

    // Out-of-range positions behave as the rest position.
    let mut state = ProcessState {
        step: 99,
        low_level: true,
        in_valve: true,
        ..Default::default()
    };
    assert_eq!(state.advance(&table).unwrap(), None);
    assert_eq!(state, ProcessState::default());

    // An empty table rests forever.
    let empty = StepTable::new(Vec::new());
    let mut state = ProcessState::default();
    assert_eq!(state.advance(&empty).unwrap(), None);
    assert_eq!(state.step, 0);
}

#[test]
fn test_emergency_blocks_advance() {
    let table = StepTable::rich();
    let mut state = ProcessState::default();
    state.advance(&table).unwrap();
    state.advance(&table).unwrap();

    assert_eq!(state.trip_emergency(), Cue::Alarm);
    let latched = state;
    assert!(latched.emergency && latched.latched);
    assert!(!latched.low_level && !latched.in_valve);
    assert_eq!(latched.step, 2); // The step position survives the trip.

    // Advancing is refused and leaves the state untouched.
    assert_eq!(state.advance(&table), Err(EmergencyLatched));
    assert_eq!(state.advance(&table), Err(EmergencyLatched));
    assert_eq!(state, latched);
}

#[test]
fn test_trip_emergency_is_idempotent_and_realarms() {
    let mut state = ProcessState::default();
    state.trip_emergency();
    let first = state;

    // Repeated trips do not change the state but still raise the alarm cue.
    assert_eq!(state.trip_emergency(), Cue::Alarm);
    assert_eq!(state, first);
}

#[test]
fn test_reset_clears_latch_and_flags() {
    let table = StepTable::rich();
    let mut state = ProcessState::default();
    state.advance(&table).unwrap();
    state.advance(&table).unwrap();
    state.trip_emergency();

    state.reset();
    assert_eq!(state, ProcessState::default());

    // The sequencer runs again after a reset.
    assert_eq!(state.advance(&table).unwrap(), Some(Cue::Valve));
    assert!(state.low_level);
}

#[test]
fn test_custom_table() {
    let table = StepTable::new(vec![
        StepRow::new(false, true, false, true).with_cue(Cue::Valve),
    ]);
    let mut state = ProcessState::default();

    assert_eq!(state.advance(&table).unwrap(), Some(Cue::Valve));
    assert!(state.high_level && state.out_valve);
    assert_eq!(state.step, 1);

    // One row, so the cycle period is two.
    state.advance(&table).unwrap();
    assert_eq!(state, ProcessState::default());
}

#[test]
fn test_display_renders_lineup() {
    let mut state = ProcessState::default();
    assert_eq!(
        state.to_string(),
        "step 0 | low:off high:off | in:closed out:closed | emergency:off"
    );

    state.trip_emergency();
    assert!(state.to_string().ends_with("emergency:on (latched)"));
}
