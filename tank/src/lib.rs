//! Tank process model for a simplified SCADA level-control loop.
//!
//! Pure data plus transition rules, no I/O: the state of one water tank
//! (level sensors, valve lineup, emergency latch) and a table-driven step
//! sequencer that walks the tank through a fixed fill/drain scenario.
//!
//! - [`ProcessState`] is a plain `Copy` snapshot of the tank.
//! - [`StepTable`] holds the transition rules; two built-in tables are
//!   provided ([`StepTable::rich`], [`StepTable::reduced`]) and custom
//!   tables can be built from [`StepRow`]s.
//! - Advancing past the last row lands on a rest position (all flags
//!   dropped) before the cycle starts over, so an N-row table has a cycle
//!   of period N + 1.
//!
//! # Example
//!
//! ```rust
//! use scadalink_tank::{ProcessState, StepTable};
//!
//! let table = StepTable::rich();
//! let mut state = ProcessState::default();
//!
//! state.advance(&table).unwrap();
//! assert!(state.low_level && state.in_valve);
//! assert_eq!(state.step, 1);
//! ```

use std::fmt;

/// Error returned when a transition is refused by the emergency latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("emergency latch is set, reset required before stepping")]
pub struct EmergencyLatched;

/// Discrete event for the audio/alert layer.
///
/// Cues are fire-and-forget: the sequencer reports them and forgets them,
/// and whatever renders them must never feed back into the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// A valve changed position.
    Valve,
    /// The emergency latch was tripped.
    Alarm,
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cue::Valve => write!(f, "valve"),
            Cue::Alarm => write!(f, "alarm"),
        }
    }
}

/// One row of a step table: the full sensor/valve lineup for that step.
///
/// A row always replaces all four process flags; there are no partial rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRow {
    pub low_level: bool,
    pub high_level: bool,
    pub in_valve: bool,
    pub out_valve: bool,
    /// Cue fired when this row is applied.
    pub cue: Option<Cue>,
}

impl StepRow {
    pub const fn new(low_level: bool, high_level: bool, in_valve: bool, out_valve: bool) -> Self {
        Self {
            low_level,
            high_level,
            in_valve,
            out_valve,
            cue: None,
        }
    }

    pub const fn with_cue(mut self, cue: Cue) -> Self {
        self.cue = Some(cue);
        self
    }
}

/// Ordered transition rules for the step sequencer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepTable {
    rows: Vec<StepRow>,
}

impl StepTable {
    /// Builds a table from explicit rows.
    pub fn new(rows: Vec<StepRow>) -> Self {
        Self { rows }
    }

    /// The five-step scenario of the standalone simulator.
    ///
    /// Fill with the inlet open, keep filling, hold high, drain with the
    /// outlet open, settle back to low. Valve cues fire on the two rows
    /// that change the valve lineup.
    pub fn rich() -> Self {
        Self::new(vec![
            StepRow::new(true, false, true, false).with_cue(Cue::Valve),
            StepRow::new(true, false, true, false),
            StepRow::new(false, true, false, false),
            StepRow::new(false, true, false, true).with_cue(Cue::Valve),
            StepRow::new(true, false, false, false),
        ])
    }

    /// The two-phase cycle of the networked variant: fill lineup, drain
    /// lineup. Both rows move valves, so both carry a cue.
    pub fn reduced() -> Self {
        Self::new(vec![
            StepRow::new(true, false, true, false).with_cue(Cue::Valve),
            StepRow::new(false, true, false, true).with_cue(Cue::Valve),
        ])
    }

    /// Number of defined rows (the cycle period is `len() + 1`).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[StepRow] {
        &self.rows
    }
}

impl Default for StepTable {
    fn default() -> Self {
        Self::rich()
    }
}

/// Snapshot of the tank process.
///
/// The default value is the idle tank: every flag down, step 0, latch clear.
/// While `latched` is set no automatic or remote transition may alter the
/// state; only [`ProcessState::reset`] clears the latch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessState {
    /// Low-level sensor indication.
    pub low_level: bool,
    /// High-level sensor indication.
    pub high_level: bool,
    /// Inlet valve open.
    pub in_valve: bool,
    /// Outlet valve open.
    pub out_valve: bool,
    /// Emergency indication.
    pub emergency: bool,
    /// Sequencer position, in `0..=table.len()`.
    pub step: usize,
    /// Emergency latch. Set by [`ProcessState::trip_emergency`], cleared
    /// only by [`ProcessState::reset`].
    pub latched: bool,
}

impl ProcessState {
    /// Applies the next sequencer transition.
    ///
    /// Rows replace all four process flags at once. The position past the
    /// last row is the rest state: all flags dropped, step wrapped to 0.
    /// Any out-of-range step value is treated as the rest position, so this
    /// is total over every `step`.
    ///
    /// Returns the applied row's cue, or [`EmergencyLatched`] without
    /// touching the state when the latch is set.
    pub fn advance(&mut self, table: &StepTable) -> Result<Option<Cue>, EmergencyLatched> {
        if self.latched {
            return Err(EmergencyLatched);
        }
        match table.rows().get(self.step) {
            Some(row) => {
                self.set_flags(row.low_level, row.high_level, row.in_valve, row.out_valve);
                self.step += 1;
                Ok(row.cue)
            }
            None => {
                self.set_flags(false, false, false, false);
                self.step = 0;
                Ok(None)
            }
        }
    }

    /// Trips the emergency latch: drops the four process flags, raises the
    /// emergency indication, keeps the step position.
    ///
    /// Idempotent on state. The alarm cue is returned on every call, also
    /// on repeats against an already-latched state.
    pub fn trip_emergency(&mut self) -> Cue {
        self.set_flags(false, false, false, false);
        self.emergency = true;
        self.latched = true;
        Cue::Alarm
    }

    /// Returns the process to the idle tank: every flag down, latch clear,
    /// step 0. No cue.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn set_flags(&mut self, low: bool, high: bool, inlet: bool, outlet: bool) {
        self.low_level = low;
        self.high_level = high;
        self.in_valve = inlet;
        self.out_valve = outlet;
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn led(on: bool) -> &'static str {
            if on { "on" } else { "off" }
        }
        fn valve(open: bool) -> &'static str {
            if open { "open" } else { "closed" }
        }
        write!(
            f,
            "step {} | low:{} high:{} | in:{} out:{} | emergency:{}{}",
            self.step,
            led(self.low_level),
            led(self.high_level),
            valve(self.in_valve),
            valve(self.out_valve),
            led(self.emergency),
            if self.latched { " (latched)" } else { "" },
        )
    }
}

#[cfg(test)]
mod tests;
