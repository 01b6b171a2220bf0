//! Role command tables.
//!
//! Both roles run the same skeleton: apply the role's table to the state,
//! produce exactly one ack. The two tables are deliberately asymmetric and
//! are never reconciled: the plant interprets `0`/`1` as full valve lineups,
//! the operator mirror only tracks the level flags.

use scadalink_tank::{Cue, ProcessState};

use crate::protocol::{Ack, Command};
use crate::types::Role;

/// Outcome of applying one command to one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Applied {
    pub ack: Ack,
    pub cue: Option<Cue>,
    /// Mutation skipped because the emergency latch was set. The ack is
    /// still produced; it acknowledges receipt, not effect.
    pub refused: bool,
}

/// Applies `cmd` to `state` under `role`'s command table.
pub(crate) fn apply(role: Role, state: &mut ProcessState, cmd: Command) -> Applied {
    match role {
        Role::Plant => apply_plant(state, cmd),
        Role::Operator => apply_operator(state, cmd),
    }
}

fn apply_plant(state: &mut ProcessState, cmd: Command) -> Applied {
    match cmd {
        Command::Set0 => {
            if state.latched {
                return refused(Ack::State0Set);
            }
            // Fill lineup: tank low, inlet open.
            state.low_level = true;
            state.high_level = false;
            state.in_valve = true;
            state.out_valve = false;
            Applied {
                ack: Ack::State0Set,
                cue: Some(Cue::Valve),
                refused: false,
            }
        }
        Command::Set1 => {
            if state.latched {
                return refused(Ack::State1Set);
            }
            // Drain lineup: tank high, outlet open.
            state.low_level = false;
            state.high_level = true;
            state.in_valve = false;
            state.out_valve = true;
            Applied {
                ack: Ack::State1Set,
                cue: Some(Cue::Valve),
                refused: false,
            }
        }
        Command::Unknown => unknown(),
    }
}

fn apply_operator(state: &mut ProcessState, cmd: Command) -> Applied {
    match cmd {
        Command::Set0 => {
            if state.latched {
                return refused(Ack::Low);
            }
            state.low_level = true;
            state.high_level = false;
            Applied {
                ack: Ack::Low,
                cue: None,
                refused: false,
            }
        }
        Command::Set1 => {
            if state.latched {
                return refused(Ack::High);
            }
            state.high_level = true;
            state.low_level = false;
            Applied {
                ack: Ack::High,
                cue: None,
                refused: false,
            }
        }
        Command::Unknown => unknown(),
    }
}

fn refused(ack: Ack) -> Applied {
    Applied {
        ack,
        cue: None,
        refused: true,
    }
}

fn unknown() -> Applied {
    Applied {
        ack: Ack::Unknown,
        cue: None,
        refused: false,
    }
}
