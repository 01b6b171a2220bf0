//! Utility functions for CLI commands.

use clap::ValueEnum;
use scadalink_net::PanelEvent;
use scadalink_tank::{Cue, StepTable};

/// Step table selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TableChoice {
    /// Five-row fill/hold/drain/settle scenario
    Rich,
    /// Two-row fill/drain cycle
    Reduced,
}

impl TableChoice {
    pub fn table(self) -> StepTable {
        match self {
            TableChoice::Rich => StepTable::rich(),
            TableChoice::Reduced => StepTable::reduced(),
        }
    }
}

/// Renders one panel event on the console.
pub fn print_event(event: &PanelEvent) {
    match event {
        PanelEvent::State(state) => println!("{}", state),
        PanelEvent::Status(text) => print_info(text),
        PanelEvent::Link(link) => print_info(&format!("link: {}", link)),
    }
}

/// Cue sink for the console. No audio hardware here, so the cue name is
/// printed instead.
pub fn play_cue(cue: Cue) {
    print_info(&format!("cue: {}", cue));
}

/// Prints error message.
pub fn print_error(msg: &str) {
    eprintln!("\x1b[31m✗\x1b[0m {}", msg);
}

/// Prints info message.
pub fn print_info(msg: &str) {
    eprintln!("\x1b[34mℹ\x1b[0m {}", msg);
}

/// Prints warning message.
pub fn print_warning(msg: &str) {
    eprintln!("\x1b[33m⚠\x1b[0m {}", msg);
}
