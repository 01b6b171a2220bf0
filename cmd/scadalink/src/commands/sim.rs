//! Local process simulator command.

use clap::Args;
use scadalink_tank::ProcessState;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{TableChoice, play_cue, print_error, print_warning};

/// Step the process locally, no networking.
#[derive(Args)]
pub struct SimCommand {
    /// Step table variant
    #[arg(long, value_enum, default_value = "rich")]
    table: TableChoice,
}

impl SimCommand {
    pub async fn run(&self) -> anyhow::Result<()> {
        let table = self.table.table();
        let mut state = ProcessState::default();

        println!("Console: n = next step, e = emergency, r = reset, q = quit");
        println!("{}", state);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            match line.trim() {
                "" => continue,
                "n" | "next" => match state.advance(&table) {
                    Ok(Some(cue)) => play_cue(cue),
                    Ok(None) => {}
                    Err(_) => {
                        print_warning("Emergency latch is set, reset before stepping");
                        continue;
                    }
                },
                "e" | "emergency" => play_cue(state.trip_emergency()),
                "r" | "reset" => state.reset(),
                "q" | "quit" | "exit" => break,
                other => {
                    print_error(&format!("Unknown input: {} (use n, e, r, q)", other));
                    continue;
                }
            }
            println!("{}", state);
        }
        Ok(())
    }
}
