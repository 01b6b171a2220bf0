//! Plant endpoint command.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use scadalink_net::{Plant, PlantConfig};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{TableChoice, play_cue, print_error, print_event, print_warning};

/// Serve the ground-truth process state.
#[derive(Args)]
pub struct PlantCommand {
    /// Listen address, e.g. 0.0.0.0:7401
    #[arg(short, long)]
    listen: SocketAddr,

    /// Step table variant
    #[arg(long, value_enum, default_value = "rich")]
    table: TableChoice,

    /// Advance the sequencer automatically every SECS seconds
    #[arg(long, value_name = "SECS")]
    step_interval: Option<u64>,
}

impl PlantCommand {
    pub async fn run(&self) -> anyhow::Result<()> {
        let mut config = PlantConfig::new(self.listen.to_string()).with_table(self.table.table());
        if let Some(secs) = self.step_interval {
            config = config.with_step_interval(Duration::from_secs(secs));
        }

        let plant = Arc::new(Plant::builder(config).cues(play_cue).build());

        let mut events = plant.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                print_event(&event);
            }
        });

        let serving = Arc::clone(&plant);
        let mut server = tokio::spawn(async move { serving.serve().await });

        println!("Console: n = next step, e = emergency, r = reset, q = quit");
        tokio::select! {
            served = &mut server => served??,
            console = console_loop(&plant) => {
                console?;
                plant.shutdown();
                let _ = server.await;
            }
        }
        Ok(())
    }
}

/// Local trigger console: step, emergency and reset from stdin.
async fn console_loop(plant: &Plant) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => {}
            "n" | "next" => {
                if plant.advance().await.is_err() {
                    print_warning("Emergency latch is set, reset before stepping");
                }
            }
            "e" | "emergency" => plant.trip_emergency(),
            "r" | "reset" => plant.reset(),
            "q" | "quit" | "exit" => break,
            other => print_error(&format!("Unknown input: {} (use n, e, r, q)", other)),
        }
    }
    Ok(())
}
