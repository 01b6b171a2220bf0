//! Operator HMI command.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use scadalink_net::{Command, Operator, OperatorConfig, RetryPolicy};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{print_error, print_event};

/// Connect to a plant and mirror its level.
#[derive(Args)]
pub struct HmiCommand {
    /// Plant address, e.g. 127.0.0.1:7401
    #[arg(short, long)]
    addr: SocketAddr,

    /// Seconds to sleep between failed connect attempts
    #[arg(long, value_name = "SECS", default_value_t = 2)]
    retry_interval: u64,

    /// Give up after this many failed attempts (default: retry forever)
    #[arg(long)]
    max_retries: Option<u32>,
}

impl HmiCommand {
    pub async fn run(&self) -> anyhow::Result<()> {
        let mut retry = RetryPolicy::new(Duration::from_secs(self.retry_interval));
        if let Some(max) = self.max_retries {
            retry = retry.with_max_attempts(max);
        }
        let config = OperatorConfig::new(self.addr.to_string()).with_retry(retry);
        let operator = Arc::new(Operator::new(config));

        let mut events = operator.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                print_event(&event);
            }
        });

        let running = Arc::clone(&operator);
        let mut link = tokio::spawn(async move { running.run().await });

        println!("Console: 0 = fill, 1 = drain, e = emergency, r = reset, q = quit");
        tokio::select! {
            ran = &mut link => ran??,
            console = console_loop(&operator) => {
                console?;
                operator.shutdown();
                let _ = link.await;
            }
        }
        Ok(())
    }
}

/// Command console: level pushes and latch controls from stdin.
async fn console_loop(operator: &Operator) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let cmd = match line.trim() {
            "" => continue,
            "0" | "fill" => Command::Set0,
            "1" | "drain" => Command::Set1,
            "e" | "emergency" => {
                operator.trip_emergency();
                continue;
            }
            "r" | "reset" => {
                operator.reset();
                continue;
            }
            "q" | "quit" | "exit" => break,
            other => {
                print_error(&format!("Unknown input: {} (use 0, 1, e, r, q)", other));
                continue;
            }
        };
        if let Err(e) = operator.send(cmd).await {
            print_error(&format!("Send failed: {}", e));
        }
    }
    Ok(())
}
