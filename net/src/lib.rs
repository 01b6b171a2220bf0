//! Plant/operator link for the tank process.
//!
//! Single-character commands and short acknowledgement strings over plain
//! TCP, one live peer at a time:
//!
//! - [`Plant`]: server role. Owns the ground-truth [`scadalink_tank`]
//!   process state, serves exactly one operator at a time, pushes level
//!   updates after every local transition.
//! - [`Operator`]: client role. Mirrors the level flags, acknowledges every
//!   push, reconnects with a fixed-interval retry policy.
//! - [`Command`] / [`Ack`]: the closed wire vocabulary. Decoding is total;
//!   unrecognized input is answered with `ACK_UNKNOWN`, never an error.
//!
//! Presentation is decoupled through [`PanelEvent`] broadcast channels and
//! audio through the [`CueSink`] trait; neither can block an endpoint.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use scadalink_net::{Operator, OperatorConfig, Plant, PlantConfig};
//!
//! #[tokio::main]
//! async fn main() -> scadalink_net::Result<()> {
//!     let plant = Arc::new(Plant::new(PlantConfig::new("127.0.0.1:7401")));
//!     let serving = Arc::clone(&plant);
//!     tokio::spawn(async move { serving.serve().await });
//!
//!     let operator = Operator::new(OperatorConfig::new("127.0.0.1:7401"));
//!     let mut events = operator.subscribe();
//!     tokio::spawn(async move { operator.run().await });
//!
//!     while let Ok(event) = events.recv().await {
//!         println!("{:?}", event);
//!     }
//!     Ok(())
//! }
//! ```

mod error;
mod handler;
mod operator;
mod plant;
mod protocol;
mod types;

pub use error::{Error, Result};
pub use operator::{Operator, OperatorBuilder, OperatorConfig};
pub use plant::{Plant, PlantBuilder, PlantConfig};
pub use protocol::{Ack, Command, MAX_FRAME};
pub use types::{
    CueSink, DEFAULT_RETRY_INTERVAL, LinkState, PanelEvent, RetryPolicy, Role, Silent,
};
