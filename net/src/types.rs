//! Common types for scadalink-net.

use std::fmt;
use std::time::Duration;

use scadalink_tank::{Cue, ProcessState};

/// Capacity of the panel event channel.
pub(crate) const PANEL_CAPACITY: usize = 64;

/// Default pause between failed connect attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(2);

/// Endpoint role on a link.
///
/// The two roles interpret the same wire vocabulary differently; see the
/// command tables in the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Server side, owns ground truth.
    Plant,
    /// Client side, holds a local mirror.
    Operator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Plant => write!(f, "plant"),
            Role::Operator => write!(f, "operator"),
        }
    }
}

/// Connection life cycle as observed through panel events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No socket activity yet.
    Idle,
    /// Plant: listener bound, waiting for an operator.
    Listening,
    /// Plant: serving one live operator.
    Serving,
    /// Operator: dialing the plant.
    Connecting,
    /// Operator: receive loop live.
    Connected,
    /// Operator: stream lost, about to redial.
    Reconnecting,
    /// Terminal: bind failed or the retry budget ran out.
    Failed,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkState::Idle => "idle",
            LinkState::Listening => "listening",
            LinkState::Serving => "serving",
            LinkState::Connecting => "connecting",
            LinkState::Connected => "connected",
            LinkState::Reconnecting => "reconnecting",
            LinkState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Event published to the presentation layer.
///
/// The presentation side is a consumer on a broadcast channel: producers
/// never block on it, and a lagging or absent consumer never fails them.
/// State snapshots are taken under the state lock and sent by value, so a
/// consumer can never observe a torn state.
#[derive(Debug, Clone)]
pub enum PanelEvent {
    /// Snapshot after every handled mutation.
    State(ProcessState),
    /// Human-readable one-liner (retries, acks, refusals).
    Status(String),
    /// Connection life cycle transition.
    Link(LinkState),
}

/// Sink for audio/alert cues.
///
/// Fire-and-forget: no return value, and whatever the sink does with a cue
/// must not feed back into the endpoint.
pub trait CueSink: Send + Sync {
    fn play(&self, cue: Cue);
}

/// Discards every cue (default).
#[derive(Debug, Default, Clone)]
pub struct Silent;

impl CueSink for Silent {
    fn play(&self, _cue: Cue) {}
}

/// Function-based cue sink.
impl<F> CueSink for F
where
    F: Fn(Cue) + Send + Sync,
{
    fn play(&self, cue: Cue) {
        self(cue)
    }
}

/// Fixed-interval reconnect policy for the operator role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pause between consecutive failed attempts.
    pub interval: Duration,
    /// Consecutive failures tolerated before giving up; `None` retries
    /// forever. The budget restarts after every successful connect.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Retry forever with the given pause between attempts.
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
        }
    }

    /// Cap the number of consecutive failed attempts.
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_INTERVAL)
    }
}
