//! Operator endpoint (client role).
//!
//! Holds a local mirror of the plant's state, never ground truth. Connects
//! with a fixed-interval retry policy, runs the receive loop, and after any
//! teardown redials with a fresh stream; the old handle is never reused.
//!
//! Commands pushed by the plant land in the mirror through the operator
//! command table (level flags only) and are acknowledged one for one.
//! [`Operator::send`] issues fill/drain requests the other way; the plant's
//! ack arrives on the receive loop and is surfaced as a status event.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use scadalink_tank::ProcessState;
use tokio::io::WriteHalf;
use tokio::net::TcpStream;
use tokio::sync::{Mutex as AsyncMutex, broadcast};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::handler;
use crate::protocol::{self, Ack, Command};
use crate::types::{CueSink, LinkState, PANEL_CAPACITY, PanelEvent, RetryPolicy, Role, Silent};

/// Operator configuration.
#[derive(Debug, Clone)]
pub struct OperatorConfig {
    /// Plant address (host:port).
    pub addr: String,
    /// Reconnect policy.
    pub retry: RetryPolicy,
}

impl OperatorConfig {
    /// Create a new operator config with the default retry policy.
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            retry: RetryPolicy::default(),
        }
    }

    /// Set the reconnect policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Builder for Operator.
pub struct OperatorBuilder {
    config: OperatorConfig,
    cues: Option<Arc<dyn CueSink>>,
}

impl OperatorBuilder {
    pub fn new(config: OperatorConfig) -> Self {
        Self { config, cues: None }
    }

    /// Set the cue sink.
    pub fn cues<S: CueSink + 'static>(mut self, sink: S) -> Self {
        self.cues = Some(Arc::new(sink));
        self
    }

    /// Build the operator.
    pub fn build(self) -> Operator {
        let (events, _) = broadcast::channel(PANEL_CAPACITY);
        let (shutdown, _) = broadcast::channel(1);
        Operator {
            config: self.config,
            cues: self.cues.unwrap_or_else(|| Arc::new(Silent)),
            state: Arc::new(Mutex::new(ProcessState::default())),
            writer: Arc::new(AsyncMutex::new(None)),
            events,
            shutdown,
            running: Arc::new(AtomicBool::new(false)),
            connected: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Operator endpoint: the mirrored state plus the reconnecting dial loop.
pub struct Operator {
    config: OperatorConfig,
    cues: Arc<dyn CueSink>,
    state: Arc<Mutex<ProcessState>>,
    /// Write half of the live stream; `None` between connections.
    writer: Arc<AsyncMutex<Option<WriteHalf<TcpStream>>>>,
    events: broadcast::Sender<PanelEvent>,
    shutdown: broadcast::Sender<()>,
    running: Arc<AtomicBool>,
    connected: Arc<AtomicBool>,
}

impl Operator {
    /// Create a new operator with the given config and a silent cue sink.
    pub fn new(config: OperatorConfig) -> Self {
        OperatorBuilder::new(config).build()
    }

    /// Create a builder for this operator.
    pub fn builder(config: OperatorConfig) -> OperatorBuilder {
        OperatorBuilder::new(config)
    }

    /// Subscribe to panel events.
    pub fn subscribe(&self) -> broadcast::Receiver<PanelEvent> {
        self.events.subscribe()
    }

    /// Current mirror snapshot.
    pub fn state(&self) -> ProcessState {
        *self.state.lock()
    }

    /// Whether a receive loop is live right now.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Send one command to the plant. The resulting ack arrives on the
    /// receive loop and is surfaced as a status event.
    pub async fn send(&self, cmd: Command) -> Result<()> {
        let mut writer = self.writer.lock().await;
        match writer.as_mut() {
            Some(w) => protocol::write_frame(w, cmd.encode()).await,
            None => Err(Error::NotConnected),
        }
    }

    /// Trip the emergency latch on the local mirror.
    pub fn trip_emergency(&self) {
        let (snapshot, cue) = {
            let mut state = self.state.lock();
            let cue = state.trip_emergency();
            (*state, cue)
        };
        self.cues.play(cue);
        self.status("emergency latch tripped".to_string());
        self.publish_state(snapshot);
    }

    /// Clear the latch and return the local mirror to the idle tank.
    pub fn reset(&self) {
        let snapshot = {
            let mut state = self.state.lock();
            state.reset();
            *state
        };
        self.status("mirror reset".to_string());
        self.publish_state(snapshot);
    }

    /// Ask the endpoint to stop. Idempotent.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }

    /// Run until shutdown: connect with backoff, serve the receive loop,
    /// redial with a fresh stream after every teardown.
    ///
    /// Returns [`Error::RetriesExhausted`] when a configured attempt cap is
    /// spent; without a cap this only returns after [`Operator::shutdown`].
    pub async fn run(&self) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyRunning);
        }

        let mut shutdown = self.shutdown.subscribe();
        let result = loop {
            let stream = tokio::select! {
                _ = shutdown.recv() => break Ok(()),
                connected = self.connect_with_retry() => match connected {
                    Ok(stream) => stream,
                    Err(e) => {
                        self.link(LinkState::Failed);
                        break Err(e);
                    }
                },
            };

            match self.serve_connection(stream).await {
                // Only a shutdown ends the receive loop cleanly.
                Ok(()) => break Ok(()),
                Err(e) => {
                    warn!("Link to plant lost: {}", e);
                    self.status(format!("link lost: {}, reconnecting", e));
                    self.link(LinkState::Reconnecting);
                }
            }
        };

        self.writer.lock().await.take();
        self.connected.store(false, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
        result
    }

    /// Dial until a connect succeeds or the attempt cap is spent. The
    /// attempt budget is fresh on every call, so a lost link gets the full
    /// budget again.
    async fn connect_with_retry(&self) -> Result<TcpStream> {
        let mut attempts: u32 = 0;
        loop {
            self.link(LinkState::Connecting);
            match TcpStream::connect(&self.config.addr).await {
                Ok(stream) => {
                    info!("Connected to plant at {}", self.config.addr);
                    return Ok(stream);
                }
                Err(e) => {
                    attempts += 1;
                    let err = Error::Connect {
                        addr: self.config.addr.clone(),
                        source: e,
                    };
                    warn!("{} (attempt {})", err, attempts);
                    self.status(format!("{} (attempt {})", err, attempts));
                    if let Some(max) = self.config.retry.max_attempts {
                        if attempts >= max {
                            return Err(Error::RetriesExhausted(attempts));
                        }
                    }
                    tokio::time::sleep(self.config.retry.interval).await;
                }
            }
        }
    }

    /// Receive loop for one connection to the plant. Returns `Ok(())` only
    /// on shutdown; every other exit is a teardown the dial loop absorbs.
    async fn serve_connection(&self, stream: TcpStream) -> Result<()> {
        let (mut reader, writer) = tokio::io::split(stream);
        *self.writer.lock().await = Some(writer);
        self.connected.store(true, Ordering::SeqCst);
        self.link(LinkState::Connected);
        self.status(format!("connected to plant at {}", self.config.addr));

        let mut shutdown = self.shutdown.subscribe();
        let result = loop {
            let payload = tokio::select! {
                _ = shutdown.recv() => break Ok(()),
                payload = protocol::read_frame(&mut reader) => match payload {
                    Ok(payload) => payload,
                    Err(e) => break Err(e),
                },
            };
            self.handle_frame(&payload).await;
        };

        self.connected.store(false, Ordering::SeqCst);
        self.writer.lock().await.take();
        result
    }

    /// Applies the operator command table to one inbound frame and answers
    /// it; ack frames are status only and never answered.
    async fn handle_frame(&self, payload: &str) {
        if let Some(ack) = Ack::decode(payload) {
            debug!("Plant acknowledged {}", ack);
            self.status(format!("plant acknowledged {}", ack));
            return;
        }

        let cmd = Command::decode(payload);
        let (snapshot, applied) = {
            let mut state = self.state.lock();
            let applied = handler::apply(Role::Operator, &mut state, cmd);
            (*state, applied)
        };
        if applied.refused {
            self.status("push refused: emergency latch is set".to_string());
        }
        if let Some(cue) = applied.cue {
            self.cues.play(cue);
        }
        // Rendering refreshes on every frame, recognized or not.
        self.publish_state(snapshot);

        // Ack failures are swallowed; the mirror mutation stands and the
        // next read observes the dead stream.
        let mut writer = self.writer.lock().await;
        if let Some(w) = writer.as_mut() {
            if let Err(e) = protocol::write_frame(w, applied.ack.encode()).await {
                warn!("Failed to send {}: {}", applied.ack, e);
            }
        }
    }

    fn publish_state(&self, snapshot: ProcessState) {
        let _ = self.events.send(PanelEvent::State(snapshot));
    }

    fn status(&self, text: String) {
        let _ = self.events.send(PanelEvent::Status(text));
    }

    fn link(&self, state: LinkState) {
        let _ = self.events.send(PanelEvent::Link(state));
    }
}
