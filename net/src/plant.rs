//! Plant endpoint (server role).
//!
//! Owns the ground-truth process state. Binds once, then serves exactly one
//! operator at a time: the accept loop runs each connection's receive loop
//! to completion before accepting again, so a second operator sits in the
//! OS backlog unanswered until the slot frees up.
//!
//! ## Responsibilities
//!
//! - step sequencer triggers: manual [`Plant::advance`] and the optional
//!   autonomous step task
//! - the plant command table for inbound frames, one ack per command
//! - level pushes to the live operator after every local ground-truth
//!   transition
//!
//! A stalled-but-open peer blocks the receive loop, and with it the accept
//! loop, indefinitely. Known liveness limitation, kept from the console
//! lineage of this protocol.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use scadalink_tank::{EmergencyLatched, ProcessState, StepTable};
use tokio::io::WriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex as AsyncMutex, broadcast};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::handler;
use crate::protocol::{self, Ack, Command};
use crate::types::{CueSink, LinkState, PANEL_CAPACITY, PanelEvent, Role, Silent};

/// Write half of the live stream, shared between the receive loop and the
/// local triggers. `None` between connections.
type SharedWriter = Arc<AsyncMutex<Option<WriteHalf<TcpStream>>>>;

/// Plant configuration.
#[derive(Debug, Clone)]
pub struct PlantConfig {
    /// Listen address (host:port).
    pub addr: String,
    /// Step table driving the sequencer.
    pub table: StepTable,
    /// Period of the autonomous step task; `None` leaves stepping manual.
    pub step_interval: Option<Duration>,
}

impl PlantConfig {
    /// Create a new plant config with the rich step table and no step task.
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            table: StepTable::rich(),
            step_interval: None,
        }
    }

    /// Set the step table.
    pub fn with_table(mut self, table: StepTable) -> Self {
        self.table = table;
        self
    }

    /// Enable autonomous stepping with the given period.
    pub fn with_step_interval(mut self, interval: Duration) -> Self {
        self.step_interval = Some(interval);
        self
    }
}

/// Builder for Plant.
pub struct PlantBuilder {
    config: PlantConfig,
    cues: Option<Arc<dyn CueSink>>,
}

impl PlantBuilder {
    pub fn new(config: PlantConfig) -> Self {
        Self { config, cues: None }
    }

    /// Set the cue sink.
    pub fn cues<S: CueSink + 'static>(mut self, sink: S) -> Self {
        self.cues = Some(Arc::new(sink));
        self
    }

    /// Build the plant.
    pub fn build(self) -> Plant {
        let (events, _) = broadcast::channel(PANEL_CAPACITY);
        let (shutdown, _) = broadcast::channel(1);
        let core = Core {
            state: Arc::new(Mutex::new(ProcessState::default())),
            table: self.config.table.clone(),
            cues: self.cues.unwrap_or_else(|| Arc::new(Silent)),
            writer: Arc::new(AsyncMutex::new(None)),
            events,
        };
        Plant {
            config: self.config,
            core,
            shutdown,
            running: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Ground-truth context shared with the step task: the state plus every
/// effect fan-out a transition needs (cues, panel events, level pushes).
#[derive(Clone)]
struct Core {
    state: Arc<Mutex<ProcessState>>,
    table: StepTable,
    cues: Arc<dyn CueSink>,
    writer: SharedWriter,
    events: broadcast::Sender<PanelEvent>,
}

impl Core {
    /// One sequencer step, with cue, snapshot event and level push.
    async fn advance(&self) -> std::result::Result<(), EmergencyLatched> {
        let (snapshot, cue) = {
            let mut state = self.state.lock();
            let cue = state.advance(&self.table)?;
            (*state, cue)
        };
        if let Some(cue) = cue {
            self.cues.play(cue);
        }
        self.publish_state(snapshot);
        self.push_level(snapshot).await;
        Ok(())
    }

    fn trip_emergency(&self) {
        let (snapshot, cue) = {
            let mut state = self.state.lock();
            let cue = state.trip_emergency();
            (*state, cue)
        };
        self.cues.play(cue);
        self.status("emergency latch tripped".to_string());
        self.publish_state(snapshot);
        // Nothing to push: the trip drops both level flags.
    }

    fn reset(&self) {
        let snapshot = {
            let mut state = self.state.lock();
            state.reset();
            *state
        };
        self.status("process reset".to_string());
        self.publish_state(snapshot);
    }

    /// Applies the plant command table to one inbound frame and answers it.
    async fn handle_frame(&self, payload: &str) {
        if let Some(ack) = Ack::decode(payload) {
            // The operator acknowledging one of our pushes. Status only,
            // never a reply, so acks cannot ping-pong.
            debug!("Operator acknowledged {}", ack);
            self.status(format!("operator acknowledged {}", ack));
            return;
        }

        let cmd = Command::decode(payload);
        let (snapshot, applied) = {
            let mut state = self.state.lock();
            let applied = handler::apply(Role::Plant, &mut state, cmd);
            (*state, applied)
        };
        if applied.refused {
            warn!("Command {} refused, emergency latch is set", cmd);
            self.status("command refused: emergency latch is set".to_string());
        }
        if let Some(cue) = applied.cue {
            self.cues.play(cue);
        }
        // Rendering refreshes on every frame, recognized or not.
        self.publish_state(snapshot);
        self.send_frame(applied.ack.encode()).await;
    }

    /// Level synchronization push: mirrors the current level to the live
    /// operator as a one-byte command. Nothing is sent when neither or both
    /// level flags are set.
    async fn push_level(&self, snapshot: ProcessState) {
        let cmd = match (snapshot.low_level, snapshot.high_level) {
            (true, false) => Command::Set0,
            (false, true) => Command::Set1,
            _ => return,
        };
        self.send_frame(cmd.encode()).await;
    }

    /// Write on the live stream, if any. Failures are swallowed and logged;
    /// the receive loop observes the dead stream on its next read and tears
    /// the connection down.
    async fn send_frame(&self, text: &str) {
        let mut writer = self.writer.lock().await;
        match writer.as_mut() {
            Some(w) => {
                if let Err(e) = protocol::write_frame(w, text).await {
                    warn!("Failed to send {:?}: {}", text, e);
                }
            }
            None => debug!("No operator connected, {:?} not sent", text),
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

/// Plant endpoint: ground-truth state plus the serialized accept loop.
pub struct Plant {
    config: PlantConfig,
    core: Core,
    shutdown: broadcast::Sender<()>,
    running: Arc<AtomicBool>,
}

impl Plant {
    /// Create a new plant with the given config and a silent cue sink.
    pub fn new(config: PlantConfig) -> Self {
        PlantBuilder::new(config).build()
    }

    /// Create a builder for this plant.
    pub fn builder(config: PlantConfig) -> PlantBuilder {
        PlantBuilder::new(config)
    }

    /// Subscribe to panel events.
    pub fn subscribe(&self) -> broadcast::Receiver<PanelEvent> {
        self.core.events.subscribe()
    }

    /// Current ground-truth snapshot.
    pub fn state(&self) -> ProcessState {
        *self.core.state.lock()
    }

    /// Manual sequencer step, the panel's "next" button.
    ///
    /// Refused with [`EmergencyLatched`] while the latch is set.
    pub async fn advance(&self) -> std::result::Result<(), EmergencyLatched> {
        self.core.advance().await
    }

    /// Trip the emergency latch.
    pub fn trip_emergency(&self) {
        self.core.trip_emergency();
    }

    /// Clear the latch and return the process to the idle tank.
    pub fn reset(&self) {
        self.core.reset();
    }

    /// Ask the endpoint to stop. Idempotent.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }

    /// Serve until shutdown.
    ///
    /// Binds exactly once; a bind failure is final and reported as
    /// [`Error::Bind`]. The accept loop serves one operator at a time and
    /// returns to accepting after every teardown.
    pub async fn serve(&self) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyRunning);
        }

        let listener = match TcpListener::bind(&self.config.addr).await {
            Ok(listener) => listener,
            Err(e) => {
                self.core.link(LinkState::Failed);
                self.running.store(false, Ordering::SeqCst);
                return Err(Error::Bind {
                    addr: self.config.addr.clone(),
                    source: e,
                });
            }
        };
        info!("Plant listening on {}", self.config.addr);
        self.core.link(LinkState::Listening);

        if let Some(interval) = self.config.step_interval {
            self.spawn_step_task(interval);
        }

        let mut shutdown = self.shutdown.subscribe();
        loop {
            let accepted = tokio::select! {
                _ = shutdown.recv() => break,
                accepted = listener.accept() => accepted,
            };
            let (stream, addr) = match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    // Transient resource pressure, not a bind failure.
                    warn!("Accept failed: {}", e);
                    continue;
                }
            };
            debug!("Accepted operator from {}", addr);
            self.core.status(format!("operator connected from {}", addr));
            self.core.link(LinkState::Serving);

            // Served inline: the next operator is not accepted until this
            // receive loop has fully completed.
            match self.serve_connection(stream).await {
                Ok(()) | Err(Error::StreamClosed) => {
                    debug!("Operator {} disconnected", addr);
                    self.core.status(format!("operator {} disconnected", addr));
                }
                Err(e) => {
                    warn!("Operator {} dropped: {}", addr, e);
                    self.core.status(format!("operator {} dropped: {}", addr, e));
                }
            }
            self.core.writer.lock().await.take();
            self.core.link(LinkState::Listening);
        }

        self.core.writer.lock().await.take();
        self.running.store(false, Ordering::SeqCst);
        info!("Plant stopped");
        Ok(())
    }

    /// Receive loop for one operator connection. Returns `Ok(())` only on
    /// shutdown; every other exit is a teardown the accept loop absorbs.
    async fn serve_connection(&self, stream: TcpStream) -> Result<()> {
        let (mut reader, writer) = tokio::io::split(stream);
        *self.core.writer.lock().await = Some(writer);

        let mut shutdown = self.shutdown.subscribe();
        loop {
            let payload = tokio::select! {
                _ = shutdown.recv() => return Ok(()),
                payload = protocol::read_frame(&mut reader) => payload?,
            };
            self.core.handle_frame(&payload).await;
        }
    }

    fn spawn_step_task(&self, interval: Duration) {
        let core = self.core.clone();
        let mut shutdown = self.shutdown.subscribe();
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    _ = ticker.tick() => {}
                }
                if core.advance().await.is_err() {
                    debug!("Step tick dropped, emergency latch is set");
                }
            }
        });
    }
}
