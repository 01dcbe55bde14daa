use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::SyncSettings;
use crate::core::{parse_video_id, Envelope, SyncState, ViewOrientation};
use crate::error::SyncError;
use crate::player::{LocalEvent, PlayerAdapter};
use crate::sync::engine::{Reaction, SyncEngine};
use crate::transport::Transport;

/// Upper bound on envelopes drained from one inbound burst
const INBOUND_BATCH: usize = 32;

/// Native widget signals delivered by the embedding UI
///
/// The embedder forwards widget callbacks and local user intents through
/// these instead of touching the adapter, which keeps engine and adapter
/// behind a single event-processing task.
#[derive(Debug, Clone)]
pub enum NativeSignal {
    /// The widget finished initializing
    Ready,
    /// The widget fired a state-change callback with this native code
    StateChange(i32),
    /// The widget fired a playback-rate callback
    RateChange(f64),
    /// Local request to switch the room to a new video (URL or bare id)
    Load(String),
    /// Local 360° view change to share with the room
    ViewChange(ViewOrientation),
    /// End the session task
    Shutdown,
}

/// Counters shared between the session task and its owner
#[derive(Debug, Default)]
pub struct SessionStats {
    pub messages_received: AtomicU64,
    pub messages_sent: AtomicU64,
    pub messages_ignored: AtomicU64,
    pub errors: AtomicU64,
}

/// Cloneable entry point for feeding signals into a running session
#[derive(Clone)]
pub struct SessionHandle {
    signals: mpsc::Sender<NativeSignal>,
}

impl SessionHandle {
    pub async fn notify_ready(&self) -> Result<(), SyncError> {
        self.send(NativeSignal::Ready).await
    }

    pub async fn notify_state_change(&self, code: i32) -> Result<(), SyncError> {
        self.send(NativeSignal::StateChange(code)).await
    }

    pub async fn notify_rate_change(&self, rate: f64) -> Result<(), SyncError> {
        self.send(NativeSignal::RateChange(rate)).await
    }

    /// Ask the room to switch videos; accepts share URLs and bare ids
    pub async fn load_video(&self, reference: &str) -> Result<(), SyncError> {
        self.send(NativeSignal::Load(reference.to_string())).await
    }

    pub async fn update_view(&self, view: ViewOrientation) -> Result<(), SyncError> {
        self.send(NativeSignal::ViewChange(view)).await
    }

    async fn send(&self, signal: NativeSignal) -> Result<(), SyncError> {
        self.signals
            .send(signal)
            .await
            .map_err(|_| SyncError::SessionClosed)
    }
}

/// A running synchronization session for one participant
///
/// Owns the event-processing task. Engine and adapter live inside that
/// task, so every native callback and every inbound message is handled
/// run to completion with no interleaving.
pub struct SyncSession {
    handle: SessionHandle,
    stats: Arc<SessionStats>,
    task: JoinHandle<()>,
}

impl SyncSession {
    /// Spawn the session task for a ready-to-use adapter and transport
    pub fn spawn(
        adapter: PlayerAdapter,
        transport: Box<dyn Transport>,
        settings: &SyncSettings,
    ) -> Self {
        let (signal_tx, signal_rx) = mpsc::channel(settings.signal_buffer.max(1));
        let stats = Arc::new(SessionStats::default());
        let engine = SyncEngine::new(&settings.participant_name, settings.push_state_on_join);

        let worker = SessionWorker {
            adapter,
            engine,
            transport,
            stats: stats.clone(),
        };
        let task = tokio::spawn(worker.run(signal_rx));

        Self {
            handle: SessionHandle { signals: signal_tx },
            stats,
            task,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub fn stats(&self) -> Arc<SessionStats> {
        self.stats.clone()
    }

    /// Stop the session task and wait for it to finish
    pub async fn shutdown(self) {
        let _ = self.handle.send(NativeSignal::Shutdown).await;
        let _ = self.task.await;
    }
}

enum Step {
    Signal(Option<NativeSignal>),
    Inbound(crate::transport::TransportResult<Option<Envelope>>),
}

struct SessionWorker {
    adapter: PlayerAdapter,
    engine: SyncEngine,
    transport: Box<dyn Transport>,
    stats: Arc<SessionStats>,
}

impl SessionWorker {
    async fn run(mut self, mut signals: mpsc::Receiver<NativeSignal>) {
        info!("sync session started for {}", self.engine.participant());

        loop {
            let step = tokio::select! {
                signal = signals.recv() => Step::Signal(signal),
                inbound = self.transport.recv() => Step::Inbound(inbound),
            };

            match step {
                Step::Signal(None) | Step::Signal(Some(NativeSignal::Shutdown)) => break,
                Step::Signal(Some(signal)) => self.handle_signal(signal).await,
                Step::Inbound(Ok(Some(envelope))) => {
                    let batch = self.drain_batch(envelope);
                    for envelope in coalesce(batch) {
                        self.handle_envelope(envelope).await;
                    }
                }
                Step::Inbound(Ok(None)) => {
                    info!("transport closed, ending session");
                    break;
                }
                Step::Inbound(Err(e)) => {
                    self.stats.errors.fetch_add(1, Ordering::Relaxed);
                    debug!("dropping undecodable inbound payload: {}", e);
                }
            }
        }

        info!("sync session ended for {}", self.engine.participant());
    }

    /// Pull whatever else arrived while we were processing, so a burst can
    /// be coalesced before anything is applied
    fn drain_batch(&mut self, first: Envelope) -> Vec<Envelope> {
        let mut batch = vec![first];
        while batch.len() < INBOUND_BATCH {
            match self.transport.try_recv() {
                Ok(Some(envelope)) => batch.push(envelope),
                Ok(None) => break,
                Err(e) => {
                    self.stats.errors.fetch_add(1, Ordering::Relaxed);
                    debug!("dropping undecodable inbound payload: {}", e);
                }
            }
        }
        batch
    }

    async fn handle_signal(&mut self, signal: NativeSignal) {
        match signal {
            NativeSignal::Ready => {
                let event = self.adapter.on_native_ready();
                self.broadcast_local(event).await;
            }
            NativeSignal::StateChange(code) => {
                if let Some(event) = self.adapter.on_native_state_change(code) {
                    self.broadcast_local(event).await;
                }
            }
            NativeSignal::RateChange(rate) => {
                if let Some(event) = self.adapter.on_native_rate_change(rate) {
                    self.broadcast_local(event).await;
                }
            }
            NativeSignal::Load(reference) => match parse_video_id(&reference) {
                Some(video_id) => {
                    self.send_envelope(Envelope::Load { video_id }).await;
                }
                None => {
                    warn!("not a recognizable video reference: {}", reference);
                }
            },
            NativeSignal::ViewChange(view) => {
                self.send_envelope(Envelope::SphereUpdate {
                    properties: view.clamped(),
                })
                .await;
            }
            NativeSignal::Shutdown => {}
        }
    }

    async fn handle_envelope(&mut self, envelope: Envelope) {
        self.stats.messages_received.fetch_add(1, Ordering::Relaxed);

        match envelope {
            Envelope::Load { video_id } => {
                if let Err(e) = self.adapter.load_video(&video_id) {
                    self.stats.errors.fetch_add(1, Ordering::Relaxed);
                    warn!("dropping load of {}: {}", video_id, e);
                }
            }
            Envelope::SphereUpdate { properties } => {
                if let Err(e) = self.adapter.apply_view(&properties) {
                    self.stats.errors.fetch_add(1, Ordering::Relaxed);
                    warn!("dropping view update: {}", e);
                }
            }
            Envelope::StateChange(mut msg) => {
                let now_ms = now_ms();
                msg.sanitize(now_ms);

                match self.engine.apply_remote(&msg, now_ms) {
                    None => {
                        self.stats.messages_ignored.fetch_add(1, Ordering::Relaxed);
                    }
                    Some(Reaction::Apply(command)) => {
                        debug!("applying {:?} from {}", command, msg.sender);
                        if let Err(e) = self.adapter.apply_remote(&command) {
                            // No retry and no retransmission request; the
                            // next announcement re-converges the session.
                            self.stats.errors.fetch_add(1, Ordering::Relaxed);
                            warn!("dropping announcement from {}: {}", msg.sender, e);
                        }
                    }
                    Some(Reaction::AnnounceCurrent) => {
                        let (offset, rate) = self.adapter.snapshot();
                        let announce = self.engine.announce_current(offset, rate, now_ms);
                        debug!("pushing current state to newcomer {}", msg.sender);
                        self.send_envelope(Envelope::StateChange(announce)).await;
                    }
                }
            }
        }
    }

    async fn broadcast_local(&mut self, event: LocalEvent) {
        if let Some(msg) = self.engine.local_event(&event, now_ms()) {
            self.send_envelope(Envelope::StateChange(msg)).await;
        }
    }

    async fn send_envelope(&mut self, envelope: Envelope) {
        match self.transport.send(&envelope).await {
            Ok(()) => {
                self.stats.messages_sent.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                error!("broadcast failed: {}", e);
            }
        }
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Collapse a burst so only the newest play/pause announcement per sender
/// survives; superseded ones are dropped before they touch the widget
fn coalesce(batch: Vec<Envelope>) -> Vec<Envelope> {
    let mut superseded = vec![false; batch.len()];
    let mut newest: HashMap<String, usize> = HashMap::new();

    for (idx, envelope) in batch.iter().enumerate() {
        if let Envelope::StateChange(msg) = envelope {
            if matches!(msg.state, SyncState::Play | SyncState::Pause) {
                if let Some(previous) = newest.insert(msg.sender.clone(), idx) {
                    superseded[previous] = true;
                }
            }
        }
    }

    batch
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| !superseded[*idx])
        .map(|(_, envelope)| envelope)
        .collect()
}
