//! Module coordinator: lifecycle tracking for every field module.
//!
//! The coordinator drains each module's inbound channel on its own pump task,
//! classifies frames as hellos or data, and keeps one [`ModuleRecord`] per module
//! behind its own lock. A watchdog task applies the hello and data deadlines on a
//! short tick; an optional heartbeat keeps host hellos flowing to bound modules.
//! Lifecycle changes are republished on a broadcast channel as [`CoreEvent`]s.

use bytes::Bytes;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use crate::config::TimingConfig;
use crate::core::frame::FrameView;
use crate::error::{constants, AgioError, Result};
use crate::protocol::hello::{HostHello, ModuleHello, ScanRequest};
use crate::protocol::message::PgnMessage;
use crate::protocol::module::ModuleKind;
use crate::service::state::{ConnectionState, ModuleRecord, ModuleStatus, StateChange, TimeoutCause};
use crate::transport::{InboundEvent, TransportKind, TransportRouter};
use crate::utils::metrics::global_metrics;

/// Capacity of the lifecycle broadcast; slow subscribers see `Lagged`
const EVENT_CAPACITY: usize = 1024;

/// Notification published to coordinator subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    /// Every raw delivery, well-formed or not
    DataReceived {
        module: ModuleKind,
        data: Bytes,
        at: Instant,
    },
    ConnectionChanged {
        module: ModuleKind,
        kind: TransportKind,
        connected: bool,
    },
    /// Transition into Ready
    ModuleReady { module: ModuleKind, at: Instant },
    /// Transition into TimedOut
    ModuleDisconnected { module: ModuleKind, at: Instant },
}

struct ModuleCell {
    record: Mutex<ModuleRecord>,
    state: watch::Sender<ConnectionState>,
}

struct Shared {
    router: Arc<TransportRouter>,
    timing: TimingConfig,
    cells: [ModuleCell; 3],
    events: broadcast::Sender<CoreEvent>,
}

impl Shared {
    fn cell(&self, module: ModuleKind) -> &ModuleCell {
        &self.cells[module.index()]
    }

    fn record(&self, module: ModuleKind) -> MutexGuard<'_, ModuleRecord> {
        self.cell(module)
            .record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: CoreEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Announce a state change. Called with the module's record lock held so
    /// events for one module are published in transition order.
    fn announce(&self, module: ModuleKind, change: Option<StateChange>, at: Instant) {
        let Some(change) = change else {
            return;
        };
        self.cell(module).state.send_replace(change.to);
        debug!(%module, from = %change.from, to = %change.to, "Module state changed");

        match change.to {
            ConnectionState::Ready => {
                global_metrics().module_ready();
                info!(%module, "Module ready");
                self.publish(CoreEvent::ModuleReady { module, at });
            }
            ConnectionState::TimedOut => {
                global_metrics().module_timed_out();
                self.publish(CoreEvent::ModuleDisconnected { module, at });
            }
            _ => {}
        }
    }

    fn handle_data(&self, module: ModuleKind, data: Bytes, at: Instant) {
        self.publish(CoreEvent::DataReceived {
            module,
            data: data.clone(),
            at,
        });

        let Some(frame) = FrameView::parse(&data) else {
            global_metrics().frame_rejected();
            trace!(%module, bytes = data.len(), "Discarding malformed frame");
            return;
        };
        global_metrics().frame_received(data.len() as u64);

        // A hello for another module on this binding is ordinary traffic
        let hello = ModuleHello::decode(&frame).filter(|h| h.module == module);

        let mut record = self.record(module);
        match hello {
            Some(hello) => {
                global_metrics().hello_received();
                trace!(%module, version = hello.version, "Hello received");
                let change = record.hello(hello.version, at, self.timing.two_phase_min_version);
                self.announce(module, change, at);
            }
            None => {
                if record.data(at) {
                    trace!(%module, pgn = frame.pgn, "Data frame received");
                }
            }
        }
    }

    fn handle_link(&self, module: ModuleKind, kind: TransportKind, connected: bool, generation: u64) {
        self.publish(CoreEvent::ConnectionChanged {
            module,
            kind,
            connected,
        });

        // Flips from a replaced or stopped binding never touch the record
        let current = self.router.generation(module);
        if generation != current {
            trace!(%module, %kind, connected, generation, current, "Ignoring stale link flip");
            return;
        }

        let now = Instant::now();
        let mut record = self.record(module);
        let change = record.link_changed(connected, now);
        if change.is_some() {
            if connected {
                info!(%module, %kind, "Link restored");
            } else {
                warn!(%module, %kind, "Link lost");
            }
        }
        self.announce(module, change, now);
    }

    fn handle(&self, event: InboundEvent) {
        match event {
            InboundEvent::DataReceived { module, data, at } => self.handle_data(module, data, at),
            InboundEvent::ConnectionChanged {
                module,
                kind,
                connected,
                generation,
            } => self.handle_link(module, kind, connected, generation),
        }
    }

    fn check_timeouts_at(&self, now: Instant) -> Vec<(ModuleKind, TimeoutCause)> {
        let mut expired = Vec::new();
        for module in ModuleKind::ALL {
            let mut record = self.record(module);
            let from = record.state();
            if let Some(cause) = record.check_timeouts(
                now,
                self.timing.hello_timeout,
                self.timing.data_timeout(module),
            ) {
                warn!(%module, ?cause, from = %from, "Module timed out");
                let change = StateChange {
                    from,
                    to: record.state(),
                };
                self.announce(module, Some(change), now);
                expired.push((module, cause));
            }
        }
        expired
    }

    async fn send_host_hello(&self, module: ModuleKind) -> Result<()> {
        let bytes = HostHello::default().to_bytes()?;
        self.router.send(module, &bytes).await
    }
}

/// Drives every module's connection lifecycle over a [`TransportRouter`].
///
/// Must be created inside a Tokio runtime; construction spawns the pump,
/// watchdog and heartbeat tasks.
pub struct ModuleCoordinator {
    shared: Arc<Shared>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    cancel: CancellationToken,
}

impl ModuleCoordinator {
    /// Take over the router's inbound streams and start background tasks
    pub fn new(router: Arc<TransportRouter>, timing: TimingConfig) -> Result<Self> {
        let mut inbound = Vec::with_capacity(ModuleKind::ALL.len());
        for module in ModuleKind::ALL {
            let rx = router.take_inbound(module).ok_or_else(|| {
                AgioError::TransportError(constants::ERR_INBOUND_TAKEN.to_string())
            })?;
            inbound.push(rx);
        }

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let cell = |module| ModuleCell {
            record: Mutex::new(ModuleRecord::new(module)),
            state: watch::Sender::new(ConnectionState::Disconnected),
        };
        let shared = Arc::new(Shared {
            router,
            cells: [
                cell(ModuleKind::SteeringActuator),
                cell(ModuleKind::ImplementController),
                cell(ModuleKind::InertialUnit),
            ],
            timing,
            events,
        });

        let cancel = CancellationToken::new();
        let mut tasks: Vec<JoinHandle<()>> = inbound
            .into_iter()
            .map(|rx| spawn_pump(Arc::clone(&shared), rx, cancel.clone()))
            .collect();
        tasks.push(spawn_watchdog(Arc::clone(&shared), cancel.clone()));
        if let Some(period) = shared.timing.host_hello_interval {
            tasks.push(spawn_heartbeat(Arc::clone(&shared), period, cancel.clone()));
        }

        info!(
            hello_timeout_ms = shared.timing.hello_timeout.as_millis() as u64,
            tick_ms = shared.timing.watchdog_tick.as_millis() as u64,
            "Module coordinator started"
        );
        Ok(Self {
            shared,
            tasks: Mutex::new(tasks),
            cancel,
        })
    }

    pub fn router(&self) -> &Arc<TransportRouter> {
        &self.shared.router
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.shared.timing
    }

    /// Bind and start a transport; the module moves to `Connecting`.
    ///
    /// On failure the module is left in `Error` and the error is returned.
    #[instrument(skip(self), fields(module = %module, kind = %kind))]
    pub async fn start_module(&self, module: ModuleKind, kind: TransportKind) -> Result<()> {
        {
            let now = Instant::now();
            let mut record = self.shared.record(module);
            let change = record.transport_starting(kind, now);
            self.shared.announce(module, change, now);
        }

        if let Err(e) = self.shared.router.start_transport(module, kind).await {
            let now = Instant::now();
            let mut record = self.shared.record(module);
            let change = record.transport_failed();
            self.shared.announce(module, change, now);
            return Err(e);
        }
        Ok(())
    }

    /// Stop the module's transport and return it to `Disconnected`
    #[instrument(skip(self), fields(module = %module))]
    pub async fn stop_module(&self, module: ModuleKind) -> Result<()> {
        let result = self.shared.router.stop_transport(module).await;
        let now = Instant::now();
        let mut record = self.shared.record(module);
        let change = record.reset();
        self.shared.announce(module, change, now);
        result
    }

    /// Stop any transport and clear the module's record, timestamps included
    pub async fn reset(&self, module: ModuleKind) -> Result<()> {
        self.stop_module(module).await
    }

    /// Fire-and-forget send of raw bytes
    pub async fn send(&self, module: ModuleKind, data: &[u8]) -> Result<()> {
        self.shared.router.send(module, data).await
    }

    /// Build and send a catalog message
    pub async fn send_frame<M: PgnMessage + Sync>(&self, module: ModuleKind, message: &M) -> Result<()> {
        let bytes = message.to_bytes()?;
        self.shared.router.send(module, &bytes).await
    }

    pub async fn send_host_hello(&self, module: ModuleKind) -> Result<()> {
        self.shared.send_host_hello(module).await
    }

    pub async fn send_scan_request(&self, module: ModuleKind) -> Result<()> {
        self.send_frame(module, &ScanRequest).await
    }

    /// Complete a pending two-phase handshake. Returns whether the module moved to Ready.
    pub fn acknowledge_capabilities(&self, module: ModuleKind) -> bool {
        let now = Instant::now();
        let mut record = self.shared.record(module);
        let change = record.acknowledge_capabilities(now);
        let moved = change.is_some();
        self.shared.announce(module, change, now);
        moved
    }

    pub fn is_ready(&self, module: ModuleKind) -> bool {
        self.state(module) == ConnectionState::Ready
    }

    pub fn state(&self, module: ModuleKind) -> ConnectionState {
        self.shared.record(module).state()
    }

    pub fn last_hello_at(&self, module: ModuleKind) -> Option<Instant> {
        self.shared.record(module).last_hello_at()
    }

    pub fn last_data_at(&self, module: ModuleKind) -> Option<Instant> {
        self.shared.record(module).last_data_at()
    }

    pub fn status(&self, module: ModuleKind) -> ModuleStatus {
        self.shared.record(module).status()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.shared.events.subscribe()
    }

    /// Subscriber as a stream. Events lost to lag are logged and skipped.
    pub fn event_stream(&self) -> impl Stream<Item = CoreEvent> + Send + 'static {
        BroadcastStream::new(self.subscribe()).filter_map(|event| match event {
            Ok(event) => Some(event),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(skipped, "Event subscriber lagged");
                None
            }
        })
    }

    /// Watch one module's state
    pub fn watch_state(&self, module: ModuleKind) -> watch::Receiver<ConnectionState> {
        self.shared.cell(module).state.subscribe()
    }

    /// Run one watchdog pass as of `now` and report what expired
    pub fn check_timeouts_at(&self, now: Instant) -> Vec<(ModuleKind, TimeoutCause)> {
        self.shared.check_timeouts_at(now)
    }

    /// Start the transport, greet the module and wait for `Ready`.
    ///
    /// The host hello is repeated at the heartbeat interval while waiting. A start
    /// failure is returned as-is; running out of time yields `InitializationTimeout`.
    #[instrument(skip(self), fields(module = %module, kind = %kind))]
    pub async fn initialize(&self, module: ModuleKind, kind: TransportKind) -> Result<()> {
        let waited = self.shared.timing.initialize_timeout;
        let mut state = self.watch_state(module);

        self.start_module(module, kind).await?;

        let resend = self.shared.timing.host_hello_interval.unwrap_or(waited);
        let wait = async {
            let mut ticker = interval(resend);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    ready = state.wait_for(|s| *s == ConnectionState::Ready) => {
                        return ready.map(|_| ()).map_err(|_| AgioError::ChannelClosed);
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = self.shared.send_host_hello(module).await {
                            debug!(error = %e, "Host hello not sent");
                        }
                    }
                }
            }
        };

        match tokio::time::timeout(waited, wait).await {
            Ok(result) => result,
            Err(_) => {
                warn!(waited_ms = waited.as_millis() as u64, "Module did not become ready");
                Err(AgioError::InitializationTimeout { module, waited })
            }
        }
    }

    /// Stop background tasks and every transport
    pub async fn shutdown(&self) -> Result<()> {
        self.cancel.cancel();
        let tasks = std::mem::take(
            &mut *self
                .tasks
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for task in tasks {
            let _ = task.await;
        }
        let result = self.shared.router.stop_all().await;
        for module in ModuleKind::ALL {
            let now = Instant::now();
            let mut record = self.shared.record(module);
            let change = record.reset();
            self.shared.announce(module, change, now);
        }
        global_metrics().log_metrics();
        info!("Module coordinator shut down");
        result
    }
}

impl Drop for ModuleCoordinator {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn spawn_pump(
    shared: Arc<Shared>,
    mut inbound: mpsc::UnboundedReceiver<InboundEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                event = inbound.recv() => match event {
                    Some(event) => shared.handle(event),
                    None => break,
                },
            }
        }
    })
}

fn spawn_watchdog(shared: Arc<Shared>, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(shared.timing.watchdog_tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    shared.check_timeouts_at(Instant::now());
                }
            }
        }
    })
}

fn spawn_heartbeat(
    shared: Arc<Shared>,
    period: std::time::Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // First tick completes immediately; initialize sends its own first hello
        ticker.tick().await;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    for module in ModuleKind::ALL {
                        if shared.record(module).state() == ConnectionState::Disconnected {
                            continue;
                        }
                        if let Err(e) = shared.send_host_hello(module).await {
                            trace!(%module, error = %e, "Heartbeat hello not sent");
                        }
                    }
                }
            }
        }
    })
}
