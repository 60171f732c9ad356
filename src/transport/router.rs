//! Transport routing: factory registry, per-module bindings and inbound relay.
//!
//! Each module owns one slot holding at most one live transport. Slots are
//! independent, so starting, stopping or sending on one module never waits on
//! another. Inbound events from a bound transport are relayed by a small task onto
//! the module's inbound channel, tagged with the module and a receive timestamp.
//!
//! Every binding carries a generation number. Starting a transport or stopping
//! one retires the slot's current generation, and connection flips are tagged
//! with the generation of the binding that produced them, so a consumer can tell
//! a flip from the live binding apart from one left over by a retired binding.

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;
use tokio::sync::{mpsc, RwLock as AsyncRwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{constants, AgioError, Result};
use crate::protocol::module::ModuleKind;
use crate::transport::{EventReceiver, Transport, TransportEvent, TransportKind};
use crate::utils::metrics::global_metrics;

type FactoryFn = dyn Fn(ModuleKind) -> Box<dyn Transport> + Send + Sync + 'static;

/// Module-tagged notification relayed from a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    DataReceived {
        module: ModuleKind,
        data: Bytes,
        at: Instant,
    },
    ConnectionChanged {
        module: ModuleKind,
        kind: TransportKind,
        connected: bool,
        /// Generation of the binding that reported the flip
        generation: u64,
    },
}

impl InboundEvent {
    pub fn module(&self) -> ModuleKind {
        match self {
            InboundEvent::DataReceived { module, .. } => *module,
            InboundEvent::ConnectionChanged { module, .. } => *module,
        }
    }
}

struct Binding {
    kind: TransportKind,
    generation: u64,
    transport: Box<dyn Transport>,
    relay: JoinHandle<()>,
}

impl Binding {
    /// Stop the transport, then make sure its relay has finished
    async fn shut_down(mut self) -> Result<()> {
        let result = self.transport.stop().await;
        self.relay.abort();
        let _ = self.relay.await;
        result
    }
}

struct ModuleSlot {
    binding: AsyncRwLock<Option<Binding>>,
    generation: AtomicU64,
    inbound_tx: mpsc::UnboundedSender<InboundEvent>,
    inbound_rx: Mutex<Option<mpsc::UnboundedReceiver<InboundEvent>>>,
}

impl ModuleSlot {
    fn new() -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        Self {
            binding: AsyncRwLock::new(None),
            generation: AtomicU64::new(0),
            inbound_tx,
            inbound_rx: Mutex::new(Some(inbound_rx)),
        }
    }

    /// Retire the current generation. Called with the binding lock held.
    fn advance(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Stop a binding that has left the slot and report its final flip
    async fn retire(&self, module: ModuleKind, previous: Binding) -> Result<()> {
        let kind = previous.kind;
        let generation = previous.generation;
        let result = previous.shut_down().await;

        // The relay is gone, so report the final flip on its behalf
        let _ = self.inbound_tx.send(InboundEvent::ConnectionChanged {
            module,
            kind,
            connected: false,
            generation,
        });
        result
    }
}

/// Routes outbound bytes to each module's transport and republishes inbound traffic
pub struct TransportRouter {
    factories: RwLock<HashMap<TransportKind, Arc<FactoryFn>>>,
    slots: [ModuleSlot; 3],
}

impl Default for TransportRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportRouter {
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
            slots: [ModuleSlot::new(), ModuleSlot::new(), ModuleSlot::new()],
        }
    }

    fn slot(&self, module: ModuleKind) -> &ModuleSlot {
        &self.slots[module.index()]
    }

    /// Register the constructor for a transport kind, replacing any earlier one
    pub fn register_factory<F>(&self, kind: TransportKind, factory: F) -> Result<()>
    where
        F: Fn(ModuleKind) -> Box<dyn Transport> + Send + Sync + 'static,
    {
        let mut factories = self
            .factories
            .write()
            .map_err(|_| AgioError::TransportError(constants::ERR_FACTORY_LOCK.to_string()))?;

        if factories.insert(kind, Arc::new(factory)).is_some() {
            debug!(%kind, "Replaced transport factory");
        }
        Ok(())
    }

    pub fn is_registered(&self, kind: TransportKind) -> bool {
        self.factories
            .read()
            .map(|f| f.contains_key(&kind))
            .unwrap_or(false)
    }

    fn factory(&self, kind: TransportKind) -> Result<Arc<FactoryFn>> {
        let factories = self
            .factories
            .read()
            .map_err(|_| AgioError::TransportError(constants::ERR_FACTORY_LOCK.to_string()))?;
        factories
            .get(&kind)
            .cloned()
            .ok_or(AgioError::UnknownTransportKind(kind))
    }

    /// Take the inbound event stream for a module. Returns `None` after the first call.
    pub fn take_inbound(&self, module: ModuleKind) -> Option<mpsc::UnboundedReceiver<InboundEvent>> {
        self.slot(module)
            .inbound_rx
            .lock()
            .ok()
            .and_then(|mut rx| rx.take())
    }

    /// Instantiate a fresh transport of `kind` for `module` and start it.
    ///
    /// An existing binding is stopped and discarded first, reporting its final
    /// disconnect just as `stop_transport` does. On start failure the module is
    /// left with no binding.
    #[instrument(skip(self), fields(module = %module, kind = %kind))]
    pub async fn start_transport(&self, module: ModuleKind, kind: TransportKind) -> Result<()> {
        let factory = self.factory(kind)?;
        let slot = self.slot(module);
        let mut binding = slot.binding.write().await;
        let generation = slot.advance();

        if let Some(previous) = binding.take() {
            let previous_kind = previous.kind;
            if let Err(e) = slot.retire(module, previous).await {
                warn!(error = %e, previous = %previous_kind, "Error stopping replaced transport");
            }
            debug!(previous = %previous_kind, "Replaced existing transport binding");
        }

        let mut transport = factory(module);
        let events = transport
            .take_events()
            .ok_or_else(|| AgioError::TransportError(constants::ERR_EVENTS_TAKEN.to_string()))?;
        let relay = spawn_relay(module, kind, generation, events, slot.inbound_tx.clone());

        if let Err(e) = transport.start().await {
            relay.abort();
            let _ = relay.await;
            global_metrics().transport_failed();
            warn!(error = %e, "Transport failed to start");
            return Err(e);
        }

        global_metrics().transport_started();
        info!(generation, "Transport started");
        *binding = Some(Binding {
            kind,
            generation,
            transport,
            relay,
        });
        Ok(())
    }

    /// Stop and discard the module's transport. A module with no binding is a no-op.
    #[instrument(skip(self), fields(module = %module))]
    pub async fn stop_transport(&self, module: ModuleKind) -> Result<()> {
        let slot = self.slot(module);
        let mut binding = slot.binding.write().await;
        let Some(previous) = binding.take() else {
            trace!("No transport bound, nothing to stop");
            return Ok(());
        };
        slot.advance();

        let kind = previous.kind;
        let result = slot.retire(module, previous).await;
        info!(%kind, "Transport stopped");
        result
    }

    /// Stop every bound transport, reporting the first failure
    pub async fn stop_all(&self) -> Result<()> {
        let mut first_error = None;
        for module in ModuleKind::ALL {
            if let Err(e) = self.stop_transport(module).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Forward bytes to the module's transport
    pub async fn send(&self, module: ModuleKind, data: &[u8]) -> Result<()> {
        let binding = self.slot(module).binding.read().await;
        let bound = binding
            .as_ref()
            .ok_or(AgioError::NoActiveTransport(module))?;

        match bound.transport.send(data).await {
            Ok(()) => {
                global_metrics().frame_sent(data.len() as u64);
                trace!(%module, bytes = data.len(), "Sent");
                Ok(())
            }
            Err(e) => {
                debug!(%module, error = %e, "Send failed");
                Err(e)
            }
        }
    }

    /// Kind of the module's live transport
    pub async fn active_kind(&self, module: ModuleKind) -> Result<TransportKind> {
        self.slot(module)
            .binding
            .read()
            .await
            .as_ref()
            .map(|b| b.kind)
            .ok_or(AgioError::NoActiveTransport(module))
    }

    /// Generation of the module's live binding. Flips tagged with any other
    /// generation come from a binding that has been replaced or stopped.
    pub fn generation(&self, module: ModuleKind) -> u64 {
        self.slot(module).generation.load(Ordering::Acquire)
    }

    pub async fn is_connected(&self, module: ModuleKind) -> bool {
        self.slot(module)
            .binding
            .read()
            .await
            .as_ref()
            .is_some_and(|b| b.transport.is_connected())
    }

    /// Publish bytes as if the module's transport had received them
    pub fn inject(&self, module: ModuleKind, data: impl Into<Bytes>) -> Result<()> {
        self.slot(module)
            .inbound_tx
            .send(InboundEvent::DataReceived {
                module,
                data: data.into(),
                at: Instant::now(),
            })
            .map_err(|_| AgioError::ChannelClosed)
    }
}

fn spawn_relay(
    module: ModuleKind,
    kind: TransportKind,
    generation: u64,
    mut events: EventReceiver,
    inbound: mpsc::UnboundedSender<InboundEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let tagged = match event {
                TransportEvent::DataReceived(data) => InboundEvent::DataReceived {
                    module,
                    data,
                    at: Instant::now(),
                },
                TransportEvent::ConnectionChanged(connected) => {
                    debug!(%module, %kind, connected, generation, "Transport connection changed");
                    InboundEvent::ConnectionChanged {
                        module,
                        kind,
                        connected,
                        generation,
                    }
                }
            };
            if inbound.send(tagged).is_err() {
                break;
            }
        }
    })
}
