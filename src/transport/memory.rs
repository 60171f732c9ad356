//! In-process transport for simulators and tests.
//!
//! A [`MemoryHub`] hands out factories that build [`MemoryTransport`]s and
//! [`MemoryLink`]s that act as the module side of the wire: they deliver bytes to
//! whichever transport is currently attached for a module, flip its connectivity
//! and record everything the host sent.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, trace};

use crate::error::{constants, AgioError, Result};
use crate::protocol::module::ModuleKind;
use crate::transport::{
    EventChannel, EventReceiver, EventSender, Transport, TransportEvent, TransportKind,
};

struct Attached {
    id: u64,
    kind: TransportKind,
    events: EventSender,
    connected: Arc<AtomicBool>,
}

#[derive(Default)]
struct WireState {
    attached: Option<Attached>,
    sent: Vec<(TransportKind, Bytes)>,
    starts: usize,
    fail_next_start: bool,
}

#[derive(Default)]
struct Wire {
    state: Mutex<WireState>,
}

impl Wire {
    fn lock(&self) -> Result<MutexGuard<'_, WireState>> {
        self.state
            .lock()
            .map_err(|_| AgioError::TransportError("memory wire lock poisoned".to_string()))
    }
}

/// Shared registry of per-module wires
#[derive(Clone, Default)]
pub struct MemoryHub {
    wires: Arc<Mutex<HashMap<ModuleKind, Arc<Wire>>>>,
    next_id: Arc<AtomicU64>,
}

impl MemoryHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn wire(&self, module: ModuleKind) -> Arc<Wire> {
        let mut wires = self
            .wires
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(wires.entry(module).or_default())
    }

    /// Build a transport of `kind` for `module` attached to this hub
    pub fn transport(&self, module: ModuleKind, kind: TransportKind) -> MemoryTransport {
        MemoryTransport {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            module,
            kind,
            wire: self.wire(module),
            events: EventChannel::new(),
            connected: Arc::new(AtomicBool::new(false)),
            running: false,
        }
    }

    /// Factory suitable for `TransportRouter::register_factory`
    pub fn factory(
        &self,
        kind: TransportKind,
    ) -> impl Fn(ModuleKind) -> Box<dyn Transport> + Send + Sync + 'static {
        let hub = self.clone();
        move |module| Box::new(hub.transport(module, kind)) as Box<dyn Transport>
    }

    /// Module-side handle for `module`
    pub fn link(&self, module: ModuleKind) -> MemoryLink {
        MemoryLink {
            module,
            wire: self.wire(module),
        }
    }
}

/// Module side of an in-process wire
#[derive(Clone)]
pub struct MemoryLink {
    module: ModuleKind,
    wire: Arc<Wire>,
}

impl MemoryLink {
    pub fn module(&self) -> ModuleKind {
        self.module
    }

    /// Push bytes to the attached transport as one received unit
    pub fn deliver(&self, data: impl Into<Bytes>) -> Result<()> {
        let state = self.wire.lock()?;
        let attached = state.attached.as_ref().ok_or(AgioError::NotConnected)?;
        if !attached.connected.load(Ordering::SeqCst) {
            return Err(AgioError::NotConnected);
        }
        attached
            .events
            .send(TransportEvent::DataReceived(data.into()))
            .map_err(|_| AgioError::ChannelClosed)
    }

    /// Simulate the medium dropping or regaining the link
    pub fn set_connected(&self, connected: bool) -> Result<()> {
        let state = self.wire.lock()?;
        let attached = state.attached.as_ref().ok_or(AgioError::NotConnected)?;
        if attached.connected.swap(connected, Ordering::SeqCst) != connected {
            let _ = attached
                .events
                .send(TransportEvent::ConnectionChanged(connected));
        }
        Ok(())
    }

    /// Kind of the transport currently attached
    pub fn attached_kind(&self) -> Option<TransportKind> {
        self.wire
            .lock()
            .ok()
            .and_then(|s| s.attached.as_ref().map(|a| a.kind))
    }

    /// Everything sent by the host on this module, in order
    pub fn sent(&self) -> Vec<Bytes> {
        self.sent_with_kind().into_iter().map(|(_, b)| b).collect()
    }

    pub fn sent_with_kind(&self) -> Vec<(TransportKind, Bytes)> {
        self.wire.lock().map(|s| s.sent.clone()).unwrap_or_default()
    }

    pub fn clear_sent(&self) {
        if let Ok(mut state) = self.wire.lock() {
            state.sent.clear();
        }
    }

    /// Number of successful starts on this module's wire
    pub fn starts(&self) -> usize {
        self.wire.lock().map(|s| s.starts).unwrap_or_default()
    }

    /// Make the next `start` on this wire fail
    pub fn fail_next_start(&self) {
        if let Ok(mut state) = self.wire.lock() {
            state.fail_next_start = true;
        }
    }
}

pub struct MemoryTransport {
    id: u64,
    module: ModuleKind,
    kind: TransportKind,
    wire: Arc<Wire>,
    events: EventChannel,
    connected: Arc<AtomicBool>,
    running: bool,
}

#[async_trait]
impl Transport for MemoryTransport {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    fn take_events(&mut self) -> Option<EventReceiver> {
        self.events.take()
    }

    async fn start(&mut self) -> Result<()> {
        if self.running {
            return Err(AgioError::AlreadyStarted);
        }
        {
            let mut state = self.wire.lock()?;
            if std::mem::take(&mut state.fail_next_start) {
                return Err(AgioError::TransportError(format!(
                    "simulated start failure on {} {}",
                    self.module, self.kind
                )));
            }
            state.starts += 1;
            state.attached = Some(Attached {
                id: self.id,
                kind: self.kind,
                events: self.events.sender(),
                connected: Arc::clone(&self.connected),
            });
        }
        self.running = true;
        self.connected.store(true, Ordering::SeqCst);
        self.events.emit(TransportEvent::ConnectionChanged(true));
        debug!(module = %self.module, kind = %self.kind, "Memory transport attached");
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        if !self.running {
            return Ok(());
        }
        self.running = false;
        {
            let mut state = self.wire.lock()?;
            if state.attached.as_ref().is_some_and(|a| a.id == self.id) {
                state.attached = None;
            }
        }
        if self.connected.swap(false, Ordering::SeqCst) {
            self.events.emit(TransportEvent::ConnectionChanged(false));
        }
        Ok(())
    }

    async fn send(&self, data: &[u8]) -> Result<()> {
        if !self.running {
            return Err(AgioError::NotConnected);
        }
        if !self.connected.load(Ordering::SeqCst) {
            return Err(AgioError::TransportError(
                constants::ERR_TRANSPORT_STOPPED.to_string(),
            ));
        }
        trace!(module = %self.module, bytes = data.len(), "Memory send");
        self.wire
            .lock()?
            .sent
            .push((self.kind, Bytes::copy_from_slice(data)));
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
