//! # Transport Layer
//!
//! Swappable physical-medium bindings behind a single capability trait.
//!
//! ## Components
//! - **Transport**: start / stop / send plus an event stream of received bytes and
//!   connectivity flips
//! - **Router**: factory registry keyed by [`TransportKind`], one live binding per
//!   module, module-tagged relay of inbound events
//! - **UDP**: Ethernet modules on a fixed per-module port
//! - **Link**: shared engine for byte-stream media (Bluetooth, CAN, radio) whose
//!   native API is supplied by a platform [`link::LinkDriver`]
//! - **Memory**: in-process transport for simulators and tests
//!
//! ## Event Delivery
//! A transport never calls back into its owner. It pushes [`TransportEvent`]s into
//! an unbounded channel it creates at construction; the router takes the receiving
//! end once and relays it onto the owning module's inbound channel.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

use crate::error::Result;

pub mod bluetooth;
pub mod can;
pub mod link;
pub mod memory;
pub mod radio;
pub mod router;
pub mod udp;

pub use router::{InboundEvent, TransportRouter};

/// Physical medium family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportKind {
    Udp,
    Bluetooth,
    Can,
    Radio,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportKind::Udp => "udp",
            TransportKind::Bluetooth => "bluetooth",
            TransportKind::Can => "can",
            TransportKind::Radio => "radio",
        })
    }
}

/// Notification pushed by a transport instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// One datagram or one framed unit from a stream
    DataReceived(Bytes),
    ConnectionChanged(bool),
}

/// Sending half held by a transport
pub type EventSender = mpsc::UnboundedSender<TransportEvent>;
/// Receiving half handed to the router
pub type EventReceiver = mpsc::UnboundedReceiver<TransportEvent>;

/// Channel a transport creates at construction.
///
/// The transport keeps the sender; the receiver can be taken exactly once.
#[derive(Debug)]
pub struct EventChannel {
    tx: EventSender,
    rx: Option<EventReceiver>,
}

impl EventChannel {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx: Some(rx) }
    }

    pub fn sender(&self) -> EventSender {
        self.tx.clone()
    }

    pub fn take(&mut self) -> Option<EventReceiver> {
        self.rx.take()
    }

    /// Push an event; a dropped receiver just means nobody is listening
    pub fn emit(&self, event: TransportEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Capability every physical medium binding implements.
///
/// Contract:
/// - `start` fails with `AlreadyStarted` on a second call for the same instance
/// - `send` fails with `NotConnected` before a successful `start` and after `stop`
/// - after `stop` returns, the instance emits no further `DataReceived` events
#[async_trait]
pub trait Transport: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Take the event stream. Returns `None` after the first call.
    fn take_events(&mut self) -> Option<EventReceiver>;

    async fn start(&mut self) -> Result<()>;

    async fn stop(&mut self) -> Result<()>;

    async fn send(&self, data: &[u8]) -> Result<()>;

    fn is_connected(&self) -> bool;
}
