//! Shared engine for byte-stream media.
//!
//! Bluetooth, CAN and radio modules all present as an ordered byte stream once the
//! platform has opened the link. The platform supplies that stream through a
//! [`LinkDriver`]; this module frames it with [`PgnFrameCodec`], pushes frames into
//! the transport's event channel and serializes writes.

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, WriteHalf};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::{BluetoothMode, RadioType};
use crate::core::codec::PgnFrameCodec;
use crate::error::{constants, AgioError, Result};
use crate::transport::{EventChannel, EventReceiver, EventSender, TransportEvent, TransportKind};

/// Bidirectional byte stream opened by a driver
pub trait LinkStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T> LinkStream for T where T: AsyncRead + AsyncWrite + Send + Unpin {}

pub type BoxedLink = Box<dyn LinkStream>;

/// Fully validated parameters a driver needs to open a link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    Bluetooth {
        address: String,
        mode: BluetoothMode,
    },
    Can {
        adapter: String,
        baud_rate: u32,
    },
    Radio {
        radio_type: RadioType,
        frequency_khz: u32,
        power_dbm: i8,
    },
}

/// Platform access to a native medium
#[async_trait]
pub trait LinkDriver: Send + Sync {
    async fn open(&self, target: &LinkTarget) -> Result<BoxedLink>;
}

/// One open link: a framing reader task and a locked writer
struct LinkSession {
    writer: Mutex<WriteHalf<BoxedLink>>,
    reader: JoinHandle<()>,
    cancel: CancellationToken,
}

impl LinkSession {
    fn spawn(link: BoxedLink, events: EventSender, connected: Arc<AtomicBool>) -> Self {
        let (read_half, write_half) = tokio::io::split(link);
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let reader = tokio::spawn(async move {
            let mut frames = FramedRead::new(read_half, PgnFrameCodec);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return,
                    next = frames.next() => match next {
                        Some(Ok(frame)) => {
                            trace!(bytes = frame.len(), "Link frame received");
                            let _ = events.send(TransportEvent::DataReceived(frame));
                        }
                        Some(Err(e)) => {
                            warn!(error = %e, "Link read failed");
                            break;
                        }
                        None => {
                            debug!("{}", constants::ERR_LINK_CLOSED);
                            break;
                        }
                    },
                }
            }
            connected.store(false, Ordering::SeqCst);
            let _ = events.send(TransportEvent::ConnectionChanged(false));
        });

        Self {
            writer: Mutex::new(write_half),
            reader,
            cancel,
        }
    }

    async fn send(&self, data: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(data).await?;
        writer.flush().await?;
        Ok(())
    }

    async fn close(self) {
        self.cancel.cancel();
        let _ = self.reader.await;
        let mut writer = self.writer.into_inner();
        if let Err(e) = writer.shutdown().await {
            debug!(error = %e, "Link shutdown reported an error");
        }
    }
}

/// State common to every driver-backed transport
pub(crate) struct LinkCore {
    kind: TransportKind,
    driver: Option<Arc<dyn LinkDriver>>,
    events: EventChannel,
    session: Option<LinkSession>,
    connected: Arc<AtomicBool>,
}

impl LinkCore {
    pub(crate) fn new(kind: TransportKind, driver: Option<Arc<dyn LinkDriver>>) -> Self {
        Self {
            kind,
            driver,
            events: EventChannel::new(),
            session: None,
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn kind(&self) -> TransportKind {
        self.kind
    }

    pub(crate) fn take_events(&mut self) -> Option<EventReceiver> {
        self.events.take()
    }

    /// Driver availability is checked before the target is resolved
    pub(crate) async fn start<F>(&mut self, unsupported: &str, target: F) -> Result<()>
    where
        F: FnOnce() -> Result<LinkTarget>,
    {
        if self.session.is_some() {
            return Err(AgioError::AlreadyStarted);
        }
        let driver = self
            .driver
            .clone()
            .ok_or_else(|| AgioError::NotSupportedOnPlatform(unsupported.to_string()))?;
        let target = target()?;

        let link = driver.open(&target).await?;
        self.connected.store(true, Ordering::SeqCst);
        self.events.emit(TransportEvent::ConnectionChanged(true));
        self.session = Some(LinkSession::spawn(
            link,
            self.events.sender(),
            Arc::clone(&self.connected),
        ));
        info!(kind = %self.kind, ?target, "Link opened");
        Ok(())
    }

    pub(crate) async fn stop(&mut self) -> Result<()> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        session.close().await;
        if self.connected.swap(false, Ordering::SeqCst) {
            self.events.emit(TransportEvent::ConnectionChanged(false));
        }
        info!(kind = %self.kind, "Link closed");
        Ok(())
    }

    pub(crate) async fn send(&self, data: &[u8]) -> Result<()> {
        let session = self.session.as_ref().ok_or(AgioError::NotConnected)?;
        // Session still held but the reader has seen the stream end
        if !self.connected.load(Ordering::SeqCst) {
            return Err(AgioError::TransportError(
                constants::ERR_LINK_CLOSED.to_string(),
            ));
        }
        session.send(data).await
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
