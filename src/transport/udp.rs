//! UDP/Ethernet transport.
//!
//! Each module binds its own local port (9999 steering, 9998 implement, 9997 IMU
//! by default) and sends to the module-side destination, normally the subnet
//! broadcast address. Every datagram is reported as one `DataReceived` event.

use async_trait::async_trait;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use crate::config::UdpConfig;
use crate::core::frame::{FRAME_OVERHEAD, MAX_PAYLOAD_LEN};
use crate::error::{constants, AgioError, Result};
use crate::protocol::module::ModuleKind;
use crate::transport::{EventChannel, EventReceiver, Transport, TransportEvent, TransportKind};

/// Largest datagram worth reading; anything longer cannot be a frame
const RECV_BUFFER_LEN: usize = FRAME_OVERHEAD + MAX_PAYLOAD_LEN;

struct Running {
    socket: Arc<UdpSocket>,
    receiver: JoinHandle<()>,
    cancel: CancellationToken,
}

pub struct UdpTransport {
    module: ModuleKind,
    config: UdpConfig,
    events: EventChannel,
    running: Option<Running>,
    connected: Arc<AtomicBool>,
}

impl UdpTransport {
    pub fn new(module: ModuleKind, config: UdpConfig) -> Self {
        Self {
            module,
            config,
            events: EventChannel::new(),
            running: None,
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Address the socket is bound to, once started
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running
            .as_ref()
            .and_then(|r| r.socket.local_addr().ok())
    }

    pub fn remote(&self) -> SocketAddr {
        self.config.remote
    }
}

#[async_trait]
impl Transport for UdpTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Udp
    }

    fn take_events(&mut self) -> Option<EventReceiver> {
        self.events.take()
    }

    #[instrument(skip(self), fields(module = %self.module))]
    async fn start(&mut self) -> Result<()> {
        if self.running.is_some() {
            return Err(AgioError::AlreadyStarted);
        }
        let port = self.config.local_port(self.module);
        if port == 0 {
            return Err(AgioError::InvalidConfiguration(
                constants::ERR_UDP_PORT_UNSET.to_string(),
            ));
        }

        let socket = UdpSocket::bind(SocketAddr::new(self.config.bind_ip, port)).await?;
        if self.config.broadcast {
            socket.set_broadcast(true)?;
        }
        let socket = Arc::new(socket);
        let cancel = CancellationToken::new();

        let receiver = {
            let socket = Arc::clone(&socket);
            let token = cancel.clone();
            let events = self.events.sender();
            let module = self.module;
            tokio::spawn(async move {
                let mut buf = vec![0u8; RECV_BUFFER_LEN];
                loop {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        result = socket.recv_from(&mut buf) => match result {
                            Ok((n, peer)) => {
                                trace!(%module, %peer, bytes = n, "Datagram received");
                                let data = Bytes::copy_from_slice(&buf[..n]);
                                if events.send(TransportEvent::DataReceived(data)).is_err() {
                                    break;
                                }
                            }
                            // ICMP unreachable surfaces here on some platforms; keep reading
                            Err(e) => debug!(%module, error = %e, "UDP receive error"),
                        },
                    }
                }
            })
        };

        self.connected.store(true, Ordering::SeqCst);
        self.events.emit(TransportEvent::ConnectionChanged(true));
        info!(port, remote = %self.config.remote, "UDP transport bound");

        self.running = Some(Running {
            socket,
            receiver,
            cancel,
        });
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };
        running.cancel.cancel();
        if let Err(e) = running.receiver.await {
            warn!(module = %self.module, error = %e, "UDP receive task ended abnormally");
        }
        if self.connected.swap(false, Ordering::SeqCst) {
            self.events.emit(TransportEvent::ConnectionChanged(false));
        }
        info!(module = %self.module, "UDP transport closed");
        Ok(())
    }

    async fn send(&self, data: &[u8]) -> Result<()> {
        let running = self.running.as_ref().ok_or(AgioError::NotConnected)?;
        let sent = running.socket.send_to(data, self.config.remote).await?;
        if sent != data.len() {
            return Err(AgioError::TransportError(format!(
                "Short UDP send: {sent} of {} bytes",
                data.len()
            )));
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
