//! Per-module connection lifecycle.
//!
//! [`ModuleRecord`] is a plain state machine: every method takes the observation
//! time explicitly and never reads a clock, so the coordinator drives it from live
//! traffic and tests drive it with synthetic instants.
//!
//! ```text
//! Disconnected --start--> Connecting --hello--> Ready
//!                              |          \--hello (two-phase)--> HelloReceived --ack/hello--> Ready
//! active --no hello within hello timeout--> TimedOut --hello--> Ready
//! Ready  --no data within data window-----> TimedOut
//! active --link lost--> Error --link back--> Connecting
//! any    --reset/stop--> Disconnected
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

use crate::protocol::hello::HelloPhase;
use crate::protocol::module::ModuleKind;
use crate::transport::TransportKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    /// Hello seen, capability acknowledgement outstanding
    HelloReceived,
    Ready,
    TimedOut,
    Error,
}

impl ConnectionState {
    /// States in which the hello watchdog runs
    pub fn is_active(self) -> bool {
        matches!(
            self,
            ConnectionState::Connecting | ConnectionState::HelloReceived | ConnectionState::Ready
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::HelloReceived => "hello-received",
            ConnectionState::Ready => "ready",
            ConnectionState::TimedOut => "timed-out",
            ConnectionState::Error => "error",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub from: ConnectionState,
    pub to: ConnectionState,
}

/// Which deadline expired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutCause {
    Hello,
    Data,
}

/// Read-only view of a module record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleStatus {
    pub module: ModuleKind,
    pub state: ConnectionState,
    pub transport: Option<TransportKind>,
    pub last_hello_at: Option<Instant>,
    pub last_data_at: Option<Instant>,
    pub hello_version: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct ModuleRecord {
    module: ModuleKind,
    state: ConnectionState,
    transport: Option<TransportKind>,
    last_hello_at: Option<Instant>,
    last_data_at: Option<Instant>,
    /// Start of the current connection attempt
    started_at: Option<Instant>,
    ready_at: Option<Instant>,
    hello_version: Option<u8>,
}

impl ModuleRecord {
    pub fn new(module: ModuleKind) -> Self {
        Self {
            module,
            state: ConnectionState::Disconnected,
            transport: None,
            last_hello_at: None,
            last_data_at: None,
            started_at: None,
            ready_at: None,
            hello_version: None,
        }
    }

    pub fn module(&self) -> ModuleKind {
        self.module
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn last_hello_at(&self) -> Option<Instant> {
        self.last_hello_at
    }

    pub fn last_data_at(&self) -> Option<Instant> {
        self.last_data_at
    }

    pub fn status(&self) -> ModuleStatus {
        ModuleStatus {
            module: self.module,
            state: self.state,
            transport: self.transport,
            last_hello_at: self.last_hello_at,
            last_data_at: self.last_data_at,
            hello_version: self.hello_version,
        }
    }

    fn transition(&mut self, to: ConnectionState) -> Option<StateChange> {
        let from = self.state;
        if from == to {
            return None;
        }
        self.state = to;
        Some(StateChange { from, to })
    }

    fn enter_ready(&mut self, now: Instant) -> Option<StateChange> {
        self.ready_at = Some(now);
        self.transition(ConnectionState::Ready)
    }

    /// A transport start was issued for this module
    pub fn transport_starting(&mut self, kind: TransportKind, now: Instant) -> Option<StateChange> {
        self.transport = Some(kind);
        self.started_at = Some(now);
        self.ready_at = None;
        self.transition(ConnectionState::Connecting)
    }

    pub fn transport_failed(&mut self) -> Option<StateChange> {
        self.transport = None;
        self.transition(ConnectionState::Error)
    }

    /// Medium reported a connectivity flip
    pub fn link_changed(&mut self, connected: bool, now: Instant) -> Option<StateChange> {
        match (connected, self.state) {
            (false, s) if s.is_active() || s == ConnectionState::TimedOut => {
                self.transition(ConnectionState::Error)
            }
            (true, ConnectionState::Error) if self.transport.is_some() => {
                self.started_at = Some(now);
                self.ready_at = None;
                self.transition(ConnectionState::Connecting)
            }
            _ => None,
        }
    }

    /// Hello from the module. Ignored while no attempt is in progress.
    pub fn hello(
        &mut self,
        version: u8,
        now: Instant,
        two_phase_min_version: Option<u8>,
    ) -> Option<StateChange> {
        match self.state {
            ConnectionState::Disconnected | ConnectionState::Error => None,
            ConnectionState::Connecting | ConnectionState::TimedOut => {
                self.last_hello_at = Some(now);
                self.hello_version = Some(version);
                match HelloPhase::classify(version, two_phase_min_version) {
                    HelloPhase::SinglePhase => self.enter_ready(now),
                    HelloPhase::TwoPhase => self.transition(ConnectionState::HelloReceived),
                }
            }
            // A repeated hello completes a pending capability exchange
            ConnectionState::HelloReceived => {
                self.last_hello_at = Some(now);
                self.hello_version = Some(version);
                self.enter_ready(now)
            }
            ConnectionState::Ready => {
                self.last_hello_at = Some(now);
                self.hello_version = Some(version);
                None
            }
        }
    }

    /// Well-formed non-hello traffic. Returns whether it was recorded.
    pub fn data(&mut self, now: Instant) -> bool {
        let accepted = self.state.is_active() || self.state == ConnectionState::TimedOut;
        if accepted {
            self.last_data_at = Some(now);
        }
        accepted
    }

    pub fn acknowledge_capabilities(&mut self, now: Instant) -> Option<StateChange> {
        if self.state == ConnectionState::HelloReceived {
            self.enter_ready(now)
        } else {
            None
        }
    }

    /// Apply the hello and data deadlines at `now`.
    ///
    /// Absent timestamps count from the start of the attempt (hello) or from the
    /// moment the module became ready (data).
    pub fn check_timeouts(
        &mut self,
        now: Instant,
        hello_timeout: Duration,
        data_timeout: Duration,
    ) -> Option<TimeoutCause> {
        if !self.state.is_active() {
            return None;
        }

        let hello_ref = latest(self.last_hello_at, self.started_at);
        if elapsed_beyond(now, hello_ref, hello_timeout) {
            self.transition(ConnectionState::TimedOut);
            return Some(TimeoutCause::Hello);
        }

        if self.state == ConnectionState::Ready {
            let data_ref = latest(self.last_data_at, self.ready_at);
            if elapsed_beyond(now, data_ref, data_timeout) {
                self.transition(ConnectionState::TimedOut);
                return Some(TimeoutCause::Data);
            }
        }
        None
    }

    /// Back to `Disconnected` with both timestamps cleared
    pub fn reset(&mut self) -> Option<StateChange> {
        self.transport = None;
        self.last_hello_at = None;
        self.last_data_at = None;
        self.started_at = None;
        self.ready_at = None;
        self.hello_version = None;
        self.transition(ConnectionState::Disconnected)
    }
}

fn latest(a: Option<Instant>, b: Option<Instant>) -> Option<Instant> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

fn elapsed_beyond(now: Instant, since: Option<Instant>, limit: Duration) -> bool {
    since.is_some_and(|t| now.saturating_duration_since(t) > limit)
}
