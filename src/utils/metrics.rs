//! Observability and Metrics
//!
//! Counters for frame traffic, module lifecycle and transport health.
//!
//! Uses atomic counters for thread-safe metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Global metrics collector for the I/O core
#[derive(Debug)]
pub struct Metrics {
    /// Frames handed to a transport
    pub frames_sent: AtomicU64,
    /// Well-formed frames received
    pub frames_received: AtomicU64,
    /// Inbound byte runs that failed structural or CRC checks
    pub frames_rejected: AtomicU64,
    pub bytes_sent: AtomicU64,
    pub bytes_received: AtomicU64,
    /// Module hellos processed
    pub hellos_received: AtomicU64,
    /// Transitions into Ready
    pub modules_ready: AtomicU64,
    /// Hello or data timeouts
    pub module_timeouts: AtomicU64,
    pub transport_starts: AtomicU64,
    pub transport_failures: AtomicU64,
    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            frames_sent: AtomicU64::new(0),
            frames_received: AtomicU64::new(0),
            frames_rejected: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            hellos_received: AtomicU64::new(0),
            modules_ready: AtomicU64::new(0),
            module_timeouts: AtomicU64::new(0),
            transport_starts: AtomicU64::new(0),
            transport_failures: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record an outbound frame
    pub fn frame_sent(&self, byte_count: u64) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Record a well-formed inbound frame
    pub fn frame_received(&self, byte_count: u64) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn frame_rejected(&self) {
        self.frames_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hello_received(&self) {
        self.hellos_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn module_ready(&self) {
        self.modules_ready.fetch_add(1, Ordering::Relaxed);
    }

    pub fn module_timed_out(&self) {
        self.module_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn transport_started(&self) {
        self.transport_starts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn transport_failed(&self) {
        self.transport_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_rejected: self.frames_rejected.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            hellos_received: self.hellos_received.load(Ordering::Relaxed),
            modules_ready: self.modules_ready.load(Ordering::Relaxed),
            module_timeouts: self.module_timeouts.load(Ordering::Relaxed),
            transport_starts: self.transport_starts.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            frames_sent = snapshot.frames_sent,
            frames_received = snapshot.frames_received,
            frames_rejected = snapshot.frames_rejected,
            bytes_sent = snapshot.bytes_sent,
            bytes_received = snapshot.bytes_received,
            hellos_received = snapshot.hellos_received,
            modules_ready = snapshot.modules_ready,
            module_timeouts = snapshot.module_timeouts,
            transport_starts = snapshot.transport_starts,
            transport_failures = snapshot.transport_failures,
            uptime_seconds = snapshot.uptime_seconds,
            "I/O core metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub frames_sent: u64,
    pub frames_received: u64,
    pub frames_rejected: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub hellos_received: u64,
    pub modules_ready: u64,
    pub module_timeouts: u64,
    pub transport_starts: u64,
    pub transport_failures: u64,
    pub uptime_seconds: u64,
}

static METRICS: once_cell::sync::Lazy<Metrics> = once_cell::sync::Lazy::new(Metrics::new);

/// Get the global metrics instance
pub fn global_metrics() -> &'static Metrics {
    &METRICS
}

/// Initialize metrics collection (call once at startup)
pub fn init_metrics() {
    let _ = global_metrics();
    info!("Metrics collection initialized");
}

/// Logs how long an operation took when dropped
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        debug!(
            operation = self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
    }
}
