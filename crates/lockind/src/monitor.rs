//! Process monitoring for the LockIn daemon.
//!
//! Tracks CPU and memory usage of the daemon process, providing:
//! - Periodic logging of resource usage and live session count
//! - Alerts when thresholds are exceeded
//!
//! Camera capture runs one blocking thread per connection, so resource
//! pressure scales with the session count; the log lines carry both so
//! the two can be read together.
//!
//! # Panic-Free Guarantees
//!
//! All code follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Uses pattern matching and `unwrap_or` for fallible operations

use std::process;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sysinfo::{Pid, System};
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Memory usage warning threshold in MB.
///
/// Higher than a plain socket daemon would need: per-connection capture
/// buffers and preview frames are part of normal operation.
pub const HIGH_MEMORY_THRESHOLD_MB: u64 = 256;

/// CPU usage warning threshold (percentage).
pub const HIGH_CPU_THRESHOLD_PERCENT: f32 = 80.0;

/// How often to sample metrics.
pub const METRICS_INTERVAL: Duration = Duration::from_secs(30);

/// Current process metrics snapshot.
#[derive(Debug, Clone, Default)]
pub struct ProcessMetrics {
    /// Memory usage in megabytes
    pub memory_mb: u64,

    /// CPU usage as percentage (0.0 - 100.0+)
    pub cpu_percent: f32,

    /// Whether memory is above threshold
    pub memory_high: bool,

    /// Whether CPU is above threshold
    pub cpu_high: bool,
}

impl ProcessMetrics {
    /// Returns true if any metric is above its threshold.
    pub fn is_any_high(&self) -> bool {
        self.memory_high || self.cpu_high
    }
}

/// Process monitor for tracking daemon resource usage.
///
/// Uses the `sysinfo` crate to query process metrics.
/// The monitor must be refreshed before reading metrics.
pub struct ProcessMonitor {
    system: System,
    pid: Pid,
    memory_threshold_mb: u64,
    cpu_threshold_percent: f32,
}

impl ProcessMonitor {
    /// Creates a new process monitor for the current process.
    pub fn new() -> Self {
        Self::with_thresholds(HIGH_MEMORY_THRESHOLD_MB, HIGH_CPU_THRESHOLD_PERCENT)
    }

    /// Creates a process monitor with custom thresholds.
    pub fn with_thresholds(memory_threshold_mb: u64, cpu_threshold_percent: f32) -> Self {
        Self {
            system: System::new(),
            pid: Pid::from_u32(process::id()),
            memory_threshold_mb,
            cpu_threshold_percent,
        }
    }

    /// Refreshes process information and returns current metrics.
    ///
    /// sysinfo needs a previous refresh as the baseline for CPU usage,
    /// so the first call after construction reports 0% CPU. For
    /// periodic monitoring each tick serves as the next baseline.
    ///
    /// `refresh_all()` is required here: refreshing a single process
    /// does not compute CPU% correctly.
    pub fn refresh(&mut self) -> ProcessMetrics {
        self.system.refresh_all();

        let (memory_bytes, cpu_percent) = self
            .system
            .process(self.pid)
            .map(|p| (p.memory(), p.cpu_usage()))
            .unwrap_or((0, 0.0));

        let memory_mb = memory_bytes / 1024 / 1024;
        let memory_high = memory_mb > self.memory_threshold_mb;
        let cpu_high = cpu_percent > self.cpu_threshold_percent;

        ProcessMetrics {
            memory_mb,
            cpu_percent,
            memory_high,
            cpu_high,
        }
    }

    /// Returns the current memory threshold in MB.
    pub fn memory_threshold_mb(&self) -> u64 {
        self.memory_threshold_mb
    }

    /// Returns the current CPU threshold as percentage.
    pub fn cpu_threshold_percent(&self) -> f32 {
        self.cpu_threshold_percent
    }
}

impl Default for ProcessMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the resource monitoring task.
///
/// This task periodically logs resource usage alongside the live
/// session count and warns when thresholds are exceeded. Uses
/// cooperative shutdown via CancellationToken.
pub fn spawn_resource_monitor(
    cancel_token: CancellationToken,
    active_sessions: Arc<AtomicUsize>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut monitor = ProcessMonitor::new();
        let mut tick = interval(METRICS_INTERVAL);

        // Initial refresh to establish baseline for CPU calculation
        let _ = monitor.refresh();

        info!(
            memory_threshold_mb = monitor.memory_threshold_mb(),
            cpu_threshold_percent = monitor.cpu_threshold_percent(),
            interval_secs = METRICS_INTERVAL.as_secs(),
            "Resource monitor started"
        );

        loop {
            tokio::select! {
                biased;

                _ = cancel_token.cancelled() => {
                    info!("Resource monitor shutting down");
                    break;
                }

                _ = tick.tick() => {
                    let metrics = monitor.refresh();
                    let sessions = active_sessions.load(Ordering::Relaxed);
                    log_metrics(&metrics, &monitor, sessions);
                }
            }
        }

        debug!("Resource monitor task completed");
    })
}

/// Logs current metrics, warning if thresholds are exceeded.
fn log_metrics(metrics: &ProcessMetrics, monitor: &ProcessMonitor, sessions: usize) {
    if metrics.memory_high {
        warn!(
            memory_mb = metrics.memory_mb,
            threshold_mb = monitor.memory_threshold_mb(),
            cpu_percent = format!("{:.1}", metrics.cpu_percent),
            sessions,
            "HIGH MEMORY: Daemon memory usage above threshold"
        );
    } else if metrics.cpu_high {
        warn!(
            memory_mb = metrics.memory_mb,
            cpu_percent = format!("{:.1}", metrics.cpu_percent),
            threshold_percent = monitor.cpu_threshold_percent(),
            sessions,
            "HIGH CPU: Daemon CPU usage above threshold"
        );
    } else {
        info!(
            memory_mb = metrics.memory_mb,
            cpu_percent = format!("{:.1}", metrics.cpu_percent),
            sessions,
            "Daemon resource usage"
        );
    }
}
