//! Attack traits and types
//!
//! Every traffic-generating component implements the [`Attack`] trait and is
//! driven through a uniform lifecycle: spawn exactly one background worker,
//! poll the shared running flag cooperatively, and either self-terminate (by
//! storing `running = false` and returning) or get stopped from outside.

use crate::{Interface, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

/// Attack trait that all attack variants implement
#[async_trait]
pub trait Attack: Send + Sync {
    /// Execute the attack.
    ///
    /// This is the main attack logic. It runs as a single background worker
    /// and must poll `ctx.running` at loop-iteration granularity to allow
    /// clean shutdown. Attacks that complete on their own (bounded device
    /// counts, bounded cycles) store `running = false` before returning.
    async fn execute(&self, ctx: AttackContext) -> Result<()>;

    /// Get attack name
    fn name(&self) -> &str;
}

/// Attack context passed to the execute method
pub struct AttackContext {
    /// Interface to send packets on
    pub interface: Interface,
    /// Running flag (attack should stop when this is false)
    pub running: Arc<AtomicBool>,
    /// Statistics counters
    pub stats: Arc<AttackStatsCounters>,
}

impl AttackContext {
    /// Create a context with a fresh running flag set to true
    pub fn new(interface: Interface) -> Self {
        Self {
            interface,
            running: Arc::new(AtomicBool::new(true)),
            stats: Arc::new(AttackStatsCounters::default()),
        }
    }
}

/// Attack statistics snapshot
#[derive(Debug, Clone, Default)]
pub struct AttackStats {
    /// Packets sent
    pub packets_sent: u64,
    /// Errors encountered
    pub errors: u64,
    /// When the attack started
    pub started_at: Option<SystemTime>,
    /// Duration in seconds (once finished)
    pub duration_secs: Option<u64>,
    /// Is the attack currently running?
    pub is_running: bool,
}

/// Thread-safe attack statistics counters
#[derive(Debug, Default)]
pub struct AttackStatsCounters {
    pub packets_sent: AtomicU64,
    pub errors: AtomicU64,
}

impl AttackStatsCounters {
    pub fn increment_packets_sent(&self) {
        self.packets_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_errors(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn to_stats(&self, started_at: SystemTime, running: bool) -> AttackStats {
        let duration_secs = if !running {
            SystemTime::now()
                .duration_since(started_at)
                .ok()
                .map(|d| d.as_secs())
        } else {
            None
        };

        AttackStats {
            packets_sent: self.packets_sent.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            started_at: Some(started_at),
            duration_secs,
            is_running: running,
        }
    }
}

/// Handle to a running attack
pub struct AttackHandle {
    /// Attack instance ID (UUID v7 for time-ordered tracking)
    pub id: uuid::Uuid,
    /// Attack name
    pub attack_name: String,
    /// Running flag
    pub running: Arc<AtomicBool>,
    /// Statistics
    pub stats: Arc<AttackStatsCounters>,
    /// Start time
    pub started_at: SystemTime,
    /// Worker task handle
    pub task_handle: Option<tokio::task::JoinHandle<Result<()>>>,
}

impl AttackHandle {
    /// Request the attack to stop (cooperative; the worker observes the flag)
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Is the worker loop still running?
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Get current statistics
    pub fn stats(&self) -> AttackStats {
        self.stats.to_stats(self.started_at, self.is_running())
    }
}
