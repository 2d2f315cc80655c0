//! Attack traits and types

use crate::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

/// Long-running attack driven by the executor
#[async_trait]
pub trait Attack: Send + Sync {
    /// Execute the attack
    ///
    /// Runs until the context's running flag is cleared or the attack
    /// reaches its own stop condition.
    async fn execute(&self, ctx: AttackContext) -> Result<()>;

    /// Get attack name
    fn name(&self) -> &str;
}

/// Attack statistics
#[derive(Debug, Clone, Default)]
pub struct AttackStats {
    /// Packets sent
    pub packets_sent: u64,
    /// Packets received and dispatched to actions
    pub packets_received: u64,
    /// Leases acquired
    pub leases_acquired: u64,
    /// Errors encountered
    pub errors: u64,
    /// When the attack started
    pub started_at: Option<SystemTime>,
    /// Duration in seconds (if finished)
    pub duration_secs: Option<u64>,
    /// Is the attack currently running?
    pub is_running: bool,
}

/// Attack context passed to the execute method
#[derive(Clone)]
pub struct AttackContext {
    /// Running flag (attack should stop when this is false)
    pub running: Arc<AtomicBool>,
    /// Statistics counters
    pub stats: Arc<AttackStatsCounters>,
}

impl AttackContext {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
            stats: Arc::new(AttackStatsCounters::default()),
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

impl Default for AttackContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe attack statistics counters
#[derive(Debug, Default)]
pub struct AttackStatsCounters {
    pub packets_sent: AtomicU64,
    pub packets_received: AtomicU64,
    pub leases_acquired: AtomicU64,
    pub errors: AtomicU64,
}

impl AttackStatsCounters {
    pub fn increment_packets_sent(&self) {
        self.packets_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_packets_received(&self) {
        self.packets_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_errors(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Overwrite the lease counter with the pool's current size
    pub fn set_leases_acquired(&self, leases: u64) {
        self.leases_acquired.store(leases, Ordering::Relaxed);
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
            packets_received: self.packets_received.load(Ordering::Relaxed),
            leases_acquired: self.leases_acquired.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            started_at: Some(started_at),
            duration_secs,
            is_running: running,
        }
    }
}

/// Handle to a running attack
pub struct AttackHandle {
    /// Attack ID (UUID v7 for time-ordered tracking)
    pub id: uuid::Uuid,
    /// Attack name
    pub attack_name: String,
    /// Running flag
    pub running: Arc<AtomicBool>,
    /// Statistics
    pub stats: Arc<AttackStatsCounters>,
    /// Start time
    pub started_at: SystemTime,
    /// Task handle (for async runtime)
    pub task_handle: Option<tokio::task::JoinHandle<Result<()>>>,
}

impl AttackHandle {
    /// Ask the attack to stop; it exits at its next check of the flag
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Get current statistics
    pub fn stats(&self) -> AttackStats {
        self.stats.to_stats(self.started_at, self.is_running())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_to_stats() {
        let counters = AttackStatsCounters::default();
        counters.increment_packets_sent();
        counters.increment_packets_sent();
        counters.increment_packets_received();
        counters.increment_errors();
        counters.set_leases_acquired(4);

        let stats = counters.to_stats(SystemTime::now(), true);
        assert_eq!(stats.packets_sent, 2);
        assert_eq!(stats.packets_received, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.leases_acquired, 4);
        assert!(stats.is_running);
        assert_eq!(stats.duration_secs, None);

        let finished = counters.to_stats(SystemTime::now(), false);
        assert_eq!(finished.duration_secs, Some(0));
    }

    #[test]
    fn test_context_stop() {
        let ctx = AttackContext::new();
        let clone = ctx.clone();
        assert!(ctx.is_running());
        clone.stop();
        assert!(!ctx.is_running());
    }
}
