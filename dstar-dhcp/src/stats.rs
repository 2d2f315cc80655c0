//! Per-action protocol counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters updated by the starvation action
#[derive(Debug, Default)]
pub struct StarvationStats {
    pub discovers_sent: AtomicU64,
    pub offers_received: AtomicU64,
    pub requests_sent: AtomicU64,
    pub leases_acquired: AtomicU64,
    pub naks_received: AtomicU64,
    pub send_errors: AtomicU64,
    /// Replies whose xid did not match the pending attempt
    pub stale_replies: AtomicU64,
}

/// Point-in-time copy of [`StarvationStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StarvationStatsSnapshot {
    pub discovers_sent: u64,
    pub offers_received: u64,
    pub requests_sent: u64,
    pub leases_acquired: u64,
    pub naks_received: u64,
    pub send_errors: u64,
    pub stale_replies: u64,
    pub attempts_abandoned: u64,
}

impl StarvationStats {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the counters; `attempts_abandoned` comes from the correlator
    pub fn snapshot(&self, attempts_abandoned: u64) -> StarvationStatsSnapshot {
        StarvationStatsSnapshot {
            discovers_sent: self.discovers_sent.load(Ordering::Relaxed),
            offers_received: self.offers_received.load(Ordering::Relaxed),
            requests_sent: self.requests_sent.load(Ordering::Relaxed),
            leases_acquired: self.leases_acquired.load(Ordering::Relaxed),
            naks_received: self.naks_received.load(Ordering::Relaxed),
            send_errors: self.send_errors.load(Ordering::Relaxed),
            stale_replies: self.stale_replies.load(Ordering::Relaxed),
            attempts_abandoned,
        }
    }
}

impl StarvationStatsSnapshot {
    /// Packets this action put on the wire
    pub fn packets_sent(&self) -> u64 {
        self.discovers_sent + self.requests_sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let stats = StarvationStats::default();
        StarvationStats::bump(&stats.discovers_sent);
        StarvationStats::bump(&stats.discovers_sent);
        StarvationStats::bump(&stats.requests_sent);
        StarvationStats::bump(&stats.stale_replies);

        let snapshot = stats.snapshot(3);
        assert_eq!(snapshot.discovers_sent, 2);
        assert_eq!(snapshot.packets_sent(), 3);
        assert_eq!(snapshot.stale_replies, 1);
        assert_eq!(snapshot.attempts_abandoned, 3);
        assert_eq!(snapshot.leases_acquired, 0);
    }
}
