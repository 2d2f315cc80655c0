//! Single-flight transaction correlation
//!
//! A [`TransactionCorrelator`] owns the one "current transaction id" slot of
//! an action. The send path reserves the slot with
//! [`TransactionCorrelator::begin_attempt`] and publishes the id it sent with
//! [`AttemptSlot::commit`]; the receive path claims matching replies with
//! [`TransactionCorrelator::try_match`] and frees the slot with
//! [`MatchedAttempt::complete`].
//!
//! Both guards hold the correlator lock for as long as they live, so no
//! reply can be matched while a new id is being published and no two
//! replies are processed at once.

use crate::Xid;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// How long a new attempt waits for the previous one before abandoning it
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

type Slot = Option<NonZeroU32>;

pub struct TransactionCorrelator {
    current: Mutex<Slot>,
    released: Condvar,
    timeout: Duration,
    abandoned: AtomicU64,
}

impl TransactionCorrelator {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_ATTEMPT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            current: Mutex::new(None),
            released: Condvar::new(),
            timeout,
            abandoned: AtomicU64::new(0),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Id of the attempt in flight, if any
    pub fn pending(&self) -> Option<u32> {
        self.current.lock().map(NonZeroU32::get)
    }

    /// Number of attempts dropped because they outlived the timeout
    pub fn abandoned(&self) -> u64 {
        self.abandoned.load(Ordering::Relaxed)
    }

    /// Wait until no attempt is in flight and reserve the slot.
    ///
    /// Blocks at most [`timeout`](Self::timeout), measured from entry. If the
    /// previous attempt is still pending at the deadline it is abandoned and
    /// the slot is taken anyway. A timeout too large to express as an
    /// `Instant` waits for the pending attempt without a deadline.
    pub fn begin_attempt(&self) -> AttemptSlot<'_> {
        let deadline = Instant::now().checked_add(self.timeout);
        let mut current = self.current.lock();

        while current.is_some() {
            let Some(deadline) = deadline else {
                self.released.wait(&mut current);
                continue;
            };
            if self.released.wait_until(&mut current, deadline).timed_out() {
                if let Some(stale) = current.take() {
                    self.abandoned.fetch_add(1, Ordering::Relaxed);
                    debug!(xid = %Xid(stale.get()), "Attempt timed out, abandoning");
                }
                break;
            }
        }

        AttemptSlot { current }
    }

    /// Claim the pending attempt if `xid` is its id.
    ///
    /// Returns `None` for zero, for foreign ids and when nothing is pending.
    pub fn try_match(&self, xid: u32) -> Option<MatchedAttempt<'_>> {
        let wanted = NonZeroU32::new(xid)?;
        let current = self.current.lock();

        if *current == Some(wanted) {
            Some(MatchedAttempt {
                current,
                released: &self.released,
                xid: wanted,
            })
        } else {
            None
        }
    }
}

impl Default for TransactionCorrelator {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive, idle correlator slot returned by
/// [`TransactionCorrelator::begin_attempt`].
///
/// Dropping it without committing leaves the correlator idle.
#[must_use = "an uncommitted slot leaves the correlator idle"]
pub struct AttemptSlot<'a> {
    current: MutexGuard<'a, Slot>,
}

impl AttemptSlot<'_> {
    /// Mark `xid` as the attempt in flight and release the lock.
    ///
    /// Committing zero leaves the correlator idle.
    pub fn commit(mut self, xid: u32) {
        *self.current = NonZeroU32::new(xid);
    }
}

/// Exclusive access to the attempt a reply belongs to.
///
/// Dropping it releases the lock and leaves the attempt pending.
pub struct MatchedAttempt<'a> {
    current: MutexGuard<'a, Slot>,
    released: &'a Condvar,
    xid: NonZeroU32,
}

impl MatchedAttempt<'_> {
    pub fn xid(&self) -> u32 {
        self.xid.get()
    }

    /// End the attempt and wake every sender waiting for the slot
    pub fn complete(mut self) {
        *self.current = None;
        self.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_idle_begin_does_not_wait() {
        let correlator = TransactionCorrelator::new();
        let start = Instant::now();
        correlator.begin_attempt().commit(0x1234);

        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(correlator.pending(), Some(0x1234));
    }

    #[test]
    fn test_dropped_slot_stays_idle() {
        let correlator = TransactionCorrelator::new();
        drop(correlator.begin_attempt());
        assert_eq!(correlator.pending(), None);

        correlator.begin_attempt().commit(0);
        assert_eq!(correlator.pending(), None);
    }

    #[test]
    fn test_try_match() {
        let correlator = TransactionCorrelator::new();
        assert!(correlator.try_match(7).is_none());
        assert!(correlator.try_match(0).is_none());

        correlator.begin_attempt().commit(7);
        assert!(correlator.try_match(8).is_none());
        assert!(correlator.try_match(0).is_none());

        let matched = correlator.try_match(7).unwrap();
        assert_eq!(matched.xid(), 7);
        drop(matched);
        assert_eq!(correlator.pending(), Some(7));

        correlator.try_match(7).unwrap().complete();
        assert_eq!(correlator.pending(), None);
        assert!(correlator.try_match(7).is_none());
    }

    #[test]
    fn test_timeout_abandons_pending_attempt() {
        let correlator = TransactionCorrelator::with_timeout(Duration::from_millis(100));
        correlator.begin_attempt().commit(1);

        let start = Instant::now();
        let slot = correlator.begin_attempt();
        let waited = start.elapsed();
        slot.commit(2);

        assert!(waited >= Duration::from_millis(100));
        assert!(waited < Duration::from_secs(5));
        assert_eq!(correlator.pending(), Some(2));
        assert_eq!(correlator.abandoned(), 1);
        assert!(correlator.try_match(1).is_none());
    }

    #[test]
    fn test_unbounded_timeout_does_not_overflow() {
        let correlator = Arc::new(TransactionCorrelator::with_timeout(Duration::MAX));
        correlator.begin_attempt().commit(21);
        assert_eq!(correlator.pending(), Some(21));

        let waiter = {
            let correlator = correlator.clone();
            thread::spawn(move || correlator.begin_attempt().commit(22))
        };

        thread::sleep(Duration::from_millis(50));
        correlator.try_match(21).unwrap().complete();

        waiter.join().unwrap();
        assert_eq!(correlator.pending(), Some(22));
        assert_eq!(correlator.abandoned(), 0);
    }

    #[test]
    fn test_complete_wakes_waiting_sender() {
        let correlator = Arc::new(TransactionCorrelator::with_timeout(Duration::from_secs(10)));
        correlator.begin_attempt().commit(11);

        let waiter = {
            let correlator = correlator.clone();
            thread::spawn(move || {
                let start = Instant::now();
                correlator.begin_attempt().commit(12);
                start.elapsed()
            })
        };

        thread::sleep(Duration::from_millis(50));
        correlator.try_match(11).unwrap().complete();

        let waited = waiter.join().unwrap();
        assert!(waited < Duration::from_secs(5));
        assert_eq!(correlator.pending(), Some(12));
        assert_eq!(correlator.abandoned(), 0);
    }

    #[test]
    fn test_single_flight_under_contention() {
        const SENDERS: u32 = 4;
        const ROUNDS: u32 = 50;

        let correlator = Arc::new(TransactionCorrelator::with_timeout(Duration::from_secs(10)));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_in_flight = Arc::new(AtomicUsize::new(0));
        let completed = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(SENDERS as usize + 1));

        let senders: Vec<_> = (0..SENDERS)
            .map(|t| {
                let correlator = correlator.clone();
                let in_flight = in_flight.clone();
                let max_in_flight = max_in_flight.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    for round in 0..ROUNDS {
                        let slot = correlator.begin_attempt();
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        max_in_flight.fetch_max(now, Ordering::SeqCst);
                        slot.commit(t * ROUNDS + round + 1);
                    }
                })
            })
            .collect();

        let responder = {
            let correlator = correlator.clone();
            let in_flight = in_flight.clone();
            let completed = completed.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                while completed.load(Ordering::SeqCst) < (SENDERS * ROUNDS) as usize {
                    match correlator.pending().and_then(|xid| correlator.try_match(xid)) {
                        Some(matched) => {
                            in_flight.fetch_sub(1, Ordering::SeqCst);
                            completed.fetch_add(1, Ordering::SeqCst);
                            matched.complete();
                        }
                        None => thread::yield_now(),
                    }
                }
            })
        };

        for sender in senders {
            sender.join().unwrap();
        }
        responder.join().unwrap();

        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(correlator.pending(), None);
        assert_eq!(correlator.abandoned(), 0);
    }
}
