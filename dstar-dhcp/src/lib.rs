//! DHCP support for dstar-rs
//!
//! - [`packet`] - DHCP message codec
//! - [`correlator`] - single-flight transaction tracking
//! - [`action`] - the [`DhcpAction`] contract and its socket seam
//! - [`starvation`] - lease exhaustion via spoofed DORA exchanges

pub mod action;
pub mod correlator;
pub mod packet;
pub mod random;
pub mod starvation;
pub mod stats;

use std::fmt;

pub use action::{ActionEvent, DhcpAction, DhcpSocket};
pub use correlator::{AttemptSlot, MatchedAttempt, TransactionCorrelator, DEFAULT_ATTEMPT_TIMEOUT};
pub use packet::{DhcpMessageType, DhcpOption, DhcpPacket};
pub use starvation::StarvationAction;
pub use stats::{StarvationStats, StarvationStatsSnapshot};

/// Transaction id formatted as fixed-width hex for log fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Xid(pub u32);

impl fmt::Display for Xid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
