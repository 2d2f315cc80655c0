//! Acquired leases and the pool that accumulates them

use crate::MacAddr;
use parking_lot::RwLock;
use std::fmt;
use std::net::Ipv4Addr;
use std::time::SystemTime;
use tracing::debug;

/// A lease obtained from a DHCP server under a spoofed client identity.
///
/// Built once when the server's ACK is accepted and never modified after
/// that; the fields are only reachable through accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquiredLease {
    client_ip: Ipv4Addr,
    fake_client_mac: MacAddr,
    server_ip: Option<Ipv4Addr>,
    server_mac: MacAddr,
    primary_dns: Option<Ipv4Addr>,
    lease_seconds: u32,
    transaction_id: u32,
    acquired_at: SystemTime,
}

impl AcquiredLease {
    pub fn new(
        client_ip: Ipv4Addr,
        fake_client_mac: MacAddr,
        server_ip: Option<Ipv4Addr>,
        server_mac: MacAddr,
        primary_dns: Option<Ipv4Addr>,
        lease_seconds: u32,
        transaction_id: u32,
    ) -> Self {
        Self {
            client_ip,
            fake_client_mac,
            server_ip,
            server_mac,
            primary_dns,
            lease_seconds,
            transaction_id,
            acquired_at: SystemTime::now(),
        }
    }

    /// Address handed out by the server (yiaddr)
    pub fn client_ip(&self) -> Ipv4Addr {
        self.client_ip
    }

    /// Spoofed hardware address the lease is bound to
    pub fn fake_client_mac(&self) -> MacAddr {
        self.fake_client_mac
    }

    pub fn server_ip(&self) -> Option<Ipv4Addr> {
        self.server_ip
    }

    pub fn server_mac(&self) -> MacAddr {
        self.server_mac
    }

    pub fn primary_dns(&self) -> Option<Ipv4Addr> {
        self.primary_dns
    }

    /// Lease duration in seconds, host byte order
    pub fn lease_seconds(&self) -> u32 {
        self.lease_seconds
    }

    pub fn transaction_id(&self) -> u32 {
        self.transaction_id
    }

    pub fn acquired_at(&self) -> SystemTime {
        self.acquired_at
    }

    /// Check if lease is expired
    pub fn is_expired(&self) -> bool {
        if let Ok(elapsed) = self.acquired_at.elapsed() {
            elapsed.as_secs() > self.lease_seconds as u64
        } else {
            false
        }
    }

    /// Get remaining lease time in seconds
    pub fn remaining_secs(&self) -> u32 {
        match self.acquired_at.elapsed() {
            Ok(elapsed) => {
                let elapsed_secs = u32::try_from(elapsed.as_secs()).unwrap_or(u32::MAX);
                self.lease_seconds.saturating_sub(elapsed_secs)
            }
            Err(_) => self.lease_seconds,
        }
    }
}

impl fmt::Display for AcquiredLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) lease {}s",
            self.client_ip, self.fake_client_mac, self.lease_seconds
        )?;
        if let Some(server) = self.server_ip {
            write!(f, " from {} ({})", server, self.server_mac)?;
        }
        if let Some(dns) = self.primary_dns {
            write!(f, " dns {}", dns)?;
        }
        Ok(())
    }
}

/// Destination for acquired leases.
///
/// Implementations must be safe to share between concurrently running
/// actions; the pool provides its own synchronization.
pub trait LeasePool: Send + Sync {
    /// Store a newly acquired lease
    fn add_slot(&self, lease: AcquiredLease);

    /// Number of leases held
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every lease currently held, in acquisition order
    fn snapshot(&self) -> Vec<AcquiredLease>;
}

/// In-memory, append-only lease pool
#[derive(Debug, Default)]
pub struct MemoryLeasePool {
    leases: RwLock<Vec<AcquiredLease>>,
}

impl MemoryLeasePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the lease bound to a spoofed MAC
    pub fn find_by_mac(&self, mac: &MacAddr) -> Option<AcquiredLease> {
        self.leases
            .read()
            .iter()
            .find(|lease| lease.fake_client_mac == *mac)
            .cloned()
    }

    /// Leases whose duration has not yet elapsed
    pub fn active(&self) -> Vec<AcquiredLease> {
        self.leases
            .read()
            .iter()
            .filter(|lease| !lease.is_expired())
            .cloned()
            .collect()
    }
}

impl LeasePool for MemoryLeasePool {
    fn add_slot(&self, lease: AcquiredLease) {
        let mut leases = self.leases.write();
        leases.push(lease);
        debug!(total = leases.len(), "Lease added to pool");
    }

    fn len(&self) -> usize {
        self.leases.read().len()
    }

    fn snapshot(&self) -> Vec<AcquiredLease> {
        self.leases.read().clone()
    }
}
