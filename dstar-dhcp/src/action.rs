//! The contract shared by every DHCP attack action

use crate::packet::{DhcpMessageType, DhcpPacket};
use dstar_core::{AcquiredLease, LeasePool, MacAddr, PacketRoute, Result};
use std::net::Ipv4Addr;

/// Transmits DHCP messages on behalf of an action.
///
/// Failures are returned, never raised; the caller decides what a failed
/// send means for its exchange.
pub trait DhcpSocket: Send + Sync {
    /// Frame `packet` along `route` and send it, returning the bytes written
    fn send_message(&self, packet: &DhcpPacket, route: &PacketRoute) -> Result<usize>;
}

/// Outcome of one action step, for the orchestrator and for tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionEvent {
    DiscoverSent {
        xid: u32,
        client_mac: MacAddr,
    },
    RequestSent {
        xid: u32,
        requested_ip: Ipv4Addr,
        server_ip: Option<Ipv4Addr>,
    },
    LeaseAcquired(AcquiredLease),
    Rejected {
        xid: u32,
    },
    SendFailed {
        xid: u32,
        message: DhcpMessageType,
        error: String,
    },
}

/// A DHCP attack variant driven by a sender loop and a receive loop.
///
/// `trigger` and `on_message` are called concurrently from two threads on
/// the same instance.
pub trait DhcpAction: Send + Sync {
    fn name(&self) -> &str;

    /// Start the next exchange. May block while a previous exchange is
    /// still outstanding.
    fn trigger(&self, socket: &dyn DhcpSocket) -> ActionEvent;

    /// Handle one server reply. `route` describes where it came from.
    ///
    /// Returns `None` when the reply does not concern this action.
    fn on_message(
        &self,
        socket: &dyn DhcpSocket,
        pool: &dyn LeasePool,
        route: &PacketRoute,
        packet: &DhcpPacket,
    ) -> Option<ActionEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use dstar_core::MemoryLeasePool;

    struct NullSocket;

    impl DhcpSocket for NullSocket {
        fn send_message(&self, packet: &DhcpPacket, _route: &PacketRoute) -> Result<usize> {
            Ok(packet.build().len())
        }
    }

    /// Sends a single DISCOVER and ignores every reply; keeps no counters
    struct OneShot;

    impl DhcpAction for OneShot {
        fn name(&self) -> &str {
            "one-shot"
        }

        fn trigger(&self, socket: &dyn DhcpSocket) -> ActionEvent {
            let client_mac = MacAddr([0x02, 0, 0, 0, 0, 1]);
            let packet = DhcpPacket::new_discover(1, client_mac);
            match socket.send_message(&packet, &PacketRoute::broadcast_to_server()) {
                Ok(_) => ActionEvent::DiscoverSent { xid: 1, client_mac },
                Err(e) => ActionEvent::SendFailed {
                    xid: 1,
                    message: DhcpMessageType::Discover,
                    error: e.to_string(),
                },
            }
        }

        fn on_message(
            &self,
            _socket: &dyn DhcpSocket,
            _pool: &dyn LeasePool,
            _route: &PacketRoute,
            _packet: &DhcpPacket,
        ) -> Option<ActionEvent> {
            None
        }
    }

    #[test]
    fn test_action_without_counters() {
        let action: Box<dyn DhcpAction> = Box::new(OneShot);
        let pool = MemoryLeasePool::new();

        assert!(matches!(
            action.trigger(&NullSocket),
            ActionEvent::DiscoverSent { xid: 1, .. }
        ));
        let reply = DhcpPacket::new();
        assert_eq!(
            action.on_message(&NullSocket, &pool, &PacketRoute::broadcast_to_server(), &reply),
            None
        );
        assert!(pool.is_empty());
    }
}
