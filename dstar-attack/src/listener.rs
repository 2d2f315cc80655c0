//! Receive path: raw frames in, classified DHCP replies out to the actions

use dstar_core::{AttackContext, AttackStatsCounters, LeasePool, Result};
use dstar_dhcp::{ActionEvent, DhcpAction, DhcpMessageType, DhcpPacket, DhcpSocket};
use dstar_packet::parse_dhcp_frame;
use pnet_datalink::DataLinkReceiver;
use std::io::ErrorKind;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Source of raw Ethernet frames.
///
/// `next_frame` blocks for at most the source's read timeout and returns
/// `Ok(None)` when nothing arrived in that window.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>>;
}

impl FrameSource for Box<dyn DataLinkReceiver> {
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        match self.next() {
            Ok(frame) => Ok(Some(frame.to_vec())),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Hands each server reply to every registered action
pub struct Dispatcher {
    actions: Vec<Arc<dyn DhcpAction>>,
    socket: Arc<dyn DhcpSocket>,
    pool: Arc<dyn LeasePool>,
    stats: Arc<AttackStatsCounters>,
}

impl Dispatcher {
    pub fn new(
        actions: Vec<Arc<dyn DhcpAction>>,
        socket: Arc<dyn DhcpSocket>,
        pool: Arc<dyn LeasePool>,
        stats: Arc<AttackStatsCounters>,
    ) -> Self {
        Self {
            actions,
            socket,
            pool,
            stats,
        }
    }

    /// Decode one raw frame and deliver it.
    ///
    /// Only BOOTREPLY OFFER, ACK and NAK messages reach the actions; the
    /// returned events are whatever the actions reported.
    pub fn dispatch_frame(&self, frame: &[u8]) -> Vec<ActionEvent> {
        let Some(inbound) = parse_dhcp_frame(frame) else {
            return Vec::new();
        };

        let packet = match DhcpPacket::parse(&inbound.payload) {
            Ok(packet) => packet,
            Err(e) => {
                debug!(src = %inbound.source_mac, error = %e, "Dropping undecodable DHCP reply");
                return Vec::new();
            }
        };

        if !packet.is_reply() {
            return Vec::new();
        }

        match packet.message_type() {
            Some(DhcpMessageType::Offer | DhcpMessageType::Ack | DhcpMessageType::Nak) => {}
            other => {
                trace!(kind = ?other, "Ignoring DHCP reply type");
                return Vec::new();
            }
        }

        self.stats.increment_packets_received();
        let route = inbound.route();

        let events: Vec<ActionEvent> = self
            .actions
            .iter()
            .filter_map(|action| {
                action.on_message(self.socket.as_ref(), self.pool.as_ref(), &route, &packet)
            })
            .collect();

        for event in &events {
            match event {
                ActionEvent::RequestSent { .. } => self.stats.increment_packets_sent(),
                ActionEvent::SendFailed { .. } => self.stats.increment_errors(),
                _ => {}
            }
        }
        self.stats.set_leases_acquired(self.pool.len() as u64);

        events
    }
}

/// Pump frames from `source` into `dispatcher` until the context stops.
///
/// A receive error ends the loop and is returned.
pub fn run_receive_loop(
    source: &mut dyn FrameSource,
    dispatcher: &Dispatcher,
    ctx: &AttackContext,
) -> Result<()> {
    debug!("Receive loop started");

    while ctx.is_running() {
        match source.next_frame() {
            Ok(Some(frame)) => {
                dispatcher.dispatch_frame(&frame);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Receive failed, stopping receive loop");
                ctx.stats.increment_errors();
                return Err(e);
            }
        }
    }

    debug!("Receive loop stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dstar_core::{Error, MacAddr, MemoryLeasePool, PacketRoute};
    use dstar_dhcp::{DhcpOption, StarvationAction};
    use dstar_dhcp::packet::BOOTREPLY;
    use dstar_packet::build_dhcp_frame;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::net::Ipv4Addr;

    const SERVER_MAC: MacAddr = MacAddr::new([0x00, 0x50, 0x56, 0x11, 0x22, 0x33]);
    const SERVER_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 7, 1);

    #[derive(Default)]
    struct MockSocket {
        sent: Mutex<Vec<DhcpPacket>>,
    }

    impl DhcpSocket for MockSocket {
        fn send_message(&self, packet: &DhcpPacket, _route: &PacketRoute) -> Result<usize> {
            self.sent.lock().push(packet.clone());
            Ok(300)
        }
    }

    struct ScriptedSource {
        frames: VecDeque<Result<Option<Vec<u8>>>>,
    }

    impl FrameSource for ScriptedSource {
        fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
            self.frames.pop_front().unwrap_or(Ok(None))
        }
    }

    fn reply_frame(xid: u32, message: DhcpMessageType) -> Vec<u8> {
        let mut packet = DhcpPacket::new();
        packet.op = BOOTREPLY;
        packet.xid = xid;
        packet.yiaddr = Ipv4Addr::new(192, 168, 7, 20);
        packet.chaddr[..6].copy_from_slice(&[0x02, 0, 0, 0, 0, 0x20]);
        packet.options = vec![
            DhcpOption::MessageType(message),
            DhcpOption::ServerId(SERVER_IP),
            DhcpOption::LeaseTime(600),
        ];

        let route = PacketRoute {
            destination_mac: MacAddr::broadcast(),
            source_ip: Some(SERVER_IP),
            destination_ip: Ipv4Addr::BROADCAST,
            to_server: false,
        };
        build_dhcp_frame(SERVER_MAC, &route, &packet.build())
    }

    struct Fixture {
        action: Arc<StarvationAction>,
        socket: Arc<MockSocket>,
        pool: Arc<MemoryLeasePool>,
        stats: Arc<AttackStatsCounters>,
        dispatcher: Dispatcher,
    }

    fn fixture() -> Fixture {
        let action = Arc::new(StarvationAction::new());
        let socket = Arc::new(MockSocket::default());
        let pool = Arc::new(MemoryLeasePool::new());
        let stats = Arc::new(AttackStatsCounters::default());
        let dispatcher = Dispatcher::new(
            vec![action.clone() as Arc<dyn DhcpAction>],
            socket.clone(),
            pool.clone(),
            stats.clone(),
        );
        Fixture {
            action,
            socket,
            pool,
            stats,
            dispatcher,
        }
    }

    #[test]
    fn test_dispatch_offer_and_ack() {
        let f = fixture();
        f.action.trigger(f.socket.as_ref());
        let xid = f.socket.sent.lock()[0].xid;

        let events = f.dispatcher.dispatch_frame(&reply_frame(xid, DhcpMessageType::Offer));
        assert!(matches!(events.as_slice(), [ActionEvent::RequestSent { .. }]));

        let events = f.dispatcher.dispatch_frame(&reply_frame(xid, DhcpMessageType::Ack));
        assert!(matches!(events.as_slice(), [ActionEvent::LeaseAcquired(_)]));

        let lease = &f.pool.snapshot()[0];
        assert_eq!(lease.server_mac(), SERVER_MAC);
        assert_eq!(lease.server_ip(), Some(SERVER_IP));
        assert_eq!(lease.lease_seconds(), 600);

        let stats = f.stats.to_stats(std::time::SystemTime::now(), true);
        assert_eq!(stats.packets_received, 2);
        assert_eq!(stats.packets_sent, 1);
        assert_eq!(stats.leases_acquired, 1);
    }

    #[test]
    fn test_dispatch_filters_non_replies() {
        let f = fixture();
        f.action.trigger(f.socket.as_ref());
        let xid = f.socket.sent.lock()[0].xid;

        // Client traffic, a request-typed reply and garbage are all dropped
        let discover = DhcpPacket::new_discover(xid, MacAddr([0x02, 0, 0, 0, 0, 1]));
        let client_frame = build_dhcp_frame(
            MacAddr([0x02, 0, 0, 0, 0, 1]),
            &PacketRoute::broadcast_to_server(),
            &discover.build(),
        );
        assert!(f.dispatcher.dispatch_frame(&client_frame).is_empty());
        assert!(f
            .dispatcher
            .dispatch_frame(&reply_frame(xid, DhcpMessageType::Inform))
            .is_empty());
        assert!(f.dispatcher.dispatch_frame(&[0u8; 20]).is_empty());

        assert_eq!(f.stats.to_stats(std::time::SystemTime::now(), true).packets_received, 0);
        assert_eq!(f.action.correlator().pending(), Some(xid));
    }

    #[test]
    fn test_receive_loop_stops_on_error() {
        let f = fixture();
        let ctx = AttackContext::new();
        let mut source = ScriptedSource {
            frames: VecDeque::from(vec![
                Ok(None),
                Ok(Some(vec![0u8; 64])),
                Err(Error::Interface("link gone".to_string())),
            ]),
        };

        let result = run_receive_loop(&mut source, &f.dispatcher, &ctx);
        assert!(result.is_err());
        assert_eq!(ctx.stats.errors.load(std::sync::atomic::Ordering::Relaxed), 1);
    }

    #[test]
    fn test_receive_loop_honours_stop() {
        let f = fixture();
        let ctx = AttackContext::new();
        ctx.stop();
        let mut source = ScriptedSource {
            frames: VecDeque::from(vec![Err(Error::Interface("unreachable".to_string()))]),
        };

        assert!(run_receive_loop(&mut source, &f.dispatcher, &ctx).is_ok());
        assert_eq!(source.frames.len(), 1);
    }
}
