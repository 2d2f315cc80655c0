//! DHCP-over-UDP framing
//!
//! Wraps an encoded DHCP message in UDP, IPv4 and Ethernet according to a
//! [`PacketRoute`], and unwraps server-to-client replies from raw frames.

use crate::ethernet::EthernetFrame;
use crate::ipv4::Ipv4Packet;
use crate::udp::UdpDatagram;
use dstar_core::protocol_constants::{DHCP_CLIENT_PORT, DHCP_SERVER_PORT, IP_PROTO_UDP};
use dstar_core::{MacAddr, PacketRoute};
use std::net::Ipv4Addr;

/// Build a complete Ethernet frame carrying `payload` along `route`.
///
/// `source_mac` is the link-layer source; for spoofed clients this is the
/// message's own chaddr.
pub fn build_dhcp_frame(source_mac: MacAddr, route: &PacketRoute, payload: &[u8]) -> Vec<u8> {
    let (src_port, dst_port) = route.ports();
    let src_ip = route.wire_source_ip();
    let dst_ip = route.destination_ip;

    let udp = UdpDatagram::new(src_port, dst_port, payload.to_vec()).to_bytes(src_ip, dst_ip);
    let ip = Ipv4Packet::new(src_ip, dst_ip, IP_PROTO_UDP, udp).to_bytes();

    EthernetFrame::ipv4(route.destination_mac, source_mac, ip).to_bytes()
}

/// A server-to-client DHCP datagram lifted out of a raw frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundDhcpFrame {
    /// Ethernet source (the replying server or relay)
    pub source_mac: MacAddr,
    pub destination_mac: MacAddr,
    pub source_ip: Ipv4Addr,
    pub destination_ip: Ipv4Addr,
    /// Encoded DHCP message
    pub payload: Vec<u8>,
}

impl InboundDhcpFrame {
    /// Route describing where this frame came from
    pub fn route(&self) -> PacketRoute {
        PacketRoute::inbound(self.source_mac, self.source_ip, self.destination_ip)
    }
}

/// Extract a DHCP reply (UDP 67 -> 68) from a raw Ethernet frame.
///
/// Returns `None` for anything else, including client-to-server traffic.
pub fn parse_dhcp_frame(data: &[u8]) -> Option<InboundDhcpFrame> {
    let ethernet = EthernetFrame::from_bytes(data)?;
    if !ethernet.is_ipv4() {
        return None;
    }

    let ip = Ipv4Packet::from_bytes(&ethernet.payload)?;
    if ip.protocol != IP_PROTO_UDP {
        return None;
    }

    let udp = UdpDatagram::from_bytes(&ip.payload)?;
    if udp.source_port != DHCP_SERVER_PORT || udp.destination_port != DHCP_CLIENT_PORT {
        return None;
    }

    Some(InboundDhcpFrame {
        source_mac: ethernet.source,
        destination_mac: ethernet.destination,
        source_ip: ip.source,
        destination_ip: ip.destination,
        payload: udp.payload,
    })
}
