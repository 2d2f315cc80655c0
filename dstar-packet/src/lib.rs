//! Packet framing for dstar-rs
//!
//! Builds and parses the Ethernet II / IPv4 / UDP layers that carry DHCP
//! messages on a raw link-layer socket.
//!
//! - [`ethernet`] - Ethernet II frames
//! - [`ipv4`] - IPv4 headers
//! - [`udp`] - UDP datagrams with pseudo-header checksum
//! - [`checksum`] - Internet checksum
//! - [`frame`] - DHCP-specific wrapping and filtering

pub mod checksum;
pub mod ethernet;
pub mod frame;
pub mod ipv4;
pub mod udp;

pub use ethernet::EthernetFrame;
pub use frame::{build_dhcp_frame, parse_dhcp_frame, InboundDhcpFrame};
pub use ipv4::Ipv4Packet;
pub use udp::UdpDatagram;
