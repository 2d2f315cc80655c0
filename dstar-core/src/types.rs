//! Common types used throughout dstar-rs

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// MAC Address (6 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// Create a new MAC address
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Broadcast MAC address (ff:ff:ff:ff:ff:ff)
    pub const fn broadcast() -> Self {
        Self([0xff, 0xff, 0xff, 0xff, 0xff, 0xff])
    }

    /// Zero MAC address (00:00:00:00:00:00)
    pub const fn zero() -> Self {
        Self([0x00, 0x00, 0x00, 0x00, 0x00, 0x00])
    }

    /// Build from the first six bytes of a slice
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; 6] = slice.get(..6)?.try_into().ok()?;
        Some(Self(bytes))
    }

    /// Get bytes as slice
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Convert to array
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    pub fn is_broadcast(&self) -> bool {
        self.0 == [0xff; 6]
    }

    /// Group bit of the first octet
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    /// U/L bit of the first octet
    pub fn is_locally_administered(&self) -> bool {
        self.0[0] & 0x02 != 0
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddr {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(|c: char| c == ':' || c == '-').collect();
        if parts.len() != 6 {
            return Err(crate::Error::protocol("Invalid MAC address format"));
        }

        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            bytes[i] = u8::from_str_radix(part, 16)
                .map_err(|_| crate::Error::protocol("Invalid MAC address hex"))?;
        }

        Ok(MacAddr(bytes))
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }
}

/// Link and network addressing for one DHCP message.
///
/// Outbound routes are built fresh for every send. Inbound routes are filled
/// from the received frame, with `destination_mac` holding the frame's sender
/// so that a reply can be addressed straight back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketRoute {
    /// Link-layer peer
    pub destination_mac: MacAddr,
    /// Network-layer source, `None` when the client has no address yet
    pub source_ip: Option<Ipv4Addr>,
    /// Network-layer destination
    pub destination_ip: Ipv4Addr,
    /// Client-to-server direction (UDP 68 -> 67)
    pub to_server: bool,
}

impl PacketRoute {
    /// All-broadcast route used for DISCOVER
    pub fn broadcast_to_server() -> Self {
        Self {
            destination_mac: MacAddr::broadcast(),
            source_ip: None,
            destination_ip: Ipv4Addr::BROADCAST,
            to_server: true,
        }
    }

    /// Route for a reply received from `server_mac`
    pub fn inbound(server_mac: MacAddr, server_ip: Ipv4Addr, client_ip: Ipv4Addr) -> Self {
        Self {
            destination_mac: server_mac,
            source_ip: Some(server_ip),
            destination_ip: client_ip,
            to_server: false,
        }
    }

    /// Source address as it goes on the wire
    pub fn wire_source_ip(&self) -> Ipv4Addr {
        self.source_ip.unwrap_or(Ipv4Addr::UNSPECIFIED)
    }

    /// UDP (source, destination) ports implied by the direction flag
    pub fn ports(&self) -> (u16, u16) {
        if self.to_server {
            (
                protocol_constants::DHCP_CLIENT_PORT,
                protocol_constants::DHCP_SERVER_PORT,
            )
        } else {
            (
                protocol_constants::DHCP_SERVER_PORT,
                protocol_constants::DHCP_CLIENT_PORT,
            )
        }
    }
}

/// Ethertype constants
pub mod ethertypes {
    pub const IPV4: u16 = 0x0800;
    pub const ARP: u16 = 0x0806;
    pub const DOT1Q: u16 = 0x8100;
}

/// Protocol-specific constants
pub mod protocol_constants {
    /// DHCP ports
    pub const DHCP_SERVER_PORT: u16 = 67;
    pub const DHCP_CLIENT_PORT: u16 = 68;

    /// IP protocol number for UDP
    pub const IP_PROTO_UDP: u8 = 17;
}
