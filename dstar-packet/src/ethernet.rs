//! Ethernet II frame construction and parsing

use bytes::{BufMut, BytesMut};
use dstar_core::ethertypes;
use dstar_core::MacAddr;

/// Ethernet II frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetFrame {
    /// Destination MAC address
    pub destination: MacAddr,
    /// Source MAC address
    pub source: MacAddr,
    /// EtherType
    pub ethertype: u16,
    /// Payload data
    pub payload: Vec<u8>,
}

impl EthernetFrame {
    /// Minimum Ethernet frame size (without FCS)
    pub const MIN_FRAME_SIZE: usize = 60;

    /// Ethernet header size (dst + src + type)
    pub const HEADER_SIZE: usize = 14;

    pub fn new(destination: MacAddr, source: MacAddr, ethertype: u16, payload: Vec<u8>) -> Self {
        Self {
            destination,
            source,
            ethertype,
            payload,
        }
    }

    /// IPv4 frame
    pub fn ipv4(destination: MacAddr, source: MacAddr, payload: Vec<u8>) -> Self {
        Self::new(destination, source, ethertypes::IPV4, payload)
    }

    /// Serialize, padding to the Ethernet minimum
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = BytesMut::with_capacity(Self::HEADER_SIZE + self.payload.len());
        buffer.put_slice(self.destination.as_bytes());
        buffer.put_slice(self.source.as_bytes());
        buffer.put_u16(self.ethertype);
        buffer.put_slice(&self.payload);

        let mut result = buffer.to_vec();
        if result.len() < Self::MIN_FRAME_SIZE {
            result.resize(Self::MIN_FRAME_SIZE, 0);
        }
        result
    }

    /// Parse an Ethernet II frame, skipping a single 802.1Q tag if present
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < Self::HEADER_SIZE {
            return None;
        }

        let destination = MacAddr::from_slice(&data[0..6])?;
        let source = MacAddr::from_slice(&data[6..12])?;
        let mut ethertype = u16::from_be_bytes([data[12], data[13]]);
        let mut offset = Self::HEADER_SIZE;

        if ethertype == ethertypes::DOT1Q {
            if data.len() < offset + 4 {
                return None;
            }
            ethertype = u16::from_be_bytes([data[offset + 2], data[offset + 3]]);
            offset += 4;
        }

        Some(Self {
            destination,
            source,
            ethertype,
            payload: data[offset..].to_vec(),
        })
    }

    pub fn is_ipv4(&self) -> bool {
        self.ethertype == ethertypes::IPV4
    }
}
