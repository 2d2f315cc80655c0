//! UDP datagram construction and parsing

use crate::checksum::udp_checksum;
use bytes::{BufMut, BytesMut};
use dstar_core::protocol_constants::IP_PROTO_UDP;
use std::net::Ipv4Addr;

/// UDP datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpDatagram {
    /// Source port
    pub source_port: u16,
    /// Destination port
    pub destination_port: u16,
    /// Payload data
    pub payload: Vec<u8>,
}

impl UdpDatagram {
    /// UDP header size in bytes
    pub const HEADER_SIZE: usize = 8;

    pub fn new(source_port: u16, destination_port: u16, payload: Vec<u8>) -> Self {
        Self {
            source_port,
            destination_port,
            payload,
        }
    }

    pub fn length(&self) -> usize {
        Self::HEADER_SIZE + self.payload.len()
    }

    /// Serialize with the checksum computed over the IPv4 pseudo-header
    pub fn to_bytes(&self, src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> Vec<u8> {
        let mut buffer = BytesMut::with_capacity(self.length());
        buffer.put_u16(self.source_port);
        buffer.put_u16(self.destination_port);
        buffer.put_u16(self.length() as u16);
        buffer.put_u16(0);
        buffer.put_slice(&self.payload);

        let checksum = udp_checksum(&src_ip.octets(), &dst_ip.octets(), IP_PROTO_UDP, &buffer);
        buffer[6..8].copy_from_slice(&checksum.to_be_bytes());

        buffer.to_vec()
    }

    /// Parse a UDP datagram, trusting the length field over trailing bytes.
    ///
    /// The checksum is not verified.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < Self::HEADER_SIZE {
            return None;
        }

        let length = u16::from_be_bytes([data[4], data[5]]) as usize;
        if length < Self::HEADER_SIZE || length > data.len() {
            return None;
        }

        Some(Self {
            source_port: u16::from_be_bytes([data[0], data[1]]),
            destination_port: u16::from_be_bytes([data[2], data[3]]),
            payload: data[Self::HEADER_SIZE..length].to_vec(),
        })
    }
}
