//! IPv4 packet construction and parsing
//!
//! Only what DHCP over UDP needs: fixed 20-byte headers on the way out,
//! and option-skipping on the way in.

use crate::checksum::internet_checksum;
use bytes::{BufMut, BytesMut};
use std::net::Ipv4Addr;

/// IPv4 packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Packet {
    /// Identification
    pub identification: u16,
    /// Time to Live
    pub ttl: u8,
    /// Protocol number
    pub protocol: u8,
    /// Source IP address
    pub source: Ipv4Addr,
    /// Destination IP address
    pub destination: Ipv4Addr,
    /// Payload data
    pub payload: Vec<u8>,
}

impl Ipv4Packet {
    /// Minimum IPv4 header size (without options)
    pub const MIN_HEADER_SIZE: usize = 20;

    /// Maximum IPv4 packet size
    pub const MAX_PACKET_SIZE: usize = 65535;

    pub const DEFAULT_TTL: u8 = 64;

    pub fn new(source: Ipv4Addr, destination: Ipv4Addr, protocol: u8, payload: Vec<u8>) -> Self {
        Self {
            identification: 0,
            ttl: Self::DEFAULT_TTL,
            protocol,
            source,
            destination,
            payload,
        }
    }

    /// Set the Time to Live
    pub fn with_ttl(mut self, ttl: u8) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the identification field
    pub fn with_identification(mut self, id: u16) -> Self {
        self.identification = id;
        self
    }

    pub fn total_length(&self) -> usize {
        Self::MIN_HEADER_SIZE + self.payload.len()
    }

    /// Serialize with a freshly computed header checksum
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = BytesMut::with_capacity(self.total_length());

        // Version 4, IHL 5
        buffer.put_u8(0x45);
        buffer.put_u8(0);
        buffer.put_u16(self.total_length() as u16);
        buffer.put_u16(self.identification);
        // No flags, no fragment offset
        buffer.put_u16(0);
        buffer.put_u8(self.ttl);
        buffer.put_u8(self.protocol);
        buffer.put_u16(0);
        buffer.put_slice(&self.source.octets());
        buffer.put_slice(&self.destination.octets());

        let checksum = internet_checksum(&buffer[..Self::MIN_HEADER_SIZE]);
        buffer[10..12].copy_from_slice(&checksum.to_be_bytes());

        buffer.put_slice(&self.payload);
        buffer.to_vec()
    }

    /// Parse an IPv4 packet.
    ///
    /// Header options are skipped, trailing link-layer padding is cut off
    /// using the total length field, and fragments are rejected.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < Self::MIN_HEADER_SIZE {
            return None;
        }

        let version = data[0] >> 4;
        let header_len = ((data[0] & 0x0F) as usize) * 4;
        if version != 4 || header_len < Self::MIN_HEADER_SIZE || data.len() < header_len {
            return None;
        }

        let total_length = u16::from_be_bytes([data[2], data[3]]) as usize;
        if total_length < header_len || total_length > data.len() {
            return None;
        }

        let flags_and_offset = u16::from_be_bytes([data[6], data[7]]);
        let more_fragments = flags_and_offset & 0x2000 != 0;
        if more_fragments || flags_and_offset & 0x1FFF != 0 {
            return None;
        }

        Some(Self {
            identification: u16::from_be_bytes([data[4], data[5]]),
            ttl: data[8],
            protocol: data[9],
            source: Ipv4Addr::new(data[12], data[13], data[14], data[15]),
            destination: Ipv4Addr::new(data[16], data[17], data[18], data[19]),
            payload: data[header_len..total_length].to_vec(),
        })
    }
}
