//! DHCP message encoding and decoding (RFC 2131 / RFC 2132)
//!
//! Only the fields and options a DORA exchange touches are given typed
//! variants; everything else round-trips as [`DhcpOption::Unknown`].

use dstar_core::{Error, MacAddr, Result};
use std::fmt;
use std::net::Ipv4Addr;
use tracing::warn;

/// DHCP magic cookie value (0x63825363)
pub const DHCP_MAGIC_COOKIE: u32 = 0x63825363;

/// Broadcast flag value
pub const DHCP_BROADCAST_FLAG: u16 = 0x8000;

/// BOOTREQUEST opcode
pub const BOOTREQUEST: u8 = 1;

/// BOOTREPLY opcode
pub const BOOTREPLY: u8 = 2;

/// Ethernet hardware type
pub const HTYPE_ETHERNET: u8 = 1;

/// Ethernet hardware address length
pub const HLEN_ETHERNET: u8 = 6;

/// Fixed BOOTP header length, up to and excluding the magic cookie
pub const FIXED_HEADER_LEN: usize = 236;

/// Offset of the first option byte
pub const OPTIONS_OFFSET: usize = 240;

/// Smallest message clients are expected to send (RFC 2131 section 2)
pub const MIN_MESSAGE_LEN: usize = 300;

/// Options a DISCOVER asks the server to include
/// Largest body a single option can carry
const MAX_OPTION_LEN: usize = u8::MAX as usize;

const REQUESTED_PARAMETERS: [u8; 6] = [1, 3, 6, 15, 51, 54];

/// DHCP Message Types (RFC 2132)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhcpMessageType {
    Discover = 1,
    Offer = 2,
    Request = 3,
    Decline = 4,
    Ack = 5,
    Nak = 6,
    Release = 7,
    Inform = 8,
}

impl DhcpMessageType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(DhcpMessageType::Discover),
            2 => Some(DhcpMessageType::Offer),
            3 => Some(DhcpMessageType::Request),
            4 => Some(DhcpMessageType::Decline),
            5 => Some(DhcpMessageType::Ack),
            6 => Some(DhcpMessageType::Nak),
            7 => Some(DhcpMessageType::Release),
            8 => Some(DhcpMessageType::Inform),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DhcpMessageType::Discover => "DISCOVER",
            DhcpMessageType::Offer => "OFFER",
            DhcpMessageType::Request => "REQUEST",
            DhcpMessageType::Decline => "DECLINE",
            DhcpMessageType::Ack => "ACK",
            DhcpMessageType::Nak => "NAK",
            DhcpMessageType::Release => "RELEASE",
            DhcpMessageType::Inform => "INFORM",
        }
    }
}

impl fmt::Display for DhcpMessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// DHCP Option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DhcpOption {
    Pad,
    SubnetMask(Ipv4Addr),
    Router(Vec<Ipv4Addr>),
    DnsServer(Vec<Ipv4Addr>),
    Hostname(String),
    RequestedIpAddress(Ipv4Addr),
    LeaseTime(u32),
    MessageType(DhcpMessageType),
    ServerId(Ipv4Addr),
    ParameterRequestList(Vec<u8>),
    Message(String),
    End,
    Unknown(u8, Vec<u8>),
}

fn ipv4_at(data: &[u8]) -> Ipv4Addr {
    Ipv4Addr::new(data[0], data[1], data[2], data[3])
}

fn exact_ipv4(name: &str, data: &[u8]) -> std::result::Result<Ipv4Addr, String> {
    if data.len() != 4 {
        return Err(format!("{} must be 4 bytes, got {}", name, data.len()));
    }
    Ok(ipv4_at(data))
}

fn ipv4_list(name: &str, data: &[u8]) -> std::result::Result<Vec<Ipv4Addr>, String> {
    if data.is_empty() || data.len() % 4 != 0 {
        return Err(format!("{} must be a non-empty multiple of 4 bytes", name));
    }
    Ok(data.chunks_exact(4).map(ipv4_at).collect())
}

impl DhcpOption {
    /// Decode one option body.
    ///
    /// Multi-byte integers arrive in network byte order and are returned in
    /// host order.
    pub fn parse(code: u8, data: &[u8]) -> std::result::Result<Self, String> {
        match code {
            0 => Ok(DhcpOption::Pad),
            1 => exact_ipv4("SubnetMask", data).map(DhcpOption::SubnetMask),
            3 => ipv4_list("Router", data).map(DhcpOption::Router),
            6 => ipv4_list("DnsServer", data).map(DhcpOption::DnsServer),
            12 => Ok(DhcpOption::Hostname(
                String::from_utf8_lossy(data).to_string(),
            )),
            50 => exact_ipv4("RequestedIpAddress", data).map(DhcpOption::RequestedIpAddress),
            51 => {
                let bytes: [u8; 4] = data
                    .try_into()
                    .map_err(|_| "LeaseTime must be 4 bytes".to_string())?;
                Ok(DhcpOption::LeaseTime(u32::from_be_bytes(bytes)))
            }
            53 => {
                if data.len() != 1 {
                    return Err("MessageType must be 1 byte".to_string());
                }
                DhcpMessageType::from_u8(data[0])
                    .map(DhcpOption::MessageType)
                    .ok_or_else(|| format!("Invalid message type: {}", data[0]))
            }
            54 => exact_ipv4("ServerId", data).map(DhcpOption::ServerId),
            55 => Ok(DhcpOption::ParameterRequestList(data.to_vec())),
            56 => Ok(DhcpOption::Message(
                String::from_utf8_lossy(data).to_string(),
            )),
            255 => Ok(DhcpOption::End),
            _ => Ok(DhcpOption::Unknown(code, data.to_vec())),
        }
    }

    /// Append the encoded option (code, length, body) to `out`.
    ///
    /// Bodies longer than the one-byte length field allows are truncated to
    /// 255 bytes; address lists keep only as many whole entries as fit.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        if matches!(self, DhcpOption::Pad | DhcpOption::End) {
            out.push(self.code());
            return;
        }

        let code = self.code();
        let mut put = |body: &[u8]| {
            let len = body.len().min(MAX_OPTION_LEN);
            if len < body.len() {
                warn!(code, len = body.len(), "Option body too long, truncating");
            }
            out.push(code);
            out.push(len as u8);
            out.extend_from_slice(&body[..len]);
        };

        match self {
            DhcpOption::Pad | DhcpOption::End => {}
            DhcpOption::SubnetMask(addr)
            | DhcpOption::RequestedIpAddress(addr)
            | DhcpOption::ServerId(addr) => put(&addr.octets()),
            DhcpOption::Router(addrs) | DhcpOption::DnsServer(addrs) => {
                let body: Vec<u8> = addrs
                    .iter()
                    .take(MAX_OPTION_LEN / 4)
                    .flat_map(|a| a.octets())
                    .collect();
                put(&body)
            }
            DhcpOption::Hostname(text) | DhcpOption::Message(text) => put(text.as_bytes()),
            DhcpOption::LeaseTime(secs) => put(&secs.to_be_bytes()),
            DhcpOption::MessageType(msg_type) => put(&[*msg_type as u8]),
            DhcpOption::ParameterRequestList(params) => put(params),
            DhcpOption::Unknown(_, data) => put(data),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            DhcpOption::Pad => 0,
            DhcpOption::SubnetMask(_) => 1,
            DhcpOption::Router(_) => 3,
            DhcpOption::DnsServer(_) => 6,
            DhcpOption::Hostname(_) => 12,
            DhcpOption::RequestedIpAddress(_) => 50,
            DhcpOption::LeaseTime(_) => 51,
            DhcpOption::MessageType(_) => 53,
            DhcpOption::ServerId(_) => 54,
            DhcpOption::ParameterRequestList(_) => 55,
            DhcpOption::Message(_) => 56,
            DhcpOption::End => 255,
            DhcpOption::Unknown(code, _) => *code,
        }
    }
}

/// DHCP Packet structure (RFC 2131)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpPacket {
    /// Message op code (1 = BOOTREQUEST, 2 = BOOTREPLY)
    pub op: u8,
    /// Hardware address type (1 = Ethernet)
    pub htype: u8,
    /// Hardware address length (6 for Ethernet)
    pub hlen: u8,
    pub hops: u8,
    /// Transaction ID
    pub xid: u32,
    /// Seconds elapsed since client began address acquisition
    pub secs: u16,
    /// Flags (broadcast bit)
    pub flags: u16,
    /// Client IP address (if known)
    pub ciaddr: Ipv4Addr,
    /// Your (client) IP address
    pub yiaddr: Ipv4Addr,
    /// Next server IP address
    pub siaddr: Ipv4Addr,
    /// Relay agent IP address
    pub giaddr: Ipv4Addr,
    /// Client hardware address (16 bytes, first hlen bytes used)
    pub chaddr: [u8; 16],
    /// Server host name and boot file name, carried opaquely
    pub sname: [u8; 64],
    pub file: [u8; 128],
    /// DHCP options, excluding the trailing End marker
    pub options: Vec<DhcpOption>,
}

impl DhcpPacket {
    /// Empty BOOTREQUEST for an Ethernet client
    pub fn new() -> Self {
        Self {
            op: BOOTREQUEST,
            htype: HTYPE_ETHERNET,
            hlen: HLEN_ETHERNET,
            hops: 0,
            xid: 0,
            secs: 0,
            flags: 0,
            ciaddr: Ipv4Addr::UNSPECIFIED,
            yiaddr: Ipv4Addr::UNSPECIFIED,
            siaddr: Ipv4Addr::UNSPECIFIED,
            giaddr: Ipv4Addr::UNSPECIFIED,
            chaddr: [0; 16],
            sname: [0; 64],
            file: [0; 128],
            options: Vec::new(),
        }
    }

    fn with_client(xid: u32, client_mac: MacAddr) -> Self {
        let mut packet = Self::new();
        packet.xid = xid;
        packet.flags = DHCP_BROADCAST_FLAG;
        packet.chaddr[..6].copy_from_slice(client_mac.as_bytes());
        packet
    }

    /// DISCOVER with the broadcast flag set
    pub fn new_discover(xid: u32, client_mac: MacAddr) -> Self {
        let mut packet = Self::with_client(xid, client_mac);
        packet.options = vec![
            DhcpOption::MessageType(DhcpMessageType::Discover),
            DhcpOption::ParameterRequestList(REQUESTED_PARAMETERS.to_vec()),
        ];
        packet
    }

    /// REQUEST for an offered address.
    ///
    /// The server identifier option is only written when known.
    pub fn new_request(
        xid: u32,
        client_mac: MacAddr,
        requested_ip: Ipv4Addr,
        server_id: Option<Ipv4Addr>,
    ) -> Self {
        let mut packet = Self::with_client(xid, client_mac);
        packet.options = vec![
            DhcpOption::MessageType(DhcpMessageType::Request),
            DhcpOption::RequestedIpAddress(requested_ip),
        ];
        if let Some(server) = server_id {
            packet.options.push(DhcpOption::ServerId(server));
        }
        packet
    }

    /// Decode a DHCP message.
    ///
    /// A malformed option is skipped with a warning; the rest of the message
    /// is still returned.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < OPTIONS_OFFSET {
            return Err(Error::PacketParsing(format!(
                "DHCP packet too short: {} bytes (minimum {})",
                data.len(),
                OPTIONS_OFFSET
            )));
        }

        let cookie = u32::from_be_bytes([data[236], data[237], data[238], data[239]]);
        if cookie != DHCP_MAGIC_COOKIE {
            return Err(Error::PacketParsing(format!(
                "Bad magic cookie {:#010x}",
                cookie
            )));
        }

        let mut chaddr = [0u8; 16];
        chaddr.copy_from_slice(&data[28..44]);
        let mut sname = [0u8; 64];
        sname.copy_from_slice(&data[44..108]);
        let mut file = [0u8; 128];
        file.copy_from_slice(&data[108..236]);

        let mut options = Vec::new();
        let mut offset = OPTIONS_OFFSET;

        while offset < data.len() {
            let code = data[offset];
            offset += 1;

            match code {
                0 => continue,
                255 => break,
                _ => {}
            }

            let Some(&length) = data.get(offset) else {
                break;
            };
            offset += 1;

            let end = offset + length as usize;
            if end > data.len() {
                return Err(Error::PacketParsing(format!(
                    "Option {} length {} exceeds packet size",
                    code, length
                )));
            }

            match DhcpOption::parse(code, &data[offset..end]) {
                Ok(option) => options.push(option),
                Err(e) => warn!(code, error = %e, "Skipping malformed DHCP option"),
            }
            offset = end;
        }

        Ok(Self {
            op: data[0],
            htype: data[1],
            hlen: data[2],
            hops: data[3],
            xid: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            secs: u16::from_be_bytes([data[8], data[9]]),
            flags: u16::from_be_bytes([data[10], data[11]]),
            ciaddr: ipv4_at(&data[12..16]),
            yiaddr: ipv4_at(&data[16..20]),
            siaddr: ipv4_at(&data[20..24]),
            giaddr: ipv4_at(&data[24..28]),
            chaddr,
            sname,
            file,
            options,
        })
    }

    /// Encode, terminating the options with End and padding to the BOOTP minimum
    pub fn build(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(576);

        bytes.extend_from_slice(&[self.op, self.htype, self.hlen, self.hops]);
        bytes.extend_from_slice(&self.xid.to_be_bytes());
        bytes.extend_from_slice(&self.secs.to_be_bytes());
        bytes.extend_from_slice(&self.flags.to_be_bytes());

        for addr in [self.ciaddr, self.yiaddr, self.siaddr, self.giaddr] {
            bytes.extend_from_slice(&addr.octets());
        }

        bytes.extend_from_slice(&self.chaddr);
        bytes.extend_from_slice(&self.sname);
        bytes.extend_from_slice(&self.file);
        bytes.extend_from_slice(&DHCP_MAGIC_COOKIE.to_be_bytes());

        for option in self
            .options
            .iter()
            .filter(|o| !matches!(o, DhcpOption::End))
        {
            option.encode_into(&mut bytes);
        }
        bytes.push(255);

        if bytes.len() < MIN_MESSAGE_LEN {
            bytes.resize(MIN_MESSAGE_LEN, 0);
        }
        bytes
    }

    fn find_option<T>(&self, pick: impl Fn(&DhcpOption) -> Option<T>) -> Option<T> {
        self.options.iter().find_map(pick)
    }

    /// Get the message type from options
    pub fn message_type(&self) -> Option<DhcpMessageType> {
        self.find_option(|opt| match opt {
            DhcpOption::MessageType(msg_type) => Some(*msg_type),
            _ => None,
        })
    }

    /// Server identifier option (54)
    pub fn server_id(&self) -> Option<Ipv4Addr> {
        self.find_option(|opt| match opt {
            DhcpOption::ServerId(addr) => Some(*addr),
            _ => None,
        })
    }

    /// Requested IP option (50)
    pub fn requested_ip(&self) -> Option<Ipv4Addr> {
        self.find_option(|opt| match opt {
            DhcpOption::RequestedIpAddress(addr) => Some(*addr),
            _ => None,
        })
    }

    /// Lease time option (51) in host byte order
    pub fn lease_time(&self) -> Option<u32> {
        self.find_option(|opt| match opt {
            DhcpOption::LeaseTime(secs) => Some(*secs),
            _ => None,
        })
    }

    /// DNS server option (6), in server preference order
    pub fn dns_servers(&self) -> Option<&[Ipv4Addr]> {
        self.options.iter().find_map(|opt| match opt {
            DhcpOption::DnsServer(addrs) => Some(addrs.as_slice()),
            _ => None,
        })
    }

    pub fn primary_dns(&self) -> Option<Ipv4Addr> {
        self.dns_servers()
            .and_then(|servers| servers.first().copied())
    }

    /// siaddr, or `None` when it is 0.0.0.0
    pub fn server_addr(&self) -> Option<Ipv4Addr> {
        (!self.siaddr.is_unspecified()).then_some(self.siaddr)
    }

    /// Client hardware address (first six bytes of chaddr)
    pub fn client_mac(&self) -> MacAddr {
        let mut mac = [0u8; 6];
        mac.copy_from_slice(&self.chaddr[..6]);
        MacAddr(mac)
    }

    pub fn is_broadcast(&self) -> bool {
        self.flags & DHCP_BROADCAST_FLAG != 0
    }

    pub fn is_reply(&self) -> bool {
        self.op == BOOTREPLY
    }
}

impl Default for DhcpPacket {
    fn default() -> Self {
        Self::new()
    }
}
