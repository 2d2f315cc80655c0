//! Network interface lookup and raw channels

use crate::{Error, MacAddr};
use pnet_datalink::{self, Channel, DataLinkReceiver, DataLinkSender, NetworkInterface};
use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Network interface
#[derive(Debug, Clone)]
pub struct Interface {
    /// Interface name (e.g., "eth0", "en0")
    pub name: String,
    /// Interface index
    pub index: u32,
    /// MAC address
    pub mac_address: MacAddr,
    /// Is interface up?
    pub is_up: bool,
    /// Assigned IPv4 addresses
    pub ipv4: Vec<Ipv4Addr>,
}

impl Interface {
    /// Create a new interface
    pub fn new(name: String, index: u32, mac_address: MacAddr) -> Self {
        Self {
            name,
            index,
            mac_address,
            is_up: true,
            ipv4: Vec::new(),
        }
    }

    fn from_pnet(iface: &NetworkInterface) -> Self {
        let mac_address = iface
            .mac
            .map(|mac| MacAddr([mac.0, mac.1, mac.2, mac.3, mac.4, mac.5]))
            .unwrap_or_else(MacAddr::zero);

        let ipv4 = iface
            .ips
            .iter()
            .filter_map(|net| match net {
                ipnetwork::IpNetwork::V4(v4) => Some(v4.ip()),
                ipnetwork::IpNetwork::V6(_) => None,
            })
            .collect();

        Self {
            name: iface.name.clone(),
            index: iface.index,
            mac_address,
            is_up: iface.is_up(),
            ipv4,
        }
    }

    fn find_pnet(name: &str) -> Result<NetworkInterface, Error> {
        pnet_datalink::interfaces()
            .into_iter()
            .find(|iface| iface.name == name)
            .ok_or_else(|| Error::InterfaceNotFound(name.to_string()))
    }

    /// Get interface by name
    pub fn by_name(name: &str) -> Result<Self, Error> {
        Ok(Self::from_pnet(&Self::find_pnet(name)?))
    }

    /// List all available interfaces
    pub fn list_all() -> Vec<Self> {
        pnet_datalink::interfaces()
            .iter()
            .map(Self::from_pnet)
            .collect()
    }

    /// Get the first IPv4 address of this interface
    pub fn first_ipv4(&self) -> Option<Ipv4Addr> {
        self.ipv4.first().copied()
    }

    /// Open a layer 2 channel on this interface.
    ///
    /// `read_timeout` bounds each blocking receive so the caller can poll
    /// its own stop flag between frames.
    pub fn open_channel(
        &self,
        read_timeout: Duration,
    ) -> Result<(Box<dyn DataLinkSender>, Box<dyn DataLinkReceiver>), Error> {
        let iface = Self::find_pnet(&self.name)?;
        let config = pnet_datalink::Config {
            read_timeout: Some(read_timeout),
            promiscuous: true,
            ..Default::default()
        };

        match pnet_datalink::channel(&iface, config) {
            Ok(Channel::Ethernet(tx, rx)) => Ok((tx, rx)),
            Ok(_) => Err(Error::Interface("Unsupported channel type".to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => Err(
                Error::InsufficientPrivileges(format!("Opening {}: {}", self.name, e)),
            ),
            Err(e) => Err(Error::Interface(format!("Failed to create channel: {}", e))),
        }
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.mac_address)?;
        if !self.is_up {
            write!(f, " [down]")?;
        }
        for ip in &self.ipv4 {
            write!(f, " {}", ip)?;
        }
        Ok(())
    }
}
