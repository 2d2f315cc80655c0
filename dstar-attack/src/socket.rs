//! Raw link-layer transmission of DHCP messages

use dstar_core::{Error, PacketRoute, Result};
use dstar_dhcp::{DhcpPacket, DhcpSocket};
use dstar_packet::build_dhcp_frame;
use parking_lot::Mutex;
use pnet_datalink::DataLinkSender;
use tracing::trace;

/// Destination for complete Ethernet frames
pub trait FrameSink: Send {
    fn send_frame(&mut self, frame: &[u8]) -> Result<()>;
}

impl FrameSink for Box<dyn DataLinkSender> {
    fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        match self.send_to(frame, None) {
            Some(Ok(())) => Ok(()),
            Some(Err(e)) => Err(Error::send(format!("Failed to send frame: {}", e))),
            None => Err(Error::send("Sender buffer unavailable")),
        }
    }
}

/// [`DhcpSocket`] that frames each message itself.
///
/// The Ethernet source is the message's chaddr, so every spoofed client
/// appears on the wire with its own hardware address.
pub struct RawDhcpSocket<S> {
    sink: Mutex<S>,
}

impl<S: FrameSink> RawDhcpSocket<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }
}

impl<S: FrameSink> DhcpSocket for RawDhcpSocket<S> {
    fn send_message(&self, packet: &DhcpPacket, route: &PacketRoute) -> Result<usize> {
        let frame = build_dhcp_frame(packet.client_mac(), route, &packet.build());
        self.sink.lock().send_frame(&frame)?;
        trace!(len = frame.len(), dst = %route.destination_mac, "Frame sent");
        Ok(frame.len())
    }
}
