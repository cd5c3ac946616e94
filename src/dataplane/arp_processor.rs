//! ARP packet processor
//!
//! Learns sender bindings and decides whether a packet must be answered.

use super::arp_table::{ArpTable, ArpUpdate};
use super::Port;
use crate::protocol::arp::{ArpOp, ArpPacket};
use tracing::{debug, info, warn};

/// Result of processing an ARP packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArpAction {
    /// Send this reply back out the ingress port
    Reply(ArpPacket),
    /// Sender binding recorded, nothing to send
    Learned,
    /// Nothing recorded and nothing to send
    Ignored,
}

/// Process an incoming ARP packet received on `ingress`
///
/// The sender binding is learned for every operation code. Only requests
/// whose target address is the ingress port's own address are answered.
pub fn process_arp(packet: &ArpPacket, table: &mut ArpTable, ingress: &Port) -> ArpAction {
    if packet.is_gratuitous() {
        info!(
            port = %ingress.name,
            ip = %packet.sender_ip,
            mac = %packet.sender_mac,
            "Gratuitous ARP"
        );
    }

    let learned = match table.learn(packet.sender_ip, packet.sender_mac, ingress.id) {
        ArpUpdate::Inserted => {
            debug!(ip = %packet.sender_ip, mac = %packet.sender_mac, port = %ingress.name, "ARP entry added");
            true
        }
        ArpUpdate::Updated { previous } => {
            debug!(
                ip = %packet.sender_ip,
                old_mac = %previous.mac,
                mac = %packet.sender_mac,
                port = %ingress.name,
                "ARP entry updated"
            );
            true
        }
        ArpUpdate::Unchanged => true,
        ArpUpdate::TableFull => {
            warn!(ip = %packet.sender_ip, "ARP table full, binding not recorded");
            false
        }
    };

    let local = match ingress.ipv4 {
        Some(cfg) => cfg,
        None => return if learned { ArpAction::Learned } else { ArpAction::Ignored },
    };

    if packet.operation == ArpOp::Request && packet.target_ip == local.addr {
        debug!(
            requester = %packet.sender_ip,
            port = %ingress.name,
            "Answering ARP request"
        );
        return ArpAction::Reply(ArpPacket::reply(
            ingress.mac,
            local.addr,
            packet.sender_mac,
            packet.sender_ip,
        ));
    }

    if learned {
        ArpAction::Learned
    } else {
        ArpAction::Ignored
    }
}
