//! Frame pipeline
//!
//! One dispatcher per process. It owns the port registry and every table,
//! processes one input to completion and returns what must be sent.

use super::arp_processor::{process_arp, ArpAction};
use super::arp_table::ArpTable;
use super::command::{command_text, parse_command, Command};
use super::fdb::{Fdb, LearnOutcome, LearningPolicy};
use super::vlan::{self, Classified, Egress};
use super::{PortId, PortRegistry};
use crate::config::{SpecKind, TablesConfig};
use crate::protocol::arp::ArpPacket;
use crate::protocol::ethernet::{Frame, FrameBuilder};
use crate::protocol::{EtherType, MacAddr};
use crate::telemetry::MetricsRegistry;
use crate::transport::codec::MAX_PAYLOAD;
use crate::Result;
use std::borrow::Cow;
use std::net::Ipv4Addr;
use tracing::{debug, info, trace, warn};

/// Which lab element the pipeline acts as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Learning switch, first sighting wins
    Switch,
    /// 802.1Q switch, roaming hosts re-homed
    VSwitch,
    /// ARP endpoint, no forwarding between ports
    Arp,
}

impl Mode {
    /// Port specification syntax used by this mode.
    pub fn spec_kind(self) -> SpecKind {
        match self {
            Mode::Switch => SpecKind::Switch,
            Mode::VSwitch => SpecKind::VSwitch,
            Mode::Arp => SpecKind::Arp,
        }
    }
}

/// Something the transport has to emit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Frame { port: PortId, data: Vec<u8> },
    /// Operator-visible line
    Print(String),
}

/// The per-process frame pipeline
pub struct Dispatcher {
    mode: Mode,
    registry: PortRegistry,
    /// MAC learning table (switch modes)
    fdb: Fdb,
    /// IP to MAC bindings (arp mode)
    arp_table: ArpTable,
    metrics: MetricsRegistry,
}

impl Dispatcher {
    pub fn new(mode: Mode, registry: PortRegistry, tables: &TablesConfig) -> Self {
        let fdb = match mode {
            Mode::Switch => Fdb::new(tables.switch_fdb_capacity(), LearningPolicy::FirstSighting),
            Mode::VSwitch => Fdb::new(tables.vswitch_fdb_capacity(), LearningPolicy::Roaming),
            Mode::Arp => Fdb::new(0, LearningPolicy::FirstSighting),
        };
        debug!(?mode, policy = ?fdb.policy(), capacity = fdb.capacity(), "Learning table ready");
        let arp_table = ArpTable::new(match mode {
            Mode::Arp => tables.arp_capacity(),
            _ => 0,
        });
        let metrics = MetricsRegistry::new(registry.ids());

        Self {
            mode,
            registry,
            fdb,
            arp_table,
            metrics,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn registry(&self) -> &PortRegistry {
        &self.registry
    }

    pub fn fdb(&self) -> &Fdb {
        &self.fdb
    }

    pub fn arp_table(&self) -> &ArpTable {
        &self.arp_table
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Validate a port number received from the transport.
    pub fn resolve_port(&self, number: u16) -> Result<PortId> {
        self.registry.resolve(number)
    }

    /// Apply a hardware-address assignment.
    pub fn assign_address(&mut self, number: u16, mac: MacAddr) -> Result<PortId> {
        let id = self.registry.update_address(number, mac)?;
        info!(port = %self.registry.get(id).name, %mac, "Address assigned");
        Ok(id)
    }

    // ========================================
    // Frames
    // ========================================

    /// Process one frame received on `ingress`.
    ///
    /// Never returns a frame for `ingress` itself except an ARP reply in
    /// arp mode, which is answered on the port it was asked on.
    pub fn handle_frame(&mut self, ingress: PortId, data: &[u8]) -> Vec<Output> {
        let mut out = Vec::new();
        self.metrics.record_rx(ingress, data.len());

        let frame = match Frame::parse(data) {
            Ok(f) => f,
            Err(e) => {
                warn!(port = %self.registry.get(ingress).name, "Malformed frame: {}", e);
                self.metrics.record_rx_error(ingress);
                return out;
            }
        };

        match self.mode {
            Mode::Switch => self.switch_frame(ingress, &frame, &mut out),
            Mode::VSwitch => self.vswitch_frame(ingress, &frame, &mut out),
            Mode::Arp => self.arp_frame(ingress, &frame, &mut out),
        }

        out
    }

    fn switch_frame(&mut self, ingress: PortId, frame: &Frame<'_>, out: &mut Vec<Output>) {
        self.learn(frame.src_mac(), ingress);

        let dst = frame.dst_mac();
        match self.lookup_unicast(dst) {
            Some(egress) if egress == ingress => self.filter(ingress, dst),
            Some(egress) => {
                trace!("L2 forward {} to port {}", dst, egress);
                self.metrics.frames_forwarded.inc();
                self.transmit(egress, frame.as_bytes().to_vec(), out);
            }
            None => {
                trace!("L2 flood {} from port {}", dst, ingress);
                let ports: Vec<PortId> = self.registry.ids().filter(|&p| p != ingress).collect();
                for port in ports {
                    self.metrics.frames_flooded.inc();
                    self.transmit(port, frame.as_bytes().to_vec(), out);
                }
            }
        }
    }

    fn vswitch_frame(&mut self, ingress: PortId, frame: &Frame<'_>, out: &mut Vec<Output>) {
        let classified = match vlan::classify(frame.vlan_tag(), &self.registry.get(ingress).vlans)
        {
            Some(c) => c,
            None => {
                debug!(
                    port = %self.registry.get(ingress).name,
                    tag = ?frame.vlan_tag().map(|t| t.vid.value()),
                    "VLAN admission rejected"
                );
                self.metrics.vlan_rejected.inc();
                self.metrics.record_rx_drop(ingress);
                return;
            }
        };

        self.learn(frame.src_mac(), ingress);

        let dst = frame.dst_mac();
        match self.lookup_unicast(dst) {
            Some(egress) if egress == ingress => self.filter(ingress, dst),
            Some(egress) => match self.egress_copy(frame, &classified, egress) {
                Some(data) => {
                    trace!("L2 forward {} to port {} (VLAN {})", dst, egress, classified.vlan);
                    self.metrics.frames_forwarded.inc();
                    self.transmit(egress, data, out);
                }
                None => {
                    debug!(
                        "Port {} not in VLAN {}, dropping frame to {}",
                        egress, classified.vlan, dst
                    );
                    self.metrics.record_rx_drop(ingress);
                }
            },
            None => {
                trace!("L2 flood {} in VLAN {}", dst, classified.vlan);
                let ports: Vec<PortId> = self.registry.ids().filter(|&p| p != ingress).collect();
                for port in ports {
                    if let Some(data) = self.egress_copy(frame, &classified, port) {
                        self.metrics.frames_flooded.inc();
                        self.transmit(port, data, out);
                    }
                }
            }
        }
    }

    /// Bytes to send on `port`, or `None` if the port is outside the VLAN.
    fn egress_copy(
        &self,
        frame: &Frame<'_>,
        classified: &Classified,
        port: PortId,
    ) -> Option<Vec<u8>> {
        match vlan::egress(classified, &self.registry.get(port).vlans) {
            Egress::Deliver { tag } => Some(match vlan::rewrite(frame, tag) {
                Cow::Borrowed(bytes) => bytes.to_vec(),
                Cow::Owned(bytes) => bytes,
            }),
            Egress::Skip => None,
        }
    }

    fn arp_frame(&mut self, ingress: PortId, frame: &Frame<'_>, out: &mut Vec<Output>) {
        if frame.vlan_tag().is_some() || frame.ethertype() != EtherType::Arp as u16 {
            trace!(
                "Ignoring non-ARP frame (EtherType 0x{:04x}) on port {}",
                frame.ethertype(),
                ingress
            );
            return;
        }

        let packet = match ArpPacket::parse(frame.payload()) {
            Ok(p) => p,
            Err(e) => {
                warn!(port = %self.registry.get(ingress).name, "Malformed ARP packet: {}", e);
                self.metrics.record_rx_error(ingress);
                return;
            }
        };

        let port = self.registry.get(ingress);
        let action = process_arp(&packet, &mut self.arp_table, port);
        let local_mac = port.mac;
        self.metrics.set_arp_table_size(self.arp_table.len());

        if let ArpAction::Reply(reply) = action {
            let data = FrameBuilder::new()
                .dst_mac(reply.target_mac)
                .src_mac(local_mac)
                .ethertype(EtherType::Arp as u16)
                .payload(&reply.to_bytes())
                .build();
            debug!("Sending ARP reply to {}", reply.target_ip);
            if self.transmit(ingress, data, out) {
                self.metrics.arp_replies_sent.inc();
            }
        }
    }

    fn learn(&mut self, mac: MacAddr, port: PortId) {
        match self.fdb.learn(mac, port) {
            LearnOutcome::Learned => {
                trace!("Learned {} on port {}", mac, port);
                self.metrics.set_fdb_table_size(self.fdb.len());
            }
            LearnOutcome::Moved { from } => {
                debug!("{} moved from port {} to port {}", mac, from, port);
            }
            LearnOutcome::Pinned { port: known } => {
                trace!("{} seen on port {}, kept on port {}", mac, port, known);
            }
            LearnOutcome::TableFull => {
                debug!("Learning table full, {} not recorded", mac);
            }
            LearnOutcome::Refreshed | LearnOutcome::NotLearnable => {}
        }
    }

    /// Learned port for a unicast destination; group addresses always flood.
    fn lookup_unicast(&self, dst: MacAddr) -> Option<PortId> {
        if dst.is_multicast() {
            return None;
        }
        self.fdb.lookup(&dst)
    }

    fn filter(&self, ingress: PortId, dst: MacAddr) {
        trace!("L2 filter {} (same port {})", dst, ingress);
        self.metrics.frames_filtered.inc();
        self.metrics.record_rx_drop(ingress);
    }

    /// Queue `data` for `port` if it fits the port MTU.
    fn transmit(&self, port: PortId, data: Vec<u8>, out: &mut Vec<Output>) -> bool {
        let iface = self.registry.get(port);
        if data.len() > MAX_PAYLOAD {
            warn!(port = %iface.name, size = data.len(), "Frame too large for the transport, not sent");
            self.metrics.record_tx_error(port);
            return false;
        }
        if let Some(mtu) = iface.mtu {
            if data.len() > usize::from(mtu) {
                warn!(
                    port = %iface.name,
                    size = data.len(),
                    mtu,
                    "Frame exceeds MTU, not sent"
                );
                self.metrics.record_tx_error(port);
                return false;
            }
        }
        self.metrics.record_tx(port, data.len());
        out.push(Output::Frame { port, data });
        true
    }

    // ========================================
    // Operator commands
    // ========================================

    /// Process one control line.
    pub fn handle_command(&mut self, line: &str) -> Vec<Output> {
        let mut out = Vec::new();

        if self.mode != Mode::Arp {
            info!("Received command `{}` (ignored)", command_text(line));
            return out;
        }

        match parse_command(line) {
            Ok(Command::ShowArp) => {
                for (ip, entry) in self.arp_table.entries() {
                    out.push(Output::Print(format!(
                        "{} -> {} ({})",
                        ip,
                        entry.mac,
                        self.registry.get(entry.port).name
                    )));
                }
            }
            Ok(Command::Resolve { ip, interface }) => self.send_request(ip, &interface, &mut out),
            Ok(Command::Other(word)) => {
                warn!("Unsupported command `{}'", word);
            }
            Ok(Command::Empty) => {}
            Err(e) => warn!("{}", e),
        }

        out
    }

    /// Broadcast a who-has for `ip` on the named port.
    fn send_request(&self, ip: Ipv4Addr, interface: &str, out: &mut Vec<Output>) {
        let port = match self.registry.by_name(interface) {
            Ok(p) => p,
            Err(e) => {
                warn!("{}", e);
                return;
            }
        };

        let sender_ip = port.ipv4.map_or(Ipv4Addr::UNSPECIFIED, |cfg| cfg.addr);
        if let Some(cfg) = port.ipv4 {
            if !cfg.contains(ip) {
                debug!("{} is outside {} on {}", ip, cfg, port.name);
            }
        }

        let request = ArpPacket::request(port.mac, sender_ip, ip);
        let data = FrameBuilder::new()
            .dst_mac(MacAddr::BROADCAST)
            .src_mac(port.mac)
            .ethertype(EtherType::Arp as u16)
            .payload(&request.to_bytes())
            .build();

        debug!("Sending ARP request for {} on {}", ip, port.name);
        if self.transmit(port.id, data, out) {
            self.metrics.arp_requests_sent.inc();
        }
    }
}
