//! Packet counters for the frame pipeline.
//!
//! Ports are fixed at startup, so the per-port table is built once and only
//! the counters themselves change afterwards.

use crate::dataplane::PortId;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counter.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, val: u64) {
        self.0.fetch_add(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-port statistics.
#[derive(Debug, Default)]
pub struct PortStats {
    pub rx_packets: Counter,
    pub rx_bytes: Counter,
    pub tx_packets: Counter,
    pub tx_bytes: Counter,
    /// Frames received here that were dropped by policy (VLAN, anti-loop).
    pub rx_drops: Counter,
    /// Frames received here that failed to parse.
    pub rx_errors: Counter,
    /// Frames not sent because they exceeded the port MTU.
    pub tx_errors: Counter,
}

impl PortStats {
    pub fn record_rx(&self, bytes: usize) {
        self.rx_packets.inc();
        self.rx_bytes.add(bytes as u64);
    }

    pub fn record_tx(&self, bytes: usize) {
        self.tx_packets.inc();
        self.tx_bytes.add(bytes as u64);
    }
}

/// Pipeline-wide metrics.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    ports: BTreeMap<PortId, PortStats>,

    /// Known-unicast deliveries.
    pub frames_forwarded: Counter,
    /// Copies emitted by floods.
    pub frames_flooded: Counter,
    /// Frames whose destination was learned on the ingress port.
    pub frames_filtered: Counter,
    pub vlan_rejected: Counter,
    pub arp_requests_sent: Counter,
    pub arp_replies_sent: Counter,

    pub fdb_table_size: AtomicU64,
    pub arp_table_size: AtomicU64,
}

impl MetricsRegistry {
    pub fn new(ports: impl IntoIterator<Item = PortId>) -> Self {
        Self {
            ports: ports
                .into_iter()
                .map(|id| (id, PortStats::default()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn port(&self, id: PortId) -> Option<&PortStats> {
        self.ports.get(&id)
    }

    pub fn record_rx(&self, id: PortId, bytes: usize) {
        if let Some(stats) = self.ports.get(&id) {
            stats.record_rx(bytes);
        }
    }

    pub fn record_tx(&self, id: PortId, bytes: usize) {
        if let Some(stats) = self.ports.get(&id) {
            stats.record_tx(bytes);
        }
    }

    pub fn record_rx_error(&self, id: PortId) {
        if let Some(stats) = self.ports.get(&id) {
            stats.rx_errors.inc();
        }
    }

    pub fn record_rx_drop(&self, id: PortId) {
        if let Some(stats) = self.ports.get(&id) {
            stats.rx_drops.inc();
        }
    }

    pub fn record_tx_error(&self, id: PortId) {
        if let Some(stats) = self.ports.get(&id) {
            stats.tx_errors.inc();
        }
    }

    pub fn set_fdb_table_size(&self, size: usize) {
        self.fdb_table_size.store(size as u64, Ordering::Relaxed);
    }

    pub fn set_arp_table_size(&self, size: usize) {
        self.arp_table_size.store(size as u64, Ordering::Relaxed);
    }

    /// All metrics as name/value pairs, per-port ones prefixed `portN_`.
    pub fn export(&self) -> Vec<(String, u64)> {
        let mut result = vec![
            ("frames_forwarded".into(), self.frames_forwarded.get()),
            ("frames_flooded".into(), self.frames_flooded.get()),
            ("frames_filtered".into(), self.frames_filtered.get()),
            ("vlan_rejected".into(), self.vlan_rejected.get()),
            ("arp_requests_sent".into(), self.arp_requests_sent.get()),
            ("arp_replies_sent".into(), self.arp_replies_sent.get()),
            (
                "fdb_table_size".into(),
                self.fdb_table_size.load(Ordering::Relaxed),
            ),
            (
                "arp_table_size".into(),
                self.arp_table_size.load(Ordering::Relaxed),
            ),
        ];

        for (id, stats) in &self.ports {
            result.extend([
                (format!("port{}_rx_packets", id), stats.rx_packets.get()),
                (format!("port{}_rx_bytes", id), stats.rx_bytes.get()),
                (format!("port{}_tx_packets", id), stats.tx_packets.get()),
                (format!("port{}_tx_bytes", id), stats.tx_bytes.get()),
                (format!("port{}_rx_drops", id), stats.rx_drops.get()),
                (format!("port{}_rx_errors", id), stats.rx_errors.get()),
                (format!("port{}_tx_errors", id), stats.tx_errors.get()),
            ]);
        }

        result
    }
}
