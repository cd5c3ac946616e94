//! ARP table (IP to MAC mapping)
//!
//! Populated passively from the sender fields of every ARP packet seen.
//! Bounded, no aging, no eviction.

use super::PortId;
use crate::protocol::MacAddr;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

/// ARP table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpEntry {
    pub mac: MacAddr,
    /// Port the binding was learned on
    pub port: PortId,
}

/// Result of [`ArpTable::learn`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpUpdate {
    Inserted,
    Updated { previous: ArpEntry },
    Unchanged,
    TableFull,
}

/// ARP table for IP to MAC resolution, ordered by address
#[derive(Debug)]
pub struct ArpTable {
    entries: BTreeMap<Ipv4Addr, ArpEntry>,
    capacity: usize,
}

impl ArpTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            capacity,
        }
    }

    /// Insert or update the binding for `ip`.
    ///
    /// The newest observation always wins for a known address; new
    /// addresses are refused once the table is full.
    pub fn learn(&mut self, ip: Ipv4Addr, mac: MacAddr, port: PortId) -> ArpUpdate {
        let entry = ArpEntry { mac, port };

        if let Some(current) = self.entries.get_mut(&ip) {
            if *current == entry {
                return ArpUpdate::Unchanged;
            }
            let previous = std::mem::replace(current, entry);
            return ArpUpdate::Updated { previous };
        }

        if self.entries.len() >= self.capacity {
            return ArpUpdate::TableFull;
        }

        self.entries.insert(ip, entry);
        ArpUpdate::Inserted
    }

    /// Lookup MAC address for an IP
    pub fn lookup(&self, ip: &Ipv4Addr) -> Option<ArpEntry> {
        self.entries.get(ip).copied()
    }

    /// All bindings in ascending address order.
    pub fn entries(&self) -> impl Iterator<Item = (Ipv4Addr, ArpEntry)> + '_ {
        self.entries.iter().map(|(ip, entry)| (*ip, *entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
