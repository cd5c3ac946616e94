//! Forwarding Database (MAC address table)
//!
//! Maps learned source MAC addresses to the port they were seen on:
//! - one entry per MAC, bounded capacity
//! - full table rejects new MACs instead of evicting old ones
//! - no aging; entries live for the whole process
//! - re-homing of a known MAC depends on the [`LearningPolicy`]

use super::PortId;
use crate::protocol::MacAddr;
use std::collections::HashMap;

/// What to do when a known MAC shows up on a different port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearningPolicy {
    /// Keep the first port a MAC was seen on.
    FirstSighting,
    /// Move the entry to the most recent port.
    Roaming,
}

/// Result of a single `learn` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnOutcome {
    /// New entry added.
    Learned,
    /// Entry already pointed at this port.
    Refreshed,
    /// Entry moved from `from` to the new port.
    Moved { from: PortId },
    /// Known MAC seen elsewhere, kept on its original port.
    Pinned { port: PortId },
    /// Table full, MAC not recorded.
    TableFull,
    /// Group address, never learned.
    NotLearnable,
}

/// Forwarding Database for L2 switching
#[derive(Debug)]
pub struct Fdb {
    table: HashMap<MacAddr, PortId>,
    capacity: usize,
    policy: LearningPolicy,
}

impl Fdb {
    pub fn new(capacity: usize, policy: LearningPolicy) -> Self {
        Self {
            table: HashMap::new(),
            capacity,
            policy,
        }
    }

    // ========================================
    // MAC Learning
    // ========================================

    /// Learn a MAC address on a port
    ///
    /// Does not learn broadcast or multicast addresses. Updating an existing
    /// entry is allowed even when the table is full.
    pub fn learn(&mut self, mac: MacAddr, port: PortId) -> LearnOutcome {
        if mac.is_multicast() {
            return LearnOutcome::NotLearnable;
        }

        if let Some(current) = self.table.get_mut(&mac) {
            if *current == port {
                return LearnOutcome::Refreshed;
            }
            return match self.policy {
                LearningPolicy::FirstSighting => LearnOutcome::Pinned { port: *current },
                LearningPolicy::Roaming => {
                    let from = std::mem::replace(current, port);
                    LearnOutcome::Moved { from }
                }
            };
        }

        if self.table.len() >= self.capacity {
            return LearnOutcome::TableFull;
        }

        self.table.insert(mac, port);
        LearnOutcome::Learned
    }

    // ========================================
    // FDB Lookup
    // ========================================

    /// Lookup a MAC address in the FDB
    pub fn lookup(&self, mac: &MacAddr) -> Option<PortId> {
        self.table.get(mac).copied()
    }

    // ========================================
    // Utility Methods
    // ========================================

    pub fn policy(&self) -> LearningPolicy {
        self.policy
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get number of MAC entries
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Check if FDB is empty
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Entries in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (MacAddr, PortId)> + '_ {
        self.table.iter().map(|(mac, port)| (*mac, *port))
    }
}
