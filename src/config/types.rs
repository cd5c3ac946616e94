//! Runtime configuration types (optional TOML file)

use crate::telemetry::LogConfig;
use serde::Deserialize;

/// Learning-table size of the plain switch
pub const SWITCH_FDB_CAPACITY: usize = 1024;
/// Learning-table size of the VLAN-aware switch
pub const VSWITCH_FDB_CAPACITY: usize = 500;
/// ARP table size of the arp tool
pub const ARP_TABLE_CAPACITY: usize = 500;

/// Runtime configuration (`--config FILE`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LogConfig,
    #[serde(default)]
    pub tables: TablesConfig,
}

/// Table capacities; unset values fall back to the per-tool defaults
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TablesConfig {
    pub fdb_capacity: Option<usize>,
    pub arp_capacity: Option<usize>,
}

impl TablesConfig {
    pub fn switch_fdb_capacity(&self) -> usize {
        self.fdb_capacity.unwrap_or(SWITCH_FDB_CAPACITY)
    }

    pub fn vswitch_fdb_capacity(&self) -> usize {
        self.fdb_capacity.unwrap_or(VSWITCH_FDB_CAPACITY)
    }

    pub fn arp_capacity(&self) -> usize {
        self.arp_capacity.unwrap_or(ARP_TABLE_CAPACITY)
    }
}
