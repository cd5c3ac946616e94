//! Link-layer wire formats
//!
//! Ethernet II with optional 802.1Q tag, and ARP for Ethernet/IPv4.

pub mod arp;
pub mod ethernet;
pub mod types;

pub use types::*;
