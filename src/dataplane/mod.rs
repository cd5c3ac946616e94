//! Data plane components
//!
//! Handles frame processing: learning, VLAN policy, ARP resolution and the
//! forwarding decision.

mod arp_processor;
mod arp_table;
mod command;
mod dispatcher;
mod fdb;
mod ports;
pub mod vlan;

pub use arp_processor::{process_arp, ArpAction};
pub use arp_table::{ArpEntry, ArpTable, ArpUpdate};
pub use command::{parse_command, Command, CommandError};
pub use dispatcher::{Dispatcher, Mode, Output};
pub use fdb::{Fdb, LearnOutcome, LearningPolicy};
pub use ports::{Ipv4Config, Port, PortId, PortRegistry, VlanMembership};
