//! l2lab - link-layer lab elements
//!
//! A learning Ethernet switch, a VLAN-aware (802.1Q) switch and an ARP
//! endpoint, all built on one frame-processing pipeline. Frames reach the
//! pipeline over a length-prefixed byte stream from the lab harness.

pub mod config;
pub mod dataplane;
pub mod error;
pub mod protocol;
pub mod telemetry;
pub mod transport;

pub use error::{Error, Result};
