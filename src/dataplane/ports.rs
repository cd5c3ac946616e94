//! Port registry
//!
//! Ports are created once at startup from the command line and live for the
//! whole process. Only the hardware address may change afterwards, when the
//! harness announces the address it assigned.

use crate::config::PortSpec;
use crate::protocol::{MacAddr, VlanId};
use crate::{Error, Result};
use std::collections::BTreeSet;
use std::fmt;
use std::net::Ipv4Addr;

/// Opaque 1-based port number.
///
/// Only the registry hands these out, so holding one means the port exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortId(u16);

impl PortId {
    /// Wire representation (transport message type).
    pub fn number(self) -> u16 {
        self.0
    }

    fn index(self) -> usize {
        usize::from(self.0) - 1
    }

    #[cfg(test)]
    pub(crate) fn for_test(number: u16) -> Self {
        PortId(number)
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// IPv4 address and prefix of a routing-capable port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Config {
    pub addr: Ipv4Addr,
    pub prefix_len: u8,
}

impl Ipv4Config {
    pub fn netmask(&self) -> Ipv4Addr {
        let bits = match self.prefix_len {
            0 => 0,
            len => u32::MAX << (32 - u32::from(len.min(32))),
        };
        Ipv4Addr::from(bits)
    }

    /// Whether `ip` is on this port's subnet.
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        let mask = u32::from(self.netmask());
        u32::from(ip) & mask == u32::from(self.addr) & mask
    }
}

impl fmt::Display for Ipv4Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix_len)
    }
}

/// VLAN membership of a port
///
/// An access port has exactly one untagged VLAN and no tagged set; a trunk
/// has a tagged set and optionally one untagged VLAN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VlanMembership {
    untagged: Option<VlanId>,
    tagged: BTreeSet<VlanId>,
}

impl VlanMembership {
    pub fn access(vlan: VlanId) -> Self {
        Self {
            untagged: Some(vlan),
            tagged: BTreeSet::new(),
        }
    }

    pub fn trunk(tagged: impl IntoIterator<Item = VlanId>, untagged: Option<VlanId>) -> Self {
        Self {
            untagged,
            tagged: tagged.into_iter().collect(),
        }
    }

    /// VLAN carried without a tag, if any.
    pub fn untagged(&self) -> Option<VlanId> {
        self.untagged
    }

    pub fn is_tagged(&self, vlan: VlanId) -> bool {
        self.tagged.contains(&vlan)
    }

    /// Whether `vlan` is carried on this port at all, tagged or not.
    pub fn carries(&self, vlan: VlanId) -> bool {
        self.untagged == Some(vlan) || self.is_tagged(vlan)
    }

    pub fn tagged(&self) -> impl Iterator<Item = VlanId> + '_ {
        self.tagged.iter().copied()
    }
}

impl fmt::Display for VlanMembership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tagged: Vec<String> = self.tagged.iter().map(|v| v.to_string()).collect();
        match (self.untagged, tagged.is_empty()) {
            (Some(u), true) => write!(f, "access U:{u}"),
            (Some(u), false) => write!(f, "trunk T:{} U:{u}", tagged.join(",")),
            (None, _) => write!(f, "trunk T:{}", tagged.join(",")),
        }
    }
}

/// A configured network attachment point
#[derive(Debug, Clone)]
pub struct Port {
    pub id: PortId,
    pub name: String,
    pub mac: MacAddr,
    pub ipv4: Option<Ipv4Config>,
    /// Largest frame this port may transmit; `None` means unchecked.
    pub mtu: Option<u16>,
    pub vlans: VlanMembership,
}

/// Owned, contiguous set of ports indexed by `PortId`
#[derive(Debug, Clone, Default)]
pub struct PortRegistry {
    ports: Vec<Port>,
}

impl PortRegistry {
    /// Build the registry; ports are numbered in spec order starting at 1.
    pub fn from_specs(specs: Vec<PortSpec>) -> Result<Self> {
        if specs.len() >= usize::from(u16::MAX) {
            return Err(Error::Config(format!("too many ports ({})", specs.len())));
        }

        let ports = specs
            .into_iter()
            .enumerate()
            .map(|(i, spec)| Port {
                // bounded by the check above
                id: PortId(i as u16 + 1),
                name: spec.name,
                mac: MacAddr::ZERO,
                ipv4: spec.ipv4,
                mtu: spec.mtu,
                vlans: spec.vlans,
            })
            .collect();

        Ok(Self { ports })
    }

    /// Validate a port number coming from the transport.
    pub fn resolve(&self, number: u16) -> Result<PortId> {
        if number == 0 || usize::from(number) > self.ports.len() {
            return Err(Error::UnknownPort(number));
        }
        Ok(PortId(number))
    }

    pub fn get(&self, id: PortId) -> &Port {
        &self.ports[id.index()]
    }

    /// Case-insensitive lookup used by operator commands.
    pub fn by_name(&self, name: &str) -> Result<&Port> {
        self.ports
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::InterfaceNotFound {
                name: name.to_string(),
            })
    }

    /// Apply a hardware-address assignment from the harness.
    pub fn update_address(&mut self, number: u16, mac: MacAddr) -> Result<PortId> {
        let id = self.resolve(number)?;
        self.ports[id.index()].mac = mac;
        Ok(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = PortId> + '_ {
        self.ports.iter().map(|p| p.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter()
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}
