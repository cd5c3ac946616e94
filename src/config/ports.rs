//! Port specifications from the command line
//!
//! - switch:  `NAME`
//! - vswitch: `NAME`, `NAME[U:v]`, `NAME[T:v1,v2,...]`, `NAME[T:v1,...;U:v]`
//! - arp:     `NAME[IPV4:A.B.C.D/BITS]` with optional `=MTU`
//!
//! Every error here is fatal at startup.

use crate::dataplane::{Ipv4Config, VlanMembership};
use crate::protocol::VlanId;
use crate::{Error, Result};
use std::collections::HashSet;
use std::net::Ipv4Addr;

/// Default VLAN for vswitch ports given without a bracket spec
pub const DEFAULT_VLAN: u16 = 0;
/// MTU assumed when an arp port spec has no `=MTU`
pub const DEFAULT_MTU: u16 = 1500;
/// Smallest MTU accepted for an arp port
pub const MIN_MTU: u16 = 400;

/// Parsed attributes of one port, in command-line order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSpec {
    pub name: String,
    pub ipv4: Option<Ipv4Config>,
    pub mtu: Option<u16>,
    pub vlans: VlanMembership,
}

/// Which tool the specs are for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecKind {
    Switch,
    VSwitch,
    Arp,
}

fn spec_error(index: usize, reason: impl Into<String>) -> Error {
    Error::PortSpec {
        index,
        reason: reason.into(),
    }
}

fn default_vlan() -> VlanMembership {
    // DEFAULT_VLAN is within range
    VlanMembership::access(VlanId::from_wire(DEFAULT_VLAN))
}

/// Split `NAME[INNER]REST` into its parts.
fn split_brackets(index: usize, arg: &str) -> Result<(&str, Option<(&str, &str)>)> {
    let Some(open) = arg.find('[') else {
        return Ok((arg, None));
    };
    let name = &arg[..open];
    let after = &arg[open + 1..];
    let close = after
        .find(']')
        .ok_or_else(|| spec_error(index, "includes '[' but lacks ']'"))?;
    Ok((name, Some((&after[..close], &after[close + 1..]))))
}

fn check_name(index: usize, name: &str) -> Result<String> {
    if name.is_empty() {
        return Err(spec_error(index, "interface name is empty"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(spec_error(index, format!("interface name `{name}' contains whitespace")));
    }
    Ok(name.to_string())
}

fn parse_vlan_id(index: usize, token: &str) -> Result<VlanId> {
    let token = token.trim();
    let value: u32 = token
        .parse()
        .map_err(|_| spec_error(index, format!("expected VLAN number, got `{token}'")))?;
    u16::try_from(value)
        .ok()
        .and_then(VlanId::new)
        .ok_or_else(|| spec_error(index, format!("{value} is too large for a 802.1Q VLAN ID")))
}

/// Plain switch port: just a name.
pub fn parse_switch(index: usize, arg: &str) -> Result<PortSpec> {
    let (name, brackets) = split_brackets(index, arg)?;
    if brackets.is_some() {
        return Err(spec_error(index, "switch ports take no bracket specification"));
    }
    Ok(PortSpec {
        name: check_name(index, name)?,
        ipv4: None,
        mtu: None,
        vlans: default_vlan(),
    })
}

/// VLAN-aware switch port.
pub fn parse_vswitch(index: usize, arg: &str) -> Result<PortSpec> {
    let (name, brackets) = split_brackets(index, arg)?;
    let name = check_name(index, name)?;

    let Some((inner, rest)) = brackets else {
        return Ok(PortSpec {
            name,
            ipv4: None,
            mtu: None,
            vlans: default_vlan(),
        });
    };
    if !rest.is_empty() {
        return Err(spec_error(index, format!("unexpected `{rest}' after ']'")));
    }

    let mut tagged: Option<Vec<VlanId>> = None;
    let mut untagged: Option<VlanId> = None;

    for segment in inner.split(';') {
        let segment = segment.trim();
        let mut chars = segment.chars();
        let kind = chars.next();
        let body = chars.as_str();
        let list = body.strip_prefix(':');

        match (kind, list) {
            (Some('T'), Some(list)) => {
                if tagged.is_some() {
                    return Err(spec_error(index, "tagged definition given twice"));
                }
                let vlans = list
                    .split(',')
                    .map(|tok| parse_vlan_id(index, tok))
                    .collect::<Result<Vec<_>>>()?;
                tagged = Some(vlans);
            }
            (Some('U'), Some(value)) => {
                if untagged.is_some() {
                    return Err(spec_error(index, "untagged definition given twice"));
                }
                untagged = Some(parse_vlan_id(index, value)?);
            }
            (Some('T'), None) => return Err(spec_error(index, "tagged definition lacks ':'")),
            (Some('U'), None) => return Err(spec_error(index, "untagged definition lacks ':'")),
            _ => {
                return Err(spec_error(
                    index,
                    format!("unsupported tagged/untagged specification `{segment}'"),
                ))
            }
        }
    }

    let vlans = match (tagged, untagged) {
        (Some(tagged), untagged) => {
            if let Some(u) = untagged.filter(|u| tagged.contains(u)) {
                return Err(spec_error(
                    index,
                    format!("VLAN {u} is both tagged and untagged"),
                ));
            }
            VlanMembership::trunk(tagged, untagged)
        }
        (None, Some(untagged)) => VlanMembership::access(untagged),
        (None, None) => return Err(spec_error(index, "empty VLAN specification")),
    };

    Ok(PortSpec {
        name,
        ipv4: None,
        mtu: None,
        vlans,
    })
}

fn parse_network(index: usize, net: &str) -> Result<Ipv4Config> {
    const PREFIX: &str = "IPV4:";
    let body = match net.get(..PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(PREFIX) => &net[PREFIX.len()..],
        _ => {
            return Err(spec_error(
                index,
                format!("network `{net}' does not start with `IPV4:'"),
            ))
        }
    };
    let (ip, bits) = body
        .split_once('/')
        .ok_or_else(|| spec_error(index, format!("network `{body}' lacks '/'")))?;
    let addr: Ipv4Addr = ip
        .parse()
        .map_err(|_| spec_error(index, format!("IP address `{ip}' malformed")))?;
    let prefix_len: u8 = bits
        .parse()
        .map_err(|_| spec_error(index, format!("netmask `{bits}' malformed")))?;
    if prefix_len > 32 {
        return Err(spec_error(index, "netmask invalid (too large)"));
    }
    Ok(Ipv4Config { addr, prefix_len })
}

/// ARP endpoint port: name, IPv4 network and optional MTU.
pub fn parse_arp(index: usize, arg: &str) -> Result<PortSpec> {
    let (name, brackets) = split_brackets(index, arg)?;
    let (inner, rest) = brackets.ok_or_else(|| spec_error(index, "lacks '['"))?;
    let name = check_name(index, name)?;
    let ipv4 = parse_network(index, inner)?;

    let mtu = if rest.is_empty() {
        DEFAULT_MTU
    } else {
        let value = rest
            .strip_prefix('=')
            .ok_or_else(|| spec_error(index, format!("unexpected `{rest}' after ']'")))?;
        let mtu: u16 = value
            .parse()
            .map_err(|_| spec_error(index, "MTU not a number"))?;
        if mtu < MIN_MTU {
            return Err(spec_error(index, "MTU too small"));
        }
        mtu
    };

    Ok(PortSpec {
        name,
        ipv4: Some(ipv4),
        mtu: Some(mtu),
        vlans: default_vlan(),
    })
}

/// Parse all arguments for `kind`; interfaces are numbered from 1.
pub fn parse_all<S: AsRef<str>>(kind: SpecKind, args: &[S]) -> Result<Vec<PortSpec>> {
    let parse: fn(usize, &str) -> Result<PortSpec> = match kind {
        SpecKind::Switch => parse_switch,
        SpecKind::VSwitch => parse_vswitch,
        SpecKind::Arp => parse_arp,
    };

    let mut seen = HashSet::new();
    args.iter()
        .enumerate()
        .map(|(i, arg)| {
            let spec = parse(i + 1, arg.as_ref())?;
            if !seen.insert(spec.name.to_ascii_lowercase()) {
                return Err(spec_error(
                    i + 1,
                    format!("duplicate interface name `{}'", spec.name),
                ));
            }
            Ok(spec)
        })
        .collect()
}
