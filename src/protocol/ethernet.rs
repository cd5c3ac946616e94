//! Ethernet II / 802.1Q frame parsing and construction

use super::{EtherType, MacAddr, VlanTag};
use crate::{Error, Result};

/// Untagged header: dst(6) + src(6) + ethertype(2)
pub const HEADER_LEN: usize = 14;
/// TPID(2) + TCI(2)
pub const VLAN_TAG_LEN: usize = 4;
/// Maximum Ethernet frame size (without FCS, with VLAN tag)
pub const MAX_FRAME_SIZE: usize = 1522;

/// Decoded link-layer header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    pub dst: MacAddr,
    pub src: MacAddr,
    pub vlan: Option<VlanTag>,
    /// EtherType of the payload (after the tag, if any)
    pub ethertype: u16,
}

impl EthernetHeader {
    /// Header length on the wire.
    pub fn wire_len(&self) -> usize {
        match self.vlan {
            Some(_) => HEADER_LEN + VLAN_TAG_LEN,
            None => HEADER_LEN,
        }
    }

    /// Serialize header followed by `payload`.
    pub fn encode(&self, payload: &[u8]) -> Vec<u8> {
        let mut builder = FrameBuilder::with_capacity(self.wire_len() + payload.len())
            .dst_mac(self.dst)
            .src_mac(self.src);
        if let Some(tag) = self.vlan {
            builder = builder.vlan_tag(tag);
        }
        builder.ethertype(self.ethertype).payload(payload).build()
    }
}

/// Parsed Ethernet frame (zero-copy reference)
#[derive(Debug)]
pub struct Frame<'a> {
    buffer: &'a [u8],
    header: EthernetHeader,
}

impl<'a> Frame<'a> {
    /// Parse an Ethernet frame from a buffer
    pub fn parse(buffer: &'a [u8]) -> Result<Self> {
        if buffer.len() < HEADER_LEN {
            return Err(Error::Parse(format!(
                "frame too short ({} bytes)",
                buffer.len()
            )));
        }

        let dst = MacAddr::from_slice(&buffer[0..6])
            .ok_or_else(|| Error::Parse("frame too short".into()))?;
        let src = MacAddr::from_slice(&buffer[6..12])
            .ok_or_else(|| Error::Parse("frame too short".into()))?;
        let outer = u16::from_be_bytes([buffer[12], buffer[13]]);

        let header = if outer == EtherType::Vlan as u16 {
            if buffer.len() < HEADER_LEN + VLAN_TAG_LEN {
                return Err(Error::Parse("VLAN frame too short".into()));
            }
            EthernetHeader {
                dst,
                src,
                vlan: Some(VlanTag::from_bytes([buffer[14], buffer[15]])),
                ethertype: u16::from_be_bytes([buffer[16], buffer[17]]),
            }
        } else {
            EthernetHeader {
                dst,
                src,
                vlan: None,
                ethertype: outer,
            }
        };

        Ok(Self { buffer, header })
    }

    pub fn header(&self) -> &EthernetHeader {
        &self.header
    }

    pub fn dst_mac(&self) -> MacAddr {
        self.header.dst
    }

    pub fn src_mac(&self) -> MacAddr {
        self.header.src
    }

    pub fn ethertype(&self) -> u16 {
        self.header.ethertype
    }

    pub fn vlan_tag(&self) -> Option<VlanTag> {
        self.header.vlan
    }

    pub fn payload(&self) -> &'a [u8] {
        &self.buffer[self.header.wire_len()..]
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.buffer
    }

    /// Rebuild the frame with `tag` in place of the current tag.
    ///
    /// `None` strips an existing tag; `Some` inserts or replaces one. The
    /// addresses, inner EtherType and payload are carried over untouched.
    pub fn with_vlan_tag(&self, tag: Option<VlanTag>) -> Vec<u8> {
        EthernetHeader {
            vlan: tag,
            ..self.header
        }
        .encode(self.payload())
    }
}

/// Builder for constructing Ethernet frames
pub struct FrameBuilder {
    buffer: Vec<u8>,
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self::with_capacity(MAX_FRAME_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn dst_mac(mut self, mac: MacAddr) -> Self {
        self.buffer.extend_from_slice(&mac.0);
        self
    }

    pub fn src_mac(mut self, mac: MacAddr) -> Self {
        self.buffer.extend_from_slice(&mac.0);
        self
    }

    pub fn vlan_tag(mut self, tag: VlanTag) -> Self {
        self.buffer
            .extend_from_slice(&(EtherType::Vlan as u16).to_be_bytes());
        self.buffer.extend_from_slice(&tag.to_bytes());
        self
    }

    pub fn ethertype(mut self, ethertype: u16) -> Self {
        self.buffer.extend_from_slice(&ethertype.to_be_bytes());
        self
    }

    pub fn payload(mut self, payload: &[u8]) -> Self {
        self.buffer.extend_from_slice(payload);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.buffer
    }
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self::new()
    }
}
