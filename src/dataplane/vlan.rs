//! 802.1Q admission and egress tagging
//!
//! Ingress: a tagged frame is admitted when its VLAN is in the port's tagged
//! set; an untagged frame is admitted when the port has an untagged VLAN and
//! is then classified into it.
//!
//! Egress: a frame on VLAN `v` leaves port `q` untagged when `v` is `q`'s
//! untagged VLAN, tagged when `v` is in `q`'s tagged set, and not at all
//! otherwise.

use super::VlanMembership;
use crate::protocol::ethernet::Frame;
use crate::protocol::{VlanId, VlanTag};
use std::borrow::Cow;

/// Admitted frame's VLAN context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classified {
    /// Effective VLAN of the frame
    pub vlan: VlanId,
    /// Tag carried on ingress, if any
    pub tag: Option<VlanTag>,
}

/// Ingress admission.
///
/// Returns `None` when the port does not accept the frame.
pub fn classify(tag: Option<VlanTag>, ingress: &VlanMembership) -> Option<Classified> {
    match tag {
        Some(tag) if ingress.is_tagged(tag.vid) => Some(Classified {
            vlan: tag.vid,
            tag: Some(tag),
        }),
        Some(_) => None,
        None => ingress.untagged().map(|vlan| Classified { vlan, tag: None }),
    }
}

/// Egress decision for one port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Egress {
    /// Send with `tag` (`None` = untagged)
    Deliver { tag: Option<VlanTag> },
    /// Port is not a member of the frame's VLAN
    Skip,
}

/// Egress tagging for a classified frame leaving through `egress`.
///
/// An ingress tag is reused so its priority bits survive; otherwise a fresh
/// tag with priority 0 is built.
pub fn egress(frame: &Classified, egress: &VlanMembership) -> Egress {
    if egress.untagged() == Some(frame.vlan) {
        Egress::Deliver { tag: None }
    } else if egress.is_tagged(frame.vlan) {
        let tag = frame.tag.unwrap_or_else(|| VlanTag::new(frame.vlan));
        Egress::Deliver { tag: Some(tag) }
    } else {
        Egress::Skip
    }
}

/// Frame bytes carrying `tag`.
///
/// Borrows the received buffer when the tagging already matches.
pub fn rewrite<'a>(frame: &Frame<'a>, tag: Option<VlanTag>) -> Cow<'a, [u8]> {
    if frame.vlan_tag() == tag {
        Cow::Borrowed(frame.as_bytes())
    } else {
        Cow::Owned(frame.with_vlan_tag(tag))
    }
}
