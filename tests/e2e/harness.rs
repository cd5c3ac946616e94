//! In-memory lab harness

use l2lab::config::{ports, TablesConfig};
use l2lab::dataplane::{Dispatcher, Mode, PortRegistry};
use l2lab::protocol::arp::ArpPacket;
use l2lab::protocol::ethernet::FrameBuilder;
use l2lab::protocol::{EtherType, MacAddr, VlanId, VlanTag};
use l2lab::transport::{self, encode, read_message, Message};
use l2lab::Result;

/// A pipeline plus the input queued for its next run
pub struct Lab {
    pub dispatcher: Dispatcher,
    input: Vec<u8>,
}

impl Lab {
    pub fn deploy(mode: Mode, specs: &[&str]) -> Self {
        let specs = ports::parse_all(mode.spec_kind(), specs).expect("invalid port specs");
        let registry = PortRegistry::from_specs(specs).expect("registry");
        Self {
            dispatcher: Dispatcher::new(mode, registry, &TablesConfig::default()),
            input: Vec::new(),
        }
    }

    fn push(&mut self, msg: Message) -> &mut Self {
        self.input.extend(encode(&msg).expect("encodable message"));
        self
    }

    pub fn assign(&mut self, port: u16, mac: MacAddr) -> &mut Self {
        self.push(Message::MacAssignment { port, mac })
    }

    pub fn inject(&mut self, port: u16, data: Vec<u8>) -> &mut Self {
        self.push(Message::Frame { port, data })
    }

    pub fn command(&mut self, line: &str) -> &mut Self {
        self.push(Message::Control(line.to_string()))
    }

    pub fn inject_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.input.extend_from_slice(bytes);
        self
    }

    /// Process everything queued so far and decode the output stream.
    pub async fn run(&mut self) -> Result<Vec<Message>> {
        let input = std::mem::take(&mut self.input);
        let mut reader = &input[..];
        let mut output = Vec::new();

        transport::run(&mut self.dispatcher, &mut reader, &mut output).await?;

        let mut messages = Vec::new();
        let mut stream = &output[..];
        while let Some(msg) = read_message(&mut stream).await? {
            messages.push(msg);
        }
        Ok(messages)
    }
}

pub fn frame_ports(messages: &[Message]) -> Vec<u16> {
    messages
        .iter()
        .filter_map(|m| match m {
            Message::Frame { port, .. } => Some(*port),
            _ => None,
        })
        .collect()
}

pub fn control_lines(messages: &[Message]) -> Vec<String> {
    messages
        .iter()
        .filter_map(|m| match m {
            Message::Control(line) => Some(line.clone()),
            _ => None,
        })
        .collect()
}

pub fn mac(last: u8) -> MacAddr {
    MacAddr([0x02, 0x00, 0x00, 0x00, 0x00, last])
}

pub fn eth_frame(dst: MacAddr, src: MacAddr, tag: Option<VlanTag>) -> Vec<u8> {
    let mut builder = FrameBuilder::new().dst_mac(dst).src_mac(src);
    if let Some(tag) = tag {
        builder = builder.vlan_tag(tag);
    }
    builder
        .ethertype(EtherType::Ipv4 as u16)
        .payload(&[0x45, 0x00, 0x00, 0x14, 0xde, 0xad])
        .build()
}

pub fn tag(vlan: u16) -> VlanTag {
    VlanTag::new(VlanId::new(vlan).expect("valid VLAN"))
}

pub fn arp_frame(dst: MacAddr, packet: &ArpPacket) -> Vec<u8> {
    FrameBuilder::new()
        .dst_mac(dst)
        .src_mac(packet.sender_mac)
        .ethertype(EtherType::Arp as u16)
        .payload(&packet.to_bytes())
        .build()
}
