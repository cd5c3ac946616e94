//! VLAN-aware switch E2E tests
//!
//! Topology:
//! ```text
//!   access VLAN 10 ── p1 ┐
//!   trunk {10,20}  ── p2 ┼─ vswitch
//!   access VLAN 20 ── p3 ┘
//! ```

use super::harness::{eth_frame, frame_ports, mac, tag, Lab};
use l2lab::dataplane::Mode;
use l2lab::protocol::ethernet::{Frame, FrameBuilder};
use l2lab::protocol::{EtherType, MacAddr};
use l2lab::transport::codec::MAX_PAYLOAD;
use l2lab::transport::Message;

fn deploy() -> Lab {
    Lab::deploy(Mode::VSwitch, &["p1[U:10]", "p2[T:10,20]", "p3[U:20]"])
}

#[tokio::test]
async fn test_untagged_access_to_trunk() {
    let mut lab = Lab::deploy(Mode::VSwitch, &["p1[U:10]", "p2[T:10,20]"]);

    lab.inject(1, eth_frame(MacAddr::BROADCAST, mac(0xaa), None));
    let out = lab.run().await.unwrap();

    assert_eq!(
        out,
        vec![Message::Frame {
            port: 2,
            data: eth_frame(MacAddr::BROADCAST, mac(0xaa), Some(tag(10))),
        }]
    );
}

#[tokio::test]
async fn test_vlan_20_never_reaches_vlan_10_access() {
    let mut lab = Lab::deploy(Mode::VSwitch, &["p1[U:10]", "p2[T:10,20]"]);

    lab.inject(2, eth_frame(MacAddr::BROADCAST, mac(0xbb), Some(tag(20))));
    assert!(lab.run().await.unwrap().is_empty());

    // same frame reaches p1 once p1 is the VLAN 20 access port
    let mut lab = Lab::deploy(Mode::VSwitch, &["p1[U:20]", "p2[T:10,20]"]);
    lab.inject(2, eth_frame(MacAddr::BROADCAST, mac(0xbb), Some(tag(20))));
    let out = lab.run().await.unwrap();
    assert_eq!(
        out,
        vec![Message::Frame {
            port: 1,
            data: eth_frame(MacAddr::BROADCAST, mac(0xbb), None),
        }]
    );
}

#[tokio::test]
async fn test_flood_rewrites_per_port() {
    let mut lab = deploy();

    // tagged VLAN 20 from the trunk: only p3, untagged
    lab.inject(2, eth_frame(MacAddr::BROADCAST, mac(0xbb), Some(tag(20))));
    let out = lab.run().await.unwrap();
    assert_eq!(frame_ports(&out), vec![3]);

    // untagged from p3: only the trunk, tagged 20
    lab.inject(3, eth_frame(MacAddr::BROADCAST, mac(0xcc), None));
    let out = lab.run().await.unwrap();
    assert_eq!(
        out,
        vec![Message::Frame {
            port: 2,
            data: eth_frame(MacAddr::BROADCAST, mac(0xcc), Some(tag(20))),
        }]
    );
}

#[tokio::test]
async fn test_learned_unicast_across_trunk() {
    let mut lab = deploy();

    lab.inject(1, eth_frame(MacAddr::BROADCAST, mac(0xaa), None))
        .inject(2, eth_frame(mac(0xaa), mac(0xbb), Some(tag(10))));
    let out = lab.run().await.unwrap();

    assert_eq!(frame_ports(&out), vec![2, 1]);
    match &out[1] {
        Message::Frame { data, .. } => {
            let frame = Frame::parse(data).unwrap();
            assert!(frame.vlan_tag().is_none());
            assert_eq!(frame.dst_mac(), mac(0xaa));
        }
        other => panic!("Expected frame, got {:?}", other),
    }
}

#[tokio::test]
async fn test_priority_bits_preserved_on_trunk() {
    let mut lab = Lab::deploy(Mode::VSwitch, &["t1[T:10]", "t2[T:10]"]);
    let mut tagged = tag(10);
    tagged.pcp = 6;

    let data = eth_frame(MacAddr::BROADCAST, mac(0xaa), Some(tagged));
    lab.inject(1, data.clone());
    let out = lab.run().await.unwrap();
    assert_eq!(out, vec![Message::Frame { port: 2, data }]);
}

#[tokio::test]
async fn test_trunk_native_vlan() {
    let mut lab = Lab::deploy(Mode::VSwitch, &["p1[U:10]", "p2[T:20;U:10]"]);

    lab.inject(1, eth_frame(MacAddr::BROADCAST, mac(0xaa), None));
    let out = lab.run().await.unwrap();
    assert_eq!(
        out,
        vec![Message::Frame {
            port: 2,
            data: eth_frame(MacAddr::BROADCAST, mac(0xaa), None),
        }]
    );

    // the trunk's native VLAN is not accepted tagged
    lab.inject(2, eth_frame(MacAddr::BROADCAST, mac(0xbb), Some(tag(10))));
    assert!(lab.run().await.unwrap().is_empty());
    assert_eq!(lab.dispatcher.metrics().vlan_rejected.get(), 1);
}

#[tokio::test]
async fn test_roaming_host_follows_latest_port() {
    let mut lab = Lab::deploy(Mode::VSwitch, &["a", "b", "c"]);

    lab.inject(1, eth_frame(MacAddr::BROADCAST, mac(0xaa), None))
        .inject(3, eth_frame(MacAddr::BROADCAST, mac(0xaa), None))
        .inject(2, eth_frame(mac(0xaa), mac(0xbb), None));
    let out = lab.run().await.unwrap();

    assert_eq!(frame_ports(&out), vec![2, 3, 1, 2, 3]);
}

#[tokio::test]
async fn test_oversized_flood_skips_trunk_and_keeps_running() {
    let mut lab = Lab::deploy(Mode::VSwitch, &["p1[U:10]", "p2[T:10]"]);

    // largest frame the transport carries; tagging it would not fit
    let jumbo = FrameBuilder::new()
        .dst_mac(MacAddr::BROADCAST)
        .src_mac(mac(0xaa))
        .ethertype(EtherType::Ipv4 as u16)
        .payload(&vec![0u8; MAX_PAYLOAD - 14])
        .build();
    assert_eq!(jumbo.len(), MAX_PAYLOAD);

    lab.inject(1, jumbo)
        .inject(1, eth_frame(MacAddr::BROADCAST, mac(0xaa), None));
    let out = lab.run().await.unwrap();

    assert_eq!(
        out,
        vec![Message::Frame {
            port: 2,
            data: eth_frame(MacAddr::BROADCAST, mac(0xaa), Some(tag(10))),
        }]
    );
    let trunk = lab.dispatcher.resolve_port(2).unwrap();
    assert_eq!(lab.dispatcher.metrics().port(trunk).unwrap().tx_errors.get(), 1);
}
