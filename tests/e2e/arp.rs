//! ARP endpoint E2E tests

use super::harness::{arp_frame, control_lines, eth_frame, frame_ports, mac, Lab};
use l2lab::dataplane::Mode;
use l2lab::protocol::arp::{ArpOp, ArpPacket};
use l2lab::protocol::ethernet::Frame;
use l2lab::protocol::MacAddr;
use l2lab::transport::Message;
use std::net::Ipv4Addr;

const LOCAL_MAC: u8 = 0x01;

fn deploy() -> Lab {
    let mut lab = Lab::deploy(
        Mode::Arp,
        &["eth0[IPV4:10.0.0.2/24]", "eth1[ipv4:172.16.0.1/12]=400"],
    );
    lab.assign(1, mac(LOCAL_MAC)).assign(2, mac(0x02));
    lab
}

fn only_frame(out: &[Message]) -> (u16, Vec<u8>) {
    match out {
        [Message::Frame { port, data }] => (*port, data.clone()),
        other => panic!("Expected a single frame, got {:?}", other),
    }
}

#[tokio::test]
async fn test_reply_and_table_dump() {
    let mut lab = deploy();
    let requester = mac(0x99);

    let request = ArpPacket::request(
        requester,
        Ipv4Addr::new(10, 0, 0, 1),
        Ipv4Addr::new(10, 0, 0, 2),
    );
    lab.inject(1, arp_frame(MacAddr::BROADCAST, &request));
    let out = lab.run().await.unwrap();

    let (port, data) = only_frame(&out);
    assert_eq!(port, 1);
    assert_eq!(data.len(), 42);

    let frame = Frame::parse(&data).unwrap();
    assert_eq!(frame.dst_mac(), requester);
    assert_eq!(frame.src_mac(), mac(LOCAL_MAC));

    let reply = ArpPacket::parse(frame.payload()).unwrap();
    assert_eq!(reply.operation, ArpOp::Reply);
    assert_eq!(reply.sender_mac, mac(LOCAL_MAC));
    assert_eq!(reply.sender_ip, Ipv4Addr::new(10, 0, 0, 2));
    assert_eq!(reply.target_mac, requester);
    assert_eq!(reply.target_ip, Ipv4Addr::new(10, 0, 0, 1));

    lab.command("arp\n");
    let out = lab.run().await.unwrap();
    assert_eq!(
        control_lines(&out),
        vec!["10.0.0.1 -> 02:00:00:00:00:99 (eth0)".to_string()]
    );
}

#[tokio::test]
async fn test_request_on_wrong_port_not_answered() {
    let mut lab = deploy();

    // 10.0.0.2 belongs to eth0, not eth1
    let request = ArpPacket::request(
        mac(0x99),
        Ipv4Addr::new(172, 16, 0, 9),
        Ipv4Addr::new(10, 0, 0, 2),
    );
    lab.inject(2, arp_frame(MacAddr::BROADCAST, &request));
    assert!(lab.run().await.unwrap().is_empty());

    // but the sender was still learned
    lab.command("arp");
    assert_eq!(
        control_lines(&lab.run().await.unwrap()),
        vec!["172.16.0.9 -> 02:00:00:00:00:99 (eth1)".to_string()]
    );
}

#[tokio::test]
async fn test_replies_are_learned_and_sorted() {
    let mut lab = deploy();

    let first = ArpPacket::reply(
        mac(0x30),
        Ipv4Addr::new(10, 0, 0, 30),
        mac(LOCAL_MAC),
        Ipv4Addr::new(10, 0, 0, 2),
    );
    let second = ArpPacket::reply(
        mac(0x04),
        Ipv4Addr::new(10, 0, 0, 4),
        mac(LOCAL_MAC),
        Ipv4Addr::new(10, 0, 0, 2),
    );
    lab.inject(1, arp_frame(mac(LOCAL_MAC), &first))
        .inject(1, arp_frame(mac(LOCAL_MAC), &second))
        .command("arp");
    let out = lab.run().await.unwrap();

    assert_eq!(frame_ports(&out), Vec::<u16>::new());
    assert_eq!(
        control_lines(&out),
        vec![
            "10.0.0.4 -> 02:00:00:00:00:04 (eth0)".to_string(),
            "10.0.0.30 -> 02:00:00:00:00:30 (eth0)".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_resolve_command_sends_broadcast_request() {
    let mut lab = deploy();

    lab.command("arp 172.16.5.5 ETH1\n");
    let out = lab.run().await.unwrap();

    let (port, data) = only_frame(&out);
    assert_eq!(port, 2);
    assert_eq!(data.len(), 42);

    let frame = Frame::parse(&data).unwrap();
    assert_eq!(frame.dst_mac(), MacAddr::BROADCAST);
    assert_eq!(frame.src_mac(), mac(0x02));

    let request = ArpPacket::parse(frame.payload()).unwrap();
    assert_eq!(request.operation, ArpOp::Request);
    assert_eq!(request.sender_mac, mac(0x02));
    assert_eq!(request.sender_ip, Ipv4Addr::new(172, 16, 0, 1));
    assert_eq!(request.target_ip, Ipv4Addr::new(172, 16, 5, 5));
}

#[tokio::test]
async fn test_command_errors_stay_off_the_wire() {
    let mut lab = deploy();

    lab.command("arp 10.0.0.256 eth0\n")
        .command("arp 10.0.0.5\n")
        .command("arp 10.0.0.5 eth7\n")
        .command("route\n");
    let out = lab.run().await.unwrap();

    assert!(out.is_empty());
    assert!(control_lines(&out).is_empty());
}

#[tokio::test]
async fn test_non_arp_traffic_ignored() {
    let mut lab = deploy();

    lab.inject(1, eth_frame(MacAddr::BROADCAST, mac(0x99), None))
        .inject(1, vec![0u8; 5])
        .command("arp");
    assert!(lab.run().await.unwrap().is_empty());
}
