//! Learning switch E2E tests
//!
//! Topology:
//! ```text
//!   host A ── p1 ┐
//!   host B ── p2 ┼─ switch
//!   host C ── p3 ┘
//! ```

use super::harness::{eth_frame, frame_ports, mac, Lab};
use l2lab::dataplane::Mode;
use l2lab::protocol::MacAddr;
use l2lab::transport::Message;
use l2lab::Error;

#[tokio::test]
async fn test_flood_then_unicast() {
    let mut lab = Lab::deploy(Mode::Switch, &["p1", "p2", "p3"]);
    let host_a = mac(0xaa);
    let host_b = mac(0xbb);

    let broadcast = eth_frame(MacAddr::BROADCAST, host_a, None);
    lab.inject(1, broadcast.clone());
    let out = lab.run().await.unwrap();
    assert_eq!(
        out,
        vec![
            Message::Frame {
                port: 2,
                data: broadcast.clone()
            },
            Message::Frame {
                port: 3,
                data: broadcast
            },
        ]
    );

    let reply = eth_frame(host_a, host_b, None);
    lab.inject(2, reply.clone());
    let out = lab.run().await.unwrap();
    assert_eq!(out, vec![Message::Frame { port: 1, data: reply }]);
}

#[tokio::test]
async fn test_unknown_unicast_floods() {
    let mut lab = Lab::deploy(Mode::Switch, &["p1", "p2", "p3"]);

    lab.inject(3, eth_frame(mac(0x01), mac(0x03), None));
    let out = lab.run().await.unwrap();
    assert_eq!(frame_ports(&out), vec![1, 2]);
}

#[tokio::test]
async fn test_first_port_kept_for_moved_host() {
    let mut lab = Lab::deploy(Mode::Switch, &["p1", "p2", "p3"]);

    lab.inject(1, eth_frame(MacAddr::BROADCAST, mac(0xaa), None))
        .inject(3, eth_frame(MacAddr::BROADCAST, mac(0xaa), None))
        .inject(2, eth_frame(mac(0xaa), mac(0xbb), None));
    let out = lab.run().await.unwrap();

    // two floods, then the unicast still goes to p1
    assert_eq!(frame_ports(&out), vec![2, 3, 1, 2, 1]);
}

#[tokio::test]
async fn test_commands_and_assignments_produce_no_output() {
    let mut lab = Lab::deploy(Mode::Switch, &["p1", "p2"]);

    lab.assign(1, mac(0x10))
        .assign(2, mac(0x20))
        .command("arp\n")
        .command("show fdb\n");
    let out = lab.run().await.unwrap();
    assert!(out.is_empty());

    let registry = lab.dispatcher.registry();
    assert_eq!(registry.by_name("p2").unwrap().mac, mac(0x20));
}

#[tokio::test]
async fn test_malformed_frame_is_not_fatal() {
    let mut lab = Lab::deploy(Mode::Switch, &["p1", "p2"]);

    lab.inject(1, vec![0xff; 8])
        .inject(1, eth_frame(MacAddr::BROADCAST, mac(0xaa), None));
    let out = lab.run().await.unwrap();
    assert_eq!(frame_ports(&out), vec![2]);
}

#[tokio::test]
async fn test_empty_stream() {
    let mut lab = Lab::deploy(Mode::Switch, &["p1"]);
    assert!(lab.run().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_port_is_fatal() {
    let mut lab = Lab::deploy(Mode::Switch, &["p1", "p2"]);

    lab.inject(3, eth_frame(MacAddr::BROADCAST, mac(0xaa), None));
    assert!(matches!(lab.run().await, Err(Error::UnknownPort(3))));

    lab.assign(9, mac(0x01));
    assert!(matches!(lab.run().await, Err(Error::UnknownPort(9))));
}

#[tokio::test]
async fn test_truncated_stream_is_fatal() {
    let mut lab = Lab::deploy(Mode::Switch, &["p1", "p2"]);

    // announces 64 bytes, delivers 6
    lab.inject_raw(&[0x00, 0x40, 0x00, 0x01, 0xff, 0xff]);
    assert!(matches!(lab.run().await, Err(Error::Transport(_))));
}

#[tokio::test]
async fn test_state_kept_up_to_fatal_error() {
    let mut lab = Lab::deploy(Mode::Switch, &["p1", "p2"]);

    lab.inject(1, eth_frame(MacAddr::BROADCAST, mac(0xaa), None))
        .inject_raw(&[0x00, 0x02]);
    // processing stops at the short header; the first frame was handled
    assert!(lab.run().await.is_err());
    assert_eq!(lab.dispatcher.fdb().len(), 1);
    assert_eq!(lab.dispatcher.metrics().frames_flooded.get(), 1);
}
