//! Full-stack scenarios: handshake followed by a complete selective-repeat
//! transfer, each driving the real sender/receiver cores against an
//! in-memory channel under an adversarial delivery schedule.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use srudp::codec::CHUNK;
use srudp::handshake::{self, HandshakeConfig};
use srudp::receiver::{self, ReceiverConfig};
use srudp::sender::{self, SenderConfig};
use srudp::transport::test_util::ChannelTransport;

fn addr(port: u16) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
}

fn sample_data(len: usize) -> Vec<u8> {
    (0..len as u32).map(|i| (i % 256) as u8).collect()
}

/// S5 then data transfer: sender proposes window 8, receiver prefers 5;
/// both must use 5 for the entire data phase, and the transfer must
/// still complete correctly under that negotiated window.
#[test]
fn handshake_negotiation_then_clean_transfer() {
    let (mut sender_t, mut receiver_t) = ChannelTransport::pair(addr(100), addr(101));

    let fast_cfg = HandshakeConfig {
        handshake_timeout: Duration::from_millis(50),
        max_retries: 5,
        receiver_retry_interval: Duration::from_millis(50),
    };
    let recv_cfg = fast_cfg;

    let receiver_side = std::thread::spawn(move || {
        let (window, _peer) =
            handshake::receiver_handshake(&mut receiver_t, 5, &recv_cfg).unwrap();
        let receiver_cfg = ReceiverConfig {
            idle_timeout: Duration::from_millis(200),
        };
        receiver::run(&mut receiver_t, window, &receiver_cfg).unwrap()
    });

    let window = handshake::sender_handshake(&mut sender_t, addr(101), 8, &fast_cfg).unwrap();
    assert_eq!(window, 5);

    let data = sample_data(CHUNK * 3 + 17);
    let stats = sender::run(
        &mut sender_t,
        addr(101),
        &data,
        window,
        &SenderConfig {
            ack_timeout: Duration::from_millis(40),
            poll_timeout: Duration::from_millis(10),
        },
    )
    .unwrap();
    assert_eq!(stats.retransmissions, 0);

    let (output, _recv_stats) = receiver_side.join().unwrap();
    assert_eq!(output, data);
}

/// S3 — every ack from the receiver is dropped with 50% probability.
/// Delivery must still complete, with some duplicate packets observed at
/// the receiver from acks that were lost and caused a retransmit.
#[test]
fn lossy_acks_still_complete_the_transfer() {
    let (mut sender_t, mut receiver_t) = ChannelTransport::pair(addr(110), addr(111));

    // LCG for deterministic "50% of acks" without pulling in `rand`.
    let state = Arc::new(AtomicU32::new(12345));
    receiver_t.set_adversary(move |bytes| {
        let prev = state.load(Ordering::Relaxed);
        let next = prev.wrapping_mul(1103515245).wrapping_add(12345);
        state.store(next, Ordering::Relaxed);
        if (next >> 16) % 2 == 0 {
            vec![]
        } else {
            vec![bytes.to_vec()]
        }
    });

    let data = sample_data(CHUNK * 10 + 1);

    let receiver_side = std::thread::spawn(move || {
        receiver::run(
            &mut receiver_t,
            5,
            &ReceiverConfig {
                idle_timeout: Duration::from_millis(300),
            },
        )
        .unwrap()
    });

    let stats = sender::run(
        &mut sender_t,
        addr(111),
        &data,
        5,
        &SenderConfig {
            ack_timeout: Duration::from_millis(20),
            poll_timeout: Duration::from_millis(5),
        },
    )
    .unwrap();
    assert!(stats.retransmissions > 0);

    let (output, recv_stats) = receiver_side.join().unwrap();
    assert_eq!(output, data);
    assert!(recv_stats.duplicate_packets > 0);
}

/// S6 — the receiver never answers. The sender must exhaust its 5
/// retries at the configured handshake timeout and fail.
#[test]
fn handshake_retry_exhaustion_reports_failure() {
    let (mut sender_t, _receiver_t) = ChannelTransport::pair(addr(120), addr(121));

    let cfg = HandshakeConfig {
        handshake_timeout: Duration::from_millis(10),
        max_retries: 5,
        receiver_retry_interval: Duration::from_millis(10),
    };

    let err = handshake::sender_handshake(&mut sender_t, addr(121), 5, &cfg).unwrap_err();
    assert!(matches!(
        err,
        srudp::Error::HandshakeFailed { retries: 5 }
    ));
}
