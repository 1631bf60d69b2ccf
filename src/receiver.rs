//! Receiver core: accepts in-window data packets, acks them individually,
//! buffers out-of-order arrivals, and reassembles a contiguous byte stream.
//! Declares end-of-transfer via idle-timeout quiescence. §4.4-4.5.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use log::{trace, warn};

use crate::codec::{classify, AckPacket, DataPacket, Shape};
use crate::stats::ReceiverStats;
use crate::transport::{Datagram, RecvOutcome};
use crate::Error;

#[derive(Debug, Clone, Copy)]
pub struct ReceiverConfig {
    /// Silence interval after which the receiver declares quiescence.
    pub idle_timeout: Duration,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        ReceiverConfig {
            idle_timeout: Duration::from_secs(5),
        }
    }
}

/// Run the receive loop until `idle_timeout` passes with no datagram
/// arriving, then return the reassembled output buffer and statistics.
///
/// `window` is the size negotiated during the handshake; it bounds both
/// the acceptance window `[expected, expected + window)` and the
/// out-of-order buffer.
pub fn run(
    transport: &mut impl Datagram,
    window: u16,
    cfg: &ReceiverConfig,
) -> Result<(Vec<u8>, ReceiverStats), Error> {
    let window = window as u64;

    let mut expected: u64 = 1;
    let mut output: Vec<u8> = Vec::new();
    let mut out_of_order: BTreeMap<u64, Vec<u8>> = BTreeMap::new();
    let mut stats = ReceiverStats::default();
    let mut last_packet_time = Instant::now();

    loop {
        match transport.recv(cfg.idle_timeout)? {
            RecvOutcome::TimedOut => {
                if last_packet_time.elapsed() >= cfg.idle_timeout {
                    break;
                }
            }
            RecvOutcome::Datagram { bytes, from } => {
                last_packet_time = Instant::now();

                match classify(bytes.len()) {
                    Some(Shape::Handshake) => {
                        trace!("receiver: discarding stray handshake datagram from {}", from);
                    }
                    Some(Shape::Data) => {
                        let packet = DataPacket::decode(&bytes)?;
                        accept(
                            packet.seq as u64,
                            packet.payload,
                            from,
                            window,
                            &mut expected,
                            &mut output,
                            &mut out_of_order,
                            &mut stats,
                            transport,
                        )?;
                    }
                    Some(Shape::Ack) | None => {
                        warn!(
                            "receiver: dropping unexpected {}-byte datagram from {}",
                            bytes.len(),
                            from
                        );
                    }
                }
            }
        }
    }

    Ok((output, stats))
}

#[allow(clippy::too_many_arguments)]
fn accept(
    seq: u64,
    payload: &[u8],
    from: SocketAddr,
    window: u64,
    expected: &mut u64,
    output: &mut Vec<u8>,
    out_of_order: &mut BTreeMap<u64, Vec<u8>>,
    stats: &mut ReceiverStats,
    transport: &mut impl Datagram,
) -> Result<(), Error> {
    stats.packets_received += 1;

    if seq >= *expected && seq < *expected + window {
        ack(transport, from, seq, stats)?;

        if seq == *expected {
            output.extend_from_slice(payload);
            stats.bytes_received += payload.len() as u64;
            *expected += 1;

            while let Some(buffered) = out_of_order.remove(&*expected) {
                output.extend_from_slice(&buffered);
                stats.bytes_received += buffered.len() as u64;
                *expected += 1;
            }
        } else if !out_of_order.contains_key(&seq) {
            trace!("receiver: buffering out-of-order seq={}", seq);
            out_of_order.insert(seq, payload.to_vec());
            stats.out_of_order_packets += 1;
        } else {
            stats.duplicate_packets += 1;
        }
    } else if seq < *expected {
        // Duplicate of an already-delivered packet; the sender's original
        // ack was likely lost, so ack it again. Acked regardless of how
        // far in the past `seq` is — see the source spec's open question
        // about bounding this to a recent horizon.
        stats.duplicate_packets += 1;
        ack(transport, from, seq, stats)?;
    } else {
        // seq >= expected + window: outside the window. Drop silently,
        // do not ack, forcing a retransmit once the window has advanced.
        warn!("receiver: dropping out-of-window seq={} (expected={})", seq, *expected);
    }

    Ok(())
}

fn ack(
    transport: &mut impl Datagram,
    to: SocketAddr,
    seq: u64,
    stats: &mut ReceiverStats,
) -> Result<(), Error> {
    let bytes = AckPacket::encode(seq as u32);
    transport.send_to(&bytes, to)?;
    stats.acks_sent += 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::test_util::ChannelTransport;
    use std::net::{IpAddr, Ipv4Addr};

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
    }

    /// S4 — reordering: receiver observes 2, 1, 4, 3, 5. The final output
    /// must be bytes 1..5 in order, with 2 and 4 buffered until their
    /// predecessor arrives.
    #[test]
    fn reordered_arrivals_deliver_in_sequence() {
        let (mut recv_side, mut send_side) = ChannelTransport::pair(addr(10), addr(11));

        let payloads: Vec<Vec<u8>> = (1..=5u8).map(|n| vec![n; 4]).collect();
        let order = [2, 1, 4, 3, 5];

        let recv_cfg = ReceiverConfig {
            idle_timeout: Duration::from_millis(100),
        };
        let handle = std::thread::spawn(move || run(&mut recv_side, 5, &recv_cfg));

        for &seq in &order {
            let bytes = DataPacket::encode(seq, &payloads[(seq - 1) as usize]);
            send_side.send_to(&bytes, addr(10)).unwrap();

            // Drain the ack so the channel doesn't pile up (not asserted
            // here; the sender's own tests cover ack-driven retirement).
            let _ = send_side.recv(Duration::from_millis(50));
        }

        let (output, stats) = handle.join().unwrap().unwrap();
        let expected: Vec<u8> = (1..=5u8).flat_map(|n| vec![n; 4]).collect();
        assert_eq!(output, expected);
        assert!(stats.out_of_order_packets >= 2);
    }

    #[test]
    fn out_of_window_packets_are_dropped_without_ack() {
        let (mut recv_side, mut send_side) = ChannelTransport::pair(addr(12), addr(13));

        let recv_cfg = ReceiverConfig {
            idle_timeout: Duration::from_millis(80),
        };
        let handle = std::thread::spawn(move || run(&mut recv_side, 3, &recv_cfg));

        // expected starts at 1, window=3 => acceptable range is [1, 4).
        let bytes = DataPacket::encode(10, &[1, 2, 3]);
        send_side.send_to(&bytes, addr(12)).unwrap();

        // No ack should arrive for the out-of-window packet.
        let outcome = send_side.recv(Duration::from_millis(50)).unwrap();
        assert!(matches!(outcome, RecvOutcome::TimedOut));

        let (output, stats) = handle.join().unwrap().unwrap();
        assert!(output.is_empty());
        assert_eq!(stats.acks_sent, 0);
    }

    #[test]
    fn duplicate_below_expected_is_acked_again() {
        let (mut recv_side, mut send_side) = ChannelTransport::pair(addr(14), addr(15));

        let recv_cfg = ReceiverConfig {
            idle_timeout: Duration::from_millis(80),
        };
        let handle = std::thread::spawn(move || run(&mut recv_side, 5, &recv_cfg));

        let bytes = DataPacket::encode(1, &[9, 9]);
        send_side.send_to(&bytes, addr(14)).unwrap();
        let _ = send_side.recv(Duration::from_millis(50)).unwrap();

        // Re-deliver the same packet — it is now below `expected` (2).
        send_side.send_to(&bytes, addr(14)).unwrap();
        let dup_ack = send_side.recv(Duration::from_millis(50)).unwrap();
        assert!(matches!(dup_ack, RecvOutcome::Datagram { .. }));

        let (_output, stats) = handle.join().unwrap().unwrap();
        assert_eq!(stats.duplicate_packets, 1);
    }
}
