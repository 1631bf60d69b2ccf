//! Sender core: the selective-repeat sliding-window state machine that
//! pushes a byte buffer to the receiver once the handshake has negotiated
//! a window size. §4.3.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use log::{debug, trace, warn};

use crate::codec::{AckPacket, DataPacket, CHUNK};
use crate::stats::SenderStats;
use crate::transport::{Datagram, RecvOutcome};
use crate::Error;

#[derive(Debug, Clone, Copy)]
pub struct SenderConfig {
    /// How long an unacked packet waits before retransmission.
    pub ack_timeout: Duration,
    /// How long phase 3 blocks waiting for an ack before moving on.
    pub poll_timeout: Duration,
}

impl Default for SenderConfig {
    fn default() -> Self {
        SenderConfig {
            ack_timeout: Duration::from_millis(500),
            poll_timeout: Duration::from_millis(10),
        }
    }
}

struct WindowEntry {
    bytes: Vec<u8>,
    send_time: Instant,
    acked: bool,
    retry_count: u32,
}

/// Number of `CHUNK`-sized packets needed to carry `len` bytes.
pub fn total_packets(len: usize) -> u64 {
    if len == 0 {
        0
    } else {
        ((len + CHUNK - 1) / CHUNK) as u64
    }
}

/// Drive the full selective-repeat transfer of `data` to `peer` over
/// `transport`, using the negotiated `window` size. Returns once every
/// packet has been acknowledged (`base > total_packets`), per §4.3's
/// termination rule.
pub fn run(
    transport: &mut impl Datagram,
    peer: SocketAddr,
    data: &[u8],
    window: u16,
    cfg: &SenderConfig,
) -> Result<SenderStats, Error> {
    let total = total_packets(data.len());
    let window = window as u64;

    let mut base: u64 = 1;
    let mut next_seq: u64 = 1;
    let mut entries: BTreeMap<u64, WindowEntry> = BTreeMap::new();
    let mut stats = SenderStats {
        total_packets: total,
        ..Default::default()
    };

    while base <= total {
        let now = Instant::now();

        // Phase 1 — fill the window.
        while next_seq < base + window && next_seq <= total {
            let offset = (next_seq - 1) as usize * CHUNK;
            let end = (offset + CHUNK).min(data.len());
            let payload = &data[offset..end];

            let bytes = DataPacket::encode(next_seq as u32, payload);
            transport.send_to(&bytes, peer)?;
            stats.bytes_sent += payload.len() as u64;

            entries.insert(
                next_seq,
                WindowEntry {
                    bytes,
                    send_time: now,
                    acked: false,
                    retry_count: 0,
                },
            );
            next_seq += 1;
        }

        // Phase 2 — scan for timeouts. A packet first sent in phase 1 this
        // iteration cannot be retransmitted here: its `send_time` was just
        // set to `now`, so `now - send_time` is zero.
        for (&seq, entry) in entries.iter_mut() {
            if entry.acked {
                continue;
            }
            if now.saturating_duration_since(entry.send_time) >= cfg.ack_timeout {
                debug!("sender: retransmitting seq={} (retry {})", seq, entry.retry_count + 1);
                if let Err(e) = transport.send_to(&entry.bytes, peer) {
                    warn!("sender: sendto failed for seq={}: {}", seq, e);
                    continue;
                }
                entry.send_time = now;
                entry.retry_count += 1;
                stats.retransmissions += 1;
            }
        }

        // Phase 3 — drain one ack, non-blockingly (bounded by poll_timeout).
        if let RecvOutcome::Datagram { bytes, .. } = transport.recv(cfg.poll_timeout)? {
            if bytes.len() == 4 {
                let ack = AckPacket::decode(&bytes)?;
                stats.acks_received += 1;
                trace!("sender: received ack for seq={}", ack.seq);

                if let Some(entry) = entries.get_mut(&(ack.seq as u64)) {
                    entry.acked = true;
                }

                while entries
                    .get(&base)
                    .map(|e| e.acked)
                    .unwrap_or(false)
                {
                    entries.remove(&base);
                    base += 1;
                }
            }
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receiver::{self, ReceiverConfig};
    use crate::transport::test_util::ChannelTransport;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
    }

    /// S1 — clean channel: 5000 bytes is exactly 6 packets
    /// (5 * 972 + 140), zero loss, output identical to input.
    #[test]
    fn clean_channel_round_trip() {
        let data: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
        assert_eq!(total_packets(data.len()), 6);

        let (mut send_side, mut recv_side) = ChannelTransport::pair(addr(1), addr(2));

        let recv_cfg = ReceiverConfig {
            idle_timeout: Duration::from_millis(200),
        };
        let recv_handle =
            std::thread::spawn(move || receiver::run(&mut recv_side, 5, &recv_cfg));

        let send_cfg = SenderConfig {
            ack_timeout: Duration::from_millis(50),
            poll_timeout: Duration::from_millis(20),
        };
        let stats = run(&mut send_side, addr(2), &data, 5, &send_cfg).unwrap();

        assert_eq!(stats.total_packets, 6);
        assert_eq!(stats.retransmissions, 0);

        let (output, _recv_stats) = recv_handle.join().unwrap().unwrap();
        assert_eq!(output, data);
    }

    /// S2 — packet 3 is dropped on its first two transmission attempts;
    /// the sender must retransmit until it gets through, and the final
    /// output must still match the input exactly.
    #[test]
    fn single_packet_loss_is_recovered() {
        let data: Vec<u8> = (0..(CHUNK * 10) as u32).map(|i| (i % 197) as u8).collect();

        let (mut send_side, mut recv_side) = ChannelTransport::pair(addr(3), addr(4));

        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();
        send_side.set_adversary(move |bytes| {
            if bytes.len() >= 5 {
                let seq = u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                if seq == 3 {
                    let n = attempts_clone.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        return vec![];
                    }
                }
            }
            vec![bytes.to_vec()]
        });

        let recv_cfg = ReceiverConfig {
            idle_timeout: Duration::from_millis(300),
        };
        let recv_handle = std::thread::spawn(move || receiver::run(&mut recv_side, 5, &recv_cfg));

        let send_cfg = SenderConfig {
            ack_timeout: Duration::from_millis(30),
            poll_timeout: Duration::from_millis(10),
        };
        let stats = run(&mut send_side, addr(4), &data, 5, &send_cfg).unwrap();

        assert!(stats.retransmissions >= 2);

        let (output, recv_stats) = recv_handle.join().unwrap().unwrap();
        assert_eq!(output, data);
        assert!(recv_stats.out_of_order_packets >= 1);
    }
}
