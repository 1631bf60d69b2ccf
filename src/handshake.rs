//! The three-way handshake that negotiates the sliding-window size before
//! any data packet is sent. Sender and receiver each run the half of the
//! state machine described in §4.2: the sender is the active opener, the
//! receiver is passive and retries its SYN-ACK indefinitely.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::codec::{Flags, HandshakeWord};
use crate::transport::{Datagram, RecvOutcome};
use crate::Error;

/// Both peers' starting preference, per §4.2. The value actually used for
/// the data phase is whatever the SYN-ACK advertises.
pub const DEFAULT_WINDOW: u16 = 5;

#[derive(Debug, Clone, Copy)]
pub struct HandshakeConfig {
    pub handshake_timeout: Duration,
    pub max_retries: u32,
    pub receiver_retry_interval: Duration,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        HandshakeConfig {
            handshake_timeout: Duration::from_millis(2000),
            max_retries: 5,
            receiver_retry_interval: Duration::from_millis(1000),
        }
    }
}

/// Run the active-opener side of the handshake: emit SYN, wait for
/// SYN-ACK, reply with ACK, adopt the negotiated window size.
pub fn sender_handshake(
    transport: &mut impl Datagram,
    peer: SocketAddr,
    proposed_window: u16,
    cfg: &HandshakeConfig,
) -> Result<u16, Error> {
    let syn = HandshakeWord::new(proposed_window, Flags::SYN).encode();

    for retry in 0..cfg.max_retries {
        debug!(
            "handshake: sending SYN (window_size={}) attempt {}/{}",
            proposed_window,
            retry + 1,
            cfg.max_retries
        );
        transport.send_to(&syn, peer)?;

        let deadline = Instant::now() + cfg.handshake_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match transport.recv(remaining)? {
                RecvOutcome::Datagram { bytes, .. } if bytes.len() == 2 => {
                    let word = HandshakeWord::decode(&bytes)?;
                    if word.flags().contains(Flags::SYN | Flags::ACK) {
                        let negotiated = word.window_size();
                        info!("handshake: negotiated window_size={}", negotiated);

                        let ack = HandshakeWord::new(negotiated, Flags::ACK).encode();
                        transport.send_to(&ack, peer)?;

                        return Ok(negotiated);
                    }
                }
                RecvOutcome::Datagram { .. } => continue,
                RecvOutcome::TimedOut => break,
            }
        }

        warn!("handshake: timed out waiting for SYN-ACK, retrying");
    }

    Err(Error::HandshakeFailed {
        retries: cfg.max_retries,
    })
}

/// Run the passive side: wait for a SYN, answer with SYN-ACK carrying
/// `min(peer_window, preferred_window)`, then wait for the final ACK,
/// retransmitting the SYN-ACK on timeout without bound.
///
/// Returns the negotiated window size and the peer's address, which
/// becomes the bound remote endpoint for the rest of the session.
pub fn receiver_handshake(
    transport: &mut impl Datagram,
    preferred_window: u16,
    cfg: &HandshakeConfig,
) -> Result<(u16, SocketAddr), Error> {
    loop {
        let (peer, negotiated) = match transport.recv(Duration::from_secs(3600))? {
            RecvOutcome::Datagram { bytes, from } if bytes.len() == 2 => {
                let word = HandshakeWord::decode(&bytes)?;
                if !word.flags().contains(Flags::SYN) {
                    continue;
                }
                let negotiated = word.window_size().min(preferred_window);
                info!(
                    "handshake: received SYN from {} (peer_window={}), negotiating window_size={}",
                    from,
                    word.window_size(),
                    negotiated
                );
                (from, negotiated)
            }
            _ => continue,
        };

        let syn_ack = HandshakeWord::new(negotiated, Flags::SYN | Flags::ACK).encode();
        transport.send_to(&syn_ack, peer)?;

        let mut last_sent = Instant::now();
        loop {
            let remaining = cfg
                .receiver_retry_interval
                .saturating_sub(last_sent.elapsed());
            match transport.recv(remaining)? {
                RecvOutcome::Datagram { bytes, .. } if bytes.len() == 2 => {
                    let word = HandshakeWord::decode(&bytes)?;
                    if word.flags().contains(Flags::ACK) {
                        info!("handshake: received final ACK, ready for data phase");
                        return Ok((negotiated, peer));
                    }
                }
                RecvOutcome::Datagram { .. } => continue,
                RecvOutcome::TimedOut => {
                    debug!("handshake: ACK timed out, retransmitting SYN-ACK");
                    transport.send_to(&syn_ack, peer)?;
                    last_sent = Instant::now();
                }
            }
        }
    }
}
