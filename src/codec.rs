//! Wire layouts for the three packet shapes this protocol ever sends:
//! the 2-byte handshake control word, the 4-byte ack, and the
//! `4 + N`-byte data packet. Pure encode/decode, no I/O.

use crate::Error;

/// Fixed payload size carried by every data packet but possibly the last.
pub const CHUNK: usize = 972;

/// Handshake header size in bytes.
pub const HANDSHAKE_LEN: usize = 2;
/// Ack packet size in bytes.
pub const ACK_LEN: usize = 4;
/// Data packet header size in bytes (leading sequence number).
pub const DATA_HEADER_LEN: usize = 4;

/// Largest window size representable in the 13-bit field.
pub const MAX_WINDOW_SIZE: u16 = 0x1FFF;

bitflags::bitflags! {
    /// The 3 flag bits of a [`HandshakeWord`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Flags: u8 {
        const SYN = 0x1;
        const ACK = 0x2;
        const FIN = 0x4;
    }
}

/// The 16-bit handshake control word: `(window_size << 3) | flags`.
///
/// Decoding is total over the full `u16` space; there is no invalid bit
/// pattern. `set_window_size` saturates values above 8191 rather than
/// truncating or panicking, and never touches the flag bits (and
/// vice versa for `set_flags`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeWord {
    data: u16,
}

impl HandshakeWord {
    pub fn new(window_size: u16, flags: Flags) -> Self {
        let mut word = HandshakeWord { data: 0 };
        word.set_window_size(window_size);
        word.set_flags(flags);
        word
    }

    pub fn window_size(&self) -> u16 {
        (self.data >> 3) & MAX_WINDOW_SIZE
    }

    pub fn set_window_size(&mut self, window_size: u16) {
        let window_size = window_size.min(MAX_WINDOW_SIZE);
        self.data = (window_size << 3) | (self.data & 0x7);
    }

    pub fn flags(&self) -> Flags {
        Flags::from_bits_truncate((self.data & 0x7) as u8)
    }

    pub fn set_flags(&mut self, flags: Flags) {
        self.data = (self.data & !0x7) | (flags.bits() as u16 & 0x7);
    }

    pub fn encode(self) -> [u8; HANDSHAKE_LEN] {
        self.data.to_ne_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != HANDSHAKE_LEN {
            return Err(Error::MalformedPacket { len: bytes.len() });
        }
        let data = u16::from_ne_bytes([bytes[0], bytes[1]]);
        Ok(HandshakeWord { data })
    }
}

/// A decoded data packet: the sequence number and a borrowed payload slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataPacket<'a> {
    pub seq: u32,
    pub payload: &'a [u8],
}

impl<'a> DataPacket<'a> {
    /// Encode `seq` and `payload` into a single datagram buffer.
    ///
    /// `payload` must be non-empty and at most [`CHUNK`] bytes; this is a
    /// caller invariant, not re-validated here, since the sender core is
    /// the only caller and it derives `payload` from a chunked slice.
    pub fn encode(seq: u32, payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(DATA_HEADER_LEN + payload.len());
        buf.extend_from_slice(&seq.to_ne_bytes());
        buf.extend_from_slice(payload);
        buf
    }

    pub fn decode(bytes: &'a [u8]) -> Result<Self, Error> {
        if bytes.len() < DATA_HEADER_LEN + 1 {
            return Err(Error::MalformedPacket { len: bytes.len() });
        }
        let seq = u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        Ok(DataPacket {
            seq,
            payload: &bytes[DATA_HEADER_LEN..],
        })
    }
}

/// A 4-byte acknowledgment of a single sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckPacket {
    pub seq: u32,
}

impl AckPacket {
    pub fn encode(seq: u32) -> [u8; ACK_LEN] {
        seq.to_ne_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != ACK_LEN {
            return Err(Error::MalformedPacket { len: bytes.len() });
        }
        Ok(AckPacket {
            seq: u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        })
    }
}

/// The recognized shape of a received datagram, dispatched on length alone
/// per the wire format: payload size is never encoded, only recovered from
/// the datagram's length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Handshake,
    Ack,
    Data,
}

pub fn classify(len: usize) -> Option<Shape> {
    match len {
        HANDSHAKE_LEN => Some(Shape::Handshake),
        ACK_LEN => Some(Shape::Ack),
        n if n >= DATA_HEADER_LEN + 1 => Some(Shape::Data),
        _ => None,
    }
}
