#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed packet: {len} bytes does not match any known wire shape")]
    MalformedPacket { len: usize },

    #[error("handshake failed after {retries} retries")]
    HandshakeFailed { retries: u32 },
}
