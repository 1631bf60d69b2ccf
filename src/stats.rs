//! Transfer statistics. These are reported to the operator but never
//! influence control flow (§7).

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SenderStats {
    pub total_packets: u64,
    pub bytes_sent: u64,
    pub acks_received: u64,
    pub retransmissions: u64,
}

impl SenderStats {
    pub fn retransmission_rate(&self) -> f64 {
        if self.total_packets == 0 {
            0.0
        } else {
            self.retransmissions as f64 * 100.0 / self.total_packets as f64
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    pub packets_received: u64,
    pub bytes_received: u64,
    pub duplicate_packets: u64,
    pub out_of_order_packets: u64,
    pub acks_sent: u64,
}

impl ReceiverStats {
    /// Loss rate relative to the caller-supplied `original_size` (bytes),
    /// which the receiver never reads content from — only its length is
    /// used here (§6).
    pub fn loss_rate(&self, original_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            let missing = original_size.saturating_sub(self.bytes_received);
            missing as f64 * 100.0 / original_size as f64
        }
    }
}
