//! MACAW timing and contention parameters.

use crate::net::{FrameKind, MacFrame};
use crate::sim::SimTime;

#[derive(Debug, Clone)]
pub struct MacConfig {
    /// Time to put one byte on air.
    pub byte_time: SimTime,
    pub rts_bytes: u32,
    pub cts_bytes: u32,
    pub ds_bytes: u32,
    pub rrts_bytes: u32,
    pub ack_bytes: u32,
    /// Smallest contention window (slots).
    pub min_window: u32,
    /// Largest contention window (slots).
    pub max_window: u32,
    /// RTS/CTS response timeout, in slots.
    pub timeout_slots: u64,
    /// Extra bytes of airtime between DS and DATA, so DATA never lands
    /// while the receiver is still decoding DS.
    pub settle_bytes: u32,
}

impl Default for MacConfig {
    fn default() -> Self {
        Self {
            byte_time: SimTime::from_millis(20),
            rts_bytes: 30,
            cts_bytes: 30,
            ds_bytes: 30,
            rrts_bytes: 30,
            ack_bytes: 8,
            min_window: 2,
            max_window: 64,
            timeout_slots: 3,
            settle_bytes: 5,
        }
    }
}

impl MacConfig {
    pub fn airtime(&self, bytes: u32) -> SimTime {
        self.byte_time.saturating_mul(bytes as u64)
    }

    /// One slot is the time needed to send a CTS.
    pub fn slot_time(&self) -> SimTime {
        self.airtime(self.cts_bytes)
    }

    pub fn handshake_timeout(&self) -> SimTime {
        self.slot_time().saturating_mul(self.timeout_slots)
    }

    /// Gap between sending DS and sending DATA.
    pub fn settle_delay(&self) -> SimTime {
        self.airtime(self.ds_bytes)
            .saturating_add(self.airtime(self.settle_bytes))
    }

    /// How long a sender waits for the ACK after putting DATA on air.
    pub fn ack_timeout(&self, length: u32) -> SimTime {
        self.airtime(length)
            .saturating_add(self.airtime(self.ack_bytes))
            .saturating_add(self.slot_time())
    }

    /// Silence owed by a node that overheard a CTS for `length` bytes:
    /// DS, DATA and ACK of the reserved exchange.
    pub fn reservation_time(&self, length: u32) -> SimTime {
        self.settle_delay()
            .saturating_add(self.airtime(length))
            .saturating_add(self.airtime(self.ack_bytes))
    }

    /// Bytes on air for a control frame kind.
    pub fn control_bytes(&self, kind: FrameKind) -> u32 {
        match kind {
            FrameKind::Rts => self.rts_bytes,
            FrameKind::Cts => self.cts_bytes,
            FrameKind::Ds => self.ds_bytes,
            FrameKind::Rrts => self.rrts_bytes,
            FrameKind::Ack => self.ack_bytes,
            _ => 0,
        }
    }

    pub fn frame_bytes(&self, frame: &MacFrame) -> u32 {
        match frame {
            MacFrame::Data { length, .. } => *length,
            other => self.control_bytes(other.kind()),
        }
    }
}
