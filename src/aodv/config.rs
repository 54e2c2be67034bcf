//! Routing-layer timing and sizing parameters.

use crate::sim::SimTime;

#[derive(Debug, Clone)]
pub struct AodvConfig {
    /// Reception delay charged per byte before a routing frame is acted on.
    pub byte_time: SimTime,
    pub rreq_bytes: u32,
    pub rrep_bytes: u32,
    pub rerr_bytes: u32,
    pub data_bytes: u32,
    /// RREQ relays wait a uniform random jitter in `[jitter_min, jitter_max]`.
    pub jitter_min: SimTime,
    pub jitter_max: SimTime,
    /// Destination's pause before answering an RREQ.
    pub rrep_delay: SimTime,
    /// Requester's pause between receiving the RREP and starting data.
    pub start_delay: SimTime,
    /// Relay delay for RREP, RERR and DATA.
    pub forward_delay: SimTime,
    /// Pause between an RERR reaching the source and the new RREQ.
    pub rediscover_delay: SimTime,
    /// Cadence of DATA frames inside one transfer.
    pub data_interval: SimTime,
    /// Frames per transfer, drawn uniformly from `burst_min..=burst_max`.
    pub burst_min: u32,
    pub burst_max: u32,
    /// Sequence bump when a destination answers an RREQ.
    pub dest_seq_step: u32,
    /// Sequence bump before re-discovering a broken route.
    pub rediscover_seq_step: u32,
    /// Let intermediate nodes that know the destination answer for it.
    pub intermediate_reply: bool,
}

impl Default for AodvConfig {
    fn default() -> Self {
        Self {
            byte_time: SimTime::from_millis(1),
            rreq_bytes: 24,
            rrep_bytes: 20,
            rerr_bytes: 28,
            data_bytes: 64,
            jitter_min: SimTime::from_millis(200),
            jitter_max: SimTime::from_millis(800),
            rrep_delay: SimTime::from_secs(3),
            start_delay: SimTime::from_secs(5),
            forward_delay: SimTime::from_millis(200),
            rediscover_delay: SimTime::from_secs(5),
            data_interval: SimTime::from_secs(1),
            burst_min: 4,
            burst_max: 9,
            dest_seq_step: 10,
            rediscover_seq_step: 2,
            intermediate_reply: false,
        }
    }
}

impl AodvConfig {
    pub fn rx_delay(&self, bytes: u32) -> SimTime {
        self.byte_time.saturating_mul(bytes as u64)
    }
}
