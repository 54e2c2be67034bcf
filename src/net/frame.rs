//! On-air frames shared by the MAC and routing layers.
//!
//! Frames are immutable values: a relay builds a new frame (see [`RouteMsg::hop`])
//! instead of mutating the one it received, because the same frame is in flight
//! towards several neighbours at once.

use serde::{Deserialize, Serialize};

use super::id::NodeId;

/// Frame tag, used for statistics and the event trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    Rts,
    Cts,
    Ds,
    Data,
    Ack,
    Rrts,
    Rreq,
    Rrep,
    Rerr,
    RouteData,
}

/// MACAW control and data frames.
///
/// `backoff` is the sender's current contention window, piggybacked so that
/// overhearing neighbours can copy it.
#[derive(Debug, Clone, PartialEq)]
pub enum MacFrame {
    /// Request-to-send; `length` announces the pending data length.
    Rts { target: NodeId, length: u32, backoff: u32 },
    /// Clear-to-send, echoing the announced length.
    Cts { target: NodeId, length: u32, backoff: u32 },
    /// Data-sending announcement, sent between CTS and DATA.
    Ds { target: NodeId, length: u32, backoff: u32 },
    /// Data frame; `payload` carries an upper-layer message when routing runs on top.
    Data {
        target: NodeId,
        length: u32,
        seq: u64,
        payload: Option<RouteMsg>,
    },
    Ack { target: NodeId, backoff: u32 },
    /// Reverse RTS: invites a deferred sender to retry.
    Rrts { target: NodeId },
}

impl MacFrame {
    pub fn kind(&self) -> FrameKind {
        match self {
            MacFrame::Rts { .. } => FrameKind::Rts,
            MacFrame::Cts { .. } => FrameKind::Cts,
            MacFrame::Ds { .. } => FrameKind::Ds,
            MacFrame::Data { .. } => FrameKind::Data,
            MacFrame::Ack { .. } => FrameKind::Ack,
            MacFrame::Rrts { .. } => FrameKind::Rrts,
        }
    }

    pub fn target(&self) -> NodeId {
        match self {
            MacFrame::Rts { target, .. }
            | MacFrame::Cts { target, .. }
            | MacFrame::Ds { target, .. }
            | MacFrame::Data { target, .. }
            | MacFrame::Ack { target, .. }
            | MacFrame::Rrts { target } => *target,
        }
    }

    /// Piggybacked contention window, if this kind carries one.
    pub fn backoff(&self) -> Option<u32> {
        match self {
            MacFrame::Rts { backoff, .. }
            | MacFrame::Cts { backoff, .. }
            | MacFrame::Ds { backoff, .. }
            | MacFrame::Ack { backoff, .. } => Some(*backoff),
            MacFrame::Data { .. } | MacFrame::Rrts { .. } => None,
        }
    }
}

/// Routing message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Rreq,
    Rrep,
    /// Route error; names the destination that became unreachable and the
    /// next hop that vanished.
    Rerr {
        broken_dest: NodeId,
        broken_next: NodeId,
    },
    Data,
}

/// AODV message.
///
/// `src`/`dest` are the end points of the message, not of the current hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMsg {
    pub kind: RouteKind,
    pub src: NodeId,
    pub seq: u32,
    pub dest: NodeId,
    pub hops: u32,
    /// Bytes on air.
    pub length: u32,
}

impl RouteMsg {
    pub fn new(kind: RouteKind, src: NodeId, seq: u32, dest: NodeId, length: u32) -> Self {
        Self {
            kind,
            src,
            seq,
            dest,
            hops: 0,
            length,
        }
    }

    /// Copy of this message one hop further along.
    pub fn hop(&self) -> Self {
        Self {
            hops: self.hops.saturating_add(1),
            ..*self
        }
    }

    pub fn frame_kind(&self) -> FrameKind {
        match self.kind {
            RouteKind::Rreq => FrameKind::Rreq,
            RouteKind::Rrep => FrameKind::Rrep,
            RouteKind::Rerr { .. } => FrameKind::Rerr,
            RouteKind::Data => FrameKind::RouteData,
        }
    }
}

/// Anything that travels over the medium.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Mac(MacFrame),
    Route(RouteMsg),
}

impl Frame {
    pub fn kind(&self) -> FrameKind {
        match self {
            Frame::Mac(f) => f.kind(),
            Frame::Route(m) => m.frame_kind(),
        }
    }

    /// MAC frames name their next hop; routing messages are addressed by the sender's `unicast`.
    pub fn target(&self) -> Option<NodeId> {
        match self {
            Frame::Mac(f) => Some(f.target()),
            Frame::Route(_) => None,
        }
    }

    /// Payload bytes carried, if any. MAC control frames carry none.
    pub fn length(&self) -> Option<u32> {
        match self {
            Frame::Mac(MacFrame::Data { length, .. }) => Some(*length),
            Frame::Mac(_) => None,
            Frame::Route(m) => Some(m.length),
        }
    }
}
