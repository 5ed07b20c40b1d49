//! Downstream Data Flow
//!
//! The [`Downstream`] trait is the consumer side of the pad link: it answers
//! caps queries during negotiation and receives events and buffers from the
//! streaming task.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use stillsrc_caps::Caps;

use crate::buffer::{FrameBuffer, TagList};

/// Outcome of pushing a buffer downstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowReturn {
    /// Buffer accepted
    Ok,

    /// The peer stopped consuming (end of stream)
    ///
    /// Expected when the consumer is done; never reported as an error.
    Eos,

    /// The pad has no peer
    NotLinked,

    /// The peer does not accept the negotiated format
    NotNegotiated,

    /// Any other downstream failure
    Error,
}

impl FlowReturn {
    /// Short name, as printed in error messages
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Eos => "eos",
            Self::NotLinked => "not-linked",
            Self::NotNegotiated => "not-negotiated",
            Self::Error => "error",
        }
    }

    /// Whether the push succeeded
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Whether the result must be escalated as a fatal stream error
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::NotLinked | Self::NotNegotiated | Self::Error)
    }
}

impl fmt::Display for FlowReturn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Timeline announcement bounding a run of buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Running time of the first buffer in the segment
    pub start: Duration,

    /// End of the segment, `None` for open-ended
    pub stop: Option<Duration>,
}

impl Segment {
    /// Open-ended segment starting at `start`
    pub const fn open(start: Duration) -> Self {
        Self { start, stop: None }
    }
}

/// Side-channel events sent ahead of buffers
#[derive(Debug, Clone, PartialEq)]
pub enum PadEvent {
    /// New segment for the buffers that follow
    Segment(Segment),

    /// Metadata derived from the next buffer
    Tags(TagList),
}

/// Consumer end of the pad link
pub trait Downstream: Send + Sync {
    /// Formats the peer accepts; `None` if it cannot answer
    fn caps(&self) -> Option<Caps>;

    /// Deliver an event; `false` if the peer refused it
    fn push_event(&self, event: PadEvent) -> bool;

    /// Deliver a buffer; may block under backpressure
    fn push(&self, buffer: FrameBuffer) -> FlowReturn;
}

/// Stand-in peer used while the pad is unlinked
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Unlinked;

impl Downstream for Unlinked {
    fn caps(&self) -> Option<Caps> {
        None
    }

    fn push_event(&self, _event: PadEvent) -> bool {
        false
    }

    fn push(&self, _buffer: FrameBuffer) -> FlowReturn {
        FlowReturn::NotLinked
    }
}

/// Current downstream link
///
/// Readers clone the `Arc` and drop the lock before pushing, so a blocked
/// push never holds up [`PeerSlot::link`].
#[derive(Default)]
pub(crate) struct PeerSlot {
    peer: RwLock<Option<Arc<dyn Downstream>>>,
}

impl PeerSlot {
    pub(crate) fn link(&self, peer: Arc<dyn Downstream>) {
        *self.peer.write() = Some(peer);
    }

    pub(crate) fn unlink(&self) -> bool {
        self.peer.write().take().is_some()
    }

    pub(crate) fn is_linked(&self) -> bool {
        self.peer.read().is_some()
    }

    /// Linked peer, or a stand-in that reports [`FlowReturn::NotLinked`]
    pub(crate) fn get(&self) -> Arc<dyn Downstream> {
        match self.peer.read().as_ref() {
            Some(peer) => Arc::clone(peer),
            None => Arc::new(Unlinked),
        }
    }

    /// Caps accepted by the peer, `None` when unlinked
    pub(crate) fn caps(&self) -> Option<Caps> {
        self.get().caps()
    }
}
