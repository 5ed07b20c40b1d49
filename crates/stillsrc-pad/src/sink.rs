//! Channel Sink
//!
//! A [`Downstream`] that forwards events and buffers over a bounded tokio
//! channel, so an async consumer can drive the pad. A full channel blocks
//! the streaming task; a dropped receiver ends the stream.

use stillsrc_caps::Caps;
use tokio::sync::mpsc;
use tracing::debug;

use crate::buffer::FrameBuffer;
use crate::flow::{Downstream, FlowReturn, PadEvent};

/// Item delivered to the channel consumer
#[derive(Debug, Clone, PartialEq)]
pub enum SinkItem {
    /// Segment or tag event
    Event(PadEvent),

    /// Captured frame
    Buffer(FrameBuffer),
}

/// Downstream peer backed by a bounded channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<SinkItem>,
    caps: Caps,
}

impl ChannelSink {
    /// Create a sink accepting any format, with room for `capacity` items
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<SinkItem>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx, caps: Caps::any() }, rx)
    }

    /// Restrict the formats this sink accepts
    #[must_use]
    pub fn with_caps(mut self, caps: Caps) -> Self {
        self.caps = caps;
        self
    }
}

impl Downstream for ChannelSink {
    fn caps(&self) -> Option<Caps> {
        Some(self.caps.clone())
    }

    fn push_event(&self, event: PadEvent) -> bool {
        self.tx.blocking_send(SinkItem::Event(event)).is_ok()
    }

    fn push(&self, buffer: FrameBuffer) -> FlowReturn {
        match self.tx.blocking_send(SinkItem::Buffer(buffer)) {
            Ok(()) => FlowReturn::Ok,
            Err(_) => {
                debug!("Sink receiver closed");
                FlowReturn::Eos
            }
        }
    }
}
