//! # stillsrc-pad
//!
//! Output endpoint of a still-image capture pipeline: negotiates one fixed
//! format with the downstream consumer, buffers captured frames handed over
//! by the camera side, and pushes them downstream from a dedicated task with
//! derived metadata attached.
//!
//! This crate is part of the `stillsrc` workspace and builds on
//! [`stillsrc-caps`](stillsrc_caps) for capability sets.
//!
//! # Features
//!
//! - **Format Negotiation**: Intersection with the peer, fixation to the
//!   configured defaults, permissive fallback for unconstrained peers
//! - **Frame Handoff**: Thread-safe FIFO between the capture side and the
//!   streaming task
//! - **Push Task**: One buffer per iteration, with segment and tag events
//! - **Activation Control**: Synchronous start/stop with rollback
//! - **Message Bus**: Streaming errors and task state changes
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stillsrc_pad::{ChannelSink, FrameBuffer, ImgSrcConfig, ImgSrcPad, SinkItem};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pad = ImgSrcPad::builder(ImgSrcConfig::default())
//!     .tags(Arc::new(ExifReader::new()))
//!     .build()?;
//!
//! let (sink, mut rx) = ChannelSink::new(8);
//! pad.link(Arc::new(sink));
//! pad.activate(true)?;
//!
//! // Capture side
//! pad.enqueue(FrameBuffer::new(jpeg_bytes));
//!
//! while let Some(item) = rx.recv().await {
//!     if let SinkItem::Buffer(frame) = item {
//!         println!("Frame: {} bytes", frame.len());
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Control thread            ImgSrcPad                    │
//! │  activate / renegotiate ─▶ NegotiationEngine            │
//! │                            Scheduler (stream lock)      │
//! └───────────────────────────────┬─────────────────────────┘
//!                                 │ start / stop
//! ┌──────────────┐  enqueue  ┌────▼────────┐   push   ┌────────────┐
//! │ Capture side │──────────▶│ BufferQueue │─────────▶│ Downstream │
//! └──────────────┘           │ + task loop │          └────────────┘
//!                            └─────────────┘
//! ```
//!
//! The task thread is the only consumer of the queue. Downstream pushes
//! happen without any pad lock held.

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod buffer;
pub mod config;
pub mod error;
pub mod flow;
pub mod message;
pub mod pad;
pub mod provider;
pub mod queue;
pub mod segment;
pub mod sink;
pub mod task;

mod negotiation;

#[cfg(test)]
mod testing;

// =============================================================================
// RE-EXPORTS - PRIMARY API
// =============================================================================

// Pad (primary entry point)
pub use pad::{ImgSrcPad, ImgSrcPadBuilder};

// Configuration
pub use config::{ImgSrcConfig, ImgSrcConfigBuilder};

// Errors
pub use error::{ImgSrcError, Result};

// Data flow
pub use buffer::{BufferFlag, FrameBuffer, TagList, TagValue};
pub use flow::{Downstream, FlowReturn, PadEvent, Segment};
pub use message::{PadMessage, MESSAGE_CAPACITY};

// Task
pub use task::{Iteration, LoopBody, PadStats, Scheduler, TaskState, ThreadScheduler};

// Collaborators
pub use provider::{CapabilityProvider, SegmentManager, TagExtractor};
pub use segment::RunningTimeSegments;
pub use sink::{ChannelSink, SinkItem};

// =============================================================================
// RE-EXPORTS - ADVANCED API
// =============================================================================

pub use queue::BufferQueue;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_pad_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ImgSrcPad>();
        assert_send_sync::<BufferQueue>();
        assert_send_sync::<ChannelSink>();
    }
}
