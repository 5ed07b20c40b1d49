//! Running-Time Segments
//!
//! Default [`SegmentManager`]: one open-ended segment per activation,
//! buffers stamped with the running time since the segment opened and a
//! monotonically increasing offset.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use crate::buffer::FrameBuffer;
use crate::error::{ImgSrcError, Result};
use crate::flow::{Downstream, PadEvent, Segment};
use crate::provider::SegmentManager;

#[derive(Debug)]
struct Timeline {
    base: Option<Instant>,
    pending: bool,
    next_offset: u64,
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            base: None,
            pending: true,
            next_offset: 0,
        }
    }
}

/// Segment manager stamping buffers with running time
#[derive(Debug, Default)]
pub struct RunningTimeSegments {
    timeline: Mutex<Timeline>,
}

impl RunningTimeSegments {
    /// Create a manager that opens a segment on the first buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset the next buffer will receive
    pub fn next_offset(&self) -> u64 {
        self.timeline.lock().next_offset
    }
}

impl SegmentManager for RunningTimeSegments {
    fn open_segment(&self, peer: &dyn Downstream) -> Result<()> {
        let mut timeline = self.timeline.lock();
        if !timeline.pending {
            return Ok(());
        }

        if !peer.push_event(PadEvent::Segment(Segment::open(Duration::ZERO))) {
            return Err(ImgSrcError::segment("peer refused segment event"));
        }

        debug!("Opened segment at offset {}", timeline.next_offset);
        timeline.pending = false;
        timeline.base = Some(Instant::now());
        Ok(())
    }

    fn update_segment(&self, buffer: &mut FrameBuffer) {
        let mut timeline = self.timeline.lock();
        let base = *timeline.base.get_or_insert_with(Instant::now);

        buffer.set_pts(Some(base.elapsed()));
        buffer.set_offset(Some(timeline.next_offset));
        timeline.next_offset += 1;
    }

    fn reset(&self) {
        let mut timeline = self.timeline.lock();
        timeline.base = None;
        timeline.pending = true;
    }
}
