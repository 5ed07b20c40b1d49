//! Collaborator Interfaces
//!
//! Traits the pad calls into. The camera pipeline implements
//! [`CapabilityProvider`]; segment bookkeeping and metadata extraction are
//! pluggable through [`SegmentManager`] and [`TagExtractor`].

use stillsrc_caps::Caps;

use crate::buffer::{FrameBuffer, TagList};
use crate::error::Result;
use crate::flow::Downstream;

/// Source of the producer's supported formats
pub trait CapabilityProvider: Send + Sync {
    /// Formats the camera can currently capture
    fn capture_caps(&self) -> Caps;

    /// Record the capture size for the next parameter commit
    fn set_capture_size(&self, width: u32, height: u32);

    /// Apply pending parameters to the device
    ///
    /// Fails with [`ImgSrcError::CameraParams`] if the device rejects them.
    ///
    /// [`ImgSrcError::CameraParams`]: crate::ImgSrcError::CameraParams
    fn commit_parameters(&self) -> Result<()>;
}

/// Output timeline bookkeeping
pub trait SegmentManager: Send + Sync {
    /// Announce a segment to `peer` if one is due
    fn open_segment(&self, peer: &dyn Downstream) -> Result<()>;

    /// Stamp timing fields on a buffer about to be pushed
    fn update_segment(&self, buffer: &mut FrameBuffer);

    /// Start a fresh timeline; called on every activation
    fn reset(&self) {}
}

/// Metadata derivation from compressed payloads
pub trait TagExtractor: Send + Sync {
    /// Tags for `buffer`, `None` if nothing could be derived
    fn extract(&self, buffer: &FrameBuffer) -> Option<TagList>;
}
