//! Frame Buffers and Tags
//!
//! [`FrameBuffer`] carries one captured still image from the producer to the
//! downstream consumer. The pad takes ownership on [`enqueue`] and hands it
//! to the peer on push.
//!
//! [`enqueue`]: crate::ImgSrcPad::enqueue

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use enumflags2::{bitflags, BitFlags};
use stillsrc_caps::Fraction;

/// Per-buffer flags
#[bitflags]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferFlag {
    /// The buffer does not continue the timeline of the previous one
    Discont = 1 << 0,

    /// The buffer carries stream headers only
    Header = 1 << 1,

    /// The buffer cannot be decoded on its own
    DeltaUnit = 1 << 2,
}

/// Value of a single tag
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    /// Free-form text (maker, model, software)
    Text(String),
    /// Integer (orientation, ISO speed)
    Int(i64),
    /// Floating point (aperture, focal length)
    Double(f64),
    /// Rational (exposure time)
    Fraction(Fraction),
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text:?}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Double(value) => write!(f, "{value}"),
            Self::Fraction(value) => write!(f, "{value}"),
        }
    }
}

/// Metadata derived from a frame's payload, keyed by tag name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagList {
    entries: BTreeMap<String, TagValue>,
}

impl TagList {
    /// Create an empty tag list
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a tag
    pub fn insert(&mut self, name: impl Into<String>, value: TagValue) {
        self.entries.insert(name.into(), value);
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: TagValue) -> Self {
        self.insert(name, value);
        self
    }

    /// Look up a tag
    pub fn get(&self, name: &str) -> Option<&TagValue> {
        self.entries.get(name)
    }

    /// Number of tags
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no tags are present
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tags in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl fmt::Display for TagList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("taglist")?;
        for (name, value) in self.iter() {
            write!(f, ", {name}={value}")?;
        }
        Ok(())
    }
}

/// A captured still image
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    data: Vec<u8>,
    pts: Option<Duration>,
    duration: Option<Duration>,
    offset: Option<u64>,
    flags: BitFlags<BufferFlag>,
    tags: Option<TagList>,
}

impl FrameBuffer {
    /// Wrap a compressed image payload
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            pts: None,
            duration: None,
            offset: None,
            flags: BitFlags::empty(),
            tags: None,
        }
    }

    /// Builder-style presentation timestamp
    #[must_use]
    pub fn with_pts(mut self, pts: Duration) -> Self {
        self.pts = Some(pts);
        self
    }

    /// Payload bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Take the payload
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Payload size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Presentation timestamp
    pub fn pts(&self) -> Option<Duration> {
        self.pts
    }

    /// Set the presentation timestamp
    pub fn set_pts(&mut self, pts: Option<Duration>) {
        self.pts = pts;
    }

    /// Duration
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Set the duration
    pub fn set_duration(&mut self, duration: Option<Duration>) {
        self.duration = duration;
    }

    /// Sequence offset within the stream
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Set the sequence offset
    pub fn set_offset(&mut self, offset: Option<u64>) {
        self.offset = offset;
    }

    /// Current flags
    pub fn flags(&self) -> BitFlags<BufferFlag> {
        self.flags
    }

    /// Whether `flag` is set
    pub fn has_flag(&self, flag: BufferFlag) -> bool {
        self.flags.contains(flag)
    }

    /// Set `flag`
    pub fn set_flag(&mut self, flag: BufferFlag) {
        self.flags.insert(flag);
    }

    /// Clear `flag`
    pub fn unset_flag(&mut self, flag: BufferFlag) {
        self.flags.remove(flag);
    }

    /// Attached metadata
    pub fn tags(&self) -> Option<&TagList> {
        self.tags.as_ref()
    }

    /// Attach metadata, replacing any previous tags
    pub fn set_tags(&mut self, tags: TagList) {
        self.tags = Some(tags);
    }
}
