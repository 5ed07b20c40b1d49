//! Capability Sets
//!
//! [`Caps`] describes the image formats an endpoint can produce or accept.
//! It is either the open [`Caps::Any`] set or an ordered list of
//! [`Structure`] alternatives, where an empty list is the "empty" set.
//!
//! # Examples
//!
//! ```rust
//! use stillsrc_caps::{Caps, Fraction};
//!
//! let sensor: Caps = "image/jpeg, width=[1, 4096], height=[1, 3072], framerate=[1/1, 30/1]"
//!     .parse()
//!     .expect("valid caps");
//! let sink: Caps = "image/jpeg, width={800, 1600}, height=[600, 1200]"
//!     .parse()
//!     .expect("valid caps");
//!
//! let mut common = sensor.intersect(&sink);
//! assert!(!common.is_empty());
//! assert!(!common.is_fixed());
//!
//! common.fixate_nearest(640, 480, Fraction::from_integer(30));
//! let format = common.to_format().expect("fixed");
//! assert_eq!((format.width, format.height), (800, 600));
//! ```

use std::fmt;

use crate::value::{Fraction, ValueSet};

/// Largest width or height an unconstrained field accepts
pub const MAX_DIMENSION: u32 = 2_147_483_647;

/// Largest whole frame rate an unconstrained field accepts
pub const MAX_FRAMERATE: u32 = 2_147_483_647;

/// One alternative of a capability set
///
/// Fields default to their full range, so a bare structure only constrains
/// the media type (encoding).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Structure {
    media_type: String,
    width: ValueSet<u32>,
    height: ValueSet<u32>,
    framerate: ValueSet<Fraction>,
}

impl Structure {
    /// Create an unconstrained structure for `media_type`
    pub fn new(media_type: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            width: ValueSet::range(1, MAX_DIMENSION),
            height: ValueSet::range(1, MAX_DIMENSION),
            framerate: ValueSet::range(Fraction::from_integer(0), Fraction::from_integer(MAX_FRAMERATE)),
        }
    }

    /// Create a structure with every field fixed
    pub fn fixed(media_type: impl Into<String>, width: u32, height: u32, framerate: Fraction) -> Self {
        Self::new(media_type)
            .with_width(ValueSet::Fixed(width))
            .with_height(ValueSet::Fixed(height))
            .with_framerate(ValueSet::Fixed(framerate))
    }

    /// Constrain the width
    #[must_use]
    pub fn with_width(mut self, width: ValueSet<u32>) -> Self {
        self.width = width;
        self
    }

    /// Constrain the height
    #[must_use]
    pub fn with_height(mut self, height: ValueSet<u32>) -> Self {
        self.height = height;
        self
    }

    /// Constrain the frame rate
    #[must_use]
    pub fn with_framerate(mut self, framerate: ValueSet<Fraction>) -> Self {
        self.framerate = framerate;
        self
    }

    /// Media type, e.g. `image/jpeg`
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Width constraint
    pub fn width(&self) -> &ValueSet<u32> {
        &self.width
    }

    /// Height constraint
    pub fn height(&self) -> &ValueSet<u32> {
        &self.height
    }

    /// Frame rate constraint
    pub fn framerate(&self) -> &ValueSet<Fraction> {
        &self.framerate
    }

    /// Whether every field pins a single value
    pub fn is_fixed(&self) -> bool {
        self.width.is_fixed() && self.height.is_fixed() && self.framerate.is_fixed()
    }

    /// Formats described by both structures, if any
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        if self.media_type != other.media_type {
            return None;
        }

        Some(Self {
            media_type: self.media_type.clone(),
            width: self.width.intersect(&other.width)?,
            height: self.height.intersect(&other.height)?,
            framerate: self.framerate.intersect(&other.framerate)?,
        })
    }

    /// Resolve every field to the value nearest the given targets
    pub fn fixate_nearest(&mut self, width: u32, height: u32, framerate: Fraction) {
        self.width = ValueSet::Fixed(self.width.fixate_nearest(width));
        self.height = ValueSet::Fixed(self.height.fixate_nearest(height));
        self.framerate = ValueSet::Fixed(self.framerate.fixate_nearest(framerate));
    }

    /// Convert to a concrete format when fixed
    pub fn to_format(&self) -> Option<ImageFormat> {
        Some(ImageFormat {
            encoding: self.media_type.clone(),
            width: self.width.fixed_value()?,
            height: self.height.fixed_value()?,
            framerate: self.framerate.fixed_value()?,
        })
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, width={}, height={}, framerate={}",
            self.media_type, self.width, self.height, self.framerate
        )
    }
}

/// Set of acceptable image formats
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caps {
    /// Accepts every format
    Any,

    /// Ordered alternatives; no alternatives means the empty set
    Structures(Vec<Structure>),
}

impl Caps {
    /// The open set
    #[must_use]
    pub const fn any() -> Self {
        Self::Any
    }

    /// The empty set
    #[must_use]
    pub const fn empty() -> Self {
        Self::Structures(Vec::new())
    }

    /// Caps holding a single alternative
    #[must_use]
    pub fn from_structure(structure: Structure) -> Self {
        Self::Structures(vec![structure])
    }

    /// Whether this is the open set
    #[must_use]
    pub const fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Whether this is the empty set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Structures(structures) if structures.is_empty())
    }

    /// Whether the set describes exactly one concrete format
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Structures(structures) if structures.len() == 1 && structures[0].is_fixed())
    }

    /// Alternatives in order; empty for [`Caps::Any`]
    #[must_use]
    pub fn structures(&self) -> &[Structure] {
        match self {
            Self::Any => &[],
            Self::Structures(structures) => structures,
        }
    }

    /// Append an alternative; no-op on [`Caps::Any`]
    pub fn append(&mut self, structure: Structure) {
        if let Self::Structures(structures) = self {
            structures.push(structure);
        }
    }

    /// Formats accepted by both sets
    ///
    /// [`Caps::Any`] is the identity. Alternatives are combined pairwise
    /// with `self` as the outer loop, so the result keeps `self`'s
    /// preference order.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Any, _) => other.clone(),
            (_, Self::Any) => self.clone(),
            (Self::Structures(ours), Self::Structures(theirs)) => Self::Structures(
                ours.iter()
                    .flat_map(|a| theirs.iter().filter_map(move |b| a.intersect(b)))
                    .collect(),
            ),
        }
    }

    /// Keep only the first alternative
    pub fn truncate(&mut self) {
        if let Self::Structures(structures) = self {
            structures.truncate(1);
        }
    }

    /// Truncate to the first alternative and resolve it to the format
    /// nearest the given targets
    ///
    /// Already fixed caps are left untouched. [`Caps::Any`] and empty caps
    /// cannot be fixated and are left as they are.
    pub fn fixate_nearest(&mut self, width: u32, height: u32, framerate: Fraction) {
        if self.is_fixed() {
            return;
        }

        self.truncate();
        if let Self::Structures(structures) = self {
            if let Some(first) = structures.first_mut() {
                first.fixate_nearest(width, height, framerate);
            }
        }
    }

    /// The concrete format, if the set is fixed
    #[must_use]
    pub fn to_format(&self) -> Option<ImageFormat> {
        if !self.is_fixed() {
            return None;
        }
        self.structures().first().and_then(Structure::to_format)
    }
}

impl fmt::Display for Caps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("ANY"),
            Self::Structures(structures) if structures.is_empty() => f.write_str("EMPTY"),
            Self::Structures(structures) => {
                for (i, structure) in structures.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{structure}")?;
                }
                Ok(())
            }
        }
    }
}

/// A fully specified image format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFormat {
    /// Media type, e.g. `image/jpeg`
    pub encoding: String,

    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// Frame rate
    pub framerate: Fraction,
}

impl ImageFormat {
    /// Create a format
    pub fn new(encoding: impl Into<String>, width: u32, height: u32, framerate: Fraction) -> Self {
        Self {
            encoding: encoding.into(),
            width,
            height,
            framerate,
        }
    }

    /// Fixed caps describing this format
    #[must_use]
    pub fn to_caps(&self) -> Caps {
        Caps::from(self)
    }
}

impl From<&ImageFormat> for Caps {
    fn from(format: &ImageFormat) -> Self {
        Self::from_structure(Structure::fixed(
            format.encoding.clone(),
            format.width,
            format.height,
            format.framerate,
        ))
    }
}

impl From<ImageFormat> for Caps {
    fn from(format: ImageFormat) -> Self {
        Self::from(&format)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, width={}, height={}, framerate={}",
            self.encoding, self.width, self.height, self.framerate
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fps(n: u32) -> Fraction {
        Fraction::from_integer(n)
    }

    fn jpeg(width: u32, height: u32, rate: u32) -> Structure {
        Structure::fixed("image/jpeg", width, height, fps(rate))
    }

    #[test]
    fn test_sentinels_are_distinct() {
        assert!(Caps::any().is_any());
        assert!(!Caps::any().is_empty());
        assert!(Caps::empty().is_empty());
        assert!(!Caps::empty().is_any());
        assert!(!Caps::any().is_fixed());
        assert!(!Caps::empty().is_fixed());
    }

    #[test]
    fn test_is_fixed() {
        assert!(Caps::from_structure(jpeg(1600, 1200, 30)).is_fixed());

        let mut two = Caps::from_structure(jpeg(1600, 1200, 30));
        two.append(jpeg(800, 600, 15));
        assert!(!two.is_fixed());

        assert!(!Caps::from_structure(Structure::new("image/jpeg")).is_fixed());
    }

    #[test]
    fn test_intersect_with_any_is_identity() {
        let caps = Caps::from_structure(jpeg(1600, 1200, 30));
        assert_eq!(caps.intersect(&Caps::any()), caps);
        assert_eq!(Caps::any().intersect(&caps), caps);
        assert!(Caps::any().intersect(&Caps::any()).is_any());
    }

    #[test]
    fn test_intersect_exact_match() {
        let own = Caps::from_structure(jpeg(1600, 1200, 30));
        let peer = Caps::Structures(vec![jpeg(800, 600, 15), jpeg(1600, 1200, 30)]);

        let common = own.intersect(&peer);
        assert!(common.is_fixed());
        assert_eq!(common, own);
    }

    #[test]
    fn test_intersect_media_type_mismatch() {
        let own = Caps::from_structure(jpeg(1600, 1200, 30));
        let peer = Caps::from_structure(Structure::fixed("video/x-raw", 1600, 1200, fps(30)));
        assert!(own.intersect(&peer).is_empty());
    }

    #[test]
    fn test_intersect_with_empty() {
        let own = Caps::from_structure(jpeg(1600, 1200, 30));
        assert!(own.intersect(&Caps::empty()).is_empty());
    }

    #[test]
    fn test_fixate_truncates_and_resolves() {
        let mut caps = Caps::Structures(vec![
            Structure::new("image/jpeg")
                .with_width(ValueSet::range(1024, 4096))
                .with_height(ValueSet::range(1, 3072))
                .with_framerate(ValueSet::List(vec![fps(15), fps(24)])),
            jpeg(640, 480, 30),
        ]);

        caps.fixate_nearest(640, 480, fps(30));

        assert!(caps.is_fixed());
        let format = caps.to_format().expect("fixed caps");
        assert_eq!(format, ImageFormat::new("image/jpeg", 1024, 480, fps(24)));
    }

    #[test]
    fn test_fixate_is_idempotent() {
        let mut caps = Caps::from_structure(jpeg(1600, 1200, 30));
        let before = caps.clone();
        caps.fixate_nearest(640, 480, fps(30));
        assert_eq!(caps, before);
    }

    #[test]
    fn test_fixate_any_is_noop() {
        let mut caps = Caps::any();
        caps.fixate_nearest(640, 480, fps(30));
        assert!(caps.is_any());
        assert!(caps.to_format().is_none());
    }

    #[test]
    fn test_format_round_trip() {
        let format = ImageFormat::new("image/jpeg", 640, 480, fps(30));
        let caps = format.to_caps();
        assert!(caps.is_fixed());
        assert_eq!(caps.to_format(), Some(format));
    }

    #[test]
    fn test_display() {
        assert_eq!(Caps::any().to_string(), "ANY");
        assert_eq!(Caps::empty().to_string(), "EMPTY");
        assert_eq!(
            Caps::from_structure(jpeg(1600, 1200, 30)).to_string(),
            "image/jpeg, width=1600, height=1200, framerate=30/1"
        );
    }
}
