//! # stillsrc-caps
//!
//! Capability sets for still-image stream negotiation.
//!
//! This crate is part of the `stillsrc` workspace and provides the format
//! algebra used by [`stillsrc-pad`] when a producer and a consumer agree on a
//! single image format before streaming starts.
//!
//! # Features
//!
//! - **Typed Caps**: width, height and frame rate as fixed values, ranges or lists
//! - **Distinct Sentinels**: [`Caps::Any`] and the empty set are never confused
//! - **Set Operations**: intersect, truncate, fixate-to-nearest
//! - **Caps Strings**: `Display`/`FromStr` with GStreamer-like syntax
//!
//! # Quick Start
//!
//! ```rust
//! use stillsrc_caps::{Caps, Fraction, ImageFormat};
//!
//! let own: Caps = "image/jpeg, width=1600, height=1200, framerate=30/1".parse()?;
//! let peer: Caps = "image/jpeg, width=800, height=600, framerate=15/1; \
//!                   image/jpeg, width=1600, height=1200, framerate=30/1"
//!     .parse()?;
//!
//! let common = own.intersect(&peer);
//! assert!(common.is_fixed());
//! assert_eq!(
//!     common.to_format(),
//!     Some(ImageFormat::new("image/jpeg", 1600, 1200, Fraction::from_integer(30)))
//! );
//! # Ok::<(), stillsrc_caps::CapsParseError>(())
//! ```
//!
//! [`stillsrc-pad`]: https://docs.rs/stillsrc-pad

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod caps;
pub mod parse;
pub mod value;

// =============================================================================
// RE-EXPORTS - PRIMARY API
// =============================================================================

pub use caps::{Caps, ImageFormat, Structure, MAX_DIMENSION, MAX_FRAMERATE};
pub use parse::CapsParseError;
pub use value::{Fraction, Nearest, ValueSet};

// =============================================================================
// CRATE-LEVEL ITEMS
// =============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Media type of JPEG-compressed still images
pub const JPEG: &str = "image/jpeg";
