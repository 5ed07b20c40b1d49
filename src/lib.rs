//! # stillsrc
//!
//! Still-image capture output endpoint for Rust.
//!
//! This crate provides a unified interface to the stillsrc libraries:
//!
//! - **[`caps`]** - Capability sets, intersection, fixation and caps strings
//! - **[`pad`]** - Image source pad: negotiation, frame queue and push task
//!
//! # Features
//!
//! All features are enabled by default. You can selectively enable only what you need:
//!
//! ```toml
//! # Use everything (default)
//! stillsrc = "0.1"
//!
//! # Capability sets only
//! stillsrc = { version = "0.1", default-features = false, features = ["caps"] }
//! ```
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `caps` | Yes | Capability set algebra |
//! | `pad` | Yes | Image source pad |
//! | `full` | No | All features |
//!
//! # Quick Start
//!
//! ## Negotiating Caps
//!
//! ```rust,ignore
//! use stillsrc::caps::Caps;
//!
//! let own: Caps = "image/jpeg, width=[320, 4096], height=[240, 3072], framerate={15/1, 30/1}".parse()?;
//! let peer: Caps = "image/jpeg, width=[1, 1920], height=[1, 1080]".parse()?;
//!
//! let mut common = own.intersect(&peer);
//! common.fixate_nearest(1600, 1200, "30/1".parse()?);
//! println!("{common}");
//! ```
//!
//! ## Full Pipeline: Camera → Pad → Consumer
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stillsrc::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pad = ImgSrcPad::builder(ImgSrcConfig::default())
//!         .provider(Arc::new(camera))
//!         .tags(Arc::new(exif_reader))
//!         .build()?;
//!
//!     let (sink, mut rx) = ChannelSink::new(4);
//!     pad.link(Arc::new(sink));
//!     pad.activate(true)?;
//!
//!     // ... camera thread calls pad.enqueue(frame)
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                   stillsrc                    │
//! ├──────────────────────┬────────────────────────┤
//! │    stillsrc-caps     │     stillsrc-pad       │
//! │                      │                        │
//! │  Caps, Structure     │  ImgSrcPad             │
//! │  ValueSet, Fraction  │  BufferQueue           │
//! │  ImageFormat         │  ImgSrcConfig          │
//! └──────────┬───────────┴───────────┬────────────┘
//!            │                       │
//!            ▼                       ▼
//!     Caps string syntax     Camera / Downstream traits
//! ```
//!
//! # Related Crates
//!
//! You can also use the individual crates directly:
//!
//! - [`stillsrc-caps`](https://crates.io/crates/stillsrc-caps) - Capability sets only
//! - [`stillsrc-pad`](https://crates.io/crates/stillsrc-pad) - Image source pad only

#![cfg_attr(docsrs, feature(doc_cfg))]

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// RE-EXPORTS
// =============================================================================

/// Capability sets describing acceptable image formats.
///
/// This module provides:
/// - Value sets (fixed, range, list) over dimensions and frame rates
/// - Intersection, truncation and fixation
/// - Parsing and printing of caps strings
///
/// See [`stillsrc_caps`] documentation for details.
#[cfg(feature = "caps")]
#[cfg_attr(docsrs, doc(cfg(feature = "caps")))]
pub use stillsrc_caps as caps;

/// Image source pad for still-image capture output.
///
/// This module provides:
/// - Format negotiation with the downstream peer
/// - Thread-safe frame handoff from the capture side
/// - Streaming task lifecycle and activation control
///
/// See [`stillsrc_pad`] documentation for details.
#[cfg(feature = "pad")]
#[cfg_attr(docsrs, doc(cfg(feature = "pad")))]
pub use stillsrc_pad as pad;

// =============================================================================
// PRELUDE - Common types for convenience
// =============================================================================

/// Prelude module with commonly used types.
///
/// ```rust
/// use stillsrc::prelude::*;
/// ```
pub mod prelude {
    #[cfg(feature = "caps")]
    pub use stillsrc_caps::{Caps, Fraction, ImageFormat, Structure, ValueSet};

    #[cfg(feature = "pad")]
    pub use stillsrc_pad::{
        ChannelSink, FrameBuffer, ImgSrcConfig, ImgSrcError, ImgSrcPad, PadMessage, SinkItem, TaskState,
    };
}
