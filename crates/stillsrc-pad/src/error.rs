//! Error types for image source pad operations
//!
//! Provides typed errors that library users can match and handle specifically.

use thiserror::Error;

use crate::flow::FlowReturn;

/// Errors that can occur while negotiating, activating or streaming
///
/// # Examples
///
/// ```rust,ignore
/// # use stillsrc_pad::{ImgSrcPad, ImgSrcError};
/// match pad.activate(true) {
///     Ok(()) => println!("streaming"),
///     Err(ImgSrcError::Format(msg)) => eprintln!("negotiation failed: {msg}"),
///     Err(ImgSrcError::Scheduling(msg)) => eprintln!("task did not start: {msg}"),
///     Err(e) => eprintln!("other error: {e}"),
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImgSrcError {
    /// Invalid or unreconcilable format negotiation
    ///
    /// Zero dimensions, an empty intersection with the peer, or no
    /// capabilities available from the producer. Activation is aborted.
    #[error("Format error: {0}")]
    Format(String),

    /// The capability provider rejected the camera parameters
    #[error("Failed to apply camera parameters: {0}")]
    CameraParams(String),

    /// The streaming task could not be started
    #[error("Failed to start streaming task: {0}")]
    Scheduling(String),

    /// Downstream returned a fatal flow result
    ///
    /// The streaming task keeps its schedule; stopping it is up to whoever
    /// observes this error.
    #[error("Internal data flow error: reason {flow}")]
    DataFlow {
        /// Flow result returned by the peer
        flow: FlowReturn,
    },

    /// A segment could not be announced downstream
    #[error("Failed to push new segment: {0}")]
    Segment(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for image source pad operations
pub type Result<T> = std::result::Result<T, ImgSrcError>;

impl ImgSrcError {
    /// Create a format error
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Create a camera parameter error
    pub fn camera_params(msg: impl Into<String>) -> Self {
        Self::CameraParams(msg.into())
    }

    /// Create a scheduling error
    pub fn scheduling(msg: impl Into<String>) -> Self {
        Self::Scheduling(msg.into())
    }

    /// Create a segment error
    pub fn segment(msg: impl Into<String>) -> Self {
        Self::Segment(msg.into())
    }

    /// Whether streaming may continue after this error
    ///
    /// Only segment announcement failures are tolerated per buffer.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Segment(_))
    }
}
