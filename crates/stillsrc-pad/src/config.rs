//! Image Source Pad Configuration
//!
//! Provides configuration options for the image source pad with a builder
//! pattern for ergonomic construction.
//!
//! # Examples
//!
//! ```rust
//! use stillsrc_pad::ImgSrcConfig;
//!
//! // Using builder pattern
//! let config = ImgSrcConfig::builder()
//!     .default_width(1280)
//!     .default_height(720)
//!     .default_fps(15)
//!     .pad_name("imgsrc")
//!     .build();
//!
//! // Using struct literal with defaults
//! let config = ImgSrcConfig {
//!     default_fps: 15,
//!     ..Default::default()
//! };
//! ```

use stillsrc_caps::{Caps, Fraction, ImageFormat, Structure, JPEG};

/// Configuration for the image source pad
///
/// The default dimensions and frame rate serve two purposes: they are the
/// fixation targets when the negotiated caps leave a field open, and they
/// form the fallback format when the peer places no constraints.
#[derive(Debug, Clone)]
pub struct ImgSrcConfig {
    /// Pad name used in logs and by segment managers (default: "imgsrc")
    pub pad_name: String,

    /// Default capture width in pixels (default: 640)
    pub default_width: u32,

    /// Default capture height in pixels (default: 480)
    pub default_height: u32,

    /// Default frame rate numerator, denominator is 1 (default: 30)
    pub default_fps: u32,

    /// Encoding of the fallback format (default: "image/jpeg")
    pub default_encoding: String,

    /// Capabilities reported before a capability provider is attached
    ///
    /// Defaults to JPEG with every dimension and frame rate open.
    pub template_caps: Caps,

    /// Name of the streaming task thread (default: "imgsrc-task")
    pub task_name: String,
}

impl Default for ImgSrcConfig {
    fn default() -> Self {
        Self {
            pad_name: "imgsrc".to_string(),
            default_width: 640,
            default_height: 480,
            default_fps: 30,
            default_encoding: JPEG.to_string(),
            template_caps: Caps::from_structure(Structure::new(JPEG)),
            task_name: "imgsrc-task".to_string(),
        }
    }
}

impl ImgSrcConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> ImgSrcConfigBuilder {
        ImgSrcConfigBuilder::default()
    }

    /// Default frame rate as a fraction
    pub fn default_framerate(&self) -> Fraction {
        Fraction::from_integer(self.default_fps)
    }

    /// Format committed when the peer has no constraints
    pub fn default_format(&self) -> ImageFormat {
        ImageFormat::new(
            self.default_encoding.clone(),
            self.default_width,
            self.default_height,
            self.default_framerate(),
        )
    }

    /// Validate configuration and return any issues
    ///
    /// Returns `Ok(())` if configuration is valid, or a list of issues.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut issues = Vec::new();

        if self.default_width == 0 {
            issues.push("default_width must be at least 1".to_string());
        }

        if self.default_height == 0 {
            issues.push("default_height must be at least 1".to_string());
        }

        if self.default_fps == 0 {
            issues.push("default_fps must be at least 1".to_string());
        }

        if self.default_encoding.is_empty() {
            issues.push("default_encoding cannot be empty".to_string());
        }

        if self.template_caps.is_empty() {
            issues.push("template_caps cannot be empty".to_string());
        }

        if self.pad_name.is_empty() {
            issues.push("pad_name cannot be empty".to_string());
        }

        if self.task_name.is_empty() {
            issues.push("task_name cannot be empty".to_string());
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

/// Builder for [`ImgSrcConfig`]
#[derive(Debug, Clone, Default)]
pub struct ImgSrcConfigBuilder {
    pad_name: Option<String>,
    default_width: Option<u32>,
    default_height: Option<u32>,
    default_fps: Option<u32>,
    default_encoding: Option<String>,
    template_caps: Option<Caps>,
    task_name: Option<String>,
}

impl ImgSrcConfigBuilder {
    /// Set the pad name
    #[must_use]
    pub fn pad_name(mut self, name: impl Into<String>) -> Self {
        self.pad_name = Some(name.into());
        self
    }

    /// Set the default width
    #[must_use]
    pub fn default_width(mut self, width: u32) -> Self {
        self.default_width = Some(width);
        self
    }

    /// Set the default height
    #[must_use]
    pub fn default_height(mut self, height: u32) -> Self {
        self.default_height = Some(height);
        self
    }

    /// Set the default frame rate
    #[must_use]
    pub fn default_fps(mut self, fps: u32) -> Self {
        self.default_fps = Some(fps);
        self
    }

    /// Set the fallback encoding
    #[must_use]
    pub fn default_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.default_encoding = Some(encoding.into());
        self
    }

    /// Set the template capabilities
    #[must_use]
    pub fn template_caps(mut self, caps: Caps) -> Self {
        self.template_caps = Some(caps);
        self
    }

    /// Set the streaming task name
    #[must_use]
    pub fn task_name(mut self, name: impl Into<String>) -> Self {
        self.task_name = Some(name.into());
        self
    }

    /// Build the configuration
    ///
    /// Returns an [`ImgSrcConfig`] with builder values overriding defaults.
    #[must_use]
    pub fn build(self) -> ImgSrcConfig {
        let defaults = ImgSrcConfig::default();

        ImgSrcConfig {
            pad_name: self.pad_name.unwrap_or(defaults.pad_name),
            default_width: self.default_width.unwrap_or(defaults.default_width),
            default_height: self.default_height.unwrap_or(defaults.default_height),
            default_fps: self.default_fps.unwrap_or(defaults.default_fps),
            default_encoding: self.default_encoding.unwrap_or(defaults.default_encoding),
            template_caps: self.template_caps.unwrap_or(defaults.template_caps),
            task_name: self.task_name.unwrap_or(defaults.task_name),
        }
    }
}
