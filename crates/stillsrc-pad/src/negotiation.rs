//! Format Negotiation
//!
//! Reconciles the formats the camera can capture with the formats the
//! downstream peer accepts and commits exactly one fixed [`ImageFormat`].
//!
//! # Algorithm
//!
//! 1. Query own caps from the capability provider (template caps when no
//!    provider is attached). Empty caps abort negotiation.
//! 2. Query the peer's caps. If the peer has none, or they are empty or
//!    ANY, the configured default format is used.
//! 3. Otherwise intersect both sets. An empty intersection aborts; a
//!    non-fixed one is fixated to the values nearest the defaults.
//! 4. Apply the capture size to the provider and commit its parameters.
//!
//! The negotiated format is stored only after step 4 succeeds.

use std::sync::Arc;

use parking_lot::Mutex;
use stillsrc_caps::{Caps, ImageFormat};
use tracing::{debug, trace};

use crate::config::ImgSrcConfig;
use crate::error::{ImgSrcError, Result};
use crate::provider::CapabilityProvider;

#[derive(Default)]
struct Settings {
    format: Option<ImageFormat>,
    provider: Option<Arc<dyn CapabilityProvider>>,
}

pub(crate) struct NegotiationEngine {
    config: Arc<ImgSrcConfig>,
    settings: Mutex<Settings>,
}

impl NegotiationEngine {
    pub(crate) fn new(config: Arc<ImgSrcConfig>) -> Self {
        Self {
            config,
            settings: Mutex::new(Settings::default()),
        }
    }

    pub(crate) fn attach_provider(&self, provider: Arc<dyn CapabilityProvider>) {
        self.settings.lock().provider = Some(provider);
    }

    pub(crate) fn detach_provider(&self) -> bool {
        self.settings.lock().provider.take().is_some()
    }

    pub(crate) fn negotiated_format(&self) -> Option<ImageFormat> {
        self.settings.lock().format.clone()
    }

    /// Formats the producer can currently deliver
    pub(crate) fn get_capabilities(&self) -> Caps {
        let settings = self.settings.lock();
        match &settings.provider {
            Some(provider) => provider.capture_caps(),
            None => self.config.template_caps.clone(),
        }
    }

    /// Truncate to the first alternative and resolve it to the values
    /// nearest the configured defaults
    pub(crate) fn fixate(&self, mut caps: Caps) -> Caps {
        caps.fixate_nearest(
            self.config.default_width,
            self.config.default_height,
            self.config.default_framerate(),
        );
        trace!("Fixated caps: {caps}");
        caps
    }

    /// Apply a fixed format; empty and ANY caps are accepted unchanged
    pub(crate) fn set_format(&self, caps: &Caps) -> Result<()> {
        if caps.is_empty() || caps.is_any() {
            debug!("Nothing to apply for caps {caps}");
            return Ok(());
        }

        let format = caps
            .to_format()
            .ok_or_else(|| ImgSrcError::format(format!("Caps are not fixed: {caps}")))?;
        self.apply(format)
    }

    /// Agree on one fixed format with a peer accepting `peer_caps`
    pub(crate) fn negotiate(&self, peer_caps: Option<Caps>) -> Result<ImageFormat> {
        let own = self.get_capabilities();
        trace!("Own caps: {own}");
        if own.is_empty() {
            return Err(ImgSrcError::format("Failed to get any supported caps"));
        }

        let format = match peer_caps {
            Some(peer) if !peer.is_empty() && !peer.is_any() => {
                trace!("Peer caps: {peer}");
                let common = own.intersect(&peer);
                if common.is_empty() {
                    return Err(ImgSrcError::format("No common caps"));
                }
                self.fixate(common)
                    .to_format()
                    .ok_or_else(|| ImgSrcError::format("Failed to fixate caps"))?
            }
            _ => {
                debug!("Peer places no constraints, using default format");
                self.config.default_format()
            }
        };

        self.apply(format.clone())?;
        debug!("Negotiated {format}");
        Ok(format)
    }

    fn apply(&self, format: ImageFormat) -> Result<()> {
        if format.width == 0 || format.height == 0 {
            return Err(ImgSrcError::format("Invalid dimensions"));
        }

        let provider = {
            let settings = self.settings.lock();
            if let Some(provider) = &settings.provider {
                provider.set_capture_size(format.width, format.height);
            }
            settings.provider.clone()
        };

        if let Some(provider) = provider {
            provider.commit_parameters()?;
        }

        self.settings.lock().format = Some(format);
        Ok(())
    }
}
