//! Image Source Pad
//!
//! Single entry point for the still-image output endpoint. The pad owns the
//! buffer queue and the streaming task and exposes the activation control
//! plane to the owning element.
//!
//! # Architecture
//!
//! The pad coordinates:
//! - Format negotiation with the linked peer
//! - Task lifecycle (activation, deactivation, state changes)
//! - Buffer handoff from the capture side via [`ImgSrcPad::enqueue`]
//! - Error and state reporting on the message bus
//!
//! # Examples
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stillsrc_pad::{ChannelSink, ImgSrcConfig, ImgSrcPad, RunningTimeSegments};
//!
//! let pad = ImgSrcPad::builder(ImgSrcConfig::default())
//!     .segments(Arc::new(RunningTimeSegments::new()))
//!     .tags(Arc::new(my_exif_reader))
//!     .build()?;
//!
//! let (sink, mut rx) = ChannelSink::new(4);
//! pad.link(Arc::new(sink));
//! pad.activate(true)?;
//!
//! pad.enqueue(FrameBuffer::new(jpeg_bytes));
//!
//! // Cleanup
//! pad.activate(false)?;
//! ```

use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use stillsrc_caps::{Caps, ImageFormat};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::buffer::FrameBuffer;
use crate::config::ImgSrcConfig;
use crate::error::{ImgSrcError, Result};
use crate::flow::{Downstream, PeerSlot};
use crate::message::{self, MessageBus, PadMessage};
use crate::negotiation::NegotiationEngine;
use crate::provider::{CapabilityProvider, SegmentManager, TagExtractor};
use crate::queue::BufferQueue;
use crate::segment::RunningTimeSegments;
use crate::task::{Iteration, LoopBody, PadStats, Scheduler, StreamingTask, TaskState, TaskStats, ThreadScheduler};

/// Still-image source pad
pub struct ImgSrcPad {
    config: Arc<ImgSrcConfig>,
    negotiation: NegotiationEngine,
    queue: Arc<BufferQueue>,
    peer: Arc<PeerSlot>,
    segments: Arc<dyn SegmentManager>,
    tags: Arc<dyn TagExtractor>,
    stream: Mutex<Box<dyn Scheduler>>,
    state: RwLock<TaskState>,
    stats: Arc<TaskStats>,
    bus: MessageBus,
}

impl ImgSrcPad {
    /// Create a pad builder
    pub fn builder(config: ImgSrcConfig) -> ImgSrcPadBuilder {
        ImgSrcPadBuilder::new(config)
    }

    /// Pad name
    pub fn name(&self) -> &str {
        &self.config.pad_name
    }

    /// Get configuration
    pub fn config(&self) -> &ImgSrcConfig {
        &self.config
    }

    /// Formats the producer can currently deliver
    ///
    /// Template caps from the configuration until a capability provider is
    /// attached.
    pub fn get_capabilities(&self) -> Caps {
        self.negotiation.get_capabilities()
    }

    /// Resolve `caps` to a single format nearest the configured defaults
    pub fn fixate(&self, caps: Caps) -> Caps {
        self.negotiation.fixate(caps)
    }

    /// Apply a fixed format to the capability provider
    ///
    /// Empty and ANY caps are accepted without change.
    pub fn set_format(&self, caps: &Caps) -> Result<()> {
        self.negotiation.set_format(caps)
    }

    /// Agree on one fixed format with the linked peer
    ///
    /// Failures are returned and also posted on the message bus.
    pub fn negotiate(&self) -> Result<ImageFormat> {
        debug!("Negotiating on pad {}", self.name());
        self.negotiation.negotiate(self.peer.caps()).map_err(|e| {
            warn!("Negotiation failed on pad {}: {e}", self.name());
            self.bus.post(PadMessage::Error(e.clone()));
            e
        })
    }

    /// Start or stop the streaming task
    ///
    /// Activation negotiates first; no task is scheduled if negotiation
    /// fails. Deactivation blocks until the task has exited.
    pub fn activate(&self, active: bool) -> Result<()> {
        if active {
            self.start_task()
        } else {
            self.stop_task();
            Ok(())
        }
    }

    /// Negotiate again with the current peer
    ///
    /// A running task keeps streaming the format it was activated with; the
    /// new format takes effect on the next activation.
    pub fn renegotiate(&self) -> Result<ImageFormat> {
        let result = self.negotiate();
        if self.queue.is_running() {
            self.queue.request_renegotiation();
        }
        result
    }

    /// Link a downstream peer, replacing any previous one
    pub fn link(&self, peer: Arc<dyn Downstream>) {
        debug!("Linking pad {}", self.name());
        self.peer.link(peer);
    }

    /// Drop the downstream link, returning whether one existed
    pub fn unlink(&self) -> bool {
        debug!("Unlinking pad {}", self.name());
        self.peer.unlink()
    }

    /// Whether a downstream peer is linked
    pub fn is_linked(&self) -> bool {
        self.peer.is_linked()
    }

    /// Attach the camera's capability provider
    pub fn attach_provider(&self, provider: Arc<dyn CapabilityProvider>) {
        self.negotiation.attach_provider(provider);
    }

    /// Detach the capability provider, returning whether one was attached
    pub fn detach_provider(&self) -> bool {
        self.negotiation.detach_provider()
    }

    /// Queue a captured frame for the streaming task
    pub fn enqueue(&self, buffer: FrameBuffer) {
        self.queue.push(buffer);
    }

    /// Drop all queued frames, returning how many were dropped
    pub fn flush_queue(&self) -> usize {
        self.queue.flush()
    }

    /// Number of frames waiting to be pushed
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Last successfully negotiated format
    pub fn negotiated_format(&self) -> Option<ImageFormat> {
        self.negotiation.negotiated_format()
    }

    /// Current task state
    pub fn task_state(&self) -> TaskState {
        *self.state.read()
    }

    /// Snapshot of streaming statistics
    pub fn stats(&self) -> PadStats {
        self.stats.snapshot()
    }

    /// Take the message bus receiver
    ///
    /// Returns `None` after the first call.
    pub fn take_message_receiver(&self) -> Option<mpsc::Receiver<PadMessage>> {
        self.bus.take_receiver()
    }

    fn set_state(&self, new: TaskState) {
        let old = std::mem::replace(&mut *self.state.write(), new);
        if old != new {
            debug!("Pad {} task {old} -> {new}", self.name());
            self.bus.post(PadMessage::StateChanged { old, new });
        }
    }

    fn start_task(&self) -> Result<()> {
        let mut stream = self.stream.lock();
        if self.task_state() == TaskState::Running {
            debug!("Pad {} already active", self.name());
            return Ok(());
        }

        debug!("Activating pad {}", self.name());
        self.negotiate()?;

        self.set_state(TaskState::Starting);
        self.segments.reset();
        self.queue.start();

        if let Err(e) = stream.start(&self.config.task_name, self.loop_body()) {
            error!("Failed to start streaming task on pad {}: {e}", self.name());
            self.queue.stop();
            stream.stop();
            self.set_state(TaskState::Stopped);
            return Err(e);
        }

        self.set_state(TaskState::Running);
        info!("Pad {} activated", self.name());
        Ok(())
    }

    fn stop_task(&self) {
        let mut stream = self.stream.lock();
        debug!("Deactivating pad {}", self.name());
        self.queue.stop();
        if self.task_state() != TaskState::Stopped {
            self.set_state(TaskState::StoppingRequested);
        }

        stream.stop();
        self.set_state(TaskState::Stopped);
        info!("Pad {} deactivated", self.name());
    }

    fn loop_body(&self) -> LoopBody {
        let task = StreamingTask {
            queue: Arc::clone(&self.queue),
            peer: Arc::clone(&self.peer),
            segments: Arc::clone(&self.segments),
            tags: Arc::clone(&self.tags),
            stats: Arc::clone(&self.stats),
        };
        let bus = self.bus.sender();

        Box::new(move || match task.iterate() {
            Ok(Iteration::Pushed) => ControlFlow::Continue(()),
            Ok(Iteration::Stopped) => ControlFlow::Break(()),
            Err(e) => {
                message::post(&bus, PadMessage::Error(e));
                ControlFlow::Continue(())
            }
        })
    }
}

impl fmt::Debug for ImgSrcPad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImgSrcPad")
            .field("name", &self.name())
            .field("state", &self.task_state())
            .field("linked", &self.is_linked())
            .field("queued", &self.queued())
            .finish_non_exhaustive()
    }
}

impl Drop for ImgSrcPad {
    fn drop(&mut self) {
        debug!("Dropping pad {}", self.name());
        if self.task_state() != TaskState::Stopped {
            self.stop_task();
        }
    }
}

/// Builder for [`ImgSrcPad`]
pub struct ImgSrcPadBuilder {
    config: ImgSrcConfig,
    segments: Option<Arc<dyn SegmentManager>>,
    tags: Option<Arc<dyn TagExtractor>>,
    scheduler: Option<Box<dyn Scheduler>>,
    provider: Option<Arc<dyn CapabilityProvider>>,
}

impl ImgSrcPadBuilder {
    fn new(config: ImgSrcConfig) -> Self {
        Self {
            config,
            segments: None,
            tags: None,
            scheduler: None,
            provider: None,
        }
    }

    /// Set the segment manager (default: [`RunningTimeSegments`])
    #[must_use]
    pub fn segments(mut self, segments: Arc<dyn SegmentManager>) -> Self {
        self.segments = Some(segments);
        self
    }

    /// Set the tag extractor (required)
    #[must_use]
    pub fn tags(mut self, tags: Arc<dyn TagExtractor>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Set the task scheduler (default: [`ThreadScheduler`])
    #[must_use]
    pub fn scheduler(mut self, scheduler: Box<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Attach a capability provider up front
    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn CapabilityProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Build the pad
    ///
    /// Fails with [`ImgSrcError::InvalidConfig`] if the configuration does
    /// not validate or no tag extractor was set.
    pub fn build(self) -> Result<ImgSrcPad> {
        self.config
            .validate()
            .map_err(|issues| ImgSrcError::InvalidConfig(issues.join("; ")))?;

        let tags = self
            .tags
            .ok_or_else(|| ImgSrcError::InvalidConfig("tag extractor is required".to_string()))?;

        info!("Creating pad with config: {:?}", self.config);

        let config = Arc::new(self.config);
        let negotiation = NegotiationEngine::new(Arc::clone(&config));
        if let Some(provider) = self.provider {
            negotiation.attach_provider(provider);
        }

        Ok(ImgSrcPad {
            config,
            negotiation,
            queue: Arc::new(BufferQueue::new()),
            peer: Arc::new(PeerSlot::default()),
            segments: self
                .segments
                .unwrap_or_else(|| Arc::new(RunningTimeSegments::new())),
            tags,
            stream: Mutex::new(
                self.scheduler
                    .unwrap_or_else(|| Box::new(ThreadScheduler::new())),
            ),
            state: RwLock::new(TaskState::Stopped),
            stats: Arc::new(TaskStats::default()),
            bus: MessageBus::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::{Duration, Instant};

    use stillsrc_caps::{Fraction, Structure, JPEG};

    use super::*;
    use crate::buffer::{TagList, TagValue};
    use crate::flow::FlowReturn;
    use crate::testing::{
        CountingScheduler, FailingScheduler, FixedTags, MockProvider, RecordingDownstream, RecordingSegments,
        SchedulerCalls,
    };

    fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    fn tags() -> Arc<FixedTags> {
        Arc::new(FixedTags::new(Some(
            TagList::new().with("image-orientation", TagValue::Int(0)),
        )))
    }

    fn counting_pad() -> (ImgSrcPad, SchedulerCalls) {
        let (scheduler, calls) = CountingScheduler::new();
        let pad = ImgSrcPad::builder(ImgSrcConfig::default())
            .tags(tags())
            .scheduler(Box::new(scheduler))
            .build()
            .expect("pad");
        (pad, calls)
    }

    fn linked_pad() -> (ImgSrcPad, SchedulerCalls, Arc<RecordingDownstream>) {
        let (pad, calls) = counting_pad();
        let downstream = Arc::new(RecordingDownstream::new());
        pad.link(downstream.clone());
        (pad, calls, downstream)
    }

    #[test]
    fn test_pad_creation() {
        let (pad, _calls) = counting_pad();
        assert_eq!(pad.name(), "imgsrc");
        assert_eq!(pad.task_state(), TaskState::Stopped);
        assert!(!pad.is_linked());
        assert!(pad.negotiated_format().is_none());
        assert_eq!(pad.stats(), PadStats::default());
    }

    #[test]
    fn test_invalid_config() {
        let config = ImgSrcConfig {
            default_fps: 0, // Invalid
            ..Default::default()
        };

        let result = ImgSrcPad::builder(config).tags(tags()).build();
        assert!(matches!(result, Err(ImgSrcError::InvalidConfig(_))));
    }

    #[test]
    fn test_tag_extractor_required() {
        let result = ImgSrcPad::builder(ImgSrcConfig::default()).build();
        assert!(matches!(result, Err(ImgSrcError::InvalidConfig(_))));
    }

    #[test]
    fn test_activate_and_stream() {
        let (pad, calls, downstream) = linked_pad();

        pad.activate(true).expect("activate");
        assert_eq!(pad.task_state(), TaskState::Running);
        assert_eq!(
            pad.negotiated_format(),
            Some(ImageFormat::new(JPEG, 640, 480, Fraction::from_integer(30)))
        );

        pad.enqueue(FrameBuffer::new(vec![1]));
        pad.enqueue(FrameBuffer::new(vec![2]));
        assert!(wait_until(|| downstream.buffers().len() == 2));

        let order: Vec<u8> = downstream.buffers().iter().map(|b| b.data()[0]).collect();
        assert_eq!(order, vec![1, 2]);

        pad.activate(false).expect("deactivate");
        assert_eq!(pad.task_state(), TaskState::Stopped);
        assert_eq!(calls.starts(), 1);
        assert_eq!(calls.stops(), 1);
        assert_eq!(pad.stats().buffers_pushed, 2);
    }

    #[test]
    fn test_failed_negotiation_never_schedules() {
        let (pad, calls, _downstream) = linked_pad();
        pad.attach_provider(Arc::new(MockProvider::new(Caps::empty())));
        let mut rx = pad.take_message_receiver().expect("receiver");

        let err = pad.activate(true).expect_err("no caps");
        assert!(matches!(err, ImgSrcError::Format(_)));
        assert_eq!(pad.task_state(), TaskState::Stopped);
        assert_eq!(calls.starts(), 0);
        assert_eq!(rx.try_recv().ok(), Some(PadMessage::Error(err)));
    }

    #[test]
    fn test_deactivate_while_waiting() {
        let (pad, _calls, downstream) = linked_pad();
        pad.activate(true).expect("activate");

        thread::sleep(Duration::from_millis(20));
        pad.activate(false).expect("deactivate");

        assert_eq!(pad.task_state(), TaskState::Stopped);
        assert!(downstream.buffers().is_empty());
        assert_eq!(pad.stats(), PadStats::default());
    }

    #[test]
    fn test_scheduling_failure_rolls_back() {
        let (scheduler, calls) = FailingScheduler::new();
        let pad = ImgSrcPad::builder(ImgSrcConfig::default())
            .tags(tags())
            .scheduler(Box::new(scheduler))
            .build()
            .expect("pad");

        let err = pad.activate(true).expect_err("no worker");
        assert!(matches!(err, ImgSrcError::Scheduling(_)));
        assert_eq!(pad.task_state(), TaskState::Stopped);
        assert_eq!(calls.starts(), 1);
        assert_eq!(calls.stops(), 1);
    }

    #[test]
    fn test_activate_twice_is_noop() {
        let (pad, calls, _downstream) = linked_pad();
        pad.activate(true).expect("activate");
        pad.activate(true).expect("activate again");
        assert_eq!(calls.starts(), 1);
        pad.activate(false).expect("deactivate");
    }

    #[test]
    fn test_state_changes_posted() {
        let (pad, _calls, _downstream) = linked_pad();
        let mut rx = pad.take_message_receiver().expect("receiver");

        pad.activate(true).expect("activate");
        pad.activate(false).expect("deactivate");

        let mut states = Vec::new();
        while let Ok(message) = rx.try_recv() {
            if let PadMessage::StateChanged { new, .. } = message {
                states.push(new);
            }
        }
        assert_eq!(
            states,
            vec![
                TaskState::Starting,
                TaskState::Running,
                TaskState::StoppingRequested,
                TaskState::Stopped
            ]
        );
    }

    #[test]
    fn test_unlinked_push_posts_error() {
        let (pad, _calls) = counting_pad();
        let mut rx = pad.take_message_receiver().expect("receiver");

        pad.activate(true).expect("activate");
        pad.enqueue(FrameBuffer::new(vec![1]));
        assert!(wait_until(|| pad.stats().flow_errors == 1));
        assert_eq!(pad.task_state(), TaskState::Running);
        pad.activate(false).expect("deactivate");

        let mut errors = Vec::new();
        while let Ok(message) = rx.try_recv() {
            if let PadMessage::Error(e) = message {
                errors.push(e);
            }
        }
        assert_eq!(
            errors,
            vec![ImgSrcError::DataFlow {
                flow: FlowReturn::NotLinked
            }]
        );
    }

    #[test]
    fn test_eos_posts_no_error() {
        let (pad, _calls, downstream) = linked_pad();
        downstream.set_flow(FlowReturn::Eos);
        let mut rx = pad.take_message_receiver().expect("receiver");

        pad.activate(true).expect("activate");
        pad.enqueue(FrameBuffer::new(vec![1]));
        assert!(wait_until(|| pad.stats().eos_results == 1));
        pad.activate(false).expect("deactivate");

        while let Ok(message) = rx.try_recv() {
            assert!(!matches!(message, PadMessage::Error(_)));
        }
    }

    #[test]
    fn test_renegotiate_while_running_keeps_stream() {
        let (pad, _calls, _downstream) = linked_pad();
        pad.activate(true).expect("activate");

        let peer = Arc::new(RecordingDownstream::with_caps(Caps::from_structure(Structure::fixed(
            JPEG,
            1600,
            1200,
            Fraction::from_integer(30),
        ))));
        pad.link(peer.clone());

        let format = pad.renegotiate().expect("renegotiate");
        assert_eq!(format.width, 1600);
        assert_eq!(pad.task_state(), TaskState::Running);

        pad.enqueue(FrameBuffer::new(vec![3]));
        assert!(wait_until(|| peer.buffers().len() == 1));
        assert!(wait_until(|| !pad.queue.renegotiation_pending()));

        pad.activate(false).expect("deactivate");
    }

    #[test]
    fn test_renegotiate_inactive() {
        let (pad, _calls) = counting_pad();
        pad.renegotiate().expect("renegotiate");
        assert!(!pad.queue.renegotiation_pending());
        assert!(pad.negotiated_format().is_some());
    }

    #[test]
    fn test_segments_reset_per_activation() {
        let segments = Arc::new(RecordingSegments::default());
        let (scheduler, _calls) = CountingScheduler::new();
        let pad = ImgSrcPad::builder(ImgSrcConfig::default())
            .tags(tags())
            .segments(segments.clone())
            .scheduler(Box::new(scheduler))
            .build()
            .expect("pad");

        pad.activate(true).expect("activate");
        pad.activate(false).expect("deactivate");
        pad.activate(true).expect("activate");
        pad.activate(false).expect("deactivate");
        assert_eq!(segments.reset_count(), 2);
    }

    #[test]
    fn test_deactivate_waits_for_inflight_activation() {
        let provider = Arc::new(MockProvider::new(Caps::from_structure(Structure::new(JPEG))));
        provider.delay_commits(Duration::from_millis(200));
        let pad = Arc::new(
            ImgSrcPad::builder(ImgSrcConfig::default())
                .tags(tags())
                .provider(provider.clone())
                .build()
                .expect("pad"),
        );
        pad.link(Arc::new(RecordingDownstream::new()));

        let activator = {
            let pad = Arc::clone(&pad);
            thread::spawn(move || pad.activate(true))
        };
        // Size is set under the stream lock just before the slow commit
        assert!(wait_until(|| provider.last_size().is_some()));

        let (done_tx, done_rx) = std::sync::mpsc::channel();
        let deactivator = {
            let pad = Arc::clone(&pad);
            thread::spawn(move || {
                let _ = done_tx.send(pad.activate(false));
            })
        };

        let result = done_rx.recv_timeout(Duration::from_secs(3));
        assert!(matches!(result, Ok(Ok(()))), "deactivation did not complete: {result:?}");
        deactivator.join().expect("deactivator panicked");
        activator.join().expect("activator panicked").expect("activate");

        assert_eq!(provider.commit_count(), 1);
        assert_eq!(pad.task_state(), TaskState::Stopped);
        assert!(!pad.queue.is_running());
    }

    #[test]
    fn test_message_backlog_bounded_without_receiver() {
        let (pad, calls, _downstream) = linked_pad();
        for _ in 0..200 {
            pad.activate(true).expect("activate");
            pad.activate(false).expect("deactivate");
        }
        assert_eq!(calls.stops(), 200);

        let mut rx = pad.take_message_receiver().expect("receiver");
        let mut retained = 0;
        while rx.try_recv().is_ok() {
            retained += 1;
        }
        assert_eq!(retained, crate::message::MESSAGE_CAPACITY);
    }

    #[test]
    fn test_provider_receives_negotiated_size() {
        let provider = Arc::new(MockProvider::new(Caps::from_structure(Structure::new(JPEG))));
        let pad = ImgSrcPad::builder(ImgSrcConfig::default())
            .tags(tags())
            .provider(provider.clone())
            .build()
            .expect("pad");
        pad.link(Arc::new(RecordingDownstream::with_caps(Caps::from_structure(
            Structure::fixed(JPEG, 2048, 1536, Fraction::from_integer(15)),
        ))));

        pad.negotiate().expect("negotiate");
        assert_eq!(provider.last_size(), Some((2048, 1536)));

        assert!(pad.detach_provider());
        assert_eq!(pad.get_capabilities(), ImgSrcConfig::default().template_caps);
    }

    #[test]
    fn test_flush_queue() {
        let (pad, _calls) = counting_pad();
        pad.enqueue(FrameBuffer::new(vec![1]));
        pad.enqueue(FrameBuffer::new(vec![2]));
        assert_eq!(pad.queued(), 2);
        assert_eq!(pad.flush_queue(), 2);
        assert_eq!(pad.queued(), 0);
    }

    #[test]
    fn test_drop_deactivates() {
        let (pad, calls, _downstream) = linked_pad();
        pad.activate(true).expect("activate");
        drop(pad);
        assert_eq!(calls.stops(), 1);
    }
}
