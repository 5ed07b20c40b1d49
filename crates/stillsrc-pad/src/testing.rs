//! Test doubles for the pad's collaborators

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use stillsrc_caps::Caps;

use crate::buffer::{FrameBuffer, TagList};
use crate::error::{ImgSrcError, Result};
use crate::flow::{Downstream, FlowReturn, PadEvent};
use crate::provider::{CapabilityProvider, SegmentManager, TagExtractor};
use crate::task::{LoopBody, Scheduler, ThreadScheduler};

/// Ordered log shared between doubles
#[derive(Debug, Clone, Default)]
pub(crate) struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub(crate) fn record(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

fn first_byte(buffer: &FrameBuffer) -> u8 {
    buffer.data().first().copied().unwrap_or_default()
}

/// Camera stand-in with configurable caps
#[derive(Debug)]
pub(crate) struct MockProvider {
    caps: Mutex<Caps>,
    sizes: Mutex<Vec<(u32, u32)>>,
    commits: AtomicUsize,
    reject: AtomicBool,
    delay: Mutex<Duration>,
}

impl MockProvider {
    pub(crate) fn new(caps: Caps) -> Self {
        Self {
            caps: Mutex::new(caps),
            sizes: Mutex::new(Vec::new()),
            commits: AtomicUsize::new(0),
            reject: AtomicBool::new(false),
            delay: Mutex::new(Duration::ZERO),
        }
    }

    /// Make every commit take `delay`
    pub(crate) fn delay_commits(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    pub(crate) fn reject_commits(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    pub(crate) fn last_size(&self) -> Option<(u32, u32)> {
        self.sizes.lock().last().copied()
    }

    pub(crate) fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

impl CapabilityProvider for MockProvider {
    fn capture_caps(&self) -> Caps {
        self.caps.lock().clone()
    }

    fn set_capture_size(&self, width: u32, height: u32) {
        self.sizes.lock().push((width, height));
    }

    fn commit_parameters(&self) -> Result<()> {
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        if self.reject.load(Ordering::SeqCst) {
            return Err(ImgSrcError::camera_params("device busy"));
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Peer recording everything it receives
#[derive(Debug)]
pub(crate) struct RecordingDownstream {
    caps: Mutex<Option<Caps>>,
    flow: Mutex<FlowReturn>,
    refuse: AtomicBool,
    events: Mutex<Vec<PadEvent>>,
    buffers: Mutex<Vec<FrameBuffer>>,
    journal: Journal,
}

impl RecordingDownstream {
    pub(crate) fn new() -> Self {
        Self::with_journal(Journal::default())
    }

    pub(crate) fn with_journal(journal: Journal) -> Self {
        Self {
            caps: Mutex::new(None),
            flow: Mutex::new(FlowReturn::Ok),
            refuse: AtomicBool::new(false),
            events: Mutex::new(Vec::new()),
            buffers: Mutex::new(Vec::new()),
            journal,
        }
    }

    pub(crate) fn with_caps(caps: Caps) -> Self {
        let downstream = Self::new();
        *downstream.caps.lock() = Some(caps);
        downstream
    }

    pub(crate) fn set_flow(&self, flow: FlowReturn) {
        *self.flow.lock() = flow;
    }

    pub(crate) fn refuse_events(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    pub(crate) fn journal(&self) -> &Journal {
        &self.journal
    }

    pub(crate) fn buffers(&self) -> Vec<FrameBuffer> {
        self.buffers.lock().clone()
    }

    pub(crate) fn segment_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| matches!(event, PadEvent::Segment(_)))
            .count()
    }

    pub(crate) fn tag_event_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| matches!(event, PadEvent::Tags(_)))
            .count()
    }
}

impl Downstream for RecordingDownstream {
    fn caps(&self) -> Option<Caps> {
        self.caps.lock().clone()
    }

    fn push_event(&self, event: PadEvent) -> bool {
        if self.refuse.load(Ordering::SeqCst) {
            return false;
        }
        self.journal.record(match event {
            PadEvent::Segment(_) => "segment",
            PadEvent::Tags(_) => "tags",
        });
        self.events.lock().push(event);
        true
    }

    fn push(&self, buffer: FrameBuffer) -> FlowReturn {
        self.journal.record(format!("push {}", first_byte(&buffer)));
        self.buffers.lock().push(buffer);
        *self.flow.lock()
    }
}

/// Segment manager recording calls
#[derive(Debug, Default)]
pub(crate) struct RecordingSegments {
    opens: AtomicUsize,
    resets: AtomicUsize,
    fail: AtomicBool,
    journal: Journal,
}

impl RecordingSegments {
    pub(crate) fn with_journal(journal: Journal) -> Self {
        Self {
            journal,
            ..Self::default()
        }
    }

    pub(crate) fn fail_open(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub(crate) fn reset_count(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

impl SegmentManager for RecordingSegments {
    fn open_segment(&self, _peer: &dyn Downstream) -> Result<()> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ImgSrcError::segment("injected failure"));
        }
        Ok(())
    }

    fn update_segment(&self, buffer: &mut FrameBuffer) {
        self.journal.record(format!("update {}", first_byte(buffer)));
    }

    fn reset(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

/// Extractor returning the same tags for every buffer
#[derive(Debug, Clone)]
pub(crate) struct FixedTags(Option<TagList>);

impl FixedTags {
    pub(crate) fn new(tags: Option<TagList>) -> Self {
        Self(tags)
    }
}

impl TagExtractor for FixedTags {
    fn extract(&self, _buffer: &FrameBuffer) -> Option<TagList> {
        self.0.clone()
    }
}

/// Scheduler counters observable after the scheduler moves into a pad
#[derive(Debug, Clone, Default)]
pub(crate) struct SchedulerCalls {
    starts: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
}

impl SchedulerCalls {
    pub(crate) fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub(crate) fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

/// Thread scheduler that counts its calls
#[derive(Debug, Default)]
pub(crate) struct CountingScheduler {
    inner: ThreadScheduler,
    calls: SchedulerCalls,
}

impl CountingScheduler {
    pub(crate) fn new() -> (Self, SchedulerCalls) {
        let scheduler = Self::default();
        let calls = scheduler.calls.clone();
        (scheduler, calls)
    }
}

impl Scheduler for CountingScheduler {
    fn start(&mut self, name: &str, body: LoopBody) -> Result<()> {
        self.calls.starts.fetch_add(1, Ordering::SeqCst);
        self.inner.start(name, body)
    }

    fn stop(&mut self) {
        self.calls.stops.fetch_add(1, Ordering::SeqCst);
        self.inner.stop();
    }

    fn is_started(&self) -> bool {
        self.inner.is_started()
    }
}

/// Scheduler that can never start a task
#[derive(Debug, Default)]
pub(crate) struct FailingScheduler {
    calls: SchedulerCalls,
}

impl FailingScheduler {
    pub(crate) fn new() -> (Self, SchedulerCalls) {
        let scheduler = Self::default();
        let calls = scheduler.calls.clone();
        (scheduler, calls)
    }
}

impl Scheduler for FailingScheduler {
    fn start(&mut self, name: &str, _body: LoopBody) -> Result<()> {
        self.calls.starts.fetch_add(1, Ordering::SeqCst);
        Err(ImgSrcError::scheduling(format!("no worker for {name}")))
    }

    fn stop(&mut self) {
        self.calls.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn is_started(&self) -> bool {
        false
    }
}
