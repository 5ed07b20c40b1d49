//! Streaming Task
//!
//! The task drains the [`BufferQueue`] one buffer per iteration and pushes
//! each buffer downstream, preceded by a segment update and a tag event.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐ enqueue ┌─────────────┐ iterate ┌────────────────┐
//! │ Capture side │────────▶│ BufferQueue │────────▶│ StreamingTask  │
//! └──────────────┘         └─────────────┘         │  segment, tags │
//!                                                  │  push          │
//!                                                  └───────┬────────┘
//!                                                          ▼
//!                                                     Downstream
//! ```
//!
//! A [`Scheduler`] owns the thread that invokes the loop body repeatedly.
//! The body is the only place that blocks on the queue; it returns
//! [`ControlFlow::Break`] once the queue is stopped.

use std::fmt;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error, trace, warn};

use crate::buffer::BufferFlag;
use crate::error::{ImgSrcError, Result};
use crate::flow::{FlowReturn, PadEvent, PeerSlot};
use crate::provider::{SegmentManager, TagExtractor};
use crate::queue::BufferQueue;

/// Lifecycle of the streaming task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskState {
    /// No task scheduled
    #[default]
    Stopped,

    /// Activation requested, task not yet scheduled
    Starting,

    /// Loop scheduled
    Running,

    /// Deactivation requested, waiting for the task to exit
    StoppingRequested,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::StoppingRequested => "stopping",
        };
        f.write_str(name)
    }
}

/// Outcome of one loop iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iteration {
    /// A buffer was handed downstream
    Pushed,

    /// The queue was stopped; the scheduler should stop invoking
    Stopped,
}

/// Loop body handed to a [`Scheduler`]
pub type LoopBody = Box<dyn FnMut() -> ControlFlow<()> + Send + 'static>;

/// Runs the streaming loop body on a worker
pub trait Scheduler: Send {
    /// Start invoking `body` repeatedly until it breaks or [`stop`] is called
    ///
    /// Fails with [`ImgSrcError::Scheduling`] if no worker could be started.
    ///
    /// [`stop`]: Scheduler::stop
    fn start(&mut self, name: &str, body: LoopBody) -> Result<()>;

    /// Stop invoking the body and wait for the worker to exit
    fn stop(&mut self);

    /// Whether a worker has been started and not yet joined
    fn is_started(&self) -> bool;
}

/// [`Scheduler`] backed by a named OS thread
#[derive(Debug, Default)]
pub struct ThreadScheduler {
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl ThreadScheduler {
    /// Create an idle scheduler
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for ThreadScheduler {
    fn start(&mut self, name: &str, mut body: LoopBody) -> Result<()> {
        if self.handle.is_some() {
            return Err(ImgSrcError::scheduling(format!("task {name} already started")));
        }

        self.stop.store(false, Ordering::Release);
        let stop = Arc::clone(&self.stop);

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                debug!("Streaming task started");
                while !stop.load(Ordering::Acquire) {
                    if body().is_break() {
                        break;
                    }
                }
                debug!("Streaming task exited");
            })
            .map_err(|e| ImgSrcError::scheduling(format!("failed to spawn {name}: {e}")))?;

        self.handle = Some(handle);
        Ok(())
    }

    fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);

        let Some(handle) = self.handle.take() else {
            return;
        };

        if handle.thread().id() == thread::current().id() {
            warn!("Streaming task asked to join itself, detaching");
            return;
        }

        if handle.join().is_err() {
            error!("Streaming task panicked");
        }
    }

    fn is_started(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Live counters updated by the streaming task
#[derive(Debug, Default)]
pub(crate) struct TaskStats {
    buffers_pushed: AtomicU64,
    tag_events: AtomicU64,
    tag_event_failures: AtomicU64,
    missing_tags: AtomicU64,
    segment_failures: AtomicU64,
    flow_errors: AtomicU64,
    eos_results: AtomicU64,
}

impl TaskStats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> PadStats {
        PadStats {
            buffers_pushed: self.buffers_pushed.load(Ordering::Relaxed),
            tag_events: self.tag_events.load(Ordering::Relaxed),
            tag_event_failures: self.tag_event_failures.load(Ordering::Relaxed),
            missing_tags: self.missing_tags.load(Ordering::Relaxed),
            segment_failures: self.segment_failures.load(Ordering::Relaxed),
            flow_errors: self.flow_errors.load(Ordering::Relaxed),
            eos_results: self.eos_results.load(Ordering::Relaxed),
        }
    }
}

/// Statistics for the pad
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PadStats {
    /// Buffers accepted downstream
    pub buffers_pushed: u64,

    /// Tag events delivered
    pub tag_events: u64,

    /// Tag events the peer refused
    pub tag_event_failures: u64,

    /// Buffers with no derivable tags
    pub missing_tags: u64,

    /// Segments that could not be announced
    pub segment_failures: u64,

    /// Fatal flow results
    pub flow_errors: u64,

    /// Pushes answered with end of stream
    pub eos_results: u64,
}

/// One-buffer-per-iteration push loop
pub(crate) struct StreamingTask {
    pub(crate) queue: Arc<BufferQueue>,
    pub(crate) peer: Arc<PeerSlot>,
    pub(crate) segments: Arc<dyn SegmentManager>,
    pub(crate) tags: Arc<dyn TagExtractor>,
    pub(crate) stats: Arc<TaskStats>,
}

impl StreamingTask {
    /// Wait for a buffer and push it downstream
    ///
    /// Returns [`Iteration::Stopped`] once the queue is stopped. A fatal
    /// flow result is returned as [`ImgSrcError::DataFlow`]; the buffer is
    /// dropped either way.
    pub(crate) fn iterate(&self) -> Result<Iteration> {
        let Some(mut buffer) = self.queue.pop_blocking() else {
            debug!("Queue stopped, leaving streaming loop");
            return Ok(Iteration::Stopped);
        };

        let peer = self.peer.get();

        if let Err(e) = self.segments.open_segment(peer.as_ref()) {
            warn!("{e}");
            TaskStats::bump(&self.stats.segment_failures);
        }
        self.segments.update_segment(&mut buffer);

        let tags = self.tags.extract(&buffer);
        if tags.is_none() {
            warn!("Failed to extract tags from {} byte buffer", buffer.len());
            TaskStats::bump(&self.stats.missing_tags);
        }

        buffer.set_flag(BufferFlag::Discont);

        if let Some(tags) = tags {
            trace!("Pushing {tags}");
            buffer.set_tags(tags.clone());
            if peer.push_event(PadEvent::Tags(tags)) {
                TaskStats::bump(&self.stats.tag_events);
            } else {
                warn!("Failed to push tag event");
                TaskStats::bump(&self.stats.tag_event_failures);
            }
        }

        match peer.push(buffer) {
            FlowReturn::Ok => {
                TaskStats::bump(&self.stats.buffers_pushed);
                Ok(Iteration::Pushed)
            }
            FlowReturn::Eos => {
                debug!("Downstream reached end of stream");
                TaskStats::bump(&self.stats.eos_results);
                Ok(Iteration::Pushed)
            }
            flow => {
                error!("Failed to push buffer: {flow}");
                TaskStats::bump(&self.stats.flow_errors);
                Err(ImgSrcError::DataFlow { flow })
            }
        }
    }
}
