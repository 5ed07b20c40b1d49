//! Pad Messages
//!
//! Errors raised on the streaming thread and task state changes are posted
//! here for the owning element to observe. The bus holds at most
//! [`MESSAGE_CAPACITY`] undelivered messages; later posts are dropped until
//! the receiver drains it.

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::ImgSrcError;
use crate::task::TaskState;

/// Undelivered messages retained before new posts are dropped
pub const MESSAGE_CAPACITY: usize = 64;

/// Message posted by the pad
#[derive(Debug, Clone, PartialEq)]
pub enum PadMessage {
    /// An error the pad could not return to a caller
    Error(ImgSrcError),

    /// The streaming task changed state
    StateChanged {
        /// Previous state
        old: TaskState,
        /// New state
        new: TaskState,
    },
}

#[derive(Debug)]
pub(crate) struct MessageBus {
    tx: mpsc::Sender<PadMessage>,
    rx: Mutex<Option<mpsc::Receiver<PadMessage>>>,
}

impl MessageBus {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::channel(MESSAGE_CAPACITY);
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
        }
    }

    pub(crate) fn sender(&self) -> mpsc::Sender<PadMessage> {
        self.tx.clone()
    }

    pub(crate) fn post(&self, message: PadMessage) {
        post(&self.tx, message);
    }

    pub(crate) fn take_receiver(&self) -> Option<mpsc::Receiver<PadMessage>> {
        self.rx.lock().take()
    }
}

/// Post without blocking the caller
pub(crate) fn post(tx: &mpsc::Sender<PadMessage>, message: PadMessage) {
    match tx.try_send(message) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(message)) => {
            debug!("Message bus full, dropping {:?}", message);
        }
        Err(mpsc::error::TrySendError::Closed(message)) => {
            trace!("No message receiver, dropping {:?}", message);
        }
    }
}
