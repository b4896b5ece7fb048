//! Bounded hand-off from the recognizer to the game
//!
//! The recognizer may run on another thread and push faster than the game
//! consumes. The channel holds at most one pending event; anything sent
//! while it is full is dropped, never queued.

use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

use super::ClassificationEvent;

/// Pending events held between two game refreshes
const CAPACITY: usize = 1;

/// Producer half; cheap to clone and `Send`
#[derive(Debug, Clone)]
pub struct VoiceSender {
    tx: SyncSender<ClassificationEvent>,
}

/// Single consumer half, drained by the engine
#[derive(Debug)]
pub struct VoiceInbox {
    rx: Receiver<ClassificationEvent>,
}

pub fn channel() -> (VoiceSender, VoiceInbox) {
    let (tx, rx) = mpsc::sync_channel(CAPACITY);
    (VoiceSender { tx }, VoiceInbox { rx })
}

impl VoiceSender {
    /// Offer an event. Returns `false` if it was dropped.
    pub fn send(&self, event: ClassificationEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                log::trace!("Voice inbox full, dropping {:?}", event.label);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

impl VoiceInbox {
    /// Next pending event, if any
    pub fn try_next(&self) -> Option<ClassificationEvent> {
        self.rx.try_recv().ok()
    }
}
