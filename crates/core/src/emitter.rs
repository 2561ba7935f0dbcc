//! Emitter seam — where built payloads leave the engine.

use std::sync::{Arc, Mutex};

use crate::payload::Payload;

/// Consumer of finished payloads.
///
/// Implementations own queueing, batching, retry, and delivery; the engine
/// only hands payloads over, synchronously, and never hears back.
pub trait Emitter: Send + Sync {
    fn input(&self, payload: Payload);
}

/// Emitter that retains every payload it receives, in arrival order.
/// Used by tests and by embedding hosts that drain payloads themselves.
#[derive(Clone, Default)]
pub struct CollectingEmitter {
    received: Arc<Mutex<Vec<Payload>>>,
}

impl CollectingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything received so far.
    pub fn payloads(&self) -> Vec<Payload> {
        self.received
            .lock()
            .expect("collecting emitter lock poisoned")
            .clone()
    }

    pub fn len(&self) -> usize {
        self.received
            .lock()
            .expect("collecting emitter lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Emitter for CollectingEmitter {
    fn input(&self, payload: Payload) {
        self.received
            .lock()
            .expect("collecting emitter lock poisoned")
            .push(payload);
    }
}
