// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-subscriber bounded fan-out (§4.6).
//!
//! Each subscriber gets its own bounded [`tokio::sync::mpsc`] queue. A
//! publish that would block on a full queue instead drops that one
//! subscriber: its stream ends with [`StreamEnd::Lagged`], every other
//! subscriber is unaffected. The registry itself (the filter → sender map)
//! is guarded by a short, non-async-held lock around register, deregister,
//! and the publish fan-out loop, per the shared-resources contract.

use crate::event::{Event, EventFilter};
use orc_core::CancellationToken;
use orc_error::CoreError;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Default per-subscriber queue capacity.
const DEFAULT_CAPACITY: usize = 256;

struct Subscriber {
    id: Uuid,
    filter: EventFilter,
    tx: mpsc::Sender<Event>,
}

type Registry = Arc<Mutex<Vec<Subscriber>>>;

/// The in-process registry of live subscribers and the entry point
/// producers publish committed events through.
#[derive(Default, Clone)]
pub struct EventBus {
    subscribers: Registry,
}

/// Terminal error reported once when a subscriber's queue overflows.
/// Cancellation, by contrast, closes the stream with `Ok(None)` — no
/// error at all, per §4.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lagged;

/// A live subscription returned by [`EventBus::subscribe`].
pub struct EventStream {
    id: Uuid,
    rx: mpsc::Receiver<Event>,
    ctx: CancellationToken,
    registry: Registry,
    lagged: bool,
}

impl EventStream {
    /// Receive the next matching event.
    ///
    /// Returns `Ok(Some(event))` while the stream is live, `Ok(None)` once
    /// `ctx` is cancelled (clean close), and `Err(Lagged)` the one time
    /// this subscriber's queue overflows — no further calls are needed or
    /// meaningful afterward.
    pub async fn recv(&mut self) -> Result<Option<Event>, Lagged> {
        if self.lagged {
            return Err(Lagged);
        }
        loop {
            tokio::select! {
                biased;
                () = self.ctx.cancelled() => {
                    self.deregister();
                    return Ok(None);
                }
                event = self.rx.recv() => {
                    return match event {
                        Some(event) => Ok(Some(event)),
                        None => {
                            // The bus dropped our sender, meaning it detected
                            // a full queue before we could drain it.
                            self.lagged = true;
                            Err(Lagged)
                        }
                    };
                }
            }
        }
    }

    fn deregister(&self) {
        self.registry.lock().expect("event bus registry lock poisoned").retain(|s| s.id != self.id);
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.deregister();
    }
}

impl EventBus {
    /// Create a new, empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events matching `filter`, honouring `ctx` for
    /// cancellation.
    ///
    /// # Errors
    /// [`orc_error::ErrorKind::Invalid`] if `filter` names no criterion at
    /// all.
    pub fn subscribe(&self, filter: EventFilter, ctx: CancellationToken) -> Result<EventStream, CoreError> {
        if filter.is_empty() {
            return Err(CoreError::invalid("event subscription filter must name at least one criterion"));
        }

        let (tx, rx) = mpsc::channel(DEFAULT_CAPACITY);
        let id = Uuid::new_v4();
        self.subscribers.lock().expect("event bus registry lock poisoned").push(Subscriber { id, filter, tx });

        Ok(EventStream { id, rx, ctx, registry: Arc::clone(&self.subscribers), lagged: false })
    }

    /// Publish a committed event to every subscriber whose filter matches.
    ///
    /// Never blocks: a subscriber whose queue is full is dropped from the
    /// registry (and its stream subsequently reports
    /// [`StreamEnd::Lagged`]) rather than slowing the writer down.
    pub fn publish(&self, event: &Event) {
        let mut subscribers = self.subscribers.lock().expect("event bus registry lock poisoned");
        subscribers.retain(|subscriber| {
            if !subscriber.filter.matches(event) {
                return true;
            }
            match subscriber.tx.try_send(event.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(subscriber_id = %subscriber.id, "dropping lagged event subscriber");
                    false
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            }
        });
    }

    /// Number of live subscribers, for diagnostics and tests.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().expect("event bus registry lock poisoned").len()
    }
}
