// SPDX-License-Identifier: MIT OR Apache-2.0
//! Event fan-out (§4.6): a per-subscriber, cooperatively-scheduled,
//! filtered event stream with bounded backpressure.
//!
//! The producer side is the transactional writer of an entity elsewhere in
//! this workspace (the Run state machine, Job dispatch): on a successful
//! commit it builds an [`Event`] and calls [`EventBus::publish`]. Consumers
//! call [`EventBus::subscribe`] with a filter and a
//! [`orc_core::CancellationToken`], then poll [`EventStream::recv`] until
//! it returns `Ok(None)` (cancelled) or `Err(Lagged)` (this subscriber's
//! queue overflowed).
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bus;
mod event;

pub use bus::{EventBus, EventStream, Lagged};
pub use event::{Event, EventAction, EventFilter, EventSubject};
