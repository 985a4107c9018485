// SPDX-License-Identifier: MIT OR Apache-2.0
//! `SubscribeToRunEvents` (§6): a thin pass-through to the shared
//! [`EventBus`] this service's other operations publish to.

use crate::RunService;
use orc_core::CancellationToken;
use orc_error::CoreError;
use orc_events::{EventFilter, EventStream};

impl RunService {
    /// Subscribe to Run/Plan/Apply/Job events matching `filter`.
    ///
    /// # Errors
    /// [`orc_error::ErrorKind::Invalid`] if `filter` names no criterion —
    /// see [`orc_events::EventBus::subscribe`].
    pub fn subscribe_to_run_events(
        &self,
        filter: EventFilter,
        cancellation: CancellationToken,
    ) -> Result<EventStream, CoreError> {
        self.events.subscribe(filter, cancellation)
    }
}
