//! Search events.
//!
//! The engine reports completed and degraded searches on an [`EventBus`].
//! Delivery is at-most-once and never affects the search itself.

mod bus;
mod event;

pub use bus::{EventBus, EventSubscriber};
pub use event::{SearchCompletedEvent, SearchDegradedEvent, SearchEvent};
