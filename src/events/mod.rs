//! Flow lifecycle events, published after a scope commits so subscribers
//! (notifiers, audit sinks) never observe a change that was rolled back.

pub mod publisher;

pub use publisher::{FlowEvent, FlowEventPublisher, PublishedEvent};
