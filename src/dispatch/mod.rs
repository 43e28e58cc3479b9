//! Asynchronous handoff to the grading worker pool.
//!
//! Attaching a data file to a problem must not block on grading: the
//! pipeline encodes a [`DispatchMessage`] and hands it to a broker topic,
//! and the downstream worker pool consumes it on its own schedule. This
//! module owns both halves of that boundary: the message shape and the
//! producer contract.

pub mod message;
pub mod publisher;

pub use message::DispatchMessage;
pub use publisher::{PublishError, Publisher, RedisPublisher, DISPATCH_TOPIC};
