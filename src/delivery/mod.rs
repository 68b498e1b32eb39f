//! Report delivery.

pub mod outbox;

pub use outbox::{Outbox, OutboxMessage};
