//! Concrete repository implementations.

pub mod joint;
pub mod node;
pub mod outbox;
pub mod role;
pub mod rule;
pub mod shelf;
