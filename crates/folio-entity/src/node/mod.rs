//! Content node domain entities.

pub mod kind;
pub mod model;
pub mod payload;
pub mod shelf;

pub use kind::NodeKind;
pub use model::{ContentNode, NewNode, NodeRef};
pub use payload::{ContainerData, Node, NodePayload, PageData};
pub use shelf::ShelfBook;
