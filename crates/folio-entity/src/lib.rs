//! # folio-entity
//!
//! Domain entities for Folio. Plain data types with `serde` and
//! `sqlx::FromRow` derives — no query logic lives here.

pub mod node;
pub mod outbox;
pub mod permission;
pub mod principal;
pub mod role;

pub use node::{ContainerData, ContentNode, Node, NodeKind, NodeRef, PageData};
pub use permission::{Action, Capability, JointPermission, PermissionRule};
pub use principal::Principal;
pub use role::Role;
