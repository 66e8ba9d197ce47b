//! # folio-permission
//!
//! The joint permission engine: hierarchy resolution over the content
//! tree, materialization of the (node, role, action) permission index,
//! and the read-path applicator that answers visibility questions from
//! the index alone.

pub mod applicator;
pub mod hierarchy;
pub mod joint;

pub use applicator::PermissionApplicator;
pub use hierarchy::HierarchyResolver;
pub use joint::JointPermissionBuilder;
