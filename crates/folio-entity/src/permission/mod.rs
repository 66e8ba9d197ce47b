//! Permission domain entities.

pub mod action;
pub mod capability;
pub mod joint;
pub mod rule;

pub use action::Action;
pub use capability::Capability;
pub use joint::JointPermission;
pub use rule::{PermissionRule, RuleEntry};
