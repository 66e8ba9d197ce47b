//! The acting principal.

use serde::{Deserialize, Serialize};

/// An opaque authenticated principal: an id plus the role set current at
/// request time. Authentication happens outside the core; this type is
/// passed explicitly through every applicator and service call rather
/// than read from ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// The principal's id.
    pub id: i64,
    /// The principal's role ids.
    pub role_ids: Vec<i64>,
}

impl Principal {
    /// Create a new principal.
    pub fn new(id: i64, role_ids: Vec<i64>) -> Self {
        Self { id, role_ids }
    }

    /// A principal with no roles resolves to "forbidden" everywhere.
    pub fn has_roles(&self) -> bool {
        !self.role_ids.is_empty()
    }
}
