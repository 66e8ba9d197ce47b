//! Permission actions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The bounded action set checked against the joint permission index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "perm_action", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// View a node.
    View,
    /// Create children under a container node.
    Create,
    /// Update a node's identity or payload.
    Update,
    /// Delete (soft or hard) a node.
    Delete,
}

impl Action {
    /// All actions.
    pub const ALL: [Action; 4] = [Self::View, Self::Create, Self::Update, Self::Delete];

    /// Return the action as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Action {
    type Err = folio_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "view" => Ok(Self::View),
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            _ => Err(folio_core::AppError::validation(format!(
                "Invalid action: '{s}'. Expected one of: view, create, update, delete"
            ))),
        }
    }
}
