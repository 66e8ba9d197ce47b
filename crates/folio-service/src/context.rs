//! Request context carrying the acting principal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use folio_entity::principal::Principal;

/// Context for the current authenticated request.
///
/// Constructed at the boundary and passed explicitly into every service
/// method, so no operation ever reads the acting principal from ambient
/// state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated principal.
    pub principal: Principal,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Create a new request context.
    pub fn new(principal: Principal) -> Self {
        Self {
            principal,
            request_time: Utc::now(),
        }
    }

    /// The acting principal's id.
    pub fn actor_id(&self) -> i64 {
        self.principal.id
    }
}
