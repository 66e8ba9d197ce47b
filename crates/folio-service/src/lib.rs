//! # folio-service
//!
//! Orchestration layer for Folio: content lifecycle, permission rule
//! management, and the asynchronous rebuild worker. Services wire the
//! repositories, the hierarchy resolver, and the joint permission
//! engine together and are the only place cross-component invariants
//! (write + rebuild as one unit of work) are enforced.

pub mod content;
pub mod context;
pub mod permission;
pub mod worker;

pub use content::ContentService;
pub use context::RequestContext;
pub use permission::PermissionRuleService;
pub use worker::RebuildWorker;
