//! Permission rule and role administration.

pub mod service;

pub use service::PermissionRuleService;
