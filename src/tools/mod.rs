//! Tool catalog and plan allowance.
//!
//! The catalog holds the seeded [`ToolDefinition`]s; the access policy decides
//! whether an account's plan still permits an invocation.

pub mod access;
pub mod catalog;

pub use access::ToolAccessPolicy;
pub use catalog::{
    builtin_tools, ToolCatalog, ToolCategory, ToolDefinition, ToolKind, UsageLimits,
};
