//! Route handlers, one module per route group.

pub mod admin;
pub mod ai;
pub mod auth;
pub mod system;
pub mod user;
