//! # AI Hub Core - Authenticated AI Tool Gateway
//!
//! Rust implementation of the AI Hub backend providing:
//! - Account registration and login with signed bearer tokens
//! - Six AI tools (chat, image, resume, code, study, content) behind one
//!   OpenAI-compatible provider client
//! - A usage ledger: per-category counters plus an append-only event log
//! - Fixed-window rate limiting per client address
//! - Optional plan ceilings per tool
//!
//! ## Architecture
//!
//! Every request flows through the same stages:
//! ```text
//!   HTTP request
//!        │
//!        ▼
//!   ┌──────────────┐   ┌─────────────────────┐
//!   │ Rate limiter │ → │ Credential verifier │
//!   └──────────────┘   └─────────────────────┘
//!                                │
//!                                ▼
//!                     ┌──────────────────────┐   ┌──────────────┐
//!                     │ Request orchestrator │ → │ Tool gateway │ → provider
//!                     └──────────────────────┘   └──────────────┘
//!                                │
//!                                ▼
//!                        ┌──────────────┐
//!                        │ Quota ledger │ → store
//!                        └──────────────┘
//! ```

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod auth;
pub mod gateway;
pub mod http;
pub mod hub;
pub mod store;
pub mod tools;
pub mod types;

// Internal utilities
pub mod observability;
pub mod validation;

pub use hub::Hub;
pub use types::{Config, Error, Result};
