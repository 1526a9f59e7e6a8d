//! Praxis Types - Shared domain types
//!
//! This crate contains domain types used across the Praxis billing engine:
//! - User identity
//! - Plan catalog entries and billing cadence
//! - Subscription lifecycle state
//! - Metered usage records and snapshots

pub mod user;
pub mod plan;
pub mod subscription;
pub mod usage;

pub use user::*;
pub use plan::*;
pub use subscription::*;
pub use usage::*;
