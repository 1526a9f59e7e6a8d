//! Praxis DB - Database abstractions
//!
//! SQLx-based persistence layer for the Praxis billing engine. The core never
//! talks to a database directly; it goes through the repository traits in
//! [`repo`], which the [`pg`] module implements for PostgreSQL.
//!
//! # Example
//!
//! ```rust,ignore
//! use praxis_db::{create_pool, Repositories};
//!
//! let pool = create_pool("postgres://localhost/praxis").await?;
//! let repos = Repositories::new(pool);
//!
//! let plan = repos.plans.find_by_name("premium").await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, DbPool};
pub use repo::*;
