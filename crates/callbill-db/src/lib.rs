//! CallBill Database Layer
//!
//! This crate provides storage for the CallBill system. It includes:
//!
//! - Connection pool management and embedded migrations with sqlx
//! - PostgreSQL repository implementations for call records, priced calls
//!   and bills
//! - An in-memory store implementing the same traits

pub mod memory;
pub mod pool;
pub mod repositories;

pub use memory::MemoryStore;
pub use pool::{connect, create_pool, run_migrations};
pub use repositories::*;

// Re-export commonly used types
pub use callbill_core::{AppError, AppResult};
pub use sqlx::PgPool;
