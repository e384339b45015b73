//! Common library for the todo-app backend
//!
//! This crate provides shared functionality used across services, namely
//! PostgreSQL connectivity and the database error vocabulary repositories
//! translate store failures into.

pub mod database;
pub mod error;

pub use database::{DatabaseConfig, health_check, init_pool};
pub use error::{DatabaseError, DatabaseResult};
