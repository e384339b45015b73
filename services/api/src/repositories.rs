//! Repositories for database operations

pub mod user;

pub use user::{Conditions, PgUserRepository, UserField, UserStore};
