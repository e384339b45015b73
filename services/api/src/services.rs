//! Business services sitting between routes and repositories

pub mod user;

pub use user::{ServiceError, UserManager, UserService};
