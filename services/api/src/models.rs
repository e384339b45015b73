//! API models for request and response payloads

use serde::Serialize;

pub mod user;

pub use user::{User, UserCreate, UserLogin, UserUpdate};

/// Envelope wrapping every successful response body
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
