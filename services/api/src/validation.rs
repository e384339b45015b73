//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{UserCreate, UserLogin, UserUpdate};

const MAX_NAME_LEN: usize = 64;

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| !c.is_alphanumeric());

    if !has_upper {
        return Err("Password must contain at least one uppercase letter".to_string());
    }

    if !has_lower {
        return Err("Password must contain at least one lowercase letter".to_string());
    }

    if !has_digit {
        return Err("Password must contain at least one digit".to_string());
    }

    if !has_special {
        return Err("Password must contain at least one special character".to_string());
    }

    Ok(())
}

/// Validate a first or last name
pub fn validate_name(field: &str, name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err(format!("{} is required", field));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(format!(
            "{} must be at most {} characters long",
            field, MAX_NAME_LEN
        ));
    }

    Ok(())
}

/// Validate phone number
pub fn validate_phone(phone: &str) -> Result<(), String> {
    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PHONE_REGEX
        .get_or_init(|| Regex::new(r"^\+?[0-9 \-]{7,20}$").expect("Failed to compile phone regex"));

    if phone.len() > 20 || !regex.is_match(phone) {
        return Err("Invalid phone number".to_string());
    }

    Ok(())
}

pub fn validate_registration(data: &UserCreate) -> Result<(), String> {
    validate_email(&data.email)?;
    validate_password(&data.password)?;
    validate_name("First name", &data.first_name)?;
    validate_name("Last name", &data.last_name)?;
    if let Some(phone) = &data.phone {
        validate_phone(phone)?;
    }
    Ok(())
}

/// Credentials are only checked for presence; a wrong password is the
/// service's business.
pub fn validate_login(data: &UserLogin) -> Result<(), String> {
    if data.email.is_empty() {
        return Err("Email is required".to_string());
    }
    if data.password.is_empty() {
        return Err("Password is required".to_string());
    }
    Ok(())
}

pub fn validate_update(data: &UserUpdate) -> Result<(), String> {
    if data.is_empty() {
        return Err("At least one field must be provided".to_string());
    }
    if let Some(first_name) = &data.first_name {
        validate_name("First name", first_name)?;
    }
    if let Some(last_name) = &data.last_name {
        validate_name("Last name", last_name)?;
    }
    if let Some(phone) = &data.phone {
        validate_phone(phone)?;
    }
    Ok(())
}
