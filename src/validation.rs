use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ApiError;

pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 100;
pub const PASSWORD_MIN: usize = 6;
pub const AGE_MAX: i32 = 150;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn invalid(msg: impl Into<String>) -> ApiError {
    ApiError::Validation(format!("Invalid request data: {}", msg.into()))
}

pub fn name(name: &str) -> Result<(), ApiError> {
    let len = name.chars().count();
    if !(NAME_MIN..=NAME_MAX).contains(&len) {
        return Err(invalid(format!(
            "name must be between {NAME_MIN} and {NAME_MAX} characters"
        )));
    }
    Ok(())
}

pub fn email(email: &str) -> Result<(), ApiError> {
    if !is_valid_email(email) {
        return Err(invalid("email is not a valid address"));
    }
    Ok(())
}

pub fn new_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < PASSWORD_MIN {
        return Err(invalid(format!(
            "password must be at least {PASSWORD_MIN} characters"
        )));
    }
    Ok(())
}

/// Login only requires something to check against.
pub fn login_password(password: &str) -> Result<(), ApiError> {
    if password.is_empty() {
        return Err(invalid("password is required"));
    }
    Ok(())
}

pub fn age(age: Option<i32>) -> Result<(), ApiError> {
    match age {
        Some(a) if !(0..=AGE_MAX).contains(&a) => {
            Err(invalid(format!("age must be between 0 and {AGE_MAX}")))
        }
        _ => Ok(()),
    }
}
