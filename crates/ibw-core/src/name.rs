//! Wave name rules.
//!
//! Igor restricts standard wave names to 31 bytes of ASCII letters, digits
//! and underscores, starting with a letter. Callers are expected to hand in
//! already-sanitized names; this check is the encoder-side safety net.

use crate::header::MAX_WAVE_NAME;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("wave name is empty")]
    Empty,
    #[error("wave name is {len} bytes long (maximum {MAX_WAVE_NAME})")]
    TooLong { len: usize },
    #[error("wave name must start with a letter (got {0:?})")]
    BadLeadingChar(char),
    #[error("wave name may contain only letters, digits and underscores (got {0:?})")]
    BadChar(char),
}

/// Check that `name` is a legal standard wave name.
pub fn validate_name(name: &str) -> Result<(), NameError> {
    let mut chars = name.chars();
    let first = chars.next().ok_or(NameError::Empty)?;

    if name.len() > MAX_WAVE_NAME {
        return Err(NameError::TooLong { len: name.len() });
    }
    if !first.is_ascii_alphabetic() {
        return Err(NameError::BadLeadingChar(first));
    }
    for c in chars {
        if !c.is_ascii_alphanumeric() && c != '_' {
            return Err(NameError::BadChar(c));
        }
    }
    Ok(())
}
