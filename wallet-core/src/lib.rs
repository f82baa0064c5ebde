//! Wallet Core - Entity Types
//!
//! Pure data structures shared by every wallet crate: identifiers, pool and
//! ledger entities, status enums, the error taxonomy and domain config.
//! No I/O lives here.

mod config;
mod entities;
mod enums;
mod error;
mod identity;

pub use config::*;
pub use entities::*;
pub use enums::*;
pub use error::*;
pub use identity::*;

/// Normalize a UPI handle for storage and uniqueness checks.
pub fn normalize_handle(handle: &str) -> Result<String, ValidationError> {
    let trimmed = handle.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: "handle".to_string(),
        });
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidValue {
            field: "handle".to_string(),
            reason: "handle must not contain whitespace".to_string(),
        });
    }
    match trimmed.split_once('@') {
        Some((name, provider)) if !name.is_empty() && !provider.is_empty() => {}
        _ => {
            return Err(ValidationError::InvalidValue {
                field: "handle".to_string(),
                reason: "expected a UPI address of the form name@provider".to_string(),
            })
        }
    }
    Ok(trimmed.to_string())
}

/// Format paise as a rupee string, e.g. `12345` -> `"123.45"`.
pub fn format_rupees(amount: Amount) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

// =============================================================================
// TESTS
// =============================================================================
