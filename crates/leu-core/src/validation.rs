//! # Validation Module
//!
//! Input validation for the registration form and the scanner.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend form                                                │
//! │  ├── Required markers on name/email                                    │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: RegistrationService (Rust)                                   │
//! │  └── THIS MODULE: trim, lower-case email, reject empties               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Document store                                               │
//! │  └── Accepts whatever it is given, so layer 2 must be strict           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use leu_core::validation::validate_new_customer;
//! use leu_core::NewCustomer;
//!
//! let form = NewCustomer::new("  Ana López ", "Ana@Example.COM ");
//! let clean = validate_new_customer(&form).unwrap();
//! assert_eq!(clean.name, "Ana López");
//! assert_eq!(clean.email, "ana@example.com");
//! ```

use crate::error::ValidationError;
use crate::types::NewCustomer;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 120;
const MAX_EMAIL_LEN: usize = 254;
const MAX_PHONE_LEN: usize = 30;
const MAX_SCAN_CODE_LEN: usize = 128;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a customer name and returns it trimmed.
pub fn validate_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Validates an email and returns it trimmed and lower-cased.
///
/// ## Rules
/// - Must not be empty
/// - Must have something on both sides of a single '@'
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = email.trim().to_lowercase();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    if email.len() > MAX_EMAIL_LEN {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LEN,
        });
    }

    let well_formed = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };

    if !well_formed || email.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@domain".to_string(),
        });
    }

    Ok(email)
}

/// Validates an optional phone number.
///
/// Blank input becomes `None`.
pub fn validate_phone(phone: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(phone) = phone.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(None);
    };

    if phone.len() > MAX_PHONE_LEN {
        return Err(ValidationError::TooLong {
            field: "phone".to_string(),
            max: MAX_PHONE_LEN,
        });
    }

    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain only digits, spaces, '+', '-', '(' or ')'".to_string(),
        });
    }

    Ok(Some(phone.to_string()))
}

/// Validates the whole registration form and returns a cleaned copy.
pub fn validate_new_customer(form: &NewCustomer) -> ValidationResult<NewCustomer> {
    Ok(NewCustomer {
        name: validate_name(&form.name)?,
        email: validate_email(&form.email)?,
        phone: validate_phone(form.phone.as_deref())?,
    })
}

/// Validates a decoded QR payload and returns the customer id it carries.
pub fn validate_scan_code(code: &str) -> ValidationResult<&str> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > MAX_SCAN_CODE_LEN || code.contains('/') {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "not a customer id".to_string(),
        });
    }

    Ok(code)
}

/// Validates a dashboard search query.
///
/// Can be empty (returns everyone). Returns the trimmed query.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Ana ").unwrap(), "Ana");
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"A".repeat(200)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(
            validate_email(" Ana@Example.com ").unwrap(),
            "ana@example.com"
        );
        assert!(matches!(
            validate_email(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ana@").is_err());
        assert!(validate_email("a@b@c").is_err());
        assert!(validate_email("an a@example.com").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert_eq!(validate_phone(None).unwrap(), None);
        assert_eq!(validate_phone(Some("   ")).unwrap(), None);
        assert_eq!(
            validate_phone(Some(" +52 (55) 1234-5678 ")).unwrap().as_deref(),
            Some("+52 (55) 1234-5678")
        );
        assert!(validate_phone(Some("call me")).is_err());
    }

    #[test]
    fn test_validate_new_customer() {
        let form = NewCustomer::new("Ana", "ANA@MAIL.COM").with_phone("  ");
        let clean = validate_new_customer(&form).unwrap();
        assert_eq!(clean.email, "ana@mail.com");
        assert_eq!(clean.phone, None);

        let missing_name = NewCustomer::new("", "ana@mail.com");
        assert!(validate_new_customer(&missing_name).is_err());
    }

    #[test]
    fn test_validate_scan_code() {
        assert_eq!(validate_scan_code("  abc123 \n").unwrap(), "abc123");
        assert!(validate_scan_code("").is_err());
        assert!(validate_scan_code("https://example.com/pass").is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  ana ").unwrap(), "ana");
        assert!(validate_search_query(&"x".repeat(101)).is_err());
    }
}
