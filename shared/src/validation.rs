//! Validation utilities for the QR Warehouse Scan Platform
//!
//! Includes Vietnam-specific checks for shipping contacts.

use rust_decimal::Decimal;

// ============================================================================
// Quantity Validations
// ============================================================================

/// Validate a counted on-hand quantity
pub fn validate_counted_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity < Decimal::ZERO {
        return Err("Counted quantity cannot be negative");
    }
    if quantity.scale() > 4 {
        return Err("Counted quantity has too many decimal places");
    }
    Ok(())
}

// ============================================================================
// Search Validations
// ============================================================================

pub const MIN_SEARCH_TERM_CHARS: usize = 2;

/// A search term needs at least two characters before it hits the database
pub fn is_searchable_term(term: &str) -> bool {
    term.trim().chars().count() >= MIN_SEARCH_TERM_CHARS
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate login name format
pub fn validate_login(login: &str) -> Result<(), &'static str> {
    let login = login.trim();
    if login.is_empty() {
        return Err("Login is required");
    }
    if login.len() > 64 {
        return Err("Login must be at most 64 characters");
    }
    if login.chars().any(char::is_whitespace) {
        return Err("Login cannot contain spaces");
    }
    Ok(())
}

// ============================================================================
// Vietnam-Specific Validations
// ============================================================================

/// Validate Vietnamese phone number format
/// Accepts: 0912345678, 091-234-5678, +84912345678, 02838123456
pub fn validate_vietnamese_phone(phone: &str) -> Result<(), &'static str> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    // Mobile: 10 digits starting with 0 (e.g., 0912345678)
    // Landline: 11 digits starting with 02 (e.g., 02838123456)
    if digits.starts_with('0') && (digits.len() == 10 || (digits.len() == 11 && digits.starts_with("02"))) {
        return Ok(());
    }
    // International format with country code 84 (e.g., 84912345678)
    if digits.starts_with("84") && (digits.len() == 11 || digits.len() == 12) {
        return Ok(());
    }

    Err("Invalid Vietnamese phone number format")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_mobile_numbers_accept_any_grouping(
            prefix in "0[35789]",
            rest in "[0-9]{8}",
            separator in prop::sample::select(vec!["", " ", "-", "."]),
        ) {
            let grouped = format!("{}{}{}{}{}", prefix, &rest[..2], separator, &rest[2..5], separator);
            let phone = format!("{}{}", grouped, &rest[5..]);
            prop_assert!(validate_vietnamese_phone(&phone).is_ok());
            let international = format!("+84{}{}", &prefix[1..], rest);
            prop_assert!(validate_vietnamese_phone(&international).is_ok());
        }

        #[test]
        fn prop_negative_counts_rejected(units in 1i64..1_000_000, scale in 0u32..4) {
            prop_assert!(validate_counted_quantity(-Decimal::new(units, scale)).is_err());
            prop_assert!(validate_counted_quantity(Decimal::new(units, scale)).is_ok());
        }
    }

    #[test]
    fn test_validate_counted_quantity() {
        assert!(validate_counted_quantity(Decimal::new(125, 2)).is_ok());
        assert!(validate_counted_quantity(Decimal::new(-5, 0)).is_err());
        assert!(validate_counted_quantity(Decimal::new(1, 6)).is_err());
    }

    #[test]
    fn test_searchable_term() {
        assert!(is_searchable_term("SO"));
        assert!(is_searchable_term("Đà"));
        assert!(!is_searchable_term(" a "));
        assert!(!is_searchable_term(""));
    }

    #[test]
    fn test_validate_login() {
        assert!(validate_login("warehouse01").is_ok());
        assert!(validate_login("  ").is_err());
        assert!(validate_login("two words").is_err());
    }

    #[test]
    fn test_vietnamese_phone_valid() {
        assert!(validate_vietnamese_phone("0912345678").is_ok());
        assert!(validate_vietnamese_phone("091-234-5678").is_ok());
        assert!(validate_vietnamese_phone("+84912345678").is_ok());
        assert!(validate_vietnamese_phone("02838123456").is_ok());
    }

    #[test]
    fn test_vietnamese_phone_invalid() {
        assert!(validate_vietnamese_phone("12345").is_err());
        assert!(validate_vietnamese_phone("1912345678").is_err());
        assert!(validate_vietnamese_phone("091234567890").is_err());
    }
}
