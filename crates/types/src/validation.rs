//! Validation helpers for request bodies that `validator::Validate` derives
//! can't express directly.

/// Valid queue-join / booking currency codes this core accepts. Currency
/// conversion and pricing logic belong to the upstream event/show owner;
/// the core only checks the code is well-formed.
pub const VALID_CURRENCIES: &[&str] = &["USD", "EUR", "GBP", "VND"];

pub fn validate_currency(value: &str) -> Result<(), String> {
    if VALID_CURRENCIES.contains(&value) {
        Ok(())
    } else {
        Err(format!(
            "Invalid currency. Must be one of: {}",
            VALID_CURRENCIES.join(", ")
        ))
    }
}

/// A quantity of zero is rejected by the inventory engine with
/// `INVALID_QUANTITY` (spec.md §4.1 step 1); validate it at the API edge too
/// so the fast path doesn't need to round-trip to the store for this case.
pub fn validate_quantity(quantity: i32) -> Result<(), String> {
    if quantity > 0 {
        Ok(())
    } else {
        Err("quantity must be greater than 0".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_currency() {
        assert!(validate_currency("USD").is_ok());
        assert!(validate_currency("usd").is_err());
        assert!(validate_currency("XYZ").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
    }
}
