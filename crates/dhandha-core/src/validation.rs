//! # Validation Module
//!
//! Business rule validation, applied by the ledger services before any
//! mutation touches the store.

use crate::error::{ValidationError, ValidationResult};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// String Validators
// =============================================================================

/// Validates an entity name (product, customer, vendor).
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a phone number used as a messaging handle.
///
/// ## Rules
/// - Must not be empty
/// - 7 to 15 digits, optional leading `+`
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    let digits = phone.strip_prefix('+').unwrap_or(phone);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain only digits (optional leading +)".to_string(),
        });
    }

    if !(7..=15).contains(&digits.len()) {
        return Err(ValidationError::OutOfRange {
            field: "phone".to_string(),
            min: 7,
            max: 15,
        });
    }

    Ok(())
}

/// Validates a UUID string.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart quantity.
///
/// ## Rules
/// - Must be positive (>= 1)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in paise. Zero is allowed (free items).
pub fn validate_price_paise(paise: i64) -> ValidationResult<()> {
    if paise < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates an amount that must be strictly positive: due amounts,
/// vendor bills, expenses, stock receipts.
pub fn validate_amount_paise(paise: i64) -> ValidationResult<()> {
    if paise <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    Ok(())
}

/// Validates a line discount against its line subtotal.
///
/// A discount may be zero, but can never exceed the subtotal it discounts.
pub fn validate_discount(discount_paise: i64, subtotal_paise: i64) -> ValidationResult<()> {
    if discount_paise < 0 {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: subtotal_paise,
        });
    }

    if discount_paise > subtotal_paise {
        return Err(ValidationError::DiscountExceedsSubtotal {
            discount_paise,
            subtotal_paise,
        });
    }

    Ok(())
}

/// Validates a GST rate in basis points (0% to 100%).
pub fn validate_gst_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "gst".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates cart size (number of unique lines).
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Toor Dal 1kg").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("+919876543210").is_ok());
        assert!(validate_phone("").is_err());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("98765abc10").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_price_and_amount() {
        assert!(validate_price_paise(0).is_ok());
        assert!(validate_price_paise(14500).is_ok());
        assert!(validate_price_paise(-1).is_err());

        assert!(validate_amount_paise(1).is_ok());
        assert!(validate_amount_paise(0).is_err());
        assert!(validate_amount_paise(-100).is_err());
    }

    #[test]
    fn test_validate_discount() {
        assert!(validate_discount(0, 1000).is_ok());
        assert!(validate_discount(1000, 1000).is_ok());
        assert!(validate_discount(1001, 1000).is_err());
        assert!(validate_discount(-1, 1000).is_err());
    }

    #[test]
    fn test_validate_gst_bps() {
        assert!(validate_gst_bps(0).is_ok());
        assert!(validate_gst_bps(1800).is_ok());
        assert!(validate_gst_bps(10001).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
