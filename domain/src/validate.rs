//! Input validation for items entering the store. Keep logic minimal and deterministic.

use rust_decimal::Decimal;

use crate::{CatalogError, NewItem};

/// Validate a new or replacement item.
///
/// Rejects an empty name, a negative base price, and negative add-on
/// prices. Size modifiers may be negative (e.g. a cheaper small size).
pub fn validate_new_item(item: &NewItem) -> Result<(), CatalogError> {
    if item.name.trim().is_empty() {
        return Err(CatalogError::Invalid("name must not be empty".into()));
    }
    validate_price("basePrice", item.base_price)?;
    for customization in &item.customizations {
        for option in &customization.options {
            validate_price(&format!("option '{}' price", option.name), option.price)?;
        }
    }
    Ok(())
}

fn validate_price(field: &str, price: Decimal) -> Result<(), CatalogError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(CatalogError::Invalid(format!("{field} must not be negative")));
    }
    Ok(())
}
