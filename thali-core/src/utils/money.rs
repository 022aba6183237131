//! Money calculation utilities using rust_decimal for precision
//!
//! All calculations are done using `Decimal` internally, then converted to `f64`
//! for storage/serialization.

use rust_decimal::prelude::*;
use shared::error::{AppError, AppResult, ErrorCode};

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum allowed price per item
pub const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per line
pub const MAX_QUANTITY: i32 = 9999;
/// Maximum tax percentage
pub const MAX_TAX_PERCENTAGE: f64 = 100.0;

/// Validate that a f64 value is finite (not NaN, not Infinity)
#[inline]
fn require_finite(value: f64, field_name: &str) -> AppResult<()> {
    if !value.is_finite() {
        return Err(AppError::with_message(
            ErrorCode::ProductInvalidPrice,
            format!("{} must be a finite number, got {}", field_name, value),
        ));
    }
    Ok(())
}

/// Price must be finite, non-negative and within bounds
pub fn validate_price(price: f64, field_name: &str) -> AppResult<()> {
    require_finite(price, field_name)?;
    if price < 0.0 {
        return Err(AppError::with_message(
            ErrorCode::ProductInvalidPrice,
            format!("{} must be non-negative, got {}", field_name, price),
        ));
    }
    if price > MAX_PRICE {
        return Err(AppError::with_message(
            ErrorCode::ProductInvalidPrice,
            format!(
                "{} exceeds maximum allowed ({}), got {}",
                field_name, MAX_PRICE, price
            ),
        ));
    }
    Ok(())
}

/// Quantity must be positive and within bounds
pub fn validate_quantity(quantity: i32) -> AppResult<()> {
    if quantity <= 0 {
        return Err(AppError::with_message(
            ErrorCode::InvalidQuantity,
            format!("quantity must be positive, got {}", quantity),
        ));
    }
    if quantity > MAX_QUANTITY {
        return Err(AppError::with_message(
            ErrorCode::InvalidQuantity,
            format!(
                "quantity exceeds maximum allowed ({}), got {}",
                MAX_QUANTITY, quantity
            ),
        ));
    }
    Ok(())
}

pub fn validate_tax_percentage(pct: f64) -> AppResult<()> {
    if !pct.is_finite() || !(0.0..=MAX_TAX_PERCENTAGE).contains(&pct) {
        return Err(AppError::with_message(
            ErrorCode::InvalidTaxRate,
            format!("tax percentage must be within 0..=100, got {}", pct),
        ));
    }
    Ok(())
}

/// Convert f64 to Decimal for calculations
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// price × quantity
pub fn line_total(price: f64, quantity: i32) -> Decimal {
    to_decimal(price) * Decimal::from(quantity)
}

/// `amount × pct / 100`
pub fn percentage_of(amount: Decimal, pct: f64) -> Decimal {
    amount * to_decimal(pct) / Decimal::ONE_HUNDRED
}

/// Compare two monetary values within tolerance
pub fn money_eq(a: f64, b: f64) -> bool {
    (to_decimal(a) - to_decimal(b)).abs() < MONEY_TOLERANCE
}
