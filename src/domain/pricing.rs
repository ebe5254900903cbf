//! Price arithmetic shared by listings and product presentation.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// The price a shopper actually pays.
///
/// A discount only applies when it is non-negative and strictly below the list
/// price; any other value is ignored.
pub fn effective_price(price: Decimal, discount_price: Option<Decimal>) -> Decimal {
    match discount_price {
        Some(discount) if discount >= Decimal::ZERO && discount < price => discount,
        _ => price,
    }
}

/// True when a discount strictly below the price is set. A negative
/// discount counts as no discount.
pub fn has_discount(price: Decimal, discount_price: Option<Decimal>) -> bool {
    price > Decimal::ZERO && effective_price(price, discount_price) != price
}

/// Whole-number discount percentage, rounding halves away from zero.
pub fn discount_percent(price: Decimal, discount_price: Option<Decimal>) -> u32 {
    if !has_discount(price, discount_price) {
        return 0;
    }

    let saved = price - effective_price(price, discount_price);
    (saved / price * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(0)
}
