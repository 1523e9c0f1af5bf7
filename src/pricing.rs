//! Cart and order pricing.
//!
//! All amounts are integer minor units of the store currency.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::DiscountType,
};

/// Largest unit price or discount amount accepted on a product.
pub const MAX_PRICE: i64 = 1_000_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discount {
    pub kind: DiscountType,
    pub value: i64,
}

impl Discount {
    /// Build a discount from the stored product columns; a zero or negative
    /// value means no discount.
    pub fn from_parts(kind: Option<DiscountType>, value: i64) -> Option<Self> {
        match kind {
            Some(kind) if value > 0 => Some(Self { kind, value }),
            _ => None,
        }
    }
}

/// Unit price after applying `discount`, never below zero.
pub fn discounted_price(price: i64, discount: Option<Discount>) -> i64 {
    let Some(discount) = discount else {
        return price.max(0);
    };
    let reduced = match discount.kind {
        DiscountType::Percentage => {
            let pct = discount.value.clamp(0, 100) as i128;
            let price = price as i128;
            // Never above the original price, so it fits back into i64.
            (price - price * pct / 100) as i64
        }
        DiscountType::Fixed => price.saturating_sub(discount.value),
    };
    reduced.max(0)
}

fn out_of_range() -> AppError {
    AppError::BadRequest("Order total out of range".into())
}

/// `unit_price * quantity`, rejected when it does not fit.
pub fn line_total(unit_price: i64, quantity: i32) -> AppResult<i64> {
    unit_price
        .checked_mul(quantity as i64)
        .ok_or_else(out_of_range)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PricingPolicy {
    pub shipping_fee: i64,
    /// Orders strictly above this subtotal ship for free.
    pub free_shipping_threshold: i64,
    pub tax_rate_bps: i32,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            shipping_fee: 1_000,
            free_shipping_threshold: 30_000,
            tax_rate_bps: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct OrderTotals {
    pub item_count: i64,
    pub subtotal: i64,
    pub shipping: i64,
    pub tax: i64,
    pub total: i64,
}

impl PricingPolicy {
    pub fn shipping_for(&self, subtotal: i64, item_count: i64) -> i64 {
        if item_count == 0 || subtotal > self.free_shipping_threshold {
            0
        } else {
            self.shipping_fee
        }
    }

    /// Tax on `subtotal`, rounded half up.
    pub fn tax_for(&self, subtotal: i64) -> i64 {
        let scaled = subtotal as i128 * self.tax_rate_bps as i128;
        ((scaled + 5_000) / 10_000).clamp(0, i64::MAX as i128) as i64
    }

    /// Totals for `(unit_price, quantity)` lines.
    pub fn totals<I>(&self, lines: I) -> AppResult<OrderTotals>
    where
        I: IntoIterator<Item = (i64, i32)>,
    {
        let mut subtotal = 0_i64;
        let mut item_count = 0_i64;
        for (price, quantity) in lines {
            subtotal = subtotal
                .checked_add(line_total(price, quantity)?)
                .ok_or_else(out_of_range)?;
            item_count += quantity as i64;
        }
        let shipping = self.shipping_for(subtotal, item_count);
        let tax = self.tax_for(subtotal);
        let total = subtotal
            .checked_add(shipping)
            .and_then(|sum| sum.checked_add(tax))
            .ok_or_else(out_of_range)?;
        Ok(OrderTotals {
            item_count,
            subtotal,
            shipping,
            tax,
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pct(value: i64) -> Option<Discount> {
        Some(Discount {
            kind: DiscountType::Percentage,
            value,
        })
    }

    fn fixed(value: i64) -> Option<Discount> {
        Some(Discount {
            kind: DiscountType::Fixed,
            value,
        })
    }

    #[test]
    fn percentage_discount_reduces_price() {
        assert_eq!(discounted_price(10_000, pct(25)), 7_500);
        assert_eq!(discounted_price(999, pct(10)), 900);
    }

    #[test]
    fn fixed_discount_subtracts_amount() {
        assert_eq!(discounted_price(10_000, fixed(1_500)), 8_500);
    }

    #[test]
    fn discounted_price_never_negative() {
        assert_eq!(discounted_price(1_000, fixed(5_000)), 0);
        assert_eq!(discounted_price(1_000, pct(250)), 0);
        assert_eq!(discounted_price(1_000, pct(-20)), 1_000);
    }

    #[test]
    fn zero_discount_is_ignored() {
        assert_eq!(Discount::from_parts(Some(DiscountType::Fixed), 0), None);
        assert_eq!(Discount::from_parts(None, 40), None);
        assert_eq!(discounted_price(4_200, None), 4_200);
    }

    #[test]
    fn subtotal_is_sum_of_price_times_quantity() {
        let policy = PricingPolicy::default();
        let lines = vec![(1_250, 2), (399, 3), (10_000, 1)];
        let totals = policy.totals(lines.clone()).unwrap();
        let expected: i64 = lines.iter().map(|(p, q)| p * *q as i64).sum();
        assert_eq!(totals.subtotal, expected);
        assert_eq!(totals.item_count, 6);
    }

    #[test]
    fn free_shipping_only_above_threshold() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.totals([(30_000, 1)]).unwrap().shipping, policy.shipping_fee);
        assert_eq!(policy.totals([(30_001, 1)]).unwrap().shipping, 0);
        assert_eq!(policy.totals([(100, 1)]).unwrap().shipping, policy.shipping_fee);
    }

    #[test]
    fn empty_cart_has_no_charges() {
        let totals = PricingPolicy::default().totals(std::iter::empty()).unwrap();
        assert_eq!(totals, OrderTotals::default());
    }

    #[test]
    fn tax_rounds_half_up_and_adds_to_total() {
        let policy = PricingPolicy {
            shipping_fee: 500,
            free_shipping_threshold: 30_000,
            tax_rate_bps: 825,
        };
        let totals = policy.totals([(1_000, 1)]).unwrap();
        // 1000 * 8.25% = 82.5
        assert_eq!(totals.tax, 83);
        assert_eq!(totals.total, 1_000 + 500 + 83);
    }

    #[test]
    fn discount_at_max_price_does_not_overflow() {
        assert_eq!(discounted_price(MAX_PRICE, pct(50)), MAX_PRICE / 2);
        assert_eq!(discounted_price(i64::MAX, pct(50)), i64::MAX - i64::MAX / 2);
        assert_eq!(discounted_price(1_000, fixed(i64::MAX)), 0);
    }

    #[test]
    fn oversized_totals_are_rejected() {
        let policy = PricingPolicy::default();
        assert!(matches!(
            policy.totals([(i64::MAX / 2, 3)]),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(line_total(i64::MAX, 2), Err(AppError::BadRequest(_))));

        let totals = policy.totals([(MAX_PRICE, 10_000)]).unwrap();
        assert_eq!(totals.subtotal, MAX_PRICE * 10_000);
        assert_eq!(totals.shipping, 0);
    }
}
