//! Order requests as submitted by checkout clients.

use std::collections::BTreeMap;
use std::str::FromStr;

use common::{Money, NewOrderItem, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::CheckoutError;

/// Largest quantity a single line may request.
pub const MAX_LINE_QUANTITY: i64 = i32::MAX as i64;

/// One requested line: product, quantity and the unit price the client saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRequest {
    pub product_id: ProductId,
    /// Signed so that non-positive values reach validation instead of
    /// failing deserialization.
    pub quantity: i64,
    pub price: Money,
}

impl LineRequest {
    pub fn new(product_id: ProductId, quantity: i64, price: Money) -> Self {
        Self {
            product_id,
            quantity,
            price,
        }
    }
}

/// A complete order request: lines plus the total computed by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub total: Money,
    pub items: Vec<LineRequest>,
}

impl PlaceOrder {
    pub fn new(total: Money, items: Vec<LineRequest>) -> Self {
        Self { total, items }
    }

    /// Sum of quantity * price over all lines.
    ///
    /// Lines with a non-positive quantity contribute nothing. Returns `None`
    /// when the sum does not fit a decimal.
    pub fn lines_total(&self) -> Option<Money> {
        self.items
            .iter()
            .filter_map(|line| {
                u32::try_from(line.quantity)
                    .ok()
                    .map(|q| line.price.checked_multiply(q))
            })
            .try_fold(Money::zero(), |acc, amount| acc.checked_add(amount?))
    }

    /// Checks the request shape before any transaction is opened.
    pub fn validate(&self, policy: TotalPolicy) -> Result<ValidatedOrder, CheckoutError> {
        if self.items.is_empty() {
            return Err(CheckoutError::Validation(
                "order must contain at least one item".to_string(),
            ));
        }

        if self.total.is_negative() {
            return Err(CheckoutError::Validation(format!(
                "total {} must not be negative",
                self.total
            )));
        }
        if self.total.exceeds_storage() {
            return Err(CheckoutError::Validation(format!(
                "total {} exceeds the largest storable amount {}",
                self.total,
                Money::max_stored()
            )));
        }

        let mut items = Vec::with_capacity(self.items.len());
        let mut demand: BTreeMap<ProductId, u32> = BTreeMap::new();

        for line in &self.items {
            if line.quantity <= 0 || line.quantity > MAX_LINE_QUANTITY {
                return Err(CheckoutError::Validation(format!(
                    "quantity {} for product {} must be between 1 and {MAX_LINE_QUANTITY}",
                    line.quantity, line.product_id
                )));
            }
            if line.price.is_negative() {
                return Err(CheckoutError::Validation(format!(
                    "price {} for product {} must not be negative",
                    line.price, line.product_id
                )));
            }
            if line.price.exceeds_storage() {
                return Err(CheckoutError::Validation(format!(
                    "price {} for product {} exceeds the largest storable amount {}",
                    line.price,
                    line.product_id,
                    Money::max_stored()
                )));
            }

            let quantity = line.quantity as u32;
            let entry = demand.entry(line.product_id).or_insert(0);
            *entry = entry
                .checked_add(quantity)
                .filter(|q| i64::from(*q) <= MAX_LINE_QUANTITY)
                .ok_or_else(|| {
                    CheckoutError::Validation(format!(
                        "combined quantity for product {} is too large",
                        line.product_id
                    ))
                })?;

            items.push(NewOrderItem {
                product_id: line.product_id,
                quantity,
                price: line.price,
            });
        }

        let lines_total = self.lines_total().ok_or_else(|| {
            CheckoutError::Validation("line items sum is too large".to_string())
        })?;
        if self.total.rounded() != lines_total.rounded() {
            match policy {
                TotalPolicy::Verify => {
                    return Err(CheckoutError::Validation(format!(
                        "total {} does not match line items sum {}",
                        self.total, lines_total
                    )));
                }
                TotalPolicy::Trust => {
                    tracing::warn!(
                        submitted = %self.total,
                        computed = %lines_total,
                        "order total does not match line items, keeping submitted total"
                    );
                }
            }
        }

        Ok(ValidatedOrder {
            total: self.total,
            items,
            demand,
        })
    }
}

/// An order request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOrder {
    total: Money,
    items: Vec<NewOrderItem>,
    demand: BTreeMap<ProductId, u32>,
}

impl ValidatedOrder {
    pub fn total(&self) -> Money {
        self.total
    }

    /// Lines in submission order.
    pub fn items(&self) -> &[NewOrderItem] {
        &self.items
    }

    /// Requested units per product, in ascending product id order.
    ///
    /// Locking rows in this order keeps concurrent checkouts over
    /// overlapping products from deadlocking each other.
    pub fn demand(&self) -> impl Iterator<Item = (ProductId, u32)> + '_ {
        self.demand.iter().map(|(id, q)| (*id, *q))
    }
}

/// How the server treats the client-supplied order total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TotalPolicy {
    /// Persist the submitted total as-is and log mismatches.
    #[default]
    Trust,
    /// Reject orders whose total differs from the sum of their lines.
    Verify,
}

impl FromStr for TotalPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trust" => Ok(TotalPolicy::Trust),
            "verify" => Ok(TotalPolicy::Verify),
            other => Err(format!("unknown total policy '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: i64, quantity: i64, cents: i64) -> LineRequest {
        LineRequest::new(ProductId::new(id), quantity, Money::from_cents(cents))
    }

    #[test]
    fn empty_order_is_rejected() {
        let request = PlaceOrder::new(Money::zero(), vec![]);
        let err = request.validate(TotalPolicy::Trust).unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));
    }

    #[test]
    fn non_positive_quantities_are_rejected() {
        for quantity in [0, -3] {
            let request = PlaceOrder::new(Money::zero(), vec![line(1, quantity, 1000)]);
            let err = request.validate(TotalPolicy::Trust).unwrap_err();
            assert!(matches!(err, CheckoutError::Validation(_)));
        }
    }

    #[test]
    fn oversized_quantity_is_rejected() {
        let request = PlaceOrder::new(Money::zero(), vec![line(1, MAX_LINE_QUANTITY + 1, 1)]);
        assert!(request.validate(TotalPolicy::Trust).is_err());
    }

    #[test]
    fn negative_price_is_rejected() {
        let request = PlaceOrder::new(Money::zero(), vec![line(1, 1, -100)]);
        assert!(request.validate(TotalPolicy::Trust).is_err());
    }

    #[test]
    fn overflowing_line_total_is_rejected() {
        let request: PlaceOrder = serde_json::from_str(
            r#"{"total": 1, "items": [{"productId": 1, "quantity": 2, "price": "79228162514264337593543950335"}]}"#,
        )
        .unwrap();

        assert_eq!(request.lines_total(), None);
        for policy in [TotalPolicy::Trust, TotalPolicy::Verify] {
            let err = request.validate(policy).unwrap_err();
            assert!(matches!(err, CheckoutError::Validation(_)));
        }
    }

    #[test]
    fn overflowing_sum_across_lines_is_rejected() {
        let huge: Money = serde_json::from_str("\"79228162514264337593543950335\"").unwrap();
        let request = PlaceOrder::new(
            Money::zero(),
            vec![
                LineRequest::new(ProductId::new(1), 1, huge),
                LineRequest::new(ProductId::new(2), 1, huge),
            ],
        );

        assert_eq!(request.lines_total(), None);
        assert!(matches!(
            request.validate(TotalPolicy::Trust),
            Err(CheckoutError::Validation(_))
        ));
    }

    #[test]
    fn amounts_above_storage_range_are_rejected() {
        let too_large = common::money::MAX_STORED_CENTS + 1;

        let big_total = PlaceOrder::new(Money::from_cents(too_large), vec![line(1, 1, 100)]);
        let err = big_total.validate(TotalPolicy::Trust).unwrap_err();
        assert!(err.to_string().contains("largest storable amount"));

        let big_price = PlaceOrder::new(Money::from_cents(100), vec![line(1, 1, too_large)]);
        let err = big_price.validate(TotalPolicy::Trust).unwrap_err();
        assert!(err.to_string().contains("largest storable amount"));

        let at_limit = common::money::MAX_STORED_CENTS;
        let largest = PlaceOrder::new(Money::from_cents(at_limit), vec![line(1, 1, at_limit)]);
        assert!(largest.validate(TotalPolicy::Verify).is_ok());
    }

    #[test]
    fn duplicate_lines_sum_their_demand() {
        let request = PlaceOrder::new(
            Money::from_cents(3500),
            vec![line(2, 1, 1000), line(1, 1, 500), line(2, 2, 1000)],
        );
        let order = request.validate(TotalPolicy::Verify).unwrap();

        let demand: Vec<_> = order.demand().collect();
        assert_eq!(demand, vec![(ProductId::new(1), 1), (ProductId::new(2), 3)]);
        // Lines keep submission order
        assert_eq!(order.items().len(), 3);
        assert_eq!(order.items()[0].product_id, ProductId::new(2));
    }

    #[test]
    fn mismatched_total_is_kept_when_trusted() {
        let request = PlaceOrder::new(Money::from_cents(999), vec![line(1, 2, 1000)]);
        let order = request.validate(TotalPolicy::Trust).unwrap();
        assert_eq!(order.total(), Money::from_cents(999));
    }

    #[test]
    fn mismatched_total_is_rejected_when_verified() {
        let request = PlaceOrder::new(Money::from_cents(999), vec![line(1, 2, 1000)]);
        let err = request.validate(TotalPolicy::Verify).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn request_uses_camel_case_wire_format() {
        let request: PlaceOrder = serde_json::from_str(
            r#"{"total": 25, "items": [{"productId": 1, "quantity": 2, "price": 10.0}, {"productId": 2, "quantity": 1, "price": 5}]}"#,
        )
        .unwrap();

        assert_eq!(request.items[0].product_id, ProductId::new(1));
        assert_eq!(request.lines_total(), Some(Money::from_cents(2500)));
        assert_eq!(request.total, Money::from_cents(2500));
    }

    #[test]
    fn total_policy_parses_case_insensitively() {
        assert_eq!("Verify".parse::<TotalPolicy>(), Ok(TotalPolicy::Verify));
        assert_eq!("trust".parse::<TotalPolicy>(), Ok(TotalPolicy::Trust));
        assert!("maybe".parse::<TotalPolicy>().is_err());
    }
}
