//! Retailer quotes and order confirmations

use chrono::NaiveDate;
use restock_model::{ItemBundle, ItemId, Money, RetailerId};
use serde::{Deserialize, Serialize};

/// One priced line within a quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub item_id: ItemId,
    pub quantity: u32,
    /// Price for the full line quantity
    pub price: Money,
}

impl QuoteLine {
    /// Create a new line
    #[inline]
    #[must_use]
    pub fn new(item_id: ItemId, quantity: u32, price: Money) -> Self {
        Self {
            item_id,
            quantity,
            price,
        }
    }
}

/// Price, availability, and delivery estimate from one retailer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetailerQuote {
    pub retailer_id: RetailerId,
    /// The lines this retailer can fulfill; may be a subset of the request
    pub lines: Vec<QuoteLine>,
    /// Discount applied when the lines ship together from this retailer
    pub bundle_discount: Money,
    /// Estimated days to delivery
    pub eta_days: u32,
    /// Retailer-reported stock confidence, in `[0, 1]`
    pub availability_confidence: f64,
}

impl RetailerQuote {
    /// Quote with no bundle discount
    #[must_use]
    pub fn new(
        retailer_id: RetailerId,
        lines: Vec<QuoteLine>,
        eta_days: u32,
        availability_confidence: f64,
    ) -> Self {
        Self {
            retailer_id,
            lines,
            bundle_discount: Money::ZERO,
            eta_days,
            availability_confidence,
        }
    }

    /// With a bundle discount
    #[inline]
    #[must_use]
    pub fn with_bundle_discount(mut self, discount: Money) -> Self {
        self.bundle_discount = discount;
        self
    }

    /// Total price: line sum minus any bundle discount, floored at zero
    #[must_use]
    pub fn total_price(&self) -> Money {
        let lines: Money = self.lines.iter().map(|l| l.price).sum();
        lines.saturating_sub(self.bundle_discount)
    }

    /// Price for one item's line, if quoted
    #[must_use]
    pub fn price_for(&self, item_id: &ItemId) -> Option<Money> {
        self.lines
            .iter()
            .find(|l| &l.item_id == item_id)
            .map(|l| l.price)
    }

    /// The items this quote covers, as a bundle
    #[must_use]
    pub fn covered_bundle(&self) -> ItemBundle {
        ItemBundle::new(
            self.lines
                .iter()
                .map(|l| restock_model::BundleLine::new(l.item_id.clone(), l.quantity)),
        )
    }

    /// Whether the quote covers every item in `requested`
    #[must_use]
    pub fn covers(&self, requested: &ItemBundle) -> bool {
        requested
            .item_ids()
            .all(|item| self.lines.iter().any(|l| &l.item_id == item))
    }

    /// Estimated delivery date relative to `as_of`
    #[inline]
    #[must_use]
    pub fn delivery_date(&self, as_of: NaiveDate) -> NaiveDate {
        as_of + chrono::Duration::days(i64::from(self.eta_days))
    }
}

/// Confirmation returned by a retailer on successful submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub retailer_id: RetailerId,
    /// Retailer-side order reference
    pub retailer_ref: String,
    /// Days to delivery promised at submission
    pub promised_eta_days: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn item(s: &str) -> ItemId {
        ItemId::from_str(s).unwrap()
    }

    #[test]
    fn total_price_applies_bundle_discount() {
        let quote = RetailerQuote::new(
            RetailerId::from_str("bulkbarn").unwrap(),
            vec![
                QuoteLine::new(item("wipes"), 2, Money::from_cents(800)),
                QuoteLine::new(item("diapers-size4"), 1, Money::from_cents(1900)),
            ],
            3,
            0.9,
        )
        .with_bundle_discount(Money::from_cents(300));

        assert_eq!(quote.total_price(), Money::from_cents(2400));
    }

    #[test]
    fn covers_checks_items_not_quantities() {
        let quote = RetailerQuote::new(
            RetailerId::from_str("quickmart").unwrap(),
            vec![QuoteLine::new(item("wipes"), 1, Money::from_cents(400))],
            2,
            0.9,
        );
        let wanted = ItemBundle::single(item("wipes"), 5);
        let bigger = ItemBundle::new([
            restock_model::BundleLine::new(item("wipes"), 1),
            restock_model::BundleLine::new(item("diapers-size4"), 1),
        ]);
        assert!(quote.covers(&wanted));
        assert!(!quote.covers(&bigger));
    }
}
