//! Order store with idempotency index
//!
//! The book is the engine-side half of duplicate prevention: placing a
//! second order with an idempotency key already seen returns the existing
//! order instead of creating another. (The retailer-side half is the key
//! forwarded with every submission.)

use crate::order::{IdempotencyKey, Order};
use crate::state::OrderState;
use crate::OrderError;
use dashmap::DashMap;
use restock_model::{HouseholdId, OrderId};

/// Concurrent order store
#[derive(Debug, Default)]
pub struct OrderBook {
    orders: DashMap<OrderId, Order>,
    by_key: DashMap<IdempotencyKey, OrderId>,
}

impl OrderBook {
    /// Create an empty book
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an order, deduplicating on its idempotency key
    ///
    /// Returns the id actually in the book: the new order's, or the
    /// existing order's when the key was already present. An abandoned
    /// order releases its key slot, so a later placement for the same
    /// cycle can try again; the retailer-side key stays the same, keeping
    /// both halves of duplicate prevention intact.
    pub fn insert(&self, order: Order) -> OrderId {
        match self.by_key.entry(order.idempotency_key.clone()) {
            dashmap::mapref::entry::Entry::Occupied(mut existing) => {
                let existing_id = *existing.get();
                let abandoned = self
                    .orders
                    .get(&existing_id)
                    .is_some_and(|o| o.state == OrderState::Abandoned);
                if abandoned {
                    let order_id = order.order_id;
                    existing.insert(order_id);
                    self.orders.insert(order_id, order);
                    return order_id;
                }
                tracing::debug!(
                    key = %order.idempotency_key,
                    existing = %existing_id,
                    "duplicate order suppressed by idempotency key"
                );
                existing_id
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let order_id = order.order_id;
                slot.insert(order_id);
                self.orders.insert(order_id, order);
                order_id
            }
        }
    }

    /// Snapshot of an order
    #[must_use]
    pub fn get(&self, order_id: OrderId) -> Option<Order> {
        self.orders.get(&order_id).map(|o| o.clone())
    }

    /// Mutate an order in place
    ///
    /// # Errors
    /// `OrderError::UnknownOrder` if no order has the id, or whatever the
    /// closure returns.
    pub fn with_order<T>(
        &self,
        order_id: OrderId,
        f: impl FnOnce(&mut Order) -> Result<T, OrderError>,
    ) -> Result<T, OrderError> {
        let mut entry = self
            .orders
            .get_mut(&order_id)
            .ok_or(OrderError::UnknownOrder(order_id))?;
        f(entry.value_mut())
    }

    /// All orders for a household
    #[must_use]
    pub fn orders_for(&self, household_id: HouseholdId) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|e| e.value().household_id == household_id)
            .map(|e| e.value().clone())
            .collect();
        orders.sort_by_key(|o| o.order_id);
        orders
    }

    /// Number of orders in the book
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Whether the book is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restock_model::{CycleId, ItemBundle, ItemId, Money, RetailerId};
    use std::str::FromStr;

    fn make_order(household: HouseholdId, cycle: CycleId) -> Order {
        let bundle = ItemBundle::single(ItemId::from_str("wipes").unwrap(), 1);
        let key = IdempotencyKey::derive(household, &bundle, cycle);
        Order::new(
            household,
            bundle,
            RetailerId::from_str("quickmart").unwrap(),
            Money::from_cents(500),
            key,
        )
    }

    #[test]
    fn same_key_returns_existing_order() {
        let book = OrderBook::new();
        let household = HouseholdId::new();
        let cycle = CycleId::new();

        let first = book.insert(make_order(household, cycle));
        let second = book.insert(make_order(household, cycle));
        assert_eq!(first, second);
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn different_cycles_create_distinct_orders() {
        let book = OrderBook::new();
        let household = HouseholdId::new();

        let first = book.insert(make_order(household, CycleId::new()));
        let second = book.insert(make_order(household, CycleId::new()));
        assert_ne!(first, second);
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn abandoned_order_releases_its_key_slot() {
        let book = OrderBook::new();
        let household = HouseholdId::new();
        let cycle = CycleId::new();

        let first = book.insert(make_order(household, cycle));
        book.with_order(first, |o| {
            o.state = OrderState::Abandoned;
            Ok(())
        })
        .unwrap();

        let second = book.insert(make_order(household, cycle));
        assert_ne!(first, second);
        assert_eq!(book.get(second).unwrap().state, OrderState::Created);
    }

    #[test]
    fn with_order_surfaces_unknown_ids() {
        let book = OrderBook::new();
        let err = book
            .with_order(OrderId::new(), |_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, OrderError::UnknownOrder(_)));
    }
}
