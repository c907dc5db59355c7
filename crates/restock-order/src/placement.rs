//! Order submission with bounded retry
//!
//! Submission failures walk the `SubmissionFailed → Retrying → Submitted`
//! branch with exponential backoff until an attempt succeeds or the policy
//! is exhausted, at which point the order is abandoned and the caller
//! releases any held budget reservation.

use crate::book::OrderBook;
use crate::state::OrderState;
use crate::OrderError;
use restock_gateway::{GatewayError, GatewayPool, OrderConfirmation};
use restock_model::OrderId;
use std::sync::Arc;
use std::time::Duration;

/// Exponential backoff policy for retailer submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the second attempt
    pub base: Duration,
    /// Ceiling on any single delay
    pub cap: Duration,
    /// Total attempts, including the first
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Create default policy (2s base, 60s cap, 3 attempts)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With base delay
    #[inline]
    #[must_use]
    pub fn with_base(mut self, base: Duration) -> Self {
        self.base = base;
        self
    }

    /// With maximum attempts
    #[inline]
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Delay after the given (1-based) failed attempt
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let delay = self.base.saturating_mul(1_u32 << exp);
        delay.min(self.cap)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(2),
            cap: Duration::from_secs(60),
            max_attempts: 3,
        }
    }
}

/// Drives an order through submission
pub struct OrderPlacer {
    book: Arc<OrderBook>,
    policy: RetryPolicy,
}

impl OrderPlacer {
    /// Create a placer over a book
    #[must_use]
    pub fn new(book: Arc<OrderBook>, policy: RetryPolicy) -> Self {
        Self { book, policy }
    }

    /// The book this placer works against
    #[must_use]
    pub fn book(&self) -> &Arc<OrderBook> {
        &self.book
    }

    /// Submit the order, retrying with backoff
    ///
    /// Already-confirmed orders (a retried decision cycle) return their
    /// stored confirmation without touching the retailer again.
    ///
    /// # Errors
    /// - `OrderError::UnknownOrder` for ids not in the book
    /// - `OrderError::SubmissionFailed` once the policy is exhausted; the
    ///   order is `Abandoned` and the caller must release its reservation
    pub async fn place(
        &self,
        pool: &GatewayPool,
        order_id: OrderId,
    ) -> Result<OrderConfirmation, OrderError> {
        let (retailer_id, bundle, key, existing) = {
            let order = self
                .book
                .get(order_id)
                .ok_or(OrderError::UnknownOrder(order_id))?;
            (
                order.retailer_id.clone(),
                order.bundle.clone(),
                order.idempotency_key.clone(),
                order.confirmation.clone(),
            )
        };
        if let Some(confirmation) = existing {
            tracing::debug!(order = %order_id, "order already confirmed, skipping submission");
            return Ok(confirmation);
        }

        let mut last_error = GatewayError::NoRetailerAvailable;
        for attempt in 1..=self.policy.max_attempts {
            self.book.with_order(order_id, |order| {
                order.transition(OrderState::Submitted)?;
                order.attempts = attempt;
                Ok(())
            })?;

            match pool.submit(&retailer_id, &bundle, key.as_str()).await {
                Ok(confirmation) => {
                    self.book.with_order(order_id, |order| {
                        order.transition(OrderState::Confirmed)?;
                        order.confirmation = Some(confirmation.clone());
                        Ok(())
                    })?;
                    tracing::info!(
                        order = %order_id,
                        retailer = %retailer_id,
                        attempt,
                        "order confirmed"
                    );
                    return Ok(confirmation);
                }
                Err(err) => {
                    tracing::warn!(
                        order = %order_id,
                        retailer = %retailer_id,
                        attempt,
                        error = %err,
                        "order submission failed"
                    );
                    last_error = err;
                    self.book.with_order(order_id, |order| {
                        order.transition(OrderState::SubmissionFailed)
                    })?;

                    if attempt < self.policy.max_attempts {
                        self.book
                            .with_order(order_id, |order| order.transition(OrderState::Retrying))?;
                        tokio::time::sleep(self.policy.delay_after(attempt)).await;
                    }
                }
            }
        }

        self.book
            .with_order(order_id, |order| order.transition(OrderState::Abandoned))?;
        Err(OrderError::SubmissionFailed {
            attempts: self.policy.max_attempts,
            last: last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{IdempotencyKey, Order};
    use async_trait::async_trait;
    use restock_gateway::{PoolConfig, QuoteLine, RetailerGateway, RetailerQuote};
    use restock_model::{
        CycleId, HouseholdId, HouseholdLocation, ItemBundle, ItemId, Money, RetailerId,
    };
    use std::collections::HashSet;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Gateway that fails the first `failures` submissions, then accepts,
    /// recording every idempotency key it sees.
    struct FlakyGateway {
        id: RetailerId,
        failures: AtomicU32,
        seen_keys: Mutex<HashSet<String>>,
        accepted: AtomicU32,
    }

    impl FlakyGateway {
        fn new(failures: u32) -> Self {
            Self {
                id: RetailerId::from_str("quickmart").unwrap(),
                failures: AtomicU32::new(failures),
                seen_keys: Mutex::new(HashSet::new()),
                accepted: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl RetailerGateway for FlakyGateway {
        fn retailer_id(&self) -> RetailerId {
            self.id.clone()
        }

        async fn quote(
            &self,
            bundle: &ItemBundle,
            _location: &HouseholdLocation,
        ) -> Result<RetailerQuote, GatewayError> {
            let lines = bundle
                .lines()
                .iter()
                .map(|l| QuoteLine::new(l.item_id.clone(), l.quantity, Money::from_cents(500)))
                .collect();
            Ok(RetailerQuote::new(self.id.clone(), lines, 2, 0.95))
        }

        async fn submit_order(
            &self,
            _bundle: &ItemBundle,
            idempotency_key: &str,
        ) -> Result<OrderConfirmation, GatewayError> {
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(GatewayError::Unavailable {
                    retailer: self.id.clone(),
                    reason: "order api 503".to_string(),
                });
            }
            let novel = self
                .seen_keys
                .lock()
                .unwrap()
                .insert(idempotency_key.to_string());
            if novel {
                self.accepted.fetch_add(1, Ordering::SeqCst);
            }
            Ok(OrderConfirmation {
                retailer_id: self.id.clone(),
                retailer_ref: format!("ref-{idempotency_key}"),
                promised_eta_days: 2,
            })
        }
    }

    fn setup(gateway: Arc<FlakyGateway>) -> (OrderPlacer, GatewayPool, OrderId) {
        let book = Arc::new(OrderBook::new());
        let household = HouseholdId::new();
        let bundle = ItemBundle::single(ItemId::from_str("wipes").unwrap(), 1);
        let key = IdempotencyKey::derive(household, &bundle, CycleId::new());
        let order = Order::new(
            household,
            bundle,
            RetailerId::from_str("quickmart").unwrap(),
            Money::from_cents(500),
            key,
        );
        let order_id = book.insert(order);
        let placer = OrderPlacer::new(book, RetryPolicy::default());
        let pool = GatewayPool::new(vec![gateway], PoolConfig::default());
        (placer, pool, order_id)
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after(2), Duration::from_secs(4));
        assert_eq!(policy.delay_after(3), Duration::from_secs(8));
        assert_eq!(policy.delay_after(10), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_retries_then_confirms() {
        let gateway = Arc::new(FlakyGateway::new(1));
        let (placer, pool, order_id) = setup(Arc::clone(&gateway));

        let confirmation = placer.place(&pool, order_id).await.unwrap();
        assert!(confirmation.retailer_ref.starts_with("ref-"));

        let order = placer.book().get(order_id).unwrap();
        assert_eq!(order.state, OrderState::Confirmed);
        assert_eq!(order.attempts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_abandon_the_order() {
        let gateway = Arc::new(FlakyGateway::new(10));
        let (placer, pool, order_id) = setup(Arc::clone(&gateway));

        let err = placer.place(&pool, order_id).await.unwrap_err();
        assert!(matches!(
            err,
            OrderError::SubmissionFailed { attempts: 3, .. }
        ));
        let order = placer.book().get(order_id).unwrap();
        assert_eq!(order.state, OrderState::Abandoned);
    }

    #[tokio::test(start_paused = true)]
    async fn replaying_a_confirmed_order_does_not_resubmit() {
        let gateway = Arc::new(FlakyGateway::new(0));
        let (placer, pool, order_id) = setup(Arc::clone(&gateway));

        let first = placer.place(&pool, order_id).await.unwrap();
        let second = placer.place(&pool, order_id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(gateway.accepted.load(Ordering::SeqCst), 1);
    }
}
