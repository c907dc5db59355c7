//! Testing utilities for the restock workspace
//!
//! Scripted retailer gateways, usage-history builders, and preference
//! fixtures shared across integration tests.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use restock_gateway::{
    GatewayError, OrderConfirmation, QuoteLine, RetailerGateway, RetailerQuote,
};
use restock_model::{
    ContextTags, HouseholdId, HouseholdLocation, ItemBundle, ItemId, Money, ReorderPreferences,
    RetailerId, SourceConfidence, UsageDataPoint,
};
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Retailer that always quotes the same per-line price and accepts orders
pub struct StaticGateway {
    pub id: RetailerId,
    pub line_price_cents: i64,
    pub eta_days: u32,
    pub availability: f64,
}

impl StaticGateway {
    pub fn new(name: &str, line_price_cents: i64) -> Self {
        Self {
            id: RetailerId::from_str(name).unwrap(),
            line_price_cents,
            eta_days: 2,
            availability: 0.95,
        }
    }

    #[must_use]
    pub fn with_eta(mut self, eta_days: u32) -> Self {
        self.eta_days = eta_days;
        self
    }
}

#[async_trait]
impl RetailerGateway for StaticGateway {
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
            .map(|l| {
                QuoteLine::new(
                    l.item_id.clone(),
                    l.quantity,
                    Money::from_cents(self.line_price_cents),
                )
            })
            .collect();
        Ok(RetailerQuote::new(
            self.id.clone(),
            lines,
            self.eta_days,
            self.availability,
        ))
    }

    async fn submit_order(
        &self,
        _bundle: &ItemBundle,
        idempotency_key: &str,
    ) -> Result<OrderConfirmation, GatewayError> {
        Ok(OrderConfirmation {
            retailer_id: self.id.clone(),
            retailer_ref: format!("ref-{idempotency_key}"),
            promised_eta_days: self.eta_days,
        })
    }
}

/// Retailer whose every call fails as unavailable
pub struct FailingGateway {
    pub id: RetailerId,
    pub quote_calls: AtomicU32,
}

impl FailingGateway {
    pub fn new(name: &str) -> Self {
        Self {
            id: RetailerId::from_str(name).unwrap(),
            quote_calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl RetailerGateway for FailingGateway {
    fn retailer_id(&self) -> RetailerId {
        self.id.clone()
    }

    async fn quote(
        &self,
        _bundle: &ItemBundle,
        _location: &HouseholdLocation,
    ) -> Result<RetailerQuote, GatewayError> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        Err(GatewayError::Unavailable {
            retailer: self.id.clone(),
            reason: "scripted outage".to_string(),
        })
    }

    async fn submit_order(
        &self,
        _bundle: &ItemBundle,
        _idempotency_key: &str,
    ) -> Result<OrderConfirmation, GatewayError> {
        Err(GatewayError::Unavailable {
            retailer: self.id.clone(),
            reason: "scripted outage".to_string(),
        })
    }
}

/// Retailer that quotes fine but rejects the first N submissions
pub struct FlakySubmitGateway {
    inner: StaticGateway,
    failures_left: AtomicU32,
    pub submit_calls: AtomicU32,
}

impl FlakySubmitGateway {
    pub fn new(name: &str, line_price_cents: i64, failures: u32) -> Self {
        Self {
            inner: StaticGateway::new(name, line_price_cents),
            failures_left: AtomicU32::new(failures),
            submit_calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl RetailerGateway for FlakySubmitGateway {
    fn retailer_id(&self) -> RetailerId {
        self.inner.retailer_id()
    }

    async fn quote(
        &self,
        bundle: &ItemBundle,
        location: &HouseholdLocation,
    ) -> Result<RetailerQuote, GatewayError> {
        self.inner.quote(bundle, location).await
    }

    async fn submit_order(
        &self,
        bundle: &ItemBundle,
        idempotency_key: &str,
    ) -> Result<OrderConfirmation, GatewayError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(GatewayError::Unavailable {
                retailer: self.retailer_id(),
                reason: "scripted submit outage".to_string(),
            });
        }
        self.inner.submit_order(bundle, idempotency_key).await
    }
}

/// Wrap a gateway, counting calls that reach it
pub struct CountingGateway {
    inner: Arc<dyn RetailerGateway>,
    pub quote_calls: AtomicU32,
    pub submit_calls: AtomicU32,
}

impl CountingGateway {
    pub fn new(inner: Arc<dyn RetailerGateway>) -> Self {
        Self {
            inner,
            quote_calls: AtomicU32::new(0),
            submit_calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl RetailerGateway for CountingGateway {
    fn retailer_id(&self) -> RetailerId {
        self.inner.retailer_id()
    }

    async fn quote(
        &self,
        bundle: &ItemBundle,
        location: &HouseholdLocation,
    ) -> Result<RetailerQuote, GatewayError> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.quote(bundle, location).await
    }

    async fn submit_order(
        &self,
        bundle: &ItemBundle,
        idempotency_key: &str,
    ) -> Result<OrderConfirmation, GatewayError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.submit_order(bundle, idempotency_key).await
    }
}

/// One scan-sourced observation per day at `daily_rate`, ending the day
/// before `end`
pub fn steady_history(
    household_id: HouseholdId,
    item_id: &ItemId,
    daily_rate: f64,
    days: u32,
    end: DateTime<Utc>,
) -> Vec<UsageDataPoint> {
    (1..=i64::from(days))
        .map(|back| {
            UsageDataPoint::new(
                end - Duration::days(back),
                item_id.clone(),
                household_id,
                daily_rate,
                SourceConfidence::Scan,
                ContextTags::default(),
            )
        })
        .collect()
}

/// Noon UTC on a fixed date, for deterministic histories
pub fn at_noon(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

pub fn item(slug: &str) -> ItemId {
    ItemId::from_str(slug).unwrap()
}

pub fn retailer(slug: &str) -> RetailerId {
    RetailerId::from_str(slug).unwrap()
}

pub fn test_location() -> HouseholdLocation {
    HouseholdLocation::new("us-east", "02139")
}

/// Auto-approving preferences with a $100 per-order and $200 monthly cap
pub fn auto_approve_prefs(household_id: HouseholdId) -> ReorderPreferences {
    ReorderPreferences::new(household_id)
        .with_auto_approve(true)
        .with_buffer_days(3)
        .with_per_order_cap(Money::from_dollars(100))
        .with_monthly_cap(Money::from_dollars(200))
}
