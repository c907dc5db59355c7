//! Concurrent retailer fan-out
//!
//! One query fans out to every configured retailer whose breaker admits it,
//! with an independent timeout per call. Failures are recorded against the
//! retailer's breaker and absorbed; optimization proceeds with whatever
//! subset responded.

use crate::breaker::CircuitBreaker;
use crate::error::GatewayError;
use crate::quote::{OrderConfirmation, QuoteLine, RetailerQuote};
use crate::RetailerGateway;
use dashmap::DashMap;
use restock_model::{HouseholdLocation, ItemBundle, RetailerId};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Pool tunables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Independent timeout per retailer call
    pub per_retailer_timeout: Duration,
    /// Deadline for the fan-out as a whole; per-call timeouts are clamped
    /// to it, so the join can never outlast the cycle budget
    pub overall_deadline: Duration,
    /// Consecutive faults before a retailer's breaker opens
    pub breaker_failure_threshold: u32,
    /// How long an open breaker skips its retailer
    pub breaker_cooldown: Duration,
}

impl PoolConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With per-retailer timeout
    #[inline]
    #[must_use]
    pub fn with_per_retailer_timeout(mut self, timeout: Duration) -> Self {
        self.per_retailer_timeout = timeout;
        self
    }

    /// With breaker failure threshold
    #[inline]
    #[must_use]
    pub fn with_breaker_threshold(mut self, threshold: u32) -> Self {
        self.breaker_failure_threshold = threshold;
        self
    }

    /// With breaker cooldown
    #[inline]
    #[must_use]
    pub fn with_breaker_cooldown(mut self, cooldown: Duration) -> Self {
        self.breaker_cooldown = cooldown;
        self
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            per_retailer_timeout: Duration::from_secs(4),
            overall_deadline: Duration::from_secs(15),
            breaker_failure_threshold: 5,
            breaker_cooldown: Duration::from_secs(60),
        }
    }
}

/// Uniform interface over all configured retailers
pub struct GatewayPool {
    gateways: Vec<Arc<dyn RetailerGateway>>,
    breakers: DashMap<RetailerId, Arc<CircuitBreaker>>,
    config: PoolConfig,
}

impl GatewayPool {
    /// Create a pool over the given gateways
    #[must_use]
    pub fn new(gateways: Vec<Arc<dyn RetailerGateway>>, config: PoolConfig) -> Self {
        Self {
            gateways,
            breakers: DashMap::new(),
            config,
        }
    }

    /// Configured retailer ids
    #[must_use]
    pub fn retailer_ids(&self) -> Vec<RetailerId> {
        self.gateways.iter().map(|g| g.retailer_id()).collect()
    }

    /// Breaker for a retailer, created on first use
    fn breaker(&self, retailer: &RetailerId) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(retailer.clone())
            .or_insert_with(|| {
                Arc::new(CircuitBreaker::new(
                    self.config.breaker_failure_threshold,
                    self.config.breaker_cooldown,
                ))
            })
            .clone()
    }

    /// Query every available retailer concurrently
    ///
    /// # Errors
    /// `GatewayError::NoRetailerAvailable` if zero retailers produced a
    /// quote; breaker-skipped, timed out, and errored retailers all count
    /// as absent, not as failures of the query.
    pub async fn query(
        &self,
        bundle: &ItemBundle,
        location: &HouseholdLocation,
    ) -> Result<Vec<RetailerQuote>, GatewayError> {
        let call_timeout = self
            .config
            .per_retailer_timeout
            .min(self.config.overall_deadline);

        let mut calls = Vec::new();
        for gateway in &self.gateways {
            let retailer = gateway.retailer_id();
            let breaker = self.breaker(&retailer);
            if !breaker.try_acquire() {
                tracing::debug!(%retailer, "skipping retailer, circuit open");
                continue;
            }
            let gateway = Arc::clone(gateway);
            calls.push(async move {
                let outcome = match timeout(call_timeout, gateway.quote(bundle, location)).await {
                    Ok(result) => result,
                    Err(_) => Err(GatewayError::Timeout {
                        retailer: retailer.clone(),
                    }),
                };
                (retailer, breaker, outcome)
            });
        }

        let mut quotes = Vec::new();
        for (retailer, breaker, outcome) in futures::future::join_all(calls).await {
            match outcome {
                Ok(quote) => {
                    breaker.record_success();
                    quotes.push(quote);
                }
                Err(err) => {
                    if err.is_integration_fault() {
                        breaker.record_failure();
                    } else {
                        breaker.record_success();
                    }
                    tracing::warn!(%retailer, error = %err, "retailer absent from quote round");
                }
            }
        }

        if quotes.is_empty() {
            return Err(GatewayError::NoRetailerAvailable);
        }
        // Stable order for downstream determinism.
        quotes.sort_by(|a, b| a.retailer_id.cmp(&b.retailer_id));
        Ok(quotes)
    }

    /// Submit an order to one retailer, breaker-guarded
    ///
    /// # Errors
    /// - `UnknownRetailer` if no gateway is configured for the id
    /// - `CircuitOpen` if the retailer's breaker denies the call
    /// - `Timeout` / provider errors from the submission itself
    pub async fn submit(
        &self,
        retailer_id: &RetailerId,
        bundle: &ItemBundle,
        idempotency_key: &str,
    ) -> Result<OrderConfirmation, GatewayError> {
        let gateway = self
            .gateways
            .iter()
            .find(|g| &g.retailer_id() == retailer_id)
            .ok_or_else(|| GatewayError::UnknownRetailer(retailer_id.clone()))?;

        let breaker = self.breaker(retailer_id);
        if !breaker.try_acquire() {
            return Err(GatewayError::CircuitOpen {
                retailer: retailer_id.clone(),
            });
        }

        let outcome = match timeout(
            self.config.per_retailer_timeout,
            gateway.submit_order(bundle, idempotency_key),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout {
                retailer: retailer_id.clone(),
            }),
        };

        match &outcome {
            Ok(_) => breaker.record_success(),
            Err(err) if err.is_integration_fault() => breaker.record_failure(),
            Err(_) => breaker.record_success(),
        }
        outcome
    }
}
