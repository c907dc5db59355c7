//! Engine tunables
//!
//! Every threshold the decision flow consults lives here with a documented
//! default. Defaults are starting points, not requirements; deployments
//! adjust them per household population.

use restock_forecast::ForecastConfig;
use restock_gateway::PoolConfig;
use restock_order::RetryPolicy;

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Minimum forecast confidence for auto-approval eligibility
    ///
    /// Forecasts below this still produce recommendations; they route to
    /// manual approval instead of placing orders.
    pub actionable_confidence: f64,
    /// Days of predicted consumption one reorder should cover
    pub restock_cover_days: u32,
    /// Forecast model tunables
    pub forecast: ForecastConfig,
    /// Gateway pool timeouts and breaker thresholds
    pub pool: PoolConfig,
    /// Order submission retry policy
    pub retry: RetryPolicy,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With actionable-confidence threshold
    #[inline]
    #[must_use]
    pub fn with_actionable_confidence(mut self, threshold: f64) -> Self {
        self.actionable_confidence = threshold.clamp(0.0, 1.0);
        self
    }

    /// With reorder coverage in days
    #[inline]
    #[must_use]
    pub fn with_restock_cover_days(mut self, days: u32) -> Self {
        self.restock_cover_days = days.max(1);
        self
    }

    /// With forecast tunables
    #[inline]
    #[must_use]
    pub fn with_forecast(mut self, forecast: ForecastConfig) -> Self {
        self.forecast = forecast;
        self
    }

    /// With pool tunables
    #[inline]
    #[must_use]
    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// With submission retry policy
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            actionable_confidence: 0.5,
            restock_cover_days: 14,
            forecast: ForecastConfig::default(),
            pool: PoolConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}
