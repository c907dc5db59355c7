//! Forecast contract
//!
//! [`ForecastModel`] is the seam any model implementation must satisfy.
//! The output is always a complete [`ConsumptionForecast`]; degraded inputs
//! produce degraded confidence, never an error.

use chrono::{DateTime, NaiveDate, Utc};
use restock_model::{HouseholdId, ItemId, UsageDataPoint};
use serde::{Deserialize, Serialize};

/// A depletion prediction for one household/item
///
/// Immutable once generated; a new forecast supersedes rather than mutates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionForecast {
    pub item_id: ItemId,
    pub household_id: HouseholdId,
    pub generated_at: DateTime<Utc>,
    /// Predicted consumption per day
    pub daily_rate: f64,
    /// Predicted consumption per week (`daily_rate * 7`)
    pub weekly_rate: f64,
    /// Date at which on-hand quantity reaches zero at the predicted rate
    pub predicted_depletion_date: NaiveDate,
    /// Confidence in the prediction, in `[0, 1]`
    pub confidence: f64,
    /// Identifies the model implementation and parameterization
    pub model_version: String,
    /// Set when history was internally inconsistent; confidence is 0
    pub data_quality_issue: bool,
}

impl ConsumptionForecast {
    /// Whether this forecast may drive an automatic order
    #[inline]
    #[must_use]
    pub fn is_actionable(&self, threshold: f64) -> bool {
        !self.data_quality_issue && self.confidence >= threshold
    }

    /// Days from `as_of` until predicted depletion (negative if already past)
    #[inline]
    #[must_use]
    pub fn days_until_depletion(&self, as_of: NaiveDate) -> i64 {
        (self.predicted_depletion_date - as_of).num_days()
    }
}

/// Forecasting contract
///
/// Implementations must be deterministic for identical inputs and must never
/// panic on degenerate history; they report problems through `confidence`
/// and `data_quality_issue`.
pub trait ForecastModel: Send + Sync {
    /// Predict depletion for one household/item
    ///
    /// # Arguments
    /// * `history` - observations sorted by recording time
    /// * `on_hand` - current on-hand quantity
    /// * `as_of` - the date the prediction is made for
    fn forecast(
        &self,
        household_id: HouseholdId,
        item_id: &ItemId,
        history: &[UsageDataPoint],
        on_hand: f64,
        as_of: NaiveDate,
    ) -> ConsumptionForecast;

    /// Model identifier recorded on every forecast
    fn version(&self) -> &str;
}

/// Tunables for the default model
///
/// The suggested values from the design material are defaults, not
/// requirements; everything here is adjustable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Minimum observation count for full-confidence eligibility
    pub min_samples: usize,
    /// Minimum history span in days for full-confidence eligibility
    pub min_span_days: i64,
    /// Confidence ceiling when history is below the sample/span minimums;
    /// kept below the scheduler's actionable threshold by construction
    pub low_sample_cap: f64,
    /// Half-life in days for the recency-weighted baseline
    pub decay_halflife_days: f64,
    /// Rolling window for trend regression, in days
    pub trend_window_days: i64,
    /// How far ahead the trend slope is projected, in days
    pub trend_lead_days: f64,
    /// Rate multiplier while the household reports illness
    pub illness_multiplier: f64,
    /// Rate multiplier in winter
    pub winter_multiplier: f64,
    /// Rate multiplier when the forecast date falls on a weekend
    pub weekend_multiplier: f64,
    /// Depletion horizon clamp; a zero rate reports depletion this far out
    pub max_horizon_days: i64,
}

impl ForecastConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With minimum sample count
    #[inline]
    #[must_use]
    pub fn with_min_samples(mut self, min: usize) -> Self {
        self.min_samples = min;
        self
    }

    /// With baseline decay half-life in days
    #[inline]
    #[must_use]
    pub fn with_decay_halflife(mut self, days: f64) -> Self {
        self.decay_halflife_days = days;
        self
    }

    /// With low-sample confidence cap
    #[inline]
    #[must_use]
    pub fn with_low_sample_cap(mut self, cap: f64) -> Self {
        self.low_sample_cap = cap.clamp(0.0, 1.0);
        self
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            min_samples: 3,
            min_span_days: 7,
            low_sample_cap: 0.45,
            decay_halflife_days: 10.0,
            trend_window_days: 28,
            trend_lead_days: 7.0,
            illness_multiplier: 1.25,
            winter_multiplier: 1.10,
            weekend_multiplier: 1.05,
            max_horizon_days: 365,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn forecast_with(confidence: f64, data_quality_issue: bool) -> ConsumptionForecast {
        ConsumptionForecast {
            item_id: ItemId::from_str("wipes").unwrap(),
            household_id: HouseholdId::new(),
            generated_at: Utc.with_ymd_and_hms(2026, 8, 20, 0, 0, 0).unwrap(),
            daily_rate: 2.0,
            weekly_rate: 14.0,
            predicted_depletion_date: NaiveDate::from_ymd_opt(2026, 8, 25).unwrap(),
            confidence,
            model_version: "test/1".to_string(),
            data_quality_issue,
        }
    }

    #[test]
    fn actionable_requires_confidence_and_clean_data() {
        assert!(forecast_with(0.8, false).is_actionable(0.5));
        assert!(!forecast_with(0.4, false).is_actionable(0.5));
        assert!(!forecast_with(0.8, true).is_actionable(0.5));
    }

    #[test]
    fn days_until_depletion_can_be_negative() {
        let f = forecast_with(0.8, false);
        let late = NaiveDate::from_ymd_opt(2026, 8, 28).unwrap();
        assert_eq!(f.days_until_depletion(late), -3);
    }
}
