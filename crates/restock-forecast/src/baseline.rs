//! Default forecasting model
//!
//! Decomposes the usage series into three parts, combined additively on the
//! log-rate so the predicted rate can never go negative:
//! - a baseline rate from recency-weighted daily consumption (exponential
//!   decay),
//! - a trend adjustment from a linear-regression slope over a rolling window
//!   (e.g. child growth pushing diaper usage up),
//! - a contextual multiplier from the household's tags (illness spikes,
//!   winter uplift, weekend variance).
//!
//! Confidence starts from sample adequacy and is penalized for residual
//! variance, untrusted sources, and recent manual observations that
//! contradict the fitted rate.

use crate::forecast::{ConsumptionForecast, ForecastConfig, ForecastModel};
use chrono::{Datelike, NaiveDate, Utc, Weekday};
use restock_model::{HouseholdId, ItemId, Season, SourceConfidence, UsageDataPoint};
use std::collections::BTreeMap;

const MODEL_VERSION: &str = "baseline-trend/1";
const EPS: f64 = 1e-9;

/// Recency-weighted baseline + trend + context model
#[derive(Debug, Clone, Default)]
pub struct BaselineTrendModel {
    config: ForecastConfig,
}

impl BaselineTrendModel {
    /// Create with the given configuration
    #[inline]
    #[must_use]
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    /// Model configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    fn empty_forecast(
        &self,
        household_id: HouseholdId,
        item_id: &ItemId,
        as_of: NaiveDate,
        confidence: f64,
        data_quality_issue: bool,
    ) -> ConsumptionForecast {
        ConsumptionForecast {
            item_id: item_id.clone(),
            household_id,
            generated_at: Utc::now(),
            daily_rate: 0.0,
            weekly_rate: 0.0,
            predicted_depletion_date: as_of + chrono::Duration::days(self.config.max_horizon_days),
            confidence,
            model_version: MODEL_VERSION.to_string(),
            data_quality_issue,
        }
    }
}

impl ForecastModel for BaselineTrendModel {
    fn forecast(
        &self,
        household_id: HouseholdId,
        item_id: &ItemId,
        history: &[UsageDataPoint],
        on_hand: f64,
        as_of: NaiveDate,
    ) -> ConsumptionForecast {
        if history.is_empty() {
            return self.empty_forecast(household_id, item_id, as_of, 0.0, false);
        }
        if history
            .iter()
            .any(|p| !p.quantity.is_finite() || p.quantity < 0.0)
        {
            tracing::warn!(%item_id, "inconsistent usage history, forecast degraded");
            return self.empty_forecast(household_id, item_id, as_of, 0.0, true);
        }

        let series = DailySeries::build(history);
        let baseline = series.weighted_baseline(self.config.decay_halflife_days);
        if baseline <= EPS {
            // Observed usage is zero; nothing to project.
            return self.empty_forecast(household_id, item_id, as_of, 0.0, false);
        }

        let slope = series.trend_slope(self.config.trend_window_days);
        let trend_term = (slope * self.config.trend_lead_days / baseline).clamp(-0.5, 0.5);
        let multiplier = self.context_multiplier(history, as_of);

        let daily_rate = (baseline.ln() + trend_term + multiplier.ln()).exp();

        let depletion_days = if on_hand <= 0.0 {
            0
        } else {
            ((on_hand / daily_rate).ceil() as i64).clamp(0, self.config.max_horizon_days)
        };

        let confidence = self.score_confidence(history, &series, daily_rate);

        ConsumptionForecast {
            item_id: item_id.clone(),
            household_id,
            generated_at: Utc::now(),
            daily_rate,
            weekly_rate: daily_rate * 7.0,
            predicted_depletion_date: as_of + chrono::Duration::days(depletion_days),
            confidence,
            model_version: MODEL_VERSION.to_string(),
            data_quality_issue: false,
        }
    }

    fn version(&self) -> &str {
        MODEL_VERSION
    }
}

impl BaselineTrendModel {
    fn context_multiplier(&self, history: &[UsageDataPoint], as_of: NaiveDate) -> f64 {
        let mut multiplier = 1.0;
        // Tags on the most recent observation describe the current context.
        if let Some(latest) = history.last() {
            if latest.tags.illness {
                multiplier *= self.config.illness_multiplier;
            }
            if latest.tags.season == Season::Winter {
                multiplier *= self.config.winter_multiplier;
            }
        }
        if matches!(as_of.weekday(), Weekday::Sat | Weekday::Sun) {
            multiplier *= self.config.weekend_multiplier;
        }
        multiplier
    }

    fn score_confidence(
        &self,
        history: &[UsageDataPoint],
        series: &DailySeries,
        fitted_rate: f64,
    ) -> f64 {
        let n = history.len();
        let span_days = series.span_days();

        let adequacy = (n as f64 / (n as f64 + 2.0))
            * ((span_days as f64 / (self.config.min_span_days as f64 * 2.0)).min(1.0));

        let residual_factor = 1.0 / (1.0 + series.coefficient_of_variation());

        let source_avg = history
            .iter()
            .map(|p| p.source.weight())
            .sum::<f64>()
            / n as f64;

        // Recent manual observations that disagree sharply with the fitted
        // rate suggest the model is behind reality.
        let recent_cutoff = series.last_day() - chrono::Duration::days(7);
        let contradicted = history.iter().any(|p| {
            p.source == SourceConfidence::Manual
                && p.recorded_at.date_naive() >= recent_cutoff
                && (p.quantity - fitted_rate).abs() > fitted_rate.max(EPS) * 0.5
        });
        let manual_penalty = if contradicted { 0.8 } else { 1.0 };

        let mut confidence = (adequacy * residual_factor * source_avg * manual_penalty)
            .clamp(0.0, 1.0);

        if n < self.config.min_samples || span_days < self.config.min_span_days {
            confidence = confidence.min(self.config.low_sample_cap);
        }
        confidence
    }
}

/// Daily-bucketed consumption series over the observed span
struct DailySeries {
    first_day: NaiveDate,
    last_day: NaiveDate,
    /// Consumption per day, including zero-filled gaps, oldest first
    daily: Vec<f64>,
}

impl DailySeries {
    fn build(history: &[UsageDataPoint]) -> Self {
        let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for point in history {
            *buckets.entry(point.recorded_at.date_naive()).or_insert(0.0) += point.quantity;
        }
        // BTreeMap is non-empty here: callers check history first.
        let first_day = *buckets.keys().next().unwrap_or(&NaiveDate::MIN);
        let last_day = *buckets.keys().next_back().unwrap_or(&NaiveDate::MIN);

        let mut daily = Vec::new();
        let mut day = first_day;
        while day <= last_day {
            daily.push(buckets.get(&day).copied().unwrap_or(0.0));
            day += chrono::Duration::days(1);
        }
        Self {
            first_day,
            last_day,
            daily,
        }
    }

    fn span_days(&self) -> i64 {
        (self.last_day - self.first_day).num_days()
    }

    fn last_day(&self) -> NaiveDate {
        self.last_day
    }

    /// Exponential-decay weighted mean of daily consumption, newest heaviest
    fn weighted_baseline(&self, halflife_days: f64) -> f64 {
        let n = self.daily.len();
        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;
        for (idx, value) in self.daily.iter().enumerate() {
            let age = (n - 1 - idx) as f64;
            let weight = 0.5_f64.powf(age / halflife_days.max(EPS));
            weighted_sum += weight * value;
            weight_total += weight;
        }
        if weight_total <= EPS {
            0.0
        } else {
            weighted_sum / weight_total
        }
    }

    /// Least-squares slope of daily consumption over the trailing window
    fn trend_slope(&self, window_days: i64) -> f64 {
        let window = (window_days.max(2) as usize).min(self.daily.len());
        let tail = &self.daily[self.daily.len() - window..];
        if tail.len() < 2 {
            return 0.0;
        }
        let n = tail.len() as f64;
        let mean_x = (n - 1.0) / 2.0;
        let mean_y = tail.iter().sum::<f64>() / n;
        let mut num = 0.0;
        let mut den = 0.0;
        for (i, y) in tail.iter().enumerate() {
            let dx = i as f64 - mean_x;
            num += dx * (y - mean_y);
            den += dx * dx;
        }
        if den <= EPS {
            0.0
        } else {
            num / den
        }
    }

    /// Standard deviation over mean of the daily buckets
    fn coefficient_of_variation(&self) -> f64 {
        let n = self.daily.len() as f64;
        let mean = self.daily.iter().sum::<f64>() / n;
        if mean <= EPS {
            return 0.0;
        }
        let var = self
            .daily
            .iter()
            .map(|y| (y - mean) * (y - mean))
            .sum::<f64>()
            / n;
        var.sqrt() / mean
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use restock_model::ContextTags;
    use std::str::FromStr;

    fn item() -> ItemId {
        ItemId::from_str("diapers-size4").unwrap()
    }

    fn as_of() -> NaiveDate {
        // A Thursday, so the weekend multiplier stays out of the way.
        NaiveDate::from_ymd_opt(2026, 8, 20).unwrap()
    }

    fn daily_history(
        household: HouseholdId,
        days: i64,
        per_day: f64,
        source: SourceConfidence,
        tags: ContextTags,
    ) -> Vec<UsageDataPoint> {
        let end = Utc.with_ymd_and_hms(2026, 8, 19, 12, 0, 0).unwrap();
        (0..days)
            .rev()
            .map(|ago| {
                UsageDataPoint::new(
                    end - Duration::days(ago),
                    item(),
                    household,
                    per_day,
                    source,
                    tags,
                )
            })
            .collect()
    }

    #[test]
    fn steady_usage_predicts_linear_depletion() {
        let model = BaselineTrendModel::default();
        let household = HouseholdId::new();
        let history = daily_history(
            household,
            14,
            8.0,
            SourceConfidence::Manual,
            ContextTags::default(),
        );

        let forecast = model.forecast(household, &item(), &history, 40.0, as_of());
        assert!((forecast.daily_rate - 8.0).abs() < 0.5);
        assert_eq!(
            forecast.predicted_depletion_date,
            as_of() + Duration::days(5)
        );
        assert!(forecast.confidence >= 0.5, "confidence {}", forecast.confidence);
        assert!(!forecast.data_quality_issue);
    }

    #[test]
    fn rising_usage_raises_the_rate() {
        let model = BaselineTrendModel::default();
        let household = HouseholdId::new();
        let end = Utc.with_ymd_and_hms(2026, 8, 19, 12, 0, 0).unwrap();
        // 4/day climbing to ~9/day over two weeks.
        let history: Vec<UsageDataPoint> = (0..14)
            .map(|day| {
                UsageDataPoint::new(
                    end - Duration::days(13 - day),
                    item(),
                    household,
                    4.0 + day as f64 * 0.4,
                    SourceConfidence::Manual,
                    ContextTags::default(),
                )
            })
            .collect();

        let flat = daily_history(
            household,
            14,
            6.0,
            SourceConfidence::Manual,
            ContextTags::default(),
        );

        let rising = model.forecast(household, &item(), &history, 60.0, as_of());
        let steady = model.forecast(household, &item(), &flat, 60.0, as_of());
        assert!(rising.daily_rate > steady.daily_rate);
    }

    #[test]
    fn illness_tag_raises_the_rate() {
        let model = BaselineTrendModel::default();
        let household = HouseholdId::new();
        let sick = ContextTags {
            illness: true,
            ..ContextTags::default()
        };
        let healthy_history = daily_history(
            household,
            14,
            4.0,
            SourceConfidence::Manual,
            ContextTags::default(),
        );
        let sick_history = daily_history(household, 14, 4.0, SourceConfidence::Manual, sick);

        let healthy = model.forecast(household, &item(), &healthy_history, 40.0, as_of());
        let ill = model.forecast(household, &item(), &sick_history, 40.0, as_of());
        assert!(ill.daily_rate > healthy.daily_rate);
    }

    #[test]
    fn short_history_caps_confidence() {
        let model = BaselineTrendModel::default();
        let household = HouseholdId::new();
        let history = daily_history(
            household,
            2,
            8.0,
            SourceConfidence::Manual,
            ContextTags::default(),
        );

        let forecast = model.forecast(household, &item(), &history, 40.0, as_of());
        assert!(forecast.confidence <= model.config().low_sample_cap);
        assert!(!forecast.is_actionable(0.5));
    }

    #[test]
    fn negative_quantity_zeroes_confidence() {
        let model = BaselineTrendModel::default();
        let household = HouseholdId::new();
        let mut history = daily_history(
            household,
            10,
            8.0,
            SourceConfidence::Manual,
            ContextTags::default(),
        );
        history[4].quantity = -3.0;

        let forecast = model.forecast(household, &item(), &history, 40.0, as_of());
        assert_eq!(forecast.confidence, 0.0);
        assert!(forecast.data_quality_issue);
        assert!(!forecast.is_actionable(0.0));
    }

    #[test]
    fn empty_history_is_not_actionable() {
        let model = BaselineTrendModel::default();
        let household = HouseholdId::new();
        let forecast = model.forecast(household, &item(), &[], 40.0, as_of());
        assert_eq!(forecast.confidence, 0.0);
        assert!(!forecast.data_quality_issue);
        assert_eq!(forecast.daily_rate, 0.0);
    }

    #[test]
    fn estimated_sources_lower_confidence() {
        let model = BaselineTrendModel::default();
        let household = HouseholdId::new();
        let manual = daily_history(
            household,
            14,
            8.0,
            SourceConfidence::Manual,
            ContextTags::default(),
        );
        let estimated = daily_history(
            household,
            14,
            8.0,
            SourceConfidence::Estimated,
            ContextTags::default(),
        );

        let m = model.forecast(household, &item(), &manual, 40.0, as_of());
        let e = model.forecast(household, &item(), &estimated, 40.0, as_of());
        assert!(m.confidence > e.confidence);
    }

    #[test]
    fn zero_on_hand_depletes_today() {
        let model = BaselineTrendModel::default();
        let household = HouseholdId::new();
        let history = daily_history(
            household,
            14,
            8.0,
            SourceConfidence::Manual,
            ContextTags::default(),
        );
        let forecast = model.forecast(household, &item(), &history, 0.0, as_of());
        assert_eq!(forecast.predicted_depletion_date, as_of());
    }
}
