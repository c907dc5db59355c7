//! Usage observations
//!
//! A `UsageDataPoint` is one observed consumption event. Points are immutable
//! once recorded; the ledger in `restock-forecast` only ever appends them.

use crate::ids::{HouseholdId, ItemId};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// How a usage observation was captured
///
/// Manual entries are the most trusted signal; estimated entries (derived
/// from purchase cadence) the least.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceConfidence {
    Manual,
    Scan,
    Estimated,
}

impl SourceConfidence {
    /// Relative trust weight used by the forecaster
    #[inline]
    #[must_use]
    pub fn weight(self) -> f64 {
        match self {
            Self::Manual => 1.0,
            Self::Scan => 0.9,
            Self::Estimated => 0.6,
        }
    }
}

/// Child age bucket, for growth-driven consumption trends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeBucket {
    Newborn,
    Infant,
    Toddler,
    Preschool,
}

/// Season at observation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    /// Season for a given timestamp (northern-hemisphere months)
    #[must_use]
    pub fn for_date(ts: DateTime<Utc>) -> Self {
        match ts.month() {
            12 | 1 | 2 => Self::Winter,
            3..=5 => Self::Spring,
            6..=8 => Self::Summer,
            _ => Self::Autumn,
        }
    }
}

/// Household context attached to an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextTags {
    /// Number of people in the household
    pub household_size: u8,
    /// Age bucket of the youngest child, if relevant to the item
    pub child_age: Option<AgeBucket>,
    /// Season at observation time
    pub season: Season,
    /// Whether the household reported illness around this observation
    pub illness: bool,
}

impl Default for ContextTags {
    fn default() -> Self {
        Self {
            household_size: 2,
            child_age: None,
            season: Season::Spring,
            illness: false,
        }
    }
}

/// One observed consumption event, immutable once recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageDataPoint {
    pub recorded_at: DateTime<Utc>,
    pub item_id: ItemId,
    pub household_id: HouseholdId,
    /// Quantity consumed since the previous observation
    pub quantity: f64,
    pub source: SourceConfidence,
    pub tags: ContextTags,
}

impl UsageDataPoint {
    /// Create a new observation
    #[must_use]
    pub fn new(
        recorded_at: DateTime<Utc>,
        item_id: ItemId,
        household_id: HouseholdId,
        quantity: f64,
        source: SourceConfidence,
        tags: ContextTags,
    ) -> Self {
        Self {
            recorded_at,
            item_id,
            household_id,
            quantity,
            source,
            tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn season_from_month() {
        let jan = Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap();
        let jul = Utc.with_ymd_and_hms(2026, 7, 15, 0, 0, 0).unwrap();
        assert_eq!(Season::for_date(jan), Season::Winter);
        assert_eq!(Season::for_date(jul), Season::Summer);
    }

    #[test]
    fn source_weights_ordered_by_trust() {
        assert!(SourceConfidence::Manual.weight() > SourceConfidence::Scan.weight());
        assert!(SourceConfidence::Scan.weight() > SourceConfidence::Estimated.weight());
    }
}
