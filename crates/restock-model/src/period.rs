//! Budget period keys
//!
//! Monthly budget caps are tracked per `PeriodKey` (calendar month, UTC).

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// A calendar month, the granularity of budget caps
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    pub year: i32,
    pub month: u32,
}

impl PeriodKey {
    /// Period containing the given date
    #[inline]
    #[must_use]
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The following period
    #[must_use]
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl Display for PeriodKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Error parsing a period key from `YYYY-MM`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid period key: {0:?}")]
pub struct PeriodKeyParseError(String);

impl FromStr for PeriodKey {
    type Err = PeriodKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (y, m) = s
            .split_once('-')
            .ok_or_else(|| PeriodKeyParseError(s.to_string()))?;
        let year = y
            .parse::<i32>()
            .map_err(|_| PeriodKeyParseError(s.to_string()))?;
        let month = m
            .parse::<u32>()
            .map_err(|_| PeriodKeyParseError(s.to_string()))?;
        if !(1..=12).contains(&month) {
            return Err(PeriodKeyParseError(s.to_string()));
        }
        Ok(Self { year, month })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_round_trip() {
        let key = PeriodKey {
            year: 2026,
            month: 8,
        };
        assert_eq!(key.to_string(), "2026-08");
        assert_eq!("2026-08".parse::<PeriodKey>().unwrap(), key);
    }

    #[test]
    fn next_wraps_year() {
        let dec = PeriodKey {
            year: 2026,
            month: 12,
        };
        assert_eq!(
            dec.next(),
            PeriodKey {
                year: 2027,
                month: 1
            }
        );
    }

    #[test]
    fn rejects_month_out_of_range() {
        assert!("2026-13".parse::<PeriodKey>().is_err());
        assert!("2026".parse::<PeriodKey>().is_err());
    }
}
