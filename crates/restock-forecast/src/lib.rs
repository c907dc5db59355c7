//! Usage ledger and consumption forecasting
//!
//! Two halves:
//! - [`UsageLedger`]: append-only store of observed consumption events,
//!   the single source of history for every forecast.
//! - [`ForecastModel`]: the forecasting contract, with
//!   [`BaselineTrendModel`] as the default implementation.
//!
//! Forecasting never fails. Inconsistent or insufficient history degrades
//! the forecast's confidence instead; callers must treat confidence 0 as
//! "do not auto-act".

#![allow(missing_docs)]

pub mod baseline;
pub mod forecast;
pub mod ledger;

pub use baseline::BaselineTrendModel;
pub use forecast::{ConsumptionForecast, ForecastConfig, ForecastModel};
pub use ledger::{LedgerError, UsageLedger};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
