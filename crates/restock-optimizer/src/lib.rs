//! Price/availability optimizer
//!
//! Ranks live retailer quotes into fulfillment options. The ranking is a
//! weighted score over price, delivery ETA against the household's preferred
//! window, retailer priority position, availability confidence, request
//! coverage, and a consolidation bonus when one retailer carrying the whole
//! bundle beats the cheapest cross-retailer split.
//!
//! The optimizer is pure: identical quotes and preferences produce an
//! identical ranking on every call. All scoring happens in integer
//! milli-points derived from cents and whole days, so there is no hidden
//! float nondeterminism, and ties break on price, then ETA, then retailer
//! priority rank, then retailer id.
//!
//! Cap enforcement deliberately does not happen here: an option over the
//! per-order cap is still ranked and returned, flagged `exceeds_cap`. The
//! scheduler and budget ledger own that decision.

#![allow(missing_docs)]

pub mod option;
pub mod rank;
pub mod weights;

pub use crate::option::FulfillmentOption;
pub use rank::optimize;
pub use weights::WeightProfile;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
