//! Shared domain model for the restock decision engine
//!
//! Defines the vocabulary every other crate speaks:
//! - Identifiers (households, items, retailers, orders, decision cycles)
//! - Money as integer cents
//! - Item bundles with canonical ordering
//! - Usage observations and their context tags
//! - Household reorder preferences
//! - Budget period keys

#![allow(missing_docs)]

pub mod bundle;
pub mod ids;
pub mod money;
pub mod period;
pub mod preferences;
pub mod usage;

pub use bundle::{BundleLine, ItemBundle};
pub use ids::{
    CycleId, HouseholdId, HouseholdLocation, IdParseError, ItemId, OrderId, RecommendationId,
    RetailerId,
};
pub use money::Money;
pub use period::PeriodKey;
pub use preferences::{DeliveryWindow, ReorderPreferences};
pub use usage::{AgeBucket, ContextTags, Season, SourceConfidence, UsageDataPoint};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the restock domain model
    pub use crate::{
        BundleLine, ContextTags, HouseholdId, ItemBundle, ItemId, Money, OrderId, PeriodKey,
        ReorderPreferences, RetailerId, SourceConfidence, UsageDataPoint,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
