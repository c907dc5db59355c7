//! Identifier newtypes
//!
//! Generated identifiers use ULIDs for sortability; externally supplied
//! identifiers (items, retailers) are validated lowercase-kebab strings.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use ulid::Ulid;

/// Error parsing an externally supplied identifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    /// Identifier was empty
    #[error("identifier is empty")]
    Empty,

    /// Identifier contained a character outside `[a-z0-9-]`
    #[error("invalid character {ch:?} in identifier {raw:?}")]
    InvalidCharacter { raw: String, ch: char },
}

macro_rules! ulid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub Ulid);

        impl $name {
            /// Generate a new identifier
            #[inline]
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

ulid_id! {
    /// Unique household identifier (the account-level unit)
    HouseholdId
}

ulid_id! {
    /// Unique order identifier
    OrderId
}

ulid_id! {
    /// Unique recommendation identifier (pending-approval handle)
    RecommendationId
}

ulid_id! {
    /// Unique decision-cycle identifier
    ///
    /// One cycle per household/item per cadence period; feeds the order
    /// idempotency key so a retried cycle cannot place a duplicate order.
    CycleId
}

macro_rules! slug_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Get the identifier as a string slice
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s.is_empty() {
                    return Err(IdParseError::Empty);
                }
                if let Some(ch) = s
                    .chars()
                    .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
                {
                    return Err(IdParseError::InvalidCharacter {
                        raw: s.to_string(),
                        ch,
                    });
                }
                Ok(Self(s.to_string()))
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

slug_id! {
    /// Item identifier, e.g. `diapers-size4`
    ItemId
}

slug_id! {
    /// Retailer identifier, e.g. `quickmart`
    RetailerId
}

/// Delivery location passed through to retailer adapters
///
/// Opaque to the engine; retailers interpret it however their API needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseholdLocation {
    pub region: String,
    pub postal_code: String,
}

impl HouseholdLocation {
    /// Create a new location
    #[inline]
    #[must_use]
    pub fn new(region: impl Into<String>, postal_code: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            postal_code: postal_code.into(),
        }
    }
}
