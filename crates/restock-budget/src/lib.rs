//! Budget ledger
//!
//! Tracks household spend against monthly caps and hands out reservations.
//! Reservation is the one place in the engine that needs a transaction: the
//! check against the cap and the increment happen under a single per-account
//! lock, never as separate read-then-write steps. Two decision cycles racing
//! for the same household and period cannot together reserve past the cap.
//!
//! `BudgetError::Exceeded` is a normal decision outcome, not a fault: the
//! scheduler turns it into a pending-manual-approval recommendation.

#![allow(missing_docs)]

use dashmap::DashMap;
use restock_model::{HouseholdId, Money, PeriodKey};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Budget decision outcomes that are not reservations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BudgetError {
    /// The reservation would push the period past its cap
    #[error("budget exceeded: requested {requested}, {available} available")]
    Exceeded {
        requested: Money,
        available: Money,
    },

    /// The account lock could not be taken after one retry
    ///
    /// Treated by callers exactly like `Exceeded`: back off to manual
    /// approval rather than risking a double reservation.
    #[error("budget account contended")]
    Contention,

    /// The token does not match a live reservation
    #[error("unknown reservation {0}")]
    UnknownReservation(Uuid),

    /// Reservation amounts must be positive
    #[error("non-positive reservation amount {0}")]
    InvalidAmount(Money),
}

/// Proof of a successful reservation
///
/// Consumed by value on commit or release, so a reservation cannot be
/// settled twice.
#[derive(Debug)]
#[must_use = "an unsettled reservation holds budget until released"]
pub struct ReservationToken {
    reservation_id: Uuid,
    household_id: HouseholdId,
    period: PeriodKey,
    amount: Money,
}

impl ReservationToken {
    /// Reserved amount
    #[inline]
    #[must_use]
    pub fn amount(&self) -> Money {
        self.amount
    }

    /// Period the reservation counts against
    #[inline]
    #[must_use]
    pub fn period(&self) -> PeriodKey {
        self.period
    }

    /// Household the reservation belongs to
    #[inline]
    #[must_use]
    pub fn household_id(&self) -> HouseholdId {
        self.household_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReservationState {
    Reserved,
    Committed,
}

#[derive(Debug, Default)]
struct PeriodAccount {
    reservations: HashMap<Uuid, (Money, ReservationState)>,
}

impl PeriodAccount {
    fn reserved_total(&self) -> Money {
        self.reservations
            .values()
            .filter(|(_, state)| *state == ReservationState::Reserved)
            .map(|(amount, _)| *amount)
            .sum()
    }

    fn committed_total(&self) -> Money {
        self.reservations
            .values()
            .filter(|(_, state)| *state == ReservationState::Committed)
            .map(|(amount, _)| *amount)
            .sum()
    }

    fn active_total(&self) -> Money {
        self.reserved_total() + self.committed_total()
    }
}

/// Per-household, per-period spend accounting
#[derive(Debug, Default)]
pub struct BudgetLedger {
    accounts: DashMap<(HouseholdId, PeriodKey), Arc<Mutex<PeriodAccount>>>,
}

impl BudgetLedger {
    /// Create an empty ledger
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn account(&self, household_id: HouseholdId, period: PeriodKey) -> Arc<Mutex<PeriodAccount>> {
        self.accounts
            .entry((household_id, period))
            .or_default()
            .clone()
    }

    /// Atomically reserve `amount` against the period's cap
    ///
    /// `cap_override` authorizes this single reservation up to its own
    /// limit, regardless of how much of the monthly cap is already occupied
    /// (emergency escalation). The reservation still counts toward the
    /// period's totals, and later ordinary reservations see the unchanged
    /// `cap`. A cap of `None` disables the check.
    ///
    /// # Errors
    /// - `BudgetError::Exceeded` when the cap would be passed
    /// - `BudgetError::Contention` when the account stays locked through a
    ///   retry
    /// - `BudgetError::InvalidAmount` for non-positive amounts
    pub async fn reserve(
        &self,
        household_id: HouseholdId,
        amount: Money,
        period: PeriodKey,
        cap: Option<Money>,
        cap_override: Option<Money>,
    ) -> Result<ReservationToken, BudgetError> {
        if !amount.is_positive() {
            return Err(BudgetError::InvalidAmount(amount));
        }

        let account = self.account(household_id, period);
        let mut guard = match account.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                // One retry after yielding; then surface contention.
                tokio::task::yield_now().await;
                account.try_lock().map_err(|_| BudgetError::Contention)?
            }
        };

        if let Some(limit) = cap_override {
            if amount > limit {
                tracing::debug!(
                    household = %household_id,
                    %period,
                    %amount,
                    %limit,
                    "override reservation refused"
                );
                return Err(BudgetError::Exceeded {
                    requested: amount,
                    available: limit,
                });
            }
        } else if let Some(limit) = cap {
            let active = guard.active_total();
            let after = active
                .checked_add(amount)
                .ok_or(BudgetError::InvalidAmount(amount))?;
            if after > limit {
                let available = limit.saturating_sub(active);
                tracing::debug!(
                    household = %household_id,
                    %period,
                    %amount,
                    %available,
                    "budget reservation refused"
                );
                return Err(BudgetError::Exceeded {
                    requested: amount,
                    available,
                });
            }
        }

        let reservation_id = Uuid::new_v4();
        guard
            .reservations
            .insert(reservation_id, (amount, ReservationState::Reserved));
        tracing::debug!(household = %household_id, %period, %amount, "budget reserved");
        Ok(ReservationToken {
            reservation_id,
            household_id,
            period,
            amount,
        })
    }

    /// Convert a reservation into committed spend
    ///
    /// # Errors
    /// `BudgetError::UnknownReservation` if the token's reservation is gone.
    pub async fn commit(&self, token: ReservationToken) -> Result<(), BudgetError> {
        let account = self.account(token.household_id, token.period);
        let mut guard = account.lock().await;
        match guard.reservations.get_mut(&token.reservation_id) {
            Some(entry) if entry.1 == ReservationState::Reserved => {
                entry.1 = ReservationState::Committed;
                Ok(())
            }
            _ => Err(BudgetError::UnknownReservation(token.reservation_id)),
        }
    }

    /// Release a reservation, freeing its budget
    ///
    /// # Errors
    /// `BudgetError::UnknownReservation` if the token's reservation is gone.
    pub async fn release(&self, token: ReservationToken) -> Result<(), BudgetError> {
        let account = self.account(token.household_id, token.period);
        let mut guard = account.lock().await;
        match guard.reservations.remove(&token.reservation_id) {
            Some((_, ReservationState::Reserved)) => Ok(()),
            Some(entry) => {
                // Committed spend cannot be released; put it back.
                guard.reservations.insert(token.reservation_id, entry);
                Err(BudgetError::UnknownReservation(token.reservation_id))
            }
            None => Err(BudgetError::UnknownReservation(token.reservation_id)),
        }
    }

    /// Active (reserved + committed) total for a household's period
    #[must_use]
    pub async fn active_total(&self, household_id: HouseholdId, period: PeriodKey) -> Money {
        let account = self.account(household_id, period);
        let guard = account.lock().await;
        guard.active_total()
    }

    /// Committed total for a household's period
    #[must_use]
    pub async fn committed_total(&self, household_id: HouseholdId, period: PeriodKey) -> Money {
        let account = self.account(household_id, period);
        let guard = account.lock().await;
        guard.committed_total()
    }
}
