//! Reorder scheduler
//!
//! One decision cycle per household per cadence period, walked through the
//! cycle state machine:
//!
//! `Idle → ForecastDue → Evaluating → {AutoApproved |
//! PendingManualApproval | Skipped} → Ordered | Failed`
//!
//! Budget refusal and low confidence are normal decision outcomes that
//! resolve to pending manual approval; only genuine faults leave as errors.

use crate::audit::{DecisionAuditLog, DecisionRecord};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::events::{NotificationEvent, NotificationSink};
use crate::recommendation::RecommendationStore;
use chrono::{Duration, NaiveDate};
use restock_budget::{BudgetError, BudgetLedger};
use restock_forecast::{ConsumptionForecast, ForecastModel, UsageLedger};
use restock_gateway::{GatewayError, GatewayPool};
use restock_model::{
    CycleId, HouseholdId, HouseholdLocation, ItemBundle, ItemId, Money, OrderId, PeriodKey,
    RecommendationId, ReorderPreferences, RetailerId,
};
use restock_optimizer::{optimize, FulfillmentOption, WeightProfile};
use restock_order::{IdempotencyKey, Order, OrderBook, OrderError, OrderPlacer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// States of one decision cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleState {
    Idle,
    ForecastDue,
    Evaluating,
    AutoApproved,
    PendingManualApproval,
    Skipped,
    Ordered,
    Failed,
}

/// States reachable from `from`
#[must_use]
pub fn allowed_transitions(from: CycleState) -> Vec<CycleState> {
    use CycleState::*;
    match from {
        Idle => vec![ForecastDue],
        // Back to Idle is the common no-action case, not an error.
        ForecastDue => vec![Evaluating, Idle],
        Evaluating => vec![AutoApproved, PendingManualApproval, Skipped],
        AutoApproved => vec![Ordered, Failed],
        // Approval re-enters the auto-approved path; cancellation rests.
        PendingManualApproval => vec![AutoApproved, Idle],
        Failed => vec![PendingManualApproval],
        Ordered | Skipped => vec![],
    }
}

/// Validate a cycle transition
///
/// # Errors
/// `EngineError::IllegalCycleTransition` if the cycle flow does not allow it.
pub fn validate_transition(from: CycleState, to: CycleState) -> Result<(), EngineError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(EngineError::IllegalCycleTransition { from, to })
    }
}

/// What one decision cycle resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Depletion is beyond the buffer window; nothing to do
    NoActionNeeded { depletion_date: NaiveDate },
    /// An order was placed and confirmed
    Ordered {
        order_id: OrderId,
        retailer_id: RetailerId,
        price: Money,
    },
    /// A recommendation awaits external approval
    PendingApproval {
        recommendation_id: RecommendationId,
        reason: String,
    },
    /// The cycle could not be evaluated; degraded service
    Skipped { reason: String },
    /// Placement failed after retries; fell back to manual approval
    Failed {
        recommendation_id: RecommendationId,
        reason: String,
    },
}

pub(crate) enum PlacementResult {
    Placed {
        order_id: OrderId,
        retailer_id: RetailerId,
        price: Money,
    },
    BudgetRefused {
        reason: String,
    },
    SubmissionFailed {
        reason: String,
    },
}

/// Drives decision cycles for all households
pub struct ReorderScheduler {
    pub(crate) ledger: Arc<UsageLedger>,
    pub(crate) model: Arc<dyn ForecastModel>,
    pub(crate) pool: Arc<GatewayPool>,
    pub(crate) budget: Arc<BudgetLedger>,
    pub(crate) book: Arc<OrderBook>,
    pub(crate) placer: OrderPlacer,
    pub(crate) recommendations: Arc<RecommendationStore>,
    pub(crate) audit: Arc<DecisionAuditLog>,
    pub(crate) sink: Arc<dyn NotificationSink>,
    pub(crate) config: EngineConfig,
}

impl ReorderScheduler {
    /// Wire a scheduler over shared engine components
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        ledger: Arc<UsageLedger>,
        model: Arc<dyn ForecastModel>,
        pool: Arc<GatewayPool>,
        budget: Arc<BudgetLedger>,
        book: Arc<OrderBook>,
        recommendations: Arc<RecommendationStore>,
        audit: Arc<DecisionAuditLog>,
        sink: Arc<dyn NotificationSink>,
        config: EngineConfig,
    ) -> Self {
        let placer = OrderPlacer::new(Arc::clone(&book), config.retry);
        Self {
            ledger,
            model,
            pool,
            budget,
            book,
            placer,
            recommendations,
            audit,
            sink,
            config,
        }
    }

    /// Run one decision cycle for a household's item
    ///
    /// The common outcome is [`CycleOutcome::NoActionNeeded`]; the cycle
    /// only proceeds to evaluation when predicted depletion falls within
    /// the household's buffer window.
    ///
    /// # Errors
    /// Only faults with no decision fallback: gateway pool misuse, ledger
    /// inconsistencies, audit failures. Budget refusal, low confidence, and
    /// absent retailers all resolve into the returned outcome instead.
    pub async fn run_cycle(
        &self,
        household_id: HouseholdId,
        item_id: &ItemId,
        on_hand: f64,
        prefs: &ReorderPreferences,
        location: &HouseholdLocation,
        as_of: NaiveDate,
    ) -> Result<CycleOutcome, EngineError> {
        let cycle_id = CycleId::new();
        let mut state = CycleState::Idle;
        advance(&mut state, CycleState::ForecastDue)?;

        let history = self.ledger.history(household_id, item_id);
        let forecast = self
            .model
            .forecast(household_id, item_id, &history, on_hand, as_of);
        tracing::debug!(
            household = %household_id,
            item = %item_id,
            daily_rate = forecast.daily_rate,
            confidence = forecast.confidence,
            depletion = %forecast.predicted_depletion_date,
            "cycle forecast"
        );

        let reorder_by =
            forecast.predicted_depletion_date - Duration::days(i64::from(prefs.buffer_days));
        if reorder_by > as_of {
            advance(&mut state, CycleState::Idle)?;
            let depletion_date = forecast.predicted_depletion_date;
            self.record(
                household_id,
                cycle_id,
                ItemBundle::single(item_id.clone(), 1),
                state,
                "stock sufficient through buffer window",
                None,
            )?;
            return Ok(CycleOutcome::NoActionNeeded { depletion_date });
        }

        advance(&mut state, CycleState::Evaluating)?;
        let bundle = ItemBundle::single(item_id.clone(), self.reorder_quantity(&forecast));

        self.evaluate(
            state,
            household_id,
            cycle_id,
            bundle,
            Some(forecast),
            prefs,
            location,
            as_of,
            &WeightProfile::standard(),
            false,
            None,
        )
        .await
    }

    /// Evaluate a due bundle: quotes, ranking, gates, budget, placement
    ///
    /// Shared by the scheduled path and emergency escalation; the caller
    /// has already decided the cycle is due and picked the weight profile.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn evaluate(
        &self,
        mut state: CycleState,
        household_id: HouseholdId,
        cycle_id: CycleId,
        bundle: ItemBundle,
        forecast: Option<ConsumptionForecast>,
        prefs: &ReorderPreferences,
        location: &HouseholdLocation,
        as_of: NaiveDate,
        profile: &WeightProfile,
        urgent: bool,
        cap_override: Option<Money>,
    ) -> Result<CycleOutcome, EngineError> {
        let quotes = match self.pool.query(&bundle, location).await {
            Ok(quotes) => quotes,
            Err(GatewayError::NoRetailerAvailable) => {
                return self.skip(state, household_id, cycle_id, bundle, "no retailer responded");
            }
            Err(other) => return Err(other.into()),
        };

        let options = optimize(&bundle, &quotes, prefs, profile, as_of);
        let Some(chosen) = options.first().cloned() else {
            return self.skip(
                state,
                household_id,
                cycle_id,
                bundle,
                "no usable quote from configured retailers",
            );
        };

        // Auto-approval gates; emergencies skip the confidence and
        // auto-approve checks by construction (urgent = true).
        let refusal = if urgent {
            if chosen.exceeds_cap && cap_override.is_none() {
                Some(format!(
                    "best option {} exceeds per-order cap",
                    chosen.total_price
                ))
            } else {
                None
            }
        } else if !prefs.auto_approve_enabled {
            Some("auto-approval disabled".to_string())
        } else if forecast
            .as_ref()
            .is_some_and(|f| f.confidence < self.config.actionable_confidence)
        {
            let confidence = forecast.as_ref().map_or(0.0, |f| f.confidence);
            Some(format!(
                "forecast confidence {confidence:.2} below actionable threshold"
            ))
        } else if chosen.exceeds_cap {
            Some(format!(
                "best option {} exceeds per-order cap",
                chosen.total_price
            ))
        } else {
            None
        };
        if let Some(reason) = refusal {
            return self.pend(
                state,
                household_id,
                cycle_id,
                bundle,
                forecast,
                options,
                reason,
                urgent,
            );
        }

        match self
            .reserve_and_place(
                household_id,
                cycle_id,
                &bundle,
                &chosen,
                prefs,
                as_of,
                cap_override,
            )
            .await?
        {
            PlacementResult::Placed {
                order_id,
                retailer_id,
                price,
            } => {
                advance(&mut state, CycleState::AutoApproved)?;
                advance(&mut state, CycleState::Ordered)?;
                self.record(
                    household_id,
                    cycle_id,
                    bundle,
                    state,
                    "order placed",
                    Some(chosen),
                )?;
                self.sink.notify(&NotificationEvent::OrderPlaced {
                    household_id,
                    order_id,
                    retailer_id: retailer_id.clone(),
                    price,
                });
                Ok(CycleOutcome::Ordered {
                    order_id,
                    retailer_id,
                    price,
                })
            }
            PlacementResult::BudgetRefused { reason } => self.pend(
                state,
                household_id,
                cycle_id,
                bundle,
                forecast,
                options,
                reason,
                urgent,
            ),
            PlacementResult::SubmissionFailed { reason } => {
                advance(&mut state, CycleState::AutoApproved)?;
                advance(&mut state, CycleState::Failed)?;
                advance(&mut state, CycleState::PendingManualApproval)?;
                let recommendation_id = self.recommendations.create(
                    household_id,
                    cycle_id,
                    bundle.clone(),
                    forecast,
                    options,
                    reason.clone(),
                    true,
                );
                self.record(
                    household_id,
                    cycle_id,
                    bundle,
                    CycleState::Failed,
                    reason.clone(),
                    Some(chosen),
                )?;
                self.sink.notify(&NotificationEvent::PendingApproval {
                    household_id,
                    recommendation_id,
                    reason: reason.clone(),
                    urgent: true,
                });
                Ok(CycleOutcome::Failed {
                    recommendation_id,
                    reason,
                })
            }
        }
    }

    /// Reserve budget and place the order for an approved option
    ///
    /// On submission failure the reservation is released before returning,
    /// keeping budget accounting consistent with the retailer's view.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn reserve_and_place(
        &self,
        household_id: HouseholdId,
        cycle_id: CycleId,
        bundle: &ItemBundle,
        chosen: &FulfillmentOption,
        prefs: &ReorderPreferences,
        as_of: NaiveDate,
        cap_override: Option<Money>,
    ) -> Result<PlacementResult, EngineError> {
        let period = PeriodKey::for_date(as_of);
        let token = match self
            .budget
            .reserve(
                household_id,
                chosen.total_price,
                period,
                prefs.monthly_budget_cap,
                cap_override,
            )
            .await
        {
            Ok(token) => token,
            Err(BudgetError::Exceeded {
                requested,
                available,
            }) => {
                return Ok(PlacementResult::BudgetRefused {
                    reason: format!(
                        "monthly budget exceeded: {requested} requested, {available} available"
                    ),
                });
            }
            // A racing reservation holds the account; treat as refused
            // rather than retrying into the same contention.
            Err(BudgetError::Contention) => {
                return Ok(PlacementResult::BudgetRefused {
                    reason: "monthly budget exceeded: concurrent reservation in progress"
                        .to_string(),
                });
            }
            Err(other) => return Err(other.into()),
        };

        let key = IdempotencyKey::derive(household_id, bundle, cycle_id);
        let order = Order::new(
            household_id,
            bundle.clone(),
            chosen.retailer_id.clone(),
            chosen.total_price,
            key,
        );
        let order_id = self.book.insert(order);

        match self.placer.place(&self.pool, order_id).await {
            Ok(_confirmation) => {
                self.budget.commit(token).await?;
                Ok(PlacementResult::Placed {
                    order_id,
                    retailer_id: chosen.retailer_id.clone(),
                    price: chosen.total_price,
                })
            }
            Err(err @ OrderError::SubmissionFailed { .. }) => {
                self.budget.release(token).await?;
                Ok(PlacementResult::SubmissionFailed {
                    reason: format!("order submission failed: {err}"),
                })
            }
            Err(other) => {
                self.budget.release(token).await?;
                Err(other.into())
            }
        }
    }

    /// Units one reorder should cover at the forecast rate
    fn reorder_quantity(&self, forecast: &ConsumptionForecast) -> u32 {
        let units = (forecast.daily_rate * f64::from(self.config.restock_cover_days)).ceil();
        if units.is_finite() && units >= 1.0 {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                units.min(f64::from(u32::MAX)) as u32
            }
        } else {
            1
        }
    }

    fn skip(
        &self,
        mut state: CycleState,
        household_id: HouseholdId,
        cycle_id: CycleId,
        bundle: ItemBundle,
        reason: &str,
    ) -> Result<CycleOutcome, EngineError> {
        advance(&mut state, CycleState::Skipped)?;
        self.record(household_id, cycle_id, bundle, state, reason, None)?;
        self.sink.notify(&NotificationEvent::Skipped {
            household_id,
            reason: reason.to_string(),
        });
        Ok(CycleOutcome::Skipped {
            reason: reason.to_string(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn pend(
        &self,
        mut state: CycleState,
        household_id: HouseholdId,
        cycle_id: CycleId,
        bundle: ItemBundle,
        forecast: Option<ConsumptionForecast>,
        options: Vec<FulfillmentOption>,
        reason: String,
        urgent: bool,
    ) -> Result<CycleOutcome, EngineError> {
        advance(&mut state, CycleState::PendingManualApproval)?;
        let chosen = options.first().cloned();
        let recommendation_id = self.recommendations.create(
            household_id,
            cycle_id,
            bundle.clone(),
            forecast,
            options,
            reason.clone(),
            urgent,
        );
        self.record(household_id, cycle_id, bundle, state, reason.clone(), chosen)?;
        self.sink.notify(&NotificationEvent::PendingApproval {
            household_id,
            recommendation_id,
            reason: reason.clone(),
            urgent,
        });
        Ok(CycleOutcome::PendingApproval {
            recommendation_id,
            reason,
        })
    }

    fn record(
        &self,
        household_id: HouseholdId,
        cycle_id: CycleId,
        bundle: ItemBundle,
        state: CycleState,
        reason: impl Into<String>,
        chosen: Option<FulfillmentOption>,
    ) -> Result<(), EngineError> {
        self.audit.append(DecisionRecord::new(
            household_id,
            cycle_id,
            bundle,
            state,
            reason,
            chosen,
        ))?;
        Ok(())
    }
}

fn advance(state: &mut CycleState, to: CycleState) -> Result<(), EngineError> {
    validate_transition(*state, to)?;
    *state = to;
    Ok(())
}
