//! Replenishment engine facade
//!
//! The single entry point collaborators integrate against: usage input,
//! settings, recommendation display and approval, emergency declaration,
//! and the scheduled decision cycle itself.

use crate::audit::{DecisionAuditLog, DecisionRecord};
use crate::config::EngineConfig;
use crate::emergency::{EmergencyEscalationHandler, EmergencyTrigger};
use crate::error::EngineError;
use crate::events::{NotificationEvent, NotificationSink, TracingSink};
use crate::recommendation::{Recommendation, RecommendationStatus, RecommendationStore};
use crate::scheduler::{CycleOutcome, CycleState, ReorderScheduler};
use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use restock_budget::BudgetLedger;
use restock_forecast::{BaselineTrendModel, UsageLedger};
use restock_gateway::{GatewayPool, RetailerGateway};
use restock_model::{
    HouseholdId, HouseholdLocation, ItemId, PeriodKey, RecommendationId, ReorderPreferences,
    UsageDataPoint,
};
use restock_order::{IdempotencyKey, Order, OrderBook, OrderError};
use std::sync::Arc;

/// What the engine knows about a registered household
#[derive(Debug, Clone)]
struct HouseholdProfile {
    preferences: ReorderPreferences,
    location: HouseholdLocation,
}

/// The reorder decision engine
pub struct ReplenishmentEngine {
    ledger: Arc<UsageLedger>,
    budget: Arc<BudgetLedger>,
    book: Arc<OrderBook>,
    pool: Arc<GatewayPool>,
    scheduler: Arc<ReorderScheduler>,
    emergency: EmergencyEscalationHandler,
    recommendations: Arc<RecommendationStore>,
    audit: Arc<DecisionAuditLog>,
    sink: Arc<dyn NotificationSink>,
    households: DashMap<HouseholdId, HouseholdProfile>,
}

impl ReplenishmentEngine {
    /// Create an engine over the given retailer gateways
    #[must_use]
    pub fn new(gateways: Vec<Arc<dyn RetailerGateway>>, config: EngineConfig) -> Self {
        Self::with_notification_sink(gateways, config, Arc::new(TracingSink))
    }

    /// Create an engine with a custom notification sink
    #[must_use]
    pub fn with_notification_sink(
        gateways: Vec<Arc<dyn RetailerGateway>>,
        config: EngineConfig,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let ledger = Arc::new(UsageLedger::new());
        let budget = Arc::new(BudgetLedger::new());
        let book = Arc::new(OrderBook::new());
        let pool = Arc::new(GatewayPool::new(gateways, config.pool.clone()));
        let recommendations = Arc::new(RecommendationStore::new());
        let audit = Arc::new(DecisionAuditLog::new());
        let model = Arc::new(BaselineTrendModel::new(config.forecast.clone()));
        let scheduler = Arc::new(ReorderScheduler::new(
            Arc::clone(&ledger),
            model,
            Arc::clone(&pool),
            Arc::clone(&budget),
            Arc::clone(&book),
            Arc::clone(&recommendations),
            Arc::clone(&audit),
            Arc::clone(&sink),
            config,
        ));
        let emergency = EmergencyEscalationHandler::new(Arc::clone(&scheduler));
        Self {
            ledger,
            budget,
            book,
            pool,
            scheduler,
            emergency,
            recommendations,
            audit,
            sink,
            households: DashMap::new(),
        }
    }

    /// Register a household with its preferences and delivery location
    pub fn register_household(
        &self,
        preferences: ReorderPreferences,
        location: HouseholdLocation,
    ) {
        let household_id = preferences.household_id;
        self.households.insert(
            household_id,
            HouseholdProfile {
                preferences,
                location,
            },
        );
        tracing::info!(household = %household_id, "household registered");
    }

    /// Append one usage observation
    ///
    /// # Errors
    /// `EngineError::UnknownHousehold` for unregistered households;
    /// `EngineError::Ledger` for inconsistent data points.
    pub fn record_usage(&self, point: UsageDataPoint) -> Result<(), EngineError> {
        let household_id = point.household_id;
        if !self.households.contains_key(&household_id) {
            return Err(EngineError::UnknownHousehold(household_id));
        }
        self.ledger.record(point)?;
        Ok(())
    }

    /// Replace a household's preferences
    ///
    /// # Errors
    /// `EngineError::UnknownHousehold` for unregistered households.
    pub fn update_preferences(&self, preferences: ReorderPreferences) -> Result<(), EngineError> {
        let household_id = preferences.household_id;
        let mut profile = self
            .households
            .get_mut(&household_id)
            .ok_or(EngineError::UnknownHousehold(household_id))?;
        profile.preferences = preferences;
        tracing::debug!(household = %household_id, "preferences updated");
        Ok(())
    }

    /// Run one decision cycle for a household's item, as of today
    ///
    /// # Errors
    /// See [`ReorderScheduler::run_cycle`].
    pub async fn run_cycle(
        &self,
        household_id: HouseholdId,
        item_id: &ItemId,
        on_hand: f64,
    ) -> Result<CycleOutcome, EngineError> {
        self.run_cycle_at(household_id, item_id, on_hand, Utc::now().date_naive())
            .await
    }

    /// Run one decision cycle with an explicit decision date
    ///
    /// # Errors
    /// See [`ReorderScheduler::run_cycle`].
    pub async fn run_cycle_at(
        &self,
        household_id: HouseholdId,
        item_id: &ItemId,
        on_hand: f64,
        as_of: NaiveDate,
    ) -> Result<CycleOutcome, EngineError> {
        let profile = self.profile(household_id)?;
        self.scheduler
            .run_cycle(
                household_id,
                item_id,
                on_hand,
                &profile.preferences,
                &profile.location,
                as_of,
            )
            .await
    }

    /// Latest pending recommendation for display
    ///
    /// # Errors
    /// `EngineError::UnknownHousehold` for unregistered households.
    pub fn get_recommendation(
        &self,
        household_id: HouseholdId,
    ) -> Result<Option<Recommendation>, EngineError> {
        if !self.households.contains_key(&household_id) {
            return Err(EngineError::UnknownHousehold(household_id));
        }
        Ok(self.recommendations.latest_pending(household_id))
    }

    /// Approve a pending recommendation, placing its order
    ///
    /// Explicit approval authorizes the spend, so the monthly-cap check is
    /// bypassed; the amount still counts against the period's totals. The
    /// recommendation's cycle id scopes the idempotency key, so approving
    /// twice cannot place two orders.
    ///
    /// # Errors
    /// - `EngineError::UnknownRecommendation` / `RecommendationNotPending`
    ///   for stale or foreign ids
    /// - `EngineError::Order` if submission fails after retries; the
    ///   reservation is released and the recommendation stays pending
    pub async fn approve_recommendation(
        &self,
        household_id: HouseholdId,
        recommendation_id: RecommendationId,
    ) -> Result<Order, EngineError> {
        self.profile(household_id)?;
        let rec = self
            .recommendations
            .get(recommendation_id)
            .filter(|r| r.household_id == household_id)
            .ok_or(EngineError::UnknownRecommendation(recommendation_id))?;
        if rec.status != RecommendationStatus::Pending {
            return Err(EngineError::RecommendationNotPending(recommendation_id));
        }
        let chosen = rec
            .chosen()
            .cloned()
            .ok_or(EngineError::RecommendationNotPending(recommendation_id))?;

        let period = PeriodKey::for_date(Utc::now().date_naive());
        let token = self
            .budget
            .reserve(household_id, chosen.total_price, period, None, None)
            .await?;

        let key = IdempotencyKey::derive(household_id, &rec.bundle, rec.cycle_id);
        let order = Order::new(
            household_id,
            rec.bundle.clone(),
            chosen.retailer_id.clone(),
            chosen.total_price,
            key,
        );
        let order_id = self.book.insert(order);

        match self.scheduler.placer.place(&self.pool, order_id).await {
            Ok(_confirmation) => {
                self.budget.commit(token).await?;
                self.recommendations
                    .settle(recommendation_id, RecommendationStatus::Approved);
                self.audit.append(DecisionRecord::new(
                    household_id,
                    rec.cycle_id,
                    rec.bundle.clone(),
                    CycleState::Ordered,
                    "approved manually",
                    Some(chosen.clone()),
                ))?;
                self.sink.notify(&NotificationEvent::OrderPlaced {
                    household_id,
                    order_id,
                    retailer_id: chosen.retailer_id.clone(),
                    price: chosen.total_price,
                });
                self.book
                    .get(order_id)
                    .ok_or(EngineError::Order(OrderError::UnknownOrder(order_id)))
            }
            Err(err) => {
                self.budget.release(token).await?;
                Err(err.into())
            }
        }
    }

    /// Cancel a pending recommendation
    ///
    /// Allowed any time before an order exists for it; approval is the only
    /// step that creates one.
    ///
    /// # Errors
    /// `EngineError::UnknownRecommendation` / `RecommendationNotPending`
    /// for stale or foreign ids.
    pub fn cancel_recommendation(
        &self,
        household_id: HouseholdId,
        recommendation_id: RecommendationId,
    ) -> Result<(), EngineError> {
        self.profile(household_id)?;
        let rec = self
            .recommendations
            .get(recommendation_id)
            .filter(|r| r.household_id == household_id)
            .ok_or(EngineError::UnknownRecommendation(recommendation_id))?;
        if !self
            .recommendations
            .settle(recommendation_id, RecommendationStatus::Cancelled)
        {
            return Err(EngineError::RecommendationNotPending(recommendation_id));
        }
        self.audit.append(DecisionRecord::new(
            household_id,
            rec.cycle_id,
            rec.bundle,
            CycleState::Idle,
            "recommendation cancelled by household",
            None,
        ))?;
        Ok(())
    }

    /// Process an emergency trigger, as of today
    ///
    /// # Errors
    /// See [`EmergencyEscalationHandler::escalate`].
    pub async fn declare_emergency(
        &self,
        trigger: EmergencyTrigger,
    ) -> Result<CycleOutcome, EngineError> {
        self.declare_emergency_at(trigger, Utc::now().date_naive())
            .await
    }

    /// Process an emergency trigger with an explicit decision date
    ///
    /// # Errors
    /// See [`EmergencyEscalationHandler::escalate`].
    pub async fn declare_emergency_at(
        &self,
        trigger: EmergencyTrigger,
        as_of: NaiveDate,
    ) -> Result<CycleOutcome, EngineError> {
        let profile = self.profile(trigger.household_id)?;
        self.emergency
            .escalate(trigger, &profile.preferences, &profile.location, as_of)
            .await
    }

    /// The decision audit log
    #[inline]
    #[must_use]
    pub fn audit(&self) -> &Arc<DecisionAuditLog> {
        &self.audit
    }

    /// The order store
    #[inline]
    #[must_use]
    pub fn order_book(&self) -> &Arc<OrderBook> {
        &self.book
    }

    /// The budget ledger
    #[inline]
    #[must_use]
    pub fn budget(&self) -> &Arc<BudgetLedger> {
        &self.budget
    }

    /// The usage ledger
    #[inline]
    #[must_use]
    pub fn usage_ledger(&self) -> &Arc<UsageLedger> {
        &self.ledger
    }

    fn profile(&self, household_id: HouseholdId) -> Result<HouseholdProfile, EngineError> {
        self.households
            .get(&household_id)
            .map(|p| p.clone())
            .ok_or(EngineError::UnknownHousehold(household_id))
    }
}
