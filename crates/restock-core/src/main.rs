use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use clap::{value_parser, Arg, Command};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use restock_core::{CycleOutcome, EngineConfig, ReplenishmentEngine};
use restock_gateway::{
    GatewayError, OrderConfirmation, QuoteLine, RetailerGateway, RetailerQuote,
};
use restock_model::{
    ContextTags, HouseholdId, HouseholdLocation, ItemBundle, ItemId, Money, ReorderPreferences,
    RetailerId, SourceConfidence, UsageDataPoint,
};
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Scripted retailer with seeded price jitter and a flat failure rate
struct SimulatedGateway {
    id: RetailerId,
    base_price_cents: i64,
    fail_rate: f64,
    rng: Mutex<StdRng>,
}

impl SimulatedGateway {
    fn new(name: &str, base_price_cents: i64, fail_rate: f64, seed: u64) -> anyhow::Result<Self> {
        Ok(Self {
            id: RetailerId::from_str(name)?,
            base_price_cents,
            fail_rate,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        })
    }
}

#[async_trait]
impl RetailerGateway for SimulatedGateway {
    fn retailer_id(&self) -> RetailerId {
        self.id.clone()
    }

    async fn quote(
        &self,
        bundle: &ItemBundle,
        _location: &HouseholdLocation,
    ) -> Result<RetailerQuote, GatewayError> {
        let (jitter, eta, fails) = {
            let mut rng = self.rng.lock();
            (
                rng.gen_range(0.85..1.15),
                rng.gen_range(1..=4),
                rng.gen_bool(self.fail_rate),
            )
        };
        if fails {
            return Err(GatewayError::Unavailable {
                retailer: self.id.clone(),
                reason: "simulated outage".to_string(),
            });
        }
        let lines = bundle
            .lines()
            .iter()
            .map(|l| {
                let cents = (self.base_price_cents as f64 * jitter) as i64;
                QuoteLine::new(l.item_id.clone(), l.quantity, Money::from_cents(cents))
            })
            .collect();
        Ok(RetailerQuote::new(self.id.clone(), lines, eta, 0.95))
    }

    async fn submit_order(
        &self,
        _bundle: &ItemBundle,
        idempotency_key: &str,
    ) -> Result<OrderConfirmation, GatewayError> {
        let fails = self.rng.lock().gen_bool(self.fail_rate);
        if fails {
            return Err(GatewayError::Unavailable {
                retailer: self.id.clone(),
                reason: "simulated order outage".to_string(),
            });
        }
        Ok(OrderConfirmation {
            retailer_id: self.id.clone(),
            retailer_ref: format!("sim-{idempotency_key}"),
            promised_eta_days: 2,
        })
    }
}

#[derive(Debug, Default)]
struct Tally {
    no_action: u32,
    ordered: u32,
    pending: u32,
    skipped: u32,
    failed: u32,
}

async fn simulate(households: u32, cycles: u32, seed: u64) -> anyhow::Result<()> {
    let gateways: Vec<Arc<dyn RetailerGateway>> = vec![
        Arc::new(SimulatedGateway::new("quickmart", 2_400, 0.05, seed)?),
        Arc::new(SimulatedGateway::new("bulkbarn", 2_100, 0.15, seed.wrapping_add(1))?),
        Arc::new(SimulatedGateway::new("cornerstore", 2_900, 0.02, seed.wrapping_add(2))?),
    ];
    let engine = ReplenishmentEngine::new(gateways, EngineConfig::default());
    let item = ItemId::from_str("diapers-size4")?;
    let start = Utc::now().date_naive();
    let mut rng = StdRng::seed_from_u64(seed.wrapping_mul(31));
    let mut tally = Tally::default();

    for _ in 0..households {
        let household = HouseholdId::new();
        engine.register_household(
            ReorderPreferences::new(household)
                .with_auto_approve(true)
                .with_monthly_cap(Money::from_dollars(200))
                .with_per_order_cap(Money::from_dollars(100))
                .with_buffer_days(3),
            HouseholdLocation::new("us-east", "02139"),
        );

        let daily_rate = rng.gen_range(2.0..8.0);
        for day in 0..14_i64 {
            let at = Utc
                .from_utc_datetime(&(start - Duration::days(14 - day)).and_hms_opt(9, 0, 0)
                    .ok_or_else(|| anyhow::anyhow!("invalid history timestamp"))?);
            let noise: f64 = rng.gen_range(0.8..1.2);
            engine.record_usage(UsageDataPoint::new(
                at,
                item.clone(),
                household,
                daily_rate * noise,
                SourceConfidence::Scan,
                ContextTags::default(),
            ))?;
        }

        let mut on_hand = daily_rate * rng.gen_range(2.0..10.0);
        for cycle in 0..cycles {
            let as_of = start + Duration::days(i64::from(cycle));
            on_hand = (on_hand - daily_rate).max(0.0);
            match engine.run_cycle_at(household, &item, on_hand, as_of).await? {
                CycleOutcome::NoActionNeeded { .. } => tally.no_action += 1,
                CycleOutcome::Ordered { .. } => {
                    tally.ordered += 1;
                    // Delivery lands before the next cycle in this model.
                    on_hand += daily_rate * 14.0;
                }
                CycleOutcome::PendingApproval { .. } => tally.pending += 1,
                CycleOutcome::Skipped { .. } => tally.skipped += 1,
                CycleOutcome::Failed { .. } => tally.failed += 1,
            }
        }
    }

    engine.audit().verify_integrity()?;
    println!("simulation: {households} households x {cycles} cycles (seed {seed})");
    println!("  no action         {}", tally.no_action);
    println!("  ordered           {}", tally.ordered);
    println!("  pending approval  {}", tally.pending);
    println!("  skipped           {}", tally.skipped);
    println!("  failed placement  {}", tally.failed);
    println!("  orders in book    {}", engine.order_book().len());
    println!("  audit records     {} (chain verified)", engine.audit().len());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Command::new("restock")
        .version(restock_core::VERSION)
        .about("Household consumable reorder decision engine")
        .subcommand_required(true)
        .subcommand(
            Command::new("simulate")
                .about("Drive the engine against scripted retailers")
                .arg(
                    Arg::new("households")
                        .long("households")
                        .default_value("3")
                        .value_parser(value_parser!(u32))
                        .help("Number of households to simulate"),
                )
                .arg(
                    Arg::new("cycles")
                        .long("cycles")
                        .default_value("10")
                        .value_parser(value_parser!(u32))
                        .help("Decision cycles per household"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                ),
        );

    match cli.get_matches().subcommand() {
        Some(("simulate", args)) => {
            let households = *args.get_one::<u32>("households").unwrap_or(&3);
            let cycles = *args.get_one::<u32>("cycles").unwrap_or(&10);
            let seed = *args.get_one::<u64>("seed").unwrap_or(&42);
            simulate(households, cycles, seed).await
        }
        _ => unreachable!("subcommand_required"),
    }
}
