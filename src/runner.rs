//! Control loop: one tick every few seconds until shutdown.
//!
//! Each tick resolves both markets, fetches quotes, runs the momentum
//! trade and then the relative-value engine. The runner owns all strategy
//! state and hands it to the strategies by `&mut`.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;
use tracing::{error, info, instrument, warn};

use crate::api::{AppState, StatusSnapshot, TickCounters};
use crate::config::Config;
use crate::error::BotError;
use crate::market::{Cadence, MarketDirectory, MarketInstance, MarketLocator};
use crate::metrics;
use crate::quote::{PriceSource, Quote, QuoteService};
use crate::strategy::{
    compute_signal, BotState, MomentumOutcome, MomentumSettings, MomentumTrader,
    RelativeValueEngine, RvInputs, RvOutcome, RvSettings,
};
use crate::trading::OrderGateway;

/// Sleep policy of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTiming {
    /// After a normal tick.
    pub check_interval: Duration,
    /// After a tick with no 15-minute market.
    pub market_retry: Duration,
    /// After a failed tick.
    pub error_backoff: Duration,
}

impl LoopTiming {
    /// Timing from config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            check_interval: config.check_interval(),
            market_retry: config.market_retry(),
            error_backoff: config.error_backoff(),
        }
    }
}

/// Classification of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TickOutcome {
    /// Short market resolved and both strategies evaluated.
    Ok,
    /// Short market not resolvable.
    Skip,
    /// The tick returned an error.
    TransientError,
}

impl TickOutcome {
    /// How long to sleep after this outcome.
    pub fn delay(self, timing: &LoopTiming) -> Duration {
        match self {
            TickOutcome::Ok => timing.check_interval,
            TickOutcome::Skip => timing.market_retry,
            TickOutcome::TransientError => timing.error_backoff,
        }
    }

}

/// Everything one tick saw and did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Classification.
    pub outcome: TickOutcome,
    /// Resolved 15-minute market.
    pub short_market: Option<MarketInstance>,
    /// Resolved 1-hour market.
    pub long_market: Option<MarketInstance>,
    /// 15-minute Yes quote.
    pub short_yes: Quote,
    /// 15-minute No quote.
    pub short_no: Quote,
    /// 1-hour Yes quote.
    pub long_yes: Quote,
    /// 1-hour No quote.
    pub long_no: Quote,
    /// Momentum result, when evaluated.
    pub momentum: Option<MomentumOutcome>,
    /// Relative-value result, when evaluated.
    pub rv: Option<RvOutcome>,
}

impl TickReport {
    fn skipped(long_market: Option<MarketInstance>) -> Self {
        Self {
            outcome: TickOutcome::Skip,
            short_market: None,
            long_market,
            short_yes: Quote::UNAVAILABLE,
            short_no: Quote::UNAVAILABLE,
            long_yes: Quote::UNAVAILABLE,
            long_no: Quote::UNAVAILABLE,
            momentum: None,
            rv: None,
        }
    }
}

/// The trading loop.
pub struct Runner<D, P, G> {
    locator: MarketLocator<D>,
    quotes: QuoteService<P>,
    gateway: G,
    rv_engine: RelativeValueEngine,
    momentum: MomentumTrader,
    state: BotState,
    timing: LoopTiming,
    mode: &'static str,
    status: Option<AppState>,
    counters: TickCounters,
}

impl<D, P, G> Runner<D, P, G>
where
    D: MarketDirectory,
    P: PriceSource,
    G: OrderGateway,
{
    /// Create a runner with flat state.
    pub fn new(config: &Config, directory: D, prices: P, gateway: G) -> Self {
        Self {
            locator: MarketLocator::new(directory),
            quotes: QuoteService::new(prices),
            gateway,
            rv_engine: RelativeValueEngine::new(RvSettings::from_config(config)),
            momentum: MomentumTrader::new(MomentumSettings::from_config(config)),
            state: BotState::default(),
            timing: LoopTiming::from_config(config),
            mode: if config.dry_run { "dry_run" } else { "live" },
            status: None,
            counters: TickCounters::default(),
        }
    }

    /// Publish a snapshot to `status` after every tick.
    pub fn with_status(mut self, status: AppState) -> Self {
        self.status = Some(status);
        self
    }

    /// Current strategy state.
    pub fn state(&self) -> &BotState {
        &self.state
    }

    /// Order gateway.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Sleep policy.
    pub fn timing(&self) -> &LoopTiming {
        &self.timing
    }

    /// Tick counters since start.
    pub fn counters(&self) -> TickCounters {
        self.counters
    }

    /// Run one tick at `now`.
    ///
    /// Market, quote and order failures are absorbed below this point; an
    /// `Err` means `now` itself could not be mapped to a market window.
    #[instrument(skip(self), fields(ts = now.timestamp()))]
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Result<TickReport, BotError> {
        let short_market = self.locator.resolve(Cadence::FifteenMinute, now).await?;
        let long_market = self.locator.resolve(Cadence::OneHour, now).await?;

        let Some(short) = short_market.as_ref() else {
            info!("15m market not found, retrying later");
            return Ok(TickReport::skipped(long_market));
        };

        let short_yes = self.quotes.get_quote(&short.yes_token_id).await;
        let short_no = self.quotes.get_quote(&short.no_token_id).await;
        let (long_yes, long_no) = match long_market.as_ref() {
            Some(long) => (
                self.quotes.get_quote(&long.yes_token_id).await,
                self.quotes.get_quote(&long.no_token_id).await,
            ),
            None => (Quote::UNAVAILABLE, Quote::UNAVAILABLE),
        };

        let signal = (short_yes.has_mid() && long_yes.has_mid())
            .then(|| compute_signal(short_yes.mid, long_yes.mid));
        info!(
            short_slug = %short.slug,
            long_slug = long_market.as_ref().map(|m| m.slug.as_str()).unwrap_or("-"),
            short_mid = %short_yes.mid,
            long_mid = %long_yes.mid,
            long_no_mid = %long_no.mid,
            yes_bid = %short_yes.bid,
            no_bid = %short_no.bid,
            signal = ?signal,
            rv_open = self.state.rv.is_open(),
            "Tick"
        );

        let momentum = self
            .momentum
            .step(
                &mut self.state.momentum,
                short,
                now.timestamp(),
                short_yes.bid,
                short_no.bid,
                &self.gateway,
            )
            .await;

        let inputs = RvInputs {
            short_market: Some(short),
            long_market: long_market.as_ref(),
            short_mid: short_yes.mid,
            long_mid: long_yes.mid,
        };
        let rv = self
            .rv_engine
            .step(&mut self.state.rv, &inputs, now, &self.gateway)
            .await;

        Ok(TickReport {
            outcome: TickOutcome::Ok,
            short_market,
            long_market,
            short_yes,
            short_no,
            long_yes,
            long_no,
            momentum: Some(momentum),
            rv: Some(rv),
        })
    }

    /// Tick until `shutdown` resolves. Shutdown is observed between ticks
    /// and interrupts the sleep.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(mode = self.mode, "Trading loop started");

        loop {
            let now = Utc::now();
            let (outcome, report) = match self.tick(now).await {
                Ok(report) => (report.outcome, Some(report)),
                Err(e) => {
                    error!(error = %e, ts = now.timestamp(), "Tick failed");
                    (TickOutcome::TransientError, None)
                }
            };
            self.record(now, outcome, report.as_ref()).await;

            let delay = outcome.delay(&self.timing);
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping trading loop");
                    break;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        if self.state.rv.is_open() {
            warn!(
                rv = ?self.state.rv.snapshot(),
                "Stopping with an open RV position; it is not persisted"
            );
        }
    }

    /// Update counters and metrics, and publish a status snapshot.
    pub async fn record(
        &mut self,
        now: DateTime<Utc>,
        outcome: TickOutcome,
        report: Option<&TickReport>,
    ) {
        metrics::inc_ticks(outcome.to_string());
        match outcome {
            TickOutcome::Ok => self.counters.ok += 1,
            TickOutcome::Skip => {
                self.counters.skipped += 1;
                metrics::inc_market_skips();
            }
            TickOutcome::TransientError => {
                self.counters.errors += 1;
                metrics::inc_tick_errors();
            }
        }

        let Some(status) = &self.status else {
            return;
        };

        if outcome == TickOutcome::Ok {
            status.set_ready(true);
        }

        status
            .publish(StatusSnapshot {
                mode: self.mode,
                last_tick: Some(now),
                last_outcome: Some(outcome.to_string()),
                short_slug: report.and_then(|r| r.short_market.as_ref().map(|m| m.slug.clone())),
                long_slug: report.and_then(|r| r.long_market.as_ref().map(|m| m.slug.clone())),
                rv: self.state.rv.snapshot(),
                momentum: self.state.momentum,
                counters: self.counters,
            })
            .await;
    }
}
