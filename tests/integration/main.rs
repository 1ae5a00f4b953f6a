//! End-to-end tests of the trading loop against in-memory collaborators.
//!
//! Every test drives `Runner::tick` with explicit timestamps, so no network
//! access or wall-clock waiting is involved.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rust_decimal_macros::dec;
use tower::ServiceExt;

use polymarket_rv::api::{create_router, AppState};
use polymarket_rv::config::Config;
use polymarket_rv::market::slug::market_slug;
use polymarket_rv::market::{Cadence, MockDirectory, MockOrderGateway, MockPriceSource, Outcome};
use polymarket_rv::runner::{Runner, TickOutcome};
use polymarket_rv::strategy::{MomentumOutcome, RvOutcome, RvPhase, SkipReason};
use polymarket_rv::trading::{OrderOutcome, SimulatedGateway};

struct Harness {
    directory: MockDirectory,
    prices: MockPriceSource,
    gateway: MockOrderGateway,
}

impl Harness {
    fn new(gateway: MockOrderGateway) -> Self {
        Self {
            directory: MockDirectory::new(),
            prices: MockPriceSource::new(),
            gateway,
        }
    }

    fn runner(&self) -> Runner<MockDirectory, MockPriceSource, MockOrderGateway> {
        Runner::new(
            &Config::default(),
            self.directory.clone(),
            self.prices.clone(),
            self.gateway.clone(),
        )
    }

    /// Register the market active at `now` with tokens `{prefix}-yes` / `{prefix}-no`.
    fn list(&self, cadence: Cadence, now: DateTime<Utc>, prefix: &str) {
        let slug = market_slug(cadence, now).unwrap();
        let yes = format!("{}-yes", prefix);
        let no = format!("{}-no", prefix);
        self.directory
            .insert_market(&slug, "Bitcoin Up or Down?", &[yes.as_str(), no.as_str()]);
    }

    fn placed_tokens(&self) -> Vec<String> {
        self.gateway
            .placed()
            .into_iter()
            .map(|o| o.token_id)
            .collect()
    }
}

/// 2025-10-19 19:02:00 UTC (3:02pm ET), minute 2 of its 15-minute interval.
fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 19, 19, 2, 0).unwrap()
}

fn rejected(reason: &str) -> OrderOutcome {
    OrderOutcome::Rejected {
        reason: reason.to_string(),
    }
}

fn accepted() -> OrderOutcome {
    OrderOutcome::Accepted { order_id: None }
}

#[tokio::test]
async fn paired_position_opens_holds_and_closes() {
    let h = Harness::new(MockOrderGateway::new());
    h.list(Cadence::FifteenMinute, t0(), "s");
    h.list(Cadence::OneHour, t0(), "h");
    assert_eq!(
        market_slug(Cadence::OneHour, t0()).unwrap(),
        "bitcoin-up-or-down-october-19-3pm-et"
    );
    let mut runner = h.runner();

    // signal = 0.70 - 0.55 = +0.15
    h.prices.set_book("s-yes", dec!(0.69), dec!(0.71));
    h.prices.set_book("s-no", dec!(0.29), dec!(0.31));
    h.prices.set_book("h-yes", dec!(0.54), dec!(0.56));

    let report = runner.tick(t0()).await.unwrap();
    assert_eq!(report.rv, Some(RvOutcome::Opened));
    assert_eq!(h.placed_tokens(), vec!["s-no", "h-yes"]);

    let rv = &runner.state().rv;
    assert_eq!(rv.short_leg().unwrap().outcome, Outcome::No);
    assert_eq!(rv.long_leg().unwrap().outcome, Outcome::Yes);

    // Spread converges but the cooldown has not elapsed.
    h.prices.set_book("s-yes", dec!(0.55), dec!(0.57));
    let report = runner.tick(t0() + TimeDelta::seconds(30)).await.unwrap();
    assert_eq!(report.rv, Some(RvOutcome::Cooldown));
    assert_eq!(h.gateway.placed().len(), 2);

    // Cooldown over: |0.56 - 0.55| <= 0.03 closes by buying the opposites.
    let report = runner.tick(t0() + TimeDelta::seconds(70)).await.unwrap();
    assert_eq!(report.rv, Some(RvOutcome::Closed));
    assert_eq!(h.placed_tokens(), vec!["s-no", "h-yes", "s-yes", "h-no"]);
    assert!(!runner.state().rv.is_open());

    // Flat and in the dead zone: nothing more happens.
    let report = runner.tick(t0() + TimeDelta::seconds(140)).await.unwrap();
    assert_eq!(report.rv, Some(RvOutcome::Hold));
    assert_eq!(h.gateway.placed().len(), 4);
}

#[tokio::test]
async fn partial_open_is_reported_then_retried() {
    let h = Harness::new(MockOrderGateway::scripted([
        accepted(),
        rejected("not enough balance / allowance"),
    ]));
    h.list(Cadence::FifteenMinute, t0(), "s");
    h.list(Cadence::OneHour, t0(), "h");
    let mut runner = h.runner();

    // signal = 0.45 - 0.55 = -0.10
    h.prices.set_book("s-yes", dec!(0.44), dec!(0.46));
    h.prices.set_book("s-no", dec!(0.54), dec!(0.56));
    h.prices.set_book("h-yes", dec!(0.54), dec!(0.56));

    let report = runner.tick(t0()).await.unwrap();
    match report.rv {
        Some(RvOutcome::OpenFailed {
            unreconciled: Some(event),
        }) => {
            assert_eq!(event.phase, RvPhase::Open);
            assert_eq!(event.accepted.token_id, "s-yes");
            assert_eq!(event.rejected.token_id, "h-no");
        }
        other => panic!("expected unreconciled open, got {:?}", other),
    }
    assert!(!runner.state().rv.is_open());
    assert_eq!(runner.state().rv.last_action(), None);

    // No cooldown was started, so the next tick tries again.
    let report = runner.tick(t0() + TimeDelta::seconds(5)).await.unwrap();
    assert_eq!(report.rv, Some(RvOutcome::Opened));
    assert_eq!(h.placed_tokens(), vec!["s-yes", "h-no", "s-yes", "h-no"]);
}

#[tokio::test]
async fn momentum_trades_once_per_interval_without_hourly_market() {
    let h = Harness::new(MockOrderGateway::new());
    let first = Utc.with_ymd_and_hms(2025, 10, 19, 19, 10, 30).unwrap();
    let next_interval = Utc.with_ymd_and_hms(2025, 10, 19, 19, 26, 0).unwrap();
    h.list(Cadence::FifteenMinute, first, "a");
    h.list(Cadence::FifteenMinute, next_interval, "b");
    let mut runner = h.runner();

    h.prices.set_book("a-yes", dec!(0.30), dec!(0.32));
    h.prices.set_book("a-no", dec!(0.66), dec!(0.68));
    h.prices.set_book("b-yes", dec!(0.81), dec!(0.83));
    h.prices.set_book("b-no", dec!(0.15), dec!(0.17));

    let report = runner.tick(first).await.unwrap();
    assert_eq!(report.outcome, TickOutcome::Ok);
    assert!(matches!(
        report.momentum,
        Some(MomentumOutcome::Bought {
            outcome: Outcome::No,
            ..
        })
    ));
    assert_eq!(report.rv, Some(RvOutcome::Skipped(SkipReason::LongMarketMissing)));

    runner.tick(first + TimeDelta::seconds(60)).await.unwrap();
    runner.tick(first + TimeDelta::seconds(120)).await.unwrap();
    assert_eq!(h.placed_tokens(), vec!["a-no"]);

    // Minute 11 of the next interval, new market.
    let report = runner.tick(next_interval).await.unwrap();
    assert!(matches!(
        report.momentum,
        Some(MomentumOutcome::Bought {
            outcome: Outcome::Yes,
            ..
        })
    ));
    assert_eq!(h.placed_tokens(), vec!["a-no", "b-yes"]);
}

#[tokio::test]
async fn unresolved_short_market_skips_and_backs_off() {
    let h = Harness::new(MockOrderGateway::new());
    h.list(Cadence::OneHour, t0(), "h");
    let mut runner = h.runner();

    let report = runner.tick(t0()).await.unwrap();
    assert_eq!(report.outcome, TickOutcome::Skip);
    assert_eq!(
        report.outcome.delay(runner.timing()),
        std::time::Duration::from_secs(10)
    );
    assert!(h.gateway.placed().is_empty());
}

#[tokio::test]
async fn directory_outage_is_not_fatal() {
    let h = Harness::new(MockOrderGateway::new());
    h.list(Cadence::FifteenMinute, t0(), "s");
    h.directory.set_fail(true);
    let mut runner = h.runner();

    let report = runner.tick(t0()).await.unwrap();
    assert_eq!(report.outcome, TickOutcome::Skip);

    h.directory.set_fail(false);
    let report = runner.tick(t0()).await.unwrap();
    assert_eq!(report.outcome, TickOutcome::Ok);
}

#[tokio::test]
async fn dry_run_gateway_opens_without_network() {
    let directory = MockDirectory::new();
    let prices = MockPriceSource::new();
    for (cadence, prefix) in [(Cadence::FifteenMinute, "s"), (Cadence::OneHour, "h")] {
        let slug = market_slug(cadence, t0()).unwrap();
        let yes = format!("{}-yes", prefix);
        let no = format!("{}-no", prefix);
        directory.insert_market(&slug, "q", &[yes.as_str(), no.as_str()]);
    }
    prices.set_book("s-yes", dec!(0.69), dec!(0.71));
    prices.set_book("h-yes", dec!(0.54), dec!(0.56));

    let config = Config {
        dry_run: true,
        ..Config::default()
    };
    let mut runner = Runner::new(&config, directory, prices, SimulatedGateway::new());

    let report = runner.tick(t0()).await.unwrap();
    assert_eq!(report.rv, Some(RvOutcome::Opened));
    assert!(runner.state().rv.is_open());
}

#[tokio::test]
async fn status_endpoint_reflects_loop_state() {
    let h = Harness::new(MockOrderGateway::new());
    h.list(Cadence::FifteenMinute, t0(), "s");
    h.list(Cadence::OneHour, t0(), "h");
    h.prices.set_book("s-yes", dec!(0.69), dec!(0.71));
    h.prices.set_book("h-yes", dec!(0.54), dec!(0.56));

    let state = AppState::new();
    let mut runner = h.runner().with_status(state.clone());

    let report = runner.tick(t0()).await.unwrap();
    runner.record(t0(), report.outcome, Some(&report)).await;

    let response = create_router(state)
        .oneshot(
            Request::builder()
                .uri("/api/v1/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "running");
    assert_eq!(json["short_slug"], "btc-updown-15m-1760900400");
    assert_eq!(json["rv"]["is_open"], true);
    assert_eq!(json["rv"]["short_leg"]["outcome"], "no");
    assert_eq!(json["counters"]["ok"], 1);
}
