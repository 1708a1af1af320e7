//! Manifold volume via the public `v0/bets` feed.
//!
//! Bets are paged backwards in time with `beforeTime` until a page reaches
//! past the window start or the page cap is hit. The estimate is the sum of
//! `abs(shares)` over bets created inside the window. The `v0/markets` feed
//! supplies the auxiliary new-listing counts.

use crate::http::{FetchError, RetryingClient, url_with_params};
use crate::models::{Auxiliary, ManifoldBet, ManifoldMarket, PlatformEstimate, PrimaryMetric, Status};
use crate::sources::round2;
use crate::window::DayWindow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::HashSet;
use tracing::info;

pub const BETS_URL: &str = "https://api.manifold.markets/v0/bets";
pub const MARKETS_URL: &str = "https://api.manifold.markets/v0/markets";
pub const PAGE_LIMIT: usize = 500;
pub const MAX_PAGES: usize = 4;
pub const MARKETS_PROBE_LIMIT: usize = 1000;

#[async_trait]
pub trait ManifoldApi {
    async fn bets_page(
        &self,
        limit: usize,
        before_time: Option<i64>,
    ) -> Result<Vec<ManifoldBet>, FetchError>;

    async fn recent_markets(&self, limit: usize) -> Result<Vec<ManifoldMarket>, FetchError>;
}

#[async_trait]
impl ManifoldApi for RetryingClient {
    async fn bets_page(
        &self,
        limit: usize,
        before_time: Option<i64>,
    ) -> Result<Vec<ManifoldBet>, FetchError> {
        let mut params = vec![("limit", limit.to_string())];
        if let Some(t) = before_time {
            params.push(("beforeTime", t.to_string()));
        }
        let url = url_with_params(BETS_URL, params)?;
        self.get_json(&url).await
    }

    async fn recent_markets(&self, limit: usize) -> Result<Vec<ManifoldMarket>, FetchError> {
        let url = url_with_params(MARKETS_URL, [("limit", limit.to_string())])?;
        self.get_json(&url).await
    }
}

#[derive(Debug, Clone, Default)]
pub struct ManifoldScan {
    pub volume: f64,
    pub bets_scanned: usize,
    pub traded_contracts: usize,
}

/// New listings created inside the window (auxiliary metrics).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NewListings {
    pub new_markets: u64,
    /// Binary markets list two contracts (YES/NO), everything else one.
    pub new_contract_listings: u64,
}

/// Page backwards through recent bets, summing `abs(shares)` for bets created
/// at or after the window start. Stops once a page reaches past the start.
pub async fn scan_bets(
    api: &impl ManifoldApi,
    start_utc: DateTime<Utc>,
) -> Result<ManifoldScan, FetchError> {
    let mut volume = 0.0;
    let mut bets_scanned = 0usize;
    let mut contracts: HashSet<String> = HashSet::new();
    let mut before: Option<i64> = None;

    for _ in 0..MAX_PAGES {
        let bets = api.bets_page(PAGE_LIMIT, before).await?;
        if bets.is_empty() {
            break;
        }
        bets_scanned += bets.len();

        let mut min_ts: Option<i64> = None;
        let mut reached_past_start = false;
        for bet in &bets {
            let ts = bet.created_time.unwrap_or(0);
            min_ts = Some(min_ts.map_or(ts, |m| m.min(ts)));
            if !in_or_after(ts, start_utc) {
                reached_past_start = true;
                continue;
            }
            volume += bet.shares.unwrap_or(0.0).abs();
            if let Some(id) = &bet.contract_id {
                contracts.insert(id.clone());
            }
        }

        before = min_ts.map(|m| m - 1);
        if reached_past_start || before.is_none() {
            break;
        }
    }

    info!(
        "Manifold: {} bets scanned, {} contracts touched",
        bets_scanned,
        contracts.len()
    );
    Ok(ManifoldScan {
        volume,
        bets_scanned,
        traded_contracts: contracts.len(),
    })
}

/// Count markets (and their contract listings) created inside the window.
pub async fn probe_new_listings(
    api: &impl ManifoldApi,
    start_utc: DateTime<Utc>,
) -> Result<NewListings, FetchError> {
    let markets = api.recent_markets(MARKETS_PROBE_LIMIT).await?;
    Ok(count_new_listings(&markets, start_utc))
}

pub fn count_new_listings(markets: &[ManifoldMarket], start_utc: DateTime<Utc>) -> NewListings {
    let mut out = NewListings::default();
    for m in markets {
        if !in_or_after(m.created_time.unwrap_or(0), start_utc) {
            continue;
        }
        out.new_markets += 1;
        let binary = m
            .outcome_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("BINARY"));
        out.new_contract_listings += if binary { 2 } else { 1 };
    }
    out
}

fn in_or_after(millis: i64, start_utc: DateTime<Utc>) -> bool {
    DateTime::<Utc>::from_timestamp_millis(millis).is_some_and(|t| t >= start_utc)
}

/// Value/status/method triple for the daily history row.
pub fn history_value(scan: &ManifoldScan) -> (Option<f64>, Status, String) {
    if scan.bets_scanned == 0 {
        return (
            None,
            Status::Missing,
            "Manifold bets API returned no bets".to_string(),
        );
    }
    (
        Some(round2(scan.volume)),
        Status::Partial,
        format!(
            "sum(abs(bets.shares)) from paged recent bets, scanned={}",
            scan.bets_scanned
        ),
    )
}

/// Full estimate for the today snapshot.
pub fn today_estimate(
    scan: &ManifoldScan,
    listings: &NewListings,
    window: &DayWindow,
) -> PlatformEstimate {
    let (value, status, note) = if scan.bets_scanned > 0 {
        (
            Some(round2(scan.volume)),
            Status::Partial,
            format!(
                "Paged {} bets and summed abs(shares) created on {} as an approximation.",
                scan.bets_scanned, window.date_local
            ),
        )
    } else {
        (
            None,
            Status::Missing,
            "Manifold bets API returned no bets.".to_string(),
        )
    };

    PlatformEstimate {
        primary: PrimaryMetric {
            name: "today traded contract volume".to_string(),
            value,
            unit: "shares(today, paged)".to_string(),
            source_metric: "sum(abs(bets.shares))".to_string(),
        },
        derived: json!({
            "traded_contract_entries": scan.traded_contracts,
            "bets_scanned": scan.bets_scanned,
        }),
        auxiliary: Auxiliary {
            new_market_count: Some(listings.new_markets),
            new_contract_listing_count: Some(listings.new_contract_listings),
            robinhood_inferred_contracts: None,
        },
        status,
        note,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Mutex;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 28, 16, 0, 0).unwrap()
    }

    fn bet(offset_secs: i64, shares: f64, contract: &str) -> ManifoldBet {
        ManifoldBet {
            created_time: Some((start().timestamp() + offset_secs) * 1000),
            shares: Some(shares),
            contract_id: Some(contract.to_string()),
        }
    }

    struct StubApi {
        bets: Mutex<Vec<Vec<ManifoldBet>>>,
        befores: Mutex<Vec<Option<i64>>>,
        markets: Vec<ManifoldMarket>,
    }

    #[async_trait]
    impl ManifoldApi for StubApi {
        async fn bets_page(
            &self,
            _limit: usize,
            before_time: Option<i64>,
        ) -> Result<Vec<ManifoldBet>, FetchError> {
            self.befores.lock().unwrap().push(before_time);
            let mut pages = self.bets.lock().unwrap();
            if pages.is_empty() {
                Ok(Vec::new())
            } else {
                Ok(pages.remove(0))
            }
        }

        async fn recent_markets(&self, _limit: usize) -> Result<Vec<ManifoldMarket>, FetchError> {
            Ok(self.markets.clone())
        }
    }

    fn stub(pages: Vec<Vec<ManifoldBet>>) -> StubApi {
        StubApi {
            bets: Mutex::new(pages),
            befores: Mutex::new(Vec::new()),
            markets: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_scan_sums_abs_shares_inside_window() {
        let api = stub(vec![vec![
            bet(100, 3.0, "a"),
            bet(200, -2.5, "b"),
            bet(300, 1.5, "a"),
        ]]);
        let scan = scan_bets(&api, start()).await.unwrap();
        assert!((scan.volume - 7.0).abs() < 1e-9);
        assert_eq!(scan.bets_scanned, 3);
        assert_eq!(scan.traded_contracts, 2);
    }

    #[tokio::test]
    async fn test_scan_stops_when_page_reaches_past_start() {
        // Second page would never be requested: the first already contains a
        // bet older than the window start.
        let api = stub(vec![
            vec![bet(100, 1.0, "a"), bet(-100, 9.0, "old")],
            vec![bet(50, 100.0, "never")],
        ]);
        let scan = scan_bets(&api, start()).await.unwrap();
        assert_eq!(api.befores.lock().unwrap().len(), 1);
        assert!((scan.volume - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_scan_pages_backwards_with_before_time() {
        let api = stub(vec![
            vec![bet(600, 1.0, "a"), bet(500, 1.0, "a")],
            vec![bet(400, 1.0, "b")],
        ]);
        let scan = scan_bets(&api, start()).await.unwrap();
        let befores = api.befores.lock().unwrap();
        assert_eq!(befores[0], None);
        // Next page asks strictly before the oldest seen bet.
        assert_eq!(befores[1], Some((start().timestamp() + 500) * 1000 - 1));
        assert_eq!(scan.bets_scanned, 3);
    }

    #[test]
    fn test_count_new_listings_binary_counts_double() {
        let mk = |offset: i64, outcome: &str| ManifoldMarket {
            created_time: Some((start().timestamp() + offset) * 1000),
            outcome_type: Some(outcome.to_string()),
        };
        let markets = vec![mk(10, "BINARY"), mk(20, "MULTIPLE_CHOICE"), mk(-10, "BINARY")];
        let listings = count_new_listings(&markets, start());
        assert_eq!(listings.new_markets, 2);
        assert_eq!(listings.new_contract_listings, 3);
    }

    #[test]
    fn test_history_value_missing_when_nothing_scanned() {
        let (value, status, _) = history_value(&ManifoldScan::default());
        assert_eq!(value, None);
        assert_eq!(status, Status::Missing);
    }
}
