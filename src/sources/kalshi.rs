//! Kalshi daily totals via a third-party analytics snapshot feed.
//!
//! Kalshi only publishes complete-day figures, so the latest usable value is
//! always the prior trading day (T+1 publication). Snapshots carry cumulative
//! totals plus precomputed daily changes; when a change field is absent the
//! daily value is derived from consecutive cumulatives.

use crate::http::{FetchError, RetryingClient};
use crate::models::{
    Auxiliary, KalshiSnapshot, KalshiSnapshotsDoc, PlatformEstimate, PrimaryMetric, Status,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use url::Url;

pub const SNAPSHOTS_URL: &str = "https://www.kalshidata.com/api/analytics/historical-snapshots";

/// Robinhood mirrors roughly half of Kalshi's contract flow; the inferred
/// figure is published alongside the main value.
pub const ROBINHOOD_RATIO: f64 = 0.5;

#[async_trait]
pub trait SnapshotFeed {
    async fn historical_snapshots(&self) -> Result<Vec<KalshiSnapshot>, FetchError>;
}

#[async_trait]
impl SnapshotFeed for RetryingClient {
    async fn historical_snapshots(&self) -> Result<Vec<KalshiSnapshot>, FetchError> {
        let url = Url::parse(SNAPSHOTS_URL)?;
        let doc: KalshiSnapshotsDoc = self.get_json(&url).await?;
        Ok(doc.snapshots)
    }
}

/// Snapshots published before the local today, sorted by date ascending.
pub fn published_before(snapshots: &[KalshiSnapshot], today_local: NaiveDate) -> Vec<KalshiSnapshot> {
    let mut published: Vec<KalshiSnapshot> = snapshots
        .iter()
        .filter(|s| s.date.is_some_and(|d| d < today_local))
        .cloned()
        .collect();
    published.sort_by_key(|s| s.date);
    published
}

/// Latest published day in contract terms.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractsDaily {
    pub published_date: NaiveDate,
    pub contracts: i64,
    pub cumulative_contracts: i64,
    pub robinhood_inferred: i64,
}

/// Reduce the published series to the latest day's contract count. `None`
/// when no daily change can be established.
pub fn contracts_daily(published: &[KalshiSnapshot]) -> Option<ContractsDaily> {
    let latest = published.last()?;
    let date = latest.date?;

    let change = latest.total_contracts_traded_change.or_else(|| {
        let prev = published.len().checked_sub(2).map(|i| &published[i])?;
        Some(
            latest.total_contracts_traded.unwrap_or(0.0)
                - prev.total_contracts_traded.unwrap_or(0.0),
        )
    })?;

    let contracts = change.round() as i64;
    Some(ContractsDaily {
        published_date: date,
        contracts,
        cumulative_contracts: latest.total_contracts_traded.unwrap_or(0.0).round() as i64,
        robinhood_inferred: (contracts as f64 * ROBINHOOD_RATIO).round() as i64,
    })
}

/// Latest published day in USD terms (used by the history series).
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeDaily {
    pub published_date: NaiveDate,
    pub usd_change: f64,
}

pub fn volume_daily(published: &[KalshiSnapshot]) -> Option<VolumeDaily> {
    let latest = published.last()?;
    let date = latest.date?;

    let change = latest.trading_volume_change.or_else(|| {
        let prev = published.len().checked_sub(2).map(|i| &published[i])?;
        Some(latest.trading_volume.unwrap_or(0.0) - prev.trading_volume.unwrap_or(0.0))
    })?;

    Some(VolumeDaily {
        published_date: date,
        usd_change: (change * 100.0).round() / 100.0,
    })
}

/// Full estimate for the today snapshot, contract-denominated.
pub fn today_estimate(daily: Option<&ContractsDaily>) -> PlatformEstimate {
    let Some(d) = daily else {
        return PlatformEstimate {
            primary: PrimaryMetric {
                name: "latest published day traded contract volume".to_string(),
                value: None,
                unit: "unavailable".to_string(),
                source_metric: "n/a".to_string(),
            },
            derived: json!({
                "method": "missing",
                "published_date": null,
                "robinhood_inferred_contracts": null,
            }),
            auxiliary: Auxiliary::default(),
            status: Status::Missing,
            note: "Kalshi analytics feed returned no usable published snapshot.".to_string(),
        };
    };

    PlatformEstimate {
        primary: PrimaryMetric {
            name: "latest published day traded contract volume".to_string(),
            value: Some(d.contracts as f64),
            unit: "contracts (integer)".to_string(),
            source_metric: "kalshidata historical-snapshots.total_contracts_traded_change"
                .to_string(),
        },
        derived: json!({
            "method": "published_daily_t_plus_1",
            "published_date": d.published_date,
            "total_contracts_traded_cum": d.cumulative_contracts,
            "robinhood_inferred_contracts": d.robinhood_inferred,
        }),
        auxiliary: Auxiliary {
            new_market_count: None,
            new_contract_listing_count: None,
            robinhood_inferred_contracts: Some(d.robinhood_inferred),
        },
        status: Status::Ok,
        note: format!(
            "Published daily figure (T+1): latest reported trading day {} totals {} contracts; \
             Robinhood inferred {} (= Kalshi x {}, integer).",
            d.published_date, d.contracts, d.robinhood_inferred, ROBINHOOD_RATIO
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(date: &str) -> KalshiSnapshot {
        KalshiSnapshot {
            date: Some(date.parse().unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn test_published_before_excludes_today_and_sorts() {
        let today: NaiveDate = "2026-08-29".parse().unwrap();
        let snapshots = vec![snap("2026-08-29"), snap("2026-08-27"), snap("2026-08-28")];
        let published = published_before(&snapshots, today);
        let dates: Vec<String> = published
            .iter()
            .map(|s| s.date.unwrap().to_string())
            .collect();
        assert_eq!(dates, vec!["2026-08-27", "2026-08-28"]);
    }

    #[test]
    fn test_contracts_daily_from_cumulative_difference() {
        // D1 < D2 with cumulatives 100 and 150 and no change field:
        // the daily change is 50 and the Robinhood inference 25.
        let mut d1 = snap("2026-08-27");
        d1.total_contracts_traded = Some(100.0);
        let mut d2 = snap("2026-08-28");
        d2.total_contracts_traded = Some(150.0);

        let daily = contracts_daily(&[d1, d2]).unwrap();
        assert_eq!(daily.contracts, 50);
        assert_eq!(daily.robinhood_inferred, 25);
        assert_eq!(daily.published_date.to_string(), "2026-08-28");
        assert_eq!(daily.cumulative_contracts, 150);
    }

    #[test]
    fn test_contracts_daily_prefers_published_change() {
        let mut d1 = snap("2026-08-27");
        d1.total_contracts_traded = Some(100.0);
        let mut d2 = snap("2026-08-28");
        d2.total_contracts_traded = Some(150.0);
        d2.total_contracts_traded_change = Some(42.0);

        let daily = contracts_daily(&[d1, d2]).unwrap();
        assert_eq!(daily.contracts, 42);
        assert_eq!(daily.robinhood_inferred, 21);
    }

    #[test]
    fn test_contracts_daily_single_snapshot_without_change_is_none() {
        let mut only = snap("2026-08-28");
        only.total_contracts_traded = Some(150.0);
        assert_eq!(contracts_daily(&[only]), None);
        assert_eq!(contracts_daily(&[]), None);
    }

    #[test]
    fn test_volume_daily_fallback_and_rounding() {
        let mut d1 = snap("2026-08-27");
        d1.trading_volume = Some(1000.004);
        let mut d2 = snap("2026-08-28");
        d2.trading_volume = Some(1500.009);

        let daily = volume_daily(&[d1, d2]).unwrap();
        assert_eq!(daily.usd_change, 500.01);

        let mut with_change = snap("2026-08-28");
        with_change.trading_volume_change = Some(321.0);
        let daily = volume_daily(&[with_change]).unwrap();
        assert_eq!(daily.usd_change, 321.0);
    }

    #[test]
    fn test_today_estimate_missing_variant() {
        let est = today_estimate(None);
        assert_eq!(est.status, Status::Missing);
        assert_eq!(est.primary.value, None);
    }
}
