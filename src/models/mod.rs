use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

// ── Estimate status ───────────────────────────────────────────────────────────

/// Confidence level of a platform estimate.
///
/// `Ok` is an exact published figure, `Partial` an approximation that still
/// carries a value, `Missing` means no usable value could be obtained.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Partial,
    Missing,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => write!(f, "ok"),
            Status::Partial => write!(f, "partial"),
            Status::Missing => write!(f, "missing"),
        }
    }
}

// ── Crypto asset series ───────────────────────────────────────────────────────

/// One sampled day for a tracked asset. Field names follow the persisted
/// document format (camelCase).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub date: NaiveDate,
    pub timestamp: i64,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    #[serde(rename = "volume24h")]
    pub volume_24h: Option<f64>,
    pub circulating_supply: Option<f64>,
    // Lenient on these: legacy single-asset documents predate them.
    #[serde(default)]
    pub supply_metric: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub source_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AssetSeries {
    pub symbol: String,
    pub name: String,
    pub source: String,
    #[serde(default)]
    pub records: Vec<AssetRecord>,
}

/// Persisted crypto document: one series per tracked symbol.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CryptoStore {
    #[serde(default)]
    pub assets: BTreeMap<String, AssetSeries>,
    #[serde(rename = "lastUpdate", default)]
    pub last_update: String,
    #[serde(default)]
    pub source: String,
}

/// Mirror document kept for the legacy single-asset dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LegacyUsdcDoc {
    #[serde(default)]
    pub records: Vec<AssetRecord>,
    #[serde(rename = "lastUpdate", default)]
    pub last_update: String,
    #[serde(default)]
    pub source: String,
}

// ── Prediction-market daily history ───────────────────────────────────────────

/// One `(date, platform)` row of the daily history series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub platform: String,
    pub daily_total_value: Option<f64>,
    pub unit: String,
    pub source: String,
    pub method: String,
    pub status: Status,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coverage {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Persisted daily-history document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryDoc {
    pub dataset: String,
    pub timezone: String,
    pub generated_at: String,
    pub coverage: Coverage,
    pub records: Vec<DailyRecord>,
}

// ── Today snapshot report ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryMetric {
    pub name: String,
    pub value: Option<f64>,
    pub unit: String,
    pub source_metric: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Auxiliary {
    pub new_market_count: Option<u64>,
    pub new_contract_listing_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub robinhood_inferred_contracts: Option<i64>,
}

/// In-memory estimate for one platform, flattened into `DailyRecord` when
/// persisted by the history job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEstimate {
    pub primary: PrimaryMetric,
    pub derived: Value,
    pub auxiliary: Auxiliary,
    pub status: Status,
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportWindow {
    pub start_local: String,
    pub end_local: String,
    pub start_utc: String,
    pub end_utc: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDefinition {
    pub primary: String,
    pub auxiliary: String,
    pub note: String,
}

/// The full "prediction markets today" snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodayReport {
    pub metric: String,
    pub timezone: String,
    pub date_local: NaiveDate,
    pub window: ReportWindow,
    pub generated_at: String,
    pub definition: ReportDefinition,
    pub platforms: BTreeMap<String, PlatformEstimate>,
    pub completeness: String,
}

// ── Timeline documents ────────────────────────────────────────────────────────

/// A social-media comment attached to a timeline event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub text_en: String,
    #[serde(default)]
    pub text_zh: String,
    #[serde(default)]
    pub likes: Option<i64>,
}

/// One timeline event. Only the fields this tool touches are typed; everything
/// else passes through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    #[serde(default)]
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TimelineDoc {
    #[serde(default)]
    pub meta: Map<String, Value>,
    #[serde(default)]
    pub events: Vec<TimelineEvent>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Seed file mapping status ids to candidate comments.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CommentSeed {
    #[serde(default)]
    pub by_status_id: std::collections::HashMap<String, Vec<Comment>>,
}

// ── Raw upstream rows ─────────────────────────────────────────────────────────

/// CoinGecko `/coins/markets` row (only the fields we read).
#[derive(Debug, Clone, Deserialize)]
pub struct CoinMarketRow {
    pub id: String,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub total_volume: Option<f64>,
    pub circulating_supply: Option<f64>,
}

/// Polymarket Gamma market row.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct GammaMarket {
    #[serde(rename = "volume24hr", default)]
    pub volume_24hr: Option<f64>,
}

/// Manifold `v0/bets` row.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ManifoldBet {
    #[serde(rename = "createdTime", default)]
    pub created_time: Option<i64>,
    #[serde(default)]
    pub shares: Option<f64>,
    #[serde(rename = "contractId", default)]
    pub contract_id: Option<String>,
}

/// Manifold `v0/markets` row.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ManifoldMarket {
    #[serde(rename = "createdTime", default)]
    pub created_time: Option<i64>,
    #[serde(rename = "outcomeType", default)]
    pub outcome_type: Option<String>,
}

/// One published day from the Kalshi analytics snapshot feed.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct KalshiSnapshot {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub trading_volume: Option<f64>,
    #[serde(default)]
    pub trading_volume_change: Option<f64>,
    #[serde(default)]
    pub total_contracts_traded: Option<f64>,
    #[serde(default)]
    pub total_contracts_traded_change: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct KalshiSnapshotsDoc {
    #[serde(default)]
    pub snapshots: Vec<KalshiSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Status::Partial).unwrap(), "\"partial\"");
        assert_eq!(
            serde_json::from_str::<Status>("\"missing\"").unwrap(),
            Status::Missing
        );
    }

    #[test]
    fn test_asset_record_uses_document_field_names() {
        let rec = AssetRecord {
            date: NaiveDate::from_ymd_opt(2026, 8, 29).unwrap(),
            timestamp: 1_787_000_000,
            price: Some(1.0),
            market_cap: Some(42.0),
            volume_24h: Some(7.0),
            circulating_supply: Some(41.0),
            supply_metric: "circulating_supply".into(),
            source: "CoinGecko".into(),
            source_url: "https://api.coingecko.com/api/v3/coins/markets".into(),
        };
        let v = serde_json::to_value(&rec).unwrap();
        assert!(v.get("marketCap").is_some());
        assert!(v.get("volume24h").is_some());
        assert!(v.get("circulatingSupply").is_some());
        assert_eq!(v["date"], "2026-08-29");
    }

    #[test]
    fn test_timeline_event_roundtrips_unknown_fields() {
        let raw = r#"{"source":"https://x.com/a/status/123","title":"launch","year":2024}"#;
        let ev: TimelineEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(ev.extra["title"], "launch");
        let back = serde_json::to_value(&ev).unwrap();
        assert_eq!(back["year"], 2024);
        assert!(back.get("comments").is_none());
    }
}
