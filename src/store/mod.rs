//! JSON document persistence and merge operations.
//!
//! Documents are plain files under the data directory, read-modify-written by
//! a single cron-triggered process. Writes are plain overwrites (no atomic
//! rename); concurrent invocations of the same job are not supported.

use crate::models::{AssetRecord, DailyRecord};
use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::warn;

/// Days of history retained by the trim pass (today inclusive = 90 days).
pub const HISTORY_WINDOW_DAYS: i64 = 90;

// ── Document I/O ──────────────────────────────────────────────────────────────

/// Read a persisted document. A missing or malformed file yields `None` —
/// the caller starts fresh rather than failing the run.
pub fn read_doc<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let raw = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => return None,
    };
    match serde_json::from_str(&raw) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Malformed document {:?}, starting fresh: {}", path, e);
            None
        }
    }
}

/// Pretty-print a document to disk, creating parent directories as needed.
pub fn write_doc<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Could not create dir {:?}", parent))?;
    }
    let payload = serde_json::to_string_pretty(value)?;
    std::fs::write(path, payload).with_context(|| format!("Could not write {:?}", path))?;
    Ok(())
}

// ── Daily history merge ───────────────────────────────────────────────────────

/// Upsert by `(date, platform)`: replace the matching record or append.
/// Idempotent — applying the same record twice leaves one stored row.
pub fn upsert_daily(records: &mut Vec<DailyRecord>, rec: DailyRecord) {
    match records
        .iter_mut()
        .find(|r| r.date == rec.date && r.platform == rec.platform)
    {
        Some(existing) => *existing = rec,
        None => records.push(rec),
    }
}

/// Sort the series by `(date, platform)`.
pub fn sort_daily(records: &mut [DailyRecord]) {
    records.sort_by(|a, b| (a.date, &a.platform).cmp(&(b.date, &b.platform)));
}

/// First date kept by the retention window.
pub fn history_cutoff(today: NaiveDate) -> NaiveDate {
    today - Duration::days(HISTORY_WINDOW_DAYS - 1)
}

/// Retain only records inside the retention window that carry a value.
pub fn trim_history(records: Vec<DailyRecord>, today: NaiveDate) -> Vec<DailyRecord> {
    let cutoff = history_cutoff(today);
    records
        .into_iter()
        .filter(|r| r.date >= cutoff && r.daily_total_value.is_some())
        .collect()
}

// ── Asset series merge ────────────────────────────────────────────────────────

/// Upsert by date, then keep the series sorted by date ascending.
pub fn upsert_asset(records: &mut Vec<AssetRecord>, rec: AssetRecord) {
    match records.iter_mut().find(|r| r.date == rec.date) {
        Some(existing) => *existing = rec,
        None => records.push(rec),
    }
    records.sort_by_key(|r| r.date);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;

    fn daily(date: &str, platform: &str, value: Option<f64>) -> DailyRecord {
        DailyRecord {
            date: date.parse().unwrap(),
            platform: platform.to_string(),
            daily_total_value: value,
            unit: "contracts".into(),
            source: "test".into(),
            method: "test".into(),
            status: if value.is_some() { Status::Partial } else { Status::Missing },
        }
    }

    fn asset(date: &str, price: f64) -> AssetRecord {
        AssetRecord {
            date: date.parse().unwrap(),
            timestamp: 0,
            price: Some(price),
            market_cap: None,
            volume_24h: None,
            circulating_supply: None,
            supply_metric: "circulating_supply".into(),
            source: "CoinGecko".into(),
            source_url: "https://api.coingecko.com/api/v3/coins/markets".into(),
        }
    }

    #[test]
    fn test_upsert_daily_is_idempotent() {
        let mut records = vec![daily("2026-08-01", "Kalshi", Some(1.0))];
        let rec = daily("2026-08-01", "Kalshi", Some(2.0));
        upsert_daily(&mut records, rec.clone());
        upsert_daily(&mut records, rec.clone());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].daily_total_value, Some(2.0));
    }

    #[test]
    fn test_upsert_daily_keys_on_date_and_platform() {
        let mut records = vec![daily("2026-08-01", "Kalshi", Some(1.0))];
        upsert_daily(&mut records, daily("2026-08-01", "Polymarket", Some(3.0)));
        upsert_daily(&mut records, daily("2026-08-02", "Kalshi", Some(4.0)));
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn test_sort_daily_orders_by_date_then_platform() {
        let mut records = vec![
            daily("2026-08-02", "Manifold", Some(1.0)),
            daily("2026-08-01", "Polymarket", Some(1.0)),
            daily("2026-08-01", "Kalshi", Some(1.0)),
        ];
        sort_daily(&mut records);
        assert_eq!(records[0].platform, "Kalshi");
        assert_eq!(records[1].platform, "Polymarket");
        assert_eq!(records[2].date.to_string(), "2026-08-02");
    }

    #[test]
    fn test_trim_drops_old_and_null_records() {
        let today: NaiveDate = "2026-08-29".parse().unwrap();
        let cutoff = history_cutoff(today);
        assert_eq!(cutoff, today - Duration::days(89));

        let records = vec![
            daily(&cutoff.to_string(), "Kalshi", Some(1.0)),
            daily(&(cutoff - Duration::days(1)).to_string(), "Kalshi", Some(1.0)),
            daily("2026-08-29", "Manifold", None),
            daily("2026-08-29", "Polymarket", Some(2.0)),
        ];
        let trimmed = trim_history(records, today);
        assert_eq!(trimmed.len(), 2);
        assert!(trimmed.iter().all(|r| r.daily_total_value.is_some()));
        assert!(trimmed.iter().all(|r| r.date >= cutoff));
    }

    #[test]
    fn test_upsert_asset_keeps_series_sorted() {
        let mut records = vec![asset("2026-08-02", 1.0)];
        upsert_asset(&mut records, asset("2026-08-01", 2.0));
        upsert_asset(&mut records, asset("2026-08-01", 3.0));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date.to_string(), "2026-08-01");
        assert_eq!(records[0].price, Some(3.0));
    }

    #[test]
    fn test_read_doc_handles_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        assert!(read_doc::<Vec<DailyRecord>>(&path).is_none());

        std::fs::write(&path, "{not json").unwrap();
        assert!(read_doc::<Vec<DailyRecord>>(&path).is_none());

        let records = vec![daily("2026-08-01", "Kalshi", Some(1.0))];
        write_doc(&path, &records).unwrap();
        let back: Vec<DailyRecord> = read_doc(&path).unwrap();
        assert_eq!(back, records);
    }
}
