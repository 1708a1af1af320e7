//! Crypto asset series update + text report.

use crate::config::AppConfig;
use crate::http::RetryingClient;
use crate::models::{AssetSeries, CoinMarketRow, CryptoStore, LegacyUsdcDoc};
use crate::render;
use crate::sources::coingecko::{self, SOURCE_NAME, TRACKED_COINS};
use crate::store::{read_doc, upsert_asset, write_doc};
use crate::window::DayWindow;
use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::HashMap;
use tracing::{info, warn};

pub const STORE_FILE: &str = "crypto-data.json";
/// Older dashboards read a single-asset USDC document from these names.
pub const LEGACY_USDC_FILES: [&str; 2] = ["usdc-data.json", "data.json"];
pub const REPORT_FILE: &str = "crypto-daily-report-latest.txt";

/// `crypto-update`: sample CoinGecko once and upsert today's record for every
/// tracked asset.
pub async fn update(config: &AppConfig) -> Result<()> {
    let client = RetryingClient::new(&config.http)?;
    let window = DayWindow::today(config.report.tz()?)?;

    let store_path = config.storage.root_path(STORE_FILE);
    let mut store = read_doc(&store_path).unwrap_or_else(|| init_store(config));

    let rows = coingecko::fetch_markets(&client)
        .await
        .context("CoinGecko markets fetch failed")?;
    let by_id: HashMap<&str, &CoinMarketRow> = rows.iter().map(|r| (r.id.as_str(), r)).collect();

    let now = Utc::now();
    for coin in TRACKED_COINS {
        let Some(row) = by_id.get(coin.id) else {
            warn!("{}: no row in CoinGecko response, keeping stale data", coin.symbol);
            continue;
        };
        let rec = coingecko::record_for(coin, row, window.date_local, now.timestamp());
        let series = store
            .assets
            .entry(coin.symbol.to_string())
            .or_insert_with(|| AssetSeries {
                symbol: coin.symbol.to_string(),
                name: coin.name.to_string(),
                source: SOURCE_NAME.to_string(),
                records: Vec::new(),
            });
        series.source = SOURCE_NAME.to_string();
        upsert_asset(&mut series.records, rec);
        info!("{}: {} records", coin.symbol, series.records.len());
    }

    store.last_update = now.to_rfc3339();
    store.source = SOURCE_NAME.to_string();
    write_doc(&store_path, &store)?;

    // Keep the legacy USDC-only documents in sync.
    if let Some(usdc) = store.assets.get("USDC") {
        let legacy = LegacyUsdcDoc {
            records: usdc.records.clone(),
            last_update: store.last_update.clone(),
            source: usdc.source.clone(),
        };
        for name in LEGACY_USDC_FILES {
            write_doc(&config.storage.root_path(name), &legacy)?;
        }
    }

    info!("Updated {:?} at {}", store_path, store.last_update);
    Ok(())
}

/// First run: seed the store, importing any legacy USDC document found.
fn init_store(config: &AppConfig) -> CryptoStore {
    let mut store = CryptoStore::default();
    for coin in TRACKED_COINS {
        store.assets.insert(
            coin.symbol.to_string(),
            AssetSeries {
                symbol: coin.symbol.to_string(),
                name: coin.name.to_string(),
                source: SOURCE_NAME.to_string(),
                records: Vec::new(),
            },
        );
    }

    for name in LEGACY_USDC_FILES {
        let Some(legacy) = read_doc::<LegacyUsdcDoc>(&config.storage.root_path(name)) else {
            continue;
        };
        if legacy.records.is_empty() {
            continue;
        }
        info!("Migrating {} legacy USDC records from {}", legacy.records.len(), name);
        if let Some(series) = store.assets.get_mut("USDC") {
            series.records = legacy.records;
            for rec in &mut series.records {
                if rec.supply_metric.is_empty() {
                    rec.supply_metric = TRACKED_COINS[0].supply_metric.to_string();
                }
            }
        }
        break;
    }

    store
}

/// `crypto-report`: render the latest stored values as a plain-text summary.
pub fn report(config: &AppConfig) -> Result<String> {
    let tz = config.report.tz()?;
    let store: CryptoStore = read_doc(&config.storage.root_path(STORE_FILE))
        .with_context(|| format!("{} missing or malformed; run crypto-update first", STORE_FILE))?;

    let now_label = Utc::now()
        .with_timezone(&tz)
        .format("%Y-%m-%d %H:%M")
        .to_string();
    let text = render::crypto_report(&store, &now_label, &config.report.timezone);

    let out_path = config.storage.data_path(REPORT_FILE);
    std::fs::create_dir_all(out_path.parent().context("report path has no parent")?)?;
    std::fs::write(&out_path, &text).with_context(|| format!("Could not write {:?}", out_path))?;

    info!("Wrote {:?}", out_path);
    Ok(text)
}
