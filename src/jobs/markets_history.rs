//! The rolling 90-day daily-history job.

use crate::config::AppConfig;
use crate::http::RetryingClient;
use crate::models::{Coverage, DailyRecord, HistoryDoc, Status};
use crate::render::history::history_page;
use crate::sources::kalshi::{self, SnapshotFeed};
use crate::sources::{manifold, polymarket};
use crate::store::{history_cutoff, read_doc, sort_daily, trim_history, upsert_daily, write_doc};
use crate::window::DayWindow;
use anyhow::Result;
use serde_json::json;
use tracing::{info, warn};

pub const JSON_FILE: &str = "prediction-markets-daily-history.json";
pub const HTML_FILE: &str = "prediction-markets-daily.html";

const POLYMARKET_UNIT: &str = "USDC(volume24hr sum, proxy)";
const MANIFOLD_UNIT: &str = "shares(today, paged)";
const KALSHI_UNIT: &str = "USD(trading_volume_change, T+1)";

/// Update the daily history series with today's estimates and rewrite the
/// JSON + chart page. Returns a one-line summary for the cron log.
pub async fn run(config: &AppConfig) -> Result<String> {
    let client = RetryingClient::new(&config.http)?;
    let window = DayWindow::today(config.report.tz()?)?;
    let today = window.date_local;

    let json_path = config.storage.data_path(JSON_FILE);
    let mut records: Vec<DailyRecord> = read_doc::<HistoryDoc>(&json_path)
        .map(|doc| doc.records)
        .unwrap_or_default();

    // Polymarket: today's 24h-volume proxy.
    let (p_val, p_status, p_method) = match polymarket::scan(&client).await {
        Ok(scan) => polymarket::history_value(&scan),
        Err(e) => {
            warn!("Polymarket estimator failed: {}", e);
            (None, Status::Missing, format!("Polymarket Gamma API failed: {}", e))
        }
    };
    upsert_daily(
        &mut records,
        DailyRecord {
            date: today,
            platform: "Polymarket".to_string(),
            daily_total_value: p_val,
            unit: POLYMARKET_UNIT.to_string(),
            source: polymarket::GAMMA_MARKETS_URL.to_string(),
            method: p_method,
            status: p_status,
        },
    );

    // Manifold: today's paged bets volume.
    let (m_val, m_status, m_method) = match manifold::scan_bets(&client, window.start_utc).await {
        Ok(scan) => manifold::history_value(&scan),
        Err(e) => {
            warn!("Manifold estimator failed: {}", e);
            (None, Status::Missing, format!("Manifold bets API failed: {}", e))
        }
    };
    upsert_daily(
        &mut records,
        DailyRecord {
            date: today,
            platform: "Manifold".to_string(),
            daily_total_value: m_val,
            unit: MANIFOLD_UNIT.to_string(),
            source: manifold::BETS_URL.to_string(),
            method: m_method,
            status: m_status,
        },
    );

    // Kalshi: latest published USD daily change (T+1), recorded under its
    // published date rather than today.
    let mut kalshi_published: Option<(chrono::NaiveDate, Option<f64>)> = None;
    match client.historical_snapshots().await {
        Ok(snapshots) => {
            let published = kalshi::published_before(&snapshots, today);
            if let Some(latest_date) = published.last().and_then(|s| s.date) {
                let daily = kalshi::volume_daily(&published);
                let (value, status, method) = match &daily {
                    Some(d) => (
                        Some(d.usd_change),
                        Status::Ok,
                        "published_daily_t_plus_1 from kalshidata \
                         historical-snapshots.trading_volume_change"
                            .to_string(),
                    ),
                    None => (
                        None,
                        Status::Missing,
                        "Kalshi trading volume daily change missing".to_string(),
                    ),
                };
                kalshi_published = Some((latest_date, value));
                upsert_daily(
                    &mut records,
                    DailyRecord {
                        date: latest_date,
                        platform: "Kalshi".to_string(),
                        daily_total_value: value,
                        unit: KALSHI_UNIT.to_string(),
                        source: kalshi::SNAPSHOTS_URL.to_string(),
                        method,
                        status,
                    },
                );
            } else {
                warn!("Kalshi: no published snapshots before {}", today);
            }
        }
        Err(e) => warn!("Kalshi estimator failed: {}", e),
    }

    sort_daily(&mut records);
    let cutoff = history_cutoff(today);
    let trimmed = trim_history(records, today);

    let doc = HistoryDoc {
        dataset: "prediction_markets_daily_history".to_string(),
        timezone: config.report.timezone.clone(),
        generated_at: window.now_local.to_rfc3339(),
        coverage: Coverage {
            start_date: cutoff,
            end_date: today,
        },
        records: trimmed,
    };

    write_doc(&json_path, &doc)?;
    std::fs::write(
        config.storage.root_path(HTML_FILE),
        history_page(&format!("./{}/{}", config.storage.data_dir, JSON_FILE)),
    )?;
    info!("History written: {} records in window", doc.records.len());

    let summary = json!({
        "date": today,
        "polymarket": p_val,
        "manifold": m_val,
        "kalshi_published_date": kalshi_published.as_ref().map(|(d, _)| d),
        "kalshi": kalshi_published.as_ref().and_then(|(_, v)| *v),
    });
    Ok(summary.to_string())
}
