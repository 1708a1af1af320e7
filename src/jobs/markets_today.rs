//! The "prediction markets today" snapshot job.

use crate::config::AppConfig;
use crate::http::{FetchError, RetryingClient};
use crate::models::{
    Auxiliary, PlatformEstimate, PrimaryMetric, ReportDefinition, ReportWindow, Status,
    TodayReport,
};
use crate::render::today::today_page;
use crate::sources::{kalshi, manifold, polymarket};
use crate::store::write_doc;
use crate::window::DayWindow;
use anyhow::Result;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{info, warn};

pub const JSON_FILE: &str = "prediction-markets-today.json";
pub const HTML_FILE: &str = "prediction-markets-today.html";

/// Run all three platform estimators and write the snapshot documents.
/// Returns the JSON payload for the cron log.
pub async fn run(config: &AppConfig) -> Result<String> {
    let client = RetryingClient::new(&config.http)?;
    let window = DayWindow::today(config.report.tz()?)?;

    let mut platforms: BTreeMap<String, PlatformEstimate> = BTreeMap::new();

    // A failed estimator becomes a missing entry; it never takes the
    // other platforms down with it.
    let poly = match polymarket::scan(&client).await {
        Ok(scan) => polymarket::today_estimate(&scan),
        Err(e) => failed_estimate("Polymarket", e),
    };
    platforms.insert("Polymarket".to_string(), poly);

    let mani = match manifold_estimate(&client, &window).await {
        Ok(est) => est,
        Err(e) => failed_estimate("Manifold", e),
    };
    platforms.insert("Manifold".to_string(), mani);

    let kal = match kalshi::SnapshotFeed::historical_snapshots(&client).await {
        Ok(snapshots) => {
            let published = kalshi::published_before(&snapshots, window.date_local);
            kalshi::today_estimate(kalshi::contracts_daily(&published).as_ref())
        }
        Err(e) => failed_estimate("Kalshi", e),
    };
    platforms.insert("Kalshi".to_string(), kal);

    let usable = platforms
        .values()
        .filter(|p| p.status != Status::Missing)
        .count();

    let report = TodayReport {
        metric: "today_traded_contract_volume_primary".to_string(),
        timezone: config.report.timezone.clone(),
        date_local: window.date_local,
        window: ReportWindow {
            start_local: window.start_local.to_rfc3339(),
            end_local: window.end_local.to_rfc3339(),
            start_utc: window.start_utc.to_rfc3339(),
            end_utc: window.end_utc.to_rfc3339(),
        },
        generated_at: window.now_local.to_rfc3339(),
        definition: ReportDefinition {
            primary: "today traded contract volume (Kalshi: published daily total, T+1)"
                .to_string(),
            auxiliary: "new markets / new contract listings (listing basis)".to_string(),
            note: "Kalshi shows the latest published trading day in integer contracts; \
                   Robinhood = Kalshi x 0.5 (integer); units differ across platforms and \
                   are never summed."
                .to_string(),
        },
        platforms,
        completeness: format!("{}/3", usable),
    };

    let payload = serde_json::to_string_pretty(&report)?;
    write_doc(&config.storage.data_path(JSON_FILE), &report)?;
    write_doc(&config.storage.root_path(JSON_FILE), &report)?;
    std::fs::write(config.storage.root_path(HTML_FILE), today_page(&report))?;

    info!("Today snapshot written, completeness {}", report.completeness);
    Ok(payload)
}

async fn manifold_estimate(
    client: &RetryingClient,
    window: &DayWindow,
) -> Result<PlatformEstimate, FetchError> {
    let scan = manifold::scan_bets(client, window.start_utc).await?;
    let listings = manifold::probe_new_listings(client, window.start_utc).await?;
    Ok(manifold::today_estimate(&scan, &listings, window))
}

/// Estimate emitted when a platform's fetch fails after all retries.
fn failed_estimate(platform: &str, err: FetchError) -> PlatformEstimate {
    warn!("{} estimator failed: {}", platform, err);
    PlatformEstimate {
        primary: PrimaryMetric {
            name: "today traded contract volume".to_string(),
            value: None,
            unit: "unavailable".to_string(),
            source_metric: "n/a".to_string(),
        },
        derived: json!({ "traded_contract_entries": null }),
        auxiliary: Auxiliary::default(),
        status: Status::Missing,
        note: format!("Still failing after retries: {}", err),
    }
}
