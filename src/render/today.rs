//! Static HTML snapshot of the "prediction markets today" report.

use crate::models::{PlatformEstimate, TodayReport};
use crate::render::{escape_html, fmt_value};
use crate::utils::fmt_number;

const CARD_ORDER: [&str; 3] = ["Polymarket", "Manifold", "Kalshi"];

/// Render the full report page. Inline CSS only, no client logic.
pub fn today_page(report: &TodayReport) -> String {
    let cards: String = CARD_ORDER
        .iter()
        .filter_map(|name| report.platforms.get(*name).map(|est| card(name, est)))
        .collect();

    format!(
        r#"<!doctype html>
<html lang='en'>
<head>
<meta charset='utf-8'>
<meta name='viewport' content='width=device-width, initial-scale=1'>
<title>Prediction markets daily (primary metric: today traded contract volume)</title>
<style>
body{{font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;max-width:980px;margin:0 auto;padding:14px;background:#fafafa;color:#111}}
.h{{font-size:20px;font-weight:700;margin:6px 0 10px}}
.meta{{font-size:13px;color:#444;margin-bottom:10px}}
.box{{background:#fff;border:1px solid #e6e6e6;border-radius:12px;padding:12px;margin:10px 0;line-height:1.45}}
.grid{{display:grid;grid-template-columns:1fr;gap:10px}}
.card{{background:#fff;border:1px solid #e7e7e7;border-radius:12px;padding:12px}}
.card h3{{margin:0 0 8px;font-size:16px;display:flex;justify-content:space-between;align-items:center}}
.card.kalshi{{border:2px solid #9b5cff;background:linear-gradient(180deg,#faf6ff,#fff)}}
.focus{{display:inline-block;font-size:11px;color:#6b2bd9;background:#f1e8ff;border:1px solid #d6bfff;border-radius:999px;padding:3px 8px;margin-bottom:6px}}
.big{{font-size:28px;font-weight:800;line-height:1.1;word-break:break-word}}
.sub{{font-size:12px;color:#666;margin-top:2px;margin-bottom:8px;word-break:break-word}}
ul{{padding-left:18px;margin:6px 0 0}} li{{margin:4px 0;font-size:13px;line-height:1.45}}
.tag{{font-size:11px;padding:2px 6px;border-radius:999px;border:1px solid #ddd;background:#f7f7f7}}
.tag.partial{{background:#fff6e8;border-color:#f1d39f}} .tag.missing{{background:#ffeef0;border-color:#ffccd5}} .tag.ok{{background:#eaf7ea;border-color:#bce0bc}}
@media (min-width: 860px){{.grid{{grid-template-columns:1fr 1fr 1fr}}}}
</style>
</head>
<body>
<div class='h'>Prediction markets daily: primary metric = today traded contract volume</div>
<div class='meta'>Date: <b>{date}</b> | Generated: {generated} | Completeness: {completeness}</div>
<div class='box'><b>Methodology</b>:
the primary metric is "today traded contract volume". Kalshi uses the published daily
figure (<b>T+1</b>): the latest fully reported trading day in integer contracts, with its
date shown; the Robinhood figure is inferred (Kalshi x 0.5, integer). Units differ across
platforms, so <b>values are never summed cross-platform</b>.
</div>
<div class='grid'>{cards}</div>
</body></html>"#,
        date = report.date_local,
        generated = escape_html(&report.generated_at),
        completeness = escape_html(&report.completeness),
        cards = cards,
    )
}

fn card(name: &str, est: &PlatformEstimate) -> String {
    let value = match est.primary.value {
        None => "unavailable".to_string(),
        Some(v) if name == "Kalshi" => fmt_number(v.round() as i64),
        Some(v) => fmt_value(v),
    };

    let (class, focus) = if name == "Kalshi" {
        (
            "card kalshi",
            "<div class='focus'>Kalshi headline value</div>",
        )
    } else {
        ("card", "")
    };

    let mut extra_lines = String::new();
    if name == "Kalshi" {
        if let Some(date) = est.derived.get("published_date").and_then(|v| v.as_str()) {
            extra_lines.push_str(&format!(
                "<li><b>Published trading day:</b> {}</li>\n    ",
                escape_html(date)
            ));
        }
        if let Some(rh) = est.auxiliary.robinhood_inferred_contracts {
            extra_lines.push_str(&format!(
                "<li><b>Robinhood inferred:</b> {} contracts (= Kalshi x 0.5, integer)</li>\n    ",
                fmt_number(rh)
            ));
        }
    }

    format!(
        r#"
<section class='{class}'>
  <h3>{name} <span class='tag {status}'>{status}</span></h3>
  {focus}
  <div class='big'>{value}</div>
  <div class='sub'>{unit}</div>
  <ul>
    <li><b>Primary metric source:</b> {source_metric}</li>
    <li><b>Aux - new markets:</b> {new_markets}</li>
    <li><b>Aux - new contract listings:</b> {new_listings}</li>
    {extra_lines}<li><b>Note:</b> {note}</li>
  </ul>
</section>
"#,
        class = class,
        name = escape_html(name),
        status = est.status,
        focus = focus,
        value = value,
        unit = escape_html(&est.primary.unit),
        source_metric = escape_html(&est.primary.source_metric),
        new_markets = opt_count(est.auxiliary.new_market_count),
        new_listings = opt_count(est.auxiliary.new_contract_listing_count),
        extra_lines = extra_lines,
        note = escape_html(&est.note),
    )
}

fn opt_count(v: Option<u64>) -> String {
    v.map_or("—".to_string(), |n| fmt_number(n as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Auxiliary, PrimaryMetric, ReportDefinition, ReportWindow, Status, TodayReport,
    };
    use serde_json::json;
    use std::collections::BTreeMap;

    fn estimate(value: Option<f64>, status: Status) -> PlatformEstimate {
        PlatformEstimate {
            primary: PrimaryMetric {
                name: "today traded contract volume".into(),
                value,
                unit: "contracts".into(),
                source_metric: "test".into(),
            },
            derived: json!({"published_date": "2026-08-28"}),
            auxiliary: Auxiliary {
                new_market_count: Some(3),
                new_contract_listing_count: None,
                robinhood_inferred_contracts: Some(25),
            },
            status,
            note: "a <note>".into(),
        }
    }

    fn report() -> TodayReport {
        let mut platforms = BTreeMap::new();
        platforms.insert("Polymarket".to_string(), estimate(Some(1234567.89), Status::Partial));
        platforms.insert("Manifold".to_string(), estimate(None, Status::Missing));
        platforms.insert("Kalshi".to_string(), estimate(Some(50.0), Status::Ok));
        TodayReport {
            metric: "today_traded_contract_volume_primary".into(),
            timezone: "Asia/Shanghai".into(),
            date_local: "2026-08-29".parse().unwrap(),
            window: ReportWindow {
                start_local: String::new(),
                end_local: String::new(),
                start_utc: String::new(),
                end_utc: String::new(),
            },
            generated_at: "2026-08-29T10:30:00+08:00".into(),
            definition: ReportDefinition {
                primary: String::new(),
                auxiliary: String::new(),
                note: String::new(),
            },
            platforms,
            completeness: "2/3".into(),
        }
    }

    #[test]
    fn test_today_page_renders_all_cards() {
        let html = today_page(&report());
        assert!(html.contains("Polymarket"));
        assert!(html.contains("1,234,567.89"));
        assert!(html.contains("class='tag missing'"));
        assert!(html.contains("card kalshi"));
        assert!(html.contains("Robinhood inferred:</b> 25 contracts"));
        assert!(html.contains("Published trading day:</b> 2026-08-28"));
        assert!(html.contains("Completeness: 2/3"));
        // Notes are escaped.
        assert!(html.contains("a &lt;note&gt;"));
    }

    #[test]
    fn test_missing_value_renders_placeholder() {
        let html = today_page(&report());
        assert!(html.contains("unavailable"));
    }
}
