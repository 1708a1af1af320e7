//! Pure renderers: report structures in, strings out. No I/O here.

pub mod history;
pub mod today;

use crate::models::CryptoStore;
use crate::utils::fmt_number;

pub const DASHBOARD_URL: &str = "https://davidxuanluo.github.io/statichtml/crypto-dashboard.html";

/// Format a metric value with thousands separators, trimming to at most two
/// decimals ("1234567.5" -> "1,234,567.5").
pub fn fmt_value(v: f64) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    let whole = fmt_number(rounded.trunc() as i64);
    let frac = (rounded.fract().abs() * 100.0).round() as i64;
    if frac == 0 {
        whole
    } else if frac % 10 == 0 {
        format!("{}.{}", whole, frac / 10)
    } else {
        format!("{}.{:02}", whole, frac)
    }
}

fn fmt_price(symbol: &str, price: Option<f64>) -> String {
    match price {
        None => "--".to_string(),
        Some(p) if symbol == "USDC" || symbol == "USDT" => format!("{:.4}", p),
        Some(p) => fmt_value(p),
    }
}

fn fmt_big(v: Option<f64>) -> String {
    match v {
        None => "--".to_string(),
        Some(v) => fmt_number(v.round() as i64),
    }
}

/// Plain-text daily summary of the crypto store, one line per tracked asset.
pub fn crypto_report(store: &CryptoStore, now_label: &str, tz_label: &str) -> String {
    let mut lines = Vec::new();
    lines.push(format!("# Crypto daily report {} ({})", now_label, tz_label));

    for symbol in ["USDC", "USDT", "BTC", "ETH"] {
        let Some(series) = store.assets.get(symbol) else {
            continue;
        };
        let Some(rec) = series.records.last() else {
            continue;
        };
        lines.push(format!(
            "- {}: price ${}, supply {}, 24h volume ${}, source {}",
            symbol,
            fmt_price(symbol, rec.price),
            fmt_big(rec.circulating_supply),
            fmt_big(rec.volume_24h),
            rec.source,
        ));
    }

    lines.push(format!("- dashboard: {}", DASHBOARD_URL));
    lines.join("\n")
}

/// Minimal HTML escaping for text interpolated into rendered pages.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssetRecord, AssetSeries};
    use chrono::NaiveDate;

    #[test]
    fn test_fmt_value() {
        assert_eq!(fmt_value(1_234_567.0), "1,234,567");
        assert_eq!(fmt_value(1_234_567.5), "1,234,567.5");
        assert_eq!(fmt_value(0.126), "0.13");
        assert_eq!(fmt_value(42.25), "42.25");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b> & \"c\""), "a&lt;b&gt; &amp; &quot;c&quot;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_crypto_report_lines() {
        let mut store = CryptoStore::default();
        store.assets.insert(
            "BTC".to_string(),
            AssetSeries {
                symbol: "BTC".into(),
                name: "Bitcoin".into(),
                source: "CoinGecko".into(),
                records: vec![AssetRecord {
                    date: NaiveDate::from_ymd_opt(2026, 8, 29).unwrap(),
                    timestamp: 0,
                    price: Some(64_250.5),
                    market_cap: None,
                    volume_24h: Some(31_000_000_000.0),
                    circulating_supply: Some(19_700_000.0),
                    supply_metric: "circulating_supply".into(),
                    source: "CoinGecko".into(),
                    source_url: String::new(),
                }],
            },
        );

        let text = crypto_report(&store, "2026-08-29 10:30", "Asia/Shanghai");
        assert!(text.starts_with("# Crypto daily report 2026-08-29 10:30"));
        assert!(text.contains("- BTC: price $64,250.5, supply 19,700,000"));
        assert!(text.contains("24h volume $31,000,000,000"));
        assert!(text.ends_with(DASHBOARD_URL));
        // Assets without records are skipped.
        assert!(!text.contains("USDC"));
    }
}
