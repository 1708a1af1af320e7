//! CoinGecko markets endpoint for the tracked asset basket.

use crate::http::{FetchError, RetryingClient, url_with_params};
use crate::models::{AssetRecord, CoinMarketRow};
use chrono::NaiveDate;

pub const MARKETS_URL: &str = "https://api.coingecko.com/api/v3/coins/markets";
pub const SOURCE_NAME: &str = "CoinGecko";

/// A basket entry: ticker symbol, CoinGecko id, and how to read its supply.
#[derive(Debug, Clone, Copy)]
pub struct TrackedCoin {
    pub symbol: &'static str,
    pub id: &'static str,
    pub name: &'static str,
    pub supply_metric: &'static str,
}

/// The fixed basket the crypto job samples every day.
pub const TRACKED_COINS: &[TrackedCoin] = &[
    TrackedCoin {
        symbol: "USDC",
        id: "usd-coin",
        name: "USD Coin",
        supply_metric: "circulating_supply",
    },
    TrackedCoin {
        symbol: "USDT",
        id: "tether",
        name: "Tether",
        supply_metric: "circulating_supply",
    },
    TrackedCoin {
        symbol: "BTC",
        id: "bitcoin",
        name: "Bitcoin",
        supply_metric: "circulating_supply (on-chain, issuance proxy)",
    },
    TrackedCoin {
        symbol: "ETH",
        id: "ethereum",
        name: "Ethereum",
        supply_metric: "circulating_supply (on-chain, issuance proxy)",
    },
];

/// Fetch one markets row per tracked coin, in a single request.
pub async fn fetch_markets(client: &RetryingClient) -> Result<Vec<CoinMarketRow>, FetchError> {
    let ids = TRACKED_COINS
        .iter()
        .map(|c| c.id)
        .collect::<Vec<_>>()
        .join(",");
    let url = url_with_params(MARKETS_URL, [("vs_currency", "usd"), ("ids", ids.as_str())])?;
    client.get_json(&url).await
}

/// Map an upstream row to the persisted record for `date`.
pub fn record_for(
    coin: &TrackedCoin,
    row: &CoinMarketRow,
    date: NaiveDate,
    timestamp: i64,
) -> AssetRecord {
    AssetRecord {
        date,
        timestamp,
        price: row.current_price,
        market_cap: row.market_cap,
        volume_24h: row.total_volume,
        circulating_supply: row.circulating_supply,
        supply_metric: coin.supply_metric.to_string(),
        source: SOURCE_NAME.to_string(),
        source_url: MARKETS_URL.to_string(),
    }
}
