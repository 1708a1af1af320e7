mod config;
mod http;
mod jobs;
mod models;
mod render;
mod sources;
mod store;
mod timeline;
mod utils;
mod window;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "market-pulse", about = "Daily market metrics collector", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Sample CoinGecko and upsert today's record for every tracked asset
    CryptoUpdate,

    /// Render the latest crypto values as a plain-text daily summary
    CryptoReport,

    /// Snapshot today's prediction-market volumes (JSON + HTML)
    MarketsToday,

    /// Update the rolling 90-day prediction-market history (JSON + chart page)
    MarketsHistory,

    /// Attach ranked comments to the Tesla timeline documents
    TeslaComments,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "market_pulse=info,warn",
        1 => "market_pulse=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;

    match cli.command {
        Command::CryptoUpdate => {
            let _t = utils::Timer::start("Crypto update");
            jobs::crypto::update(&config).await?;
        }

        Command::CryptoReport => {
            let _t = utils::Timer::start("Crypto report");
            let text = jobs::crypto::report(&config)?;
            println!("{}", text);
        }

        Command::MarketsToday => {
            let _t = utils::Timer::start("Prediction markets today");
            let payload = jobs::markets_today::run(&config).await?;
            println!("{}", payload);
        }

        Command::MarketsHistory => {
            let _t = utils::Timer::start("Prediction markets history");
            let summary = jobs::markets_history::run(&config).await?;
            println!("{}", summary);
        }

        Command::TeslaComments => {
            let _t = utils::Timer::start("Tesla timeline comments");
            jobs::tesla::run(&config)?;
        }
    }

    Ok(())
}
