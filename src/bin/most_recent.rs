use alloy::providers::ProviderBuilder;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use rc_addmarket::config::Config;
use rc_addmarket::factory::{MarketFactory, RcFactory, TxOptions};
use rc_addmarket::market::MarketType;

/// Print the factory's most recently created market of a type.
#[derive(Parser)]
struct Args {
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    #[arg(short, long, env = "RC_NETWORK")]
    network: Option<String>,

    /// Market type selector
    #[arg(short = 't', long, default_value_t = 0)]
    market_type: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;
    rc_addmarket::init_logging(&cfg.general.log_level);

    let market_type = MarketType::try_from(args.market_type)?;
    let (name, net) = cfg.network(args.network.as_deref())?;
    let url: reqwest::Url = net.rpc_url.parse().context("Bad rpc_url")?;

    // Read-only, no wallet needed
    let provider = ProviderBuilder::new().connect_http(url);
    let factory = RcFactory::connect(net.factory, provider, TxOptions::default()).await?;

    let latest = factory.most_recent_market(market_type).await?;
    println!("{} factory {}: most recent {} market {}", name, net.factory, market_type, latest);
    Ok(())
}
