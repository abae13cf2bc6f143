use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolCall;
use alloy_primitives::hex;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use rc_addmarket::api::ipfs;
use rc_addmarket::config::Config;
use rc_addmarket::create::{create_market, CreateOptions};
use rc_addmarket::factory::{create_market_call, RcFactory, TxOptions};

#[derive(Parser)]
#[command(name = "rc-addmarket", about = "Create a RealityCards market through a deployed factory")]
struct Cli {
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Network profile from the config
    #[arg(short, long, env = "RC_NETWORK")]
    network: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Send createMarket and print the new market (default)
    Create {
        /// Skip local request checks and let the factory decide
        #[arg(long)]
        no_preflight: bool,
        /// Don't cross-check with getMostRecentMarket
        #[arg(long)]
        no_read_back: bool,
    },
    /// Print the assembled request and its calldata without sending
    Show,
    /// Upload a market descriptor JSON to IPFS and print its hash
    Pin { file: PathBuf },
    /// Print solc standard-JSON settings for contract verification
    SolcSettings,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Create {
        no_preflight: false,
        no_read_back: false,
    });

    // pin and solc-settings only need defaults
    let standalone = matches!(command, Command::Pin { .. } | Command::SolcSettings);
    let cfg = if standalone && !cli.config.exists() {
        Config::default()
    } else {
        Config::load(&cli.config)?
    };
    rc_addmarket::init_logging(&cfg.general.log_level);

    match command {
        Command::Create {
            no_preflight,
            no_read_back,
        } => {
            let opts = CreateOptions {
                preflight: cfg.general.preflight && !no_preflight,
                read_back: cfg.general.read_back && !no_read_back,
            };
            create(&cfg, cli.network.as_deref(), opts).await
        }
        Command::Show => show(&cfg),
        Command::Pin { file } => {
            let added = ipfs::add_descriptor(&cfg.ipfs.api_url, &file).await?;
            println!("{}", added.hash);
            Ok(())
        }
        Command::SolcSettings => {
            println!("{}", serde_json::to_string_pretty(&cfg.compiler.solc_settings())?);
            Ok(())
        }
    }
}

async fn create(cfg: &Config, network: Option<&str>, opts: CreateOptions) -> Result<()> {
    let (name, net) = cfg.network(network)?;
    let request = cfg.market()?.to_request()?;

    let signer: PrivateKeySigner = cfg.private_key()?.trim().parse().context("Bad private key")?;
    let url: reqwest::Url = net
        .rpc_url
        .parse()
        .with_context(|| format!("Bad rpc_url {}", net.rpc_url))?;

    info!(network = name, sender = %signer.address(), "connecting");
    let provider = ProviderBuilder::new().wallet(signer).connect_http(url);

    if let Some(expected) = net.chain_id {
        let actual = provider.get_chain_id().await?;
        if actual != expected {
            bail!("Network {} expects chain {} but node reports {}", name, expected, actual);
        }
    }

    let tx = TxOptions {
        gas: net.gas,
        gas_price: net.gas_price.map(u128::from),
        confirmations: net.confirmations,
    };
    let factory = RcFactory::connect(net.factory, provider, tx).await?;

    println!("CREATING MARKET");
    let created = create_market(&factory, &request, opts).await?;

    println!("Market created at address: {}", created.address);
    println!("Block number: {}", created.block_number);
    println!("Transaction: {}", created.tx_hash);
    Ok(())
}

fn show(cfg: &Config) -> Result<()> {
    let request = cfg.market()?.to_request()?;

    println!("Market type:     {}", request.market_type);
    println!("IPFS hash:       {}", request.ipfs_hash);
    println!("Times:           {}", request.timestamps);
    println!("Artist:          {}", request.artist);
    println!("Affiliate:       {}", request.affiliate);
    for (i, uri) in request.token_uris.iter().enumerate() {
        let affiliate = request
            .card_affiliates
            .get(i)
            .map(|a| a.to_string())
            .unwrap_or_else(|| "MISSING".to_string());
        println!("Card {}:          {} (affiliate {})", i, uri, affiliate);
    }
    println!("Question:        {}", request.question);

    if let Err(e) = request.check() {
        println!("Preflight:       FAILED ({})", e);
    } else {
        println!("Preflight:       ok");
    }

    let calldata = create_market_call(&request).abi_encode();
    println!("Calldata:        0x{}", hex::encode(calldata));
    Ok(())
}
