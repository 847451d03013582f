//! Entry point for the PicArts desktop client.

use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use dioxus::desktop::{Config, LogicalSize, WindowBuilder};
use tracing_subscriber::EnvFilter;

use picarts_app::app::App;
use picarts_market::config::{DEFAULT_GATEWAY_URL, DEFAULT_PINNING_API_URL};
use picarts_market::{MarketConfig, MarketServices};

/// CSS styles embedded at compile time.
const STYLES_CSS: &str = include_str!("../assets/picarts.css");

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "picarts")]
#[command(about = "Mint, list and buy image NFTs")]
struct Args {
    /// JSON-RPC endpoint of the wallet node (no wallet when omitted)
    #[arg(long, env = "PICARTS_RPC_URL")]
    rpc_url: Option<String>,

    /// Hex private key to sign with instead of the node's unlocked accounts
    #[arg(long, env = "PICARTS_PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    /// Address of the NFT contract
    #[arg(long, env = "PICARTS_NFT_CONTRACT")]
    nft_contract: String,

    /// Address of the marketplace contract
    #[arg(long, env = "PICARTS_MARKETPLACE_CONTRACT")]
    marketplace_contract: String,

    /// Base URL of the pinning API
    #[arg(long, env = "PINATA_API_URL", default_value = DEFAULT_PINNING_API_URL)]
    pinning_api_url: String,

    /// Base URL of the pinning gateway
    #[arg(long, env = "PINATA_GATEWAY_URL", default_value = DEFAULT_GATEWAY_URL)]
    gateway_url: String,

    /// Pinning API key (requires --pinata-secret-api-key)
    #[arg(long, env = "PINATA_API_KEY")]
    pinata_api_key: Option<String>,

    /// Pinning API secret
    #[arg(long, env = "PINATA_SECRET_API_KEY", hide_env_values = true)]
    pinata_secret_api_key: Option<String>,

    /// Pinning JWT, used instead of the key pair when set
    #[arg(long, env = "PINATA_JWT", hide_env_values = true)]
    pinata_jwt: Option<String>,

    /// How often to poll the node for account changes, in milliseconds
    #[arg(long, env = "PICARTS_POLL_MS", default_value_t = 2000)]
    poll_ms: u64,

    /// Name written into every metadata document
    #[arg(long)]
    metadata_name: Option<String>,

    /// Description written into every metadata document
    #[arg(long)]
    metadata_description: Option<String>,

    /// Log filter used when RUST_LOG is not set
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

impl Args {
    fn market_config(&self) -> anyhow::Result<MarketConfig> {
        let mut builder = MarketConfig::builder()
            .nft_contract(&self.nft_contract)
            .marketplace_contract(&self.marketplace_contract)
            .pinning_api_url(&self.pinning_api_url)
            .gateway_url(&self.gateway_url)
            .account_poll_interval(Duration::from_millis(self.poll_ms));

        if let Some(url) = &self.rpc_url {
            builder = builder.rpc_url(url);
        }
        if let Some(key) = &self.private_key {
            builder = builder.private_key(key);
        }
        match (&self.pinata_api_key, &self.pinata_secret_api_key) {
            (Some(key), Some(secret)) => builder = builder.pinning_api_key(key, secret),
            (None, None) => {}
            _ => bail!("--pinata-api-key and --pinata-secret-api-key must be given together"),
        }
        if let Some(jwt) = &self.pinata_jwt {
            builder = builder.pinning_jwt(jwt);
        }
        if let Some(name) = &self.metadata_name {
            builder = builder.metadata_name(name);
        }
        if let Some(description) = &self.metadata_description {
            builder = builder.metadata_description(description);
        }

        Ok(builder.build()?)
    }
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.log_json);

    tracing::info!("Starting PicArts");

    let config = args.market_config().context("invalid configuration")?;
    let services = MarketServices::from_config(&config).context("failed to start services")?;
    tracing::info!(
        nft = ?config.contracts.nft,
        marketplace = ?config.contracts.marketplace,
        gateway = %config.gateway_url,
        "market configured"
    );

    let wb = WindowBuilder::new()
        .with_title("PicArts")
        .with_inner_size(LogicalSize::new(1100.0, 800.0));

    dioxus::LaunchBuilder::desktop()
        .with_cfg(
            Config::new()
                .with_window(wb)
                .with_custom_head(format!(
                    r#"
                    <link rel="preconnect" href="https://fonts.googleapis.com">
                    <link rel="preconnect" href="https://fonts.gstatic.com" crossorigin>
                    <link href="https://fonts.googleapis.com/css2?family=Cormorant+Garamond:wght@400;500;600;700&family=JetBrains+Mono:wght@400;500;600&display=swap" rel="stylesheet">
                    <style>{}</style>
                    "#,
                    STYLES_CSS
                )),
        )
        .with_context(services)
        .launch(App);

    Ok(())
}
