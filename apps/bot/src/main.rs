use anyhow::{Result, anyhow};
use clap::Parser;
use log::info;
use teloxide::Bot;

mod balance;
mod config;
mod price;
mod rpc;
mod session;
mod telegram;

use balance::WalletService;
use config::{Cli, Config};
use price::PriceClient;
use rpc::RpcClient;
use session::Backend;
use swap_core::SwapParser;

fn setup_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

fn build_backend(cfg: &Config) -> Result<Backend> {
    let rpc = RpcClient::new(cfg.rpc_url.clone(), cfg.commitment.clone(), cfg.http_timeout)?;
    let prices = PriceClient::new(cfg.price_api_url.clone(), cfg.http_timeout)?;

    Ok(Backend {
        parser: SwapParser::new(rpc.clone(), cfg.swap_program_id.clone()),
        wallet: WalletService::new(rpc, prices),
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();
    let cfg: Config = config::load()?;

    info!("bot starting:");
    info!("  rpc_endpoint={}", cfg.rpc_url);
    info!("  rpc_commitment={}", cfg.commitment);
    info!("  price_api_url={}", cfg.price_api_url);
    info!("  swap_program_id={}", cfg.swap_program_id);
    info!("  http_timeout_secs={}", cfg.http_timeout.as_secs());

    let backend = build_backend(&cfg)?;

    if let Some(signature) = cli.parse.as_deref() {
        return match backend.parser.parse_swap_transaction(signature.trim()).await? {
            Some(swap) => {
                println!("{}", serde_json::to_string_pretty(&swap)?);
                Ok(())
            }
            None => Err(anyhow!("{} is not a qualifying swap", signature.trim())),
        };
    }

    if let Some(address) = cli.balance.as_deref() {
        println!("{}", backend.wallet.balance_display(address).await?);
        return Ok(());
    }

    telegram::run(Bot::new(&cfg.bot_token), backend).await
}
