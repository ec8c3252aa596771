//! `chefbot` -- command-line client for the ChefBot backend.
//!
//! Configuration comes from the environment (a `.env` file is read first);
//! see `ClientConfig::from_env` for the full table. Credentials for
//! `signup` and `login` may also be given as:
//!
//! | Variable           | Description            |
//! |--------------------|------------------------|
//! | `CHEFBOT_EMAIL`    | Account email          |
//! | `CHEFBOT_PASSWORD` | Account password       |
//! | `RUST_LOG`         | Log filter override    |

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chefbot_cli::cli::Cli;
use chefbot_cli::commands;
use chefbot_client::{ChefBotClient, ClientConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = ClientConfig::from_env()?;
    tracing::debug!(
        api_url = %config.base_url,
        fallback_url = %config.fallback_url,
        platform = %config.platform,
        "Loaded configuration",
    );

    let client = ChefBotClient::open(config).await?;
    if let Err(e) = commands::run(&client, cli.command).await {
        tracing::debug!(error = ?e, "Command failed");
        eprintln!("{}", commands::describe_error(&e));
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "chefbot=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
