use anyhow::Result;
use clap::Parser;
use hasitha_assistant::models::Config;
use hasitha_assistant::server::{build_router, AppState};
use std::net::SocketAddr;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "hasitha-assistant")]
#[command(about = "Chat and damage-analysis API over Google Gemini")]
struct CliArgs {
    /// Bind address, overriding SERVER_BIND.
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hasitha_assistant=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting hasitha-assistant");

    let args = CliArgs::parse();
    let config = Config::from_env();

    let state = AppState::from_config(&config);
    let app = build_router(state);

    let bind = args.bind.unwrap_or_else(|| config.server_bind.clone());
    let addr: SocketAddr = match bind.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid bind address '{}': {}", bind, e);
            std::process::exit(1);
        }
    };

    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
