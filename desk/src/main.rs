mod cli;
mod client;
mod error;
mod monitor;
mod trader;

use std::time::Duration;

use clap::Parser;
use cli::Command;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::client::Overrides;
use crate::error::DeskError;
use crate::monitor::View;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("failed to install rustls crypto provider");

    let _ = dotenvy::dotenv(); // load .env if present

    let cli = cli::Cli::parse();

    // Initialize tracing
    let filter = cli
        .log_level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO);

    tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Shared cancellation token + signal handlers.
    let cancel = setup_signal_handlers();

    if let Err(e) = run(cli, cancel).await {
        tracing::error!(error = %e, "desk error");
        std::process::exit(1);
    }
}

async fn run(cli: cli::Cli, cancel: CancellationToken) -> Result<(), DeskError> {
    let base_url = cli.base_url.as_deref();

    match cli.command {
        Command::Monitor(args) => {
            let exchange = client::connect(
                base_url,
                Overrides {
                    book_poll_interval: Some(Duration::from_millis(args.book_interval_ms)),
                    leaderboard_poll_interval: Some(Duration::from_millis(
                        args.leaderboard_interval_ms,
                    )),
                    compact_depth: Some(args.depth),
                },
            )?;
            let initial = args.book.map_or(View::Dashboard, View::Book);
            monitor::run_monitor(&exchange, initial, cancel).await
        }

        Command::User(args) => {
            let exchange = client::connect(base_url, Overrides::default())?;
            trader::show_user(&exchange, &args.username, args.json).await
        }

        Command::Order(args) => {
            let exchange = client::connect(base_url, Overrides::default())?;
            info!(book = %args.book, side = %args.side, "submitting order");
            let mut form =
                trader::order_form(&args.username, args.book, args.side, &args.price, &args.quantity);
            trader::place_order(&exchange, &mut form).await
        }

        Command::Cancel(args) => {
            let exchange = client::connect(base_url, Overrides::default())?;
            trader::cancel_order(&exchange, args.book, &args.order_id, &args.username).await
        }

        Command::CancelAll(args) => {
            let exchange = client::connect(base_url, Overrides::default())?;
            trader::cancel_all(&exchange, args.book, &args.username).await
        }

        Command::Leaderboard(args) => {
            let exchange = client::connect(base_url, Overrides::default())?;
            trader::show_leaderboard(&exchange, args.json).await
        }
    }
}

/// Register SIGINT and SIGTERM handlers that trigger the returned token.
fn setup_signal_handlers() -> CancellationToken {
    let cancel = CancellationToken::new();

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("received SIGINT, shutting down");
        cancel_clone.cancel();
    });

    #[cfg(unix)]
    {
        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            let mut sig = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to register SIGTERM handler");
            sig.recv().await;
            info!("received SIGTERM, shutting down");
            cancel_clone.cancel();
        });
    }

    cancel
}
