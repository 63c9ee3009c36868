use clap::{Parser, Subcommand};
use exchange::{Book, Side};

/// desk: terminal client for the stock exchange simulator.
#[derive(Parser, Debug)]
#[command(name = "desk", version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// REST base URL (overrides EXCHANGE_API_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Launch the live orderbook monitor TUI
    Monitor(MonitorArgs),

    /// Show a trader's profile, positions, orders and trades
    User(UserArgs),

    /// Place a limit order
    Order(OrderArgs),

    /// Cancel one resting order
    Cancel(CancelArgs),

    /// Cancel all of a trader's resting orders on a book
    CancelAll(CancelAllArgs),

    /// Print the leaderboard
    Leaderboard(LeaderboardArgs),
}

/// Arguments for the `monitor` subcommand.
#[derive(Parser, Debug)]
pub struct MonitorArgs {
    /// Open focused on this book instead of the dashboard
    #[arg(long)]
    pub book: Option<Book>,

    /// Interval between orderbook polls (ms)
    #[arg(long, default_value = "5000", value_parser = clap::value_parser!(u64).range(1..))]
    pub book_interval_ms: u64,

    /// Interval between leaderboard polls (ms)
    #[arg(long, default_value = "10000", value_parser = clap::value_parser!(u64).range(1..))]
    pub leaderboard_interval_ms: u64,

    /// Levels per side on the dashboard
    #[arg(long, default_value = "10")]
    pub depth: usize,
}

/// Arguments for the `user` subcommand.
#[derive(Parser, Debug)]
pub struct UserArgs {
    pub username: String,

    /// Output as JSON instead of tables
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `order` subcommand.
///
/// Price and quantity are taken as typed and validated before anything is
/// sent.
#[derive(Parser, Debug)]
pub struct OrderArgs {
    #[arg(long)]
    pub username: String,

    /// AAPL, AMZN, NVDA or MSFT
    #[arg(long, default_value = "AAPL")]
    pub book: Book,

    /// buy or sell
    #[arg(long, default_value = "buy")]
    pub side: Side,

    #[arg(long, allow_hyphen_values = true)]
    pub price: String,

    /// Fractional values are floored
    #[arg(long, allow_hyphen_values = true)]
    pub quantity: String,
}

/// Arguments for the `cancel` subcommand.
#[derive(Parser, Debug)]
pub struct CancelArgs {
    pub order_id: String,

    #[arg(long)]
    pub username: String,

    #[arg(long, default_value = "AAPL")]
    pub book: Book,
}

/// Arguments for the `cancel-all` subcommand.
#[derive(Parser, Debug)]
pub struct CancelAllArgs {
    #[arg(long)]
    pub username: String,

    #[arg(long, default_value = "AAPL")]
    pub book: Book,
}

/// Arguments for the `leaderboard` subcommand.
#[derive(Parser, Debug)]
pub struct LeaderboardArgs {
    /// Output as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_defaults() {
        let cli = Cli::parse_from([
            "desk", "order", "--username", "alice", "--price", "101.5", "--quantity", "3",
        ]);
        match cli.command {
            Command::Order(args) => {
                assert_eq!(args.book, Book::Aapl);
                assert_eq!(args.side, Side::Buy);
                assert_eq!(args.price, "101.5");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn negative_price_reaches_validation() {
        let cli = Cli::parse_from([
            "desk", "order", "--username", "a", "--book", "nvda", "--side", "sell", "--price",
            "-1", "--quantity", "2",
        ]);
        let Command::Order(args) = cli.command else {
            panic!("expected order");
        };
        assert_eq!(args.book, Book::Nvda);
        assert_eq!(args.side, Side::Sell);
        assert_eq!(args.price, "-1");
    }

    #[test]
    fn unknown_book_is_rejected() {
        assert!(Cli::try_parse_from(["desk", "cancel-all", "--username", "a", "--book", "TSLA"])
            .is_err());
    }

    #[test]
    fn zero_intervals_are_rejected() {
        assert!(Cli::try_parse_from(["desk", "monitor", "--book-interval-ms", "0"]).is_err());
        assert!(Cli::try_parse_from(["desk", "monitor", "--leaderboard-interval-ms", "0"]).is_err());

        let cli = Cli::parse_from(["desk", "monitor", "--book-interval-ms", "250"]);
        let Command::Monitor(args) = cli.command else {
            panic!("expected monitor");
        };
        assert_eq!(args.book_interval_ms, 250);
        assert_eq!(args.leaderboard_interval_ms, 10_000);
    }
}
