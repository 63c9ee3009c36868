//! One-shot trader commands: profile lookup, order entry, cancellation and
//! the leaderboard.

use std::io::{self, Write};

use exchange::types::{rank_label, short_id};
use exchange::{Book, Exchange, ExchangeError, OrderForm, Side, TraderSummary, UserProfile};
use tracing::{info, warn};

use crate::error::DeskError;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Look up a trader and print their profile.
///
/// An unknown user is reported as `User '<name>' not found` and is not
/// treated as a failure of the command.
pub async fn show_user(exchange: &Exchange, username: &str, json: bool) -> Result<(), DeskError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(DeskError::Config("Please enter a username".into()));
    }

    let mut out = io::stdout().lock();
    match exchange.fetch_user(username).await {
        Ok(user) if json => writeln!(out, "{}", serde_json::to_string_pretty(&user)?)?,
        Ok(user) => write_profile(&mut out, &user)?,
        Err(e @ ExchangeError::UserNotFound(_)) => {
            warn!(username, "user lookup failed");
            writeln!(out, "{e}")?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Fill an order form from command-line text.
pub fn order_form(username: &str, book: Book, side: Side, price: &str, quantity: &str) -> OrderForm {
    let mut form = OrderForm::new();
    form.username = username.to_string();
    form.book = book;
    form.side = side;
    form.price = price.to_string();
    form.set_quantity(quantity);
    form
}

/// Validate and submit `form`. On success the form is cleared for the next
/// order; on failure it is left as typed.
pub async fn place_order(exchange: &Exchange, form: &mut OrderForm) -> Result<(), DeskError> {
    let ack = exchange.submit_order(form).await?;
    form.reset_after_submit();
    writeln!(
        io::stdout().lock(),
        "Order placed successfully! Order ID: {}",
        ack.order_id
    )?;
    Ok(())
}

pub async fn cancel_order(
    exchange: &Exchange,
    book: Book,
    order_id: &str,
    username: &str,
) -> Result<(), DeskError> {
    let ack = exchange.cancel_order(book, order_id, username).await?;
    info!(book = %book, order_id, "order cancelled");
    writeln!(io::stdout().lock(), "{}", ack.status)?;
    Ok(())
}

pub async fn cancel_all(exchange: &Exchange, book: Book, username: &str) -> Result<(), DeskError> {
    let ack = exchange.cancel_all_orders(book, username).await?;
    info!(book = %book, count = ack.count, "orders cancelled");
    writeln!(io::stdout().lock(), "{} ({} orders)", ack.status, ack.count)?;
    Ok(())
}

pub async fn show_leaderboard(exchange: &Exchange, json: bool) -> Result<(), DeskError> {
    let rows = exchange.fetch_leaderboard().await?;
    let mut out = io::stdout().lock();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&rows)?)?;
    } else {
        for line in leaderboard_lines(&rows) {
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Signed money amount with two decimals.
pub fn format_profit(value: f64) -> String {
    if value >= 0.0 {
        format!("+${value:.2}")
    } else {
        format!("-${:.2}", value.abs())
    }
}

/// Leaderboard table, one line per trader plus a header.
pub fn leaderboard_lines(rows: &[TraderSummary]) -> Vec<String> {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(format!(
        "{:<5} {:<16} {:>14} {:>9} {:>7} {:>7}",
        "Rank", "Trader", "Realized P&L", "Positions", "Orders", "Trades"
    ));
    if rows.is_empty() {
        lines.push("No traders yet".to_string());
    }
    for (i, row) in rows.iter().enumerate() {
        lines.push(format!(
            "{:<5} {:<16} {:>14} {:>9} {:>7} {:>7}",
            rank_label(i),
            row.username,
            format_profit(row.realized_profit),
            row.position_count,
            row.active_order_count,
            row.trade_count,
        ));
    }
    lines
}

fn write_profile<W: Write>(out: &mut W, user: &UserProfile) -> io::Result<()> {
    writeln!(out, "{}", user.username)?;
    writeln!(out, "Realized profit: {}", format_profit(user.realized_profit))?;

    writeln!(out, "\nPositions")?;
    if user.positions.is_empty() {
        writeln!(out, "  none")?;
    }
    for p in &user.positions {
        writeln!(
            out,
            "  {:<6} {:>8} @ ${:.2}  {:?}",
            p.symbol, p.quantity, p.average_cost, p.position_type
        )?;
    }

    writeln!(out, "\nActive orders")?;
    if user.active_orders.is_empty() {
        writeln!(out, "  none")?;
    }
    for o in &user.active_orders {
        writeln!(
            out,
            "  {:<12} {:<6} {:<4} {:>8} @ ${:.2}  {}",
            short_id(&o.order_id),
            o.book,
            o.side,
            o.quantity,
            o.price,
            o.status
        )?;
    }

    writeln!(out, "\nExecuted trades")?;
    if user.executed_trades.is_empty() {
        writeln!(out, "  none")?;
    }
    for t in &user.executed_trades {
        writeln!(
            out,
            "  {}  {:<6} {:<4} {:>8} @ ${:.2}  vs {}",
            t.timestamp, t.symbol, t.side, t.quantity, t.price, t.counterparty
        )?;
    }
    Ok(())
}
