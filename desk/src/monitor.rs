//! Live orderbook monitor TUI using ratatui + crossterm.
//!
//! Three views, one polling session at a time:
//!
//! * dashboard: every book, top levels per side plus a depth ladder
//! * book: one book at full depth
//! * leaderboard: traders ranked by realized profit
//!
//! Switching views cancels the outgoing session before the next one starts.

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use exchange::types::rank_label;
use exchange::utils::format2;
use exchange::{
    Book, BookSet, BookView, DepthPoint, Events, Exchange, OrderBookSnapshot, PollingSession,
    SessionEvent, TraderSummary,
};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::DeskError;
use crate::trader::format_profit;

/// Target render interval (10 FPS).
const RENDER_INTERVAL: Duration = Duration::from_millis(100);

/// Width in cells of the longest depth bar.
const DEPTH_BAR_WIDTH: usize = 24;

const EMPTY_DEPTH: &str = "No data available for depth chart";

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Which screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Book(Book),
    Leaderboard,
}

impl View {
    /// Error banner shown when this view's poll fails.
    pub fn failure_message(self) -> String {
        match self {
            View::Dashboard => "Failed to load orderbooks. Please try again later.".to_string(),
            View::Book(book) => format!("Failed to load {book} orderbook. Please try again."),
            View::Leaderboard => "Failed to load leaderboard. Please try again later.".to_string(),
        }
    }

    fn title(self) -> String {
        match self {
            View::Dashboard => "DASHBOARD".to_string(),
            View::Book(book) => format!("{book} ORDERBOOK"),
            View::Leaderboard => "LEADERBOARD".to_string(),
        }
    }
}

/// Map a key press to the view it selects, if any.
pub fn view_for_key(current: View, code: KeyCode) -> Option<View> {
    match code {
        KeyCode::Char('d') => Some(View::Dashboard),
        KeyCode::Char('l') => Some(View::Leaderboard),
        KeyCode::Char(c @ '1'..='4') => {
            let index = c as usize - '1' as usize;
            Some(View::Book(Book::ALL[index]))
        }
        KeyCode::Right | KeyCode::Left => {
            let View::Book(book) = current else {
                return None;
            };
            let index = Book::ALL.iter().position(|b| *b == book).unwrap_or(0);
            let len = Book::ALL.len();
            let next = if code == KeyCode::Right {
                (index + 1) % len
            } else {
                (index + len - 1) % len
            };
            Some(View::Book(Book::ALL[next]))
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Active session
// ---------------------------------------------------------------------------

/// The polling session backing the current view.
enum ActiveSession {
    Books(PollingSession<BookSet>, Events<BookSet>),
    Book(PollingSession<OrderBookSnapshot>, Events<OrderBookSnapshot>),
    Leaderboard(PollingSession<Vec<TraderSummary>>, Events<Vec<TraderSummary>>),
}

/// A delivery from the active session.
enum Delivery {
    Books(Arc<BookSet>),
    Book(Arc<OrderBookSnapshot>),
    Leaderboard(Arc<Vec<TraderSummary>>),
    Failed(exchange::ExchangeError),
}

impl ActiveSession {
    fn open(exchange: &Exchange, view: View) -> Self {
        match view {
            View::Dashboard => {
                let (session, rx) = exchange.watch_books();
                ActiveSession::Books(session, rx)
            }
            View::Book(book) => {
                let (session, rx) = exchange.watch_book(book.as_str());
                ActiveSession::Book(session, rx)
            }
            View::Leaderboard => {
                let (session, rx) = exchange.watch_leaderboard();
                ActiveSession::Leaderboard(session, rx)
            }
        }
    }

    fn cancel(&self) {
        match self {
            ActiveSession::Books(s, _) => s.cancel(),
            ActiveSession::Book(s, _) => s.cancel(),
            ActiveSession::Leaderboard(s, _) => s.cancel(),
        }
    }

    /// Next delivery. Pends forever once the stream has ended.
    async fn next(&mut self) -> Delivery {
        let delivery = match self {
            ActiveSession::Books(_, rx) => rx.recv().await.map(|e| lift(e, Delivery::Books)),
            ActiveSession::Book(_, rx) => rx.recv().await.map(|e| lift(e, Delivery::Book)),
            ActiveSession::Leaderboard(_, rx) => {
                rx.recv().await.map(|e| lift(e, Delivery::Leaderboard))
            }
        };
        match delivery {
            Some(d) => d,
            None => std::future::pending().await,
        }
    }
}

fn lift<T>(event: SessionEvent<T>, updated: fn(Arc<T>) -> Delivery) -> Delivery {
    match event {
        SessionEvent::Updated(value) => updated(value),
        SessionEvent::Failed(e) => Delivery::Failed(e),
    }
}

// ---------------------------------------------------------------------------
// Screen state
// ---------------------------------------------------------------------------

/// Everything the renderer reads. Derived views are rebuilt only when a
/// session reports a change.
#[derive(Debug)]
pub struct Screen {
    pub view: View,
    compact_depth: usize,
    dashboard: Option<Vec<BookView>>,
    focused: Option<BookView>,
    leaderboard: Option<Arc<Vec<TraderSummary>>>,
    error: Option<String>,
}

impl Screen {
    pub fn new(view: View, compact_depth: usize) -> Self {
        Self {
            view,
            compact_depth,
            dashboard: None,
            focused: None,
            leaderboard: None,
            error: None,
        }
    }

    /// Reset to `view` with nothing loaded.
    pub fn switch_to(&mut self, view: View) {
        *self = Self::new(view, self.compact_depth);
    }

    fn apply(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Books(set) => {
                self.dashboard = Some(
                    set.iter()
                        .map(|snap| BookView::compact(snap, self.compact_depth))
                        .collect(),
                );
                self.error = None;
            }
            Delivery::Book(snapshot) => {
                self.focused = Some(BookView::full(&snapshot));
                self.error = None;
            }
            Delivery::Leaderboard(rows) => {
                self.leaderboard = Some(rows);
                self.error = None;
            }
            Delivery::Failed(_) => {
                self.error = Some(self.view.failure_message());
            }
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Run the monitor TUI until `q`/`Esc` or cancellation.
///
/// # Arguments
///
/// * `exchange` - Client whose config sets the poll cadence and compact depth.
/// * `initial` - View shown on start.
/// * `cancel` - Cancellation token for graceful shutdown.
///
/// # Errors
///
/// Returns [`DeskError::Terminal`] if the terminal cannot be set up.
pub async fn run_monitor(
    exchange: &Exchange,
    initial: View,
    cancel: CancellationToken,
) -> Result<(), DeskError> {
    info!(view = ?initial, base_url = exchange.http_client.base_url(), "starting monitor");

    let mut screen = Screen::new(initial, exchange.config().compact_depth);
    let mut session = ActiveSession::open(exchange, initial);

    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let mut render_interval = tokio::time::interval(RENDER_INTERVAL);

    let mut quit = false;
    let result: Result<(), DeskError> = loop {
        if quit {
            break Ok(());
        }

        tokio::select! {
            delivery = session.next() => {
                screen.apply(delivery);
            }

            // Render tick, also polls keyboard input.
            _ = render_interval.tick() => {
                while event::poll(Duration::ZERO).unwrap_or(false) {
                    let Ok(Event::Key(key)) = event::read() else {
                        continue;
                    };
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                        quit = true;
                        break;
                    }
                    if let Some(next) = view_for_key(screen.view, key.code) {
                        if next != screen.view {
                            session.cancel();
                            info!(from = ?screen.view, to = ?next, "switching view");
                            session = ActiveSession::open(exchange, next);
                            screen.switch_to(next);
                        }
                    }
                }

                if !quit {
                    if let Err(e) = terminal.draw(|frame| render_ui(frame, &screen)) {
                        break Err(e.into());
                    }
                }
            }

            _ = cancel.cancelled() => {
                break Ok(());
            }
        }
    };

    session.cancel();
    restore_terminal(&mut terminal);
    result
}

// ---------------------------------------------------------------------------
// Terminal helpers
// ---------------------------------------------------------------------------

/// Restore terminal to normal mode.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) {
    let _ = terminal.show_cursor();
    let _ = disable_raw_mode();
    let _ = io::stdout().execute(LeaveAlternateScreen);
}

// ---------------------------------------------------------------------------
// Depth ladder
// ---------------------------------------------------------------------------

/// Cells a bar of `volume` takes on an axis ending at `axis_max`.
pub fn bar_cells(volume: Decimal, axis_max: Decimal, width: usize) -> usize {
    if axis_max <= Decimal::ZERO || volume <= Decimal::ZERO {
        return 0;
    }
    (volume / axis_max * Decimal::from(width))
        .round()
        .to_usize()
        .unwrap_or(0)
        .min(width)
}

/// One ladder row: buy bar growing left, price, sell bar growing right.
pub fn depth_row(point: &DepthPoint, axis_max: Decimal, width: usize) -> Line<'static> {
    let buy = bar_cells(point.buy_volume, axis_max, width);
    let sell = bar_cells(point.sell_volume, axis_max, width);
    Line::from(vec![
        Span::raw(" ".repeat(width - buy)),
        Span::styled("█".repeat(buy), Style::default().fg(Color::Green)),
        Span::raw(format!(" {:>9} ", format2(point.price))),
        Span::styled("█".repeat(sell), Style::default().fg(Color::Red)),
    ])
}

fn depth_lines(view: &BookView, width: usize) -> Vec<Line<'static>> {
    match view.volume_axis_max {
        Some(axis_max) if view.has_depth() => view
            .depth
            .iter()
            .rev()
            .map(|p| depth_row(p, axis_max, width))
            .collect(),
        _ => vec![Line::styled(EMPTY_DEPTH, Style::default().fg(Color::DarkGray))],
    }
}

// ---------------------------------------------------------------------------
// UI rendering
// ---------------------------------------------------------------------------

fn render_ui(frame: &mut Frame, screen: &Screen) {
    let area = frame.area();

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Length(if screen.error.is_some() { 3 } else { 0 }),
            Constraint::Min(5), // body
        ])
        .split(area);

    let header_text = format!(
        " {} | 'd' dashboard  '1'-'4' book  '←'/'→' cycle  'l' leaderboard  'q' quit",
        screen.view.title(),
    );
    let header = Paragraph::new(header_text)
        .style(Style::default().fg(Color::White).bg(Color::Blue).bold())
        .alignment(Alignment::Center);
    frame.render_widget(header, main_layout[0]);

    if let Some(message) = screen.error() {
        let banner = Paragraph::new(message.to_string())
            .style(Style::default().fg(Color::Red))
            .block(Block::default().borders(Borders::ALL).title(" Error "));
        frame.render_widget(banner, main_layout[1]);
    }

    let body = main_layout[2];
    match screen.view {
        View::Dashboard => render_dashboard(frame, body, screen.dashboard.as_deref()),
        View::Book(book) => render_book(frame, body, book, screen.focused.as_ref()),
        View::Leaderboard => render_leaderboard(frame, body, screen.leaderboard.as_deref()),
    }
}

fn panel(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title)
}

fn loading(frame: &mut Frame, area: Rect, title: String) {
    let paragraph = Paragraph::new("Loading...").block(panel(title));
    frame.render_widget(paragraph, area);
}

/// Dashboard: one quadrant per book.
fn render_dashboard(frame: &mut Frame, area: Rect, books: Option<&[BookView]>) {
    let Some(books) = books else {
        loading(frame, area, " Orderbooks ".to_string());
        return;
    };

    let cells = dashboard_cells(area, books.len());
    for (view, cell) in books.iter().zip(cells) {
        render_book_panel(frame, cell, view, DEPTH_BAR_WIDTH / 2);
    }
}

/// Two panels per row; at least two rows so a short book list keeps its
/// quadrant layout.
fn dashboard_cells(area: Rect, count: usize) -> Vec<Rect> {
    let row_count = count.div_ceil(2).max(2) as u32;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints((0..row_count).map(|_| Constraint::Ratio(1, row_count)))
        .split(area);
    rows.iter()
        .flat_map(|row| {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)])
                .split(*row)
                .to_vec()
        })
        .collect()
}

/// Focused book at full depth.
fn render_book(frame: &mut Frame, area: Rect, book: Book, view: Option<&BookView>) {
    match view {
        Some(view) => render_book_panel(frame, area, view, DEPTH_BAR_WIDTH),
        None => loading(frame, area, format!(" {book} ")),
    }
}

/// Level tables on the left, depth ladder on the right.
fn render_book_panel(frame: &mut Frame, area: Rect, view: &BookView, bar_width: usize) {
    let block = panel(format!(" {} ", view.book));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(inner);

    frame.render_widget(Paragraph::new(level_lines(view)), halves[0]);
    frame.render_widget(
        Paragraph::new(depth_lines(view, bar_width)).wrap(Wrap { trim: false }),
        halves[1],
    );
}

/// Asks above the spread (highest first), bids below (highest first).
fn level_lines(view: &BookView) -> Vec<Line<'static>> {
    let mut lines = Vec::with_capacity(view.levels.sell.len() + view.levels.buy.len() + 2);
    lines.push(Line::from(format!("{:>11} {:>10}", "Price", "Qty")));

    let sells = view.levels.display_sell();
    if sells.is_empty() {
        lines.push(Line::styled("  no sell orders", Style::default().fg(Color::DarkGray)));
    }
    for level in sells.iter().rev() {
        lines.push(Line::styled(
            format!("{:>11} {:>10}", level.price_label(), level.quantity_label()),
            Style::default().fg(Color::Red),
        ));
    }

    lines.push(Line::from("  ---------------------"));

    let buys = view.levels.display_buy();
    if buys.is_empty() {
        lines.push(Line::styled("  no buy orders", Style::default().fg(Color::DarkGray)));
    }
    for level in &buys {
        lines.push(Line::styled(
            format!("{:>11} {:>10}", level.price_label(), level.quantity_label()),
            Style::default().fg(Color::Green),
        ));
    }
    lines
}

fn render_leaderboard(frame: &mut Frame, area: Rect, rows: Option<&Vec<TraderSummary>>) {
    let Some(rows) = rows else {
        loading(frame, area, " Leaderboard ".to_string());
        return;
    };

    let mut lines = vec![Line::from(format!(
        "{:<5} {:<16} {:>14} {:>9} {:>7} {:>7}",
        "Rank", "Trader", "Realized P&L", "Positions", "Orders", "Trades"
    ))];
    if rows.is_empty() {
        lines.push(Line::from("No traders yet"));
    }
    for (i, row) in rows.iter().enumerate() {
        let color = if row.realized_profit >= 0.0 {
            Color::Green
        } else {
            Color::Red
        };
        lines.push(Line::from(vec![
            Span::raw(format!("{:<5} {:<16} ", rank_label(i), row.username)),
            Span::styled(
                format!("{:>14}", format_profit(row.realized_profit)),
                Style::default().fg(color),
            ),
            Span::raw(format!(
                " {:>9} {:>7} {:>7}",
                row.position_count, row.active_order_count, row.trade_count
            )),
        ]));
    }

    frame.render_widget(
        Paragraph::new(lines).block(panel(" Leaderboard ".to_string())),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use exchange::types::PriceLevel;
    use exchange::ExchangeError;
    use rust_decimal_macros::dec;

    fn snapshot(book: &str) -> OrderBookSnapshot {
        OrderBookSnapshot {
            book: book.into(),
            buy: vec![PriceLevel::new(dec!(100), dec!(5))],
            sell: vec![PriceLevel::new(dec!(101), dec!(10))],
        }
    }

    #[test]
    fn number_keys_focus_books() {
        assert_eq!(
            view_for_key(View::Dashboard, KeyCode::Char('3')),
            Some(View::Book(Book::Nvda))
        );
        assert_eq!(view_for_key(View::Dashboard, KeyCode::Char('9')), None);
        assert_eq!(
            view_for_key(View::Book(Book::Aapl), KeyCode::Char('l')),
            Some(View::Leaderboard)
        );
    }

    #[test]
    fn arrows_cycle_only_in_book_view() {
        assert_eq!(
            view_for_key(View::Book(Book::Msft), KeyCode::Right),
            Some(View::Book(Book::Aapl))
        );
        assert_eq!(
            view_for_key(View::Book(Book::Aapl), KeyCode::Left),
            Some(View::Book(Book::Msft))
        );
        assert_eq!(view_for_key(View::Dashboard, KeyCode::Right), None);
    }

    #[test]
    fn failure_messages() {
        assert_eq!(
            View::Book(Book::Amzn).failure_message(),
            "Failed to load AMZN orderbook. Please try again."
        );
        assert_eq!(
            View::Dashboard.failure_message(),
            "Failed to load orderbooks. Please try again later."
        );
    }

    #[test]
    fn error_banner_clears_on_next_update() {
        let mut screen = Screen::new(View::Book(Book::Aapl), 10);
        screen.apply(Delivery::Failed(ExchangeError::Http {
            status: 500,
            message: String::new(),
        }));
        assert_eq!(
            screen.error(),
            Some("Failed to load AAPL orderbook. Please try again.")
        );

        screen.apply(Delivery::Book(Arc::new(snapshot("AAPL"))));
        assert!(screen.error().is_none());
        assert!(screen.focused.as_ref().is_some_and(|v| v.has_depth()));
    }

    #[test]
    fn dashboard_builds_compact_views() {
        let mut screen = Screen::new(View::Dashboard, 10);
        screen.apply(Delivery::Books(Arc::new(vec![snapshot("AAPL"), snapshot("MSFT")])));
        let books = screen.dashboard.as_ref().unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[1].book, "MSFT");
    }

    #[test]
    fn switching_views_drops_loaded_state() {
        let mut screen = Screen::new(View::Dashboard, 10);
        screen.apply(Delivery::Books(Arc::new(vec![snapshot("AAPL")])));
        screen.switch_to(View::Leaderboard);
        assert!(screen.dashboard.is_none());
        assert_eq!(screen.view, View::Leaderboard);
    }

    #[test]
    fn bars_scale_to_axis() {
        assert_eq!(bar_cells(dec!(10), dec!(11.00), 22), 20);
        assert_eq!(bar_cells(dec!(0), dec!(11.00), 22), 0);
        assert_eq!(bar_cells(dec!(5), dec!(0), 22), 0);
    }

    #[test]
    fn empty_book_shows_empty_state() {
        let view = BookView::full(&OrderBookSnapshot {
            book: "NVDA".into(),
            buy: vec![],
            sell: vec![],
        });
        let lines = depth_lines(&view, 10);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].to_string(), EMPTY_DEPTH);
    }

    #[test]
    fn dashboard_has_a_cell_per_book() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(dashboard_cells(area, 4).len(), 4);

        let cells = dashboard_cells(area, 6);
        assert_eq!(cells.len(), 6);
        for (i, a) in cells.iter().enumerate() {
            assert!(a.width > 0 && a.height > 0);
            assert!(a.right() <= area.right() && a.bottom() <= area.bottom());
            for b in &cells[i + 1..] {
                assert!(!a.intersects(*b), "{a:?} overlaps {b:?}");
            }
        }
    }
}
