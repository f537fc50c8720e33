use anyhow::Result;
use chrono::{Local, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ledger_pages::{Ledger, SortKey, Transaction};
use ledger_pages::render::format_amount;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

const PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub enum InputMode {
    Normal,
    Search(String),
}

pub struct App {
    pub ledger: Ledger,
    pub visible: Vec<Transaction>,
    pub state: TableState,
    pub sort: Option<SortKey>,
    pub search: Option<String>,
    pub input_mode: InputMode,
    pub show_detail: bool,
    pub today: NaiveDate,
}

impl App {
    pub fn new(ledger: Ledger, today: NaiveDate) -> Self {
        let mut app = Self {
            ledger,
            visible: Vec::new(),
            state: TableState::default(),
            sort: None,
            search: None,
            input_mode: InputMode::Normal,
            show_detail: false,
            today,
        };
        app.refresh();
        app
    }

    /// Rebuild the visible rows from the ledger, the search term and the sort key
    fn refresh(&mut self) {
        let mut view = match &self.search {
            Some(term) => Ledger::new(self.ledger.find_by_description(term)),
            None => self.ledger.clone(),
        };

        if let Some(key) = self.sort {
            view.sort(key);
        }

        self.visible = view.into_transactions();

        // Reset selection to first item
        if self.visible.is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }
    }

    pub fn apply_sort(&mut self, sort: Option<SortKey>) {
        self.sort = sort;
        self.refresh();
    }

    pub fn apply_search(&mut self, term: &str) {
        let term = term.trim();
        self.search = if term.is_empty() {
            None
        } else {
            Some(term.to_string())
        };
        self.refresh();
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_transaction(&self) -> Option<&Transaction> {
        self.state.selected().and_then(|i| self.visible.get(i))
    }

    pub fn next(&mut self) {
        let len = self.visible.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.visible.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) => len - 1,
            Some(i) => i - 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.visible.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => (i + PAGE_SIZE).min(len - 1),
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.visible.is_empty() {
            return;
        }
        let i = self.state.selected().map(|i| i.saturating_sub(PAGE_SIZE)).unwrap_or(0);
        self.state.select(Some(i));
    }

    pub fn visible_total(&self) -> f64 {
        ledger_pages::ledger::total_amount(&self.visible)
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "terminal UI failed");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };

        if let InputMode::Search(buffer) = &mut app.input_mode {
            match key.code {
                KeyCode::Enter => {
                    let term = buffer.clone();
                    app.input_mode = InputMode::Normal;
                    app.apply_search(&term);
                }
                KeyCode::Esc => app.input_mode = InputMode::Normal,
                KeyCode::Backspace => {
                    buffer.pop();
                }
                KeyCode::Char(c) => buffer.push(c),
                _ => {}
            }
            continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
            KeyCode::Enter => app.toggle_detail(),
            KeyCode::Char('/') => app.input_mode = InputMode::Search(String::new()),
            KeyCode::Char('d') => app.apply_sort(Some(SortKey::Date)),
            KeyCode::Char('a') => app.apply_sort(Some(SortKey::Amount)),
            KeyCode::Char('o') => app.apply_sort(None),
            KeyCode::Char('c') => app.apply_search(""),
            KeyCode::Down | KeyCode::Char('j') => app.next(),
            KeyCode::Up | KeyCode::Char('k') => app.previous(),
            KeyCode::PageDown => app.page_down(),
            KeyCode::PageUp => app.page_up(),
            KeyCode::Home => {
                if !app.visible.is_empty() {
                    app.state.select(Some(0));
                }
            }
            KeyCode::End => {
                if !app.visible.is_empty() {
                    app.state.select(Some(app.visible.len() - 1));
                }
            }
            _ => {}
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Table
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        render_table(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let sort_label = match app.sort {
        Some(SortKey::Date) => "Date (newest first)",
        Some(SortKey::Amount) => "Amount (largest first)",
        None => "Original order",
    };

    let mut spans = vec![
        Span::styled(
            "Bank Transactions",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(format!("Sort: {}", sort_label), Style::default().fg(Color::White)),
        Span::raw("  |  "),
        Span::styled(
            format!("Total: {} $", format_amount(app.visible_total())),
            Style::default().fg(Color::Green),
        ),
    ];

    if let Some(term) = &app.search {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(
            format!("Search: \"{}\"", term),
            Style::default().fg(Color::Cyan),
        ));
    }

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["ID", "Date", "Amount", "Description", "Merchant", "Days Ago"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let today = app.today;
    let rows = app.visible.iter().map(|tx| {
        Row::new(vec![
            Cell::from(tx.id.to_string()),
            Cell::from(tx.date.format("%Y-%m-%d").to_string()),
            Cell::from(format!("{} $", format_amount(tx.amount))).style(Style::default().fg(Color::Green)),
            Cell::from(truncate(&tx.description, 30)),
            Cell::from(truncate(&tx.merchant, 20)),
            Cell::from(tx.days_since(today).to_string()),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Length(32),
            Constraint::Length(22),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Transactions "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let label = Style::default().fg(Color::Yellow);

    let lines = match app.selected_transaction() {
        Some(tx) => vec![
            Line::from(vec![Span::styled("ID:          ", label), Span::raw(tx.id.to_string())]),
            Line::from(vec![
                Span::styled("Date:        ", label),
                Span::raw(tx.date.format("%Y-%m-%d").to_string()),
            ]),
            Line::from(vec![
                Span::styled("Amount:      ", label),
                Span::raw(format!("{} $", format_amount(tx.amount))),
            ]),
            Line::from(vec![Span::styled("Description: ", label), Span::raw(tx.description.clone())]),
            Line::from(vec![Span::styled("Merchant:    ", label), Span::raw(tx.merchant.clone())]),
            Line::from(vec![
                Span::styled("Days Ago:    ", label),
                Span::raw(tx.days_since(app.today).to_string()),
            ]),
        ],
        None => vec![Line::from("No transaction selected")],
    };

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Detail "),
    );

    f.render_widget(panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let spans = match &app.input_mode {
        InputMode::Search(buffer) => vec![
            Span::styled(" Search: ", Style::default().fg(Color::Cyan)),
            Span::raw(format!("{}_", buffer)),
            Span::raw("  ("),
            Span::styled("Enter", Style::default().fg(Color::Yellow)),
            Span::raw(" apply, "),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::raw(" cancel)"),
        ],
        InputMode::Normal => {
            let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
            let key = Style::default().fg(Color::Yellow);
            vec![
                Span::styled(
                    format!(" Row: {}/{} ", selected, app.visible.len()),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw(" | "),
                Span::styled("d", key),
                Span::raw("/"),
                Span::styled("a", key),
                Span::raw("/"),
                Span::styled("o", key),
                Span::raw(" Sort | "),
                Span::styled("/", key),
                Span::raw(" Search | "),
                Span::styled("c", key),
                Span::raw(" Clear | "),
                Span::styled("Enter", key),
                Span::raw(" Details | "),
                Span::styled("q", Style::default().fg(Color::Red)),
                Span::raw(" Quit"),
            ]
        }
    };

    let status_bar = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

/// Today's date for the "Days Ago" column
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
