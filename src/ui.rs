use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use finance_tracker::{
    search, sort_rows, summarize, Column, SearchCriterion, SortState, Summary,
    TransactionRow, TransactionStore, format_amount,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
}

pub struct App {
    pub store: TransactionStore,
    pub rows: Vec<TransactionRow>,
    pub state: TableState,
    pub summary: Summary,
    pub query: String,
    pub criterion: SearchCriterion,
    pub input_mode: InputMode,
    pub sort: SortState,
    pub message: Option<String>,
}

impl App {
    pub fn new(store: &TransactionStore) -> Self {
        let rows = store.rows();
        let mut state = TableState::default();
        if !rows.is_empty() {
            state.select(Some(0));
        }

        Self {
            store: store.clone(),
            rows,
            state,
            summary: summarize(store),
            query: String::new(),
            criterion: SearchCriterion::Amount,
            input_mode: InputMode::Normal,
            sort: SortState::new(),
            message: None,
        }
    }

    fn show_rows(&mut self, rows: Vec<TransactionRow>) {
        self.rows = rows;
        if self.rows.is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }
    }

    pub fn perform_search(&mut self) {
        match search(&self.store, self.criterion, &self.query) {
            Ok(results) if results.has_transactions() => {
                self.message = None;
                self.show_rows(results.rows());
            }
            Ok(_) => self.message = Some("No matching transactions found.".to_string()),
            Err(e) => self.message = Some(format!("Error: {}", e)),
        }
    }

    pub fn reset_search(&mut self) {
        self.query.clear();
        self.criterion = SearchCriterion::Amount;
        self.message = None;
        self.sort.reset();
        self.show_rows(self.store.rows());
    }

    pub fn sort_by(&mut self, column: Column) {
        let direction = self.sort.request(column);
        sort_rows(&mut self.rows, column, direction);
    }

    pub fn next(&mut self) {
        let len = self.rows.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.rows.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.rows.len();
        if len == 0 {
            return;
        }
        let i = self.state.selected().map_or(0, |i| (i + 20).min(len - 1));
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let i = self.state.selected().map_or(0, |i| i.saturating_sub(20));
        self.state.select(Some(i));
    }

    /// Apply one key press. Returns true when the view should close.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self.input_mode {
            InputMode::Search => match key.code {
                KeyCode::Enter => {
                    self.input_mode = InputMode::Normal;
                    self.perform_search();
                }
                KeyCode::Esc => self.input_mode = InputMode::Normal,
                KeyCode::Tab => self.criterion = self.criterion.next(),
                KeyCode::Backspace => {
                    self.query.pop();
                }
                KeyCode::Char(c) => self.query.push(c),
                _ => {}
            },
            InputMode::Normal => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return true,
                KeyCode::Char('/') => {
                    self.input_mode = InputMode::Search;
                    self.message = None;
                }
                KeyCode::Tab => self.criterion = self.criterion.next(),
                KeyCode::Char('r') => self.reset_search(),
                KeyCode::Char('1') => self.sort_by(Column::Amount),
                KeyCode::Char('2') => self.sort_by(Column::Date),
                KeyCode::Char('3') => self.sort_by(Column::Type),
                KeyCode::Char('4') => self.sort_by(Column::Category),
                KeyCode::Down | KeyCode::Char('j') => self.next(),
                KeyCode::Up | KeyCode::Char('k') => self.previous(),
                KeyCode::PageDown => self.page_down(),
                KeyCode::PageUp => self.page_up(),
                KeyCode::Home => {
                    if !self.rows.is_empty() {
                        self.state.select(Some(0));
                    }
                }
                KeyCode::End => {
                    if !self.rows.is_empty() {
                        self.state.select(Some(self.rows.len() - 1));
                    }
                }
                _ => {}
            },
        }
        false
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

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Search bar
            Constraint::Min(0),    // Transactions
            Constraint::Length(3), // Totals
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_search_bar(f, chunks[0], app);
    render_table(f, chunks[1], app);
    render_summary(f, chunks[2], app);
    render_status_bar(f, chunks[3], app);
}

fn render_search_bar(f: &mut Frame, area: Rect, app: &App) {
    let editing = app.input_mode == InputMode::Search;
    let query_style = if editing {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };

    let mut spans = vec![
        Span::styled("Search: ", Style::default().fg(Color::Cyan)),
        Span::styled(app.query.clone(), query_style),
    ];
    if editing {
        spans.push(Span::styled("█", Style::default().fg(Color::Yellow)));
    }
    spans.push(Span::raw("  |  "));
    spans.push(Span::styled("Search by: ", Style::default().fg(Color::Cyan)));
    spans.push(Span::styled(
        app.criterion.name(),
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    ));

    let search_bar = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Personal Finance Tracker "),
    );

    f.render_widget(search_bar, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let sorted = app.sort.last();
    let header_cells = Column::ALL.iter().map(|column| {
        let title = match sorted {
            Some((c, direction)) if c == *column => {
                format!("{} {}", column.title(), direction.arrow())
            }
            _ => column.title().to_string(),
        };
        Cell::from(title).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.rows.iter().map(|row| {
        let color = if row.transaction_type.eq_ignore_ascii_case("income") {
            Color::Green
        } else {
            Color::Red
        };

        let cells = vec![
            Cell::from(row.amount.clone()).style(Style::default().fg(color)),
            Cell::from(row.date.clone()),
            Cell::from(row.transaction_type.clone()).style(Style::default().fg(color)),
            Cell::from(truncate(&row.category, 24)),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(26),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Transactions "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_summary(f: &mut Frame, area: Rect, app: &App) {
    let summary = &app.summary;
    let balance_color = if summary.net_balance < 0.0 {
        Color::Red
    } else {
        Color::Green
    };

    let spans = vec![
        Span::styled(
            format!(" Total Income: ${}", format_amount(summary.total_income)),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Total Expense: ${}", format_amount(summary.total_expense.abs())),
            Style::default().fg(Color::Red),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Net Balance: ${}", format_amount(summary.net_balance)),
            Style::default().fg(balance_color).add_modifier(Modifier::BOLD),
        ),
    ];

    let totals = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(totals, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.rows.len();

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(message) = &app.message {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            message.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    let keys: &[(&str, &str)] = match app.input_mode {
        InputMode::Search => &[("Enter", " Search"), ("Tab", " Criterion"), ("Esc", " Cancel")],
        InputMode::Normal => &[
            ("/", " Search"),
            ("Tab", " Criterion"),
            ("r", " Reset"),
            ("1-4", " Sort"),
            ("↑/↓", " Nav"),
            ("q", " Quit"),
        ],
    };
    for (key, label) in keys {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(*key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(*label));
    }

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
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
