use crate::models::expense::Expense;
use crate::models::organization::OrganizationData;
use crate::operations::auth::Scope;
use crate::operations::budget::{self, Totals};
use crate::operations::expense::expenses_in_scope;
use crate::operations::invoice::render_claim;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::{Alignment, Color, Constraint, Direction, Layout, Rect, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};
use std::cmp::max;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortOrder {
    DateDesc,
    DateAsc,
}

impl SortOrder {
    fn toggle(self) -> Self {
        match self {
            SortOrder::DateDesc => SortOrder::DateAsc,
            SortOrder::DateAsc => SortOrder::DateDesc,
        }
    }

    fn label(self) -> &'static str {
        match self {
            SortOrder::DateDesc => "date ↓",
            SortOrder::DateAsc => "date ↑",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Budget,
    Expenses,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    List,
    Details,
}

/// One line of the flattened budget tree.
#[derive(Debug, Clone, PartialEq)]
struct TreeRow {
    depth: usize,
    label: String,
    totals: Totals,
}

fn flatten_rollup(data: &OrganizationData, scope: &Scope) -> Vec<TreeRow> {
    let rollup = budget::rollup(data, scope);
    let mut rows = Vec::new();

    for team in &rollup.teams {
        rows.push(TreeRow {
            depth: 0,
            label: format!("{} - {}", team.code, team.name),
            totals: team.totals,
        });
        for dept in &team.departments {
            push_department(&mut rows, dept, 1);
        }
    }
    for dept in &rollup.orphan_departments {
        push_department(&mut rows, dept, 0);
    }
    rows.push(TreeRow {
        depth: 0,
        label: "TOTAL".to_string(),
        totals: rollup.totals,
    });
    rows
}

fn push_department(rows: &mut Vec<TreeRow>, dept: &budget::DepartmentRollup, depth: usize) {
    rows.push(TreeRow {
        depth,
        label: format!("{} - {}", dept.code, dept.name),
        totals: dept.totals,
    });
    for item in &dept.items {
        rows.push(TreeRow {
            depth: depth + 1,
            label: format!("{} - {}", item.code, item.name),
            totals: item.totals,
        });
    }
}

struct BrowseState<'a> {
    data: &'a OrganizationData,
    tab: Tab,
    mode: Mode,

    tree: Vec<TreeRow>,
    expenses: Vec<&'a Expense>,

    table_state: TableState,
    sort_order: SortOrder,

    details_text: Option<String>,

    // Cached per-draw
    last_page_size: usize,
}

impl<'a> BrowseState<'a> {
    fn new(data: &'a OrganizationData, scope: &Scope) -> Self {
        let mut state = Self {
            data,
            tab: Tab::Budget,
            mode: Mode::List,
            tree: flatten_rollup(data, scope),
            expenses: expenses_in_scope(data, scope),
            table_state: TableState::default(),
            sort_order: SortOrder::DateDesc,
            details_text: None,
            last_page_size: 10,
        };
        state.reset_selection();
        state
    }

    fn row_count(&self) -> usize {
        match self.tab {
            Tab::Budget => self.tree.len(),
            Tab::Expenses => self.expenses.len(),
        }
    }

    fn reset_selection(&mut self) {
        if self.row_count() == 0 {
            self.table_state.select(None);
        } else {
            self.table_state.select(Some(0));
        }
    }

    fn switch_tab(&mut self) {
        self.tab = match self.tab {
            Tab::Budget => Tab::Expenses,
            Tab::Expenses => Tab::Budget,
        };
        self.reset_selection();
    }

    fn toggle_sort(&mut self) {
        self.sort_order = self.sort_order.toggle();
        match self.sort_order {
            SortOrder::DateDesc => self
                .expenses
                .sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id))),
            SortOrder::DateAsc => self
                .expenses
                .sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id))),
        }
    }

    fn move_selection(&mut self, delta: i32) {
        if self.row_count() == 0 {
            self.table_state.select(None);
            return;
        }

        let current = self.table_state.selected().unwrap_or(0) as i32;
        let max_index = self.row_count().saturating_sub(1) as i32;
        let next = (current + delta).clamp(0, max_index) as usize;
        self.table_state.select(Some(next));
    }

    fn page_up(&mut self) {
        let page = max(1, self.last_page_size) as i32;
        self.move_selection(-page);
    }

    fn page_down(&mut self) {
        let page = max(1, self.last_page_size) as i32;
        self.move_selection(page);
    }

    fn open_details(&mut self) {
        if self.tab != Tab::Expenses {
            return;
        }
        let selected = self
            .table_state
            .selected()
            .and_then(|idx| self.expenses.get(idx));
        self.details_text = selected.map(|e| render_claim(self.data, e));
        self.mode = Mode::Details;
    }

    fn close_details(&mut self) {
        self.details_text = None;
        self.mode = Mode::List;
    }
}

pub fn run_browse(data: &OrganizationData, scope: &Scope) -> Result<(), String> {
    enable_raw_mode().map_err(|e| format!("Failed to enable raw mode: {}", e))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)
        .map_err(|e| format!("Failed to enter alternate screen: {}", e))?;

    let result = (|| {
        let backend = ratatui::backend::CrosstermBackend::new(stdout);
        let mut terminal = ratatui::Terminal::new(backend)
            .map_err(|e| format!("Failed to initialize terminal: {}", e))?;

        let mut state = BrowseState::new(data, scope);

        loop {
            terminal
                .draw(|frame| {
                    let size = frame.area();
                    let layout = Layout::default()
                        .direction(Direction::Vertical)
                        .constraints([
                            Constraint::Length(3),
                            Constraint::Min(5),
                            Constraint::Length(3),
                        ])
                        .split(size);

                    render_header(frame, layout[0], &state);
                    match state.tab {
                        Tab::Budget => render_tree(frame, layout[1], &mut state),
                        Tab::Expenses => render_expenses(frame, layout[1], &mut state),
                    }
                    render_footer(frame, layout[2], &state);

                    if state.mode == Mode::Details {
                        render_details_modal(frame, size, &state);
                    }
                })
                .map_err(|e| format!("Failed to draw terminal UI: {}", e))?;

            if event::poll(std::time::Duration::from_millis(200))
                .map_err(|e| format!("Failed to poll input: {}", e))?
            {
                let event = event::read().map_err(|e| format!("Failed to read input: {}", e))?;
                if let Event::Key(key) = event {
                    if handle_key(&mut state, key) {
                        break;
                    }
                }
            }
        }

        Ok(())
    })();

    disable_raw_mode().map_err(|e| format!("Failed to disable raw mode: {}", e))?;
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen)
        .map_err(|e| format!("Failed to leave alternate screen: {}", e))?;

    result
}

fn handle_key(state: &mut BrowseState, key: KeyEvent) -> bool {
    // Many terminals emit both a Press and a Release event. Only act on Press/Repeat.
    if key.kind == KeyEventKind::Release {
        return false;
    }

    match state.mode {
        Mode::List => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => state.move_selection(-1),
            KeyCode::Down => state.move_selection(1),
            KeyCode::PageUp => state.page_up(),
            KeyCode::PageDown => state.page_down(),
            KeyCode::Home => state.reset_selection(),
            KeyCode::End => {
                if state.row_count() > 0 {
                    state
                        .table_state
                        .select(Some(state.row_count().saturating_sub(1)));
                }
            }
            KeyCode::Tab => state.switch_tab(),
            KeyCode::Enter => state.open_details(),
            KeyCode::Char('s') if state.tab == Tab::Expenses => state.toggle_sort(),
            _ => {}
        },
        Mode::Details => match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('b') => state.close_details(),
            _ => {}
        },
    }

    false
}

fn render_header(frame: &mut ratatui::Frame, area: Rect, state: &BrowseState) {
    let tab = match state.tab {
        Tab::Budget => "Budget",
        Tab::Expenses => "Expenses",
    };
    let mut spans = vec![
        Span::styled("Budget Ledger", Style::default().fg(Color::Cyan).bold()),
        Span::raw("  |  "),
        Span::raw(format!("View: {}", tab)),
        Span::raw("  |  "),
        Span::raw(format!("Rows: {}", state.row_count())),
    ];
    if state.tab == Tab::Expenses {
        spans.push(Span::raw("  |  "));
        spans.push(Span::raw(format!("Sort: {}", state.sort_order.label())));
    }

    let block = Block::default().borders(Borders::ALL);
    let paragraph = Paragraph::new(Line::from(spans))
        .block(block)
        .alignment(Alignment::Left);
    frame.render_widget(paragraph, area);
}

fn render_footer(frame: &mut ratatui::Frame, area: Rect, state: &BrowseState) {
    let hint = match (state.mode, state.tab) {
        (Mode::List, Tab::Budget) => "↑/↓ move  PgUp/PgDn page  Tab expenses  q/Esc exit",
        (Mode::List, Tab::Expenses) => {
            "↑/↓ move  PgUp/PgDn page  Enter claim  s sort  Tab budget  q/Esc exit"
        }
        (Mode::Details, _) => "Esc/q/b back",
    };

    let block = Block::default().borders(Borders::ALL);
    frame.render_widget(
        Paragraph::new(hint)
            .block(block)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn balance_style(totals: &Totals) -> Style {
    if totals.balance().is_sign_negative() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Green)
    }
}

fn bold_header(labels: [&'static str; 4]) -> Row<'static> {
    Row::new(labels.map(|label| Cell::from(label).style(Style::default().bold())))
        .style(Style::default().fg(Color::White))
}

fn update_page_size(state: &mut BrowseState, inner: Rect) {
    // Leave room for the header row.
    state.last_page_size = max(1, inner.height.saturating_sub(2) as usize);
}

fn render_tree(frame: &mut ratatui::Frame, area: Rect, state: &mut BrowseState) {
    let block = Block::default().title("Budget").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    update_page_size(state, inner);

    let header = bold_header(["Team / Department / Item", "Budget", "Spent", "Balance"]);
    let rows = state.tree.iter().map(|row| {
        let label = format!("{}{}", "  ".repeat(row.depth), row.label);
        let style = if row.depth == 0 {
            Style::default().bold()
        } else {
            Style::default()
        };
        Row::new([
            Cell::from(label).style(style),
            Cell::from(format!("{:.2}", row.totals.budget)),
            Cell::from(format!("{:.2}", row.totals.spent)),
            Cell::from(format!("{:.2}", row.totals.balance())).style(balance_style(&row.totals)),
        ])
    });

    let widths = [
        Constraint::Percentage(46),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Length(14),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White).bold())
        .highlight_symbol("➤ ")
        .column_spacing(1);

    frame.render_stateful_widget(table, inner, &mut state.table_state);
}

fn render_expenses(frame: &mut ratatui::Frame, area: Rect, state: &mut BrowseState) {
    let block = Block::default().title("Expenses").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    update_page_size(state, inner);

    let data = state.data;
    let header = bold_header(["Date", "Item", "Lines", "Total"]);
    let rows = state.expenses.iter().map(|e| {
        let item = data
            .item(&e.item_code)
            .map(|i| format!("{} - {}", i.code, i.name))
            .unwrap_or_else(|| e.item_code.clone());
        Row::new([
            Cell::from(e.date.format("%Y-%m-%d").to_string()),
            Cell::from(item),
            Cell::from(e.line_items.len().to_string()),
            Cell::from(format!("{:.2}", e.total_amount)),
        ])
    });

    let widths = [
        Constraint::Length(10),
        Constraint::Percentage(50),
        Constraint::Length(6),
        Constraint::Length(14),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White).bold())
        .highlight_symbol("➤ ")
        .column_spacing(1);

    frame.render_stateful_widget(table, inner, &mut state.table_state);

    if state.expenses.is_empty() {
        let empty = Paragraph::new("No expenses recorded")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
    }
}

fn render_details_modal(frame: &mut ratatui::Frame, area: Rect, state: &BrowseState) {
    let popup_area = centered_rect(90, 80, area);
    frame.render_widget(Clear, popup_area);

    let text = state
        .details_text
        .clone()
        .unwrap_or_else(|| "No selection".to_string());

    let block = Block::default().borders(Borders::ALL).title("Expense claim");
    frame.render_widget(
        Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: false }),
        popup_area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
