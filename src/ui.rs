use anyhow::Result;
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use fair_split::{
    export, summary, Analysis, Contribution, GroupStore, GroupSummary, Session,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Cell, Gauge, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Analysis,
    History,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Analysis => Page::History,
            Page::History => Page::Analysis,
        }
    }

    pub fn previous(&self) -> Self {
        // Two pages, so both directions land on the other one
        self.next()
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Analysis => "Analysis",
            Page::History => "History",
        }
    }
}

pub struct App {
    pub session: Session,
    store: Box<dyn GroupStore + Send>,
    pub groups: Vec<GroupSummary>,
    pub current_page: Page,
    pub member_state: TableState,
    pub history_state: TableState,
    pub message: Option<String>,
}

impl App {
    pub fn new(mut session: Session, store: Box<dyn GroupStore + Send>) -> Result<Self> {
        if session.can_analyze() {
            session.analyze();
        }

        let mut app = Self {
            session,
            store,
            groups: Vec::new(),
            current_page: Page::Analysis,
            member_state: TableState::default(),
            history_state: TableState::default(),
            message: None,
        };

        app.refresh_history()?;
        app.reset_member_selection();

        if app.session.analysis().is_none() {
            app.message = Some(match app.session.readiness_summary() {
                Some(ready) => format!("{} (need at least 2 members)", ready),
                None => "No members yet. Pass CSV files or load a group from History.".to_string(),
            });
        }

        Ok(app)
    }

    pub fn analysis(&self) -> Option<&Analysis> {
        self.session.analysis()
    }

    /// Members shown on the analysis page
    pub fn members(&self) -> Vec<Contribution> {
        match self.session.analysis() {
            Some(analysis) => analysis.members.clone(),
            None => self.session.combined_members(),
        }
    }

    pub fn refresh_history(&mut self) -> Result<()> {
        self.groups = self.store.list_groups()?;

        let selected = self.history_state.selected().unwrap_or(0);
        if self.groups.is_empty() {
            self.history_state.select(None);
        } else {
            self.history_state
                .select(Some(selected.min(self.groups.len() - 1)));
        }

        Ok(())
    }

    fn reset_member_selection(&mut self) {
        if self.members().is_empty() {
            self.member_state.select(None);
        } else {
            self.member_state.select(Some(0));
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    fn current_len(&self) -> usize {
        match self.current_page {
            Page::Analysis => self.members().len(),
            Page::History => self.groups.len(),
        }
    }

    fn current_state(&mut self) -> &mut TableState {
        match self.current_page {
            Page::Analysis => &mut self.member_state,
            Page::History => &mut self.history_state,
        }
    }

    pub fn next(&mut self) {
        let len = self.current_len();
        if len == 0 {
            return;
        }
        let state = self.current_state();
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.current_len();
        if len == 0 {
            return;
        }
        let state = self.current_state();
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    pub fn selected_group(&self) -> Option<&GroupSummary> {
        self.history_state.selected().and_then(|i| self.groups.get(i))
    }

    /// Replace the session members with the selected saved group and
    /// re-run the analysis
    pub fn load_selected_group(&mut self) -> Result<()> {
        let (id, name) = match self.selected_group() {
            Some(group) => (group.id, group.name.clone()),
            None => return Ok(()),
        };

        let members = match self.store.load_group(id)? {
            Some(members) => members,
            None => {
                self.message = Some(format!("Group {} no longer exists", id));
                return self.refresh_history();
            }
        };

        self.session.clear();
        self.session.load_members(members);
        self.session.analyze();
        self.reset_member_selection();
        self.current_page = Page::Analysis;

        info!(id, name = %name, "loaded group into session");
        self.message = Some(format!("Loaded '{}'", name));
        Ok(())
    }

    pub fn delete_selected_group(&mut self) -> Result<()> {
        let (id, name) = match self.selected_group() {
            Some(group) => (group.id, group.name.clone()),
            None => return Ok(()),
        };

        if self.store.delete_group(id)? {
            self.message = Some(format!("Deleted '{}'", name));
        }
        self.refresh_history()
    }

    /// Write the current analysis as a CSV payment summary in the working
    /// directory
    pub fn export_summary(&mut self) -> Result<Option<PathBuf>> {
        let analysis = match self.session.analysis() {
            Some(analysis) => analysis,
            None => {
                self.message = Some("Nothing to export yet".to_string());
                return Ok(None);
            }
        };

        let now = Local::now();
        let path = PathBuf::from(export::export_file_name(now));
        export::write_summary_csv(
            &path,
            &analysis.members,
            Some(&analysis.report),
            &analysis.settlements,
            now,
        )?;

        self.message = Some(format!("Exported to {}", path.display()));
        Ok(Some(path))
    }

    fn report(&mut self, result: Result<()>) {
        if let Err(e) = result {
            error!("{:#}", e);
            self.message = Some(format!("Error: {}", e));
        }
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

    res
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab | KeyCode::BackTab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Enter if app.current_page == Page::History => {
                    let result = app.load_selected_group();
                    app.report(result);
                }
                KeyCode::Char('d') if app.current_page == Page::History => {
                    let result = app.delete_selected_group();
                    app.report(result);
                }
                KeyCode::Char('r') => {
                    let result = app.refresh_history();
                    app.report(result);
                }
                KeyCode::Char('e') => {
                    let result = app.export_summary().map(|_| ());
                    app.report(result);
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tabs
            Constraint::Min(0),    // Page
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Analysis => render_analysis(f, chunks[1], app),
        Page::History => render_history(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![];
    for (i, page) in [Page::Analysis, Page::History].iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(page.title().to_string(), style));
    }

    if let Some(ready) = app.session.readiness_summary() {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(ready, Style::default().fg(Color::White)));
    }

    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("Saved groups: {}", app.groups.len()),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" FairSplit "),
    );

    f.render_widget(header, area);
}

fn render_analysis(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    render_members(f, top[0], app);
    render_fairness(f, top[1], app);
    render_chart(f, bottom[0], app);
    render_settlements(f, bottom[1], app);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    Row::new(cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1)
}

fn render_members(f: &mut Frame, area: Rect, app: &mut App) {
    let members = app.members();
    let details = app.analysis().map(|a| a.report.details.clone());

    let rows = members.iter().enumerate().map(|(i, member)| {
        let difference = details
            .as_ref()
            .and_then(|d| d.get(i))
            .map(|d| d.difference);

        let (diff_text, color) = match difference {
            Some(d) if d > 0.0 => (summary::format_difference(d, member.currency()), Color::Green),
            Some(d) if d < 0.0 => (summary::format_difference(d, member.currency()), Color::Red),
            Some(d) => (summary::format_difference(d, member.currency()), Color::White),
            None => (String::new(), Color::White),
        };

        Row::new(vec![
            Cell::from(truncate(member.name(), 24)),
            Cell::from(summary::format_money(member.amount(), member.currency())),
            Cell::from(diff_text).style(Style::default().fg(color)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Min(12),
            Constraint::Length(14),
            Constraint::Length(14),
        ],
    )
    .header(header_row(&["Member", "Paid", "vs Average"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Member Contributions "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.member_state);
}

fn render_fairness(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(" Fairness ");

    let analysis = match app.analysis() {
        Some(analysis) => analysis,
        None => {
            let text = Paragraph::new("Add at least 2 members to calculate fairness.")
                .block(block)
                .style(Style::default().fg(Color::DarkGray));
            f.render_widget(text, area);
            return;
        }
    };

    let inner = block.inner(area);
    f.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let report = &analysis.report;
    let color = if report.is_fair() { Color::Green } else { Color::Red };

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(color))
        .percent(report.score.round().clamp(0.0, 100.0) as u16)
        .label(format!("{:.0}% ({})", report.score, report.level().as_str()));
    f.render_widget(gauge, parts[0]);

    f.render_widget(
        Paragraph::new(Span::styled(
            report.status(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        parts[1],
    );

    let currency = summary::group_currency(analysis);
    let lines = vec![
        Line::from(""),
        Line::from(analysis.narrative.clone()),
        Line::from(""),
        Line::from(format!(
            "Total: {}   Average: {}",
            summary::format_money(analysis.total, currency),
            summary::format_money(report.average, currency)
        )),
        Line::from(format!("Standard deviation: {:.2}", report.standard_deviation)),
    ];

    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }),
        parts[2],
    );
}

fn render_chart(f: &mut Frame, area: Rect, app: &App) {
    let members = app.members();
    let bars: Vec<(String, u64)> = members
        .iter()
        .map(|m| (truncate(m.name(), 8), m.amount().round() as u64))
        .collect();
    let data: Vec<(&str, u64)> = bars.iter().map(|(n, v)| (n.as_str(), *v)).collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Contributions "),
        )
        .data(&data)
        .bar_width(8)
        .bar_gap(2)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));

    f.render_widget(chart, area);
}

fn render_settlements(f: &mut Frame, area: Rect, app: &App) {
    let analysis = match app.analysis() {
        Some(analysis) => analysis,
        None => {
            let empty = Paragraph::new("").block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Settlements "),
            );
            f.render_widget(empty, area);
            return;
        }
    };

    let rows = analysis.settlements.iter().enumerate().map(|(i, s)| {
        Row::new(vec![
            Cell::from(format!("{}", i + 1)),
            Cell::from(truncate(&s.from, 16)).style(Style::default().fg(Color::Red)),
            Cell::from(truncate(&s.to, 16)).style(Style::default().fg(Color::Green)),
            Cell::from(summary::format_money(s.amount, &s.currency)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Min(10),
            Constraint::Length(12),
        ],
    )
    .header(header_row(&["#", "Pays", "To", "Amount"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" Settlements - {} ", analysis.settlement_note())),
    );

    f.render_widget(table, area);
}

fn render_history(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.groups.iter().map(|g| {
        let color = if g.fairness_score >= fair_split::fairness::FAIR_THRESHOLD {
            Color::Green
        } else {
            Color::Red
        };

        Row::new(vec![
            Cell::from(g.id.to_string()),
            Cell::from(truncate(&g.name, 28)),
            Cell::from(g.category.as_str()),
            Cell::from(format!("{:.2}", g.total_amount)),
            Cell::from(format!("{:.0}%", g.fairness_score)).style(Style::default().fg(color)),
            Cell::from(g.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(30),
            Constraint::Length(15),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(18),
        ],
    )
    .header(header_row(&["ID", "Name", "Category", "Total", "Fairness", "Saved"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Saved Groups "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.history_state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![];

    if let Some(message) = &app.message {
        spans.push(Span::styled(
            format!(" {} ", message),
            Style::default().fg(Color::Green),
        ));
        spans.push(Span::raw(" | "));
    }

    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));

    spans.push(key("Tab"));
    spans.push(Span::raw(" Page | "));
    spans.push(key("↑/↓"));
    spans.push(Span::raw(" Nav | "));
    if app.current_page == Page::History {
        spans.push(key("Enter"));
        spans.push(Span::raw(" Load | "));
        spans.push(key("d"));
        spans.push(Span::raw(" Delete | "));
    }
    spans.push(key("e"));
    spans.push(Span::raw(" Export | "));
    spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(Line::from(spans)).block(
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
