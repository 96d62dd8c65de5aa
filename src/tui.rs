use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;
use std::time::Duration;

use crate::models::{FraudResult, JobRecord, RiskLevel};
use crate::overlay::Overlay;
use crate::requests::RequestState;
use crate::view::CatalogBrowser;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const BAR_WIDTH: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Search,
}

struct AppState {
    browser: CatalogBrowser,
    selected: usize,
    scroll_offset: u16,
    mode: Mode,
}

impl AppState {
    fn new(browser: CatalogBrowser) -> Self {
        Self {
            browser,
            selected: 0,
            scroll_offset: 0,
            mode: Mode::Browse,
        }
    }

    fn current_job(&self) -> Option<&JobRecord> {
        self.browser.visible().get(self.selected).copied()
    }

    fn next(&mut self) {
        let len = self.browser.visible().len();
        if len > 0 && self.selected < len - 1 {
            self.selected += 1;
        }
    }

    fn prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn edit_query(&mut self, edit: impl FnOnce(&mut String)) {
        let mut query = self.browser.query().to_string();
        edit(&mut query);
        self.browser.set_query(query);
        self.selected = 0;
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }
}

pub fn run_browse(browser: CatalogBrowser) -> Result<()> {
    let mut state = AppState::new(browser);

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state);

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
) -> Result<()> {
    let mut list_state = ListState::default();

    loop {
        let before = state.browser.overlay().clone();
        state.browser.pump();
        if *state.browser.overlay() != before {
            state.scroll_offset = 0;
        }

        list_state.select(if state.browser.visible().is_empty() {
            None
        } else {
            Some(state.selected)
        });
        terminal.draw(|frame| draw(frame, state, &mut list_state))?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if state.mode == Mode::Search {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => state.mode = Mode::Browse,
                KeyCode::Backspace => state.edit_query(|q| {
                    q.pop();
                }),
                KeyCode::Char(c) => state.edit_query(|q| q.push(c)),
                _ => {}
            }
            continue;
        }

        if state.browser.view().overlay.is_open() {
            match key.code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => state.browser.close_overlay(),
                KeyCode::Char('J') | KeyCode::Down | KeyCode::PageDown => state.scroll_down(),
                KeyCode::Char('K') | KeyCode::Up | KeyCode::PageUp => state.scroll_up(),
                _ => {}
            }
            continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => break,
            KeyCode::Down | KeyCode::Char('j') => state.next(),
            KeyCode::Up | KeyCode::Char('k') => state.prev(),
            KeyCode::Char('/') => state.mode = Mode::Search,
            KeyCode::Char('c') => state.edit_query(String::clear),
            KeyCode::Char('m') => state.browser.load_more(),
            KeyCode::Char('f') => {
                if let Some(id) = state.current_job().map(|job| job.id) {
                    state.browser.analyze(id);
                }
            }
            KeyCode::Enter => {
                if let Some(id) = state.current_job().map(|job| job.id) {
                    state.browser.open_detail(id);
                    state.scroll_offset = 0;
                }
            }
            _ => {}
        }
    }

    if let Ok(view) = state.browser.view_json() {
        tracing::debug!(view = %view, "browser closed");
    }
    Ok(())
}

fn risk_color(level: RiskLevel) -> Color {
    match level {
        RiskLevel::Low => Color::Green,
        RiskLevel::Medium => Color::Yellow,
        RiskLevel::High => Color::Red,
    }
}

fn status_icon(state: &RequestState) -> Span<'static> {
    match state {
        RequestState::Idle => Span::raw(" "),
        RequestState::Pending => Span::styled("…", Style::default().fg(Color::Cyan)),
        RequestState::Succeeded(result) => {
            let level = result.risk_level();
            let icon = match level {
                RiskLevel::Low => "+",
                RiskLevel::Medium => "~",
                RiskLevel::High => "!",
            };
            Span::styled(icon, Style::default().fg(risk_color(level)))
        }
        RequestState::Failed(_) => Span::styled("x", Style::default().fg(Color::Red)),
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

fn draw(frame: &mut Frame, state: &AppState, list_state: &mut ListState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_search(frame, state, rows[0]);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[1]);

    let browser = &state.browser;
    let visible = browser.visible();
    let items: Vec<ListItem> = visible
        .iter()
        .map(|job| {
            ListItem::new(Line::from(vec![
                status_icon(browser.status(job.id)),
                Span::raw(format!(" #{:<4} {}", job.id, truncate(&job.title, 40))),
            ]))
        })
        .collect();

    let mut list_title = format!(" Jobs ({} of {}) ", visible.len(), browser.filtered().len());
    if browser.has_more() {
        list_title.push_str(&format!("m: +{} more ", browser.remaining()));
    }
    if browser.pending_count() > 0 {
        list_title.push_str(&format!("[{} analyzing] ", browser.pending_count()));
    }

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(list_title))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, chunks[0], list_state);

    let detail = Paragraph::new(build_summary(state))
        .block(Block::default().borders(Borders::ALL).title(" Detail "))
        .wrap(Wrap { trim: false });
    frame.render_widget(detail, chunks[1]);

    let help = match state.mode {
        Mode::Search => " type to filter  Enter/Esc:done",
        Mode::Browse => " j/k:navigate  /:search  c:clear  m:more  f:check fraud  Enter:details  q:quit",
    };
    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        rows[2],
    );

    match browser.overlay() {
        Overlay::None => {}
        Overlay::Detail(job) => draw_overlay(frame, state, " Job Details ", build_detail(job)),
        Overlay::Result(result) => {
            draw_overlay(frame, state, " Fraud Analysis ", build_result(result))
        }
    }
}

fn draw_search(frame: &mut Frame, state: &AppState, area: Rect) {
    let style = match state.mode {
        Mode::Search => Style::default().fg(Color::Yellow),
        Mode::Browse => Style::default(),
    };
    let mut text = state.browser.query().to_string();
    if state.mode == Mode::Search {
        text.push('_');
    }
    let search = Paragraph::new(text)
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(" Search title or company "));
    frame.render_widget(search, area);
}

fn draw_overlay(frame: &mut Frame, state: &AppState, title: &str, body: Text<'static>) {
    let area = centered_rect(70, 80, frame.area());
    frame.render_widget(Clear, area);
    let widget = Paragraph::new(body)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title.to_string())
                .title_bottom(" Esc: close "),
        )
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));
    frame.render_widget(widget, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn bold(text: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(
        text.into(),
        Style::default().add_modifier(Modifier::BOLD),
    ))
}

fn dim(text: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(text.into(), Style::default().fg(Color::DarkGray)))
}

fn build_summary(state: &AppState) -> Text<'static> {
    if let Some(error) = state.browser.catalog().error() {
        return Text::from(vec![Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        ))]);
    }
    let Some(job) = state.current_job() else {
        return Text::from(vec![dim("No jobs found. Try adjusting your search terms.")]);
    };

    let mut lines = vec![bold(job.title.clone())];
    if let Some(location) = &job.location {
        lines.push(Line::from(format!("Location: {}", location)));
    }
    lines.push(Line::from(if job.telecommuting {
        "Remote Work"
    } else {
        "On-site"
    }));
    if let Some(kind) = &job.employment_type {
        lines.push(Line::from(format!("Type: {}", kind)));
    }
    lines.push(Line::from(""));

    let snippet: String = job.description.chars().take(150).collect();
    lines.push(Line::from(format!("{}...", snippet)));
    lines.push(Line::from(""));

    match state.browser.status(job.id) {
        RequestState::Idle => lines.push(dim("Press f to check this posting for fraud")),
        RequestState::Pending => lines.push(Line::from(Span::styled(
            "Analyzing...",
            Style::default().fg(Color::Cyan),
        ))),
        RequestState::Succeeded(result) => {
            let level = result.risk_level();
            lines.push(Line::from(Span::styled(
                format!("{} ({})", level.label(), result.percent()),
                Style::default().fg(risk_color(level)).add_modifier(Modifier::BOLD),
            )));
        }
        RequestState::Failed(error) => lines.push(Line::from(Span::styled(
            format!("Failed to check fraud for \"{}\": {}", job.title, error),
            Style::default().fg(Color::Red),
        ))),
    }

    Text::from(lines)
}

fn push_section(lines: &mut Vec<Line<'static>>, heading: &str, body: Option<&str>) {
    lines.push(bold(heading.to_string()));
    let body = body.filter(|b| !b.trim().is_empty()).unwrap_or("Not specified");
    for line in textwrap::fill(body, 70).lines() {
        lines.push(Line::from(format!("  {}", line)));
    }
    lines.push(Line::from(""));
}

fn build_detail(job: &JobRecord) -> Text<'static> {
    let mut lines = vec![bold(job.title.clone()), Line::from("")];
    push_section(&mut lines, "Company", Some(&job.company_profile));
    push_section(&mut lines, "Description", Some(&job.description));
    push_section(&mut lines, "Requirements", Some(&job.requirements));
    push_section(&mut lines, "Benefits", job.benefits.as_deref());
    push_section(&mut lines, "Location", job.location.as_deref());
    push_section(&mut lines, "Department", job.department.as_deref());
    push_section(&mut lines, "Industry", job.industry.as_deref());
    push_section(&mut lines, "Function", job.function.as_deref());
    push_section(&mut lines, "Employment Type", job.employment_type.as_deref());
    push_section(&mut lines, "Required Experience", job.required_experience.as_deref());
    push_section(&mut lines, "Required Education", job.required_education.as_deref());
    if let Some(salary) = job.salary_label() {
        push_section(&mut lines, "Salary", Some(&salary));
    }
    if let Some(url) = &job.apply_url {
        push_section(&mut lines, "Apply", Some(url));
    }
    Text::from(lines)
}

fn build_result(result: &FraudResult) -> Text<'static> {
    let level = result.risk_level();
    let color = risk_color(level);
    let filled = ((result.probability * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);

    let mut lines = vec![
        bold(result.job_title.clone().unwrap_or_default()),
        Line::from(""),
        Line::from(Span::styled(
            level.label(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("Fraud probability: {}", result.percent())),
        Line::from(vec![
            Span::styled("█".repeat(filled), Style::default().fg(color)),
            Span::styled("░".repeat(BAR_WIDTH - filled), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(""),
        Line::from(result.verdict()),
        Line::from(""),
    ];

    lines.push(bold("Recommendations"));
    for advice in level.recommendations() {
        lines.push(Line::from(format!("  • {}", advice)));
    }
    Text::from(lines)
}
