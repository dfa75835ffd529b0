use anyhow::Result;
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::api::JobsClient;
use crate::board::{Board, Effect};
use crate::bookmarks::SharedBookmarks;
use crate::error::ApiResult;
use crate::models::{format_salary, JobListing, JobType, JobsPage, MAX_SALARY_CEILING};
use crate::pagination::render_labels;

const SALARY_STEP: u64 = 10_000;
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Results coming back from spawned request tasks.
enum Message {
    Jobs {
        generation: u64,
        result: ApiResult<JobsPage>,
    },
    Detail {
        id: String,
        result: ApiResult<JobListing>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Search,
    Detail,
}

struct DetailView {
    id: String,
    job: Option<JobListing>,
    loading: bool,
    error: Option<String>,
    bookmarks: SharedBookmarks,
    scroll: u16,
}

impl DetailView {
    fn is_bookmarked(&self) -> bool {
        self.bookmarks.borrow().is_bookmarked(&self.id)
    }

    fn toggle_bookmark(&self) {
        self.bookmarks.borrow_mut().toggle(&self.id);
    }
}

struct AppState {
    board: Board,
    client: JobsClient,
    tx: UnboundedSender<Message>,
    mode: Mode,
    selected: usize,
    search_input: String,
    detail: Option<DetailView>,
    refreshed_at: Option<String>,
}

impl AppState {
    fn visible(&self) -> Vec<JobListing> {
        self.board.visible_jobs()
    }

    fn current_job(&self) -> Option<JobListing> {
        self.visible().into_iter().nth(self.selected)
    }

    fn fetch(&mut self) {
        let ticket = self.board.begin_fetch();
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.list_jobs(&ticket.query).await;
            let _ = tx.send(Message::Jobs {
                generation: ticket.generation,
                result,
            });
        });
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Unchanged => {}
            Effect::Redraw => self.selected = 0,
            Effect::Fetch => {
                self.selected = 0;
                self.fetch();
            }
        }
    }

    fn handle_message(&mut self, message: Message) {
        match message {
            Message::Jobs { generation, result } => {
                if self.board.complete_fetch(generation, result) {
                    self.refreshed_at = Some(Local::now().format("%H:%M:%S").to_string());
                    let len = self.visible().len();
                    if self.selected >= len {
                        self.selected = len.saturating_sub(1);
                    }
                }
            }
            Message::Detail { id, result } => {
                let Some(detail) = self.detail.as_mut().filter(|d| d.id == id) else {
                    debug!(%id, "detail response for a closed view");
                    return;
                };
                detail.loading = false;
                match result {
                    Ok(job) => detail.job = Some(job),
                    Err(e) => detail.error = Some(e.user_message()),
                }
            }
        }
    }

    fn open_detail(&mut self) {
        let Some(job) = self.current_job() else { return };
        let id = job.id.clone();
        self.detail = Some(DetailView {
            id: id.clone(),
            job: Some(job),
            loading: true,
            error: None,
            bookmarks: self.board.bookmarks(),
            scroll: 0,
        });
        self.mode = Mode::Detail;

        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.get_job(&id).await;
            let _ = tx.send(Message::Detail { id, result });
        });
    }

    fn next(&mut self) {
        let len = self.visible().len();
        if len > 0 && self.selected < len - 1 {
            self.selected += 1;
        }
    }

    fn prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Step through the job types one at a time, then back to "all".
    fn cycle_type(&mut self) -> Effect {
        let current = self.board.filters().single_type().cloned();
        let next = match &current {
            None => JobType::ALL.first().cloned(),
            Some(t) => JobType::ALL
                .iter()
                .position(|known| known == t)
                .and_then(|i| JobType::ALL.get(i + 1).cloned()),
        };
        match (next, current) {
            (Some(t), _) => self.board.toggle_type(t),
            // toggling the selected type clears the selection
            (None, Some(t)) => self.board.toggle_type(t),
            (None, None) => Effect::Unchanged,
        }
    }

    fn adjust_salary(&mut self, raise: bool) -> Effect {
        let ceiling = self.board.filters().salary_ceiling();
        let target = if raise {
            (ceiling + SALARY_STEP).min(MAX_SALARY_CEILING)
        } else {
            ceiling.saturating_sub(SALARY_STEP)
        };
        self.board.set_salary_ceiling(target)
    }
}

pub fn run_browse(client: JobsClient, board: Board) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let search_input = board.filters().search.clone();
    let mut state = AppState {
        board,
        client,
        tx,
        mode: Mode::Browse,
        selected: 0,
        search_input,
        detail: None,
        refreshed_at: None,
    };
    state.fetch();
    info!("browse session started");

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, &mut rx);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    rx: &mut UnboundedReceiver<Message>,
) -> Result<()> {
    let mut list_state = ListState::default();

    loop {
        while let Ok(message) = rx.try_recv() {
            state.handle_message(message);
        }

        let visible = state.visible();
        list_state.select((!visible.is_empty()).then_some(state.selected));
        terminal.draw(|frame| draw(frame, state, &visible, &mut list_state))?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match state.mode {
            Mode::Search => match key.code {
                KeyCode::Enter => {
                    let input = state.search_input.clone();
                    state.board.set_search(&input);
                    let effect = state.board.submit_search();
                    state.apply(effect);
                    state.mode = Mode::Browse;
                }
                KeyCode::Esc => {
                    state.search_input = state.board.filters().search.clone();
                    state.mode = Mode::Browse;
                }
                KeyCode::Backspace => {
                    state.search_input.pop();
                }
                KeyCode::Char(c) => state.search_input.push(c),
                _ => {}
            },
            Mode::Detail => match key.code {
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Backspace => {
                    state.detail = None;
                    state.mode = Mode::Browse;
                }
                KeyCode::Char('b') => {
                    if let Some(detail) = &state.detail {
                        detail.toggle_bookmark();
                    }
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    if let Some(detail) = state.detail.as_mut() {
                        detail.scroll = detail.scroll.saturating_add(3);
                    }
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    if let Some(detail) = state.detail.as_mut() {
                        detail.scroll = detail.scroll.saturating_sub(3);
                    }
                }
                _ => {}
            },
            Mode::Browse => {
                let effect = match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Down | KeyCode::Char('j') => {
                        state.next();
                        Effect::Unchanged
                    }
                    KeyCode::Up | KeyCode::Char('k') => {
                        state.prev();
                        Effect::Unchanged
                    }
                    KeyCode::Right | KeyCode::Char('n') => state.board.next_page(),
                    KeyCode::Left | KeyCode::Char('p') => state.board.previous_page(),
                    KeyCode::Char(c @ '1'..='9') => {
                        let page = c.to_digit(10).unwrap_or(1);
                        state.board.go_to_page(page)
                    }
                    KeyCode::Char('b') => {
                        if let Some(job) = state.current_job() {
                            state.board.toggle_bookmark(&job.id);
                        }
                        Effect::Unchanged
                    }
                    KeyCode::Char('t') => state.cycle_type(),
                    KeyCode::Char('+') | KeyCode::Char('=') => state.adjust_salary(true),
                    KeyCode::Char('-') => state.adjust_salary(false),
                    KeyCode::Char('/') => {
                        state.mode = Mode::Search;
                        Effect::Unchanged
                    }
                    KeyCode::Char('r') => {
                        state.search_input.clear();
                        state.board.reset_filters()
                    }
                    KeyCode::Enter => {
                        state.open_detail();
                        Effect::Unchanged
                    }
                    _ => Effect::Unchanged,
                };
                state.apply(effect);
            }
        }
    }
    Ok(())
}

fn draw(frame: &mut Frame, state: &AppState, visible: &[JobListing], list_state: &mut ListState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    frame.render_widget(build_filter_bar(state), rows[0]);

    if state.mode == Mode::Detail {
        if let Some(detail) = &state.detail {
            let widget = Paragraph::new(build_detail_view(detail))
                .block(Block::default().borders(Borders::ALL).title(" Job Details "))
                .wrap(Wrap { trim: false })
                .scroll((detail.scroll, 0));
            frame.render_widget(widget, rows[1]);
        }
    } else {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(35),
                Constraint::Percentage(40),
                Constraint::Percentage(25),
            ])
            .split(rows[1]);

        // Left panel: current page
        let title = if state.board.is_loading() {
            " Jobs (loading...) ".to_string()
        } else {
            format!(" Jobs ({}) ", state.board.total_items())
        };
        let items: Vec<ListItem> = if visible.is_empty() && !state.board.is_loading() {
            vec![ListItem::new("No jobs found.")]
        } else {
            visible.iter().map(job_list_item).collect()
        };
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, columns[0], list_state);

        // Middle panel: selected job preview
        let preview = match visible.get(state.selected) {
            Some(job) => build_detail(job),
            None => Text::raw("No job selected"),
        };
        let preview = Paragraph::new(preview)
            .block(Block::default().borders(Borders::ALL).title(" Detail "))
            .wrap(Wrap { trim: false });
        frame.render_widget(preview, columns[1]);

        // Right panel: saved jobs
        let saved: Vec<ListItem> = state
            .board
            .saved_jobs()
            .iter()
            .map(|job| ListItem::new(format!("* {} | {}", job.title, job.company)))
            .collect();
        let saved = List::new(saved).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Saved ({}) ", state.board.bookmarks().borrow().len())),
        );
        frame.render_widget(saved, columns[2]);
    }

    let paginator = state.board.paginator();
    let mut status = format!(
        " {} Page {} {}",
        if paginator.has_previous() { "<" } else { " " },
        render_labels(paginator),
        if paginator.has_next() { ">" } else { " " },
    );
    if let Some(err) = state.board.last_error() {
        status.push_str(&format!("   error: {}", err));
    } else if let Some(at) = &state.refreshed_at {
        status.push_str(&format!("   updated {}", at));
    }
    let status_style = if state.board.last_error().is_some() {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    };
    frame.render_widget(Paragraph::new(status).style(status_style), rows[2]);

    let help = match state.mode {
        Mode::Browse => {
            " j/k:move  n/p:page  1-9:jump  b:bookmark  t:type  +/-:salary  /:search  r:reset  enter:open  q:quit"
        }
        Mode::Search => " type to search  enter:submit  esc:cancel",
        Mode::Detail => " j/k:scroll  b:bookmark  esc:back",
    };
    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        rows[3],
    );
}

fn job_list_item(job: &JobListing) -> ListItem<'static> {
    let marker = if job.bookmarked { "*" } else { " " };
    let title = if job.title.chars().count() > 30 {
        format!("{}...", job.title.chars().take(27).collect::<String>())
    } else {
        job.title.clone()
    };
    ListItem::new(format!("{} {} | {}", marker, title, job.company))
}

fn build_filter_bar(state: &AppState) -> Paragraph<'static> {
    let filters = state.board.filters();
    let search = if state.mode == Mode::Search {
        format!("{}_", state.search_input)
    } else if filters.search.is_empty() {
        "(any)".to_string()
    } else {
        filters.search.clone()
    };
    let job_type = filters
        .single_type()
        .map(|t| t.label().to_string())
        .unwrap_or_else(|| "All".to_string());
    let salary = if filters.has_salary_filter() {
        format!("$0 - {}", format_salary(Some(filters.salary_ceiling())))
    } else {
        "any".to_string()
    };

    let search_style = if state.mode == Mode::Search {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let line = Line::from(vec![
        Span::styled("Search: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(search, search_style),
        Span::raw("   "),
        Span::styled("Type: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(job_type, Style::default().fg(Color::Cyan)),
        Span::raw("   "),
        Span::styled("Salary: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(salary, Style::default().fg(Color::Green)),
    ]);
    Paragraph::new(line).block(Block::default().borders(Borders::ALL).title(" Filter "))
}

fn build_detail(job: &JobListing) -> Text<'static> {
    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(
        job.title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    if !job.company.is_empty() {
        lines.push(Line::from(format!("at {}", job.company)));
    }
    if job.bookmarked {
        lines.push(Line::from(Span::styled("Saved", Style::default().fg(Color::Yellow))));
    }
    lines.push(Line::from(""));

    lines.push(Line::from(format!("Type: {}", job.job_type.label())));
    if !job.location.is_empty() {
        lines.push(Line::from(format!("Location: {}", job.location)));
    }
    if !job.experience_level.is_empty() {
        lines.push(Line::from(format!("Experience: {}", job.experience_level)));
    }
    lines.push(Line::from(format!("Salary: {}", format_salary(job.salary))));
    lines.push(Line::from(""));

    if job.description.is_empty() {
        lines.push(Line::from(Span::styled(
            "(No description)",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        for line in textwrap::fill(&job.description, 70).lines() {
            lines.push(Line::from(line.to_string()));
        }
    }

    Text::from(lines)
}

fn build_detail_view(detail: &DetailView) -> Text<'static> {
    let mut text = match &detail.job {
        Some(job) => {
            let job = JobListing {
                bookmarked: detail.is_bookmarked(),
                ..job.clone()
            };
            build_detail(&job)
        }
        None => Text::raw("Job not found"),
    };
    if let Some(logo) = detail.job.as_ref().map(|j| j.logo.as_str()).filter(|l| !l.is_empty()) {
        text.push_line(Line::from(""));
        text.push_line(Line::from(format!("Logo: {}", logo)));
    }
    if detail.loading {
        text.push_line(Line::from(Span::styled(
            "Refreshing...",
            Style::default().fg(Color::DarkGray),
        )));
    }
    if let Some(err) = &detail.error {
        text.push_line(Line::from(Span::styled(
            format!("Could not load details: {}", err),
            Style::default().fg(Color::Red),
        )));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmarks::BookmarkTracker;
    use crate::models::sample_listing;
    use crate::window::PaginationPolicy;

    fn state() -> AppState {
        let (tx, _rx) = mpsc::unbounded_channel();
        AppState {
            board: Board::new(PaginationPolicy::Client, 5, 50, BookmarkTracker::shared()),
            client: JobsClient::new("http://localhost:9/api", Duration::from_secs(1)).unwrap(),
            tx,
            mode: Mode::Browse,
            selected: 0,
            search_input: String::new(),
            detail: None,
            refreshed_at: None,
        }
    }

    #[test]
    fn test_cycle_type_walks_all_types_then_clears() {
        let mut s = state();
        for expected in JobType::ALL.iter() {
            s.cycle_type();
            assert_eq!(s.board.filters().single_type(), Some(expected));
        }
        s.cycle_type();
        assert!(s.board.filters().selected_types().is_empty());
    }

    #[test]
    fn test_adjust_salary_steps_and_clamps() {
        let mut s = state();
        assert_eq!(s.adjust_salary(true), Effect::Unchanged);
        s.adjust_salary(false);
        assert_eq!(s.board.filters().salary_ceiling(), MAX_SALARY_CEILING - SALARY_STEP);
        s.adjust_salary(true);
        assert!(!s.board.filters().has_salary_filter());
    }

    #[test]
    fn test_jobs_message_updates_board_and_clamps_selection() {
        let mut s = state();
        s.selected = 4;
        let ticket = s.board.begin_fetch();
        let jobs = (0..2)
            .map(|i| sample_listing(&i.to_string(), JobType::Hybrid, None))
            .collect();
        s.handle_message(Message::Jobs {
            generation: ticket.generation,
            result: Ok(JobsPage { jobs, ..Default::default() }),
        });
        assert_eq!(s.visible().len(), 2);
        assert_eq!(s.selected, 1);
        assert!(s.refreshed_at.is_some());
    }

    #[test]
    fn test_detail_view_shares_bookmarks_with_board() {
        let mut s = state();
        s.detail = Some(DetailView {
            id: "7".to_string(),
            job: None,
            loading: true,
            error: None,
            bookmarks: s.board.bookmarks(),
            scroll: 0,
        });
        s.detail.as_ref().unwrap().toggle_bookmark();
        assert!(s.board.bookmarks().borrow().is_bookmarked("7"));

        s.handle_message(Message::Detail {
            id: "other".to_string(),
            result: Ok(sample_listing("other", JobType::Contract, None)),
        });
        assert!(s.detail.as_ref().unwrap().job.is_none());

        s.handle_message(Message::Detail {
            id: "7".to_string(),
            result: Ok(sample_listing("7", JobType::Contract, None)),
        });
        let detail = s.detail.as_ref().unwrap();
        assert!(!detail.loading);
        assert!(detail.is_bookmarked());
        assert_eq!(detail.job.as_ref().map(|j| j.id.as_str()), Some("7"));
    }
}
