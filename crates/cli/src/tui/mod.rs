pub mod form;

use std::io::stdout;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph},
    Frame, Terminal,
};

use woodshu_engine::chart::{ChartMemo, Figure, Subplot};
use woodshu_engine::completion::Completer;
use woodshu_engine::prompt::{CritiqueRequest, MaterialRequest, ProjectRequest};
use woodshu_engine::session::{Page, Session};
use woodshu_engine::table::IndexColumn;
use woodshu_engine::workflow::{PageState, TriggerOutcome};

use crate::render;
use crate::util;
use form::{FieldKind, Form, WoodForm};

const FORM_WIDTH: u16 = 44;

/// Blocking work queued by a key press, run after the next draw so the
/// "working" status is on screen while the request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Trigger,
    Refresh,
}

struct TuiApp<C: Completer> {
    session: Session,
    completer: C,
    critique_form: CritiqueRequest,
    project_form: ProjectRequest,
    wood_form: WoodForm,
    /// Focused field per page, indexed by `Page::index`
    focus: [usize; 3],
    /// Result panel scroll per page
    scroll: [u16; 3],
    editing: bool,
    pending: Option<Action>,
    notice: Option<String>,
    chart_memo: ChartMemo,
    should_quit: bool,
    show_help: bool,
}

impl<C: Completer> TuiApp<C> {
    fn new(session: Session, completer: C) -> Self {
        let names = session
            .wood()
            .map(|page| page.use_case().table.names().into_iter().map(str::to_string).collect())
            .unwrap_or_default();
        Self {
            session,
            completer,
            critique_form: CritiqueRequest::default(),
            project_form: ProjectRequest::default(),
            wood_form: WoodForm::new(names),
            focus: [0; 3],
            scroll: [0; 3],
            editing: false,
            pending: None,
            notice: None,
            chart_memo: ChartMemo::new(),
            should_quit: false,
            show_help: false,
        }
    }

    fn page(&self) -> Page {
        self.session.active()
    }

    fn form(&self) -> &dyn Form {
        match self.page() {
            Page::Critique => &self.critique_form,
            Page::Project => &self.project_form,
            Page::Wood => &self.wood_form,
        }
    }

    fn form_mut(&mut self) -> &mut dyn Form {
        match self.page() {
            Page::Critique => &mut self.critique_form,
            Page::Project => &mut self.project_form,
            Page::Wood => &mut self.wood_form,
        }
    }

    fn focus(&self) -> usize {
        self.focus[self.page().index()]
    }

    /// Critique and project inputs freeze once answered; the wood pick
    /// stays live because refresh uses it.
    fn inputs_editable(&self) -> bool {
        match self.page() {
            Page::Critique => self.session.critique.inputs_editable(),
            Page::Project => self.session.project.inputs_editable(),
            Page::Wood => true,
        }
    }

    fn switch_page(&mut self, page: Page) {
        self.editing = false;
        self.session.set_active(page);
    }

    fn handle_key(&mut self, key: KeyEvent) {
        // A notice lasts until the next key press
        self.notice = None;
        if self.show_help {
            self.show_help = false;
            return;
        }
        if self.editing {
            self.handle_edit_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Tab => self.switch_page(self.page().next()),
            KeyCode::BackTab => self.switch_page(self.page().prev()),
            KeyCode::Char(c @ '1'..='3') => {
                let idx = (c as usize) - ('1' as usize);
                self.switch_page(Page::ALL[idx]);
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_focus(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_focus(1),
            KeyCode::Left | KeyCode::Char('h') => self.step_field(-1),
            KeyCode::Right | KeyCode::Char('l') => self.step_field(1),
            KeyCode::PageUp => self.scroll_result(-10),
            KeyCode::PageDown => self.scroll_result(10),
            KeyCode::Enter => self.on_enter(),
            KeyCode::Char('c') => self.clear(),
            KeyCode::Char('r') => self.queue(Action::Refresh),
            _ => {}
        }
    }

    fn handle_edit_key(&mut self, key: KeyEvent) {
        let field = self.focus();
        match key.code {
            KeyCode::Enter | KeyCode::Esc => self.editing = false,
            KeyCode::Backspace => {
                if let Some(text) = self.form_mut().text_mut(field) {
                    text.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(text) = self.form_mut().text_mut(field) {
                    text.push(c);
                }
            }
            _ => {}
        }
    }

    fn move_focus(&mut self, delta: i32) {
        let count = self.form().fields().len().max(1) as i32;
        let idx = self.page().index();
        self.focus[idx] = (self.focus[idx] as i32 + delta).rem_euclid(count) as usize;
    }

    fn step_field(&mut self, delta: i32) {
        if !self.inputs_editable() {
            self.notice = Some("Inputs are locked while a result is shown; press c to clear".to_string());
            return;
        }
        let field = self.focus();
        self.form_mut().step(field, delta);
    }

    fn scroll_result(&mut self, delta: i32) {
        let idx = self.page().index();
        self.scroll[idx] = (self.scroll[idx] as i32 + delta).max(0) as u16;
    }

    fn on_enter(&mut self) {
        let field = self.focus();
        let is_text = self
            .form()
            .fields()
            .get(field)
            .is_some_and(|f| f.kind == FieldKind::Text);
        if is_text && self.inputs_editable() {
            self.editing = true;
        } else {
            self.queue(Action::Trigger);
        }
    }

    fn queue(&mut self, action: Action) {
        if action == Action::Refresh && self.page() != Page::Wood {
            return;
        }
        if self.page() == Page::Wood && self.wood_form.is_empty() {
            self.notice = Some("No wood species to look up".to_string());
            return;
        }
        let working = match self.page() {
            Page::Critique => "Getting your feedback...",
            Page::Project => "Developing your project...",
            Page::Wood => "Summarizing key wood details...",
        };
        self.notice = Some(working.to_string());
        self.pending = Some(action);
    }

    /// Run the queued request. Blocks until the completer returns.
    fn run_pending(&mut self) {
        let Some(action) = self.pending.take() else {
            return;
        };
        let outcome = match self.page() {
            Page::Critique => {
                if self.session.critique.is_idle() && self.critique_form.image_url.trim().is_empty() {
                    self.notice = Some("Enter an image URL to evaluate".to_string());
                    return;
                }
                self.session
                    .critique
                    .trigger(self.critique_form.clone(), &self.completer)
            }
            Page::Project => self
                .session
                .project
                .trigger(self.project_form.clone(), &self.completer),
            Page::Wood => {
                let Some(name) = self.wood_form.selected() else {
                    self.notice = Some("No wood species to look up".to_string());
                    return;
                };
                let request = MaterialRequest::new(name);
                match self.session.wood_mut() {
                    Ok(page) => match action {
                        Action::Trigger => page.trigger(request, &self.completer),
                        Action::Refresh => page.refresh(request, &self.completer),
                    },
                    Err(e) => {
                        self.notice = Some(e.to_string());
                        return;
                    }
                }
            }
        };

        self.notice = match outcome {
            TriggerOutcome::Completed => {
                self.scroll[self.page().index()] = 0;
                Some(match self.page() {
                    Page::Wood => "Here you are, you eager beaver!".to_string(),
                    _ => "Done. Press c to clear".to_string(),
                })
            }
            TriggerOutcome::Failed(e) => Some(e.to_string()),
            TriggerOutcome::Ignored => Some(match (self.page(), action) {
                (Page::Wood, Action::Trigger) => {
                    "Already showing a result; r asks again for the selected wood, c clears".to_string()
                }
                (Page::Wood, Action::Refresh) => "Nothing to refresh yet; press Enter first".to_string(),
                _ => "Already showing a result; press c to clear".to_string(),
            }),
        };
    }

    fn clear(&mut self) {
        self.editing = false;
        if self.session.clear_active() {
            self.scroll[self.page().index()] = 0;
            self.notice = Some("Cleared".to_string());
        }
    }

    // ------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

        self.draw_title(frame, chunks[0]);
        self.draw_tab_bar(frame, chunks[1]);

        let body = Layout::horizontal([Constraint::Length(FORM_WIDTH), Constraint::Min(10)])
            .split(chunks[2]);
        self.draw_form(frame, body[0]);
        match self.page() {
            Page::Critique | Page::Project => self.draw_text_result(frame, body[1]),
            Page::Wood => self.draw_wood(frame, body[1]),
        }

        self.draw_status(frame, chunks[3]);

        if self.show_help {
            self.draw_help(frame, area);
        }
    }

    fn draw_title(&self, frame: &mut Frame, area: Rect) {
        let title = format!(" Woodshu: Your Woodcarving Tutor | {} ", self.page().title());
        let para = Paragraph::new(Line::from(vec![Span::styled(
            title,
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )]))
        .style(Style::default().bg(Color::Cyan));
        frame.render_widget(para, area);
    }

    fn draw_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let mut spans = Vec::new();
        for page in Page::ALL {
            let label = format!(" {}:{} ", page.index() + 1, page.title());
            if page == self.page() {
                spans.push(Span::styled(
                    label,
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ));
            } else {
                spans.push(Span::styled(
                    label,
                    Style::default().fg(Color::Gray).bg(Color::DarkGray),
                ));
            }
            spans.push(Span::styled(" ", Style::default().bg(Color::Black)));
        }
        let para = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
        frame.render_widget(para, area);
    }

    fn draw_form(&self, frame: &mut Frame, area: Rect) {
        let editable = self.inputs_editable();
        let focus = self.focus();
        let value_width = (FORM_WIDTH as usize).saturating_sub(8);
        let mut lines: Vec<Line> = Vec::new();

        for (i, field) in self.form().fields().iter().enumerate() {
            let focused = i == focus;
            let label_style = if focused {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Cyan)
            };
            lines.push(Line::from(Span::styled(field.label, label_style)));

            let value = util::truncate_display(&field.value, value_width);
            let shown = match field.kind {
                FieldKind::Text if focused && self.editing => format!("  {}_", value),
                FieldKind::Text => format!("  {}", value),
                FieldKind::Choice | FieldKind::Number => format!("  < {} >", value),
            };
            let value_style = if !editable {
                Style::default().fg(Color::DarkGray)
            } else if focused {
                Style::default().fg(Color::Black).bg(Color::White)
            } else {
                Style::default().fg(Color::White)
            };
            lines.push(Line::from(Span::styled(shown, value_style)));
            lines.push(Line::default());
        }

        let hint = Style::default().fg(Color::Gray);
        let action = match self.page() {
            Page::Critique => "Enter  Evaluate My Carving",
            Page::Project => "Enter  Generate a Project for Me",
            Page::Wood => "Enter  Tell me more about this wood species!",
        };
        lines.push(Line::from(Span::styled(action, hint)));
        if self.page() == Page::Wood {
            lines.push(Line::from(Span::styled("r      Tell me more about my new wood species!", hint)));
        }
        lines.push(Line::from(Span::styled("c      Clear", hint)));

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Inputs ");
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn result_block(title: &str) -> Block<'_> {
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(title)
    }

    fn draw_text_result(&self, frame: &mut Frame, area: Rect) {
        let width = area.width.saturating_sub(2) as usize;
        let (title, lines) = match self.page() {
            Page::Critique => {
                let lines = match self.session.critique.state() {
                    PageState::Completed(exchange) => {
                        let mut lines = vec![
                            Line::from(Span::styled(
                                format!("Your Submission: {}", exchange.request.image_url),
                                Style::default().fg(Color::Cyan),
                            )),
                            Line::default(),
                        ];
                        lines.extend(text_lines(&exchange.output, width));
                        lines
                    }
                    state => state_lines(state.name(), self.session.critique.error()),
                };
                (" Your Evaluation Results ", lines)
            }
            _ => {
                let lines = match self.session.project.state() {
                    PageState::Completed(exchange) => text_lines(&exchange.output, width),
                    state => state_lines(state.name(), self.session.project.error()),
                };
                (" Your Project ", lines)
            }
        };

        let para = Paragraph::new(lines)
            .block(Self::result_block(title))
            .scroll((self.scroll[self.page().index()], 0));
        frame.render_widget(para, area);
    }

    fn draw_wood(&mut self, frame: &mut Frame, area: Rect) {
        let (table, cached) = match self.session.wood() {
            Ok(page) => (
                page.use_case().table.clone(),
                page.exchange().map(|e| (e.request.material_name.clone(), e.output.clone())),
            ),
            Err(e) => {
                let para = Paragraph::new(vec![
                    Line::from(Span::styled(e.to_string(), Style::default().fg(Color::Red))),
                    Line::default(),
                    Line::from("Set data.referencePath in settings.json or pass --data"),
                ])
                .block(Self::result_block(" Wood Wonderland "));
                frame.render_widget(para, area);
                return;
            }
        };

        // A cached answer pins the view to the wood it describes
        let highlight = match &cached {
            Some((name, _)) => name.clone(),
            None => self.wood_form.selected().unwrap_or_default().to_string(),
        };
        let subset = match &cached {
            Some((_, report)) => report.subset.clone(),
            None => table.subset(&highlight),
        };

        let chunks = Layout::vertical([
            Constraint::Length(subset.len() as u16 + 5),
            Constraint::Percentage(55),
            Constraint::Min(4),
        ])
        .split(area);

        let mut table_lines: Vec<Line> = render::reference_rows(&subset)
            .into_iter()
            .map(Line::from)
            .collect();
        table_lines.push(Line::from(Span::styled(
            render::DATA_CREDIT,
            Style::default().fg(Color::DarkGray),
        )));
        frame.render_widget(
            Paragraph::new(table_lines).block(Self::result_block(" Numeric Summary ")),
            chunks[0],
        );

        let figure = self.chart_memo.get_or_render(&table, &highlight, &IndexColumn::ALL);
        draw_figure(frame, chunks[1], &figure);

        let width = chunks[2].width.saturating_sub(2) as usize;
        let lines = match (&cached, self.session.wood()) {
            (Some((_, report)), _) => text_lines(&report.text, width),
            (None, Ok(page)) => state_lines(page.state().name(), page.error()),
            (None, Err(_)) => Vec::new(),
        };
        let para = Paragraph::new(lines)
            .block(Self::result_block(" About This Wood "))
            .scroll((self.scroll[Page::Wood.index()], 0));
        frame.render_widget(para, chunks[2]);
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let (text, style) = if let Some(notice) = &self.notice {
            (notice.clone(), Style::default().fg(Color::Black).bg(Color::Yellow))
        } else if let Some(err) = self.session.config_error() {
            (err.to_string(), Style::default().fg(Color::White).bg(Color::Red))
        } else if self.editing {
            ("Editing: type to change, Enter to finish".to_string(), Style::default().fg(Color::Black).bg(Color::DarkGray))
        } else {
            (
                "Tab: page  Up/Down: field  Left/Right: change  PgUp/PgDn: scroll  ?: help  q: quit".to_string(),
                Style::default().fg(Color::Black).bg(Color::DarkGray),
            )
        };
        let text = util::pad_right(&format!(" {}", text), area.width as usize);
        let para = Paragraph::new(Line::from(Span::styled(text, style))).style(style);
        frame.render_widget(para, area);
    }

    fn draw_help(&self, frame: &mut Frame, area: Rect) {
        let help_lines = [
            "",
            "  Pages",
            "  -----",
            "  Tab / Shift+Tab   Next/prev page",
            "  1..3              Jump to page",
            "",
            "  Inputs",
            "  ------",
            "  Up/Down / jk      Move between fields",
            "  Left/Right / hl   Change choice or number",
            "  Enter             Edit text field / submit",
            "",
            "  Results",
            "  -------",
            "  Enter             Ask Woodshu",
            "  r                 Ask again for new wood",
            "  c                 Clear the result",
            "  PgUp / PgDn       Scroll",
            "",
            "  q / Esc           Quit",
            "",
        ];
        let help_width: u16 = 48;
        let help_height: u16 = help_lines.len() as u16 + 2;

        let x = area.width.saturating_sub(help_width) / 2;
        let y = area.height.saturating_sub(help_height) / 2;
        let popup = Rect::new(
            area.x + x,
            area.y + y,
            help_width.min(area.width),
            help_height.min(area.height),
        );

        let lines: Vec<Line> = help_lines
            .iter()
            .map(|s| Line::from(Span::styled(*s, Style::default().fg(Color::White))))
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Keybindings ")
            .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .style(Style::default().bg(Color::Black));

        frame.render_widget(Clear, popup);
        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }
}

fn text_lines(text: &str, width: usize) -> Vec<Line<'static>> {
    util::wrap(text, width).into_iter().map(Line::from).collect()
}

fn state_lines(state: &str, error: Option<&woodshu_engine::WorkflowError>) -> Vec<Line<'static>> {
    match error {
        Some(err) => vec![
            Line::from(Span::styled(err.to_string(), Style::default().fg(Color::Red))),
            Line::default(),
            Line::from(Span::styled(
                "Press Enter to try again or c to clear",
                Style::default().fg(Color::Gray),
            )),
        ],
        None => vec![Line::from(Span::styled(
            format!("({}) Fill in the inputs and press Enter", state),
            Style::default().fg(Color::DarkGray),
        ))],
    }
}

/// Lay the figure out in its grid, one chart per cell.
fn draw_figure(frame: &mut Frame, area: Rect, figure: &Figure) {
    let rows = Layout::vertical(vec![Constraint::Ratio(1, figure.rows as u32); figure.rows]).split(area);
    for (r, row_area) in rows.iter().enumerate() {
        let cells =
            Layout::horizontal(vec![Constraint::Ratio(1, figure.cols as u32); figure.cols]).split(*row_area);
        for (c, cell) in cells.iter().enumerate() {
            match figure.cell(r, c) {
                Some(subplot) => draw_subplot(frame, *cell, subplot),
                None => frame.render_widget(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::DarkGray)),
                    *cell,
                ),
            }
        }
    }
}

fn draw_subplot(frame: &mut Frame, area: Rect, subplot: &Subplot) {
    let Some((lo, hi)) = subplot.x_bounds() else {
        let para = Paragraph::new("(no values)").block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", subplot.title)),
        );
        frame.render_widget(para, area);
        return;
    };

    let bars: Vec<(f64, f64)> = subplot.bins.iter().map(|b| (b.mid(), b.count as f64)).collect();
    let peak = subplot
        .density
        .iter()
        .map(|(_, y)| *y)
        .fold(subplot.max_count() as f64, f64::max)
        .max(1.0);
    let y_max = peak * 1.1;
    let marker: Vec<(f64, f64)> = subplot
        .marker
        .map(|m| vec![(m, 0.0), (m, y_max)])
        .unwrap_or_default();

    let mut datasets = vec![
        Dataset::default()
            .marker(symbols::Marker::HalfBlock)
            .graph_type(GraphType::Bar)
            .style(Style::default().fg(Color::LightBlue))
            .data(&bars),
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&subplot.density),
    ];
    if !marker.is_empty() {
        datasets.push(
            Dataset::default()
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Red))
                .data(&marker),
        );
    }

    let title = match subplot.marker {
        Some(v) => format!(" {} ({}) ", subplot.title, render::format_value(Some(v))),
        None => format!(" {} ", subplot.title),
    };
    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(title),
        )
        .x_axis(
            Axis::default()
                .bounds([lo, hi])
                .labels(vec![
                    Span::raw(render::format_value(Some(lo))),
                    Span::raw(render::format_value(Some(hi))),
                ])
                .style(Style::default().fg(Color::Gray)),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, y_max])
                .labels(vec![Span::raw("0"), Span::raw(format!("{}", subplot.max_count()))])
                .style(Style::default().fg(Color::Gray)),
        );

    frame.render_widget(chart, area);
}

/// Run the interactive tutor until the user quits.
pub fn run<C: Completer>(session: Session, completer: C) -> Result<(), String> {
    let app = TuiApp::new(session, completer);
    run_app(app)
}

fn run_app<C: Completer>(mut app: TuiApp<C>) -> Result<(), String> {
    terminal::enable_raw_mode().map_err(|e| format!("failed to enable raw mode: {}", e))?;
    stdout()
        .execute(EnterAlternateScreen)
        .map_err(|e| format!("failed to enter alternate screen: {}", e))?;

    struct Cleanup;
    impl Drop for Cleanup {
        fn drop(&mut self) {
            let _ = stdout().execute(LeaveAlternateScreen);
            let _ = terminal::disable_raw_mode();
        }
    }
    let _cleanup = Cleanup;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| format!("failed to create terminal: {}", e))?;

    loop {
        terminal
            .draw(|frame| app.draw(frame))
            .map_err(|e| format!("draw error: {}", e))?;

        if app.pending.is_some() {
            app.run_pending();
            continue;
        }

        if event::poll(Duration::from_millis(100))
            .map_err(|e| format!("event poll error: {}", e))?
        {
            if let Event::Key(key) = event::read().map_err(|e| format!("event read error: {}", e))? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::Arc;

    use crossterm::event::KeyModifiers;
    use ratatui::backend::TestBackend;
    use woodshu_engine::completion::CompletionRequest;
    use woodshu_engine::session::SessionParams;
    use woodshu_engine::table::{ReferenceRow, WoodTable};
    use woodshu_engine::WorkflowError;

    /// Answers every request with a numbered reply.
    struct Counting {
        calls: Cell<usize>,
        fail: bool,
    }

    impl Counting {
        fn new() -> Self {
            Self { calls: Cell::new(0), fail: false }
        }
    }

    impl Completer for Counting {
        fn complete(&self, request: &CompletionRequest) -> Result<String, WorkflowError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(WorkflowError::Service("HTTP 500".to_string()));
            }
            let first = request.user.lines().next().unwrap_or_default().to_string();
            Ok(format!("answer {}: {}", self.calls.get(), first))
        }
    }

    fn app_with(completer: Counting) -> TuiApp<Counting> {
        let table = Arc::new(WoodTable::from_rows(vec![
            ReferenceRow::new("Ash", [Some(52.0), Some(1320.0), Some(12.0), Some(103.4), Some(51.1)]),
            ReferenceRow::new("Basswood", [Some(18.0), Some(410.0), Some(10.1), Some(60.0), Some(32.6)]),
            ReferenceRow::new("Red Oak", [Some(48.0), Some(1290.0), Some(12.5), Some(99.2), Some(46.8)]),
        ]));
        TuiApp::new(Session::new(SessionParams::default(), Ok(table), None), completer)
    }

    fn press(app: &mut TuiApp<Counting>, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
        app.run_pending();
    }

    fn screen(app: &mut TuiApp<Counting>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 50)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn enter_on_text_field_edits_instead_of_submitting() {
        let mut app = app_with(Counting::new());
        press(&mut app, KeyCode::Enter);
        assert!(app.editing);
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Char('X'));
        press(&mut app, KeyCode::Enter);
        assert!(!app.editing);
        assert!(app.critique_form.image_url.ends_with('X'));
        assert_eq!(app.completer.calls.get(), 0);
    }

    #[test]
    fn second_enter_does_not_call_again() {
        let mut app = app_with(Counting::new());
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert!(app.session.critique.exchange().is_some());

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.completer.calls.get(), 1);
        assert!(app.notice.as_deref().unwrap().contains("press c to clear"));

        // Inputs stay frozen until cleared
        let before = app.critique_form.clone();
        press(&mut app, KeyCode::Right);
        assert_eq!(app.critique_form, before);

        press(&mut app, KeyCode::Char('c'));
        assert!(app.session.critique.is_idle());
        press(&mut app, KeyCode::Right);
        assert_ne!(app.critique_form, before);
    }

    #[test]
    fn wood_refresh_uses_new_selection() {
        let mut app = app_with(Counting::new());
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.page(), Page::Wood);

        press(&mut app, KeyCode::Enter);
        let exchange = app.session.wood().unwrap().exchange().unwrap();
        assert_eq!(exchange.request.material_name, "Ash");

        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Char('r'));
        let exchange = app.session.wood().unwrap().exchange().unwrap();
        assert_eq!(exchange.request.material_name, "Basswood");
        assert_eq!(exchange.output.subset[0].common_name, "Basswood");
        assert_eq!(app.completer.calls.get(), 2);
    }

    #[test]
    fn refresh_is_ignored_off_the_wood_page() {
        let mut app = app_with(Counting::new());
        press(&mut app, KeyCode::Char('r'));
        assert!(app.pending.is_none());
        assert_eq!(app.completer.calls.get(), 0);
    }

    #[test]
    fn failure_is_shown_and_retry_allowed() {
        let mut app = app_with(Counting { calls: Cell::new(0), fail: true });
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.session.project.state().name(), "failed");
        assert!(app.notice.as_deref().unwrap().contains("HTTP 500"));

        app.completer.fail = false;
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.session.project.state().name(), "completed");
        assert_eq!(app.completer.calls.get(), 2);
    }

    #[test]
    fn pages_draw_without_panicking() {
        let mut app = app_with(Counting::new());
        let text = screen(&mut app);
        assert!(text.contains("Carving Critique"));
        assert!(text.contains("Evaluate My Carving"));

        press(&mut app, KeyCode::Char('3'));
        press(&mut app, KeyCode::Enter);
        let text = screen(&mut app);
        assert!(text.contains("Numeric Summary"));
        assert!(text.contains("Janka Index"));
        assert!(text.contains("answer 1"));

        app.show_help = true;
        assert!(screen(&mut app).contains("Keybindings"));
    }

    #[test]
    fn missing_data_only_blanks_wood_page() {
        let session = Session::new(
            SessionParams::default(),
            Err(WorkflowError::DataUnavailable("woodHardness.csv: not found".to_string())),
            None,
        );
        let mut app = TuiApp::new(session, Counting::new());
        press(&mut app, KeyCode::Char('3'));
        assert!(app.wood_form.is_empty());
        assert!(screen(&mut app).contains("woodHardness.csv: not found"));

        press(&mut app, KeyCode::Enter);
        assert!(app.pending.is_none());
        assert_eq!(app.notice.as_deref(), Some("No wood species to look up"));

        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Enter);
        assert!(app.session.project.exchange().is_some());
    }

    #[test]
    fn config_error_returns_after_notice_is_dismissed() {
        let table = Arc::new(WoodTable::from_rows(vec![ReferenceRow::new("Ash", [Some(52.0); 5])]));
        let session = Session::new(
            SessionParams::default(),
            Ok(table),
            Some(WorkflowError::Configuration("No API key found".to_string())),
        );
        let mut app = TuiApp::new(session, Counting::new());
        let status = |app: &mut TuiApp<Counting>| screen(app).lines().last().unwrap_or_default().to_string();
        assert!(status(&mut app).contains("No API key found"));

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('c'));
        assert!(status(&mut app).contains("Cleared"));

        press(&mut app, KeyCode::Down);
        assert!(app.notice.is_none());
        assert!(status(&mut app).contains("No API key found"));
    }

    #[test]
    fn blank_image_url_is_not_sent() {
        let mut app = app_with(Counting::new());
        press(&mut app, KeyCode::Enter);
        for _ in 0..app.critique_form.image_url.len() {
            press(&mut app, KeyCode::Backspace);
        }
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Enter);
        assert!(app.critique_form.image_url.trim().is_empty());

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.completer.calls.get(), 0);
        assert!(app.session.critique.is_idle());
        assert!(app.notice.as_deref().unwrap().contains("image URL"));
    }
}
