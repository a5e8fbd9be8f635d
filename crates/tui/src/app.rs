use std::{future::Future, io, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use gamecat_core::{
    catalogue::{CatalogueError, Confirmation, EditState, RemovalRequest},
    CatalogueController, CatalogueState, GameDraft, GameRecord,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::{spawn, sync::mpsc};
use tracing::{debug, error, info};

use crate::form::{FormField, FormFocus, FormKind};

const TICK_RATE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Browse,
    Search,
    Form(FormKind),
    ConfirmDelete(RemovalRequest),
}

enum AppEvent {
    Input(Event),
    Tick,
    Finished {
        operation: &'static str,
        result: std::result::Result<(), CatalogueError>,
    },
}

/// Terminal frontend over a [`CatalogueController`].
pub struct CatalogueApp {
    controller: CatalogueController,
    mode: Mode,
    focus: FormFocus,
    cursor: usize,
    offset: usize,
    list_height: usize,
    should_quit: bool,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    theme: Theme,
}

impl CatalogueApp {
    pub fn new(controller: CatalogueController) -> Self {
        Self {
            controller,
            mode: Mode::Browse,
            focus: FormFocus::start(&GameDraft::default()),
            cursor: 0,
            offset: 0,
            list_height: 1,
            should_quit: false,
            event_tx: None,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);

        self.spawn_operation("load", |controller| async move { controller.load().await });

        loop {
            self.sync_mode();
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }

            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        Ok(())
    }

    fn spawn_operation<F, Fut>(&self, operation: &'static str, op: F)
    where
        F: FnOnce(CatalogueController) -> Fut,
        Fut: Future<Output = std::result::Result<(), CatalogueError>> + Send + 'static,
    {
        let Some(sender) = self.event_tx.clone() else {
            error!("event_channel_missing");
            return;
        };
        let task = op(self.controller.clone());
        debug!(operation, "Spawning operation");
        spawn(async move {
            let result = task.await;
            let _ = sender.send(AppEvent::Finished { operation, result }).await;
        });
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                if let Err(err) = self.handle_input(event) {
                    error!(?err, "Input handling failed");
                }
                true
            }
            Some(AppEvent::Tick) => true,
            Some(AppEvent::Finished { operation, result }) => {
                match result {
                    Ok(()) => info!(operation, "Operation finished"),
                    Err(err) => debug!(operation, %err, "Operation did not complete"),
                }
                self.clamp_cursor();
                true
            }
            None => false,
        }
    }

    /// Drop back to browsing once the controller has closed the form we were in.
    fn sync_mode(&mut self) {
        let close = match &self.mode {
            Mode::Form(FormKind::Create) => !self.controller.read(|state| state.show_create_form),
            Mode::Form(FormKind::Edit) => self
                .controller
                .read(|state| state.edit == EditState::NotEditing),
            _ => false,
        };
        if close {
            self.mode = Mode::Browse;
        }
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        let Event::Key(key) = event else {
            return Ok(());
        };
        match self.mode.clone() {
            Mode::Browse => self.handle_browse_key(key),
            Mode::Search => self.handle_search_key(key),
            Mode::Form(kind) => self.handle_form_key(kind, key),
            Mode::ConfirmDelete(request) => self.handle_confirm_key(request, key),
        }
        Ok(())
    }

    fn handle_browse_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(-1),
            KeyCode::Char('g') | KeyCode::Home => self.move_to(0),
            KeyCode::Char('G') | KeyCode::End => self.move_to(usize::MAX),
            KeyCode::PageDown => self.move_cursor(self.list_height.max(1) as isize),
            KeyCode::PageUp => self.move_cursor(-(self.list_height.max(1) as isize)),
            KeyCode::Char('/') => self.mode = Mode::Search,
            KeyCode::Char('f') => self.cycle_genre(),
            KeyCode::Char('s') => {
                let sort = self.controller.read(|state| state.view.sort).toggled();
                self.controller.set_sort(sort);
                self.reset_cursor();
            }
            KeyCode::Char('a') => {
                if self.controller.toggle_create_form() {
                    let draft = self.controller.read(|state| state.create_draft.clone());
                    self.focus = FormFocus::start(&draft);
                    self.mode = Mode::Form(FormKind::Create);
                }
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(record) = self.selected_record() {
                    self.controller.start_edit(&record);
                    self.focus = FormFocus::start(&GameDraft::from(&record));
                    self.mode = Mode::Form(FormKind::Edit);
                }
            }
            KeyCode::Char('d') => {
                if let Some(record) = self.selected_record() {
                    self.mode = Mode::ConfirmDelete(self.controller.request_removal(&record));
                }
            }
            KeyCode::Char('r') => {
                self.spawn_operation("load", |controller| async move { controller.load().await });
            }
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let mut search = self.controller.read(|state| state.view.search.clone());
        match key.code {
            KeyCode::Esc => {
                search.clear();
                self.mode = Mode::Browse;
            }
            KeyCode::Enter => self.mode = Mode::Browse,
            KeyCode::Backspace => {
                search.pop();
            }
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                search.push(ch)
            }
            _ => return,
        }
        self.controller.set_search(search);
        self.reset_cursor();
    }

    fn handle_form_key(&mut self, kind: FormKind, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                match kind {
                    FormKind::Create => self.controller.set_create_form(false),
                    FormKind::Edit => self.controller.cancel_edit(),
                }
                self.mode = Mode::Browse;
                return;
            }
            KeyCode::Enter => {
                match kind {
                    FormKind::Create => self.spawn_operation("create", |controller| async move {
                        controller.create().await
                    }),
                    FormKind::Edit => self.spawn_operation("save_edit", |controller| async move {
                        controller.save_edit().await
                    }),
                }
                return;
            }
            _ => {}
        }

        let mut focus = self.focus;
        let edit = |draft: &mut GameDraft| match key.code {
            KeyCode::Tab | KeyCode::Down => focus.next_field(draft),
            KeyCode::BackTab | KeyCode::Up => focus.prev_field(draft),
            KeyCode::Left => focus.move_cursor(-1, draft),
            KeyCode::Right => focus.move_cursor(1, draft),
            KeyCode::Home => focus.move_home(),
            KeyCode::End => focus.move_end(draft),
            KeyCode::Backspace => focus.backspace(draft),
            KeyCode::Delete => focus.delete(draft),
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                focus.insert(ch, draft)
            }
            _ => {}
        };
        match kind {
            FormKind::Create => self.controller.update_create_draft(edit),
            FormKind::Edit => {
                if !self.controller.update_edit_draft(edit) {
                    self.mode = Mode::Browse;
                    return;
                }
            }
        }
        self.focus = focus;
    }

    fn handle_confirm_key(&mut self, request: RemovalRequest, key: KeyEvent) {
        let answer = match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Confirmation::Confirmed,
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Confirmation::Declined,
            _ => return,
        };
        self.mode = Mode::Browse;
        self.spawn_operation("remove", move |controller| async move {
            controller.remove(request, answer).await
        });
    }

    fn cycle_genre(&mut self) {
        let (options, current) = self
            .controller
            .read(|state| (state.genre_options(), state.view.genre.clone()));
        let next = match current {
            None => options.first().cloned(),
            Some(genre) => options
                .iter()
                .position(|option| *option == genre)
                .and_then(|idx| options.get(idx + 1))
                .cloned(),
        };
        self.controller.set_genre_filter(next);
        self.reset_cursor();
    }

    fn selected_record(&self) -> Option<GameRecord> {
        self.controller
            .read(|state| state.visible_records().into_iter().nth(self.cursor))
    }

    fn visible_len(&self) -> usize {
        self.controller.read(|state| state.visible_records().len())
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.visible_len();
        if len == 0 {
            return;
        }
        self.cursor = (self.cursor as isize + delta).clamp(0, len as isize - 1) as usize;
        self.ensure_cursor_visible(len);
    }

    fn move_to(&mut self, index: usize) {
        let len = self.visible_len();
        if len == 0 {
            return;
        }
        self.cursor = index.min(len - 1);
        self.ensure_cursor_visible(len);
    }

    fn reset_cursor(&mut self) {
        self.cursor = 0;
        self.offset = 0;
    }

    fn clamp_cursor(&mut self) {
        let len = self.visible_len();
        if len == 0 {
            self.reset_cursor();
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
        self.ensure_cursor_visible(len);
    }

    fn ensure_cursor_visible(&mut self, len: usize) {
        if len == 0 || self.list_height == 0 {
            self.offset = 0;
            return;
        }
        let height = self.list_height;
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + height {
            self.offset = self.cursor + 1 - height;
        }
        self.offset = self.offset.min(len.saturating_sub(height));
    }

    fn draw(&mut self, frame: &mut Frame) {
        let state = self.controller.state();
        let visible = state.visible_records();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(8),
                Constraint::Length(4),
                Constraint::Length(1),
            ])
            .split(frame.size());
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[0]);

        self.render_game_list(frame, body[0], &state, &visible);
        match &self.mode {
            Mode::Form(FormKind::Create) => {
                self.render_form(frame, body[1], FormKind::Create, &state.create_draft)
            }
            Mode::Form(FormKind::Edit) => match &state.edit {
                EditState::Editing { draft, .. } => {
                    self.render_form(frame, body[1], FormKind::Edit, draft)
                }
                EditState::NotEditing => self.render_game_info(frame, body[1], &visible),
            },
            _ => self.render_game_info(frame, body[1], &visible),
        }
        self.render_status(frame, chunks[1], &state, visible.len());
        self.render_help(frame, chunks[2]);

        if let Mode::ConfirmDelete(request) = &self.mode {
            self.render_confirm(frame, request);
        }
    }

    fn render_game_list(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        state: &CatalogueState,
        visible: &[GameRecord],
    ) {
        self.list_height = area.height.saturating_sub(2) as usize;
        if self.cursor >= visible.len() {
            self.cursor = visible.len().saturating_sub(1);
        }
        self.ensure_cursor_visible(visible.len());

        let end = (self.offset + self.list_height).min(visible.len());
        let page = &visible[self.offset.min(end)..end];
        let editing = state.edit.id();

        let items: Vec<ListItem> = page
            .iter()
            .enumerate()
            .map(|(idx, game)| {
                let is_selected = self.cursor == self.offset + idx;
                let marker = if editing == Some(&game.id) {
                    Span::styled("✎ ", Style::default().fg(self.theme.warning))
                } else if is_selected {
                    Span::styled(
                        "▶ ",
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::raw("  ")
                };
                ListItem::new(Line::from(vec![
                    marker,
                    Span::styled(
                        game.title.clone(),
                        Style::default()
                            .fg(self.theme.primary_fg)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!(" · {} · {}", game.rating, game.genre),
                        Style::default().fg(self.theme.muted),
                    ),
                ]))
            })
            .collect();

        let mut list_state = ListState::default();
        if !page.is_empty() {
            list_state.select(Some(self.cursor.saturating_sub(self.offset)));
        }
        let title = if state.is_loading() {
            "Games (loading…)".to_string()
        } else {
            format!("Games ({}/{})", visible.len(), state.games.len())
        };
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_game_info(&self, frame: &mut Frame, area: Rect, visible: &[GameRecord]) {
        let block = Block::default().borders(Borders::ALL).title("Game Details");
        let Some(game) = visible.get(self.cursor) else {
            let paragraph = Paragraph::new("No games to show").block(block);
            frame.render_widget(paragraph, area);
            return;
        };

        let lines = vec![
            Line::from(Span::styled(
                game.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("Released: {}", game.release_date.format("%Y-%m-%d"))),
            Line::from(format!("Rating: {}/100", game.rating)),
            Line::from(format!("Genre: {}", game.genre)),
            Line::from(format!("Platform: {}", game.platform)),
            Line::from(Span::styled(
                format!("id {}", game.id),
                Style::default().fg(self.theme.muted),
            )),
        ];
        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_form(&self, frame: &mut Frame, area: Rect, kind: FormKind, draft: &GameDraft) {
        let label_width = FormField::ALL
            .iter()
            .map(|field| field.label().len())
            .max()
            .unwrap_or_default()
            + 2;

        let lines: Vec<Line> = FormField::ALL
            .iter()
            .map(|field| {
                let focused = *field == self.focus.field;
                let label_style = if focused {
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(self.theme.muted)
                };
                let value = field.value(draft);
                let value_span = if value.is_empty() {
                    Span::styled(field.placeholder(), Style::default().fg(self.theme.muted))
                } else {
                    Span::raw(value.to_string())
                };
                Line::from(vec![
                    Span::styled(
                        format!("{:<width$}", format!("{}:", field.label()), width = label_width),
                        label_style,
                    ),
                    value_span,
                ])
            })
            .collect();

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(kind.title()));
        frame.render_widget(paragraph, area);

        let row = FormField::ALL
            .iter()
            .position(|field| *field == self.focus.field)
            .unwrap_or_default() as u16;
        let cursor_x = (area.x + 1 + label_width as u16 + self.focus.cursor as u16)
            .min(area.x + area.width.saturating_sub(2));
        let cursor_y = (area.y + 1 + row).min(area.y + area.height.saturating_sub(2));
        frame.set_cursor(cursor_x, cursor_y);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect, state: &CatalogueState, shown: usize) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let mut lines = Vec::new();
        if let Some(error) = &state.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(self.theme.danger),
            )));
        }
        if let Some(success) = &state.success {
            lines.push(Line::from(Span::styled(
                success.clone(),
                Style::default().fg(self.theme.success),
            )));
        }
        if lines.is_empty() {
            let idle = if state.is_loading() { "Loading…" } else { "Ready" };
            lines.push(Line::from(idle));
        }

        let search = if self.mode == Mode::Search {
            format!("{}▏", state.view.search)
        } else if state.view.search.is_empty() {
            "-".to_string()
        } else {
            state.view.search.clone()
        };
        lines.push(Line::from(Span::styled(
            format!(
                "Showing {shown} of {}  search: {search}  genre: {}  sort: {}",
                state.games.len(),
                state.view.genre.as_deref().unwrap_or("All"),
                state.view.sort,
            ),
            Style::default().fg(self.theme.muted),
        )));

        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let help = match self.mode {
            Mode::Browse => "j/k move  / search  f genre  s sort  a add  e edit  d delete  r reload  q quit",
            Mode::Search => "type to filter  Enter keep  Esc clear",
            Mode::Form(_) => "Tab/↑↓ field  Enter save  Esc cancel",
            Mode::ConfirmDelete(_) => "y confirm  n cancel",
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(
            help,
            Style::default().fg(self.theme.muted),
        )));
        frame.render_widget(paragraph, area);
    }

    fn render_confirm(&self, frame: &mut Frame, request: &RemovalRequest) {
        let area = centered_rect(60, 5, frame.size());
        frame.render_widget(Clear, area);
        let paragraph = Paragraph::new(vec![
            Line::from(request.prompt()),
            Line::from(vec![
                Span::styled("y", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" delete  "),
                Span::styled("n", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" keep"),
            ]),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Delete Game")
                .border_style(Style::default().fg(self.theme.danger)),
        )
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gamecat_core::{AppConfig, HttpGamesApi};

    use super::*;

    fn app() -> Result<CatalogueApp> {
        let api = HttpGamesApi::new(&AppConfig::default())?;
        Ok(CatalogueApp::new(CatalogueController::new(Arc::new(api))))
    }

    fn press(app: &mut CatalogueApp, code: KeyCode) -> Result<()> {
        app.handle_input(Event::Key(KeyEvent::from(code)))
    }

    #[tokio::test]
    async fn escape_leaves_create_form_hidden_after_it_closed_underneath() -> Result<()> {
        let mut app = app()?;
        press(&mut app, KeyCode::Char('a'))?;
        assert_eq!(app.mode, Mode::Form(FormKind::Create));

        // A finished create hides the form before the next key is handled.
        app.controller.set_create_form(false);
        press(&mut app, KeyCode::Esc)?;

        assert_eq!(app.mode, Mode::Browse);
        assert!(!app.controller.read(|state| state.show_create_form));
        Ok(())
    }

    #[tokio::test]
    async fn typing_in_create_form_fills_draft() -> Result<()> {
        let mut app = app()?;
        press(&mut app, KeyCode::Char('a'))?;
        for ch in "Myst".chars() {
            press(&mut app, KeyCode::Char(ch))?;
        }
        press(&mut app, KeyCode::Tab)?;
        press(&mut app, KeyCode::Char('1'))?;

        let draft = app.controller.read(|state| state.create_draft.clone());
        assert_eq!(draft.title, "Myst");
        assert_eq!(draft.release_date, "1");
        Ok(())
    }
}
