use std::{
    io,
    ops::Range,
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{Context, Result, bail};
use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, KeyboardEnhancementFlags, MouseButton, MouseEvent, MouseEventKind,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
        supports_keyboard_enhancement,
    },
};
use log::{debug, info};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use catedit_tui::clipboard::Clipboard;
use catedit_tui::config::Config;
use catedit_tui::render::{RenderResult, render_readonly, render_segment};
use catedit_tui::segment::{MatchKind, SegmentData, SegmentList};
use catedit_tui::session::{EditSession, KeyOutcome};
use catedit_tui::theme::Theme;

const DEFAULT_CONFIG: &str = "catedit.toml";
const STATUS_TIMEOUT: Duration = Duration::from_secs(4);
const MOUSE_SCROLL_LINES: usize = 3;
const SIDEBAR_WIDTH: u16 = 38;
const GUTTER: &str = "│ ";
const GUTTER_WIDTH: u16 = 2;

#[derive(Debug, Parser)]
#[command(name = "catedit")]
#[command(about = "Terminal editor for tagged translation segments")]
struct Cli {
    /// Segments file (JSON array)
    segments: Option<PathBuf>,

    /// Config file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write logs to this file
    #[arg(long = "log-file", value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long = "log-level", value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    run(Cli::parse())
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    if cli.log_file.is_some() {
        config.log.file = cli.log_file;
    }
    if let Some(level) = cli.log_level {
        config.log.level = level;
    }
    if let Some(dispatch) = config.log.dispatch()? {
        dispatch.apply().context("failed to install logger")?;
    }

    let Some(path) = cli.segments.or_else(|| config.data.clone()) else {
        bail!("no segments file given; pass one or set `data` in {DEFAULT_CONFIG}");
    };
    let segments = SegmentList::load(&path)
        .with_context(|| format!("failed to load segments from {}", path.display()))?;
    let theme = Theme::new()
        .with_overrides(&config.theme)
        .context("invalid theme overrides")?;
    info!("opened {} with {} segments", path.display(), segments.len());

    let mut app = App::new(segments, path, theme, &config);

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("failed to initialize terminal")?;
    // Shift+Enter is only distinguishable from Enter with the enhanced protocol.
    let enhanced_keys = supports_keyboard_enhancement().unwrap_or(false);
    if enhanced_keys {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )
        .context("failed to enable keyboard enhancement")?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().ok();

    let res = run_app(&mut terminal, &mut app).context("application error");

    if enhanced_keys {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags).ok();
    }
    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    res
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();
    let mut needs_redraw = true;

    while !app.should_quit() {
        if needs_redraw {
            terminal
                .draw(|frame| app.draw(frame))
                .context("failed to draw frame")?;
            needs_redraw = false;
            // Deferred focus and cursor steps run once the frame is on screen.
            if app.on_frame() {
                needs_redraw = true;
                continue;
            }
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout).context("event poll failed")? {
            let evt = event::read().context("failed to read event")?;
            app.handle_event(evt);
            needs_redraw = true;
        }

        if last_tick.elapsed() >= tick_rate {
            let had_message_before = app.has_status_message();
            app.on_tick();
            last_tick = Instant::now();
            if had_message_before && !app.has_status_message() {
                needs_redraw = true;
            }
        }
    }

    Ok(())
}

/// Where a segment landed in the scrollable list during the last frame.
#[derive(Clone, Debug)]
struct CardLayout {
    id: u32,
    lines: Range<usize>,
    target_start: usize,
}

struct App {
    segments: SegmentList,
    sessions: Vec<EditSession>,
    clipboard: Clipboard,
    file_path: PathBuf,
    theme: Theme,
    show_sidebar: bool,
    wrap_padding: u16,
    scroll_top: usize,
    should_quit: bool,
    status_message: Option<(String, Instant)>,
    cards: Vec<CardLayout>,
    active_render: Option<RenderResult>,
    list_area: Rect,
    text_x: u16,
    last_total_lines: usize,
}

impl App {
    fn new(segments: SegmentList, file_path: PathBuf, theme: Theme, config: &Config) -> Self {
        let sessions = segments
            .segments()
            .iter()
            .map(|segment| EditSession::new(&segment.target, segment.suggested_text.as_deref()))
            .collect();
        let mut app = Self {
            segments,
            sessions,
            clipboard: Clipboard::new(),
            file_path,
            theme,
            show_sidebar: config.editor.show_sidebar,
            wrap_padding: config.editor.wrap_padding,
            scroll_top: 0,
            should_quit: false,
            status_message: None,
            cards: Vec::new(),
            active_render: None,
            list_area: Rect::default(),
            text_x: 0,
            last_total_lines: 0,
        };
        app.sync_activation();
        app
    }

    fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn has_status_message(&self) -> bool {
        self.status_message.is_some()
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    /// Pushes the list's active flag into every session.
    fn sync_activation(&mut self) {
        let active = self.segments.active_id();
        for (segment, session) in self.segments.segments().iter().zip(&mut self.sessions) {
            session.set_active(active == Some(segment.id), &segment.target);
        }
    }

    fn on_frame(&mut self) -> bool {
        match self.segments.active_index() {
            Some(idx) => self.sessions[idx].on_frame(),
            None => false,
        }
    }

    fn on_tick(&mut self) {
        self.prune_status_message();
    }

    fn prune_status_message(&mut self) {
        if let Some((_, instant)) = &self.status_message
            && instant.elapsed() > STATUS_TIMEOUT
        {
            self.status_message = None;
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        if area.height < 3 || area.width == 0 {
            return;
        }

        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(area);
        let top_area = vertical[0];
        let main_area = vertical[1];
        let bottom_area = vertical[2];

        let sidebar_width = if self.show_sidebar && main_area.width > SIDEBAR_WIDTH * 2 {
            SIDEBAR_WIDTH
        } else {
            0
        };
        let horizontal = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1), Constraint::Length(sidebar_width)])
            .split(main_area);
        let list_outer = horizontal[0];
        let sidebar_area = horizontal[1];

        let padding = self.wrap_padding.min(list_outer.width / 4);
        let list_area = Rect {
            x: list_outer.x + padding,
            width: list_outer.width.saturating_sub(padding * 2).max(1),
            ..list_outer
        };
        self.list_area = list_area;
        self.text_x = list_area.x + GUTTER_WIDTH;
        let wrap_width = list_area.width.saturating_sub(GUTTER_WIDTH).max(1) as usize;

        let (lines, cursor_line) = self.build_list(wrap_width);
        self.last_total_lines = lines.len();
        let viewport_height = list_area.height as usize;
        self.adjust_scroll(cursor_line, viewport_height);

        let paragraph = Paragraph::new(Text::from(lines)).scroll((self.scroll_top as u16, 0));
        frame.render_widget(paragraph, list_area);

        if let Some(render) = &self.active_render
            && let Some(cursor) = render.cursor
            && let Some(card) = self.active_card()
        {
            let line = card.target_start + cursor.line;
            if line >= self.scroll_top && line < self.scroll_top + viewport_height {
                let y = list_area.y + (line - self.scroll_top) as u16;
                let max_x = list_area.x + list_area.width.saturating_sub(1);
                let x = (self.text_x + cursor.column).min(max_x);
                frame.set_cursor_position(Position::new(x, y));
            }
        }

        frame.render_widget(Paragraph::new(self.top_bar(top_area.width as usize)), top_area);
        frame.render_widget(
            Paragraph::new(self.bottom_bar(bottom_area.width as usize)),
            bottom_area,
        );

        if sidebar_width > 0 {
            self.draw_sidebar(frame, sidebar_area);
        }
    }

    /// Lays out every segment card. Returns the lines and the absolute line of
    /// the active cursor, or of the active card when no cursor is shown.
    fn build_list(&mut self, width: usize) -> (Vec<Line<'static>>, Option<usize>) {
        let active_id = self.segments.active_id();
        let mut lines: Vec<Line<'static>> = Vec::new();
        let mut cards = Vec::with_capacity(self.segments.len());
        let mut active_render = None;
        let mut cursor_line = None;

        for (segment, session) in self.segments.segments().iter().zip(&self.sessions) {
            let active = active_id == Some(segment.id);
            let gutter_style = self.theme.border_style(active);
            let start = lines.len();

            lines.push(self.card_header(segment, active));
            for line in render_readonly(
                &segment.source,
                self.theme.source_style(),
                &self.theme,
                width,
                true,
            ) {
                lines.push(with_gutter(line, gutter_style));
            }

            let target_start = lines.len();
            if active {
                let render = render_segment(session.editor(), session.remainder(), &self.theme, width);
                cursor_line = Some(
                    render
                        .cursor
                        .map(|cursor| target_start + cursor.line)
                        .unwrap_or(start),
                );
                for line in render.lines.iter().cloned() {
                    lines.push(with_gutter(line, gutter_style));
                }
                active_render = Some(render);
            } else {
                let style = Style::default().add_modifier(Modifier::DIM);
                for line in render_readonly(&segment.target, style, &self.theme, width, false) {
                    lines.push(with_gutter(line, gutter_style));
                }
            }

            cards.push(CardLayout {
                id: segment.id,
                lines: start..lines.len(),
                target_start,
            });
            lines.push(Line::from(""));
        }

        if lines.is_empty() {
            lines.push(Line::from("No segments"));
        }
        self.cards = cards;
        self.active_render = active_render;
        (lines, cursor_line)
    }

    fn card_header(&self, segment: &SegmentData, active: bool) -> Line<'static> {
        let mut id_style = self.theme.border_style(active);
        if active {
            id_style = id_style.add_modifier(Modifier::BOLD);
        }
        let mut spans = vec![
            Span::styled(GUTTER.to_string(), self.theme.border_style(active)),
            Span::styled(format!("#{}", segment.id), id_style),
            Span::raw(" "),
            Span::raw(segment.status.label().to_string()),
        ];
        if segment.has_warning || !segment.issues.is_empty() {
            spans.push(Span::styled(" !".to_string(), self.theme.warning_style()));
        }
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("{}/{}", segment.source_len(), segment.target_len()),
            self.theme.count_style(segment.target_exceeds_source()),
        ));
        Line::from(spans)
    }

    fn active_card(&self) -> Option<&CardLayout> {
        let id = self.segments.active_id()?;
        self.cards.iter().find(|card| card.id == id)
    }

    fn adjust_scroll(&mut self, focus_line: Option<usize>, viewport_height: usize) {
        let viewport = viewport_height.max(1);
        let max_scroll = self.last_total_lines.saturating_sub(viewport);
        if let Some(line) = focus_line {
            if line < self.scroll_top {
                self.scroll_top = line;
            } else if line >= self.scroll_top + viewport {
                self.scroll_top = line + 1 - viewport;
            }
        }
        self.scroll_top = self.scroll_top.min(max_scroll);
    }

    fn scroll_by_lines(&mut self, delta: isize) {
        let viewport = self.list_area.height.max(1) as usize;
        let max_scroll = self.last_total_lines.saturating_sub(viewport) as isize;
        let new_scroll = (self.scroll_top as isize + delta).clamp(0, max_scroll.max(0));
        self.scroll_top = new_scroll as usize;
    }

    fn top_bar(&self, width: usize) -> Line<'static> {
        let style = self.theme.status_bar_style();
        let filename = self
            .file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_path.display().to_string());
        let left = format!(" {filename}");
        let shortcuts = fit_shortcuts(
            &["F2:Details", "^↑/^↓:Segment", "⇧⏎:Accept all", "^Q:Quit"],
            width.saturating_sub(left.chars().count() + 1),
        );
        let padding = width
            .saturating_sub(left.chars().count())
            .saturating_sub(shortcuts.chars().count());
        Line::from(vec![
            Span::styled(left, style.add_modifier(Modifier::BOLD)),
            Span::styled(" ".repeat(padding), style),
            Span::styled(shortcuts, style),
        ])
    }

    fn bottom_bar(&mut self, width: usize) -> Line<'static> {
        self.prune_status_message();
        let bar = self.theme.status_bar_style();

        let badge = self
            .segments
            .active()
            .map(|segment| format!(" {} ", segment.status.label().to_uppercase()))
            .unwrap_or_default();
        let message = self
            .status_message
            .as_ref()
            .map(|(message, _)| format!(" {message}"))
            .unwrap_or_default();
        let progress = self.segments.progress();
        let numbers = format!("{}/{}", progress.translated, progress.total);
        let label = " words translated ";

        let used = badge.chars().count()
            + message.chars().count()
            + numbers.chars().count()
            + label.chars().count();
        let padding = width.saturating_sub(used);

        Line::from(vec![
            Span::styled(badge, bar.add_modifier(Modifier::REVERSED)),
            Span::styled(message, bar),
            Span::styled(" ".repeat(padding), bar),
            Span::styled(numbers, bar.fg(self.theme.progress_color)),
            Span::styled(label, bar),
        ])
    }

    fn draw_sidebar(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::LEFT)
            .border_style(self.theme.border_style(false))
            .title(" Details ");
        let Some(segment) = self.segments.active() else {
            frame.render_widget(Paragraph::new("").block(block), area);
            return;
        };

        let heading = Style::default().add_modifier(Modifier::BOLD);
        let mut lines = Vec::new();

        if let Some(ai) = &segment.ai_suggestion {
            lines.push(Line::styled("AI suggestion", heading));
            lines.push(Line::from(format!(
                "{} ({:.0}%)",
                ai.text,
                ai.confidence * 100.0
            )));
            lines.push(Line::from(""));
        }

        if !segment.tm_matches.is_empty() {
            lines.push(Line::styled("Matches", heading));
            for tm in &segment.tm_matches {
                let kind = match tm.kind {
                    MatchKind::Termbase => "TB",
                    MatchKind::TranslationMemory => "TM",
                };
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("{}% {kind} ", tm.match_percentage),
                        self.theme.progress_style(),
                    ),
                    Span::raw(format!("{} → {}", tm.source, tm.target)),
                ]));
            }
            lines.push(Line::from(""));
        }

        if !segment.issues.is_empty() {
            lines.push(Line::styled("Issues", heading));
            for issue in &segment.issues {
                lines.push(Line::styled(
                    format!("{:?}: {}", issue.severity, issue.message),
                    self.theme.warning_style(),
                ));
                if let Some(quoted) = &issue.quoted_text {
                    lines.push(Line::from(format!("  \"{quoted}\"")));
                }
                if !issue.badges.is_empty() {
                    lines.push(Line::from(format!("  {}", issue.badges.join(", "))));
                }
            }
            lines.push(Line::from(""));
        }

        if !segment.comments.is_empty() {
            lines.push(Line::styled("Comments", heading));
            for comment in &segment.comments {
                lines.push(Line::from(vec![
                    Span::styled(format!("{}: ", comment.author), heading),
                    Span::raw(comment.message.clone()),
                ]));
                lines.push(Line::styled(
                    format!("  {}", comment.timestamp),
                    Style::default().add_modifier(Modifier::DIM),
                ));
            }
        }

        if lines.is_empty() {
            lines.push(Line::from("Nothing to show"));
        }

        let paragraph = Paragraph::new(Text::from(lines))
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn navigate(&mut self, forward: bool) {
        let moved = if forward {
            self.segments.activate_next()
        } else {
            self.segments.activate_previous()
        };
        if moved {
            self.sync_activation();
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(key),
            Event::Mouse(mouse_event) => self.handle_mouse_event(mouse_event),
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        match (key.code, control) {
            (KeyCode::Char('q'), true) => {
                self.should_quit = true;
                return;
            }
            (KeyCode::Up, true) => {
                self.navigate(false);
                return;
            }
            (KeyCode::Down, true) => {
                self.navigate(true);
                return;
            }
            (KeyCode::F(2), _) => {
                self.show_sidebar = !self.show_sidebar;
                return;
            }
            (KeyCode::PageUp, _) => {
                self.scroll_by_lines(-(self.list_area.height as isize));
                return;
            }
            (KeyCode::PageDown, _) => {
                self.scroll_by_lines(self.list_area.height as isize);
                return;
            }
            _ => {}
        }

        let Some(idx) = self.segments.active_index() else {
            return;
        };
        let id = self.segments.segments()[idx].id;
        let segments = &mut self.segments;
        let outcome = self.sessions[idx].handle_key(key, &mut self.clipboard, &mut |text: &str| {
            segments.apply_edit(id, text);
        });

        match outcome {
            KeyOutcome::CopySuppressed => {
                self.set_status("Copy blocked: the selection contains tags");
            }
            KeyOutcome::PasteRejected(marker) => {
                self.set_status(format!("Paste blocked: {} is already present", marker.notation()));
            }
            KeyOutcome::SuggestionAccepted(acceptance) => {
                debug!("segment {id}: suggestion accepted ({acceptance:?})");
            }
            KeyOutcome::Ignored | KeyOutcome::Handled | KeyOutcome::Edited => {}
        }
    }

    fn handle_mouse_event(&mut self, event: MouseEvent) {
        match event.kind {
            MouseEventKind::ScrollUp => self.scroll_by_lines(-(MOUSE_SCROLL_LINES as isize)),
            MouseEventKind::ScrollDown => self.scroll_by_lines(MOUSE_SCROLL_LINES as isize),
            MouseEventKind::Down(MouseButton::Left) => self.handle_mouse_down(event),
            _ => {}
        }
    }

    fn handle_mouse_down(&mut self, event: MouseEvent) {
        let area = self.list_area;
        if event.row < area.y
            || event.row >= area.y + area.height
            || event.column < area.x
            || event.column >= area.x + area.width
        {
            return;
        }
        let line = self.scroll_top + (event.row - area.y) as usize;
        let Some(card) = self.cards.iter().find(|card| card.lines.contains(&line)).cloned() else {
            return;
        };

        if self.segments.active_id() != Some(card.id) {
            if self.segments.activate(card.id) {
                self.sync_activation();
            }
            return;
        }

        if line < card.target_start {
            return;
        }
        let column = event.column.saturating_sub(self.text_x);
        let Some(position) = self
            .active_render
            .as_ref()
            .and_then(|render| render.position_at(line - card.target_start, column))
        else {
            return;
        };
        if let Some(idx) = self.segments.active_index() {
            self.sessions[idx].press_at(position);
        }
    }
}

fn with_gutter(mut line: Line<'static>, style: Style) -> Line<'static> {
    line.spans.insert(0, Span::styled(GUTTER.to_string(), style));
    line
}

/// Keeps the most important shortcuts (last in `all`) that fit in `width`.
fn fit_shortcuts(all: &[&str], width: usize) -> String {
    let mut shown: Vec<&str> = Vec::new();
    let mut used = 0;
    for shortcut in all.iter().rev() {
        let needed = if shown.is_empty() {
            shortcut.chars().count()
        } else {
            used + 1 + shortcut.chars().count()
        };
        if needed > width {
            break;
        }
        shown.insert(0, shortcut);
        used = needed;
    }
    let mut text = shown.join(" ");
    if !text.is_empty() {
        text.push(' ');
    }
    text
}
