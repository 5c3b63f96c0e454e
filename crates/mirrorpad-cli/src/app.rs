use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use mirrorpad_engine::{
    DocumentSyncEngine, KeyChord, PlainTextSurface, SaveIntent, SaveTrigger, SelectionOffsets,
    TextSurface,
};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::rc::Rc;
use std::time::{Duration, Instant};

const BANNER_TIMEOUT: Duration = Duration::from_secs(5);
const SAVE_LABEL: &str = "[Save]";
const SIGN_OUT_LABEL: &str = "[Sign out]";
const PLACEHOLDER: &str = "Start typing...";

pub type Engine = DocumentSyncEngine<PlainTextSurface>;

pub struct App {
    engine: Rc<Engine>,
    pool: LocalPool,
    trigger: SaveTrigger,
    banner_since: Option<Instant>,
    save_button: Rect,
    sign_out_button: Rect,
    should_quit: bool,
}

impl App {
    pub fn new(engine: Rc<Engine>) -> Self {
        engine.controller_mut().surface_mut().focus();
        Self {
            engine,
            pool: LocalPool::new(),
            trigger: SaveTrigger,
            banner_since: None,
            save_button: Rect::default(),
            sign_out_button: Rect::default(),
            should_quit: false,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Size the editor for a terminal of `area`, so restores center against
    /// the real viewport
    pub fn resize(&mut self, area: Rect) {
        let editor = editor_block().inner(layout(area)[1]);
        self.engine
            .controller_mut()
            .surface_mut()
            .set_viewport_height(editor.height as usize);
    }

    /// Load (or reload) the signed-in user's document in the background
    pub fn mount(&mut self) {
        let engine = Rc::clone(&self.engine);
        self.spawn(async move {
            engine.mount().await;
        });
    }

    fn save(&mut self, intent: SaveIntent) {
        let engine = Rc::clone(&self.engine);
        self.spawn(async move {
            if let Err(e) = engine.trigger(intent).await {
                log::debug!("Save did not complete: {e}");
            }
        });
    }

    fn spawn(&mut self, task: impl Future<Output = ()> + 'static) {
        if let Err(e) = self.pool.spawner().spawn_local(task) {
            log::error!("Failed to schedule store task: {e}");
        }
    }

    /// Drive outstanding store work and expire the error banner
    pub fn tick(&mut self) {
        self.pool.run_until_stalled();

        if self.engine.banner().is_some() {
            let since = *self.banner_since.get_or_insert_with(Instant::now);
            if since.elapsed() >= BANNER_TIMEOUT {
                self.engine.dismiss_banner();
                self.banner_since = None;
            }
        } else {
            self.banner_since = None;
        }
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Paste(text) => self.edit(|s| s.insert_str(&text)),
            Event::FocusLost => {
                let mut controller = self.engine.controller_mut();
                controller.surface_mut().blur();
                controller.blur();
            }
            Event::FocusGained => self.engine.controller_mut().surface_mut().focus(),
            Event::Resize(width, height) => self.resize(Rect::new(0, 0, width, height)),
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if let KeyCode::Char(c) = key.code {
            let chord = KeyChord {
                key: c,
                ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
                meta: key.modifiers.intersects(KeyModifiers::SUPER | KeyModifiers::META),
                alt: key.modifiers.contains(KeyModifiers::ALT),
            };
            if let Some(intent) = self.trigger.on_key(chord) {
                self.save(intent);
                return;
            }
            if chord.ctrl {
                match c.to_ascii_lowercase() {
                    'q' => self.should_quit = true,
                    'r' => self.mount(),
                    'o' => self.engine.sign_out(),
                    _ => {}
                }
                return;
            }
        }

        let extend = key.modifiers.contains(KeyModifiers::SHIFT);
        match key.code {
            KeyCode::Char(c) => self.edit(|s| s.insert_str(c.encode_utf8(&mut [0; 4]))),
            KeyCode::Enter => self.edit(PlainTextSurface::insert_newline),
            KeyCode::Backspace => self.edit(PlainTextSurface::backspace),
            KeyCode::Delete => self.edit(PlainTextSurface::delete_forward),
            KeyCode::Left => self.caret(|s| s.move_left(extend)),
            KeyCode::Right => self.caret(|s| s.move_right(extend)),
            KeyCode::Up => self.caret(|s| s.move_up(extend)),
            KeyCode::Down => self.caret(|s| s.move_down(extend)),
            KeyCode::Home => self.caret(|s| s.move_line_start(extend)),
            KeyCode::End => self.caret(|s| s.move_line_end(extend)),
            KeyCode::Esc => self.engine.dismiss_banner(),
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let at = Position::new(mouse.column, mouse.row);
        if self.save_button.contains(at) {
            let intent = self.trigger.button();
            self.save(intent);
        } else if self.sign_out_button.contains(at) {
            self.engine.sign_out();
        }
    }

    fn edit(&mut self, edit: impl FnOnce(&mut PlainTextSurface) -> bool) {
        let mut controller = self.engine.controller_mut();
        controller.interact(edit);
        controller.surface_mut().scroll_caret_into_view();
    }

    fn caret(&mut self, movement: impl FnOnce(&mut PlainTextSurface)) {
        self.edit(|s| {
            movement(s);
            false
        });
    }
}

/// Header, editor and status rows
fn layout(area: Rect) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area)
}

fn editor_block() -> Block<'static> {
    Block::default().borders(Borders::ALL)
}

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = layout(f.area());

    draw_header(f, app, chunks[0]);
    draw_editor(f, app, chunks[1]);
    draw_status(f, app, chunks[2]);
}

fn draw_header(f: &mut Frame, app: &mut App, area: Rect) {
    let title = Span::styled(" mirrorpad ", Style::default().add_modifier(Modifier::BOLD));
    // Hit boxes are measured in display cells, not chars
    let mut x = area.x + title.width() as u16;
    let mut spans = vec![title];

    app.sign_out_button = Rect::default();
    match app.engine.current_user() {
        Some(user) => {
            let who = Span::styled(
                format!("| {} ", user.email),
                Style::default().fg(Color::Gray),
            );
            x += who.width() as u16;
            spans.push(who);

            let sign_out = Span::styled(SIGN_OUT_LABEL, Style::default().fg(Color::Red));
            app.sign_out_button = Rect::new(x, area.y, sign_out.width() as u16, 1);
            x += sign_out.width() as u16 + 1;
            spans.push(sign_out);
            spans.push(Span::raw(" "));
        }
        None => {
            let who = Span::styled("| not signed in ", Style::default().fg(Color::DarkGray));
            x += who.width() as u16;
            spans.push(who);
        }
    }

    let save = Span::styled(SAVE_LABEL, Style::default().add_modifier(Modifier::BOLD));
    app.save_button = Rect::new(x, area.y, save.width() as u16, 1);
    spans.push(save);
    spans.push(Span::styled(" Ctrl+S", Style::default().fg(Color::DarkGray)));

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_editor(f: &mut Frame, app: &mut App, area: Rect) {
    let block = editor_block();
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut controller = app.engine.controller_mut();
    let surface = controller.surface_mut();
    surface.set_viewport_height(inner.height as usize);
    surface.scroll_caret_into_view();

    let text = surface.rendered_text();
    if text.is_empty() {
        let hint = Paragraph::new(PLACEHOLDER).style(Style::default().fg(Color::DarkGray));
        f.render_widget(hint, inner);
        if surface.is_focused() {
            f.set_cursor_position(Position::new(inner.x, inner.y));
        }
        return;
    }

    let scroll_top = surface.viewport().scroll_top;
    let selection = surface.selection();
    let mut line_start = 0;
    let mut lines = Vec::new();
    for (index, line) in surface.display_lines().iter().enumerate() {
        let len = line.chars().count();
        if index >= scroll_top {
            lines.push(render_line(line, line_start, selection));
        }
        line_start += len + 1;
        if lines.len() >= inner.height as usize {
            break;
        }
    }
    f.render_widget(Paragraph::new(lines), inner);

    if surface.is_focused()
        && let Some((line, col)) = surface.caret_line_col()
        && line >= scroll_top
    {
        let x = inner.x + (col as u16).min(inner.width.saturating_sub(1));
        let y = inner.y + (line - scroll_top) as u16;
        f.set_cursor_position(Position::new(x, y));
    }
}

/// One line of text with the part inside `selection` highlighted
fn render_line(
    line: &str,
    line_start: usize,
    selection: Option<SelectionOffsets>,
) -> Line<'static> {
    let Some(sel) = selection.filter(|s| !s.is_collapsed()) else {
        return Line::raw(line.to_string());
    };
    let len = line.chars().count();
    let from = sel.start.saturating_sub(line_start).min(len);
    let to = sel.end.saturating_sub(line_start).min(len);
    if from == to {
        return Line::raw(line.to_string());
    }

    let take = |a: usize, b: usize| line.chars().skip(a).take(b - a).collect::<String>();
    Line::from(vec![
        Span::raw(take(0, from)),
        Span::styled(
            take(from, to),
            Style::default().add_modifier(Modifier::REVERSED),
        ),
        Span::raw(take(to, len)),
    ])
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = Vec::new();
    if let Some(message) = app.engine.banner() {
        spans.push(Span::styled(
            format!(" {message} "),
            Style::default().fg(Color::White).bg(Color::Red),
        ));
        spans.push(Span::raw(" "));
    }
    if app.engine.is_busy() {
        spans.push(Span::styled(
            " Saving... ",
            Style::default().fg(Color::White).bg(Color::Blue),
        ));
    }
    if spans.is_empty() {
        spans.push(Span::styled(
            " Ctrl+S: Save | Ctrl+R: Reload | Ctrl+O: Sign out | Ctrl+Q: Quit",
            Style::default().fg(Color::DarkGray),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use mirrorpad_engine::{
        CURSOR_STATE_KEY, DocumentStore, EphemeralStore, FileEphemeralStore, FsDocumentStore,
        LocalAuth, MemoryDocumentStore, MemoryEphemeralStore, NewDocument,
        SelectionOffsetTracker, TextSurfaceController, User, UserId,
    };
    use pretty_assertions::assert_eq;
    use ratatui::{Terminal, backend::TestBackend, buffer::Buffer};

    fn app_with(
        store: Rc<dyn DocumentStore>,
        state: Rc<dyn EphemeralStore>,
        email: &str,
    ) -> App {
        let auth = LocalAuth::signed_in(User {
            id: UserId::from("u1"),
            email: email.to_string(),
        });
        let engine = DocumentSyncEngine::new(
            store,
            Rc::new(auth),
            TextSurfaceController::new(PlainTextSurface::new(), SelectionOffsetTracker::new(state)),
        );
        App::new(Rc::new(engine))
    }

    fn start(app: &mut App, width: u16, height: u16) {
        app.resize(Rect::new(0, 0, width, height));
        app.mount();
        app.tick();
    }

    fn test_app() -> (Rc<MemoryDocumentStore>, App) {
        let store = Rc::new(MemoryDocumentStore::new());
        let mut app = app_with(
            store.clone(),
            Rc::new(MemoryEphemeralStore::new()),
            "u1@example.com",
        );
        start(&mut app, 80, 24);
        (store, app)
    }

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            let event = match c {
                '\n' => key(KeyCode::Enter, KeyModifiers::NONE),
                c => key(KeyCode::Char(c), KeyModifiers::NONE),
            };
            app.handle_event(event);
        }
    }

    fn render_buffer(app: &mut App, width: u16, height: u16) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn render(app: &mut App, width: u16, height: u16) -> Vec<String> {
        let buffer = render_buffer(app, width, height);
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect()
    }

    #[test]
    fn test_typing_and_ctrl_s_saves() {
        let (store, mut app) = test_app();

        type_text(&mut app, "abc");
        assert_eq!(store.documents()[0].content, "");

        app.handle_event(key(KeyCode::Char('s'), KeyModifiers::CONTROL));
        app.tick();

        assert_eq!(store.documents()[0].content, "abc");
        assert_eq!(
            app.engine().controller().surface().selection(),
            Some(SelectionOffsets::caret(3))
        );
    }

    #[test]
    fn test_clicking_save_button_saves() {
        let (store, mut app) = test_app();
        type_text(&mut app, "clicked");
        render(&mut app, 80, 10);

        let button = app.save_button;
        app.handle_event(Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: button.x + 1,
            row: button.y,
            modifiers: KeyModifiers::NONE,
        }));
        app.tick();

        assert_eq!(store.documents()[0].content, "clicked");
    }

    #[test]
    fn test_sign_out_stops_saving() {
        let (store, mut app) = test_app();
        type_text(&mut app, "draft");

        app.handle_event(key(KeyCode::Char('o'), KeyModifiers::CONTROL));
        app.handle_event(key(KeyCode::Char('s'), KeyModifiers::CONTROL));
        app.tick();

        assert_eq!(store.documents()[0].content, "");
        assert_eq!(app.engine().controller().content(), "draft");
    }

    #[test]
    fn test_ctrl_q_quits() {
        let (_, mut app) = test_app();
        assert!(!app.should_quit());

        app.handle_event(key(KeyCode::Char('q'), KeyModifiers::CONTROL));

        assert!(app.should_quit());
    }

    #[test]
    fn test_header_shows_user_and_save_control() {
        let (_, mut app) = test_app();

        let rows = render(&mut app, 80, 10);

        insta::assert_snapshot!(rows[0], @" mirrorpad | u1@example.com [Sign out] [Save] Ctrl+S");
    }

    #[test]
    fn test_editor_shows_placeholder_then_text() {
        let (_, mut app) = test_app();

        let rows = render(&mut app, 40, 8);
        assert_eq!(rows[2], format!("│{PLACEHOLDER:<38}│"));

        type_text(&mut app, "one\ntwo");
        let rows = render(&mut app, 40, 8);
        assert_eq!(rows[2], format!("│{:<38}│", "one"));
        assert_eq!(rows[3], format!("│{:<38}│", "two"));
    }

    #[test]
    fn test_status_line_shows_hints() {
        let (_, mut app) = test_app();

        let rows = render(&mut app, 80, 10);

        assert!(rows[9].contains("Ctrl+S: Save"));
    }

    #[test]
    fn test_render_line_highlights_selection() {
        let line = render_line("hello world", 12, Some(SelectionOffsets::new(14, 17)));

        let texts: Vec<_> = line.spans.iter().map(|s| s.content.to_string()).collect();
        assert_eq!(texts, vec!["he", "llo", " world"]);
        assert!(line.spans[1].style.add_modifier.contains(Modifier::REVERSED));
    }

    #[test]
    fn test_first_restore_centers_caret_in_editor() {
        let content = vec!["abcd"; 100].join("\n");
        let store = Rc::new(MemoryDocumentStore::new());
        block_on(store.create(NewDocument::now("u1".into(), content))).unwrap();
        let state = Rc::new(MemoryEphemeralStore::new());
        state.set(CURSOR_STATE_KEY, r#"{"start":300,"end":300}"#);
        let mut app = app_with(store, state, "u1@example.com");

        start(&mut app, 40, 14);
        render(&mut app, 40, 14);

        let controller = app.engine().controller();
        let surface = controller.surface();
        assert_eq!(surface.caret_line_col(), Some((60, 0)));
        assert_eq!(surface.viewport().height, 10);
        assert_eq!(surface.viewport().scroll_top, 55);
    }

    #[test]
    fn test_saved_text_and_caret_survive_restart() {
        let dir = tempfile::tempdir().unwrap();
        let open = || {
            let store = FsDocumentStore::open(dir.path().join("documents")).unwrap();
            let state = FileEphemeralStore::new(dir.path().join("state"));
            let mut app = app_with(Rc::new(store), Rc::new(state), "u1@example.com");
            start(&mut app, 80, 24);
            app
        };

        let mut app = open();
        type_text(&mut app, "one\ntwo");
        app.handle_event(key(KeyCode::Left, KeyModifiers::NONE));
        app.handle_event(key(KeyCode::Char('s'), KeyModifiers::CONTROL));
        app.tick();
        drop(app);

        let app = open();
        assert_eq!(app.engine().controller().content(), "one\ntwo");
        assert_eq!(
            app.engine().controller().surface().caret_line_col(),
            Some((1, 2))
        );
    }

    #[test]
    fn test_header_hit_boxes_cover_labels_after_wide_email() {
        let store = Rc::new(MemoryDocumentStore::new());
        let mut app = app_with(
            store.clone(),
            Rc::new(MemoryEphemeralStore::new()),
            "用户@example.com",
        );
        start(&mut app, 80, 10);
        app.handle_event(Event::Paste("wide".to_string()));

        let buffer = render_buffer(&mut app, 80, 10);
        let (save, sign_out) = (app.save_button, app.sign_out_button);
        assert_eq!(buffer[(sign_out.x, 0)].symbol(), "[");
        assert_eq!(buffer[(sign_out.x + 1, 0)].symbol(), "S");
        assert_eq!(buffer[(save.x, 0)].symbol(), "[");
        assert_eq!(buffer[(save.x + 1, 0)].symbol(), "S");
        assert_eq!(buffer[(save.right() - 1, 0)].symbol(), "]");

        app.handle_event(Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: save.x,
            row: 0,
            modifiers: KeyModifiers::NONE,
        }));
        app.tick();

        assert_eq!(store.documents()[0].content, "wide");
    }
}
