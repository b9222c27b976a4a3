use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::ListState;
use ratatui::Terminal;

use crate::config::AppConfig;
use crate::model::NotesModel;
use crate::ui;

pub mod actions;
pub mod notify;
pub mod state;

pub use actions::{Controller, Intent, Presenter};
pub use notify::{Notification, NotificationCenter, NotificationLevel};
pub use state::{Focus, ListButton, NoteDraft, ValidationError, ViewState};

pub struct App {
    pub config: Arc<AppConfig>,
    model: NotesModel,
    view: ViewState,
    list_state: ListState,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    /// Builds model and view, subscribes the view and publishes the initial state.
    pub fn new(config: Arc<AppConfig>) -> Self {
        let mut model = if config.seed_example {
            NotesModel::seeded()
        } else {
            NotesModel::new()
        };
        let view = ViewState::new(config.default_color, config.notification_ttl());
        model.subscribe(Arc::new(view.list.clone()));
        model.update_notes_view();
        let mut app = Self {
            tick_rate: config.tick_rate(),
            config,
            model,
            view,
            list_state: ListState::default(),
            should_quit: false,
        };
        app.view.toggle_filter_visibility();
        app
    }

    pub fn model(&self) -> &NotesModel {
        &self.model
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    pub fn dispatch(&mut self, intent: Intent) {
        tracing::trace!(?intent, "dispatching intent");
        Controller::new(&mut self.model, &mut self.view).dispatch(intent);
        self.view.toggle_filter_visibility();
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            terminal
                .draw(|frame| {
                    if self.view.list.visible_len() > 0 {
                        self.list_state.select(Some(self.view.list.selected()));
                    } else {
                        self.list_state.select(None);
                    }
                    ui::draw_app(frame, &self.view, &mut self.list_state);
                })
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let timeout = self
                .tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));

            if event::poll(timeout).context("polling for terminal events")? {
                if let Event::Key(key) = event::read().context("reading terminal event")? {
                    self.handle_key(key);
                }
            }

            if last_tick.elapsed() >= self.tick_rate {
                self.on_tick(Instant::now());
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    fn on_tick(&mut self, now: Instant) {
        self.view.on_tick(now);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        match key.code {
            KeyCode::Tab => {
                self.view.focus_next();
                return;
            }
            KeyCode::BackTab => {
                self.view.focus_previous();
                return;
            }
            _ => {}
        }

        let intent = match self.view.focus {
            Focus::Title | Focus::Description => self.handle_input_key(key),
            Focus::Color => self.handle_color_key(key),
            Focus::Filter => self.handle_filter_key(key),
            Focus::List => self.handle_list_key(key),
        };
        if let Some(intent) = intent {
            self.dispatch(intent);
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) -> Option<Intent> {
        let focus = self.view.focus;
        match key.code {
            KeyCode::Enter => return self.view.submit_form(),
            KeyCode::Esc => {
                self.view.focus = Focus::List;
                return None;
            }
            _ => {}
        }
        let input = self.view.form.input_mut(focus)?;
        match key.code {
            KeyCode::Backspace => {
                input.backspace();
            }
            KeyCode::Delete => {
                input.delete();
            }
            KeyCode::Left => {
                input.move_left();
            }
            KeyCode::Right => {
                input.move_right();
            }
            KeyCode::Home => {
                input.move_home();
            }
            KeyCode::End => {
                input.move_end();
            }
            KeyCode::Char(ch)
                if !key.modifiers.intersects(
                    KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER,
                ) =>
            {
                input.insert_char(ch);
            }
            _ => {}
        }
        None
    }

    fn handle_color_key(&mut self, key: KeyEvent) -> Option<Intent> {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.view.form.color = self.view.form.color.previous();
                None
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.view.form.color = self.view.form.color.next();
                None
            }
            KeyCode::Enter => self.view.submit_form(),
            _ => {
                self.handle_common_key(key);
                None
            }
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent) -> Option<Intent> {
        match key.code {
            KeyCode::Char(' ') | KeyCode::Enter => self.view.filter_change(),
            _ => {
                self.handle_common_key(key);
                None
            }
        }
    }

    /// Every list-row button goes through here: the selected row resolves the note.
    fn handle_list_key(&mut self, key: KeyEvent) -> Option<Intent> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.view.list.move_selection(1);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.view.list.move_selection(-1);
                None
            }
            KeyCode::Char('f') | KeyCode::Char(' ') => self.view.list_button(ListButton::Favorite),
            KeyCode::Char('d') | KeyCode::Delete => self.view.list_button(ListButton::Delete),
            KeyCode::Char('a') => {
                self.view.focus = Focus::Title;
                None
            }
            _ => {
                self.handle_common_key(key);
                None
            }
        }
    }

    fn handle_common_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('x') => {
                self.view.notifications.dismiss_oldest();
            }
            KeyCode::Esc => self.view.focus = Focus::List,
            _ => {}
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("creating terminal backend")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("restoring screen state")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NoteColor, NoteId};

    fn app() -> App {
        App::new(Arc::new(AppConfig::default()))
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    fn error_texts(app: &App) -> Vec<String> {
        app.view()
            .notifications
            .items()
            .iter()
            .filter(|n| n.is_error())
            .map(|n| n.text.clone())
            .collect()
    }

    #[test]
    fn startup_publishes_seeded_state() {
        let app = app();
        assert_eq!(app.view().list.total(), 1);
        assert!(app.view().list.filter_visible());
        assert_eq!(app.view().focus, Focus::Title);
    }

    #[test]
    fn submitting_valid_form_adds_note_at_front() {
        let mut app = app();
        type_text(&mut app, "Test");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "Note body");
        press(&mut app, KeyCode::Tab);
        // yellow -> green
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Left);
        assert_eq!(app.view().form.color, NoteColor::Green);
        press(&mut app, KeyCode::Enter);

        let notes = app.model().notes();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].title, "Test");
        assert_eq!(notes[0].color.hex(), "#C2F37D");
        assert!(!notes[0].is_favorite);

        assert_eq!(app.view().form.title.value(), "");
        assert_eq!(app.view().form.description.value(), "");
        assert_eq!(app.view().form.color, NoteColor::Yellow);
        let last = app.view().notifications.items().last().expect("notification");
        assert_eq!(last.text, actions::NOTE_ADDED);
        assert_eq!(app.view().list.total(), 2);
    }

    #[test]
    fn empty_title_is_rejected_without_mutation() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "Valid text");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.model().len(), 1);
        assert_eq!(error_texts(&app), vec!["Fill in all fields".to_string()]);
    }

    #[test]
    fn over_long_title_is_rejected_without_mutation() {
        let mut app = app();
        type_text(&mut app, &"t".repeat(51));
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "body");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.model().len(), 1);
        assert_eq!(
            error_texts(&app),
            vec!["Maximum title length is 50 characters".to_string()]
        );
    }

    #[test]
    fn over_long_description_is_rejected_without_mutation() {
        let mut app = app();
        type_text(&mut app, "Title");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, &"b".repeat(251));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.model().len(), 1);
        assert_eq!(
            error_texts(&app),
            vec!["Maximum description length is 250 characters".to_string()]
        );
        assert_eq!(app.view().form.title.value(), "Title");
    }

    #[test]
    fn tick_clears_notifications_after_their_ttl() {
        let mut app = App::new(Arc::new(AppConfig {
            notification_ttl_ms: 100,
            ..AppConfig::default()
        }));
        press(&mut app, KeyCode::Enter);
        assert_eq!(error_texts(&app), vec!["Fill in all fields".to_string()]);

        app.on_tick(Instant::now());
        assert_eq!(app.view().notifications.len(), 1);

        app.on_tick(Instant::now() + Duration::from_millis(150));
        assert!(app.view().notifications.is_empty());
    }

    #[test]
    fn list_keys_toggle_favorite_and_delete_selected_note() {
        let mut app = app();
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.view().focus, Focus::List);

        press(&mut app, KeyCode::Char('f'));
        assert!(app.model().get(NoteId(1)).unwrap().is_favorite);
        assert!(app.view().notifications.is_empty());

        press(&mut app, KeyCode::Char('d'));
        assert!(app.model().is_empty());
        assert_eq!(app.view().notifications.len(), 1);
        assert!(!app.view().list.filter_visible());
    }

    #[test]
    fn filter_checkbox_switches_to_favorites() {
        let mut app = app();
        app.dispatch(Intent::AddNote(NoteDraft {
            title: "Other".into(),
            content: "body".into(),
            color: NoteColor::Red,
        }));
        app.dispatch(Intent::ToggleFavorite(NoteId(1)));

        app.view_mut().focus = Focus::Filter;
        press(&mut app, KeyCode::Char(' '));
        assert!(app.model().show_only_favorites());
        let snapshot = app.view().list.snapshot();
        assert_eq!(snapshot.visible.len(), 1);
        assert_eq!(snapshot.visible[0].id, NoteId(1));
        assert_eq!(snapshot.total, 2);

        press(&mut app, KeyCode::Enter);
        assert!(!app.model().show_only_favorites());
    }

    #[test]
    fn tab_skips_filter_when_collection_is_empty() {
        let mut app = App::new(Arc::new(AppConfig {
            seed_example: false,
            ..AppConfig::default()
        }));
        app.view_mut().focus = Focus::Color;
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.view().focus, Focus::List);
    }

    #[test]
    fn quit_keys() {
        let mut app = app();
        type_text(&mut app, "q");
        assert!(!app.should_quit());
        assert_eq!(app.view().form.title.value(), "q");

        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit());
    }
}
