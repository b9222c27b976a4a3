use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

use crate::app::actions::{Intent, Presenter};
use crate::app::notify::{NotificationCenter, NotificationLevel};
use crate::model::{NoteColor, NoteId, NotesChanged, NotesListener};

pub const TITLE_MAX_CHARS: usize = 50;
pub const DESCRIPTION_MAX_CHARS: usize = 250;

/// Hard cap on what an input field accepts, well above the validation limits
/// so over-long submissions still reach validation.
const INPUT_LIMIT: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Fill in all fields")]
    EmptyFields,
    #[error("Maximum title length is {max} characters")]
    TitleTooLong { max: usize },
    #[error("Maximum description length is {max} characters")]
    DescriptionTooLong { max: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub color: NoteColor,
}

/// Checks run on form submit, in order: both fields present, title length,
/// description length.
pub fn validate_submission(
    title: &str,
    description: &str,
    color: NoteColor,
) -> Result<NoteDraft, ValidationError> {
    let title = title.trim();
    let description = description.trim();
    if title.is_empty() || description.is_empty() {
        return Err(ValidationError::EmptyFields);
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(ValidationError::TitleTooLong {
            max: TITLE_MAX_CHARS,
        });
    }
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(ValidationError::DescriptionTooLong {
            max: DESCRIPTION_MAX_CHARS,
        });
    }
    Ok(NoteDraft {
        title: title.to_string(),
        content: description.to_string(),
        color,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Title,
    Description,
    Color,
    Filter,
    List,
}

impl Focus {
    const ORDER: [Focus; 5] = [
        Focus::Title,
        Focus::Description,
        Focus::Color,
        Focus::Filter,
        Focus::List,
    ];

    pub fn is_form(self) -> bool {
        matches!(self, Focus::Title | Focus::Description | Focus::Color)
    }

    fn step(self, delta: isize, filter_visible: bool) -> Focus {
        let len = Self::ORDER.len() as isize;
        let mut idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0) as isize;
        loop {
            idx = (idx + delta).rem_euclid(len);
            let candidate = Self::ORDER[idx as usize];
            if candidate != Focus::Filter || filter_visible {
                return candidate;
            }
        }
    }
}

/// Single-line, grapheme-aware text field.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    buffer: String,
    cursor: usize,
}

impl TextInput {
    pub fn value(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Length as validation sees it: surrounding whitespace is not counted.
    pub fn char_count(&self) -> usize {
        self.buffer.trim().chars().count()
    }

    pub fn set_value<S: Into<String>>(&mut self, value: S) {
        self.buffer = value.into();
        self.cursor = self.buffer.len();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    pub fn insert_char(&mut self, ch: char) -> bool {
        if ch == '\n' || ch == '\r' || self.buffer.chars().count() >= INPUT_LIMIT {
            return false;
        }
        self.buffer.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
        true
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = prev_grapheme_boundary(&self.buffer, self.cursor);
        self.buffer.drain(prev..self.cursor);
        self.cursor = prev;
        true
    }

    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.buffer.len() {
            return false;
        }
        let next = next_grapheme_boundary(&self.buffer, self.cursor);
        self.buffer.drain(self.cursor..next);
        true
    }

    pub fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor = prev_grapheme_boundary(&self.buffer, self.cursor);
        true
    }

    pub fn move_right(&mut self) -> bool {
        if self.cursor >= self.buffer.len() {
            return false;
        }
        self.cursor = next_grapheme_boundary(&self.buffer, self.cursor);
        true
    }

    pub fn move_home(&mut self) -> bool {
        let moved = self.cursor != 0;
        self.cursor = 0;
        moved
    }

    pub fn move_end(&mut self) -> bool {
        let moved = self.cursor != self.buffer.len();
        self.cursor = self.buffer.len();
        moved
    }
}

#[derive(Debug, Clone)]
pub struct FormState {
    pub title: TextInput,
    pub description: TextInput,
    pub color: NoteColor,
}

impl FormState {
    pub fn new(color: NoteColor) -> Self {
        Self {
            title: TextInput::default(),
            description: TextInput::default(),
            color,
        }
    }

    pub fn reset(&mut self, color: NoteColor) {
        self.title.clear();
        self.description.clear();
        self.color = color;
    }

    pub fn input_mut(&mut self, focus: Focus) -> Option<&mut TextInput> {
        match focus {
            Focus::Title => Some(&mut self.title),
            Focus::Description => Some(&mut self.description),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListButton {
    Favorite,
    Delete,
}

#[derive(Debug, Default)]
struct ListViewInner {
    snapshot: NotesChanged,
    selected: usize,
}

impl ListViewInner {
    fn normalize_selection(&mut self) {
        let len = self.snapshot.visible.len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }
}

/// Last published notes snapshot plus the row selection. Cloned handles share
/// the same state, so one clone can be subscribed to the model while the UI
/// reads another.
#[derive(Debug, Clone, Default)]
pub struct ListView {
    inner: Arc<Mutex<ListViewInner>>,
}

impl NotesListener for ListView {
    fn notes_changed(&self, event: &NotesChanged) {
        let mut inner = self.inner.lock();
        let previous = inner
            .snapshot
            .visible
            .get(inner.selected)
            .map(|note| note.id);
        inner.snapshot = event.clone();
        let restored =
            previous.and_then(|id| event.visible.iter().position(|note| note.id == id));
        if let Some(idx) = restored {
            inner.selected = idx;
        }
        inner.normalize_selection();
    }
}

impl ListView {
    pub fn snapshot(&self) -> NotesChanged {
        self.inner.lock().snapshot.clone()
    }

    pub fn with_snapshot<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&NotesChanged) -> T,
    {
        f(&self.inner.lock().snapshot)
    }

    pub fn total(&self) -> usize {
        self.inner.lock().snapshot.total
    }

    pub fn visible_len(&self) -> usize {
        self.inner.lock().snapshot.visible.len()
    }

    pub fn filter_visible(&self) -> bool {
        self.inner.lock().snapshot.filter_visible
    }

    pub fn show_only_favorites(&self) -> bool {
        self.inner.lock().snapshot.show_only_favorites
    }

    pub fn selected(&self) -> usize {
        self.inner.lock().selected
    }

    pub fn note_id_at(&self, row: usize) -> Option<NoteId> {
        self.inner
            .lock()
            .snapshot
            .visible
            .get(row)
            .map(|note| note.id)
    }

    pub fn move_selection(&self, delta: isize) {
        let mut inner = self.inner.lock();
        let len = inner.snapshot.visible.len() as isize;
        if len == 0 {
            return;
        }
        let next = (inner.selected as isize + delta).clamp(0, len - 1);
        inner.selected = next as usize;
    }
}

pub struct ViewState {
    pub focus: Focus,
    pub form: FormState,
    pub list: ListView,
    pub notifications: NotificationCenter,
    default_color: NoteColor,
}

impl ViewState {
    pub fn new(default_color: NoteColor, notification_ttl: Duration) -> Self {
        Self {
            focus: Focus::Title,
            form: FormState::new(default_color),
            list: ListView::default(),
            notifications: NotificationCenter::new(notification_ttl),
            default_color,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.step(1, self.list.filter_visible());
    }

    pub fn focus_previous(&mut self) {
        self.focus = self.focus.step(-1, self.list.filter_visible());
    }

    /// Hidden filter rows cannot keep focus.
    pub fn toggle_filter_visibility(&mut self) {
        if self.focus == Focus::Filter && !self.list.filter_visible() {
            self.focus = Focus::List;
        }
    }

    /// Validates the form; a failure is reported as an error notification and
    /// yields no intent.
    pub fn submit_form(&mut self) -> Option<Intent> {
        match validate_submission(
            self.form.title.value(),
            self.form.description.value(),
            self.form.color,
        ) {
            Ok(draft) => Some(Intent::AddNote(draft)),
            Err(err) => {
                tracing::debug!(%err, "note form rejected");
                self.notifications
                    .push(err.to_string(), NotificationLevel::Error);
                None
            }
        }
    }

    pub fn filter_change(&self) -> Option<Intent> {
        if !self.list.filter_visible() {
            return None;
        }
        Some(Intent::SetFavoritesFilter(!self.list.show_only_favorites()))
    }

    /// Resolves a button press on the selected row to the note it belongs to.
    pub fn list_button(&self, button: ListButton) -> Option<Intent> {
        let id = self.list.note_id_at(self.list.selected())?;
        Some(match button {
            ListButton::Favorite => Intent::ToggleFavorite(id),
            ListButton::Delete => Intent::DeleteNote(id),
        })
    }

    pub fn on_tick(&mut self, now: Instant) {
        self.notifications.expire(now);
    }
}

impl Presenter for ViewState {
    fn show_notification(&mut self, text: &str, level: NotificationLevel) {
        self.notifications.push(text, level);
    }

    fn reset_form(&mut self) {
        self.form.reset(self.default_color);
    }
}

fn prev_grapheme_boundary(text: &str, cursor: usize) -> usize {
    if cursor == 0 {
        return 0;
    }
    let mut last = 0;
    for (idx, _) in text[..cursor].grapheme_indices(true) {
        last = idx;
    }
    last
}

fn next_grapheme_boundary(text: &str, cursor: usize) -> usize {
    if cursor >= text.len() {
        return text.len();
    }
    text[cursor..]
        .graphemes(true)
        .next()
        .map(|grapheme| cursor + grapheme.len())
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NotesModel;
    use assert_matches::assert_matches;

    fn view_for(model: &mut NotesModel) -> ViewState {
        let view = ViewState::new(NoteColor::Yellow, Duration::from_secs(3));
        model.subscribe(Arc::new(view.list.clone()));
        model.update_notes_view();
        view
    }

    #[test]
    fn validation_rejects_blank_fields_first() {
        assert_matches!(
            validate_submission("", "Valid text", NoteColor::Green),
            Err(ValidationError::EmptyFields)
        );
        assert_matches!(
            validate_submission(&"x".repeat(60), "   ", NoteColor::Green),
            Err(ValidationError::EmptyFields)
        );
    }

    #[test]
    fn validation_enforces_length_limits_in_order() {
        let long_title = "t".repeat(51);
        let long_body = "b".repeat(251);
        let err = validate_submission(&long_title, &long_body, NoteColor::Red).unwrap_err();
        assert_eq!(err.to_string(), "Maximum title length is 50 characters");

        let err = validate_submission("ok", &long_body, NoteColor::Red).unwrap_err();
        assert_eq!(err.to_string(), "Maximum description length is 250 characters");

        let draft =
            validate_submission(&"t".repeat(50), &"b".repeat(250), NoteColor::Red).unwrap();
        assert_eq!(draft.title.len(), 50);
    }

    #[test]
    fn validation_counts_characters_not_bytes() {
        let title = "ж".repeat(50);
        assert!(validate_submission(&title, "тело", NoteColor::Blue).is_ok());
    }

    #[test]
    fn validation_trims_input() {
        let draft = validate_submission("  Test ", "\tNote body ", NoteColor::Green).unwrap();
        assert_eq!(draft.title, "Test");
        assert_eq!(draft.content, "Note body");
    }

    #[test]
    fn text_input_edits_by_grapheme() {
        let mut input = TextInput::default();
        for ch in "ae\u{301}b".chars() {
            input.insert_char(ch);
        }
        assert!(input.move_left());
        assert!(input.backspace());
        assert_eq!(input.value(), "ab");
        assert!(input.move_home());
        assert!(input.delete());
        assert_eq!(input.value(), "b");
        assert!(!input.insert_char('\n'));
    }

    #[test]
    fn focus_skips_hidden_filter() {
        assert_eq!(Focus::Color.step(1, false), Focus::List);
        assert_eq!(Focus::Color.step(1, true), Focus::Filter);
        assert_eq!(Focus::List.step(1, false), Focus::Title);
        assert_eq!(Focus::Title.step(-1, true), Focus::List);
    }

    #[test]
    fn empty_title_submission_only_notifies() {
        let mut model = NotesModel::seeded();
        let mut view = view_for(&mut model);
        view.form.description.set_value("Valid text");

        assert!(view.submit_form().is_none());
        assert_eq!(view.notifications.len(), 1);
        let note = &view.notifications.items()[0];
        assert!(note.is_error());
        assert_eq!(note.text, "Fill in all fields");
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn list_selection_follows_note_across_updates() {
        let mut model = NotesModel::seeded();
        let view = view_for(&mut model);
        let seed = view.list.note_id_at(view.list.selected()).expect("seed selected");

        model.add_note("Newer", "body", NoteColor::Blue);
        assert_eq!(view.list.note_id_at(view.list.selected()), Some(seed));
        assert_eq!(view.list.selected(), 1);

        model.delete_note(seed);
        assert_eq!(view.list.selected(), 0);
        assert_eq!(view.list.visible_len(), 1);
    }

    #[test]
    fn list_button_resolves_selected_note() {
        let mut model = NotesModel::seeded();
        let view = view_for(&mut model);
        assert_eq!(
            view.list_button(ListButton::Delete),
            Some(Intent::DeleteNote(NoteId(1)))
        );

        model.delete_note(NoteId(1));
        assert_eq!(view.list_button(ListButton::Favorite), None);
    }

    #[test]
    fn list_button_maps_rendered_row_to_note_id() {
        let mut model = NotesModel::seeded();
        let view = view_for(&mut model);
        let newer = model.add_note("Newer", "body", NoteColor::Blue);

        assert_eq!(view.list.note_id_at(0), Some(newer));
        assert_eq!(view.list.note_id_at(1), Some(NoteId(1)));
        assert_eq!(view.list.note_id_at(2), None);

        view.list.move_selection(-1);
        assert_eq!(
            view.list_button(ListButton::Favorite),
            Some(Intent::ToggleFavorite(newer))
        );
        view.list.move_selection(1);
        assert_eq!(
            view.list_button(ListButton::Delete),
            Some(Intent::DeleteNote(NoteId(1)))
        );
    }

    #[test]
    fn view_tick_removes_expired_notifications() {
        let mut view = ViewState::new(NoteColor::Yellow, Duration::from_millis(10));
        let start = Instant::now();
        view.notifications
            .push_at("Note added", NotificationLevel::Success, start);

        view.on_tick(start + Duration::from_millis(5));
        assert_eq!(view.notifications.len(), 1);
        view.on_tick(start + Duration::from_millis(20));
        assert!(view.notifications.is_empty());
    }

    #[test]
    fn char_count_ignores_surrounding_whitespace() {
        let mut input = TextInput::default();
        input.set_value(format!("{}   ", "t".repeat(50)));
        assert_eq!(input.char_count(), 50);
    }

    #[test]
    fn filter_hidden_for_empty_collection_releases_focus() {
        let mut model = NotesModel::seeded();
        let mut view = view_for(&mut model);
        view.focus = Focus::Filter;
        assert_eq!(view.filter_change(), Some(Intent::SetFavoritesFilter(true)));

        model.delete_note(NoteId(1));
        view.toggle_filter_visibility();
        assert_eq!(view.focus, Focus::List);
        assert_eq!(view.filter_change(), None);
    }

    #[test]
    fn reset_form_restores_default_color() {
        let mut view = ViewState::new(NoteColor::Yellow, Duration::from_secs(3));
        view.form.title.set_value("t");
        view.form.description.set_value("d");
        view.form.color = NoteColor::Purple;
        view.reset_form();
        assert_eq!(view.form.title.value(), "");
        assert_eq!(view.form.description.value(), "");
        assert_eq!(view.form.color, NoteColor::Yellow);
    }
}
