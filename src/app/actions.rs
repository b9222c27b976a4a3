use crate::app::notify::NotificationLevel;
use crate::app::state::NoteDraft;
use crate::model::{NoteColor, NoteId, NotesModel};

pub const NOTE_ADDED: &str = "Note added";
pub const NOTE_DELETED: &str = "Note deleted";

/// User command emitted by the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    AddNote(NoteDraft),
    DeleteNote(NoteId),
    ToggleFavorite(NoteId),
    SetFavoritesFilter(bool),
}

/// What the controller needs from the view.
pub trait Presenter {
    fn show_notification(&mut self, text: &str, level: NotificationLevel);
    fn reset_form(&mut self);
}

pub struct Controller<'a> {
    model: &'a mut NotesModel,
    presenter: &'a mut dyn Presenter,
}

impl<'a> Controller<'a> {
    pub fn new(model: &'a mut NotesModel, presenter: &'a mut dyn Presenter) -> Self {
        Self { model, presenter }
    }

    pub fn dispatch(&mut self, intent: Intent) {
        match intent {
            Intent::AddNote(draft) => {
                self.add_note(&draft.title, &draft.content, draft.color);
            }
            Intent::DeleteNote(id) => self.delete_note(id),
            Intent::ToggleFavorite(id) => self.toggle_favorite(id),
            Intent::SetFavoritesFilter(enabled) => self.set_favorites_filter(enabled),
        }
    }

    pub fn add_note(&mut self, title: &str, content: &str, color: NoteColor) -> NoteId {
        let id = self.model.add_note(title, content, color);
        self.presenter
            .show_notification(NOTE_ADDED, NotificationLevel::Success);
        self.presenter.reset_form();
        id
    }

    pub fn delete_note(&mut self, id: NoteId) {
        self.model.delete_note(id);
        self.presenter
            .show_notification(NOTE_DELETED, NotificationLevel::Success);
    }

    pub fn toggle_favorite(&mut self, id: NoteId) {
        self.model.toggle_favorite(id);
    }

    pub fn set_favorites_filter(&mut self, enabled: bool) {
        self.model.set_show_only_favorites(enabled);
    }
}
