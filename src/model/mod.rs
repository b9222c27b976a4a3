use std::fmt;
use std::sync::Arc;

use serde::Serialize;

pub mod palette;

pub use palette::NoteColor;

const SEED_TITLE: &str = "Working with forms";
const SEED_CONTENT: &str = "Specific form fields can be reached through form.elements \
by the value given in their name attribute";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NoteId(pub u64);

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub color: NoteColor,
    pub is_favorite: bool,
}

/// Snapshot published to listeners after every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotesChanged {
    pub visible: Vec<Note>,
    pub total: usize,
    pub filter_visible: bool,
    pub show_only_favorites: bool,
}

pub trait NotesListener: Send + Sync {
    fn notes_changed(&self, event: &NotesChanged);
}

#[derive(Debug, Clone)]
struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    fn starting_at(next: u64) -> Self {
        Self { next }
    }

    fn next_id(&mut self) -> NoteId {
        let id = NoteId(self.next);
        self.next += 1;
        id
    }
}

pub struct NotesModel {
    notes: Vec<Note>,
    show_only_favorites: bool,
    ids: IdGenerator,
    listeners: Vec<Arc<dyn NotesListener>>,
}

impl NotesModel {
    /// Empty collection; ids start at 1.
    pub fn new() -> Self {
        Self {
            notes: Vec::new(),
            show_only_favorites: false,
            ids: IdGenerator::starting_at(1),
            listeners: Vec::new(),
        }
    }

    /// Collection holding the single example note (id 1).
    pub fn seeded() -> Self {
        let mut model = Self::new();
        let id = model.ids.next_id();
        model.notes.push(Note {
            id,
            title: SEED_TITLE.to_string(),
            content: SEED_CONTENT.to_string(),
            color: NoteColor::Green,
            is_favorite: false,
        });
        model
    }

    pub fn subscribe(&mut self, listener: Arc<dyn NotesListener>) {
        self.listeners.push(listener);
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn show_only_favorites(&self) -> bool {
        self.show_only_favorites
    }

    /// Inputs are expected to be validated by the caller.
    pub fn add_note(&mut self, title: &str, content: &str, color: NoteColor) -> NoteId {
        let id = self.ids.next_id();
        self.notes.insert(
            0,
            Note {
                id,
                title: title.to_string(),
                content: content.to_string(),
                color,
                is_favorite: false,
            },
        );
        tracing::info!(note_id = %id, ?color, "note added");
        self.update_notes_view();
        id
    }

    /// Returns `false` when no note carries `id`; the collection is left untouched.
    pub fn delete_note(&mut self, id: NoteId) -> bool {
        let removed = match self.notes.iter().position(|note| note.id == id) {
            Some(idx) => {
                self.notes.remove(idx);
                tracing::info!(note_id = %id, "note deleted");
                true
            }
            None => {
                tracing::debug!(note_id = %id, "delete ignored, unknown note");
                false
            }
        };
        self.update_notes_view();
        removed
    }

    /// Returns the new favorite flag, or `None` for an unknown id.
    pub fn toggle_favorite(&mut self, id: NoteId) -> Option<bool> {
        let flipped = match self.notes.iter_mut().find(|note| note.id == id) {
            Some(note) => {
                note.is_favorite = !note.is_favorite;
                tracing::debug!(note_id = %id, favorite = note.is_favorite, "favorite toggled");
                Some(note.is_favorite)
            }
            None => {
                tracing::debug!(note_id = %id, "favorite toggle ignored, unknown note");
                None
            }
        };
        self.update_notes_view();
        flipped
    }

    pub fn set_show_only_favorites(&mut self, enabled: bool) {
        self.show_only_favorites = enabled;
        tracing::debug!(enabled, "favorites filter changed");
        self.update_notes_view();
    }

    pub fn filtered_notes(&self) -> Vec<&Note> {
        if self.show_only_favorites {
            self.notes.iter().filter(|note| note.is_favorite).collect()
        } else {
            self.notes.iter().collect()
        }
    }

    pub fn snapshot(&self) -> NotesChanged {
        NotesChanged {
            visible: self.filtered_notes().into_iter().cloned().collect(),
            total: self.notes.len(),
            filter_visible: !self.notes.is_empty(),
            show_only_favorites: self.show_only_favorites,
        }
    }

    /// Pushes the current snapshot to every listener.
    pub fn update_notes_view(&self) {
        if self.listeners.is_empty() {
            return;
        }
        let event = self.snapshot();
        for listener in &self.listeners {
            listener.notes_changed(&event);
        }
    }
}

impl Default for NotesModel {
    fn default() -> Self {
        Self::new()
    }
}
