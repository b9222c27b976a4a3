pub mod app;
pub mod cli;
pub mod config;
pub mod model;
pub mod ui;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use model::{Note, NoteColor, NoteId, NotesModel};
