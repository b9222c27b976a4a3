use std::fmt::Write as _;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;
use thiserror::Error;

use crate::app::{App, NotificationLevel};
use crate::config::AppConfig;
use crate::model::{Note, NoteColor, NoteId, NotesChanged};
use crate::ui::{render_notes_count, EMPTY_MESSAGE};

#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    /// Script to run. If omitted, reads from stdin.
    #[arg()]
    pub script: Option<PathBuf>,
    /// Print the final state as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptCommand {
    Add {
        color: NoteColor,
        title: String,
        description: String,
    },
    Favorite(NoteId),
    Delete(NoteId),
    Filter(bool),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("line {line}: unknown command `{command}`")]
    UnknownCommand { line: usize, command: String },
    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },
}

#[derive(Debug, Serialize)]
struct ReplayReport<'a> {
    notifications: Vec<ReportedNotification<'a>>,
    notes: Vec<ReportedNote<'a>>,
    total: usize,
    show_only_favorites: bool,
}

#[derive(Debug, Serialize)]
struct ReportedNote<'a> {
    #[serde(flatten)]
    note: &'a Note,
    hex: &'static str,
}

#[derive(Debug, Serialize)]
struct ReportedNotification<'a> {
    level: &'static str,
    text: &'a str,
}

pub fn run_tui(app: &mut App) -> Result<()> {
    app.run()
}

pub fn replay(config: Arc<AppConfig>, args: ReplayArgs) -> Result<()> {
    let source = match &args.script {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?,
        None => match read_stdin()? {
            Some(source) => source,
            None => bail!("no script given; pass a file or pipe one on stdin"),
        },
    };
    let output = run_replay(config, &source, args.json)?;
    print!("{output}");
    Ok(())
}

fn run_replay(config: Arc<AppConfig>, source: &str, json: bool) -> Result<String> {
    let script = parse_script(source)?;
    let mut app = App::new(config);
    for (line, command) in script {
        tracing::debug!(line, ?command, "replaying");
        apply_command(&mut app, command);
    }

    let snapshot = app.view().list.snapshot();
    let notifications = app.view().notifications.items();
    if json {
        let report = ReplayReport {
            notifications: notifications
                .iter()
                .map(|n| ReportedNotification {
                    level: level_label(n.level),
                    text: &n.text,
                })
                .collect(),
            notes: snapshot
                .visible
                .iter()
                .map(|note| ReportedNote {
                    note,
                    hex: note.color.hex(),
                })
                .collect(),
            total: snapshot.total,
            show_only_favorites: snapshot.show_only_favorites,
        };
        let mut out = serde_json::to_string_pretty(&report).context("serialising replay report")?;
        out.push('\n');
        return Ok(out);
    }

    let mut out = String::new();
    for notification in notifications {
        let _ = writeln!(
            out,
            "[{}] {}",
            level_label(notification.level),
            notification.text
        );
    }
    out.push_str(&format_notes(&snapshot));
    Ok(out)
}

/// Form-bound commands go through the same validation as the interactive form.
fn apply_command(app: &mut App, command: ScriptCommand) {
    let intent = match command {
        ScriptCommand::Add {
            color,
            title,
            description,
        } => {
            let view = app.view_mut();
            view.form.title.set_value(title);
            view.form.description.set_value(description);
            view.form.color = color;
            view.submit_form()
        }
        ScriptCommand::Favorite(id) => Some(crate::app::Intent::ToggleFavorite(id)),
        ScriptCommand::Delete(id) => Some(crate::app::Intent::DeleteNote(id)),
        ScriptCommand::Filter(enabled) => Some(crate::app::Intent::SetFavoritesFilter(enabled)),
    };
    if let Some(intent) = intent {
        app.dispatch(intent);
    }
}

pub fn parse_script(source: &str) -> Result<Vec<(usize, ScriptCommand)>, ScriptError> {
    let mut commands = Vec::new();
    for (idx, raw) in source.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let (verb, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim_start()),
            None => (trimmed, ""),
        };
        let command = match verb {
            "add" => parse_add(line, rest)?,
            "fav" => ScriptCommand::Favorite(parse_id(line, rest)?),
            "delete" => ScriptCommand::Delete(parse_id(line, rest)?),
            "filter" => match rest {
                "on" => ScriptCommand::Filter(true),
                "off" => ScriptCommand::Filter(false),
                other => {
                    return Err(ScriptError::Malformed {
                        line,
                        message: format!("filter expects `on` or `off`, got `{other}`"),
                    })
                }
            },
            other => {
                return Err(ScriptError::UnknownCommand {
                    line,
                    command: other.to_string(),
                })
            }
        };
        commands.push((line, command));
    }
    Ok(commands)
}

fn parse_add(line: usize, rest: &str) -> Result<ScriptCommand, ScriptError> {
    let (color_key, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let color = NoteColor::from_str(color_key).map_err(|_| ScriptError::Malformed {
        line,
        message: format!("unknown color `{color_key}`"),
    })?;
    let Some((title, description)) = text.split_once('|') else {
        return Err(ScriptError::Malformed {
            line,
            message: "add expects `<color> <title> | <description>`".into(),
        });
    };
    Ok(ScriptCommand::Add {
        color,
        title: title.to_string(),
        description: description.to_string(),
    })
}

fn parse_id(line: usize, rest: &str) -> Result<NoteId, ScriptError> {
    rest.parse::<u64>()
        .map(NoteId)
        .map_err(|_| ScriptError::Malformed {
            line,
            message: format!("expected a note id, got `{rest}`"),
        })
}

fn format_notes(snapshot: &NotesChanged) -> String {
    let mut out = String::new();
    if snapshot.visible.is_empty() {
        for line in EMPTY_MESSAGE {
            let _ = writeln!(out, "{line}");
        }
    }
    for note in &snapshot.visible {
        let favorite = if note.is_favorite { "♥" } else { "♡" };
        let _ = writeln!(
            out,
            "#{} [{}] {}: {} ({} {})",
            note.id,
            favorite,
            note.title,
            note.content,
            note.color,
            note.color.hex()
        );
    }
    let _ = writeln!(out, "{}", render_notes_count(snapshot.total));
    out
}

fn level_label(level: NotificationLevel) -> &'static str {
    match level {
        NotificationLevel::Success => "ok",
        NotificationLevel::Error => "error",
    }
}

fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("reading script from stdin")?;
    Ok(Some(buf))
}
