use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::Frame;
use strum::IntoEnumIterator;
use time::{macros::format_description, OffsetDateTime};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::app::notify::Notification;
use crate::app::state::{
    Focus, TextInput, ViewState, DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS,
};
use crate::model::{Note, NoteColor};

pub const EMPTY_MESSAGE: [&str; 2] = [
    "You have no notes yet.",
    "Fill in the fields above and create your first note!",
];

const FAVORITE_ACTIVE: &str = "♥";
const FAVORITE_INACTIVE: &str = "♡";
const DELETE_ICON: &str = "✕";
const SUCCESS_ICON: &str = "✓";
const WARNING_ICON: &str = "⚠";

const HIGHLIGHT_SYMBOL: &str = "▸ ";
const NOTIFICATION_WIDTH: u16 = 48;
const NOTIFICATION_HEIGHT: u16 = 3;

pub fn draw_app(frame: &mut Frame, view: &ViewState, list_state: &mut ListState) {
    let filter_visible = view.list.filter_visible();
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Length(if filter_visible { 1 } else { 0 }),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.size());

    render_form(frame, view, vertical[0]);
    if filter_visible {
        render_filter_box(frame, view, vertical[1]);
    }

    let list_focused = view.focus == Focus::List;
    let list_block = Block::default()
        .title("Notes")
        .borders(Borders::ALL)
        .border_style(focus_style(list_focused));
    let inner_width = list_block.inner(vertical[2]).width;
    let content_width = inner_width.saturating_sub(HIGHLIGHT_SYMBOL.width() as u16) as usize;

    let items = view
        .list
        .with_snapshot(|snapshot| render_notes(&snapshot.visible, content_width));
    let list = List::new(items)
        .block(list_block)
        .highlight_style(if list_focused {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        })
        .highlight_symbol(HIGHLIGHT_SYMBOL);
    frame.render_stateful_widget(list, vertical[2], list_state);

    let count = Paragraph::new(render_notes_count(view.list.total()))
        .style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_widget(count, vertical[3]);

    let keys = Paragraph::new(key_hints(view.focus)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(keys, vertical[4]);

    render_notifications(frame, view.notifications.items(), frame.size());
}

/// One list item per note; an empty slice renders the empty-state message.
pub fn render_notes(notes: &[Note], width: usize) -> Vec<ListItem<'static>> {
    if notes.is_empty() {
        let lines = EMPTY_MESSAGE
            .iter()
            .map(|line| {
                Line::from(Span::styled(
                    *line,
                    Style::default()
                        .fg(Color::Gray)
                        .add_modifier(Modifier::ITALIC),
                ))
            })
            .collect::<Vec<_>>();
        return vec![ListItem::new(lines)];
    }
    notes
        .iter()
        .map(|note| ListItem::new(note_lines(note, width)))
        .collect()
}

pub fn note_lines(note: &Note, width: usize) -> Vec<Line<'static>> {
    let header_style = Style::default()
        .bg(swatch(note.color))
        .fg(Color::Black);
    let favorite = if note.is_favorite {
        Span::styled(
            format!(" {FAVORITE_ACTIVE} "),
            header_style.fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(format!(" {FAVORITE_INACTIVE} "), header_style)
    };
    let delete = Span::styled(format!(" {DELETE_ICON} "), header_style);
    let actions_width = favorite.width() + delete.width();

    let title_width = width.saturating_sub(actions_width).max(1);
    let mut title = truncate_to_width(&format!(" {}", note.title), title_width);
    let padding = title_width.saturating_sub(title.width());
    title.push_str(&" ".repeat(padding));

    let mut lines = Vec::new();
    lines.push(Line::from(vec![
        Span::styled(title, header_style.add_modifier(Modifier::BOLD)),
        favorite,
        delete,
    ]));
    for line in wrap_text(&note.content, width.max(1)) {
        lines.push(Line::from(line));
    }
    lines.push(Line::from(""));
    lines
}

pub fn render_notes_count(total: usize) -> String {
    format!("Total notes: {total}")
}

fn render_form(frame: &mut Frame, view: &ViewState, area: Rect) {
    let block = Block::default()
        .title("New note")
        .borders(Borders::ALL)
        .border_style(focus_style(view.focus.is_form()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    const LABEL_WIDTH: usize = 13;
    let fields = [
        ("Title", &view.form.title, TITLE_MAX_CHARS, Focus::Title),
        (
            "Description",
            &view.form.description,
            DESCRIPTION_MAX_CHARS,
            Focus::Description,
        ),
    ];
    for (row, (label, input, limit, focus)) in fields.into_iter().enumerate() {
        let area = rows[row];
        let counter = field_counter(input, limit);
        let field_width = (area.width as usize)
            .saturating_sub(LABEL_WIDTH + counter.width())
            .max(1);
        let (visible, cursor_col) = visible_window(input, field_width);
        let focused = view.focus == focus;
        let line = Line::from(vec![
            Span::styled(
                format!("{label:<width$}", width = LABEL_WIDTH),
                focus_style(focused).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("{visible:<field_width$}")),
            counter,
        ]);
        frame.render_widget(Paragraph::new(line), area);
        if focused {
            frame.set_cursor(area.x + (LABEL_WIDTH + cursor_col) as u16, area.y);
        }
    }

    let color_focused = view.focus == Focus::Color;
    let mut color_spans = vec![Span::styled(
        format!("{:<width$}", "Color", width = LABEL_WIDTH),
        focus_style(color_focused).add_modifier(Modifier::BOLD),
    )];
    for color in NoteColor::iter() {
        let selected = color == view.form.color;
        let mut style = Style::default().fg(swatch(color));
        if selected {
            style = Style::default()
                .bg(swatch(color))
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD);
        }
        let marker = if selected { "●" } else { "○" };
        color_spans.push(Span::styled(format!(" {marker} {color} "), style));
    }
    frame.render_widget(Paragraph::new(Line::from(color_spans)), rows[2]);

    frame.render_widget(
        Paragraph::new(Span::styled(
            "Enter add note • Tab next field • ←/→ change color",
            Style::default().fg(Color::DarkGray),
        )),
        rows[3],
    );
}

fn render_filter_box(frame: &mut Frame, view: &ViewState, area: Rect) {
    let checked = view.list.show_only_favorites();
    let mark = if checked { "[x]" } else { "[ ]" };
    let focused = view.focus == Focus::Filter;
    let line = Line::from(vec![
        Span::styled(format!(" {mark} "), focus_style(focused).add_modifier(Modifier::BOLD)),
        Span::styled("Show only favorites", focus_style(focused)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_notifications(frame: &mut Frame, notifications: &[Notification], area: Rect) {
    if notifications.is_empty() {
        return;
    }
    let width = NOTIFICATION_WIDTH.min(area.width);
    let max_visible = (area.height / NOTIFICATION_HEIGHT) as usize;
    let skip = notifications.len().saturating_sub(max_visible);
    // newest at the bottom, stacked upwards
    let mut bottom = area.y + area.height;
    for notification in notifications.iter().skip(skip).rev() {
        if bottom < area.y + NOTIFICATION_HEIGHT {
            break;
        }
        bottom -= NOTIFICATION_HEIGHT;
        let rect = Rect {
            x: area.x + area.width - width,
            y: bottom,
            width,
            height: NOTIFICATION_HEIGHT,
        };
        frame.render_widget(Clear, rect);
        frame.render_widget(notification_widget(notification), rect);
    }
}

fn notification_widget(notification: &Notification) -> Paragraph<'static> {
    let (icon, accent) = if notification.is_error() {
        (WARNING_ICON, Color::Red)
    } else {
        (SUCCESS_ICON, Color::Green)
    };
    let line = Line::from(vec![
        Span::styled(
            format!("{icon} "),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ),
        Span::raw(notification.text.clone()),
    ]);
    Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent))
            .title(Span::styled(
                format_time_short(notification.created_at),
                Style::default().fg(Color::DarkGray),
            )),
    )
}

fn key_hints(focus: Focus) -> Text<'static> {
    let hint = match focus {
        Focus::Title | Focus::Description => {
            "type to edit • Enter add • Tab next • Esc to list • Ctrl-c quit"
        }
        Focus::Color => "←/→ color • Enter add • Tab next • x dismiss • q quit",
        Focus::Filter => "Space toggle favorites filter • Tab next • x dismiss • q quit",
        Focus::List => {
            "j/k move • f favorite • d delete • a new note • Tab next • x dismiss • q quit"
        }
    };
    Text::from(hint)
}

fn field_counter(input: &TextInput, limit: usize) -> Span<'static> {
    let count = input.char_count();
    let style = if count > limit {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Span::styled(format!(" {count}/{limit}"), style)
}

fn swatch(color: NoteColor) -> Color {
    let (r, g, b) = color.rgb();
    Color::Rgb(r, g, b)
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn format_time_short(dt: OffsetDateTime) -> String {
    dt.format(&format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_else(|_| dt.unix_timestamp().to_string())
}

/// Slice of the input that fits `width` columns with the cursor kept visible,
/// plus the cursor column inside that slice.
fn visible_window(input: &TextInput, width: usize) -> (String, usize) {
    let value = input.value();
    let cursor = input.cursor().min(value.len());
    let before: Vec<&str> = value[..cursor].graphemes(true).collect();

    let mut start = before.len();
    let mut used = 0;
    while start > 0 {
        let w = before[start - 1].width();
        if used + w >= width {
            break;
        }
        used += w;
        start -= 1;
    }

    let mut visible: String = before[start..].concat();
    let mut total = used;
    for grapheme in value[cursor..].graphemes(true) {
        let w = grapheme.width();
        if total + w > width {
            break;
        }
        total += w;
        visible.push_str(grapheme);
    }
    (visible, used)
}

fn truncate_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for grapheme in text.graphemes(true) {
        let w = grapheme.width();
        if used + w + 1 > width {
            break;
        }
        used += w;
        out.push_str(grapheme);
    }
    out.push('…');
    out
}

fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;
    for word in text.split_whitespace() {
        let word_width = word.width();
        if current_width > 0 && current_width + 1 + word_width > width {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
        }
        if word_width > width {
            for grapheme in word.graphemes(true) {
                let w = grapheme.width();
                if current_width + w > width {
                    lines.push(std::mem::take(&mut current));
                    current_width = 0;
                }
                current.push_str(grapheme);
                current_width += w;
            }
            continue;
        }
        if current_width > 0 {
            current.push(' ');
            current_width += 1;
        }
        current.push_str(word);
        current_width += word_width;
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
