use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Fixed palette a note can be tagged with.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum NoteColor {
    Green,
    Blue,
    Red,
    Yellow,
    Purple,
}

impl Default for NoteColor {
    fn default() -> Self {
        NoteColor::Yellow
    }
}

impl NoteColor {
    /// Display value stored alongside the note.
    pub fn hex(self) -> &'static str {
        match self {
            NoteColor::Green => "#C2F37D",
            NoteColor::Blue => "#7DE1F3",
            NoteColor::Red => "#F37D7D",
            NoteColor::Yellow => "#F3DB7D",
            NoteColor::Purple => "#E77DF3",
        }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            NoteColor::Green => (0xC2, 0xF3, 0x7D),
            NoteColor::Blue => (0x7D, 0xE1, 0xF3),
            NoteColor::Red => (0xF3, 0x7D, 0x7D),
            NoteColor::Yellow => (0xF3, 0xDB, 0x7D),
            NoteColor::Purple => (0xE7, 0x7D, 0xF3),
        }
    }

    pub fn next(self) -> Self {
        let all: Vec<_> = NoteColor::iter().collect();
        let idx = all.iter().position(|c| *c == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }

    pub fn previous(self) -> Self {
        let all: Vec<_> = NoteColor::iter().collect();
        let idx = all.iter().position(|c| *c == self).unwrap_or(0);
        all[(idx + all.len() - 1) % all.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_keys_case_insensitively() {
        assert_eq!(NoteColor::from_str("green").unwrap(), NoteColor::Green);
        assert_eq!(NoteColor::from_str("PURPLE").unwrap(), NoteColor::Purple);
        assert!(NoteColor::from_str("orange").is_err());
    }

    #[test]
    fn cycling_wraps_around_the_palette() {
        assert_eq!(NoteColor::Purple.next(), NoteColor::Green);
        assert_eq!(NoteColor::Green.previous(), NoteColor::Purple);
        let mut color = NoteColor::Yellow;
        for _ in 0..NoteColor::iter().count() {
            color = color.next();
        }
        assert_eq!(color, NoteColor::Yellow);
    }

    #[test]
    fn hex_matches_rgb_components() {
        for color in NoteColor::iter() {
            let (r, g, b) = color.rgb();
            assert_eq!(color.hex(), format!("#{r:02X}{g:02X}{b:02X}"));
        }
    }
}
