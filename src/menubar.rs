//! Key hints shown in the menu bar and the status row.

use std::io::{self, Write};

use crossterm::{queue, style};

use crate::player::to_content_style;
use crate::types::Style;

/// One or more keys and what they do, rendered as `[k1][k2] action`.
#[derive(Debug, Clone, Copy)]
pub struct KeyHint {
    pub keys: &'static [&'static str],
    pub action: &'static str,
}

/// Hints for the intro once frames are on screen.
pub const PLAYBACK: &[KeyHint] = &[
    KeyHint {
        keys: &["\u{2191}\u{2193}", "wheel"],
        action: "scroll",
    },
    KeyHint {
        keys: &["PgUp", "PgDn"],
        action: "page",
    },
    KeyHint {
        keys: &["Home", "End"],
        action: "jump",
    },
    KeyHint {
        keys: &["q", "Esc"],
        action: "quit",
    },
];

/// Hints while frames are still loading. Only quitting is live.
pub const LOADING: &[KeyHint] = &[KeyHint {
    keys: &["q", "Esc"],
    action: "skip",
}];

/// Styled runs for `hints`: keys bold, actions dim, two spaces between hints.
pub fn spans(hints: &[KeyHint]) -> Vec<(String, Style)> {
    let key = Style {
        bold: true,
        ..Default::default()
    };
    let action = Style {
        dim: true,
        ..Default::default()
    };

    let mut out = Vec::new();
    for (i, hint) in hints.iter().enumerate() {
        if i > 0 {
            out.push(("  ".to_string(), Style::default()));
        }
        let keys: String = hint.keys.iter().map(|k| format!("[{k}]")).collect();
        out.push((keys, key.clone()));
        out.push((format!(" {}", hint.action), action.clone()));
    }
    out
}

pub fn print_hints(out: &mut impl Write, hints: &[KeyHint]) -> io::Result<()> {
    for (text, s) in spans(hints) {
        queue!(
            out,
            style::PrintStyledContent(style::StyledContent::new(to_content_style(&s), text))
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_bold_and_actions_dim() {
        let runs = spans(LOADING);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].0, "[q][Esc]");
        assert!(runs[0].1.bold);
        assert_eq!(runs[1].0, " skip");
        assert!(runs[1].1.dim && !runs[1].1.bold);
    }

    #[test]
    fn hints_are_separated() {
        let runs = spans(&PLAYBACK[..2]);
        let text: String = runs.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(text, "[\u{2191}\u{2193}][wheel] scroll  [PgUp][PgDn] page");
    }

    #[test]
    fn printed_output_contains_every_key() {
        let mut out = Vec::new();
        print_hints(&mut out, PLAYBACK).unwrap();
        let text = String::from_utf8(out).unwrap();
        for hint in PLAYBACK {
            for key in hint.keys {
                assert!(text.contains(&format!("[{key}]")), "missing {key}");
            }
        }
    }
}
