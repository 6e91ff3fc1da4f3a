//! Text layout helpers shared by every pane

use chrono::{DateTime, Local, Utc};

/// Split `text` into chunks of at most `width` characters, breaking on
/// whitespace where possible and splitting long words otherwise. No
/// characters are dropped: concatenating the result yields `text`.
pub fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    if width <= 1 {
        return vec![text.chars().take(width).collect()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for token in tokens(text) {
        let token_len = token.chars().count();
        if current_len + token_len <= width {
            current.push_str(token);
            current_len += token_len;
            continue;
        }

        if current_len > 0 {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }

        let mut rest: Vec<char> = token.chars().collect();
        while rest.len() > width {
            let tail = rest.split_off(width);
            lines.push(rest.into_iter().collect());
            rest = tail;
        }
        current_len = rest.len();
        current = rest.into_iter().collect();
    }

    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Runs of whitespace and runs of non-whitespace, in order
fn tokens(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut prev_ws: Option<bool> = None;
    for (i, c) in text.char_indices() {
        let ws = c.is_whitespace();
        if prev_ws.is_some_and(|p| p != ws) {
            out.push(&text[start..i]);
            start = i;
        }
        prev_ws = Some(ws);
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

/// First `width` characters of `text`
pub fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

/// Shorten a title to fit inside a bordered box of `width` columns
pub fn fit_title(s: &str, width: u16) -> String {
    // width includes borders; keep safe margin
    let max = width.saturating_sub(4) as usize;
    if max == 0 {
        return "".into();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max {
        return s.to_string();
    }
    if max <= 1 {
        return "…".into();
    }
    let mut out: String = chars.into_iter().take(max - 1).collect();
    out.push('…');
    out
}

/// Left-align `s` in a column of `width` characters
pub fn pad(s: &str, width: usize) -> String {
    format!("{:<width$}", s, width = width)
}

/// Local wall-clock time as `HH:MM:SS`
pub fn clock_label() -> String {
    format_clock(Local::now())
}

pub fn format_clock(at: DateTime<Local>) -> String {
    at.format("%H:%M:%S").to_string()
}

/// ISO-8601 UTC timestamp with second precision, e.g. `2026-10-19T08:15:00Z`
pub fn utc_stamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_wrap_preserves_characters() {
        let text = "deploy v2 rolled out to canary, watching error budget";
        for width in [2, 5, 8, 13, 40, 200] {
            let lines = wrap_lines(text, width);
            assert_eq!(lines.concat(), text, "width {}", width);
            assert!(lines.iter().all(|l| l.chars().count() <= width));
        }
    }

    #[test]
    fn test_wrap_breaks_on_whitespace() {
        let lines = wrap_lines("alpha beta gamma", 11);
        assert_eq!(lines, vec!["alpha beta ", "gamma"]);
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let lines = wrap_lines("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_degenerate_widths() {
        assert_eq!(wrap_lines("", 10), vec![""]);
        assert_eq!(wrap_lines("hello", 1), vec!["h"]);
        assert_eq!(wrap_lines("hello", 0), vec![""]);
    }

    #[test]
    fn test_fit_title() {
        assert_eq!(fit_title("MAIN", 20), "MAIN");
        assert_eq!(fit_title("MAIN :: OVERVIEW", 10), "MAIN …");
        assert_eq!(fit_title("anything", 4), "");
    }

    #[test]
    fn test_utc_stamp_format() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 8, 15, 0).unwrap();
        assert_eq!(utc_stamp(at), "2026-10-19T08:15:00Z");
    }
}
