//! Column-width helpers for terminal text.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Display width in terminal columns (CJK and emoji count double).
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

/// Longest prefix of `s` that fits in `width` columns, cut on a char boundary.
fn prefix_within(s: &str, width: usize) -> &str {
    let mut used = 0;
    for (i, ch) in s.char_indices() {
        used += char_width(ch);
        if used > width {
            return &s[..i];
        }
    }
    s
}

/// Fit `s` into `width` columns, marking a cut with "..".
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if display_width(s) <= width {
        return s.to_string();
    }
    if width < 3 {
        return s
            .chars()
            .next()
            .filter(|&ch| char_width(ch) <= width)
            .map(String::from)
            .unwrap_or_default();
    }
    format!("{}..", prefix_within(s, width - 2))
}

/// Exactly `width` columns: space-padded, or truncated with "..".
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let used = display_width(s);
    if used > width {
        truncate_display(s, width)
    } else {
        format!("{}{}", s, " ".repeat(width - used))
    }
}

/// Word-wrap `text` to `width` display columns. Blank lines are kept;
/// words wider than the line are split.
pub(crate) fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for para in text.lines() {
        let mut line = String::new();
        let mut used = 0;
        for word in para.split_whitespace() {
            let mut word = word;
            let mut ww = display_width(word);
            if used > 0 && used + 1 + ww > width {
                out.push(std::mem::take(&mut line));
                used = 0;
            }
            while ww > width {
                let (head, tail) = split_at_width(word, width);
                if used > 0 {
                    out.push(std::mem::take(&mut line));
                    used = 0;
                }
                out.push(head.to_string());
                word = tail;
                ww = display_width(word);
            }
            if used > 0 {
                line.push(' ');
                used += 1;
            }
            line.push_str(word);
            used += ww;
        }
        out.push(line);
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

/// Split after at least one char, within `width` columns where possible.
fn split_at_width(s: &str, width: usize) -> (&str, &str) {
    let head = prefix_within(s, width);
    let head_len = match head.len() {
        0 => s.chars().next().map(char::len_utf8).unwrap_or(0),
        n => n,
    };
    s.split_at(head_len)
}
