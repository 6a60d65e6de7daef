// ── String and path normalization ─────────────────────────────────────────────
//
// Pure helpers shared by every provider: mnemonic escaping for GTK labels,
// AppleScript literal quoting, numeric default formatting, lenient number
// parsing and trailing-separator cleanup.  No I/O lives here.

use std::path::MAIN_SEPARATOR;

// ── Escaping ──────────────────────────────────────────────────────────────────

/// Double every underscore so GTK does not read it as a mnemonic marker.
pub(crate) fn escape_mnemonics(s: &str) -> String {
    s.replace('_', "__")
}

/// Render `s` as an AppleScript string literal, quotes included.
///
/// Backslashes and double quotes are escaped.  Line breaks cannot appear
/// inside a literal, so each one is spliced in as `" & linefeed & "`.
pub(crate) fn applescript_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\" & linefeed & \"");
            }
            '\n' => out.push_str("\" & linefeed & \""),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

// ── Numbers ───────────────────────────────────────────────────────────────────

/// Format a numeric default the way the prompt shows it: six fractional
/// digits with trailing zeros (and a bare trailing dot) removed.
pub(crate) fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_owned();
    }
    let mut s = format!("{value:.6}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s = "0".to_owned();
    }
    s
}

/// Parse the longest leading decimal number in `s`, C `strtod` style.
///
/// Leading whitespace is skipped and trailing garbage is ignored.  Returns
/// `0.0` when no number can be read at all.
///
/// Decimal only: unlike `strtod`, `inf`, `nan` and hex forms such as `0x10`
/// are not recognised (`0x10` reads as `0`).
pub(crate) fn parse_number(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return 0.0;
    }

    // Optional exponent; only consumed when at least one digit follows.
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().unwrap_or(0.0)
}

// ── Paths ─────────────────────────────────────────────────────────────────────

/// Append the platform separator to a directory path unless it already ends
/// with one.  An empty path stays empty (it means "cancelled").
pub(crate) fn with_trailing_separator(dir: &str) -> String {
    if dir.is_empty() || dir.ends_with(MAIN_SEPARATOR) || dir.ends_with('/') {
        return dir.to_owned();
    }
    format!("{dir}{MAIN_SEPARATOR}")
}

/// Collapse doubled separators that some pickers emit (`a//b` → `a/b`).
///
/// A leading pair is kept so UNC paths (`\\server\share`) survive.
pub(crate) fn collapse_separators(path: &str, sep: char) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_sep = false;
    for (i, c) in path.chars().enumerate() {
        if c == sep {
            if prev_sep && i > 1 {
                continue;
            }
            prev_sep = true;
        } else {
            prev_sep = false;
        }
        out.push(c);
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
