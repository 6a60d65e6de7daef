// ── Result normalization ──────────────────────────────────────────────────────
//
// Providers report neutral raw outcomes (`Button`, `RawSelection`, `Rgb`);
// this module turns them into the fixed result contract:
//
//   message            → 1
//   message cancelable → OK 1, anything else −1
//   question           → Yes 1, No 0 (Cancel −1 when offered)
//   attempt            → Retry 0, anything else −1
//   error              → Abort (or abort flag) terminates, Retry 0, else −1
//   color              → packed R | G<<8 | B<<16, cancel −1
//   multi-select       → every path must be an existing file, else empty
//
// Nothing here talks to the OS except the existence check on selected files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::text::collapse_separators;

// ── Buttons ───────────────────────────────────────────────────────────────────

/// A button the user pressed, independent of backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    Abort,
    Ignore,
    Ok,
    Cancel,
    Yes,
    No,
    Retry,
}

impl Button {
    /// All buttons in label-table order.
    pub const ALL: [Button; 7] = [
        Button::Abort,
        Button::Ignore,
        Button::Ok,
        Button::Cancel,
        Button::Yes,
        Button::No,
        Button::Retry,
    ];

    /// Button for a label-table index (0 Abort … 6 Retry).
    pub fn from_index(index: i32) -> Option<Button> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// The English caption shown when no custom label is set.
    pub fn default_label(self) -> &'static str {
        match self {
            Button::Abort => "Abort",
            Button::Ignore => "Ignore",
            Button::Ok => "OK",
            Button::Cancel => "Cancel",
            Button::Yes => "Yes",
            Button::No => "No",
            Button::Retry => "Retry",
        }
    }
}

// ── Status mapping ────────────────────────────────────────────────────────────

/// Plain message: dismissal is the only outcome.
pub(crate) fn message_status(_outcome: Option<Button>) -> i32 {
    1
}

/// OK → 1; Cancel, close box or failure → −1.
pub(crate) fn message_cancelable_status(outcome: Option<Button>) -> i32 {
    match outcome {
        Some(Button::Ok) => 1,
        _ => -1,
    }
}

/// Yes → 1, No → 0.  Anything else is −1 when a Cancel button was offered
/// and 0 otherwise, so the plain question never leaves `{0, 1}`.
pub(crate) fn question_status(outcome: Option<Button>, cancelable: bool) -> i32 {
    match outcome {
        Some(Button::Yes) => 1,
        Some(Button::No) => 0,
        _ if cancelable => -1,
        _ => 0,
    }
}

/// Retry → 0; Cancel or dismissal → −1.
pub(crate) fn attempt_status(outcome: Option<Button>) -> i32 {
    match outcome {
        Some(Button::Retry) => 0,
        _ => -1,
    }
}

/// What an error dialog asks the caller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    /// End the host process now.
    Terminate,
    Status(i32),
}

/// Abort, or any outcome at all when `abort` is set, terminates.
/// Retry → 0; Ignore or dismissal → −1.
pub(crate) fn error_verdict(outcome: Option<Button>, abort: bool) -> Verdict {
    match outcome {
        _ if abort => Verdict::Terminate,
        Some(Button::Abort) => Verdict::Terminate,
        Some(Button::Retry) => Verdict::Status(0),
        _ => Verdict::Status(-1),
    }
}

// ── Numbers ───────────────────────────────────────────────────────────────────

/// Inclusive magnitude bound for numeric prompts.
pub const NUMBER_LIMIT: f64 = 999_999_999_999_999.0;

/// Clamp to `[-NUMBER_LIMIT, NUMBER_LIMIT]`.  NaN becomes 0.
pub(crate) fn clamp_digits(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(-NUMBER_LIMIT, NUMBER_LIMIT)
}

// ── Colors ────────────────────────────────────────────────────────────────────

/// Returned by the color pickers on cancel; no packed color can equal it.
pub const CANCELLED_COLOR: i32 = -1;

/// A 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `R | G << 8 | B << 16`, the same layout as a Win32 `COLORREF`.
    pub fn pack(self) -> i32 {
        i32::from(self.r) | i32::from(self.g) << 8 | i32::from(self.b) << 16
    }

    /// Inverse of [`Rgb::pack`]; bits above the low 24 are ignored.
    pub fn from_packed(color: i32) -> Self {
        Self {
            r: (color & 0xFF) as u8,
            g: ((color >> 8) & 0xFF) as u8,
            b: ((color >> 16) & 0xFF) as u8,
        }
    }

    /// `#rrggbb`, as KDialog expects for `--default`.
    pub(crate) fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Parse `#rrggbb` (or `#rgb`).  Anything but hex digits after the `#`
/// is rejected.
pub(crate) fn parse_hex_color(s: &str) -> Option<Rgb> {
    let hex = s.trim().strip_prefix('#')?;
    let digits: Vec<u8> = hex
        .chars()
        .map(|c| c.to_digit(16).map(|d| d as u8))
        .collect::<Option<_>>()?;
    match digits[..] {
        [r1, r2, g1, g2, b1, b2] => Some(Rgb::new(r1 * 16 + r2, g1 * 16 + g2, b1 * 16 + b2)),
        [r, g, b] => Some(Rgb::new(r * 17, g * 17, b * 17)),
        _ => None,
    }
}

/// Parse GTK color-chooser output: `rgb(r,g,b)`, `rgba(r,g,b,a)` or `#rrggbb`.
pub(crate) fn parse_css_color(s: &str) -> Option<Rgb> {
    let s = s.trim();
    if s.starts_with('#') {
        return parse_hex_color(s);
    }
    let inner = s
        .strip_prefix("rgba(")
        .or_else(|| s.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let mut parts = inner.split(',').map(|p| p.trim().parse::<f64>().ok());
    let mut next = || -> Option<u8> { Some(parts.next()??.round().clamp(0.0, 255.0) as u8) };
    Some(Rgb::new(next()?, next()?, next()?))
}

/// Parse AppleScript's `choose color` result: three 16-bit channels
/// separated by commas (`65535, 0, 32896`).
pub(crate) fn parse_rgb16(s: &str) -> Option<Rgb> {
    let mut parts = s.trim().trim_matches(['{', '}']).split(',');
    let mut next = || -> Option<u8> {
        let v: u32 = parts.next()?.trim().parse().ok()?;
        Some(((v.min(65_535) + 128) / 257) as u8)
    };
    let rgb = Rgb::new(next()?, next()?, next()?);
    Some(rgb)
}

// ── File selections ───────────────────────────────────────────────────────────

/// Raw output of a file picker, before paths are rebuilt and checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSelection {
    /// Exactly one complete path.
    Single(String),
    /// `[dir, name1, name2, …]` as a multi-select buffer packs it.  A single
    /// element is already a complete path.
    Fragments(Vec<String>),
    /// One complete path per line.
    Lines(String),
}

impl RawSelection {
    /// Rebuild the ordered list of full paths.  No existence check.
    pub(crate) fn into_paths(self, sep: char) -> Vec<String> {
        match self {
            RawSelection::Single(p) if p.is_empty() => Vec::new(),
            RawSelection::Single(p) => vec![p],
            RawSelection::Fragments(f) => reconstruct_paths(&f, sep),
            RawSelection::Lines(text) => text
                .lines()
                .map(|l| l.trim_end_matches('\r'))
                .filter(|l| !l.is_empty())
                .map(str::to_owned)
                .collect(),
        }
    }
}

/// Prefix every name fragment with the common directory.
pub(crate) fn reconstruct_paths(fragments: &[String], sep: char) -> Vec<String> {
    match fragments {
        [] => Vec::new(),
        [only] => vec![only.clone()],
        [dir, names @ ..] => names
            .iter()
            .filter(|n| !n.is_empty())
            .map(|name| collapse_separators(&format!("{dir}{sep}{name}"), sep))
            .collect(),
    }
}

/// Split a UTF-16 multi-select buffer (`dir\0a\0b\0\0`) into fragments.
#[cfg(any(windows, test))]
pub(crate) fn fragments_from_wide(buf: &[u16]) -> Vec<String> {
    buf.split(|&c| c == 0)
        .take_while(|s| !s.is_empty())
        .map(String::from_utf16_lossy)
        .collect()
}

/// Keep the selection only if every path is an existing regular file.
pub(crate) fn validate_existing(paths: Vec<String>) -> Vec<PathBuf> {
    let paths: Vec<PathBuf> = paths.into_iter().map(PathBuf::from).collect();
    if paths.iter().all(|p| p.is_file()) {
        paths
    } else {
        log::debug!("selection rejected: not every path is an existing file");
        Vec::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_OUTCOMES: [Option<Button>; 8] = [
        None,
        Some(Button::Abort),
        Some(Button::Ignore),
        Some(Button::Ok),
        Some(Button::Cancel),
        Some(Button::Yes),
        Some(Button::No),
        Some(Button::Retry),
    ];

    #[test]
    fn statuses_stay_inside_their_sets() {
        for o in ALL_OUTCOMES {
            assert_eq!(message_status(o), 1);
            assert!([1, -1].contains(&message_cancelable_status(o)));
            assert!([1, 0].contains(&question_status(o, false)));
            assert!([1, 0, -1].contains(&question_status(o, true)));
            assert!([0, -1].contains(&attempt_status(o)));
        }
    }

    #[test]
    fn question_mapping() {
        assert_eq!(question_status(Some(Button::Yes), true), 1);
        assert_eq!(question_status(Some(Button::No), true), 0);
        assert_eq!(question_status(Some(Button::Cancel), true), -1);
        assert_eq!(question_status(None, true), -1);
        assert_eq!(question_status(None, false), 0);
    }

    #[test]
    fn attempt_and_cancelable_message() {
        assert_eq!(attempt_status(Some(Button::Retry)), 0);
        assert_eq!(attempt_status(Some(Button::Cancel)), -1);
        assert_eq!(message_cancelable_status(Some(Button::Ok)), 1);
        assert_eq!(message_cancelable_status(None), -1);
    }

    #[test]
    fn error_dialog_verdicts() {
        assert_eq!(error_verdict(Some(Button::Abort), false), Verdict::Terminate);
        assert_eq!(error_verdict(Some(Button::Retry), false), Verdict::Status(0));
        assert_eq!(error_verdict(Some(Button::Ignore), false), Verdict::Status(-1));
        assert_eq!(error_verdict(None, false), Verdict::Status(-1));
        for o in ALL_OUTCOMES {
            assert_eq!(error_verdict(o, true), Verdict::Terminate);
        }
    }

    #[test]
    fn numbers_clamp_to_fifteen_digits() {
        assert_eq!(clamp_digits(1e20), NUMBER_LIMIT);
        assert_eq!(clamp_digits(-1e20), -NUMBER_LIMIT);
        assert_eq!(clamp_digits(42.5), 42.5);
        assert_eq!(clamp_digits(f64::NAN), 0.0);
        assert_eq!(clamp_digits(NUMBER_LIMIT), NUMBER_LIMIT);
    }

    #[test]
    fn color_packing_round_trips() {
        for r in 0..=255u8 {
            for g in 0..=255u8 {
                for b in [0u8, 1, 127, 128, 254, 255] {
                    let c = Rgb::new(r, g, b);
                    assert_eq!(Rgb::from_packed(c.pack()), c);
                }
            }
        }
        for b in 0..=255u8 {
            let c = Rgb::new(12, 34, b);
            assert_eq!(Rgb::from_packed(c.pack()), c);
            assert_ne!(c.pack(), CANCELLED_COLOR);
        }
        assert_eq!(Rgb::new(0x11, 0x22, 0x33).pack(), 0x0033_2211);
    }

    #[test]
    fn color_text_formats() {
        assert_eq!(parse_css_color("rgb(255,0,10)"), Some(Rgb::new(255, 0, 10)));
        assert_eq!(parse_css_color("rgba(1, 2, 3, 0.5)"), Some(Rgb::new(1, 2, 3)));
        assert_eq!(parse_css_color("#0a0b0c"), Some(Rgb::new(10, 11, 12)));
        assert_eq!(parse_css_color(""), None);
        assert_eq!(parse_hex_color("#fff"), Some(Rgb::new(255, 255, 255)));
        assert_eq!(parse_hex_color("0a0b0c"), None);
        assert_eq!(parse_rgb16("65535, 0, 32896"), Some(Rgb::new(255, 0, 128)));
        assert_eq!(parse_rgb16("{257, 514, 771}"), Some(Rgb::new(1, 2, 3)));
        assert_eq!(Rgb::new(255, 0, 16).to_hex(), "#ff0010");
    }

    #[test]
    fn hex_color_rejects_non_hex_text() {
        assert_eq!(parse_hex_color("#aéaaa"), None);
        assert_eq!(parse_hex_color("#ééé"), None);
        assert_eq!(parse_hex_color("#+f+f+f"), None);
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_css_color("#aéaaa"), None);
        assert_eq!(parse_hex_color(" #A0b0C0 "), Some(Rgb::new(0xa0, 0xb0, 0xc0)));
    }

    #[test]
    fn multi_select_buffer_reconstructs_in_order() {
        let buf: Vec<u16> = "/a\0b.txt\0c.txt\0\0".encode_utf16().collect();
        let frags = fragments_from_wide(&buf);
        assert_eq!(
            RawSelection::Fragments(frags).into_paths('/'),
            vec!["/a/b.txt", "/a/c.txt"]
        );
    }

    #[test]
    fn single_fragment_is_a_full_path() {
        let buf: Vec<u16> = "C:\\docs\\one.txt\0\0".encode_utf16().collect();
        assert_eq!(
            reconstruct_paths(&fragments_from_wide(&buf), '\\'),
            vec!["C:\\docs\\one.txt"]
        );
    }

    #[test]
    fn root_directory_does_not_double_separator() {
        let frags = vec!["C:\\".to_owned(), "a.txt".to_owned(), "b.txt".to_owned()];
        assert_eq!(
            reconstruct_paths(&frags, '\\'),
            vec!["C:\\a.txt", "C:\\b.txt"]
        );
    }

    #[test]
    fn line_output_splits_paths() {
        let raw = RawSelection::Lines("/x/1.txt\n/x/2.txt\n".to_owned());
        assert_eq!(raw.into_paths('/'), vec!["/x/1.txt", "/x/2.txt"]);
        assert!(RawSelection::Single(String::new()).into_paths('/').is_empty());
    }

    #[test]
    fn selection_is_all_or_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let b = dir.path().join("b.txt");
        let c = dir.path().join("c.txt");
        std::fs::write(&b, "b").expect("write");
        std::fs::write(&c, "c").expect("write");

        let sep = std::path::MAIN_SEPARATOR;
        let frags = vec![
            dir.path().to_string_lossy().into_owned(),
            "b.txt".to_owned(),
            "c.txt".to_owned(),
        ];
        let paths = validate_existing(reconstruct_paths(&frags, sep));
        assert_eq!(paths, vec![b.clone(), c.clone()]);

        std::fs::remove_file(&c).expect("remove");
        assert!(validate_existing(reconstruct_paths(&frags, sep)).is_empty());
    }

    #[test]
    fn directories_do_not_validate_as_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let p = dir.path().to_string_lossy().into_owned();
        assert!(validate_existing(vec![p]).is_empty());
    }

    #[test]
    fn button_indices_follow_label_table() {
        assert_eq!(Button::from_index(0), Some(Button::Abort));
        assert_eq!(Button::from_index(2), Some(Button::Ok));
        assert_eq!(Button::from_index(6), Some(Button::Retry));
        assert_eq!(Button::from_index(7), None);
        assert_eq!(Button::from_index(-1), None);
    }
}
