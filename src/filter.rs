// ── File filter specification ─────────────────────────────────────────────────
//
// The wire format is `Desc|*.a;*.b|Desc2|*.c`: pipe-delimited alternating
// description / pattern-list pairs, patterns separated by `;`.  Each provider
// wants its own rendering, all produced here from one parsed value.

/// One `(description, patterns)` pair of a filter specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterGroup {
    pub description: String,
    pub patterns: Vec<String>,
}

/// An ordered list of filter groups.  Empty means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub groups: Vec<FilterGroup>,
}

impl FilterSpec {
    /// Parse the pipe-delimited wire format.
    ///
    /// A trailing description without a pattern list is dropped.  Empty
    /// patterns (from `;;` or a trailing `;`) are skipped.
    pub fn parse(spec: &str) -> Self {
        let mut groups = Vec::new();
        if spec.is_empty() {
            return Self { groups };
        }
        let mut parts = spec.split('|');
        while let (Some(description), Some(patterns)) = (parts.next(), parts.next()) {
            let patterns: Vec<String> = patterns
                .split(';')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_owned)
                .collect();
            if patterns.is_empty() {
                continue;
            }
            groups.push(FilterGroup {
                description: description.to_owned(),
                patterns,
            });
        }
        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Double-NUL-terminated block for `OPENFILENAMEW::lpstrFilter`:
    /// `Desc\0*.a;*.b\0Desc2\0*.c\0\0`.
    #[cfg(any(windows, test))]
    pub(crate) fn to_win32(&self) -> Vec<u16> {
        let mut out = String::new();
        for g in &self.groups {
            out.push_str(&g.description);
            out.push('\0');
            out.push_str(&g.patterns.join(";"));
            out.push('\0');
        }
        out.push('\0');
        if self.groups.is_empty() {
            out.push('\0');
        }
        out.encode_utf16().collect()
    }

    /// One `--file-filter=Desc|p1 p2` argument per group, with `*.*`
    /// normalized to `*` since GTK matches it literally.
    pub(crate) fn zenity_args(&self) -> Vec<String> {
        self.groups
            .iter()
            .map(|g| {
                let pats: Vec<&str> = g.patterns.iter().map(|p| normalize_pattern(p)).collect();
                format!("--file-filter={}|{}", g.description, pats.join(" "))
            })
            .collect()
    }

    /// Newline-separated `Desc (p1 p2)` lines for KDialog.
    ///
    /// KDialog appends the pattern list itself, so a parenthetical already in
    /// the description (`Text Files (*.txt)`) is stripped first.
    pub(crate) fn kdialog_filter(&self) -> String {
        self.groups
            .iter()
            .map(|g| {
                let pats: Vec<&str> = g.patterns.iter().map(|p| normalize_pattern(p)).collect();
                let desc = strip_parenthetical(&g.description);
                if desc.is_empty() {
                    pats.join(" ")
                } else {
                    format!("{desc} ({})", pats.join(" "))
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// File extensions for AppleScript's `of type {...}` clause.
    ///
    /// Returns `None` when any group accepts everything, since restricting
    /// the picker would then hide files the caller asked to show.
    pub(crate) fn extensions(&self) -> Option<Vec<String>> {
        let mut exts = Vec::new();
        for p in self.groups.iter().flat_map(|g| &g.patterns) {
            let ext = p.strip_prefix("*.")?;
            if ext.is_empty() || ext.contains('*') || ext.contains('?') {
                return None;
            }
            if !exts.iter().any(|e: &String| e == ext) {
                exts.push(ext.to_owned());
            }
        }
        if exts.is_empty() {
            None
        } else {
            Some(exts)
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn normalize_pattern(p: &str) -> &str {
    if p == "*.*" {
        "*"
    } else {
        p
    }
}

/// Remove the first `(...)` group and trim what remains.
fn strip_parenthetical(desc: &str) -> String {
    match (desc.find('('), desc.find(')')) {
        (Some(open), Some(close)) if close > open => {
            format!("{}{}", &desc[..open], &desc[close + 1..])
                .trim()
                .to_owned()
        }
        _ => desc.trim().to_owned(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_groups_in_order() {
        let f = FilterSpec::parse("Text|*.txt|All|*.*");
        assert_eq!(f.groups.len(), 2);
        assert_eq!(f.groups[0].description, "Text");
        assert_eq!(f.groups[0].patterns, vec!["*.txt"]);
        assert_eq!(f.groups[1].description, "All");
        assert_eq!(f.groups[1].patterns, vec!["*.*"]);
    }

    #[test]
    fn splits_multi_pattern_groups() {
        let f = FilterSpec::parse("Images|*.png;*.jpg; *.gif;");
        assert_eq!(f.groups[0].patterns, vec!["*.png", "*.jpg", "*.gif"]);
    }

    #[test]
    fn dangling_description_is_dropped() {
        let f = FilterSpec::parse("Text|*.txt|Orphan");
        assert_eq!(f.groups.len(), 1);
        assert!(FilterSpec::parse("").is_empty());
        assert!(FilterSpec::parse("Only a description").is_empty());
    }

    #[test]
    fn zenity_normalizes_match_all() {
        let f = FilterSpec::parse("Text|*.txt;*.md|All|*.*");
        assert_eq!(
            f.zenity_args(),
            vec!["--file-filter=Text|*.txt *.md", "--file-filter=All|*"]
        );
    }

    #[test]
    fn kdialog_strips_existing_parenthetical() {
        let f = FilterSpec::parse("Text Files (*.txt)|*.txt|All|*.*");
        assert_eq!(f.kdialog_filter(), "Text Files (*.txt)\nAll (*)");
    }

    #[test]
    fn win32_block_is_double_nul_terminated() {
        let f = FilterSpec::parse("Text|*.txt;*.md");
        let s = String::from_utf16(&f.to_win32()).expect("utf16");
        assert_eq!(s, "Text\0*.txt;*.md\0\0");
        let empty = String::from_utf16(&FilterSpec::default().to_win32()).expect("utf16");
        assert_eq!(empty, "\0\0");
    }

    #[test]
    fn extensions_bail_on_wildcards() {
        let f = FilterSpec::parse("Pics|*.png;*.jpg|More|*.png");
        assert_eq!(f.extensions(), Some(vec!["png".to_owned(), "jpg".to_owned()]));
        assert_eq!(FilterSpec::parse("All|*.*").extensions(), None);
        assert_eq!(FilterSpec::parse("Any|*").extensions(), None);
    }
}
