// ── Cocoa provider ────────────────────────────────────────────────────────────
//
// Standard Cocoa panels driven through AppleScript and `osascript`.  Each
// request becomes a short script with every caller string spliced in as an
// AppleScript literal by `applescript_string`, since the script is text and
// nothing is parameter-bound.  A cancelled panel makes osascript exit with
// error -128, which reads here as a plain cancellation.

use crate::error::Result;
use crate::normalize::{parse_rgb16, Button, RawSelection, Rgb};
use crate::platform::{process, NativeDialog};
use crate::request::{DialogKind, DialogRequest};
use crate::state::Backend;
use crate::text::applescript_string as lit;

const PROGRAM: &str = "osascript";

pub(crate) struct Cocoa;

impl NativeDialog for Cocoa {
    fn backend(&self) -> Backend {
        Backend::Cocoa
    }

    fn alert(&self, request: &DialogRequest) -> Result<Option<Button>> {
        let buttons = alert_buttons(request);
        Ok(run(&alert_script(request))?.and_then(|out| interpret_alert(request, &buttons, &out)))
    }

    fn prompt(&self, request: &DialogRequest) -> Result<Option<String>> {
        run(&prompt_script(request))
    }

    fn pick_files(&self, request: &DialogRequest) -> Result<Option<RawSelection>> {
        let out = run(&file_script(request))?;
        Ok(out.map(|text| {
            if request.kind == DialogKind::OpenFiles {
                RawSelection::Lines(text)
            } else {
                RawSelection::Single(text)
            }
        }))
    }

    fn pick_directory(&self, request: &DialogRequest) -> Result<Option<String>> {
        run(&directory_script(request))
    }

    fn pick_color(&self, request: &DialogRequest) -> Result<Option<Rgb>> {
        Ok(run(&color_script(request))?.and_then(|out| parse_rgb16(&out)))
    }
}

/// Run a script, one `-e` per line.  Non-zero exit is a cancellation.
fn run(script: &[String]) -> Result<Option<String>> {
    let args: Vec<&str> = script.iter().flat_map(|l| ["-e", l.as_str()]).collect();
    let out = process::run(PROGRAM, &args)?;
    Ok(out.success().then_some(out.stdout))
}

// ── Script builders ───────────────────────────────────────────────────────────

/// Buttons offered per kind, left to right; the last one is the default.
fn alert_buttons(request: &DialogRequest) -> Vec<Button> {
    match request.kind {
        DialogKind::Message => vec![Button::Ok],
        DialogKind::MessageCancelable => vec![Button::Cancel, Button::Ok],
        DialogKind::Question => vec![Button::No, Button::Yes],
        DialogKind::QuestionCancelable => vec![Button::Cancel, Button::No, Button::Yes],
        DialogKind::Attempt => vec![Button::Cancel, Button::Retry],
        _ if request.abort_only => vec![Button::Abort],
        _ => vec![Button::Abort, Button::Retry, Button::Ignore],
    }
}

fn button_list(request: &DialogRequest, buttons: &[Button]) -> String {
    let items: Vec<String> = buttons.iter().map(|b| lit(request.label(*b))).collect();
    format!("{{{}}}", items.join(", "))
}

pub(crate) fn alert_script(request: &DialogRequest) -> Vec<String> {
    let buttons = alert_buttons(request);
    let default = buttons.last().copied().unwrap_or(Button::Ok);
    let icon = match request.kind {
        DialogKind::Attempt | DialogKind::Error => " with icon stop",
        DialogKind::Question | DialogKind::QuestionCancelable => " with icon note",
        _ => "",
    };
    vec![format!(
        "button returned of (display dialog {} with title {} buttons {} default button {}{icon})",
        lit(&request.text),
        lit(&request.title),
        button_list(request, &buttons),
        lit(request.label(default)),
    )]
}

/// Map the returned label back onto the buttons that were offered.
pub(crate) fn interpret_alert(
    request: &DialogRequest,
    buttons: &[Button],
    out: &str,
) -> Option<Button> {
    buttons
        .iter()
        .copied()
        .find(|b| request.label(*b) == out.trim())
}

pub(crate) fn prompt_script(request: &DialogRequest) -> Vec<String> {
    let hidden = if request.kind.is_masked() {
        " with hidden answer"
    } else {
        ""
    };
    vec![format!(
        "text returned of (display dialog {} with title {} default answer {}{hidden} \
         buttons {} default button 2 cancel button 1)",
        lit(&request.text),
        lit(&request.title),
        lit(&request.default_text()),
        button_list(request, &[Button::Cancel, Button::Ok]),
    )]
}

fn location_clause(request: &DialogRequest) -> String {
    match &request.initial_dir {
        Some(dir) => format!(
            " default location (POSIX file {})",
            lit(&dir.to_string_lossy())
        ),
        None => String::new(),
    }
}

pub(crate) fn file_script(request: &DialogRequest) -> Vec<String> {
    let prompt = lit(&request.title);
    let location = location_clause(request);
    let types = match request.filter.extensions() {
        Some(exts) => {
            let items: Vec<String> = exts.iter().map(|e| lit(e)).collect();
            format!(" of type {{{}}}", items.join(", "))
        }
        None => String::new(),
    };
    match request.kind {
        DialogKind::SaveFile => {
            let name = if request.file_name.is_empty() {
                String::new()
            } else {
                format!(" default name {}", lit(&request.file_name))
            };
            vec![format!(
                "POSIX path of (choose file name with prompt {prompt}{name}{location})"
            )]
        }
        DialogKind::OpenFiles => vec![
            "set picked to \"\"".to_owned(),
            format!(
                "repeat with f in (choose file with prompt {prompt}{types}{location} \
                 with multiple selections allowed)"
            ),
            "set picked to picked & POSIX path of f & linefeed".to_owned(),
            "end repeat".to_owned(),
            "picked".to_owned(),
        ],
        _ => vec![format!(
            "POSIX path of (choose file with prompt {prompt}{types}{location})"
        )],
    }
}

pub(crate) fn directory_script(request: &DialogRequest) -> Vec<String> {
    vec![format!(
        "POSIX path of (choose folder with prompt {}{})",
        lit(&request.title),
        location_clause(request)
    )]
}

pub(crate) fn color_script(request: &DialogRequest) -> Vec<String> {
    let c = request.default_color();
    let wide = |v: u8| u32::from(v) * 257;
    vec![format!(
        "choose color default color {{{}, {}, {}}}",
        wide(c.r),
        wide(c.g),
        wide(c.b)
    )]
}

// ── Tests ─────────────────────────────────────────────────────────────────────
