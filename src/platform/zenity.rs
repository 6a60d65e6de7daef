// ── Zenity provider ───────────────────────────────────────────────────────────
//
// GTK dialogs through the `zenity` utility.  Titles, texts and button labels
// go through `escape_mnemonics` because GTK reads `_` as an accelerator
// marker.  Zenity has no working parent flag, so an owned dialog gets an
// `AttachWatcher` for the lifetime of the process.
//
// Extra buttons report themselves by printing their label on stdout and
// exiting with status 1.

use crate::error::Result;
use crate::normalize::{parse_css_color, Button, RawSelection, Rgb};
use crate::owner::{self, AttachWatcher, WindowHints, GRACE_PERIOD};
use crate::platform::{process, process::Captured, NativeDialog};
use crate::request::{DialogKind, DialogRequest, WindowHandle};
use crate::state::Backend;
use crate::text::{escape_mnemonics, with_trailing_separator};

const PROGRAM: &str = "zenity";

pub(crate) struct Zenity;

impl NativeDialog for Zenity {
    fn backend(&self) -> Backend {
        Backend::Zenity
    }

    fn alert(&self, request: &DialogRequest) -> Result<Option<Button>> {
        let out = run(request, alert_args(request))?;
        Ok(interpret_alert(request, &out))
    }

    fn prompt(&self, request: &DialogRequest) -> Result<Option<String>> {
        let out = run(request, prompt_args(request))?;
        Ok(out.success().then_some(out.stdout))
    }

    fn pick_files(&self, request: &DialogRequest) -> Result<Option<RawSelection>> {
        let out = run(request, file_args(request))?;
        if !out.success() {
            return Ok(None);
        }
        Ok(Some(if request.kind == DialogKind::OpenFiles {
            RawSelection::Lines(out.stdout)
        } else {
            RawSelection::Single(out.stdout)
        }))
    }

    fn pick_directory(&self, request: &DialogRequest) -> Result<Option<String>> {
        let out = run(request, directory_args(request))?;
        Ok(out.success().then_some(out.stdout))
    }

    fn pick_color(&self, request: &DialogRequest) -> Result<Option<Rgb>> {
        let out = run(request, color_args(request))?;
        if !out.success() {
            return Ok(None);
        }
        Ok(parse_css_color(&out.stdout))
    }

    fn active_window(&self) -> Option<WindowHandle> {
        owner::x11_active_window()
    }
}

/// Run zenity, attaching its window to the request's owner meanwhile.
fn run(request: &DialogRequest, args: Vec<String>) -> Result<Captured> {
    let child = process::spawn(PROGRAM, &args)?;
    let watcher = request.owner.and_then(|parent| {
        AttachWatcher::spawn(
            child.id(),
            WindowHints {
                parent,
                title: request.title.clone(),
            },
        )
    });
    let out = process::wait(PROGRAM, child);
    if let Some(w) = watcher {
        w.finish(GRACE_PERIOD);
    }
    out
}

// ── Argument builders ─────────────────────────────────────────────────────────

fn common_args(request: &DialogRequest) -> Vec<String> {
    let mut args = vec![format!("--title={}", escape_mnemonics(&request.title))];
    if let Some(icon) = &request.icon {
        args.push(format!("--window-icon={}", icon.display()));
    }
    args
}

fn label_arg(flag: &str, request: &DialogRequest, button: Button) -> String {
    format!("--{flag}={}", escape_mnemonics(request.label(button)))
}

pub(crate) fn alert_args(request: &DialogRequest) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();
    match request.kind {
        DialogKind::Message => {
            args.push("--info".into());
            args.push(label_arg("ok-label", request, Button::Ok));
        }
        DialogKind::MessageCancelable => {
            args.push("--question".into());
            args.push(label_arg("ok-label", request, Button::Ok));
            args.push(label_arg("cancel-label", request, Button::Cancel));
        }
        DialogKind::Question | DialogKind::QuestionCancelable => {
            args.push("--question".into());
            args.push(label_arg("ok-label", request, Button::Yes));
            args.push(label_arg("cancel-label", request, Button::No));
            if request.kind == DialogKind::QuestionCancelable {
                args.push(label_arg("extra-button", request, Button::Cancel));
            }
        }
        DialogKind::Attempt => {
            args.push("--error".into());
            args.push(label_arg("ok-label", request, Button::Cancel));
            args.push(label_arg("extra-button", request, Button::Retry));
        }
        _ if request.abort_only => {
            args.push("--error".into());
            args.push(label_arg("ok-label", request, Button::Abort));
        }
        _ => {
            args.push("--error".into());
            args.push(label_arg("ok-label", request, Button::Ignore));
            args.push(label_arg("extra-button", request, Button::Retry));
            args.push(label_arg("extra-button", request, Button::Abort));
        }
    }
    args.extend(common_args(request));
    args.push("--no-markup".into());
    args.push(format!("--text={}", escape_mnemonics(&request.text)));
    args
}

pub(crate) fn interpret_alert(request: &DialogRequest, out: &Captured) -> Option<Button> {
    let pressed = |b: Button| out.stdout.trim() == escape_mnemonics(request.label(b));
    let ok = out.success();
    match request.kind {
        DialogKind::Message => Some(Button::Ok),
        DialogKind::MessageCancelable => Some(if ok { Button::Ok } else { Button::Cancel }),
        DialogKind::Question => match out.code {
            Some(0) => Some(Button::Yes),
            Some(1) => Some(Button::No),
            _ => None,
        },
        DialogKind::QuestionCancelable => match out.code {
            Some(0) => Some(Button::Yes),
            _ if pressed(Button::Cancel) => Some(Button::Cancel),
            Some(1) => Some(Button::No),
            _ => None,
        },
        DialogKind::Attempt => Some(if !ok && pressed(Button::Retry) {
            Button::Retry
        } else {
            Button::Cancel
        }),
        _ if request.abort_only => Some(Button::Abort),
        _ if ok => Some(Button::Ignore),
        _ if pressed(Button::Abort) => Some(Button::Abort),
        _ if pressed(Button::Retry) => Some(Button::Retry),
        _ => None,
    }
}

pub(crate) fn prompt_args(request: &DialogRequest) -> Vec<String> {
    let mut args = vec!["--entry".to_owned()];
    args.extend(common_args(request));
    args.push(format!("--text={}", escape_mnemonics(&request.text)));
    args.push(format!("--entry-text={}", request.default_text()));
    if request.kind.is_masked() {
        args.push("--hide-text".into());
    }
    args
}

/// `--filename` value: the initial directory joined with the suggested name.
fn start_path(request: &DialogRequest) -> Option<String> {
    let dir = request
        .initial_dir
        .as_ref()
        .map(|d| with_trailing_separator(&d.to_string_lossy()))
        .unwrap_or_default();
    let path = format!("{dir}{}", request.file_name);
    (!path.is_empty()).then_some(path)
}

pub(crate) fn file_args(request: &DialogRequest) -> Vec<String> {
    let mut args = vec!["--file-selection".to_owned()];
    match request.kind {
        DialogKind::OpenFiles => {
            args.push("--multiple".into());
            args.push("--separator=\n".into());
        }
        DialogKind::SaveFile => {
            args.push("--save".into());
            args.push("--confirm-overwrite".into());
        }
        _ => {}
    }
    args.extend(common_args(request));
    if let Some(path) = start_path(request) {
        args.push(format!("--filename={path}"));
    }
    args.extend(request.filter.zenity_args());
    args
}

pub(crate) fn directory_args(request: &DialogRequest) -> Vec<String> {
    let mut args = vec!["--file-selection".to_owned(), "--directory".to_owned()];
    args.extend(common_args(request));
    if let Some(path) = start_path(request) {
        args.push(format!("--filename={path}"));
    }
    args
}

pub(crate) fn color_args(request: &DialogRequest) -> Vec<String> {
    let c = request.default_color();
    let mut args = vec![
        "--color-selection".to_owned(),
        "--show-palette".to_owned(),
        format!("--color=rgb({},{},{})", c.r, c.g, c.b),
    ];
    args.extend(common_args(request));
    args
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterSpec;
    use crate::request::DefaultValue;
    use std::path::PathBuf;

    fn req(kind: DialogKind) -> DialogRequest {
        let mut r = DialogRequest::new(kind);
        r.text = "Body_text".into();
        r
    }

    fn exit(code: i32, stdout: &str) -> Captured {
        Captured {
            code: Some(code),
            stdout: stdout.into(),
        }
    }

    #[test]
    fn message_args_escape_underscores() {
        let args = alert_args(&req(DialogKind::Message));
        assert_eq!(args[0], "--info");
        assert!(args.contains(&"--ok-label=OK".to_owned()));
        assert!(args.contains(&"--title=Information".to_owned()));
        assert_eq!(args.last().map(String::as_str), Some("--text=Body__text"));
    }

    #[test]
    fn cancelable_question_has_extra_cancel() {
        let args = alert_args(&req(DialogKind::QuestionCancelable));
        assert!(args.contains(&"--ok-label=Yes".to_owned()));
        assert!(args.contains(&"--cancel-label=No".to_owned()));
        assert!(args.contains(&"--extra-button=Cancel".to_owned()));
    }

    #[test]
    fn question_outcomes() {
        let r = req(DialogKind::QuestionCancelable);
        assert_eq!(interpret_alert(&r, &exit(0, "")), Some(Button::Yes));
        assert_eq!(interpret_alert(&r, &exit(1, "")), Some(Button::No));
        assert_eq!(interpret_alert(&r, &exit(1, "Cancel")), Some(Button::Cancel));
        let r = req(DialogKind::Question);
        assert_eq!(interpret_alert(&r, &exit(-1, "")), None);
    }

    #[test]
    fn error_dialog_outcomes() {
        let r = req(DialogKind::Error);
        assert_eq!(interpret_alert(&r, &exit(0, "")), Some(Button::Ignore));
        assert_eq!(interpret_alert(&r, &exit(1, "Retry")), Some(Button::Retry));
        assert_eq!(interpret_alert(&r, &exit(1, "Abort")), Some(Button::Abort));
        assert_eq!(interpret_alert(&r, &exit(1, "")), None);

        let mut abort = req(DialogKind::Error);
        abort.abort_only = true;
        let args = alert_args(&abort);
        assert!(args.contains(&"--ok-label=Abort".to_owned()));
        assert!(!args.iter().any(|a| a.starts_with("--extra-button")));
    }

    #[test]
    fn attempt_outcomes() {
        let r = req(DialogKind::Attempt);
        assert_eq!(interpret_alert(&r, &exit(1, "Retry")), Some(Button::Retry));
        assert_eq!(interpret_alert(&r, &exit(0, "")), Some(Button::Cancel));
    }

    #[test]
    fn custom_labels_are_matched_escaped() {
        let mut r = req(DialogKind::Attempt);
        r.labels.set(Button::Retry, "Try_again");
        assert!(alert_args(&r).contains(&"--extra-button=Try__again".to_owned()));
        assert_eq!(interpret_alert(&r, &exit(1, "Try__again")), Some(Button::Retry));
    }

    #[test]
    fn password_prompt_hides_text() {
        let mut r = req(DialogKind::PasscodePrompt);
        r.default = DefaultValue::Number(40.0);
        let args = prompt_args(&r);
        assert!(args.contains(&"--entry-text=40".to_owned()));
        assert!(args.contains(&"--hide-text".to_owned()));
        assert!(!prompt_args(&req(DialogKind::StringPrompt)).contains(&"--hide-text".to_owned()));
    }

    #[cfg(unix)]
    #[test]
    fn multi_open_args() {
        let mut r = req(DialogKind::OpenFiles);
        r.filter = FilterSpec::parse("Text|*.txt|All|*.*");
        r.initial_dir = Some(PathBuf::from("/home/me"));
        r.file_name = "notes.txt".into();
        let args = file_args(&r);
        assert!(args.contains(&"--multiple".to_owned()));
        assert!(args.contains(&"--separator=\n".to_owned()));
        assert!(args.contains(&"--filename=/home/me/notes.txt".to_owned()));
        assert!(args.contains(&"--file-filter=All|*".to_owned()));
    }

    #[test]
    fn save_confirms_overwrite() {
        let args = file_args(&req(DialogKind::SaveFile));
        assert!(args.contains(&"--save".to_owned()));
        assert!(args.contains(&"--confirm-overwrite".to_owned()));
        assert!(!args.iter().any(|a| a.starts_with("--filename")));
    }

    #[test]
    fn color_args_seed_default() {
        let mut r = req(DialogKind::PickColor);
        r.default = DefaultValue::Color(Rgb::new(1, 2, 3));
        assert!(color_args(&r).contains(&"--color=rgb(1,2,3)".to_owned()));
    }
}
