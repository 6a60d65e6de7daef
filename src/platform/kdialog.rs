// ── KDialog provider ──────────────────────────────────────────────────────────
//
// Qt dialogs through the `kdialog` utility.  KDialog takes its parent with
// `--attach`, so no watcher is needed.  Button boxes report through the exit
// status: 0 for the first button, 1 for the second, 2 for the third.

use std::{env, path::PathBuf};

use crate::error::Result;
use crate::normalize::{parse_hex_color, Button, RawSelection, Rgb};
use crate::owner;
use crate::platform::{process, process::Captured, NativeDialog};
use crate::request::{DialogKind, DialogRequest, WindowHandle};
use crate::state::Backend;

const PROGRAM: &str = "kdialog";

pub(crate) struct KDialog;

impl NativeDialog for KDialog {
    fn backend(&self) -> Backend {
        Backend::KDialog
    }

    fn alert(&self, request: &DialogRequest) -> Result<Option<Button>> {
        let out = process::run(PROGRAM, &alert_args(request))?;
        Ok(interpret_alert(request, &out))
    }

    fn prompt(&self, request: &DialogRequest) -> Result<Option<String>> {
        let out = process::run(PROGRAM, &prompt_args(request))?;
        Ok(out.success().then_some(out.stdout))
    }

    fn pick_files(&self, request: &DialogRequest) -> Result<Option<RawSelection>> {
        let out = process::run(PROGRAM, &file_args(request))?;
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
        let out = process::run(PROGRAM, &directory_args(request))?;
        Ok(out.success().then_some(out.stdout))
    }

    fn pick_color(&self, request: &DialogRequest) -> Result<Option<Rgb>> {
        let out = process::run(PROGRAM, &color_args(request))?;
        if !out.success() {
            return Ok(None);
        }
        Ok(parse_hex_color(&out.stdout))
    }

    fn active_window(&self) -> Option<WindowHandle> {
        owner::x11_active_window()
    }
}

// ── Argument builders ─────────────────────────────────────────────────────────

fn common_args(request: &DialogRequest) -> Vec<String> {
    let mut args = vec!["--title".to_owned(), request.title.clone()];
    if let Some(owner) = request.owner {
        args.push(format!("--attach={}", owner.0));
    }
    if let Some(icon) = &request.icon {
        args.push("--icon".into());
        args.push(icon.display().to_string());
    }
    args
}

fn labels(request: &DialogRequest, pairs: &[(&str, Button)]) -> Vec<String> {
    pairs
        .iter()
        .flat_map(|(flag, b)| [format!("--{flag}"), request.label(*b).to_owned()])
        .collect()
}

pub(crate) fn alert_args(request: &DialogRequest) -> Vec<String> {
    let text = request.text.clone();
    let mut args = match request.kind {
        DialogKind::Message => vec!["--msgbox".to_owned(), text],
        DialogKind::MessageCancelable => {
            let mut a = vec!["--yesno".to_owned(), text];
            a.extend(labels(request, &[("yes-label", Button::Ok), ("no-label", Button::Cancel)]));
            a
        }
        DialogKind::Question => {
            let mut a = vec!["--yesno".to_owned(), text];
            a.extend(labels(request, &[("yes-label", Button::Yes), ("no-label", Button::No)]));
            a
        }
        DialogKind::QuestionCancelable => {
            let mut a = vec!["--yesnocancel".to_owned(), text];
            a.extend(labels(
                request,
                &[
                    ("yes-label", Button::Yes),
                    ("no-label", Button::No),
                    ("cancel-label", Button::Cancel),
                ],
            ));
            a
        }
        DialogKind::Attempt => {
            let mut a = vec!["--warningyesno".to_owned(), text];
            a.extend(labels(
                request,
                &[("yes-label", Button::Retry), ("no-label", Button::Cancel)],
            ));
            a
        }
        _ if request.abort_only => {
            let mut a = vec!["--error".to_owned(), text];
            a.extend(labels(request, &[("ok-label", Button::Abort)]));
            a
        }
        _ => {
            let mut a = vec!["--warningyesnocancel".to_owned(), text];
            a.extend(labels(
                request,
                &[
                    ("yes-label", Button::Abort),
                    ("no-label", Button::Retry),
                    ("cancel-label", Button::Ignore),
                ],
            ));
            a
        }
    };
    args.extend(common_args(request));
    args
}

pub(crate) fn interpret_alert(request: &DialogRequest, out: &Captured) -> Option<Button> {
    let nth = |buttons: &[Button]| {
        out.code
            .and_then(|c| usize::try_from(c).ok())
            .and_then(|i| buttons.get(i).copied())
    };
    match request.kind {
        DialogKind::Message => Some(Button::Ok),
        DialogKind::MessageCancelable => nth(&[Button::Ok, Button::Cancel]).or(Some(Button::Cancel)),
        DialogKind::Question => nth(&[Button::Yes, Button::No]),
        DialogKind::QuestionCancelable => nth(&[Button::Yes, Button::No, Button::Cancel]),
        DialogKind::Attempt => nth(&[Button::Retry, Button::Cancel]).or(Some(Button::Cancel)),
        _ if request.abort_only => Some(Button::Abort),
        _ => nth(&[Button::Abort, Button::Retry, Button::Ignore]),
    }
}

pub(crate) fn prompt_args(request: &DialogRequest) -> Vec<String> {
    let flag = if request.kind.is_masked() {
        "--password"
    } else {
        "--inputbox"
    };
    let mut args = vec![flag.to_owned(), request.text.clone(), request.default_text()];
    args.extend(common_args(request));
    args
}

/// Starting location: the initial directory (or the working directory)
/// joined with the suggested file name.
fn start_path(request: &DialogRequest) -> String {
    let base = request
        .initial_dir
        .clone()
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    let path = if request.file_name.is_empty() {
        base
    } else {
        base.join(&request.file_name)
    };
    path.display().to_string()
}

pub(crate) fn file_args(request: &DialogRequest) -> Vec<String> {
    let flag = if request.kind == DialogKind::SaveFile {
        "--getsavefilename"
    } else {
        "--getopenfilename"
    };
    let mut args = vec![flag.to_owned(), start_path(request)];
    let filter = request.filter.kdialog_filter();
    if !filter.is_empty() {
        args.push(filter);
    }
    if request.kind == DialogKind::OpenFiles {
        args.push("--multiple".into());
        args.push("--separate-output".into());
    }
    args.extend(common_args(request));
    args
}

pub(crate) fn directory_args(request: &DialogRequest) -> Vec<String> {
    let mut args = vec!["--getexistingdirectory".to_owned(), start_path(request)];
    args.extend(common_args(request));
    args
}

pub(crate) fn color_args(request: &DialogRequest) -> Vec<String> {
    let mut args = vec![
        "--getcolor".to_owned(),
        "--default".to_owned(),
        request.default_color().to_hex(),
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

    fn exit(code: i32) -> Captured {
        Captured {
            code: Some(code),
            stdout: String::new(),
        }
    }

    #[test]
    fn error_box_maps_three_buttons() {
        let r = DialogRequest::new(DialogKind::Error);
        let args = alert_args(&r);
        assert_eq!(args[0], "--warningyesnocancel");
        assert_eq!(interpret_alert(&r, &exit(0)), Some(Button::Abort));
        assert_eq!(interpret_alert(&r, &exit(1)), Some(Button::Retry));
        assert_eq!(interpret_alert(&r, &exit(2)), Some(Button::Ignore));
        assert_eq!(interpret_alert(&r, &exit(-1)), None);
    }

    #[test]
    fn cancelable_question_uses_yesnocancel() {
        let r = DialogRequest::new(DialogKind::QuestionCancelable);
        let args = alert_args(&r);
        assert_eq!(args[0], "--yesnocancel");
        assert!(args.windows(2).any(|w| w == ["--cancel-label", "Cancel"]));
        assert_eq!(interpret_alert(&r, &exit(2)), Some(Button::Cancel));
    }

    #[test]
    fn attempt_uses_retry_cancel_labels() {
        let r = DialogRequest::new(DialogKind::Attempt);
        let args = alert_args(&r);
        assert!(args.windows(2).any(|w| w == ["--yes-label", "Retry"]));
        assert_eq!(interpret_alert(&r, &exit(0)), Some(Button::Retry));
        assert_eq!(interpret_alert(&r, &exit(1)), Some(Button::Cancel));
    }

    #[test]
    fn owner_is_attached_in_decimal() {
        let mut r = DialogRequest::new(DialogKind::Message);
        r.owner = Some(WindowHandle(0x10));
        assert!(alert_args(&r).contains(&"--attach=16".to_owned()));
    }

    #[test]
    fn password_prompt_uses_password_flag() {
        let mut r = DialogRequest::new(DialogKind::PasswordPrompt);
        r.text = "Secret".into();
        r.default = DefaultValue::Text("hunter2".into());
        assert_eq!(&prompt_args(&r)[..3], ["--password", "Secret", "hunter2"]);
    }

    #[cfg(unix)]
    #[test]
    fn multi_open_separates_output() {
        let mut r = DialogRequest::new(DialogKind::OpenFiles);
        r.initial_dir = Some(PathBuf::from("/srv"));
        r.file_name = "a.txt".into();
        r.filter = FilterSpec::parse("Text Files (*.txt)|*.txt");
        let args = file_args(&r);
        assert_eq!(args[1], "/srv/a.txt");
        assert_eq!(args[2], "Text Files (*.txt)");
        assert!(args.contains(&"--separate-output".to_owned()));
    }

    #[test]
    fn color_default_is_hex() {
        let mut r = DialogRequest::new(DialogKind::PickColor);
        r.default = DefaultValue::Color(Rgb::new(255, 128, 0));
        assert_eq!(&color_args(&r)[..3], ["--getcolor", "--default", "#ff8000"]);
    }
}
