// ── dialog-demo ───────────────────────────────────────────────────────────────
//
// Runs one dialog from the command line and prints its result record as
// JSON.  Handy for checking a backend by hand:
//
//   dialog-demo --system KDialog question "Overwrite?"
//   dialog-demo open-multiple "Images|*.png;*.jpg" ""
//   RUST_LOG=debug dialog-demo color 255

use std::{process::ExitCode, sync::mpsc, time::Duration};

use dialog_module::{DialogOp, Dialogs, Dispatcher, FileArgs, Mode};

const USAGE: &str = "\
usage: dialog-demo [--system NAME] [--caption TEXT] OPERATION [ARGS...]

operations:
  message TEXT              message-cancelable TEXT
  question TEXT             question-cancelable TEXT
  attempt TEXT              error TEXT [abort]
  string PROMPT [DEFAULT]   password PROMPT [DEFAULT]
  integer PROMPT [DEFAULT]  passcode PROMPT [DEFAULT]
  open FILTER [NAME [DIR [TITLE]]]
  open-multiple FILTER [NAME [DIR [TITLE]]]
  save FILTER [NAME [DIR [TITLE]]]
  directory [START]         directory-alt CAPTION [ROOT]
  color [DEFAULT [TITLE]]   async-message TEXT";

/// How long `async-message` waits for its record.
const ASYNC_TIMEOUT: Duration = Duration::from_secs(600);

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("dialog-demo: {e}\n\n{USAGE}");
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<ExitCode, lexopt::Error> {
    let cli = parse_cli(lexopt::Parser::from_env())?;
    if cli.help {
        println!("{USAGE}");
        return Ok(ExitCode::SUCCESS);
    }

    let mut dialogs = Dialogs::new();
    if let Some(name) = &cli.system {
        dialogs.widget_set_system(name);
    }
    if let Some(text) = &cli.caption {
        dialogs.widget_set_caption(text);
    }

    let Some((name, params)) = cli.operation else {
        return Err("missing operation".into());
    };
    log::info!("using {} backend", dialogs.active_backend().name());

    if name == "async-message" {
        return Ok(run_async(&dialogs, params.first().cloned().unwrap_or_default()));
    }

    let op = parse_op(&name, &params)?;
    print_record(&op.run(&dialogs).into_record(0));
    Ok(ExitCode::SUCCESS)
}

/// Options and the operation named on the command line.
#[derive(Debug, Default, PartialEq)]
struct Cli {
    system: Option<String>,
    caption: Option<String>,
    help: bool,
    /// Operation name and its positional arguments.
    operation: Option<(String, Vec<String>)>,
}

/// Options must come before the operation.  Everything after it is taken
/// verbatim, so a negative default like `-5` is not read as a flag.
fn parse_cli(mut parser: lexopt::Parser) -> Result<Cli, lexopt::Error> {
    use lexopt::prelude::*;

    let mut cli = Cli::default();
    while let Some(arg) = parser.next()? {
        match arg {
            Long("system") => cli.system = Some(parser.value()?.string()?),
            Long("caption") => cli.caption = Some(parser.value()?.string()?),
            Long("help") | Short('h') => cli.help = true,
            Value(op) => {
                let params = parser
                    .raw_args()?
                    .map(|a| a.string())
                    .collect::<Result<Vec<_>, _>>()?;
                cli.operation = Some((op.string()?, params));
                break;
            }
            _ => return Err(arg.unexpected()),
        }
    }
    Ok(cli)
}

fn run_async(dialogs: &Dialogs, text: String) -> ExitCode {
    let (tx, rx) = mpsc::channel();
    let dispatcher = Dispatcher::new(Mode::Serialized, tx);
    let id = dispatcher.submit(dialogs, DialogOp::Message(text));
    println!("submitted job {id}");
    match rx.recv_timeout(ASYNC_TIMEOUT) {
        Ok(record) => {
            print_record(&record);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("dialog-demo: no result for job {id}: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_record(record: &dialog_module::ResultRecord) {
    match serde_json::to_string(record) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("dialog-demo: {e}"),
    }
}

/// Build the operation named on the command line.  Missing trailing
/// arguments default to empty.
fn parse_op(name: &str, params: &[String]) -> Result<DialogOp, lexopt::Error> {
    let p = |i: usize| params.get(i).cloned().unwrap_or_default();
    let number = |i: usize| -> Result<f64, lexopt::Error> {
        match params.get(i) {
            None => Ok(0.0),
            Some(s) => s.parse().map_err(|e| lexopt::Error::ParsingFailed {
                value: s.clone(),
                error: Box::new(e),
            }),
        }
    };
    let files = || FileArgs {
        filter: p(0),
        fname: p(1),
        dir: p(2),
        title: p(3),
    };

    let op = match name {
        "message" => DialogOp::Message(p(0)),
        "message-cancelable" => DialogOp::MessageCancelable(p(0)),
        "question" => DialogOp::Question(p(0)),
        "question-cancelable" => DialogOp::QuestionCancelable(p(0)),
        "attempt" => DialogOp::Attempt(p(0)),
        "error" => DialogOp::Error {
            text: p(0),
            abort: p(1) == "abort",
        },
        "string" => DialogOp::GetString {
            prompt: p(0),
            default: p(1),
        },
        "password" => DialogOp::GetPassword {
            prompt: p(0),
            default: p(1),
        },
        "integer" => DialogOp::GetInteger {
            prompt: p(0),
            default: number(1)?,
        },
        "passcode" => DialogOp::GetPasscode {
            prompt: p(0),
            default: number(1)?,
        },
        "open" => DialogOp::OpenFilename(files()),
        "open-multiple" => DialogOp::OpenFilenames(files()),
        "save" => DialogOp::SaveFilename(files()),
        "directory" => DialogOp::Directory(p(0)),
        "directory-alt" => DialogOp::DirectoryAlt {
            caption: p(0),
            root: p(1),
        },
        "color" => DialogOp::Color {
            default: number(0)? as i32,
            title: p(1),
        },
        other => return Err(format!("unknown operation {other:?}").into()),
    };
    Ok(op)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn params(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn missing_arguments_default_to_empty() {
        let op = parse_op("save", &params(&["Text|*.txt"])).expect("op");
        assert_eq!(
            op,
            DialogOp::SaveFilename(FileArgs {
                filter: "Text|*.txt".into(),
                ..FileArgs::default()
            })
        );
    }

    #[test]
    fn numbers_are_parsed() {
        let op = parse_op("integer", &params(&["How many?", "12"])).expect("op");
        assert_eq!(
            op,
            DialogOp::GetInteger {
                prompt: "How many?".into(),
                default: 12.0
            }
        );
        assert!(parse_op("color", &params(&["red"])).is_err());
    }

    #[test]
    fn error_abort_flag() {
        let op = parse_op("error", &params(&["boom", "abort"])).expect("op");
        assert_eq!(
            op,
            DialogOp::Error {
                text: "boom".into(),
                abort: true
            }
        );
    }

    #[test]
    fn unknown_operation_is_rejected() {
        assert!(parse_op("dance", &[]).is_err());
    }

    fn cli(args: &[&str]) -> Result<Cli, lexopt::Error> {
        parse_cli(lexopt::Parser::from_args(args.iter().copied()))
    }

    #[test]
    fn options_precede_the_operation() {
        let parsed = cli(&["--system", "KDialog", "--caption=Game", "question", "Quit?"]).expect("cli");
        assert_eq!(parsed.system.as_deref(), Some("KDialog"));
        assert_eq!(parsed.caption.as_deref(), Some("Game"));
        assert_eq!(
            parsed.operation,
            Some(("question".to_owned(), params(&["Quit?"])))
        );
    }

    #[test]
    fn arguments_after_the_operation_are_verbatim() {
        let parsed = cli(&["integer", "How many?", "-5"]).expect("cli");
        let (name, rest) = parsed.operation.expect("operation");
        assert_eq!(parse_op(&name, &rest).expect("op"), DialogOp::GetInteger {
            prompt: "How many?".into(),
            default: -5.0
        });
    }

    #[test]
    fn help_and_bad_options() {
        assert!(cli(&["-h"]).expect("cli").help);
        assert!(cli(&["--bogus"]).is_err());
        assert!(cli(&["--system"]).is_err());
        assert_eq!(cli(&[]).expect("cli"), Cli::default());
    }
}
