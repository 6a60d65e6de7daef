// ── External dialog processes ─────────────────────────────────────────────────
//
// Providers that drive a separate program (zenity, kdialog, osascript, and the
// X11 helpers) go through here.  Arguments are passed as an argv vector, never
// through a shell, so no shell quoting is needed.

use std::{
    env,
    ffi::OsStr,
    path::PathBuf,
    process::{Child, Command, Output, Stdio},
};

use crate::error::{DialogError, Result};

/// Exit status and standard output of a finished dialog process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Captured {
    /// `None` when the process was killed by a signal.
    pub(crate) code: Option<i32>,
    /// Stdout with a single trailing line break removed.
    pub(crate) stdout: String,
}

impl Captured {
    pub(crate) fn success(&self) -> bool {
        self.code == Some(0)
    }

    fn from_output(output: Output) -> Self {
        let mut stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if stdout.ends_with('\n') {
            stdout.pop();
            if stdout.ends_with('\r') {
                stdout.pop();
            }
        }
        Self {
            code: output.status.code(),
            stdout,
        }
    }
}

/// Run `program` to completion and capture its output.
pub(crate) fn run<S: AsRef<OsStr>>(program: &'static str, args: &[S]) -> Result<Captured> {
    let child = spawn(program, args)?;
    wait(program, child)
}

/// Start `program` with stdout piped and stdin/stderr detached.
pub(crate) fn spawn<S: AsRef<OsStr>>(program: &'static str, args: &[S]) -> Result<Child> {
    log::debug!(
        "spawning {program} {:?}",
        args.iter().map(|a| a.as_ref()).collect::<Vec<_>>()
    );
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| DialogError::Spawn { program, source })
}

/// Wait for a child started by [`spawn`].
pub(crate) fn wait(program: &'static str, child: Child) -> Result<Captured> {
    let output = child.wait_with_output()?;
    let captured = Captured::from_output(output);
    log::debug!("{program} exited with {:?}", captured.code);
    Ok(captured)
}

/// Locate `name` on `PATH`.
pub(crate) fn find_program(name: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(name).with_extension(env::consts::EXE_EXTENSION))
        .find(|candidate| candidate.is_file())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
