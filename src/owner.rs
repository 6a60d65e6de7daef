// ── Window ownership & attachment ─────────────────────────────────────────────
//
// Which window owns a new dialog: the handle set through the widget state,
// else whatever the provider reports as the active window.
//
// Zenity cannot be told its parent, so on X11 a watcher thread looks for the
// dialog's window by PID and stamps window-manager hints onto it with the
// `xdotool` and `xprop` helpers.  It is cosmetic and racy: with several
// dialogs in flight the hints can land on the wrong window.  Every failure is
// ignored.

use std::{
    io::Read,
    process::Child,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc, Arc,
    },
    thread,
    time::Duration,
};

use parking_lot::Mutex;

use crate::platform::{
    process::{self, find_program},
    NativeDialog,
};
use crate::request::WindowHandle;
use crate::state::WidgetState;

// ── Resolution ────────────────────────────────────────────────────────────────

/// Explicit owner first, then the provider's notion of the active window.
pub(crate) fn resolve(state: &WidgetState, provider: &dyn NativeDialog) -> Option<WindowHandle> {
    state.owner().or_else(|| provider.active_window())
}

/// The X11 active window, read from the root window's `_NET_ACTIVE_WINDOW`.
pub(crate) fn x11_active_window() -> Option<WindowHandle> {
    let out = process::run("xprop", &["-root", "32x", "\t$0", "_NET_ACTIVE_WINDOW"]).ok()?;
    if !out.success() {
        return None;
    }
    parse_active_window(&out.stdout)
}

/// Parse `_NET_ACTIVE_WINDOW(WINDOW)\t0x3a00007`.  Zero means no window.
fn parse_active_window(line: &str) -> Option<WindowHandle> {
    let value = line.rsplit('\t').next()?.trim();
    let hex = value.strip_prefix("0x").unwrap_or(value);
    match usize::from_str_radix(hex, 16) {
        Ok(0) | Err(_) => None,
        Ok(id) => Some(WindowHandle(id)),
    }
}

// ── Attach watcher ────────────────────────────────────────────────────────────

/// Attempts to find the dialog window before giving up.
const MAX_ATTEMPTS: u32 = 100;

/// Sleep between attempts.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long a finished dialog waits for the watcher before killing it.
pub(crate) const GRACE_PERIOD: Duration = Duration::from_millis(250);

/// Hints applied to the dialog window once found.
#[derive(Debug, Clone)]
pub(crate) struct WindowHints {
    pub(crate) parent: WindowHandle,
    pub(crate) title: String,
}

/// A background thread stamping [`WindowHints`] onto a dialog process's
/// window.
pub(crate) struct AttachWatcher {
    stop: Arc<AtomicBool>,
    /// The helper process currently running, so `finish` can kill it.
    helper: Arc<Mutex<Option<Child>>>,
    done: mpsc::Receiver<()>,
}

impl AttachWatcher {
    /// Start watching for the window of process `pid`.  Returns `None` when
    /// the X11 helpers are not installed.
    pub(crate) fn spawn(pid: u32, hints: WindowHints) -> Option<Self> {
        if find_program("xdotool").is_none() || find_program("xprop").is_none() {
            log::debug!("xdotool/xprop missing; dialog will not be attached");
            return None;
        }

        let stop = Arc::new(AtomicBool::new(false));
        let helper = Arc::new(Mutex::new(None));
        let (tx, done) = mpsc::channel();

        let worker = Worker {
            stop: Arc::clone(&stop),
            helper: Arc::clone(&helper),
        };
        let spawned = thread::Builder::new()
            .name("dialog-attach".into())
            .spawn(move || {
                worker.run(pid, &hints);
                let _ = tx.send(());
            });
        if let Err(e) = spawned {
            log::debug!("attach watcher not started: {e}");
            return None;
        }

        Some(Self { stop, helper, done })
    }

    /// Give the watcher `grace` to finish, then stop it and kill any helper
    /// still running.
    pub(crate) fn finish(self, grace: Duration) {
        if self.done.recv_timeout(grace).is_ok() {
            return;
        }
        self.stop.store(true, Ordering::SeqCst);
        if let Some(mut child) = self.helper.lock().take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        log::debug!("attach watcher timed out");
    }
}

struct Worker {
    stop: Arc<AtomicBool>,
    helper: Arc<Mutex<Option<Child>>>,
}

impl Worker {
    fn run(&self, pid: u32, hints: &WindowHints) {
        let pid = pid.to_string();
        for _ in 0..MAX_ATTEMPTS {
            if self.stopped() {
                return;
            }
            let windows = self
                .helper_output("xdotool", &["search", "--pid", &pid])
                .map(|out| parse_window_ids(&out))
                .unwrap_or_default();
            if !windows.is_empty() {
                for window in windows {
                    self.apply(window, hints);
                }
                log::debug!("attached dialog of pid {pid} to {:#x}", hints.parent.0);
                return;
            }
            thread::sleep(POLL_INTERVAL);
        }
        log::debug!("dialog window of pid {pid} never appeared");
    }

    fn apply(&self, window: u64, hints: &WindowHints) {
        let id = window.to_string();
        let parent = hints.parent.0.to_string();
        let commands: [&[&str]; 3] = [
            &["-id", id.as_str(), "-f", "WM_TRANSIENT_FOR", "32c", "-set", "WM_TRANSIENT_FOR", parent.as_str()],
            &[
                "-id",
                id.as_str(),
                "-f",
                "_NET_WM_WINDOW_TYPE",
                "32a",
                "-set",
                "_NET_WM_WINDOW_TYPE",
                "_NET_WM_WINDOW_TYPE_DIALOG",
            ],
            &["-id", id.as_str(), "-f", "_NET_WM_NAME", "8u", "-set", "_NET_WM_NAME", hints.title.as_str()],
        ];
        for args in commands {
            if self.stopped() {
                return;
            }
            let _ = self.helper_output("xprop", args);
        }
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Run a helper while keeping it reachable for `finish` to kill.
    fn helper_output(&self, program: &'static str, args: &[&str]) -> Option<String> {
        let mut child = process::spawn(program, args).ok()?;
        let stdout = child.stdout.take();
        *self.helper.lock() = Some(child);

        let mut out = String::new();
        if let Some(mut pipe) = stdout {
            let _ = pipe.read_to_string(&mut out);
        }

        // Gone already means `finish` killed and reaped it.
        let mut child = self.helper.lock().take()?;
        let status = child.wait().ok()?;
        status.success().then_some(out)
    }
}

/// `xdotool search` prints one decimal window id per line.
fn parse_window_ids(out: &str) -> Vec<u64> {
    out.lines().filter_map(|l| l.trim().parse().ok()).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::Scripted;

    #[test]
    fn parses_active_window_hex() {
        assert_eq!(
            parse_active_window("_NET_ACTIVE_WINDOW(WINDOW)\t0x3a00007"),
            Some(WindowHandle(0x3a0_0007))
        );
        assert_eq!(parse_active_window("\t0x3a00007"), Some(WindowHandle(0x3a0_0007)));
    }

    #[test]
    fn zero_or_garbage_active_window_is_none() {
        assert_eq!(parse_active_window("_NET_ACTIVE_WINDOW(WINDOW)\t0x0"), None);
        assert_eq!(parse_active_window("_NET_ACTIVE_WINDOW:  not found."), None);
        assert_eq!(parse_active_window(""), None);
    }

    #[test]
    fn window_ids_skip_noise() {
        assert_eq!(parse_window_ids("123\n\n456\nDefaulting to search\n"), vec![123, 456]);
    }

    #[test]
    fn explicit_owner_beats_active_window() {
        let mut state = WidgetState::default();
        let provider = Scripted {
            active: Some(WindowHandle(7)),
            ..Scripted::default()
        };
        assert_eq!(resolve(&state, &provider), Some(WindowHandle(7)));
        state.set_owner(Some(WindowHandle(99)));
        assert_eq!(resolve(&state, &provider), Some(WindowHandle(99)));
        state.set_owner(None);
        assert_eq!(resolve(&state, &Scripted::default()), None);
    }

    #[cfg(unix)]
    fn watcher_with_helper(seconds: &str) -> (AttachWatcher, mpsc::Sender<()>, u32) {
        let child = std::process::Command::new("sleep")
            .arg(seconds)
            .spawn()
            .expect("spawn sleep");
        let pid = child.id();
        let (tx, done) = mpsc::channel();
        let watcher = AttachWatcher {
            stop: Arc::new(AtomicBool::new(false)),
            helper: Arc::new(Mutex::new(Some(child))),
            done,
        };
        (watcher, tx, pid)
    }

    #[cfg(unix)]
    fn is_alive(pid: u32) -> bool {
        let script = format!("kill -0 {pid}");
        process::run("sh", &["-c", script.as_str()])
            .expect("run sh")
            .success()
    }

    #[cfg(unix)]
    #[test]
    fn stuck_helper_is_killed_after_grace() {
        let (watcher, _keep_open, pid) = watcher_with_helper("5");
        let stop = Arc::clone(&watcher.stop);
        let helper = Arc::clone(&watcher.helper);

        let started = std::time::Instant::now();
        watcher.finish(Duration::from_millis(50));
        assert!(started.elapsed() < Duration::from_secs(2));

        assert!(stop.load(Ordering::SeqCst));
        assert!(helper.lock().is_none());
        assert!(!is_alive(pid));
    }

    #[cfg(unix)]
    #[test]
    fn finished_watcher_leaves_helper_alone() {
        let (watcher, done, _pid) = watcher_with_helper("5");
        let stop = Arc::clone(&watcher.stop);
        let helper = Arc::clone(&watcher.helper);
        done.send(()).expect("signal done");

        watcher.finish(Duration::from_millis(50));
        assert!(!stop.load(Ordering::SeqCst));

        let mut child = helper.lock().take().expect("helper untouched");
        let _ = child.kill();
        let _ = child.wait();
    }
}
