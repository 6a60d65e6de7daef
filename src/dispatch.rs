// ── Async dispatch ────────────────────────────────────────────────────────────
//
// Runs any dialog operation on a detached worker thread and reports the
// normalized result to an `EventSink` as a `ResultRecord`.
//
// Job ids come from a counter that starts at 100 and wraps at `u32::MAX`.
// In `Serialized` mode only one job may be in flight; a job submitted while
// another is showing is dropped without a record, but its id is still
// consumed and returned.

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        mpsc, Arc,
    },
    thread,
};

use serde::Serialize;

use crate::dialogs::Dialogs;

/// First id handed out by a new dispatcher.
pub const FIRST_JOB_ID: u32 = 100;

// ── Operations ────────────────────────────────────────────────────────────────

/// Arguments shared by the file pickers.  Empty strings mean "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileArgs {
    pub filter: String,
    pub fname: String,
    pub dir: String,
    pub title: String,
}

/// An owned description of one dialog call, so it can move to a worker.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogOp {
    Message(String),
    MessageCancelable(String),
    Question(String),
    QuestionCancelable(String),
    Attempt(String),
    Error { text: String, abort: bool },
    GetString { prompt: String, default: String },
    GetPassword { prompt: String, default: String },
    GetInteger { prompt: String, default: f64 },
    GetPasscode { prompt: String, default: f64 },
    OpenFilename(FileArgs),
    OpenFilenames(FileArgs),
    SaveFilename(FileArgs),
    Directory(String),
    DirectoryAlt { caption: String, root: String },
    Color { default: i32, title: String },
}

/// The normalized outcome of any dialog operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogResult {
    Status(i32),
    Text(String),
    Number(f64),
    Color(i32),
    Paths(Vec<PathBuf>),
}

impl DialogOp {
    /// Run synchronously on the calling thread.
    pub fn run(self, d: &Dialogs) -> DialogResult {
        use DialogResult::{Color, Number, Status, Text};
        match self {
            DialogOp::Message(t) => Status(d.show_message(&t)),
            DialogOp::MessageCancelable(t) => Status(d.show_message_cancelable(&t)),
            DialogOp::Question(t) => Status(d.show_question(&t)),
            DialogOp::QuestionCancelable(t) => Status(d.show_question_cancelable(&t)),
            DialogOp::Attempt(t) => Status(d.show_attempt(&t)),
            DialogOp::Error { text, abort } => Status(d.show_error(&text, abort)),
            DialogOp::GetString { prompt, default } => Text(d.get_string(&prompt, &default)),
            DialogOp::GetPassword { prompt, default } => Text(d.get_password(&prompt, &default)),
            DialogOp::GetInteger { prompt, default } => Number(d.get_integer(&prompt, default)),
            DialogOp::GetPasscode { prompt, default } => Number(d.get_passcode(&prompt, default)),
            DialogOp::OpenFilename(a) => {
                Text(d.get_open_filename_ext(&a.filter, &a.fname, &a.dir, &a.title))
            }
            DialogOp::OpenFilenames(a) => {
                DialogResult::Paths(d.open_filenames(&a.filter, &a.fname, &a.dir, &a.title))
            }
            DialogOp::SaveFilename(a) => {
                Text(d.get_save_filename_ext(&a.filter, &a.fname, &a.dir, &a.title))
            }
            DialogOp::Directory(start) => Text(d.get_directory(&start)),
            DialogOp::DirectoryAlt { caption, root } => Text(d.get_directory_alt(&caption, &root)),
            DialogOp::Color { default, title } => Color(d.get_color_ext(default, &title)),
        }
    }
}

// ── Records ───────────────────────────────────────────────────────────────────

/// What a finished job reports.  Status kinds carry only `status`; text and
/// path kinds add `result`; numeric and color kinds add `value`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub id: u32,
    pub status: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl DialogResult {
    pub fn into_record(self, id: u32) -> ResultRecord {
        let mut record = ResultRecord {
            id,
            status: 1,
            result: None,
            value: None,
        };
        match self {
            DialogResult::Status(s) => record.status = s,
            DialogResult::Text(t) => record.result = Some(t),
            DialogResult::Paths(p) => {
                let joined: Vec<_> = p.iter().map(|p| p.to_string_lossy()).collect();
                record.result = Some(joined.join("\n"));
            }
            DialogResult::Number(n) => record.value = Some(n),
            DialogResult::Color(c) => record.value = Some(f64::from(c)),
        }
        record
    }
}

// ── Sinks ─────────────────────────────────────────────────────────────────────

/// Receives finished jobs.  Called on the worker thread.
pub trait EventSink: Send + Sync {
    fn deliver(&self, record: ResultRecord);
}

impl<F> EventSink for F
where
    F: Fn(ResultRecord) + Send + Sync,
{
    fn deliver(&self, record: ResultRecord) {
        self(record)
    }
}

impl EventSink for mpsc::Sender<ResultRecord> {
    fn deliver(&self, record: ResultRecord) {
        if self.send(record).is_err() {
            log::debug!("result receiver dropped; discarding record");
        }
    }
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// At most one job in flight; extra submissions are dropped.
    #[default]
    Serialized,
    Concurrent,
}

pub struct Dispatcher {
    next_id: AtomicU32,
    mode: Mode,
    busy: Arc<AtomicBool>,
    sink: Arc<dyn EventSink>,
}

impl Dispatcher {
    pub fn new(mode: Mode, sink: impl EventSink + 'static) -> Self {
        Self::with_sink(mode, Arc::new(sink))
    }

    pub fn with_sink(mode: Mode, sink: Arc<dyn EventSink>) -> Self {
        Self {
            next_id: AtomicU32::new(FIRST_JOB_ID),
            mode,
            busy: Arc::new(AtomicBool::new(false)),
            sink,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether a serialized job is currently showing.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Start `op` against a snapshot of `dialogs` and return its job id at
    /// once.
    pub fn submit(&self, dialogs: &Dialogs, op: DialogOp) -> u32 {
        // fetch_add wraps on overflow.
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let guard = match self.mode {
            Mode::Concurrent => None,
            Mode::Serialized => match BusyGuard::acquire(&self.busy) {
                Some(g) => Some(g),
                None => {
                    log::debug!("dialog job {id} dropped: another dialog is showing");
                    return id;
                }
            },
        };

        let dialogs = dialogs.clone();
        let sink = Arc::clone(&self.sink);
        let spawned = thread::Builder::new()
            .name(format!("dialog-job-{id}"))
            .spawn(move || {
                let _guard = guard;
                let record = op.run(&dialogs).into_record(id);
                log::debug!("dialog job {id} finished with status {}", record.status);
                sink.deliver(record);
            });
        if let Err(e) = spawned {
            log::warn!("could not start dialog job {id}: {e}");
        }
        id
    }
}

/// Holds the serialized-mode busy flag; releasing happens on drop, so a
/// panicking job still frees the slot.
struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(Arc::clone(flag)))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Button;
    use crate::platform::mock::Scripted;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    fn channel_dispatcher(mode: Mode) -> (Dispatcher, mpsc::Receiver<ResultRecord>) {
        let (tx, rx) = mpsc::channel();
        (Dispatcher::new(mode, tx), rx)
    }

    #[test]
    fn ids_start_at_100_and_increase() {
        let (dispatcher, rx) = channel_dispatcher(Mode::Concurrent);
        let d = Dialogs::with_provider(Arc::new(Scripted::default()));
        let a = dispatcher.submit(&d, DialogOp::Message("one".into()));
        let b = dispatcher.submit(&d, DialogOp::Message("two".into()));
        assert_eq!((a, b), (100, 101));

        let mut ids = vec![
            rx.recv_timeout(WAIT).expect("first").id,
            rx.recv_timeout(WAIT).expect("second").id,
        ];
        ids.sort_unstable();
        assert_eq!(ids, vec![100, 101]);
    }

    #[test]
    fn ids_wrap_at_the_integer_width() {
        let (dispatcher, _rx) = channel_dispatcher(Mode::Concurrent);
        dispatcher.next_id.store(u32::MAX, Ordering::Relaxed);
        let d = Dialogs::with_provider(Arc::new(Scripted::default()));
        assert_eq!(dispatcher.submit(&d, DialogOp::Message("a".into())), u32::MAX);
        assert_eq!(dispatcher.submit(&d, DialogOp::Message("b".into())), 0);
    }

    #[test]
    fn serialized_mode_drops_overlapping_jobs() {
        let (provider, release) = Scripted::gated();
        let d = Dialogs::with_provider(Arc::new(provider));
        let (dispatcher, rx) = channel_dispatcher(Mode::Serialized);

        let first = dispatcher.submit(&d, DialogOp::Question("first".into()));
        let second = dispatcher.submit(&d, DialogOp::Question("second".into()));
        assert_eq!(second, first + 1);
        assert!(dispatcher.is_busy());

        release.send(()).expect("release");
        let record = rx.recv_timeout(WAIT).expect("one record");
        assert_eq!(record.id, first);
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn serialized_slot_frees_after_completion() {
        let (provider, release) = Scripted::gated();
        let d = Dialogs::with_provider(Arc::new(provider));
        let (dispatcher, rx) = channel_dispatcher(Mode::Serialized);

        release.send(()).expect("release");
        dispatcher.submit(&d, DialogOp::Message("a".into()));
        rx.recv_timeout(WAIT).expect("first record");

        // The guard drops after delivery; wait for the flag to clear.
        let deadline = std::time::Instant::now() + WAIT;
        while dispatcher.is_busy() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        release.send(()).expect("release");
        let id = dispatcher.submit(&d, DialogOp::Message("b".into()));
        assert_eq!(rx.recv_timeout(WAIT).expect("second record").id, id);
    }

    #[test]
    fn closures_are_sinks() {
        let (tx, rx) = mpsc::channel();
        let sink = move |r: ResultRecord| {
            let _ = tx.send(r.status);
        };
        let dispatcher = Dispatcher::new(Mode::Concurrent, sink);
        let d = Dialogs::with_provider(Arc::new(Scripted {
            button: Some(Button::No),
            ..Scripted::default()
        }));
        dispatcher.submit(&d, DialogOp::Question("q".into()));
        assert_eq!(rx.recv_timeout(WAIT).expect("status"), 0);
    }

    #[test]
    fn record_shapes() {
        let json = |r: DialogResult| serde_json::to_string(&r.into_record(7)).expect("json");
        assert_eq!(json(DialogResult::Status(-1)), r#"{"id":7,"status":-1}"#);
        assert_eq!(
            json(DialogResult::Text("hi".into())),
            r#"{"id":7,"status":1,"result":"hi"}"#
        );
        assert_eq!(json(DialogResult::Number(42.0)), r#"{"id":7,"status":1,"value":42.0}"#);
        assert_eq!(json(DialogResult::Color(-1)), r#"{"id":7,"status":1,"value":-1.0}"#);
    }

    #[test]
    fn path_results_are_newline_joined() {
        let record = DialogResult::Paths(vec![PathBuf::from("a"), PathBuf::from("b")]).into_record(1);
        assert_eq!(record.result.as_deref(), Some("a\nb"));
        assert_eq!(record.status, 1);
    }

    #[test]
    fn ops_route_to_matching_operations() {
        let d = Dialogs::with_provider(Arc::new(Scripted {
            text: Some("7".into()),
            ..Scripted::default()
        }));
        let op = DialogOp::GetInteger {
            prompt: "n".into(),
            default: 0.0,
        };
        assert_eq!(op.run(&d), DialogResult::Number(7.0));
        assert_eq!(
            DialogOp::Color {
                default: 0,
                title: String::new()
            }
            .run(&d),
            DialogResult::Color(-1)
        );
    }
}
