// ── Dialog operations ─────────────────────────────────────────────────────────
//
// The synchronous operation surface.  Each call:
//   1. snapshots the widget state into a fresh `DialogRequest`,
//   2. resolves the owner window,
//   3. hands the request to the selected provider, and
//   4. normalizes the raw outcome into the fixed result contract.
//
// Provider failures never escape: they are logged and collapse into the
// kind's cancellation sentinel, so a failure looks exactly like a cancel.
//
// A text prompt returns "" both when cancelled and when submitted empty.
// Callers cannot tell the two apart.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::error::Result;
use crate::filter::FilterSpec;
use crate::normalize::{
    attempt_status, clamp_digits, error_verdict, message_cancelable_status, message_status,
    question_status, validate_existing, Button, Rgb, Verdict, CANCELLED_COLOR,
};
use crate::owner;
use crate::platform::{provider_for, NativeDialog};
use crate::request::{DefaultValue, DialogKind, DialogRequest, WindowHandle};
use crate::state::{Backend, WidgetState};
use crate::text::{parse_number, with_trailing_separator};

/// Entry point for every dialog.  Cheap to clone; a clone is an independent
/// snapshot of the configuration.
#[derive(Clone)]
pub struct Dialogs {
    state: WidgetState,
    /// Fixed provider; `None` picks one from `state.system()` per call.
    provider: Option<Arc<dyn NativeDialog>>,
}

impl Default for Dialogs {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dialogs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dialogs")
            .field("state", &self.state)
            .field("provider", &self.provider.as_ref().map(|p| p.backend()))
            .finish()
    }
}

impl Dialogs {
    pub fn new() -> Self {
        Self::with_state(WidgetState::default())
    }

    pub fn with_state(state: WidgetState) -> Self {
        Self {
            state,
            provider: None,
        }
    }

    /// Route every dialog through `provider` regardless of the selected
    /// system.
    pub fn with_provider(provider: Arc<dyn NativeDialog>) -> Self {
        Self {
            state: WidgetState::default(),
            provider: Some(provider),
        }
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut WidgetState {
        &mut self.state
    }

    // ── Plumbing ──────────────────────────────────────────────────────────────

    fn provider(&self) -> Arc<dyn NativeDialog> {
        match &self.provider {
            Some(p) => Arc::clone(p),
            None => provider_for(self.state.system()),
        }
    }

    fn request(
        &self,
        provider: &dyn NativeDialog,
        kind: DialogKind,
        text: &str,
        title: &str,
    ) -> DialogRequest {
        let mut r = DialogRequest::new(kind);
        r.text = text.to_owned();
        r.title = self.state.title_for(kind, title);
        r.owner = owner::resolve(&self.state, provider);
        r.icon = self.state.icon();
        r.labels = self.state.labels().clone();
        r
    }

    fn alert(&self, kind: DialogKind, text: &str, abort_only: bool) -> Option<Button> {
        let provider = self.provider();
        let mut req = self.request(provider.as_ref(), kind, text, "");
        req.abort_only = abort_only;
        absorb(kind, provider.alert(&req))
    }

    fn prompt(&self, kind: DialogKind, text: &str, default: DefaultValue) -> String {
        let provider = self.provider();
        let mut req = self.request(provider.as_ref(), kind, text, "");
        req.default = default;
        absorb(kind, provider.prompt(&req)).unwrap_or_default()
    }

    // ── Messages ──────────────────────────────────────────────────────────────

    /// Always 1.
    pub fn show_message(&self, text: &str) -> i32 {
        message_status(self.alert(DialogKind::Message, text, false))
    }

    /// OK → 1, Cancel → −1.
    pub fn show_message_cancelable(&self, text: &str) -> i32 {
        message_cancelable_status(self.alert(DialogKind::MessageCancelable, text, false))
    }

    /// Yes → 1, No → 0.
    pub fn show_question(&self, text: &str) -> i32 {
        question_status(self.alert(DialogKind::Question, text, false), false)
    }

    /// Yes → 1, No → 0, Cancel → −1.
    pub fn show_question_cancelable(&self, text: &str) -> i32 {
        question_status(self.alert(DialogKind::QuestionCancelable, text, false), true)
    }

    /// Retry → 0, Cancel → −1.
    pub fn show_attempt(&self, text: &str) -> i32 {
        attempt_status(self.alert(DialogKind::Attempt, text, false))
    }

    /// Retry → 0, Ignore → −1.  Abort, or any answer when `abort` is set,
    /// exits the process with status 0 and does not return.
    pub fn show_error(&self, text: &str, abort: bool) -> i32 {
        match self.error_outcome(text, abort) {
            Verdict::Status(s) => s,
            Verdict::Terminate => {
                log::warn!("error dialog aborted; terminating process");
                std::process::exit(0)
            }
        }
    }

    pub(crate) fn error_outcome(&self, text: &str, abort: bool) -> Verdict {
        error_verdict(self.alert(DialogKind::Error, text, abort), abort)
    }

    // ── Prompts ───────────────────────────────────────────────────────────────

    /// The entered text, or "" on cancel.
    pub fn get_string(&self, prompt: &str, default: &str) -> String {
        self.prompt(
            DialogKind::StringPrompt,
            prompt,
            DefaultValue::Text(default.to_owned()),
        )
    }

    /// Same as [`Dialogs::get_string`] with masked input.
    pub fn get_password(&self, prompt: &str, default: &str) -> String {
        self.prompt(
            DialogKind::PasswordPrompt,
            prompt,
            DefaultValue::Text(default.to_owned()),
        )
    }

    /// The entered number clamped to ±999999999999999; 0 on cancel or when
    /// nothing numeric was typed.
    pub fn get_integer(&self, prompt: &str, default: f64) -> f64 {
        self.number(DialogKind::IntegerPrompt, prompt, default)
    }

    /// Same as [`Dialogs::get_integer`] with masked input.
    pub fn get_passcode(&self, prompt: &str, default: f64) -> f64 {
        self.number(DialogKind::PasscodePrompt, prompt, default)
    }

    fn number(&self, kind: DialogKind, prompt: &str, default: f64) -> f64 {
        let shown = DefaultValue::Number(clamp_digits(default));
        clamp_digits(parse_number(&self.prompt(kind, prompt, shown)))
    }

    // ── Files ─────────────────────────────────────────────────────────────────

    /// One existing file, or "" on cancel.
    pub fn get_open_filename(&self, filter: &str, fname: &str) -> String {
        self.get_open_filename_ext(filter, fname, "", "")
    }

    pub fn get_open_filename_ext(&self, filter: &str, fname: &str, dir: &str, title: &str) -> String {
        let paths = self.pick(DialogKind::OpenFile, filter, fname, dir, title);
        paths.first().map(|p| path_string(p)).unwrap_or_default()
    }

    /// Newline-joined existing files, or "" on cancel.
    pub fn get_open_filenames(&self, filter: &str, fname: &str) -> String {
        self.get_open_filenames_ext(filter, fname, "", "")
    }

    pub fn get_open_filenames_ext(
        &self,
        filter: &str,
        fname: &str,
        dir: &str,
        title: &str,
    ) -> String {
        self.open_filenames(filter, fname, dir, title)
            .iter()
            .map(|p| path_string(p))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The multi-select result as a list.  Empty when cancelled or when any
    /// selected path is not an existing file.
    pub fn open_filenames(&self, filter: &str, fname: &str, dir: &str, title: &str) -> Vec<PathBuf> {
        self.pick(DialogKind::OpenFiles, filter, fname, dir, title)
    }

    /// The chosen path, or "" on cancel.  The file need not exist.
    pub fn get_save_filename(&self, filter: &str, fname: &str) -> String {
        self.get_save_filename_ext(filter, fname, "", "")
    }

    pub fn get_save_filename_ext(&self, filter: &str, fname: &str, dir: &str, title: &str) -> String {
        let paths = self.pick(DialogKind::SaveFile, filter, fname, dir, title);
        paths.first().map(|p| path_string(p)).unwrap_or_default()
    }

    fn pick(&self, kind: DialogKind, filter: &str, fname: &str, dir: &str, title: &str) -> Vec<PathBuf> {
        let provider = self.provider();
        let mut req = self.request(provider.as_ref(), kind, "", title);
        req.filter = FilterSpec::parse(filter);
        req.file_name = fname.to_owned();
        req.initial_dir = non_empty_path(dir);

        let Some(raw) = absorb(kind, provider.pick_files(&req)) else {
            return Vec::new();
        };
        let paths = raw.into_paths(provider.path_separator());
        if kind == DialogKind::SaveFile {
            paths.into_iter().take(1).map(PathBuf::from).collect()
        } else {
            validate_existing(paths)
        }
    }

    // ── Directories ───────────────────────────────────────────────────────────

    /// A directory with a trailing separator, or "" on cancel.
    pub fn get_directory(&self, dname: &str) -> String {
        self.directory(dname, "")
    }

    /// Like [`Dialogs::get_directory`] with a caller-chosen title.
    pub fn get_directory_alt(&self, capt: &str, root: &str) -> String {
        self.directory(root, capt)
    }

    fn directory(&self, start: &str, title: &str) -> String {
        let provider = self.provider();
        let mut req = self.request(provider.as_ref(), DialogKind::PickDirectory, "", title);
        req.initial_dir = non_empty_path(start);
        let dir = absorb(DialogKind::PickDirectory, provider.pick_directory(&req)).unwrap_or_default();
        with_trailing_separator(&dir)
    }

    // ── Colors ────────────────────────────────────────────────────────────────

    /// Packed `R | G<<8 | B<<16`, or −1 on cancel.
    pub fn get_color(&self, default: i32) -> i32 {
        self.get_color_ext(default, "")
    }

    pub fn get_color_ext(&self, default: i32, title: &str) -> i32 {
        let provider = self.provider();
        let mut req = self.request(provider.as_ref(), DialogKind::PickColor, "", title);
        req.default = DefaultValue::Color(Rgb::from_packed(default));
        absorb(DialogKind::PickColor, provider.pick_color(&req)).map_or(CANCELLED_COLOR, Rgb::pack)
    }

    // ── Widget state ──────────────────────────────────────────────────────────

    pub fn widget_get_caption(&self) -> &str {
        self.state.caption()
    }

    pub fn widget_set_caption(&mut self, caption: &str) {
        self.state.set_caption(caption);
    }

    pub fn widget_get_owner(&self) -> Option<WindowHandle> {
        self.state.owner()
    }

    pub fn widget_set_owner(&mut self, owner: Option<WindowHandle>) {
        self.state.set_owner(owner);
    }

    /// The icon path, or "" when none applies.
    pub fn widget_get_icon(&self) -> String {
        self.state.icon().map(|p| path_string(&p)).unwrap_or_default()
    }

    pub fn widget_set_icon(&mut self, path: &str) {
        self.state.set_icon(path);
    }

    pub fn widget_get_system(&self) -> &'static str {
        self.state.system().name()
    }

    pub fn widget_set_system(&mut self, name: &str) {
        self.state.set_system(name);
    }

    pub fn widget_get_button_name(&self, button: Button) -> &str {
        self.state.button_name(button)
    }

    pub fn widget_set_button_name(&mut self, button: Button, name: &str) {
        self.state.set_button_name(button, name);
    }

    /// The backend that will actually serve the next call.
    pub fn active_backend(&self) -> Backend {
        self.provider().backend()
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Log a provider failure and treat it as a cancellation.
fn absorb<T>(kind: DialogKind, result: Result<Option<T>>) -> Option<T> {
    result.unwrap_or_else(|e| {
        log::warn!("{kind:?} dialog failed: {e}");
        None
    })
}

fn non_empty_path(s: &str) -> Option<PathBuf> {
    (!s.is_empty()).then(|| PathBuf::from(s))
}

fn path_string(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
