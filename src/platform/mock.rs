// ── Scripted provider (tests only) ────────────────────────────────────────────
//
// Returns canned outcomes and records every request it sees.  An optional
// gate makes each call block until the test releases it.

use std::sync::mpsc;

use parking_lot::Mutex;

use super::NativeDialog;
use crate::error::{DialogError, Result};
use crate::normalize::{Button, RawSelection, Rgb};
use crate::request::{DialogRequest, WindowHandle};
use crate::state::Backend;

#[derive(Default)]
pub(crate) struct Scripted {
    pub(crate) button: Option<Button>,
    pub(crate) text: Option<String>,
    pub(crate) selection: Option<RawSelection>,
    pub(crate) directory: Option<String>,
    pub(crate) color: Option<Rgb>,
    pub(crate) active: Option<WindowHandle>,
    /// Every call fails as if the backend could not be launched.
    pub(crate) fail: bool,
    /// When set, each call waits for one message before answering.
    pub(crate) gate: Option<Mutex<mpsc::Receiver<()>>>,
    pub(crate) seen: Mutex<Vec<DialogRequest>>,
}

impl Scripted {
    pub(crate) fn gated() -> (Self, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let s = Self {
            gate: Some(Mutex::new(rx)),
            ..Self::default()
        };
        (s, tx)
    }

    pub(crate) fn last(&self) -> Option<DialogRequest> {
        self.seen.lock().last().cloned()
    }

    fn answer<T: Clone>(&self, request: &DialogRequest, value: &Option<T>) -> Result<Option<T>> {
        self.seen.lock().push(request.clone());
        if let Some(gate) = &self.gate {
            let _ = gate.lock().recv();
        }
        if self.fail {
            return Err(DialogError::Unavailable("scripted"));
        }
        Ok(value.clone())
    }
}

impl NativeDialog for Scripted {
    fn backend(&self) -> Backend {
        Backend::platform_default()
    }

    fn alert(&self, request: &DialogRequest) -> Result<Option<Button>> {
        self.answer(request, &self.button)
    }

    fn prompt(&self, request: &DialogRequest) -> Result<Option<String>> {
        self.answer(request, &self.text)
    }

    fn pick_files(&self, request: &DialogRequest) -> Result<Option<RawSelection>> {
        self.answer(request, &self.selection)
    }

    fn pick_directory(&self, request: &DialogRequest) -> Result<Option<String>> {
        self.answer(request, &self.directory)
    }

    fn pick_color(&self, request: &DialogRequest) -> Result<Option<Rgb>> {
        self.answer(request, &self.color)
    }

    fn active_window(&self) -> Option<WindowHandle> {
        self.active
    }
}
