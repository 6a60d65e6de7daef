// ── Win32 platform implementation ─────────────────────────────────────────────
//
// One of exactly two modules in the crate where `unsafe` code is permitted
// (the other is `ffi`).  Every `unsafe` block MUST carry a `// SAFETY:`
// comment that states:
//   • which invariant makes the operation sound, and
//   • what the caller is responsible for maintaining.
//
// All dialogs here run on the calling thread and spin their own modal loop.

#![allow(unsafe_code)]

use std::ffi::c_void;

use windows::Win32::{
    Foundation::{GetLastError, HWND},
    UI::{
        Input::KeyboardAndMouse::GetActiveWindow,
        WindowsAndMessaging::{GetAncestor, GetForegroundWindow, GA_ROOTOWNER},
    },
};

use crate::error::{DialogError, Result};
use crate::normalize::{Button, RawSelection, Rgb};
use crate::platform::NativeDialog;
use crate::request::{DialogKind, DialogRequest, WindowHandle};
use crate::state::Backend;

// ── Sub-modules ───────────────────────────────────────────────────────────────

mod dialogs; // message box, common file dialogs, folder and color pickers
mod input; // text prompt built from an in-memory dialog template

// ── Provider ──────────────────────────────────────────────────────────────────

pub(crate) struct Win32Dialogs;

impl NativeDialog for Win32Dialogs {
    fn backend(&self) -> Backend {
        Backend::Win32
    }

    fn alert(&self, request: &DialogRequest) -> Result<Option<Button>> {
        dialogs::message_box(request)
    }

    fn prompt(&self, request: &DialogRequest) -> Result<Option<String>> {
        input::input_box(request)
    }

    fn pick_files(&self, request: &DialogRequest) -> Result<Option<RawSelection>> {
        if request.kind == DialogKind::SaveFile {
            dialogs::save_file(request)
        } else {
            dialogs::open_files(request)
        }
    }

    fn pick_directory(&self, request: &DialogRequest) -> Result<Option<String>> {
        dialogs::pick_folder(request)
    }

    fn pick_color(&self, request: &DialogRequest) -> Result<Option<Rgb>> {
        dialogs::choose_color(request)
    }

    fn active_window(&self) -> Option<WindowHandle> {
        // SAFETY: these getters take no pointers and return null when there
        // is no such window.
        let hwnd = unsafe {
            let root = GetAncestor(GetActiveWindow(), GA_ROOTOWNER);
            if root.0.is_null() {
                GetForegroundWindow()
            } else {
                root
            }
        };
        (!hwnd.0.is_null()).then(|| WindowHandle(hwnd.0 as usize))
    }

    fn path_separator(&self) -> char {
        '\\'
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// The owner window of a request, or null for an unowned dialog.
fn owner_hwnd(request: &DialogRequest) -> HWND {
    match request.owner {
        Some(h) => HWND(h.0 as *mut c_void),
        None => HWND::default(),
    }
}

/// NUL-terminated UTF-16 copy of `s`.
fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Capture the current Win32 last-error code and wrap it in a `DialogError`.
///
/// Call immediately after a Win32 function that signals failure; any later
/// API call can overwrite the thread-local value.
fn last_error(function: &'static str) -> DialogError {
    // SAFETY: GetLastError reads thread-local state set by the last Win32 call.
    // It is always safe to call and never fails.
    let code = unsafe { GetLastError() };
    DialogError::Win32 {
        function,
        code: code.0,
    }
}
