// ── Native dialog providers ───────────────────────────────────────────────────
//
// One `NativeDialog` implementation per backend.  Providers only present a
// dialog and report what happened in neutral terms (`Button`, `RawSelection`,
// `Rgb`); turning that into status codes is `normalize`'s job.
//
// `Ok(None)` is a cancellation.  `Err` is a failure the caller absorbs.  No
// `unsafe` lives here; Win32 FFI is confined to the `win32` sub-module.

use std::{path::MAIN_SEPARATOR, sync::Arc};

use crate::error::{DialogError, Result};
use crate::normalize::{Button, RawSelection, Rgb};
use crate::request::{DialogRequest, WindowHandle};
use crate::state::Backend;

// ── Sub-modules ───────────────────────────────────────────────────────────────

pub(crate) mod kdialog;
pub(crate) mod osascript;
pub(crate) mod process;
pub(crate) mod zenity;

#[cfg(windows)]
pub(crate) mod win32;

#[cfg(test)]
pub(crate) mod mock;

// ── Provider interface ────────────────────────────────────────────────────────

/// One backend capable of presenting native dialogs.  Every call blocks until
/// the user dismisses the dialog.
pub trait NativeDialog: Send + Sync {
    fn backend(&self) -> Backend;

    /// Message, question, attempt and error boxes.  Reports the button
    /// pressed, or `None` if the box was closed without one.
    fn alert(&self, request: &DialogRequest) -> Result<Option<Button>>;

    /// Text, password and numeric prompts.
    fn prompt(&self, request: &DialogRequest) -> Result<Option<String>>;

    /// Open (single or multiple) and save pickers.
    fn pick_files(&self, request: &DialogRequest) -> Result<Option<RawSelection>>;

    fn pick_directory(&self, request: &DialogRequest) -> Result<Option<String>>;

    fn pick_color(&self, request: &DialogRequest) -> Result<Option<Rgb>>;

    /// The window that should own a dialog when none was set explicitly.
    fn active_window(&self) -> Option<WindowHandle> {
        None
    }

    /// Separator used when rebuilding multi-select paths.
    fn path_separator(&self) -> char {
        MAIN_SEPARATOR
    }
}

// ── Selection ─────────────────────────────────────────────────────────────────

/// The provider for `backend`, or the platform default when its program is
/// not installed.
pub fn provider_for(backend: Backend) -> Arc<dyn NativeDialog> {
    match choose_backend(backend, Backend::is_installed) {
        #[cfg(windows)]
        Backend::Win32 => Arc::new(win32::Win32Dialogs),
        Backend::Zenity => Arc::new(zenity::Zenity),
        Backend::KDialog => Arc::new(kdialog::KDialog),
        Backend::Cocoa => Arc::new(osascript::Cocoa),
        #[allow(unreachable_patterns)]
        other => Arc::new(Unavailable(other)),
    }
}

/// `backend` if `installed` says so, else the platform default.
fn choose_backend(backend: Backend, installed: impl Fn(Backend) -> bool) -> Backend {
    if installed(backend) {
        return backend;
    }
    let fallback = Backend::platform_default();
    log::info!(
        "{} is not installed; using {}",
        backend.name(),
        fallback.name()
    );
    fallback
}

/// Stands in for a backend this build cannot drive; every call fails.
struct Unavailable(Backend);

impl Unavailable {
    fn fail<T>(&self) -> Result<T> {
        Err(DialogError::Unavailable(self.0.name()))
    }
}

impl NativeDialog for Unavailable {
    fn backend(&self) -> Backend {
        self.0
    }

    fn alert(&self, _: &DialogRequest) -> Result<Option<Button>> {
        self.fail()
    }

    fn prompt(&self, _: &DialogRequest) -> Result<Option<String>> {
        self.fail()
    }

    fn pick_files(&self, _: &DialogRequest) -> Result<Option<RawSelection>> {
        self.fail()
    }

    fn pick_directory(&self, _: &DialogRequest) -> Result<Option<String>> {
        self.fail()
    }

    fn pick_color(&self, _: &DialogRequest) -> Result<Option<Rgb>> {
        self.fail()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::DialogKind;

    #[test]
    fn unavailable_backend_fails_every_call() {
        let p = Unavailable(Backend::Win32);
        let req = DialogRequest::new(DialogKind::Message);
        assert!(matches!(p.alert(&req), Err(DialogError::Unavailable("Win32"))));
        assert!(p.pick_color(&req).is_err());
        assert_eq!(p.active_window(), None);
    }

    #[test]
    fn missing_backend_falls_back_to_platform_default() {
        let default = Backend::platform_default();
        for b in [Backend::Win32, Backend::Zenity, Backend::KDialog, Backend::Cocoa] {
            assert_eq!(choose_backend(b, |_| false), default);
            assert_eq!(choose_backend(b, |_| true), b);
        }
        assert_eq!(choose_backend(Backend::KDialog, |b| b != Backend::KDialog), default);
    }

    #[test]
    fn platform_default_provider_serves_itself() {
        let p = provider_for(Backend::platform_default());
        assert_eq!(p.backend(), Backend::platform_default());
    }
}
