// ── Central error type ────────────────────────────────────────────────────────
//
// Providers and the persistence helpers return `error::Result<T>`.  The dialog
// operations in `dialogs.rs` never surface these: every failure there is
// logged and collapsed into the kind's cancellation sentinel.

use thiserror::Error;

/// Every error that a dialog provider or the state file can produce.
#[derive(Debug, Error)]
pub enum DialogError {
    /// An external dialog utility could not be started.
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The selected backend cannot run on this platform.
    #[error("{0} dialogs are not available on this platform")]
    Unavailable(&'static str),

    /// A Win32 API call returned a failure code.
    #[error("{function} failed (error {code:#010x})")]
    Win32 {
        /// The name of the failing function, for display purposes.
        function: &'static str,
        /// The raw Win32 error code (`GetLastError()` value) or HRESULT.
        code: u32,
    },

    /// A standard I/O error (state file read/write, child pipes, …).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The widget-state file is not valid JSON.
    #[error("invalid state file: {0}")]
    Json(#[from] serde_json::Error),

    /// The widget-state file was written by an incompatible version.
    #[error("unsupported state file version {0}")]
    UnsupportedVersion(u32),
}

// Convert a windows-crate error (HRESULT) directly so that `?` works on
// `windows::core::Result<T>` throughout the Win32 provider.
#[cfg(windows)]
impl From<windows::core::Error> for DialogError {
    fn from(e: windows::core::Error) -> Self {
        // HRESULT.0 is i32; reinterpret bits as u32 for display purposes.
        Self::Win32 {
            function: "windows",
            code: e.code().0 as u32,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DialogError>;

// ── Tests ─────────────────────────────────────────────────────────────────────
