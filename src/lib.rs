//! Native message boxes, text prompts and file, folder and color pickers
//! behind one small result contract.
//!
//! Every dialog returns a plain value: a status (`1`, `0`, `-1`), a string,
//! a number, or a packed color.  Cancellation and backend failure both come
//! back as the kind's sentinel, so callers never handle errors for a dialog.
//!
//! ```no_run
//! use dialog_module::Dialogs;
//!
//! let mut dialogs = Dialogs::new();
//! dialogs.widget_set_caption("My Game");
//! if dialogs.show_question("Save before quitting?") == 1 {
//!     let path = dialogs.get_save_filename("Saves (*.sav)|*.sav", "slot1.sav");
//!     println!("saving to {path:?}");
//! }
//! ```
//!
//! [`Dispatcher`] runs the same operations on worker threads, and the `ffi`
//! module exports them through the C ABI.

// ── Safety policy ────────────────────────────────────────────────────────────
// Unsafe code is forbidden everywhere except:
//   • `platform::win32` – Win32 FFI
//   • `ffi`             – the exported C ABI
// Each unsafe block in those modules MUST carry a `// SAFETY:` comment.
#![deny(unsafe_code)]

mod dialogs;
mod dispatch;
mod error;
pub mod ffi;
mod filter;
mod normalize;
mod owner;
mod platform;
mod request;
mod state;
mod text;

pub use dialogs::Dialogs;
pub use dispatch::{
    DialogOp, DialogResult, Dispatcher, EventSink, FileArgs, Mode, ResultRecord, FIRST_JOB_ID,
};
pub use error::{DialogError, Result};
pub use filter::{FilterGroup, FilterSpec};
pub use normalize::{Button, RawSelection, Rgb, CANCELLED_COLOR, NUMBER_LIMIT};
pub use platform::{provider_for, NativeDialog};
pub use request::{DefaultValue, DialogKind, DialogRequest, WindowHandle};
pub use state::{Backend, ButtonLabels, WidgetState};
