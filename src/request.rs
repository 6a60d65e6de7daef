// ── Dialog requests ───────────────────────────────────────────────────────────
//
// A `DialogRequest` is built fresh for every call from the caller's arguments
// and a snapshot of `WidgetState`, then handed to a provider.  It is never
// mutated afterwards.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::filter::FilterSpec;
use crate::normalize::{Button, Rgb};
use crate::state::ButtonLabels;

// ── Window handles ────────────────────────────────────────────────────────────

/// An opaque native window id: an `HWND` on Windows, an X11 XID elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowHandle(pub usize);

// ── Dialog kinds ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogKind {
    Message,
    MessageCancelable,
    Question,
    QuestionCancelable,
    Attempt,
    Error,
    StringPrompt,
    PasswordPrompt,
    IntegerPrompt,
    PasscodePrompt,
    OpenFile,
    OpenFiles,
    SaveFile,
    PickDirectory,
    PickColor,
}

impl DialogKind {
    /// Title used when neither the caller nor the caption supplies one.
    pub fn default_title(self) -> &'static str {
        match self {
            DialogKind::Message => "Information",
            DialogKind::MessageCancelable
            | DialogKind::Question
            | DialogKind::QuestionCancelable => "Question",
            DialogKind::Attempt | DialogKind::Error => "Error",
            DialogKind::StringPrompt
            | DialogKind::PasswordPrompt
            | DialogKind::IntegerPrompt
            | DialogKind::PasscodePrompt => "Input Query",
            DialogKind::OpenFile | DialogKind::OpenFiles => "Open",
            DialogKind::SaveFile => "Save As",
            DialogKind::PickDirectory => "Select Directory",
            DialogKind::PickColor => "Color",
        }
    }

    /// Prompts whose input must not be echoed.
    pub fn is_masked(self) -> bool {
        matches!(self, DialogKind::PasswordPrompt | DialogKind::PasscodePrompt)
    }

    /// Dialogs whose title comes from the error caption.
    pub(crate) fn uses_error_caption(self) -> bool {
        matches!(self, DialogKind::Attempt | DialogKind::Error)
    }

    /// Pickers take a per-call title instead of the widget caption.
    pub(crate) fn is_picker(self) -> bool {
        matches!(
            self,
            DialogKind::OpenFile
                | DialogKind::OpenFiles
                | DialogKind::SaveFile
                | DialogKind::PickDirectory
                | DialogKind::PickColor
        )
    }
}

// ── Request ───────────────────────────────────────────────────────────────────

/// The pre-filled value of a prompt or picker.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DefaultValue {
    #[default]
    None,
    Text(String),
    /// Already clamped and formatted by the caller's operation.
    Number(f64),
    Color(Rgb),
}

/// Everything a provider needs to present one dialog.
#[derive(Debug, Clone)]
pub struct DialogRequest {
    pub kind: DialogKind,
    /// Message body or prompt label.
    pub text: String,
    pub default: DefaultValue,
    pub filter: FilterSpec,
    pub initial_dir: Option<PathBuf>,
    /// Pre-filled file name for open/save pickers.
    pub file_name: String,
    /// Resolved title; never empty.
    pub title: String,
    pub owner: Option<WindowHandle>,
    pub icon: Option<PathBuf>,
    pub labels: ButtonLabels,
    /// Error dialogs only: offer nothing but Abort.
    pub abort_only: bool,
}

impl DialogRequest {
    pub(crate) fn new(kind: DialogKind) -> Self {
        Self {
            kind,
            text: String::new(),
            default: DefaultValue::None,
            filter: FilterSpec::default(),
            initial_dir: None,
            file_name: String::new(),
            title: kind.default_title().to_owned(),
            owner: None,
            icon: None,
            labels: ButtonLabels::default(),
            abort_only: false,
        }
    }

    pub(crate) fn label(&self, button: Button) -> &str {
        self.labels.get(button)
    }

    /// The default value rendered as prompt text.
    pub(crate) fn default_text(&self) -> String {
        match &self.default {
            DefaultValue::None => String::new(),
            DefaultValue::Text(s) => s.clone(),
            DefaultValue::Number(n) => crate::text::format_number(*n),
            DefaultValue::Color(c) => c.to_hex(),
        }
    }

    pub(crate) fn default_color(&self) -> Rgb {
        match self.default {
            DefaultValue::Color(c) => c,
            _ => Rgb::default(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
