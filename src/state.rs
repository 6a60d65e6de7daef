// ── Widget state ──────────────────────────────────────────────────────────────
//
// The configuration every dialog call reads: caption, owner window, icon,
// backend selection and button labels.  `Dialogs` owns one; the C ABI layer
// keeps a single process-wide instance.  Mutating it while another thread is
// preparing a dialog is the caller's problem to serialize.
//
// The state can be persisted to JSON.  Files carry a version number and every
// field added later is `#[serde(default)]` so older files keep loading.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::{DialogError, Result};
use crate::normalize::Button;
use crate::platform::process::find_program;
use crate::request::{DialogKind, WindowHandle};

// ── Format version ────────────────────────────────────────────────────────────

const STATE_VERSION: u32 = 1;

/// Error caption used until a caption is set.
const DEFAULT_ERROR_CAPTION: &str = "Error";

/// Icon picked up when none was set explicitly, relative to the working dir.
const DEFAULT_ICON: &str = "assets/icon.png";

// ── Backends ──────────────────────────────────────────────────────────────────

/// A family of native dialogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Backend {
    Win32,
    Zenity,
    KDialog,
    Cocoa,
}

impl Backend {
    /// Name as accepted by [`WidgetState::set_system`].
    pub fn name(self) -> &'static str {
        match self {
            Backend::Win32 => "Win32",
            Backend::Zenity => "Zenity",
            Backend::KDialog => "KDialog",
            Backend::Cocoa => "Cocoa",
        }
    }

    pub fn from_name(name: &str) -> Option<Backend> {
        match name {
            "Win32" => Some(Backend::Win32),
            "Zenity" => Some(Backend::Zenity),
            "KDialog" => Some(Backend::KDialog),
            "Cocoa" => Some(Backend::Cocoa),
            _ => None,
        }
    }

    /// Backends this build can drive.
    pub fn available() -> &'static [Backend] {
        if cfg!(windows) {
            &[Backend::Win32]
        } else if cfg!(target_os = "macos") {
            &[Backend::Cocoa]
        } else {
            &[Backend::Zenity, Backend::KDialog]
        }
    }

    pub fn platform_default() -> Backend {
        Self::available()[0]
    }

    /// The external program this backend drives, if any.
    pub(crate) fn program(self) -> Option<&'static str> {
        match self {
            Backend::Win32 => None,
            Backend::Zenity => Some("zenity"),
            Backend::KDialog => Some("kdialog"),
            Backend::Cocoa => Some("osascript"),
        }
    }

    /// In-process backends are always installed; the rest need their
    /// program on `PATH`.
    pub fn is_installed(self) -> bool {
        self.program().map_or(true, |p| find_program(p).is_some())
    }
}

impl Default for Backend {
    fn default() -> Self {
        Self::platform_default()
    }
}

// ── Button labels ─────────────────────────────────────────────────────────────

/// Custom captions for dialog buttons.  Unset buttons use English defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ButtonLabels(HashMap<Button, String>);

impl ButtonLabels {
    pub fn get(&self, button: Button) -> &str {
        self.0
            .get(&button)
            .map_or(button.default_label(), String::as_str)
    }

    /// Set a custom caption.  An empty `name` restores the default.
    pub fn set(&mut self, button: Button, name: &str) {
        if name.is_empty() {
            self.0.remove(&button);
        } else {
            self.0.insert(button, name.to_owned());
        }
    }
}

// ── Widget state ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetState {
    version: u32,
    /// General title override; empty means "per-kind default".
    #[serde(default)]
    caption: String,
    /// Title of Error/Attempt dialogs.
    #[serde(default = "default_error_caption")]
    error_caption: String,
    #[serde(default)]
    owner: Option<WindowHandle>,
    #[serde(default)]
    icon: Option<PathBuf>,
    #[serde(default)]
    system: Backend,
    #[serde(default)]
    labels: ButtonLabels,
}

fn default_error_caption() -> String {
    DEFAULT_ERROR_CAPTION.to_owned()
}

impl Default for WidgetState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            caption: String::new(),
            error_caption: default_error_caption(),
            owner: None,
            icon: None,
            system: Backend::platform_default(),
            labels: ButtonLabels::default(),
        }
    }
}

impl WidgetState {
    // ── Caption ───────────────────────────────────────────────────────────────

    /// Reports `""` while the caption is still unset.
    pub fn caption(&self) -> &str {
        if self.caption.is_empty() && self.error_caption == DEFAULT_ERROR_CAPTION {
            ""
        } else {
            &self.caption
        }
    }

    /// Sets the general caption and the error caption together.  An empty
    /// string resets both.
    pub fn set_caption(&mut self, caption: &str) {
        self.caption = caption.to_owned();
        self.error_caption = if caption.is_empty() {
            default_error_caption()
        } else {
            caption.to_owned()
        };
    }

    /// Resolve the window title for one dialog.
    ///
    /// Pickers use `explicit` when given; the other kinds ignore it and use
    /// the caption.  Both fall back to the kind's default title.
    pub(crate) fn title_for(&self, kind: DialogKind, explicit: &str) -> String {
        let chosen: &str = if kind.is_picker() {
            explicit
        } else if kind.uses_error_caption() {
            &self.error_caption
        } else {
            &self.caption
        };
        if chosen.is_empty() {
            kind.default_title().to_owned()
        } else {
            chosen.to_owned()
        }
    }

    // ── Owner ─────────────────────────────────────────────────────────────────

    pub fn owner(&self) -> Option<WindowHandle> {
        self.owner
    }

    pub fn set_owner(&mut self, owner: Option<WindowHandle>) {
        self.owner = owner.filter(|h| h.0 != 0);
    }

    // ── Icon ──────────────────────────────────────────────────────────────────

    /// The icon dialogs should show: the one set explicitly, else
    /// `assets/icon.png` under the working directory if it exists.
    pub fn icon(&self) -> Option<PathBuf> {
        if let Some(icon) = &self.icon {
            return Some(icon.clone());
        }
        fs::canonicalize(DEFAULT_ICON).ok().filter(|p| p.is_file())
    }

    /// Accepts only a path that resolves to an existing regular file; any
    /// other path is ignored and the previous icon kept.
    pub fn set_icon(&mut self, path: impl AsRef<Path>) {
        match fs::canonicalize(path.as_ref()) {
            Ok(abs) if abs.is_file() => self.icon = Some(abs),
            _ => log::debug!("ignoring icon {:?}: not a file", path.as_ref()),
        }
    }

    // ── Backend ───────────────────────────────────────────────────────────────

    pub fn system(&self) -> Backend {
        self.system
    }

    /// Select a backend by name.  Names this platform cannot serve are
    /// ignored.
    pub fn set_system(&mut self, name: &str) {
        match Backend::from_name(name) {
            Some(b) if Backend::available().contains(&b) => self.system = b,
            _ => log::debug!("ignoring unknown dialog system {name:?}"),
        }
    }

    // ── Button labels ─────────────────────────────────────────────────────────

    pub fn labels(&self) -> &ButtonLabels {
        &self.labels
    }

    pub fn button_name(&self, button: Button) -> &str {
        self.labels.get(button)
    }

    pub fn set_button_name(&mut self, button: Button, name: &str) {
        self.labels.set(button, name);
    }

    // ── Persistence ───────────────────────────────────────────────────────────

    /// Write the state as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Read a state file.  A backend the platform cannot serve falls back to
    /// the default, and an icon that no longer exists is dropped.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        let mut state: WidgetState = serde_json::from_slice(&data)?;
        if state.version != STATE_VERSION {
            return Err(DialogError::UnsupportedVersion(state.version));
        }
        if !Backend::available().contains(&state.system) {
            state.system = Backend::platform_default();
        }
        if state.icon.as_ref().is_some_and(|p| !p.is_file()) {
            state.icon = None;
        }
        Ok(state)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_caption_reads_empty() {
        let state = WidgetState::default();
        assert_eq!(state.caption(), "");
        assert_eq!(state.title_for(DialogKind::Error, ""), "Error");
        assert_eq!(state.caption(), "");
    }

    #[test]
    fn unset_caption_uses_kind_titles() {
        let state = WidgetState::default();
        assert_eq!(state.title_for(DialogKind::Message, ""), "Information");
        assert_eq!(state.title_for(DialogKind::Question, ""), "Question");
        assert_eq!(state.title_for(DialogKind::Attempt, ""), "Error");
        assert_eq!(state.title_for(DialogKind::StringPrompt, ""), "Input Query");
    }

    #[test]
    fn caption_sets_both_titles() {
        let mut state = WidgetState::default();
        state.set_caption("My Game");
        assert_eq!(state.caption(), "My Game");
        assert_eq!(state.title_for(DialogKind::Message, ""), "My Game");
        assert_eq!(state.title_for(DialogKind::Error, ""), "My Game");

        state.set_caption("");
        assert_eq!(state.caption(), "");
        assert_eq!(state.title_for(DialogKind::Error, ""), "Error");
    }

    #[test]
    fn pickers_prefer_explicit_title() {
        let mut state = WidgetState::default();
        state.set_caption("My Game");
        assert_eq!(state.title_for(DialogKind::OpenFile, "Load level"), "Load level");
        assert_eq!(state.title_for(DialogKind::SaveFile, ""), "Save As");
        assert_eq!(state.title_for(DialogKind::PickColor, ""), "Color");
    }

    #[test]
    fn icon_setter_ignores_missing_and_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let icon = dir.path().join("icon.png");
        std::fs::write(&icon, b"png").expect("write");

        let mut state = WidgetState::default();
        state.set_icon(&icon);
        let kept = state.icon().expect("icon set");
        assert!(kept.is_absolute());
        assert!(kept.ends_with("icon.png"));

        state.set_icon(dir.path().join("missing.png"));
        assert_eq!(state.icon(), Some(kept.clone()));
        state.set_icon(dir.path());
        assert_eq!(state.icon(), Some(kept));
    }

    #[test]
    fn unknown_system_is_ignored() {
        let mut state = WidgetState::default();
        let before = state.system();
        state.set_system("Motif");
        assert_eq!(state.system(), before);
        for b in Backend::available() {
            state.set_system(b.name());
            assert_eq!(state.system(), *b);
        }
    }

    #[test]
    fn foreign_platform_system_is_ignored() {
        let mut state = WidgetState::default();
        let foreign = [Backend::Win32, Backend::Cocoa, Backend::Zenity]
            .into_iter()
            .find(|b| !Backend::available().contains(b))
            .expect("at least one foreign backend");
        state.set_system(foreign.name());
        assert_eq!(state.system(), Backend::platform_default());
    }

    #[test]
    fn button_names_default_and_reset() {
        let mut state = WidgetState::default();
        assert_eq!(state.button_name(Button::Ok), "OK");
        state.set_button_name(Button::Ok, "Fine");
        assert_eq!(state.button_name(Button::Ok), "Fine");
        state.set_button_name(Button::Ok, "");
        assert_eq!(state.button_name(Button::Ok), "OK");
    }

    #[test]
    fn owner_zero_means_none() {
        let mut state = WidgetState::default();
        state.set_owner(Some(WindowHandle(0)));
        assert_eq!(state.owner(), None);
        state.set_owner(Some(WindowHandle(42)));
        assert_eq!(state.owner(), Some(WindowHandle(42)));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("state.json");
        let mut state = WidgetState::default();
        state.set_caption("Saved");
        state.set_button_name(Button::Retry, "Again");
        state.save(&path).expect("save");

        let loaded = WidgetState::load(&path).expect("load");
        assert_eq!(loaded, state);
        assert_eq!(loaded.button_name(Button::Retry), "Again");
    }

    /// Files written before labels and icons existed still load.
    #[test]
    fn missing_fields_take_defaults() {
        let json = r#"{"version":1,"caption":"Old"}"#;
        let state: WidgetState = serde_json::from_str(json).expect("deserialize old format");
        assert_eq!(state.caption(), "Old");
        assert_eq!(state.title_for(DialogKind::Error, ""), "Error");
        assert_eq!(state.system(), Backend::platform_default());
    }

    #[test]
    fn wrong_version_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"version":99}"#).expect("write");
        assert!(matches!(
            WidgetState::load(&path),
            Err(DialogError::UnsupportedVersion(99))
        ));
    }
}
