// ── Input box ─────────────────────────────────────────────────────────────────
//
// Win32 has no stock text-entry dialog, so one is assembled at runtime from an
// in-memory dialog template: a prompt label, an edit control (masked for
// password prompts) and OK / Cancel.  `DialogBoxIndirectParamW` runs the modal
// loop and disables the owner while it is up.
//
// The template is built as plain little-endian words, so no struct is ever
// reinterpreted as bytes.

#![allow(unsafe_code)]

use std::cell::RefCell;

use windows::{
    core::PCWSTR,
    Win32::{
        Foundation::{HINSTANCE, HWND, LPARAM, WPARAM},
        System::LibraryLoader::GetModuleHandleW,
        UI::{
            Controls::EM_SETSEL,
            WindowsAndMessaging::{
                DialogBoxIndirectParamW, EndDialog, GetDlgItemTextW, SendDlgItemMessageW,
                SetDlgItemTextW, BS_DEFPUSHBUTTON, BS_PUSHBUTTON, DLGTEMPLATE, DS_CENTER,
                DS_MODALFRAME, DS_SETFONT, ES_AUTOHSCROLL, ES_PASSWORD, IDCANCEL, IDOK,
                WM_COMMAND, WM_GETTEXTLENGTH, WM_INITDIALOG, WS_BORDER, WS_CAPTION,
                WS_CHILD, WS_POPUP, WS_SYSMENU, WS_TABSTOP, WS_VISIBLE,
            },
        },
    },
};

use super::{owner_hwnd, wide};
use crate::error::{DialogError, Result};
use crate::request::DialogRequest;

// ── Layout (dialog units) ─────────────────────────────────────────────────────

const ID_PROMPT: i32 = 100;
const ID_EDIT: i32 = 101;

const WIDTH: i16 = 240;
const MARGIN: i16 = 7;
const LINE_HEIGHT: i16 = 9;
const EDIT_HEIGHT: i16 = 12;
const BUTTON_WIDTH: i16 = 50;
const BUTTON_HEIGHT: i16 = 14;
const GAP: i16 = 4;

/// Predefined window-class atoms for dialog items.
const CLASS_BUTTON: u16 = 0x0080;
const CLASS_EDIT: u16 = 0x0081;
const CLASS_STATIC: u16 = 0x0082;

// ── Dialog state ──────────────────────────────────────────────────────────────

struct InputState {
    prompt: Vec<u16>,
    initial: Vec<u16>,
    result: Option<String>,
}

thread_local! {
    // The dialog is modal on this thread, so one slot is enough.
    static ACTIVE: RefCell<Option<InputState>> = const { RefCell::new(None) };
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Show the input box.  Returns the entered text, or `None` on cancel.
pub(super) fn input_box(request: &DialogRequest) -> Result<Option<String>> {
    let prompt = request.text.replace("\r\n", "\n").replace('\n', "\r\n");
    let template = build_template(&request.title, line_count(&prompt), request.kind.is_masked());

    ACTIVE.with(|slot| {
        *slot.borrow_mut() = Some(InputState {
            prompt: wide(&prompt),
            initial: wide(&request.default_text()),
            result: None,
        })
    });

    // SAFETY: GetModuleHandleW(None) returns the host executable's module,
    // which stays valid for the process lifetime.
    let hmodule = unsafe { GetModuleHandleW(None) }.map_err(DialogError::from)?;
    let hinstance = HINSTANCE(hmodule.0);

    // SAFETY: `template` is a DWORD-aligned, well-formed DLGTEMPLATE followed
    // by its items and outlives the modal call.  `input_proc` only touches
    // the thread-local state set above.
    let ret = unsafe {
        DialogBoxIndirectParamW(
            hinstance,
            template.as_ptr() as *const DLGTEMPLATE,
            owner_hwnd(request),
            Some(input_proc),
            LPARAM(0),
        )
    };

    let state = ACTIVE.with(|slot| slot.borrow_mut().take());
    if ret == -1 {
        return Err(super::last_error("DialogBoxIndirectParamW"));
    }
    Ok(state.and_then(|s| s.result))
}

// ── Dialog procedure ──────────────────────────────────────────────────────────

// SAFETY: registered through DialogBoxIndirectParamW; Windows guarantees the
// handle and message parameters are valid for the duration of each call.
unsafe extern "system" fn input_proc(hdlg: HWND, msg: u32, wparam: WPARAM, _: LPARAM) -> isize {
    match msg {
        WM_INITDIALOG => {
            ACTIVE.with(|slot| {
                if let Some(state) = slot.borrow().as_ref() {
                    let _ = SetDlgItemTextW(hdlg, ID_PROMPT, PCWSTR(state.prompt.as_ptr()));
                    let _ = SetDlgItemTextW(hdlg, ID_EDIT, PCWSTR(state.initial.as_ptr()));
                }
            });
            SendDlgItemMessageW(hdlg, ID_EDIT, EM_SETSEL, WPARAM(0), LPARAM(-1));
            // Non-zero: let the system focus the first tab stop (the edit).
            1
        }

        WM_COMMAND => {
            let id = (wparam.0 & 0xFFFF) as i32;
            if id == IDOK.0 {
                let text = edit_text(hdlg);
                ACTIVE.with(|slot| {
                    if let Some(state) = slot.borrow_mut().as_mut() {
                        state.result = Some(text);
                    }
                });
                let _ = EndDialog(hdlg, IDOK.0 as isize);
                1
            } else if id == IDCANCEL.0 {
                let _ = EndDialog(hdlg, IDCANCEL.0 as isize);
                1
            } else {
                0
            }
        }

        _ => 0,
    }
}

/// Read the current contents of the edit control.
unsafe fn edit_text(hdlg: HWND) -> String {
    let len = SendDlgItemMessageW(hdlg, ID_EDIT, WM_GETTEXTLENGTH, WPARAM(0), LPARAM(0)).0;
    let mut buf = vec![0u16; usize::try_from(len).unwrap_or(0) + 1];
    let copied = GetDlgItemTextW(hdlg, ID_EDIT, &mut buf) as usize;
    String::from_utf16_lossy(&buf[..copied.min(buf.len())])
}

// ── Template ──────────────────────────────────────────────────────────────────

fn line_count(text: &str) -> i16 {
    i16::try_from(text.lines().count().clamp(1, 20)).unwrap_or(1)
}

/// Little-endian word stream for a dialog template.
#[derive(Default)]
struct Template {
    words: Vec<u16>,
}

impl Template {
    fn u16(&mut self, v: u16) {
        self.words.push(v);
    }

    fn i16(&mut self, v: i16) {
        self.words.push(v as u16);
    }

    fn u32(&mut self, v: u32) {
        self.words.push((v & 0xFFFF) as u16);
        self.words.push((v >> 16) as u16);
    }

    fn str(&mut self, s: &str) {
        self.words.extend(s.encode_utf16());
        self.words.push(0);
    }

    fn align_dword(&mut self) {
        if self.words.len() % 2 != 0 {
            self.words.push(0);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn item(&mut self, style: u32, x: i16, y: i16, cx: i16, cy: i16, id: i32, class: u16, text: &str) {
        self.align_dword();
        self.u32(style);
        self.u32(0); // extended style
        self.i16(x);
        self.i16(y);
        self.i16(cx);
        self.i16(cy);
        self.u16(id as u16);
        self.u16(0xFFFF);
        self.u16(class);
        self.str(text);
        self.u16(0); // no creation data
    }

    /// Pack into DWORDs so the buffer has the alignment the API requires.
    fn into_dwords(mut self) -> Vec<u32> {
        self.align_dword();
        self.words
            .chunks_exact(2)
            .map(|w| u32::from(w[0]) | u32::from(w[1]) << 16)
            .collect()
    }
}

fn build_template(title: &str, lines: i16, masked: bool) -> Vec<u32> {
    let prompt_height = lines * LINE_HEIGHT;
    let edit_y = MARGIN + prompt_height + GAP;
    let button_y = edit_y + EDIT_HEIGHT + MARGIN;
    let height = button_y + BUTTON_HEIGHT + MARGIN;
    let inner = WIDTH - 2 * MARGIN;

    let mut t = Template::default();

    // DLGTEMPLATE header.
    t.u32(
        (DS_MODALFRAME | DS_CENTER | DS_SETFONT) as u32
            | WS_POPUP.0
            | WS_CAPTION.0
            | WS_SYSMENU.0,
    );
    t.u32(0);
    t.u16(4); // item count
    t.i16(0);
    t.i16(0);
    t.i16(WIDTH);
    t.i16(height);
    t.u16(0); // no menu
    t.u16(0); // default dialog class
    t.str(title);
    t.u16(8); // point size
    t.str("MS Shell Dlg");

    let child = WS_CHILD.0 | WS_VISIBLE.0;
    t.item(child, MARGIN, MARGIN, inner, prompt_height, ID_PROMPT, CLASS_STATIC, "");

    let mut edit_style = child | WS_BORDER.0 | WS_TABSTOP.0 | ES_AUTOHSCROLL as u32;
    if masked {
        edit_style |= ES_PASSWORD as u32;
    }
    t.item(edit_style, MARGIN, edit_y, inner, EDIT_HEIGHT, ID_EDIT, CLASS_EDIT, "");

    let cancel_x = WIDTH - MARGIN - BUTTON_WIDTH;
    let ok_x = cancel_x - GAP - BUTTON_WIDTH;
    t.item(
        child | WS_TABSTOP.0 | BS_DEFPUSHBUTTON as u32,
        ok_x,
        button_y,
        BUTTON_WIDTH,
        BUTTON_HEIGHT,
        IDOK.0,
        CLASS_BUTTON,
        "OK",
    );
    t.item(
        child | WS_TABSTOP.0 | BS_PUSHBUTTON as u32,
        cancel_x,
        button_y,
        BUTTON_WIDTH,
        BUTTON_HEIGHT,
        IDCANCEL.0,
        CLASS_BUTTON,
        "Cancel",
    );

    t.into_dwords()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
