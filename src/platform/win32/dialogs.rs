// ── Common dialogs ─────────────────────────────────────────────────────────────
//
// Thin wrappers around the Win32 message box, common file dialogs, the shell
// folder picker and the color chooser.  Each returns `Ok(None)` when the user
// cancels and `Err` only when the API itself reports a failure.
//
// This is inside `platform::win32` so `unsafe` is permitted per crate policy.

#![allow(unsafe_code)]

use std::ffi::c_void;

use windows::{
    core::{w, HSTRING, PCWSTR, PWSTR},
    Win32::{
        Foundation::{COLORREF, HWND, LPARAM, WPARAM},
        System::Com::{
            CoCreateInstance, CoInitializeEx, CoTaskMemFree, CoUninitialize,
            CLSCTX_INPROC_SERVER, COINIT_APARTMENTTHREADED,
        },
        UI::{
            Controls::Dialogs::{
                ChooseColorW, CommDlgExtendedError, GetOpenFileNameW, GetSaveFileNameW,
                CC_ENABLEHOOK, CC_FULLOPEN, CC_RGBINIT, CHOOSECOLORW, COMMON_DLG_ERRORS,
                OFN_ALLOWMULTISELECT, OFN_EXPLORER, OFN_FILEMUSTEXIST, OFN_HIDEREADONLY,
                OFN_NOCHANGEDIR, OFN_OVERWRITEPROMPT, OFN_PATHMUSTEXIST, OPENFILENAMEW,
            },
            Shell::{
                FileOpenDialog, IFileOpenDialog, IShellItem, SHCreateItemFromParsingName,
                FOS_FORCEFILESYSTEM, FOS_NOCHANGEDIR, FOS_PICKFOLDERS, SIGDN_FILESYSPATH,
            },
            WindowsAndMessaging::{
                MessageBoxW, SetWindowTextW, IDABORT, IDCANCEL, IDIGNORE, IDNO, IDOK, IDRETRY,
                IDYES, MB_ABORTRETRYIGNORE, MB_ICONERROR, MB_ICONINFORMATION, MB_ICONQUESTION,
                MB_OK, MB_OKCANCEL, MB_RETRYCANCEL, MB_YESNO, MB_YESNOCANCEL, MESSAGEBOX_STYLE,
                WM_INITDIALOG,
            },
        },
    },
};

use super::{last_error, owner_hwnd, wide};
use crate::error::{DialogError, Result};
use crate::normalize::{fragments_from_wide, Button, RawSelection, Rgb};
use crate::request::{DialogKind, DialogRequest};

// ── Buffer size ───────────────────────────────────────────────────────────────

/// Maximum path length in `WCHAR`s, including the null terminator.
/// `MAX_PATH` (260) is too short for modern Windows paths and for multi-select
/// results; use 32 768, the documented maximum for `\\?\` extended paths.
const PATH_BUF_LEN: usize = 32_768;

/// `HRESULT_FROM_WIN32(ERROR_CANCELLED)`, returned by `IFileDialog::Show`.
const HRESULT_CANCELLED: i32 = 0x8007_04C7_u32 as i32;

// ── Message box ───────────────────────────────────────────────────────────────

/// Show a message box matching the request kind.  Button captions are the
/// system's own; custom labels do not apply here.
pub(super) fn message_box(request: &DialogRequest) -> Result<Option<Button>> {
    let style: MESSAGEBOX_STYLE = match request.kind {
        DialogKind::Message => MB_OK | MB_ICONINFORMATION,
        DialogKind::MessageCancelable => MB_OKCANCEL | MB_ICONQUESTION,
        DialogKind::Question => MB_YESNO | MB_ICONQUESTION,
        DialogKind::QuestionCancelable => MB_YESNOCANCEL | MB_ICONQUESTION,
        DialogKind::Attempt => MB_RETRYCANCEL | MB_ICONERROR,
        _ if request.abort_only => MB_OK | MB_ICONERROR,
        _ => MB_ABORTRETRYIGNORE | MB_ICONERROR,
    };
    let text = wide(&request.text);
    let title = wide(&request.title);

    // SAFETY: text and title are valid null-terminated UTF-16 strings that
    // remain allocated for the duration of the call.  A null owner is allowed.
    let pressed = unsafe {
        MessageBoxW(
            owner_hwnd(request),
            PCWSTR(text.as_ptr()),
            PCWSTR(title.as_ptr()),
            style,
        )
    };

    let button = match pressed {
        IDOK if request.abort_only => Button::Abort,
        IDOK => Button::Ok,
        IDCANCEL => Button::Cancel,
        IDABORT => Button::Abort,
        IDRETRY => Button::Retry,
        IDIGNORE => Button::Ignore,
        IDYES => Button::Yes,
        IDNO => Button::No,
        _ => return Err(last_error("MessageBoxW")),
    };
    Ok(Some(button))
}

// ── Open / save ───────────────────────────────────────────────────────────────

/// Show the standard "Open" dialog, allowing several files for `OpenFiles`.
pub(super) fn open_files(request: &DialogRequest) -> Result<Option<RawSelection>> {
    let mut flags = OFN_EXPLORER | OFN_FILEMUSTEXIST | OFN_HIDEREADONLY | OFN_NOCHANGEDIR;
    if request.kind == DialogKind::OpenFiles {
        flags |= OFN_ALLOWMULTISELECT;
    }
    let mut buf = file_buffer(&request.file_name);
    if !common_file_dialog(request, &mut buf, flags, false)? {
        return Ok(None);
    }
    Ok(Some(RawSelection::Fragments(fragments_from_wide(&buf))))
}

/// Show the standard "Save As" dialog.  Overwrites are confirmed by the
/// dialog itself.
pub(super) fn save_file(request: &DialogRequest) -> Result<Option<RawSelection>> {
    let flags = OFN_EXPLORER | OFN_OVERWRITEPROMPT | OFN_PATHMUSTEXIST | OFN_NOCHANGEDIR;
    let mut buf = file_buffer(&request.file_name);
    if !common_file_dialog(request, &mut buf, flags, true)? {
        return Ok(None);
    }
    Ok(Some(RawSelection::Single(string_from_buf(&buf))))
}

/// Shared `OPENFILENAMEW` setup.  Returns whether the user confirmed.
fn common_file_dialog(
    request: &DialogRequest,
    buf: &mut [u16],
    flags: windows::Win32::UI::Controls::Dialogs::OPEN_FILENAME_FLAGS,
    save: bool,
) -> Result<bool> {
    let filter = (!request.filter.is_empty()).then(|| request.filter.to_win32());
    let title = wide(&request.title);
    let initial_dir = request
        .initial_dir
        .as_ref()
        .map(|d| wide(&d.to_string_lossy()));

    let mut ofn = OPENFILENAMEW {
        lStructSize: std::mem::size_of::<OPENFILENAMEW>() as u32,
        hwndOwner: owner_hwnd(request),
        lpstrFilter: filter.as_ref().map_or(PCWSTR::null(), |f| PCWSTR(f.as_ptr())),
        lpstrFile: PWSTR(buf.as_mut_ptr()),
        nMaxFile: buf.len() as u32,
        lpstrTitle: PCWSTR(title.as_ptr()),
        lpstrInitialDir: initial_dir
            .as_ref()
            .map_or(PCWSTR::null(), |d| PCWSTR(d.as_ptr())),
        Flags: flags,
        ..Default::default()
    };

    // SAFETY: `ofn` is fully initialised; `buf`, `filter`, `title` and
    // `initial_dir` outlive this call.  The dialog reads and writes only
    // within the buffers we provided.
    let ok = unsafe {
        if save {
            GetSaveFileNameW(&mut ofn)
        } else {
            GetOpenFileNameW(&mut ofn)
        }
    };
    if ok.as_bool() {
        return Ok(true);
    }

    // SAFETY: reads the thread-local extended error of the call above.
    let code = unsafe { CommDlgExtendedError() };
    if code == COMMON_DLG_ERRORS(0) {
        Ok(false)
    } else {
        Err(DialogError::Win32 {
            function: if save {
                "GetSaveFileNameW"
            } else {
                "GetOpenFileNameW"
            },
            code: code.0,
        })
    }
}

// ── Folder picker ─────────────────────────────────────────────────────────────

/// Show the shell folder picker.  The returned path has no trailing
/// separator; the caller adds it.
pub(super) fn pick_folder(request: &DialogRequest) -> Result<Option<String>> {
    // SAFETY: initialises COM for this thread; balanced below only when this
    // call actually did the initialising.
    let hr = unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) };
    let result = pick_folder_com(request);
    if hr.is_ok() {
        // SAFETY: pairs with the successful CoInitializeEx above.
        unsafe { CoUninitialize() };
    }
    result
}

fn pick_folder_com(request: &DialogRequest) -> Result<Option<String>> {
    // SAFETY: COM is initialised on this thread; every interface pointer is
    // owned by a windows-crate smart wrapper that releases it on drop.
    unsafe {
        let dialog: IFileOpenDialog = CoCreateInstance(&FileOpenDialog, None, CLSCTX_INPROC_SERVER)?;
        let options = dialog.GetOptions()?;
        dialog.SetOptions(options | FOS_PICKFOLDERS | FOS_NOCHANGEDIR | FOS_FORCEFILESYSTEM)?;
        dialog.SetTitle(&HSTRING::from(request.title.as_str()))?;
        dialog.SetOkButtonLabel(w!("Select"))?;

        if let Some(dir) = &request.initial_dir {
            if let Ok(item) =
                SHCreateItemFromParsingName::<_, _, IShellItem>(&HSTRING::from(dir.as_os_str()), None)
            {
                let _ = dialog.SetFolder(&item);
            }
        }

        if let Err(e) = dialog.Show(owner_hwnd(request)) {
            if e.code().0 == HRESULT_CANCELLED {
                return Ok(None);
            }
            return Err(e.into());
        }

        let item = dialog.GetResult()?;
        let name = item.GetDisplayName(SIGDN_FILESYSPATH)?;
        let path = name.to_string().unwrap_or_default();
        CoTaskMemFree(Some(name.as_ptr() as *const c_void));
        Ok((!path.is_empty()).then_some(path))
    }
}

// ── Color picker ──────────────────────────────────────────────────────────────

/// Show the color chooser seeded with the request's default color.
pub(super) fn choose_color(request: &DialogRequest) -> Result<Option<Rgb>> {
    let title = wide(&request.title);
    let mut custom = [COLORREF(0x00FF_FFFF); 16];

    let mut cc = CHOOSECOLORW {
        lStructSize: std::mem::size_of::<CHOOSECOLORW>() as u32,
        hwndOwner: owner_hwnd(request),
        rgbResult: COLORREF(request.default_color().pack() as u32),
        lpCustColors: custom.as_mut_ptr(),
        Flags: CC_RGBINIT | CC_FULLOPEN | CC_ENABLEHOOK,
        lCustData: LPARAM(title.as_ptr() as isize),
        lpfnHook: Some(color_hook),
        ..Default::default()
    };

    // SAFETY: `cc` is fully initialised; `custom` and `title` outlive the
    // modal call, and the hook only reads `title` through lCustData.
    let ok = unsafe { ChooseColorW(&mut cc) };
    if ok.as_bool() {
        return Ok(Some(Rgb::from_packed(cc.rgbResult.0 as i32)));
    }

    // SAFETY: reads the thread-local extended error of the call above.
    let code = unsafe { CommDlgExtendedError() };
    if code == COMMON_DLG_ERRORS(0) {
        Ok(None)
    } else {
        Err(DialogError::Win32 {
            function: "ChooseColorW",
            code: code.0,
        })
    }
}

/// Applies the title; the color dialog has no field for one.
unsafe extern "system" fn color_hook(hwnd: HWND, msg: u32, _: WPARAM, lparam: LPARAM) -> usize {
    if msg == WM_INITDIALOG {
        // SAFETY: for WM_INITDIALOG lparam points at the CHOOSECOLORW passed
        // to ChooseColorW, whose lCustData is our null-terminated title.
        let cc = &*(lparam.0 as *const CHOOSECOLORW);
        let title = PCWSTR(cc.lCustData.0 as *const u16);
        let _ = SetWindowTextW(hwnd, title);
    }
    // Zero lets the dialog's default processing run.
    0
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// A `PATH_BUF_LEN` buffer pre-filled with `name`.
fn file_buffer(name: &str) -> Vec<u16> {
    name.encode_utf16()
        .take(PATH_BUF_LEN - 1)
        .chain(std::iter::repeat(0))
        .take(PATH_BUF_LEN)
        .collect()
}

/// Convert a null-terminated UTF-16 buffer to a `String`.
fn string_from_buf(buf: &[u16]) -> String {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..len])
}
