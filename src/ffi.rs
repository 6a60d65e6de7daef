// ── C ABI surface ─────────────────────────────────────────────────────────────
//
// Exports every dialog operation for runtimes that load this library as a
// shared object.  Conventions:
//   • numbers are `f64`;
//   • strings are NUL-terminated UTF-8; a returned pointer stays valid until
//     the next string-returning call on the same thread;
//   • owner handles are opaque `void *`.
//
// The configuration lives in one process-wide `Dialogs` behind a mutex.  Each
// call clones it and drops the lock before any dialog appears, so a widget
// setter racing a dialog being prepared is the host's problem to order.
//
// # Safety
//
// Every `char *` argument must be null or point to a NUL-terminated string
// that stays alive for the duration of the call.

#![allow(unsafe_code)]
#![allow(clippy::missing_safety_doc)]

use std::{
    cell::RefCell,
    ffi::{c_char, c_int, c_void, CStr, CString},
    sync::{Arc, LazyLock},
};

use parking_lot::{Mutex, RwLock};

use crate::dialogs::Dialogs;
use crate::dispatch::{DialogOp, Dispatcher, EventSink, FileArgs, Mode, ResultRecord};
use crate::normalize::Button;
use crate::request::WindowHandle;

/// Event type the host expects for dialog completions.
pub const ASYNC_EVENT_TYPE: c_int = 63;

static DIALOGS: LazyLock<Mutex<Dialogs>> = LazyLock::new(|| Mutex::new(Dialogs::new()));

static DISPATCHER: LazyLock<Dispatcher> =
    LazyLock::new(|| Dispatcher::with_sink(Mode::Serialized, Arc::new(HostSink)));

thread_local! {
    static RETURNED: RefCell<CString> = RefCell::new(CString::default());
}

// ── Marshalling ───────────────────────────────────────────────────────────────

/// Copy a caller string.  Null reads as "".
unsafe fn arg(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    // SAFETY: non-null and NUL-terminated per the module contract.
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// Park `s` in this thread's return slot and hand out a pointer to it.
fn ret(s: impl Into<String>) -> *const c_char {
    let mut bytes = s.into().into_bytes();
    bytes.retain(|&b| b != 0);
    let owned = CString::new(bytes).unwrap_or_default();
    RETURNED.with(|slot| {
        let mut slot = slot.borrow_mut();
        *slot = owned;
        slot.as_ptr()
    })
}

fn snapshot() -> Dialogs {
    DIALOGS.lock().clone()
}

fn submit(op: DialogOp) -> f64 {
    let dialogs = snapshot();
    f64::from(DISPATCHER.submit(&dialogs, op))
}

unsafe fn file_args(
    filter: *const c_char,
    fname: *const c_char,
    dir: *const c_char,
    title: *const c_char,
) -> FileArgs {
    // SAFETY: forwarded caller pointers.
    unsafe {
        FileArgs {
            filter: arg(filter),
            fname: arg(fname),
            dir: arg(dir),
            title: arg(title),
        }
    }
}

fn status(s: i32) -> f64 {
    f64::from(s)
}

// ── Messages ──────────────────────────────────────────────────────────────────

#[no_mangle]
pub unsafe extern "C" fn show_message(text: *const c_char) -> f64 {
    status(snapshot().show_message(&arg(text)))
}

#[no_mangle]
pub unsafe extern "C" fn show_message_async(text: *const c_char) -> f64 {
    submit(DialogOp::Message(arg(text)))
}

#[no_mangle]
pub unsafe extern "C" fn show_message_cancelable(text: *const c_char) -> f64 {
    status(snapshot().show_message_cancelable(&arg(text)))
}

#[no_mangle]
pub unsafe extern "C" fn show_message_cancelable_async(text: *const c_char) -> f64 {
    submit(DialogOp::MessageCancelable(arg(text)))
}

#[no_mangle]
pub unsafe extern "C" fn show_question(text: *const c_char) -> f64 {
    status(snapshot().show_question(&arg(text)))
}

#[no_mangle]
pub unsafe extern "C" fn show_question_async(text: *const c_char) -> f64 {
    submit(DialogOp::Question(arg(text)))
}

#[no_mangle]
pub unsafe extern "C" fn show_question_cancelable(text: *const c_char) -> f64 {
    status(snapshot().show_question_cancelable(&arg(text)))
}

#[no_mangle]
pub unsafe extern "C" fn show_question_cancelable_async(text: *const c_char) -> f64 {
    submit(DialogOp::QuestionCancelable(arg(text)))
}

#[no_mangle]
pub unsafe extern "C" fn show_attempt(text: *const c_char) -> f64 {
    status(snapshot().show_attempt(&arg(text)))
}

#[no_mangle]
pub unsafe extern "C" fn show_attempt_async(text: *const c_char) -> f64 {
    submit(DialogOp::Attempt(arg(text)))
}

#[no_mangle]
pub unsafe extern "C" fn show_error(text: *const c_char, abort: f64) -> f64 {
    status(snapshot().show_error(&arg(text), abort != 0.0))
}

#[no_mangle]
pub unsafe extern "C" fn show_error_async(text: *const c_char, abort: f64) -> f64 {
    submit(DialogOp::Error {
        text: arg(text),
        abort: abort != 0.0,
    })
}

// ── Prompts ───────────────────────────────────────────────────────────────────

#[no_mangle]
pub unsafe extern "C" fn get_string(prompt: *const c_char, def: *const c_char) -> *const c_char {
    ret(snapshot().get_string(&arg(prompt), &arg(def)))
}

#[no_mangle]
pub unsafe extern "C" fn get_string_async(prompt: *const c_char, def: *const c_char) -> f64 {
    submit(DialogOp::GetString {
        prompt: arg(prompt),
        default: arg(def),
    })
}

#[no_mangle]
pub unsafe extern "C" fn get_password(prompt: *const c_char, def: *const c_char) -> *const c_char {
    ret(snapshot().get_password(&arg(prompt), &arg(def)))
}

#[no_mangle]
pub unsafe extern "C" fn get_password_async(prompt: *const c_char, def: *const c_char) -> f64 {
    submit(DialogOp::GetPassword {
        prompt: arg(prompt),
        default: arg(def),
    })
}

#[no_mangle]
pub unsafe extern "C" fn get_integer(prompt: *const c_char, def: f64) -> f64 {
    snapshot().get_integer(&arg(prompt), def)
}

#[no_mangle]
pub unsafe extern "C" fn get_integer_async(prompt: *const c_char, def: f64) -> f64 {
    submit(DialogOp::GetInteger {
        prompt: arg(prompt),
        default: def,
    })
}

#[no_mangle]
pub unsafe extern "C" fn get_passcode(prompt: *const c_char, def: f64) -> f64 {
    snapshot().get_passcode(&arg(prompt), def)
}

#[no_mangle]
pub unsafe extern "C" fn get_passcode_async(prompt: *const c_char, def: f64) -> f64 {
    submit(DialogOp::GetPasscode {
        prompt: arg(prompt),
        default: def,
    })
}

// ── Files ─────────────────────────────────────────────────────────────────────

#[no_mangle]
pub unsafe extern "C" fn get_open_filename(
    filter: *const c_char,
    fname: *const c_char,
) -> *const c_char {
    ret(snapshot().get_open_filename(&arg(filter), &arg(fname)))
}

#[no_mangle]
pub unsafe extern "C" fn get_open_filename_async(filter: *const c_char, fname: *const c_char) -> f64 {
    submit(DialogOp::OpenFilename(file_args(
        filter,
        fname,
        std::ptr::null(),
        std::ptr::null(),
    )))
}

#[no_mangle]
pub unsafe extern "C" fn get_open_filename_ext(
    filter: *const c_char,
    fname: *const c_char,
    dir: *const c_char,
    title: *const c_char,
) -> *const c_char {
    let a = file_args(filter, fname, dir, title);
    ret(snapshot().get_open_filename_ext(&a.filter, &a.fname, &a.dir, &a.title))
}

#[no_mangle]
pub unsafe extern "C" fn get_open_filename_ext_async(
    filter: *const c_char,
    fname: *const c_char,
    dir: *const c_char,
    title: *const c_char,
) -> f64 {
    submit(DialogOp::OpenFilename(file_args(filter, fname, dir, title)))
}

#[no_mangle]
pub unsafe extern "C" fn get_open_filenames(
    filter: *const c_char,
    fname: *const c_char,
) -> *const c_char {
    ret(snapshot().get_open_filenames(&arg(filter), &arg(fname)))
}

#[no_mangle]
pub unsafe extern "C" fn get_open_filenames_async(
    filter: *const c_char,
    fname: *const c_char,
) -> f64 {
    submit(DialogOp::OpenFilenames(file_args(
        filter,
        fname,
        std::ptr::null(),
        std::ptr::null(),
    )))
}

#[no_mangle]
pub unsafe extern "C" fn get_open_filenames_ext(
    filter: *const c_char,
    fname: *const c_char,
    dir: *const c_char,
    title: *const c_char,
) -> *const c_char {
    let a = file_args(filter, fname, dir, title);
    ret(snapshot().get_open_filenames_ext(&a.filter, &a.fname, &a.dir, &a.title))
}

#[no_mangle]
pub unsafe extern "C" fn get_open_filenames_ext_async(
    filter: *const c_char,
    fname: *const c_char,
    dir: *const c_char,
    title: *const c_char,
) -> f64 {
    submit(DialogOp::OpenFilenames(file_args(filter, fname, dir, title)))
}

#[no_mangle]
pub unsafe extern "C" fn get_save_filename(
    filter: *const c_char,
    fname: *const c_char,
) -> *const c_char {
    ret(snapshot().get_save_filename(&arg(filter), &arg(fname)))
}

#[no_mangle]
pub unsafe extern "C" fn get_save_filename_async(filter: *const c_char, fname: *const c_char) -> f64 {
    submit(DialogOp::SaveFilename(file_args(
        filter,
        fname,
        std::ptr::null(),
        std::ptr::null(),
    )))
}

#[no_mangle]
pub unsafe extern "C" fn get_save_filename_ext(
    filter: *const c_char,
    fname: *const c_char,
    dir: *const c_char,
    title: *const c_char,
) -> *const c_char {
    let a = file_args(filter, fname, dir, title);
    ret(snapshot().get_save_filename_ext(&a.filter, &a.fname, &a.dir, &a.title))
}

#[no_mangle]
pub unsafe extern "C" fn get_save_filename_ext_async(
    filter: *const c_char,
    fname: *const c_char,
    dir: *const c_char,
    title: *const c_char,
) -> f64 {
    submit(DialogOp::SaveFilename(file_args(filter, fname, dir, title)))
}

// ── Directories ───────────────────────────────────────────────────────────────

#[no_mangle]
pub unsafe extern "C" fn get_directory(dname: *const c_char) -> *const c_char {
    ret(snapshot().get_directory(&arg(dname)))
}

#[no_mangle]
pub unsafe extern "C" fn get_directory_async(dname: *const c_char) -> f64 {
    submit(DialogOp::Directory(arg(dname)))
}

#[no_mangle]
pub unsafe extern "C" fn get_directory_alt(capt: *const c_char, root: *const c_char) -> *const c_char {
    ret(snapshot().get_directory_alt(&arg(capt), &arg(root)))
}

#[no_mangle]
pub unsafe extern "C" fn get_directory_alt_async(capt: *const c_char, root: *const c_char) -> f64 {
    submit(DialogOp::DirectoryAlt {
        caption: arg(capt),
        root: arg(root),
    })
}

// ── Colors ────────────────────────────────────────────────────────────────────

#[no_mangle]
pub extern "C" fn get_color(defcol: f64) -> f64 {
    status(snapshot().get_color(defcol as i32))
}

#[no_mangle]
pub extern "C" fn get_color_async(defcol: f64) -> f64 {
    submit(DialogOp::Color {
        default: defcol as i32,
        title: String::new(),
    })
}

#[no_mangle]
pub unsafe extern "C" fn get_color_ext(defcol: f64, title: *const c_char) -> f64 {
    status(snapshot().get_color_ext(defcol as i32, &arg(title)))
}

#[no_mangle]
pub unsafe extern "C" fn get_color_ext_async(defcol: f64, title: *const c_char) -> f64 {
    submit(DialogOp::Color {
        default: defcol as i32,
        title: arg(title),
    })
}

// ── Widget state ──────────────────────────────────────────────────────────────

#[no_mangle]
pub extern "C" fn widget_get_caption() -> *const c_char {
    ret(DIALOGS.lock().widget_get_caption())
}

#[no_mangle]
pub unsafe extern "C" fn widget_set_caption(caption: *const c_char) -> f64 {
    DIALOGS.lock().widget_set_caption(&arg(caption));
    0.0
}

#[no_mangle]
pub extern "C" fn widget_get_owner() -> *mut c_void {
    match DIALOGS.lock().widget_get_owner() {
        Some(WindowHandle(raw)) => raw as *mut c_void,
        None => std::ptr::null_mut(),
    }
}

#[no_mangle]
pub extern "C" fn widget_set_owner(hwnd: *mut c_void) -> f64 {
    let handle = (!hwnd.is_null()).then(|| WindowHandle(hwnd as usize));
    DIALOGS.lock().widget_set_owner(handle);
    0.0
}

#[no_mangle]
pub extern "C" fn widget_get_icon() -> *const c_char {
    ret(DIALOGS.lock().widget_get_icon())
}

#[no_mangle]
pub unsafe extern "C" fn widget_set_icon(icon: *const c_char) -> f64 {
    DIALOGS.lock().widget_set_icon(&arg(icon));
    0.0
}

#[no_mangle]
pub extern "C" fn widget_get_system() -> *const c_char {
    ret(DIALOGS.lock().widget_get_system())
}

#[no_mangle]
pub unsafe extern "C" fn widget_set_system(name: *const c_char) -> f64 {
    DIALOGS.lock().widget_set_system(&arg(name));
    0.0
}

/// Ids: 0 Abort, 1 Ignore, 2 OK, 3 Cancel, 4 Yes, 5 No, 6 Retry.  Unknown
/// ids read as "".
#[no_mangle]
pub extern "C" fn widget_get_button_name(id: f64) -> *const c_char {
    match Button::from_index(id as i32) {
        Some(b) => ret(DIALOGS.lock().widget_get_button_name(b)),
        None => ret(""),
    }
}

#[no_mangle]
pub unsafe extern "C" fn widget_set_button_name(id: f64, name: *const c_char) -> f64 {
    if let Some(b) = Button::from_index(id as i32) {
        DIALOGS.lock().widget_set_button_name(b, &arg(name));
    }
    0.0
}

// ── Host callbacks ────────────────────────────────────────────────────────────

type CreateAsyncEvent = unsafe extern "C" fn(map: c_int, event_type: c_int);
type CreateMap = unsafe extern "C" fn(count: c_int, ...) -> c_int;
type MapAddDouble = unsafe extern "C" fn(map: c_int, key: *const c_char, value: f64) -> bool;
type MapAddString =
    unsafe extern "C" fn(map: c_int, key: *const c_char, value: *const c_char) -> bool;

#[derive(Clone, Copy)]
struct HostCallbacks {
    create_event: CreateAsyncEvent,
    create_map: CreateMap,
    add_double: MapAddDouble,
    add_string: MapAddString,
}

static HOST: RwLock<Option<HostCallbacks>> = parking_lot::const_rwlock(None);

/// Install the host's event functions: create-async-event, create-map,
/// map-add-double and map-add-string, in that order.  Any null pointer
/// leaves the previous registration in place.
#[no_mangle]
pub unsafe extern "C" fn RegisterCallbacks(
    create_event: *mut c_void,
    create_map: *mut c_void,
    add_double: *mut c_void,
    add_string: *mut c_void,
) {
    if [create_event, create_map, add_double, add_string]
        .iter()
        .any(|p| p.is_null())
    {
        log::warn!("RegisterCallbacks: null callback; keeping previous registration");
        return;
    }
    // SAFETY: the host passes function pointers with the signatures above.
    let callbacks = unsafe {
        HostCallbacks {
            create_event: std::mem::transmute::<*mut c_void, CreateAsyncEvent>(create_event),
            create_map: std::mem::transmute::<*mut c_void, CreateMap>(create_map),
            add_double: std::mem::transmute::<*mut c_void, MapAddDouble>(add_double),
            add_string: std::mem::transmute::<*mut c_void, MapAddString>(add_string),
        }
    };
    *HOST.write() = Some(callbacks);
    log::debug!("host callbacks registered");
}

/// One entry of the map handed to the host.
#[derive(Debug, Clone, PartialEq)]
enum MapValue {
    Double(f64),
    Text(CString),
}

/// The map entries for `record`, in insertion order: `id`, `status`, then
/// `result` or `value` when present.
fn map_entries(record: ResultRecord) -> Vec<(&'static CStr, MapValue)> {
    let mut entries = vec![
        (c"id", MapValue::Double(f64::from(record.id))),
        (c"status", MapValue::Double(f64::from(record.status))),
    ];
    if let Some(text) = record.result {
        let text = CString::new(text.replace('\0', "")).unwrap_or_default();
        entries.push((c"result", MapValue::Text(text)));
    }
    if let Some(value) = record.value {
        entries.push((c"value", MapValue::Double(value)));
    }
    entries
}

/// Delivers records to the host as key/value maps.
struct HostSink;

impl EventSink for HostSink {
    fn deliver(&self, record: ResultRecord) {
        let Some(host) = *HOST.read() else {
            log::warn!("dialog job {} finished before RegisterCallbacks", record.id);
            return;
        };
        let entries = map_entries(record);

        // SAFETY: callbacks were registered by the host, keys and values are
        // NUL-terminated and outlive each call.
        unsafe {
            let map = (host.create_map)(0);
            for (key, value) in &entries {
                match value {
                    MapValue::Double(v) => (host.add_double)(map, key.as_ptr(), *v),
                    MapValue::Text(t) => (host.add_string)(map, key.as_ptr(), t.as_ptr()),
                };
            }
            (host.create_event)(map, ASYNC_EVENT_TYPE);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
