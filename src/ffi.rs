//! C-ABI bindings for hosts that are not written in Rust.
//!
//! Strings are UTF-8 `const char*`; malformed UTF-8 is shown lossily rather
//! than rejected.  `native_progress_show` returns an opaque handle or null.
//! Every function must be called on the thread that created the window,
//! and that thread must pump messages for the buttons to work.

#![allow(unsafe_code)]

use std::ffi::{c_char, c_void, CStr};

use crate::{
    platform::win32::window::{ButtonCallback, ButtonRow, ProgressWindow},
    text::Wide,
};

/// Button-press callback: receives the 0-based index of the pressed button.
pub type ButtonPressedFn = extern "C" fn(i32);

/// Create and show a progress window.  Returns null on failure.
///
/// # Safety
/// `title` and `message` must be null or valid C strings.  `button_labels`
/// must point to `button_count` entries, each null or a valid C string.
#[no_mangle]
pub unsafe extern "C" fn native_progress_show(
    title: *const c_char,
    message: *const c_char,
    button_labels: *const *const c_char,
    button_count: usize,
    callback: Option<ButtonPressedFn>,
) -> *mut c_void {
    if title.is_null() {
        return std::ptr::null_mut();
    }
    let title = wide(title);
    let message = wide(message);
    let row = ButtonRow::from_wide(labels(button_labels, button_count), on_press(callback));

    match ProgressWindow::create_wide(&title, &message, row) {
        Ok(window) => Box::into_raw(Box::new(window)).cast(),
        Err(e) => {
            tracing::error!(error = %e, "progress window not created");
            std::ptr::null_mut()
        }
    }
}

/// Set the progress, optionally the message, and optionally the buttons.
/// A null `handle` is a no-op.  With `update_buttons` false the label list
/// and callback are ignored.
///
/// # Safety
/// `handle` must be null or a live handle from `native_progress_show`.
/// String arguments as for `native_progress_show`; `message` may be null.
#[no_mangle]
pub unsafe extern "C" fn native_progress_update(
    handle: *mut c_void,
    progress: i32,
    message: *const c_char,
    update_buttons: bool,
    button_labels: *const *const c_char,
    button_count: usize,
    callback: Option<ButtonPressedFn>,
) {
    // SAFETY: caller guarantees handle came from native_progress_show and
    // has not been closed.
    let Some(window) = handle.cast::<ProgressWindow>().as_ref() else {
        return;
    };

    window.set_progress(progress);
    if !message.is_null() {
        window.set_message_wide(&wide(message));
    }
    if update_buttons {
        window.replace_buttons(ButtonRow::from_wide(
            labels(button_labels, button_count),
            on_press(callback),
        ));
    }
}

/// Destroy the window.  A null `handle` is a no-op; the handle is dead
/// afterwards.
///
/// # Safety
/// `handle` must be null or a live handle from `native_progress_show`.
#[no_mangle]
pub unsafe extern "C" fn native_progress_close(handle: *mut c_void) {
    if handle.is_null() {
        return;
    }
    // SAFETY: handle was produced by Box::into_raw in native_progress_show
    // and ownership returns here exactly once.
    Box::from_raw(handle.cast::<ProgressWindow>()).close();
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// # Safety
/// `s` must be null or a valid C string.
unsafe fn wide(s: *const c_char) -> Wide {
    if s.is_null() {
        return Wide::from("");
    }
    Wide::from_bytes(CStr::from_ptr(s).to_bytes())
}

/// # Safety
/// `labels` must point to `count` entries, each null or a valid C string.
unsafe fn labels(labels: *const *const c_char, count: usize) -> Vec<Wide> {
    if labels.is_null() || count == 0 {
        return Vec::new();
    }
    std::slice::from_raw_parts(labels, count)
        .iter()
        .map(|&s| wide(s))
        .collect()
}

fn on_press(callback: Option<ButtonPressedFn>) -> ButtonCallback {
    match callback {
        Some(callback) => Box::new(move |index| {
            callback(i32::try_from(index).unwrap_or(i32::MAX));
        }),
        None => Box::new(|_| {}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicI32, Ordering};

    static LAST_PRESSED: AtomicI32 = AtomicI32::new(-1);
    static KEPT_PRESSED: AtomicI32 = AtomicI32::new(-1);
    static STRAY_CALLS: AtomicI32 = AtomicI32::new(0);

    extern "C" fn record(index: i32) {
        LAST_PRESSED.store(index, Ordering::SeqCst);
    }

    extern "C" fn record_kept(index: i32) {
        KEPT_PRESSED.store(index, Ordering::SeqCst);
    }

    extern "C" fn record_stray(_: i32) {
        STRAY_CALLS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn null_handle_is_ignored() {
        unsafe {
            native_progress_update(
                std::ptr::null_mut(),
                10,
                std::ptr::null(),
                true,
                std::ptr::null(),
                0,
                None,
            );
            native_progress_close(std::ptr::null_mut());
        }
    }

    #[test]
    fn null_title_yields_null_handle() {
        let handle = unsafe {
            native_progress_show(std::ptr::null(), c"m".as_ptr(), std::ptr::null(), 0, None)
        };
        assert!(handle.is_null());
    }

    #[test]
    fn show_update_close() {
        let labels = [c"Cancel".as_ptr(), c"Done".as_ptr()];
        unsafe {
            let handle = native_progress_show(
                c"Hi! ハロー".as_ptr(),
                c"Deleting files".as_ptr(),
                labels.as_ptr(),
                labels.len(),
                Some(record),
            );
            assert!(!handle.is_null());

            let retry = [c"Retry".as_ptr()];
            native_progress_update(
                handle,
                50,
                c"caf\xE9".as_ptr(),
                true,
                retry.as_ptr(),
                1,
                Some(record),
            );

            let window = &*handle.cast::<ProgressWindow>();
            assert!(window.is_open());
            ProgressWindow::press_for_tests(window.hwnd_for_tests(), 0);
            assert_eq!(LAST_PRESSED.load(Ordering::SeqCst), 0);

            native_progress_close(handle);
        }
    }

    #[test]
    fn buttons_untouched_unless_requested() {
        let cancel = [c"Cancel".as_ptr()];
        let ignored = [c"X".as_ptr(), c"Y".as_ptr()];
        unsafe {
            let handle = native_progress_show(
                c"t".as_ptr(),
                c"m".as_ptr(),
                cancel.as_ptr(),
                cancel.len(),
                Some(record_kept),
            );
            assert!(!handle.is_null());

            native_progress_update(
                handle,
                30,
                std::ptr::null(),
                false,
                ignored.as_ptr(),
                ignored.len(),
                Some(record_stray),
            );

            let window = &*handle.cast::<ProgressWindow>();
            assert_eq!(window.button_count_for_tests(), 1);
            ProgressWindow::press_for_tests(window.hwnd_for_tests(), 0);
            assert_eq!(KEPT_PRESSED.load(Ordering::SeqCst), 0);
            assert_eq!(STRAY_CALLS.load(Ordering::SeqCst), 0);

            native_progress_close(handle);
        }
    }
}
