#![allow(unsafe_code)]

use std::sync::OnceLock;

use windows::{
    core::{s, w},
    Win32::{
        Foundation::HWND,
        Graphics::Gdi::{GetDC, GetDeviceCaps, ReleaseDC, LOGPIXELSX},
        System::LibraryLoader::{GetModuleHandleW, GetProcAddress},
        UI::HiDpi::{SetProcessDpiAwarenessContext, DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2},
    },
};

use crate::layout::BASE_DPI;

type GetDpiForWindowFn = unsafe extern "system" fn(HWND) -> u32;

/// `GetDpiForWindow` only exists on Windows 10 1607 and later, so it is
/// resolved from user32 on first use.  `None` means "use the device DPI".
static GET_DPI_FOR_WINDOW: OnceLock<Option<GetDpiForWindowFn>> = OnceLock::new();

fn probe_get_dpi_for_window() -> Option<GetDpiForWindowFn> {
    // SAFETY: user32.dll is loaded in every GUI process; GetModuleHandleW
    // does not change its reference count.
    let user32 = unsafe { GetModuleHandleW(w!("user32.dll")) }.ok()?;
    // SAFETY: user32 is a valid module handle; the name is a static C string.
    let proc = unsafe { GetProcAddress(user32, s!("GetDpiForWindow")) };
    match proc {
        // SAFETY: GetDpiForWindow is documented as `UINT GetDpiForWindow(HWND)`,
        // which matches GetDpiForWindowFn exactly.
        Some(f) => Some(unsafe { std::mem::transmute::<_, GetDpiForWindowFn>(f) }),
        None => {
            tracing::debug!("GetDpiForWindow unavailable, using device DPI");
            None
        }
    }
}

/// Opt into Per-Monitor v2 DPI awareness.
/// MUST be called before any window is created on the calling thread.
pub fn enable_per_monitor_awareness() {
    // SAFETY: Must precede all window creation; single call at process start.
    let result =
        unsafe { SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2) };
    if let Err(e) = result {
        tracing::warn!(error = %e, "per-monitor DPI awareness not enabled");
    }
}

/// Return the DPI for `hwnd`, following the monitor the window is on when
/// the platform supports it.  Falls back to the device DPI otherwise.
pub(crate) fn for_window(hwnd: HWND) -> u32 {
    if let Some(get_dpi) = *GET_DPI_FOR_WINDOW.get_or_init(probe_get_dpi_for_window) {
        // SAFETY: hwnd is a live window owned by the calling thread.
        let v = unsafe { get_dpi(hwnd) };
        if v != 0 {
            return v;
        }
    }
    device_dpi(hwnd)
}

/// Return the primary display DPI. Used before window creation.
pub(crate) fn for_screen() -> u32 {
    device_dpi(HWND::default())
}

/// Horizontal logical DPI of the DC for `hwnd` (null = whole screen).
/// Falls back to BASE_DPI (96) on failure.
fn device_dpi(hwnd: HWND) -> u32 {
    // SAFETY: GetDC accepts null for the screen DC.  The DC is released on
    // the same window before returning.
    let v = unsafe {
        let hdc = GetDC(hwnd);
        if hdc.0.is_null() {
            return BASE_DPI;
        }
        let v = GetDeviceCaps(hdc, LOGPIXELSX);
        ReleaseDC(hwnd, hdc);
        v
    };
    u32::try_from(v).ok().filter(|&v| v != 0).unwrap_or(BASE_DPI)
}
