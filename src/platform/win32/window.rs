// ── Progress window ───────────────────────────────────────────────────────────
//
// Responsibilities in this file (unsafe confined here):
//   • Register the progress window class, once per process.
//   • Create the captioned, always-on-top popup with its label, progress bar
//     and button row, laid out by `crate::layout` at the window's DPI.
//   • Swallow WM_CLOSE so the user cannot dismiss the window.
//   • Route WM_COMMAND from the buttons to the owned press callback.
//   • Release the per-window state on WM_NCDESTROY.
//
// Per-window state lives in an `Rc<WindowState>`.  One strong reference is
// parked in GWLP_USERDATA for the WndProc, the other is held by
// `ProgressWindow`.  Everything here runs on the thread that created the
// window; `ProgressWindow` is `!Send` through the `Rc`.

#![allow(unsafe_code)]

use std::{
    cell::{Cell, RefCell},
    ffi::c_void,
    rc::Rc,
    sync::OnceLock,
};

use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{GetLastError, HINSTANCE, HWND, LPARAM, LRESULT, RECT, TRUE, WPARAM},
        Graphics::Gdi::{
            CreateFontIndirectW, DeleteObject, GetStockObject, GetSysColorBrush, InvalidateRect,
            UpdateWindow, CLEARTYPE_QUALITY, COLOR_3DFACE, DEFAULT_GUI_FONT, HFONT, HGDIOBJ,
            LOGFONTW,
        },
        System::LibraryLoader::GetModuleHandleW,
        UI::{
            Controls::{
                InitCommonControlsEx, ICC_PROGRESS_CLASS, INITCOMMONCONTROLSEX, PBM_SETPOS,
                PROGRESS_CLASSW,
            },
            WindowsAndMessaging::{
                CreateWindowExW, DefWindowProcW, DestroyWindow, GetClientRect, GetSystemMetrics,
                GetWindowLongPtrW, IsWindow, LoadCursorW, RegisterClassExW, SendMessageW,
                SetWindowLongPtrW, SetWindowTextW, ShowWindow, GWLP_USERDATA, HMENU, IDC_ARROW,
                SM_CXSCREEN, SM_CYSCREEN, SW_SHOW, WINDOW_EX_STYLE, WINDOW_STYLE, WM_CLOSE,
                WM_COMMAND, WM_NCDESTROY, WM_SETFONT, WNDCLASSEXW, WS_CAPTION, WS_CHILD,
                WS_EX_DLGMODALFRAME, WS_EX_TOPMOST, WS_POPUP, WS_TABSTOP, WS_VISIBLE,
            },
        },
    },
};

use super::dpi;
use crate::{
    error::{ProgressError, Result},
    layout::{self, Rect, Size},
    text::Wide,
};

// ── Window identity ───────────────────────────────────────────────────────────

/// Atom name used to register the progress window class.
const CLASS_NAME: PCWSTR = w!("NativeProgressBarWindow");

/// Face name of the shared UI font.
const FONT_FACE: &str = "Segoe UI";

/// Control ID of the first button.  Button `i` gets `FIRST_BUTTON_ID + i`;
/// the label and the progress bar use ID 0.
const FIRST_BUTTON_ID: usize = 1;

// Style bits not worth a typed import.
const SS_LEFT_NOPREFIX: u32 = 0x0080; // SS_LEFT (0) | SS_NOPREFIX
const BS_PUSHBUTTON: u32 = 0x0000;

/// Outcome of the one registration attempt, shared by every later create.
static REGISTRATION: OnceLock<std::result::Result<(), u32>> = OnceLock::new();

// ── Public types ──────────────────────────────────────────────────────────────

/// Handler for button presses.  Receives the 0-based index of the pressed
/// button in the label list it was registered with.
///
/// Runs synchronously inside window message dispatch and may re-enter this
/// module, e.g. to replace the buttons or close the window.
pub type ButtonCallback = Box<dyn FnMut(usize)>;

/// A row of button labels together with the handler for their presses.
///
/// Labels are laid out left to right in the order given; label `i` reports
/// index `i` to the handler.
pub struct ButtonRow {
    labels: Vec<Wide>,
    on_press: ButtonCallback,
}

impl ButtonRow {
    pub fn new<I, S>(labels: I, on_press: impl FnMut(usize) + 'static) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            labels: labels.into_iter().map(|s| Wide::from(s.as_ref())).collect(),
            on_press: Box::new(on_press),
        }
    }

    /// No buttons, and a handler that does nothing.
    pub fn empty() -> Self {
        Self {
            labels: Vec::new(),
            on_press: Box::new(|_| {}),
        }
    }

    pub(crate) fn from_wide(labels: Vec<Wide>, on_press: ButtonCallback) -> Self {
        Self { labels, on_press }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

// ── Per-window state ──────────────────────────────────────────────────────────

/// The shared font for the label and buttons, created for one DPI.
struct UiFont {
    handle: HFONT,
    dpi: u32,
    /// `false` for the stock fallback font, which must not be deleted.
    owned: bool,
}

impl UiFont {
    fn new(dpi: u32) -> Self {
        let mut lf = LOGFONTW {
            lfHeight: layout::font_height(dpi),
            lfWeight: 400, // FW_NORMAL
            lfQuality: CLEARTYPE_QUALITY,
            ..Default::default()
        };
        for (dst, src) in lf.lfFaceName.iter_mut().zip(FONT_FACE.encode_utf16()) {
            *dst = src;
        }

        // SAFETY: lf is fully initialised and outlives the call.
        let handle = unsafe { CreateFontIndirectW(&lf) };
        if !handle.0.is_null() {
            return Self {
                handle,
                dpi,
                owned: true,
            };
        }

        tracing::warn!(dpi, "CreateFontIndirectW failed, using the stock GUI font");
        // SAFETY: DEFAULT_GUI_FONT is a stock object that always exists.
        let stock = unsafe { GetStockObject(DEFAULT_GUI_FONT) };
        Self {
            handle: HFONT(stock.0),
            dpi,
            owned: false,
        }
    }

    fn apply(&self, control: HWND) {
        // SAFETY: control is a live child of a window owned by this thread;
        // the font outlives every control it is applied to (see Drop order
        // on WindowState).  LPARAM(1) asks the control to redraw.
        unsafe {
            let _ = SendMessageW(
                control,
                WM_SETFONT,
                WPARAM(self.handle.0 as usize),
                LPARAM(1),
            );
        }
    }
}

impl Drop for UiFont {
    fn drop(&mut self) {
        if self.owned {
            // SAFETY: the handle was created by CreateFontIndirectW and no
            // live control still uses it: either the window is destroyed or
            // the replacement font has already been applied.
            unsafe {
                let _ = DeleteObject(HGDIOBJ(self.handle.0));
            }
        }
    }
}

#[derive(Default)]
struct Controls {
    message: HWND,
    progress: HWND,
    buttons: Vec<HWND>,
    font: Option<UiFont>,
}

struct WindowState {
    controls: RefCell<Controls>,
    on_press: RefCell<Option<ButtonCallback>>,
    /// Bumped every time the handler is replaced.
    generation: Cell<u64>,
    /// Set once WM_NCDESTROY has been seen.
    destroyed: Cell<bool>,
}

impl WindowState {
    fn new() -> Self {
        Self {
            controls: RefCell::new(Controls::default()),
            on_press: RefCell::new(None),
            generation: Cell::new(0),
            destroyed: Cell::new(false),
        }
    }

    fn set_callback(&self, on_press: ButtonCallback) {
        self.generation.set(self.generation.get().wrapping_add(1));
        let old = self.on_press.borrow_mut().replace(on_press);
        drop(old);
    }

    /// Invoke the handler for button `index`.
    ///
    /// The handler is moved out of its slot for the duration of the call so
    /// it can replace itself or destroy the window.  It only goes back if
    /// nothing replaced it meanwhile.  A nested press while the handler is
    /// running finds the slot empty and is dropped.
    fn dispatch(&self, index: usize) {
        let generation = self.generation.get();
        let Some(mut on_press) = self.on_press.borrow_mut().take() else {
            tracing::debug!(index, "button press while handler is busy, ignored");
            return;
        };

        tracing::debug!(index, "button pressed");
        on_press(index);

        if self.generation.get() == generation && !self.destroyed.get() {
            *self.on_press.borrow_mut() = Some(on_press);
        }
    }
}

// ── ProgressWindow ────────────────────────────────────────────────────────────

/// Handle to one live progress window.
///
/// The window is destroyed by [`ProgressWindow::close`] or when the handle is
/// dropped.  If the native window disappears some other way, every method
/// becomes a no-op.
pub struct ProgressWindow {
    hwnd: HWND,
    state: Rc<WindowState>,
}

impl ProgressWindow {
    /// Create and show a progress window.
    ///
    /// The window is centred on the primary display, sized for whether
    /// `buttons` is empty, and starts at progress 0.  On error nothing is
    /// left on screen.
    pub fn create(title: &str, message: &str, buttons: ButtonRow) -> Result<Self> {
        Self::create_wide(&Wide::from(title), &Wide::from(message), buttons)
    }

    pub(crate) fn create_wide(title: &Wide, message: &Wide, buttons: ButtonRow) -> Result<Self> {
        let hinstance = module_instance()?;
        ensure_registered(hinstance)?;

        // No window exists yet to ask, so size against the primary display.
        let dpi = dpi::for_screen();
        // SAFETY: GetSystemMetrics has no preconditions.
        let screen = unsafe {
            Size {
                width: GetSystemMetrics(SM_CXSCREEN),
                height: GetSystemMetrics(SM_CYSCREEN),
            }
        };
        let frame = layout::centered(screen, layout::window_size(buttons.len(), dpi));

        // SAFETY: CLASS_NAME is registered; title outlives the call.
        // HWND::default() (null parent) creates a top-level window.
        let hwnd = unsafe {
            CreateWindowExW(
                WS_EX_DLGMODALFRAME | WS_EX_TOPMOST,
                CLASS_NAME,
                PCWSTR(title.as_ptr()),
                WS_POPUP | WS_CAPTION,
                frame.x,
                frame.y,
                frame.width,
                frame.height,
                HWND::default(),
                HMENU::default(),
                hinstance,
                None,
            )
        }
        .map_err(|e| win32_error("CreateWindowExW", &e))?;

        let state = Rc::new(WindowState::new());
        // SAFETY: hwnd is ours.  The raw pointer carries one strong count,
        // reclaimed in `release_state` on WM_NCDESTROY.
        unsafe {
            SetWindowLongPtrW(
                hwnd,
                GWLP_USERDATA,
                Rc::into_raw(Rc::clone(&state)) as isize,
            );
        }

        // From here on, an early return drops `window`, which destroys the
        // half-built window and its children.
        let window = Self { hwnd, state };
        let ButtonRow { labels, on_press } = buttons;
        window.build(hinstance, message, &labels)?;
        window.state.set_callback(on_press);

        // SAFETY: hwnd is valid.  Return values are the previous visibility
        // state and a success BOOL; neither matters here.
        unsafe {
            let _ = ShowWindow(hwnd, SW_SHOW);
            let _ = UpdateWindow(hwnd);
        }

        tracing::debug!(dpi, buttons = labels.len(), "progress window created");
        Ok(window)
    }

    /// Apply one update: progress always, the message if given, and the
    /// whole button row if given.
    pub fn update(&self, progress: i32, message: Option<&str>, buttons: Option<ButtonRow>) {
        self.set_progress(progress);
        if let Some(message) = message {
            self.set_message(message);
        }
        if let Some(buttons) = buttons {
            self.replace_buttons(buttons);
        }
    }

    /// Move the bar.  The value is not clamped; the control applies its own
    /// 0–100 range.
    pub fn set_progress(&self, value: i32) {
        if !self.is_open() {
            return;
        }
        let progress = self.state.controls.borrow().progress;
        // SAFETY: progress is a live child of self.hwnd.  PBM_SETPOS reads
        // the position as a signed int from WPARAM.
        unsafe {
            let _ = SendMessageW(
                progress,
                PBM_SETPOS,
                WPARAM(value as isize as usize),
                LPARAM(0),
            );
        }
    }

    /// Replace the label text in place.
    pub fn set_message(&self, message: &str) {
        self.set_message_wide(&Wide::from(message));
    }

    pub(crate) fn set_message_wide(&self, message: &Wide) {
        if !self.is_open() {
            return;
        }
        let label = self.state.controls.borrow().message;
        // SAFETY: label is a live child; message outlives the call.
        if let Err(e) = unsafe { SetWindowTextW(label, PCWSTR(message.as_ptr())) } {
            tracing::warn!(error = %e, "SetWindowTextW failed");
        }
    }

    /// Destroy every button, lay out a fresh row at the window's current DPI
    /// and width, and install the new handler.
    ///
    /// The window itself keeps its size and position even when the row goes
    /// from empty to non-empty or back.
    pub fn replace_buttons(&self, buttons: ButtonRow) {
        if !self.is_open() {
            return;
        }

        let old = std::mem::take(&mut self.state.controls.borrow_mut().buttons);
        for button in old {
            // SAFETY: button is a child we created; destroying it sends no
            // WM_COMMAND, so no handler runs here.
            unsafe {
                let _ = DestroyWindow(button);
            }
        }

        let ButtonRow { labels, on_press } = buttons;
        self.state.set_callback(on_press);

        let dpi = dpi::for_window(self.hwnd);
        self.refresh_font(dpi);
        if let Err(e) = self.rebuild_row(&labels, dpi) {
            tracing::warn!(error = %e, "button row could not be rebuilt");
        }

        // SAFETY: hwnd is valid.  Erase the old row and repaint now.
        unsafe {
            let _ = InvalidateRect(self.hwnd, None, TRUE);
            let _ = UpdateWindow(self.hwnd);
        }

        tracing::debug!(dpi, buttons = labels.len(), "buttons replaced");
    }

    /// Destroy the window and all of its controls.
    pub fn close(self) {
        drop(self);
    }

    /// `false` once the native window is gone.
    pub fn is_open(&self) -> bool {
        // SAFETY: IsWindow accepts any value, including stale handles.
        !self.state.destroyed.get() && unsafe { IsWindow(self.hwnd) }.as_bool()
    }

    #[cfg(test)]
    pub(crate) fn hwnd_for_tests(&self) -> HWND {
        self.hwnd
    }

    /// Deliver the `WM_COMMAND` a click on button `index` of `hwnd` would
    /// send.  Takes the raw handle so callers can release any borrow of the
    /// window before the handler runs.
    #[cfg(test)]
    pub(crate) fn press_for_tests(hwnd: HWND, index: usize) {
        // SAFETY: the calling test thread created the window; SendMessageW
        // runs wnd_proc synchronously on it.  A stale handle is ignored.
        unsafe {
            let _ = SendMessageW(
                hwnd,
                WM_COMMAND,
                WPARAM(FIRST_BUTTON_ID + index),
                LPARAM(0),
            );
        }
    }

    #[cfg(test)]
    pub(crate) fn button_count_for_tests(&self) -> usize {
        self.state.controls.borrow().buttons.len()
    }

    // ── Construction helpers ──────────────────────────────────────────────────

    fn build(&self, hinstance: HINSTANCE, message: &Wide, labels: &[Wide]) -> Result<()> {
        let dpi = dpi::for_window(self.hwnd);
        let client_width = self.client_width()?;

        let label = create_child(
            self.hwnd,
            hinstance,
            w!("STATIC"),
            PCWSTR(message.as_ptr()),
            SS_LEFT_NOPREFIX,
            layout::message_rect(client_width, dpi),
            0,
        )?;
        let progress = create_child(
            self.hwnd,
            hinstance,
            PROGRESS_CLASSW,
            PCWSTR::null(),
            0,
            layout::progress_rect(client_width, dpi),
            0,
        )?;

        let font = UiFont::new(dpi);
        font.apply(label);
        {
            let mut controls = self.state.controls.borrow_mut();
            controls.message = label;
            controls.progress = progress;
            controls.font = Some(font);
        }
        self.set_progress(0);

        self.place_buttons(hinstance, labels, dpi, client_width)
    }

    fn place_buttons(
        &self,
        hinstance: HINSTANCE,
        labels: &[Wide],
        dpi: u32,
        client_width: i32,
    ) -> Result<()> {
        let rects = layout::button_row(labels.len(), client_width, dpi);
        for (i, (label, rect)) in labels.iter().zip(rects).enumerate() {
            let button = create_child(
                self.hwnd,
                hinstance,
                w!("BUTTON"),
                PCWSTR(label.as_ptr()),
                WS_TABSTOP.0 | BS_PUSHBUTTON,
                rect,
                FIRST_BUTTON_ID + i,
            )?;
            let mut controls = self.state.controls.borrow_mut();
            if let Some(font) = &controls.font {
                font.apply(button);
            }
            controls.buttons.push(button);
        }
        Ok(())
    }

    fn rebuild_row(&self, labels: &[Wide], dpi: u32) -> Result<()> {
        let hinstance = module_instance()?;
        let client_width = self.client_width()?;
        self.place_buttons(hinstance, labels, dpi, client_width)
    }

    /// Recreate the shared font if the window has moved to a display with a
    /// different DPI since it was last built.
    fn refresh_font(&self, dpi: u32) {
        let stale = self
            .state
            .controls
            .borrow()
            .font
            .as_ref()
            .map_or(true, |f| f.dpi != dpi);
        if !stale {
            return;
        }

        let font = UiFont::new(dpi);
        let old = {
            let mut controls = self.state.controls.borrow_mut();
            font.apply(controls.message);
            controls.font.replace(font)
        };
        drop(old);
    }

    fn client_width(&self) -> Result<i32> {
        let mut rect = RECT::default();
        // SAFETY: hwnd is valid; rect is a valid out-pointer.
        unsafe { GetClientRect(self.hwnd, &mut rect) }
            .map_err(|e| win32_error("GetClientRect", &e))?;
        Ok(rect.right - rect.left)
    }
}

impl Drop for ProgressWindow {
    fn drop(&mut self) {
        if !self.is_open() {
            return;
        }
        // SAFETY: hwnd is live and owned by this thread.  Children are
        // destroyed first, then WM_NCDESTROY releases the WndProc's state.
        match unsafe { DestroyWindow(self.hwnd) } {
            Ok(()) => tracing::debug!("progress window closed"),
            Err(e) => tracing::warn!(error = %e, "DestroyWindow failed"),
        }
    }
}

// ── Window class registration ─────────────────────────────────────────────────

/// Register the class on first use.  A failure is remembered: every later
/// call reports the same error without retrying.
fn ensure_registered(hinstance: HINSTANCE) -> Result<()> {
    (*REGISTRATION.get_or_init(|| register_class(hinstance)))
        .map_err(|code| ProgressError::Registration { code })
}

fn register_class(hinstance: HINSTANCE) -> std::result::Result<(), u32> {
    let icc = INITCOMMONCONTROLSEX {
        dwSize: std::mem::size_of::<INITCOMMONCONTROLSEX>() as u32,
        dwICC: ICC_PROGRESS_CLASS,
    };
    // SAFETY: icc is fully initialised.  Registers PROGRESS_CLASSW.
    if !unsafe { InitCommonControlsEx(&icc) }.as_bool() {
        tracing::warn!("InitCommonControlsEx failed");
    }

    // SAFETY: LoadCursorW with IDC_ARROW loads a built-in system cursor.
    let cursor = unsafe { LoadCursorW(None, IDC_ARROW) }.map_err(|e| {
        let code = e.code().0 as u32;
        tracing::error!(code, "LoadCursorW failed");
        code
    })?;

    let wndclass = WNDCLASSEXW {
        cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
        lpfnWndProc: Some(wnd_proc),
        hInstance: hinstance,
        hCursor: cursor,
        // SAFETY: system colour brushes are owned by the system and never freed.
        hbrBackground: unsafe { GetSysColorBrush(COLOR_3DFACE) },
        lpszClassName: CLASS_NAME,
        ..Default::default()
    };

    // SAFETY: wndclass is fully initialised with valid handles;
    // CLASS_NAME is a valid null-terminated UTF-16 string literal.
    let atom = unsafe { RegisterClassExW(&wndclass) };
    if atom == 0 {
        // SAFETY: reads the error left by RegisterClassExW.
        let code = unsafe { GetLastError() }.0;
        tracing::error!(code, "RegisterClassExW failed");
        return Err(code);
    }

    tracing::debug!("progress window class registered");
    Ok(())
}

// ── Window procedure ──────────────────────────────────────────────────────────

// SAFETY: wnd_proc is registered as lpfnWndProc in WNDCLASSEXW.
// Windows guarantees that hwnd, msg, wparam, and lparam are valid for the
// lifetime of this call; we must not store hwnd beyond the message handler.
unsafe extern "system" fn wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        // Alt+F4 and friends end up here.  Only `ProgressWindow` may close.
        WM_CLOSE => LRESULT(0),

        WM_COMMAND => {
            // Low word of WPARAM is the control identifier.
            let id = wparam.0 & 0xFFFF;
            if id < FIRST_BUTTON_ID {
                return DefWindowProcW(hwnd, msg, wparam, lparam);
            }
            // The clone keeps the state alive even if the handler destroys
            // the window.
            if let Some(state) = state_for(hwnd) {
                state.dispatch(id - FIRST_BUTTON_ID);
            }
            LRESULT(0)
        }

        WM_NCDESTROY => {
            release_state(hwnd);
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }

        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

/// New strong reference to the state parked in GWLP_USERDATA, if any.
///
/// # Safety
/// `hwnd` must be a window of our class on the calling thread.
unsafe fn state_for(hwnd: HWND) -> Option<Rc<WindowState>> {
    let ptr = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *const WindowState;
    if ptr.is_null() {
        return None;
    }
    // SAFETY: ptr came from Rc::into_raw and its count is still held by the
    // slot; we add one for the returned Rc.
    Rc::increment_strong_count(ptr);
    Some(Rc::from_raw(ptr))
}

/// Take back the slot's strong reference and mark the state destroyed.
///
/// # Safety
/// Same as `state_for`; called exactly once, from WM_NCDESTROY.
unsafe fn release_state(hwnd: HWND) {
    let ptr = SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0) as *const WindowState;
    if ptr.is_null() {
        return;
    }
    // SAFETY: ptr came from Rc::into_raw in create_wide; the slot is now
    // cleared so nothing else reclaims it.
    let state = Rc::from_raw(ptr);
    state.destroyed.set(true);
    let on_press = state
        .on_press
        .try_borrow_mut()
        .ok()
        .and_then(|mut slot| slot.take());
    drop(on_press);
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn create_child(
    parent: HWND,
    hinstance: HINSTANCE,
    class: PCWSTR,
    text: PCWSTR,
    style: u32,
    rect: Rect,
    id: usize,
) -> Result<HWND> {
    // SAFETY: parent is a live window on this thread; class and text are
    // valid null-terminated strings (or null text).  For child windows the
    // HMENU slot carries the control ID.
    unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            class,
            text,
            WINDOW_STYLE(WS_CHILD.0 | WS_VISIBLE.0 | style),
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            parent,
            HMENU(id as *mut c_void),
            hinstance,
            None,
        )
    }
    .map_err(|e| win32_error("CreateWindowExW", &e))
}

fn module_instance() -> Result<HINSTANCE> {
    // SAFETY: GetModuleHandleW(None) returns the .exe's own HMODULE, which is
    // always valid for the process lifetime.
    let hmodule =
        unsafe { GetModuleHandleW(None) }.map_err(|e| win32_error("GetModuleHandleW", &e))?;
    Ok(HINSTANCE(hmodule.0))
}

fn win32_error(function: &'static str, e: &windows::core::Error) -> ProgressError {
    ProgressError::Creation {
        function,
        code: e.code().0 as u32,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    use windows::Win32::UI::{
        Controls::PBM_GETPOS,
        WindowsAndMessaging::{GetDlgCtrlID, GetWindowRect, GetWindowTextW},
    };

    fn recorder() -> (Rc<RefCell<Vec<usize>>>, impl FnMut(usize) + 'static) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        (log, move |i| sink.borrow_mut().push(i))
    }

    fn press(window: &ProgressWindow, index: usize) {
        ProgressWindow::press_for_tests(window.hwnd, index);
    }

    fn window_rect(hwnd: HWND) -> RECT {
        let mut rect = RECT::default();
        unsafe { GetWindowRect(hwnd, &mut rect) }.expect("GetWindowRect");
        rect
    }

    fn buttons(window: &ProgressWindow) -> Vec<HWND> {
        window.state.controls.borrow().buttons.clone()
    }

    #[test]
    fn registration_is_idempotent() {
        let a = ProgressWindow::create("A", "first", ButtonRow::empty()).expect("first");
        let b = ProgressWindow::create("B", "second", ButtonRow::empty()).expect("second");
        assert_eq!(REGISTRATION.get(), Some(&Ok(())));
        assert!(a.is_open() && b.is_open());
    }

    #[test]
    fn height_without_buttons() {
        let window = ProgressWindow::create("Copying", "", ButtonRow::empty()).expect("create");
        let rect = window_rect(window.hwnd);
        let expected = layout::window_size(0, dpi::for_screen());
        assert_eq!(rect.bottom - rect.top, expected.height);
        assert_eq!(rect.right - rect.left, expected.width);
    }

    #[test]
    fn height_with_buttons() {
        let window =
            ProgressWindow::create("Copying", "", ButtonRow::new(["OK"], |_| {})).expect("create");
        let rect = window_rect(window.hwnd);
        let expected = layout::window_size(1, dpi::for_screen());
        assert_eq!(rect.bottom - rect.top, expected.height);
    }

    #[test]
    fn progress_round_trip() {
        let window = ProgressWindow::create("t", "m", ButtonRow::empty()).expect("create");
        window.update(42, None, None);
        let progress = window.state.controls.borrow().progress;
        let pos = unsafe { SendMessageW(progress, PBM_GETPOS, WPARAM(0), LPARAM(0)) };
        assert_eq!(pos.0, 42);
    }

    #[test]
    fn message_is_replaced_in_place() {
        let window = ProgressWindow::create("t", "before", ButtonRow::empty()).expect("create");
        let label = window.state.controls.borrow().message;
        window.update(0, Some("after ハロー"), None);

        let mut buf = [0u16; 64];
        let len = unsafe { GetWindowTextW(label, &mut buf) } as usize;
        assert_eq!(String::from_utf16_lossy(&buf[..len]), "after ハロー");
        assert_eq!(window.state.controls.borrow().message, label);
    }

    #[test]
    fn leftmost_button_reports_index_zero() {
        let (log, on_press) = recorder();
        let window = ProgressWindow::create(
            "t",
            "m",
            ButtonRow::new(["A", "B", "C"], on_press),
        )
        .expect("create");

        let mut row = buttons(&window);
        row.sort_by_key(|&b| window_rect(b).left);
        for button in row {
            let id = unsafe { GetDlgCtrlID(button) } as usize;
            press(&window, id - FIRST_BUTTON_ID);
        }
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn replacement_routes_to_new_handler() {
        let (first, on_first) = recorder();
        let (second, on_second) = recorder();
        let window =
            ProgressWindow::create("t", "m", ButtonRow::new(["Cancel"], on_first)).expect("create");

        window.update(
            50,
            Some("retry?"),
            Some(ButtonRow::new(["Retry"], on_second)),
        );
        assert_eq!(buttons(&window).len(), 1);
        press(&window, 0);

        assert!(first.borrow().is_empty());
        assert_eq!(*second.borrow(), vec![0]);
    }

    #[test]
    fn replacement_keeps_window_size() {
        let window =
            ProgressWindow::create("t", "m", ButtonRow::new(["Cancel"], |_| {})).expect("create");
        let before = window_rect(window.hwnd);
        window.replace_buttons(ButtonRow::empty());
        assert!(buttons(&window).is_empty());
        assert_eq!(window_rect(window.hwnd), before);
    }

    #[test]
    fn handler_may_replace_itself() {
        let window = Rc::new(RefCell::new(None::<ProgressWindow>));
        let (second, on_second) = recorder();
        let on_second = RefCell::new(Some(on_second));

        let target = Rc::clone(&window);
        let created = ProgressWindow::create(
            "t",
            "m",
            ButtonRow::new(["Once"], move |_| {
                let next = on_second.borrow_mut().take();
                if let (Some(w), Some(next)) = (target.borrow().as_ref(), next) {
                    w.replace_buttons(ButtonRow::new(["Again"], next));
                }
            }),
        )
        .expect("create");
        *window.borrow_mut() = Some(created);

        let w = window.borrow();
        let w = w.as_ref().expect("window");
        press(w, 0);
        press(w, 0);
        assert_eq!(*second.borrow(), vec![0]);
    }

    #[test]
    fn close_is_terminal() {
        let window =
            ProgressWindow::create("t", "m", ButtonRow::new(["A", "B"], |_| {})).expect("create");
        let hwnd = window.hwnd;
        let mut children = buttons(&window);
        {
            let controls = window.state.controls.borrow();
            children.push(controls.message);
            children.push(controls.progress);
        }

        window.close();

        assert!(!unsafe { IsWindow(hwnd) }.as_bool());
        for child in children {
            assert!(!unsafe { IsWindow(child) }.as_bool());
        }
    }

    #[test]
    fn user_close_is_ignored() {
        let (log, on_press) = recorder();
        let window =
            ProgressWindow::create("t", "m", ButtonRow::new(["Cancel"], on_press)).expect("create");
        unsafe {
            let _ = SendMessageW(window.hwnd, WM_CLOSE, WPARAM(0), LPARAM(0));
        }
        assert!(window.is_open());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn destroyed_window_makes_updates_no_ops() {
        let window =
            ProgressWindow::create("t", "m", ButtonRow::new(["A"], |_| {})).expect("create");
        unsafe { DestroyWindow(window.hwnd) }.expect("DestroyWindow");

        assert!(!window.is_open());
        window.update(10, Some("gone"), Some(ButtonRow::new(["B"], |_| {})));
        assert_eq!(buttons(&window).len(), 1);
    }
}
