// ── Window geometry ───────────────────────────────────────────────────────────
//
// Pure layout math for the progress window.  Every constant is expressed in
// logical units at 96 DPI and scaled with `scale_for_dpi` before it reaches
// Win32.  No Win32 imports; tested on every target.

/// The platform's "100 %" reference DPI.
pub const BASE_DPI: u32 = 96;

/// Logical window width, with or without buttons.
pub const WINDOW_WIDTH: i32 = 500;
/// Logical window height when no button row is shown.
pub const WINDOW_HEIGHT: i32 = 150;
/// Logical window height when at least one button is shown.
pub const WINDOW_HEIGHT_WITH_BUTTONS: i32 = 200;
/// Horizontal margin between the client edge and the controls.
pub const MARGIN: i32 = 30;

const MESSAGE_TOP: i32 = 20;
const MESSAGE_HEIGHT: i32 = 20;
const PROGRESS_TOP: i32 = 50;
const PROGRESS_HEIGHT: i32 = 24;

pub const BUTTON_WIDTH: i32 = 100;
pub const BUTTON_HEIGHT: i32 = 32;
pub const BUTTON_GAP: i32 = 10;
pub const BUTTON_TOP: i32 = 100;

/// Pixel height of the shared UI font at 96 DPI.
pub const FONT_HEIGHT: i32 = 18;

/// A width/height pair in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

/// A positioned rectangle in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Scale a logical value defined at 96 DPI to `dpi`.
///
/// Same rounding as Win32 `MulDiv`: round to nearest, halves away from zero.
/// The product is computed in 64 bits and saturates to the `i32` range.
pub fn scale_for_dpi(value: i32, dpi: u32) -> i32 {
    let product = i64::from(value) * i64::from(dpi);
    let denom = i64::from(BASE_DPI);
    let half = denom / 2;
    let rounded = if product >= 0 {
        (product + half) / denom
    } else {
        (product - half) / denom
    };
    i32::try_from(rounded).unwrap_or(if rounded < 0 { i32::MIN } else { i32::MAX })
}

/// Outer window size for a window showing `button_count` buttons.
pub fn window_size(button_count: usize, dpi: u32) -> Size {
    let height = if button_count == 0 {
        WINDOW_HEIGHT
    } else {
        WINDOW_HEIGHT_WITH_BUTTONS
    };
    Size {
        width: scale_for_dpi(WINDOW_WIDTH, dpi),
        height: scale_for_dpi(height, dpi),
    }
}

/// Place `window` in the middle of `screen`.
pub fn centered(screen: Size, window: Size) -> Rect {
    Rect {
        x: (screen.width - window.width) / 2,
        y: (screen.height - window.height) / 2,
        width: window.width,
        height: window.height,
    }
}

/// The message label spans the client width minus both margins.
pub fn message_rect(client_width: i32, dpi: u32) -> Rect {
    Rect {
        x: scale_for_dpi(MARGIN, dpi),
        y: scale_for_dpi(MESSAGE_TOP, dpi),
        width: client_width - scale_for_dpi(2 * MARGIN, dpi),
        height: scale_for_dpi(MESSAGE_HEIGHT, dpi),
    }
}

/// The progress bar sits below the message with the same horizontal extent.
pub fn progress_rect(client_width: i32, dpi: u32) -> Rect {
    Rect {
        x: scale_for_dpi(MARGIN, dpi),
        y: scale_for_dpi(PROGRESS_TOP, dpi),
        width: client_width - scale_for_dpi(2 * MARGIN, dpi),
        height: scale_for_dpi(PROGRESS_HEIGHT, dpi),
    }
}

/// Right-aligned row of `count` buttons.
///
/// Entry `i` is the rectangle for label `i`, so index 0 is the leftmost
/// button.  An empty row yields no rectangles.
pub fn button_row(count: usize, client_width: i32, dpi: u32) -> Vec<Rect> {
    if count == 0 {
        return Vec::new();
    }

    let width = scale_for_dpi(BUTTON_WIDTH, dpi);
    let height = scale_for_dpi(BUTTON_HEIGHT, dpi);
    let gap = scale_for_dpi(BUTTON_GAP, dpi);
    let y = scale_for_dpi(BUTTON_TOP, dpi);

    let n = i32::try_from(count).unwrap_or(i32::MAX);
    let total = n.saturating_mul(width).saturating_add((n - 1).saturating_mul(gap));
    let start = client_width
        .saturating_sub(scale_for_dpi(MARGIN, dpi))
        .saturating_sub(total);
    let pitch = width.saturating_add(gap);

    (0..n)
        .map(|i| Rect {
            x: start.saturating_add(i.saturating_mul(pitch)),
            y,
            width,
            height,
        })
        .collect()
}

/// Pixel height of the shared UI font at `dpi`.
pub fn font_height(dpi: u32) -> i32 {
    scale_for_dpi(FONT_HEIGHT, dpi)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
