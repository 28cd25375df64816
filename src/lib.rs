// ── Safety policy ────────────────────────────────────────────────────────────
// Unsafe code is forbidden everywhere except:
//   • `platform::win32` – Win32 / WinAPI FFI
//   • `ffi`             – the C ABI exported to non-Rust hosts
// Each unsafe block in those modules MUST carry a `// SAFETY:` comment.
#![deny(unsafe_code)]

//! A modal progress window for Windows: title bar, message, progress bar and
//! an optional row of buttons.  The user cannot close it; the host does.
//!
//! Layout, text conversion and options are plain Rust and build everywhere.
//! The window itself is only available on Windows.

pub mod error;
pub mod layout;
pub mod options;
pub mod text;

#[cfg(windows)]
pub mod ffi;
#[cfg(windows)]
pub mod platform;
#[cfg(windows)]
mod progress_bar;

pub use error::{ProgressError, Result};
pub use options::ProgressBarOptions;

#[cfg(windows)]
pub use platform::win32::window::{ButtonCallback, ButtonRow, ProgressWindow};
#[cfg(windows)]
pub use progress_bar::{Button, ClickHandler, ProgressBar, ProgressBarBuilder};
