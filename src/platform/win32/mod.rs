// ── Win32 platform implementation ─────────────────────────────────────────────
//
// One of exactly two modules in the crate where `unsafe` code is permitted
// (the other is `ffi`).  Every `unsafe` block MUST carry a `// SAFETY:`
// comment that states:
//   • which invariant makes the operation sound, and
//   • what the caller is responsible for maintaining.
//
// Nothing in this module is `pub` beyond what callers genuinely need; keep the
// unsafe surface as small as possible.

#![allow(unsafe_code)]

// ── Sub-modules ───────────────────────────────────────────────────────────────

pub mod dpi; // per-monitor DPI helpers, probed once
pub mod message_loop; // timer-driven message pump for hosts without one
pub mod window; // progress window class, WndProc, ProgressWindow
