// ── Platform abstraction layer ────────────────────────────────────────────────
//
// No `unsafe` lives here; all Win32 FFI is confined to the `win32`
// sub-module and never leaks outward.

pub mod win32;
