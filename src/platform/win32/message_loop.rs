// ── Message loop ──────────────────────────────────────────────────────────────
//
// Hosts that have no message loop of their own (the demo binary, tests of
// the whole flow) pump messages here.  A thread timer wakes the loop at a
// fixed interval so the caller can advance its work between messages.

#![allow(unsafe_code)]

use std::{ops::ControlFlow, time::Duration};

use windows::Win32::{
    Foundation::{GetLastError, HWND},
    UI::WindowsAndMessaging::{
        DispatchMessageW, GetMessageW, KillTimer, SetTimer, TranslateMessage, MSG, WM_TIMER,
    },
};

use crate::error::{ProgressError, Result};

/// Pump this thread's messages, calling `on_tick` every `interval`, until
/// `on_tick` breaks or WM_QUIT arrives.
///
/// Button handlers of every window on this thread run from inside this loop.
pub fn run(interval: Duration, mut on_tick: impl FnMut() -> ControlFlow<()>) -> Result<()> {
    let millis = u32::try_from(interval.as_millis()).unwrap_or(u32::MAX).max(1);

    // SAFETY: a null HWND creates a thread timer; its WM_TIMER messages are
    // posted to this thread's queue with a null hwnd and no TIMERPROC.
    let timer = unsafe { SetTimer(HWND::default(), 0, millis, None) };
    if timer == 0 {
        return Err(last_error("SetTimer"));
    }

    let result = pump(timer, &mut on_tick);

    // SAFETY: timer was returned by SetTimer on this thread.
    unsafe {
        let _ = KillTimer(HWND::default(), timer);
    }
    result
}

fn pump(timer: usize, on_tick: &mut impl FnMut() -> ControlFlow<()>) -> Result<()> {
    let mut msg = MSG::default();

    loop {
        // SAFETY: &mut msg is a valid MSG pointer; HWND::default() retrieves
        // messages for all windows on this thread; 0,0 filter accepts all.
        let ret = unsafe { GetMessageW(&mut msg, HWND::default(), 0, 0) };

        match ret.0 {
            // GetMessage returns -1 on error.
            -1 => return Err(last_error("GetMessageW")),
            // Returns 0 when WM_QUIT is retrieved; exit the loop cleanly.
            0 => return Ok(()),
            _ if msg.message == WM_TIMER && msg.hwnd.0.is_null() && msg.wParam.0 == timer => {
                if on_tick().is_break() {
                    return Ok(());
                }
            }
            _ => unsafe {
                // SAFETY: msg was populated by a successful GetMessage call.
                let _ = TranslateMessage(&msg);
                let _ = DispatchMessageW(&msg);
            },
        }
    }
}

fn last_error(function: &'static str) -> ProgressError {
    // SAFETY: GetLastError reads thread-local state set by the last Win32 call.
    let code = unsafe { GetLastError() };
    ProgressError::Creation {
        function,
        code: code.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_until_break() {
        let mut ticks = 0;
        run(Duration::from_millis(1), || {
            ticks += 1;
            if ticks == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .expect("loop");
        assert_eq!(ticks, 3);
    }
}
