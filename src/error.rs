// ── Central error type ────────────────────────────────────────────────────────
//
// Only window creation can fail.  Updates and teardown on a window that is
// already gone are silent no-ops, so they never produce a `ProgressError`.

/// Every error the progress window can produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressError {
    /// The window class could not be registered.  The outcome of the first
    /// registration attempt is kept for the process lifetime, so every
    /// later create fails with the same code.
    Registration {
        /// The raw Win32 error code (`GetLastError()` value).
        code: u32,
    },

    /// A Win32 call needed to build the window or one of its controls
    /// failed.  Nothing from the partial attempt is handed to the caller.
    Creation {
        /// The name of the failing function, for display purposes.
        function: &'static str,
        /// The raw Win32 error code (`GetLastError()` value) or HRESULT.
        code: u32,
    },
}

impl std::fmt::Display for ProgressError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registration { code } => {
                write!(
                    f,
                    "progress window class registration failed (error {code:#010x})"
                )
            }
            Self::Creation { function, code } => {
                write!(f, "{function} failed (error {code:#010x})")
            }
        }
    }
}

impl std::error::Error for ProgressError {}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ProgressError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_failing_function() {
        let e = ProgressError::Creation {
            function: "CreateWindowExW",
            code: 5,
        };
        assert_eq!(e.to_string(), "CreateWindowExW failed (error 0x00000005)");
    }

    #[test]
    fn display_registration() {
        let e = ProgressError::Registration { code: 0x582 };
        assert_eq!(
            e.to_string(),
            "progress window class registration failed (error 0x00000582)"
        );
    }
}
