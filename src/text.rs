// ── Native text ───────────────────────────────────────────────────────────────
//
// Win32 `*W` functions want null-terminated UTF-16.  `Wide` owns such a
// buffer.  Conversion from raw bytes is deliberately lenient: malformed
// UTF-8 is shown as a lossy rendering instead of failing window creation.

/// A null-terminated UTF-16 string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wide(Vec<u16>);

impl Wide {
    /// Decode a UTF-8 byte sequence, stopping at the first NUL if present.
    ///
    /// Invalid UTF-8 is not an error: each byte becomes one UTF-16 code unit
    /// (a Latin-1 reading).  The result is readable for ASCII-heavy input and
    /// garbled otherwise, which is accepted for malformed input.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let bytes = &bytes[..end];
        match std::str::from_utf8(bytes) {
            Ok(s) => Self::from(s),
            Err(e) => {
                tracing::warn!(
                    valid_up_to = e.valid_up_to(),
                    len = bytes.len(),
                    "text is not valid UTF-8, falling back to raw bytes"
                );
                Self(
                    bytes
                        .iter()
                        .map(|&b| u16::from(b))
                        .chain(std::iter::once(0))
                        .collect(),
                )
            }
        }
    }

    /// Pointer suitable for a `PCWSTR`.  Valid while `self` is alive.
    pub fn as_ptr(&self) -> *const u16 {
        self.0.as_ptr()
    }

    /// Code units without the terminating NUL.
    pub fn units(&self) -> &[u16] {
        &self.0[..self.0.len() - 1]
    }
}

impl From<&str> for Wide {
    fn from(s: &str) -> Self {
        Self(s.encode_utf16().chain(std::iter::once(0)).collect())
    }
}

impl std::fmt::Display for Wide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&String::from_utf16_lossy(self.units()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn str_is_null_terminated() {
        let w = Wide::from("OK");
        assert_eq!(w.units(), &[u16::from(b'O'), u16::from(b'K')]);
        assert_eq!(w.0.last(), Some(&0));
    }

    #[test]
    fn empty_message_is_just_terminator() {
        let w = Wide::from("");
        assert!(w.units().is_empty());
        assert_eq!(w.0, vec![0]);
    }

    #[test]
    fn utf8_bytes_decode_losslessly() {
        let s = "Hi! ハロー・ワールド";
        let w = Wide::from_bytes(s.as_bytes());
        assert_eq!(w, Wide::from(s));
        assert_eq!(w.to_string(), s);
    }

    #[test]
    fn bytes_stop_at_nul() {
        let w = Wide::from_bytes(b"Cancel\0garbage");
        assert_eq!(w.to_string(), "Cancel");
    }

    #[test]
    fn invalid_utf8_falls_back_to_raw_bytes() {
        let w = Wide::from_bytes(b"caf\xE9");
        assert_eq!(w.units(), &[0x63, 0x61, 0x66, 0xE9]);
        assert_eq!(w.to_string(), "café");
    }
}
