// ── Progress bar options ──────────────────────────────────────────────────────
//
// The initial description of a progress bar as a host hands it over:
// title, message, starting progress and button labels.  Serialisable so it
// can be loaded from JSON.  No Win32 imports.

use serde::{Deserialize, Serialize};

/// Initial state of a progress bar.
///
/// Every field is optional in JSON; missing fields take the `Default` value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressBarOptions {
    /// Title bar text.  Fixed for the lifetime of the window.
    pub title: String,
    /// Body text above the bar.  May be empty.
    pub message: String,
    /// Starting position.  Passed to the control unclamped.
    pub progress: i32,
    /// Button labels, left to right.
    pub buttons: Vec<String>,
}

impl ProgressBarOptions {
    /// Parse options from a JSON document.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_document() {
        let json = r#"{
            "title": "Hi! ハロー・ワールド",
            "message": "Deleting all kinds of files!",
            "progress": 10,
            "buttons": ["Cancel", "Done"]
        }"#;
        let opts = ProgressBarOptions::from_json(json).expect("parse");
        assert_eq!(opts.title, "Hi! ハロー・ワールド");
        assert_eq!(opts.message, "Deleting all kinds of files!");
        assert_eq!(opts.progress, 10);
        assert_eq!(opts.buttons, vec!["Cancel".to_owned(), "Done".to_owned()]);
    }

    #[test]
    fn missing_fields_default() {
        let opts = ProgressBarOptions::from_json(r#"{"title":"Copying"}"#).expect("parse");
        assert_eq!(opts.title, "Copying");
        assert!(opts.message.is_empty());
        assert_eq!(opts.progress, 0);
        assert!(opts.buttons.is_empty());
    }

    #[test]
    fn out_of_range_progress_is_kept() {
        let opts = ProgressBarOptions::from_json(r#"{"progress":150}"#).expect("parse");
        assert_eq!(opts.progress, 150);
    }

    #[test]
    fn wrong_type_is_rejected() {
        assert!(ProgressBarOptions::from_json(r#"{"buttons":"Cancel"}"#).is_err());
    }
}
