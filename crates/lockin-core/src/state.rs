//! Focus state taxonomy and object-tag derivation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classified attention state for a single frame.
///
/// Serializes to the exact label strings clients display, so the wire
/// value and `label()` always agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FocusState {
    /// Neutral state: face present, gaze inside both bands.
    #[default]
    #[serde(rename = "Focused")]
    Focused,

    #[serde(rename = "Looking Left")]
    LookingLeft,

    #[serde(rename = "Looking Right")]
    LookingRight,

    #[serde(rename = "Looking Up")]
    LookingUp,

    #[serde(rename = "Looking Down")]
    LookingDown,

    /// Eye aspect ratio under the floor; indistinguishable from a
    /// steep downward gaze at low camera angles, hence the label.
    #[serde(rename = "Eyes Closed / Looking Down")]
    EyesClosed,

    #[serde(rename = "No Face Detected")]
    NoFaceDetected,

    /// Audio-derived state, only reported while `include_talking` is on.
    #[serde(rename = "Talking")]
    Talking,

    #[serde(rename = "PHONE DETECTED")]
    PhoneDetected,

    #[serde(rename = "BOOK DETECTED")]
    BookDetected,

    #[serde(rename = "DISTRACTION DETECTED")]
    DistractionDetected,
}

impl FocusState {
    /// Returns the display label, identical to the serialized form.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Focused => "Focused",
            Self::LookingLeft => "Looking Left",
            Self::LookingRight => "Looking Right",
            Self::LookingUp => "Looking Up",
            Self::LookingDown => "Looking Down",
            Self::EyesClosed => "Eyes Closed / Looking Down",
            Self::NoFaceDetected => "No Face Detected",
            Self::Talking => "Talking",
            Self::PhoneDetected => "PHONE DETECTED",
            Self::BookDetected => "BOOK DETECTED",
            Self::DistractionDetected => "DISTRACTION DETECTED",
        }
    }

    /// Returns false only when no face was found in the frame.
    pub fn face_detected(&self) -> bool {
        !matches!(self, Self::NoFaceDetected)
    }

    /// Returns true if the state came from the audio branch.
    pub fn is_talking_derived(&self) -> bool {
        matches!(self, Self::Talking)
    }

    /// Object tags for this state's label.
    pub fn object_tags(&self) -> Vec<&'static str> {
        object_tags(self.label())
    }
}

impl fmt::Display for FocusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Derives the object-tag list from a state label.
///
/// Fixed keyword associations over the uppercased text: `PHONE` maps to
/// `phone`, `BOOK` to `book`, and `DISTRACTION` to `distractor` only
/// when no more specific keyword already matched.
pub fn object_tags(label: &str) -> Vec<&'static str> {
    let upper = label.to_uppercase();
    let mut tags = Vec::new();
    if upper.contains("PHONE") {
        tags.push("phone");
    }
    if upper.contains("BOOK") {
        tags.push("book");
    }
    if tags.is_empty() && upper.contains("DISTRACTION") {
        tags.push("distractor");
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_match_serialized_form() {
        for state in [
            FocusState::Focused,
            FocusState::LookingLeft,
            FocusState::EyesClosed,
            FocusState::NoFaceDetected,
            FocusState::Talking,
            FocusState::PhoneDetected,
        ] {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{}\"", state.label()));
        }
    }

    #[test]
    fn test_face_detected_flag() {
        assert!(FocusState::Focused.face_detected());
        assert!(FocusState::PhoneDetected.face_detected());
        assert!(!FocusState::NoFaceDetected.face_detected());
    }

    #[test]
    fn test_phone_tag() {
        assert_eq!(object_tags("PHONE DETECTED"), vec!["phone"]);
    }

    #[test]
    fn test_book_tag() {
        assert_eq!(object_tags("BOOK DETECTED"), vec!["book"]);
    }

    #[test]
    fn test_generic_distraction_tag() {
        assert_eq!(object_tags("DISTRACTION DETECTED"), vec!["distractor"]);
    }

    #[test]
    fn test_specific_tag_beats_generic() {
        // A label carrying both a specific and the generic keyword must
        // only report the specific tag.
        assert_eq!(object_tags("PHONE DISTRACTION DETECTED"), vec!["phone"]);
    }

    #[test]
    fn test_plain_states_have_no_tags() {
        assert!(object_tags("Focused").is_empty());
        assert!(object_tags("Looking Left").is_empty());
        assert!(object_tags("Talking").is_empty());
    }

    #[test]
    fn test_tags_case_insensitive() {
        assert_eq!(object_tags("phone detected"), vec!["phone"]);
    }

    #[test]
    fn test_default_is_focused() {
        assert_eq!(FocusState::default(), FocusState::Focused);
    }
}
