//! Mood enumeration.

use crate::errors::UnknownMood;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Emotional state recorded with an entry.
///
/// Serialises as its lowercase raw value (`"happy"`, `"sad"`, ...), which is
/// also how the backend stores it.
///
/// # Examples
///
/// ```
/// use moodlog::models::Mood;
///
/// let mood: Mood = "anxious".parse().unwrap();
/// assert_eq!(mood, Mood::Anxious);
/// assert_eq!(mood.label(), "Anxious");
/// assert_eq!(mood.as_str(), "anxious");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Content,
    Neutral,
    Sad,
    Anxious,
    Angry,
}

impl Mood {
    /// All moods in declaration order.
    pub const ALL: [Mood; 6] = [
        Mood::Happy,
        Mood::Content,
        Mood::Neutral,
        Mood::Sad,
        Mood::Anxious,
        Mood::Angry,
    ];

    /// Raw value used for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Content => "content",
            Mood::Neutral => "neutral",
            Mood::Sad => "sad",
            Mood::Anxious => "anxious",
            Mood::Angry => "angry",
        }
    }

    /// Display glyph.
    pub fn emoji(&self) -> &'static str {
        match self {
            Mood::Happy => "😊",
            Mood::Content => "😌",
            Mood::Neutral => "😐",
            Mood::Sad => "😢",
            Mood::Anxious => "😰",
            Mood::Angry => "😠",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Mood::Happy => "Happy",
            Mood::Content => "Content",
            Mood::Neutral => "Neutral",
            Mood::Sad => "Sad",
            Mood::Anxious => "Anxious",
            Mood::Angry => "Angry",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.emoji(), self.label())
    }
}

impl FromStr for Mood {
    type Err = UnknownMood;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Mood::ALL
            .iter()
            .copied()
            .find(|mood| mood.as_str() == normalized)
            .ok_or_else(|| UnknownMood(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Happy".parse::<Mood>().unwrap(), Mood::Happy);
        assert_eq!(" ANGRY ".parse::<Mood>().unwrap(), Mood::Angry);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "ecstatic".parse::<Mood>().unwrap_err();
        assert_eq!(err, UnknownMood("ecstatic".to_string()));
        assert!(err.to_string().contains("ecstatic"));
    }

    #[test]
    fn test_serde_uses_raw_value() {
        let json = serde_json::to_string(&Mood::Content).unwrap();
        assert_eq!(json, "\"content\"");
        let mood: Mood = serde_json::from_str("\"neutral\"").unwrap();
        assert_eq!(mood, Mood::Neutral);
    }

    #[test]
    fn test_display_combines_glyph_and_label() {
        assert_eq!(Mood::Sad.to_string(), "😢 Sad");
    }
}
