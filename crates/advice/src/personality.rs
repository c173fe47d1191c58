//! The coarse personality buckets answers and profile text are tallied into.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Personality bucket.
///
/// Declaration order is significant: it is the tie-break order used by every
/// tally in the workspace (answer classification and profile keyword scans).
/// When two types have the same count, the one declared first wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonalityType {
    Intellectual,
    Emotional,
    Practical,
    Creative,
    Analytical,
}

/// Type used whenever a lookup has no entry for the requested type.
pub const DEFAULT_TYPE: PersonalityType = PersonalityType::Intellectual;

impl PersonalityType {
    pub const ALL: [PersonalityType; 5] = [
        PersonalityType::Intellectual,
        PersonalityType::Emotional,
        PersonalityType::Practical,
        PersonalityType::Creative,
        PersonalityType::Analytical,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PersonalityType::Intellectual => "Intellectual",
            PersonalityType::Emotional => "Emotional",
            PersonalityType::Practical => "Practical",
            PersonalityType::Creative => "Creative",
            PersonalityType::Analytical => "Analytical",
        }
    }

    /// Case-insensitive parse of a label such as `"creative"` or `"Creative"`.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|ty| ty.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for PersonalityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_label_ignores_case_and_whitespace() {
        assert_eq!(
            PersonalityType::from_label(" creative "),
            Some(PersonalityType::Creative)
        );
        assert_eq!(
            PersonalityType::from_label("ANALYTICAL"),
            Some(PersonalityType::Analytical)
        );
        assert_eq!(PersonalityType::from_label("mystical"), None);
    }

    #[test]
    fn all_is_in_declaration_order() {
        let mut sorted = PersonalityType::ALL;
        sorted.sort();
        assert_eq!(sorted, PersonalityType::ALL);
        assert_eq!(PersonalityType::ALL[0], DEFAULT_TYPE);
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&PersonalityType::Practical).unwrap();
        assert_eq!(json, "\"practical\"");
        let back: PersonalityType = serde_json::from_str("\"emotional\"").unwrap();
        assert_eq!(back, PersonalityType::Emotional);
    }
}
