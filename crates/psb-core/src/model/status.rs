//! Operational status and its mapping from source-reported tokens.

use serde::{Deserialize, Serialize};

/// Operational status of an organisation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Operating normally. The default when a source is silent.
    #[default]
    Active,
    /// Dormant or suspended but not formally wound up.
    Inactive,
    /// Formally dissolved, closed, or merged away.
    Dissolved,
}

impl Status {
    /// Serialized token for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Dissolved => "dissolved",
        }
    }
}

const DISSOLVED_TOKENS: &[&str] = &["dissolved", "closed", "defunct", "abolished", "merged"];

// "exempted" bucketed with inactive, matching the upstream data.
const INACTIVE_TOKENS: &[&str] = &["inactive", "dormant", "suspended", "exempted"];

/// Map a source-reported status string onto the canonical status.
///
/// Token matching is case- and whitespace-insensitive; anything that matches
/// neither token set is treated as active.
#[must_use]
pub fn map_status(raw: &str) -> Status {
    let normalized = raw.trim().to_lowercase();
    let has_token = |tokens: &[&str]| {
        tokens
            .iter()
            .any(|token| normalized.split(|c: char| !c.is_alphanumeric()).any(|w| w == *token))
    };
    if has_token(DISSOLVED_TOKENS) {
        Status::Dissolved
    } else if has_token(INACTIVE_TOKENS) {
        Status::Inactive
    } else {
        Status::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn maps_dissolution_tokens() {
        for raw in ["dissolved", "Closed", "DEFUNCT", "abolished", "merged"] {
            assert_eq!(map_status(raw), Status::Dissolved, "{raw}");
        }
    }

    #[test]
    fn maps_inactive_tokens() {
        for raw in ["inactive", "Dormant", "suspended", "exempted"] {
            assert_eq!(map_status(raw), Status::Inactive, "{raw}");
        }
    }

    #[test]
    fn defaults_to_active() {
        for raw in ["open", "live", "", "operating normally"] {
            assert_eq!(map_status(raw), Status::Active, "{raw:?}");
        }
    }

    #[test]
    fn matches_whole_tokens_only() {
        // "enclosed" contains "closed" as a substring but not as a token.
        assert_eq!(map_status("enclosed"), Status::Active);
        assert_eq!(map_status("school closed in 2019"), Status::Dissolved);
    }

    proptest! {
        #[test]
        fn stable_under_whitespace_and_case(raw in "(dissolved|closed|inactive|dormant|open)") {
            let shouted = format!("  {}  ", raw.to_uppercase());
            prop_assert_eq!(map_status(&raw), map_status(&shouted));
        }
    }
}
