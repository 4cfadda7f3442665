//! Accessibility policy applied when the engine invokes a method handle.
//!
//! Dispatch tables record the declared visibility of every method. Before a
//! handle is invoked on a receiver the engine asks the policy whether that
//! visibility may be called. The permissive policy mirrors the usual managed
//! runtime behaviour of forcing every method callable; the restrictive policy
//! turns non-public invocations into access errors.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Decides whether non-public methods may be invoked by the engine.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AccessPolicy {
    /// Every declared method is made callable regardless of visibility.
    #[default]
    Permissive,
    /// Only public methods may be invoked; anything else is denied.
    PublicOnly,
}

impl AccessPolicy {
    /// Returns `true` when a method with the given public-ness may be called.
    ///
    /// # Example
    ///
    /// ```
    /// use mantle_config::AccessPolicy;
    ///
    /// assert!(AccessPolicy::Permissive.permits(false));
    /// assert!(!AccessPolicy::PublicOnly.permits(false));
    /// assert!(AccessPolicy::PublicOnly.permits(true));
    /// ```
    #[must_use]
    pub const fn permits(self, is_public: bool) -> bool {
        match self {
            Self::Permissive => true,
            Self::PublicOnly => is_public,
        }
    }
}

/// Errors encountered while parsing an [`AccessPolicy`] from text.
pub type AccessPolicyParseError = strum::ParseError;

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("permissive", AccessPolicy::Permissive)]
    #[case("PUBLIC_ONLY", AccessPolicy::PublicOnly)]
    #[case("Public_Only", AccessPolicy::PublicOnly)]
    fn parses_case_insensitively(#[case] text: &str, #[case] expected: AccessPolicy) {
        let parsed = AccessPolicy::from_str(text).expect("policy should parse");
        assert_eq!(parsed, expected);
    }

    #[test]
    fn rejects_unknown_policy() {
        assert!(AccessPolicy::from_str("sometimes").is_err());
    }

    #[test]
    fn displays_in_snake_case() {
        assert_eq!(AccessPolicy::PublicOnly.to_string(), "public_only");
    }
}
