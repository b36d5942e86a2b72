use serde::{Deserialize, Serialize};

/// Read-only profile snapshot fetched once from the host platform at launch.
///
/// Injected by value wherever it is needed; never refreshed implicitly
/// mid-session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    /// Display name (e.g. "Ada Lovelace").
    pub display_name: Option<String>,

    /// Platform handle without the "@" prefix.
    pub username: Option<String>,

    /// HTTPS URL of the profile avatar.
    pub avatar_url: Option<String>,
}

impl Profile {
    /// Snapshot used when the host platform context is unavailable.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Human-readable attribution line, preferring the display name.
    pub fn attribution(&self) -> Option<String> {
        if let Some(name) = &self.display_name {
            Some(name.clone())
        } else {
            self.username.as_ref().map(|u| format!("@{}", u))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribution_prefers_display_name() {
        let profile = Profile {
            display_name: Some("Ada".into()),
            username: Some("ada".into()),
            avatar_url: None,
        };
        assert_eq!(profile.attribution().as_deref(), Some("Ada"));
    }

    #[test]
    fn attribution_falls_back_to_handle() {
        let profile = Profile {
            display_name: None,
            username: Some("ada".into()),
            avatar_url: None,
        };
        assert_eq!(profile.attribution().as_deref(), Some("@ada"));
    }

    #[test]
    fn anonymous_has_no_attribution() {
        assert!(Profile::anonymous().attribution().is_none());
    }
}
