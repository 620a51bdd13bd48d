use serde::{Deserialize, Serialize};

/// Lifecycle of a role assignment context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextState {
    /// Created, nothing resolved or granted yet.
    Unstarted,
    /// Resolving roles and granting them.
    SettingUp,
    /// Grants are in place.
    Active,
    /// Reverting recorded grants.
    CleaningUp,
    /// Cleanup finished, or setup failed.
    Done,
}

impl ContextState {
    /// Returns a stable label for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unstarted => "unstarted",
            Self::SettingUp => "setting_up",
            Self::Active => "active",
            Self::CleaningUp => "cleaning_up",
            Self::Done => "done",
        }
    }

    /// Returns true when `setup` may start from this state.
    #[must_use]
    pub fn accepts_setup(&self) -> bool {
        matches!(self, Self::Unstarted | Self::Done)
    }
}
