//! Named keyboard commands

use crate::{rules::RuleMode, RefreshError};

/// Browser commands that toggle a rule for the focused tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutCommand {
    /// Toggle a rule on the focused page's whole path
    ToggleCurrentRule,
    /// Toggle a rule on the focused page's origin
    ToggleBaseRule,
}

impl ShortcutCommand {
    pub fn from_name(name: &str) -> Result<Self, RefreshError> {
        match name {
            "toggle-current-rule" => Ok(Self::ToggleCurrentRule),
            "toggle-base-rule" => Ok(Self::ToggleBaseRule),
            other => Err(RefreshError::UnknownCommand(other.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::ToggleCurrentRule => "toggle-current-rule",
            Self::ToggleBaseRule => "toggle-base-rule",
        }
    }

    pub fn mode(self) -> RuleMode {
        match self {
            Self::ToggleCurrentRule => RuleMode::Full,
            Self::ToggleBaseRule => RuleMode::Base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_map_to_modes() {
        let current = ShortcutCommand::from_name("toggle-current-rule").unwrap();
        assert_eq!(current.mode(), RuleMode::Full);
        assert_eq!(ShortcutCommand::from_name("toggle-base-rule").unwrap().mode(), RuleMode::Base);
        assert_eq!(current.name(), "toggle-current-rule");
        assert!(ShortcutCommand::from_name("reload-all").is_err());
    }
}
