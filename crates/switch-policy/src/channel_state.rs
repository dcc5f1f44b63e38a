use serde::{Deserialize, Serialize};

use crate::command_registry::CommandSpec;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
/// Per-channel force-enable and force-disable lists.
pub struct ChannelState {
    #[serde(default)]
    pub enable: Vec<String>,
    #[serde(default)]
    pub disable: Vec<String>,
}

impl ChannelState {
    pub fn new(enable: Vec<String>, disable: Vec<String>) -> Self {
        Self { enable, disable }
    }

    pub fn is_empty(&self) -> bool {
        self.enable.is_empty() && self.disable.is_empty()
    }

    pub fn is_force_enabled(&self, name: &str) -> bool {
        self.enable.iter().any(|entry| entry == name)
    }

    pub fn is_force_disabled(&self, name: &str) -> bool {
        self.disable.iter().any(|entry| entry == name)
    }

    /// Resolves the command's own on/off state in this channel, ignoring ancestors.
    pub fn effective_enabled(&self, command: &CommandSpec) -> bool {
        effective_enabled(
            command.default_call_policy.enabled_by_default(),
            self.is_force_enabled(&command.name),
            self.is_force_disabled(&command.name),
        )
    }
}

/// `initial` anchored at the default policy, flipped only by the opposing list.
pub(crate) fn effective_enabled(initial: bool, force_enabled: bool, force_disabled: bool) -> bool {
    if initial {
        !force_disabled
    } else {
        force_enabled
    }
}
