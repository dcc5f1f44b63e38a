use std::collections::{BTreeSet, VecDeque};

use thiserror::Error;
use tracing::{debug, warn};

use crate::authority::AuthorityResolver;
use crate::channel_state::{effective_enabled, ChannelState};
use crate::command_registry::{CommandRegistry, CommandSpec};
use crate::exclusive_groups::MutuallyExclusiveGroups;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Raw mode flags as given on the `switch` command line.
pub struct SwitchFlags {
    pub enable: bool,
    pub disable: bool,
    pub reset: bool,
    pub reset_all: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Enumerates supported `SwitchMode` values.
pub enum SwitchMode {
    #[default]
    Toggle,
    ForceEnable,
    ForceDisable,
    ResetNames,
    ResetAll,
}

impl SwitchMode {
    /// At most one of the four flags may be set.
    pub fn from_flags(flags: SwitchFlags) -> Result<Self, SwitchError> {
        let selected = [
            (flags.enable, Self::ForceEnable),
            (flags.disable, Self::ForceDisable),
            (flags.reset, Self::ResetNames),
            (flags.reset_all, Self::ResetAll),
        ]
        .into_iter()
        .filter_map(|(set, mode)| set.then_some(mode))
        .collect::<Vec<_>>();
        match selected.as_slice() {
            [] => Ok(Self::Toggle),
            [mode] => Ok(*mode),
            _ => Err(SwitchError::ConfigConflict),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Toggle => "toggle",
            Self::ForceEnable => "force_enable",
            Self::ForceDisable => "force_disable",
            Self::ResetNames => "reset",
            Self::ResetAll => "reset_all",
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
/// User-facing failures of a switch request. None of them mutate channel state.
pub enum SwitchError {
    #[error("conflicting switch options")]
    ConfigConflict,
    #[error("not allowed to modify: {}", names.join(", "))]
    AuthorizationDenied { names: Vec<String> },
    #[error("no effective change")]
    NoEffectiveChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Successful result of a switch request.
pub enum SwitchOutcome {
    /// No names given and the channel carries no overrides.
    NothingToggled,
    /// No names given; current overrides, filtered by the requested direction.
    Listing {
        enabled: Option<Vec<String>>,
        disabled: Option<Vec<String>>,
        reset_hint: bool,
    },
    ResetAll {
        next: ChannelState,
    },
    Applied {
        next: ChannelState,
        enabled: Vec<String>,
        disabled: Vec<String>,
    },
}

impl SwitchOutcome {
    /// State that must be persisted before the outcome is reported.
    pub fn next_state(&self) -> Option<&ChannelState> {
        match self {
            Self::ResetAll { next } | Self::Applied { next, .. } => Some(next),
            Self::NothingToggled | Self::Listing { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Requested(SwitchMode),
    GroupDisable,
}

#[derive(Debug, Default)]
struct WorkingMembership {
    enable: Vec<String>,
    disable: Vec<String>,
}

impl WorkingMembership {
    fn seeded(state: &ChannelState) -> Self {
        Self {
            enable: state.enable.clone(),
            disable: state.disable.clone(),
        }
    }

    fn effective_enabled(&self, command: &CommandSpec) -> bool {
        effective_enabled(
            command.default_call_policy.enabled_by_default(),
            self.enable.contains(&command.name),
            self.disable.contains(&command.name),
        )
    }

    fn set_enable(&mut self, name: &str, present: bool) {
        set_membership(&mut self.enable, name, present);
    }

    fn set_disable(&mut self, name: &str, present: bool) {
        set_membership(&mut self.disable, name, present);
    }

    fn into_state(self) -> ChannelState {
        ChannelState::new(self.enable, self.disable)
    }
}

fn set_membership(list: &mut Vec<String>, name: &str, present: bool) {
    if present {
        if !list.iter().any(|entry| entry == name) {
            list.push(name.to_string());
        }
    } else {
        list.retain(|entry| entry != name);
    }
}

#[derive(Debug, Default)]
struct BatchChanges {
    enabled: Vec<String>,
    disabled: Vec<String>,
}

/// Batch toggle engine over a command registry and its exclusive groups.
#[derive(Debug, Clone, Copy)]
pub struct SwitchEngine<'a> {
    registry: &'a CommandRegistry,
    groups: &'a MutuallyExclusiveGroups,
}

impl<'a> SwitchEngine<'a> {
    pub fn new(registry: &'a CommandRegistry, groups: &'a MutuallyExclusiveGroups) -> Self {
        Self { registry, groups }
    }

    /// Computes the channel state that results from one `switch` request.
    ///
    /// Pure: the caller persists [`SwitchOutcome::next_state`] exactly once.
    pub fn apply(
        &self,
        state: &ChannelState,
        names: &[String],
        mode: SwitchMode,
        authority: &dyn AuthorityResolver,
    ) -> Result<SwitchOutcome, SwitchError> {
        if mode == SwitchMode::ResetAll {
            return Ok(SwitchOutcome::ResetAll {
                next: ChannelState::default(),
            });
        }

        let names = names
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>();
        if names.is_empty() {
            return Ok(list_overrides(state, mode));
        }

        let requested = self.authorize(&names, authority)?;

        let mut working = WorkingMembership::seeded(state);
        let mut changes = BatchChanges::default();
        let mut enqueued = requested
            .iter()
            .map(|command| command.name.as_str())
            .collect::<BTreeSet<_>>();
        let mut queue = requested
            .into_iter()
            .map(|command| (command, Transition::Requested(mode)))
            .collect::<VecDeque<_>>();

        while let Some((command, transition)) = queue.pop_front() {
            let current = working.effective_enabled(command);
            let enable = match transition {
                Transition::GroupDisable | Transition::Requested(SwitchMode::ForceDisable) => false,
                Transition::Requested(SwitchMode::ForceEnable) => true,
                Transition::Requested(SwitchMode::Toggle) => !current,
                Transition::Requested(SwitchMode::ResetNames | SwitchMode::ResetAll) => {
                    reset_command(command, current, &mut working, &mut changes);
                    continue;
                }
            };

            if !enable {
                force_disable(command, current, &mut working, &mut changes);
                continue;
            }
            force_enable(command, current, &mut working, &mut changes);
            for rival in self.groups.rivals_of(&command.name) {
                let Some(rival_command) = self.registry.lookup(rival) else {
                    warn!(
                        group_member = rival,
                        trigger = %command.name,
                        "skipping unregistered mutually exclusive group member"
                    );
                    continue;
                };
                if enqueued.insert(rival_command.name.as_str()) {
                    queue.push_back((rival_command, Transition::GroupDisable));
                }
            }
        }

        if changes.enabled.is_empty() && changes.disabled.is_empty() {
            return Err(SwitchError::NoEffectiveChange);
        }
        debug!(
            mode = mode.as_str(),
            enabled = changes.enabled.len(),
            disabled = changes.disabled.len(),
            "computed switch batch"
        );
        Ok(SwitchOutcome::Applied {
            next: working.into_state(),
            enabled: changes.enabled,
            disabled: changes.disabled,
        })
    }

    /// Canonicalizes and de-duplicates names, failing on any unknown or protected command.
    fn authorize(
        &self,
        names: &[&str],
        authority: &dyn AuthorityResolver,
    ) -> Result<Vec<&'a CommandSpec>, SwitchError> {
        let mut seen = BTreeSet::new();
        let mut forbidden = Vec::new();
        let mut requested = Vec::new();
        for name in names {
            match self.registry.lookup(name) {
                Some(command) if authority.may_configure(command) => {
                    if seen.insert(command.name.as_str()) {
                        requested.push(command);
                    }
                }
                _ => {
                    if !forbidden.iter().any(|entry| entry == name) {
                        forbidden.push(name.to_string());
                    }
                }
            }
        }
        if !forbidden.is_empty() {
            return Err(SwitchError::AuthorizationDenied { names: forbidden });
        }
        Ok(requested)
    }
}

fn list_overrides(state: &ChannelState, mode: SwitchMode) -> SwitchOutcome {
    let enabled = (mode != SwitchMode::ForceDisable && !state.enable.is_empty())
        .then(|| state.enable.clone());
    let disabled = (mode != SwitchMode::ForceEnable && !state.disable.is_empty())
        .then(|| state.disable.clone());
    if enabled.is_none() && disabled.is_none() {
        return SwitchOutcome::NothingToggled;
    }
    SwitchOutcome::Listing {
        enabled,
        disabled,
        reset_hint: mode == SwitchMode::ResetNames,
    }
}

fn reset_command(
    command: &CommandSpec,
    current: bool,
    working: &mut WorkingMembership,
    changes: &mut BatchChanges,
) {
    let initial = command.default_call_policy.enabled_by_default();
    if current != initial {
        if initial {
            changes.enabled.push(command.name.clone());
        } else {
            changes.disabled.push(command.name.clone());
        }
    }
    working.set_enable(&command.name, false);
    working.set_disable(&command.name, false);
}

fn force_enable(
    command: &CommandSpec,
    current: bool,
    working: &mut WorkingMembership,
    changes: &mut BatchChanges,
) {
    let initial = command.default_call_policy.enabled_by_default();
    if !current {
        changes.enabled.push(command.name.clone());
    }
    working.set_enable(&command.name, !initial);
    working.set_disable(&command.name, false);
}

fn force_disable(
    command: &CommandSpec,
    current: bool,
    working: &mut WorkingMembership,
    changes: &mut BatchChanges,
) {
    let initial = command.default_call_policy.enabled_by_default();
    if current {
        changes.disabled.push(command.name.clone());
    }
    working.set_disable(&command.name, initial);
    working.set_enable(&command.name, false);
}
