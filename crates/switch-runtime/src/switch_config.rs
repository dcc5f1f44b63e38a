use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use switch_policy::{CommandRegistry, CommandSpec, MutuallyExclusiveGroups};
use tracing::warn;

use crate::switch_messages::SwitchLocale;

pub const SWITCH_CONFIG_SCHEMA_VERSION: u32 = 1;
pub const SWITCH_CONFIG_FILE_NAME: &str = "switch.json";
pub const SWITCH_COMMAND_NAME: &str = "switch";

fn switch_config_schema_version() -> u32 {
    SWITCH_CONFIG_SCHEMA_VERSION
}

fn default_switch_authority() -> u32 {
    3
}

fn default_command_prefix() -> String {
    "/".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// On-disk configuration for the switch runtime.
pub struct SwitchConfigFile {
    #[serde(
        default = "switch_config_schema_version",
        rename = "schema_version"
    )]
    pub schema_version: u32,
    #[serde(default)]
    pub locale: SwitchLocale,
    #[serde(default = "default_switch_authority")]
    pub switch_authority: u32,
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
    #[serde(default)]
    pub commands: Vec<CommandSpec>,
    #[serde(default)]
    pub mutually_exclusive_groups: Vec<Vec<String>>,
}

impl Default for SwitchConfigFile {
    fn default() -> Self {
        Self {
            schema_version: SWITCH_CONFIG_SCHEMA_VERSION,
            locale: SwitchLocale::default(),
            switch_authority: default_switch_authority(),
            command_prefix: default_command_prefix(),
            commands: Vec::new(),
            mutually_exclusive_groups: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
/// Validated configuration the runtime operates on.
pub struct SwitchSettings {
    pub locale: SwitchLocale,
    pub switch_authority: u32,
    pub command_prefix: String,
    pub registry: CommandRegistry,
    pub groups: MutuallyExclusiveGroups,
}

impl SwitchSettings {
    /// Builds the registry and groups, registering `switch` itself when absent.
    pub fn from_config(config: SwitchConfigFile) -> Result<Self> {
        if config.schema_version != SWITCH_CONFIG_SCHEMA_VERSION {
            bail!(
                "unsupported switch config schema_version {} (expected {})",
                config.schema_version,
                SWITCH_CONFIG_SCHEMA_VERSION
            );
        }
        let mut commands = config.commands;
        if !commands
            .iter()
            .any(|command| command.name.trim() == SWITCH_COMMAND_NAME)
        {
            commands.push(
                CommandSpec::new(SWITCH_COMMAND_NAME).with_authority(config.switch_authority),
            );
        }
        let registry =
            CommandRegistry::new(commands).context("invalid switch command registry")?;
        let groups = canonical_group_members(&registry, config.mutually_exclusive_groups);
        let groups =
            MutuallyExclusiveGroups::new(groups).context("invalid mutuallyExclusiveGroups")?;
        let switch_authority = registry
            .lookup(SWITCH_COMMAND_NAME)
            .map(|command| command.authority)
            .unwrap_or(config.switch_authority);
        Ok(Self {
            locale: config.locale,
            switch_authority,
            command_prefix: config.command_prefix,
            registry,
            groups,
        })
    }

    /// Splits `text` into the literal command token and its argument tail.
    pub fn split_invocation<'a>(&self, text: &'a str) -> Option<(&'a str, &'a str)> {
        let trimmed = text.trim();
        let trimmed = if self.command_prefix.is_empty() {
            trimmed
        } else {
            trimmed
                .strip_prefix(self.command_prefix.as_str())
                .unwrap_or(trimmed)
        };
        let mut parts = trimmed.splitn(2, char::is_whitespace);
        let literal = parts.next().filter(|token| !token.is_empty())?;
        let args = parts.next().map(str::trim).unwrap_or_default();
        Some((literal, args))
    }
}

/// Rewrites aliases in group definitions to canonical command names.
///
/// Unregistered members are kept as written; the engine skips them at cascade time.
fn canonical_group_members(
    registry: &CommandRegistry,
    groups: Vec<Vec<String>>,
) -> Vec<Vec<String>> {
    groups
        .into_iter()
        .map(|group| {
            group
                .into_iter()
                .map(|member| match registry.lookup(&member) {
                    Some(command) => command.name.clone(),
                    None => {
                        warn!(
                            group_member = %member.trim(),
                            "mutually exclusive group member is not a registered command"
                        );
                        member
                    }
                })
                .collect()
        })
        .collect()
}

pub fn switch_config_path_for_state_dir(state_dir: &Path) -> PathBuf {
    state_dir.join(SWITCH_CONFIG_FILE_NAME)
}

pub fn load_switch_config_file(path: &Path) -> Result<SwitchConfigFile> {
    if !path.exists() {
        return Ok(SwitchConfigFile::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read switch config {}", path.display()))?;
    serde_json::from_str::<SwitchConfigFile>(&raw)
        .with_context(|| format!("failed to parse switch config {}", path.display()))
}

pub fn load_switch_settings(path: &Path) -> Result<SwitchSettings> {
    let config = load_switch_config_file(path)?;
    SwitchSettings::from_config(config)
        .with_context(|| format!("failed to load switch config {}", path.display()))
}
