use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on parent links followed from any command.
pub const MAX_COMMAND_DEPTH: usize = 32;

fn default_command_authority() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
/// Behavior of a command in a channel that carries no explicit override.
pub enum CallPolicy {
    #[default]
    Enabled,
    Disabled,
    AliasOnly,
    AliasOrAppel,
}

impl CallPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::AliasOnly => "aliasOnly",
            Self::AliasOrAppel => "aliasOrAppel",
        }
    }

    /// Returns true when the command responds without an explicit channel opt-in.
    pub fn enabled_by_default(self) -> bool {
        self != Self::Disabled
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// Static configuration of one registered command.
pub struct CommandSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default = "default_command_authority")]
    pub authority: u32,
    #[serde(default)]
    pub default_call_policy: CallPolicy,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            aliases: Vec::new(),
            authority: default_command_authority(),
            default_call_policy: CallPolicy::Enabled,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_authority(mut self, authority: u32) -> Self {
        self.authority = authority;
        self
    }

    pub fn with_call_policy(mut self, policy: CallPolicy) -> Self {
        self.default_call_policy = policy;
        self
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
/// Reasons a command list cannot form a registry.
pub enum RegistryError {
    #[error("command name must not be empty")]
    EmptyName,
    #[error("command '{0}' is registered more than once")]
    DuplicateName(String),
    #[error("alias '{alias}' of command '{command}' collides with an existing name or alias")]
    AliasCollision { alias: String, command: String },
    #[error("command '{command}' declares unknown parent '{parent}'")]
    UnknownParent { command: String, parent: String },
    #[error("command '{0}' is part of a parent cycle")]
    ParentCycle(String),
    #[error("command '{0}' exceeds the maximum hierarchy depth of {MAX_COMMAND_DEPTH}")]
    TooDeep(String),
}

#[derive(Debug, Clone, Default)]
/// Read-only command table with alias resolution and parent links.
pub struct CommandRegistry {
    commands: BTreeMap<String, CommandSpec>,
    aliases: BTreeMap<String, String>,
}

impl CommandRegistry {
    pub fn new(specs: impl IntoIterator<Item = CommandSpec>) -> Result<Self, RegistryError> {
        let mut commands = BTreeMap::new();
        for mut spec in specs {
            spec.name = spec.name.trim().to_string();
            if spec.name.is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if commands.contains_key(&spec.name) {
                return Err(RegistryError::DuplicateName(spec.name));
            }
            commands.insert(spec.name.clone(), spec);
        }

        let mut aliases = BTreeMap::new();
        for spec in commands.values() {
            for alias in &spec.aliases {
                let alias = alias.trim();
                if alias.is_empty() {
                    continue;
                }
                if commands.contains_key(alias)
                    || aliases
                        .insert(alias.to_string(), spec.name.clone())
                        .is_some()
                {
                    return Err(RegistryError::AliasCollision {
                        alias: alias.to_string(),
                        command: spec.name.clone(),
                    });
                }
            }
            if let Some(parent) = spec.parent.as_deref() {
                if !commands.contains_key(parent) {
                    return Err(RegistryError::UnknownParent {
                        command: spec.name.clone(),
                        parent: parent.to_string(),
                    });
                }
            }
        }

        let registry = Self { commands, aliases };
        registry.validate_hierarchy()?;
        Ok(registry)
    }

    fn validate_hierarchy(&self) -> Result<(), RegistryError> {
        for spec in self.commands.values() {
            let mut seen = BTreeSet::from([spec.name.as_str()]);
            let mut cursor = spec.parent.as_deref();
            let mut depth = 0usize;
            while let Some(parent) = cursor {
                if !seen.insert(parent) {
                    return Err(RegistryError::ParentCycle(spec.name.clone()));
                }
                depth += 1;
                if depth > MAX_COMMAND_DEPTH {
                    return Err(RegistryError::TooDeep(spec.name.clone()));
                }
                cursor = self
                    .commands
                    .get(parent)
                    .and_then(|command| command.parent.as_deref());
            }
        }
        Ok(())
    }

    /// Resolves a canonical name or an alias.
    pub fn lookup(&self, name: &str) -> Option<&CommandSpec> {
        let name = name.trim();
        self.commands.get(name).or_else(|| {
            self.aliases
                .get(name)
                .and_then(|canonical| self.commands.get(canonical))
        })
    }

    pub fn parent_of(&self, command: &CommandSpec) -> Option<&CommandSpec> {
        command
            .parent
            .as_deref()
            .and_then(|parent| self.commands.get(parent))
    }

    /// Yields `command` followed by its ancestors, nearest first.
    pub fn lineage<'a>(&'a self, command: &'a CommandSpec) -> Lineage<'a> {
        Lineage {
            registry: self,
            next: Some(command),
            visited: 0,
        }
    }

    pub fn commands(&self) -> impl Iterator<Item = &CommandSpec> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Iterator over a command and its parents, capped at [`MAX_COMMAND_DEPTH`] links.
pub struct Lineage<'a> {
    registry: &'a CommandRegistry,
    next: Option<&'a CommandSpec>,
    visited: usize,
}

impl Lineage<'_> {
    /// True when the walk stopped because the depth cap was hit.
    pub fn truncated(&self) -> bool {
        self.next.is_some() && self.visited > MAX_COMMAND_DEPTH
    }
}

impl<'a> Iterator for Lineage<'a> {
    type Item = &'a CommandSpec;

    fn next(&mut self) -> Option<Self::Item> {
        if self.visited > MAX_COMMAND_DEPTH {
            return None;
        }
        let current = self.next?;
        self.visited += 1;
        self.next = self.registry.parent_of(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::{CallPolicy, CommandRegistry, CommandSpec, RegistryError, MAX_COMMAND_DEPTH};

    fn sample_registry() -> CommandRegistry {
        CommandRegistry::new([
            CommandSpec::new("admin").with_authority(4),
            CommandSpec::new("admin.ban")
                .with_parent("admin")
                .with_alias("ban"),
            CommandSpec::new("dis").with_call_policy(CallPolicy::Disabled),
        ])
        .expect("registry")
    }

    #[test]
    fn unit_call_policy_serializes_camel_case() {
        let raw = serde_json::to_string(&CallPolicy::AliasOrAppel).expect("encode");
        assert_eq!(raw, "\"aliasOrAppel\"");
        let parsed: CallPolicy = serde_json::from_str("\"aliasOnly\"").expect("decode");
        assert_eq!(parsed, CallPolicy::AliasOnly);
        assert!(!CallPolicy::Disabled.enabled_by_default());
        assert!(CallPolicy::AliasOnly.enabled_by_default());
    }

    #[test]
    fn unit_command_spec_defaults_apply_when_fields_are_omitted() {
        let spec: CommandSpec = serde_json::from_str(r#"{"name":"baz"}"#).expect("decode");
        assert_eq!(spec.authority, 1);
        assert_eq!(spec.default_call_policy, CallPolicy::Enabled);
        assert!(spec.parent.is_none());
    }

    #[test]
    fn functional_lookup_resolves_aliases_to_canonical_command() {
        let registry = sample_registry();
        let command = registry.lookup("ban").expect("alias lookup");
        assert_eq!(command.name, "admin.ban");
        assert!(registry.lookup("missing").is_none());
        let lineage = registry
            .lineage(command)
            .map(|entry| entry.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(lineage, vec!["admin.ban", "admin"]);
    }

    #[test]
    fn regression_registry_rejects_parent_cycles() {
        let error = CommandRegistry::new([
            CommandSpec::new("a").with_parent("b"),
            CommandSpec::new("b").with_parent("a"),
        ])
        .expect_err("cycle should fail");
        assert!(matches!(error, RegistryError::ParentCycle(_)));
    }

    #[test]
    fn regression_registry_rejects_alias_shadowing_a_command_name() {
        let error = CommandRegistry::new([
            CommandSpec::new("foo"),
            CommandSpec::new("bar").with_alias("foo"),
        ])
        .expect_err("alias collision should fail");
        assert_eq!(
            error,
            RegistryError::AliasCollision {
                alias: "foo".to_string(),
                command: "bar".to_string(),
            }
        );
    }

    #[test]
    fn regression_registry_rejects_hierarchy_beyond_max_depth() {
        let chain = (0..=MAX_COMMAND_DEPTH + 2).map(|index| {
            let spec = CommandSpec::new(format!("level{index}"));
            match index {
                0 => spec,
                _ => spec.with_parent(format!("level{}", index - 1)),
            }
        });
        let error = CommandRegistry::new(chain).expect_err("deep chain should fail");
        assert!(matches!(error, RegistryError::TooDeep(_)), "{error:?}");

        let at_limit = (0..=MAX_COMMAND_DEPTH).map(|index| {
            let spec = CommandSpec::new(format!("level{index}"));
            match index {
                0 => spec,
                _ => spec.with_parent(format!("level{}", index - 1)),
            }
        });
        let registry = CommandRegistry::new(at_limit).expect("chain at the limit");
        let deepest = registry
            .lookup(&format!("level{MAX_COMMAND_DEPTH}"))
            .expect("deepest");
        assert_eq!(registry.lineage(deepest).count(), MAX_COMMAND_DEPTH + 1);
    }

    #[test]
    fn regression_registry_rejects_unknown_parent() {
        let error = CommandRegistry::new([CommandSpec::new("child").with_parent("ghost")])
            .expect_err("unknown parent should fail");
        assert!(error.to_string().contains("unknown parent 'ghost'"));
    }
}
