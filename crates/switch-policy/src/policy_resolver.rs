use serde::Serialize;
use tracing::{debug, warn};

use crate::channel_state::ChannelState;
use crate::command_registry::{CallPolicy, CommandRegistry, CommandSpec};

/// Prefix of the capability names answered by [`can_invoke`].
pub const CAN_INVOKE_CAPABILITY_PREFIX: &str = "can-invoke:";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
/// How an invocation reached the bot.
pub struct InvocationContext {
    /// Text used to call the command, with any command prefix stripped.
    pub literal_invoked_name: String,
    /// The message mentioned or otherwise addressed the bot by name.
    pub addressed_bot_explicitly: bool,
    pub is_direct_message: bool,
}

impl InvocationContext {
    pub fn channel(literal_invoked_name: impl Into<String>) -> Self {
        Self {
            literal_invoked_name: literal_invoked_name.into(),
            ..Self::default()
        }
    }

    pub fn direct(literal_invoked_name: impl Into<String>) -> Self {
        Self {
            literal_invoked_name: literal_invoked_name.into(),
            is_direct_message: true,
            ..Self::default()
        }
    }

    pub fn with_appel(mut self) -> Self {
        self.addressed_bot_explicitly = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Enumerates supported `InvocationDecision` values.
pub enum InvocationDecision {
    Allow { reason_code: String },
    Deny { reason_code: String },
}

impl InvocationDecision {
    fn allow(reason_code: &str) -> Self {
        Self::Allow {
            reason_code: reason_code.to_string(),
        }
    }

    fn deny(reason_code: &str) -> Self {
        Self::Deny {
            reason_code: reason_code.to_string(),
        }
    }

    pub fn reason_code(&self) -> &str {
        match self {
            Self::Allow { reason_code } | Self::Deny { reason_code } => reason_code,
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }

    pub fn as_str(&self) -> &'static str {
        if self.is_allowed() {
            "allow"
        } else {
            "deny"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Outcome of resolving one invocation against a channel.
pub struct InvocationEvaluation {
    pub command: String,
    /// Command in the lineage whose rule produced the decision, if any.
    pub decided_by: Option<String>,
    pub decision: InvocationDecision,
}

/// Decides whether `command` may respond in a channel holding `state`.
///
/// Walks from the invoked command up through its parents. A `disabled` default
/// policy or a channel `disable` entry ends the walk. Alias restrictions are
/// checked on the invoked command only; when they pass the walk continues.
pub fn resolve_invocation(
    registry: &CommandRegistry,
    command: &CommandSpec,
    state: &ChannelState,
    context: &InvocationContext,
) -> InvocationEvaluation {
    let evaluation = |decided_by: Option<&CommandSpec>, decision| InvocationEvaluation {
        command: command.name.clone(),
        decided_by: decided_by.map(|entry| entry.name.clone()),
        decision,
    };

    if context.is_direct_message {
        return evaluation(None, InvocationDecision::allow("allow_direct_message"));
    }

    let mut lineage = registry.lineage(command);
    for (depth, current) in lineage.by_ref().enumerate() {
        let invoked = depth == 0;
        let literal_matches = context.literal_invoked_name == current.name;
        let decision = match current.default_call_policy {
            CallPolicy::Disabled => Some(if state.is_force_enabled(&current.name) {
                InvocationDecision::allow("allow_channel_enabled")
            } else {
                InvocationDecision::deny("deny_default_disabled")
            }),
            _ if state.is_force_disabled(&current.name) => {
                Some(InvocationDecision::deny("deny_channel_disabled"))
            }
            CallPolicy::AliasOnly if invoked && !literal_matches => {
                Some(InvocationDecision::deny("deny_alias_only"))
            }
            CallPolicy::AliasOrAppel
                if invoked && !literal_matches && !context.addressed_bot_explicitly =>
            {
                Some(InvocationDecision::deny("deny_alias_or_appel"))
            }
            _ => None,
        };
        if let Some(decision) = decision {
            debug!(
                command = %command.name,
                decided_by = %current.name,
                decision = decision.as_str(),
                reason_code = decision.reason_code(),
                "resolved command invocation"
            );
            return evaluation(Some(current), decision);
        }
    }

    if lineage.truncated() {
        warn!(
            command = %command.name,
            "command hierarchy exceeded the maximum depth; denying invocation"
        );
        return evaluation(None, InvocationDecision::deny("deny_hierarchy_too_deep"));
    }
    evaluation(None, InvocationDecision::allow("allow_default"))
}

/// Answers a `can-invoke:<command>` capability query without dispatching.
///
/// Returns `None` for other capability names and for unknown commands.
pub fn can_invoke(
    capability: &str,
    registry: &CommandRegistry,
    state: &ChannelState,
    context: &InvocationContext,
) -> Option<bool> {
    let name = capability
        .trim()
        .strip_prefix(CAN_INVOKE_CAPABILITY_PREFIX)?
        .trim();
    let command = registry.lookup(name)?;
    Some(resolve_invocation(registry, command, state, context).decision.is_allowed())
}
