use std::collections::BTreeSet;

use anyhow::{Context, Result};
use async_trait::async_trait;
use switch_policy::{
    can_invoke, resolve_invocation, AuthorityResolver, ChannelState, InvocationContext,
    InvocationEvaluation, StaticAuthority, SwitchEngine, SwitchError, SwitchMode, SwitchOutcome,
};
use switch_store::ChannelStore;
use tracing::{debug, info};

use crate::switch_args::{parse_switch_args, ParsedSwitchArgs};
use crate::switch_config::{SwitchSettings, SWITCH_COMMAND_NAME};
use crate::switch_messages::SwitchMessage;

/// Channel record fields the visibility check reads.
pub const SWITCH_CHANNEL_FIELDS: [&str; 2] = ["enable", "disable"];

#[derive(Debug, Clone, PartialEq, Eq)]
/// Who runs `switch` and from where.
pub struct SwitchCaller {
    /// Channel the command was sent in; `None` for direct messages.
    pub channel_id: Option<String>,
    pub authority: u32,
}

impl SwitchCaller {
    pub fn in_channel(channel_id: impl Into<String>, authority: u32) -> Self {
        Self {
            channel_id: Some(channel_id.into()),
            authority,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Reply of one `switch` invocation.
pub struct SwitchReply {
    pub message: SwitchMessage,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A command about to be dispatched, as seen by the dispatch hooks.
pub struct Invocation {
    pub channel_id: Option<String>,
    /// Canonical name or alias of the command being dispatched.
    pub command: String,
    pub context: InvocationContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Enumerates supported `AttachOutcome` values.
pub enum AttachOutcome {
    Continue,
    /// The host must produce no output at all for this invocation.
    SuppressResponse,
}

/// Callbacks a host dispatcher invokes around channel attachment.
#[async_trait]
pub trait DispatchHook: Send + Sync {
    /// Adds the channel fields this hook needs before the channel record is loaded.
    fn declare_channel_fields(&self, fields: &mut BTreeSet<&'static str>);

    /// Runs after the channel is attached and before the command executes.
    async fn on_attach(&self, invocation: &Invocation) -> Result<AttachOutcome>;
}

/// Switch command runtime bound to a settings snapshot and a channel store.
pub struct SwitchRuntime<S: ChannelStore> {
    settings: SwitchSettings,
    store: S,
}

impl<S: ChannelStore> SwitchRuntime<S> {
    pub fn new(settings: SwitchSettings, store: S) -> Self {
        Self { settings, store }
    }

    pub fn settings(&self) -> &SwitchSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs `switch <command_args>` with the configured authority of each command.
    pub async fn execute_switch(
        &self,
        caller: &SwitchCaller,
        command_args: &str,
    ) -> Result<SwitchReply> {
        let authority = StaticAuthority::new(caller.authority);
        self.execute_switch_with_authority(caller.channel_id.as_deref(), &authority, command_args)
            .await
    }

    /// Runs `switch <command_args>` with a host-supplied authority resolver.
    pub async fn execute_switch_with_authority(
        &self,
        channel_id: Option<&str>,
        authority: &dyn AuthorityResolver,
        command_args: &str,
    ) -> Result<SwitchReply> {
        let message = self
            .switch_message(channel_id, authority, command_args)
            .await?;
        Ok(SwitchReply {
            text: message.render(self.settings.locale),
            message,
        })
    }

    async fn switch_message(
        &self,
        channel_id: Option<&str>,
        authority: &dyn AuthorityResolver,
        command_args: &str,
    ) -> Result<SwitchMessage> {
        let required = self
            .settings
            .registry
            .lookup(SWITCH_COMMAND_NAME)
            .map(|command| authority.resolve(command))
            .unwrap_or(self.settings.switch_authority);
        if authority.caller_authority() < required {
            return Ok(SwitchMessage::LowAuthority);
        }
        let args = match parse_switch_args(command_args)? {
            ParsedSwitchArgs::Args(args) => args,
            ParsedSwitchArgs::Usage(text) => return Ok(SwitchMessage::Usage(text)),
        };
        let mode = match SwitchMode::from_flags(args.flags()) {
            Ok(mode) => mode,
            Err(error) => return Ok(switch_error_message(error)),
        };

        let (channel_id, record) = match args.channel.as_deref().map(str::trim) {
            Some("") => return Ok(SwitchMessage::ChannelNotFound),
            Some(target) => match self.store.load(target).await? {
                Some(record) => (target, record),
                None => return Ok(SwitchMessage::ChannelNotFound),
            },
            None => match channel_id {
                Some(current) => (current, self.store.attach(current).await?),
                None => return Ok(SwitchMessage::ChannelNotFound),
            },
        };

        let state = record.state();
        let engine = SwitchEngine::new(&self.settings.registry, &self.settings.groups);
        let outcome = match engine.apply(&state, &args.names, mode, authority) {
            Ok(outcome) => outcome,
            Err(error) => {
                debug!(channel_id, mode = mode.as_str(), %error, "switch request rejected");
                return Ok(switch_error_message(error));
            }
        };

        if let Some(next) = outcome.next_state() {
            self.store
                .save(channel_id, next)
                .await
                .with_context(|| format!("failed to persist switch state for {channel_id}"))?;
            info!(
                channel_id,
                mode = mode.as_str(),
                enable = next.enable.len(),
                disable = next.disable.len(),
                "applied switch request"
            );
        }

        Ok(match outcome {
            SwitchOutcome::NothingToggled => SwitchMessage::NoneToggled,
            SwitchOutcome::Listing {
                enabled,
                disabled,
                reset_hint,
            } => SwitchMessage::Listing {
                enabled,
                disabled,
                reset_hint,
            },
            SwitchOutcome::ResetAll { .. } => SwitchMessage::ResetAllDone,
            SwitchOutcome::Applied {
                enabled, disabled, ..
            } => SwitchMessage::Applied { enabled, disabled },
        })
    }

    /// Resolves chat text such as `/baz -x 1` and evaluates its visibility.
    ///
    /// Returns `None` when the first token names no registered command.
    pub async fn check_invocation(
        &self,
        channel_id: Option<&str>,
        text: &str,
        addressed_bot_explicitly: bool,
    ) -> Result<Option<InvocationEvaluation>> {
        let Some((literal, _)) = self.settings.split_invocation(text) else {
            return Ok(None);
        };
        let invocation = Invocation {
            channel_id: channel_id.map(str::to_string),
            command: literal.to_string(),
            context: InvocationContext {
                literal_invoked_name: literal.to_string(),
                addressed_bot_explicitly,
                is_direct_message: channel_id.is_none(),
            },
        };
        self.evaluate(&invocation).await
    }

    /// Evaluates an already-parsed invocation against its channel's overrides.
    pub async fn evaluate(&self, invocation: &Invocation) -> Result<Option<InvocationEvaluation>> {
        let Some(command) = self.settings.registry.lookup(&invocation.command) else {
            return Ok(None);
        };
        let state = self
            .channel_state(invocation.channel_id.as_deref(), &invocation.context)
            .await?;
        Ok(Some(resolve_invocation(
            &self.settings.registry,
            command,
            &state,
            &invocation.context,
        )))
    }

    /// Answers `can-invoke:<command>` for a channel without dispatching.
    pub async fn can_invoke(
        &self,
        capability: &str,
        channel_id: Option<&str>,
        context: &InvocationContext,
    ) -> Result<Option<bool>> {
        let state = self.channel_state(channel_id, context).await?;
        Ok(can_invoke(
            capability,
            &self.settings.registry,
            &state,
            context,
        ))
    }

    async fn channel_state(
        &self,
        channel_id: Option<&str>,
        context: &InvocationContext,
    ) -> Result<ChannelState> {
        match channel_id {
            Some(channel_id) if !context.is_direct_message => Ok(self
                .store
                .attach(channel_id)
                .await
                .with_context(|| format!("failed to attach channel {channel_id}"))?
                .state()),
            _ => Ok(ChannelState::default()),
        }
    }
}

#[async_trait]
impl<S: ChannelStore> DispatchHook for SwitchRuntime<S> {
    fn declare_channel_fields(&self, fields: &mut BTreeSet<&'static str>) {
        fields.extend(SWITCH_CHANNEL_FIELDS);
    }

    async fn on_attach(&self, invocation: &Invocation) -> Result<AttachOutcome> {
        let Some(evaluation) = self.evaluate(invocation).await? else {
            return Ok(AttachOutcome::Continue);
        };
        if evaluation.decision.is_allowed() {
            return Ok(AttachOutcome::Continue);
        }
        debug!(
            command = %evaluation.command,
            reason_code = evaluation.decision.reason_code(),
            "suppressing response for disallowed command"
        );
        Ok(AttachOutcome::SuppressResponse)
    }
}

fn switch_error_message(error: SwitchError) -> SwitchMessage {
    match error {
        SwitchError::ConfigConflict => SwitchMessage::Conflict,
        SwitchError::AuthorizationDenied { names } => SwitchMessage::Forbidden(names),
        SwitchError::NoEffectiveChange => SwitchMessage::Unchanged,
    }
}
