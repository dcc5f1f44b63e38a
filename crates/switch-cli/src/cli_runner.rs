use anyhow::{Context, Result};
use switch_runtime::{load_switch_settings, SwitchCaller, SwitchRuntime};
use switch_store::{ChannelStore, JsonFileChannelStore};

use crate::cli_args::{Cli, CliCommand};

/// Executes one CLI command and returns the text to print.
pub async fn run_cli(cli: &Cli) -> Result<String> {
    let config_path = cli.config_path();
    let mut settings = load_switch_settings(&config_path)?;
    if let Some(locale) = cli.locale {
        settings.locale = locale;
    }
    let store = JsonFileChannelStore::for_state_dir(&cli.state_dir);
    let runtime = SwitchRuntime::new(settings, store);
    let channel_id = cli
        .channel
        .as_deref()
        .map(str::trim)
        .filter(|channel| !channel.is_empty());

    match &cli.command {
        CliCommand::Switch { args } => {
            let caller = SwitchCaller {
                channel_id: channel_id.map(str::to_string),
                authority: cli.authority,
            };
            let reply = runtime
                .execute_switch(&caller, &shell_words::join(args))
                .await?;
            Ok(reply.text)
        }
        CliCommand::Check { text, appel } => {
            let evaluation = runtime
                .check_invocation(channel_id, text, *appel)
                .await?;
            Ok(match evaluation {
                Some(evaluation) => format!(
                    "check: command={} decision={} reason_code={} decided_by={}",
                    evaluation.command,
                    evaluation.decision.as_str(),
                    evaluation.decision.reason_code(),
                    evaluation.decided_by.as_deref().unwrap_or("none")
                ),
                None => format!("check: text={text:?} status=unregistered"),
            })
        }
        CliCommand::Show => {
            let Some(channel_id) = channel_id else {
                return Ok("show: status=no_channel".to_string());
            };
            match runtime.store().load(channel_id).await? {
                Some(record) => serde_json::to_string_pretty(&record)
                    .context("failed to encode channel record"),
                None => Ok(format!("show: channel={channel_id} status=not_attached")),
            }
        }
    }
}
