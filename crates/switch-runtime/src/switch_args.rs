use anyhow::{Context, Result};
use clap::Parser;
use switch_policy::SwitchFlags;

use crate::switch_config::SWITCH_COMMAND_NAME;

#[derive(Debug, Clone, Parser, PartialEq, Eq)]
#[command(
    name = "switch",
    about = "Enable or disable commands in the current channel",
    disable_version_flag = true
)]
/// Arguments accepted by the in-chat `switch` command.
pub struct SwitchArgs {
    #[arg(short = 'e', long = "enable", help = "Force-enable the named commands")]
    pub enable: bool,

    #[arg(short = 'd', long = "disable", help = "Force-disable the named commands")]
    pub disable: bool,

    #[arg(
        short = 'r',
        long = "reset",
        help = "Drop channel overrides for the named commands"
    )]
    pub reset: bool,

    #[arg(
        short = 'R',
        long = "reset-all",
        help = "Drop every channel override in the channel"
    )]
    pub reset_all: bool,

    #[arg(
        short = 'c',
        long = "channel",
        value_name = "CHANNEL",
        help = "Operate on another channel instead of the current one"
    )]
    pub channel: Option<String>,

    #[arg(value_name = "COMMAND")]
    pub names: Vec<String>,
}

impl SwitchArgs {
    pub fn flags(&self) -> SwitchFlags {
        SwitchFlags {
            enable: self.enable,
            disable: self.disable,
            reset: self.reset,
            reset_all: self.reset_all,
        }
    }
}

/// Outcome of reading the text after the `switch` command name.
#[derive(Debug)]
pub enum ParsedSwitchArgs {
    Args(SwitchArgs),
    /// Help output or a usage error rendered by clap.
    Usage(String),
}

/// Tokenizes `command_args` shell-style and parses them as [`SwitchArgs`].
///
/// Fails only when quoting is malformed.
pub fn parse_switch_args(command_args: &str) -> Result<ParsedSwitchArgs> {
    let tokens = shell_words::split(command_args)
        .with_context(|| format!("failed to tokenize switch arguments '{command_args}'"))?;
    let argv = std::iter::once(SWITCH_COMMAND_NAME.to_string()).chain(tokens);
    match SwitchArgs::try_parse_from(argv) {
        Ok(args) => Ok(ParsedSwitchArgs::Args(args)),
        Err(error) => Ok(ParsedSwitchArgs::Usage(error.to_string().trim_end().to_string())),
    }
}
