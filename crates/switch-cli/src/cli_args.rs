use std::path::PathBuf;

use clap::{Parser, Subcommand};
use switch_runtime::SwitchLocale;

fn parse_locale(value: &str) -> Result<SwitchLocale, String> {
    value.parse::<SwitchLocale>().map_err(|error| error.to_string())
}

#[derive(Debug, Parser)]
#[command(
    name = "switch-rs",
    about = "Per-channel command enable/disable switchboard",
    version
)]
/// Public struct `Cli` used by the `switch-rs` binary.
pub struct Cli {
    #[arg(
        long = "state-dir",
        env = "SWITCH_STATE_DIR",
        default_value = ".switch",
        help = "Directory holding channels.json and the default switch.json"
    )]
    pub state_dir: PathBuf,

    #[arg(
        long = "config",
        env = "SWITCH_CONFIG",
        help = "Switch configuration file (defaults to <state-dir>/switch.json)"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long = "locale",
        env = "SWITCH_LOCALE",
        value_parser = parse_locale,
        help = "Reply locale overriding the configured one (en, zh-CN)"
    )]
    pub locale: Option<SwitchLocale>,

    #[arg(
        long = "channel",
        env = "SWITCH_CHANNEL",
        help = "Channel the command is issued in; omit to act as a direct message"
    )]
    pub channel: Option<String>,

    #[arg(
        long = "authority",
        env = "SWITCH_AUTHORITY",
        default_value_t = 1,
        help = "Authority level of the calling user"
    )]
    pub authority: u32,

    #[command(subcommand)]
    pub command: CliCommand,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| switch_runtime::switch_config_path_for_state_dir(&self.state_dir))
    }
}

#[derive(Debug, Subcommand)]
/// Enumerates supported `CliCommand` values.
pub enum CliCommand {
    /// Run the `switch` chat command, e.g. `switch -- -e dis`.
    Switch {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Evaluate whether chat text such as `/baz -x 1` would get a response.
    Check {
        text: String,
        #[arg(long, help = "The message explicitly addressed the bot")]
        appel: bool,
    },
    /// Print the stored record of the channel.
    Show,
}
