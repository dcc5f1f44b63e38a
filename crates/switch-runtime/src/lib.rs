//! Host-facing runtime for the `switch` command.
//!
//! Parses `switch` arguments, loads configuration, persists channel overrides
//! through a [`switch_store::ChannelStore`], renders localized replies and
//! exposes the dispatch hooks that suppress responses of disabled commands.

pub mod switch_args;
pub mod switch_config;
pub mod switch_messages;
pub mod switch_runtime;

pub use switch_args::*;
pub use switch_config::*;
pub use switch_messages::*;
pub use switch_runtime::*;
