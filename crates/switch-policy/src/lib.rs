//! Per-channel command visibility policy for chat bots.
//!
//! Resolves whether an invocation may respond in a channel, walking the command
//! hierarchy, and computes how `switch` requests mutate a channel's
//! force-enable/force-disable lists, including mutually exclusive groups.
//!
//! ```rust
//! use switch_policy::{
//!     ChannelState, CommandRegistry, CommandSpec, MutuallyExclusiveGroups, StaticAuthority,
//!     SwitchEngine, SwitchMode, SwitchOutcome,
//! };
//!
//! let registry = CommandRegistry::new([CommandSpec::new("baz")]).unwrap();
//! let groups = MutuallyExclusiveGroups::default();
//! let outcome = SwitchEngine::new(&registry, &groups)
//!     .apply(
//!         &ChannelState::default(),
//!         &["baz".to_string()],
//!         SwitchMode::Toggle,
//!         &StaticAuthority::new(3),
//!     )
//!     .unwrap();
//! assert!(matches!(outcome, SwitchOutcome::Applied { ref disabled, .. } if disabled == &["baz"]));
//! ```

pub mod authority;
pub mod channel_state;
pub mod command_registry;
pub mod exclusive_groups;
pub mod policy_resolver;
pub mod toggle_engine;

pub use authority::*;
pub use channel_state::*;
pub use command_registry::*;
pub use exclusive_groups::*;
pub use policy_resolver::*;
pub use toggle_engine::*;
