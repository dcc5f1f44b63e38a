use crate::command_registry::CommandSpec;

/// Supplies the caller's authority and the authority each command requires.
pub trait AuthorityResolver {
    fn caller_authority(&self) -> u32;

    /// Required authority for `command`; may depend on the invocation context.
    fn resolve(&self, command: &CommandSpec) -> u32;

    /// Callers may only configure commands strictly below their own authority.
    fn may_configure(&self, command: &CommandSpec) -> bool {
        self.resolve(command) < self.caller_authority()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Resolver that reads each command's configured authority verbatim.
pub struct StaticAuthority {
    pub caller: u32,
}

impl StaticAuthority {
    pub fn new(caller: u32) -> Self {
        Self { caller }
    }
}

impl AuthorityResolver for StaticAuthority {
    fn caller_authority(&self) -> u32 {
        self.caller
    }

    fn resolve(&self, command: &CommandSpec) -> u32 {
        command.authority
    }
}
