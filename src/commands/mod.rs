//! Commands: named, invokable actions and their registry.

pub mod registry;
pub mod types;

pub use registry::{CommandRegistration, CommandRegistry};
pub use types::{
    resolve_args, ArgResolver, CommandArgs, CommandRule, Icon, Invocable, RegisteredCommand,
};
