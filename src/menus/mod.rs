//! Menus: ordered, context-filtered groupings of commands and submenus.

pub mod registry;
pub mod types;

pub use registry::{MenuRegistration, MenuRegistry};
pub use types::{
    CommandMenuItem, MenuId, MenuItem, MenuResolveOptions, ResolvedCommandItem, ResolvedMenuItem,
    ResolvedSubmenu, SubmenuItem, NAVIGATION_GROUP,
};
