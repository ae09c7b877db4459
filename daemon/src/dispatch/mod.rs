//! Hotkey dispatch: the binding table, handler bodies and the dispatcher
//! that ties them to the shortcut registry.

mod actions;
mod dispatcher;
mod handlers;

pub use actions::{default_bindings, Action};
pub use dispatcher::HotkeyDispatcher;
pub use handlers::Context;
