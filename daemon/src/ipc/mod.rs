//! IPC module for daemon-UI communication

mod protocol;
mod server;

pub use protocol::Notification;
pub use server::{Server, ServerContext};
