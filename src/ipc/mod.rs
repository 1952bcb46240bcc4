//! Unix socket IPC between CLI and daemon.

pub mod client;
pub mod protocol;
pub mod server;

pub use protocol::{Command, DaemonEvent, Response};
pub use server::{CommandHandler, IpcServer};
