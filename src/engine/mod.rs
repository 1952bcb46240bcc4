//! External recognition engine process management.

pub mod adapter;

pub use adapter::{EngineHandle, ExitNotice, build_args, interrupt_pid, spawn};
