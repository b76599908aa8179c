#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod event;
pub mod filter;
#[cfg(any(test, feature = "user"))]
pub mod sim;

pub use config::{FilterConfig, SyscallTable};
pub use event::SyscallEvent;
pub use filter::{ProbeEnv, SyscallKind};
