//! Application layer for the `ezshare-sync` binary.

pub(crate) mod exit_handler;
pub(crate) mod runtime;
pub(crate) mod terminal;
