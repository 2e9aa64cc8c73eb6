//! Command implementations that do not need an opened workspace.

pub mod init;
