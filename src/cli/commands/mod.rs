pub mod config;
pub mod init;
pub mod retry;
pub mod revert;
pub mod status;
pub mod update;
