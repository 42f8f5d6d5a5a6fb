//! CLI command implementations

pub mod account;
pub mod batch;
pub mod calendar;
pub mod completions;
pub mod config;
pub mod images;
pub mod init;
pub mod protocol;
pub mod tasks;
pub mod utils;
