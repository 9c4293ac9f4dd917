//! Command handlers

pub mod config;
pub mod logs;
pub mod status;
pub mod watch;
