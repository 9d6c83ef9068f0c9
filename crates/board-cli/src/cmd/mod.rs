pub mod config;
pub mod init;
pub mod item;
pub mod serve;
pub mod show;
pub mod stats;
