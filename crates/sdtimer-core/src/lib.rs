pub mod config;
pub mod duration;
pub mod ipc;
pub mod settings;
