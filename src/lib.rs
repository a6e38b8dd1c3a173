pub mod api;
pub mod cli;
pub mod core;
pub mod notify;
pub mod qstash;
