pub mod app;
pub mod config;
pub mod executor;
pub mod fan_out;
pub mod pagination;
pub mod progress;
pub mod remote;
pub mod shared;
pub mod store;
