pub mod beacon;
pub mod cli;
pub mod config;
pub mod endpoint;
pub mod observe;
pub mod transport;

pub use {beacon::Beacon, config::Config, transport::Transport};
