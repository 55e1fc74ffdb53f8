pub mod cli;
pub mod config;
pub mod time;

pub use config::Configuration;
pub use time::TimeRange;
