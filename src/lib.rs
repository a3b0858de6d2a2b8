pub mod config;
pub mod core;
pub mod postfetch;
pub mod queue;
pub mod recorded;
pub mod stats;
