//! Distributed statistics backend on a replicated document store

mod cluster;
mod store;
pub mod term;
pub mod wire;

pub use cluster::{DocumentCluster, TableSpec, WireCluster, WriteSummary};
pub use store::{DistributedOptions, DistributedStatsStore, PRIMARY_KEY};
pub use wire::{ServerAddr, DEFAULT_PORT};
