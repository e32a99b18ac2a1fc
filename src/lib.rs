pub mod analysis;
pub mod config;
pub mod dataset;
pub mod fetch_error;
pub mod fetcher;
pub mod monitor;
pub mod stats_store;
