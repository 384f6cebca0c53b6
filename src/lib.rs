pub mod config;
pub mod display;
pub mod error;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod poll;
pub mod reconcile;
pub mod snapshot;
pub mod stats;
