// src/lib.rs
// Library interface for certinfo
pub mod banner;
pub mod cert_parser;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod dedupe;
pub mod error;
pub mod fetcher;
pub mod input;
pub mod output;
pub mod pool;
pub mod progress;
pub mod scope;
pub mod stats;
pub mod target;
pub mod types;
