//! Data structures persisted on disk.

pub mod config;
