//! Utility modules for filesystem and network interface access.

pub mod fs;
pub mod netif;
