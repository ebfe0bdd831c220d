//! Core business logic modules.

pub mod capabilities;
pub mod client_policy;
pub mod config_file;
pub mod credentials;
pub mod identity;
pub mod paths;
pub mod secret_codec;
