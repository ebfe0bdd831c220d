//! Remote keyboard, mouse and clipboard control over authenticated HTTPS.
//!
//! A single client at a time drives the local input devices through a small
//! REST API. Credentials and the TLS key live in a data directory, optionally
//! sealed with a passphrase.
//!
//! ## Modules
//! - `cli`: command-line handlers
//! - `core`: secrets, credentials, client policy, capabilities, TLS identity
//! - `driver`: input and clipboard backends
//! - `macros`: macro language parser and interpreter
//! - `models`: configuration file types
//! - `server`: router, access gate, handlers
//! - `util`: filesystem and network interface helpers

pub mod cli;
pub mod constants;
pub mod core;
pub mod driver;
pub mod macros;
pub mod models;
pub mod server;
pub mod util;
