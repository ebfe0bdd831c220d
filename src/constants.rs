//! Centralized constants for permissions, paths, and limits.

/// Default data root when neither `--root` nor `KEYRELAY_ROOT` is given.
pub const DEFAULT_ROOT: &str = "keyrelay-data";

/// Environment variable overriding the data root.
pub const ROOT_ENV: &str = "KEYRELAY_ROOT";

/// Environment variable carrying the passphrase for non-interactive runs.
pub const PASSPHRASE_ENV: &str = "KEYRELAY_PASSPHRASE";

/// Permission mode for the data root and the texts directory.
pub const DATA_DIR_MODE: u32 = 0o700;

/// Permission mode for credentials, keys and config.
pub const SECRET_FILE_MODE: u32 = 0o600;

/// Default listen address.
pub const DEFAULT_ADDR: &str = "0.0.0.0:9420";

/// Default byte limit for typed and clipped text.
pub const DEFAULT_TEXT_LIMIT: usize = 256;

/// Default byte limit for a saved text set.
pub const DEFAULT_TEXTS_LIMIT: usize = 64 * 1024;

/// Maximum length of a text set name.
pub const MAX_TEXT_SET_NAME: usize = 64;

/// Default pause between macro steps in milliseconds.
pub const DEFAULT_MACRO_PAUSE_MS: u64 = 50;

/// Bounds of the randomized delay after a failed login, in milliseconds.
pub const DEFAULT_FAILURE_DELAY_MS: [u64; 2] = [1000, 3000];

/// Common name of the self-signed certificate.
pub const CERT_COMMON_NAME: &str = "keyrelay";

/// Certificate validity in years.
pub const CERT_VALIDITY_YEARS: i32 = 10;

/// Characters used for the per-process realm key.
pub const REALM_CHARS: &[u8] = b"0123456789ABCDEFGHJKLMNPQRTUVW";

/// Length of the per-process realm key.
pub const REALM_KEY_LEN: usize = 6;
