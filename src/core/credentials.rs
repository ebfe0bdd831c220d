//! HTTP basic-auth credentials: one user with a salted Argon2id password hash.
//!
//! The on-disk form is three lines (user, base64 salt, base64 hash) sealed
//! in a secret container. A legacy single `user:password` line is accepted
//! on read and rehashed in memory.

use crate::core::secret_codec::{self, SALT_LEN, VERSION_PLAIN, VERSION_SEALED};
use anyhow::{bail, Context, Result};
use base64::prelude::*;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

#[derive(Default)]
struct Record {
    user: String,
    salt: Vec<u8>,
    hash: Vec<u8>,
    /// Last password that passed a full hash check. Never persisted.
    cleartext: Option<Zeroizing<String>>,
}

#[derive(Default)]
pub struct CredentialStore {
    record: Mutex<Record>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("user", &self.lock().user)
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl CredentialStore {
    pub fn new(user: &str, password: &str) -> Result<Self> {
        let store = Self::default();
        store.set(user, password)?;
        Ok(store)
    }

    fn lock(&self) -> MutexGuard<'_, Record> {
        self.record.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn user(&self) -> String {
        self.lock().user.clone()
    }

    pub fn is_configured(&self) -> bool {
        let record = self.lock();
        !record.user.is_empty() && !record.hash.is_empty()
    }

    /// Replace the credentials with a freshly salted hash of `password`.
    pub fn set(&self, user: &str, password: &str) -> Result<()> {
        if user.is_empty() {
            bail!("user name cannot be empty");
        }
        if user.contains(':') || user.contains('\n') {
            bail!("user name must not contain ':' or line breaks");
        }
        let salt: [u8; SALT_LEN] = secret_codec::random_bytes();
        let hash = secret_codec::derive_key(password.as_bytes(), &salt)
            .context("hash password")?;

        let mut record = self.lock();
        record.user = user.to_string();
        record.salt = salt.to_vec();
        record.hash = hash.to_vec();
        record.cleartext = None;
        Ok(())
    }

    /// Verify a user/password pair.
    ///
    /// After the first success the cleartext is cached and later checks are
    /// answered by comparing against it instead of rehashing.
    pub fn check(&self, user: &str, password: &str) -> bool {
        let mut record = self.lock();
        if record.hash.is_empty() {
            return false;
        }
        if !bool::from(record.user.as_bytes().ct_eq(user.as_bytes())) {
            return false;
        }
        if let Some(cached) = &record.cleartext {
            return bool::from(cached.as_bytes().ct_eq(password.as_bytes()));
        }
        let hash = match secret_codec::derive_key(password.as_bytes(), &record.salt) {
            Ok(h) => h,
            Err(e) => {
                tracing::error!(error = %e, "password hashing failed");
                return false;
            }
        };
        let ok = bool::from(hash.as_slice().ct_eq(&record.hash));
        if ok {
            record.cleartext = Some(Zeroizing::new(password.to_string()));
        }
        ok
    }

    /// Serialize to the three-line form and write it sealed under `passphrase`.
    pub fn write_file(&self, path: &Path, passphrase: &[u8]) -> Result<()> {
        let content = {
            let record = self.lock();
            if record.hash.is_empty() {
                bail!("no credentials set");
            }
            Zeroizing::new(format!(
                "{}\n{}\n{}\n",
                record.user,
                BASE64_STANDARD.encode(&record.salt),
                BASE64_STANDARD.encode(&record.hash)
            ))
        };
        secret_codec::write_file(path, passphrase, content.as_bytes())
            .with_context(|| format!("write credentials {}", path.display()))
    }

    pub fn read_file(path: &Path, passphrase: &[u8]) -> Result<Self> {
        tracing::debug!(file = %path.display(), "reading basic auth credentials");
        let raw = Zeroizing::new(
            fs::read(path).with_context(|| format!("read credentials {}", path.display()))?,
        );
        let text = match raw.first() {
            Some(&VERSION_PLAIN) | Some(&VERSION_SEALED) => {
                let plain = secret_codec::decrypt(passphrase, &raw)
                    .with_context(|| format!("decrypt credentials {}", path.display()))?;
                Zeroizing::new(
                    String::from_utf8(plain.to_vec())
                        .with_context(|| format!("credentials {} not UTF-8", path.display()))?,
                )
            }
            Some(_) => Zeroizing::new(
                String::from_utf8(raw.to_vec())
                    .with_context(|| format!("credentials {} not UTF-8", path.display()))?,
            ),
            None => bail!("credentials file {} is empty", path.display()),
        };
        Self::parse(&text).with_context(|| format!("parse credentials {}", path.display()))
    }

    fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines();
        let first = match lines.next() {
            Some(line) if !line.is_empty() => line,
            _ => bail!("credentials are empty"),
        };

        if first.contains(':') {
            let parts: Vec<&str> = first.split(':').collect();
            if parts.len() != 2 {
                bail!("invalid cleartext credentials line");
            }
            tracing::warn!("credentials file is in cleartext form");
            tracing::info!("run `keyrelay set-auth` to store a hashed password");
            return Self::new(parts[0], parts[1]);
        }

        let salt = match lines.next() {
            Some(line) => BASE64_STANDARD.decode(line.trim()).context("decode salt")?,
            None => bail!("premature end of credentials (salt missing)"),
        };
        let hash = match lines.next() {
            Some(line) => BASE64_STANDARD.decode(line.trim()).context("decode hash")?,
            None => bail!("premature end of credentials (hash missing)"),
        };
        if hash.is_empty() {
            bail!("empty password hash");
        }
        Ok(Self {
            record: Mutex::new(Record {
                user: first.to_string(),
                salt,
                hash,
                cleartext: None,
            }),
        })
    }
}
