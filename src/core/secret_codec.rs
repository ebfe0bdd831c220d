//! Passphrase-protected container for small secrets.
//!
//! Layout of an encoded container:
//!
//! - version 0: `0x00 ‖ plaintext` (no passphrase, stored verbatim)
//! - version 1: `0x01 ‖ salt[16] ‖ nonce[12] ‖ ciphertext‖tag`
//!
//! Version 1 derives a 32-byte key with Argon2id from the passphrase and a
//! fresh salt, then seals the payload with ChaCha20-Poly1305 under a fresh
//! nonce. Salt and nonce are regenerated on every write.

use anyhow::{Context, Result};
use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::{rngs::OsRng, RngCore};
use std::fs;
use std::path::Path;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::util::fs as app_fs;

/// Container version for cleartext payloads.
pub const VERSION_PLAIN: u8 = 0;
/// Container version for Argon2id + ChaCha20-Poly1305 payloads.
pub const VERSION_SEALED: u8 = 1;

pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;
pub const KEY_LEN: usize = 32;

const KDF_MEMORY_KIB: u32 = 64 * 1024;
const KDF_ITERATIONS: u32 = 3;
const KDF_PARALLELISM: u32 = 2;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("container is empty")]
    Empty,
    #[error("container version {found}, expected {expected}")]
    VersionMismatch { found: u8, expected: u8 },
    #[error("container truncated")]
    Truncated,
    #[error("authentication failed (wrong passphrase or corrupted data)")]
    Authentication,
    #[error("key derivation failed: {0}")]
    Kdf(String),
}

/// Derive a symmetric key from a secret and salt using Argon2id.
///
/// Also used by the credential store to hash passwords.
pub fn derive_key(secret: &[u8], salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>, DecodeError> {
    let params = Params::new(KDF_MEMORY_KIB, KDF_ITERATIONS, KDF_PARALLELISM, Some(KEY_LEN))
        .map_err(|e| DecodeError::Kdf(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(secret, salt, &mut key[..])
        .map_err(|e| DecodeError::Kdf(e.to_string()))?;
    Ok(key)
}

/// Generate `N` random bytes from the OS generator.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    OsRng.fill_bytes(&mut buf);
    buf
}

/// Encode `plaintext` into a container. An empty passphrase yields version 0.
pub fn encrypt(passphrase: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, DecodeError> {
    if passphrase.is_empty() {
        let mut out = Vec::with_capacity(plaintext.len() + 1);
        out.push(VERSION_PLAIN);
        out.extend_from_slice(plaintext);
        return Ok(out);
    }

    let salt: [u8; SALT_LEN] = random_bytes();
    let nonce: [u8; NONCE_LEN] = random_bytes();
    let key = derive_key(passphrase, &salt)?;
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key[..]));
    let sealed = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| DecodeError::Authentication)?;

    let mut out = Vec::with_capacity(1 + SALT_LEN + NONCE_LEN + sealed.len());
    out.push(VERSION_SEALED);
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Decode a container. The expected version follows from whether a passphrase is given.
pub fn decrypt(passphrase: &[u8], container: &[u8]) -> Result<Zeroizing<Vec<u8>>, DecodeError> {
    let (&version, body) = container.split_first().ok_or(DecodeError::Empty)?;

    if passphrase.is_empty() {
        if version != VERSION_PLAIN {
            return Err(DecodeError::VersionMismatch {
                found: version,
                expected: VERSION_PLAIN,
            });
        }
        return Ok(Zeroizing::new(body.to_vec()));
    }

    if version != VERSION_SEALED {
        return Err(DecodeError::VersionMismatch {
            found: version,
            expected: VERSION_SEALED,
        });
    }
    if body.len() < SALT_LEN + NONCE_LEN {
        return Err(DecodeError::Truncated);
    }
    let (salt, rest) = body.split_at(SALT_LEN);
    let (nonce, sealed) = rest.split_at(NONCE_LEN);

    let key = derive_key(passphrase, salt)?;
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key[..]));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| DecodeError::Authentication)?;
    Ok(Zeroizing::new(plaintext))
}

/// Encrypt `data` and write it atomically with owner-only permissions.
pub fn write_file(path: &Path, passphrase: &[u8], data: &[u8]) -> Result<()> {
    let container =
        encrypt(passphrase, data).with_context(|| format!("encrypt {}", path.display()))?;
    app_fs::write_atomic(path, &container)
}

/// Read and decrypt a container file.
pub fn read_file(path: &Path, passphrase: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let container = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let plaintext =
        decrypt(passphrase, &container).with_context(|| format!("decrypt {}", path.display()))?;
    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CLEARTEXT: &[u8] = b"This is the clear text.";

    #[test]
    fn test_roundtrip_with_passphrase() {
        let container = encrypt(b"secret", CLEARTEXT).unwrap();
        assert_eq!(container[0], VERSION_SEALED);
        let plain = decrypt(b"secret", &container).unwrap();
        assert_eq!(plain.as_slice(), CLEARTEXT);
    }

    #[test]
    fn test_roundtrip_without_passphrase() {
        let container = encrypt(b"", CLEARTEXT).unwrap();
        assert_eq!(container[0], VERSION_PLAIN);
        assert_eq!(&container[1..], CLEARTEXT);
        let plain = decrypt(b"", &container).unwrap();
        assert_eq!(plain.as_slice(), CLEARTEXT);
    }

    #[test]
    fn test_salt_and_nonce_fresh_per_write() {
        let a = encrypt(b"secret", CLEARTEXT).unwrap();
        let b = encrypt(b"secret", CLEARTEXT).unwrap();
        assert_ne!(a[1..1 + SALT_LEN], b[1..1 + SALT_LEN]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_corrupted_byte_fails() {
        let mut container = encrypt(b"secret", CLEARTEXT).unwrap();
        let mid = container.len() / 2;
        container[mid] ^= 0x01;
        let err = decrypt(b"secret", &container).unwrap_err();
        assert!(matches!(err, DecodeError::Authentication));
    }

    #[test]
    fn test_wrong_passphrase_fails() {
        let container = encrypt(b"secret", CLEARTEXT).unwrap();
        let err = decrypt(b"wrong", &container).unwrap_err();
        assert!(matches!(err, DecodeError::Authentication));
    }

    #[test]
    fn test_version_mismatch_is_hard_error() {
        let sealed = encrypt(b"secret", CLEARTEXT).unwrap();
        assert!(matches!(
            decrypt(b"", &sealed).unwrap_err(),
            DecodeError::VersionMismatch { found: 1, expected: 0 }
        ));

        let plain = encrypt(b"", CLEARTEXT).unwrap();
        assert!(matches!(
            decrypt(b"secret", &plain).unwrap_err(),
            DecodeError::VersionMismatch { found: 0, expected: 1 }
        ));
    }

    #[test]
    fn test_truncated_and_empty() {
        assert!(matches!(decrypt(b"", &[]).unwrap_err(), DecodeError::Empty));
        let container = encrypt(b"secret", CLEARTEXT).unwrap();
        assert!(matches!(
            decrypt(b"secret", &container[..10]).unwrap_err(),
            DecodeError::Truncated
        ));
        // Header intact but tag cut off
        let cut = &container[..1 + SALT_LEN + NONCE_LEN + 4];
        assert!(matches!(
            decrypt(b"secret", cut).unwrap_err(),
            DecodeError::Authentication
        ));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blob");
        write_file(&path, b"pw", CLEARTEXT).unwrap();
        assert_eq!(read_file(&path, b"pw").unwrap().as_slice(), CLEARTEXT);
        assert!(read_file(&path, b"nope").is_err());
    }
}
