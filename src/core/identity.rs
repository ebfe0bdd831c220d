//! Self-signed TLS identity: bootstrap, fingerprint, and server config.

use crate::constants;
use crate::core::secret_codec;
use crate::util::fs as app_fs;
use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, Utc};
use rcgen::{
    CertificateParams, DnType, ExtendedKeyUsagePurpose, KeyPair, KeyUsagePurpose,
    PKCS_ECDSA_P384_SHA384,
};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Generate a certificate and key unless either file already exists.
///
/// Returns whether a new identity was written. The key PEM is stored through
/// the secret codec; the certificate is plain PEM.
pub fn ensure_certificate(cert_path: &Path, key_path: &Path, passphrase: &[u8]) -> Result<bool> {
    if cert_path.exists() || key_path.exists() {
        tracing::debug!(cert = %cert_path.display(), "reusing existing TLS identity");
        return Ok(false);
    }
    tracing::info!(cert = %cert_path.display(), "generating self-signed certificate");

    let key_pair = KeyPair::generate_for(&PKCS_ECDSA_P384_SHA384).context("generate EC key")?;
    let mut params = CertificateParams::new(vec![
        constants::CERT_COMMON_NAME.to_string(),
        "localhost".to_string(),
    ])
    .context("certificate parameters")?;
    params
        .distinguished_name
        .push(DnType::CommonName, constants::CERT_COMMON_NAME);

    let today = Utc::now().date_naive();
    let (month, day) = (today.month() as u8, today.day() as u8);
    // Feb 29 does not exist in most target years
    let end_day = if month == 2 && day == 29 { 28 } else { day };
    params.not_before = rcgen::date_time_ymd(today.year(), month, day);
    params.not_after =
        rcgen::date_time_ymd(today.year() + constants::CERT_VALIDITY_YEARS, month, end_day);
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
    ];
    params.extended_key_usages = vec![
        ExtendedKeyUsagePurpose::ServerAuth,
        ExtendedKeyUsagePurpose::ClientAuth,
    ];

    let cert = params.self_signed(&key_pair).context("self-sign certificate")?;
    let key_pem = zeroize::Zeroizing::new(key_pair.serialize_pem());

    app_fs::write_atomic(cert_path, cert.pem().as_bytes())
        .with_context(|| format!("write certificate {}", cert_path.display()))?;
    secret_codec::write_file(key_path, passphrase, key_pem.as_bytes())
        .with_context(|| format!("write key {}", key_path.display()))?;

    tracing::info!(fingerprint = %fingerprint_der(cert.der()), "certificate created");
    Ok(true)
}

/// SHA-256 over the DER encoding, as colon separated upper-case hex.
pub fn fingerprint_der(der: &[u8]) -> String {
    Sha256::digest(der)
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

pub fn fingerprint(cert_path: &Path) -> Result<String> {
    let certs = read_certs(cert_path)?;
    Ok(fingerprint_der(certs[0].as_ref()))
}

fn read_certs(cert_path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let pem = fs::read(cert_path)
        .with_context(|| format!("read certificate {}", cert_path.display()))?;
    let certs = rustls_pemfile::certs(&mut &pem[..])
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("parse certificate {}", cert_path.display()))?;
    if certs.is_empty() {
        bail!("no certificate found in {}", cert_path.display());
    }
    Ok(certs)
}

/// Build a rustls server config from the stored identity.
pub fn load_server_config(
    cert_path: &Path,
    key_path: &Path,
    passphrase: &[u8],
) -> Result<Arc<ServerConfig>> {
    let certs = read_certs(cert_path)?;
    let key_pem = secret_codec::read_file(key_path, passphrase)
        .with_context(|| format!("read key {}", key_path.display()))?;
    let key: PrivateKeyDer<'static> = rustls_pemfile::private_key(&mut &key_pem[..])
        .with_context(|| format!("parse key {}", key_path.display()))?
        .ok_or_else(|| anyhow!("no private key found in {}", key_path.display()))?;

    let mut config =
        ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()
            .context("select TLS protocol versions")?
            .with_no_client_auth()
            .with_single_cert(certs, key)
            .context("configure TLS certificate")?;
    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    Ok(Arc::new(config))
}
