// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Key material used for signing, encryption and TLS.

use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::x509::X509;
use std::collections::BTreeMap;
use std::fmt;

use super::Component;
use crate::error::{BuildError, KeyError};

/// A certificate with its (optional) private key.
#[derive(Clone)]
pub struct KeyEntry {
    certificate: X509,
    private_key: Option<PKey<Private>>,
}

impl fmt::Debug for KeyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyEntry")
            .field("fingerprint", &self.fingerprint().unwrap_or_default())
            .field("has_private_key", &self.private_key.is_some())
            .finish()
    }
}

impl KeyEntry {
    /// Pair a certificate with a private key; the key must belong to the certificate.
    pub fn new(alias: &str, certificate: X509, private_key: Option<PKey<Private>>) -> Result<Self, KeyError> {
        if let Some(key) = &private_key {
            if !certificate.public_key()?.public_eq(key) {
                return Err(KeyError::Mismatch(alias.to_string()));
            }
        }

        Ok(Self {
            certificate,
            private_key,
        })
    }

    pub fn certificate(&self) -> &X509 {
        &self.certificate
    }

    pub fn private_key(&self) -> Option<&PKey<Private>> {
        self.private_key.as_ref()
    }

    /// Lowercase hex SHA-256 of the DER certificate.
    pub fn fingerprint(&self) -> Result<String, KeyError> {
        let digest = self.certificate.digest(MessageDigest::sha256())?;
        Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
    }
}

/// Aliased key store with one default credential.
#[derive(Debug, Clone)]
pub struct KeyManager {
    default_key: String,
    entries: BTreeMap<String, KeyEntry>,
}

impl KeyManager {
    pub fn new(default_key: impl Into<String>) -> Self {
        Self {
            default_key: default_key.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Certificate from PEM, private key from DER (PKCS#8 or traditional).
    pub fn from_pem_and_der(alias: &str, certificate_pem: &[u8], private_key_der: &[u8]) -> Result<Self, KeyError> {
        let certificate = X509::from_pem(certificate_pem)
            .map_err(|_| KeyError::MissingCertificate(alias.to_string()))?;
        let private_key = PKey::private_key_from_der(private_key_der)?;

        let entry = KeyEntry::new(alias, certificate, Some(private_key))?;
        Ok(Self::new(alias).with_entry(alias, entry))
    }

    /// A PEM bundle holding a certificate and a private key, optionally encrypted.
    pub fn from_pem_bundle(alias: &str, bundle: &[u8], passphrase: Option<&str>) -> Result<Self, KeyError> {
        let certificate = X509::from_pem(bundle)
            .map_err(|_| KeyError::MissingCertificate(alias.to_string()))?;
        let private_key = match passphrase {
            Some(pass) => PKey::private_key_from_pem_passphrase(bundle, pass.as_bytes())?,
            None => PKey::private_key_from_pem(bundle)?,
        };

        let entry = KeyEntry::new(alias, certificate, Some(private_key))?;
        Ok(Self::new(alias).with_entry(alias, entry))
    }

    pub fn with_entry(mut self, alias: impl Into<String>, entry: KeyEntry) -> Self {
        self.entries.insert(alias.into(), entry);
        self
    }

    pub fn default_key(&self) -> &str {
        &self.default_key
    }

    pub fn entry(&self, alias: &str) -> Option<&KeyEntry> {
        self.entries.get(alias)
    }

    pub fn default_entry(&self) -> Option<&KeyEntry> {
        self.entry(&self.default_key)
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.entries.contains_key(alias)
    }

    pub fn aliases(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Fingerprint per alias, sorted by alias.
    pub fn fingerprints(&self) -> Result<BTreeMap<String, String>, KeyError> {
        self.entries
            .iter()
            .map(|(alias, entry)| Ok((alias.clone(), entry.fingerprint()?)))
            .collect()
    }
}

impl Component for KeyManager {
    fn component_name(&self) -> &'static str {
        "KeyManager"
    }

    fn finish_init(&self) -> Result<(), BuildError> {
        if !self.contains(&self.default_key) {
            return Err(BuildError::init(
                self.component_name(),
                KeyError::UnknownAlias(self.default_key.clone()).to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CERT: &[u8] = include_bytes!("../../tests/fixtures/sp-cert.pem");
    const KEY: &[u8] = include_bytes!("../../tests/fixtures/sp-key.der");
    const OTHER_KEY: &[u8] = include_bytes!("../../tests/fixtures/other-key.der");
    const BUNDLE: &[u8] = include_bytes!("../../tests/fixtures/sp-bundle.pem");
    const FINGERPRINT: &str = "c8998f753aadb4131ae619eb5ab2159e5391abd1534ea9db6be1db363dbefa12";

    #[test]
    fn test_pem_and_der_pair() {
        let manager = KeyManager::from_pem_and_der("localhost", CERT, KEY).unwrap();

        assert_eq!(manager.default_key(), "localhost");
        assert_eq!(manager.aliases(), vec!["localhost"]);
        let entry = manager.default_entry().unwrap();
        assert!(entry.private_key().is_some());
        assert_eq!(entry.fingerprint().unwrap(), FINGERPRINT);
        assert!(manager.finish_init().is_ok());
    }

    #[test]
    fn test_mismatched_pair_is_rejected() {
        let err = KeyManager::from_pem_and_der("localhost", CERT, OTHER_KEY).unwrap_err();
        assert!(matches!(err, KeyError::Mismatch(alias) if alias == "localhost"));
    }

    #[test]
    fn test_encrypted_bundle() {
        let manager = KeyManager::from_pem_bundle("sp", BUNDLE, Some("changeit")).unwrap();
        assert_eq!(manager.fingerprints().unwrap()["sp"], FINGERPRINT);

        assert!(KeyManager::from_pem_bundle("sp", BUNDLE, Some("wrong")).is_err());
    }

    #[test]
    fn test_garbage_certificate() {
        let err = KeyManager::from_pem_and_der("localhost", b"not a pem", KEY).unwrap_err();
        assert!(matches!(err, KeyError::MissingCertificate(_)));
    }

    #[test]
    fn test_unknown_default_key_fails_init() {
        let manager = KeyManager::from_pem_and_der("localhost", CERT, KEY).unwrap();
        let entry = manager.default_entry().unwrap().clone();
        let renamed = KeyManager::new("apollo").with_entry("localhost", entry);

        assert!(matches!(
            renamed.finish_init(),
            Err(BuildError::Initialization { component: "KeyManager", .. })
        ));
    }
}
