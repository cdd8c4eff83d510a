//! Encrypted audit trail
//! Author: cloakdocs maintainers
//! Created: 2026-10-19
//!
//! Every masked value is sealed with a fresh per-document RSA key. The
//! record written next to the anonymized PDF carries only ciphertexts and
//! counts; the private key is stored in its own file and is the only way
//! back to the plaintexts.

pub mod key_store;

pub use key_store::{KeyStore, StoredAudit};

use std::collections::BTreeMap;
use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use openssl::encrypt::{Decrypter, Encrypter};
use openssl::error::ErrorStack;
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private, Public};
use openssl::rsa::{Padding, Rsa};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::AuditConfig;
use crate::error::AuditError;
use crate::types::{Category, ReplacementMap};

/// One sealed entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub category: Category,
    pub token: String,
    /// Base64 of the concatenated OAEP blocks
    pub ciphertext: String,
    /// Normalized plaintext; never serialized
    #[serde(skip)]
    pub plaintext: String,
}

/// Document-level facts safe to show in user-facing statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub options_requested: Vec<Category>,
    pub counts_by_category: BTreeMap<Category, usize>,
    pub timestamp: DateTime<Utc>,
    pub document_sha256: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: String,
    pub entries: Vec<AuditEntry>,
    pub summary: AuditSummary,
}

/// PEM-encoded key pair: PKCS#8 private key, SubjectPublicKeyInfo public key
#[derive(Clone)]
pub struct KeyPair {
    pub private_pem: String,
    pub public_pem: String,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("private_pem", &"<redacted>")
            .field("public_pem", &self.public_pem)
            .finish()
    }
}

/// Audit record plus the key pair that opens it
#[derive(Debug, Clone)]
pub struct SealedAudit {
    pub record: AuditRecord,
    pub keys: KeyPair,
}

/// SHA-256 of the input document, hex encoded
pub fn document_fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn normalize(text: &str) -> String {
    text.replace(['\r', '\n'], " ").trim().to_string()
}

fn oaep_encrypter(key: &PKey<Public>) -> Result<Encrypter<'_>, AuditError> {
    let mut encrypter = Encrypter::new(key)?;
    encrypter.set_rsa_padding(Padding::PKCS1_OAEP)?;
    encrypter.set_rsa_oaep_md(MessageDigest::sha256())?;
    encrypter.set_rsa_mgf1_md(MessageDigest::sha256())?;
    Ok(encrypter)
}

fn oaep_decrypter(key: &PKey<Private>) -> Result<Decrypter<'_>, ErrorStack> {
    let mut decrypter = Decrypter::new(key)?;
    decrypter.set_rsa_padding(Padding::PKCS1_OAEP)?;
    decrypter.set_rsa_oaep_md(MessageDigest::sha256())?;
    decrypter.set_rsa_mgf1_md(MessageDigest::sha256())?;
    Ok(decrypter)
}

/// Encrypts `plaintext` block by block and base64-encodes the concatenation
pub fn encrypt_value(key: &PKey<Public>, plaintext: &str, chunk_size: usize) -> Result<String, AuditError> {
    let encrypter = oaep_encrypter(key)?;
    let mut sealed = Vec::new();
    let bytes = plaintext.as_bytes();
    let chunks: Vec<&[u8]> = if bytes.is_empty() {
        vec![bytes]
    } else {
        bytes.chunks(chunk_size.max(1)).collect()
    };
    for chunk in chunks {
        let mut block = vec![0u8; encrypter.encrypt_len(chunk)?];
        let written = encrypter.encrypt(chunk, &mut block)?;
        block.truncate(written);
        sealed.extend_from_slice(&block);
    }
    Ok(BASE64.encode(sealed))
}

/// Reverses [`encrypt_value`] with the PEM private key
pub fn decrypt(private_pem: &str, ciphertext: &str) -> Result<String, AuditError> {
    let key = PKey::private_key_from_pem(private_pem.as_bytes())
        .map_err(|e| AuditError::InvalidKey(e.to_string()))?;
    let sealed = BASE64
        .decode(ciphertext)
        .map_err(|e| AuditError::Decryption(e.to_string()))?;
    let block_len = key.size();
    if block_len == 0 || sealed.len() % block_len != 0 {
        return Err(AuditError::Decryption("ciphertext length is not a multiple of the key size".into()));
    }

    let decrypter = oaep_decrypter(&key).map_err(|e| AuditError::Decryption(e.to_string()))?;

    let mut plain = Vec::new();
    for block in sealed.chunks(block_len) {
        let mut out = vec![0u8; decrypter.decrypt_len(block).map_err(|e| AuditError::Decryption(e.to_string()))?];
        let written = decrypter
            .decrypt(block, &mut out)
            .map_err(|e| AuditError::Decryption(e.to_string()))?;
        plain.extend_from_slice(&out[..written]);
    }
    String::from_utf8(plain).map_err(|e| AuditError::Decryption(e.to_string()))
}

pub struct AuditEncryptor {
    config: AuditConfig,
}

impl AuditEncryptor {
    pub fn new(config: AuditConfig) -> Self {
        Self { config }
    }

    fn generate_keys(&self) -> Result<KeyPair, AuditError> {
        let rsa = Rsa::generate(self.config.key_bits).map_err(|e| AuditError::KeyGeneration(e.to_string()))?;
        let key = PKey::from_rsa(rsa).map_err(|e| AuditError::KeyGeneration(e.to_string()))?;
        let private_pem = key
            .private_key_to_pem_pkcs8()
            .map_err(|e| AuditError::KeyGeneration(e.to_string()))?;
        let public_pem = key
            .public_key_to_pem()
            .map_err(|e| AuditError::KeyGeneration(e.to_string()))?;
        Ok(KeyPair {
            private_pem: String::from_utf8_lossy(&private_pem).into_owned(),
            public_pem: String::from_utf8_lossy(&public_pem).into_owned(),
        })
    }

    /// Seals every replacement with a fresh key pair
    #[instrument(skip_all, fields(entries = replacements.len()))]
    pub fn seal(
        &self,
        replacements: &ReplacementMap,
        requested: &[Category],
        counts: &BTreeMap<Category, usize>,
        document: &[u8],
    ) -> Result<SealedAudit, AuditError> {
        let keys = self.generate_keys()?;
        let public = PKey::public_key_from_pem(keys.public_pem.as_bytes())
            .map_err(|e| AuditError::InvalidKey(e.to_string()))?;

        let mut entries = Vec::with_capacity(replacements.len());
        for replacement in replacements.iter() {
            let plaintext = normalize(&replacement.text);
            let ciphertext = encrypt_value(&public, &plaintext, self.config.chunk_size)?;
            entries.push(AuditEntry {
                category: replacement.category,
                token: replacement.token.clone(),
                ciphertext,
                plaintext,
            });
        }
        debug!("Sealed {} audit entries", entries.len());

        let record = AuditRecord {
            id: Uuid::new_v4().to_string(),
            entries,
            summary: AuditSummary {
                options_requested: requested.to_vec(),
                counts_by_category: counts.clone(),
                timestamp: Utc::now(),
                document_sha256: document_fingerprint(document),
            },
        };
        info!("🔐 Audit record {} sealed with {} entries", record.id, record.entries.len());
        Ok(SealedAudit { record, keys })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Replacement;

    fn small_config() -> AuditConfig {
        AuditConfig {
            key_bits: 1024,
            chunk_size: 62,
        }
    }

    #[test]
    fn sealed_entries_round_trip() {
        let map = ReplacementMap::from_entries(vec![
            Replacement {
                text: "Jane\nSmith".into(),
                token: "[YAZAR-1]".into(),
                category: Category::AuthorName,
            },
            Replacement {
                text: "Department of Physics, Kocaeli University, Umuttepe Campus, 41380 Izmit, Turkey".into(),
                token: "[KURUM-1]".into(),
                category: Category::InstitutionInfo,
            },
        ]);
        let sealed = AuditEncryptor::new(small_config())
            .seal(&map, &[Category::AuthorName], &map.counts(), b"%PDF-1.5")
            .unwrap();
        assert_eq!(sealed.record.entries.len(), 2);
        for entry in &sealed.record.entries {
            assert_ne!(entry.ciphertext, entry.plaintext);
            assert_eq!(decrypt(&sealed.keys.private_pem, &entry.ciphertext).unwrap(), entry.plaintext);
        }
        assert_eq!(sealed.record.entries[0].plaintext, "Jane Smith");
    }

    #[test]
    fn serialized_record_has_no_plaintext() {
        let map = ReplacementMap::from_entries(vec![Replacement {
            text: "jane@kocaeli.edu.tr".into(),
            token: "[ILETISIM-1]".into(),
            category: Category::ContactInfo,
        }]);
        let sealed = AuditEncryptor::new(small_config())
            .seal(&map, &Category::ALL, &map.counts(), b"")
            .unwrap();
        let json = serde_json::to_string(&sealed.record).unwrap();
        assert!(!json.contains("jane@kocaeli.edu.tr"));
        assert!(!json.contains("PRIVATE KEY"));
    }

    #[test]
    fn wrong_key_cannot_decrypt() {
        let map = ReplacementMap::from_entries(vec![Replacement {
            text: "Jane Smith".into(),
            token: "[YAZAR-1]".into(),
            category: Category::AuthorName,
        }]);
        let encryptor = AuditEncryptor::new(small_config());
        let first = encryptor.seal(&map, &Category::ALL, &map.counts(), b"").unwrap();
        let second = encryptor.seal(&map, &Category::ALL, &map.counts(), b"").unwrap();
        assert!(decrypt(&second.keys.private_pem, &first.record.entries[0].ciphertext).is_err());
    }

    #[test]
    fn fingerprint_is_sha256_hex() {
        assert_eq!(
            document_fingerprint(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
