//! Key generation and placeholder encryption for sensitive track data.
//!
//! Payloads are not actually encrypted: the "ciphertext" is the base64 of a JSON
//! envelope `{data, type, timestamp, encrypted: true}`. Every flow records its
//! result on-chain through `FHEEncryption` before anything references it.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use rand::Rng;
use serde::{Deserialize, Serialize};
use smf_core::current_unix_timestamp_ms;
use thiserror::Error;

use crate::bindings::{fhe_encryption, secure_music_flow};
use crate::types::{ContractDeployer, ContractError, TransactionReceipt};

const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 9;

#[derive(Debug, Error)]
/// Enumerates supported `EncryptedDataError` values.
pub enum EncryptedDataError {
    #[error("encryption key not generated")]
    KeyNotGenerated,
    #[error(transparent)]
    Contract(#[from] ContractError),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensitiveDataKind {
    Music,
    Royalty,
    Metadata,
}

/// Decoded form of an encrypted payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    pub data: String,
    #[serde(rename = "type")]
    pub kind: SensitiveDataKind,
    pub timestamp: u64,
    pub encrypted: bool,
}

impl EncryptedEnvelope {
    pub fn seal(data: &str, kind: SensitiveDataKind, timestamp: u64) -> Self {
        Self {
            data: data.to_string(),
            kind,
            timestamp,
            encrypted: true,
        }
    }

    pub fn encode(&self) -> Result<String, EncryptedDataError> {
        Ok(BASE64_STANDARD.encode(serde_json::to_vec(self)?))
    }

    pub fn decode(encoded: &str) -> Result<Self, EncryptedDataError> {
        let raw = BASE64_STANDARD.decode(encoded.trim())?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedKeyPair {
    pub public_key: String,
    pub private_key_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    pub encrypted_data: String,
    pub data_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredMusic {
    pub encrypted_data: String,
    pub data_hash: String,
    pub receipt: TransactionReceipt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MusicRegistration {
    pub title: String,
    pub description: String,
    pub ipfs_hash: String,
    pub recipients: Vec<Address>,
    pub percentages: Vec<u64>,
}

/// Royalty split; serialized field-for-field into the encrypted payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoyaltyInfo {
    pub amount: f64,
    pub currency: String,
    pub recipients: Vec<Address>,
    pub percentages: Vec<u64>,
}

#[derive(Serialize)]
struct MusicMetadata<'a> {
    title: &'a str,
    description: &'a str,
    artist: String,
    timestamp: u64,
}

/// Random 9-character base36 tag appended to generated identifiers.
pub fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| char::from(SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())]))
        .collect()
}

/// One artist's encrypted-data session against deployed contracts.
pub struct EncryptedDataSession {
    chain: Arc<dyn ContractDeployer>,
    artist: Address,
    fhe_encryption: Address,
    secure_music_flow: Address,
    encryption_key: Option<String>,
    clock: fn() -> u64,
    suffix: fn() -> String,
}

impl EncryptedDataSession {
    pub fn new(
        chain: Arc<dyn ContractDeployer>,
        artist: Address,
        fhe_encryption: Address,
        secure_music_flow: Address,
    ) -> Self {
        Self {
            chain,
            artist,
            fhe_encryption,
            secure_music_flow,
            encryption_key: None,
            clock: current_unix_timestamp_ms,
            suffix: random_suffix,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_suffix_source(mut self, suffix: fn() -> String) -> Self {
        self.suffix = suffix;
        self
    }

    /// Resumes a session whose key pair was generated earlier.
    pub fn with_encryption_key(mut self, public_key: impl Into<String>) -> Self {
        self.encryption_key = Some(public_key.into());
        self
    }

    pub fn encryption_key(&self) -> Option<&str> {
        self.encryption_key.as_deref()
    }

    /// Registers a fresh key pair; the public key becomes the session key only
    /// once the transaction is confirmed.
    pub async fn generate_key_pair(&mut self) -> Result<GeneratedKeyPair, EncryptedDataError> {
        let now = (self.clock)();
        let pair = GeneratedKeyPair {
            public_key: format!("fhe_pub_{now}_{}", (self.suffix)()),
            private_key_hash: format!("fhe_priv_hash_{now}_{}", (self.suffix)()),
        };
        self.chain
            .execute(
                self.fhe_encryption,
                &fhe_encryption::generate_fhe_key_pair(&pair.public_key, &pair.private_key_hash),
            )
            .await?;
        tracing::info!(
            artist = %self.artist,
            public_key = %pair.public_key,
            "fhe key pair registered"
        );
        self.encryption_key = Some(pair.public_key.clone());
        Ok(pair)
    }

    pub async fn encrypt_sensitive_data(
        &self,
        data: &str,
        kind: SensitiveDataKind,
    ) -> Result<EncryptedPayload, EncryptedDataError> {
        if self.encryption_key.is_none() {
            return Err(EncryptedDataError::KeyNotGenerated);
        }
        let now = (self.clock)();
        let payload = EncryptedPayload {
            encrypted_data: EncryptedEnvelope::seal(data, kind, now).encode()?,
            data_hash: format!("hash_{now}_{}", (self.suffix)()),
        };
        self.chain
            .execute(
                self.fhe_encryption,
                &fhe_encryption::encrypt_data(data, &payload.data_hash, &payload.encrypted_data),
            )
            .await?;
        tracing::debug!(kind = ?kind, data_hash = %payload.data_hash, "sensitive data recorded");
        Ok(payload)
    }

    /// Encrypts the track metadata, then registers the track with its
    /// royalty split.
    pub async fn register_encrypted_music(
        &self,
        registration: &MusicRegistration,
    ) -> Result<RegisteredMusic, EncryptedDataError> {
        let metadata = serde_json::to_string(&MusicMetadata {
            title: &registration.title,
            description: &registration.description,
            artist: self.artist.to_checksum(None),
            timestamp: (self.clock)(),
        })?;
        let payload = self
            .encrypt_sensitive_data(&metadata, SensitiveDataKind::Music)
            .await?;
        let percentages: Vec<U256> = registration
            .percentages
            .iter()
            .copied()
            .map(U256::from)
            .collect();
        let receipt = self
            .chain
            .execute(
                self.secure_music_flow,
                &secure_music_flow::register_music(
                    &payload.encrypted_data,
                    &registration.ipfs_hash,
                    &registration.recipients,
                    &percentages,
                ),
            )
            .await?;
        Ok(RegisteredMusic {
            encrypted_data: payload.encrypted_data,
            data_hash: payload.data_hash,
            receipt,
        })
    }

    pub async fn encrypt_royalty_data(
        &self,
        royalty: &RoyaltyInfo,
    ) -> Result<EncryptedPayload, EncryptedDataError> {
        let data = serde_json::to_string(royalty)?;
        self.encrypt_sensitive_data(&data, SensitiveDataKind::Royalty)
            .await
    }
}
