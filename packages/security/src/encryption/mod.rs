// ABOUTME: Secret setting encryption using ChaCha20-Poly1305 AEAD
// ABOUTME: Keys come from the machine identity, a user password (Argon2id), or the caller
//
// Machine keys only protect copies of the database taken off this machine; anyone
// with local access can derive the same key. Password keys protect data at rest.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use argon2::{Argon2, ParamsBuilder, Version};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ring::{
    aead::{self, Nonce, UnboundKey},
    error::Unspecified,
    hkdf,
    rand::{SecureRandom, SystemRandom},
};
use subtle::ConstantTimeEq;

/// Application salt mixed into the machine key (constant, not secret)
const APP_SALT: &[u8] = b"latchkey-secret-settings-v1";

/// Nonce size for ChaCha20-Poly1305
const NONCE_SIZE: usize = 12;

pub const KEY_LEN: usize = 32;
pub const SALT_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum EncryptionError {
    #[error("Failed to generate random data: {0}")]
    RandomGeneration(String),

    #[error("Failed to encrypt data: {0}")]
    Encryption(String),

    #[error("Failed to decrypt data: {0}")]
    Decryption(String),

    #[error("Failed to derive encryption key: {0}")]
    KeyDerivation(String),

    #[error("Invalid encrypted data format")]
    InvalidFormat,

    #[error("Invalid encryption mode: {0}")]
    InvalidMode(String),

    #[error("Password required for password-based encryption")]
    PasswordRequired,

    #[error("Invalid password")]
    InvalidPassword,
}

impl From<Unspecified> for EncryptionError {
    fn from(_: Unspecified) -> Self {
        EncryptionError::Encryption("Cryptographic operation failed".to_string())
    }
}

/// Where the cipher key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionMode {
    Machine,
    Password,
    Provided,
}

impl EncryptionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EncryptionMode::Machine => "machine",
            EncryptionMode::Password => "password",
            EncryptionMode::Provided => "provided",
        }
    }
}

impl fmt::Display for EncryptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncryptionMode {
    type Err = EncryptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "machine" => Ok(EncryptionMode::Machine),
            "password" => Ok(EncryptionMode::Password),
            "provided" => Ok(EncryptionMode::Provided),
            _ => Err(EncryptionError::InvalidMode(s.to_string())),
        }
    }
}

/// Authenticated encryption for secret setting values.
///
/// Ciphertext is base64 of `nonce || ciphertext || tag`. The empty string
/// encrypts to the empty string and back, so "nothing stored" and "stored
/// empty" are the same value on disk.
pub struct SecretCipher {
    rng: Arc<SystemRandom>,
    key: [u8; KEY_LEN],
    mode: EncryptionMode,
}

impl fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretCipher")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl SecretCipher {
    /// Key derived from machine ID, user name and host name
    pub fn with_machine_key() -> Result<Self, EncryptionError> {
        let machine_id = machine_uid::get().map_err(|e| {
            EncryptionError::KeyDerivation(format!("Failed to get machine ID: {}", e))
        })?;

        let username = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown-user".to_string());

        let hostname = hostname::get()
            .map_err(|e| EncryptionError::KeyDerivation(format!("Failed to get hostname: {}", e)))?
            .to_string_lossy()
            .to_string();

        let mut material =
            Vec::with_capacity(machine_id.len() + username.len() + hostname.len() + APP_SALT.len());
        material.extend_from_slice(machine_id.as_bytes());
        material.extend_from_slice(username.as_bytes());
        material.extend_from_slice(hostname.as_bytes());
        material.extend_from_slice(APP_SALT);

        let key = hkdf_expand(&material, b"latchkey-machine-salt", b"secret-settings")?;

        Ok(Self::with_key(key, EncryptionMode::Machine))
    }

    /// Key derived from a password with Argon2id
    pub fn with_password(password: &str, salt: &[u8]) -> Result<Self, EncryptionError> {
        let key = argon2_derive(password.as_bytes(), salt)?;
        Ok(Self::with_key(key, EncryptionMode::Password))
    }

    /// Use a caller-supplied key as is
    pub fn with_provided_key(key: [u8; KEY_LEN]) -> Self {
        Self::with_key(key, EncryptionMode::Provided)
    }

    fn with_key(key: [u8; KEY_LEN], mode: EncryptionMode) -> Self {
        Self {
            rng: Arc::new(SystemRandom::new()),
            key,
            mode,
        }
    }

    pub fn mode(&self) -> EncryptionMode {
        self.mode
    }

    pub fn generate_salt() -> Result<Vec<u8>, EncryptionError> {
        let mut salt = vec![0u8; SALT_LEN];
        SystemRandom::new()
            .fill(&mut salt)
            .map_err(|_| EncryptionError::RandomGeneration("Failed to generate salt".to_string()))?;
        Ok(salt)
    }

    /// Password verifier. Derived with a context suffix so it never equals
    /// the encryption key.
    pub fn password_verifier(password: &str, salt: &[u8]) -> Result<Vec<u8>, EncryptionError> {
        let with_context = format!("{}|verification", password);
        Ok(argon2_derive(with_context.as_bytes(), salt)?.to_vec())
    }

    pub fn verify_password(
        password: &str,
        salt: &[u8],
        verifier: &[u8],
    ) -> Result<bool, EncryptionError> {
        let computed = Self::password_verifier(password, salt)?;
        Ok(computed.ct_eq(verifier).unwrap_u8() == 1)
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, EncryptionError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        self.rng.fill(&mut nonce_bytes).map_err(|_| {
            EncryptionError::RandomGeneration("Failed to generate nonce".to_string())
        })?;
        let nonce = Nonce::try_assume_unique_for_key(&nonce_bytes)?;

        let sealing_key = aead::LessSafeKey::new(UnboundKey::new(&aead::CHACHA20_POLY1305, &self.key)?);

        let mut in_out = plaintext.as_bytes().to_vec();
        sealing_key
            .seal_in_place_append_tag(nonce, aead::Aad::empty(), &mut in_out)
            .map_err(|_| EncryptionError::Encryption("Seal operation failed".to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + in_out.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&in_out);

        Ok(BASE64.encode(&sealed))
    }

    pub fn decrypt(&self, ciphertext: &str) -> Result<String, EncryptionError> {
        if ciphertext.is_empty() {
            return Ok(String::new());
        }

        let sealed = BASE64
            .decode(ciphertext)
            .map_err(|_| EncryptionError::InvalidFormat)?;

        if sealed.len() < NONCE_SIZE + aead::CHACHA20_POLY1305.tag_len() {
            return Err(EncryptionError::InvalidFormat);
        }

        let (nonce_bytes, ciphertext_and_tag) = sealed.split_at(NONCE_SIZE);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)?;

        let opening_key = aead::LessSafeKey::new(UnboundKey::new(&aead::CHACHA20_POLY1305, &self.key)?);

        let mut in_out = ciphertext_and_tag.to_vec();
        let plaintext = opening_key
            .open_in_place(nonce, aead::Aad::empty(), &mut in_out)
            .map_err(|_| EncryptionError::Decryption("Open operation failed".to_string()))?;

        String::from_utf8(plaintext.to_vec())
            .map_err(|_| EncryptionError::Decryption("Invalid UTF-8 in decrypted data".to_string()))
    }
}

fn hkdf_expand(material: &[u8], salt: &[u8], info: &[u8]) -> Result<[u8; KEY_LEN], EncryptionError> {
    let prk = hkdf::Salt::new(hkdf::HKDF_SHA256, salt).extract(material);

    let mut key = [0u8; KEY_LEN];
    prk.expand(&[info], hkdf::HKDF_SHA256)
        .map_err(|_| EncryptionError::KeyDerivation("HKDF expansion failed".to_string()))?
        .fill(&mut key)
        .map_err(|_| EncryptionError::KeyDerivation("Key fill failed".to_string()))?;

    Ok(key)
}

fn argon2_derive(secret: &[u8], salt: &[u8]) -> Result<[u8; KEY_LEN], EncryptionError> {
    if secret.is_empty() {
        return Err(EncryptionError::PasswordRequired);
    }
    if salt.len() != SALT_LEN {
        return Err(EncryptionError::KeyDerivation(format!(
            "Salt must be {} bytes",
            SALT_LEN
        )));
    }

    // 64 MB, 3 iterations, 4 lanes
    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(KEY_LEN)
        .build()
        .map_err(|e| EncryptionError::KeyDerivation(format!("Invalid Argon2 params: {}", e)))?;

    let mut key = [0u8; KEY_LEN];
    Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params)
        .hash_password_into(secret, salt, &mut key)
        .map_err(|e| EncryptionError::KeyDerivation(format!("Argon2 derivation failed: {}", e)))?;

    Ok(key)
}
