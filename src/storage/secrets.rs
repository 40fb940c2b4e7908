//! Secret Storage
//!
//! Provider API keys and the proxy password never go into settings.json.
//! They are kept as a name -> value map in `secrets.enc`, encrypted with
//! AES-256-GCM under a random per-install key in `secrets.key`. Both files
//! live next to the settings file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use persona_chat_llm::ProviderType;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::utils::error::{AppError, AppResult};

const SECRETS_FILE: &str = "secrets.enc";
const KEY_FILE: &str = "secrets.key";
const NONCE_SIZE: usize = 12;
const KEY_SIZE: usize = 32;

/// Entry name for the proxy password.
pub const PROXY_PASSWORD: &str = "proxy.password";

/// Entry name for a provider's API key.
pub fn api_key_entry(provider: ProviderType) -> String {
    format!("api_key.{}", provider)
}

/// Encrypted name -> value store
pub struct SecretStore {
    dir: PathBuf,
    entries: BTreeMap<String, String>,
}

impl std::fmt::Debug for SecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretStore")
            .field("dir", &self.dir)
            .field("entries", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SecretStore {
    /// Open the store in `dir`. A missing `secrets.enc` means no secrets yet.
    pub fn open(dir: &Path) -> AppResult<Self> {
        let mut store = Self {
            dir: dir.to_path_buf(),
            entries: BTreeMap::new(),
        };

        let path = store.secrets_path();
        if path.exists() {
            let key = store
                .read_key()?
                .ok_or_else(|| AppError::secrets(format!("{} is missing", KEY_FILE)))?;
            let encoded = fs::read_to_string(&path)?;
            let plaintext = decrypt(&key, encoded.trim())?;
            store.entries = serde_json::from_str(&plaintext)?;
            tracing::debug!("Loaded {} secrets", store.entries.len());
        }

        Ok(store)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Set or clear (`None`) an entry. Returns whether anything changed.
    pub fn set(&mut self, name: &str, value: Option<&str>) -> bool {
        match value {
            Some(value) => {
                if self.get(name) == Some(value) {
                    return false;
                }
                self.entries.insert(name.to_string(), value.to_string());
                true
            }
            None => self.entries.remove(name).is_some(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encrypt and write all entries, creating the install key on first use.
    pub fn persist(&self) -> AppResult<()> {
        let path = self.secrets_path();
        if self.entries.is_empty() && !path.exists() {
            return Ok(());
        }

        let key = match self.read_key()? {
            Some(key) => key,
            None => self.create_key()?,
        };
        let plaintext = serde_json::to_string(&self.entries)?;
        fs::write(&path, encrypt(&key, &plaintext)?)?;
        restrict_permissions(&path)?;
        Ok(())
    }

    fn secrets_path(&self) -> PathBuf {
        self.dir.join(SECRETS_FILE)
    }

    fn key_path(&self) -> PathBuf {
        self.dir.join(KEY_FILE)
    }

    fn read_key(&self) -> AppResult<Option<[u8; KEY_SIZE]>> {
        let path = self.key_path();
        if !path.exists() {
            return Ok(None);
        }
        let decoded = BASE64
            .decode(fs::read_to_string(&path)?.trim())
            .map_err(|e| AppError::secrets(format!("{} is not valid base64: {}", KEY_FILE, e)))?;
        let key: [u8; KEY_SIZE] = decoded
            .try_into()
            .map_err(|_| AppError::secrets(format!("{} has the wrong length", KEY_FILE)))?;
        Ok(Some(key))
    }

    fn create_key(&self) -> AppResult<[u8; KEY_SIZE]> {
        let mut key = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        let path = self.key_path();
        fs::write(&path, BASE64.encode(key))?;
        restrict_permissions(&path)?;
        tracing::info!("Created secret key at {}", path.display());
        Ok(key)
    }
}

/// Base64 of `nonce[12] || ciphertext_with_tag`.
fn encrypt(key: &[u8; KEY_SIZE], plaintext: &str) -> AppResult<String> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
        .map_err(|e| AppError::secrets(format!("encryption failed: {}", e)))?;

    let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    combined.extend_from_slice(&nonce_bytes);
    combined.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(combined))
}

fn decrypt(key: &[u8; KEY_SIZE], encoded: &str) -> AppResult<String> {
    let data = BASE64
        .decode(encoded)
        .map_err(|e| AppError::secrets(format!("{} is not valid base64: {}", SECRETS_FILE, e)))?;
    if data.len() <= NONCE_SIZE {
        return Err(AppError::secrets(format!("{} is truncated", SECRETS_FILE)));
    }

    let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| AppError::secrets("decryption failed: wrong key or corrupted data"))?;

    String::from_utf8(plaintext)
        .map_err(|e| AppError::secrets(format!("decrypted data is not valid UTF-8: {}", e)))
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> AppResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> AppResult<()> {
    Ok(())
}
