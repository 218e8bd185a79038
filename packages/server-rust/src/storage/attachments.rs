//! Signed, expiring attachment URLs.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::traits::AttachmentStorage;

/// [`AttachmentStorage`] issuing URLs signed with a keyed BLAKE3 hash.
///
/// URLs take the form `{base}/{disk}/{key}?expires={unix}&signature={hex}`,
/// with disk and every `/`-separated key segment percent-encoded. The
/// signature covers the unencoded disk, key and expiry; the serving side
/// decodes the path and checks it with [`SignedUrlStorage::verify`].
pub struct SignedUrlStorage {
    signing_key: [u8; 32],
    base_url: String,
}

impl SignedUrlStorage {
    #[must_use]
    pub fn new(signing_key: [u8; 32], base_url: impl Into<String>) -> Self {
        Self {
            signing_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Builds a storage from a 64-character hex key.
    ///
    /// # Errors
    ///
    /// Fails if the key is not valid hex or not 32 bytes long.
    pub fn from_hex_key(hex_key: &str, base_url: impl Into<String>) -> anyhow::Result<Self> {
        let bytes = hex::decode(hex_key.trim())?;
        let signing_key: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| anyhow::anyhow!("signing key must be 32 bytes, got {}", b.len()))?;
        Ok(Self::new(signing_key, base_url))
    }

    fn signature(&self, disk: &str, key: &str, expires: i64) -> blake3::Hash {
        let payload = format!("{disk}\n{key}\n{expires}");
        blake3::keyed_hash(&self.signing_key, payload.as_bytes())
    }

    /// URL for `key` on `disk` that stays valid until `expires` (unix seconds).
    #[must_use]
    pub fn sign(&self, disk: &str, key: &str, base_url: Option<&str>, expires: i64) -> String {
        let base = base_url
            .filter(|b| !b.is_empty())
            .map_or(self.base_url.as_str(), |b| b.trim_end_matches('/'));
        format!(
            "{base}/{}/{}?expires={expires}&signature={}",
            urlencoding::encode(disk),
            encode_path(key),
            self.signature(disk, key, expires).to_hex()
        )
    }

    /// Checks a signature produced by [`SignedUrlStorage::sign`] and that it
    /// has not expired at `now` (unix seconds).
    #[must_use]
    pub fn verify(&self, disk: &str, key: &str, expires: i64, signature: &str, now: i64) -> bool {
        if now > expires {
            return false;
        }
        // blake3::Hash equality is constant-time.
        blake3::Hash::from_hex(signature)
            .is_ok_and(|given| given == self.signature(disk, key, expires))
    }
}

fn encode_path(key: &str) -> String {
    key.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl AttachmentStorage for SignedUrlStorage {
    async fn resolve_url(
        &self,
        disk: &str,
        key: &str,
        base_url: Option<&str>,
        validity: Duration,
    ) -> anyhow::Result<String> {
        let validity = i64::try_from(validity.as_secs())?;
        let expires = Utc::now().timestamp().saturating_add(validity);
        Ok(self.sign(disk, key, base_url, expires))
    }
}
