//! AES-256-GCM envelope for records at rest.
//!
//! Wire format (all byte fields standard base64):
//! ```text
//! { "v": 1, "alg": "A256GCM", "iv": <12 bytes>, "tag": <16 bytes>, "data": <ciphertext> }
//! ```
//!
//! The plaintext is the JSON encoding of the sealed value.

use std::fmt;

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::Rng;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::constants::{ENVELOPE_ALG, ENVELOPE_VERSION};
use crate::error::{EnvelopeError, KeyError};

const KEY_LEN: usize = 32;
const IV_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Ciphertext plus everything needed to open it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub v: u8,
    #[serde(default)]
    pub alg: String,
    #[serde(default)]
    pub iv: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub data: String,
}

/// Server-held symmetric key
#[derive(Clone)]
pub struct EncryptionKey {
    cipher: Aes256Gcm,
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(..)")
    }
}

impl EncryptionKey {
    /// Parse a base64-encoded 32-byte key.
    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        let encoded = encoded.trim();
        if encoded.is_empty() {
            return Err(KeyError::Missing);
        }
        let bytes = STANDARD.decode(encoded).map_err(|_| KeyError::Invalid)?;
        if bytes.len() != KEY_LEN {
            return Err(KeyError::Invalid);
        }
        let cipher = Aes256Gcm::new_from_slice(&bytes).map_err(|_| KeyError::Invalid)?;
        Ok(Self { cipher })
    }

    /// Produce a fresh random key, base64 encoded.
    pub fn generate_base64() -> String {
        let mut bytes = [0u8; KEY_LEN];
        rand::rng().fill(&mut bytes);
        STANDARD.encode(bytes)
    }

    /// Encrypt `value` under a fresh random IV.
    pub fn seal<T: Serialize>(&self, value: &T) -> Result<Envelope, EnvelopeError> {
        let plaintext = serde_json::to_vec(value)?;

        let mut iv = [0u8; IV_LEN];
        rand::rng().fill(&mut iv);

        let mut sealed = self
            .cipher
            .encrypt(Nonce::from_slice(&iv), plaintext.as_slice())
            .map_err(|_| EnvelopeError::Encrypt)?;

        // aes-gcm appends the tag to the ciphertext
        let tag = sealed.split_off(sealed.len() - TAG_LEN);

        Ok(Envelope {
            v: ENVELOPE_VERSION,
            alg: ENVELOPE_ALG.to_string(),
            iv: STANDARD.encode(iv),
            tag: STANDARD.encode(tag),
            data: STANDARD.encode(sealed),
        })
    }

    /// Decrypt and deserialize an envelope.
    pub fn open<T: DeserializeOwned>(&self, envelope: &Envelope) -> Result<T, EnvelopeError> {
        if envelope.v != ENVELOPE_VERSION || envelope.alg != ENVELOPE_ALG {
            return Err(EnvelopeError::Unsupported {
                version: envelope.v,
                alg: envelope.alg.clone(),
            });
        }

        let iv = STANDARD
            .decode(&envelope.iv)
            .map_err(|_| EnvelopeError::Encoding("iv"))?;
        let tag = STANDARD
            .decode(&envelope.tag)
            .map_err(|_| EnvelopeError::Encoding("tag"))?;
        let mut data = STANDARD
            .decode(&envelope.data)
            .map_err(|_| EnvelopeError::Encoding("data"))?;

        if iv.len() != IV_LEN || tag.len() != TAG_LEN {
            return Err(EnvelopeError::Malformed);
        }

        data.extend_from_slice(&tag);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&iv), data.as_slice())
            .map_err(|_| EnvelopeError::Decrypt)?;

        Ok(serde_json::from_slice(&plaintext)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContactData;

    fn test_key() -> EncryptionKey {
        EncryptionKey::from_base64(&EncryptionKey::generate_base64()).unwrap()
    }

    #[test]
    fn test_seal_and_open() {
        let key = test_key();
        let contact = ContactData {
            name: "Jonas Jonaitis".to_string(),
            email: "jonas@example.lt".to_string(),
            message: "Labas, \"quoted\", multi\nline ąčę 🚀".to_string(),
            created_at: Some("2026-10-18T09:15:00.123Z".to_string()),
        };

        let envelope = key.seal(&contact).unwrap();
        assert_eq!(envelope.v, 1);
        assert_eq!(envelope.alg, "A256GCM");
        assert_eq!(STANDARD.decode(&envelope.iv).unwrap().len(), IV_LEN);
        assert_eq!(STANDARD.decode(&envelope.tag).unwrap().len(), TAG_LEN);

        let opened: ContactData = key.open(&envelope).unwrap();
        assert_eq!(opened, contact);
    }

    #[test]
    fn test_fresh_iv_per_seal() {
        let key = test_key();
        let a = key.seal(&"same").unwrap();
        let b = key.seal(&"same").unwrap();
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.data, b.data);
    }

    #[test]
    fn test_open_rejects_wrong_key_and_tampering() {
        let key = test_key();
        let other = test_key();
        let envelope = key.seal(&"secret").unwrap();

        assert!(matches!(
            other.open::<String>(&envelope),
            Err(EnvelopeError::Decrypt)
        ));

        let mut tampered = envelope.clone();
        let mut tag = STANDARD.decode(&tampered.tag).unwrap();
        tag[0] ^= 0xff;
        tampered.tag = STANDARD.encode(tag);
        assert!(matches!(
            key.open::<String>(&tampered),
            Err(EnvelopeError::Decrypt)
        ));
    }

    #[test]
    fn test_open_rejects_unknown_version() {
        let key = test_key();
        let mut envelope = key.seal(&"x").unwrap();
        envelope.v = 2;
        assert!(matches!(
            key.open::<String>(&envelope),
            Err(EnvelopeError::Unsupported { version: 2, .. })
        ));
    }

    #[test]
    fn test_key_parsing() {
        assert_eq!(EncryptionKey::from_base64("").unwrap_err(), KeyError::Missing);
        assert_eq!(EncryptionKey::from_base64("  ").unwrap_err(), KeyError::Missing);
        assert_eq!(
            EncryptionKey::from_base64("not base64!").unwrap_err(),
            KeyError::Invalid
        );
        // 16 bytes is an AES-128 key, not accepted
        let short = STANDARD.encode([7u8; 16]);
        assert_eq!(EncryptionKey::from_base64(&short).unwrap_err(), KeyError::Invalid);
        assert!(EncryptionKey::from_base64(&STANDARD.encode([7u8; 32])).is_ok());
    }
}
