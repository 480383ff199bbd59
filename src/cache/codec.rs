//! Value codec: JSON serialization plus optional obfuscation.
//!
//! Obfuscation is a repeating-key XOR followed by base64. It keeps casual
//! readers of the store from seeing payloads in clear text and nothing more:
//! anyone holding the key, or enough ciphertext, can reverse it. It is not
//! encryption.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::CacheError;

/// Marker prefix of obfuscated payloads. JSON text never starts with it.
const OBFUSCATED_MARKER: char = '~';

/// How a value is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// JSON, XOR-ed with the obfuscation key and base64 encoded.
    #[default]
    Obfuscated,
    /// Raw JSON text.
    Plain,
}

/// Reversible keyed obfuscation of stored values.
#[derive(Clone)]
pub struct Obfuscator {
    key: Vec<u8>,
}

impl Obfuscator {
    pub fn new(key: &str) -> Result<Self, CacheError> {
        if key.is_empty() {
            return Err(CacheError::Operation(
                "obfuscation key must not be empty".to_string(),
            ));
        }
        Ok(Self {
            key: key.as_bytes().to_vec(),
        })
    }

    /// Serialize `value` and encode it for storage.
    pub fn encode<T: Serialize + ?Sized>(
        &self,
        value: &T,
        encoding: Encoding,
    ) -> Result<String, CacheError> {
        let json = serde_json::to_string(value)?;
        match encoding {
            Encoding::Plain => Ok(json),
            Encoding::Obfuscated => {
                let mut out = String::with_capacity(json.len() * 4 / 3 + 5);
                out.push(OBFUSCATED_MARKER);
                STANDARD.encode_string(self.xor(json.as_bytes()), &mut out);
                Ok(out)
            }
        }
    }

    /// Reverse [`Obfuscator::encode`], accepting either stored form.
    pub fn decode<T: DeserializeOwned>(&self, stored: &str) -> Result<T, CacheError> {
        match stored.strip_prefix(OBFUSCATED_MARKER) {
            Some(encoded) => {
                let bytes = STANDARD
                    .decode(encoded)
                    .map_err(|e| CacheError::Serialization(e.to_string()))?;
                Ok(serde_json::from_slice(&self.xor(&bytes))?)
            }
            None => Ok(serde_json::from_str(stored)?),
        }
    }

    fn xor(&self, data: &[u8]) -> Vec<u8> {
        data.iter()
            .zip(self.key.iter().cycle())
            .map(|(byte, k)| byte ^ k)
            .collect()
    }
}

impl std::fmt::Debug for Obfuscator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Obfuscator").finish_non_exhaustive()
    }
}
