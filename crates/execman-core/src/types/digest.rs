//! Content digest value type
//!
//! A `Sha256Digest` is always rendered as `sha256:<64 lowercase hex chars>`.
//! Construction goes through [`Sha256Digest::parse`] or
//! [`Sha256Digest::from_hex`], so an invalid digest can't be stored.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Prefix carried by every rendered digest
pub const SHA256_PREFIX: &str = "sha256:";

const SHA256_HEX_LEN: usize = 64;

/// A validated SHA-256 digest
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Parse a `sha256:<hex>` string; uppercase hex is normalised to lowercase
    pub fn parse(value: &str) -> Result<Self> {
        let hex = value
            .trim()
            .strip_prefix(SHA256_PREFIX)
            .ok_or_else(|| Error::InvalidDigest {
                value: value.to_string(),
            })?;
        Self::from_hex(hex).map_err(|_| Error::InvalidDigest {
            value: value.to_string(),
        })
    }

    /// Build a digest from a bare hex string (as found in checksum manifests)
    pub fn from_hex(hex: &str) -> Result<Self> {
        let hex = hex.trim();
        if hex.len() != SHA256_HEX_LEN || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidDigest {
                value: hex.to_string(),
            });
        }
        Ok(Self(format!("{}{}", SHA256_PREFIX, hex.to_ascii_lowercase())))
    }

    /// The full `sha256:<hex>` form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The hex portion only
    pub fn hex(&self) -> &str {
        &self.0[SHA256_PREFIX.len()..]
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Sha256Digest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Sha256Digest {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Sha256Digest> for String {
    fn from(digest: Sha256Digest) -> Self {
        digest.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_WORLD: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn test_parse_prefixed() {
        let digest = Sha256Digest::parse(&format!("sha256:{}", HELLO_WORLD)).unwrap();
        assert_eq!(digest.hex(), HELLO_WORLD);
        assert_eq!(digest.to_string(), format!("sha256:{}", HELLO_WORLD));
    }

    #[test]
    fn test_uppercase_is_normalised() {
        let digest = Sha256Digest::from_hex(&HELLO_WORLD.to_uppercase()).unwrap();
        assert_eq!(digest.hex(), HELLO_WORLD);
    }

    #[test]
    fn test_rejects_missing_prefix_and_bad_length() {
        assert!(Sha256Digest::parse(HELLO_WORLD).is_err());
        assert!(Sha256Digest::parse("sha256:abc").is_err());
        assert!(Sha256Digest::parse(&format!("md5:{}", HELLO_WORLD)).is_err());
        assert!(Sha256Digest::from_hex(&"z".repeat(64)).is_err());
    }

    #[test]
    fn test_serde_round_trip_as_string() {
        let digest = Sha256Digest::from_hex(HELLO_WORLD).unwrap();
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"sha256:{}\"", HELLO_WORLD));

        let bad: std::result::Result<Sha256Digest, _> = serde_json::from_str("\"sha256:00\"");
        assert!(bad.is_err());
    }
}
