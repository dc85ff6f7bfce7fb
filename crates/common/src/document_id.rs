use std::fmt;
use std::hash::{Hash, Hasher};

use anyhow::{anyhow, Result};
use rand::fill;
use serde::{Deserialize, Serialize};

/// 12-byte document identifier, rendered as 24 lowercase hex characters.
///
/// Stored as `_id` (and as every cross-document reference) in hex form, so
/// the same value round-trips through BSON, JSON and URL path segments.
#[derive(Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct DocumentId {
    #[serde(with = "hex::serde")]
    id: [u8; 12],
}

impl DocumentId {
    pub const HEX_LEN: usize = 24;

    pub fn new(id: [u8; 12]) -> Self {
        Self { id }
    }

    pub fn random() -> Self {
        let mut arr = [0u8; 12];
        fill(&mut arr[..]);
        Self::new(arr)
    }

    pub fn bytes(&self) -> &[u8; 12] {
        &self.id
    }

    pub fn is_nil(&self) -> bool {
        self.id == [0u8; 12]
    }

    pub fn to_hex_string(&self) -> String {
        hex::encode(self.id)
    }

    pub fn from_hex_string(s: &str) -> Result<Self> {
        let decoded = hex::decode(s)?;
        let id: [u8; 12] = decoded
            .try_into()
            .map_err(|v: Vec<u8>| anyhow!("Wrong length for DocumentId: expected 12 bytes, got {}", v.len()))?;
        Ok(Self::new(id))
    }

    /// True when `s` has the shape of a document id rather than a custom slug.
    pub fn looks_like_id(s: &str) -> bool {
        s.len() == Self::HEX_LEN && s.chars().all(|c| c.is_ascii_hexdigit())
    }
}

impl std::str::FromStr for DocumentId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex_string(s)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex_string())
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.to_hex_string())
    }
}

impl Hash for DocumentId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write(&self.id);
    }
}
