//! Record identifiers.
//!
//! An `IssueId` is 12 opaque bytes rendered as 24 lowercase hex characters:
//! a 4-byte creation second, 5 bytes of a SHA256 over the record seed, and a
//! 3-byte per-generator counter. Clients treat it as an opaque token.

use crate::error::{IssueError, Result};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use schemars::r#gen::SchemaGenerator;
use schemars::schema::{InstanceType, Schema, SchemaObject, StringValidation};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Number of raw bytes in an identifier.
pub const ID_BYTES: usize = 12;

static ID_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{24}$").expect("static id regex"));

/// Opaque, store-assigned record identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IssueId([u8; ID_BYTES]);

impl IssueId {
    /// Build an identifier from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; ID_BYTES]) -> Self {
        Self(bytes)
    }

    /// Raw bytes of the identifier.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ID_BYTES] {
        &self.0
    }

    /// Parse an externally supplied token.
    ///
    /// # Errors
    ///
    /// Returns `IssueError::InvalidId` unless the token is exactly 24 hex digits.
    pub fn parse(token: &str) -> Result<Self> {
        if !is_valid_id_format(token) {
            return Err(IssueError::InvalidId {
                id: token.to_string(),
            });
        }

        let mut bytes = [0u8; ID_BYTES];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let pair = &token[i * 2..i * 2 + 2];
            *byte = u8::from_str_radix(pair, 16).map_err(|_| IssueError::InvalidId {
                id: token.to_string(),
            })?;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for IssueId {
    type Err = IssueError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for IssueId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IssueId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(serde::de::Error::custom)
    }
}

impl JsonSchema for IssueId {
    fn schema_name() -> String {
        "IssueId".to_string()
    }

    fn json_schema(_: &mut SchemaGenerator) -> Schema {
        SchemaObject {
            instance_type: Some(InstanceType::String.into()),
            string: Some(Box::new(StringValidation {
                max_length: Some(24),
                min_length: Some(24),
                pattern: Some("^[0-9a-f]{24}$".to_string()),
            })),
            ..Default::default()
        }
        .into()
    }
}

/// Check whether a token has the shape of an identifier.
#[must_use]
pub fn is_valid_id_format(token: &str) -> bool {
    ID_FORMAT.is_match(token)
}

/// Generates identifiers for newly inserted records.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    counter: u32,
}

impl IdGenerator {
    /// Create a generator whose counter starts at `seed`.
    #[must_use]
    pub const fn new(seed: u32) -> Self {
        Self {
            counter: seed & 0x00FF_FFFF,
        }
    }

    /// Create a generator seeded from the process id and the clock.
    #[must_use]
    pub fn from_entropy() -> Self {
        let mut hasher = Sha256::new();
        hasher.update(std::process::id().to_be_bytes());
        hasher.update(
            Utc::now()
                .timestamp_nanos_opt()
                .unwrap_or_default()
                .to_be_bytes(),
        );
        let digest = hasher.finalize();
        Self::new(u32::from_be_bytes([0, digest[0], digest[1], digest[2]]))
    }

    /// Produce a candidate identifier for the given seed and nonce.
    #[must_use]
    pub fn generate_candidate(
        &mut self,
        project: &str,
        title: &str,
        created_on: DateTime<Utc>,
        nonce: u32,
    ) -> IssueId {
        let secs = u32::try_from(created_on.timestamp().max(0)).unwrap_or(u32::MAX);

        let mut hasher = Sha256::new();
        hasher.update(project.as_bytes());
        hasher.update([0]);
        hasher.update(title.as_bytes());
        hasher.update([0]);
        hasher.update(created_on.timestamp_subsec_nanos().to_be_bytes());
        hasher.update(nonce.to_be_bytes());
        let digest = hasher.finalize();

        let count = self.counter;
        self.counter = (self.counter + 1) & 0x00FF_FFFF;

        let mut bytes = [0u8; ID_BYTES];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&digest[..5]);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        IssueId(bytes)
    }

    /// Generate an identifier, retrying while `exists` reports a collision.
    pub fn generate<F>(
        &mut self,
        project: &str,
        title: &str,
        created_on: DateTime<Utc>,
        exists: F,
    ) -> IssueId
    where
        F: Fn(&IssueId) -> bool,
    {
        let mut nonce = 0u32;
        loop {
            let candidate = self.generate_candidate(project, title, created_on, nonce);
            if !exists(&candidate) {
                return candidate;
            }
            nonce = nonce.wrapping_add(1);
        }
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}
