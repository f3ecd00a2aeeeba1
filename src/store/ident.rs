//! Record identifiers and the lookup predicates that resolve them.
//!
//! Two key schemes coexist historically: some records carry a native
//! 24-hex document id, others a store-minted string (UUID). Worse, the
//! same logical record may have been written under either representation
//! of the same hex value. [`IdQuery`] encodes "try both forms" as an
//! explicit union so individual stores never have to care.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{StoreError, StoreResult};

// ============================================================================
// RecordId
// ============================================================================

/// Primary key as stored on a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "repr", content = "value", rename_all = "snake_case")]
pub enum RecordId {
    /// Native document id: 24 lowercase hex characters.
    Native(String),
    /// Application-minted string key (UUIDs, legacy string ids).
    Literal(String),
}

impl RecordId {
    /// Mint a fresh native id: 4-byte UTC seconds prefix plus 8 random
    /// bytes, hex-encoded. Time-prefixed so ids sort roughly by creation.
    pub fn mint_native() -> Self {
        let secs = Utc::now().timestamp() as u32;
        let entropy = Uuid::new_v4();
        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..].copy_from_slice(&entropy.as_bytes()[..8]);

        let mut hex = String::with_capacity(24);
        for b in bytes {
            hex.push_str(&format!("{b:02x}"));
        }
        Self::Native(hex)
    }

    /// Mint a fresh literal id (UUIDv4 string).
    pub fn mint_literal() -> Self {
        Self::Literal(Uuid::new_v4().to_string())
    }

    /// The key as presented to callers (both forms render as their string).
    pub fn as_str(&self) -> &str {
        match self {
            Self::Native(s) | Self::Literal(s) => s,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// IdQuery
// ============================================================================

/// Lookup predicate produced from one caller-supplied identifier string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdQuery {
    /// Input was a valid 24-hex sequence: match the native form *or* a
    /// literal key holding the same text. Both must be tried because
    /// historical records are not consistent about which form they used.
    Either {
        /// Input verbatim, for literal comparison and error messages.
        raw: String,
        /// Lowercased hex, for native comparison.
        hex: String,
    },
    /// Match the exact string key only.
    Literal(String),
}

impl IdQuery {
    /// Resolver for entities whose keys may be anything (users): a 24-hex
    /// input matches both forms, anything else degrades to a literal
    /// string match. Never fails.
    pub fn lenient(id: &str) -> Self {
        if is_native_hex(id) {
            Self::Either {
                raw: id.to_string(),
                hex: id.to_ascii_lowercase(),
            }
        } else {
            Self::Literal(id.to_string())
        }
    }

    /// Resolver for entities keyed by native ids by convention (sessions,
    /// tasks): a non-hex input fails fast with `InvalidIdentifier`, so
    /// "malformed" is never reported as "absent".
    pub fn strict(entity: &'static str, id: &str) -> StoreResult<Self> {
        if is_native_hex(id) {
            Ok(Self::Either {
                raw: id.to_string(),
                hex: id.to_ascii_lowercase(),
            })
        } else {
            Err(StoreError::invalid_identifier(entity, id))
        }
    }

    /// Resolver for entities keyed exclusively by store-minted strings
    /// (events, feedback).
    pub fn literal(id: impl Into<String>) -> Self {
        Self::Literal(id.into())
    }

    /// Whether a stored key satisfies this predicate.
    pub fn matches(&self, key: &RecordId) -> bool {
        match (self, key) {
            (Self::Either { hex, .. }, RecordId::Native(stored)) => {
                stored.eq_ignore_ascii_case(hex)
            }
            (Self::Either { raw, .. }, RecordId::Literal(stored)) => stored == raw,
            (Self::Literal(wanted), RecordId::Literal(stored)) => stored == wanted,
            (Self::Literal(_), RecordId::Native(_)) => false,
        }
    }

    /// The identifier as the caller supplied it.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Either { raw, .. } => raw,
            Self::Literal(s) => s,
        }
    }
}

/// 24 ASCII hex digits, either case.
fn is_native_hex(s: &str) -> bool {
    s.len() == 24 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

// ============================================================================
// Tests
// ============================================================================
