//! Identifier types for the companion-site backend.
//!
//! This module provides the strongly-typed keys the stores are indexed by:
//! the validated Minecraft account name and the time-ordered purchase id.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// A Minecraft account name, the identity key shared by every store.
///
/// Names are 3-16 characters drawn from `[A-Za-z0-9_]` (the launcher's own
/// rules) and are compared case-sensitively, exactly as stored. The same
/// string keys the plugin-owned credential table and the locally-owned
/// profile table.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Minimum accepted name length.
    pub const MIN_LEN: usize = 3;

    /// Maximum accepted name length.
    pub const MAX_LEN: usize = 16;

    /// Validate and wrap a raw name.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidUsername`] if the name is outside 3-16
    /// characters or contains anything but ASCII letters, digits, or `_`.
    pub fn parse(raw: &str) -> Result<Self, IdError> {
        Self::validate(raw)?;
        Ok(Self(raw.to_owned()))
    }

    /// Return the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(raw: &str) -> Result<(), IdError> {
        if raw.len() < Self::MIN_LEN || raw.len() > Self::MAX_LEN {
            return Err(IdError::InvalidUsername);
        }
        if !raw.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
            return Err(IdError::InvalidUsername);
        }
        Ok(())
    }
}

impl FromStr for Username {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Username({})", self.0)
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Username {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::validate(&value)?;
        Ok(Self(value))
    }
}

impl From<Username> for String {
    fn from(name: Username) -> Self {
        name.0
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A purchase-ledger identifier using ULID for time-ordering.
///
/// Ledger ids are time-ordered so that a plain sort of the ledger is a
/// chronology and range scans over recent purchases stay cheap.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PurchaseId(Ulid);

impl PurchaseId {
    /// Create a `PurchaseId` from a ULID.
    #[must_use]
    pub const fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// Generate a new `PurchaseId` with the current timestamp.
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    /// Return the underlying ULID.
    #[must_use]
    pub const fn as_ulid(&self) -> &Ulid {
        &self.0
    }
}

impl FromStr for PurchaseId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ulid = Ulid::from_string(s).map_err(|_| IdError::InvalidUlid)?;
        Ok(Self(ulid))
    }
}

impl fmt::Debug for PurchaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PurchaseId({})", self.0)
    }
}

impl fmt::Display for PurchaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for PurchaseId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PurchaseId> for String {
    fn from(id: PurchaseId) -> Self {
        id.0.to_string()
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input is not an acceptable account name.
    #[error("invalid username: 3-16 characters of A-Z, a-z, 0-9 or _")]
    InvalidUsername,

    /// The input is not a valid ULID.
    #[error("invalid ULID format")]
    InvalidUlid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_accepts_launcher_style_names() {
        for name in ["abc", "Notch", "x_Herobrine_x", "Player123", "a_b_c_d_e_f_g_16"] {
            assert!(Username::parse(name).is_ok(), "rejected {name}");
        }
    }

    #[test]
    fn username_rejects_bad_shapes() {
        for name in ["ab", "", "seventeen_chars__", "has space", "naïve", "semi;colon", "dash-ed"] {
            assert!(Username::parse(name).is_err(), "accepted {name}");
        }
    }

    #[test]
    fn username_is_case_sensitive() {
        let lower = Username::parse("steve").unwrap();
        let upper = Username::parse("Steve").unwrap();
        assert_ne!(lower, upper);
        assert_eq!(upper.as_str(), "Steve");
    }

    #[test]
    fn username_serde_rejects_invalid() {
        let ok: Result<Username, _> = serde_json::from_str("\"Alex\"");
        assert!(ok.is_ok());
        let bad: Result<Username, _> = serde_json::from_str("\"no spaces here\"");
        assert!(bad.is_err());
    }

    #[test]
    fn username_serde_roundtrip() {
        let name = Username::parse("Notch").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        let parsed: Username = serde_json::from_str(&json).unwrap();
        assert_eq!(name, parsed);
    }

    #[test]
    fn purchase_id_roundtrip() {
        let id = PurchaseId::generate();
        let str_repr = id.to_string();
        let parsed = PurchaseId::from_str(&str_repr).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn purchase_id_serde_json() {
        let id = PurchaseId::generate();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: PurchaseId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn purchase_ids_sort_chronologically() {
        let earlier = PurchaseId::from_ulid(Ulid::from_parts(1_000, 42));
        let later = PurchaseId::from_ulid(Ulid::from_parts(2_000, 7));
        assert!(earlier.to_string() < later.to_string());
    }
}
