//! Version identifiers for SCIM resources.
//!
//! Versions back ETag-based optimistic concurrency (RFC 7644 section 3.14).
//! A content version is the base64 encoded SHA-256 digest of the resource's
//! canonical JSON with `meta` removed, so identical content always yields the
//! same version regardless of when it was stored.
//!
//! Phantom types keep the two textual forms apart:
//!
//! * [`RawVersion`] - internal form ("abc123")
//! * [`HttpVersion`] - weak ETag form ("W/\"abc123\"")
//!
//! ```rust
//! use scim_engine::resource::version::{HttpVersion, RawVersion};
//!
//! let raw = RawVersion::from_content(br#"{"id":"123","userName":"john.doe"}"#);
//! let etag = HttpVersion::from(raw.clone()).to_string();
//! let parsed: HttpVersion = etag.parse().unwrap();
//! assert_eq!(raw, parsed);
//! ```

use super::resource::Resource;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::{fmt, marker::PhantomData, str::FromStr};
use thiserror::Error;

// Phantom type markers for format distinction
#[derive(Debug, Clone, Copy)]
pub struct Http;

#[derive(Debug, Clone, Copy)]
pub struct Raw;

/// Opaque version identifier with compile-time format safety.
#[derive(Debug, Clone, Eq, Hash)]
pub struct ScimVersion<Format> {
    opaque: String,
    _format: PhantomData<Format>,
}

/// Type alias for HTTP ETag format versions ("W/\"abc123\"")
pub type HttpVersion = ScimVersion<Http>;

/// Type alias for raw internal format versions ("abc123")
pub type RawVersion = ScimVersion<Raw>;

impl<Format> ScimVersion<Format> {
    /// Create a version from arbitrary content bytes.
    pub fn from_content(content: &[u8]) -> RawVersion {
        let mut hasher = Sha256::new();
        hasher.update(content);
        let hash = hasher.finalize();

        ScimVersion {
            opaque: BASE64.encode(hash),
            _format: PhantomData,
        }
    }

    /// Create the content version of a resource.
    ///
    /// `meta` is excluded so that stamping the version into `meta.version`
    /// does not change the version itself.
    pub fn from_resource(resource: &Resource) -> RawVersion {
        let mut json = resource.to_json();
        if let Value::Object(obj) = &mut json {
            obj.remove("meta");
        }
        // serde_json maps are key-sorted, so this serialization is canonical
        Self::from_content(json.to_string().as_bytes())
    }

    /// Create a version from a provider-specific identifier.
    pub fn from_hash(hash_string: impl AsRef<str>) -> RawVersion {
        ScimVersion {
            opaque: hash_string.as_ref().to_string(),
            _format: PhantomData,
        }
    }

    /// Get the opaque version string.
    pub fn as_str(&self) -> &str {
        &self.opaque
    }
}

impl fmt::Display for ScimVersion<Raw> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opaque)
    }
}

impl fmt::Display for ScimVersion<Http> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W/\"{}\"", self.opaque)
    }
}

impl FromStr for ScimVersion<Raw> {
    type Err = VersionError;

    fn from_str(version_str: &str) -> Result<Self, Self::Err> {
        let trimmed = version_str.trim();
        if trimmed.is_empty() {
            return Err(VersionError::ParseError(
                "Version string cannot be empty".to_string(),
            ));
        }
        Ok(ScimVersion {
            opaque: trimmed.to_string(),
            _format: PhantomData,
        })
    }
}

impl FromStr for ScimVersion<Http> {
    type Err = VersionError;

    fn from_str(etag_header: &str) -> Result<Self, Self::Err> {
        let trimmed = etag_header.trim();
        let etag_value = trimmed.strip_prefix("W/").unwrap_or(trimmed);

        let opaque = etag_value
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .filter(|inner| !inner.is_empty())
            .ok_or_else(|| VersionError::InvalidEtagFormat(etag_header.to_string()))?;

        Ok(ScimVersion {
            opaque: opaque.to_string(),
            _format: PhantomData,
        })
    }
}

impl From<ScimVersion<Raw>> for ScimVersion<Http> {
    fn from(raw: ScimVersion<Raw>) -> Self {
        ScimVersion {
            opaque: raw.opaque,
            _format: PhantomData,
        }
    }
}

impl From<ScimVersion<Http>> for ScimVersion<Raw> {
    fn from(http: ScimVersion<Http>) -> Self {
        ScimVersion {
            opaque: http.opaque,
            _format: PhantomData,
        }
    }
}

// Versions are equal across formats when their opaque strings match
impl<F1, F2> PartialEq<ScimVersion<F2>> for ScimVersion<F1> {
    fn eq(&self, other: &ScimVersion<F2>) -> bool {
        self.opaque == other.opaque
    }
}

impl<Format> Serialize for ScimVersion<Format> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.opaque.serialize(serializer)
    }
}

impl<'de, Format> Deserialize<'de> for ScimVersion<Format> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opaque = String::deserialize(deserializer)?;
        Ok(ScimVersion {
            opaque,
            _format: PhantomData,
        })
    }
}

/// Errors that can occur during version operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VersionError {
    /// Invalid ETag format provided
    #[error("Invalid ETag format: {0}")]
    InvalidEtagFormat(String),

    /// Version parsing failed
    #[error("Failed to parse version: {0}")]
    ParseError(String),
}
