//! Serializable permit handle.
//!
//! A [`Token`] crosses process boundaries: it is acquired in a request
//! handler and may be released by a background worker. The wire form is
//! versioned JSON wrapped in URL-safe base64; the set of seal kinds is
//! closed, so decoding never instantiates arbitrary types.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::capability::SealKind;
use crate::error::AppError;
use crate::result::AppResult;

/// Current token encoding version.
pub const TOKEN_VERSION: u8 = 1;

/// Opaque handle identifying one held permit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Encoding version.
    #[serde(rename = "v")]
    pub version: u8,
    /// Kind of seal that issued the permit.
    pub kind: SealKind,
    /// Key of the protected capacity pool.
    pub resource: String,
    /// Backend identifier of this specific acquisition.
    pub permit: String,
    /// Part tokens, populated only for composite seals.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<Token>,
}

impl Token {
    /// Create a token for a single permit.
    pub fn new(kind: SealKind, resource: impl Into<String>, permit: impl Into<String>) -> Self {
        Self {
            version: TOKEN_VERSION,
            kind,
            resource: resource.into(),
            permit: permit.into(),
            parts: Vec::new(),
        }
    }

    /// Create a composite token from the tokens of its parts.
    pub fn composite(resource: impl Into<String>, parts: Vec<Token>) -> Self {
        let permit = parts
            .iter()
            .map(|p| p.permit.as_str())
            .collect::<Vec<_>>()
            .join("+");
        Self {
            version: TOKEN_VERSION,
            kind: SealKind::Composite,
            resource: resource.into(),
            permit,
            parts,
        }
    }

    /// Stable identifier of this acquisition (hex SHA-256 of the permit key).
    pub fn id(&self) -> String {
        let digest = Sha256::digest(format!("{}:{}", self.resource, self.permit).as_bytes());
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Encode to the portable string form.
    pub fn encode(&self) -> AppResult<String> {
        let json = serde_json::to_vec(self)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Decode from the portable string form.
    pub fn decode(encoded: &str) -> AppResult<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(encoded.trim())?;
        let token: Token = serde_json::from_slice(&bytes).map_err(|e| {
            AppError::with_source(
                crate::error::ErrorKind::InvalidTokenType,
                format!("Token payload is malformed: {e}"),
                e,
            )
        })?;
        if token.version != TOKEN_VERSION {
            return Err(AppError::invalid_token(format!(
                "Unsupported token version {} (expected {TOKEN_VERSION})",
                token.version
            )));
        }
        Ok(token)
    }

    /// Fail unless this token was issued by a seal of `kind` over `resource`.
    pub fn ensure_issued_by(&self, kind: SealKind, resource: &str) -> AppResult<()> {
        if self.kind != kind || self.resource != resource {
            return Err(AppError::invalid_token(format!(
                "Token for {} '{}' cannot be used with {} '{}'",
                self.kind, self.resource, kind, resource
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = self.encode().map_err(|_| fmt::Error)?;
        f.write_str(&encoded)
    }
}

impl FromStr for Token {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
