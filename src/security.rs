//! Security gate for document-declared attributes
//!
//!     A document may only pick its own highlighter while the active safe mode is below the
//!     configured threshold. The check lives in exactly one place, [`SecurityPolicy::gate`],
//!     which runs before any other stage sees the attributes: at or above the threshold the
//!     `source-highlighter` attribute is removed and nothing downstream can tell it was ever
//!     declared.

use crate::document::DocumentAttributes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Attribute through which a document selects its highlighter
pub const HIGHLIGHTER_ATTRIBUTE: &str = "source-highlighter";

/// Trust level of a conversion, ordered from least to most restrictive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafeMode {
    Unsafe = 0,
    Safe = 1,
    Server = 10,
    Secure = 20,
}

impl SafeMode {
    pub fn level(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for SafeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SafeMode::Unsafe => "unsafe",
            SafeMode::Safe => "safe",
            SafeMode::Server => "server",
            SafeMode::Secure => "secure",
        };
        f.write_str(name)
    }
}

impl FromStr for SafeMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "unsafe" | "0" => Ok(SafeMode::Unsafe),
            "safe" | "1" => Ok(SafeMode::Safe),
            "server" | "10" => Ok(SafeMode::Server),
            "secure" | "20" => Ok(SafeMode::Secure),
            other => Err(format!("unknown safe mode '{other}'")),
        }
    }
}

/// The active safe mode together with the threshold that locks the highlighter attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SecurityPolicy {
    pub safe_mode: SafeMode,
    pub threshold: SafeMode,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        SecurityPolicy {
            safe_mode: SafeMode::Safe,
            threshold: SafeMode::Server,
        }
    }
}

impl SecurityPolicy {
    pub fn new(safe_mode: SafeMode, threshold: SafeMode) -> Self {
        SecurityPolicy {
            safe_mode,
            threshold,
        }
    }

    /// Whether a document may select its own highlighter
    pub fn permits_highlighter(&self) -> bool {
        self.safe_mode < self.threshold
    }

    /// Strip the attributes a document is not trusted to set
    pub fn gate(&self, mut attributes: DocumentAttributes) -> DocumentAttributes {
        if !self.permits_highlighter() {
            attributes.remove(HIGHLIGHTER_ATTRIBUTE);
        }
        attributes
    }
}
