//! Mask identity type and normalization.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A network participant's current identity string.
///
/// Masks are supplied by the protocol layer on every inbound event
/// (e.g. `alice!~a@host` on IRC) and are the sole key into the session
/// registry. The string is opaque to this crate; the only requirement
/// is that it is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mask(String);

impl Mask {
    /// Create a mask from a raw identity string.
    ///
    /// Returns [`crate::Error::InvalidMask`] for empty or whitespace-only
    /// input; a registry keyed by the empty string is always a caller bug.
    pub fn new(mask: impl Into<String>) -> crate::Result<Self> {
        let mask = mask.into();
        if mask.trim().is_empty() {
            return Err(crate::Error::InvalidMask(mask));
        }
        Ok(Self(mask))
    }

    /// View the raw mask string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Mask {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Mask::new(s)
    }
}

/// Lets `HashMap<Mask, _>` be queried with a plain `&str`.
impl Borrow<str> for Mask {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Reduction of an identity-bearing value to its mask string.
///
/// The registry accepts "a raw mask string or a higher-level identity
/// object" everywhere it takes an identity; protocol-layer user types
/// implement this to hand their current mask to lookups without the
/// registry knowing anything else about them. Normalization must be
/// exact — no partial or prefix matching happens downstream.
pub trait AsMask {
    /// Borrow the mask string that keys the registry.
    fn mask_str(&self) -> &str;

    /// Owned, validated form of the same identity.
    fn to_mask(&self) -> crate::Result<Mask> {
        Mask::new(self.mask_str())
    }
}

impl AsMask for Mask {
    fn mask_str(&self) -> &str {
        self.as_str()
    }
}

impl AsMask for str {
    fn mask_str(&self) -> &str {
        self
    }
}

impl AsMask for String {
    fn mask_str(&self) -> &str {
        self
    }
}

impl<T: AsMask + ?Sized> AsMask for &T {
    fn mask_str(&self) -> &str {
        (**self).mask_str()
    }
}
