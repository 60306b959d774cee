//! Account identifier type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque handle to the account a session acts for.
///
/// The external account store assigns these; this crate never creates,
/// resolves, or persists them — a session merely carries the handle so
/// plugins can answer "who is this mask authorized as". Displayed as
/// `user-XXXXXXXX` where X is a hexadecimal digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    /// Wrap a raw account identifier from the account store.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw u64 value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user-{:08x}", self.0)
    }
}

impl FromStr for UserId {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        s.strip_prefix("user-")
            .and_then(|hex| u64::from_str_radix(hex, 16).ok())
            .map(UserId)
            .ok_or_else(|| crate::Error::InvalidUserId(s.into()))
    }
}
