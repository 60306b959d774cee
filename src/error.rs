//! Error types for mask-auth.

use thiserror::Error;

use crate::session::Mask;

/// Main error type for mask-auth operations.
///
/// Lookup misses are deliberately absent: a mask with no session is a
/// normal `None` result, not an error.
#[derive(Error, Debug)]
pub enum Error {
    /// A confirmation was attempted while no challenge is outstanding.
    ///
    /// Rendered with the same message as [`Error::ConfirmationRejected`]
    /// so end users cannot probe whether a challenge exists; callers
    /// branch on the variant.
    #[error("Confirmation key incorrect")]
    ConfirmationNotPending,

    /// The supplied answer does not match the outstanding challenge key.
    #[error("Confirmation key incorrect")]
    ConfirmationRejected,

    /// Migration target mask is already held by a different session.
    #[error("mask already registered: {0}")]
    MaskTaken(Mask),

    /// A migration or rename referenced a mask with no registered
    /// session, or a session handle that is no longer the registered
    /// occupant of its mask.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Mask string failed validation (empty or whitespace-only).
    #[error("invalid mask: {0:?}")]
    InvalidMask(String),

    /// User id string failed to parse.
    #[error("invalid user id: {0:?}")]
    InvalidUserId(String),

    /// Internal lock was poisoned.
    #[error("internal lock poisoned")]
    LockPoisoned,
}

/// Convenience Result type for mask-auth operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for either confirmation failure.
    ///
    /// Plugin dispatch boundaries catch this class and surface it as
    /// "access denied" rather than letting it propagate.
    pub fn is_confirmation_failure(&self) -> bool {
        matches!(
            self,
            Error::ConfirmationNotPending | Error::ConfirmationRejected
        )
    }
}
