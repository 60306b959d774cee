//! The session entity: a time-boxed authorization context for one mask.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::session::{Mask, SessionStorage, UserId};

/// Outcome of a successful confirmation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// The challenge answer matched; the session is now confirmed.
    Confirmed,
    /// The session was already confirmed; nothing changed.
    AlreadyConfirmed,
}

/// A time-boxed authorization context bound to one mask and one account.
///
/// Sessions are created through
/// [`SessionRegistry::create`](crate::SessionRegistry::create) and shared
/// as `Arc<Session>` handles; the registry entry and every holder of a
/// handle observe the same object. A fresh session is unstarted
/// (`active()` is false), unconfirmed, and carries an empty
/// [`SessionStorage`].
///
/// Mutable state is guarded per session, so plugin traffic on one
/// session never contends with another session. The `mask` field is
/// renamed only through the registry's migration operation, which keeps
/// the field and the registry index in step.
pub struct Session {
    /// Account this session acts for. Immutable after construction.
    user: UserId,
    /// Duration applied by every `start()`. Captured at creation.
    config: SessionConfig,
    /// Current identity; the registry key. Written only by migration.
    mask: Mutex<Mask>,
    /// Per-plugin key-value area, exclusively owned by this session.
    storage: Mutex<SessionStorage>,
    /// `None` until the first `start()`.
    expiration: Mutex<Option<Instant>>,
    /// Set only through the confirmation protocol.
    confirmed: AtomicBool,
    /// Expected challenge key deposited by the external verifier.
    challenge: Mutex<Option<String>>,
}

impl Session {
    /// Construct an unstarted, unconfirmed session.
    ///
    /// Registration into a registry is the caller's job; use
    /// [`SessionRegistry::create`](crate::SessionRegistry::create) from
    /// host code.
    pub(crate) fn new(user: UserId, mask: Mask, config: SessionConfig) -> Self {
        Self {
            user,
            config,
            mask: Mutex::new(mask),
            storage: Mutex::new(SessionStorage::new()),
            expiration: Mutex::new(None),
            confirmed: AtomicBool::new(false),
            challenge: Mutex::new(None),
        }
    }

    /// The account this session acts for.
    pub fn user(&self) -> UserId {
        self.user
    }

    /// The session's current mask.
    pub fn mask(&self) -> Mask {
        match self.mask.lock() {
            Ok(guard) => guard.clone(),
            // A Mask clone is valid regardless of how a writer died.
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Swap the mask field. Callers must hold the registry write lock.
    pub(crate) fn replace_mask(&self, new: Mask) {
        match self.mask.lock() {
            Ok(mut guard) => *guard = new,
            Err(poisoned) => *poisoned.into_inner() = new,
        }
    }

    /// Start (or restart) the session clock.
    ///
    /// Sets the expiration to now plus the configured duration.
    /// Idempotent: calling again on a running or expired session simply
    /// resets the expiration forward from the new "now".
    pub fn start(&self) -> Result<()> {
        let mut expiration = self.expiration.lock().map_err(|_| Error::LockPoisoned)?;
        *expiration = Some(Instant::now() + self.config.duration);

        tracing::debug!(mask = %self.mask(), user = %self.user, "session started");
        Ok(())
    }

    /// Whether the session has been started and has not yet expired.
    ///
    /// A never-started session is never active. An expired session stays
    /// inactive until `start()` is called again; it is never implicitly
    /// revived.
    pub fn active(&self) -> bool {
        self.expiration
            .lock()
            .map(|exp| matches!(*exp, Some(at) if Instant::now() < at))
            .unwrap_or(false)
    }

    /// Whether the session may act as its attached account.
    ///
    /// True iff the session is active *and* confirmed. This is the gate
    /// plugins check before permitting privileged operations.
    pub fn authed(&self) -> bool {
        self.active() && self.confirmed.load(Ordering::Acquire)
    }

    /// Whether the confirmation protocol has completed.
    pub fn confirmed(&self) -> bool {
        self.confirmed.load(Ordering::Acquire)
    }

    /// The current expiration instant, if the session was ever started.
    pub fn expiration(&self) -> Option<Instant> {
        self.expiration.lock().map(|exp| *exp).unwrap_or(None)
    }

    /// Deposit the expected challenge key.
    ///
    /// Called by the external challenge verifier after issuing a
    /// challenge to the user; a later [`confirm`](Session::confirm) call
    /// compares against this key. Depositing again replaces the
    /// outstanding key.
    pub fn begin_confirmation(&self, key: impl Into<String>) -> Result<()> {
        let mut challenge = self.challenge.lock().map_err(|_| Error::LockPoisoned)?;
        *challenge = Some(key.into());
        Ok(())
    }

    /// Attempt to confirm the session with a challenge answer.
    ///
    /// - Already confirmed → `Ok(Confirmation::AlreadyConfirmed)`, state
    ///   untouched.
    /// - No challenge outstanding → [`Error::ConfirmationNotPending`].
    /// - Answer mismatch → [`Error::ConfirmationRejected`]; the challenge
    ///   stays outstanding so the verifier decides retry policy.
    /// - Match → sets the confirmed flag, clears the challenge, returns
    ///   `Ok(Confirmation::Confirmed)`.
    ///
    /// Both error variants display "Confirmation key incorrect"; dispatch
    /// boundaries surface them as access denied, never as a crash.
    pub fn confirm(&self, answer: &str) -> Result<Confirmation> {
        if self.confirmed.load(Ordering::Acquire) {
            return Ok(Confirmation::AlreadyConfirmed);
        }

        let mut challenge = self.challenge.lock().map_err(|_| Error::LockPoisoned)?;
        match challenge.as_deref() {
            None => Err(Error::ConfirmationNotPending),
            Some(expected) if expected == answer => {
                self.confirmed.store(true, Ordering::Release);
                *challenge = None;

                tracing::info!(mask = %self.mask(), user = %self.user, "session confirmed");
                Ok(Confirmation::Confirmed)
            }
            Some(_) => Err(Error::ConfirmationRejected),
        }
    }

    /// Lock this session's storage for plugin reads and writes.
    ///
    /// The guard covers only this session; different sessions are fully
    /// independent.
    pub fn storage(&self) -> Result<MutexGuard<'_, SessionStorage>> {
        self.storage.lock().map_err(|_| Error::LockPoisoned)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("mask", &self.mask())
            .field("expiration", &self.expiration())
            .field("confirmed", &self.confirmed())
            .finish()
    }
}
