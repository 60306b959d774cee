//! The session registry: the process-wide mask → session index.
//!
//! One registry instance is constructed at host start and injected into
//! whatever dispatch component needs it; tests build a fresh registry
//! each. There is no module-level singleton.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::session::{AsMask, Mask, Session, UserId};

/// Registry of all live sessions, keyed by mask.
///
/// The index is a single reader/writer resource: lookups take the read
/// lock, every insert, rename, and removal takes the write lock, so
/// operations on one mask are linearizable. Sessions themselves guard
/// their own state — holding a session handle never blocks the index,
/// and plugin traffic on one session never contends with another.
///
/// Expired sessions stay discoverable until explicitly stopped or swept
/// with [`purge_expired`](SessionRegistry::purge_expired); expiration is
/// passive.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Mask, Arc<Session>>>,
    config: SessionConfig,
}

impl SessionRegistry {
    /// Create an empty registry with the given session configuration.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// The configuration applied to every session this registry creates.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Create a session for `mask` acting as `user` and register it.
    ///
    /// The session starts life unstarted and unconfirmed, with empty
    /// storage. Any existing entry under the same mask is silently
    /// replaced: the displaced session object is not mutated, it just
    /// stops being reachable by lookup.
    pub fn create(&self, user: UserId, mask: Mask) -> Result<Arc<Session>> {
        let session = Arc::new(Session::new(user, mask.clone(), self.config.clone()));

        let mut sessions = self.sessions.write().map_err(|_| Error::LockPoisoned)?;
        if sessions.insert(mask.clone(), Arc::clone(&session)).is_some() {
            tracing::debug!(%mask, "replaced existing session for mask");
        }
        tracing::info!(%mask, %user, "session created");

        Ok(session)
    }

    /// Look up the session registered for an identity.
    ///
    /// The identity is reduced to its mask string and matched exactly;
    /// no partial or prefix matching. A miss is a normal `None`, not an
    /// error — callers treat it as "unauthenticated".
    pub fn lookup(&self, identity: impl AsMask) -> Result<Option<Arc<Session>>> {
        let sessions = self.sessions.read().map_err(|_| Error::LockPoisoned)?;
        Ok(sessions.get(identity.mask_str()).cloned())
    }

    /// Move the registry entry from `old` to `new`.
    ///
    /// Remove-then-insert under one write lock; the session's own mask
    /// field is updated in the same critical section. Also usable for
    /// out-of-band renames when the protocol layer learns an identity
    /// changed its public name.
    ///
    /// # Errors
    /// - [`Error::SessionNotFound`] — nothing registered under `old`.
    /// - [`Error::MaskTaken`] — `new` is held by a different session.
    ///   Neither session is modified; storage is never merged. Renaming
    ///   a session onto the mask it already holds is a no-op success.
    pub fn migrate(&self, old: impl AsMask, new: Mask) -> Result<Arc<Session>> {
        let mut sessions = self.sessions.write().map_err(|_| Error::LockPoisoned)?;

        let session = sessions
            .get(old.mask_str())
            .cloned()
            .ok_or_else(|| Error::SessionNotFound(old.mask_str().to_string()))?;

        Self::rename_locked(&mut sessions, &session, new)?;
        Ok(session)
    }

    /// Rename a session identified by handle rather than by mask.
    ///
    /// This is the session-level mask change: the handle is verified to
    /// still be the registered occupant of its current mask, so a stale
    /// handle (already replaced under that mask) cannot move its
    /// successor. Same conflict policy as [`migrate`](Self::migrate).
    pub fn set_mask(&self, session: &Arc<Session>, new: Mask) -> Result<()> {
        let mut sessions = self.sessions.write().map_err(|_| Error::LockPoisoned)?;

        let current = session.mask();
        match sessions.get(current.as_str()) {
            Some(entry) if Arc::ptr_eq(entry, session) => {}
            _ => return Err(Error::SessionNotFound(current.to_string())),
        }

        Self::rename_locked(&mut sessions, session, new)
    }

    /// Remove the session's entry, making it unreachable by lookup.
    ///
    /// The removal is keyed by the session's *current* mask and only
    /// happens if the entry still points at this same session — a
    /// replaced session cannot evict its successor. Expiration and
    /// storage on the object are left untouched. Returns whether an
    /// entry was removed.
    pub fn stop(&self, session: &Arc<Session>) -> Result<bool> {
        let mut sessions = self.sessions.write().map_err(|_| Error::LockPoisoned)?;

        let mask = session.mask();
        match sessions.get(mask.as_str()) {
            Some(entry) if Arc::ptr_eq(entry, session) => {
                sessions.remove(mask.as_str());
                tracing::info!(%mask, "session stopped");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Snapshot of the full mask → session mapping.
    ///
    /// For host iteration and administration; the snapshot does not
    /// track later registry changes.
    pub fn all(&self) -> Result<Vec<(Mask, Arc<Session>)>> {
        let sessions = self.sessions.read().map_err(|_| Error::LockPoisoned)?;
        Ok(sessions
            .iter()
            .map(|(mask, session)| (mask.clone(), Arc::clone(session)))
            .collect())
    }

    /// Remove every session that was started and has since expired.
    ///
    /// Never-started sessions are pre-auth handshakes, not garbage, and
    /// are kept. Intended for the host's periodic sweep; nothing in this
    /// crate schedules it. Returns the number of sessions removed.
    pub fn purge_expired(&self) -> Result<usize> {
        let mut sessions = self.sessions.write().map_err(|_| Error::LockPoisoned)?;

        let before = sessions.len();
        let now = Instant::now();
        sessions.retain(|mask, session| match session.expiration() {
            Some(at) if at <= now => {
                tracing::debug!(%mask, "purged expired session");
                false
            }
            _ => true,
        });

        Ok(before - sessions.len())
    }

    /// Number of registered sessions, expired ones included.
    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Returns `true` if no session is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shared rename path for `migrate` and `set_mask`. Caller holds the
    /// write lock and has resolved `session` as the occupant to move.
    fn rename_locked(
        sessions: &mut HashMap<Mask, Arc<Session>>,
        session: &Arc<Session>,
        new: Mask,
    ) -> Result<()> {
        let old = session.mask();
        if old == new {
            return Ok(());
        }

        if sessions.contains_key(new.as_str()) {
            return Err(Error::MaskTaken(new));
        }

        sessions.remove(old.as_str());
        session.replace_mask(new.clone());
        sessions.insert(new.clone(), Arc::clone(session));

        tracing::info!(%old, %new, "session mask migrated");
        Ok(())
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(SessionConfig {
            duration: Duration::from_secs(3600),
        })
    }

    fn mask(s: &str) -> Mask {
        s.parse().unwrap()
    }

    #[test]
    fn test_create_then_lookup_returns_same_session() {
        let reg = registry();
        let session = reg.create(UserId::new(1), mask("alice!~a@host")).unwrap();

        let found = reg.lookup("alice!~a@host").unwrap().unwrap();
        assert!(Arc::ptr_eq(&session, &found));
    }

    #[test]
    fn test_lookup_miss_is_none() {
        let reg = registry();
        assert!(reg.lookup("nobody!n@host").unwrap().is_none());
    }

    #[test]
    fn test_lookup_accepts_mask_and_str() {
        let reg = registry();
        reg.create(UserId::new(1), mask("bob!b@host")).unwrap();

        assert!(reg.lookup(mask("bob!b@host")).unwrap().is_some());
        assert!(reg.lookup("bob!b@host").unwrap().is_some());
        assert!(reg.lookup(String::from("bob!b@host")).unwrap().is_some());
    }

    #[test]
    fn test_create_replaces_existing_entry() {
        let reg = registry();
        let first = reg.create(UserId::new(1), mask("carol!c@host")).unwrap();
        let second = reg.create(UserId::new(2), mask("carol!c@host")).unwrap();

        let found = reg.lookup("carol!c@host").unwrap().unwrap();
        assert!(Arc::ptr_eq(&second, &found));
        assert!(!Arc::ptr_eq(&first, &found));
        assert_eq!(reg.len(), 1);

        // The displaced object itself is untouched.
        assert_eq!(first.mask().as_str(), "carol!c@host");
    }

    #[test]
    fn test_migrate_moves_entry() {
        let reg = registry();
        let session = reg.create(UserId::new(1), mask("dave!d@host")).unwrap();

        let moved = reg.migrate("dave!d@host", mask("dave!d@new")).unwrap();
        assert!(Arc::ptr_eq(&session, &moved));

        assert!(reg.lookup("dave!d@host").unwrap().is_none());
        let found = reg.lookup("dave!d@new").unwrap().unwrap();
        assert!(Arc::ptr_eq(&session, &found));
        assert_eq!(session.mask().as_str(), "dave!d@new");
    }

    #[test]
    fn test_migrate_unknown_mask_fails() {
        let reg = registry();
        let result = reg.migrate("ghost!g@host", mask("ghost!g@new"));
        assert!(matches!(result, Err(Error::SessionNotFound(_))));
    }

    #[test]
    fn test_migrate_onto_occupied_mask_rejected() {
        let reg = registry();
        let eve = reg.create(UserId::new(1), mask("eve!e@host")).unwrap();
        let mallory = reg.create(UserId::new(2), mask("mallory!m@host")).unwrap();

        let result = reg.migrate("eve!e@host", mask("mallory!m@host"));
        assert!(matches!(result, Err(Error::MaskTaken(_))));

        // Both sessions stay reachable under their original masks.
        assert!(Arc::ptr_eq(
            &eve,
            &reg.lookup("eve!e@host").unwrap().unwrap()
        ));
        assert!(Arc::ptr_eq(
            &mallory,
            &reg.lookup("mallory!m@host").unwrap().unwrap()
        ));
    }

    #[test]
    fn test_migrate_onto_own_mask_is_noop() {
        let reg = registry();
        let session = reg.create(UserId::new(1), mask("frank!f@host")).unwrap();

        let moved = reg.migrate("frank!f@host", mask("frank!f@host")).unwrap();
        assert!(Arc::ptr_eq(&session, &moved));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_set_mask_renames_by_handle() {
        let reg = registry();
        let session = reg.create(UserId::new(1), mask("grace!g@host")).unwrap();

        reg.set_mask(&session, mask("grace!g@new")).unwrap();

        assert!(reg.lookup("grace!g@host").unwrap().is_none());
        assert!(Arc::ptr_eq(
            &session,
            &reg.lookup("grace!g@new").unwrap().unwrap()
        ));
    }

    #[test]
    fn test_set_mask_on_replaced_session_fails() {
        let reg = registry();
        let stale = reg.create(UserId::new(1), mask("heidi!h@host")).unwrap();
        let current = reg.create(UserId::new(2), mask("heidi!h@host")).unwrap();

        let result = reg.set_mask(&stale, mask("heidi!h@new"));
        assert!(matches!(result, Err(Error::SessionNotFound(_))));

        // The successor is unaffected.
        assert!(Arc::ptr_eq(
            &current,
            &reg.lookup("heidi!h@host").unwrap().unwrap()
        ));
    }

    #[test]
    fn test_stop_removes_entry() {
        let reg = registry();
        let session = reg.create(UserId::new(1), mask("ivan!i@host")).unwrap();
        session.start().unwrap();

        assert!(reg.stop(&session).unwrap());
        assert!(reg.lookup("ivan!i@host").unwrap().is_none());
        assert!(reg.is_empty());

        // The lingering handle keeps its state; only reachability ended.
        assert!(session.active());
    }

    #[test]
    fn test_stop_replaced_session_cannot_evict_successor() {
        let reg = registry();
        let stale = reg.create(UserId::new(1), mask("judy!j@host")).unwrap();
        let current = reg.create(UserId::new(2), mask("judy!j@host")).unwrap();

        assert!(!reg.stop(&stale).unwrap());
        assert!(Arc::ptr_eq(
            &current,
            &reg.lookup("judy!j@host").unwrap().unwrap()
        ));
    }

    #[test]
    fn test_stop_twice_is_false_second_time() {
        let reg = registry();
        let session = reg.create(UserId::new(1), mask("kim!k@host")).unwrap();

        assert!(reg.stop(&session).unwrap());
        assert!(!reg.stop(&session).unwrap());
    }

    #[test]
    fn test_all_snapshots_every_entry() {
        let reg = registry();
        reg.create(UserId::new(1), mask("lena!l@host")).unwrap();
        reg.create(UserId::new(2), mask("marc!m@host")).unwrap();

        let all = reg.all().unwrap();
        assert_eq!(all.len(), 2);
        let masks: Vec<String> = all.iter().map(|(m, _)| m.to_string()).collect();
        assert!(masks.contains(&"lena!l@host".to_string()));
        assert!(masks.contains(&"marc!m@host".to_string()));
    }

    #[test]
    fn test_purge_expired_removes_only_started_and_expired() {
        let reg = SessionRegistry::new(SessionConfig {
            duration: Duration::ZERO,
        });

        let expired = reg.create(UserId::new(1), mask("nina!n@host")).unwrap();
        expired.start().unwrap();

        // Never started: kept.
        reg.create(UserId::new(2), mask("omar!o@host")).unwrap();

        let purged = reg.purge_expired().unwrap();
        assert_eq!(purged, 1);
        assert!(reg.lookup("nina!n@host").unwrap().is_none());
        assert!(reg.lookup("omar!o@host").unwrap().is_some());
    }

    #[test]
    fn test_purge_keeps_active_sessions() {
        let reg = registry();
        let session = reg.create(UserId::new(1), mask("pat!p@host")).unwrap();
        session.start().unwrap();

        assert_eq!(reg.purge_expired().unwrap(), 0);
        assert!(reg.lookup("pat!p@host").unwrap().is_some());
    }

    #[test]
    fn test_sessions_have_independent_storage() {
        let reg = registry();
        let a = reg.create(UserId::new(1), mask("quinn!q@host")).unwrap();
        let b = reg.create(UserId::new(2), mask("rita!r@host")).unwrap();

        a.storage().unwrap().set("slot", 1u32);
        b.storage().unwrap().set("slot", 2u32);

        assert_eq!(a.storage().unwrap().get::<u32, _>("slot"), Some(&1));
        assert_eq!(b.storage().unwrap().get::<u32, _>("slot"), Some(&2));
    }

    #[test]
    fn test_concurrent_access() {
        use std::thread;

        let reg = Arc::new(registry());
        let mut handles = vec![];

        // 50 threads each create a session under a distinct mask.
        for i in 0..50 {
            let reg = Arc::clone(&reg);
            handles.push(thread::spawn(move || {
                let m = mask(&format!("user{i}!u@host"));
                reg.create(UserId::new(i), m).unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(reg.len(), 50);
        assert!(reg.lookup("user0!u@host").unwrap().is_some());
        assert!(reg.lookup("user49!u@host").unwrap().is_some());
    }
}
