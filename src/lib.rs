//! # mask-auth
//!
//! Transient mask-keyed authentication sessions for chat-bot hosts.
//!
//! This crate tracks which network identities ("masks") currently hold
//! an active, time-boxed, optionally-confirmed session, and lets plugin
//! code stash per-session state without sharing a namespace.
//!
//! ## Features
//!
//! - **Mask-keyed registry**: one session per identity mask, exact-match
//!   lookup, atomic mask migration
//! - **Time-boxed sessions**: passive expiration with a single
//!   configurable duration (24 hours by default)
//! - **Confirmation gate**: `authed()` requires an active *and*
//!   confirmed session before a mask may act as its account
//! - **Per-plugin storage**: namespaced key-value slots per session,
//!   keyed by name or plugin type
//!
//! ## Quick Start
//!
//! ```
//! use mask_auth::{SessionConfig, SessionRegistry, UserId};
//!
//! fn main() -> mask_auth::Result<()> {
//!     // Initialize logging
//!     mask_auth::logging::try_init().ok();
//!
//!     // One registry for the whole process, injected where needed
//!     let registry = SessionRegistry::new(SessionConfig::default());
//!
//!     // The protocol layer resolved an identity to its mask
//!     let session = registry.create(UserId::new(7), "alice!~a@host".parse()?)?;
//!     session.start()?;
//!
//!     // Active, but not authed until the confirmation protocol runs
//!     assert!(session.active());
//!     assert!(!session.authed());
//!
//!     session.begin_confirmation("1234")?;
//!     session.confirm("1234")?;
//!     assert!(session.authed());
//!
//!     // Plugins keep session-scoped state under their own key
//!     session.storage()?.set("greeter", 1u32);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod session;

// Re-export commonly used types
pub use config::{Config, ConfigError, SessionConfig};
pub use error::{Error, Result};
pub use session::{
    AsMask, Confirmation, Mask, PluginKey, Session, SessionRegistry, SessionStorage, StorageKey,
    UserId,
};
