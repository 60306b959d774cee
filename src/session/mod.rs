//! Session management module.
//!
//! This module provides the session entity, its per-plugin storage, and
//! the mask-keyed registry that tracks every live session.

mod id;
mod mask;
mod registry;
mod session;
mod storage;

pub use id::UserId;
pub use mask::{AsMask, Mask};
pub use registry::SessionRegistry;
pub use session::{Confirmation, Session};
pub use storage::{PluginKey, SessionStorage, StorageKey};
