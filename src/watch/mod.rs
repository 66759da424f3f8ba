//! Directory watching
//!
//! - `event`: change kinds, event masks and the notifications delivered to the dispatcher
//! - `backend`: the seam to the OS watch facility (`notify`) plus an in-memory backend
//! - `tree`: discovery and incremental growth of the set of watched directories

pub mod backend;
pub mod event;
pub mod tree;

pub use backend::{MemoryBackend, NotifyBackend, WatchBackend};
pub use event::{ChangeEvent, ChangeKind, EventMask, WatchNotification};
pub use tree::{Registered, WatchRegistration, WatchTree};

// vim: ts=4
