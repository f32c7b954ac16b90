//! Keeps a record's file reference and its storage backend consistent
//! across insert, update and load.
//!
//! The persistence layer calls the hooks on [`AttachmentLifecycle`]
//! explicitly: `on_before_insert` / `on_before_update` / `on_before_detach`
//! before writing the row, `on_load` after reading it.

mod blocking;
mod error;
mod lifecycle;
pub mod naming;

pub use blocking::BlockingAttachmentLifecycle;
pub use error::AttachmentError;
pub use lifecycle::AttachmentLifecycle;
