//! core
//!
//! Domain types and durable state shared by the resolution and sync layers.
//!
//! - [`types`] - Origin and revision newtypes, origin normalization
//! - [`paths`] - Project and global storage path layout
//! - [`lock`] - The persisted lock set of `(origin, version)` -> revision pins

pub mod lock;
pub mod paths;
pub mod types;

pub use lock::{LockError, LockKey, LockSet};
pub use types::Origin;
