//! remote
//!
//! Remote access policy: turning a raw origin into a fetchable URL plus an
//! authentication method, and listing remote refs without a clone.
//!
//! - [`access`] - credential stripping, URL rewriting, auth selection
//! - [`gitconfig`] - `insteadOf` rewrite rules from git config files
//! - [`netrc`] - netrc credential lookup
//! - [`refs`] - remote ref listing and ref-name disambiguation

pub mod access;
pub mod gitconfig;
pub mod netrc;
pub mod refs;

pub use access::{resolve_remote_access, AccessError, AuthMethod, RemoteAccess};
pub use refs::{list_remote_refs, remote_head, RefIndex, RefsError};
