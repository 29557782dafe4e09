//! ui
//!
//! Output and logging utilities.
//!
//! # Modules
//!
//! - [`output`] - Verbosity levels and the [`Logger`] handle
//!
//! # Design
//!
//! All user-facing output goes through this module. Logging state is held
//! in an explicit [`Logger`] value passed to the components that need it
//! rather than in process-global state, so tests and library callers can
//! control verbosity independently.

pub mod output;

pub use output::{sanitize_origin, Logger, Verbosity};
