//! Error Types for the Decision Core
//!
//! ## Design Philosophy
//!
//! Most of what can go wrong in a decision cycle is *not* an error here:
//!
//! - a missing or stale live reading becomes an `OFFLINE` decision,
//! - a short history becomes `WAIT_DATA`,
//! - missing feature columns are zero-filled.
//!
//! Those are normal, successful outcomes with a descriptive status. The
//! variants below cover the remaining cases where the caller handed the core
//! something it cannot work with at all.
//!
//! ```rust
//! use verdant_core::{CoreError, PolicyConfig};
//!
//! let broken = PolicyConfig { thr_lo: 0.8, ..PolicyConfig::default() };
//! match broken.validate() {
//!     Err(CoreError::InvalidConfig { reason }) => {
//!         // refuse to start serving
//!         assert!(reason.contains("thr_lo"));
//!     }
//!     _ => unreachable!(),
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by the decision core
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum CoreError {
    /// A history window had no rows at all
    #[error("History window is empty")]
    EmptyWindow,

    /// Policy configuration violates its ordering constraints
    #[error("Invalid policy configuration: {reason}")]
    InvalidConfig {
        /// Which constraint failed
        reason: &'static str,
    },
}
