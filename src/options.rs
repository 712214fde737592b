//! Discovery options configuration.
//!
//! This module provides the [`DiscoveryOptions`] struct for configuring
//! a discovery run.

use std::time::Duration;

/// Configuration options for a discovery run.
///
/// # Default Behavior
///
/// Each direct detector (`find()`) and the candidate enumeration get 10
/// seconds. A detector that exceeds its budget is treated as "not found";
/// the other detectors are unaffected. Raise the value when scanning slow
/// network mounts.
///
/// # Example
///
/// ```rust
/// use python_locator::DiscoveryOptions;
/// use std::time::Duration;
///
/// let opts = DiscoveryOptions {
///     timeout: Duration::from_secs(30),
///     ..Default::default()
/// };
/// assert_eq!(opts.timeout, Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Budget for each detector's enumeration.
    ///
    /// Default: 10 seconds
    pub timeout: Duration,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

impl DiscoveryOptions {
    /// Options with the given per-detector timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}
