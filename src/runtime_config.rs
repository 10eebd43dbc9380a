//! # Runtime Configuration Module
//!
//! Environment variable-based configuration for the router's runtime
//! behavior: the dispatch timeout, the executor's polling cadence, and the
//! stack size applied to handler coroutines.
//!
//! ## Environment Variables
//!
//! ### `STACKROUTE_DISPATCH_TIMEOUT_MS`
//!
//! Upper bound, per handler invocation, on how long the chain executor waits
//! for the handler to either send a response or fire its continuation.
//! Unset by default: a chain in which nothing fires hangs, which is the
//! documented hazard of the continuation model rather than a bug. Set this
//! when the transport wants `TimedOut` outcomes instead.
//!
//! ### `STACKROUTE_POLL_INTERVAL_US`
//!
//! How often the executor re-checks the response sent-flag and the
//! continuation channel while waiting. Default: 50 microseconds.
//!
//! ### `STACKROUTE_STACK_SIZE`
//!
//! Stack size for handler coroutines, accepted in decimal (`16384`) or
//! hexadecimal (`0x4000`). Default: `0x4000` (16 KB). Apply it to the `may`
//! runtime with [`RuntimeConfig::apply_stack_size`] before spawning.

use std::env;
use std::time::Duration;

const ENV_DISPATCH_TIMEOUT_MS: &str = "STACKROUTE_DISPATCH_TIMEOUT_MS";
const ENV_POLL_INTERVAL_US: &str = "STACKROUTE_POLL_INTERVAL_US";
const ENV_STACK_SIZE: &str = "STACKROUTE_STACK_SIZE";

/// Runtime configuration loaded from environment variables.
///
/// Load this at startup with [`RuntimeConfig::from_env`] and hand it to
/// [`crate::router::Router::from_config`].
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Per-handler wait bound before the executor reports `TimedOut`.
    /// `None` disables hang detection.
    pub dispatch_timeout: Option<Duration>,
    /// Executor polling interval while waiting for a continuation or a
    /// response to be sent.
    pub poll_interval: Duration,
    /// Stack size in bytes for handler coroutines.
    pub stack_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            dispatch_timeout: None,
            poll_interval: Duration::from_micros(50),
            stack_size: 0x4000,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(val) = env::var(ENV_DISPATCH_TIMEOUT_MS) {
            if let Some(ms) = parse_number(&val) {
                config.dispatch_timeout = Some(Duration::from_millis(ms as u64));
            }
        }
        if let Ok(val) = env::var(ENV_POLL_INTERVAL_US) {
            if let Some(us) = parse_number(&val) {
                config.poll_interval = Duration::from_micros(us as u64);
            }
        }
        if let Ok(val) = env::var(ENV_STACK_SIZE) {
            if let Some(size) = parse_number(&val) {
                config.stack_size = size;
            }
        }
        config
    }

    /// Apply the configured stack size to the global `may` runtime.
    pub fn apply_stack_size(&self) {
        may::config().set_stack_size(self.stack_size);
    }
}

/// Parse a decimal or `0x`-prefixed hexadecimal value.
fn parse_number(val: &str) -> Option<usize> {
    if let Some(hex) = val.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else {
        val.parse().ok()
    }
}
