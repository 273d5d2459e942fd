//! Environment variable based runtime tuning.
//!
//! ## Environment Variables
//!
//! ### `RESTLING_STACK_SIZE`
//!
//! Stack size in bytes for the accept-loop and transaction coroutines.
//! Accepts decimal (`16384`) or hexadecimal (`0x4000`) values.
//! Default: `0x4000` (16 KB).
//!
//! ### `RESTLING_READ_TIMEOUT_MS`
//!
//! Per-connection read timeout in milliseconds. A peer that goes idle past
//! this is abandoned by the transport and surfaces as a read failure on the
//! transaction. Default: `10000` (10 s).

use std::env;
use std::time::Duration;

const DEFAULT_STACK_SIZE: usize = 0x4000;
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime configuration loaded from environment variables.
///
/// Snapshotted by `Server::start`; changing the environment afterwards only
/// affects subsequently started runs.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Stack size for spawned coroutines in bytes.
    pub stack_size: usize,
    /// Read timeout applied to every accepted connection.
    pub read_timeout: Duration,
}

impl RuntimeConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        let stack_size = env::var("RESTLING_STACK_SIZE")
            .ok()
            .and_then(|value| parse_size(&value))
            .unwrap_or(DEFAULT_STACK_SIZE);
        let read_timeout = env::var("RESTLING_READ_TIMEOUT_MS")
            .ok()
            .and_then(|value| value.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_READ_TIMEOUT);
        RuntimeConfig {
            stack_size,
            read_timeout,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            stack_size: DEFAULT_STACK_SIZE,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

fn parse_size(value: &str) -> Option<usize> {
    if let Some(hex) = value.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else {
        value.parse().ok()
    }
}
