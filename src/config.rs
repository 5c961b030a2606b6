//! Agent options.
//!
//! The options string is whatever follows `=` in
//! `-agentpath:libmonitor_contention_agent.so=<options>`: comma-separated
//! `key=value` pairs.
//!
//! | key        | values             | default |
//! |------------|--------------------|---------|
//! | `delivery` | `sync` \| `queued` | `sync`  |
//! | `capacity` | queue size, `> 0`  | `1024`  |
//! | `log`      | env_logger filter  | `info`  |

use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionsError {
    #[error("option `{0}` is not of the form key=value")]
    Malformed(String),

    #[error("unknown option `{0}`")]
    UnknownKey(String),

    #[error("invalid value `{value}` for option `{key}`")]
    InvalidValue { key: String, value: String },

    #[error("queue capacity must be greater than zero")]
    ZeroCapacity,
}

/// How forwarded events reach managed code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Upcall on the contending thread before the callback returns.
    Synchronous,
    /// Hand off to a bounded queue drained by one attached worker thread.
    Queued { capacity: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOptions {
    pub delivery: Delivery,
    pub log_filter: String,
}

impl Default for AgentOptions {
    fn default() -> Self {
        AgentOptions {
            delivery: Delivery::Synchronous,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AgentOptions {
    pub fn parse(options: &str) -> Result<Self, OptionsError> {
        let mut opts = AgentOptions::default();
        let mut queued = false;
        let mut capacity = DEFAULT_QUEUE_CAPACITY;

        for pair in options.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| OptionsError::Malformed(pair.to_string()))?;
            let (key, value) = (key.trim(), value.trim());

            match key {
                "delivery" => {
                    queued = match value {
                        "sync" => false,
                        "queued" => true,
                        _ => return Err(invalid(key, value)),
                    }
                }
                "capacity" => {
                    capacity = value.parse().map_err(|_| invalid(key, value))?;
                    if capacity == 0 {
                        return Err(OptionsError::ZeroCapacity);
                    }
                }
                "log" => {
                    if value.is_empty() {
                        return Err(invalid(key, value));
                    }
                    opts.log_filter = value.to_string();
                }
                _ => return Err(OptionsError::UnknownKey(key.to_string())),
            }
        }

        if queued {
            opts.delivery = Delivery::Queued { capacity };
        }
        Ok(opts)
    }
}

impl FromStr for AgentOptions {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentOptions::parse(s)
    }
}

fn invalid(key: &str, value: &str) -> OptionsError {
    OptionsError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
