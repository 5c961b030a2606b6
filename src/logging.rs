//! Logger setup for the agent.
//!
//! The `log=` agent option supplies the filter; `MONITOR_AGENT_LOG`, when
//! set, overrides it. Installation uses `try_init`, so a logger already
//! installed in the process is left alone.

use env_logger::{Builder, Env, Target};

pub const LOG_ENV: &str = "MONITOR_AGENT_LOG";

/// Returns `true` if this call installed the logger.
pub fn init_logging(default_filter: &str) -> bool {
    Builder::from_env(Env::new().filter_or(LOG_ENV, default_filter))
        .target(Target::Stderr)
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}
