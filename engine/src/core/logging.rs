//! Logging setup

use super::constants::{APP_NAME_LOWER, ENV_LOG};

/// Install the global tracing subscriber.
///
/// Filter precedence: explicit `filter` argument, `QUERYDECK_LOG`, `RUST_LOG`,
/// then `info`. Calling this more than once is harmless; later calls are
/// ignored because a subscriber is already installed.
pub fn init_logging(filter: Option<&str>) {
    let default_filter = format!("info,{}_engine=info", APP_NAME_LOWER);

    let filter = filter
        .map(str::to_string)
        .or_else(|| std::env::var(ENV_LOG).ok())
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or(default_filter);

    let result = tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_ansi(true)
        .compact()
        .with_env_filter(filter)
        .try_init();

    if result.is_err() {
        tracing::trace!("Tracing subscriber already installed");
    }
}
