//! Log initialization.
//!
//! `MINDLOCK_LOG` holds the filter directives (default `info`).
//! `MINDLOCK_LOG_FORMAT=json` switches to structured JSON lines.
//! Logs go to stderr; stdout belongs to the interactive sessions.

use tracing_subscriber::EnvFilter;

pub const LOG_FILTER_ENV: &str = "MINDLOCK_LOG";
pub const LOG_FORMAT_ENV: &str = "MINDLOCK_LOG_FORMAT";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match std::env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}
