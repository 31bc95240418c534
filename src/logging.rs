//! Tracing setup for hosts embedding the shell

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` does not mention this crate
pub const DEFAULT_DIRECTIVE: &str = "ha_shell=info";

fn env_filter() -> EnvFilter {
    let filter = EnvFilter::from_default_env();
    match DEFAULT_DIRECTIVE.parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Install the fmt subscriber. Returns false when a global subscriber was
/// already set, which is harmless.
pub fn init() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .try_init()
        .is_ok()
}
