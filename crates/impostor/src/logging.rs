//! `tracing` subscriber setup for the server binary.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

/// Installs a console subscriber filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    init_with_filter(filter);
}

/// Installs a console subscriber with an explicit filter directive, such as
/// `"impostor_room=debug,info"`.
pub fn init_with_directives(directives: &str) {
    init_with_filter(EnvFilter::new(directives));
}

fn init_with_filter(filter: EnvFilter) {
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init_with_directives("debug");
        init();
        tracing::info!(room_id = "r1", "logging initialised");
    }
}
