//! Diagnostic logging setup.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Environment variable holding the log filter, e.g. `medha=debug`.
pub const FILTER_VAR: &str = "RUST_LOG";

/// Installs a stderr subscriber filtered by `RUST_LOG`.
///
/// Does nothing when the variable is unset, so a plain run prints only what the
/// display sink writes. Returns true if a subscriber was installed by this call.
pub fn init_logging() -> bool {
    let Ok(filter) = EnvFilter::try_from_env(FILTER_VAR) else {
        return false;
    };

    let mut installed = false;
    if !tracing::dispatcher::has_been_set() {
        INIT.call_once(|| {
            installed = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init()
                .is_ok();
        });
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn unset_filter_installs_nothing() {
        unsafe {
            std::env::remove_var(FILTER_VAR);
        }
        assert!(!init_logging());
    }
}
