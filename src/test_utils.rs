//! Shared test initialization.
//!
//! Loads `.env_test` (falling back to `.env`) exactly once so tests that
//! read store configuration from the environment see a consistent setup,
//! and installs a tracing subscriber so `RUST_LOG` controls test output.

use std::sync::Once;

pub fn init_test_environment() {
    static ENV_INIT: Once = Once::new();
    ENV_INIT.call_once(|| {
        if dotenvy::from_filename(".env_test").is_err() {
            dotenvy::dotenv().ok();
        }
        // Another test harness may have installed a subscriber already
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_test_environment();
        init_test_environment();
        // Logging through the installed subscriber must not panic
        tracing::debug!("test environment initialized");
    }
}
