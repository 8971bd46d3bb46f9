//! Tracing subscriber setup for binaries and tests embedding the store

use crate::error::{Error, Result};
use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber
///
/// `RUST_LOG` wins when set; otherwise `default_filter` (for example
/// `"recipe_store=debug"`) is used. Calling this again after a subscriber is
/// already installed is a no-op as long as the installed one is ours.
pub fn init_tracing(default_filter: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter).map_err(|e| Error::Configuration {
            message: format!("invalid log filter {:?}: {}", default_filter, e),
        })?,
    };

    match tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        Ok(()) => {
            let _ = INITIALIZED.set(());
            tracing::debug!(version = crate::VERSION, "tracing initialized");
            Ok(())
        }
        Err(_) if INITIALIZED.get().is_some() => Ok(()),
        Err(e) => Err(Error::Configuration {
            message: format!("failed to install tracing subscriber: {}", e),
        }),
    }
}

static INITIALIZED: std::sync::OnceLock<()> = std::sync::OnceLock::new();
