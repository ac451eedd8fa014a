//! Tracing subscriber setup
//!
//! Staging and production log JSON lines, development logs human-readable
//! output. `RUST_LOG` takes precedence; otherwise the environment's tracing
//! level applies.

use tracing_subscriber::{fmt, EnvFilter};

use crate::environment::Environment;

/// Installs the global tracing subscriber for the environment
///
/// Returns `false` if a global subscriber was already installed.
#[must_use]
pub fn init_tracing(environment: &Environment) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(environment.tracing_level().as_str()));

    let result = match environment {
        Environment::Production | Environment::Staging => {
            fmt().json().with_env_filter(filter).try_init()
        }
        Environment::Development { .. } => fmt().with_env_filter(filter).try_init(),
    };

    result.is_ok()
}
