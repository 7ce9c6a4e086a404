//! Core infrastructure shared by every pipeline stage.
//!
//! # Organization
//!
//! - [`types`]: task types and small value types used across modules
//! - [`constants`]: hyperparameter bounds, defaults and split settings
//! - [`error`]: the crate error type and its coarse [`ErrorKind`] taxonomy
//!
//! ```rust
//! use tabular_eval::core::{
//!     constants::{DEFAULT_TEST_FRACTION, DEFAULT_SPLIT_SEED},
//!     error::{ErrorKind, EvalError, Result},
//!     types::TaskType,
//! };
//!
//! assert_eq!(DEFAULT_SPLIT_SEED, 42);
//! assert!((DEFAULT_TEST_FRACTION - 0.2).abs() < f64::EPSILON);
//! let err = EvalError::training("single class in y_train");
//! assert_eq!(err.kind(), ErrorKind::TrainingFailure);
//! assert!(TaskType::Classification.is_classification());
//! ```

pub mod constants;
pub mod error;
pub mod types;

pub use constants::*;
pub use error::{ErrorKind, EvalError, Result};
pub use types::*;

use std::sync::Once;

/// Version information for the core module
pub const CORE_MODULE_VERSION: &str = env!("CARGO_PKG_VERSION");

static LOGGING: Once = Once::new();

/// Initialize the logging subsystem.
///
/// Defaults the filter to `info` when `RUST_LOG` is unset. Safe to call
/// repeatedly; only the first call has an effect.
pub(crate) fn initialize_logging() {
    LOGGING.call_once(|| {
        let env = env_logger::Env::default().default_filter_or("info");
        // Another logger may already be installed by the host application
        let _ = env_logger::Builder::from_env(env).try_init();
        log::debug!("tabular-eval core {} initialized", CORE_MODULE_VERSION);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_initialization_is_idempotent() {
        initialize_logging();
        initialize_logging();
        assert!(!CORE_MODULE_VERSION.is_empty());
    }
}
