//! Runtime configuration.
//!
//! Configuration is per thread, like the rest of the runtime. Install it with
//! [`configure`] before creating any reactive values if the defaults do not
//! fit.

use crate::reactive::runtime::with_runtime;

/// Default number of computations one flush may run before it is treated as
/// an infinite loop.
pub const DEFAULT_MAX_UPDATES_PER_FLUSH: usize = 100_000;

/// Tunables for the thread-local reactive runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Upper bound on computations run by a single flush. Exceeding it aborts
    /// the flush with [`Error::RunawayUpdates`](crate::Error::RunawayUpdates).
    pub max_updates_per_flush: usize,

    /// Emit a `tracing` warning when a computation or cleanup is created with
    /// no owning root, since nothing will ever dispose it.
    pub warn_unowned: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_updates_per_flush: DEFAULT_MAX_UPDATES_PER_FLUSH,
            warn_unowned: true,
        }
    }
}

/// Replace the current thread's runtime configuration.
pub fn configure(config: RuntimeConfig) {
    tracing::debug!(?config, "runtime configured");
    with_runtime(|rt| rt.config = config);
}

/// The current thread's runtime configuration.
pub fn config() -> RuntimeConfig {
    with_runtime(|rt| rt.config.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configure_round_trips() {
        let original = config();
        assert_eq!(original, RuntimeConfig::default());

        configure(RuntimeConfig {
            max_updates_per_flush: 5,
            warn_unowned: false,
        });
        assert_eq!(config().max_updates_per_flush, 5);
        assert!(!config().warn_unowned);

        configure(original);
    }
}
