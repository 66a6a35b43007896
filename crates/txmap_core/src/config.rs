//! Map configuration.

/// Configuration for a [`TransactionalMap`](crate::TransactionalMap).
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Label attached to log events emitted by the map.
    pub name: String,

    /// Whether to maintain operation counters.
    pub collect_stats: bool,

    /// Whether to log a warning when a transaction handle is dropped while
    /// it still owns the map (the transaction is aborted either way).
    pub warn_on_dropped_transaction: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            name: String::from("txmap"),
            collect_stats: true,
            warn_on_dropped_transaction: true,
        }
    }
}

impl MapConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the label used in log events.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets whether to maintain operation counters.
    #[must_use]
    pub const fn collect_stats(mut self, value: bool) -> Self {
        self.collect_stats = value;
        self
    }

    /// Sets whether dropping a live transaction handle logs a warning.
    #[must_use]
    pub const fn warn_on_dropped_transaction(mut self, value: bool) -> Self {
        self.warn_on_dropped_transaction = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = MapConfig::default();
        assert_eq!(config.name, "txmap");
        assert!(config.collect_stats);
        assert!(config.warn_on_dropped_transaction);
    }

    #[test]
    fn builder_pattern() {
        let config = MapConfig::new()
            .name("sessions")
            .collect_stats(false)
            .warn_on_dropped_transaction(false);

        assert_eq!(config.name, "sessions");
        assert!(!config.collect_stats);
        assert!(!config.warn_on_dropped_transaction);
    }
}
