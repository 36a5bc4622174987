//! Registry and watcher configuration.

use std::time::Duration;

// ---------------------------------------------------------------------------
// RegistryConfig
// ---------------------------------------------------------------------------

/// Settings for a [`LobbyRegistry`](crate::LobbyRegistry).
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Largest capacity a lobby may be created with.
    pub max_capacity: usize,

    /// Symbols per generated lobby id. Values below
    /// [`MIN_ID_LENGTH`](Self::MIN_ID_LENGTH) are raised to it.
    pub id_length: usize,

    /// Command queue size of each lobby actor.
    pub command_buffer: usize,

    /// How long a waiting lobby may sit untouched before
    /// [`expire_idle`](crate::LobbyRegistry::expire_idle) removes it.
    pub idle_ttl: Duration,
}

impl RegistryConfig {
    /// Shortest id accepted. 6 symbols of a 32-symbol alphabet give
    /// about a billion ids.
    pub const MIN_ID_LENGTH: usize = 6;

    /// Returns a copy with out-of-range values clamped.
    pub fn validated(mut self) -> Self {
        self.max_capacity = self.max_capacity.max(1);
        self.id_length = self.id_length.max(Self::MIN_ID_LENGTH);
        self.command_buffer = self.command_buffer.max(1);
        self
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_capacity: 8,
            id_length: 8,
            command_buffer: 64,
            idle_ttl: Duration::from_secs(30 * 60),
        }
    }
}

// ---------------------------------------------------------------------------
// WatchConfig
// ---------------------------------------------------------------------------

/// Settings for a lobby poll loop started by
/// [`watch_lobby`](crate::watch_lobby).
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Time between polls.
    pub interval: Duration,

    /// Random extra delay before the second poll.
    pub initial_jitter: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            initial_jitter: Duration::from_millis(250),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_config_default() {
        let config = RegistryConfig::default();
        assert_eq!(config.max_capacity, 8);
        assert_eq!(config.id_length, 8);
        assert_eq!(config.command_buffer, 64);
        assert_eq!(config.idle_ttl, Duration::from_secs(1800));
    }

    #[test]
    fn test_registry_config_validated_clamps_short_ids() {
        let config = RegistryConfig {
            max_capacity: 0,
            id_length: 3,
            command_buffer: 0,
            ..RegistryConfig::default()
        }
        .validated();
        assert_eq!(config.max_capacity, 1);
        assert_eq!(config.id_length, RegistryConfig::MIN_ID_LENGTH);
        assert_eq!(config.command_buffer, 1);
    }

    #[test]
    fn test_watch_config_default() {
        let config = WatchConfig::default();
        assert_eq!(config.interval, Duration::from_secs(2));
        assert_eq!(config.initial_jitter, Duration::from_millis(250));
    }
}
