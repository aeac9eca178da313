use arena_shared::config::GameConfig;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Seed for the world map. `None` draws one from OS entropy.
    pub map_seed: Option<u64>,
    /// Frames buffered per connection before new frames are dropped for it
    pub outbound_queue_capacity: usize,
    /// Allowed CORS origins. Empty means permissive.
    pub allowed_origins: Vec<String>,
    pub game: GameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            map_seed: None,
            outbound_queue_capacity: 256,
            allowed_origins: Vec::new(),
            game: GameConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.is_empty() {
            return Err("listen_addr must not be empty".to_string());
        }
        if self.outbound_queue_capacity == 0 {
            return Err("outbound_queue_capacity must be > 0".to_string());
        }
        self.game.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_server_config_is_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_queue_capacity_invalid() {
        let config = ServerConfig {
            outbound_queue_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_game_config_propagates() {
        let mut config = ServerConfig::default();
        config.game.player_speed = 0.0;
        assert!(config.validate().is_err());
    }
}
