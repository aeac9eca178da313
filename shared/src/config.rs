/// Gameplay constants shared by the server simulation and the client renderer.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export, export_to = "../../frontend/src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub map_width: u32,
    pub map_height: u32,
    /// Units moved per accepted movement input
    pub player_speed: f64,
    /// Units a bullet advances per simulation tick
    pub bullet_speed: f64,
    /// Player half-extent, also the hit radius around a player
    pub player_size: f64,
    /// Bullet half-extent used for obstacle collision
    pub bullet_size: f64,
    pub max_health: i32,
    pub bullet_damage: i32,
    /// Bullet simulation tick (milliseconds)
    pub bullet_tick_ms: u64,
    pub grass_patch_count: usize,
    pub grass_min_radius: f64,
    pub grass_max_radius: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            map_width: 2000,
            map_height: 1500,
            player_speed: 4.0,
            bullet_speed: 7.0,
            player_size: 20.0,
            bullet_size: 4.0,
            max_health: 100,
            bullet_damage: 10,
            bullet_tick_ms: 16, // ~60 Hz
            grass_patch_count: 20,
            grass_min_radius: 30.0,
            grass_max_radius: 50.0,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.map_width == 0 || self.map_height == 0 {
            return Err("map dimensions must be > 0".to_string());
        }
        if !self.player_speed.is_finite() || self.player_speed <= 0.0 {
            return Err("player_speed must be finite and > 0".to_string());
        }
        if !self.bullet_speed.is_finite() || self.bullet_speed <= 0.0 {
            return Err("bullet_speed must be finite and > 0".to_string());
        }
        if !self.player_size.is_finite() || self.player_size <= 0.0 {
            return Err("player_size must be finite and > 0".to_string());
        }
        if !self.bullet_size.is_finite() || self.bullet_size < 0.0 {
            return Err("bullet_size must be finite and >= 0".to_string());
        }
        if self.max_health <= 0 {
            return Err("max_health must be > 0".to_string());
        }
        if self.bullet_damage <= 0 || self.bullet_damage > self.max_health {
            return Err("bullet_damage must be in 1..=max_health".to_string());
        }
        if self.bullet_tick_ms == 0 {
            return Err("bullet_tick_ms must be > 0".to_string());
        }
        if !self.grass_min_radius.is_finite() || self.grass_min_radius < 0.0 {
            return Err("grass_min_radius must be finite and >= 0".to_string());
        }
        if !self.grass_max_radius.is_finite() || self.grass_max_radius < self.grass_min_radius {
            return Err("grass_max_radius must be finite and >= grass_min_radius".to_string());
        }
        Ok(())
    }
}
