use arena_shared::config::GameConfig;
use arena_shared::protocol::{GrassPatchWire, MapWire, ObstacleWire};
use arena_shared::vec2::{distance, Vec2};
use rand::Rng;

/// Axis-aligned rectangle, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Obstacle {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether a square of half-extent `half` centered on `p` overlaps this rectangle.
    fn overlaps(&self, p: Vec2, half: f64) -> bool {
        p.x + half > self.x
            && p.x - half < self.x + self.width
            && p.y + half > self.y
            && p.y - half < self.y + self.height
    }
}

/// Circular stealth zone. Only affects visibility, never collision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrassPatch {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl GrassPatch {
    pub fn contains(&self, p: Vec2) -> bool {
        distance(p, Vec2::new(self.x, self.y)) < self.radius
    }
}

/// Static arena layout. Built once per process and shared read-only by every room.
#[derive(Debug, Clone)]
pub struct WorldMap {
    width: f64,
    height: f64,
    obstacles: Vec<Obstacle>,
    grass_patches: Vec<GrassPatch>,
}

impl WorldMap {
    pub fn new(
        width: f64,
        height: f64,
        obstacles: Vec<Obstacle>,
        grass_patches: Vec<GrassPatch>,
    ) -> Self {
        Self {
            width,
            height,
            obstacles,
            grass_patches,
        }
    }

    /// Fixed obstacles plus `grass_patch_count` randomly placed grass patches.
    pub fn generate(config: &GameConfig, rng: &mut impl Rng) -> Self {
        let width = config.map_width as f64;
        let height = config.map_height as f64;

        let band = config.grass_max_radius - config.grass_min_radius;
        let grass_patches = (0..config.grass_patch_count)
            .map(|_| GrassPatch {
                x: (rng.gen::<f64>() * width).trunc(),
                y: (rng.gen::<f64>() * height).trunc(),
                radius: (config.grass_min_radius + rng.gen::<f64>() * band).trunc(),
            })
            .collect();

        Self::new(
            width,
            height,
            fixed_obstacles(config.map_width, config.map_height),
            grass_patches,
        )
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn grass_patches(&self) -> &[GrassPatch] {
        &self.grass_patches
    }

    /// True if a body of half-extent `half` at `p` leaves the map or touches an obstacle.
    pub fn collides(&self, p: Vec2, half: f64) -> bool {
        if p.x - half < 0.0
            || p.x + half > self.width
            || p.y - half < 0.0
            || p.y + half > self.height
        {
            return true;
        }
        self.obstacles.iter().any(|o| o.overlaps(p, half))
    }

    /// True if `p` lies strictly inside any grass patch.
    pub fn in_grass(&self, p: Vec2) -> bool {
        self.grass_patches.iter().any(|g| g.contains(p))
    }

    pub fn to_wire(&self) -> MapWire {
        MapWire {
            obstacles: self
                .obstacles
                .iter()
                .map(|o| ObstacleWire {
                    x: o.x as u32,
                    y: o.y as u32,
                    width: o.width as u32,
                    height: o.height as u32,
                })
                .collect(),
            grass_patches: self
                .grass_patches
                .iter()
                .map(|g| GrassPatchWire {
                    x: g.x as u32,
                    y: g.y as u32,
                    radius: g.radius as u32,
                })
                .collect(),
        }
    }
}

/// One 200x200 block in the middle and a 100x100 block inset 50 units from each corner.
pub fn fixed_obstacles(width: u32, height: u32) -> Vec<Obstacle> {
    let w = width as f64;
    let h = height as f64;
    vec![
        Obstacle::new(
            (width / 2) as f64 - 100.0,
            (height / 2) as f64 - 100.0,
            200.0,
            200.0,
        ),
        Obstacle::new(50.0, 50.0, 100.0, 100.0),
        Obstacle::new(w - 150.0, 50.0, 100.0, 100.0),
        Obstacle::new(50.0, h - 150.0, 100.0, 100.0),
        Obstacle::new(w - 150.0, h - 150.0, 100.0, 100.0),
    ]
}
