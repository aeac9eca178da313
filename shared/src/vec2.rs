/// 2D vector utilities for the arena plane.
/// Serialized as `{x, y}`, which is also the wire `position` shape.

#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export, export_to = "../../frontend/src/types/generated/")]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Shorthand constructor
pub fn vec2(x: f64, y: f64) -> Vec2 {
    Vec2::new(x, y)
}

/// Vector length
pub fn length(v: Vec2) -> f64 {
    (v.x * v.x + v.y * v.y).sqrt()
}

/// Normalize vector to unit length. The zero vector stays zero.
pub fn normalize(v: Vec2) -> Vec2 {
    let len = length(v);
    if len == 0.0 {
        return v;
    }
    Vec2::new(v.x / len, v.y / len)
}

/// Scale vector by scalar
pub fn scale(v: Vec2, s: f64) -> Vec2 {
    Vec2::new(v.x * s, v.y * s)
}

/// Add two vectors
pub fn add(a: Vec2, b: Vec2) -> Vec2 {
    Vec2::new(a.x + b.x, a.y + b.y)
}

/// Euclidean distance between two points
pub fn distance(a: Vec2, b: Vec2) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Unit vector pointing along `angle` (radians, 0 = +x).
pub fn from_angle(angle: f64) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Facing angle of a movement vector.
///
/// `atan2` of the normalized vector; the zero vector gives `atan2(0, 0) = 0`.
pub fn heading(v: Vec2) -> f64 {
    let n = normalize(v);
    n.y.atan2(n.x)
}

/// Move `from` by `speed` units along `angle`.
pub fn advance(from: Vec2, angle: f64, speed: f64) -> Vec2 {
    add(from, scale(from_angle(angle), speed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    fn assert_vec2_close(a: Vec2, b: Vec2) {
        assert_close(a.x, b.x);
        assert_close(a.y, b.y);
    }

    #[test]
    fn length_of_3_4_is_5() {
        assert_eq!(length(vec2(3.0, 4.0)), 5.0);
    }

    #[test]
    fn normalize_returns_unit_vector() {
        let v = normalize(vec2(3.0, 4.0));
        assert_close(length(v), 1.0);
        assert_vec2_close(v, vec2(0.6, 0.8));
    }

    #[test]
    fn normalize_zero_stays_zero() {
        assert_eq!(normalize(vec2(0.0, 0.0)), vec2(0.0, 0.0));
    }

    #[test]
    fn heading_ignores_magnitude() {
        assert_close(heading(vec2(4.0, 0.0)), 0.0);
        assert_close(heading(vec2(0.0, 4.0)), FRAC_PI_2);
        assert_close(heading(vec2(-4.0, 4.0)), 3.0 * FRAC_PI_4);
        assert_close(heading(vec2(-1.0, 0.0)), PI);
    }

    #[test]
    fn heading_of_zero_vector_is_zero() {
        assert_eq!(heading(vec2(0.0, 0.0)), 0.0);
    }

    #[test]
    fn advance_moves_along_angle() {
        assert_vec2_close(advance(vec2(1800.0, 1300.0), 0.0, 4.0), vec2(1804.0, 1300.0));
        assert_vec2_close(advance(vec2(10.0, 10.0), FRAC_PI_2, 7.0), vec2(10.0, 17.0));
    }

    #[test]
    fn distance_is_symmetric() {
        let a = vec2(1.0, 2.0);
        let b = vec2(4.0, 6.0);
        assert_close(distance(a, b), 5.0);
        assert_close(distance(b, a), 5.0);
    }
}
