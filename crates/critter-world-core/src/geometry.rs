//! Torus-aware planar geometry.
//!
//! Headings and bearings are degrees measured counter-clockwise on a screen
//! whose y axis grows downward, so a heading of 90° points toward smaller y.

use serde::{Deserialize, Serialize};

/// Axis-aligned box given by its min and max corners.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Bounds {
    /// Square box of half-extent `half` around `center`.
    pub fn around(center: [f64; 2], half: f64) -> Self {
        Self {
            min: [center[0] - half, center[1] - half],
            max: [center[0] + half, center[1] + half],
        }
    }

    /// Clip to the world rectangle `[0, width] x [0, height]`.
    pub fn clamped(self, width: f64, height: f64) -> Self {
        Self {
            min: [self.min[0].max(0.0), self.min[1].max(0.0)],
            max: [self.max[0].min(width), self.max[1].min(height)],
        }
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min[0] <= other.max[0]
            && other.min[0] <= self.max[0]
            && self.min[1] <= other.max[1]
            && other.min[1] <= self.max[1]
    }
}

/// Wrap a position into `[0, width) x [0, height)`.
pub fn wrap_position(position: [f64; 2], width: f64, height: f64) -> [f64; 2] {
    [
        wrap_coord(position[0], width),
        wrap_coord(position[1], height),
    ]
}

fn wrap_coord(value: f64, extent: f64) -> f64 {
    let wrapped = value.rem_euclid(extent);
    // rem_euclid can round up to `extent` for tiny negative inputs.
    if wrapped >= extent {
        0.0
    } else {
        wrapped
    }
}

/// Normalize an angle in degrees to `[0, 360)`.
pub fn normalize_degrees(angle: f64) -> f64 {
    wrap_coord(angle, 360.0)
}

/// Displacement produced by travelling `distance` along `heading`.
pub fn displacement(heading: f64, distance: f64) -> [f64; 2] {
    let radians = heading.to_radians();
    [distance * radians.cos(), -distance * radians.sin()]
}

/// Point at `distance` along `heading` from `origin`, not wrapped.
pub fn endpoint(origin: [f64; 2], heading: f64, distance: f64) -> [f64; 2] {
    let [dx, dy] = displacement(heading, distance);
    [origin[0] + dx, origin[1] + dy]
}

/// Shortest signed offset along one axis of a torus.
pub fn wrapped_delta(delta: f64, extent: f64) -> f64 {
    (delta + extent / 2.0).rem_euclid(extent) - extent / 2.0
}

/// Shortest offset from `from` to `to` across the torus.
pub fn torus_offset(from: [f64; 2], to: [f64; 2], width: f64, height: f64) -> [f64; 2] {
    [
        wrapped_delta(to[0] - from[0], width),
        wrapped_delta(to[1] - from[1], height),
    ]
}

pub fn torus_distance(from: [f64; 2], to: [f64; 2], width: f64, height: f64) -> f64 {
    let [dx, dy] = torus_offset(from, to, width, height);
    (dx * dx + dy * dy).sqrt()
}

/// Bearing in `[0, 360)` from `from` toward `to` along the shortest torus path.
pub fn torus_bearing(from: [f64; 2], to: [f64; 2], width: f64, height: f64) -> f64 {
    let [dx, dy] = torus_offset(from, to, width, height);
    normalize_degrees((-dy).atan2(dx).to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn in_bounds(p: [f64; 2], w: f64, h: f64) -> bool {
        (0.0..w).contains(&p[0]) && (0.0..h).contains(&p[1])
    }

    #[test]
    fn wrap_handles_negative_and_overflow() {
        assert_eq!(wrap_position([-5.0, 455.0], 450.0, 450.0), [445.0, 5.0]);
        assert_eq!(wrap_position([450.0, 0.0], 450.0, 450.0), [0.0, 0.0]);
        assert_eq!(wrap_position([-900.0, 1350.5], 450.0, 450.0), [0.0, 0.5]);
    }

    proptest! {
        #[test]
        fn wrap_keeps_every_displacement_in_bounds(
            x in 0.0f64..450.0,
            y in 0.0f64..300.0,
            dx in -1e9f64..1e9,
            dy in -1e9f64..1e9,
        ) {
            let (w, h) = (450.0, 300.0);
            let p = wrap_position([x + dx, y + dy], w, h);
            prop_assert!(in_bounds(p, w, h), "({x}, {y}) + ({dx}, {dy}) -> {p:?}");
        }

        #[test]
        fn wrap_keeps_tiny_negative_steps_in_bounds(
            x in 0.0f64..450.0,
            eps in 0.0f64..1e-9,
        ) {
            let p = wrap_position([x - eps, -eps], 450.0, 450.0);
            prop_assert!(in_bounds(p, 450.0, 450.0), "{p:?}");
        }
    }

    #[test]
    fn displacement_follows_screen_convention() {
        let [dx, dy] = displacement(0.0, 12.0);
        assert!((dx - 12.0).abs() < 1e-12 && dy.abs() < 1e-12);
        let [dx, dy] = displacement(90.0, 12.0);
        assert!(dx.abs() < 1e-9 && (dy + 12.0).abs() < 1e-9);
    }

    #[test]
    fn torus_distance_takes_shortcut_across_edge() {
        let d = torus_distance([1.0, 50.0], [449.0, 50.0], 450.0, 450.0);
        assert!((d - 2.0).abs() < 1e-9);
    }

    #[test]
    fn bearing_is_counter_clockwise_with_y_down() {
        let origin = [100.0, 100.0];
        assert!((torus_bearing(origin, [110.0, 100.0], 450.0, 450.0) - 0.0).abs() < 1e-9);
        assert!((torus_bearing(origin, [100.0, 90.0], 450.0, 450.0) - 90.0).abs() < 1e-9);
        assert!((torus_bearing(origin, [90.0, 100.0], 450.0, 450.0) - 180.0).abs() < 1e-9);
        assert!((torus_bearing(origin, [100.0, 110.0], 450.0, 450.0) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn bounds_intersection_includes_touching_edges() {
        let a = Bounds::around([10.0, 10.0], 5.0);
        assert!(a.intersects(&Bounds::around([20.0, 10.0], 5.0)));
        assert!(!a.intersects(&Bounds::around([21.0, 10.0], 5.0)));
    }
}
