//! Drivelink - Joystick Command Mapper
//!
//! Stateless transform from raw pointer coordinates on a drag surface to
//! a clamped differential-drive pair. The pipeline:
//!
//! 1. [`clamp_to_disk`] projects out-of-disk pointer positions onto the
//!    boundary circle (the visual knob never leaves the disk).
//! 2. [`compute_drive`] applies the dead zone, normalizes against the
//!    drag radius (screen-down is forward, so the vertical axis is
//!    inverted), shapes each axis with a cubic expo blend, and mixes the
//!    result into left/right track powers.
//!
//! Side effects (haptics, knob animation) stay with the caller; the
//! mapper only reports the level signals they key off, such as
//! [`KnobPosition::at_boundary`].

use crate::core::{DEFAULT_DEAD_ZONE_RADIUS, DEFAULT_EXPO_FACTOR};

/// A point on the drag surface, in surface units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Horizontal coordinate (right is positive).
    pub x: f32,
    /// Vertical coordinate (down is positive, screen convention).
    pub y: f32,
}

impl Point {
    /// Create a point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Geometry and shaping parameters for one drag surface.
#[derive(Debug, Clone, Copy)]
pub struct JoystickConfig {
    /// Center of the drag surface.
    pub center: Point,
    /// Maximum knob displacement from center, in surface units.
    pub max_radius: f32,
    /// Offsets below this magnitude produce exactly (0, 0).
    pub dead_zone_radius: f32,
    /// Expo blend factor in [0, 1]: 0 = linear, 1 = pure cubic.
    pub expo_factor: f32,
}

impl JoystickConfig {
    /// Config for a surface with the given center and drag radius,
    /// using the default dead zone and expo factor.
    pub fn new(center: Point, max_radius: f32) -> Self {
        Self {
            center,
            max_radius,
            dead_zone_radius: DEFAULT_DEAD_ZONE_RADIUS,
            expo_factor: DEFAULT_EXPO_FACTOR,
        }
    }

    /// Set the dead-zone radius.
    pub fn dead_zone_radius(mut self, radius: f32) -> Self {
        self.dead_zone_radius = radius;
        self
    }

    /// Set the expo blend factor (clamped to [0, 1]).
    pub fn expo_factor(mut self, factor: f32) -> Self {
        self.expo_factor = factor.clamp(0.0, 1.0);
        self
    }
}

/// A knob position constrained to the drag disk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnobPosition {
    /// The (possibly projected) knob position.
    pub point: Point,
    /// Whether the raw pointer was at or beyond the boundary circle.
    /// Callers turn edge transitions of this level signal into haptic
    /// feedback.
    pub at_boundary: bool,
}

/// A bounded differential-drive output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrivePair {
    /// Left track power in [-1, 1].
    pub left: f32,
    /// Right track power in [-1, 1].
    pub right: f32,
}

impl DrivePair {
    /// Both tracks stopped.
    pub const STOP: Self = Self {
        left: 0.0,
        right: 0.0,
    };
}

/// Constrain a raw pointer position to the drag disk.
///
/// Positions beyond `max_radius` from `center` are projected onto the
/// boundary circle along the same direction; positions inside pass
/// through unchanged.
pub fn clamp_to_disk(raw: Point, center: Point, max_radius: f32) -> KnobPosition {
    let dx = raw.x - center.x;
    let dy = raw.y - center.y;
    let distance = (dx * dx + dy * dy).sqrt();

    if distance > max_radius && distance > 0.0 {
        let scale = max_radius / distance;
        KnobPosition {
            point: Point::new(center.x + dx * scale, center.y + dy * scale),
            at_boundary: true,
        }
    } else {
        KnobPosition {
            point: raw,
            at_boundary: distance >= max_radius && max_radius > 0.0,
        }
    }
}

/// Cubic expo blend: `(1 - factor) * n + factor * n^3`.
///
/// Odd-symmetric by construction, so `expo_shape(-n, f) ==
/// -expo_shape(n, f)`; keeps fine authority near center while reaching
/// full deflection at the edge.
pub fn expo_shape(n: f32, factor: f32) -> f32 {
    (1.0 - factor) * n + factor * n * n * n
}

/// Map a knob position to a differential-drive pair.
///
/// Offsets within the dead zone yield exactly [`DrivePair::STOP`]; this
/// both stops the device and suppresses unintentional drift. Outputs
/// are always clamped to [-1, 1] regardless of input.
pub fn compute_drive(knob: Point, config: &JoystickConfig) -> DrivePair {
    let dx = knob.x - config.center.x;
    let dy = knob.y - config.center.y;

    let distance = (dx * dx + dy * dy).sqrt();
    if distance < config.dead_zone_radius || config.max_radius <= 0.0 {
        return DrivePair::STOP;
    }

    // Screen-down is forward: invert the vertical axis.
    let nx = (dx / config.max_radius).clamp(-1.0, 1.0);
    let ny = (-dy / config.max_radius).clamp(-1.0, 1.0);

    let sx = expo_shape(nx, config.expo_factor);
    let sy = expo_shape(ny, config.expo_factor);

    DrivePair {
        left: (sy + sx).clamp(-1.0, 1.0),
        right: (sy - sx).clamp(-1.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn config() -> JoystickConfig {
        JoystickConfig::new(Point::new(160.0, 160.0), 140.0)
    }

    #[test]
    fn test_dead_zone_is_exactly_zero() {
        let cfg = config();
        for (dx, dy) in [(0.0, 0.0), (5.0, 5.0), (-19.0, 0.0), (0.0, 19.9), (14.0, -14.0)] {
            let knob = Point::new(cfg.center.x + dx, cfg.center.y + dy);
            assert_eq!(compute_drive(knob, &cfg), DrivePair::STOP, "offset ({dx}, {dy})");
        }
    }

    #[test]
    fn test_clamp_inside_passes_through() {
        let cfg = config();
        let raw = Point::new(200.0, 120.0);
        let knob = clamp_to_disk(raw, cfg.center, cfg.max_radius);
        assert_eq!(knob.point, raw);
        assert!(!knob.at_boundary);
    }

    #[test]
    fn test_clamp_projects_onto_boundary() {
        let cfg = config();
        for raw in [
            Point::new(500.0, 160.0),
            Point::new(160.0, -300.0),
            Point::new(400.0, 400.0),
            Point::new(-50.0, 170.0),
        ] {
            let knob = clamp_to_disk(raw, cfg.center, cfg.max_radius);
            assert!(knob.at_boundary);
            let dist = knob.point.distance(cfg.center);
            assert!((dist - cfg.max_radius).abs() < EPS, "raw {raw:?} -> dist {dist}");

            // Same direction as the raw offset.
            let raw_dx = raw.x - cfg.center.x;
            let knob_dx = knob.point.x - cfg.center.x;
            assert!(raw_dx.signum() == knob_dx.signum() || raw_dx.abs() < EPS);
        }
    }

    #[test]
    fn test_clamped_point_drives_like_boundary_point() {
        let cfg = config();
        let far = Point::new(160.0 + 900.0, 160.0 - 900.0);
        let knob = clamp_to_disk(far, cfg.center, cfg.max_radius);
        let from_clamped = compute_drive(knob.point, &cfg);
        // Reference: the boundary point in the same direction.
        let r = cfg.max_radius / 2.0_f32.sqrt();
        let boundary = Point::new(cfg.center.x + r, cfg.center.y - r);
        let reference = compute_drive(boundary, &cfg);
        assert!((from_clamped.left - reference.left).abs() < EPS);
        assert!((from_clamped.right - reference.right).abs() < EPS);
    }

    #[test]
    fn test_output_always_in_range() {
        let cfg = config();
        for i in -8..=8 {
            for j in -8..=8 {
                let raw = Point::new(i as f32 * 100.0, j as f32 * 100.0);
                let knob = clamp_to_disk(raw, cfg.center, cfg.max_radius);
                let drive = compute_drive(knob.point, &cfg);
                assert!((-1.0..=1.0).contains(&drive.left), "{raw:?} -> {drive:?}");
                assert!((-1.0..=1.0).contains(&drive.right), "{raw:?} -> {drive:?}");
            }
        }
    }

    #[test]
    fn test_expo_shape_odd_symmetry() {
        for i in 0..=100 {
            let n = i as f32 / 100.0;
            for factor in [0.0, 0.4, 1.0] {
                assert_eq!(expo_shape(-n, factor), -expo_shape(n, factor));
            }
        }
        // Endpoints are fixed for every factor.
        assert!((expo_shape(1.0, 0.7) - 1.0).abs() < EPS);
        assert_eq!(expo_shape(0.0, 0.7), 0.0);
    }

    #[test]
    fn test_expo_factor_extremes() {
        // factor 0 is linear, factor 1 is pure cubic.
        assert!((expo_shape(0.5, 0.0) - 0.5).abs() < EPS);
        assert!((expo_shape(0.5, 1.0) - 0.125).abs() < EPS);
    }

    #[test]
    fn test_full_deflection_at_45_degrees() {
        // Pointer at exactly max_radius, 45 degrees up-right, expo 0.4.
        // Per axis: n = 1/sqrt(2), shaped = 0.6*n + 0.4*n^3 = 0.5656854.
        // left = clamp(sy + sx) = 1.0, right = sy - sx = 0.0.
        let cfg = config();
        let r = cfg.max_radius / 2.0_f32.sqrt();
        let knob = Point::new(cfg.center.x + r, cfg.center.y - r);
        let drive = compute_drive(knob, &cfg);
        assert!((drive.left - 1.0).abs() < EPS, "left = {}", drive.left);
        assert!(drive.right.abs() < EPS, "right = {}", drive.right);
    }

    #[test]
    fn test_half_forward_reference_pair() {
        // Straight up at half deflection: ny = 0.5, nx = 0.
        // shaped = 0.6*0.5 + 0.4*0.125 = 0.35 on both tracks.
        let cfg = config();
        let knob = Point::new(cfg.center.x, cfg.center.y - cfg.max_radius / 2.0);
        let drive = compute_drive(knob, &cfg);
        assert!((drive.left - 0.35).abs() < EPS);
        assert!((drive.right - 0.35).abs() < EPS);
    }

    #[test]
    fn test_reverse_inverts_sign() {
        let cfg = config();
        let fwd = compute_drive(Point::new(160.0, 60.0), &cfg);
        let rev = compute_drive(Point::new(160.0, 260.0), &cfg);
        assert!((fwd.left + rev.left).abs() < EPS);
        assert!((fwd.right + rev.right).abs() < EPS);
        assert!(fwd.left > 0.0);
        assert!(rev.left < 0.0);
    }

    #[test]
    fn test_pure_turn_is_symmetric() {
        let cfg = config();
        let right_turn = compute_drive(Point::new(260.0, 160.0), &cfg);
        assert!(right_turn.left > 0.0);
        assert!(right_turn.right < 0.0);
        assert!((right_turn.left + right_turn.right).abs() < EPS);
    }
}
