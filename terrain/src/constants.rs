//! Tunable defaults for horizon scanning.

/// Mean earth radius in meters.
pub const MEAN_EARTH_RADIUS: f64 = 6_371_000.0;

/// Lowest viewing angle (radians) covered by a profile.
pub const MIN_HEIGHT_ANGLE: f64 = -0.08;

/// Vertical field of view (radians) covered by a profile.
pub const TOTAL_HEIGHT_ANGLE: f64 = 0.16;

/// Eye height above ground (meters).
pub const EYE_HEIGHT: f64 = 20.0;

/// Furthest distance (meters) a trace samples terrain.
pub const MAX_DISTANCE: f64 = 150_000.0;

/// Step length (meters) near the viewpoint.
pub const MIN_STEP: f64 = 10.0;

/// Step length as a fraction of the distance already travelled.
///
/// With [`MIN_STEP`] this gives 10 m steps out to 5 km, growing to
/// 300 m at 150 km.
pub const STEP_GROWTH: f64 = 0.002;
