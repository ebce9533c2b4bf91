use num_traits::Float;

/// Returns how far terrain `distance_m` away has dropped below the
/// eye's tangent plane due to earth curvature.
pub fn earth_drop<T: Float>(distance_m: T, earth_radius: T) -> T {
    distance_m.powi(2) / ((T::one() + T::one()) * earth_radius)
}

/// Returns the up/down angle (in radians) from an eye at
/// `eye_elev_m` to terrain `distance_m` away at `terrain_elev_m`.
pub fn apparent_angle<T: Float>(
    eye_elev_m: T,
    distance_m: T,
    terrain_elev_m: T,
    earth_radius: T,
) -> T {
    let apparent_elev_m = terrain_elev_m - earth_drop(distance_m, earth_radius);
    (apparent_elev_m - eye_elev_m).atan2(distance_m)
}

/// Returns the slope (in degrees) of terrain rising `rise_m` over
/// `run_m`.
pub fn incline<T: Float>(rise_m: T, run_m: T) -> T {
    rise_m.atan2(run_m).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::{apparent_angle, earth_drop, incline};
    use crate::constants::MEAN_EARTH_RADIUS;
    use approx::assert_relative_eq;

    #[test]
    fn test_earth_drop() {
        assert_eq!(earth_drop(0.0, MEAN_EARTH_RADIUS), 0.0);
        assert_relative_eq!(
            earth_drop(10_000.0, MEAN_EARTH_RADIUS),
            7.848_061_528_802_386,
            epsilon = 1e-12
        );
        // Quadratic in distance.
        assert_relative_eq!(
            earth_drop(20_000.0, MEAN_EARTH_RADIUS),
            4.0 * earth_drop(10_000.0, MEAN_EARTH_RADIUS)
        );
    }

    #[test]
    fn test_apparent_angle() {
        // Level terrain at eye height on a flat earth.
        assert_eq!(apparent_angle(100.0, 1_000.0, 100.0, f64::INFINITY), 0.0);
        // 45 degrees up.
        assert_relative_eq!(
            apparent_angle(0.0, 1_000.0, 1_000.0, f64::INFINITY),
            std::f64::consts::FRAC_PI_4
        );
        // Curvature pushes distant terrain below the horizontal.
        let angle = apparent_angle(0.0, 50_000.0, 0.0, MEAN_EARTH_RADIUS);
        assert!(angle < 0.0);
        let drop_m = 196.201_538_220_059_63;
        assert_relative_eq!(angle, (-drop_m / 50_000.0_f64).atan(), epsilon = 1e-12);
    }

    #[test]
    fn test_apparent_angle_f32() {
        let angle: f32 = apparent_angle(20.0, 5_000.0, 200.0, 6_371_000.0);
        assert_relative_eq!(angle, 0.035_592, epsilon = 1e-5);
    }

    #[test]
    fn test_incline() {
        assert_eq!(incline(0.0, 10.0), 0.0);
        assert_relative_eq!(incline(10.0, 10.0), 45.0, epsilon = 1e-12);
        assert_relative_eq!(incline(-10.0, 10.0), -45.0, epsilon = 1e-12);
    }
}
