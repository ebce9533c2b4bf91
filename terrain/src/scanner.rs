use crate::{
    constants::{
        MAX_DISTANCE, MEAN_EARTH_RADIUS, MIN_HEIGHT_ANGLE, MIN_STEP, STEP_GROWTH,
        TOTAL_HEIGHT_ANGLE,
    },
    math::{apparent_angle, earth_drop, incline, AdaptiveSteps, Step},
    ElevationMap, TerrainError, Viewpoint,
};
use dem::C;
use geo::geometry::Coord;

/// The visible terrain for one vertical viewing angle bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Geopixel {
    /// Distance from the viewpoint to the visible terrain (meters).
    pub distance: C,

    /// Terrain slope over the last step to that point (degrees),
    /// positive when rising away from the viewpoint. Measured on
    /// curvature-corrected elevations, so level ground slopes away
    /// slightly.
    pub incline: C,
}

/// Finds the skyline along compass bearings from a fixed viewpoint.
///
/// A scanner borrows its map immutably and keeps no state between
/// traces, so one scanner may trace many bearings concurrently.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    map: &'a ElevationMap,
    viewpoint: Viewpoint,
    buckets: usize,
    max_distance: C,
    min_step: C,
    step_growth: C,
    earth_radius: C,
    min_angle: C,
    total_angle: C,
}

impl<'a> Scanner<'a> {
    pub fn builder() -> ScannerBuilder {
        ScannerBuilder {
            viewpoint: None,
            buckets: None,
            max_distance: MAX_DISTANCE,
            min_step: MIN_STEP,
            step_growth: STEP_GROWTH,
            earth_radius: MEAN_EARTH_RADIUS,
            min_angle: MIN_HEIGHT_ANGLE,
            total_angle: TOTAL_HEIGHT_ANGLE,
        }
    }

    pub fn viewpoint(&self) -> Viewpoint {
        self.viewpoint
    }

    /// Returns the maximum number of entries in a profile.
    pub fn buckets(&self) -> usize {
        self.buckets
    }

    pub fn max_distance(&self) -> C {
        self.max_distance
    }

    /// Returns the skyline profile looking along `bearing`.
    pub fn trace(&self, bearing: C) -> Vec<Geopixel> {
        let mut profile = Vec::with_capacity(self.buckets);
        self.trace_into(bearing, &mut profile);
        profile
    }

    /// Traces `bearing` into `profile`, replacing its contents, and
    /// returns the filled entries.
    ///
    /// Entry `i` holds the nearest terrain seen at or above
    /// [`bucket_angle(i)`](Self::bucket_angle). The profile ends early
    /// where the ray leaves the map or reaches the maximum distance
    /// before terrain rises into the top bucket; missing entries are
    /// sky.
    pub fn trace_into<'b>(&self, bearing: C, profile: &'b mut Vec<Geopixel>) -> &'b [Geopixel] {
        profile.clear();

        let eye_elevation = self.viewpoint.eye_elevation();
        // Apparent elevation of the last sample; nothing drops at the
        // viewpoint.
        let mut prev_apparent = self.map.get(self.viewpoint.coord());
        let mut max_angle = C::NEG_INFINITY;

        for Step { distance, length } in self.steps() {
            let Some(elevation) = self.map.get(self.locate(bearing, distance)) else {
                break;
            };
            let apparent = elevation - earth_drop(distance, self.earth_radius);
            let rise = prev_apparent.map_or(0.0, |prev| apparent - prev);
            prev_apparent = Some(apparent);

            let angle = apparent_angle(eye_elevation, distance, elevation, self.earth_radius);
            if angle <= max_angle {
                // Hidden behind nearer terrain.
                continue;
            }
            max_angle = angle;

            if let Some(bucket) = self.bucket_of(angle) {
                let filled = (bucket + 1).min(self.buckets).max(profile.len());
                let geopixel = Geopixel {
                    distance,
                    incline: incline(rise, length),
                };
                profile.resize(filled, geopixel);
            }

            if profile.len() == self.buckets {
                break;
            }
        }

        profile
    }

    /// Returns the lowest viewing angle (radians) of `bucket`.
    #[allow(clippy::cast_precision_loss)]
    pub fn bucket_angle(&self, bucket: usize) -> C {
        self.min_angle + self.total_angle * bucket as C / self.buckets as C
    }

    /// Returns the coordinate `distance` meters from the viewpoint
    /// along `bearing`.
    pub fn locate(&self, bearing: C, distance: C) -> Coord<C> {
        let origin = self.viewpoint.coord();
        let dir = direction(bearing);
        Coord {
            x: origin.x + dir.x * distance,
            y: origin.y + dir.y * distance,
        }
    }

    /// Returns the bucket `angle` falls in, or `None` if it is below
    /// the field of view. Angles above it give indices past the last
    /// bucket.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn bucket_of(&self, angle: C) -> Option<usize> {
        let position = (angle - self.min_angle) / self.total_angle * self.buckets as C;
        (position >= 0.0).then(|| position.floor() as usize)
    }

    fn steps(&self) -> AdaptiveSteps<C> {
        AdaptiveSteps::new(self.min_step, self.step_growth, self.max_distance)
    }
}

/// Returns the unit (easting, northing) vector of a compass bearing.
///
/// Bearings are radians clockwise from north.
pub fn direction(bearing: C) -> Coord<C> {
    let (sin, cos) = bearing.sin_cos();
    Coord { x: sin, y: cos }
}

#[derive(Debug, Clone)]
pub struct ScannerBuilder {
    /// Where to look from (required).
    viewpoint: Option<Viewpoint>,

    /// Number of vertical angle buckets per profile (required).
    buckets: Option<usize>,

    /// Furthest distance to sample terrain (meters).
    max_distance: C,

    /// Step length near the viewpoint (meters).
    min_step: C,

    /// Step length as a fraction of distance travelled.
    step_growth: C,

    /// Radius used for curvature correction (meters).
    earth_radius: C,

    /// Lowest viewing angle of the field of view (radians).
    min_angle: C,

    /// Height of the field of view (radians).
    total_angle: C,
}

impl ScannerBuilder {
    /// Where to look from (required).
    pub fn viewpoint(mut self, viewpoint: Viewpoint) -> Self {
        self.viewpoint = Some(viewpoint);
        self
    }

    /// Number of vertical angle buckets per profile (required).
    pub fn buckets(mut self, buckets: usize) -> Self {
        self.buckets = Some(buckets);
        self
    }

    /// Furthest distance to sample terrain (meters, defaults to
    /// 150 km).
    pub fn max_distance(mut self, meters: C) -> Self {
        self.max_distance = meters;
        self
    }

    /// Step length near the viewpoint (meters, defaults to 10).
    pub fn min_step(mut self, meters: C) -> Self {
        self.min_step = meters;
        self
    }

    /// Step length as a fraction of distance travelled (defaults to
    /// 0.002).
    pub fn step_growth(mut self, growth: C) -> Self {
        self.step_growth = growth;
        self
    }

    /// Radius used for curvature correction (meters, defaults to the
    /// mean earth radius). Pass a larger effective radius to account
    /// for atmospheric refraction, or infinity for a flat earth.
    pub fn earth_radius(mut self, meters: C) -> Self {
        self.earth_radius = meters;
        self
    }

    /// Vertical field of view starting at `min_angle` and spanning
    /// `total_angle` (radians, defaults to -0.08 and 0.16).
    pub fn fov(mut self, min_angle: C, total_angle: C) -> Self {
        self.min_angle = min_angle;
        self.total_angle = total_angle;
        self
    }

    pub fn build<'a>(&self, map: &'a ElevationMap) -> Result<Scanner<'a>, TerrainError> {
        fn positive(value: C, name: &'static str) -> Result<C, TerrainError> {
            if value > 0.0 && !value.is_nan() {
                Ok(value)
            } else {
                Err(TerrainError::Builder(name))
            }
        }

        let viewpoint = self.viewpoint.ok_or(TerrainError::Builder("viewpoint"))?;
        let buckets = self
            .buckets
            .filter(|&buckets| buckets > 0)
            .ok_or(TerrainError::Builder("buckets"))?;
        if !(viewpoint.coord().x.is_finite()
            && viewpoint.coord().y.is_finite()
            && viewpoint.eye_elevation().is_finite())
        {
            return Err(TerrainError::Builder("viewpoint"));
        }
        if !(self.step_growth >= 0.0 && self.step_growth.is_finite()) {
            return Err(TerrainError::Builder("step_growth"));
        }
        if !self.min_angle.is_finite() || !self.total_angle.is_finite() {
            return Err(TerrainError::Builder("fov"));
        }

        Ok(Scanner {
            map,
            viewpoint,
            buckets,
            max_distance: positive(self.max_distance, "max_distance")?,
            min_step: positive(self.min_step, "min_step")?,
            step_growth: self.step_growth,
            earth_radius: positive(self.earth_radius, "earth_radius")?,
            min_angle: self.min_angle,
            total_angle: positive(self.total_angle, "fov")?,
        })
    }
}

impl Default for ScannerBuilder {
    fn default() -> Self {
        Scanner::builder()
    }
}

#[cfg(test)]
mod tests {
    use super::{direction, Geopixel, Scanner};
    use crate::{math::apparent_angle, ElevationMap, TerrainError, Viewpoint};
    use approx::assert_relative_eq;
    use dem::Grid;
    use geo::geometry::Coord;
    use std::f64::consts::{FRAC_PI_2, PI};

    const EAST: f64 = FRAC_PI_2;

    /// Returns a square map `cells` samples wide, `spacing` meters
    /// apart, with its SW sample at the origin.
    fn map_from_fn(spacing: f64, cells: usize, f: impl Fn(f64, f64) -> f32) -> ElevationMap {
        let mut samples = Vec::with_capacity(cells * cells);
        for row in 0..cells {
            for col in 0..cells {
                samples.push(f(col as f64 * spacing, row as f64 * spacing));
            }
        }
        let grid = Grid::new(Coord { x: 0., y: 0. }, spacing, (cells, cells), samples).unwrap();
        ElevationMap::from_grids(vec![grid])
    }

    /// Flat ground at sea level, 20 km square, with a 200 m high,
    /// 100 m wide ridge running north-south at easting 6000 and a
    /// 400 m wall at easting 16000.
    fn ridge_and_peak(with_ridge: bool) -> ElevationMap {
        map_from_fn(50.0, 401, |x, _| {
            if with_ridge && (6000.0..=6100.0).contains(&x) {
                200.0
            } else if x == 16000.0 {
                400.0
            } else {
                0.0
            }
        })
    }

    /// 5 km west of the ridge.
    fn ridge_viewpoint(map: &ElevationMap) -> Viewpoint {
        Viewpoint::new(Coord { x: 1000., y: 10000. }, 20., map)
    }

    fn scanner(map: &ElevationMap, viewpoint: Viewpoint, buckets: usize) -> Scanner<'_> {
        Scanner::builder()
            .viewpoint(viewpoint)
            .buckets(buckets)
            .build(map)
            .unwrap()
    }

    #[test]
    fn test_direction() {
        let north = direction(0.0);
        assert_relative_eq!(north.x, 0.0);
        assert_relative_eq!(north.y, 1.0);
        let east = direction(EAST);
        assert_relative_eq!(east.x, 1.0);
        assert_relative_eq!(east.y, 0.0, epsilon = 1e-15);
        let south = direction(PI);
        assert_relative_eq!(south.y, -1.0);
    }

    #[test]
    fn test_flat_terrain_fills_up_to_horizon() {
        // Flat ground at 1000 m, 40 km square, eye at 1020 m in the
        // middle. Curvature makes the ground's apparent angle peak at
        // sqrt(2 * 20 m * R) ~ 16 km and -0.0025 rad, inside bucket 77
        // of 160.
        let map = map_from_fn(100.0, 401, |_, _| 1000.0);
        let viewpoint = Viewpoint::new(Coord { x: 20000., y: 20000. }, 20., &map);
        assert_eq!(viewpoint.eye_elevation(), 1020.0);
        let scanner = scanner(&map, viewpoint, 160);

        for bearing in [0.0, 1.0, 2.5, 4.0] {
            let profile = scanner.trace(bearing);
            assert_eq!(profile.len(), 78, "bearing {bearing}");
            // Ground 250 m away is the first to reach the bottom of
            // the field of view.
            assert!((240.0..=260.0).contains(&profile[0].distance));
            // On flat ground each higher bucket is further away.
            assert!(profile.windows(2).all(|w| w[0].distance <= w[1].distance));
            // Bucket 77 starts at -0.003 rad, first reached ~8.6 km
            // out.
            let last = profile.last().unwrap();
            assert!((8500.0..=8800.0).contains(&last.distance), "{last:?}");
            // Curvature makes level ground fall away, by under 0.1
            // degrees this close.
            assert!(profile
                .iter()
                .all(|g| (-0.1..=0.0).contains(&g.incline)), "{profile:?}");
        }
    }

    #[test]
    fn test_ridge_fills_top_buckets() {
        let map = ridge_and_peak(true);
        let scanner = scanner(&map, ridge_viewpoint(&map), 160);
        let profile = scanner.trace(EAST);

        // The ridge top 5 km out is at 0.0356 rad, bucket 115.
        assert_eq!(profile.len(), 116);
        let last = profile.last().unwrap();
        assert_relative_eq!(last.distance, 5000.0, epsilon = 1e-6);
        // The face rises 200 m over 50 m, less the extra curvature drop
        // over the last 10 m step.
        let rise = 40.0 - (5000.0_f64.powi(2) - 4990.0_f64.powi(2)) / (2.0 * 6_371_000.0);
        assert_relative_eq!(last.incline, (rise / 10.0).atan().to_degrees(), epsilon = 1e-6);

        // Buckets up to the foot of the ridge see the plain, the rest
        // the ridge face.
        assert!(profile[..76].iter().all(|g| g.distance < 4960.0));
        assert!(profile[76..]
            .iter()
            .all(|g| (4950.0..=5000.0 + 1e-6).contains(&g.distance)));
    }

    #[test]
    fn test_near_ridge_hides_far_peak() {
        let hidden = ridge_and_peak(true);
        let profile = scanner(&hidden, ridge_viewpoint(&hidden), 160).trace(EAST);
        assert!(profile.iter().all(|g| g.distance <= 5000.0 + 1e-6));

        // Without the ridge the peak 15 km out is visible.
        let visible = ridge_and_peak(false);
        let profile = scanner(&visible, ridge_viewpoint(&visible), 160).trace(EAST);
        assert!(profile
            .iter()
            .any(|g| (14_940.0..=15_060.0).contains(&g.distance)));
    }

    #[test]
    fn test_profile_is_the_skyline() {
        let map = ridge_and_peak(true);
        let scanner = scanner(&map, ridge_viewpoint(&map), 160);
        let eye_elevation = scanner.viewpoint().eye_elevation();

        for bearing in [EAST - 0.3, EAST, EAST + 0.2] {
            let profile = scanner.trace(bearing);
            let angles = profile
                .iter()
                .map(|g| {
                    let elevation = map.get(scanner.locate(bearing, g.distance)).unwrap();
                    apparent_angle(eye_elevation, g.distance, elevation, 6_371_000.0)
                })
                .collect::<Vec<_>>();
            for (bucket, angle) in angles.iter().enumerate() {
                assert!(
                    *angle >= scanner.bucket_angle(bucket) - 1e-12,
                    "bucket {bucket}"
                );
            }
            assert!(angles.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_trace_is_deterministic() {
        let map = ridge_and_peak(true);
        let scanner = scanner(&map, ridge_viewpoint(&map), 160);
        for bearing in [0.5, EAST, 2.0] {
            let a = scanner.trace(bearing);
            let b = scanner.trace(bearing);
            assert_eq!(a.len(), b.len());
            assert!(a
                .iter()
                .zip(&b)
                .all(|(a, b)| a.distance.to_bits() == b.distance.to_bits()
                    && a.incline.to_bits() == b.incline.to_bits()));
        }
    }

    #[test]
    fn test_trace_into_reuses_buffer() {
        let map = ridge_and_peak(true);
        let scanner = scanner(&map, ridge_viewpoint(&map), 160);
        let mut buffer = vec![
            Geopixel {
                distance: -1.0,
                incline: -1.0
            };
            500
        ];
        let expected = scanner.trace(EAST);
        assert_eq!(scanner.trace_into(EAST, &mut buffer), expected.as_slice());
        assert_eq!(buffer, expected);
    }

    #[test]
    fn test_output_is_bounded() {
        // A 1000 m cliff 500 m away rises above the field of view.
        let map = map_from_fn(50.0, 101, |x, _| if x >= 1500.0 { 1000.0 } else { 0.0 });
        let viewpoint = Viewpoint::new(Coord { x: 1000., y: 2500. }, 20., &map);
        let scanner = scanner(&map, viewpoint, 10);
        let profile = scanner.trace(EAST);
        assert_eq!(profile.len(), 10);
        assert!(profile.iter().all(|g| (0.0..=500.0).contains(&g.distance)));
        assert!(profile.iter().all(|g| g.distance > 0.0));
    }

    #[test]
    fn test_max_distance_truncates() {
        let map = map_from_fn(100.0, 401, |_, _| 1000.0);
        let viewpoint = Viewpoint::new(Coord { x: 20000., y: 20000. }, 20., &map);
        let scanner = Scanner::builder()
            .viewpoint(viewpoint)
            .buckets(160)
            .max_distance(1000.0)
            .build(&map)
            .unwrap();
        let profile = scanner.trace(1.0);
        assert!(!profile.is_empty());
        assert!(profile.len() < 160);
        assert!(profile.iter().all(|g| g.distance <= 1000.0));
    }

    #[test]
    fn test_leaving_the_map_truncates() {
        let map = map_from_fn(100.0, 401, |_, _| 1000.0);
        // Off the map, looking away from it.
        let viewpoint = Viewpoint::with_eye_elevation(Coord { x: -10., y: 20000. }, 0.0);
        assert!(scanner(&map, viewpoint, 160).trace(-EAST).is_empty());

        let empty = ElevationMap::default();
        let viewpoint = Viewpoint::new(Coord { x: 0., y: 0. }, 20., &empty);
        assert!(scanner(&empty, viewpoint, 160).trace(0.0).is_empty());
    }

    #[test]
    fn test_flat_earth() {
        // Without curvature, level ground never reaches the horizon.
        let map = map_from_fn(100.0, 401, |_, _| 1000.0);
        let viewpoint = Viewpoint::new(Coord { x: 20000., y: 20000. }, 20., &map);
        let scanner = Scanner::builder()
            .viewpoint(viewpoint)
            .buckets(160)
            .earth_radius(f64::INFINITY)
            .build(&map)
            .unwrap();
        let profile = scanner.trace(0.0);
        // Bucket 78 starts at -0.002 rad, 20 m below the eye 10 km out.
        // The map edge 20 km out stays just short of bucket 79.
        assert_eq!(profile.len(), 79);
        let last = profile.last().unwrap();
        assert!((10_000.0..=10_030.0).contains(&last.distance), "{last:?}");
    }

    #[test]
    fn test_builder_validation() {
        let map = ElevationMap::default();
        let viewpoint = Viewpoint::with_eye_elevation(Coord { x: 0., y: 0. }, 0.0);
        let err = |builder: super::ScannerBuilder| match builder.build(&map) {
            Err(TerrainError::Builder(name)) => name,
            other => panic!("expected builder error, got {other:?}"),
        };

        assert_eq!(err(Scanner::builder().buckets(10)), "viewpoint");
        assert_eq!(err(Scanner::builder().viewpoint(viewpoint)), "buckets");
        assert_eq!(
            err(Scanner::builder().viewpoint(viewpoint).buckets(0)),
            "buckets"
        );
        assert_eq!(
            err(Scanner::builder()
                .viewpoint(viewpoint)
                .buckets(10)
                .max_distance(-1.0)),
            "max_distance"
        );
        assert_eq!(
            err(Scanner::builder()
                .viewpoint(viewpoint)
                .buckets(10)
                .fov(-0.1, 0.0)),
            "fov"
        );
        assert_eq!(
            err(Scanner::builder()
                .viewpoint(viewpoint)
                .buckets(10)
                .step_growth(f64::NAN)),
            "step_growth"
        );
        assert!(Scanner::builder()
            .viewpoint(viewpoint)
            .buckets(10)
            .build(&map)
            .is_ok());
    }
}
