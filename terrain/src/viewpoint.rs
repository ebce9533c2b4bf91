use crate::ElevationMap;
use dem::C;
use geo::geometry::Coord;

/// Where a panorama is seen from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewpoint {
    coord: Coord<C>,
    eye_elevation: C,
}

impl Viewpoint {
    /// Returns a viewpoint `eye_height` meters above the ground at
    /// `coord`. Ground outside of `map` is taken as sea level.
    pub fn new(coord: Coord<C>, eye_height: C, map: &ElevationMap) -> Self {
        Self {
            coord,
            eye_elevation: map.elevation(coord, 0.0) + eye_height,
        }
    }

    /// Returns a viewpoint with an absolute eye elevation.
    pub fn with_eye_elevation(coord: Coord<C>, eye_elevation: C) -> Self {
        Self {
            coord,
            eye_elevation,
        }
    }

    pub fn coord(&self) -> Coord<C> {
        self.coord
    }

    /// Eye elevation above sea level, in meters.
    pub fn eye_elevation(&self) -> C {
        self.eye_elevation
    }
}
