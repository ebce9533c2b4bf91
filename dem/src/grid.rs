use crate::{asc, usgs, DemError, ParseError, C};
use geo::geometry::Coord;
use log::debug;
use memmap2::Mmap;
use std::{fs::File, path::Path};

/// One rectangular tile of elevation samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    /// Southwest corner of the grid.
    ///
    /// Specifically, the _center_ of the SW most sample of the grid.
    sw_corner_center: Coord<C>,

    /// Distance between neighboring samples, in the same unit as the
    /// coordinates (meters for UTM).
    spacing: C,

    /// Number of (columns, rows) in this grid.
    dimensions: (usize, usize),

    /// Lowest and highest non-void sample, if any.
    elevation_range: Option<(f32, f32)>,

    /// Elevation samples in meters, row-major, starting with the
    /// southern-most row. Voids are NaN.
    samples: Box<[f32]>,
}

impl Grid {
    /// Returns a new grid from row-major samples, southern-most row
    /// first.
    pub fn new(
        sw_corner_center: Coord<C>,
        spacing: C,
        (cols, rows): (usize, usize),
        samples: Vec<f32>,
    ) -> Result<Self, ParseError> {
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(ParseError::Geometry("spacing must be positive"));
        }
        if cols < 2 || rows < 2 {
            return Err(ParseError::Geometry("need at least 2x2 samples"));
        }
        if !(sw_corner_center.x.is_finite() && sw_corner_center.y.is_finite()) {
            return Err(ParseError::Geometry("origin must be finite"));
        }
        let expected = cols
            .checked_mul(rows)
            .ok_or(ParseError::Geometry("grid too large"))?;
        if samples.len() != expected {
            return Err(ParseError::SampleCount {
                expected,
                found: samples.len(),
            });
        }

        let elevation_range = samples
            .iter()
            .filter(|s| !s.is_nan())
            .fold(None, |range, &s| match range {
                None => Some((s, s)),
                Some((lo, hi)) => Some((f32::min(lo, s), f32::max(hi, s))),
            });

        Ok(Self {
            sw_corner_center,
            spacing,
            dimensions: (cols, rows),
            elevation_range,
            samples: samples.into_boxed_slice(),
        })
    }

    /// Returns a grid parsed from the file at `path`.
    ///
    /// The format is chosen from the file extension (`dem` or `asc`,
    /// case-insensitive).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DemError> {
        let path = path.as_ref();
        let parse: fn(&[u8]) -> Result<Self, ParseError> = match path
            .extension()
            .and_then(std::ffi::OsStr::to_str)
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("dem") => usgs::parse,
            Some("asc") => asc::parse,
            _ => return Err(DemError::Extension(path.to_owned())),
        };

        let file = File::open(path)?;
        // Safety: the mapping is dropped before returning and parsing
        // copies every sample out of it.
        let raw = unsafe { Mmap::map(&file)? };
        let grid = parse(&raw).map_err(|source| DemError::Parse {
            path: path.to_owned(),
            source,
        })?;

        debug!(
            "loaded {path:?}; dimensions: {:?}, sw: {:?}, spacing: {}",
            grid.dimensions, grid.sw_corner_center, grid.spacing
        );
        Ok(grid)
    }

    /// Returns the center of the SW most sample.
    pub fn sw_corner_center(&self) -> Coord<C> {
        self.sw_corner_center
    }

    /// Returns the center of the NE most sample.
    #[allow(clippy::cast_precision_loss)]
    pub fn ne_corner_center(&self) -> Coord<C> {
        let (cols, rows) = self.dimensions;
        Coord {
            x: self.sw_corner_center.x + (cols - 1) as C * self.spacing,
            y: self.sw_corner_center.y + (rows - 1) as C * self.spacing,
        }
    }

    /// Returns the distance between neighboring samples.
    pub fn spacing(&self) -> C {
        self.spacing
    }

    /// Returns the number of (columns, rows) in this grid.
    pub fn dimensions(&self) -> (usize, usize) {
        self.dimensions
    }

    /// Returns the number of samples in this grid.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns the lowest non-void sample in this grid.
    pub fn min_elevation(&self) -> Option<f32> {
        self.elevation_range.map(|(lo, _)| lo)
    }

    /// Returns the highest non-void sample in this grid.
    pub fn max_elevation(&self) -> Option<f32> {
        self.elevation_range.map(|(_, hi)| hi)
    }

    /// Returns `true` if `coord` lies within the sample centers of
    /// this grid, edges included.
    pub fn contains(&self, coord: Coord<C>) -> bool {
        let ne = self.ne_corner_center();
        let sw = self.sw_corner_center;
        (sw.x..=ne.x).contains(&coord.x) && (sw.y..=ne.y).contains(&coord.y)
    }

    /// Returns the sample at `(x, y)`, where `(0, 0)` is the SW most
    /// sample.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is out of bounds.
    pub fn get_xy(&self, (x, y): (usize, usize)) -> f32 {
        let (cols, rows) = self.dimensions;
        assert!(x < cols && y < rows, "({x}, {y}) out of bounds");
        self.samples[y * cols + x]
    }

    /// Returns the bilinearly interpolated elevation at `coord`.
    ///
    /// Returns `None` when `coord` is outside this grid or when any of
    /// the four samples bracketing it is void.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn get(&self, coord: Coord<C>) -> Option<C> {
        let (cols, rows) = self.dimensions;
        let fx = (coord.x - self.sw_corner_center.x) / self.spacing;
        let fy = (coord.y - self.sw_corner_center.y) / self.spacing;
        // NaN coordinates fail these checks too.
        if !(0.0..=(cols - 1) as C).contains(&fx) || !(0.0..=(rows - 1) as C).contains(&fy) {
            return None;
        }

        // Points on the east or north edge use the last cell.
        let x = (fx.floor() as usize).min(cols - 2);
        let y = (fy.floor() as usize).min(rows - 2);
        let tx = fx - x as C;
        let ty = fy - y as C;

        let sw = C::from(self.get_xy((x, y)));
        let se = C::from(self.get_xy((x + 1, y)));
        let nw = C::from(self.get_xy((x, y + 1)));
        let ne = C::from(self.get_xy((x + 1, y + 1)));

        let elevation = lerp(lerp(sw, se, tx), lerp(nw, ne, tx), ty);
        (!elevation.is_nan()).then_some(elevation)
    }
}

/// Exact at both ends: `t == 0` yields `a`, `t == 1` yields `b`.
fn lerp(a: C, b: C, t: C) -> C {
    a * (1.0 - t) + b * t
}
