//! # Terrain Horizon Scanning
//!
//! `terrain` finds the skyline seen from a point on a projected
//! (meters east, meters north) elevation map.
//!
//! ```no_run
//! use terrain::{geo::geometry::Coord, ElevationMap, Scanner, Viewpoint};
//!
//! let map = ElevationMap::load_dir("dem-files")?;
//! let viewpoint = Viewpoint::new(Coord { x: 463_561., y: 6_833_871. }, 20., &map);
//! let scanner = Scanner::builder().viewpoint(viewpoint).buckets(480).build(&map)?;
//! let skyline = scanner.trace(std::f64::consts::FRAC_PI_2);
//! # Ok::<(), terrain::TerrainError>(())
//! ```

pub mod constants;
mod elevation_map;
mod error;
mod math;
mod scanner;
mod viewpoint;

pub use {
    crate::{
        elevation_map::ElevationMap,
        error::TerrainError,
        scanner::{direction, Geopixel, Scanner, ScannerBuilder},
        viewpoint::Viewpoint,
    },
    dem, geo,
};
