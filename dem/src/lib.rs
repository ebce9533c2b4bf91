//! Digital elevation model tiles in projected coordinates.
//!
//! A [`Grid`] is one rectangular tile of ground-height samples on a
//! uniform, axis-aligned spacing. Tiles are read from two text
//! formats, selected by file extension:
//!
//! - `.dem`: USGS DEM, the format national mapping agencies (e.g.
//!   Kartverket's DTM10) distribute UTM tiles in.
//! - `.asc`: ESRI ASCII grid.
//!
//! # References
//!
//! 1. [USGS DEM Standards, Part 2](https://www.usgs.gov/publications/standards-digital-elevation-models)
//! 1. [Archive Team, USGS DEM](http://fileformats.archiveteam.org/wiki/USGS_DEM)
//! 1. [Esri ASCII raster format](https://desktop.arcgis.com/en/arcmap/latest/manage-data/raster-and-images/esri-ascii-raster-format.htm)

mod asc;
mod error;
mod grid;
mod usgs;

pub use crate::{
    error::{DemError, ParseError},
    grid::Grid,
};

/// Base floating point type used for all coordinates and calculations.
///
/// Samples are stored as `f32` to halve the memory footprint of
/// large tiles, but every lookup is computed in `C`.
pub type C = f64;
