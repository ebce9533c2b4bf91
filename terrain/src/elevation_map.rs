//! Elevation tile aggregator.

use crate::TerrainError;
use dem::{Grid, C};
use geo::geometry::Coord;
use log::info;
use rayon::prelude::*;
use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    time::Instant,
};

/// Read-only collection of elevation tiles.
///
/// Tiles may overlap or leave gaps between them. Where they overlap,
/// the tile loaded first answers.
#[derive(Debug, Clone, Default)]
pub struct ElevationMap {
    grids: Vec<Grid>,
}

impl ElevationMap {
    /// Returns a map of the tiles at `paths`, in the given order.
    pub fn load<I, P>(paths: I) -> Result<Self, TerrainError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let paths: Vec<PathBuf> = paths.into_iter().map(|p| p.as_ref().to_owned()).collect();
        let now = Instant::now();
        let grids = paths
            .par_iter()
            .map(Grid::load)
            .collect::<Result<Vec<_>, _>>()?;
        info!("loaded {} elevation tiles in {:?}", grids.len(), now.elapsed());
        Ok(Self { grids })
    }

    /// Returns a map of every `.dem` and `.asc` file in `dir`, sorted
    /// by file name. Hidden files are skipped.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self, TerrainError> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let hidden = path
                .file_name()
                .and_then(OsStr::to_str)
                .map_or(true, |name| name.starts_with('.'));
            let is_elevation_file = matches!(
                path.extension()
                    .and_then(OsStr::to_str)
                    .map(str::to_ascii_lowercase)
                    .as_deref(),
                Some("dem" | "asc")
            );
            if is_elevation_file && !hidden && path.is_file() {
                paths.push(path);
            }
        }

        // Let's fail early rather than render a panorama of nothing.
        if paths.is_empty() {
            return Err(TerrainError::Path(dir.to_owned()));
        }

        paths.sort();
        Self::load(paths)
    }

    /// Returns a map of already loaded grids.
    pub fn from_grids(grids: Vec<Grid>) -> Self {
        Self { grids }
    }

    /// Returns this map's tiles in lookup order.
    pub fn grids(&self) -> &[Grid] {
        &self.grids
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    /// Returns the interpolated elevation at `coord`, if any tile
    /// covers it.
    pub fn get(&self, coord: Coord<C>) -> Option<C> {
        self.grids.iter().find_map(|grid| grid.get(coord))
    }

    /// Returns the interpolated elevation at `coord`, or `fallback`
    /// if no tile covers it.
    pub fn elevation(&self, coord: Coord<C>, fallback: C) -> C {
        self.get(coord).unwrap_or(fallback)
    }
}
