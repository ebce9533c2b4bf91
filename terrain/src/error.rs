use dem::DemError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TerrainError {
    #[error("missing or invalid parameter '{0}'")]
    Builder(&'static str),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("no elevation files in {0}")]
    Path(PathBuf),

    #[error("{0}")]
    Dem(#[from] DemError),
}
