use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DemError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported elevation file {0}")]
    Extension(PathBuf),

    #[error("{path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

/// Errors in the contents of an elevation file.
#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("file is not valid UTF-8")]
    Encoding,

    #[error("missing header field {0}")]
    MissingField(&'static str),

    #[error("unknown header field {0:?}")]
    UnknownField(String),

    #[error("invalid header field {name}: {value:?}")]
    Field { name: &'static str, value: String },

    #[error("expected {expected} samples, found {found}")]
    SampleCount { expected: usize, found: usize },

    #[error("invalid sample {0:?}")]
    Sample(String),

    #[error("invalid grid geometry, {0}")]
    Geometry(&'static str),

    #[error("truncated record at byte {0}")]
    Truncated(usize),
}
