//! ESRI ASCII grid (`.asc`).
//!
//! ```text
//! ncols         4
//! nrows         3
//! xllcorner     463000.0
//! yllcorner     6833000.0
//! cellsize      10.0
//! NODATA_value  -9999
//! 812 815 820 826
//! ...
//! ```
//!
//! Rows are listed north to south. `xllcenter`/`yllcenter` may
//! replace the `*corner` keys.

use crate::{Grid, ParseError, C};
use geo::geometry::Coord;

#[derive(Default)]
struct Header {
    cols: Option<usize>,
    rows: Option<usize>,
    /// (value, is cell corner rather than center)
    x: Option<(C, bool)>,
    y: Option<(C, bool)>,
    cell_size: Option<C>,
    nodata: Option<f32>,
}

pub(crate) fn parse(raw: &[u8]) -> Result<Grid, ParseError> {
    let text = std::str::from_utf8(raw).map_err(|_| ParseError::Encoding)?;
    let mut tokens = text.split_ascii_whitespace().peekable();

    let mut header = Header::default();
    while let Some(key) = tokens.next_if(|t| t.starts_with(|c: char| c.is_ascii_alphabetic())) {
        let key = key.to_ascii_lowercase();
        let name = match key.as_str() {
            "ncols" => "ncols",
            "nrows" => "nrows",
            "xllcorner" => "xllcorner",
            "xllcenter" => "xllcenter",
            "yllcorner" => "yllcorner",
            "yllcenter" => "yllcenter",
            "cellsize" => "cellsize",
            "nodata_value" => "nodata_value",
            _ => return Err(ParseError::UnknownField(key)),
        };
        let value = tokens.next().ok_or(ParseError::MissingField(name))?;
        let invalid = || ParseError::Field {
            name,
            value: value.to_owned(),
        };
        match name {
            "ncols" => header.cols = Some(value.parse().map_err(|_| invalid())?),
            "nrows" => header.rows = Some(value.parse().map_err(|_| invalid())?),
            "xllcorner" | "xllcenter" => {
                header.x = Some((value.parse().map_err(|_| invalid())?, name == "xllcorner"));
            }
            "yllcorner" | "yllcenter" => {
                header.y = Some((value.parse().map_err(|_| invalid())?, name == "yllcorner"));
            }
            "cellsize" => header.cell_size = Some(value.parse().map_err(|_| invalid())?),
            _ => header.nodata = Some(value.parse().map_err(|_| invalid())?),
        }
    }

    let cols = header.cols.ok_or(ParseError::MissingField("ncols"))?;
    let rows = header.rows.ok_or(ParseError::MissingField("nrows"))?;
    let (x, x_is_corner) = header.x.ok_or(ParseError::MissingField("xllcorner"))?;
    let (y, y_is_corner) = header.y.ok_or(ParseError::MissingField("yllcorner"))?;
    let cell_size = header.cell_size.ok_or(ParseError::MissingField("cellsize"))?;

    let sw_corner_center = Coord {
        x: if x_is_corner { x + cell_size / 2.0 } else { x },
        y: if y_is_corner { y + cell_size / 2.0 } else { y },
    };

    let file_order = tokens
        .map(|token| {
            let sample = token
                .parse::<f32>()
                .map_err(|_| ParseError::Sample(token.to_owned()))?;
            Ok(match header.nodata {
                Some(nodata) if sample == nodata => f32::NAN,
                _ => sample,
            })
        })
        .collect::<Result<Vec<f32>, ParseError>>()?;

    let expected = cols
        .checked_mul(rows)
        .ok_or(ParseError::Geometry("grid too large"))?;
    if file_order.len() != expected {
        return Err(ParseError::SampleCount {
            expected,
            found: file_order.len(),
        });
    }

    // Flip to southern-most row first.
    let samples = file_order
        .chunks_exact(cols.max(1))
        .rev()
        .flatten()
        .copied()
        .collect();

    Grid::new(sw_corner_center, cell_size, (cols, rows), samples)
}
