//! USGS DEM (`.dem`).
//!
//! The file is a sequence of 1024-byte logical records with
//! fixed-width fields, byte positions below are 1-based as in the
//! standard:
//!
//! - Record A (once): projection, units, corners, spatial resolution
//!   and the number of elevation profiles.
//! - Record B (once per profile): one south to north column of
//!   integer elevations with its own start point and local datum. The
//!   first block holds up to 146 elevations, every continuation block
//!   up to 170. Each profile starts on a block boundary.
//!
//! Reals may use Fortran `D` exponents (`1.0D+03`).

use crate::{Grid, ParseError, C};
use geo::geometry::Coord;

const RECORD_LEN: usize = 1024;
const FIRST_BLOCK_ELEVATIONS: usize = 146;
const BLOCK_ELEVATIONS: usize = 170;
/// Raw elevations at or below this value are voids.
const VOID: i64 = -32767;
const FEET_TO_METERS: C = 0.3048;

/// Planimetric reference system code for geographic coordinates.
const GEOGRAPHIC: i64 = 0;
const UNIT_FEET: i64 = 1;
const UNIT_METERS: i64 = 2;

/// A fixed-width record starting at `offset` in the file.
#[derive(Clone, Copy)]
struct Record<'a> {
    raw: &'a [u8],
    offset: usize,
}

impl<'a> Record<'a> {
    /// Returns the trimmed field at 1-based, inclusive bytes
    /// `start..=end` of this record.
    fn field(self, start: usize, end: usize) -> Result<&'a str, ParseError> {
        let range = (self.offset + start - 1)..(self.offset + end);
        let bytes = self
            .raw
            .get(range)
            .ok_or(ParseError::Truncated(self.offset + end))?;
        std::str::from_utf8(bytes)
            .map(str::trim)
            .map_err(|_| ParseError::Encoding)
    }

    fn int(self, name: &'static str, start: usize, end: usize) -> Result<i64, ParseError> {
        let value = self.field(start, end)?;
        value.parse().map_err(|_| ParseError::Field {
            name,
            value: value.to_owned(),
        })
    }

    fn real(self, name: &'static str, start: usize, end: usize) -> Result<C, ParseError> {
        let value = self.field(start, end)?;
        value
            .replace(['D', 'd'], "E")
            .parse()
            .map_err(|_| ParseError::Field {
                name,
                value: value.to_owned(),
            })
    }

    fn count(self, name: &'static str, start: usize, end: usize) -> Result<usize, ParseError> {
        let value = self.int(name, start, end)?;
        usize::try_from(value).map_err(|_| ParseError::Field {
            name,
            value: value.to_string(),
        })
    }
}

struct Profile {
    start: Coord<C>,
    datum: C,
    elevations: Vec<i64>,
}

pub(crate) fn parse(raw: &[u8]) -> Result<Grid, ParseError> {
    let a = Record { raw, offset: 0 };

    let planimetric = a.int("planimetric reference system", 157, 162)?;
    if planimetric == GEOGRAPHIC {
        return Err(ParseError::Field {
            name: "planimetric reference system",
            value: planimetric.to_string(),
        });
    }
    let ground_units = a.int("ground units", 529, 534)?;
    if ground_units != UNIT_METERS {
        return Err(ParseError::Field {
            name: "ground units",
            value: ground_units.to_string(),
        });
    }
    let unit_scale = match a.int("elevation units", 535, 540)? {
        UNIT_FEET => FEET_TO_METERS,
        UNIT_METERS => 1.0,
        other => {
            return Err(ParseError::Field {
                name: "elevation units",
                value: other.to_string(),
            })
        }
    };
    let dx = a.real("x resolution", 817, 828)?;
    let dy = a.real("y resolution", 829, 840)?;
    let dz = a.real("z resolution", 841, 852)?;
    let profile_count = a.count("profile count", 859, 864)?;

    if !(dx > 0.0 && dy > 0.0) {
        return Err(ParseError::Geometry("resolution must be positive"));
    }
    if (dx - dy).abs() > dx * 1e-9 {
        return Err(ParseError::Geometry("cells are not square"));
    }

    let mut profiles = Vec::with_capacity(profile_count);
    let mut offset = RECORD_LEN;
    for _ in 0..profile_count {
        let (profile, next) = parse_profile(Record { raw, offset })?;
        profiles.push(profile);
        offset = next;
    }

    assemble(&profiles, dx, dz, unit_scale)
}

/// Returns the profile starting at `b` and the offset of the record
/// following it.
fn parse_profile(b: Record<'_>) -> Result<(Profile, usize), ParseError> {
    let len = b.count("profile length", 13, 18)?;
    let start = Coord {
        x: b.real("profile x", 25, 48)?,
        y: b.real("profile y", 49, 72)?,
    };
    let datum = b.real("local datum", 73, 96)?;
    if !(start.x.is_finite() && start.y.is_finite() && datum.is_finite()) {
        return Err(ParseError::Geometry("profile origin must be finite"));
    }

    let mut elevations = Vec::with_capacity(len);
    let mut block = b;
    let mut position = 145;
    let mut remaining_in_block = FIRST_BLOCK_ELEVATIONS;
    for _ in 0..len {
        if remaining_in_block == 0 {
            block.offset += RECORD_LEN;
            position = 1;
            remaining_in_block = BLOCK_ELEVATIONS;
        }
        elevations.push(block.int("elevation", position, position + 5)?);
        position += 6;
        remaining_in_block -= 1;
    }

    let profile = Profile {
        start,
        datum,
        elevations,
    };
    Ok((profile, block.offset + RECORD_LEN))
}

/// Most cells a grid may have per elevation read from the file.
/// Ragged tiles pad some columns with voids, but never this many.
const MAX_CELLS_PER_ELEVATION: usize = 4;

/// Places profiles on a common grid; cells no profile covers are
/// voids.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn assemble(profiles: &[Profile], spacing: C, dz: C, unit_scale: C) -> Result<Grid, ParseError> {
    if profiles.is_empty() {
        return Err(ParseError::Geometry("no elevation profiles"));
    }

    let (mut x_min, mut x_max) = (C::INFINITY, C::NEG_INFINITY);
    let (mut y_min, mut y_max) = (C::INFINITY, C::NEG_INFINITY);
    for profile in profiles {
        let top = profile.start.y + profile.elevations.len().saturating_sub(1) as C * spacing;
        x_min = x_min.min(profile.start.x);
        x_max = x_max.max(profile.start.x);
        y_min = y_min.min(profile.start.y);
        y_max = y_max.max(top);
    }
    let elevation_count: usize = profiles.iter().map(|p| p.elevations.len()).sum();

    // Lattice index of `value`, which must be below `limit`.
    let index = |value: C, origin: C, limit: usize| {
        let steps = ((value - origin) / spacing).round();
        if (0.0..limit as C).contains(&steps) {
            Ok(steps as usize)
        } else {
            Err(ParseError::Geometry("profile outside the grid"))
        }
    };
    // Profiles are consecutive columns.
    let cols = index(x_max, x_min, profiles.len())? + 1;
    let rows = index(y_max, y_min, elevation_count)? + 1;
    let cells = cols
        .checked_mul(rows)
        .filter(|&cells| cells <= elevation_count.saturating_mul(MAX_CELLS_PER_ELEVATION))
        .ok_or(ParseError::Geometry("grid too large"))?;

    let mut samples = vec![f32::NAN; cells];
    for profile in profiles {
        let col = index(profile.start.x, x_min, cols)?;
        let first_row = index(profile.start.y, y_min, rows)?;
        for (row, &raw) in (first_row..).zip(&profile.elevations) {
            let sample = (row < rows)
                .then(|| row * cols + col)
                .and_then(|i| samples.get_mut(i))
                .ok_or(ParseError::Geometry("profile outside the grid"))?;
            if raw > VOID {
                let meters = (profile.datum + raw as C * dz) * unit_scale;
                *sample = meters as f32;
            }
        }
    }

    Grid::new(
        Coord { x: x_min, y: y_min },
        spacing,
        (cols, rows),
        samples,
    )
}
