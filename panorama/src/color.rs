//! Terrain coloring.

use image::Rgba;
use terrain::Geopixel;

/// Terrain beyond this distance (meters) fades toward white.
const FADE_FROM_DISTANCE: f64 = 70_000.0;

/// Distance (meters) at which terrain is equal parts green and blue.
const BLUE_DISTANCE: f64 = 10_000.0;

/// Incline (degrees) at which terrain is equal parts color and black.
const BLACK_INCLINE: f64 = 20.0;

const GREEN: Rgb = Rgb::new(40.0, 140.0, 50.0);
const BLUE: Rgb = Rgb::new(70.0, 110.0, 200.0);
const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
const WHITE: Rgb = Rgb::new(255.0, 255.0, 255.0);

/// Weighted sum of colors.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rgb {
    r: f64,
    g: f64,
    b: f64,
    weight: f64,
}

impl Rgb {
    /// Returns a color of unit weight.
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self {
            r,
            g,
            b,
            weight: 1.0,
        }
    }

    #[must_use]
    pub fn add(self, other: Self) -> Self {
        Self {
            r: self.r + other.r,
            g: self.g + other.g,
            b: self.b + other.b,
            weight: self.weight + other.weight,
        }
    }

    /// Scales both color and weight.
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Self {
            r: self.r * factor,
            g: self.g * factor,
            b: self.b * factor,
            weight: self.weight * factor,
        }
    }

    /// Returns the weighted average color, with unit weight.
    #[must_use]
    pub fn normalize(self) -> Self {
        if self.weight == 0.0 {
            return self;
        }
        Self::new(
            self.r / self.weight,
            self.g / self.weight,
            self.b / self.weight,
        )
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn with_alpha(self, alpha: u8) -> Rgba<u8> {
        let channel = |v: f64| v.round().clamp(0.0, 255.0) as u8;
        Rgba([channel(self.r), channel(self.g), channel(self.b), alpha])
    }
}

/// Returns the color of visible terrain.
///
/// Distant terrain is bluer, steep terrain darker, and terrain beyond
/// 70 km fades to white.
pub fn geopixel_color(geopixel: &Geopixel) -> Rgb {
    let shade = (geopixel.incline / BLACK_INCLINE).clamp(0.0, 1.0);
    let color = GREEN
        .add(BLUE.scale(geopixel.distance / BLUE_DISTANCE))
        .normalize()
        .add(BLACK.scale(shade))
        .normalize();
    if geopixel.distance < FADE_FROM_DISTANCE {
        color
    } else {
        let fade = (geopixel.distance - FADE_FROM_DISTANCE) / FADE_FROM_DISTANCE;
        color.add(WHITE.scale(fade)).normalize()
    }
}
