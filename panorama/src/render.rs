use crate::{
    color::{geopixel_color, Rgb},
    options::{Lookup, Render, ViewArgs},
};
use anyhow::{ensure, Context, Result};
use image::{ImageFormat, Rgba, RgbaImage};
use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;
use std::{io::Cursor, time::Instant};
use terrain::{
    constants::TOTAL_HEIGHT_ANGLE,
    geo::geometry::Coord,
    ElevationMap, Geopixel, Scanner, Viewpoint,
};

impl Render {
    pub fn run(&self, map: &ElevationMap) -> Result<()> {
        let image = Renderer::new(self.view)?.create_image(map)?;
        image.save_with_format(&self.out, ImageFormat::Png)?;
        info!("wrote {}", self.out.display());
        Ok(())
    }
}

impl Lookup {
    pub fn run(&self, map: &ElevationMap) -> Result<()> {
        match Renderer::new(self.view)?.position(map, self.x, self.y)? {
            Some(position) => println!("{}", serde_json::to_string(&position)?),
            None => println!("null"),
        }
        Ok(())
    }
}

/// The terrain drawn at an image pixel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub easting: f64,
    pub northing: f64,
    #[serde(flatten)]
    pub geopixel: Geopixel,
}

/// Returns `image` encoded as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut png = Cursor::new(Vec::new());
    image.write_to(&mut png, ImageFormat::Png)?;
    Ok(png.into_inner())
}

/// Widest image rendered, in pixels.
const MAX_COLUMNS: u32 = 8192;

/// Tallest image rendered, in pixels.
const MAX_HEIGHT: u32 = 8192;

/// Most angle buckets averaged into one pixel.
const MAX_SUB_PIXELS: u32 = 16;

/// Draws one skyline profile per image column.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    view: ViewArgs,
    height: u32,
    buckets: usize,
}

impl Renderer {
    pub fn new(view: ViewArgs) -> Result<Self> {
        ensure!(
            (1..=MAX_COLUMNS).contains(&view.columns),
            "columns must be between 1 and {MAX_COLUMNS}"
        );
        ensure!(
            (1..=MAX_SUB_PIXELS).contains(&view.sub_pixels),
            "sub_pixels must be between 1 and {MAX_SUB_PIXELS}"
        );
        ensure!(
            view.width > 0.0 && view.width.is_finite(),
            "width must be positive"
        );
        ensure!(view.start.is_finite(), "start must be finite");
        ensure!(
            view.easting.is_finite() && view.northing.is_finite(),
            "viewpoint must be finite"
        );
        ensure!(view.eye_height.is_finite(), "eye_height must be finite");

        let height = (TOTAL_HEIGHT_ANGLE * f64::from(view.columns) / view.width).round();
        ensure!(
            (1.0..=f64::from(MAX_HEIGHT)).contains(&height),
            "columns/width gives an image {height} pixels high, must be between 1 and {MAX_HEIGHT}"
        );
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let height = height as u32;
        let buckets = usize::try_from(height)?
            .checked_mul(usize::try_from(view.sub_pixels)?)
            .context("too many angle buckets")?;
        Ok(Self {
            view,
            height,
            buckets,
        })
    }

    /// Image size as (width, height) in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.view.columns, self.height)
    }

    /// Bearing seen by column `x`.
    pub fn bearing(&self, x: u32) -> f64 {
        self.view.start + f64::from(x) * self.view.width / f64::from(self.view.columns)
    }

    pub fn create_image(&self, map: &ElevationMap) -> Result<RgbaImage> {
        let now = Instant::now();
        let scanner = self.scanner(map)?;
        let sub_pixels = self.view.sub_pixels as usize;
        let columns = (0..self.view.columns)
            .into_par_iter()
            .map_init(
                || Vec::with_capacity(scanner.buckets()),
                |profile, x| {
                    let profile = scanner.trace_into(self.bearing(x), profile);
                    profile
                        .chunks(sub_pixels)
                        .map(|chunk| self.pixel_color(chunk))
                        .collect::<Vec<_>>()
                },
            )
            .collect::<Vec<_>>();

        let mut image = RgbaImage::new(self.view.columns, self.height);
        for (x, column) in (0..).zip(columns) {
            // The lowest angles are at the bottom of the image.
            for (y, pixel) in (0..self.height).rev().zip(column) {
                image.put_pixel(x, y, pixel);
            }
        }
        debug!(
            "rendered {}x{} panorama in {:?}",
            self.view.columns,
            self.height,
            now.elapsed()
        );
        Ok(image)
    }

    /// Returns the map coordinate drawn at pixel (`x`, `y`), or `None`
    /// if it shows sky or is outside the image.
    pub fn pixel_to_position(&self, map: &ElevationMap, x: u32, y: u32) -> Result<Option<Coord>> {
        Ok(self.position(map, x, y)?.map(|position| Coord {
            x: position.easting,
            y: position.northing,
        }))
    }

    /// Like [`pixel_to_position`](Self::pixel_to_position), along with
    /// the terrain's distance and incline.
    pub fn position(&self, map: &ElevationMap, x: u32, y: u32) -> Result<Option<Position>> {
        if x >= self.view.columns || y >= self.height {
            return Ok(None);
        }
        let scanner = self.scanner(map)?;
        let bearing = self.bearing(x);
        // A pixel's color comes from its lowest bucket onward.
        let bucket = (self.height - 1 - y) as usize * self.view.sub_pixels as usize;
        Ok(scanner.trace(bearing).get(bucket).map(|&geopixel| {
            let coord = scanner.locate(bearing, geopixel.distance);
            Position {
                easting: coord.x,
                northing: coord.y,
                geopixel,
            }
        }))
    }

    fn scanner<'a>(&self, map: &'a ElevationMap) -> Result<Scanner<'a>> {
        let coord = Coord {
            x: self.view.easting,
            y: self.view.northing,
        };
        Ok(Scanner::builder()
            .viewpoint(Viewpoint::new(coord, self.view.eye_height, map))
            .buckets(self.buckets)
            .build(map)?)
    }

    /// Averages a pixel's buckets. Partly covered pixels are partly
    /// transparent.
    #[allow(clippy::cast_possible_truncation)]
    fn pixel_color(&self, buckets: &[Geopixel]) -> Rgba<u8> {
        let color = buckets
            .iter()
            .map(geopixel_color)
            .fold(Rgb::default(), Rgb::add)
            .normalize();
        let alpha = 255 / self.view.sub_pixels * buckets.len() as u32;
        color.with_alpha(alpha.min(255) as u8)
    }
}
