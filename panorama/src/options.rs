use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use std::{net::SocketAddr, path::PathBuf};

/// Render terrain panoramas from elevation tiles.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory of elevation tiles (.dem, .asc).
    #[arg(short, long, default_value = "dem-files")]
    pub dem_dir: PathBuf,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render a panorama to a PNG file.
    Render(Render),

    /// Print the map coordinate seen at an image pixel as JSON.
    Lookup(Lookup),

    /// Serve rendered panoramas over HTTP.
    Serve(Serve),
}

#[derive(Debug, Clone, Args)]
pub struct Render {
    #[command(flatten)]
    pub view: ViewArgs,

    /// Output PNG file.
    #[arg(short, long, default_value = "panorama.png")]
    pub out: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct Lookup {
    #[command(flatten)]
    pub view: ViewArgs,

    /// Image column, from the left.
    #[arg(long)]
    pub x: u32,

    /// Image row, from the top.
    #[arg(long)]
    pub y: u32,
}

#[derive(Debug, Clone, Args)]
pub struct Serve {
    /// Default view, overridable per request.
    #[command(flatten)]
    pub view: ViewArgs,

    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:8090")]
    pub bind: SocketAddr,

    /// Static files served at `/`.
    #[arg(long, default_value = "htdocs")]
    pub htdocs: PathBuf,
}

/// What part of the panorama to render, and from where.
#[derive(Debug, Clone, Copy, PartialEq, Args)]
pub struct ViewArgs {
    /// Bearing of the leftmost column, in radians clockwise from
    /// north.
    #[arg(long, default_value_t = 3.1, allow_negative_numbers = true)]
    pub start: f64,

    /// Horizontal field of view, in radians.
    #[arg(long, default_value_t = 0.1)]
    pub width: f64,

    /// Image width in pixels.
    #[arg(long, default_value_t = 400)]
    pub columns: u32,

    /// Viewpoint easting, in meters.
    #[arg(long, default_value_t = 463_561.0)]
    pub easting: f64,

    /// Viewpoint northing, in meters.
    #[arg(long, default_value_t = 6_833_871.0)]
    pub northing: f64,

    /// Eye height above ground, in meters.
    #[arg(long, default_value_t = terrain::constants::EYE_HEIGHT)]
    pub eye_height: f64,

    /// Angle buckets averaged into each pixel.
    #[arg(long, default_value_t = 3)]
    pub sub_pixels: u32,
}

/// Per-request overrides of [`ViewArgs`], from a URL query string.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ViewQuery {
    pub start: Option<f64>,
    pub width: Option<f64>,
    pub columns: Option<u32>,
    pub easting: Option<f64>,
    pub northing: Option<f64>,
    pub eye_height: Option<f64>,
    pub sub_pixels: Option<u32>,
}

impl ViewQuery {
    pub fn apply(&self, view: &ViewArgs) -> ViewArgs {
        ViewArgs {
            start: self.start.unwrap_or(view.start),
            width: self.width.unwrap_or(view.width),
            columns: self.columns.unwrap_or(view.columns),
            easting: self.easting.unwrap_or(view.easting),
            northing: self.northing.unwrap_or(view.northing),
            eye_height: self.eye_height.unwrap_or(view.eye_height),
            sub_pixels: self.sub_pixels.unwrap_or(view.sub_pixels),
        }
    }
}
