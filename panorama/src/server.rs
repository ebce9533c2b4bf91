//! HTTP front end.
//!
//! - `GET /panorama` renders a PNG.
//! - `GET /position?x=..&y=..` returns the terrain drawn at a pixel as
//!   JSON.
//!
//! Both accept the view's fields (`start`, `width`, `columns`,
//! `easting`, `northing`, `eye_height`, `sub_pixels`) as query
//! parameters overriding the command line defaults. Anything else is
//! served from the static file directory.

use crate::{
    options::{Serve, ViewArgs, ViewQuery},
    render::{encode_png, Renderer},
};
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::{info, warn};
use serde::Deserialize;
use std::sync::Arc;
use terrain::ElevationMap;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

#[derive(Clone)]
struct AppState {
    map: Arc<ElevationMap>,
    view: ViewArgs,
}

#[derive(Debug, Deserialize)]
struct Pixel {
    x: u32,
    y: u32,
}

impl Serve {
    pub async fn run(self, map: ElevationMap) -> Result<()> {
        let state = AppState {
            map: Arc::new(map),
            view: self.view,
        };
        info!("serving static files from {}", self.htdocs.display());
        let app = router(state).fallback_service(ServeDir::new(&self.htdocs));
        let listener = TcpListener::bind(self.bind).await?;
        info!("listening on http://{}", self.bind);
        axum::serve(listener, app).await?;
        Ok(())
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/panorama", get(panorama))
        .route("/position", get(position))
        .with_state(state)
}

async fn panorama(State(state): State<AppState>, Query(query): Query<ViewQuery>) -> Response {
    let renderer = match Renderer::new(query.apply(&state.view)) {
        Ok(renderer) => renderer,
        Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    };
    // Rendering is CPU bound.
    let rendered = tokio::task::spawn_blocking(move || {
        let image = renderer.create_image(&state.map)?;
        encode_png(&image)
    })
    .await;
    match rendered {
        Ok(Ok(png)) => ([(header::CONTENT_TYPE, "image/png")], png).into_response(),
        Ok(Err(err)) => internal_error(&err.to_string()),
        Err(err) => internal_error(&err.to_string()),
    }
}

async fn position(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
    Query(pixel): Query<Pixel>,
) -> Response {
    let renderer = match Renderer::new(query.apply(&state.view)) {
        Ok(renderer) => renderer,
        Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    };
    let found = tokio::task::spawn_blocking(move || renderer.position(&state.map, pixel.x, pixel.y))
        .await;
    match found {
        Ok(Ok(Some(position))) => Json(position).into_response(),
        Ok(Ok(None)) => (StatusCode::NOT_FOUND, "no terrain at pixel").into_response(),
        Ok(Err(err)) => internal_error(&err.to_string()),
        Err(err) => internal_error(&err.to_string()),
    }
}

fn internal_error(msg: &str) -> Response {
    warn!("request failed: {msg}");
    (StatusCode::INTERNAL_SERVER_ERROR, msg.to_owned()).into_response()
}
