use criterion::{criterion_group, criterion_main, Criterion};
use dem::Grid;
use geo::geometry::Coord;
use std::f64::consts::TAU;
use terrain::{ElevationMap, Scanner, Viewpoint};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

/// 100 km square of rolling hills at 50 m resolution.
fn rolling_hills() -> ElevationMap {
    let spacing = 50.0;
    let cells = 2001;
    let mut samples = Vec::with_capacity(cells * cells);
    for row in 0..cells {
        for col in 0..cells {
            let (x, y) = (col as f64 * spacing, row as f64 * spacing);
            let elevation = 300.0 + 150.0 * (x / 3_100.0).sin() * (y / 4_700.0).cos();
            samples.push(elevation as f32);
        }
    }
    let grid = Grid::new(Coord { x: 0., y: 0. }, spacing, (cells, cells), samples).unwrap();
    ElevationMap::from_grids(vec![grid])
}

fn horizon_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("Horizon Scan");

    let map = rolling_hills();
    let viewpoint = Viewpoint::new(Coord { x: 50_000., y: 50_000. }, 20., &map);
    let scanner = Scanner::builder()
        .viewpoint(viewpoint)
        .buckets(480)
        .build(&map)
        .unwrap();

    let mut profile = Vec::new();
    group.bench_function("single bearing", |b| {
        b.iter(|| scanner.trace_into(1.0, &mut profile).len())
    });

    group.bench_function("full circle", |b| {
        b.iter(|| {
            (0..360)
                .map(|deg| scanner.trace_into(f64::from(deg) / 360.0 * TAU, &mut profile).len())
                .sum::<usize>()
        })
    });
}

criterion_group!(benches, horizon_scan);
criterion_main!(benches);
