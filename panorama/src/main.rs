mod color;
mod options;
mod render;
mod server;

use anyhow::Result;
use clap::Parser;
use options::{Cli, Command};
use terrain::ElevationMap;
#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::init();

    let map = ElevationMap::load_dir(&cli.dem_dir)?;
    match cli.cmd {
        Command::Render(render) => render.run(&map),
        Command::Lookup(lookup) => lookup.run(&map),
        Command::Serve(serve) => tokio::runtime::Runtime::new()?.block_on(serve.run(map)),
    }
}
