mod app;
mod bloom;
mod cache;
mod canvas;
mod config;
mod engine;
mod error;
mod flower;
mod input;
mod logging;
mod palette;
mod particles;
mod render;
mod species;
mod surface;
mod sway;
mod term;

use anyhow::Result;

fn main() -> Result<()> {
    app::run()
}
