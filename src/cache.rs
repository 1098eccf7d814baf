use crate::bloom::Petal;
use crate::canvas::PixelCanvas;
use crate::palette::Palette;
use crate::render::{self, PetalFinish};
use crate::surface::Surface;

/// Logical side length of a baked bloom at scale 1.
pub(crate) const CACHE_EXTENT: f32 = 200.0;

/// A fully opened bloom frozen into a raster. Never redrawn once made.
#[derive(Debug)]
pub(crate) struct BloomCache {
    pub(crate) raster: PixelCanvas,
    /// Logical side length the raster covers, centred on the stem tip.
    pub(crate) extent: f32,
}

impl BloomCache {
    pub(crate) fn dimensions(&self) -> (u32, u32) {
        self.raster.size()
    }
}

/// Renders the final petals, centred and without sway, into a fresh raster.
pub(crate) fn bake(petals: &[Petal], palette: &Palette, scale: f32, density: f32) -> BloomCache {
    let extent = CACHE_EXTENT * scale;
    // round, not ceil: 200 * 0.6 lands a hair above 120 in f32
    let side = ((extent * density).round() as u32).max(1);

    let mut raster = PixelCanvas::new(side, side);
    raster.scale(side as f32 / extent);
    raster.translate(extent / 2.0, extent / 2.0);
    render::draw_petals(&mut raster, petals, palette, scale, PetalFinish::Rimmed);
    render::draw_center_glow(&mut raster);
    raster.reset_transform();

    BloomCache { raster, extent }
}
