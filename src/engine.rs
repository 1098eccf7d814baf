use crate::error::FlowerError;
use crate::flower::{Flower, FrameContext, GrowthRules};
use crate::particles::{ParticleSystem, DEFAULT_CAP};
use crate::render;
use crate::surface::{Point, Surface};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info, warn};

/// Viewport width at which the scale factor reaches 1.
const REFERENCE_WIDTH: f32 = 1000.0;
const MIN_SCALE: f32 = 0.6;
const MAX_SCALE: f32 = 1.0;

#[derive(Clone, Debug)]
pub(crate) struct EngineConfig {
    pub(crate) particle_cap: usize,
    /// Raster pixels per logical unit, used when baking blooms.
    pub(crate) raster_density: f32,
    pub(crate) seed: u64,
    pub(crate) rules: GrowthRules,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            particle_cap: DEFAULT_CAP,
            raster_density: 0.25,
            seed: 0,
            rules: GrowthRules::default(),
        }
    }
}

/// Flower species/colour chosen for new plantings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Selection {
    pub(crate) flower: String,
    pub(crate) color: String,
}

pub(crate) fn scale_for_width(width: f32) -> f32 {
    (width / REFERENCE_WIDTH).clamp(MIN_SCALE, MAX_SCALE)
}

/// Everything the animation owns: flowers, motes, clock and the current
/// viewport. One instance per running garden.
pub(crate) struct Engine {
    flowers: Vec<Flower>,
    particles: ParticleSystem,
    rules: GrowthRules,
    height: f32,
    scale: f32,
    density: f32,
    clock: f32,
    running: bool,
    selection: Selection,
    rng: StdRng,
}

impl Engine {
    pub(crate) fn new(cfg: EngineConfig, width: f32, height: f32) -> Self {
        Self {
            flowers: Vec::new(),
            particles: ParticleSystem::new(cfg.particle_cap),
            rules: cfg.rules,
            height,
            scale: scale_for_width(width),
            density: cfg.raster_density,
            clock: 0.0,
            running: false,
            selection: Selection {
                flower: "rose".to_string(),
                color: crate::palette::DEFAULT_KEY.to_string(),
            },
            rng: StdRng::seed_from_u64(cfg.seed),
        }
    }

    /// Resets the garden and starts the clock with a fresh selection.
    pub(crate) fn start(&mut self, flower: &str, color: &str) {
        self.flowers.clear();
        self.particles.clear();
        self.selection = Selection {
            flower: flower.to_string(),
            color: color.to_string(),
        };
        self.running = true;
        info!(flower, color, "garden started");
    }

    /// Freezes the animation in place. Flower state is kept.
    pub(crate) fn stop(&mut self) {
        if self.running {
            self.running = false;
            info!(flowers = self.flowers.len(), "garden stopped");
        }
    }

    /// Continues after [`Engine::stop`] without clearing anything.
    pub(crate) fn resume(&mut self) {
        if !self.running {
            self.running = true;
            info!(flowers = self.flowers.len(), "garden resumed");
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running
    }

    pub(crate) fn select(&mut self, flower: &str, color: &str) {
        self.selection = Selection {
            flower: flower.to_string(),
            color: color.to_string(),
        };
    }

    pub(crate) fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Plants a flower whose bloom will open at `at`.
    pub(crate) fn spawn_flower(&mut self, at: Point, flower: &str, color: &str) -> Result<(), FlowerError> {
        let rng = StdRng::seed_from_u64(self.rng.gen());
        let planted = Flower::sprout(at, self.height, flower, color, self.scale, rng)?;
        debug!(
            flower,
            color,
            x = at.x,
            y = at.y,
            scale = self.scale,
            stems = planted.stems.len(),
            sway_rate = planted.sway_rate,
            "flower planted"
        );
        self.flowers.push(planted);
        Ok(())
    }

    /// Plants the current selection. Rejected flowers are logged and dropped.
    pub(crate) fn spawn_selected(&mut self, at: Point) {
        let Selection { flower, color } = self.selection.clone();
        if let Err(err) = self.spawn_flower(at, &flower, &color) {
            warn!(%err, flower = %flower, "flower rejected");
        }
    }

    /// Applies to flowers planted from now on; existing flowers and their
    /// baked blooms keep their size.
    pub(crate) fn viewport_resized(&mut self, width: f32, height: f32) {
        self.height = height;
        self.scale = scale_for_width(width);
        info!(width, height, scale = self.scale, "viewport resized");
    }

    #[cfg(test)]
    pub(crate) fn scale_factor(&self) -> f32 {
        self.scale
    }

    /// One simulation tick. Motes move first, then every flower grows.
    pub(crate) fn advance_frame(&mut self, dt: f32) {
        if !self.running {
            return;
        }
        self.clock += dt;
        self.particles.update();

        let mut ctx = FrameContext {
            rules: &self.rules,
            particles: &mut self.particles,
            particle_scale: self.scale,
            raster_density: self.density,
        };
        for flower in &mut self.flowers {
            flower.advance(&mut ctx);
        }
    }

    pub(crate) fn render_frame<S: Surface + ?Sized>(&self, surface: &mut S) {
        render::render(surface, &self.flowers, &self.particles, self.clock);
    }

    pub(crate) fn flowers(&self) -> &[Flower] {
        &self.flowers
    }

    pub(crate) fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub(crate) fn clock(&self) -> f32 {
        self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PixelCanvas;
    use crate::flower::GrowthPhase;

    fn engine(width: f32) -> Engine {
        let cfg = EngineConfig {
            seed: 42,
            ..EngineConfig::default()
        };
        let mut e = Engine::new(cfg, width, 600.0);
        e.start("rose", "red");
        e
    }

    fn run_until_baked(e: &mut Engine) {
        for _ in 0..2000 {
            e.advance_frame(1.0 / 60.0);
            if e.flowers().iter().all(|f| f.cache_baked()) {
                return;
            }
        }
        panic!("flowers never bloomed");
    }

    #[test]
    fn scale_is_clamped() {
        assert_eq!(scale_for_width(300.0), 0.6);
        assert_eq!(scale_for_width(800.0), 0.8);
        assert_eq!(scale_for_width(2400.0), 1.0);
    }

    #[test]
    fn resize_does_not_touch_baked_blooms() {
        let mut e = engine(1000.0);
        e.spawn_flower(Point::new(300.0, 350.0), "rose", "red").unwrap();
        run_until_baked(&mut e);
        let dims = e.flowers()[0].bloom_cache.as_ref().unwrap().dimensions();
        let sizes: Vec<f32> = e.flowers()[0].petals.iter().map(|p| p.size).collect();

        e.viewport_resized(500.0, 600.0);
        assert_eq!(e.scale_factor(), 0.6);
        for _ in 0..30 {
            e.advance_frame(1.0 / 60.0);
        }
        let f = &e.flowers()[0];
        assert_eq!(f.bloom_cache.as_ref().unwrap().dimensions(), dims);
        assert_eq!(f.petals.iter().map(|p| p.size).collect::<Vec<_>>(), sizes);
        assert_eq!(f.scale, 1.0);

        e.spawn_flower(Point::new(100.0, 350.0), "tulip", "red").unwrap();
        assert_eq!(e.flowers()[1].scale, 0.6);
    }

    #[test]
    fn start_clears_the_garden() {
        let mut e = engine(1000.0);
        e.spawn_selected(Point::new(100.0, 300.0));
        e.spawn_selected(Point::new(200.0, 300.0));
        for _ in 0..50 {
            e.advance_frame(0.016);
        }
        assert_eq!(e.flowers().len(), 2);

        e.start("lavender", "pink");
        assert!(e.flowers().is_empty());
        assert_eq!(e.particle_count(), 0);
        assert_eq!(e.selection().flower, "lavender");
        e.spawn_selected(Point::new(100.0, 300.0));
        assert_eq!(e.flowers()[0].stems.len(), 3);
    }

    #[test]
    fn stop_freezes_everything() {
        let mut e = engine(1000.0);
        e.spawn_selected(Point::new(100.0, 300.0));
        for _ in 0..5 {
            e.advance_frame(0.016);
        }
        e.stop();
        assert!(!e.is_running());

        let clock = e.clock();
        let len = e.flowers()[0].stems[0].path.len();
        for _ in 0..20 {
            e.advance_frame(0.016);
        }
        assert_eq!(e.clock(), clock);
        assert_eq!(e.flowers()[0].stems[0].path.len(), len);

        e.resume();
        e.advance_frame(0.016);
        assert_eq!(e.flowers()[0].stems[0].path.len(), len + 1);
    }

    #[test]
    fn short_stems_bud_first() {
        let mut e = engine(1000.0);
        e.spawn_selected(Point::new(100.0, 598.0));
        e.spawn_selected(Point::new(200.0, 100.0));
        for _ in 0..3 {
            e.advance_frame(0.016);
        }
        // two units of stem take at most two frames
        assert_ne!(e.flowers()[0].phase, GrowthPhase::Stem);
        assert_eq!(e.flowers()[1].phase, GrowthPhase::Stem);
    }

    #[test]
    fn unknown_keys_still_grow() {
        let mut e = engine(1000.0);
        e.spawn_flower(Point::new(50.0, 500.0), "bogus", "nope").unwrap();
        let f = &e.flowers()[0];
        assert_eq!(f.species, None);
        assert_eq!(f.palette, crate::palette::resolve("red", "red"));
    }

    #[test]
    fn renders_onto_a_canvas() {
        let mut e = engine(1000.0);
        e.spawn_selected(Point::new(400.0, 300.0));
        for _ in 0..20 {
            e.advance_frame(0.016);
        }
        let mut canvas = PixelCanvas::new(250, 150);
        canvas.scale(0.25);
        e.render_frame(&mut canvas);
        assert!(canvas.px.iter().any(|p| p.a > 0));
    }
}
