use crate::bloom::{self, Petal};
use crate::cache::{self, BloomCache};
use crate::error::FlowerError;
use crate::palette::{self, Palette};
use crate::particles::{Particle, ParticleSystem};
use crate::species::{self, Species};
use crate::surface::Point;
use rand::{rngs::StdRng, Rng};
use std::f32::consts::{FRAC_PI_2, TAU};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum GrowthPhase {
    Stem,
    Bud,
    Bloom,
}

/// Per-frame growth constants.
#[derive(Clone, Debug)]
pub(crate) struct GrowthRules {
    pub(crate) bloom_rate: f32,
    pub(crate) petal_ease: f32,
    pub(crate) leaf_growth: f32,
    pub(crate) leaf_chance: f32,
    pub(crate) leaf_min_segments: u32,
    pub(crate) particle_chance: f32,
    /// Full width of the uniform angle perturbation per stem step.
    pub(crate) stem_wobble: f32,
}

impl Default for GrowthRules {
    fn default() -> Self {
        Self {
            bloom_rate: 0.01,
            petal_ease: 0.1,
            leaf_growth: 0.5,
            leaf_chance: 0.02,
            leaf_min_segments: 20,
            particle_chance: 0.2,
            stem_wobble: 0.05,
        }
    }
}

/// What a flower may touch outside itself while advancing.
pub(crate) struct FrameContext<'a> {
    pub(crate) rules: &'a GrowthRules,
    pub(crate) particles: &'a mut ParticleSystem,
    /// Current global scale, for particles emitted this frame.
    pub(crate) particle_scale: f32,
    /// Raster pixels per logical unit, for the bloom cache.
    pub(crate) raster_density: f32,
}

#[derive(Clone, Debug)]
pub(crate) struct Stem {
    pub(crate) path: Vec<Point>,
    pub(crate) target_length: f32,
    pub(crate) growth_rate: f32,
    pub(crate) angle: f32,
    pub(crate) width: f32,
    pub(crate) segments: u32,
}

impl Stem {
    pub(crate) fn new(base: Point, angle: f32, target_length: f32, growth_rate: f32, width: f32) -> Self {
        Self {
            path: vec![base],
            target_length,
            growth_rate,
            angle,
            width,
            segments: 0,
        }
    }

    fn sprout(base: Point, height: f32, scale: f32, rng: &mut impl Rng) -> Self {
        let angle = -FRAC_PI_2 + (rng.gen::<f32>() - 0.5) * 0.2;
        let target_length = height.max(0.0) * (0.9 + rng.gen::<f32>() * 0.2);
        let width = (5.0 + rng.gen::<f32>() * 2.0) * scale;
        let growth_rate = (1.5 + rng.gen::<f32>() * 1.5) * scale;
        Self::new(base, angle, target_length, growth_rate, width)
    }

    pub(crate) fn base(&self) -> Point {
        self.path[0]
    }

    pub(crate) fn tip(&self) -> Point {
        self.path[self.path.len() - 1]
    }

    /// Straight-line reach from the ground, not path length: a stem that
    /// drifts keeps growing until its tip is `target_length` away.
    pub(crate) fn is_grown(&self) -> bool {
        self.base().distance(self.tip()) >= self.target_length
    }

    /// Appends one segment along the current heading, then lets the heading
    /// drift. Returns the new tip.
    fn grow(&mut self, wobble: f32, rng: &mut impl Rng) -> Point {
        let tip = self.tip();
        let next = Point::new(
            tip.x + self.angle.cos() * self.growth_rate,
            tip.y + self.angle.sin() * self.growth_rate,
        );
        self.angle += (rng.gen::<f32>() - 0.5) * wobble;
        self.path.push(next);
        self.segments += 1;
        next
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Leaf {
    pub(crate) stem: usize,
    pub(crate) attachment: usize,
    pub(crate) side: f32,
    pub(crate) size: f32,
    pub(crate) max_size: f32,
    pub(crate) angle: f32,
    pub(crate) phase: f32,
    pub(crate) stalk_length: f32,
}

impl Leaf {
    fn sprout(stem: usize, attachment: usize, scale: f32, rng: &mut impl Rng) -> Self {
        Self {
            stem,
            attachment,
            side: if rng.gen_bool(0.5) { 1.0 } else { -1.0 },
            size: 0.0,
            max_size: (30.0 + rng.gen::<f32>() * 30.0) * scale,
            angle: (rng.gen::<f32>() - 0.5) * 0.8,
            phase: rng.gen::<f32>() * TAU,
            stalk_length: (8.0 + rng.gen::<f32>() * 10.0) * scale,
        }
    }

    pub(crate) fn grow(&mut self, step: f32) {
        if self.size < self.max_size {
            self.size = (self.size + step).min(self.max_size);
        }
    }

    /// How far the leaf has unfolded, 0..=1.
    pub(crate) fn maturity(&self) -> f32 {
        if self.max_size <= 0.0 {
            return 0.0;
        }
        (self.size / self.max_size).clamp(0.0, 1.0)
    }
}

pub(crate) struct Flower {
    pub(crate) origin: Point,
    pub(crate) type_key: String,
    pub(crate) color_key: String,
    pub(crate) species: Option<Species>,
    pub(crate) palette: Palette,
    pub(crate) stems: Vec<Stem>,
    pub(crate) leaves: Vec<Leaf>,
    pub(crate) petals: Vec<Petal>,
    pub(crate) bloom_progress: f32,
    pub(crate) phase: GrowthPhase,
    pub(crate) bloom_cache: Option<BloomCache>,
    pub(crate) sway_phase: f32,
    pub(crate) sway_rate: f32,
    /// Global scale factor at the time the flower was planted.
    pub(crate) scale: f32,
    pub(crate) age: u64,
    rng: StdRng,
}

impl Flower {
    pub(crate) fn new(
        origin: Point,
        type_key: &str,
        color_key: &str,
        stems: Vec<Stem>,
        scale: f32,
        mut rng: StdRng,
    ) -> Result<Self, FlowerError> {
        if stems.is_empty() {
            return Err(FlowerError::NoStems);
        }
        for (index, s) in stems.iter().enumerate() {
            let target_ok = s.target_length.is_finite() && s.target_length >= 0.0;
            let rate_ok = s.growth_rate.is_finite() && s.growth_rate > 0.0;
            if !target_ok || !rate_ok || s.path.is_empty() {
                return Err(FlowerError::InvalidStem {
                    index,
                    target_length: s.target_length,
                    growth_rate: s.growth_rate,
                });
            }
        }

        let sway_phase = rng.gen::<f32>() * TAU;
        let sway_rate = 0.005 + rng.gen::<f32>() * 0.005;

        Ok(Self {
            origin,
            type_key: type_key.to_string(),
            color_key: color_key.to_string(),
            species: Species::from_key(type_key),
            palette: palette::resolve(type_key, color_key),
            stems,
            leaves: Vec::new(),
            petals: Vec::new(),
            bloom_progress: 0.0,
            phase: GrowthPhase::Stem,
            bloom_cache: None,
            sway_phase,
            sway_rate,
            scale,
            age: 0,
            rng,
        })
    }

    /// Plants a flower whose stems rise from `ground_y` toward `origin`.
    pub(crate) fn sprout(
        origin: Point,
        ground_y: f32,
        type_key: &str,
        color_key: &str,
        scale: f32,
        mut rng: StdRng,
    ) -> Result<Self, FlowerError> {
        let count = species::stem_count_for(Species::from_key(type_key));
        let base = Point::new(origin.x, ground_y);
        let height = ground_y - origin.y;
        let stems = (0..count)
            .map(|_| Stem::sprout(base, height, scale, &mut rng))
            .collect();
        Self::new(origin, type_key, color_key, stems, scale, rng)
    }

    pub(crate) fn cache_baked(&self) -> bool {
        self.bloom_cache.is_some()
    }

    pub(crate) fn advance(&mut self, ctx: &mut FrameContext<'_>) {
        self.age += 1;

        match self.phase {
            GrowthPhase::Stem => self.grow_stems(ctx),
            GrowthPhase::Bud | GrowthPhase::Bloom => self.open_bloom(ctx),
        }

        for leaf in &mut self.leaves {
            leaf.grow(ctx.rules.leaf_growth);
        }
    }

    fn grow_stems(&mut self, ctx: &mut FrameContext<'_>) {
        let rules = ctx.rules;
        let mut all_grown = true;

        for i in 0..self.stems.len() {
            let stem = &mut self.stems[i];
            if stem.is_grown() {
                continue;
            }
            all_grown = false;

            let tip = stem.grow(rules.stem_wobble, &mut self.rng);
            let segments = stem.segments;
            let attachment = stem.path.len() - 1;

            if self.rng.gen::<f32>() < rules.particle_chance {
                let mote = Particle::spawn(tip, ctx.particle_scale, &mut self.rng);
                ctx.particles.emit(mote);
            }
            if self.rng.gen::<f32>() < rules.leaf_chance && segments > rules.leaf_min_segments {
                let leaf = Leaf::sprout(i, attachment, self.scale, &mut self.rng);
                self.leaves.push(leaf);
            }
        }

        if all_grown {
            self.phase = GrowthPhase::Bud;
            self.petals = bloom::generate(self.species, self.scale, &mut self.rng);
            debug!(
                flower = %self.type_key,
                color = %self.color_key,
                x = self.origin.x,
                y = self.origin.y,
                age = self.age,
                petals = self.petals.len(),
                "bud formed"
            );
        }
    }

    fn open_bloom(&mut self, ctx: &mut FrameContext<'_>) {
        self.bloom_progress = (self.bloom_progress + ctx.rules.bloom_rate).clamp(0.0, 1.0);

        if self.bloom_progress >= 1.0 {
            self.phase = GrowthPhase::Bloom;
            if self.bloom_cache.is_none() {
                let baked = cache::bake(&self.petals, &self.palette, self.scale, ctx.raster_density);
                let (width, height) = baked.dimensions();
                debug!(flower = %self.type_key, age = self.age, width, height, "bloom baked");
                self.bloom_cache = Some(baked);
            }
        }

        if self.cache_baked() {
            return;
        }

        let p = self.bloom_progress;
        for petal in &mut self.petals {
            let target = petal.base_max_size * (0.2 + p * 0.8);
            if petal.size < target {
                petal.size += (target - petal.size) * ctx.rules.petal_ease;
            }
            petal.angle_offset =
                (p * std::f32::consts::PI - petal.layer as f32 * 0.2).sin() * 0.2;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn straight_stem(target: f32, rate: f32) -> Stem {
        Stem::new(Point::new(100.0, 400.0), -FRAC_PI_2, target, rate, 5.0)
    }

    fn flower(kind: &str, stems: Vec<Stem>, seed: u64) -> Flower {
        Flower::new(
            Point::new(100.0, 100.0),
            kind,
            "red",
            stems,
            1.0,
            StdRng::seed_from_u64(seed),
        )
        .unwrap()
    }

    struct Rig {
        rules: GrowthRules,
        particles: ParticleSystem,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                rules: GrowthRules::default(),
                particles: ParticleSystem::new(50),
            }
        }

        fn step(&mut self, f: &mut Flower) {
            self.particles.update();
            let mut ctx = FrameContext {
                rules: &self.rules,
                particles: &mut self.particles,
                particle_scale: 1.0,
                raster_density: 0.25,
            };
            f.advance(&mut ctx);
        }
    }

    #[test]
    fn rejects_a_stemless_flower() {
        let err = Flower::new(
            Point::default(),
            "rose",
            "red",
            Vec::new(),
            1.0,
            StdRng::seed_from_u64(1),
        )
        .err();
        assert_eq!(err, Some(FlowerError::NoStems));
    }

    #[test]
    fn rejects_stems_that_cannot_finish() {
        let stems = vec![straight_stem(50.0, 5.0), straight_stem(50.0, 0.0)];
        let err = Flower::new(
            Point::default(),
            "rose",
            "red",
            stems,
            1.0,
            StdRng::seed_from_u64(1),
        )
        .err();
        assert!(matches!(err, Some(FlowerError::InvalidStem { index: 1, .. })));
    }

    #[test]
    fn zero_length_rose_buds_on_first_frame() {
        let mut rig = Rig::new();
        let mut f = flower("rose", vec![straight_stem(0.0, 2.0)], 3);
        rig.step(&mut f);
        assert_eq!(f.phase, GrowthPhase::Bud);
        assert_eq!(f.petals.len(), 8 + 7 + 6 + 5 + 3);
        assert_eq!(f.stems[0].path.len(), 1);
        assert_eq!(f.bloom_progress, 0.0);
    }

    #[test]
    fn fifty_unit_stem_timeline() {
        let mut rig = Rig::new();
        rig.rules.stem_wobble = 0.0;
        let mut f = flower("tulip", vec![straight_stem(50.0, 5.0)], 9);

        for frame in 1..=200 {
            rig.step(&mut f);
            match frame {
                1..=10 => assert_eq!(f.phase, GrowthPhase::Stem, "frame {frame}"),
                11..=110 => assert_eq!(f.phase, GrowthPhase::Bud, "frame {frame}"),
                n if n >= 112 => assert_eq!(f.phase, GrowthPhase::Bloom, "frame {frame}"),
                _ => {}
            }
            if frame == 10 {
                assert!(f.stems[0].is_grown());
                assert_eq!(f.stems[0].path.len(), 11);
            }
        }
        assert!(f.cache_baked());
        assert_eq!(f.bloom_progress, 1.0);
    }

    #[test]
    fn every_stem_must_finish_before_budding() {
        let mut rig = Rig::new();
        rig.rules.stem_wobble = 0.0;
        let mut f = flower(
            "lavender",
            vec![straight_stem(10.0, 5.0), straight_stem(30.0, 5.0)],
            4,
        );
        for _ in 0..6 {
            rig.step(&mut f);
            assert_eq!(f.phase, GrowthPhase::Stem);
            assert!(f.petals.is_empty());
        }
        rig.step(&mut f);
        assert_eq!(f.phase, GrowthPhase::Bud);
        assert_eq!(f.stems[0].path.len(), 3);
        assert_eq!(f.stems[1].path.len(), 7);
    }

    #[test]
    fn drifting_stems_grow_until_the_tip_reaches_target() {
        for (seed, wobble) in [(7u64, 1.5f32), (1, 0.8), (2, 0.8), (3, 0.3)] {
            let mut rig = Rig::new();
            rig.rules.stem_wobble = wobble;
            let mut f = flower("tulip", vec![straight_stem(50.0, 5.0)], seed);

            let mut frames = 0;
            while f.phase == GrowthPhase::Stem {
                let before = f.stems[0].base().distance(f.stems[0].tip());
                rig.step(&mut f);
                frames += 1;
                assert!(frames < 5000, "seed {seed}: stem never finished");
                if f.phase == GrowthPhase::Stem {
                    assert!(before < 50.0);
                }
            }

            let stem = &f.stems[0];
            let reach = stem.base().distance(stem.tip());
            assert!(reach >= 50.0, "seed {seed}: budded {reach} from the ground");
            // a bent path needs more than the ten straight segments
            assert!(stem.segments > 10, "seed {seed}: {} segments", stem.segments);
            assert_eq!(stem.path.len() as u32, stem.segments + 1);
        }
    }

    #[test]
    fn lifecycle_invariants_hold() {
        let mut rig = Rig::new();
        for seed in 0..12u64 {
            let mut f = Flower::sprout(
                Point::new(200.0, 220.0),
                300.0,
                if seed % 2 == 0 { "rose" } else { "lavender" },
                "pink",
                1.0,
                StdRng::seed_from_u64(seed),
            )
            .unwrap();

            let mut last_phase = f.phase;
            let mut last_progress = 0.0;
            let mut frozen: Option<Vec<(usize, f32, f32)>> = None;
            let mut baked_sizes: Option<Vec<f32>> = None;
            let mut cache_ptr: Option<*const crate::surface::Rgba> = None;
            let mut leaf_sizes: Vec<f32> = Vec::new();

            for _ in 0..400 {
                rig.step(&mut f);

                assert!(f.phase >= last_phase);
                if last_phase == GrowthPhase::Stem {
                    assert_ne!(f.phase, GrowthPhase::Bloom);
                }
                last_phase = f.phase;

                assert!(f.bloom_progress >= last_progress);
                assert!((0.0..=1.0).contains(&f.bloom_progress));
                if f.phase == GrowthPhase::Stem {
                    assert_eq!(f.bloom_progress, 0.0);
                }
                last_progress = f.bloom_progress;

                if f.phase != GrowthPhase::Stem {
                    let shape: Vec<_> = f.petals.iter().map(|p| (p.layer, p.radius, p.curve)).collect();
                    match &frozen {
                        Some(prev) => assert_eq!(prev, &shape),
                        None => frozen = Some(shape),
                    }
                }

                assert_eq!(f.cache_baked(), f.phase == GrowthPhase::Bloom);
                if let Some(cache) = &f.bloom_cache {
                    let ptr = cache.raster.px.as_ptr();
                    assert_eq!(*cache_ptr.get_or_insert(ptr), ptr);
                    let sizes: Vec<f32> = f.petals.iter().map(|p| p.size).collect();
                    assert_eq!(baked_sizes.get_or_insert(sizes.clone()), &sizes);
                }

                assert!(f.leaves.len() >= leaf_sizes.len());
                for (i, leaf) in f.leaves.iter().enumerate() {
                    if let Some(prev) = leaf_sizes.get(i) {
                        assert!(leaf.size >= *prev);
                    }
                    assert!(leaf.size <= leaf.max_size);
                    assert!(leaf.stem < f.stems.len());
                    assert!(leaf.attachment < f.stems[leaf.stem].path.len());
                }
                leaf_sizes = f.leaves.iter().map(|l| l.size).collect();
            }
            assert_eq!(f.phase, GrowthPhase::Bloom, "seed {seed}");
        }
    }

    #[test]
    fn petals_ease_toward_their_target() {
        let mut rig = Rig::new();
        let mut f = flower("rose", vec![straight_stem(0.0, 1.0)], 21);
        rig.step(&mut f);
        rig.step(&mut f);
        // one bud frame: progress 0.01, each petal moved 10% toward its target
        for p in &f.petals {
            let target = p.base_max_size * (0.2 + 0.01 * 0.8);
            assert!((p.size - target * 0.1).abs() < 1e-4);
            let expected = (0.01 * std::f32::consts::PI - p.layer as f32 * 0.2).sin() * 0.2;
            assert!((p.angle_offset - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn leaves_grow_to_their_limit() {
        let mut leaf = Leaf {
            stem: 0,
            attachment: 0,
            side: 1.0,
            size: 0.0,
            max_size: 1.2,
            angle: 0.0,
            phase: 0.0,
            stalk_length: 8.0,
        };
        leaf.grow(0.5);
        leaf.grow(0.5);
        leaf.grow(0.5);
        assert_eq!(leaf.size, 1.2);
        assert_eq!(leaf.maturity(), 1.0);
        leaf.grow(0.5);
        assert_eq!(leaf.size, 1.2);
    }

    #[test]
    fn stems_emit_motes() {
        let mut rig = Rig::new();
        rig.rules.particle_chance = 1.0;
        let mut f = flower("rose", vec![straight_stem(1000.0, 1.0)], 2);
        for _ in 0..5 {
            f.advance(&mut FrameContext {
                rules: &rig.rules,
                particles: &mut rig.particles,
                particle_scale: 1.0,
                raster_density: 0.25,
            });
        }
        assert_eq!(rig.particles.len(), 5);
    }
}
