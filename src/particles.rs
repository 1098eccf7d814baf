use crate::surface::{Point, Rgba};
use rand::Rng;
use std::collections::VecDeque;

pub(crate) const DEFAULT_CAP: usize = 50;
const LIFE_DECAY: f32 = 0.015;

const PINK: Rgba = Rgba::hex(0xff75a0);

#[derive(Clone, Debug)]
pub(crate) struct Particle {
    pub(crate) pos: Point,
    pub(crate) vel: Point,
    pub(crate) life: f32,
    pub(crate) color: Rgba,
    pub(crate) size: f32,
}

impl Particle {
    pub(crate) fn spawn(at: Point, scale: f32, rng: &mut impl Rng) -> Self {
        let vx = (rng.gen::<f32>() - 0.5) * 3.0 * scale;
        let vy = -(rng.gen::<f32>() * 3.0 + 1.0) * scale;
        let color = if rng.gen_bool(0.5) { PINK } else { Rgba::WHITE };
        let size = (rng.gen::<f32>() * 3.0 + 1.0) * scale;
        Self {
            pos: at,
            vel: Point::new(vx, vy),
            life: 1.0,
            color,
            size,
        }
    }

    fn step(&mut self) {
        self.pos.x += self.vel.x;
        self.pos.y += self.vel.y;
        self.life -= LIFE_DECAY;
    }
}

/// Ambient motes, oldest at the front. The cap is enforced on every emit by
/// dropping from the front.
pub(crate) struct ParticleSystem {
    items: VecDeque<Particle>,
    cap: usize,
}

impl ParticleSystem {
    pub(crate) fn new(cap: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(cap),
            cap,
        }
    }

    pub(crate) fn emit(&mut self, particle: Particle) {
        if self.cap == 0 {
            return;
        }
        self.items.push_back(particle);
        while self.items.len() > self.cap {
            self.items.pop_front();
        }
    }

    pub(crate) fn update(&mut self) {
        for p in &mut self.items {
            p.step();
        }
        self.items.retain(|p| p.life > 0.0);
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.items.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }
}
