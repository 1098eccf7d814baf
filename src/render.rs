//! Per-frame drawing. Reads flower state, never mutates it.

use crate::bloom::Petal;
use crate::flower::{Flower, GrowthPhase, Leaf, Stem};
use crate::palette::Palette;
use crate::particles::ParticleSystem;
use crate::surface::{stop, Paint, Path, Point, Rect, Rgba, Surface};
use crate::sway;
use std::f32::consts::FRAC_PI_3;

const STEM_BASE: Rgba = Rgba::hex(0x1a3311);
const STEM_TIP: Rgba = Rgba::hex(0x2d5a27);
const LEAF_EDGE: Rgba = Rgba::hex(0x4caf50);
const VEIN: Rgba = Rgba::new(0, 0, 0, 26);

const PETIOLE_WIDTH: f32 = 2.0;
const VEIN_WIDTH: f32 = 1.0;
const RIM_WIDTH: f32 = 1.0;
const GLOW_RADIUS: f32 = 15.0;
const MOTE_HALO: f32 = 2.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PetalFinish {
    Plain,
    /// Thin white outline, used when baking.
    Rimmed,
}

/// Clears `surface` and draws one frame: motes first, then every flower in
/// planting order.
pub(crate) fn render<S: Surface + ?Sized>(
    surface: &mut S,
    flowers: &[Flower],
    particles: &ParticleSystem,
    t: f32,
) {
    surface.clear();
    draw_particles(surface, particles);
    for flower in flowers {
        draw_flower(surface, flower, t);
    }
}

fn draw_particles<S: Surface + ?Sized>(surface: &mut S, particles: &ParticleSystem) {
    for p in particles.iter() {
        let life = p.life.clamp(0.0, 1.0);
        surface.save();
        surface.set_alpha(life * 0.25);
        surface.fill_path(
            &Path::circle(p.pos.x, p.pos.y, p.size * MOTE_HALO),
            &Paint::Solid(p.color),
        );
        surface.set_alpha(life);
        surface.fill_path(&Path::circle(p.pos.x, p.pos.y, p.size), &Paint::Solid(p.color));
        surface.restore();
    }
}

pub(crate) fn draw_flower<S: Surface + ?Sized>(surface: &mut S, flower: &Flower, t: f32) {
    for stem in &flower.stems {
        draw_stem(surface, stem, t, flower.sway_phase);
    }
    for leaf in &flower.leaves {
        draw_leaf(surface, flower, leaf, t);
    }
    if flower.phase != GrowthPhase::Stem {
        draw_bloom(surface, flower, t);
    }
}

fn swayed(stem: &Stem, i: usize, t: f32, sway_phase: f32) -> Option<Point> {
    let p = stem.path.get(i)?;
    let fraction = i as f32 / stem.path.len() as f32;
    Some(Point::new(
        p.x + sway::lateral_offset(t, sway_phase, fraction),
        p.y,
    ))
}

fn draw_stem<S: Surface + ?Sized>(surface: &mut S, stem: &Stem, t: f32, sway_phase: f32) {
    if stem.path.len() < 2 {
        return;
    }
    let mut path = Path::new();
    for i in 0..stem.path.len() {
        let Some(p) = swayed(stem, i, t, sway_phase) else {
            continue;
        };
        if i == 0 {
            path.move_to(p.x, p.y);
        } else {
            path.line_to(p.x, p.y);
        }
    }
    let paint = Paint::Linear {
        from: stem.base(),
        to: stem.tip(),
        stops: vec![stop(0.0, STEM_BASE), stop(1.0, STEM_TIP)],
    };
    surface.stroke_path(&path, &paint, stem.width);
}

fn draw_leaf<S: Surface + ?Sized>(surface: &mut S, flower: &Flower, leaf: &Leaf, t: f32) {
    let Some(stem) = flower.stems.get(leaf.stem) else {
        return;
    };
    let Some(at) = swayed(stem, leaf.attachment, t, flower.sway_phase) else {
        return;
    };
    let size = leaf.size;
    let stalk = leaf.stalk_length * leaf.maturity();

    surface.save();
    surface.translate(at.x, at.y);
    surface.rotate(leaf.side * (FRAC_PI_3 + leaf.angle) + sway::leaf_flutter(t, leaf.phase));

    let mut petiole = Path::new();
    petiole.move_to(0.0, 0.0).line_to(stalk, 0.0);
    surface.stroke_path(&petiole, &Paint::Solid(STEM_TIP), PETIOLE_WIDTH);

    surface.translate(stalk, 0.0);
    if size > 0.0 {
        let mut blade = Path::new();
        blade
            .move_to(0.0, 0.0)
            .cubic_to(size * 0.3, -size * 0.5, size * 0.7, -size * 0.5, size, 0.0)
            .cubic_to(size * 0.7, size * 0.5, size * 0.3, size * 0.5, 0.0, 0.0)
            .close();
        let paint = Paint::Linear {
            from: Point::new(0.0, 0.0),
            to: Point::new(size, 0.0),
            stops: vec![stop(0.0, STEM_TIP), stop(1.0, LEAF_EDGE)],
        };
        surface.fill_path(&blade, &paint);

        let mut vein = Path::new();
        vein.move_to(0.0, 0.0).line_to(size * 0.8, 0.0);
        surface.stroke_path(&vein, &Paint::Solid(VEIN), VEIN_WIDTH);
    }
    surface.restore();
}

fn draw_bloom<S: Surface + ?Sized>(surface: &mut S, flower: &Flower, t: f32) {
    let Some(stem) = flower.stems.first() else {
        return;
    };
    let tip = stem.tip();
    let x = tip.x + sway::bloom_offset(t, flower.sway_phase);

    surface.save();
    surface.translate(x, tip.y);
    surface.rotate(sway::bloom_rotation(t, flower.sway_phase));
    match &flower.bloom_cache {
        Some(cache) => surface.draw_raster(&cache.raster, Rect::centered(cache.extent)),
        None => {
            draw_petals(surface, &flower.petals, &flower.palette, flower.scale, PetalFinish::Plain);
            draw_center_glow(surface);
        }
    }
    surface.restore();
}

fn petal_path(size: f32, curve: f32) -> Path {
    let (s, c) = (size, curve);
    let mut path = Path::new();
    path.move_to(0.0, 0.0)
        .cubic_to(-s * 0.4, s * c, s * 1.4, s * c, s, 0.0)
        .cubic_to(s * 1.4, -s * c, -s * 0.4, -s * c, 0.0, 0.0)
        .close();
    path
}

/// Draws petals around the current origin, outer rings first so inner rings
/// end up on top.
pub(crate) fn draw_petals<S: Surface + ?Sized>(
    surface: &mut S,
    petals: &[Petal],
    palette: &Palette,
    scale: f32,
    finish: PetalFinish,
) {
    let mut order: Vec<&Petal> = petals.iter().collect();
    order.sort_by(|a, b| b.layer.cmp(&a.layer));

    for p in order {
        if p.size <= 0.0 {
            continue;
        }
        surface.save();
        surface.rotate(p.angle + p.angle_offset);
        surface.translate(p.radius * scale, p.v_offset * scale);

        let path = petal_path(p.size, p.curve);
        let paint = Paint::Radial {
            center: Point::new(0.0, 0.0),
            radius: p.size * 1.5,
            stops: vec![
                stop(0.0, palette.light),
                stop(0.4, palette.main),
                stop(1.0, palette.dark),
            ],
        };
        surface.fill_path(&path, &paint);
        if finish == PetalFinish::Rimmed {
            surface.stroke_path(&path, &Paint::Solid(Rgba::WHITE), RIM_WIDTH);
        }
        surface.restore();
    }
}

pub(crate) fn draw_center_glow<S: Surface + ?Sized>(surface: &mut S) {
    let paint = Paint::Radial {
        center: Point::new(0.0, 0.0),
        radius: GLOW_RADIUS,
        stops: vec![
            stop(0.0, Rgba::WHITE.with_alpha(0.6)),
            stop(1.0, Rgba::WHITE.with_alpha(0.0)),
        ],
    };
    surface.fill_path(&Path::circle(0.0, 0.0, GLOW_RADIUS), &paint);
}
