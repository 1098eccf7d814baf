//! Petal layouts. A species maps to a layer schedule; unlisted species get a
//! single even ring.

use crate::species::Species;
use rand::Rng;
use std::f32::consts::TAU;

/// Rotation added per ring so successive rings do not line up radially.
const RING_TWIST: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Layer {
    pub(crate) count: usize,
    pub(crate) size: f32,
    pub(crate) radius: f32,
    pub(crate) curve: f32,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct LayerSchedule {
    pub(crate) layers: &'static [Layer],
    /// Upper bound of the random extra petal size.
    pub(crate) size_jitter: f32,
    /// Full width of the random vertical offset.
    pub(crate) v_jitter: f32,
}

impl LayerSchedule {
    pub(crate) fn petal_count(&self) -> usize {
        self.layers.iter().map(|l| l.count).sum()
    }
}

const fn layer(count: usize, size: f32, radius: f32, curve: f32) -> Layer {
    Layer {
        count,
        size,
        radius,
        curve,
    }
}

pub(crate) const ROSE: LayerSchedule = LayerSchedule {
    layers: &[
        layer(8, 50.0, 2.0, 0.8),
        layer(7, 45.0, 5.0, 0.9),
        layer(6, 38.0, 8.0, 1.0),
        layer(5, 30.0, 10.0, 1.1),
        layer(3, 20.0, 12.0, 1.2),
    ],
    size_jitter: 10.0,
    v_jitter: 5.0,
};

pub(crate) const SINGLE_RING: LayerSchedule = LayerSchedule {
    layers: &[layer(12, 40.0, 5.0, 1.0)],
    size_jitter: 10.0,
    v_jitter: 0.0,
};

const SCHEDULES: &[(Species, &LayerSchedule)] = &[(Species::Rose, &ROSE)];

pub(crate) fn schedule_for(species: Option<Species>) -> &'static LayerSchedule {
    species
        .and_then(|s| SCHEDULES.iter().find(|(k, _)| *k == s))
        .map_or(&SINGLE_RING, |(_, sched)| *sched)
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Petal {
    pub(crate) angle: f32,
    pub(crate) angle_offset: f32,
    pub(crate) size: f32,
    pub(crate) base_max_size: f32,
    pub(crate) layer: usize,
    pub(crate) radius: f32,
    pub(crate) curve: f32,
    pub(crate) v_offset: f32,
}

/// All petals of a bloom, ring by ring, each starting at size zero.
pub(crate) fn generate(species: Option<Species>, scale: f32, rng: &mut impl Rng) -> Vec<Petal> {
    let sched = schedule_for(species);
    let mut petals = Vec::with_capacity(sched.petal_count());

    for (l_idx, l) in sched.layers.iter().enumerate() {
        for i in 0..l.count {
            let angle = (i as f32 / l.count as f32) * TAU + l_idx as f32 * RING_TWIST;
            let base_max_size = (l.size + rng.gen::<f32>() * sched.size_jitter) * scale;
            let v_offset = (rng.gen::<f32>() - 0.5) * sched.v_jitter;
            petals.push(Petal {
                angle,
                angle_offset: 0.0,
                size: 0.0,
                base_max_size,
                layer: l_idx,
                radius: l.radius,
                curve: l.curve,
                v_offset,
            });
        }
    }
    petals
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn rose_has_five_rings() {
        let mut rng = StdRng::seed_from_u64(11);
        let petals = generate(Some(Species::Rose), 1.0, &mut rng);
        assert_eq!(petals.len(), 29);

        let per_layer: Vec<usize> = (0..5)
            .map(|l| petals.iter().filter(|p| p.layer == l).count())
            .collect();
        assert_eq!(per_layer, vec![8, 7, 6, 5, 3]);

        for p in &petals {
            assert_eq!(p.size, 0.0);
            assert_eq!(p.angle_offset, 0.0);
            let l = ROSE.layers[p.layer];
            assert!(p.base_max_size >= l.size && p.base_max_size <= l.size + 10.0);
            assert_eq!(p.radius, l.radius);
            assert_eq!(p.curve, l.curve);
            assert!(p.v_offset.abs() <= 2.5);
        }
    }

    #[test]
    fn rings_are_twisted() {
        let mut rng = StdRng::seed_from_u64(11);
        let petals = generate(Some(Species::Rose), 1.0, &mut rng);
        // first petal of each ring
        let firsts: Vec<f32> = [0, 8, 15, 21, 26].iter().map(|&i| petals[i].angle).collect();
        for (l, a) in firsts.iter().enumerate() {
            assert!((a - l as f32 * 0.5).abs() < 1e-6);
        }
        let step = TAU / 7.0;
        assert!((petals[9].angle - (step + 0.5)).abs() < 1e-5);
    }

    #[test]
    fn unlisted_species_get_a_single_ring() {
        let mut rng = StdRng::seed_from_u64(5);
        for species in [None, Some(Species::Tulip), Some(Species::Lavender)] {
            let petals = generate(species, 0.6, &mut rng);
            assert_eq!(petals.len(), 12);
            for (i, p) in petals.iter().enumerate() {
                assert_eq!(p.layer, 0);
                assert_eq!(p.v_offset, 0.0);
                assert!((p.angle - i as f32 / 12.0 * TAU).abs() < 1e-6);
                assert!(p.base_max_size >= 40.0 * 0.6 && p.base_max_size <= 50.0 * 0.6);
            }
        }
    }

    #[test]
    fn same_seed_same_bloom() {
        let a = generate(Some(Species::Rose), 1.0, &mut StdRng::seed_from_u64(99));
        let b = generate(Some(Species::Rose), 1.0, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }
}
