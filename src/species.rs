/// Known flower kinds. Unknown keys are carried as `None` on the flower and
/// use every fallback (one stem, default bloom ring, colour palette).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Species {
    Rose,
    Sunflower,
    Lily,
    Tulip,
    CherryBlossom,
    Lavender,
    Daisy,
    Hibiscus,
    Orchid,
    Cactus,
    Maple,
    Clover,
}

pub(crate) struct CatalogEntry {
    pub(crate) species: Species,
    pub(crate) key: &'static str,
    pub(crate) name: &'static str,
    pub(crate) has_colors: bool,
}

pub(crate) const CATALOG: &[CatalogEntry] = &[
    entry(Species::Rose, "rose", "Rose", true),
    entry(Species::Sunflower, "sunflower", "Sunflower", false),
    entry(Species::Lily, "lily", "Lily", false),
    entry(Species::Tulip, "tulip", "Tulip", false),
    entry(Species::CherryBlossom, "cherry_blossom", "Sakura", false),
    entry(Species::Lavender, "lavender", "Lavender", false),
    entry(Species::Daisy, "daisy", "Daisy", false),
    entry(Species::Hibiscus, "hibiscus", "Hibiscus", false),
    entry(Species::Orchid, "orchid", "Orchid", false),
    entry(Species::Cactus, "cactus", "Cactus", false),
    entry(Species::Maple, "leaf", "Maple", false),
    entry(Species::Clover, "clover", "Clover", false),
];

const fn entry(species: Species, key: &'static str, name: &'static str, has_colors: bool) -> CatalogEntry {
    CatalogEntry {
        species,
        key,
        name,
        has_colors,
    }
}

impl Species {
    pub(crate) fn from_key(key: &str) -> Option<Species> {
        CATALOG.iter().find(|e| e.key == key).map(|e| e.species)
    }

    pub(crate) fn entry(self) -> &'static CatalogEntry {
        // every variant has exactly one catalog row
        CATALOG
            .iter()
            .find(|e| e.species == self)
            .unwrap_or(&CATALOG[0])
    }

    pub(crate) fn key(self) -> &'static str {
        self.entry().key
    }

    pub(crate) fn name(self) -> &'static str {
        self.entry().name
    }

    pub(crate) fn has_colors(self) -> bool {
        self.entry().has_colors
    }

    pub(crate) fn stem_count(self) -> usize {
        match self {
            Species::Lavender => 3,
            _ => 1,
        }
    }

    pub(crate) fn next(self) -> Species {
        let i = CATALOG.iter().position(|e| e.species == self).unwrap_or(0);
        CATALOG[(i + 1) % CATALOG.len()].species
    }
}

pub(crate) fn stem_count_for(species: Option<Species>) -> usize {
    species.map_or(1, Species::stem_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_through_the_catalog() {
        for e in CATALOG {
            assert_eq!(Species::from_key(e.key), Some(e.species));
            assert_eq!(e.species.key(), e.key);
        }
        assert_eq!(Species::from_key("leaf"), Some(Species::Maple));
        assert_eq!(Species::Maple.name(), "Maple");
        assert_eq!(Species::from_key("triffid"), None);
    }

    #[test]
    fn only_rose_offers_colours() {
        let coloured: Vec<_> = CATALOG.iter().filter(|e| e.has_colors).collect();
        assert_eq!(coloured.len(), 1);
        assert_eq!(coloured[0].species, Species::Rose);
    }

    #[test]
    fn lavender_grows_three_stalks() {
        assert_eq!(stem_count_for(Some(Species::Lavender)), 3);
        assert_eq!(stem_count_for(Some(Species::Rose)), 1);
        assert_eq!(stem_count_for(None), 1);
    }

    #[test]
    fn next_cycles_the_whole_catalog() {
        let mut s = Species::Rose;
        for _ in 0..CATALOG.len() {
            s = s.next();
        }
        assert_eq!(s, Species::Rose);
        assert_eq!(Species::Clover.next(), Species::Rose);
    }
}
