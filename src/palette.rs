use crate::surface::Rgba;

/// Three-stop colour ramp used for petal shading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Palette {
    pub(crate) light: Rgba,
    pub(crate) main: Rgba,
    pub(crate) dark: Rgba,
}

const fn ramp(light: u32, main: u32, dark: u32) -> Palette {
    Palette {
        light: Rgba::hex(light),
        main: Rgba::hex(main),
        dark: Rgba::hex(dark),
    }
}

pub(crate) const DEFAULT_KEY: &str = "red";

// Keyed by colour name or by species; a species entry wins over the
// requested colour.
const TABLE: &[(&str, Palette)] = &[
    ("red", ramp(0xff4d4d, 0xff0000, 0xa00000)),
    ("pink", ramp(0xff99cc, 0xff3399, 0xcc0066)),
    ("white", ramp(0xffffff, 0xffffff, 0xffdce5)),
    ("sunflower", ramp(0xffffbf, 0xffeb3b, 0xfbc02d)),
    ("lily", ramp(0xf3e5f5, 0xe1bee7, 0xba68c8)),
    ("tulip", ramp(0xff9e9e, 0xff5252, 0xd32f2f)),
    ("cherry_blossom", ramp(0xffffff, 0xffdbec, 0xf8bbd0)),
    ("lavender", ramp(0xe8eaff, 0xc5cae9, 0x9fa8da)),
    ("daisy", ramp(0xffffff, 0xffffef, 0xfff9c4)),
    ("hibiscus", ramp(0xff80ab, 0xff4081, 0xf50057)),
    ("orchid", ramp(0xf8bbd0, 0xf06292, 0xe91e63)),
    ("cactus", ramp(0xe8f5e9, 0x81c784, 0x4caf50)),
    ("leaf", ramp(0xffccbc, 0xff8a65, 0xe64a19)),
    ("clover", ramp(0xc8e6c9, 0x66bb6a, 0x388e3c)),
];

/// Colour keys a user can pick for species that offer a choice.
pub(crate) const COLOR_CHOICES: &[&str] = &["red", "pink", "white"];

pub(crate) fn lookup(key: &str) -> Option<Palette> {
    TABLE.iter().find(|(k, _)| *k == key).map(|(_, p)| *p)
}

/// Species palette, else colour palette, else red. Never fails.
pub(crate) fn resolve(type_key: &str, color_key: &str) -> Palette {
    lookup(type_key)
        .or_else(|| lookup(color_key))
        .unwrap_or(ramp(0xff4d4d, 0xff0000, 0xa00000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn species_palette_beats_colour() {
        let p = resolve("sunflower", "pink");
        assert_eq!(p.main, Rgba::hex(0xffeb3b));
    }

    #[test]
    fn rose_takes_the_requested_colour() {
        assert_eq!(resolve("rose", "pink"), lookup("pink").unwrap());
        assert_eq!(resolve("rose", "white"), lookup("white").unwrap());
    }

    #[test]
    fn unknown_species_falls_back_to_colour_then_red() {
        assert_eq!(resolve("triffid", "pink"), lookup("pink").unwrap());
        assert_eq!(resolve("triffid", "chartreuse"), lookup(DEFAULT_KEY).unwrap());
        assert_eq!(resolve("", ""), lookup(DEFAULT_KEY).unwrap());
    }

    #[test]
    fn every_choice_has_a_ramp() {
        for key in COLOR_CHOICES {
            assert!(lookup(key).is_some(), "{key}");
        }
    }
}
