use crate::engine::Selection;
use crate::palette;
use crate::species::Species;
use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub(crate) const BIN_NAME: &str = "garden-braille";

/// Grow procedural flowers in the terminal. Click to plant.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = BIN_NAME, version)]
pub(crate) struct Args {
    /// flower to plant (rose, sunflower, lily, tulip, cherry_blossom, lavender, ...)
    #[arg(long)]
    pub(crate) flower: Option<String>,

    /// petal colour for flowers that offer a choice (red, pink, white)
    #[arg(long)]
    pub(crate) color: Option<String>,

    /// frame rate cap
    #[arg(long)]
    pub(crate) fps: Option<u32>,

    /// seed for reproducible gardens
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// logical units per braille dot
    #[arg(long, default_value_t = 4.0)]
    pub(crate) zoom: f32,

    /// maximum number of live particles
    #[arg(long, default_value_t = crate::particles::DEFAULT_CAP)]
    pub(crate) particle_cap: usize,

    /// draw in monochrome
    #[arg(long)]
    pub(crate) no_color: bool,

    /// where to write the log (defaults to the data directory)
    #[arg(long)]
    pub(crate) log_file: Option<PathBuf>,

    /// log at debug level
    #[arg(long, short)]
    pub(crate) verbose: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) last_flower: String,
    pub(crate) last_color: String,
    pub(crate) fps_cap: u32,
    pub(crate) enable_color: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            last_flower: Species::Rose.key().to_string(),
            last_color: palette::DEFAULT_KEY.to_string(),
            fps_cap: 30,
            enable_color: true,
        }
    }
}

impl Settings {
    /// Applies command-line overrides on top of remembered settings.
    pub(crate) fn merged_with(&self, args: &Args) -> Settings {
        let mut s = self.clone();
        if let Some(fps) = args.fps {
            s.fps_cap = fps;
        }
        if args.no_color {
            s.enable_color = false;
        }
        let sel = initial_selection(args, self);
        s.last_flower = sel.flower;
        s.last_color = sel.color;
        s
    }

    pub(crate) fn remember(&mut self, sel: &Selection) {
        self.last_flower = sel.flower.clone();
        self.last_color = sel.color.clone();
    }
}

/// A flower named on the command line starts with `--color` or red; without
/// one the remembered pair is used.
pub(crate) fn initial_selection(args: &Args, settings: &Settings) -> Selection {
    match &args.flower {
        Some(flower) => Selection {
            flower: flower.clone(),
            color: args
                .color
                .clone()
                .unwrap_or_else(|| palette::DEFAULT_KEY.to_string()),
        },
        None => Selection {
            flower: settings.last_flower.clone(),
            color: args.color.clone().unwrap_or_else(|| settings.last_color.clone()),
        },
    }
}

/// Command line that reproduces `sel`. The colour is only included for
/// species that offer one.
pub(crate) fn share_line(sel: &Selection) -> String {
    let mut line = format!("{BIN_NAME} --flower {}", sel.flower);
    if Species::from_key(&sel.flower).is_some_and(Species::has_colors) {
        line.push_str(" --color ");
        line.push_str(&sel.color);
    }
    line
}

pub(crate) fn next_flower(sel: &Selection) -> Selection {
    let next = Species::from_key(&sel.flower).map_or(Species::Rose, Species::next);
    Selection {
        flower: next.key().to_string(),
        color: sel.color.clone(),
    }
}

pub(crate) fn next_color(sel: &Selection) -> Selection {
    let choices = palette::COLOR_CHOICES;
    let pos = choices.iter().position(|c| *c == sel.color);
    let next = pos.map_or(0, |i| (i + 1) % choices.len());
    Selection {
        flower: sel.flower.clone(),
        color: choices[next].to_string(),
    }
}

pub(crate) struct Paths {
    pub(crate) settings_path: PathBuf,
    pub(crate) log_path: PathBuf,
}

pub(crate) fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "garden-braille", "GardenBraille")
        .context("could not resolve project directories")?;
    let dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&dir).ok();
    Ok(Paths {
        settings_path: dir.join("settings.json"),
        log_path: dir.join("garden.log"),
    })
}

pub(crate) fn load_settings(path: &Path) -> Settings {
    if let Ok(s) = fs::read_to_string(path) {
        if let Ok(v) = serde_json::from_str::<Settings>(&s) {
            return v;
        }
    }
    Settings::default()
}

pub(crate) fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
    atomic_rename(&tmp, path)?;
    Ok(())
}

fn atomic_rename(from: &Path, to: &Path) -> Result<()> {
    if to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to).with_context(|| format!("replacing {}", to.display()))?;
    Ok(())
}
