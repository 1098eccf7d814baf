use crate::config::{
    self, load_settings, project_paths, save_settings_atomic, Args, Paths, Settings,
};
use crate::engine::{Engine, EngineConfig, Selection};
use crate::input::{collect_input_nonblocking, map_event_to_action, Action};
use crate::logging;
use crate::species::Species;
use crate::surface::{Point, Surface};
use crate::term::{canvas_to_cells, draw_text, Cell, Terminal, DOTS_X, DOTS_Y};
use clap::Parser;
use crossterm::style::Color;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

const STATUS_ROWS: u16 = 1;
const NOTICE_TIME: Duration = Duration::from_secs(6);

const HELP: &str = "Click anywhere to plant the selected flower.\n\n\
    space   pause / resume\n\
    c       clear the garden\n\
    tab n   next flower\n\
    k       next colour (roses)\n\
    l       show the command line for this garden\n\
    h       toggle this help\n\
    q esc   quit";

pub(crate) struct App {
    settings: Settings,
    paths: Paths,
    zoom: f32,
    term: Terminal,
    engine: Engine,
    show_help: bool,
    notice: Option<(String, Instant)>,
    should_quit: bool,
}

impl App {
    fn init(args: Args) -> anyhow::Result<Self> {
        let paths = project_paths()?;
        let log_path = args.log_file.clone().unwrap_or_else(|| paths.log_path.clone());
        logging::init(&log_path, args.verbose)?;

        let settings = load_settings(&paths.settings_path).merged_with(&args);
        let zoom = if args.zoom.is_finite() && args.zoom > 0.0 {
            args.zoom
        } else {
            4.0
        };
        let seed = args.seed.unwrap_or_else(clock_seed);

        let term = Terminal::begin(STATUS_ROWS)?;
        let (w, h) = logical_size(&term, zoom);
        let mut engine = Engine::new(
            EngineConfig {
                particle_cap: args.particle_cap,
                raster_density: 1.0 / zoom,
                seed,
                ..EngineConfig::default()
            },
            w,
            h,
        );
        engine.start(&settings.last_flower, &settings.last_color);
        info!(seed, zoom, width = w, height = h, "session started");

        Ok(Self {
            settings,
            paths,
            zoom,
            term,
            engine,
            show_help: false,
            notice: None,
            should_quit: false,
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let fps = self.settings.fps_cap.clamp(10, 240);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);
        let mut last_frame = Instant::now();

        while !self.should_quit {
            let frame_start = Instant::now();
            self.check_resize()?;

            for ev in collect_input_nonblocking(frame_dt)? {
                if let Some(action) = map_event_to_action(ev) {
                    self.apply(action)?;
                }
            }

            let now = Instant::now();
            let dt = now.saturating_duration_since(last_frame).as_secs_f32();
            last_frame = now;
            self.engine.advance_frame(dt);

            self.render_frame()?;
            spin_sleep(frame_dt, frame_start);
        }
        Ok(())
    }

    fn apply(&mut self, action: Action) -> anyhow::Result<()> {
        match action {
            Action::Quit => self.should_quit = true,
            Action::TogglePause => {
                if self.engine.is_running() {
                    self.engine.stop();
                } else {
                    self.engine.resume();
                }
            }
            Action::Restart => {
                let Selection { flower, color } = self.engine.selection().clone();
                self.engine.start(&flower, &color);
            }
            Action::NextFlower => self.reselect(config::next_flower(self.engine.selection())),
            Action::NextColor => self.reselect(config::next_color(self.engine.selection())),
            Action::ShowShareLine => {
                let line = config::share_line(self.engine.selection());
                self.notice = Some((line, Instant::now()));
            }
            Action::HelpToggle => self.show_help = !self.show_help,
            Action::Plant { col, row } => {
                if row < self.term.garden_rows() {
                    let at = cell_to_logical(col, row, self.zoom);
                    self.engine.spawn_selected(at);
                }
            }
            Action::Resized => self.check_resize()?,
        }
        Ok(())
    }

    fn reselect(&mut self, sel: Selection) {
        debug!(flower = %sel.flower, color = %sel.color, "selection changed");
        self.engine.select(&sel.flower, &sel.color);
        self.settings.remember(&sel);
    }

    fn check_resize(&mut self) -> anyhow::Result<()> {
        if self.term.resize_if_needed()? {
            let (w, h) = logical_size(&self.term, self.zoom);
            self.engine.viewport_resized(w, h);
        }
        Ok(())
    }

    fn render_frame(&mut self) -> anyhow::Result<()> {
        self.term.frame.clear();

        let canvas = &mut self.term.canvas;
        canvas.reset_transform();
        canvas.scale(1.0 / self.zoom);
        self.engine.render_frame(canvas);
        canvas.reset_transform();

        canvas_to_cells(&self.term.canvas, &mut self.term.frame, self.settings.enable_color);

        self.draw_status();
        if self.show_help {
            self.draw_center_box("garden-braille", HELP);
        }
        let share = match &self.notice {
            Some((line, since)) if since.elapsed() < NOTICE_TIME => {
                Some(format!("Run this to grow the same flower:\n\n{line}"))
            }
            _ => None,
        };
        match share {
            Some(body) => self.draw_center_box("Share", &body),
            None => self.notice = None,
        }

        self.term.present()?;
        Ok(())
    }

    fn draw_status(&mut self) {
        let sel = self.engine.selection();
        let name = Species::from_key(&sel.flower).map_or(sel.flower.as_str(), |s| s.name());
        let colour = match Species::from_key(&sel.flower) {
            Some(s) if s.has_colors() => format!(" ({})", sel.color),
            _ => String::new(),
        };
        let state = if self.engine.is_running() { "growing" } else { "paused" };
        let status = format!(
            " {name}{colour}  |  flowers: {}  motes: {}  |  {state}  |  h help  q quit",
            self.engine.flowers().len(),
            self.engine.particle_count(),
        );
        let y = self.term.rows.saturating_sub(1);
        draw_text(&mut self.term.frame, 0, y, &status, Color::Grey);
    }

    fn draw_center_box(&mut self, title: &str, body: &str) {
        let w = self.term.cols;
        let h = self.term.rows;

        let bw = 56u16.min(w.saturating_sub(4));
        let bh = (body.lines().count() as u16 + 5).min(h.saturating_sub(2));
        if bw < 4 || bh < 4 {
            return;
        }
        let x0 = (w - bw) / 2;
        let y0 = (h - bh) / 2;

        for y in y0..y0 + bh {
            for x in x0..x0 + bw {
                let top = y == y0;
                let bottom = y == y0 + bh - 1;
                let left = x == x0;
                let right = x == x0 + bw - 1;
                let ch = match (top, bottom, left, right) {
                    (true, _, true, _) => '┌',
                    (true, _, _, true) => '┐',
                    (_, true, true, _) => '└',
                    (_, true, _, true) => '┘',
                    (true, _, _, _) | (_, true, _, _) => '─',
                    (_, _, true, _) | (_, _, _, true) => '│',
                    _ => ' ',
                };
                self.term.frame.set(x, y, Cell::new(ch, Color::White));
            }
        }

        draw_text(&mut self.term.frame, x0 + 2, y0 + 1, title, Color::White);
        let mut yy = y0 + 3;
        for line in body.lines() {
            if yy >= y0 + bh - 1 {
                break;
            }
            let clipped: String = line.chars().take(bw.saturating_sub(4) as usize).collect();
            draw_text(&mut self.term.frame, x0 + 2, yy, &clipped, Color::White);
            yy += 1;
        }
    }

    fn shutdown(&mut self) -> anyhow::Result<()> {
        self.term.end()?;
        self.settings.remember(self.engine.selection());
        save_settings_atomic(&self.paths.settings_path, &self.settings)?;
        info!(
            flowers = self.engine.flowers().len(),
            clock = self.engine.clock(),
            "session ended"
        );
        Ok(())
    }
}

pub(crate) fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut app = App::init(args)?;
    let result = app.run();
    app.shutdown()?;
    result
}

/// Logical size of the garden area: every braille dot spans `zoom` units.
fn logical_size(term: &Terminal, zoom: f32) -> (f32, f32) {
    let w = (term.cols as u32 * DOTS_X) as f32 * zoom;
    let h = (term.garden_rows() as u32 * DOTS_Y) as f32 * zoom;
    (w, h)
}

/// Centre of a terminal cell in logical units.
fn cell_to_logical(col: u16, row: u16, zoom: f32) -> Point {
    let x = (col as u32 * DOTS_X + DOTS_X / 2) as f32 * zoom;
    let y = (row as u32 * DOTS_Y + DOTS_Y / 2) as f32 * zoom;
    Point::new(x, y)
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0xC0FFEE)
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, start: Instant) {
    let end = start + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clicks_land_mid_cell() {
        let p = cell_to_logical(0, 0, 4.0);
        assert_eq!(p, Point::new(4.0, 8.0));
        let p = cell_to_logical(10, 5, 2.0);
        assert_eq!(p, Point::new(42.0, 44.0));
    }
}
