use crate::surface::{Paint, Path, Point, Rect, Rgba, Surface, Transform};

#[derive(Clone, Copy, Debug)]
struct DrawState {
    transform: Transform,
    alpha: f32,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Transform::IDENTITY,
            alpha: 1.0,
        }
    }
}

/// Straight-alpha RGBA raster. Used both as the on-screen framebuffer and as
/// the offscreen target for baked blooms.
#[derive(Clone, Debug)]
pub(crate) struct PixelCanvas {
    pub(crate) w: u32,
    pub(crate) h: u32,
    pub(crate) px: Vec<Rgba>,
    state: DrawState,
    stack: Vec<DrawState>,
}

impl PixelCanvas {
    pub(crate) fn new(w: u32, h: u32) -> Self {
        Self {
            w,
            h,
            px: vec![Rgba::TRANSPARENT; (w as usize) * (h as usize)],
            state: DrawState::default(),
            stack: Vec::new(),
        }
    }

    pub(crate) fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    pub(crate) fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x < self.w && y < self.h {
            Some(self.px[self.idx(x, y)])
        } else {
            None
        }
    }

    pub(crate) fn reset_transform(&mut self) {
        self.state = DrawState::default();
        self.stack.clear();
    }

    fn blend_over(&mut self, x: i32, y: i32, src: Rgba) {
        if x < 0 || y < 0 || src.a == 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.w || y >= self.h {
            return;
        }
        let i = self.idx(x, y);
        let dst = self.px[i];

        let sa = src.a as f32 / 255.0;
        let da = dst.a as f32 / 255.0;

        let out_a = sa + da * (1.0 - sa);
        if out_a <= 1e-6 {
            self.px[i] = Rgba::TRANSPARENT;
            return;
        }

        let blend = |sc: u8, dc: u8| -> u8 {
            let sc = sc as f32 / 255.0;
            let dc = dc as f32 / 255.0;
            let out = (sc * sa + dc * da * (1.0 - sa)) / out_a;
            (out.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
        };

        self.px[i] = Rgba {
            r: blend(src.r, dst.r),
            g: blend(src.g, dst.g),
            b: blend(src.b, dst.b),
            a: (out_a.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
        };
    }

    fn shade(&mut self, x: i32, y: i32, paint: &Paint) {
        let c = paint.color_at(Point::new(x as f32 + 0.5, y as f32 + 0.5));
        let alpha = self.state.alpha;
        self.blend_over(x, y, c.scale_alpha(alpha));
    }

    fn clip_rows(&self, min_y: f32, max_y: f32) -> (i32, i32) {
        let lo = (min_y.floor() as i32).max(0);
        let hi = (max_y.ceil() as i32).min(self.h as i32 - 1);
        (lo, hi)
    }
}

fn bounds(lines: &[Vec<Point>]) -> Option<(f32, f32, f32, f32)> {
    let mut it = lines.iter().flatten();
    let first = it.next()?;
    let mut b = (first.x, first.y, first.x, first.y);
    for p in it {
        b.0 = b.0.min(p.x);
        b.1 = b.1.min(p.y);
        b.2 = b.2.max(p.x);
        b.3 = b.3.max(p.y);
    }
    Some(b)
}

fn segment_distance(p: Point, a: Point, b: Point) -> f32 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    if len2 <= 1e-12 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * dx, a.y + t * dy))
}

impl Surface for PixelCanvas {
    fn size(&self) -> (u32, u32) {
        (self.w, self.h)
    }

    fn clear(&mut self) {
        self.px.fill(Rgba::TRANSPARENT);
    }

    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(s) = self.stack.pop() {
            self.state = s;
        }
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.state.transform.translate(x, y);
    }

    fn rotate(&mut self, angle: f32) {
        self.state.transform.rotate(angle);
    }

    fn scale(&mut self, s: f32) {
        self.state.transform.scale(s);
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.state.alpha = alpha.clamp(0.0, 1.0);
    }

    /// Even-odd scanline fill sampled at pixel centres. Shapes too small to
    /// cover any centre still mark the pixel under their centroid.
    fn fill_path(&mut self, path: &Path, paint: &Paint) {
        let tf = self.state.transform;
        let lines = path.flatten(&tf);
        let Some((min_x, min_y, max_x, max_y)) = bounds(&lines) else {
            return;
        };
        let paint = paint.to_device(&tf);

        let (y0, y1) = self.clip_rows(min_y, max_y);
        let mut xs: Vec<f32> = Vec::new();
        let mut covered = false;

        for y in y0..=y1 {
            xs.clear();
            let yf = y as f32 + 0.5;
            for line in &lines {
                let n = line.len();
                // open subpaths are filled as if closed
                for i in 0..n {
                    let a = line[i];
                    let b = line[(i + 1) % n];
                    if (a.y <= yf && b.y > yf) || (b.y <= yf && a.y > yf) {
                        xs.push(a.x + (yf - a.y) / (b.y - a.y) * (b.x - a.x));
                    }
                }
            }
            xs.sort_by(|a, b| a.total_cmp(b));
            for pair in xs.chunks_exact(2) {
                let x_start = ((pair[0] - 0.5).ceil() as i32).max(0);
                let x_end = ((pair[1] - 0.5).floor() as i32).min(self.w as i32 - 1);
                for x in x_start..=x_end {
                    self.shade(x, y, &paint);
                    covered = true;
                }
            }
        }

        if !covered {
            let cx = ((min_x + max_x) / 2.0).floor() as i32;
            let cy = ((min_y + max_y) / 2.0).floor() as i32;
            self.shade(cx, cy, &paint);
        }
    }

    /// Round-capped, round-joined stroke from distance-to-polyline coverage.
    /// Each pixel is painted at most once so translucent strokes stay even.
    fn stroke_path(&mut self, path: &Path, paint: &Paint, width: f32) {
        let tf = self.state.transform;
        let lines = path.flatten(&tf);
        let Some((min_x, min_y, max_x, max_y)) = bounds(&lines) else {
            return;
        };
        let paint = paint.to_device(&tf);
        let half = (width * tf.linear_scale() / 2.0).max(0.5);

        let (y0, y1) = self.clip_rows(min_y - half, max_y + half);
        let x0 = ((min_x - half).floor() as i32).max(0);
        let x1 = ((max_x + half).ceil() as i32).min(self.w as i32 - 1);

        for y in y0..=y1 {
            for x in x0..=x1 {
                let p = Point::new(x as f32 + 0.5, y as f32 + 0.5);
                let hit = lines.iter().any(|line| {
                    line.windows(2)
                        .any(|seg| segment_distance(p, seg[0], seg[1]) <= half)
                });
                if hit {
                    self.shade(x, y, &paint);
                }
            }
        }
    }

    fn draw_raster(&mut self, raster: &PixelCanvas, dest: Rect) {
        if raster.w == 0 || raster.h == 0 || dest.w <= 0.0 || dest.h <= 0.0 {
            return;
        }
        let tf = self.state.transform;
        let Some(inv) = tf.invert() else {
            return;
        };
        let corners = vec![
            tf.apply(Point::new(dest.x, dest.y)),
            tf.apply(Point::new(dest.x + dest.w, dest.y)),
            tf.apply(Point::new(dest.x + dest.w, dest.y + dest.h)),
            tf.apply(Point::new(dest.x, dest.y + dest.h)),
        ];
        let Some((min_x, min_y, max_x, max_y)) = bounds(&[corners]) else {
            return;
        };

        let (y0, y1) = self.clip_rows(min_y, max_y);
        let x0 = (min_x.floor() as i32).max(0);
        let x1 = (max_x.ceil() as i32).min(self.w as i32 - 1);
        let alpha = self.state.alpha;

        for y in y0..=y1 {
            for x in x0..=x1 {
                let u = inv.apply(Point::new(x as f32 + 0.5, y as f32 + 0.5));
                let sx = (u.x - dest.x) / dest.w * raster.w as f32;
                let sy = (u.y - dest.y) / dest.h * raster.h as f32;
                if sx < 0.0 || sy < 0.0 {
                    continue;
                }
                if let Some(src) = raster.pixel(sx as u32, sy as u32) {
                    self.blend_over(x, y, src.scale_alpha(alpha));
                }
            }
        }
    }
}
