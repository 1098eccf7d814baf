//! Backend-neutral drawing vocabulary.
//!
//! The engine only ever talks to [`Surface`]: filled curves, gradient fills,
//! stroked paths and raster blits under a canvas-style transform stack.

use crate::canvas::PixelCanvas;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Point {
    pub(crate) x: f32,
    pub(crate) y: f32,
}

impl Point {
    pub(crate) const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub(crate) fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Rect {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) w: f32,
    pub(crate) h: f32,
}

impl Rect {
    pub(crate) fn centered(extent: f32) -> Self {
        Self {
            x: -extent / 2.0,
            y: -extent / 2.0,
            w: extent,
            h: extent,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Rgba {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl Rgba {
    pub(crate) const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub(crate) const WHITE: Rgba = Rgba::hex(0xffffff);

    pub(crate) const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque colour from a `0xRRGGBB` literal.
    pub(crate) const fn hex(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xff) as u8,
            g: ((rgb >> 8) & 0xff) as u8,
            b: (rgb & 0xff) as u8,
            a: 255,
        }
    }

    pub(crate) fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
            ..self
        }
    }

    pub(crate) fn scale_alpha(self, k: f32) -> Self {
        Self {
            a: (self.a as f32 * k.clamp(0.0, 1.0) + 0.5) as u8,
            ..self
        }
    }

    pub(crate) fn lerp(self, other: Rgba, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| -> u8 { (a as f32 + (b as f32 - a as f32) * t + 0.5) as u8 };
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

/// Canvas-style affine transform: `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Transform {
    pub(crate) a: f32,
    pub(crate) b: f32,
    pub(crate) c: f32,
    pub(crate) d: f32,
    pub(crate) e: f32,
    pub(crate) f: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub(crate) const IDENTITY: Transform = Transform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub(crate) fn apply(&self, p: Point) -> Point {
        Point {
            x: self.a * p.x + self.c * p.y + self.e,
            y: self.b * p.x + self.d * p.y + self.f,
        }
    }

    pub(crate) fn translate(&mut self, tx: f32, ty: f32) {
        self.e += self.a * tx + self.c * ty;
        self.f += self.b * tx + self.d * ty;
    }

    pub(crate) fn rotate(&mut self, angle: f32) {
        let (sin, cos) = angle.sin_cos();
        let (a, b, c, d) = (self.a, self.b, self.c, self.d);
        self.a = a * cos + c * sin;
        self.b = b * cos + d * sin;
        self.c = c * cos - a * sin;
        self.d = d * cos - b * sin;
    }

    pub(crate) fn scale(&mut self, s: f32) {
        self.a *= s;
        self.b *= s;
        self.c *= s;
        self.d *= s;
    }

    /// Length multiplier for radii and stroke widths.
    pub(crate) fn linear_scale(&self) -> f32 {
        (self.a * self.d - self.b * self.c).abs().sqrt()
    }

    pub(crate) fn invert(&self) -> Option<Transform> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < 1e-12 {
            return None;
        }
        let inv = 1.0 / det;
        Some(Transform {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum PathCmd {
    MoveTo(Point),
    LineTo(Point),
    CubicTo(Point, Point, Point),
    Close,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Path {
    pub(crate) cmds: Vec<PathCmd>,
}

const CUBIC_STEPS: usize = 12;
const CIRCLE_STEPS: usize = 24;

impl Path {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.cmds.push(PathCmd::MoveTo(Point::new(x, y)));
        self
    }

    pub(crate) fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.cmds.push(PathCmd::LineTo(Point::new(x, y)));
        self
    }

    pub(crate) fn cubic_to(
        &mut self,
        c1x: f32,
        c1y: f32,
        c2x: f32,
        c2y: f32,
        x: f32,
        y: f32,
    ) -> &mut Self {
        self.cmds.push(PathCmd::CubicTo(
            Point::new(c1x, c1y),
            Point::new(c2x, c2y),
            Point::new(x, y),
        ));
        self
    }

    pub(crate) fn close(&mut self) -> &mut Self {
        self.cmds.push(PathCmd::Close);
        self
    }

    pub(crate) fn circle(cx: f32, cy: f32, r: f32) -> Self {
        let mut path = Path::new();
        for i in 0..CIRCLE_STEPS {
            let a = i as f32 / CIRCLE_STEPS as f32 * std::f32::consts::TAU;
            let (x, y) = (cx + r * a.cos(), cy + r * a.sin());
            if i == 0 {
                path.move_to(x, y);
            } else {
                path.line_to(x, y);
            }
        }
        path.close();
        path
    }

    /// Flattens curves into polylines under `tf`. Closed subpaths repeat
    /// their first point at the end.
    pub(crate) fn flatten(&self, tf: &Transform) -> Vec<Vec<Point>> {
        let mut out: Vec<Vec<Point>> = Vec::new();
        let mut current: Vec<Point> = Vec::new();
        let mut pen = Point::default();

        for cmd in &self.cmds {
            match *cmd {
                PathCmd::MoveTo(p) => {
                    if current.len() > 1 {
                        out.push(std::mem::take(&mut current));
                    }
                    current.clear();
                    current.push(tf.apply(p));
                    pen = p;
                }
                PathCmd::LineTo(p) => {
                    if current.is_empty() {
                        current.push(tf.apply(pen));
                    }
                    current.push(tf.apply(p));
                    pen = p;
                }
                PathCmd::CubicTo(c1, c2, p) => {
                    if current.is_empty() {
                        current.push(tf.apply(pen));
                    }
                    for step in 1..=CUBIC_STEPS {
                        let t = step as f32 / CUBIC_STEPS as f32;
                        let u = 1.0 - t;
                        let w0 = u * u * u;
                        let w1 = 3.0 * u * u * t;
                        let w2 = 3.0 * u * t * t;
                        let w3 = t * t * t;
                        let q = Point::new(
                            w0 * pen.x + w1 * c1.x + w2 * c2.x + w3 * p.x,
                            w0 * pen.y + w1 * c1.y + w2 * c2.y + w3 * p.y,
                        );
                        current.push(tf.apply(q));
                    }
                    pen = p;
                }
                PathCmd::Close => {
                    if let Some(&first) = current.first() {
                        current.push(first);
                    }
                    if current.len() > 1 {
                        out.push(std::mem::take(&mut current));
                    }
                    current.clear();
                }
            }
        }
        if current.len() > 1 {
            out.push(current);
        }
        out
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ColorStop {
    pub(crate) offset: f32,
    pub(crate) color: Rgba,
}

pub(crate) fn stop(offset: f32, color: Rgba) -> ColorStop {
    ColorStop { offset, color }
}

fn sample_stops(stops: &[ColorStop], t: f32) -> Rgba {
    let Some(first) = stops.first() else {
        return Rgba::TRANSPARENT;
    };
    if t <= first.offset {
        return first.color;
    }
    for pair in stops.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if t <= hi.offset {
            let span = (hi.offset - lo.offset).max(1e-6);
            return lo.color.lerp(hi.color, (t - lo.offset) / span);
        }
    }
    stops[stops.len() - 1].color
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Paint {
    Solid(Rgba),
    Linear {
        from: Point,
        to: Point,
        stops: Vec<ColorStop>,
    },
    Radial {
        center: Point,
        radius: f32,
        stops: Vec<ColorStop>,
    },
}

impl Paint {
    /// Re-expresses gradient geometry in device space. Radii use the
    /// transform's linear scale, so only similarity transforms keep radial
    /// gradients exact.
    pub(crate) fn to_device(&self, tf: &Transform) -> Paint {
        match self {
            Paint::Solid(c) => Paint::Solid(*c),
            Paint::Linear { from, to, stops } => Paint::Linear {
                from: tf.apply(*from),
                to: tf.apply(*to),
                stops: stops.clone(),
            },
            Paint::Radial {
                center,
                radius,
                stops,
            } => Paint::Radial {
                center: tf.apply(*center),
                radius: radius * tf.linear_scale(),
                stops: stops.clone(),
            },
        }
    }

    pub(crate) fn color_at(&self, p: Point) -> Rgba {
        match self {
            Paint::Solid(c) => *c,
            Paint::Linear { from, to, stops } => {
                let (dx, dy) = (to.x - from.x, to.y - from.y);
                let len2 = dx * dx + dy * dy;
                let t = if len2 <= 1e-9 {
                    0.0
                } else {
                    ((p.x - from.x) * dx + (p.y - from.y) * dy) / len2
                };
                sample_stops(stops, t)
            }
            Paint::Radial {
                center,
                radius,
                stops,
            } => {
                let t = if *radius <= 1e-6 {
                    1.0
                } else {
                    p.distance(*center) / radius
                };
                sample_stops(stops, t)
            }
        }
    }
}

/// A 2D drawing target. Coordinates are user units under the current
/// transform; `save`/`restore` bracket transform and alpha changes.
pub(crate) trait Surface {
    fn size(&self) -> (u32, u32);
    fn clear(&mut self);
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, x: f32, y: f32);
    fn rotate(&mut self, angle: f32);
    fn scale(&mut self, s: f32);
    fn set_alpha(&mut self, alpha: f32);
    fn fill_path(&mut self, path: &Path, paint: &Paint);
    fn stroke_path(&mut self, path: &Path, paint: &Paint, width: f32);
    /// Draws `raster` stretched over `dest` (user units).
    fn draw_raster(&mut self, raster: &PixelCanvas, dest: Rect);
}
