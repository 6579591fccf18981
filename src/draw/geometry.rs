//! Pure geometry used for hit-testing, relationship discovery and smoothing.
//!
//! Strokes are polylines; each consecutive point pair is lifted to a cubic
//! Bézier segment so curve-to-curve distance can be estimated by sampling.
//! Distances computed here are approximations of visual overlap, not exact
//! curve intersection.

use crate::draw::model::{Bounds, Point, StrokeRef};
use std::collections::VecDeque;

pub const MAX_SMOOTHING_LEVEL: usize = 10;
/// Target spacing, in canvas units, between consecutive curve samples.
pub const SAMPLE_SPACING: f32 = 2.0;
pub const MIN_SAMPLES_PER_CURVE: usize = 2;
pub const MAX_SAMPLES_PER_CURVE: usize = 64;
pub const DEFAULT_INTERSECTION_TOLERANCE_FACTOR: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicCurve {
    pub p0: Point,
    pub p1: Point,
    pub p2: Point,
    pub p3: Point,
}

impl CubicCurve {
    pub const fn new(p0: Point, p1: Point, p2: Point, p3: Point) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Straight segment expressed as a cubic with control points at the thirds.
    pub fn line(start: Point, end: Point) -> Self {
        let third = |t: f32| {
            Point::new(
                start.x + (end.x - start.x) * t,
                start.y + (end.y - start.y) * t,
            )
        };
        Self::new(start, third(1.0 / 3.0), third(2.0 / 3.0), end)
    }

    pub fn point_at(&self, t: f32) -> Point {
        let mt = 1.0 - t;
        let a = mt * mt * mt;
        let b = 3.0 * mt * mt * t;
        let c = 3.0 * mt * t * t;
        let d = t * t * t;
        Point::new(
            a * self.p0.x + b * self.p1.x + c * self.p2.x + d * self.p3.x,
            a * self.p0.y + b * self.p1.y + c * self.p2.y + d * self.p3.y,
        )
    }

    /// Length of the control polygon, an upper bound on arc length.
    pub fn control_length(&self) -> f32 {
        self.p0.distance(self.p1) + self.p1.distance(self.p2) + self.p2.distance(self.p3)
    }

    /// The curve lies inside the hull of its control points.
    pub fn control_bounds(&self) -> Bounds {
        Bounds {
            min_x: self.p0.x.min(self.p1.x).min(self.p2.x).min(self.p3.x),
            min_y: self.p0.y.min(self.p1.y).min(self.p2.y).min(self.p3.y),
            max_x: self.p0.x.max(self.p1.x).max(self.p2.x).max(self.p3.x),
            max_y: self.p0.y.max(self.p1.y).max(self.p2.y).max(self.p3.y),
        }
    }

    pub fn sample_count(&self) -> usize {
        ((self.control_length() / SAMPLE_SPACING).ceil() as usize + 1)
            .clamp(MIN_SAMPLES_PER_CURVE, MAX_SAMPLES_PER_CURVE)
    }
}

/// Evenly parameterized samples along a [`CubicCurve`], endpoints included.
///
/// Finite; [`CurveSamples::restart`] rewinds it for another pass.
#[derive(Debug, Clone)]
pub struct CurveSamples {
    curve: CubicCurve,
    count: usize,
    next: usize,
}

impl CurveSamples {
    pub fn restart(&mut self) {
        self.next = 0;
    }
}

impl Iterator for CurveSamples {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        if self.next >= self.count {
            return None;
        }
        let t = if self.count == 1 {
            0.0
        } else {
            self.next as f32 / (self.count - 1) as f32
        };
        self.next += 1;
        Some(self.curve.point_at(t))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CurveSamples {}

pub fn sample(curve: CubicCurve, n: usize) -> CurveSamples {
    CurveSamples {
        curve,
        count: n,
        next: 0,
    }
}

/// Minimum Euclidean distance between the sample sets of two curves.
pub fn min_distance(a: &CubicCurve, b: &CubicCurve) -> f32 {
    let b_samples: Vec<Point> = sample(*b, b.sample_count()).collect();
    let mut best = f32::INFINITY;
    for pa in sample(*a, a.sample_count()) {
        for pb in &b_samples {
            let d = pa.distance_sq(*pb);
            if d < best {
                best = d;
            }
        }
    }
    best.sqrt()
}

pub fn stroke_curves(points: &[Point]) -> impl Iterator<Item = CubicCurve> + '_ {
    let single = (points.len() == 1).then(|| CubicCurve::line(points[0], points[0]));
    single
        .into_iter()
        .chain(points.windows(2).map(|pair| CubicCurve::line(pair[0], pair[1])))
}

fn bounds_gap(a: &Bounds, b: &Bounds) -> f32 {
    let dx = (b.min_x - a.max_x).max(a.min_x - b.max_x).max(0.0);
    let dy = (b.min_y - a.max_y).max(a.min_y - b.max_y).max(0.0);
    (dx * dx + dy * dy).sqrt()
}

/// Minimum sampled distance between two point sequences, pruning curve pairs
/// whose control bounds are already farther apart than the best match.
pub fn min_distance_between_strokes(a: &[Point], b: &[Point]) -> f32 {
    let b_curves: Vec<(CubicCurve, Bounds)> = stroke_curves(b)
        .map(|curve| (curve, curve.control_bounds()))
        .collect();
    let mut best = f32::INFINITY;
    for curve_a in stroke_curves(a) {
        let bounds_a = curve_a.control_bounds();
        for (curve_b, bounds_b) in &b_curves {
            if bounds_gap(&bounds_a, bounds_b) >= best {
                continue;
            }
            best = best.min(min_distance(&curve_a, curve_b));
            if best == 0.0 {
                return 0.0;
            }
        }
    }
    best
}

pub fn intersection_tolerance(width_a: f32, width_b: f32, factor: f32) -> f32 {
    width_a.max(width_b) * factor
}

pub fn strokes_intersect(a: &StrokeRef<'_>, b: &StrokeRef<'_>, factor: f32) -> bool {
    let tolerance = intersection_tolerance(a.width, b.width, factor);
    let (Some(bounds_a), Some(bounds_b)) = (a.bounds(), b.bounds()) else {
        return false;
    };
    if !bounds_a.inflate(tolerance).intersects(&bounds_b) {
        return false;
    }
    min_distance_between_strokes(a.points, b.points) < tolerance
}

pub fn distance_point_to_segment(point: Point, start: Point, end: Point) -> f32 {
    let vx = end.x - start.x;
    let vy = end.y - start.y;
    let len_sq = vx * vx + vy * vy;
    if len_sq <= f32::EPSILON {
        return point.distance(start);
    }
    let wx = point.x - start.x;
    let wy = point.y - start.y;
    let t = ((wx * vx + wy * vy) / len_sq).clamp(0.0, 1.0);
    point.distance(Point::new(start.x + vx * t, start.y + vy * t))
}

/// Nearest approach from `point` to any segment of the stroke.
pub fn distance_point_to_stroke(point: Point, points: &[Point]) -> f32 {
    match points {
        [] => f32::INFINITY,
        [only] => point.distance(*only),
        _ => points
            .windows(2)
            .map(|pair| distance_point_to_segment(point, pair[0], pair[1]))
            .fold(f32::INFINITY, f32::min),
    }
}

/// Moving average of `new_point` and the last `level` raw points in `buffer`.
pub fn smooth(buffer: &VecDeque<Point>, new_point: Point, level: usize) -> Point {
    if level == 0 {
        return new_point;
    }
    let skip = buffer.len().saturating_sub(level);
    let mut sum_x = new_point.x;
    let mut sum_y = new_point.y;
    let mut count = 1.0;
    for point in buffer.iter().skip(skip) {
        sum_x += point.x;
        sum_y += point.y;
        count += 1.0;
    }
    Point::new(sum_x / count, sum_y / count)
}

/// Fixed-capacity FIFO of raw input points feeding [`smooth`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointSmoother {
    buffer: VecDeque<Point>,
    level: usize,
}

impl PointSmoother {
    pub fn new(level: usize) -> Self {
        let level = level.min(MAX_SMOOTHING_LEVEL);
        Self {
            buffer: VecDeque::with_capacity(level),
            level,
        }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn set_level(&mut self, level: usize) {
        self.level = level.min(MAX_SMOOTHING_LEVEL);
        if self.level == 0 {
            self.buffer.clear();
        }
        while self.buffer.len() > self.level {
            self.buffer.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn push(&mut self, raw: Point) -> Point {
        if self.level == 0 {
            return raw;
        }
        let smoothed = smooth(&self.buffer, raw, self.level);
        self.buffer.push_back(raw);
        if self.buffer.len() > self.level {
            self.buffer.pop_front();
        }
        smoothed
    }
}
