use crate::draw::error::{DrawError, DrawResult};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Rough glyph advance relative to the font size, used for text hit-testing
/// when no font metrics are available.
pub const TEXT_ADVANCE_RATIO: f32 = 0.6;
pub const TEXT_LINE_HEIGHT_RATIO: f32 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn translated(self, offset: Vector) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y)
    }

    pub fn distance_sq(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(self, other: Point) -> f32 {
        self.distance_sq(other).sqrt()
    }

    pub fn offset_to(self, other: Point) -> Vector {
        Vector::new(other.x - self.x, other.y - self.y)
    }

    /// Nearest integer pixel, used by the rasterizer.
    pub fn to_pixel(self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
}

impl Vector {
    pub const ZERO: Vector = Vector::new(0.0, 0.0);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn add(self, other: Vector) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const RED: Color = Color::rgba(255, 0, 0, 255);
    pub const GREEN: Color = Color::rgba(0, 200, 0, 255);
    pub const BLUE: Color = Color::rgba(0, 90, 255, 255);
    pub const YELLOW: Color = Color::rgba(255, 220, 0, 255);
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_rgba_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Axis-aligned bounds in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Bounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for point in &points[1..] {
            bounds.min_x = bounds.min_x.min(point.x);
            bounds.min_y = bounds.min_y.min(point.y);
            bounds.max_x = bounds.max_x.max(point.x);
            bounds.max_y = bounds.max_y.max(point.y);
        }
        Some(bounds)
    }

    pub fn inflate(self, amount: f32) -> Self {
        Bounds {
            min_x: self.min_x - amount,
            min_y: self.min_y - amount,
            max_x: self.max_x + amount,
            max_y: self.max_y + amount,
        }
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x && point.x <= self.max_x && point.y >= self.min_y && point.y <= self.max_y
    }
}

/// Owned copy of one stroke, detached from the shared point buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeData {
    pub points: Vec<Point>,
    pub color: Color,
    pub width: f32,
}

/// Borrowed view of one stroke inside a [`StrokeBuffer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeRef<'a> {
    pub index: usize,
    pub marker: usize,
    pub points: &'a [Point],
    pub color: Color,
    pub width: f32,
}

impl StrokeRef<'_> {
    pub fn to_data(&self) -> StrokeData {
        StrokeData {
            points: self.points.to_vec(),
            color: self.color,
            width: self.width,
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.points)
    }
}

/// Flat point arena shared by every committed stroke.
///
/// `markers[i]` is the offset of stroke `i`'s first point; stroke `i` owns
/// `points[markers[i]..markers[i + 1]]` (the last stroke runs to the end of
/// the buffer). `colors` and `widths` are parallel to `markers`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StrokeBuffer {
    points: Vec<Point>,
    markers: Vec<usize>,
    colors: Vec<Color>,
    widths: Vec<f32>,
}

impl StrokeBuffer {
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn markers(&self) -> &[usize] {
        &self.markers
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn widths(&self) -> &[f32] {
        &self.widths
    }

    fn check(&self, index: usize) -> DrawResult<()> {
        if index < self.len() {
            Ok(())
        } else {
            Err(DrawError::InvalidStrokeIndex {
                index,
                len: self.len(),
            })
        }
    }

    fn range(&self, index: usize) -> Range<usize> {
        let start = self.markers[index];
        let end = self
            .markers
            .get(index + 1)
            .copied()
            .unwrap_or(self.points.len());
        start..end
    }

    pub fn stroke(&self, index: usize) -> DrawResult<StrokeRef<'_>> {
        self.check(index)?;
        let range = self.range(index);
        Ok(StrokeRef {
            index,
            marker: range.start,
            points: &self.points[range],
            color: self.colors[index],
            width: self.widths[index],
        })
    }

    /// Strokes in draw order; `.rev()` walks from the topmost.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = StrokeRef<'_>> + '_ {
        (0..self.len()).map(move |index| {
            let range = self.range(index);
            StrokeRef {
                index,
                marker: range.start,
                points: &self.points[range],
                color: self.colors[index],
                width: self.widths[index],
            }
        })
    }

    pub fn push(&mut self, stroke: StrokeData) -> usize {
        debug_assert!(!stroke.points.is_empty(), "strokes own at least one point");
        let index = self.len();
        self.markers.push(self.points.len());
        self.points.extend_from_slice(&stroke.points);
        self.colors.push(stroke.color);
        self.widths.push(stroke.width);
        index
    }

    /// Splices `stroke` in at draw-order position `index` (`index == len` appends).
    pub fn insert(&mut self, index: usize, stroke: StrokeData) -> DrawResult<()> {
        if index > self.len() {
            return Err(DrawError::InvalidStrokeIndex {
                index,
                len: self.len(),
            });
        }
        if index == self.len() {
            self.push(stroke);
            return Ok(());
        }
        debug_assert!(!stroke.points.is_empty(), "strokes own at least one point");
        let marker = self.markers[index];
        let count = stroke.points.len();
        self.points.splice(marker..marker, stroke.points);
        for later in &mut self.markers[index..] {
            *later += count;
        }
        self.markers.insert(index, marker);
        self.colors.insert(index, stroke.color);
        self.widths.insert(index, stroke.width);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> DrawResult<StrokeData> {
        self.check(index)?;
        let range = self.range(index);
        let count = range.len();
        let points: Vec<Point> = self.points.drain(range).collect();
        self.markers.remove(index);
        for later in &mut self.markers[index..] {
            *later -= count;
        }
        Ok(StrokeData {
            points,
            color: self.colors.remove(index),
            width: self.widths.remove(index),
        })
    }

    /// Overwrites a stroke's points in place. The point count must not change.
    pub fn replace_points(&mut self, index: usize, points: &[Point]) -> DrawResult<()> {
        self.check(index)?;
        let range = self.range(index);
        if range.len() != points.len() {
            tracing::warn!(
                index,
                expected = range.len(),
                got = points.len(),
                "replacement point count mismatch"
            );
            return Err(DrawError::InvalidStrokeIndex {
                index,
                len: self.len(),
            });
        }
        self.points[range].copy_from_slice(points);
        Ok(())
    }

    pub fn translate(&mut self, index: usize, offset: Vector) -> DrawResult<()> {
        self.check(index)?;
        let range = self.range(index);
        for point in &mut self.points[range] {
            *point = point.translated(offset);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextState {
    #[default]
    Idle,
    Editing,
}

/// The editable part of a text annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct TextContent {
    pub text: String,
    pub size: f32,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextAnnotation {
    pub content: TextContent,
    /// Top-left corner of the text box.
    pub position: Point,
    pub state: TextState,
}

impl TextAnnotation {
    pub fn new(text: impl Into<String>, position: Point, size: f32, color: Color) -> Self {
        Self {
            content: TextContent {
                text: text.into(),
                size,
                color,
            },
            position,
            state: TextState::Idle,
        }
    }

    pub fn bounds(&self) -> Bounds {
        let widest_line = self
            .content
            .text
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0)
            .max(1);
        let line_count = self.content.text.lines().count().max(1);
        Bounds {
            min_x: self.position.x,
            min_y: self.position.y,
            max_x: self.position.x + widest_line as f32 * self.content.size * TEXT_ADVANCE_RATIO,
            max_y: self.position.y
                + line_count as f32 * self.content.size * TEXT_LINE_HEIGHT_RATIO,
        }
    }
}
