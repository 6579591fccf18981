use crate::draw::document::{ActiveStrokeView, Document};
use crate::draw::model::{Color, Point, TextAnnotation, TextState};

pub const DEFAULT_ACTIVE_CACHE_THRESHOLD: usize = 32;
/// Newest segments of the active stroke that are always drawn straight into
/// the frame instead of the active cache.
pub const TAIL_SEGMENTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl DirtyRect {
    pub fn from_points(a: (i32, i32), b: (i32, i32), pad: i32) -> Self {
        let min_x = a.0.min(b.0) - pad;
        let max_x = a.0.max(b.0) + pad;
        let min_y = a.1.min(b.1) - pad;
        let max_y = a.1.max(b.1) + pad;
        Self {
            x: min_x,
            y: min_y,
            width: (max_x - min_x + 1).max(1),
            height: (max_y - min_y + 1).max(1),
        }
    }

    pub fn clamp(self, width: u32, height: u32) -> Option<DirtyRect> {
        let max_w = width as i32;
        let max_h = height as i32;
        let x0 = self.x.clamp(0, max_w);
        let y0 = self.y.clamp(0, max_h);
        let x1 = (self.x + self.width).clamp(0, max_w);
        let y1 = (self.y + self.height).clamp(0, max_h);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(DirtyRect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }
}

#[derive(Debug, Default)]
struct RasterLayer {
    rgba: Vec<u8>,
    size: (u32, u32),
}

impl RasterLayer {
    /// Returns true when the layer had to be reallocated.
    fn ensure_size(&mut self, size: (u32, u32)) -> bool {
        let target_len = (size.0 as usize)
            .saturating_mul(size.1 as usize)
            .saturating_mul(4);
        let resized = self.size != size || self.rgba.len() != target_len;
        if resized {
            self.rgba = vec![0; target_len];
            self.size = size;
        }
        resized
    }

    fn clear(&mut self) {
        self.rgba.fill(0);
    }
}

/// Counters exposing the cache invalidation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    pub committed_rebuilds: u64,
    pub active_resets: u64,
    pub active_segments_cached: u64,
    pub tail_segments_last_frame: usize,
}

/// A text annotation for the display surface to draw over the strokes.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOverlay {
    pub text: String,
    pub position: Point,
    pub size: f32,
    pub color: Color,
    pub editing: bool,
}

impl From<&TextAnnotation> for TextOverlay {
    fn from(annotation: &TextAnnotation) -> Self {
        Self {
            text: annotation.content.text.clone(),
            position: annotation.position,
            size: annotation.content.size,
            color: annotation.content.color,
            editing: annotation.state == TextState::Editing,
        }
    }
}

/// Composited output of one paint.
#[derive(Debug)]
pub struct RenderFrame<'a> {
    /// Straight (non-premultiplied) RGBA, row-major, transparent background.
    pub pixels: &'a [u8],
    pub size: (u32, u32),
    pub texts: Vec<TextOverlay>,
}

/// Two-tier raster cache: committed strokes, plus the flushed prefix of the
/// stroke in progress. Purely derived from the [`Document`].
#[derive(Debug)]
pub struct RenderCache {
    committed: RasterLayer,
    active: RasterLayer,
    composed: RasterLayer,
    committed_revision: Option<u64>,
    active_epoch: Option<u64>,
    active_flushed: usize,
    active_threshold: usize,
    stats: RenderStats,
}

impl Default for RenderCache {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVE_CACHE_THRESHOLD)
    }
}

impl RenderCache {
    pub fn new(active_threshold: usize) -> Self {
        Self {
            committed: RasterLayer::default(),
            active: RasterLayer::default(),
            composed: RasterLayer::default(),
            committed_revision: None,
            active_epoch: None,
            active_flushed: 0,
            active_threshold: active_threshold.max(TAIL_SEGMENTS + 1),
            stats: RenderStats::default(),
        }
    }

    pub fn active_threshold(&self) -> usize {
        self.active_threshold
    }

    pub fn set_active_threshold(&mut self, threshold: usize) {
        self.active_threshold = threshold.max(TAIL_SEGMENTS + 1);
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Drops both layers; the next paint rebuilds them from the document.
    pub fn invalidate(&mut self) {
        self.committed_revision = None;
        self.reset_active(None);
    }

    pub fn render(&mut self, doc: &Document, size: (u32, u32)) -> RenderFrame<'_> {
        self.sync_committed(doc, size);
        let active = doc.active_stroke();
        let tail_start = self.sync_active(active, size);

        self.composed.ensure_size(size);
        self.composed.rgba.copy_from_slice(&self.committed.rgba);
        if self.active_flushed > 0 {
            blend_layer(&self.active.rgba, &mut self.composed.rgba);
        }

        let mut tail = 0;
        if let Some(active) = active {
            tail = draw_polyline(
                &mut self.composed.rgba,
                size,
                &active.points[tail_start..],
                active.color,
                active.width,
            );
        }
        self.stats.tail_segments_last_frame = tail;

        RenderFrame {
            pixels: &self.composed.rgba,
            size,
            texts: doc.texts().iter().map(TextOverlay::from).collect(),
        }
    }

    fn sync_committed(&mut self, doc: &Document, size: (u32, u32)) {
        let resized = self.committed.ensure_size(size);
        if !resized && self.committed_revision == Some(doc.revision()) {
            return;
        }
        self.committed.clear();
        for stroke in doc.strokes().iter() {
            draw_polyline(
                &mut self.committed.rgba,
                size,
                stroke.points,
                stroke.color,
                stroke.width,
            );
        }
        self.committed_revision = Some(doc.revision());
        self.stats.committed_rebuilds += 1;
        tracing::trace!(
            strokes = doc.strokes().len(),
            revision = doc.revision(),
            "committed cache rebuilt"
        );
    }

    fn reset_active(&mut self, epoch: Option<u64>) {
        if self.active_flushed > 0 {
            self.active.clear();
        }
        self.active_flushed = 0;
        self.active_epoch = epoch;
    }

    /// Brings the active layer up to date and returns the index of the first
    /// point still to be drawn directly into the frame.
    fn sync_active(&mut self, active: Option<ActiveStrokeView<'_>>, size: (u32, u32)) -> usize {
        if self.active.ensure_size(size) {
            self.active_flushed = 0;
            self.active_epoch = None;
        }
        let Some(active) = active else {
            if self.active_epoch.is_some() {
                self.reset_active(None);
            }
            return 0;
        };

        let segments = active.points.len().saturating_sub(1);
        if self.active_epoch != Some(active.epoch) || self.active_flushed > segments {
            self.reset_active(Some(active.epoch));
            self.stats.active_resets += 1;
        }
        if segments < self.active_threshold {
            return self.active_flushed;
        }

        let flush_to = segments - TAIL_SEGMENTS;
        if flush_to > self.active_flushed {
            let drawn = draw_polyline(
                &mut self.active.rgba,
                size,
                &active.points[self.active_flushed..=flush_to],
                active.color,
                active.width,
            );
            self.stats.active_segments_cached += drawn as u64;
            self.active_flushed = flush_to;
        }
        self.active_flushed
    }
}

/// Renders the document from scratch, bypassing any cache.
pub fn render_document_to_rgba(doc: &Document, size: (u32, u32)) -> Vec<u8> {
    let mut pixels = vec![0u8; (size.0 as usize) * (size.1 as usize) * 4];
    for stroke in doc.strokes().iter() {
        draw_polyline(&mut pixels, size, stroke.points, stroke.color, stroke.width);
    }
    if let Some(active) = doc.active_stroke() {
        draw_polyline(&mut pixels, size, active.points, active.color, active.width);
    }
    pixels
}

pub fn convert_rgba_to_bgra(rgba: &[u8], bgra: &mut [u8]) {
    assert_eq!(rgba.len(), bgra.len());
    for (src, dst) in rgba.chunks_exact(4).zip(bgra.chunks_exact_mut(4)) {
        dst[0] = src[2];
        dst[1] = src[1];
        dst[2] = src[0];
        dst[3] = src[3];
    }
}

/// Draws consecutive segments and returns how many were drawn.
fn draw_polyline(
    pixels: &mut [u8],
    size: (u32, u32),
    points: &[Point],
    color: Color,
    stroke_width: f32,
) -> usize {
    match points {
        [] => 0,
        [only] => {
            draw_segment_capsule(pixels, size, *only, *only, color, stroke_width);
            0
        }
        _ => {
            for segment in points.windows(2) {
                draw_segment_capsule(pixels, size, segment[0], segment[1], color, stroke_width);
            }
            points.len() - 1
        }
    }
}

fn draw_segment_capsule(
    pixels: &mut [u8],
    size: (u32, u32),
    start: Point,
    end: Point,
    color: Color,
    stroke_width: f32,
) {
    let radius = (stroke_width * 0.5).max(0.5);
    let pad = radius.ceil() as i32 + 1;
    let Some(clip) = DirtyRect::from_points(start.to_pixel(), end.to_pixel(), pad).clamp(size.0, size.1)
    else {
        return;
    };

    let radius_sq = radius * radius;
    for y in clip.y..(clip.y + clip.height) {
        for x in clip.x..(clip.x + clip.width) {
            if point_segment_distance_sq((x as f32, y as f32), start, end) <= radius_sq {
                set_pixel_rgba(pixels, size.0, x, y, color);
            }
        }
    }
}

fn point_segment_distance_sq(point: (f32, f32), start: Point, end: Point) -> f32 {
    let vx = end.x - start.x;
    let vy = end.y - start.y;
    let wx = point.0 - start.x;
    let wy = point.1 - start.y;
    let len_sq = vx * vx + vy * vy;
    if len_sq <= f32::EPSILON {
        return wx * wx + wy * wy;
    }
    let t = ((wx * vx + wy * vy) / len_sq).clamp(0.0, 1.0);
    let dx = point.0 - (start.x + vx * t);
    let dy = point.1 - (start.y + vy * t);
    dx * dx + dy * dy
}

fn set_pixel_rgba(pixels: &mut [u8], width: u32, x: i32, y: i32, color: Color) {
    if x < 0 || y < 0 {
        return;
    }
    let idx = (y as usize * width as usize + x as usize) * 4;
    if idx + 3 >= pixels.len() {
        return;
    }
    pixels[idx..idx + 4].copy_from_slice(&color.to_rgba_array());
}

/// Source-over of one straight-alpha layer onto another.
fn blend_layer(src: &[u8], dst: &mut [u8]) {
    for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
        match s[3] {
            0 => {}
            255 => d.copy_from_slice(s),
            sa => {
                let sa = sa as f32 / 255.0;
                let da = d[3] as f32 / 255.0;
                let out_a = sa + da * (1.0 - sa);
                for channel in 0..3 {
                    let sc = s[channel] as f32 * sa;
                    let dc = d[channel] as f32 * da * (1.0 - sa);
                    d[channel] = ((sc + dc) / out_a).round().clamp(0.0, 255.0) as u8;
                }
                d[3] = (out_a * 255.0).round() as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::history::CommandHistory;
    use crate::draw::model::Vector;

    const SIZE: (u32, u32) = (64, 32);

    fn pixel(frame: &[u8], x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * SIZE.0 + x) * 4) as usize;
        [frame[idx], frame[idx + 1], frame[idx + 2], frame[idx + 3]]
    }

    fn commit(doc: &mut Document, history: &mut CommandHistory, points: &[(f32, f32)]) {
        doc.begin_stroke(Point::new(points[0].0, points[0].1), Color::RED, 3.0);
        for &(x, y) in &points[1..] {
            doc.extend_stroke(Point::new(x, y));
        }
        let command = doc.commit_stroke().expect("stroke");
        history.push(command, doc).unwrap();
    }

    #[test]
    fn committed_cache_rebuilds_only_on_revision_change() {
        let mut doc = Document::default();
        let mut history = CommandHistory::default();
        let mut cache = RenderCache::default();
        commit(&mut doc, &mut history, &[(4.0, 4.0), (30.0, 4.0)]);

        cache.render(&doc, SIZE);
        cache.render(&doc, SIZE);
        assert_eq!(cache.stats().committed_rebuilds, 1);

        doc.begin_stroke(Point::new(4.0, 20.0), Color::BLUE, 2.0);
        doc.extend_stroke(Point::new(10.0, 20.0));
        cache.render(&doc, SIZE);
        assert_eq!(cache.stats().committed_rebuilds, 1);

        doc.cancel_stroke();
        doc.move_strokes(&[0], Vector::new(1.0, 1.0)).unwrap();
        cache.render(&doc, SIZE);
        assert_eq!(cache.stats().committed_rebuilds, 2);

        history.undo(&mut doc);
        let frame = cache.render(&doc, SIZE);
        assert!(frame.pixels.iter().all(|&byte| byte == 0));
        assert_eq!(cache.stats().committed_rebuilds, 3);
    }

    #[test]
    fn pixel_offsets_beyond_u32_range_are_skipped() {
        let mut pixels = vec![0u8; 16];
        set_pixel_rgba(&mut pixels, 70_000, 3, 70_000, Color::RED);
        set_pixel_rgba(&mut pixels, 2, -1, 0, Color::RED);
        assert!(pixels.iter().all(|&byte| byte == 0));
        set_pixel_rgba(&mut pixels, 2, 1, 1, Color::RED);
        assert_eq!(&pixels[12..16], &Color::RED.to_rgba_array());
    }

    #[test]
    fn strokes_land_in_frame() {
        let mut doc = Document::default();
        let mut history = CommandHistory::default();
        let mut cache = RenderCache::default();
        commit(&mut doc, &mut history, &[(4.0, 10.0), (40.0, 10.0)]);

        let frame = cache.render(&doc, SIZE);
        assert_eq!(pixel(frame.pixels, 20, 10), Color::RED.to_rgba_array());
        assert_eq!(pixel(frame.pixels, 20, 20), [0, 0, 0, 0]);
    }

    #[test]
    fn short_active_stroke_is_drawn_as_tail_only() {
        let mut doc = Document::default();
        let mut cache = RenderCache::new(8);
        doc.begin_stroke(Point::new(1.0, 1.0), Color::RED, 2.0);
        for i in 1..=5 {
            doc.extend_stroke(Point::new(1.0 + i as f32 * 2.0, 1.0));
        }
        cache.render(&doc, SIZE);
        assert_eq!(cache.stats().active_segments_cached, 0);
        assert_eq!(cache.stats().tail_segments_last_frame, 5);
    }

    #[test]
    fn long_active_stroke_flushes_prefix_incrementally() {
        let mut doc = Document::default();
        let mut cache = RenderCache::new(8);
        doc.begin_stroke(Point::new(1.0, 1.0), Color::RED, 2.0);
        for i in 1..=40 {
            doc.extend_stroke(Point::new(1.0 + i as f32, 1.0 + (i % 7) as f32));
            cache.render(&doc, SIZE);
            assert!(cache.stats().tail_segments_last_frame <= cache.active_threshold());
        }
        let stats = cache.stats();
        assert_eq!(stats.active_resets, 1);
        assert_eq!(stats.active_segments_cached, (40 - TAIL_SEGMENTS) as u64);
        assert_eq!(stats.tail_segments_last_frame, TAIL_SEGMENTS);
    }

    #[test]
    fn incremental_frame_matches_full_replay() {
        let mut doc = Document::default();
        let mut history = CommandHistory::default();
        commit(&mut doc, &mut history, &[(2.0, 2.0), (60.0, 28.0)]);

        let mut incremental = RenderCache::new(6);
        doc.begin_stroke(Point::new(2.0, 28.0), Color::BLUE, 4.0);
        for i in 1..=30 {
            doc.extend_stroke(Point::new(2.0 + i as f32 * 2.0, 28.0 - (i % 5) as f32 * 3.0));
            incremental.render(&doc, SIZE);
        }
        let frame = incremental.render(&doc, SIZE).pixels.to_vec();
        assert_eq!(frame, render_document_to_rgba(&doc, SIZE));
    }

    #[test]
    fn straight_line_rewrite_resets_active_cache() {
        let mut doc = Document::default();
        let mut cache = RenderCache::new(6);
        doc.begin_stroke(Point::new(1.0, 1.0), Color::RED, 2.0);
        for i in 1..=20 {
            doc.extend_stroke(Point::new(1.0 + i as f32 * 2.0, 5.0));
        }
        cache.render(&doc, SIZE);
        doc.constrain_stroke_to_line(Point::new(40.0, 30.0));
        let frame = cache.render(&doc, SIZE).pixels.to_vec();
        assert_eq!(cache.stats().active_resets, 2);
        assert_eq!(frame, render_document_to_rgba(&doc, SIZE));
    }

    #[test]
    fn text_annotations_are_reported_as_overlays() {
        let mut doc = Document::default();
        let mut history = CommandHistory::default();
        let add = doc
            .add_text("label", Point::new(3.0, 4.0), 18.0, Color::YELLOW)
            .unwrap();
        history.push(add, &mut doc).unwrap();
        let mut cache = RenderCache::default();
        let frame = cache.render(&doc, SIZE);
        assert_eq!(
            frame.texts,
            vec![TextOverlay {
                text: "label".into(),
                position: Point::new(3.0, 4.0),
                size: 18.0,
                color: Color::YELLOW,
                editing: false,
            }]
        );
    }

    #[test]
    fn bgra_conversion_swaps_red_and_blue() {
        let rgba = [1, 2, 3, 4, 5, 6, 7, 8];
        let mut bgra = [0; 8];
        convert_rgba_to_bgra(&rgba, &mut bgra);
        assert_eq!(bgra, [3, 2, 1, 4, 7, 6, 5, 8]);
    }

    #[test]
    fn translucent_layer_blends_over_opaque() {
        let src = [255, 0, 0, 128];
        let mut dst = [0, 0, 255, 255];
        blend_layer(&src, &mut dst);
        assert_eq!(dst[3], 255);
        assert!(dst[0] > 120 && dst[2] > 120);
    }
}
