//! The annotation document: committed strokes, text annotations, the stroke
//! being drawn, and selection/drag/text-edit state.
//!
//! Interactive operations return the [`Command`] describing the edit; the
//! document itself is only mutated when a command is applied through
//! [`CommandHistory`](crate::draw::history::CommandHistory), or live while a
//! drag is in progress.

use crate::draw::error::{DrawError, DrawResult};
use crate::draw::geometry::{self, DEFAULT_INTERSECTION_TOLERANCE_FACTOR};
use crate::draw::history::Command;
use crate::draw::model::{
    Bounds, Color, Point, StrokeBuffer, StrokeData, StrokeRef, TextAnnotation, TextContent,
    TextState, Vector,
};
use crate::draw::state::{can_transition, DrawMode};
use std::collections::{BTreeSet, VecDeque};

pub const DEFAULT_ERASER_RADIUS: f32 = 8.0;
pub const DEFAULT_HIT_TOLERANCE: f32 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Added to half the stroke width when erasing.
    pub eraser_radius: f32,
    /// Added to half the stroke width when selecting.
    pub hit_tolerance: f32,
    /// Multiplier on the wider stroke's width for "touching" strokes.
    pub intersection_factor: f32,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            eraser_radius: DEFAULT_ERASER_RADIUS,
            hit_tolerance: DEFAULT_HIT_TOLERANCE,
            intersection_factor: DEFAULT_INTERSECTION_TOLERANCE_FACTOR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Stroke(usize),
    Text(usize),
}

/// Borrowed view of the stroke being drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveStrokeView<'a> {
    pub points: &'a [Point],
    pub color: Color,
    pub width: f32,
    /// Changes whenever the point list is rewritten rather than appended to.
    pub epoch: u64,
}

#[derive(Debug, Clone, PartialEq)]
struct ActiveStroke {
    points: Vec<Point>,
    color: Color,
    width: f32,
    epoch: u64,
}

#[derive(Debug, Clone, PartialEq)]
enum DragTarget {
    Strokes {
        indices: Vec<usize>,
        original: Vec<Vec<Point>>,
    },
    Text {
        index: usize,
        from: Point,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct DragState {
    target: DragTarget,
    last: Point,
    total: Vector,
}

#[derive(Debug, Clone, PartialEq)]
enum TextDraft {
    New {
        position: Point,
        size: f32,
        color: Color,
    },
    Existing {
        index: usize,
        size: f32,
        color: Color,
    },
}

/// Comparable copy of the document's persistent content.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub strokes: StrokeBuffer,
    pub texts: Vec<TextAnnotation>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    strokes: StrokeBuffer,
    texts: Vec<TextAnnotation>,
    mode: DrawMode,
    active: Option<ActiveStroke>,
    next_epoch: u64,
    selection: Selection,
    related: BTreeSet<usize>,
    drag: Option<DragState>,
    text_draft: Option<TextDraft>,
    tolerances: Tolerances,
    revision: u64,
}

impl Document {
    pub fn new(tolerances: Tolerances) -> Self {
        Self {
            tolerances,
            ..Self::default()
        }
    }

    pub fn tolerances(&self) -> Tolerances {
        self.tolerances
    }

    pub fn set_tolerances(&mut self, tolerances: Tolerances) {
        self.tolerances = tolerances;
    }

    pub fn strokes(&self) -> &StrokeBuffer {
        &self.strokes
    }

    pub fn texts(&self) -> &[TextAnnotation] {
        &self.texts
    }

    pub fn text(&self, index: usize) -> DrawResult<&TextAnnotation> {
        self.texts.get(index).ok_or(DrawError::InvalidTextIndex {
            index,
            len: self.texts.len(),
        })
    }

    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn related_strokes(&self) -> &BTreeSet<usize> {
        &self.related
    }

    /// Bumped on every change to committed stroke geometry or order.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn active_stroke(&self) -> Option<ActiveStrokeView<'_>> {
        self.active.as_ref().map(|active| ActiveStrokeView {
            points: &active.points,
            color: active.color,
            width: active.width,
            epoch: active.epoch,
        })
    }

    pub fn editing_text(&self) -> Option<usize> {
        match self.text_draft {
            Some(TextDraft::Existing { index, .. }) => Some(index),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            strokes: self.strokes.clone(),
            texts: self.texts.clone(),
        }
    }

    fn enter_mode(&mut self, mode: DrawMode) -> bool {
        if !self.mode.is_idle() || !can_transition(self.mode, mode) {
            tracing::debug!(current = ?self.mode, requested = ?mode, "mode change rejected");
            return false;
        }
        self.mode = mode;
        true
    }

    fn leave_mode(&mut self, mode: DrawMode) {
        if self.mode == mode {
            self.mode = DrawMode::Idle;
        }
    }

    fn next_epoch(&mut self) -> u64 {
        self.next_epoch += 1;
        self.next_epoch
    }

    fn check_stroke(&self, index: usize) -> DrawResult<()> {
        self.strokes.stroke(index).map(|_| ())
    }

    fn check_text(&self, index: usize) -> DrawResult<()> {
        self.text(index).map(|_| ())
    }

    // ---------------------------------------------------------------------
    // Freehand strokes
    // ---------------------------------------------------------------------

    pub fn begin_stroke(&mut self, point: Point, color: Color, width: f32) -> bool {
        if !self.enter_mode(DrawMode::Drawing) {
            return false;
        }
        let epoch = self.next_epoch();
        self.active = Some(ActiveStroke {
            points: vec![point],
            color,
            width,
            epoch,
        });
        true
    }

    pub fn extend_stroke(&mut self, point: Point) -> bool {
        match self.active.as_mut() {
            Some(active) => {
                active.points.push(point);
                true
            }
            None => false,
        }
    }

    /// Collapses the stroke to a straight segment from its first point.
    pub fn constrain_stroke_to_line(&mut self, end: Point) -> bool {
        if self.active.is_none() {
            return false;
        }
        let epoch = self.next_epoch();
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        let start = active.points[0];
        active.points.clear();
        active.points.extend([start, end]);
        active.epoch = epoch;
        true
    }

    /// Ends the stroke in progress. Fewer than two points is a tap and
    /// yields nothing.
    pub fn commit_stroke(&mut self) -> Option<Command> {
        let active = self.active.take()?;
        self.leave_mode(DrawMode::Drawing);
        if active.points.len() < 2 {
            tracing::trace!(points = active.points.len(), "discarding degenerate stroke");
            return None;
        }
        Some(Command::AddStroke {
            index: self.strokes.len(),
            stroke: StrokeData {
                points: active.points,
                color: active.color,
                width: active.width,
            },
        })
    }

    pub fn cancel_stroke(&mut self) {
        self.active = None;
        self.leave_mode(DrawMode::Drawing);
    }

    // ---------------------------------------------------------------------
    // Erasing and hit-testing
    // ---------------------------------------------------------------------

    pub fn begin_erase(&mut self) -> bool {
        self.enter_mode(DrawMode::Erasing)
    }

    pub fn end_erase(&mut self) {
        self.leave_mode(DrawMode::Erasing);
    }

    fn topmost_stroke_within(&self, point: Point, radius: f32) -> Option<usize> {
        self.strokes
            .iter()
            .rev()
            .find(|stroke| {
                geometry::distance_point_to_stroke(point, stroke.points)
                    < radius + stroke.width * 0.5
            })
            .map(|stroke| stroke.index)
    }

    /// Topmost stroke under the eraser, as an erase command.
    pub fn erase_at(&self, point: Point) -> Option<Command> {
        let index = self.topmost_stroke_within(point, self.tolerances.eraser_radius)?;
        let stroke = self.strokes.stroke(index).ok()?.to_data();
        Some(Command::EraseStroke { index, stroke })
    }

    pub fn find_stroke_at(&self, point: Point) -> Option<usize> {
        self.topmost_stroke_within(point, self.tolerances.hit_tolerance)
    }

    pub fn find_text_at(&self, point: Point) -> Option<usize> {
        self.texts
            .iter()
            .enumerate()
            .rev()
            .find(|(_, text)| text.bounds().contains(point))
            .map(|(index, _)| index)
    }

    // ---------------------------------------------------------------------
    // Selection and related strokes
    // ---------------------------------------------------------------------

    /// Connected component of same-color, touching strokes containing `index`.
    pub fn compute_related_strokes(&self, index: usize) -> DrawResult<BTreeSet<usize>> {
        let seed = self.strokes.stroke(index)?;
        let strokes: Vec<StrokeRef<'_>> = self.strokes.iter().collect();
        let bounds: Vec<Option<Bounds>> = strokes.iter().map(StrokeRef::bounds).collect();
        let factor = self.tolerances.intersection_factor;

        let mut visited = vec![false; strokes.len()];
        let mut related = BTreeSet::new();
        let mut queue = VecDeque::new();
        visited[seed.index] = true;
        queue.push_back(seed.index);

        while let Some(current) = queue.pop_front() {
            related.insert(current);
            let stroke = &strokes[current];
            for other in &strokes {
                if visited[other.index] || other.color != stroke.color {
                    continue;
                }
                let tolerance =
                    geometry::intersection_tolerance(stroke.width, other.width, factor);
                let near = match (bounds[current], bounds[other.index]) {
                    (Some(a), Some(b)) => a.inflate(tolerance).intersects(&b),
                    _ => false,
                };
                if near && geometry::strokes_intersect(stroke, other, factor) {
                    visited[other.index] = true;
                    queue.push_back(other.index);
                }
            }
        }
        Ok(related)
    }

    pub fn select_stroke(&mut self, index: usize) -> DrawResult<()> {
        self.related = self.compute_related_strokes(index)?;
        self.selection = Selection::Stroke(index);
        Ok(())
    }

    pub fn select_text(&mut self, index: usize) -> DrawResult<()> {
        self.check_text(index)?;
        self.selection = Selection::Text(index);
        self.related.clear();
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
        self.related.clear();
    }

    /// Selects whatever sits on top at `point`; texts overlay strokes.
    pub fn select_at(&mut self, point: Point) -> Selection {
        if let Some(index) = self.find_text_at(point) {
            if self.select_text(index).is_ok() {
                return self.selection;
            }
        }
        match self.find_stroke_at(point) {
            Some(index) if self.select_stroke(index).is_ok() => {}
            _ => self.clear_selection(),
        }
        self.selection
    }

    // ---------------------------------------------------------------------
    // Moving
    // ---------------------------------------------------------------------

    pub fn move_strokes(&mut self, indices: &[usize], offset: Vector) -> DrawResult<()> {
        for &index in indices {
            self.check_stroke(index)?;
        }
        for &index in indices {
            self.strokes.translate(index, offset)?;
        }
        self.revision += 1;
        Ok(())
    }

    pub fn move_text(&mut self, index: usize, offset: Vector) -> DrawResult<()> {
        self.check_text(index)?;
        let text = &mut self.texts[index];
        text.position = text.position.translated(offset);
        Ok(())
    }

    /// Move command for strokes that have not been moved yet.
    pub fn move_command(&self, indices: &[usize], offset: Vector) -> DrawResult<Command> {
        let mut original = Vec::with_capacity(indices.len());
        let mut moved = Vec::with_capacity(indices.len());
        for &index in indices {
            let points = self.strokes.stroke(index)?.points;
            original.push(points.to_vec());
            moved.push(points.iter().map(|p| p.translated(offset)).collect());
        }
        Ok(Command::MoveStrokes {
            indices: indices.to_vec(),
            original,
            moved,
        })
    }

    pub fn move_text_command(&self, index: usize, offset: Vector) -> DrawResult<Command> {
        let from = self.text(index)?.position;
        Ok(Command::MoveText {
            index,
            from,
            to: from.translated(offset),
        })
    }

    /// Picks up the text or stroke group under `point` and starts dragging.
    pub fn begin_drag(&mut self, point: Point) -> bool {
        if !self.mode.is_idle() {
            tracing::debug!(current = ?self.mode, "drag rejected");
            return false;
        }
        let target = match self.select_at(point) {
            Selection::None => return false,
            Selection::Text(index) => DragTarget::Text {
                index,
                from: self.texts[index].position,
            },
            Selection::Stroke(_) => {
                let indices: Vec<usize> = self.related.iter().copied().collect();
                let original = indices
                    .iter()
                    .filter_map(|&i| self.strokes.stroke(i).ok())
                    .map(|stroke| stroke.points.to_vec())
                    .collect();
                DragTarget::Strokes { indices, original }
            }
        };
        if !self.enter_mode(DrawMode::Dragging) {
            return false;
        }
        self.drag = Some(DragState {
            target,
            last: point,
            total: Vector::ZERO,
        });
        true
    }

    pub fn drag_to(&mut self, point: Point) -> DrawResult<bool> {
        let Some(drag) = self.drag.as_ref() else {
            return Ok(false);
        };
        let offset = drag.last.offset_to(point);
        if offset.is_zero() {
            return Ok(true);
        }
        match drag.target.clone() {
            DragTarget::Strokes { indices, .. } => self.move_strokes(&indices, offset)?,
            DragTarget::Text { index, .. } => self.move_text(index, offset)?,
        }
        if let Some(drag) = self.drag.as_mut() {
            drag.last = point;
            drag.total = drag.total.add(offset);
        }
        Ok(true)
    }

    /// Releases the drag. The returned command is already applied.
    pub fn end_drag(&mut self) -> Option<Command> {
        let drag = self.drag.take()?;
        self.leave_mode(DrawMode::Dragging);
        if drag.total.is_zero() {
            return None;
        }
        match drag.target {
            DragTarget::Strokes { indices, original } => {
                let moved = indices
                    .iter()
                    .filter_map(|&i| self.strokes.stroke(i).ok())
                    .map(|stroke| stroke.points.to_vec())
                    .collect();
                Some(Command::MoveStrokes {
                    indices,
                    original,
                    moved,
                })
            }
            DragTarget::Text { index, from } => Some(Command::MoveText {
                index,
                from,
                to: self.texts.get(index)?.position,
            }),
        }
    }

    fn cancel_drag(&mut self) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        self.leave_mode(DrawMode::Dragging);
        let restored = match drag.target {
            DragTarget::Strokes { indices, original } => {
                self.replace_stroke_points(&indices, &original)
            }
            DragTarget::Text { index, from } => self.set_text_position(index, from),
        };
        if let Err(err) = restored {
            tracing::warn!(%err, "could not restore dragged items");
        }
    }

    // ---------------------------------------------------------------------
    // Text
    // ---------------------------------------------------------------------

    pub fn add_text(
        &self,
        text: &str,
        position: Point,
        size: f32,
        color: Color,
    ) -> Option<Command> {
        if text.trim().is_empty() {
            return None;
        }
        Some(Command::AddText {
            index: self.texts.len(),
            text: TextAnnotation::new(text, position, size, color),
        })
    }

    /// Empty replacement text erases the annotation; an unchanged one is a no-op.
    pub fn edit_text(
        &self,
        index: usize,
        new_text: &str,
        new_size: f32,
        new_color: Color,
    ) -> DrawResult<Option<Command>> {
        let current = self.text(index)?;
        if new_text.trim().is_empty() {
            return self.erase_text(index).map(Some);
        }
        let after = TextContent {
            text: new_text.to_string(),
            size: new_size,
            color: new_color,
        };
        if after == current.content {
            return Ok(None);
        }
        Ok(Some(Command::EditText {
            index,
            before: current.content.clone(),
            after,
        }))
    }

    pub fn erase_text(&self, index: usize) -> DrawResult<Command> {
        let mut text = self.text(index)?.clone();
        text.state = TextState::Idle;
        Ok(Command::EraseText { index, text })
    }

    pub fn begin_text_input(&mut self, position: Point, size: f32, color: Color) -> bool {
        if !self.enter_mode(DrawMode::TextEditing) {
            return false;
        }
        self.text_draft = Some(TextDraft::New {
            position,
            size,
            color,
        });
        true
    }

    pub fn begin_text_edit(&mut self, index: usize) -> DrawResult<bool> {
        let content = self.text(index)?.content.clone();
        if !self.enter_mode(DrawMode::TextEditing) {
            return Ok(false);
        }
        self.texts[index].state = TextState::Editing;
        self.text_draft = Some(TextDraft::Existing {
            index,
            size: content.size,
            color: content.color,
        });
        Ok(true)
    }

    /// Restyles the annotation being edited or typed.
    pub fn set_draft_style(&mut self, new_size: f32, new_color: Color) {
        match self.text_draft.as_mut() {
            Some(TextDraft::New { size, color, .. }) | Some(TextDraft::Existing { size, color, .. }) => {
                *size = new_size;
                *color = new_color;
            }
            None => {}
        }
    }

    pub fn commit_text(&mut self, text: &str) -> DrawResult<Option<Command>> {
        let Some(draft) = self.text_draft.take() else {
            return Ok(None);
        };
        self.leave_mode(DrawMode::TextEditing);
        match draft {
            TextDraft::New {
                position,
                size,
                color,
            } => Ok(self.add_text(text, position, size, color)),
            TextDraft::Existing { index, size, color } => {
                if let Some(annotation) = self.texts.get_mut(index) {
                    annotation.state = TextState::Idle;
                }
                self.edit_text(index, text, size, color)
            }
        }
    }

    pub fn cancel_text(&mut self) {
        if let Some(TextDraft::Existing { index, .. }) = self.text_draft.take() {
            if let Some(annotation) = self.texts.get_mut(index) {
                annotation.state = TextState::Idle;
            }
        }
        self.leave_mode(DrawMode::TextEditing);
    }

    /// Drops whatever interaction is in progress and returns to `Idle`.
    pub fn cancel_interaction(&mut self) {
        match self.mode {
            DrawMode::Idle => {}
            DrawMode::Drawing => self.cancel_stroke(),
            DrawMode::Erasing => self.end_erase(),
            DrawMode::Dragging => self.cancel_drag(),
            DrawMode::TextEditing => self.cancel_text(),
        }
    }

    /// Snapshot of all content for a clear; `None` when already empty.
    pub fn clear_all(&mut self) -> Option<Command> {
        self.cancel_interaction();
        if self.strokes.is_empty() && self.texts.is_empty() {
            return None;
        }
        Some(Command::ClearAll {
            strokes: self.strokes.clone(),
            texts: self.texts.clone(),
            redo: Vec::new(),
        })
    }

    // ---------------------------------------------------------------------
    // Primitive edits used by commands
    // ---------------------------------------------------------------------

    fn structure_changed(&mut self) {
        self.revision += 1;
        self.clear_selection();
    }

    pub(crate) fn insert_stroke(&mut self, index: usize, stroke: StrokeData) -> DrawResult<()> {
        self.strokes.insert(index, stroke)?;
        self.structure_changed();
        Ok(())
    }

    pub(crate) fn remove_stroke(&mut self, index: usize) -> DrawResult<StrokeData> {
        let removed = self.strokes.remove(index)?;
        self.structure_changed();
        Ok(removed)
    }

    pub(crate) fn replace_stroke_points(
        &mut self,
        indices: &[usize],
        points: &[Vec<Point>],
    ) -> DrawResult<()> {
        for (&index, points) in indices.iter().zip(points) {
            if self.strokes.stroke(index)?.points.len() != points.len() {
                return Err(DrawError::InvalidStrokeIndex {
                    index,
                    len: self.strokes.len(),
                });
            }
        }
        for (&index, points) in indices.iter().zip(points) {
            self.strokes.replace_points(index, points)?;
        }
        self.revision += 1;
        Ok(())
    }

    pub(crate) fn insert_text(&mut self, index: usize, mut text: TextAnnotation) -> DrawResult<()> {
        if index > self.texts.len() {
            return Err(DrawError::InvalidTextIndex {
                index,
                len: self.texts.len(),
            });
        }
        text.state = TextState::Idle;
        self.texts.insert(index, text);
        self.clear_selection();
        Ok(())
    }

    pub(crate) fn remove_text(&mut self, index: usize) -> DrawResult<TextAnnotation> {
        self.check_text(index)?;
        self.clear_selection();
        Ok(self.texts.remove(index))
    }

    pub(crate) fn set_text_content(&mut self, index: usize, content: TextContent) -> DrawResult<()> {
        self.check_text(index)?;
        self.texts[index].content = content;
        Ok(())
    }

    pub(crate) fn set_text_position(&mut self, index: usize, position: Point) -> DrawResult<()> {
        self.check_text(index)?;
        self.texts[index].position = position;
        Ok(())
    }

    pub(crate) fn replace_contents(&mut self, strokes: StrokeBuffer, texts: Vec<TextAnnotation>) {
        self.strokes = strokes;
        self.texts = texts;
        for text in &mut self.texts {
            text.state = TextState::Idle;
        }
        self.structure_changed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::history::CommandHistory;

    fn p(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    fn draw(
        doc: &mut Document,
        history: &mut CommandHistory,
        points: &[(f32, f32)],
        color: Color,
        width: f32,
    ) {
        assert!(doc.begin_stroke(p(points[0].0, points[0].1), color, width));
        for &(x, y) in &points[1..] {
            doc.extend_stroke(p(x, y));
        }
        let command = doc.commit_stroke().expect("stroke");
        history.push(command, doc).unwrap();
    }

    #[test]
    fn single_point_commit_is_a_tap() {
        let mut doc = Document::default();
        assert!(doc.begin_stroke(p(1.0, 1.0), Color::RED, 2.0));
        assert_eq!(doc.commit_stroke(), None);
        assert_eq!(doc.strokes().len(), 0);
        assert_eq!(doc.mode(), DrawMode::Idle);
    }

    #[test]
    fn begin_stroke_is_rejected_while_busy() {
        let mut doc = Document::default();
        assert!(doc.begin_text_input(p(0.0, 0.0), 12.0, Color::RED));
        assert!(!doc.begin_stroke(p(1.0, 1.0), Color::RED, 2.0));
        assert!(!doc.begin_erase());
        doc.cancel_text();
        assert!(doc.begin_stroke(p(1.0, 1.0), Color::RED, 2.0));
        assert!(!doc.begin_stroke(p(2.0, 2.0), Color::RED, 2.0));
        assert_eq!(doc.active_stroke().unwrap().points, &[p(1.0, 1.0)]);
    }

    #[test]
    fn constrain_to_line_keeps_start_and_bumps_epoch() {
        let mut doc = Document::default();
        doc.begin_stroke(p(0.0, 0.0), Color::RED, 2.0);
        doc.extend_stroke(p(3.0, 7.0));
        let epoch = doc.active_stroke().unwrap().epoch;
        assert!(doc.constrain_stroke_to_line(p(10.0, 0.0)));
        let active = doc.active_stroke().unwrap();
        assert_eq!(active.points, &[p(0.0, 0.0), p(10.0, 0.0)]);
        assert_ne!(active.epoch, epoch);
    }

    #[test]
    fn constrain_without_active_stroke_leaves_epochs_alone() {
        let mut doc = Document::default();
        assert!(!doc.constrain_stroke_to_line(p(5.0, 5.0)));
        assert!(doc.begin_stroke(p(0.0, 0.0), Color::RED, 2.0));
        assert_eq!(doc.active_stroke().unwrap().epoch, 1);
    }

    #[test]
    fn erase_at_picks_topmost_stroke() {
        let mut doc = Document::default();
        let mut history = CommandHistory::default();
        draw(&mut doc, &mut history, &[(0.0, 0.0), (10.0, 0.0)], Color::RED, 2.0);
        draw(&mut doc, &mut history, &[(5.0, -5.0), (5.0, 5.0)], Color::BLUE, 2.0);

        match doc.erase_at(p(5.0, 0.0)) {
            Some(Command::EraseStroke { index, stroke }) => {
                assert_eq!(index, 1);
                assert_eq!(stroke.color, Color::BLUE);
            }
            other => panic!("unexpected erase result {other:?}"),
        }
        assert_eq!(doc.erase_at(p(100.0, 100.0)), None);
    }

    #[test]
    fn erase_undo_restores_original_draw_order() {
        let mut doc = Document::default();
        let mut history = CommandHistory::default();
        draw(&mut doc, &mut history, &[(0.0, 0.0), (10.0, 0.0)], Color::RED, 2.0);
        draw(&mut doc, &mut history, &[(0.0, 50.0), (10.0, 50.0)], Color::BLUE, 2.0);
        let erase = doc.erase_at(p(5.0, 0.0)).expect("hit");
        history.push(erase, &mut doc).unwrap();
        draw(&mut doc, &mut history, &[(0.0, 90.0), (10.0, 90.0)], Color::GREEN, 2.0);

        // Undo the green stroke and the erase; red comes back first again.
        history.undo(&mut doc);
        history.undo(&mut doc);
        let colors = doc.strokes().colors().to_vec();
        assert_eq!(colors, vec![Color::RED, Color::BLUE]);
    }

    #[test]
    fn related_strokes_follow_color_and_contact() {
        let mut doc = Document::default();
        let mut history = CommandHistory::default();
        // A chain of touching red strokes, a crossing blue one, and a far red one.
        draw(&mut doc, &mut history, &[(0.0, 0.0), (20.0, 0.0)], Color::RED, 2.0);
        draw(&mut doc, &mut history, &[(20.0, 0.0), (20.0, 20.0)], Color::RED, 2.0);
        draw(&mut doc, &mut history, &[(20.0, 20.0), (40.0, 20.0)], Color::RED, 2.0);
        draw(&mut doc, &mut history, &[(10.0, -10.0), (10.0, 10.0)], Color::BLUE, 2.0);
        draw(&mut doc, &mut history, &[(200.0, 200.0), (220.0, 200.0)], Color::RED, 2.0);

        let from_first = doc.compute_related_strokes(0).unwrap();
        assert_eq!(from_first, BTreeSet::from([0, 1, 2]));
        let from_last = doc.compute_related_strokes(2).unwrap();
        assert_eq!(from_last, from_first);
        assert_eq!(doc.compute_related_strokes(3).unwrap(), BTreeSet::from([3]));
        assert_eq!(
            doc.compute_related_strokes(9),
            Err(DrawError::InvalidStrokeIndex { index: 9, len: 5 })
        );
    }

    #[test]
    fn related_strokes_terminate_on_cycles() {
        let mut doc = Document::default();
        let mut history = CommandHistory::default();
        let square = [
            [(0.0, 0.0), (10.0, 0.0)],
            [(10.0, 0.0), (10.0, 10.0)],
            [(10.0, 10.0), (0.0, 10.0)],
            [(0.0, 10.0), (0.0, 0.0)],
        ];
        for side in square {
            draw(&mut doc, &mut history, &side, Color::RED, 2.0);
        }
        assert_eq!(doc.compute_related_strokes(1).unwrap().len(), 4);
    }

    #[test]
    fn drag_moves_connected_component_and_records_exact_points() {
        let mut doc = Document::default();
        let mut history = CommandHistory::default();
        draw(&mut doc, &mut history, &[(0.0, 0.0), (20.0, 0.0)], Color::RED, 2.0);
        draw(&mut doc, &mut history, &[(20.0, 0.0), (20.0, 20.0)], Color::RED, 2.0);
        draw(&mut doc, &mut history, &[(100.0, 100.0), (120.0, 100.0)], Color::RED, 2.0);
        let before = doc.snapshot();

        assert!(doc.begin_drag(p(5.0, 0.0)));
        assert_eq!(doc.mode(), DrawMode::Dragging);
        assert!(doc.drag_to(p(8.0, 4.0)).unwrap());
        assert!(doc.drag_to(p(10.0, 10.0)).unwrap());
        let command = doc.end_drag().expect("moved");
        assert_eq!(doc.mode(), DrawMode::Idle);
        history.record(command);

        assert_eq!(doc.strokes().stroke(1).unwrap().points[1], p(25.0, 30.0));
        assert_eq!(doc.strokes().stroke(2).unwrap().points[0], p(100.0, 100.0));
        let after = doc.snapshot();

        history.undo(&mut doc);
        assert_eq!(doc.snapshot(), before);
        history.redo(&mut doc);
        assert_eq!(doc.snapshot(), after);
    }

    #[test]
    fn drag_on_empty_space_does_nothing() {
        let mut doc = Document::default();
        assert!(!doc.begin_drag(p(5.0, 5.0)));
        assert_eq!(doc.mode(), DrawMode::Idle);
        assert_eq!(doc.end_drag(), None);
    }

    #[test]
    fn text_edit_round_trip() {
        let mut doc = Document::default();
        let mut history = CommandHistory::default();
        assert!(doc.begin_text_input(p(10.0, 10.0), 14.0, Color::RED));
        let add = doc.commit_text("hello").unwrap().expect("text");
        history.push(add, &mut doc).unwrap();
        assert_eq!(doc.find_text_at(p(12.0, 12.0)), Some(0));

        assert!(doc.begin_text_edit(0).unwrap());
        assert_eq!(doc.text(0).unwrap().state, TextState::Editing);
        doc.set_draft_style(20.0, Color::BLUE);
        let edit = doc.commit_text("hello world").unwrap().expect("edit");
        history.push(edit, &mut doc).unwrap();
        let edited = doc.text(0).unwrap();
        assert_eq!(edited.content.text, "hello world");
        assert_eq!(edited.content.size, 20.0);
        assert_eq!(edited.state, TextState::Idle);

        history.undo(&mut doc);
        assert_eq!(doc.text(0).unwrap().content.text, "hello");
        assert_eq!(doc.text(0).unwrap().content.color, Color::RED);
    }

    #[test]
    fn editing_text_to_empty_erases_it() {
        let mut doc = Document::default();
        let mut history = CommandHistory::default();
        let add = doc.add_text("note", p(0.0, 0.0), 12.0, Color::RED).unwrap();
        history.push(add, &mut doc).unwrap();
        let command = doc.edit_text(0, "  ", 12.0, Color::RED).unwrap();
        assert!(matches!(command, Some(Command::EraseText { index: 0, .. })));
        assert_eq!(doc.edit_text(0, "note", 12.0, Color::RED).unwrap(), None);
        assert_eq!(
            doc.edit_text(3, "x", 12.0, Color::RED),
            Err(DrawError::InvalidTextIndex { index: 3, len: 1 })
        );
    }

    #[test]
    fn move_with_stale_index_is_rejected_without_partial_change() {
        let mut doc = Document::default();
        let mut history = CommandHistory::default();
        draw(&mut doc, &mut history, &[(0.0, 0.0), (20.0, 0.0)], Color::RED, 2.0);
        let before = doc.snapshot();
        assert!(doc.move_strokes(&[0, 4], Vector::new(1.0, 1.0)).is_err());
        assert_eq!(doc.snapshot(), before);
    }

    #[test]
    fn structural_change_clears_selection() {
        let mut doc = Document::default();
        let mut history = CommandHistory::default();
        draw(&mut doc, &mut history, &[(0.0, 0.0), (20.0, 0.0)], Color::RED, 2.0);
        assert_eq!(doc.select_at(p(10.0, 0.0)), Selection::Stroke(0));
        assert_eq!(doc.related_strokes().len(), 1);
        history.undo(&mut doc);
        assert_eq!(doc.selection(), Selection::None);
        assert!(doc.related_strokes().is_empty());
    }
}
