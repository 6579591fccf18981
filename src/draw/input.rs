use crate::draw::document::Document;
use crate::draw::error::DrawResult;
use crate::draw::geometry::PointSmoother;
use crate::draw::history::{Command, CommandHistory};
use crate::draw::model::{Color, Point};
use crate::draw::settings::InkSettings;
use crate::draw::state::DrawMode;

/// Raw samples closer than this to the previous one are dropped.
const MIN_POINT_DIST_SQ: f32 = 1.0;
const MIN_PRESSURE_SCALE: f32 = 0.1;

/// Modifier state already decoded by the keyboard collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerModifiers {
    /// Constrain the stroke to a straight line from its first point.
    pub shift: bool,
    /// Erase with the pen for this gesture.
    pub erase: bool,
    /// Pick up and move strokes or text instead of drawing.
    pub drag: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub point: Point,
    pub pressure: f32,
    pub modifiers: PointerModifiers,
    pub in_proximity: bool,
}

impl PointerSample {
    pub fn at(point: Point) -> Self {
        Self {
            point,
            pressure: 1.0,
            modifiers: PointerModifiers::default(),
            in_proximity: true,
        }
    }

    pub fn with_modifiers(mut self, modifiers: PointerModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_pressure(mut self, pressure: f32) -> Self {
        self.pressure = pressure;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(PointerSample),
    Drag(PointerSample),
    Up(PointerSample),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Undo,
    Redo,
    ClearAll,
    ToggleEraser,
    CancelInteraction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// Nothing changed.
    Ignored,
    /// Transient state changed (stroke in progress, live drag).
    Updated,
    /// A command landed on the undo stack.
    Recorded,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolState {
    pub color: Color,
    pub width: f32,
    pub text_size: f32,
    pub eraser: bool,
    pub enable_pressure: bool,
}

impl ToolState {
    fn from_settings(settings: &InkSettings) -> Self {
        Self {
            color: settings.stroke_color,
            width: settings.stroke_width,
            text_size: settings.text_size,
            eraser: false,
            enable_pressure: settings.enable_pressure,
        }
    }

    fn stroke_width(&self, pressure: f32) -> f32 {
        if self.enable_pressure && pressure > 0.0 {
            self.width * pressure.clamp(MIN_PRESSURE_SCALE, 1.0)
        } else {
            self.width
        }
    }
}

/// Turns normalized pointer and shortcut events into document edits.
#[derive(Debug, Clone, PartialEq)]
pub struct InputRouter {
    tool: ToolState,
    smoother: PointSmoother,
    last_raw: Option<Point>,
}

impl Default for InputRouter {
    fn default() -> Self {
        Self::new(&InkSettings::default())
    }
}

impl InputRouter {
    pub fn new(settings: &InkSettings) -> Self {
        Self {
            tool: ToolState::from_settings(settings),
            smoother: PointSmoother::new(settings.smoothing_level),
            last_raw: None,
        }
    }

    pub fn tool(&self) -> &ToolState {
        &self.tool
    }

    pub fn set_color(&mut self, color: Color) {
        self.tool.color = color;
    }

    pub fn set_eraser(&mut self, eraser: bool) {
        self.tool.eraser = eraser;
    }

    pub fn smoothing_level(&self) -> usize {
        self.smoother.level()
    }

    /// Applies new tool settings; strokes already drawn are untouched.
    pub fn apply_settings(&mut self, settings: &InkSettings) {
        let eraser = self.tool.eraser;
        self.tool = ToolState {
            eraser,
            ..ToolState::from_settings(settings)
        };
        self.smoother.set_level(settings.smoothing_level);
    }

    pub fn handle_pointer(
        &mut self,
        event: PointerEvent,
        doc: &mut Document,
        history: &mut CommandHistory,
    ) -> DrawResult<InputOutcome> {
        match event {
            PointerEvent::Down(sample) => Ok(self.handle_down(sample, doc, history)),
            PointerEvent::Drag(sample) => self.handle_drag(sample, doc, history),
            PointerEvent::Up(sample) => self.handle_up(sample, doc, history),
        }
    }

    fn handle_down(
        &mut self,
        sample: PointerSample,
        doc: &mut Document,
        history: &mut CommandHistory,
    ) -> InputOutcome {
        if !sample.in_proximity {
            return InputOutcome::Ignored;
        }
        if sample.modifiers.drag {
            return if doc.begin_drag(sample.point) {
                InputOutcome::Updated
            } else {
                InputOutcome::Ignored
            };
        }
        if self.tool.eraser || sample.modifiers.erase {
            if !doc.begin_erase() {
                return InputOutcome::Ignored;
            }
            return self.erase_at(sample.point, doc, history);
        }

        self.smoother.clear();
        let start = self.smoother.push(sample.point);
        let width = self.tool.stroke_width(sample.pressure);
        if !doc.begin_stroke(start, self.tool.color, width) {
            return InputOutcome::Ignored;
        }
        self.last_raw = Some(sample.point);
        InputOutcome::Updated
    }

    fn handle_drag(
        &mut self,
        sample: PointerSample,
        doc: &mut Document,
        history: &mut CommandHistory,
    ) -> DrawResult<InputOutcome> {
        match doc.mode() {
            DrawMode::Drawing => Ok(self.extend(sample, doc)),
            DrawMode::Erasing => Ok(self.erase_at(sample.point, doc, history)),
            DrawMode::Dragging => Ok(if doc.drag_to(sample.point)? {
                InputOutcome::Updated
            } else {
                InputOutcome::Ignored
            }),
            DrawMode::Idle | DrawMode::TextEditing => Ok(InputOutcome::Ignored),
        }
    }

    fn handle_up(
        &mut self,
        sample: PointerSample,
        doc: &mut Document,
        history: &mut CommandHistory,
    ) -> DrawResult<InputOutcome> {
        match doc.mode() {
            DrawMode::Drawing => {
                self.extend(sample, doc);
                self.smoother.clear();
                self.last_raw = None;
                match doc.commit_stroke() {
                    Some(command) => self.push(command, doc, history),
                    None => Ok(InputOutcome::Updated),
                }
            }
            DrawMode::Erasing => {
                let outcome = self.erase_at(sample.point, doc, history);
                doc.end_erase();
                Ok(outcome)
            }
            DrawMode::Dragging => {
                let moved = doc.drag_to(sample.point);
                let command = doc.end_drag();
                moved?;
                match command {
                    Some(command) => {
                        history.record(command);
                        Ok(InputOutcome::Recorded)
                    }
                    None => Ok(InputOutcome::Updated),
                }
            }
            DrawMode::Idle | DrawMode::TextEditing => Ok(InputOutcome::Ignored),
        }
    }

    fn extend(&mut self, sample: PointerSample, doc: &mut Document) -> InputOutcome {
        if sample.modifiers.shift {
            doc.constrain_stroke_to_line(sample.point);
            return InputOutcome::Updated;
        }
        if !should_append_point(self.last_raw, sample.point) {
            return InputOutcome::Ignored;
        }
        self.last_raw = Some(sample.point);
        let point = self.smoother.push(sample.point);
        if doc.extend_stroke(point) {
            InputOutcome::Updated
        } else {
            InputOutcome::Ignored
        }
    }

    /// Erases the topmost stroke under `point`, or failing that the text.
    fn erase_at(
        &mut self,
        point: Point,
        doc: &mut Document,
        history: &mut CommandHistory,
    ) -> InputOutcome {
        let command = doc.erase_at(point).or_else(|| {
            doc.find_text_at(point)
                .and_then(|index| doc.erase_text(index).ok())
        });
        match command {
            Some(command) => match self.push(command, doc, history) {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::warn!(%err, "erase rejected");
                    InputOutcome::Ignored
                }
            },
            None => InputOutcome::Ignored,
        }
    }

    fn push(
        &mut self,
        command: Command,
        doc: &mut Document,
        history: &mut CommandHistory,
    ) -> DrawResult<InputOutcome> {
        history.push(command, doc)?;
        Ok(InputOutcome::Recorded)
    }

    pub fn handle_shortcut(
        &mut self,
        shortcut: Shortcut,
        doc: &mut Document,
        history: &mut CommandHistory,
    ) -> bool {
        match shortcut {
            Shortcut::Undo => {
                self.cancel(doc);
                history.undo(doc)
            }
            Shortcut::Redo => {
                self.cancel(doc);
                history.redo(doc)
            }
            Shortcut::ClearAll => match doc.clear_all() {
                Some(command) => history.push(command, doc).is_ok(),
                None => false,
            },
            Shortcut::ToggleEraser => {
                self.tool.eraser = !self.tool.eraser;
                true
            }
            Shortcut::CancelInteraction => {
                let busy = !doc.mode().is_idle();
                self.cancel(doc);
                busy
            }
        }
    }

    fn cancel(&mut self, doc: &mut Document) {
        doc.cancel_interaction();
        self.smoother.clear();
        self.last_raw = None;
    }
}

fn should_append_point(last: Option<Point>, point: Point) -> bool {
    match last {
        Some(last) => last.distance_sq(point) >= MIN_POINT_DIST_SQ,
        None => true,
    }
}
