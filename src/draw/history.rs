use crate::draw::document::Document;
use crate::draw::error::DrawResult;
use crate::draw::model::{Point, StrokeBuffer, StrokeData, TextAnnotation, TextContent};

/// One reversible document edit. Commands own copies of everything they
/// need; they never alias the document's buffers.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddStroke {
        index: usize,
        stroke: StrokeData,
    },
    EraseStroke {
        index: usize,
        stroke: StrokeData,
    },
    MoveStrokes {
        indices: Vec<usize>,
        original: Vec<Vec<Point>>,
        moved: Vec<Vec<Point>>,
    },
    AddText {
        index: usize,
        text: TextAnnotation,
    },
    EraseText {
        index: usize,
        text: TextAnnotation,
    },
    EditText {
        index: usize,
        before: TextContent,
        after: TextContent,
    },
    MoveText {
        index: usize,
        from: Point,
        to: Point,
    },
    ClearAll {
        strokes: StrokeBuffer,
        texts: Vec<TextAnnotation>,
        /// Redo stack as it stood when the clear was pushed.
        redo: Vec<Command>,
    },
}

impl Command {
    pub fn description(&self) -> &'static str {
        match self {
            Command::AddStroke { .. } => "Add Stroke",
            Command::EraseStroke { .. } => "Erase Stroke",
            Command::MoveStrokes { .. } => "Move Strokes",
            Command::AddText { .. } => "Add Text",
            Command::EraseText { .. } => "Erase Text",
            Command::EditText { .. } => "Edit Text",
            Command::MoveText { .. } => "Move Text",
            Command::ClearAll { .. } => "Clear All",
        }
    }

    pub(crate) fn apply(&self, doc: &mut Document) -> DrawResult<()> {
        match self {
            Command::AddStroke { index, stroke } => doc.insert_stroke(*index, stroke.clone()),
            Command::EraseStroke { index, .. } => doc.remove_stroke(*index).map(|_| ()),
            Command::MoveStrokes { indices, moved, .. } => doc.replace_stroke_points(indices, moved),
            Command::AddText { index, text } => doc.insert_text(*index, text.clone()),
            Command::EraseText { index, .. } => doc.remove_text(*index).map(|_| ()),
            Command::EditText { index, after, .. } => doc.set_text_content(*index, after.clone()),
            Command::MoveText { index, to, .. } => doc.set_text_position(*index, *to),
            Command::ClearAll { .. } => {
                doc.replace_contents(StrokeBuffer::default(), Vec::new());
                Ok(())
            }
        }
    }

    pub(crate) fn revert(&self, doc: &mut Document) -> DrawResult<()> {
        match self {
            Command::AddStroke { index, .. } => doc.remove_stroke(*index).map(|_| ()),
            Command::EraseStroke { index, stroke } => doc.insert_stroke(*index, stroke.clone()),
            Command::MoveStrokes {
                indices, original, ..
            } => doc.replace_stroke_points(indices, original),
            Command::AddText { index, .. } => doc.remove_text(*index).map(|_| ()),
            Command::EraseText { index, text } => doc.insert_text(*index, text.clone()),
            Command::EditText { index, before, .. } => {
                doc.set_text_content(*index, before.clone())
            }
            Command::MoveText { index, from, .. } => doc.set_text_position(*index, *from),
            Command::ClearAll { strokes, texts, .. } => {
                doc.replace_contents(strokes.clone(), texts.clone());
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommandHistory {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
}

impl CommandHistory {
    /// Applies `command` to the document and records it.
    pub fn push(&mut self, command: Command, doc: &mut Document) -> DrawResult<()> {
        command.apply(doc)?;
        self.record(command);
        Ok(())
    }

    /// Records a command whose forward effect is already in the document,
    /// such as a drag that moved strokes live.
    pub fn record(&mut self, mut command: Command) {
        let discarded = match &mut command {
            Command::ClearAll { redo, .. } => {
                *redo = std::mem::take(&mut self.redo_stack);
                0
            }
            _ => {
                let count = self.redo_stack.len();
                self.redo_stack.clear();
                count
            }
        };
        tracing::debug!(
            command = command.description(),
            discarded_redo = discarded,
            "command recorded"
        );
        self.undo_stack.push(command);
    }

    pub fn undo(&mut self, doc: &mut Document) -> bool {
        let Some(command) = self.undo_stack.pop() else {
            tracing::debug!("nothing to undo");
            return false;
        };
        if let Err(err) = command.revert(doc) {
            tracing::warn!(%err, command = command.description(), "undo failed");
            self.undo_stack.push(command);
            return false;
        }
        if let Command::ClearAll { redo, .. } = &command {
            self.redo_stack = redo.clone();
        }
        tracing::debug!(command = command.description(), "undo");
        self.redo_stack.push(command);
        true
    }

    pub fn redo(&mut self, doc: &mut Document) -> bool {
        let Some(mut command) = self.redo_stack.pop() else {
            tracing::debug!("nothing to redo");
            return false;
        };
        if let Err(err) = command.apply(doc) {
            tracing::warn!(%err, command = command.description(), "redo failed");
            self.redo_stack.push(command);
            return false;
        }
        if let Command::ClearAll { redo, .. } = &mut command {
            *redo = std::mem::take(&mut self.redo_stack);
        }
        tracing::debug!(command = command.description(), "redo");
        self.undo_stack.push(command);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn undo_commands(&self) -> &[Command] {
        &self.undo_stack
    }

    pub fn redo_commands(&self) -> &[Command] {
        &self.redo_stack
    }

    pub fn undo_description(&self) -> Option<&'static str> {
        self.undo_stack.last().map(Command::description)
    }

    pub fn redo_description(&self) -> Option<&'static str> {
        self.redo_stack.last().map(Command::description)
    }
}
