//! Single entry point owning the document, its history, the render cache
//! and the input router. The hosting window forwards events here and paints
//! whatever [`AnnotationCanvas::render`] hands back.

use crate::draw::document::{Document, Selection};
use crate::draw::error::DrawResult;
use crate::draw::history::{Command, CommandHistory};
use crate::draw::input::{InputOutcome, InputRouter, PointerEvent, Shortcut};
use crate::draw::model::{Color, Point};
use crate::draw::render::{RenderCache, RenderFrame, RenderStats};
use crate::draw::settings::InkSettings;

#[derive(Debug)]
pub struct AnnotationCanvas {
    document: Document,
    history: CommandHistory,
    cache: RenderCache,
    router: InputRouter,
    settings: InkSettings,
}

impl Default for AnnotationCanvas {
    fn default() -> Self {
        Self::new(InkSettings::default())
    }
}

impl AnnotationCanvas {
    pub fn new(mut settings: InkSettings) -> Self {
        settings.sanitize();
        Self {
            document: Document::new(settings.tolerances()),
            history: CommandHistory::default(),
            cache: RenderCache::new(settings.active_cache_threshold),
            router: InputRouter::new(&settings),
            settings,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn settings(&self) -> &InkSettings {
        &self.settings
    }

    pub fn router(&self) -> &InputRouter {
        &self.router
    }

    /// Replaces the tool configuration. Existing content keeps its style.
    pub fn apply_settings(&mut self, mut settings: InkSettings) {
        settings.sanitize();
        self.document.set_tolerances(settings.tolerances());
        self.cache.set_active_threshold(settings.active_cache_threshold);
        self.router.apply_settings(&settings);
        tracing::debug!(
            width = settings.stroke_width,
            smoothing = settings.smoothing_level,
            "ink settings applied"
        );
        self.settings = settings;
    }

    pub fn set_color(&mut self, color: Color) {
        self.settings.stroke_color = color;
        self.router.set_color(color);
    }

    pub fn select_preset(&mut self, slot: usize) -> bool {
        match self.settings.preset_color(slot) {
            Some(color) => {
                self.set_color(color);
                true
            }
            None => false,
        }
    }

    pub fn set_eraser(&mut self, eraser: bool) {
        self.router.set_eraser(eraser);
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> DrawResult<InputOutcome> {
        self.router
            .handle_pointer(event, &mut self.document, &mut self.history)
    }

    pub fn handle_shortcut(&mut self, shortcut: Shortcut) -> bool {
        self.router
            .handle_shortcut(shortcut, &mut self.document, &mut self.history)
    }

    pub fn undo(&mut self) -> bool {
        self.handle_shortcut(Shortcut::Undo)
    }

    pub fn redo(&mut self) -> bool {
        self.handle_shortcut(Shortcut::Redo)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn clear_all(&mut self) -> bool {
        self.handle_shortcut(Shortcut::ClearAll)
    }

    pub fn cancel_interaction(&mut self) -> bool {
        self.handle_shortcut(Shortcut::CancelInteraction)
    }

    pub fn select_at(&mut self, point: Point) -> Selection {
        self.document.select_at(point)
    }

    /// Starts editing the text under `point`, or a new annotation there.
    pub fn begin_text_at(&mut self, point: Point) -> DrawResult<bool> {
        if let Some(index) = self.document.find_text_at(point) {
            return self.document.begin_text_edit(index);
        }
        Ok(self.document.begin_text_input(
            point,
            self.settings.text_size,
            self.settings.stroke_color,
        ))
    }

    pub fn set_text_style(&mut self, size: f32, color: Color) {
        self.document.set_draft_style(size, color);
    }

    /// Finishes text entry. Returns whether a command was recorded.
    pub fn commit_text(&mut self, text: &str) -> DrawResult<bool> {
        match self.document.commit_text(text)? {
            Some(command) => self.execute(command).map(|()| true),
            None => Ok(false),
        }
    }

    pub fn cancel_text(&mut self) {
        self.document.cancel_text();
    }

    pub fn add_text(&mut self, text: &str, position: Point) -> DrawResult<bool> {
        self.settle();
        let command = self.document.add_text(
            text,
            position,
            self.settings.text_size,
            self.settings.stroke_color,
        );
        match command {
            Some(command) => self.execute(command).map(|()| true),
            None => Ok(false),
        }
    }

    pub fn edit_text(&mut self, index: usize, text: &str, size: f32, color: Color) -> DrawResult<bool> {
        self.settle();
        match self.document.edit_text(index, text, size, color)? {
            Some(command) => self.execute(command).map(|()| true),
            None => Ok(false),
        }
    }

    pub fn erase_text(&mut self, index: usize) -> DrawResult<()> {
        self.settle();
        let command = self.document.erase_text(index)?;
        self.execute(command)
    }

    /// Applies `command` and records it for undo. Any drag or text edit in
    /// progress is cancelled first.
    pub fn execute(&mut self, command: Command) -> DrawResult<()> {
        self.settle();
        tracing::debug!(command = command.description(), "executing command");
        self.history.push(command, &mut self.document)
    }

    fn settle(&mut self) {
        if !self.document.mode().is_idle() {
            tracing::debug!(mode = ?self.document.mode(), "interaction cancelled by direct edit");
            self.handle_shortcut(Shortcut::CancelInteraction);
        }
    }

    pub fn render(&mut self, size: (u32, u32)) -> RenderFrame<'_> {
        self.cache.render(&self.document, size)
    }

    pub fn render_stats(&self) -> RenderStats {
        self.cache.stats()
    }
}
