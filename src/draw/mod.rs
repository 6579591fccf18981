pub mod canvas;
pub mod document;
pub mod error;
pub mod geometry;
pub mod history;
pub mod input;
pub mod model;
pub mod render;
pub mod settings;
pub mod settings_store;
pub mod state;

pub use canvas::AnnotationCanvas;
pub use document::{Document, Selection, Tolerances};
pub use error::{DrawError, DrawResult};
pub use history::{Command, CommandHistory};
pub use input::{InputOutcome, InputRouter, PointerEvent, PointerModifiers, PointerSample, Shortcut};
pub use model::{Color, Point, StrokeBuffer, TextAnnotation, Vector};
pub use render::{RenderCache, RenderFrame, RenderStats, TextOverlay};
pub use settings::InkSettings;
