//! Pen and mouse annotation engine for a transparent screen overlay.
//!
//! The hosting window owns an [`draw::AnnotationCanvas`], forwards pointer
//! and shortcut events to it, and paints the frames it renders.

pub mod draw;
pub mod logging;
