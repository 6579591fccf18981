/// Interaction mode of the document. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    #[default]
    Idle,
    Drawing,
    Erasing,
    Dragging,
    TextEditing,
}

impl DrawMode {
    pub fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Every non-idle mode is entered from and returns to `Idle`.
pub fn can_transition(from: DrawMode, to: DrawMode) -> bool {
    matches!(
        (from, to),
        (DrawMode::Idle, DrawMode::Drawing)
            | (DrawMode::Idle, DrawMode::Erasing)
            | (DrawMode::Idle, DrawMode::Dragging)
            | (DrawMode::Idle, DrawMode::TextEditing)
            | (DrawMode::Drawing, DrawMode::Idle)
            | (DrawMode::Erasing, DrawMode::Idle)
            | (DrawMode::Dragging, DrawMode::Idle)
            | (DrawMode::TextEditing, DrawMode::Idle)
    ) || from == to
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_mode_cannot_be_entered_while_busy() {
        assert!(can_transition(DrawMode::Idle, DrawMode::Drawing));
        assert!(!can_transition(DrawMode::Drawing, DrawMode::Erasing));
        assert!(!can_transition(DrawMode::Dragging, DrawMode::TextEditing));
        assert!(!can_transition(DrawMode::TextEditing, DrawMode::Drawing));
        assert!(can_transition(DrawMode::Erasing, DrawMode::Idle));
    }
}
