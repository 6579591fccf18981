#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawError {
    InvalidStrokeIndex { index: usize, len: usize },
    InvalidTextIndex { index: usize, len: usize },
}

impl std::fmt::Display for DrawError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DrawError::InvalidStrokeIndex { index, len } => {
                write!(f, "stroke index {index} out of range (stroke count {len})")
            }
            DrawError::InvalidTextIndex { index, len } => {
                write!(f, "text index {index} out of range (text count {len})")
            }
        }
    }
}

impl std::error::Error for DrawError {}

pub type DrawResult<T> = Result<T, DrawError>;
