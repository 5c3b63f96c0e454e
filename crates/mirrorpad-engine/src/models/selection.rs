use serde::{Deserialize, Serialize};

/// Caret/selection as a pair of character offsets into the single text node.
///
/// Offsets count characters, not bytes. A collapsed selection (`start == end`)
/// is a plain caret.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionOffsets {
    pub start: usize,
    pub end: usize,
}

impl SelectionOffsets {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn caret(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Clamp both ends into `[0, len]`, swapping them if they arrive reversed
    pub fn clamped(self, len: usize) -> Self {
        let start = self.start.min(len);
        let end = self.end.min(len);
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }
}
