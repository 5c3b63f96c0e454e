use std::borrow::Cow;
use xi_rope::Rope;

use crate::models::SelectionOffsets;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    #[error("surface has no text node")]
    Detached,
    #[error("offset {offset} is outside the text node (length {len})")]
    OffsetOutOfRange { offset: usize, len: usize },
}

/// Rendered lines covered by a range; `bottom` is exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub top: usize,
    pub bottom: usize,
}

/// Visible window of the surface, in rendered lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub scroll_top: usize,
    pub height: usize,
}

impl Viewport {
    pub fn contains(&self, span: LineSpan) -> bool {
        span.top >= self.scroll_top && span.bottom <= self.scroll_top + self.height
    }

    /// Scroll position that puts the middle of `span` in the middle of the view
    pub fn centered_on(&self, span: LineSpan) -> usize {
        let middle = (span.top + span.bottom) / 2;
        middle.saturating_sub(self.height / 2)
    }
}

/// The editable region as seen by the sync engine.
///
/// A surface holds at most one text node. Selections are character offsets
/// into that node; the rendering layer translates them into whatever native
/// caret representation it has.
pub trait TextSurface {
    /// Text as currently displayed, whether or not a text node backs it
    fn rendered_text(&self) -> String;

    fn has_text_node(&self) -> bool;

    /// Create a text node from the rendered text so a range can be built over it
    fn synthesize_text_node(&mut self);

    /// Replace the displayed text wholesale. Any existing selection is dropped.
    fn replace_text(&mut self, text: &str);

    /// Active selection over the text node, if there is one
    fn selection(&self) -> Option<SelectionOffsets>;

    fn select(&mut self, offsets: SelectionOffsets) -> Result<(), SurfaceError>;

    /// Lines covered by `offsets`, for scroll decisions
    fn line_span(&self, offsets: SelectionOffsets) -> Result<LineSpan, SurfaceError>;

    fn viewport(&self) -> Viewport;

    fn scroll_to(&mut self, scroll_top: usize);

    fn focus(&mut self) {}
}

const DEFAULT_VIEWPORT_HEIGHT: usize = 24;

/// Plain-text surface over an xi-rope text node.
///
/// Mirrors a content-editable region: setting empty text leaves no text node
/// behind, and replacing the text drops the selection.
#[derive(Debug, Clone)]
pub struct PlainTextSurface {
    node: Option<Rope>,
    /// Fixed end of the selection, in chars
    anchor: usize,
    /// Moving end of the selection (the caret), in chars
    head: usize,
    has_selection: bool,
    focused: bool,
    scroll_top: usize,
    height: usize,
}

impl Default for PlainTextSurface {
    fn default() -> Self {
        Self {
            node: None,
            anchor: 0,
            head: 0,
            has_selection: false,
            focused: false,
            scroll_top: 0,
            height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }
}

impl PlainTextSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: &str) -> Self {
        let mut surface = Self::new();
        surface.replace_text(text);
        surface
    }

    /// Drop the text node, as happens when the host replaces the region's children
    pub fn detach(&mut self) {
        self.node = None;
        self.has_selection = false;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        self.height = height.max(1);
    }

    /// Length of the text node in chars
    pub fn char_len(&self) -> usize {
        self.node.as_ref().map_or(0, |rope| char_count(rope, 0..rope.len()))
    }

    /// Displayed text split into lines, keeping a trailing empty line
    pub fn display_lines(&self) -> Vec<String> {
        self.rendered_text().split('\n').map(str::to_string).collect()
    }

    /// Caret as (line, column in chars)
    pub fn caret_line_col(&self) -> Option<(usize, usize)> {
        let rope = self.node.as_ref()?;
        self.has_selection.then(|| line_col(rope, self.head))
    }

    /// Replace the selection with `text`, creating the text node if needed
    pub fn insert_str(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let (start, end) = self.ordered_or_end();
        let rope = self.node.get_or_insert_with(|| Rope::from(""));
        let range = byte_offset(rope, start)..byte_offset(rope, end);
        rope.edit(range, text);
        self.set_caret(start + text.chars().count());
        true
    }

    pub fn insert_newline(&mut self) -> bool {
        self.insert_str("\n")
    }

    /// Delete the selection, or the char before the caret
    pub fn backspace(&mut self) -> bool {
        let (start, end) = self.ordered_or_end();
        if start != end {
            return self.delete_chars(start, end);
        }
        if start == 0 {
            return false;
        }
        self.delete_chars(start - 1, start)
    }

    /// Delete the selection, or the char after the caret
    pub fn delete_forward(&mut self) -> bool {
        let (start, end) = self.ordered_or_end();
        if start != end {
            return self.delete_chars(start, end);
        }
        if start >= self.char_len() {
            return false;
        }
        self.delete_chars(start, start + 1)
    }

    pub fn move_left(&mut self, extend: bool) {
        let (start, end) = self.ordered_or_end();
        let target = if !extend && start != end {
            start
        } else {
            self.head.saturating_sub(1)
        };
        self.move_head(target, extend);
    }

    pub fn move_right(&mut self, extend: bool) {
        let (start, end) = self.ordered_or_end();
        let target = if !extend && start != end {
            end
        } else {
            (self.head + 1).min(self.char_len())
        };
        self.move_head(target, extend);
    }

    pub fn move_up(&mut self, extend: bool) {
        let Some((line, col)) = self.caret_line_col() else {
            return;
        };
        let target = match line.checked_sub(1) {
            Some(up) => self.offset_at(up, col),
            None => 0,
        };
        self.move_head(target, extend);
    }

    pub fn move_down(&mut self, extend: bool) {
        let Some((line, col)) = self.caret_line_col() else {
            return;
        };
        let target = self.offset_at(line + 1, col);
        self.move_head(target, extend);
    }

    pub fn move_line_start(&mut self, extend: bool) {
        if let Some((line, _)) = self.caret_line_col() {
            let target = self.offset_at(line, 0);
            self.move_head(target, extend);
        }
    }

    pub fn move_line_end(&mut self, extend: bool) {
        if let Some((line, _)) = self.caret_line_col() {
            let target = self.offset_at(line, usize::MAX);
            self.move_head(target, extend);
        }
    }

    /// Scroll the minimum needed to keep the caret line on screen
    pub fn scroll_caret_into_view(&mut self) {
        if let Some((line, _)) = self.caret_line_col() {
            if line < self.scroll_top {
                self.scroll_top = line;
            } else if line >= self.scroll_top + self.height {
                self.scroll_top = line + 1 - self.height;
            }
        }
    }

    fn delete_chars(&mut self, start: usize, end: usize) -> bool {
        let Some(rope) = self.node.as_mut() else {
            return false;
        };
        let range = byte_offset(rope, start)..byte_offset(rope, end);
        rope.edit(range, "");
        self.set_caret(start);
        true
    }

    fn move_head(&mut self, target: usize, extend: bool) {
        if self.node.is_none() {
            return;
        }
        if !extend || !self.has_selection {
            self.anchor = target;
        }
        self.head = target;
        self.has_selection = true;
        self.focused = true;
    }

    fn set_caret(&mut self, at: usize) {
        self.anchor = at;
        self.head = at;
        self.has_selection = true;
        self.focused = true;
    }

    /// Current selection ordered, or a caret at the end when there is none
    fn ordered_or_end(&self) -> (usize, usize) {
        match self.selection() {
            Some(sel) => (sel.start, sel.end),
            None => {
                let len = self.char_len();
                (len, len)
            }
        }
    }

    /// Char offset of `col` on `line`, clamped to the line and the text
    fn offset_at(&self, line: usize, col: usize) -> usize {
        let Some(rope) = self.node.as_ref() else {
            return 0;
        };
        let last_line = rope.line_of_offset(rope.len());
        let line = line.min(last_line);
        let start = rope.offset_of_line(line);
        let end = if line < last_line {
            rope.offset_of_line(line + 1) - 1
        } else {
            rope.len()
        };
        let line_chars = char_count(rope, start..end);
        char_count(rope, 0..start) + col.min(line_chars)
    }
}

impl TextSurface for PlainTextSurface {
    fn rendered_text(&self) -> String {
        self.node.as_ref().map(|rope| rope.to_string()).unwrap_or_default()
    }

    fn has_text_node(&self) -> bool {
        self.node.is_some()
    }

    fn synthesize_text_node(&mut self) {
        let text = self.rendered_text();
        self.node = Some(Rope::from(text));
    }

    fn replace_text(&mut self, text: &str) {
        self.node = (!text.is_empty()).then(|| Rope::from(text));
        self.has_selection = false;
        self.anchor = 0;
        self.head = 0;
    }

    fn selection(&self) -> Option<SelectionOffsets> {
        if self.node.is_none() || !self.has_selection {
            return None;
        }
        Some(SelectionOffsets::new(
            self.anchor.min(self.head),
            self.anchor.max(self.head),
        ))
    }

    fn select(&mut self, offsets: SelectionOffsets) -> Result<(), SurfaceError> {
        if self.node.is_none() {
            return Err(SurfaceError::Detached);
        }
        let len = self.char_len();
        for offset in [offsets.start, offsets.end] {
            if offset > len {
                return Err(SurfaceError::OffsetOutOfRange { offset, len });
            }
        }
        self.anchor = offsets.start;
        self.head = offsets.end;
        self.has_selection = true;
        Ok(())
    }

    fn line_span(&self, offsets: SelectionOffsets) -> Result<LineSpan, SurfaceError> {
        let rope = self.node.as_ref().ok_or(SurfaceError::Detached)?;
        let (top, _) = line_col(rope, offsets.start);
        let (bottom, _) = line_col(rope, offsets.end);
        Ok(LineSpan {
            top,
            bottom: bottom + 1,
        })
    }

    fn viewport(&self) -> Viewport {
        Viewport {
            scroll_top: self.scroll_top,
            height: self.height,
        }
    }

    fn scroll_to(&mut self, scroll_top: usize) {
        self.scroll_top = scroll_top;
    }

    fn focus(&mut self) {
        self.focused = true;
    }
}

fn char_count(rope: &Rope, range: std::ops::Range<usize>) -> usize {
    let slice: Cow<'_, str> = rope.slice_to_cow(range);
    slice.chars().count()
}

/// Byte offset of the `chars`-th char, clamped to the end of the rope
fn byte_offset(rope: &Rope, chars: usize) -> usize {
    let mut remaining = chars;
    let mut base = 0;
    for chunk in rope.iter_chunks(..) {
        if let Some((idx, _)) = chunk.char_indices().nth(remaining) {
            return base + idx;
        }
        remaining -= chunk.chars().count();
        base += chunk.len();
    }
    base
}

fn line_col(rope: &Rope, chars: usize) -> (usize, usize) {
    let byte = byte_offset(rope, chars);
    let line = rope.line_of_offset(byte);
    let col = char_count(rope, rope.offset_of_line(line)..byte);
    (line, col)
}
