use super::selection::SelectionOffsetTracker;
use super::surface::TextSurface;
use crate::models::SelectionOffsets;

/// Owns the text buffer and the surface showing it.
///
/// The buffer is the source of truth for "current content" between saves;
/// nothing here writes to the store.
pub struct TextSurfaceController<S> {
    surface: S,
    buffer: String,
    tracker: SelectionOffsetTracker,
}

impl<S: TextSurface> TextSurfaceController<S> {
    pub fn new(surface: S, tracker: SelectionOffsetTracker) -> Self {
        let buffer = surface.rendered_text();
        Self {
            surface,
            buffer,
            tracker,
        }
    }

    /// Replace the surface text and the buffer with `content`.
    ///
    /// This is not an edit: the selection is not captured.
    pub fn load(&mut self, content: &str) {
        self.surface.replace_text(content);
        self.buffer = content.to_string();
    }

    /// Called after the surface has applied a user keystroke
    pub fn on_edit(&mut self, content: &str) {
        self.buffer = content.to_string();
        self.tracker.capture(&self.surface);
    }

    /// Run a user interaction against the surface, then report it.
    ///
    /// `interaction` returns whether the text changed. Text changes go
    /// through [`Self::on_edit`]; caret-only changes just capture the selection.
    pub fn interact(&mut self, interaction: impl FnOnce(&mut S) -> bool) -> bool {
        let changed = interaction(&mut self.surface);
        if changed {
            let content = self.surface.rendered_text();
            self.on_edit(&content);
        } else {
            self.tracker.capture(&self.surface);
        }
        changed
    }

    /// The surface lost focus
    pub fn blur(&mut self) {
        self.tracker.capture(&self.surface);
    }

    pub fn content(&self) -> &str {
        &self.buffer
    }

    /// Buffer length in chars, the unit selections are measured in
    pub fn char_len(&self) -> usize {
        self.buffer.chars().count()
    }

    pub fn capture_selection(&self) -> SelectionOffsets {
        self.tracker.capture(&self.surface)
    }

    pub fn restore_selection(&mut self, offsets: SelectionOffsets) {
        let len = self.char_len();
        self.tracker.restore(&mut self.surface, offsets, len);
    }

    /// Restore whatever the ephemeral store last recorded
    pub fn restore_last_known(&mut self) {
        let offsets = self.tracker.last_known();
        self.restore_selection(offsets);
    }

    pub fn tracker(&self) -> &SelectionOffsetTracker {
        &self.tracker
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}
