use std::cell::Cell;
use std::rc::Rc;

use super::surface::{SurfaceError, TextSurface};
use crate::models::SelectionOffsets;
use crate::store::EphemeralStore;

/// Ephemeral-store key holding the last captured selection as JSON
pub const CURSOR_STATE_KEY: &str = "cursorPosition";

/// Captures and restores the caret as character offsets into the surface's
/// text node, keeping the last capture in the ephemeral store so it survives
/// a reload.
pub struct SelectionOffsetTracker {
    state: Rc<dyn EphemeralStore>,
    last: Cell<SelectionOffsets>,
}

impl SelectionOffsetTracker {
    pub fn new(state: Rc<dyn EphemeralStore>) -> Self {
        let tracker = Self {
            state,
            last: Cell::new(SelectionOffsets::default()),
        };
        tracker.last.set(tracker.last_known());
        tracker
    }

    /// Read the active selection and persist it.
    ///
    /// Without a text node or a selection this is a no-op: the previous value
    /// is returned and the ephemeral state is left alone.
    pub fn capture(&self, surface: &dyn TextSurface) -> SelectionOffsets {
        let offsets = match surface.selection() {
            Some(offsets) if surface.has_text_node() => offsets,
            _ => {
                log::debug!("No selection to capture, keeping {:?}", self.last.get());
                return self.last.get();
            }
        };

        match serde_json::to_string(&offsets) {
            Ok(json) => self.state.set(CURSOR_STATE_KEY, &json),
            Err(e) => log::warn!("Failed to encode cursor position: {e}"),
        }
        self.last.set(offsets);
        offsets
    }

    /// Offsets from the ephemeral store; missing or unreadable state gives `{0,0}`
    pub fn last_known(&self) -> SelectionOffsets {
        let Some(raw) = self.state.get(CURSOR_STATE_KEY) else {
            return SelectionOffsets::default();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            log::debug!("Ignoring malformed cursor state {raw:?}: {e}");
            SelectionOffsets::default()
        })
    }

    /// Most recent capture made by this tracker (or loaded at construction)
    pub fn last_captured(&self) -> SelectionOffsets {
        self.last.get()
    }

    /// Put the selection back at `offsets`, clamped to `[0, text_len]`.
    ///
    /// Failures are logged and swallowed; the surface keeps whatever caret
    /// placement it defaults to.
    pub fn restore(&self, surface: &mut dyn TextSurface, offsets: SelectionOffsets, text_len: usize) {
        if let Err(e) = Self::try_restore(surface, offsets, text_len) {
            log::warn!("Error restoring cursor position {offsets:?}: {e}");
        }
    }

    fn try_restore(
        surface: &mut dyn TextSurface,
        offsets: SelectionOffsets,
        text_len: usize,
    ) -> Result<(), SurfaceError> {
        if !surface.has_text_node() {
            surface.synthesize_text_node();
        }

        let offsets = offsets.clamped(text_len);
        surface.select(offsets)?;

        let span = surface.line_span(offsets)?;
        let viewport = surface.viewport();
        if !viewport.contains(span) {
            surface.scroll_to(viewport.centered_on(span));
        }
        Ok(())
    }
}
