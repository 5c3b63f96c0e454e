/*!
 * # Editing surface and caret tracking
 *
 * The engine never touches a platform selection API directly. Everything is
 * expressed as `{start, end}` character offsets into one logical text node:
 *
 * - **`surface`**: the `TextSurface` trait a rendering layer implements, and
 *   `PlainTextSurface`, an xi-rope backed implementation with key editing.
 * - **`selection`**: `SelectionOffsetTracker`, which captures the selection
 *   after each edit, persists it to the ephemeral store, and restores it
 *   (clamped, scrolled into view) after loads and saves.
 * - **`controller`**: `TextSurfaceController`, owner of the text buffer that
 *   is the single source of truth for unsaved content.
 *
 * ```rust
 * use std::rc::Rc;
 * use mirrorpad_engine::editing::*;
 * use mirrorpad_engine::store::MemoryEphemeralStore;
 *
 * let tracker = SelectionOffsetTracker::new(Rc::new(MemoryEphemeralStore::new()));
 * let mut controller = TextSurfaceController::new(PlainTextSurface::new(), tracker);
 *
 * controller.load("hello");
 * controller.restore_last_known();
 * controller.interact(|surface| surface.insert_str("> "));
 *
 * assert_eq!(controller.content(), "> hello");
 * ```
 */

pub mod controller;
pub mod selection;
pub mod surface;

pub use controller::TextSurfaceController;
pub use selection::{CURSOR_STATE_KEY, SelectionOffsetTracker};
pub use surface::{LineSpan, PlainTextSurface, SurfaceError, TextSurface, Viewport};
