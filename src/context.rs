//! State shared by every view in a tree.

use crate::backend::FontMetrics;
use crate::config::Skin;
use crate::rect::Rect;
use crate::view::ViewId;
use cgmath::Vector2;
use std::sync::Arc;
use std::time::Duration;

/// Shared UI state.
///
/// Created once with the desktop and mutated every frame. It is passed explicitly to every update,
/// layout, draw and event hook rather than being reachable from globals.
#[derive(Debug)]
pub struct Context {
    window: Rect,
    mouse_capture: Option<ViewId>,
    focus: Option<ViewId>,
    frame_time: Duration,
    font: Arc<dyn FontMetrics>,
    skin: Skin,
    skin_changed: bool,
}

impl Context {
    pub fn new(window_size: Vector2<i32>, font: Arc<dyn FontMetrics>) -> Context {
        Context {
            window: Rect::new((0, 0).into(), window_size),
            mouse_capture: None,
            focus: None,
            frame_time: Duration::default(),
            font,
            skin: Skin::default(),
            skin_changed: false,
        }
    }

    /// Advances frame time. Clears the skin-changed flag, which is only visible for the frame
    /// that follows [`Context::change_skin`].
    pub fn update(&mut self, elapsed: Duration) {
        self.frame_time = elapsed;
        self.skin_changed = false;
    }

    /// Window client bounds, origin at zero.
    pub fn window(&self) -> Rect {
        self.window
    }

    pub(crate) fn set_window_size(&mut self, size: Vector2<i32>) {
        self.window = self.window.with_size(size);
    }

    /// Time elapsed during the last update.
    pub fn frame_time(&self) -> Duration {
        self.frame_time
    }

    /// The standard UI font.
    pub fn font(&self) -> &dyn FontMetrics {
        &*self.font
    }

    pub fn skin(&self) -> &Skin {
        &self.skin
    }

    /// Swaps the skin. Preferred sizes may change, so the next update re-lays out the tree.
    pub fn change_skin(&mut self, skin: Skin) {
        tracing::debug!(skin = %skin.name, "skin changed");
        self.skin = skin;
        self.skin_changed = true;
    }

    pub fn skin_changed(&self) -> bool {
        self.skin_changed
    }

    /// The view currently capturing the mouse.
    pub fn mouse_capture(&self) -> Option<ViewId> {
        self.mouse_capture
    }

    /// Routes all following mouse events to `view`, replacing any previous capture.
    pub fn capture_mouse(&mut self, view: ViewId) {
        if let Some(previous) = self.mouse_capture.replace(view) {
            if previous != view {
                tracing::trace!(?previous, ?view, "mouse capture transferred");
            }
        }
    }

    pub fn release_mouse(&mut self) {
        self.mouse_capture = None;
    }

    /// The view receiving keyboard input.
    pub fn focus(&self) -> Option<ViewId> {
        self.focus
    }

    pub fn set_focus(&mut self, view: Option<ViewId>) {
        self.focus = view;
    }
}
