//! The desktop's panels.

mod chat;
mod container;
mod frame;
mod sidebar;
mod taskbar;

pub use chat::ChatPanel;
pub use container::ContainerPanel;
pub use frame::{GameFrame, SessionView};
pub use sidebar::{GameSidebar, StatsKind, StatsPanel};
pub use taskbar::TopTaskbar;

use crate::backend::DrawSurface;
use crate::context::Context;
use crate::desktop::ActiveSessionChanged;
use crate::events::EventBus;
use crate::session::Session;
use cgmath::Point2;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct SlotState {
    session: Option<Arc<dyn Session>>,
    notifications: u64,
}

/// The session a panel displays.
///
/// Shared between the panel and its subscription to the desktop's active-session broadcast, so the
/// panel sees the new session as soon as the broadcast returns.
#[derive(Debug, Clone, Default)]
pub struct SessionSlot(Arc<Mutex<SlotState>>);

impl SessionSlot {
    pub fn new() -> SessionSlot {
        SessionSlot::default()
    }

    /// Follows the active session from now on.
    pub fn subscribe(&self, bus: &EventBus<ActiveSessionChanged>) {
        let slot = self.clone();
        bus.subscribe(move |event: &ActiveSessionChanged| slot.set(Arc::clone(&event.session)));
    }

    pub fn set(&self, session: Arc<dyn Session>) {
        let mut state = self.0.lock();
        state.session = Some(session);
        state.notifications += 1;
    }

    pub fn get(&self) -> Option<Arc<dyn Session>> {
        self.0.lock().session.clone()
    }

    /// How many times the slot has been set.
    pub fn notifications(&self) -> u64 {
        self.0.lock().notifications
    }
}

/// Draws lines of text top to bottom starting at `origin`, returning the y below the last line.
pub(crate) fn draw_lines<'a>(
    ctx: &Context,
    surface: &mut dyn DrawSurface,
    origin: Point2<f32>,
    lines: impl IntoIterator<Item = &'a str>,
    depth: f32,
) -> f32 {
    let font = ctx.font();
    let mut y = origin.y;
    for line in lines {
        surface.draw_text(font, line, Point2::new(origin.x, y), ctx.skin().text_color, depth);
        y += font.line_spacing();
    }
    y
}

/// Converts a window-space integer point to a draw position.
pub(crate) fn text_origin(x: i32, y: i32) -> Point2<f32> {
    Point2::new(x as f32, y as f32)
}
