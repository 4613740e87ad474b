use super::{draw_lines, text_origin, SessionSlot};
use crate::backend::DrawSurface;
use crate::context::Context;
use crate::impl_view;
use crate::layout::SubviewLayout;
use crate::rect::Rect;
use crate::session::PlayerStats;
use crate::view::{Drawable, EventTarget, Layoutable};
use cgmath::Vector2;

/// The column along the right edge of the window holding the stats windows.
///
/// Its width comes from the skin; the desktop places it against the right edge.
#[derive(Debug)]
pub struct GameSidebar {
    window_inset: i32,
}

impl GameSidebar {
    /// - `window_inset`: horizontal inset of the windows inside the sidebar
    pub fn new(window_inset: i32) -> GameSidebar {
        GameSidebar { window_inset }
    }
}

impl Drawable for GameSidebar {
    fn draw(&self, ctx: &Context, surface: &mut dyn DrawSurface, bounds: Rect) {
        surface.fill_rect(bounds, ctx.skin().panel_color, 0.);
    }
}

impl Layoutable for GameSidebar {
    fn measure(
        &mut self,
        ctx: &Context,
        current: Vector2<i32>,
        _: &[Vector2<i32>],
    ) -> Vector2<i32> {
        Vector2::new(ctx.skin().sidebar_width, current.y)
    }

    /// Windows keep their vertical placement and span the sidebar's width.
    fn layout_subviews(&mut self, _: &Context, bounds: Rect, subviews: &mut SubviewLayout) {
        let width = bounds.width() - 2 * self.window_inset;
        let slots = subviews.slots().to_vec();
        for slot in slots {
            let placed = Rect::from_xywh(
                self.window_inset,
                slot.bounds.y(),
                width,
                slot.bounds.height(),
            );
            subviews.set_bounds(slot.id, placed);
        }
    }
}

impl EventTarget for GameSidebar {}

impl_view!(GameSidebar);

/// What a [`StatsPanel`] shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsKind {
    Skills,
    Vips,
    Inventory,
}

impl StatsKind {
    pub fn title(self) -> &'static str {
        match self {
            StatsKind::Skills => "Skills",
            StatsKind::Vips => "VIP",
            StatsKind::Inventory => "Inventory",
        }
    }

    fn lines(self, player: &PlayerStats) -> Vec<String> {
        match self {
            StatsKind::Skills => {
                let mut lines = vec![format!("Level {}", player.level)];
                lines.extend(
                    player
                        .skills
                        .iter()
                        .map(|skill| format!("{}: {}", skill.name, skill.level)),
                );
                lines
            }
            StatsKind::Vips => player
                .vips
                .iter()
                .map(|vip| {
                    let status = if vip.online { "online" } else { "offline" };
                    format!("{} ({})", vip.name, status)
                })
                .collect(),
            StatsKind::Inventory => player
                .inventory
                .iter()
                .map(|item| format!("#{} x{}", item.kind, item.count))
                .collect(),
        }
    }
}

/// A sidebar window showing one facet of the active session's player.
#[derive(Debug)]
pub struct StatsPanel {
    kind: StatsKind,
    session: SessionSlot,
}

impl StatsPanel {
    pub fn new(kind: StatsKind, session: SessionSlot) -> StatsPanel {
        StatsPanel { kind, session }
    }

    pub fn kind(&self) -> StatsKind {
        self.kind
    }

    /// The slot following the active session.
    pub fn session(&self) -> &SessionSlot {
        &self.session
    }

    /// Text currently shown, title first.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![self.kind.title().to_owned()];
        if let Some(session) = self.session.get() {
            lines.extend(self.kind.lines(&session.player()));
        }
        lines
    }
}

impl Drawable for StatsPanel {
    fn draw(&self, ctx: &Context, surface: &mut dyn DrawSurface, bounds: Rect) {
        surface.fill_rect(bounds, ctx.skin().panel_color, 0.);
        let lines = self.lines();
        let max_lines = (bounds.height() as f32 / ctx.font().line_spacing()).floor() as usize;
        draw_lines(
            ctx,
            surface,
            text_origin(bounds.x() + 2, bounds.y() + 2),
            lines.iter().take(max_lines).map(String::as_str),
            0.,
        );
    }
}

impl Layoutable for StatsPanel {}
impl EventTarget for StatsPanel {}

impl_view!(StatsPanel);
