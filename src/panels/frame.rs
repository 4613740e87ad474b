use super::{draw_lines, text_origin, SessionSlot};
use crate::backend::DrawSurface;
use crate::context::Context;
use crate::impl_view;
use crate::layout::SubviewLayout;
use crate::rect::Rect;
use crate::session::Session;
use crate::view::{Drawable, EventTarget, Layoutable};
use std::sync::Arc;

/// The frame hosting the game view of each session.
///
/// Session views fill the frame; only the one for the active session draws.
#[derive(Debug)]
pub struct GameFrame {
    active: SessionSlot,
}

impl GameFrame {
    pub fn new(active: SessionSlot) -> GameFrame {
        GameFrame { active }
    }

    /// The slot shared with this frame's session views.
    pub fn active(&self) -> &SessionSlot {
        &self.active
    }
}

impl Drawable for GameFrame {
    fn draw(&self, ctx: &Context, surface: &mut dyn DrawSurface, bounds: Rect) {
        surface.fill_rect(bounds, ctx.skin().panel_color, 0.);
    }
}

impl Layoutable for GameFrame {
    fn layout_subviews(&mut self, _: &Context, bounds: Rect, subviews: &mut SubviewLayout) {
        let ids: Vec<_> = subviews.slots().iter().map(|slot| slot.id).collect();
        for id in ids {
            subviews.set_bounds(id, bounds);
        }
    }
}

impl EventTarget for GameFrame {}

impl_view!(GameFrame);

/// One session's game view.
#[derive(Debug)]
pub struct SessionView {
    session: Arc<dyn Session>,
    active: SessionSlot,
}

impl SessionView {
    pub fn new(session: Arc<dyn Session>, active: SessionSlot) -> SessionView {
        SessionView { session, active }
    }

    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }

    fn is_active(&self) -> bool {
        self.active
            .get()
            .map_or(false, |active| active.id() == self.session.id())
    }
}

impl Drawable for SessionView {
    fn draw(&self, ctx: &Context, surface: &mut dyn DrawSurface, bounds: Rect) {
        if !self.is_active() {
            return;
        }
        let player = self.session.player();
        let status = format!("{} (level {})", player.name, player.level);
        let containers = format!("{} containers open", self.session.containers().len());
        draw_lines(
            ctx,
            surface,
            text_origin(bounds.x() + 4, bounds.y() + 4),
            [status.as_str(), containers.as_str()],
            0.,
        );
    }
}

impl Layoutable for SessionView {}
impl EventTarget for SessionView {}

impl_view!(SessionView);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessSurface;
    use crate::session::ClientSession;
    use crate::tree::tests::{context, tree};

    #[test]
    fn only_the_active_session_draws() {
        let ctx = context();
        let mut tree = tree();
        let root = tree.root();
        let slot = SessionSlot::new();
        let frame = tree.add_subview(root, Box::new(GameFrame::new(slot.clone()))).unwrap();
        tree.set_bounds(frame, Rect::from_xywh(10, 20, 300, 200)).unwrap();

        let alice: Arc<dyn Session> = Arc::new(ClientSession::named("Alice"));
        let bob: Arc<dyn Session> = Arc::new(ClientSession::named("Bob"));
        let a = tree
            .add_subview(frame, Box::new(SessionView::new(Arc::clone(&alice), slot.clone())))
            .unwrap();
        tree.add_subview(frame, Box::new(SessionView::new(Arc::clone(&bob), slot.clone())))
            .unwrap();
        tree.layout_if_needed(&ctx);
        assert_eq!(tree.bounds(a), Some(Rect::from_xywh(0, 0, 300, 200)));

        slot.set(bob);
        let mut surface = HeadlessSurface::new();
        tree.draw(&ctx, &mut surface);
        let texts: Vec<_> = surface.texts().collect();
        // the root label draws first
        assert_eq!(texts, vec!["root", "Bob (level 0)", "0 containers open"]);
    }
}
