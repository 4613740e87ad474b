use super::{draw_lines, text_origin};
use crate::backend::DrawSurface;
use crate::context::Context;
use crate::events::{EventOutcome, MouseState};
use crate::impl_view;
use crate::rect::Rect;
use crate::session::{Session, SessionId};
use crate::view::{Drawable, EventTarget, Layoutable, ViewContext};
use cgmath::{Point2, Vector2};
use std::sync::Arc;

const TITLE_HEIGHT: i32 = 14;
const CLOSE_BOX: i32 = 12;

/// A floating window showing one open container.
///
/// The title bar drags the panel around; the box in its top right corner asks the session to close
/// the container, and the desktop removes the panel once the session confirms.
#[derive(Debug)]
pub struct ContainerPanel {
    session: Arc<dyn Session>,
    container: u32,
    /// Grab point in local coordinates while dragging.
    grab: Option<Point2<i32>>,
}

impl ContainerPanel {
    pub fn new(session: Arc<dyn Session>, container: u32) -> ContainerPanel {
        ContainerPanel {
            session,
            container,
            grab: None,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session.id()
    }

    pub fn container_id(&self) -> u32 {
        self.container
    }

    pub fn is_dragging(&self) -> bool {
        self.grab.is_some()
    }

    fn close_box(bounds: Rect) -> Rect {
        Rect::from_xywh(bounds.width() - CLOSE_BOX - 1, 1, CLOSE_BOX, CLOSE_BOX)
    }
}

impl Drawable for ContainerPanel {
    fn draw(&self, ctx: &Context, surface: &mut dyn DrawSurface, bounds: Rect) {
        surface.fill_rect(bounds, ctx.skin().panel_color, 0.);
        let container = match self.session.container(self.container) {
            Some(container) => container,
            // closed; the panel goes away on the next notification pump
            None => return,
        };

        let title = format!(
            "{} ({}/{})",
            container.name,
            container.items.len(),
            container.capacity
        );
        let items: Vec<String> = container
            .items
            .iter()
            .map(|item| format!("#{} x{}", item.kind, item.count))
            .collect();
        draw_lines(
            ctx,
            surface,
            text_origin(bounds.x() + 2, bounds.y()),
            std::iter::once(title.as_str()).chain(items.iter().map(String::as_str)),
            0.,
        );
        let close = Self::close_box(bounds) + bounds.origin;
        surface.draw_text(
            ctx.font(),
            "x",
            text_origin(close.x() + 2, close.y()),
            ctx.skin().text_color,
            0.,
        );
    }
}

impl Layoutable for ContainerPanel {}

impl EventTarget for ContainerPanel {
    fn mouse_left_click(&mut self, cx: &mut ViewContext<'_>, mouse: &MouseState) -> EventOutcome {
        cx.bring_to_front();
        if Self::close_box(cx.bounds()).contains(mouse.position) {
            tracing::debug!(container = self.container, "close box clicked");
            self.session.close_container(self.container);
        } else if mouse.position.y < TITLE_HEIGHT {
            self.grab = Some(mouse.position);
            cx.capture_mouse();
        }
        // panels are opaque to clicks
        EventOutcome::Handled
    }

    fn mouse_move(&mut self, cx: &mut ViewContext<'_>, mouse: &MouseState) -> EventOutcome {
        let grab = match self.grab {
            Some(grab) => grab,
            None => return EventOutcome::Ignored,
        };
        let bounds = cx.bounds();
        let delta = Vector2::new(mouse.position.x - grab.x, mouse.position.y - grab.y);
        cx.set_bounds(bounds.with_origin(bounds.origin + delta));
        EventOutcome::Handled
    }

    fn mouse_left_release(&mut self, cx: &mut ViewContext<'_>, _: &MouseState) -> EventOutcome {
        if self.grab.take().is_none() {
            return EventOutcome::Ignored;
        }
        cx.release_mouse();
        EventOutcome::Handled
    }
}

impl_view!(ContainerPanel);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessSurface;
    use crate::session::{ClientSession, Container, Item};
    use crate::tree::tests::{context, tree};
    use crate::tree::ViewTree;
    use crate::view::ViewId;

    fn setup() -> (ViewTree, ViewId, Arc<ClientSession>) {
        let session = Arc::new(ClientSession::named("Alice"));
        let mut bag = Container::new(7, "bag", 8);
        bag.items.push(Item { kind: 3031, count: 12 });
        session.open_container(bag);

        let mut tree = tree();
        let root = tree.root();
        let panel = ContainerPanel::new(Arc::clone(&session) as Arc<dyn Session>, 7);
        let id = tree.add_subview(root, Box::new(panel)).unwrap();
        tree.set_bounds(id, Rect::from_xywh(100, 100, 170, 100)).unwrap();
        (tree, id, session)
    }

    #[test]
    fn draws_title_and_items() {
        let ctx = context();
        let (tree, _, _) = setup();
        let mut surface = HeadlessSurface::new();
        tree.draw(&ctx, &mut surface);
        let texts: Vec<_> = surface.texts().collect();
        assert_eq!(texts, vec!["root", "bag (1/8)", "#3031 x12", "x"]);
    }

    #[test]
    fn dragging_by_the_title_bar() {
        let mut ctx = context();
        let (mut tree, id, _) = setup();

        tree.mouse_left_click(&mut ctx, MouseState::new(110, 105));
        assert_eq!(ctx.mouse_capture(), Some(id));

        tree.mouse_move(&mut ctx, MouseState::new(150, 125));
        assert_eq!(tree.bounds(id), Some(Rect::from_xywh(140, 120, 170, 100)));
        // the grab point stays under the pointer
        tree.mouse_move(&mut ctx, MouseState::new(160, 125));
        assert_eq!(tree.bounds(id), Some(Rect::from_xywh(150, 120, 170, 100)));

        tree.mouse_left_release(&mut ctx, MouseState::new(160, 125));
        assert_eq!(ctx.mouse_capture(), None);
        assert!(!tree.view::<ContainerPanel>(id).unwrap().is_dragging());
        assert_eq!(tree.mouse_move(&mut ctx, MouseState::new(0, 0)), EventOutcome::Ignored);
    }

    #[test]
    fn close_box_asks_the_session() {
        let mut ctx = context();
        let (mut tree, id, session) = setup();
        // close box spans x 157..169 locally
        let outcome = tree.mouse_left_click(&mut ctx, MouseState::new(100 + 160, 105));
        assert_eq!(outcome, EventOutcome::Handled);
        assert!(session.container(7).is_none());
        assert_eq!(ctx.mouse_capture(), None);
        // removal is the desktop's job
        assert!(tree.contains(id));
    }

    #[test]
    fn clicks_in_the_body_are_consumed() {
        let mut ctx = context();
        let (mut tree, _, session) = setup();
        let outcome = tree.mouse_left_click(&mut ctx, MouseState::new(150, 160));
        assert_eq!(outcome, EventOutcome::Handled);
        assert_eq!(ctx.mouse_capture(), None);
        assert!(session.container(7).is_some());
    }
}
