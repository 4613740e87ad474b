//! Input routing.
//!
//! Mouse events go to the view holding the mouse capture if there is one, bypassing hit-testing
//! entirely. Otherwise clicks and releases are offered to the subviews of the dispatch root,
//! topmost first; a view that accepts the location offers the event to its own subviews before
//! handling it itself, and the first view to handle the event stops propagation.
//!
//! Mouse moves are only meaningful during a captured drag: without a capture they are dropped
//! without visiting the tree.
//!
//! Keyboard events go to the focused view.
//!
//! Structural changes requested by handlers are applied once dispatch returns, so every traversal
//! visits exactly the subviews that existed when it started.

use crate::context::Context;
use crate::events::{EventOutcome, Key, MouseState};
use crate::tree::ViewTree;
use crate::view::{View, ViewContext, ViewId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MouseAction {
    LeftClick,
    LeftRelease,
    Move,
}

impl MouseAction {
    fn offer(
        self,
        view: &mut dyn View,
        cx: &mut ViewContext<'_>,
        mouse: &MouseState,
    ) -> EventOutcome {
        match self {
            MouseAction::LeftClick => view.mouse_left_click(cx, mouse),
            MouseAction::LeftRelease => view.mouse_left_release(cx, mouse),
            MouseAction::Move => view.mouse_move(cx, mouse),
        }
    }
}

impl ViewTree {
    /// Dispatches a left click given in window coordinates.
    pub fn mouse_left_click(&mut self, ctx: &mut Context, mouse: MouseState) -> EventOutcome {
        self.dispatch_mouse(ctx, mouse, MouseAction::LeftClick)
    }

    /// Dispatches a left button release given in window coordinates.
    pub fn mouse_left_release(&mut self, ctx: &mut Context, mouse: MouseState) -> EventOutcome {
        self.dispatch_mouse(ctx, mouse, MouseAction::LeftRelease)
    }

    /// Dispatches a mouse move given in window coordinates.
    pub fn mouse_move(&mut self, ctx: &mut Context, mouse: MouseState) -> EventOutcome {
        self.dispatch_mouse(ctx, mouse, MouseAction::Move)
    }

    /// Dispatches a key press to the focused view.
    pub fn key_press(&mut self, ctx: &mut Context, key: Key) -> EventOutcome {
        let target = match ctx.focus() {
            Some(target) => target,
            None => return EventOutcome::Ignored,
        };
        if !self.is_attached(target) {
            tracing::warn!(?target, "keyboard focus held by a detached view; clearing");
            ctx.set_focus(None);
            return EventOutcome::Ignored;
        }

        let outcome = self
            .with_view(ctx, target, |view, cx| view.key_press(cx, &key))
            .unwrap_or(EventOutcome::Ignored);
        self.flush_patches();
        outcome
    }

    fn dispatch_mouse(
        &mut self,
        ctx: &mut Context,
        mouse: MouseState,
        action: MouseAction,
    ) -> EventOutcome {
        let outcome = match ctx.mouse_capture() {
            Some(target) => self.dispatch_captured(ctx, target, mouse, action),
            None if action == MouseAction::Move => EventOutcome::Ignored,
            None => {
                let root = self.root;
                self.route(ctx, root, mouse, action)
            }
        };
        self.flush_patches();
        outcome
    }

    fn dispatch_captured(
        &mut self,
        ctx: &mut Context,
        target: ViewId,
        mouse: MouseState,
        action: MouseAction,
    ) -> EventOutcome {
        let bounds = match self.absolute_bounds(target) {
            Some(bounds) if self.is_attached(target) => bounds,
            _ => {
                tracing::warn!(?target, ?action, "mouse captured by a detached view; clearing");
                ctx.release_mouse();
                return EventOutcome::Ignored;
            }
        };
        let local = mouse.at(bounds.to_local(mouse.position));
        self.with_view(ctx, target, |view, cx| action.offer(view, cx, &local))
            .unwrap_or(EventOutcome::Ignored)
    }

    /// Offers an event to the subviews of `id`, topmost first, then to `id` itself.
    ///
    /// `mouse` is in `id`'s local coordinate system. The root only routes to its subviews.
    fn route(
        &mut self,
        ctx: &mut Context,
        id: ViewId,
        mouse: MouseState,
        action: MouseAction,
    ) -> EventOutcome {
        for subview in self.hit_order(id) {
            let bounds = match self.nodes.get(&subview) {
                Some(node) if node.view.accepts_mouse_event(node.bounds, &mouse) => node.bounds,
                _ => continue,
            };
            let local = mouse.at(bounds.to_local(mouse.position));
            if self.route(ctx, subview, local, action).is_handled() {
                return EventOutcome::Handled;
            }
        }

        if id == self.root {
            return EventOutcome::Ignored;
        }
        self.with_view(ctx, id, |view, cx| action.offer(view, cx, &mouse))
            .unwrap_or(EventOutcome::Ignored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_view;
    use crate::rect::Rect;
    use crate::tree::tests::{context, tree, Label};
    use crate::view::{Drawable, EventTarget, Layoutable};
    use parking_lot::Mutex;
    use std::sync::Arc;

    type Log = Arc<Mutex<Vec<String>>>;

    /// Records every hit test and event; handles clicks when `handles` is set.
    #[derive(Debug)]
    struct Probe {
        name: &'static str,
        handles: bool,
        captures: bool,
        log: Log,
    }

    impl Probe {
        fn boxed(name: &'static str, handles: bool, log: &Log) -> Box<Probe> {
            Box::new(Probe {
                name,
                handles,
                captures: false,
                log: Arc::clone(log),
            })
        }
    }

    impl Drawable for Probe {}
    impl Layoutable for Probe {}
    impl EventTarget for Probe {
        fn accepts_mouse_event(&self, bounds: Rect, mouse: &MouseState) -> bool {
            self.log.lock().push(format!("hit {}", self.name));
            bounds.contains(mouse.position)
        }

        fn mouse_left_click(
            &mut self,
            cx: &mut ViewContext<'_>,
            mouse: &MouseState,
        ) -> EventOutcome {
            self.log.lock().push(format!(
                "click {} {},{}",
                self.name, mouse.position.x, mouse.position.y
            ));
            if self.captures {
                cx.capture_mouse();
            }
            self.handles.into()
        }

        fn mouse_move(&mut self, _cx: &mut ViewContext<'_>, mouse: &MouseState) -> EventOutcome {
            self.log.lock().push(format!(
                "move {} {},{}",
                self.name, mouse.position.x, mouse.position.y
            ));
            EventOutcome::Handled
        }
    }
    impl_view!(Probe);

    #[test]
    fn click_goes_to_topmost_accepting_view() {
        let mut ctx = context();
        let log = Log::default();
        let mut tree = tree();
        let root = tree.root();
        let back = tree.add_subview(root, Probe::boxed("back", true, &log)).unwrap();
        let front = tree.add_subview(root, Probe::boxed("front", true, &log)).unwrap();
        let away = tree.add_subview(root, Probe::boxed("away", true, &log)).unwrap();
        tree.set_bounds(back, Rect::from_xywh(0, 0, 100, 100)).unwrap();
        tree.set_bounds(front, Rect::from_xywh(50, 50, 100, 100)).unwrap();
        tree.set_bounds(away, Rect::from_xywh(500, 500, 10, 10)).unwrap();
        tree.set_z_order(front, 1).unwrap();

        let outcome = tree.mouse_left_click(&mut ctx, MouseState::new(60, 70));
        assert_eq!(outcome, EventOutcome::Handled);
        assert_eq!(*log.lock(), vec!["hit front", "click front 10,20"]);
    }

    #[test]
    fn unhandled_click_falls_through_to_lower_siblings() {
        let mut ctx = context();
        let log = Log::default();
        let mut tree = tree();
        let root = tree.root();
        let back = tree.add_subview(root, Probe::boxed("back", true, &log)).unwrap();
        let front = tree.add_subview(root, Probe::boxed("front", false, &log)).unwrap();
        tree.set_bounds(back, Rect::from_xywh(0, 0, 100, 100)).unwrap();
        tree.set_bounds(front, Rect::from_xywh(0, 0, 100, 100)).unwrap();

        assert!(tree.mouse_left_click(&mut ctx, MouseState::new(5, 5)).is_handled());
        assert_eq!(
            *log.lock(),
            vec!["hit front", "click front 5,5", "hit back", "click back 5,5"]
        );
    }

    #[test]
    fn nested_subviews_get_the_event_before_their_owner() {
        let mut ctx = context();
        let log = Log::default();
        let mut tree = tree();
        let root = tree.root();
        let outer = tree.add_subview(root, Probe::boxed("outer", true, &log)).unwrap();
        let inner = tree.add_subview(outer, Probe::boxed("inner", true, &log)).unwrap();
        tree.set_bounds(outer, Rect::from_xywh(100, 100, 100, 100)).unwrap();
        tree.set_bounds(inner, Rect::from_xywh(10, 10, 20, 20)).unwrap();

        tree.mouse_left_click(&mut ctx, MouseState::new(115, 112));
        assert_eq!(
            *log.lock(),
            vec!["hit outer", "hit inner", "click inner 5,2"]
        );
    }

    #[test]
    fn capture_bypasses_hit_testing() {
        let mut ctx = context();
        let log = Log::default();
        let mut tree = tree();
        let root = tree.root();
        let other = tree.add_subview(root, Probe::boxed("other", true, &log)).unwrap();
        let dragged = tree.add_subview(root, Probe::boxed("dragged", true, &log)).unwrap();
        tree.set_bounds(other, Rect::from_xywh(0, 0, 800, 600)).unwrap();
        tree.set_bounds(dragged, Rect::from_xywh(200, 200, 10, 10)).unwrap();
        ctx.capture_mouse(dragged);

        assert!(tree.mouse_left_click(&mut ctx, MouseState::new(5, 5)).is_handled());
        assert!(tree.mouse_move(&mut ctx, MouseState::new(210, 205)).is_handled());
        assert_eq!(
            *log.lock(),
            vec!["click dragged -195,-195", "move dragged 10,5"]
        );
    }

    #[test]
    fn move_without_capture_does_not_traverse() {
        let mut ctx = context();
        let log = Log::default();
        let mut tree = tree();
        let root = tree.root();
        let panel = tree.add_subview(root, Probe::boxed("panel", true, &log)).unwrap();
        tree.set_bounds(panel, Rect::from_xywh(0, 0, 800, 600)).unwrap();

        let outcome = tree.mouse_move(&mut ctx, MouseState::new(10, 10));
        assert_eq!(outcome, EventOutcome::Ignored);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn capture_of_removed_view_is_not_dispatched() {
        let mut ctx = context();
        let log = Log::default();
        let mut tree = tree();
        let root = tree.root();
        let mut probe = Probe::boxed("gone", true, &log);
        probe.captures = true;
        let gone = tree.add_subview(root, probe).unwrap();
        tree.set_bounds(gone, Rect::from_xywh(0, 0, 50, 50)).unwrap();

        tree.mouse_left_click(&mut ctx, MouseState::new(1, 1));
        assert_eq!(ctx.mouse_capture(), Some(gone));
        tree.remove_from_superview(gone).unwrap();
        log.lock().clear();

        assert_eq!(
            tree.mouse_move(&mut ctx, MouseState::new(1, 1)),
            EventOutcome::Ignored
        );
        assert_eq!(
            tree.mouse_left_click(&mut ctx, MouseState::new(1, 1)),
            EventOutcome::Ignored
        );
        assert!(log.lock().is_empty());
        assert_eq!(ctx.mouse_capture(), None);
    }

    #[test]
    fn handler_can_remove_its_own_view() {
        let mut ctx = context();
        let mut tree = tree();
        let root = tree.root();
        let label = tree.add_subview(root, Box::new(Label("bye"))).unwrap();
        tree.set_bounds(label, Rect::from_xywh(0, 0, 10, 10)).unwrap();

        assert!(tree.mouse_left_click(&mut ctx, MouseState::new(1, 1)).is_handled());
        assert!(!tree.contains(label));
        assert!(tree.subviews(root).is_empty());
    }

    #[test]
    fn keys_go_to_the_focused_view_only() {
        #[derive(Debug, Default)]
        struct Field(String);
        impl Drawable for Field {}
        impl Layoutable for Field {}
        impl EventTarget for Field {
            fn key_press(&mut self, _cx: &mut ViewContext<'_>, key: &Key) -> EventOutcome {
                match key.text {
                    Some(c) => {
                        self.0.push(c);
                        EventOutcome::Handled
                    }
                    None => EventOutcome::Ignored,
                }
            }
        }
        impl_view!(Field);

        let mut ctx = context();
        let mut tree = tree();
        let root = tree.root();
        let field = tree.add_subview(root, Box::<Field>::default()).unwrap();

        assert!(!tree.key_press(&mut ctx, Key::character('x')).is_handled());
        ctx.set_focus(Some(field));
        assert!(tree.key_press(&mut ctx, Key::character('h')).is_handled());
        assert!(tree.key_press(&mut ctx, Key::character('i')).is_handled());
        assert_eq!(tree.view::<Field>(field).map(|f| f.0.as_str()), Some("hi"));

        tree.remove_from_superview(field).unwrap();
        assert!(!tree.key_press(&mut ctx, Key::character('!')).is_handled());
        assert_eq!(ctx.focus(), None);
    }
}
