//! Layout.
//!
//! Layout runs in two phases over the whole tree, once per update and only while the tree is
//! marked as needing layout:
//!
//! 1. **Measure**, bottom-up: every view reports a preferred size given its subviews' preferred
//!    sizes.
//! 2. **Position**, top-down: every view assigns its subviews' bounds relative to its own, now
//!    final, bounds.
//!
//! A layout pass is skipped entirely while the root has no area (e.g. a minimized window); the
//! tree stays dirty until a later frame can lay it out.

use crate::context::Context;
use crate::rect::Rect;
use crate::tree::ViewTree;
use crate::view::ViewId;
use cgmath::{Point2, Vector2};

/// A subview's layout slot, as seen by its superview during the position phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubviewSlot {
    pub id: ViewId,
    /// Bounds that will be assigned to the subview.
    pub bounds: Rect,
    /// Size reported by the subview in the measure phase.
    pub preferred_size: Vector2<i32>,
}

/// The subviews of a view being laid out.
///
/// Each slot starts out at the subview's current origin with its preferred size; whatever is left
/// in the slots when `layout_subviews` returns becomes the subviews' bounds.
#[derive(Debug, Clone, Default)]
pub struct SubviewLayout {
    slots: Vec<SubviewSlot>,
}

impl SubviewLayout {
    pub(crate) fn new(slots: Vec<SubviewSlot>) -> SubviewLayout {
        SubviewLayout { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots in subview order.
    pub fn slots(&self) -> &[SubviewSlot] {
        &self.slots
    }

    pub fn bounds(&self, id: ViewId) -> Option<Rect> {
        self.slot(id).map(|slot| slot.bounds)
    }

    pub fn preferred_size(&self, id: ViewId) -> Option<Vector2<i32>> {
        self.slot(id).map(|slot| slot.preferred_size)
    }

    /// Assigns bounds to a subview. Returns false if `id` is not a subview.
    pub fn set_bounds(&mut self, id: ViewId, bounds: Rect) -> bool {
        match self.slots.iter_mut().find(|slot| slot.id == id) {
            Some(slot) => {
                slot.bounds = bounds;
                true
            }
            None => false,
        }
    }

    fn slot(&self, id: ViewId) -> Option<&SubviewSlot> {
        self.slots.iter().find(|slot| slot.id == id)
    }
}

impl ViewTree {
    /// Runs a layout pass if the tree is marked as needing one.
    ///
    /// Returns true if layout ran.
    pub fn layout_if_needed(&mut self, ctx: &Context) -> bool {
        if !self.needs_layout {
            return false;
        }
        let root_bounds = match self.bounds(self.root) {
            Some(bounds) => bounds,
            None => return false,
        };
        if root_bounds.is_empty() {
            tracing::trace!(?root_bounds, "skipping layout of degenerate root");
            return false;
        }

        let _span = tracing::debug_span!("layout", pass = self.layout_count + 1).entered();
        let root = self.root;
        self.measure_view(ctx, root);
        self.position_subviews(ctx, root);
        self.needs_layout = false;
        self.layout_count += 1;
        true
    }

    fn measure_view(&mut self, ctx: &Context, id: ViewId) -> Vector2<i32> {
        let subviews = self.subviews(id).to_vec();
        let sizes: Vec<_> = subviews
            .into_iter()
            .map(|subview| self.measure_view(ctx, subview))
            .collect();

        let node = match self.nodes.get_mut(&id) {
            Some(node) => node,
            None => return Vector2::new(0, 0),
        };
        let size = node.view.measure(ctx, node.bounds.size, &sizes);
        node.preferred_size = Vector2::new(size.x.max(0), size.y.max(0));
        node.preferred_size
    }

    fn position_subviews(&mut self, ctx: &Context, id: ViewId) {
        let slots = self
            .subviews(id)
            .iter()
            .filter_map(|subview| {
                self.nodes.get(subview).map(|node| SubviewSlot {
                    id: *subview,
                    bounds: node.bounds.with_size(node.preferred_size),
                    preferred_size: node.preferred_size,
                })
            })
            .collect();
        let mut layout = SubviewLayout::new(slots);

        if let Some(node) = self.nodes.get_mut(&id) {
            let local = Rect::new(Point2::new(0, 0), node.bounds.size);
            node.view.layout_subviews(ctx, local, &mut layout);
        }

        for slot in layout.slots {
            if let Some(node) = self.nodes.get_mut(&slot.id) {
                node.bounds = slot.bounds;
            }
            self.position_subviews(ctx, slot.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_view;
    use crate::tree::tests::{context, tree, Label};
    use crate::view::{Drawable, EventTarget, Layoutable};

    /// Stacks its subviews vertically and grows to fit them.
    #[derive(Debug)]
    struct Column;
    impl Drawable for Column {}
    impl EventTarget for Column {}
    impl Layoutable for Column {
        fn measure(
            &mut self,
            _: &Context,
            _: Vector2<i32>,
            subviews: &[Vector2<i32>],
        ) -> Vector2<i32> {
            let width = subviews.iter().map(|s| s.x).max().unwrap_or(0);
            let height = subviews.iter().map(|s| s.y).sum();
            Vector2::new(width, height)
        }

        fn layout_subviews(&mut self, _: &Context, bounds: Rect, subviews: &mut SubviewLayout) {
            let mut y = 0;
            let slots = subviews.slots().to_vec();
            for slot in slots {
                subviews.set_bounds(
                    slot.id,
                    Rect::from_xywh(0, y, bounds.width(), slot.preferred_size.y),
                );
                y += slot.preferred_size.y;
            }
        }
    }
    impl_view!(Column);

    #[test]
    fn measures_bottom_up_and_positions_top_down() {
        let ctx = context();
        let mut tree = tree();
        let root = tree.root();
        let column = tree.add_subview(root, Box::new(Column)).unwrap();
        tree.set_bounds(column, Rect::from_xywh(10, 10, 0, 0)).unwrap();
        let a = tree.add_subview(column, Box::new(Label("a"))).unwrap();
        let b = tree.add_subview(column, Box::new(Label("b"))).unwrap();
        tree.set_bounds(a, Rect::from_xywh(0, 0, 50, 20)).unwrap();
        tree.set_bounds(b, Rect::from_xywh(0, 0, 80, 30)).unwrap();

        assert!(tree.layout_if_needed(&ctx));
        assert_eq!(tree.preferred_size(column), Some(Vector2::new(80, 50)));
        assert_eq!(tree.bounds(column), Some(Rect::from_xywh(10, 10, 80, 50)));
        assert_eq!(tree.bounds(a), Some(Rect::from_xywh(0, 0, 80, 20)));
        assert_eq!(tree.bounds(b), Some(Rect::from_xywh(0, 20, 80, 30)));
        assert!(!tree.needs_layout());
        assert_eq!(tree.layout_count(), 1);
    }

    #[test]
    fn clean_tree_is_not_laid_out() {
        let ctx = context();
        let mut tree = tree();
        assert!(tree.layout_if_needed(&ctx));
        assert!(!tree.layout_if_needed(&ctx));
        assert_eq!(tree.layout_count(), 1);
    }

    #[test]
    fn degenerate_root_skips_layout_and_stays_dirty() {
        let ctx = context();
        let mut tree = tree();
        let root = tree.root();
        tree.set_bounds(root, Rect::from_xywh(0, 0, 0, 600)).unwrap();

        assert!(!tree.layout_if_needed(&ctx));
        assert!(tree.needs_layout());
        assert_eq!(tree.layout_count(), 0);

        tree.set_bounds(root, Rect::from_xywh(0, 0, 640, 480)).unwrap();
        assert!(tree.layout_if_needed(&ctx));
    }

    #[test]
    fn subview_layout_rejects_unknown_ids() {
        let mut layout = SubviewLayout::default();
        assert!(!layout.set_bounds(ViewId::new(), Rect::zero()));
        assert!(layout.is_empty());
    }
}
