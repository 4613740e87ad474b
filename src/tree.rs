use crate::backend::DrawSurface;
use crate::context::Context;
use crate::patch::{Patch, TreeError};
use crate::rect::Rect;
use crate::view::{View, ViewContext, ViewId};
use cgmath::{Point2, Vector2};
use std::collections::HashMap;
use std::time::Duration;

/// A node in the view tree.
#[derive(Debug)]
pub(crate) struct TreeNode {
    /// The view object.
    pub(crate) view: Box<dyn View>,
    /// Bounds relative to the superview.
    pub(crate) bounds: Rect,
    /// Draw order among siblings; lower draws first.
    pub(crate) z_order: i32,
    /// The immediate superview. Only the root has none.
    pub(crate) superview: Option<ViewId>,
    /// An ordered list of all subviews. Order breaks z-order ties.
    pub(crate) subviews: Vec<ViewId>,
    /// Result of the last measure pass.
    pub(crate) preferred_size: Vector2<i32>,
}

/// A tree of views.
///
/// Every node is exclusively owned by its superview; removing a node drops its whole subtree.
/// Views receive a [`ViewContext`] rather than the tree itself, and any structural change they
/// request is applied only after the current traversal completes.
#[derive(Debug)]
pub struct ViewTree {
    pub(crate) nodes: HashMap<ViewId, TreeNode>,
    pub(crate) root: ViewId,
    pub(crate) needs_layout: bool,
    pub(crate) layout_count: u64,
    pub(crate) patches: Vec<Patch>,
}

impl ViewTree {
    /// Creates a tree with the given root view.
    pub fn new(root: Box<dyn View>, bounds: Rect) -> ViewTree {
        let root_id = ViewId::new();
        let mut nodes = HashMap::new();
        nodes.insert(
            root_id,
            TreeNode {
                view: root,
                bounds,
                z_order: 0,
                superview: None,
                subviews: Vec::new(),
                preferred_size: bounds.size,
            },
        );

        ViewTree {
            nodes,
            root: root_id,
            needs_layout: true,
            layout_count: 0,
            patches: Vec::new(),
        }
    }

    pub fn root(&self) -> ViewId {
        self.root
    }

    /// Number of views in the tree, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: ViewId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Returns true if the view exists and its superview chain reaches the root.
    pub fn is_attached(&self, id: ViewId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.nodes.get(&current).and_then(|node| node.superview) {
                Some(superview) => current = superview,
                None => return false,
            }
        }
    }

    /// Adds a subview at the end of `parent`'s subviews.
    pub fn add_subview(
        &mut self,
        parent: ViewId,
        view: Box<dyn View>,
    ) -> Result<ViewId, TreeError> {
        let id = ViewId::new();
        self.insert_with_id(parent, None, id, view, 0)?;
        Ok(id)
    }

    /// Inserts a subview at `index` in `parent`'s subviews.
    pub fn insert_subview_at(
        &mut self,
        parent: ViewId,
        index: usize,
        view: Box<dyn View>,
    ) -> Result<ViewId, TreeError> {
        let id = ViewId::new();
        self.insert_with_id(parent, Some(index), id, view, 0)?;
        Ok(id)
    }

    pub(crate) fn insert_with_id(
        &mut self,
        parent: ViewId,
        index: Option<usize>,
        id: ViewId,
        view: Box<dyn View>,
        z_order: i32,
    ) -> Result<(), TreeError> {
        if self.nodes.contains_key(&id) {
            return Err(TreeError::DuplicateId(id));
        }
        let parent_node = self
            .nodes
            .get_mut(&parent)
            .ok_or(TreeError::NoSuchView(parent))?;
        let len = parent_node.subviews.len();
        let index = index.unwrap_or(len);
        if index > len {
            return Err(TreeError::IndexOutOfBounds { index, len });
        }
        parent_node.subviews.insert(index, id);

        self.nodes.insert(
            id,
            TreeNode {
                view,
                bounds: Rect::zero(),
                z_order,
                superview: Some(parent),
                subviews: Vec::new(),
                preferred_size: Vector2::new(0, 0),
            },
        );
        self.needs_layout = true;
        Ok(())
    }

    /// Removes a view and all of its subviews from the tree, returning the view.
    pub fn remove_from_superview(&mut self, id: ViewId) -> Result<Box<dyn View>, TreeError> {
        if id == self.root {
            return Err(TreeError::RootView);
        }
        let node = self.nodes.remove(&id).ok_or(TreeError::NoSuchView(id))?;
        if let Some(superview) = node.superview.and_then(|s| self.nodes.get_mut(&s)) {
            superview.subviews.retain(|s| *s != id);
        }
        for subview in node.subviews {
            self.remove_subtree(subview);
        }
        self.needs_layout = true;
        Ok(node.view)
    }

    /// Drops a node and its descendants. Does *not* touch the superview's subview list.
    fn remove_subtree(&mut self, id: ViewId) {
        if let Some(node) = self.nodes.remove(&id) {
            for subview in node.subviews {
                self.remove_subtree(subview);
            }
        }
    }

    /// Moves a view to a new superview, detaching it from the old one first.
    pub fn move_subview(
        &mut self,
        id: ViewId,
        new_superview: ViewId,
        index: Option<usize>,
    ) -> Result<(), TreeError> {
        if id == self.root {
            return Err(TreeError::RootView);
        }
        if !self.nodes.contains_key(&id) {
            return Err(TreeError::NoSuchView(id));
        }
        if !self.nodes.contains_key(&new_superview) {
            return Err(TreeError::NoSuchView(new_superview));
        }
        if self.is_ancestor_or_self(id, new_superview) {
            return Err(TreeError::Cycle(id));
        }

        let old_superview = self.nodes[&id].superview;
        if let Some(old) = old_superview.and_then(|s| self.nodes.get_mut(&s)) {
            old.subviews.retain(|s| *s != id);
        }

        let target = self
            .nodes
            .get_mut(&new_superview)
            .ok_or(TreeError::NoSuchView(new_superview))?;
        let len = target.subviews.len();
        let index = index.unwrap_or(len).min(len);
        target.subviews.insert(index, id);

        if let Some(node) = self.nodes.get_mut(&id) {
            node.superview = Some(new_superview);
        }
        self.needs_layout = true;
        Ok(())
    }

    /// Returns true if `ancestor` is `id` or one of its superviews.
    fn is_ancestor_or_self(&self, ancestor: ViewId, id: ViewId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.nodes.get(&c).and_then(|node| node.superview);
        }
        false
    }

    pub fn superview(&self, id: ViewId) -> Option<ViewId> {
        self.nodes.get(&id).and_then(|node| node.superview)
    }

    /// Subviews in insertion order.
    pub fn subviews(&self, id: ViewId) -> &[ViewId] {
        self.nodes
            .get(&id)
            .map(|node| node.subviews.as_slice())
            .unwrap_or(&[])
    }

    pub fn bounds(&self, id: ViewId) -> Option<Rect> {
        self.nodes.get(&id).map(|node| node.bounds)
    }

    /// Bounds in window coordinates.
    pub fn absolute_bounds(&self, id: ViewId) -> Option<Rect> {
        let node = self.nodes.get(&id)?;
        let mut bounds = node.bounds;
        let mut current = node.superview;
        while let Some(superview) = current {
            let node = self.nodes.get(&superview)?;
            bounds = bounds + node.bounds.origin;
            current = node.superview;
        }
        Some(bounds)
    }

    /// Sets a view's bounds. Marks the tree as needing layout if they changed.
    pub fn set_bounds(&mut self, id: ViewId, bounds: Rect) -> Result<(), TreeError> {
        let node = self.nodes.get_mut(&id).ok_or(TreeError::NoSuchView(id))?;
        if node.bounds != bounds {
            node.bounds = bounds;
            self.needs_layout = true;
        }
        Ok(())
    }

    pub fn z_order(&self, id: ViewId) -> Option<i32> {
        self.nodes.get(&id).map(|node| node.z_order)
    }

    pub fn set_z_order(&mut self, id: ViewId, z_order: i32) -> Result<(), TreeError> {
        let node = self.nodes.get_mut(&id).ok_or(TreeError::NoSuchView(id))?;
        node.z_order = z_order;
        Ok(())
    }

    /// Moves a view in front of its siblings of equal z-order.
    pub fn bring_to_front(&mut self, id: ViewId) -> Result<(), TreeError> {
        if id == self.root {
            return Err(TreeError::RootView);
        }
        let superview = self.superview(id).ok_or(TreeError::NoSuchView(id))?;
        let node = self
            .nodes
            .get_mut(&superview)
            .ok_or(TreeError::NoSuchView(superview))?;
        node.subviews.retain(|s| *s != id);
        node.subviews.push(id);
        Ok(())
    }

    /// Measured preferred size from the last layout pass.
    pub fn preferred_size(&self, id: ViewId) -> Option<Vector2<i32>> {
        self.nodes.get(&id).map(|node| node.preferred_size)
    }

    /// Subviews in the order they are drawn: ascending z-order, ties in subview order.
    pub fn draw_order(&self, id: ViewId) -> Vec<ViewId> {
        let mut order = self.subviews(id).to_vec();
        // stable, so equal z-orders keep subview order
        order.sort_by_key(|s| self.nodes.get(s).map_or(0, |node| node.z_order));
        order
    }

    /// Subviews in hit-testing order: topmost first.
    pub fn hit_order(&self, id: ViewId) -> Vec<ViewId> {
        let mut order = self.draw_order(id);
        order.reverse();
        order
    }

    pub fn view_dyn(&self, id: ViewId) -> Option<&dyn View> {
        self.nodes.get(&id).map(|node| &*node.view)
    }

    /// Returns the view if it is of type `T`.
    pub fn view<T: View>(&self, id: ViewId) -> Option<&T> {
        self.nodes
            .get(&id)
            .and_then(|node| node.view.as_any().downcast_ref::<T>())
    }

    pub fn view_mut<T: View>(&mut self, id: ViewId) -> Option<&mut T> {
        self.nodes
            .get_mut(&id)
            .and_then(|node| node.view.as_any_mut().downcast_mut::<T>())
    }

    /// Ids of the subviews of `id` whose view is of type `T`, in subview order.
    pub fn subviews_of_type<T: View>(&self, id: ViewId) -> Vec<ViewId> {
        self.subviews(id)
            .iter()
            .copied()
            .filter(|s| self.view::<T>(*s).is_some())
            .collect()
    }

    pub fn needs_layout(&self) -> bool {
        self.needs_layout
    }

    /// Marks the whole tree for layout before the next draw.
    pub fn set_needs_layout(&mut self) {
        self.needs_layout = true;
    }

    /// Number of completed layout passes.
    pub fn layout_count(&self) -> u64 {
        self.layout_count
    }

    /// Runs `f` on a view with a [`ViewContext`] whose patches are queued on this tree.
    pub(crate) fn with_view<R>(
        &mut self,
        ctx: &mut Context,
        id: ViewId,
        f: impl FnOnce(&mut dyn View, &mut ViewContext<'_>) -> R,
    ) -> Option<R> {
        let node = self.nodes.get_mut(&id)?;
        let mut cx = ViewContext {
            ctx,
            id,
            bounds: node.bounds,
            patches: &mut self.patches,
        };
        Some(f(&mut *node.view, &mut cx))
    }

    /// Applies all queued patches.
    ///
    /// Patches for views that have disappeared in the meantime are dropped.
    pub fn flush_patches(&mut self) {
        let patches = std::mem::take(&mut self.patches);
        for patch in patches {
            let target = patch.target();
            if let Err(err) = self.apply_patch(patch) {
                tracing::debug!(?target, %err, "dropped patch");
            }
        }
    }

    fn apply_patch(&mut self, patch: Patch) -> Result<(), TreeError> {
        match patch {
            Patch::Insert {
                parent,
                index,
                id,
                view,
                z_order,
            } => self.insert_with_id(parent, index, id, view, z_order),
            Patch::Remove(id) => self.remove_from_superview(id).map(drop),
            Patch::SetBounds(id, bounds) => self.set_bounds(id, bounds),
            Patch::SetZOrder(id, z_order) => self.set_z_order(id, z_order),
            Patch::BringToFront(id) => self.bring_to_front(id),
        }
    }

    /// Collects all views in pre-order, subviews in subview order.
    fn collect_preorder(&self, id: ViewId, out: &mut Vec<ViewId>) {
        out.push(id);
        for subview in self.subviews(id) {
            self.collect_preorder(*subview, out);
        }
    }

    /// Updates every view, parents before subviews.
    ///
    /// The set of updated views is fixed when the pass starts.
    pub fn update(&mut self, ctx: &mut Context, elapsed: Duration) {
        let mut order = Vec::with_capacity(self.nodes.len());
        self.collect_preorder(self.root, &mut order);
        for id in order {
            self.with_view(ctx, id, |view, cx| view.update(cx, elapsed));
        }
        self.flush_patches();
    }

    /// Draws the tree back to front.
    pub fn draw(&self, ctx: &Context, surface: &mut dyn DrawSurface) {
        self.draw_view(ctx, surface, self.root, Point2::new(0, 0));
    }

    fn draw_view(
        &self,
        ctx: &Context,
        surface: &mut dyn DrawSurface,
        id: ViewId,
        offset: Point2<i32>,
    ) {
        let node = match self.nodes.get(&id) {
            Some(node) => node,
            None => return,
        };
        let bounds = node.bounds + offset;
        node.view.draw(ctx, surface, bounds);
        for subview in self.draw_order(id) {
            self.draw_view(ctx, surface, subview, bounds.origin);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::backend::{HeadlessSurface, MonospaceFont};
    use crate::color::Color;
    use crate::events::{EventOutcome, MouseState};
    use crate::impl_view;
    use crate::view::{Drawable, EventTarget, Layoutable};
    use std::sync::Arc;

    /// Draws its label and removes itself when clicked.
    #[derive(Debug)]
    pub(crate) struct Label(pub &'static str);

    impl Drawable for Label {
        fn draw(&self, ctx: &Context, surface: &mut dyn DrawSurface, bounds: Rect) {
            let origin = Point2::new(bounds.x() as f32, bounds.y() as f32);
            surface.draw_text(ctx.font(), self.0, origin, Color::WHITE, 0.);
        }
    }
    impl Layoutable for Label {}
    impl EventTarget for Label {
        fn mouse_left_click(
            &mut self,
            cx: &mut ViewContext<'_>,
            _mouse: &MouseState,
        ) -> EventOutcome {
            cx.remove_from_superview();
            EventOutcome::Handled
        }
    }
    impl_view!(Label);

    pub(crate) fn context() -> Context {
        Context::new(Vector2::new(800, 600), Arc::new(MonospaceFont::default()))
    }

    pub(crate) fn tree() -> ViewTree {
        ViewTree::new(Box::new(Label("root")), Rect::from_xywh(0, 0, 800, 600))
    }

    fn drawn(tree: &ViewTree) -> Vec<String> {
        let mut surface = HeadlessSurface::new();
        tree.draw(&context(), &mut surface);
        surface.texts().map(str::to_owned).collect()
    }

    #[test]
    fn draws_in_ascending_z_order() {
        let mut tree = tree();
        let root = tree.root();
        let a = tree.add_subview(root, Box::new(Label("a"))).unwrap();
        let b = tree.add_subview(root, Box::new(Label("b"))).unwrap();
        let c = tree.add_subview(root, Box::new(Label("c"))).unwrap();
        tree.set_z_order(a, 2).unwrap();
        tree.set_z_order(c, -1).unwrap();

        assert_eq!(tree.draw_order(root), vec![c, b, a]);
        assert_eq!(drawn(&tree), vec!["root", "c", "b", "a"]);
        assert_eq!(tree.hit_order(root), vec![a, b, c]);
    }

    #[test]
    fn bring_to_front_only_reorders_equal_z() {
        let mut tree = tree();
        let root = tree.root();
        let a = tree.add_subview(root, Box::new(Label("a"))).unwrap();
        let b = tree.add_subview(root, Box::new(Label("b"))).unwrap();
        let top = tree.add_subview(root, Box::new(Label("top"))).unwrap();
        tree.set_z_order(top, 1).unwrap();

        tree.bring_to_front(a).unwrap();
        assert_eq!(tree.subviews(root), &[b, top, a]);
        assert_eq!(tree.draw_order(root), vec![b, a, top]);
        assert_eq!(tree.bring_to_front(root), Err(TreeError::RootView));
    }

    #[test]
    fn equal_z_order_keeps_insertion_order() {
        let mut tree = tree();
        let root = tree.root();
        let a = tree.add_subview(root, Box::new(Label("a"))).unwrap();
        let c = tree.add_subview(root, Box::new(Label("c"))).unwrap();
        let b = tree.insert_subview_at(root, 1, Box::new(Label("b"))).unwrap();

        assert_eq!(tree.draw_order(root), vec![a, b, c]);
    }

    #[test]
    fn insert_out_of_bounds_is_rejected() {
        let mut tree = tree();
        let root = tree.root();
        let err = tree
            .insert_subview_at(root, 3, Box::new(Label("x")))
            .unwrap_err();
        assert_eq!(err, TreeError::IndexOutOfBounds { index: 3, len: 0 });
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn removing_drops_the_subtree() {
        let mut tree = tree();
        let root = tree.root();
        let panel = tree.add_subview(root, Box::new(Label("panel"))).unwrap();
        let inner = tree.add_subview(panel, Box::new(Label("inner"))).unwrap();

        tree.remove_from_superview(panel).unwrap();
        assert!(!tree.contains(panel));
        assert!(!tree.contains(inner));
        assert!(tree.subviews(root).is_empty());
        assert_eq!(
            tree.remove_from_superview(panel).unwrap_err(),
            TreeError::NoSuchView(panel)
        );
        assert_eq!(
            tree.remove_from_superview(root).unwrap_err(),
            TreeError::RootView
        );
    }

    #[test]
    fn reparenting_detaches_from_old_owner() {
        let mut tree = tree();
        let root = tree.root();
        let a = tree.add_subview(root, Box::new(Label("a"))).unwrap();
        let b = tree.add_subview(root, Box::new(Label("b"))).unwrap();
        let child = tree.add_subview(a, Box::new(Label("child"))).unwrap();

        tree.move_subview(child, b, None).unwrap();
        assert!(tree.subviews(a).is_empty());
        assert_eq!(tree.subviews(b), &[child]);
        assert_eq!(tree.superview(child), Some(b));

        assert_eq!(tree.move_subview(b, child, None), Err(TreeError::Cycle(b)));
        assert_eq!(tree.move_subview(b, b, None), Err(TreeError::Cycle(b)));
    }

    #[test]
    fn absolute_bounds_accumulate_origins() {
        let mut tree = tree();
        let root = tree.root();
        let panel = tree.add_subview(root, Box::new(Label("panel"))).unwrap();
        let inner = tree.add_subview(panel, Box::new(Label("inner"))).unwrap();
        tree.set_bounds(panel, Rect::from_xywh(100, 50, 200, 200))
            .unwrap();
        tree.set_bounds(inner, Rect::from_xywh(4, 6, 10, 10)).unwrap();

        assert_eq!(
            tree.absolute_bounds(inner),
            Some(Rect::from_xywh(104, 56, 10, 10))
        );
    }

    #[test]
    fn set_bounds_marks_layout_dirty_only_on_change() {
        let mut tree = tree();
        let root = tree.root();
        let panel = tree.add_subview(root, Box::new(Label("panel"))).unwrap();
        tree.needs_layout = false;

        tree.set_bounds(panel, Rect::zero()).unwrap();
        assert!(!tree.needs_layout());
        tree.set_bounds(panel, Rect::from_xywh(0, 0, 5, 5)).unwrap();
        assert!(tree.needs_layout());
    }

    #[test]
    fn patches_for_removed_views_are_dropped() {
        let mut tree = tree();
        let root = tree.root();
        let panel = tree.add_subview(root, Box::new(Label("panel"))).unwrap();
        tree.patches.push(Patch::Remove(panel));
        tree.patches.push(Patch::SetBounds(panel, Rect::from_xywh(1, 1, 1, 1)));
        tree.patches.push(Patch::Remove(panel));
        tree.flush_patches();

        assert!(!tree.contains(panel));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn subviews_of_type_filters_by_view_type() {
        #[derive(Debug)]
        struct Other;
        impl Drawable for Other {}
        impl Layoutable for Other {}
        impl EventTarget for Other {}
        impl_view!(Other);

        let mut tree = tree();
        let root = tree.root();
        let a = tree.add_subview(root, Box::new(Label("a"))).unwrap();
        tree.add_subview(root, Box::new(Other)).unwrap();
        let c = tree.add_subview(root, Box::new(Label("c"))).unwrap();

        assert_eq!(tree.subviews_of_type::<Label>(root), vec![a, c]);
        assert_eq!(tree.view::<Label>(c).map(|l| l.0), Some("c"));
        assert!(tree.view::<Other>(c).is_none());
    }
}
