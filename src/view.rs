use crate::backend::DrawSurface;
use crate::context::Context;
use crate::events::{EventOutcome, Key, MouseState};
use crate::layout::SubviewLayout;
use crate::patch::Patch;
use crate::rect::Rect;
use cgmath::Vector2;
use core::any::Any;
use core::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Identifies a node in a [`ViewTree`](crate::ViewTree).
///
/// Ids are never reused: once a node has been removed, its id stops resolving.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(Uuid);

impl ViewId {
    pub fn new() -> ViewId {
        ViewId(Uuid::new_v4())
    }
}

impl Default for ViewId {
    fn default() -> Self {
        ViewId::new()
    }
}

impl fmt::Debug for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let bytes = self.0.as_bytes();
        write!(f, "ViewId({:02x}{:02x}{:02x}{:02x})", bytes[0], bytes[1], bytes[2], bytes[3])
    }
}

/// Implements the `View` trait for a given type.
///
/// The type must also implement [`Drawable`], [`Layoutable`] and [`EventTarget`]; an empty
/// `impl Layoutable for MyView {}` picks up the default behavior.
///
/// ```text
/// impl_view!(StructName);
/// ```
#[macro_export]
macro_rules! impl_view {
    ($struct:ty) => {
        impl $crate::View for $struct {
            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }
        }
    };
}

/// Per-frame behavior and rendering.
pub trait Drawable {
    /// Called once per frame before layout.
    fn update(&mut self, cx: &mut ViewContext<'_>, elapsed: Duration) {
        let _ = (cx, elapsed);
    }

    /// Draws the view.
    ///
    /// - `bounds`: the view's bounds in window coordinates
    ///
    /// Subviews are drawn by the tree after this returns, so anything drawn here ends up behind
    /// them.
    fn draw(&self, ctx: &Context, surface: &mut dyn DrawSurface, bounds: Rect) {
        let _ = (ctx, surface, bounds);
    }
}

/// Participation in the two-phase layout pass.
pub trait Layoutable {
    /// Measure phase. Runs bottom-up, so `subviews` already holds the preferred size of every
    /// subview, in subview order.
    ///
    /// Returns this view's preferred size. The default keeps the current size.
    fn measure(
        &mut self,
        ctx: &Context,
        current: Vector2<i32>,
        subviews: &[Vector2<i32>],
    ) -> Vector2<i32> {
        let _ = (ctx, subviews);
        current
    }

    /// Position phase. Runs top-down after this view's own bounds are final.
    ///
    /// - `bounds`: this view's bounds in its own coordinate system (origin at zero)
    /// - `subviews`: pre-filled with each subview's current origin and preferred size
    fn layout_subviews(&mut self, ctx: &Context, bounds: Rect, subviews: &mut SubviewLayout) {
        let _ = (ctx, bounds, subviews);
    }
}

/// Input handling.
///
/// Mouse positions are in the coordinate system of the view's owner for `accepts_mouse_event`,
/// and local to the view itself for the handlers.
pub trait EventTarget {
    /// Hit test. The default accepts events inside the view's bounds.
    fn accepts_mouse_event(&self, bounds: Rect, mouse: &MouseState) -> bool {
        bounds.contains(mouse.position)
    }

    fn mouse_left_click(&mut self, cx: &mut ViewContext<'_>, mouse: &MouseState) -> EventOutcome {
        let _ = (cx, mouse);
        EventOutcome::Ignored
    }

    fn mouse_left_release(
        &mut self,
        cx: &mut ViewContext<'_>,
        mouse: &MouseState,
    ) -> EventOutcome {
        let _ = (cx, mouse);
        EventOutcome::Ignored
    }

    /// Only delivered while this view holds the mouse capture.
    fn mouse_move(&mut self, cx: &mut ViewContext<'_>, mouse: &MouseState) -> EventOutcome {
        let _ = (cx, mouse);
        EventOutcome::Ignored
    }

    /// Only delivered while this view has keyboard focus.
    fn key_press(&mut self, cx: &mut ViewContext<'_>, key: &Key) -> EventOutcome {
        let _ = (cx, key);
        EventOutcome::Ignored
    }
}

/// A node's behavior in the view tree.
///
/// Views are composed by ownership in a [`ViewTree`](crate::ViewTree); the tree stores bounds,
/// z-order and subviews, while the view supplies the capabilities. Implement the three capability
/// traits and use [`impl_view`] for the rest.
pub trait View: Drawable + Layoutable + EventTarget + Any + fmt::Debug {
    /// For downcasting.
    fn as_any(&self) -> &dyn Any;

    /// For downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Handle given to views while they are being updated or receive an event.
///
/// Views cannot touch the tree directly while it is being traversed; structural changes are
/// queued as [`Patch`]es and applied once the traversal completes.
pub struct ViewContext<'a> {
    pub(crate) ctx: &'a mut Context,
    pub(crate) id: ViewId,
    pub(crate) bounds: Rect,
    pub(crate) patches: &'a mut Vec<Patch>,
}

impl<'a> ViewContext<'a> {
    /// The id of the view receiving the call.
    pub fn id(&self) -> ViewId {
        self.id
    }

    /// The view's bounds relative to its superview.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn context(&self) -> &Context {
        &*self.ctx
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut *self.ctx
    }

    /// Routes all following mouse events to this view.
    pub fn capture_mouse(&mut self) {
        self.ctx.capture_mouse(self.id);
    }

    /// Releases the mouse capture if this view holds it.
    pub fn release_mouse(&mut self) {
        if self.has_mouse_capture() {
            self.ctx.release_mouse();
        }
    }

    pub fn has_mouse_capture(&self) -> bool {
        self.ctx.mouse_capture() == Some(self.id)
    }

    /// Gives this view keyboard focus.
    pub fn focus(&mut self) {
        self.ctx.set_focus(Some(self.id));
    }

    pub fn is_focused(&self) -> bool {
        self.ctx.focus() == Some(self.id)
    }

    /// Removes this view (and its subviews) once the current traversal completes.
    pub fn remove_from_superview(&mut self) {
        self.patches.push(Patch::Remove(self.id));
    }

    /// Removes another view once the current traversal completes.
    pub fn remove_view(&mut self, id: ViewId) {
        self.patches.push(Patch::Remove(id));
    }

    /// Moves or resizes this view once the current traversal completes.
    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
        self.patches.push(Patch::SetBounds(self.id, bounds));
    }

    /// Adds a subview to `parent` once the current traversal completes.
    ///
    /// The id is assigned immediately so it can be stored right away.
    pub fn add_subview(&mut self, parent: ViewId, view: Box<dyn View>, z_order: i32) -> ViewId {
        let id = ViewId::new();
        self.patches.push(Patch::Insert {
            parent,
            index: None,
            id,
            view,
            z_order,
        });
        id
    }

    /// Moves this view in front of its siblings of equal z-order.
    pub fn bring_to_front(&mut self) {
        self.patches.push(Patch::BringToFront(self.id));
    }

    /// Changes the z-order of this view.
    pub fn set_z_order(&mut self, z_order: i32) {
        self.patches.push(Patch::SetZOrder(self.id, z_order));
    }
}
