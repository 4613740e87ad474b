use super::{text_origin, SessionSlot};
use crate::backend::DrawSurface;
use crate::context::Context;
use crate::events::{EventOutcome, MouseState};
use crate::impl_view;
use crate::rect::Rect;
use crate::session::SessionId;
use crate::view::{Drawable, EventTarget, Layoutable, ViewContext};
use cgmath::{Point2, Vector2};

const TAB_PADDING: i32 = 6;
const FIRST_TAB_X: i32 = 4;

#[derive(Debug, Clone)]
struct Tab {
    session: SessionId,
    title: String,
}

/// The bar along the top of the window with one tab per attached session.
///
/// Clicking a tab asks the desktop to switch to that session; the desktop collects the request
/// with [`TopTaskbar::take_request`] after dispatching the click.
#[derive(Debug)]
pub struct TopTaskbar {
    height: i32,
    tabs: Vec<Tab>,
    active: SessionSlot,
    request: Option<SessionId>,
}

impl TopTaskbar {
    pub fn new(height: i32, active: SessionSlot) -> TopTaskbar {
        TopTaskbar {
            height,
            tabs: Vec::new(),
            active,
            request: None,
        }
    }

    pub fn add_tab(&mut self, session: SessionId, title: impl Into<String>) {
        self.tabs.push(Tab {
            session,
            title: title.into(),
        });
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    /// Takes the session the user last clicked on, if any.
    pub fn take_request(&mut self) -> Option<SessionId> {
        self.request.take()
    }

    /// Tab extents along x, in local coordinates.
    fn tab_spans<'a>(&'a self, ctx: &'a Context) -> impl Iterator<Item = (i32, i32, &'a Tab)> + 'a {
        let font = ctx.font();
        let mut x = FIRST_TAB_X;
        self.tabs.iter().map(move |tab| {
            let width = font.measure_string(&tab.title).x.ceil() as i32 + 2 * TAB_PADDING;
            let start = x;
            x += width;
            (start, x, tab)
        })
    }
}

impl Drawable for TopTaskbar {
    fn draw(&self, ctx: &Context, surface: &mut dyn DrawSurface, bounds: Rect) {
        surface.fill_rect(bounds, ctx.skin().panel_color, 0.);
        let active = self.active.get().map(|session| session.id());
        for (start, end, tab) in self.tab_spans(ctx) {
            if Some(tab.session) == active {
                let highlight =
                    Rect::from_xywh(bounds.x() + start, bounds.y(), end - start, bounds.height());
                surface.fill_rect(highlight, ctx.skin().text_color.with_alpha(0.2), 0.);
            }
            let origin = text_origin(bounds.x() + start + TAB_PADDING, bounds.y() + 2);
            surface.draw_text(ctx.font(), &tab.title, origin, ctx.skin().text_color, 0.);
        }

        let count = match self.tabs.len() {
            1 => "1 session".to_owned(),
            n => format!("{} sessions", n),
        };
        let width = ctx.font().measure_string(&count).x;
        let x = bounds.right() as f32 - width - TAB_PADDING as f32;
        surface.draw_text(
            ctx.font(),
            &count,
            Point2::new(x, (bounds.y() + 2) as f32),
            ctx.skin().text_color,
            0.,
        );
    }
}

impl Layoutable for TopTaskbar {
    /// Spans the window, minus the sidebar.
    fn measure(&mut self, ctx: &Context, _: Vector2<i32>, _: &[Vector2<i32>]) -> Vector2<i32> {
        let width = ctx.window().width() - ctx.skin().sidebar_width;
        Vector2::new(width, self.height)
    }
}

impl EventTarget for TopTaskbar {
    fn mouse_left_click(&mut self, cx: &mut ViewContext<'_>, mouse: &MouseState) -> EventOutcome {
        let x = mouse.position.x;
        let clicked = self
            .tab_spans(cx.context())
            .find(|(start, end, _)| (*start..*end).contains(&x))
            .map(|(_, _, tab)| tab.session);
        match clicked {
            Some(session) => {
                tracing::debug!(?session, "taskbar tab clicked");
                self.request = Some(session);
                EventOutcome::Handled
            }
            None => EventOutcome::Ignored,
        }
    }
}

impl_view!(TopTaskbar);
