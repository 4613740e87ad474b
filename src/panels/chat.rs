use super::{draw_lines, text_origin, SessionSlot};
use crate::backend::DrawSurface;
use crate::context::Context;
use crate::events::{EventOutcome, Key, KeyCode, MouseState};
use crate::impl_view;
use crate::rect::Rect;
use crate::view::{Drawable, EventTarget, Layoutable, ViewContext};
use cgmath::Point2;

/// The chat console of the active session.
///
/// Clicking the panel gives it keyboard focus. Typed characters build a draft which `Return`
/// sends through the session and `Escape` discards.
#[derive(Debug)]
pub struct ChatPanel {
    session: SessionSlot,
    draft: String,
}

impl ChatPanel {
    pub fn new(session: SessionSlot) -> ChatPanel {
        ChatPanel {
            session,
            draft: String::new(),
        }
    }

    pub fn session(&self) -> &SessionSlot {
        &self.session
    }

    /// The message being typed.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    fn send(&mut self) {
        let text = std::mem::take(&mut self.draft);
        if text.trim().is_empty() {
            return;
        }
        match self.session.get() {
            Some(session) => session.say(&text),
            None => tracing::warn!("chat message dropped: no active session"),
        }
    }
}

impl Drawable for ChatPanel {
    fn draw(&self, ctx: &Context, surface: &mut dyn DrawSurface, bounds: Rect) {
        surface.fill_rect(bounds, ctx.skin().panel_color, 0.);

        let spacing = ctx.font().line_spacing();
        // one line is reserved for the draft
        let visible = ((bounds.height() as f32 / spacing).floor() as usize).saturating_sub(1);
        let log: Vec<String> = self
            .session
            .get()
            .map(|session| {
                session
                    .chat_log()
                    .iter()
                    .map(|message| format!("{}: {}", message.speaker, message.text))
                    .collect()
            })
            .unwrap_or_default();
        let skip = log.len().saturating_sub(visible);
        draw_lines(
            ctx,
            surface,
            text_origin(bounds.x() + 2, bounds.y() + 2),
            log.iter().skip(skip).map(String::as_str),
            0.,
        );

        let prompt = format!("> {}", self.draft);
        let y = bounds.bottom() as f32 - spacing - 2.;
        surface.draw_text(
            ctx.font(),
            &prompt,
            Point2::new((bounds.x() + 2) as f32, y),
            ctx.skin().text_color,
            0.,
        );
    }
}

impl Layoutable for ChatPanel {}

impl EventTarget for ChatPanel {
    fn mouse_left_click(&mut self, cx: &mut ViewContext<'_>, _: &MouseState) -> EventOutcome {
        cx.focus();
        EventOutcome::Handled
    }

    fn key_press(&mut self, _: &mut ViewContext<'_>, key: &Key) -> EventOutcome {
        match key.code {
            KeyCode::Return => self.send(),
            KeyCode::Escape => self.draft.clear(),
            KeyCode::Delete => {
                self.draft.pop();
            }
            KeyCode::Space => self.draft.push(' '),
            KeyCode::Character => match key.text {
                Some(c) if !c.is_control() => self.draft.push(c),
                _ => return EventOutcome::Ignored,
            },
            _ => return EventOutcome::Ignored,
        }
        EventOutcome::Handled
    }
}

impl_view!(ChatPanel);
