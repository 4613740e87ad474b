//! The desktop.
//!
//! The desktop owns the view tree, the shared [`Context`] and every attached session. Its root
//! view holds the chrome panels (taskbar, game frame, sidebar with the stats windows, chat) and
//! one floating [`ContainerPanel`] per open container.
//!
//! Sessions notify the desktop of containers opening and closing from whatever code drives them.
//! Those notifications are queued and applied on the next [`Desktop::update`] or input event,
//! never while the tree is being traversed.

use crate::backend::{DrawSurface, FontMetrics};
use crate::color::Color;
use crate::config::{DesktopConfig, Skin};
use crate::context::Context;
use crate::events::{EventBus, EventOutcome, Key, MouseState, WindowResized};
use crate::fps::FrameCounter;
use crate::impl_view;
use crate::layout::SubviewLayout;
use crate::panels::{
    ChatPanel, ContainerPanel, GameFrame, GameSidebar, SessionSlot, SessionView, StatsKind,
    StatsPanel, TopTaskbar,
};
use crate::patch::TreeError;
use crate::rect::Rect;
use crate::session::{ContainerEvent, Session, SessionId};
use crate::tree::ViewTree;
use crate::view::{Drawable, EventTarget, Layoutable, ViewId};
use cgmath::{Point2, Vector2};
use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Depth of the FPS label; in front of everything the tree draws.
const FPS_LABEL_DEPTH: f32 = 0.5;

/// Broadcast when the active session changes.
#[derive(Debug, Clone)]
pub struct ActiveSessionChanged {
    pub session: Arc<dyn Session>,
}

#[derive(Debug)]
enum SessionNotice {
    Opened(ContainerEvent),
    Closed(ContainerEvent),
}

/// The desktop's root view. Pins the sidebar to the right edge of the window.
#[derive(Debug, Default)]
struct DesktopView {
    sidebar: Option<ViewId>,
}

impl Drawable for DesktopView {}

impl Layoutable for DesktopView {
    fn layout_subviews(&mut self, _: &Context, bounds: Rect, subviews: &mut SubviewLayout) {
        let sidebar = match self.sidebar {
            Some(sidebar) => sidebar,
            None => return,
        };
        if let Some(width) = subviews.preferred_size(sidebar).map(|size| size.x) {
            subviews.set_bounds(
                sidebar,
                Rect::from_xywh(bounds.width() - width, 0, width, bounds.height()),
            );
        }
    }
}

impl EventTarget for DesktopView {}

impl_view!(DesktopView);

/// Ids of the chrome panels.
#[derive(Debug, Clone, Copy)]
pub struct Panels {
    pub taskbar: ViewId,
    pub frame: ViewId,
    pub sidebar: ViewId,
    pub skills: ViewId,
    pub vips: ViewId,
    pub inventory: ViewId,
    pub chat: ViewId,
}

/// The top-level UI.
#[derive(Debug)]
pub struct Desktop {
    ctx: Context,
    tree: ViewTree,
    config: DesktopConfig,
    panels: Panels,
    sessions: Vec<Arc<dyn Session>>,
    active: Option<usize>,
    active_session_changed: EventBus<ActiveSessionChanged>,
    notice_tx: Sender<SessionNotice>,
    notice_rx: Receiver<SessionNotice>,
    local_fps: FrameCounter,
    rendered_fps: FrameCounter,
}

impl Desktop {
    /// Creates a desktop with its chrome panels and no sessions.
    pub fn new(
        window_size: Vector2<i32>,
        font: Arc<dyn FontMetrics>,
        config: DesktopConfig,
    ) -> Result<Desktop, TreeError> {
        let ctx = Context::new(window_size, font);
        let mut tree = ViewTree::new(Box::new(DesktopView::default()), ctx.window());
        let active_session_changed = EventBus::new();
        let panels = create_panels(&mut tree, &ctx, &config, &active_session_changed)?;
        let (notice_tx, notice_rx) = channel::unbounded();

        tracing::debug!(?window_size, "desktop created");
        Ok(Desktop {
            ctx,
            tree,
            config,
            panels,
            sessions: Vec::new(),
            active: None,
            active_session_changed,
            notice_tx,
            notice_rx,
            local_fps: FrameCounter::new(),
            rendered_fps: FrameCounter::new(),
        })
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn tree(&self) -> &ViewTree {
        &self.tree
    }

    pub fn config(&self) -> &DesktopConfig {
        &self.config
    }

    pub fn panels(&self) -> Panels {
        self.panels
    }

    /// Fires whenever a session becomes active.
    pub fn active_session_changed(&self) -> &EventBus<ActiveSessionChanged> {
        &self.active_session_changed
    }

    pub fn sessions(&self) -> &[Arc<dyn Session>] {
        &self.sessions
    }

    /// Attaches a session.
    ///
    /// The first attached session becomes active. Panels are created for containers the session
    /// already has open, and the desktop follows its container notifications from now on.
    pub fn attach_session(&mut self, session: Arc<dyn Session>) {
        let id = session.id();
        if self.session(id).is_some() {
            tracing::warn!(session = ?id, "session already attached");
            return;
        }
        tracing::info!(session = ?id, name = %session.name(), "attaching session");
        self.sessions.push(Arc::clone(&session));
        if self.active.is_none() {
            self.activate(self.sessions.len() - 1);
        }

        // Subscribe before taking the snapshot. A container that opens in between is reported
        // twice and the duplicate open is dropped; a close in between is queued behind it.
        let tx = self.notice_tx.clone();
        session.container_opened().subscribe(move |event: &ContainerEvent| {
            // only fails once the desktop is gone
            let _ = tx.send(SessionNotice::Opened(event.clone()));
        });
        let tx = self.notice_tx.clone();
        session.container_closed().subscribe(move |event: &ContainerEvent| {
            let _ = tx.send(SessionNotice::Closed(event.clone()));
        });

        for container in session.containers() {
            self.on_container_opened(ContainerEvent {
                session: id,
                container,
            });
        }

        let frame = self.panels.frame;
        let slot = self
            .tree
            .view::<GameFrame>(frame)
            .map(|frame| frame.active().clone())
            .unwrap_or_default();
        if let Err(err) = self
            .tree
            .add_subview(frame, Box::new(SessionView::new(Arc::clone(&session), slot)))
        {
            tracing::error!(%err, "failed to add session view");
        }
        if let Some(taskbar) = self.tree.view_mut::<TopTaskbar>(self.panels.taskbar) {
            taskbar.add_tab(id, session.name());
        }
    }

    fn session(&self, id: SessionId) -> Option<&Arc<dyn Session>> {
        self.sessions.iter().find(|session| session.id() == id)
    }

    /// The active session.
    ///
    /// # Panics
    /// Panics if no session has been attached.
    pub fn active_session(&self) -> Arc<dyn Session> {
        match self.try_active_session() {
            Some(session) => session,
            None => panic!("no active session: attach a session first"),
        }
    }

    pub fn try_active_session(&self) -> Option<Arc<dyn Session>> {
        self.active.map(|index| Arc::clone(&self.sessions[index]))
    }

    /// Makes an attached session active. Returns false if `id` is not attached.
    pub fn set_active_session(&mut self, id: SessionId) -> bool {
        match self.sessions.iter().position(|session| session.id() == id) {
            Some(index) => {
                if self.active != Some(index) {
                    self.activate(index);
                }
                true
            }
            None => {
                tracing::warn!(session = ?id, "cannot activate a session that is not attached");
                false
            }
        }
    }

    fn activate(&mut self, index: usize) {
        self.active = Some(index);
        let session = Arc::clone(&self.sessions[index]);
        tracing::debug!(session = ?session.id(), "active session changed");
        let delivered = self
            .active_session_changed
            .publish(&ActiveSessionChanged { session });
        tracing::trace!(delivered, "active session broadcast");
    }

    /// Applies queued container notifications.
    pub fn pump_session_events(&mut self) {
        loop {
            match self.notice_rx.try_recv() {
                Ok(SessionNotice::Opened(event)) => self.on_container_opened(event),
                Ok(SessionNotice::Closed(event)) => self.on_container_closed(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    /// Panels for open containers, back to front.
    pub fn container_panels(&self) -> Vec<ViewId> {
        self.tree.subviews_of_type::<ContainerPanel>(self.tree.root())
    }

    /// The panel showing a container, if any.
    pub fn container_panel(&self, session: SessionId, container: u32) -> Option<ViewId> {
        self.container_panels().into_iter().find(|id| {
            self.tree
                .view::<ContainerPanel>(*id)
                .map_or(false, |panel| {
                    panel.session_id() == session && panel.container_id() == container
                })
        })
    }

    fn on_container_opened(&mut self, event: ContainerEvent) {
        let session = match self.session(event.session) {
            Some(session) => Arc::clone(session),
            None => {
                tracing::warn!(session = ?event.session, "container opened in an unknown session");
                return;
            }
        };
        let container = event.container.id;
        if self.container_panel(event.session, container).is_some() {
            tracing::debug!(session = ?event.session, container, "container panel already open");
            return;
        }

        let row = self.container_panels().len() as i32;
        let bounds = Rect::from_xywh(
            self.config.container_band_x,
            row * self.config.container_row_height,
            self.config.container_width,
            self.config.container_row_height,
        );
        let root = self.tree.root();
        let result = self
            .tree
            .add_subview(root, Box::new(ContainerPanel::new(session, container)))
            .and_then(|id| {
                self.tree.set_bounds(id, bounds)?;
                self.tree.set_z_order(id, 1)
            });
        match result {
            Ok(()) => tracing::debug!(container, ?bounds, "container panel opened"),
            Err(err) => tracing::error!(container, %err, "failed to open container panel"),
        }
    }

    fn on_container_closed(&mut self, event: ContainerEvent) {
        let container = event.container.id;
        match self.container_panel(event.session, container) {
            Some(id) => {
                if let Err(err) = self.tree.remove_from_superview(id) {
                    tracing::error!(container, %err, "failed to close container panel");
                }
            }
            None => tracing::trace!(container, "closed container had no panel"),
        }
    }

    /// Handles a change of the window's client size.
    ///
    /// Degenerate sizes (e.g. while minimized) are ignored.
    pub fn on_resize(&mut self, event: WindowResized) {
        if event.new.x <= 0 || event.new.y <= 0 {
            tracing::debug!(size = ?event.new, "ignoring degenerate window size");
            return;
        }
        tracing::debug!(old = ?event.old, new = ?event.new, "window resized");
        self.ctx.set_window_size(event.new);
        let root = self.tree.root();
        if let Err(err) = self.tree.set_bounds(root, Rect::new(Point2::new(0, 0), event.new)) {
            tracing::error!(%err, "failed to resize root view");
        }
    }

    /// Swaps the skin; takes effect on the next update.
    pub fn change_skin(&mut self, skin: Skin) {
        self.ctx.change_skin(skin);
    }

    /// Advances one frame.
    pub fn update(&mut self, elapsed: Duration) {
        self.update_at(Instant::now(), elapsed);
    }

    /// Advances one frame, sampling the update rate at `now`.
    pub fn update_at(&mut self, now: Instant, elapsed: Duration) {
        let skin_changed = self.ctx.skin_changed();
        self.ctx.update(elapsed);
        self.local_fps.tick(now);

        for session in &self.sessions {
            session.update(elapsed);
        }
        self.pump_session_events();

        self.tree.update(&mut self.ctx, elapsed);
        if skin_changed {
            self.tree.set_needs_layout();
        }
        self.tree.layout_if_needed(&self.ctx);
        if skin_changed {
            // sizes measured against the new skin settle on the following pass
            self.tree.set_needs_layout();
        }
    }

    /// Draws one frame.
    pub fn draw(&mut self, surface: &mut dyn DrawSurface) {
        self.draw_at(Instant::now(), surface);
    }

    /// Draws one frame, sampling the render rate at `now`.
    pub fn draw_at(&mut self, now: Instant, surface: &mut dyn DrawSurface) {
        surface.begin();
        self.rendered_fps.tick(now);
        self.draw_fps_label(surface);
        self.tree.draw(&self.ctx, surface);
        surface.end();
    }

    fn draw_fps_label(&self, surface: &mut dyn DrawSurface) {
        let text = self.fps_label();
        let font = self.ctx.font();
        let size = font.measure_string(&text);
        let margin = self.config.fps_label_margin as f32;
        let position = Point2::new(self.ctx.window().width() as f32 - size.x - margin, margin);
        surface.draw_text(font, &text, position, Color::LIGHT_GREEN, FPS_LABEL_DEPTH);
    }

    /// Text of the frame-rate readout.
    pub fn fps_label(&self) -> String {
        format!(
            " LFPS: {} GFPS: {} RCTC",
            self.local_fps.count(),
            self.rendered_fps.count()
        )
    }

    /// Updates per second over the last second.
    pub fn local_fps(&self) -> usize {
        self.local_fps.count()
    }

    /// Frames drawn over the last second.
    pub fn rendered_fps(&self) -> usize {
        self.rendered_fps.count()
    }

    pub fn mouse_left_click(&mut self, mouse: MouseState) -> EventOutcome {
        let outcome = self.tree.mouse_left_click(&mut self.ctx, mouse);
        self.after_input();
        outcome
    }

    pub fn mouse_left_release(&mut self, mouse: MouseState) -> EventOutcome {
        let outcome = self.tree.mouse_left_release(&mut self.ctx, mouse);
        self.after_input();
        outcome
    }

    pub fn mouse_move(&mut self, mouse: MouseState) -> EventOutcome {
        let outcome = self.tree.mouse_move(&mut self.ctx, mouse);
        self.after_input();
        outcome
    }

    pub fn key_press(&mut self, key: Key) -> EventOutcome {
        let outcome = self.tree.key_press(&mut self.ctx, key);
        self.after_input();
        outcome
    }

    /// Picks up requests made by panels during input dispatch.
    fn after_input(&mut self) {
        let requested = self
            .tree
            .view_mut::<TopTaskbar>(self.panels.taskbar)
            .and_then(TopTaskbar::take_request);
        if let Some(session) = requested {
            self.set_active_session(session);
        }
        self.pump_session_events();
    }
}

fn create_panels(
    tree: &mut ViewTree,
    ctx: &Context,
    config: &DesktopConfig,
    active_session_changed: &EventBus<ActiveSessionChanged>,
) -> Result<Panels, TreeError> {
    let root = tree.root();
    let window = ctx.window();
    let follow = || {
        let slot = SessionSlot::new();
        slot.subscribe(active_session_changed);
        slot
    };

    let taskbar = tree.add_subview(
        root,
        Box::new(TopTaskbar::new(config.taskbar_height, follow())),
    )?;
    tree.set_bounds(
        taskbar,
        Rect::from_xywh(0, 0, window.width() - ctx.skin().sidebar_width, config.taskbar_height),
    )?;

    let frame = tree.add_subview(root, Box::new(GameFrame::new(follow())))?;
    tree.set_bounds(frame, config.frame.into())?;
    tree.set_z_order(frame, -1)?;

    let sidebar_width = ctx.skin().sidebar_width;
    let sidebar = tree.add_subview(root, Box::new(GameSidebar::new(config.sidebar_window_x)))?;
    tree.set_bounds(
        sidebar,
        Rect::from_xywh(window.width() - sidebar_width, 0, sidebar_width, window.height()),
    )?;
    if let Some(view) = tree.view_mut::<DesktopView>(root) {
        view.sidebar = Some(sidebar);
    }

    let window_width = sidebar_width - 2 * config.sidebar_window_x;
    let mut stats = [ViewId::new(); 3];
    let kinds = [StatsKind::Skills, StatsKind::Vips, StatsKind::Inventory];
    for ((kind, y), id) in kinds.iter().zip(config.sidebar_window_ys.iter()).zip(stats.iter_mut()) {
        *id = tree.add_subview(sidebar, Box::new(StatsPanel::new(*kind, follow())))?;
        let bounds = Rect::from_xywh(
            config.sidebar_window_x,
            *y,
            window_width,
            config.sidebar_window_height,
        );
        tree.set_bounds(*id, bounds)?;
    }

    let chat = tree.add_subview(root, Box::new(ChatPanel::new(follow())))?;
    tree.set_bounds(chat, config.chat.into())?;

    Ok(Panels {
        taskbar,
        frame,
        sidebar,
        skills: stats[0],
        vips: stats[1],
        inventory: stats[2],
        chat,
    })
}
