//! Events.
//!
//! Input events (mouse and keyboard) are routed through the view tree by the router. Broadcast
//! notifications (window resizes, session changes, containers opening and closing) go through an
//! [`EventBus`], which delivers synchronously to every subscriber on the calling thread.

use cgmath::{Point2, Vector2};
use core::fmt;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// Result of offering an event to a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The event was consumed; propagation stops.
    Handled,
    /// The event was not consumed.
    Ignored,
}

impl EventOutcome {
    pub fn is_handled(self) -> bool {
        self == EventOutcome::Handled
    }
}

impl From<bool> for EventOutcome {
    fn from(handled: bool) -> Self {
        if handled {
            EventOutcome::Handled
        } else {
            EventOutcome::Ignored
        }
    }
}

/// Mouse state at the time of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseState {
    /// Pointer location. Window coordinates when handed to the router; the router rewrites it to
    /// the receiving view's local coordinate system.
    pub position: Point2<i32>,

    /// Whether the left button is held.
    pub left_down: bool,
}

impl MouseState {
    pub fn new(x: i32, y: i32) -> MouseState {
        MouseState {
            position: Point2::new(x, y),
            left_down: false,
        }
    }

    /// Returns a copy of this state located at another position.
    pub fn at(self, position: Point2<i32>) -> MouseState {
        MouseState { position, ..self }
    }
}

/// Keyboard layout-independent identifiers for the keys the UI reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A key that produces text; see [`Key::text`].
    Character,
    Return,
    Space,
    Delete,
    Escape,
}

/// A key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    pub code: KeyCode,
    /// The character produced by the key, if any.
    pub text: Option<char>,
}

impl Key {
    pub fn new(code: KeyCode) -> Key {
        Key {
            code,
            text: None,
        }
    }

    /// A key press producing a character.
    pub fn character(c: char) -> Key {
        Key {
            code: KeyCode::Character,
            text: Some(c),
        }
    }
}

/// Window client area size change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowResized {
    pub old: Vector2<i32>,
    pub new: Vector2<i32>,
}

/// A subscriber callback.
///
/// `delivering` names the thread currently running the callback, so a nested publish from inside
/// the callback can be told apart from a concurrent publish on another thread.
pub struct EventHandler<E> {
    delivering: Arc<Mutex<Option<ThreadId>>>,
    callback: Arc<Mutex<dyn FnMut(&E) + Send>>,
}

impl<E> Clone for EventHandler<E> {
    fn clone(&self) -> Self {
        EventHandler {
            delivering: Arc::clone(&self.delivering),
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<E> EventHandler<E> {
    pub fn new<F: 'static + FnMut(&E) + Send>(handler: F) -> Self {
        EventHandler {
            delivering: Arc::new(Mutex::new(None)),
            callback: Arc::new(Mutex::new(handler)),
        }
    }

    /// Runs the callback unless this thread is already inside it. Waits for other threads.
    fn deliver(&self, event: &E) -> bool {
        let current = thread::current().id();
        if *self.delivering.lock() == Some(current) {
            return false;
        }
        let mut callback = self.callback.lock();
        *self.delivering.lock() = Some(current);
        let _marker = DeliveryMarker(&self.delivering);
        (&mut *callback)(event);
        true
    }
}

/// Clears the delivering thread, also when the callback panics.
struct DeliveryMarker<'a>(&'a Mutex<Option<ThreadId>>);

impl Drop for DeliveryMarker<'_> {
    fn drop(&mut self) {
        *self.0.lock() = None;
    }
}

impl<E> fmt::Debug for EventHandler<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "EventHandler<{}>", core::any::type_name::<E>())
    }
}

/// A typed publish/subscribe channel.
///
/// Subscriptions are permanent. `publish` delivers to a snapshot of the subscriber list taken when
/// it starts, so handlers may subscribe new handlers without affecting the current delivery.
pub struct EventBus<E> {
    handlers: Mutex<Vec<EventHandler<E>>>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        EventBus {
            handlers: Mutex::new(Vec::new()),
        }
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("event", &core::any::type_name::<E>())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl<E> EventBus<E> {
    pub fn new() -> EventBus<E> {
        EventBus::default()
    }

    /// Registers a handler for every future event.
    pub fn subscribe<F: 'static + FnMut(&E) + Send>(&self, handler: F) {
        self.handlers.lock().push(EventHandler::new(handler));
    }

    /// Delivers an event to every subscriber, in subscription order.
    ///
    /// Returns the number of handlers that received the event. A handler that publishes on the
    /// bus it is subscribed to does not receive its own nested event. A handler busy on another
    /// thread is waited for, so concurrent publishers never lose events.
    pub fn publish(&self, event: &E) -> usize {
        let handlers = self.handlers.lock().clone();
        let mut delivered = 0;
        for handler in handlers {
            if handler.deliver(event) {
                delivered += 1;
            } else {
                tracing::warn!(
                    event = core::any::type_name::<E>(),
                    "skipped re-entrant event delivery"
                );
            }
        }
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.lock().len()
    }
}
