//! Client sessions.
//!
//! A session is the live client state the desktop reflects: open containers, player stats and the
//! chat log. Protocol handling lives elsewhere; the desktop only reads state and listens to the
//! container notifications.

use crate::events::EventBus;
use core::fmt;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

/// Identifies a session.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> SessionId {
        SessionId(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        SessionId::new()
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let bytes = self.0.as_bytes();
        write!(f, "SessionId({:02x}{:02x}{:02x}{:02x})", bytes[0], bytes[1], bytes[2], bytes[3])
    }
}

/// A stack of items in a container slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    pub kind: u16,
    pub count: u8,
}

/// An open container. Its id is unique among the containers open in one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub id: u32,
    pub name: String,
    pub capacity: u32,
    pub items: Vec<Item>,
}

impl Container {
    pub fn new(id: u32, name: impl Into<String>, capacity: u32) -> Container {
        Container {
            id,
            name: name.into(),
            capacity,
            items: Vec::new(),
        }
    }
}

/// A container opened or closed in a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerEvent {
    pub session: SessionId,
    pub container: Container,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skill {
    pub name: String,
    pub level: u32,
}

/// An entry in the VIP list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vip {
    pub name: String,
    pub online: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerStats {
    pub name: String,
    pub level: u32,
    pub skills: Vec<Skill>,
    pub vips: Vec<Vip>,
    pub inventory: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub speaker: String,
    pub text: String,
}

/// The session interface the desktop consumes.
pub trait Session: fmt::Debug + Send + Sync {
    fn id(&self) -> SessionId;

    /// Display name, e.g. the character name.
    fn name(&self) -> String;

    /// Currently open containers, ordered by id.
    fn containers(&self) -> Vec<Container>;

    fn container(&self, id: u32) -> Option<Container>;

    /// Fires after a container has opened.
    fn container_opened(&self) -> &EventBus<ContainerEvent>;

    /// Fires after a container has closed.
    fn container_closed(&self) -> &EventBus<ContainerEvent>;

    /// Asks the session to close a container. Returns false if it was not open.
    fn close_container(&self, id: u32) -> bool;

    fn player(&self) -> PlayerStats;

    fn chat_log(&self) -> Vec<ChatMessage>;

    /// Sends a chat message.
    fn say(&self, text: &str);

    /// Advances the session; called once per frame.
    fn update(&self, elapsed: Duration);
}

#[derive(Debug, Default)]
struct SessionState {
    containers: BTreeMap<u32, Container>,
    player: PlayerStats,
    chat: Vec<ChatMessage>,
}

/// An in-process session, driven directly by the host.
#[derive(Debug)]
pub struct ClientSession {
    id: SessionId,
    state: Mutex<SessionState>,
    opened: EventBus<ContainerEvent>,
    closed: EventBus<ContainerEvent>,
}

impl ClientSession {
    pub fn new(player: PlayerStats) -> ClientSession {
        ClientSession {
            id: SessionId::new(),
            state: Mutex::new(SessionState {
                player,
                ..SessionState::default()
            }),
            opened: EventBus::new(),
            closed: EventBus::new(),
        }
    }

    /// Shorthand for a session with a named player and no other state.
    pub fn named(name: &str) -> ClientSession {
        ClientSession::new(PlayerStats {
            name: name.into(),
            ..PlayerStats::default()
        })
    }

    /// Opens a container and notifies subscribers.
    ///
    /// Returns false, without notifying, if a container with the same id is already open.
    pub fn open_container(&self, container: Container) -> bool {
        {
            let mut state = self.state.lock();
            if state.containers.contains_key(&container.id) {
                tracing::warn!(session = ?self.id, id = container.id, "container already open");
                return false;
            }
            state.containers.insert(container.id, container.clone());
        }
        self.opened.publish(&ContainerEvent {
            session: self.id,
            container,
        });
        true
    }

    pub fn set_player(&self, player: PlayerStats) {
        self.state.lock().player = player;
    }

    /// Appends a message from someone else.
    pub fn receive_chat(&self, speaker: &str, text: &str) {
        self.state.lock().chat.push(ChatMessage {
            speaker: speaker.into(),
            text: text.into(),
        });
    }
}

impl Session for ClientSession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn name(&self) -> String {
        self.state.lock().player.name.clone()
    }

    fn containers(&self) -> Vec<Container> {
        self.state.lock().containers.values().cloned().collect()
    }

    fn container(&self, id: u32) -> Option<Container> {
        self.state.lock().containers.get(&id).cloned()
    }

    fn container_opened(&self) -> &EventBus<ContainerEvent> {
        &self.opened
    }

    fn container_closed(&self) -> &EventBus<ContainerEvent> {
        &self.closed
    }

    fn close_container(&self, id: u32) -> bool {
        let container = match self.state.lock().containers.remove(&id) {
            Some(container) => container,
            None => return false,
        };
        self.closed.publish(&ContainerEvent {
            session: self.id,
            container,
        });
        true
    }

    fn player(&self) -> PlayerStats {
        self.state.lock().player.clone()
    }

    fn chat_log(&self) -> Vec<ChatMessage> {
        self.state.lock().chat.clone()
    }

    fn say(&self, text: &str) {
        let mut state = self.state.lock();
        let speaker = state.player.name.clone();
        state.chat.push(ChatMessage {
            speaker,
            text: text.into(),
        });
    }

    // state only changes through the host's calls
    fn update(&self, _: Duration) {}
}
