//! Game client desktop UI.
//!
//! # Conceptual overview
//! Roost is a retained-mode UI: views live in a [`ViewTree`] for as long as they are on screen and
//! are updated, laid out, drawn and offered input once per frame by the [`Desktop`].
//!
//! ## Views
//! A view is any type implementing the three capability traits [`Drawable`], [`Layoutable`] and
//! [`EventTarget`]; [`impl_view!`] supplies the rest of [`View`]. Each node in the tree stores a
//! view together with its bounds (relative to its superview), its z-order and its subviews, so
//! views themselves only hold their own state.
//!
//! Views never see the tree. Updates and event handlers get a [`ViewContext`] instead, through
//! which they can request structural changes (removing themselves, adding subviews, moving). Those
//! requests are applied once the current traversal is complete, so a traversal always visits
//! exactly the views that existed when it started.
//!
//! ## Events
//! Mouse clicks and releases go to the topmost view under the pointer, subviews before their
//! owners, until a view handles them. A view may capture the mouse, after which it receives all
//! mouse events regardless of position until it releases the capture. Keys go to the view with
//! keyboard focus.
//!
//! Notifications that are not tied to a position (window resizes, sessions changing, containers
//! opening) are broadcast through an [`EventBus`].
//!
//! ## Layout
//! Layout runs in two phases when something marked the tree as needing it: preferred sizes are
//! measured bottom-up, then each view positions its subviews top-down. See [`layout`].
//!
//! ## Coordinate System
//! The origin of the top-level coordinate system is at the top left corner of the window's content
//! area. The y-axis is oriented such that positive y points down. Z-order sorts siblings back to
//! front.

pub mod backend;
pub mod color;
pub mod config;
mod context;
mod desktop;
pub mod events;
pub mod fps;
pub mod layout;
pub mod panels;
mod patch;
mod rect;
mod router;
pub mod session;
mod tree;
#[macro_use]
mod view;

pub use backend::{DrawSurface, FontMetrics};
pub use config::{ConfigError, DesktopConfig, Skin};
pub use context::Context;
pub use desktop::{ActiveSessionChanged, Desktop, Panels};
pub use events::{EventBus, EventOutcome, Key, KeyCode, MouseState, WindowResized};
pub use patch::{Patch, TreeError};
pub use rect::Rect;
pub use session::{ClientSession, Session, SessionId};
pub use tree::ViewTree;
pub use view::{Drawable, EventTarget, Layoutable, View, ViewContext, ViewId};
