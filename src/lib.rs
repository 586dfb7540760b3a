//! Core data structures and event-dispatch loop for an X11 window manager.
//!
//! This crate owns the window-object hierarchy (root, clients, decorated
//! frames, menus and dialogs), workspace stacking, key/mouse bindings, the
//! action handler and the EWMH/ICCCM protocol surface. It does not parse
//! configuration files, load themes, or run the harbour/dialog/status-window
//! helper processes: those are collaborators that speak to this crate
//! through the traits in [`theme`], [`harbour`] and [`dialogs`].
#[macro_use]
mod macros;

pub mod action;
pub mod autoprops;
pub mod bindings;
pub mod client;
pub mod config;
pub mod dialogs;
pub mod dispatch;
pub mod error;
pub mod event_loop;
pub mod ewmh;
pub mod frame;
pub mod handlers;
pub mod harbour;
pub mod manage;
pub mod pure;
pub mod root;
pub mod signal;
pub mod state;
pub mod theme;
pub mod util;
pub mod wo;
pub mod x;

pub use error::{Error, Result};
pub use pure::geometry::{Point, Rect, Strut};
pub use wo::WoId;

/// An X11 resource ID. Newtype to keep window/atom/cursor IDs from being
/// mixed up with plain integers at call sites.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Xid(pub u32);

impl std::fmt::Display for Xid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl std::ops::Deref for Xid {
    type Target = u32;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<u32> for Xid {
    fn from(id: u32) -> Self {
        Self(id)
    }
}
