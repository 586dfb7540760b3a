//! The window-object hierarchy: a single arena holding every on-screen
//! object the core tracks (root, clients, frames, menus, dialogs,
//! dockapps) behind one generation-counted handle type. Dispatch across
//! the different kinds goes through the [`WindowObject`] tagged enum and
//! the [`Wo`] trait rather than a chain of trait objects, so that code
//! that only cares about "is this thing mapped/focusable/in which
//! layer" never needs to know which concrete kind it is looking at.
pub mod base;
pub mod registry;

use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{client::Client, frame::Frame, harbour::Dockapp, root::Root};

/// A handle into the window-object [`registry::Registry`]. Stale handles
/// (pointing at a slot that has since been reused) are detected by the
/// generation counter rather than silently resolving to the wrong object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WoId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl std::fmt::Display for WoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "wo#{}.{}", self.index, self.generation)
    }
}

/// Stacking layer band. Ordered bottom to top; `derive(Ord)` gives the
/// comparison the stacking rule needs directly.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Desktop,
    Below,
    Normal,
    OnTop,
    Docked,
    Menu,
    AboveDock,
    Critical,
}

impl Default for Layer {
    fn default() -> Self {
        Layer::Normal
    }
}

bitflags! {
    /// Flags that exempt a window-object from certain ambient behaviour:
    /// pager/taskbar listing, focus-toggle cycling, and so on.
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[derive(Default)]
    pub struct SkipFlags: u32 {
        /// Not moved to the front of the MRU list on focus.
        const SKIP_FOCUS_TOGGLE = 1 << 0;
        /// Excluded from `_NET_CLIENT_LIST` pager-style consumers.
        const SKIP_PAGER        = 1 << 1;
        /// Excluded from taskbar-style consumers.
        const SKIP_TASKBAR      = 1 << 2;
        /// Never offered focus by the focus model.
        const SKIP_FOCUS        = 1 << 3;
    }
}

/// Which concrete kind a [`WindowObject`] is. Useful for filtering a
/// registry scan without matching the full enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WoType {
    Root,
    Client,
    Frame,
    Menu,
    Dialog,
    Dockapp,
}

/// Common surface every window-object kind exposes to the event loop,
/// focus model and stacker, regardless of its concrete type.
pub trait Wo {
    fn wo_id(&self) -> WoId;
    fn wo_type(&self) -> WoType;
    fn mapped(&self) -> bool;
    fn focusable(&self) -> bool;
    fn skip(&self) -> SkipFlags;
    fn layer(&self) -> Layer;
    fn workspace(&self) -> Option<usize>;
}

/// The tagged union stored in every arena slot. Adding a new window-object
/// kind means adding a variant here and a handful of match arms, never a
/// new trait-object vtable.
#[derive(Debug, Clone)]
pub enum WindowObject {
    Root(Root),
    Client(Client),
    Frame(Frame),
    Menu(crate::dialogs::Menu),
    Dialog(crate::dialogs::Dialog),
    Dockapp(Dockapp),
}

impl WindowObject {
    pub fn as_client(&self) -> Option<&Client> {
        match self {
            WindowObject::Client(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_client_mut(&mut self) -> Option<&mut Client> {
        match self {
            WindowObject::Client(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_frame(&self) -> Option<&Frame> {
        match self {
            WindowObject::Frame(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_frame_mut(&mut self) -> Option<&mut Frame> {
        match self {
            WindowObject::Frame(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_root(&self) -> Option<&Root> {
        match self {
            WindowObject::Root(r) => Some(r),
            _ => None,
        }
    }
}

impl Wo for WindowObject {
    fn wo_id(&self) -> WoId {
        match self {
            WindowObject::Root(w) => w.wo_id(),
            WindowObject::Client(w) => w.wo_id(),
            WindowObject::Frame(w) => w.wo_id(),
            WindowObject::Menu(w) => w.wo_id(),
            WindowObject::Dialog(w) => w.wo_id(),
            WindowObject::Dockapp(w) => w.wo_id(),
        }
    }

    fn wo_type(&self) -> WoType {
        match self {
            WindowObject::Root(_) => WoType::Root,
            WindowObject::Client(_) => WoType::Client,
            WindowObject::Frame(_) => WoType::Frame,
            WindowObject::Menu(_) => WoType::Menu,
            WindowObject::Dialog(_) => WoType::Dialog,
            WindowObject::Dockapp(_) => WoType::Dockapp,
        }
    }

    fn mapped(&self) -> bool {
        match self {
            WindowObject::Root(w) => w.mapped(),
            WindowObject::Client(w) => w.mapped(),
            WindowObject::Frame(w) => w.mapped(),
            WindowObject::Menu(w) => w.mapped(),
            WindowObject::Dialog(w) => w.mapped(),
            WindowObject::Dockapp(w) => w.mapped(),
        }
    }

    fn focusable(&self) -> bool {
        match self {
            WindowObject::Root(w) => w.focusable(),
            WindowObject::Client(w) => w.focusable(),
            WindowObject::Frame(w) => w.focusable(),
            WindowObject::Menu(w) => w.focusable(),
            WindowObject::Dialog(w) => w.focusable(),
            WindowObject::Dockapp(w) => w.focusable(),
        }
    }

    fn skip(&self) -> SkipFlags {
        match self {
            WindowObject::Root(w) => w.skip(),
            WindowObject::Client(w) => w.skip(),
            WindowObject::Frame(w) => w.skip(),
            WindowObject::Menu(w) => w.skip(),
            WindowObject::Dialog(w) => w.skip(),
            WindowObject::Dockapp(w) => w.skip(),
        }
    }

    fn layer(&self) -> Layer {
        match self {
            WindowObject::Root(w) => w.layer(),
            WindowObject::Client(w) => w.layer(),
            WindowObject::Frame(w) => w.layer(),
            WindowObject::Menu(w) => w.layer(),
            WindowObject::Dialog(w) => w.layer(),
            WindowObject::Dockapp(w) => w.layer(),
        }
    }

    fn workspace(&self) -> Option<usize> {
        match self {
            WindowObject::Root(w) => w.workspace(),
            WindowObject::Client(w) => w.workspace(),
            WindowObject::Frame(w) => w.workspace(),
            WindowObject::Menu(w) => w.workspace(),
            WindowObject::Dialog(w) => w.workspace(),
            WindowObject::Dockapp(w) => w.workspace(),
        }
    }
}
