//! The X11 platform façade: the one
//! place that knows how to talk to the display. Every other component
//! (window-object model, key grabber, action handler, event loop) speaks
//! through [`XConn`] rather than touching a connection directly, which is
//! what keeps the core testable against [`mock::MockXConn`].
use crate::{
    bindings::{keys::KeyPress, mouse::MouseState},
    pure::geometry::{Gravity, Point, Rect},
    x::{atom::Atom, event::ClientMessage, property::WmState},
    Result, Xid,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod atom;
pub mod event;
pub mod property;
pub mod query;

#[cfg(feature = "x11rb")]
pub mod x11rb_impl;

#[cfg(feature = "x11rb")]
pub use x11rb_impl::X11rbConn;

pub mod mock;

pub use mock::MockXConn;

pub use atom::Atom as AtomKind;
pub use event::XEvent;
pub use property::{Prop, WindowAttributes};
pub use query::Query;

/// A window type to specify when creating a window that isn't a managed
/// client: the check window used to claim `WM_Sn`, input-only windows for
/// screen edges, or an overlay carrying a `_NET_WM_WINDOW_TYPE` atom.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WinType {
    /// Hidden 1x1 stub window, used for `_NET_SUPPORTING_WM_CHECK` and to
    /// claim the window-manager selection.
    CheckWin,
    /// Receives input only, used for screen-edge strips.
    InputOnly,
    /// A regular overlay window (status dialog, tab-strip hint) carrying
    /// the given `_NET_WM_WINDOW_TYPE` atom.
    InputOutput(Atom),
}

/// On-screen configuration for a managed window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ClientConfig {
    /// Border width in pixels.
    BorderPx(u32),
    /// Absolute size and position in root-window coordinates.
    Position(Rect),
    /// Restack below the given window.
    StackBelow(Xid),
    /// Restack directly above the given window.
    StackAbove(Xid),
    /// Restack above every sibling.
    StackTop,
    /// Restack below every sibling.
    StackBottom,
}

/// Attributes set on a managed window outside of its geometry.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClientAttr {
    /// Border color as an argb hex value, used by decor variants with no
    /// themed border pixmap.
    BorderColor(u32),
    /// The event mask a managed client window should have selected while
    /// visible.
    ClientEventMask,
    /// The reduced event mask used while a client is being unmapped by the
    /// window manager itself, so the resulting `UnmapNotify` is not
    /// mistaken for the client withdrawing itself.
    ClientUnmapMask,
    /// The event mask the root window selects.
    RootEventMask,
}

/// Cursor shape to display while a grab is held. Resize cursors are named
/// by the corner or edge they represent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Cursor {
    Default,
    Move,
    Resize(Gravity),
}

/// Which optional X11 extensions are available, probed once at startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExtensionSupport {
    /// SHAPE: irregular client outlines are propagated to the frame.
    pub shape: bool,
    /// RANDR: screen geometry change notifications.
    pub randr: bool,
    /// XINERAMA: multi-head geometry without RANDR.
    pub xinerama: bool,
}

/// A handle on a running X11 connection used to issue every request the
/// core needs. Implementers may back this with `x11rb`, a different
/// binding, or (for tests) an in-memory double — the core only ever sees
/// this trait.
pub trait XConn {
    /// The ID of the window manager's root window.
    fn root(&self) -> Xid;
    /// Geometry of each physical head (RANDR/XINERAMA output), in root
    /// coordinates. A single-head setup returns one entry spanning the
    /// whole screen.
    fn heads(&self) -> Result<Vec<Rect>>;
    /// Which optional extensions this connection found at startup.
    fn extensions(&self) -> ExtensionSupport;
    /// Current pointer position in root coordinates.
    fn cursor_position(&self) -> Result<Point>;
    /// Warp the pointer to a position relative to the given window's
    /// origin. Callers should go through `XConnExt::warp_pointer_to_*`
    /// rather than call this directly.
    fn warp_pointer(&self, id: Xid, x: i32, y: i32) -> Result<()>;

    /// Look up the [Xid] of an atom by name, interning it if necessary.
    fn intern_atom(&self, name: &str) -> Result<Xid>;
    /// Look up the string name of an atom by its [Xid].
    fn atom_name(&self, xid: Xid) -> Result<String>;

    /// Grab a key combination on `grab_window`, including every lock-
    /// modifier equivalent.
    fn grab_key(&self, key: KeyPress, grab_window: Xid) -> Result<()>;
    /// Release a previously grabbed key combination.
    fn ungrab_key(&self, key: KeyPress, grab_window: Xid) -> Result<()>;
    /// Grab a mouse button combination on `grab_window`.
    fn grab_button(&self, state: MouseState, grab_window: Xid) -> Result<()>;
    /// Release a previously grabbed mouse button combination.
    fn ungrab_button(&self, state: MouseState, grab_window: Xid) -> Result<()>;
    /// Actively (synchronously) grab the pointer for the duration of a
    /// modal handler, displaying the given cursor.
    fn grab_pointer(&self, cursor: Cursor) -> Result<()>;
    /// Release an active pointer grab.
    fn ungrab_pointer(&self) -> Result<()>;
    /// Grab the keyboard for the duration of a keyboard move/resize or
    /// input-dialog session.
    fn grab_keyboard(&self) -> Result<()>;
    /// Release a keyboard grab.
    fn ungrab_keyboard(&self) -> Result<()>;
    /// Grab the server. Must
    /// always be paired with `ungrab_server`, including on error paths.
    fn grab_server(&self) -> Result<()>;
    /// Release a server grab.
    fn ungrab_server(&self) -> Result<()>;

    /// Block until the next X11 event and return it.
    fn next_event(&self) -> Result<XEvent>;
    /// Return the next X11 event without blocking, if one is already
    /// queued or immediately available.
    fn poll_event(&self) -> Result<Option<XEvent>>;
    /// Flush pending requests to the server.
    fn flush(&self);
    /// The connection's underlying file descriptor, used by the event
    /// loop's `select` against the timeout queue.
    fn connection_fd(&self) -> i32;

    /// Create a window not backing a managed client (status overlay,
    /// screen-edge strip, check window).
    fn create_window(&self, r: Rect, win_type: WinType) -> Result<Xid>;
    /// Destroy a window created with `create_window`.
    fn destroy_window(&self, id: Xid) -> Result<()>;
    /// Reparent `id` to become a child of `parent` at the given offset,
    /// used when a client is first wrapped in its frame.
    fn reparent(&self, id: Xid, parent: Xid, offset: Point) -> Result<()>;

    /// Look up the current geometry of a window.
    fn client_geometry(&self, id: Xid) -> Result<Rect>;
    /// Apply one or more [`ClientConfig`] changes to a window.
    fn configure_window(&self, id: Xid, data: &[ClientConfig]) -> Result<()>;
    /// List every top-level window the server currently knows about, used
    /// during the startup scan.
    fn existing_top_level_windows(&self) -> Result<Vec<Xid>>;

    /// Map a window, making it visible.
    fn map(&self, id: Xid) -> Result<()>;
    /// Unmap a window, hiding it.
    fn unmap(&self, id: Xid) -> Result<()>;
    /// Forcibly close a window (`XKillClient`), used when a client does
    /// not answer `WM_DELETE_WINDOW`.
    fn kill(&self, id: Xid) -> Result<()>;
    /// Set X input focus to the given window.
    fn focus(&self, id: Xid) -> Result<()>;

    /// Fetch a named property.
    fn get_prop(&self, id: Xid, prop_name: &str) -> Result<Option<Prop>>;
    /// List the names of every property currently set on a window.
    fn list_props(&self, id: Xid) -> Result<Vec<String>>;
    /// Fetch the ICCCM `WM_STATE` of a window.
    fn get_wm_state(&self, id: Xid) -> Result<Option<WmState>>;
    /// Fetch a window's attributes (override-redirect, map state, class).
    fn get_window_attributes(&self, id: Xid) -> Result<WindowAttributes>;

    /// Set the ICCCM `WM_STATE` of a window.
    fn set_wm_state(&self, id: Xid, wm_state: WmState) -> Result<()>;
    /// Set a named property.
    fn set_prop(&self, id: Xid, name: &str, val: Prop) -> Result<()>;
    /// Delete a named property.
    fn delete_prop(&self, id: Xid, prop_name: &str) -> Result<()>;
    /// Set one or more [`ClientAttr`] on a window.
    fn set_client_attributes(&self, id: Xid, attrs: &[ClientAttr]) -> Result<()>;
    /// Send a client message.
    fn send_client_message(&self, msg: ClientMessage) -> Result<()>;
}

/// Small convenience helpers layered over [`XConn`] that need no access to
/// window-manager state: everything that does (managing a client,
/// restacking a workspace, applying autoproperties) lives in `state.rs` /
/// `dispatch.rs` instead, which keeps this façade a thin wrapper.
pub trait XConnExt: XConn + Sized {
    /// Warp the pointer to the center of the given window.
    fn warp_pointer_to_window(&self, id: Xid) -> Result<()> {
        let r = self.client_geometry(id)?;
        self.warp_pointer(id, r.w as i32 / 2, r.h as i32 / 2)
    }

    /// Warp the pointer to the center of the given rectangle on the root
    /// window, used when warping to a head that currently has no focused
    /// frame.
    fn warp_pointer_to_head(&self, r: Rect) -> Result<()> {
        let root = self.root();
        self.warp_pointer(root, r.x + r.w as i32 / 2, r.y + r.h as i32 / 2)
    }

    /// A window's title following ICCCM (`WM_NAME`) falling back to EWMH
    /// (`_NET_WM_NAME`), or the empty string if neither is set.
    fn window_title(&self, id: Xid) -> Result<String> {
        match query::str_prop(Atom::WmName, id, self) {
            Ok(Some(mut strs)) if !strs.is_empty() => Ok(strs.remove(0)),
            _ => match query::str_prop(Atom::NetWmName, id, self)? {
                Some(mut strs) if !strs.is_empty() => Ok(strs.remove(0)),
                _ => Ok(String::new()),
            },
        }
    }

    /// Whether a window advertises support for the given `WM_PROTOCOLS`
    /// atom (e.g. `WM_DELETE_WINDOW`).
    fn client_supports_protocol(&self, id: Xid, proto: &str) -> Result<bool> {
        if let Some(Prop::Atom(protocols)) = self.get_prop(id, Atom::WmProtocols.as_ref())? {
            Ok(protocols.iter().any(|p| p == proto))
        } else {
            Ok(false)
        }
    }

    /// A window's PID via `_NET_WM_PID`, if the application set it.
    fn window_pid(&self, id: Xid) -> Option<u32> {
        match self.get_prop(id, Atom::NetWmPid.as_ref()) {
            Ok(Some(Prop::Cardinal(pid))) => Some(pid),
            _ => None,
        }
    }

    /// Run the given [`Query`] against a window.
    fn query(&self, query: &dyn Query<Self>, id: Xid) -> Result<bool> {
        query.run(id, self)
    }

    /// Run the given [`Query`], falling back to `default` if the
    /// underlying X11 requests fail.
    fn query_or(&self, default: bool, query: &dyn Query<Self>, id: Xid) -> bool {
        query.run(id, self).unwrap_or(default)
    }
}

impl<T> XConnExt for T where T: XConn {}
