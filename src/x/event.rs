//! Data types for X11 events as seen by the event loop.
use std::convert::TryFrom;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    bindings::{keys::KeyPress, mouse::MouseState},
    pure::geometry::{Point, Rect},
    x::Atom,
    Xid,
};

/// Wrapper around the X11 event types the event loop classifies and
/// dispatches.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum XEvent {
    /// A message was sent to one of our windows.
    ClientMessage(ClientMessage),
    /// A window's configuration changed (we did not request it).
    ConfigureNotify(ConfigureEvent),
    /// A window is requesting to be repositioned or resized.
    ConfigureRequest(ConfigureEvent),
    /// The pointer entered a window.
    Enter(PointerChange),
    /// A part of a window became visible and needs repainting.
    Expose(ExposeEvent),
    /// A window gained input focus.
    FocusIn(Xid),
    /// A window lost input focus.
    FocusOut(Xid),
    /// A window was destroyed.
    Destroy(Xid),
    /// A bound key combination was pressed.
    KeyPress(KeyPress),
    /// The pointer left a window.
    Leave(PointerChange),
    /// The keyboard mapping changed; bindings need re-grabbing.
    MappingNotify,
    /// A window wants to be mapped and rendered.
    MapRequest(Xid),
    /// A mouse button was pressed.
    ButtonPress(ButtonEvent),
    /// A mouse button was released.
    ButtonRelease(ButtonEvent),
    /// The pointer moved while a button or modal handler grab is active.
    MotionNotify(PointerChange),
    /// A property on a window changed.
    PropertyNotify(PropertyEvent),
    /// RANDR reported an output/resolution change.
    RandrNotify,
    /// A window was unmapped.
    UnmapNotify(Xid),
}

impl std::fmt::Display for XEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use XEvent::*;

        match self {
            ClientMessage(_) => write!(f, "ClientMessage"),
            ConfigureNotify(_) => write!(f, "ConfigureNotify"),
            ConfigureRequest(_) => write!(f, "ConfigureRequest"),
            Enter(_) => write!(f, "Enter"),
            Expose(_) => write!(f, "Expose"),
            FocusIn(_) => write!(f, "FocusIn"),
            FocusOut(_) => write!(f, "FocusOut"),
            Destroy(_) => write!(f, "Destroy"),
            KeyPress(_) => write!(f, "KeyPress"),
            Leave(_) => write!(f, "Leave"),
            MappingNotify => write!(f, "MappingNotify"),
            MapRequest(_) => write!(f, "MapRequest"),
            ButtonPress(_) => write!(f, "ButtonPress"),
            ButtonRelease(_) => write!(f, "ButtonRelease"),
            MotionNotify(_) => write!(f, "MotionNotify"),
            PropertyNotify(_) => write!(f, "PropertyNotify"),
            RandrNotify => write!(f, "RandrNotify"),
            UnmapNotify(_) => write!(f, "UnmapNotify"),
        }
    }
}

/// A mouse button press or release, carrying the window it landed on and
/// where, so the mouse-binding table can be consulted by context.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ButtonEvent {
    pub id: Xid,
    pub state: MouseState,
    pub abs: Point,
    pub relative: Point,
}

/// Known `WM_PROTOCOLS` / session client messages this core sends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClientMessageKind {
    /// Ask a client to close itself via `WM_DELETE_WINDOW`.
    DeleteWindow(Xid),
    /// Ask a client to take input focus via `WM_TAKE_FOCUS`.
    TakeFocus(Xid),
}

impl ClientMessageKind {
    /// Build the default wire format for this message kind. Both of the
    /// variants above are `WM_PROTOCOLS` messages differing only in which
    /// atom they carry (ICCCM section 4.2.8).
    pub fn as_message<X>(&self, x: &X) -> crate::Result<ClientMessage>
    where
        X: super::XConn,
    {
        let proto_msg = |id: Xid, atom: Atom| {
            let proto = Atom::WmProtocols.as_ref();
            let data = [*x.intern_atom(atom.as_ref())?, 0, 0, 0, 0];
            Ok(ClientMessage::new(id, ClientEventMask::NoEventMask, proto, data.into()))
        };

        match self {
            ClientMessageKind::DeleteWindow(id) => proto_msg(*id, Atom::WmDeleteWindow),
            ClientMessageKind::TakeFocus(id) => proto_msg(*id, Atom::WmTakeFocus),
        }
    }
}

/// Event masks used when sending a client message.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClientEventMask {
    SubstructureNotify,
    StructureNotify,
    NoEventMask,
}

/// The raw 20-byte payload of a client message, preserved in three
/// equivalent widths as the X11 wire format allows. This shape underlies
/// both `WM_PROTOCOLS` messages and the `_PEKWM_CMD` reassembly protocol,
/// where the last byte of a `U8` message carries the continuation
/// marker.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClientMessageData {
    U8([u8; 20]),
    U16([u16; 10]),
    U32([u32; 5]),
}

macro_rules! cast_slice {
    ($s:expr, $t:ty) => {
        $s.iter().map(|&v| v as $t).collect::<Vec<$t>>()
    };
}

impl ClientMessageData {
    pub fn as_usize(&self) -> Vec<usize> {
        match self {
            Self::U8(data) => cast_slice!(data, usize),
            Self::U16(data) => cast_slice!(data, usize),
            Self::U32(data) => cast_slice!(data, usize),
        }
    }
}

macro_rules! __impl_client_message_data(
    { $t:ty; $count:expr, $variant:expr, $method:ident } => {
        impl ClientMessageData {
            pub fn $method(&self) -> Vec<$t> {
                match self {
                    Self::U8(data) => cast_slice!(data, $t),
                    Self::U16(data) => cast_slice!(data, $t),
                    Self::U32(data) => cast_slice!(data, $t),
                }
            }
        }
        impl From<[$t; $count]> for ClientMessageData {
            fn from(data: [$t; $count]) -> Self {
                $variant(data)
            }
        }
        impl From<&[$t; $count]> for ClientMessageData {
            fn from(data: &[$t; $count]) -> Self {
                $variant(*data)
            }
        }
        impl TryFrom<&[$t]> for ClientMessageData {
            type Error = std::array::TryFromSliceError;

            fn try_from(data: &[$t]) -> std::result::Result<Self, Self::Error> {
                Ok($variant(<[$t; $count]>::try_from(data)?))
            }
        }
    }
);

__impl_client_message_data!(u8; 20, ClientMessageData::U8, as_u8);
__impl_client_message_data!(u16; 10, ClientMessageData::U16, as_u16);
__impl_client_message_data!(u32; 5, ClientMessageData::U32, as_u32);

/// A client message addressed to one of our windows.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientMessage {
    pub id: Xid,
    pub mask: ClientEventMask,
    pub dtype: String,
    pub data: ClientMessageData,
}

impl ClientMessage {
    pub fn new(
        id: Xid,
        mask: ClientEventMask,
        dtype: impl Into<String>,
        data: ClientMessageData,
    ) -> Self {
        Self {
            id,
            mask,
            dtype: dtype.into(),
            data,
        }
    }
}

/// A configure request or notification.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigureEvent {
    pub id: Xid,
    pub r: Rect,
    pub is_root: bool,
}

/// A window became (partially) visible and needs repainting.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExposeEvent {
    pub id: Xid,
    pub r: Rect,
    /// How many further `Expose` events for the same window are already
    /// queued; callers typically only redraw when this reaches zero.
    pub count: usize,
}

/// The pointer entered, left, or moved within a window.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerChange {
    pub id: Xid,
    pub abs: Point,
    pub relative: Point,
    pub same_screen: bool,
}

/// A property on a window changed.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyEvent {
    pub id: Xid,
    pub atom: String,
    pub is_root: bool,
}
