//! Data types for working with X window properties: ICCCM `WM_HINTS` /
//! `WM_NORMAL_HINTS`, window attributes, and the generic property value
//! returned by [`super::XConn::get_prop`].
use bitflags::bitflags;

use crate::{client::WmHints as ClientWmHints, pure::geometry::SizeHints, Point, Xid};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Known property value shapes an [`super::XConn`] impl may hand back from
/// `get_prop`. Values that don't fit one of these forms are left for the
/// caller to interpret from `Bytes`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Prop {
    /// One or more interned atom names
    Atom(Vec<String>),
    /// Raw 32-bit values for non-standard property types
    Bytes(Vec<u32>),
    /// A single cardinal number
    Cardinal(u32),
    /// UTF-8 encoded string data
    UTF8String(Vec<String>),
    /// One or more X window IDs
    Window(Vec<Xid>),
    /// `WM_HINTS`
    WmHints(WmHints),
    /// `WM_NORMAL_HINTS`
    WmNormalHints(SizeHints),
}

bitflags! {
    /// Flags set in a raw `WM_HINTS` property indicating which fields are
    /// populated.
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[derive(Default)]
    pub struct WmHintsFlags: u32 {
        const INPUT_HINT         = 0b0000000001;
        const STATE_HINT         = 0b0000000010;
        const ICON_PIXMAP_HINT   = 0b0000000100;
        const ICON_WINDOW_HINT   = 0b0000001000;
        const ICON_POSITION_HINT = 0b0000010000;
        const ICON_MASK_HINT     = 0b0000100000;
        const WINDOW_GROUP_HINT  = 0b0001000000;
        const URGENCY_HINT       = 0b0100000000;
    }
}

/// `WM_STATE` as used by ICCCM section 4.1.3.1: the state a client should be
/// treated as being in, independent of whether its window is currently
/// mapped.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum WmState {
    Withdrawn,
    Normal,
    Iconic,
}

/// The mapping state the X server reports for a window.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum MapState {
    Unmapped,
    UnViewable,
    Viewable,
}

/// The input class of a window.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum WindowClass {
    CopyFromParent,
    InputOutput,
    InputOnly,
}

/// Raw `WM_HINTS` client hints, parsed into the shape the client-management
/// code wants.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct WmHints {
    pub flags: WmHintsFlags,
    pub accepts_input: bool,
    pub initial_state: WmState,
    pub icon_pixmap: u32,
    pub icon_win: Xid,
    pub icon_position: Point,
    pub icon_mask: u32,
    pub window_group: u32,
}

impl WmHints {
    /// Parse a raw `XWMHints` payload: 9 `u32`s in the C struct layout
    /// (`flags, input, initial_state, icon_pixmap, icon_window, icon_x,
    /// icon_y, icon_mask, window_group`).
    pub fn try_from_bytes(raw: &[u32]) -> crate::Result<Self> {
        if raw.len() != 9 {
            return Err(crate::Error::InvalidProperty(format!(
                "WM_HINTS expects 9 u32s, got {}",
                raw.len()
            )));
        }

        let flags = WmHintsFlags::from_bits_truncate(raw[0]);
        let accepts_input = !flags.contains(WmHintsFlags::INPUT_HINT) || raw[1] > 0;
        let initial_state = match (flags.contains(WmHintsFlags::STATE_HINT), raw[2]) {
            (true, 0) => WmState::Withdrawn,
            (true, 1) | (false, _) => WmState::Normal,
            (true, 2) => WmState::Iconic,
            _ => {
                return Err(crate::Error::InvalidProperty(format!(
                    "WM_HINTS initial_state must be 0, 1 or 2, got {}",
                    raw[2]
                )))
            }
        };

        Ok(Self {
            flags,
            accepts_input,
            initial_state,
            icon_pixmap: raw[3],
            icon_win: Xid(raw[4]),
            icon_position: Point::new(raw[5], raw[6]),
            icon_mask: raw[7],
            window_group: raw[8],
        })
    }

    /// Reduce to the subset [`crate::client::Client`] keeps on its base
    /// record.
    pub fn to_client_hints(&self) -> ClientWmHints {
        ClientWmHints {
            initial_iconic: self.initial_state == WmState::Iconic,
            input: self.accepts_input,
            group_leader: (self.window_group != 0).then_some(Xid(self.window_group)),
        }
    }
}

/// Window attributes pekwm honours: whether the window opted out of window
/// manager control (`override_redirect`), its current mapping state, and
/// whether it can receive input at all.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct WindowAttributes {
    pub override_redirect: bool,
    pub map_state: MapState,
    pub window_class: WindowClass,
}

impl WindowAttributes {
    pub fn new(override_redirect: bool, map_state: MapState, window_class: WindowClass) -> Self {
        Self {
            override_redirect,
            map_state,
            window_class,
        }
    }

    /// `override_redirect` windows (tooltips, popup menus from other
    /// toolkits) are never reparented or decorated.
    pub fn should_manage(&self) -> bool {
        !self.override_redirect && self.window_class != WindowClass::InputOnly
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wm_hints_parses_urgency_and_group() {
        let raw = [
            WmHintsFlags::URGENCY_HINT.bits() | WmHintsFlags::WINDOW_GROUP_HINT.bits(),
            0,
            0,
            0,
            0,
            0,
            0,
            0,
            42,
        ];
        let hints = WmHints::try_from_bytes(&raw).unwrap();
        assert_eq!(hints.window_group, 42);
        assert!(hints.flags.contains(WmHintsFlags::URGENCY_HINT));
    }

    #[test]
    fn wm_hints_rejects_the_wrong_length() {
        assert!(WmHints::try_from_bytes(&[0; 3]).is_err());
    }

    #[test]
    fn should_manage_rejects_override_redirect() {
        let attrs = WindowAttributes::new(true, MapState::Viewable, WindowClass::InputOutput);
        assert!(!attrs.should_manage());
    }
}
