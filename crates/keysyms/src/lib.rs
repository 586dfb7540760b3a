//! Keysym name table for use with the pekwm-core key grabber.
//!
//! A config-level key binding such as `Ctrl+Shift+Return` needs to become a
//! `(modifier mask, keycode)` pair before it can be grabbed on the X
//! display. The first half of that translation is turning `"Return"` into
//! the X keysym `XK_Return`, which is a pure, display-independent lookup:
//! that lookup is what this crate provides. Turning a keysym into a keycode
//! for the *currently connected* display is a platform-façade concern and
//! lives in `pekwm_core::x`.
use std::str::FromStr;
use strum::{AsRefStr, EnumIter, EnumString};

/// A subset of the X11 keysym table (`X11/keysymdef.h`) covering the keys
/// that appear in stock pekwm bindings: letters, digits, the common
/// function and navigation keys, and the modifier keys themselves.
#[allow(non_camel_case_types)]
#[derive(AsRefStr, EnumString, EnumIter, Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum XKeySym {
    /// XK_BackSpace
    #[strum(serialize = "BackSpace")]
    XK_BackSpace,
    /// XK_Tab
    #[strum(serialize = "Tab")]
    XK_Tab,
    /// XK_Return
    #[strum(serialize = "Return")]
    XK_Return,
    /// XK_Escape
    #[strum(serialize = "Escape")]
    XK_Escape,
    /// XK_Delete
    #[strum(serialize = "Delete")]
    XK_Delete,
    /// XK_Home
    #[strum(serialize = "Home")]
    XK_Home,
    /// XK_End
    #[strum(serialize = "End")]
    XK_End,
    /// XK_Left
    #[strum(serialize = "Left")]
    XK_Left,
    /// XK_Up
    #[strum(serialize = "Up")]
    XK_Up,
    /// XK_Right
    #[strum(serialize = "Right")]
    XK_Right,
    /// XK_Down
    #[strum(serialize = "Down")]
    XK_Down,
    /// XK_Prior (Page_Up)
    #[strum(serialize = "Prior", serialize = "Page_Up")]
    XK_Prior,
    /// XK_Next (Page_Down)
    #[strum(serialize = "Next", serialize = "Page_Down")]
    XK_Next,
    /// XK_space
    #[strum(serialize = "space")]
    XK_space,
    /// XK_F1
    XK_F1,
    /// XK_F2
    XK_F2,
    /// XK_F3
    XK_F3,
    /// XK_F4
    XK_F4,
    /// XK_F5
    XK_F5,
    /// XK_F6
    XK_F6,
    /// XK_F7
    XK_F7,
    /// XK_F8
    XK_F8,
    /// XK_F9
    XK_F9,
    /// XK_F10
    XK_F10,
    /// XK_F11
    XK_F11,
    /// XK_F12
    XK_F12,
    /// XK_0
    #[strum(serialize = "0")]
    XK_0,
    /// XK_1
    #[strum(serialize = "1")]
    XK_1,
    /// XK_2
    #[strum(serialize = "2")]
    XK_2,
    /// XK_3
    #[strum(serialize = "3")]
    XK_3,
    /// XK_4
    #[strum(serialize = "4")]
    XK_4,
    /// XK_5
    #[strum(serialize = "5")]
    XK_5,
    /// XK_6
    #[strum(serialize = "6")]
    XK_6,
    /// XK_7
    #[strum(serialize = "7")]
    XK_7,
    /// XK_8
    #[strum(serialize = "8")]
    XK_8,
    /// XK_9
    #[strum(serialize = "9")]
    XK_9,
    /// XK_a
    #[strum(serialize = "a")]
    XK_a,
    /// XK_b
    #[strum(serialize = "b")]
    XK_b,
    /// XK_c
    #[strum(serialize = "c")]
    XK_c,
    /// XK_d
    #[strum(serialize = "d")]
    XK_d,
    /// XK_e
    #[strum(serialize = "e")]
    XK_e,
    /// XK_f
    #[strum(serialize = "f")]
    XK_f,
    /// XK_g
    #[strum(serialize = "g")]
    XK_g,
    /// XK_h
    #[strum(serialize = "h")]
    XK_h,
    /// XK_i
    #[strum(serialize = "i")]
    XK_i,
    /// XK_j
    #[strum(serialize = "j")]
    XK_j,
    /// XK_k
    #[strum(serialize = "k")]
    XK_k,
    /// XK_l
    #[strum(serialize = "l")]
    XK_l,
    /// XK_m
    #[strum(serialize = "m")]
    XK_m,
    /// XK_n
    #[strum(serialize = "n")]
    XK_n,
    /// XK_o
    #[strum(serialize = "o")]
    XK_o,
    /// XK_p
    #[strum(serialize = "p")]
    XK_p,
    /// XK_q
    #[strum(serialize = "q")]
    XK_q,
    /// XK_r
    #[strum(serialize = "r")]
    XK_r,
    /// XK_s
    #[strum(serialize = "s")]
    XK_s,
    /// XK_t
    #[strum(serialize = "t")]
    XK_t,
    /// XK_u
    #[strum(serialize = "u")]
    XK_u,
    /// XK_v
    #[strum(serialize = "v")]
    XK_v,
    /// XK_w
    #[strum(serialize = "w")]
    XK_w,
    /// XK_x
    #[strum(serialize = "x")]
    XK_x,
    /// XK_y
    #[strum(serialize = "y")]
    XK_y,
    /// XK_z
    #[strum(serialize = "z")]
    XK_z,
}

impl XKeySym {
    /// Look up a keysym by its `keysymdef.h` name (e.g. `"Return"`, `"a"`,
    /// `"F2"`). Returns `None` for names outside this table's coverage.
    pub fn from_name(name: &str) -> Option<Self> {
        XKeySym::from_str(name).ok()
    }

    /// The canonical name for this keysym, as it would appear in a config
    /// file binding.
    pub fn name(&self) -> &str {
        self.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn round_trips_every_name() {
        for sym in XKeySym::iter() {
            let name = sym.name();
            assert_eq!(XKeySym::from_name(name), Some(sym));
        }
    }

    #[test]
    fn accepts_page_up_alias_for_prior() {
        assert_eq!(XKeySym::from_name("Page_Up"), Some(XKeySym::XK_Prior));
    }

    #[test]
    fn rejects_unknown_name() {
        assert_eq!(XKeySym::from_name("NotAKey"), None);
    }
}
