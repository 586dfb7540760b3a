//! Production [`XConn`] backed by `x11rb`. This is the one module in the
//! crate that actually speaks the X11 wire protocol; everything above this
//! layer only ever sees the trait.
use std::cell::RefCell;
use std::collections::HashMap;
use std::os::unix::io::AsRawFd;

use strum::IntoEnumIterator;
use tracing::{trace, warn};
use x11rb::connection::Connection;
use x11rb::cookie::Cookie;
use x11rb::protocol::randr::{self, ConnectionExt as _};
use x11rb::protocol::xinerama::{self, ConnectionExt as _};
use x11rb::protocol::xproto::{
    self, AtomEnum, ChangeWindowAttributesAux, ClientMessageData as XClientMessageData,
    ClientMessageEvent, ConfigureWindowAux, ConnectionExt as _, CreateWindowAux, EventMask,
    GrabMode, InputFocus, ModMask as XModMask, PropMode, StackMode, Window, WindowClass as XWindowClass,
};
use x11rb::protocol::Event;
use x11rb::CURRENT_TIME;

use keysyms::XKeySym;

use crate::{
    bindings::{
        keys::{KeyPress, ModMask},
        mouse::{MouseButton, MouseState},
    },
    pure::geometry::{Gravity, Point, Rect, SizeHints},
    x::{
        atom::Atom,
        event::{
            ButtonEvent, ClientMessage, ClientMessageData, ConfigureEvent, ExposeEvent,
            PointerChange, PropertyEvent, XEvent,
        },
        property::{MapState, Prop, WindowAttributes, WindowClass, WmHints, WmState},
        ClientAttr, ClientConfig, Cursor as WmCursor, ExtensionSupport, WinType, XConn,
    },
    Error, Result, Xid,
};

/// Event mask selected on every managed client window so the event loop
/// sees the traffic it needs to track focus and repaint decoration.
const CLIENT_EVENT_MASK: EventMask = EventMask::from_bits_truncate(
    EventMask::ENTER_WINDOW.bits()
        | EventMask::LEAVE_WINDOW.bits()
        | EventMask::FOCUS_CHANGE.bits()
        | EventMask::PROPERTY_CHANGE.bits()
        | EventMask::STRUCTURE_NOTIFY.bits(),
);

/// Reduced mask applied while the window manager itself is unmapping a
/// client, so the resulting `UnmapNotify` cannot be mistaken for the
/// client withdrawing itself.
const CLIENT_UNMAP_MASK: EventMask = EventMask::STRUCTURE_NOTIFY;

const ROOT_EVENT_MASK: EventMask = EventMask::from_bits_truncate(
    EventMask::SUBSTRUCTURE_REDIRECT.bits()
        | EventMask::SUBSTRUCTURE_NOTIFY.bits()
        | EventMask::PROPERTY_CHANGE.bits()
        | EventMask::BUTTON_PRESS.bits()
        | EventMask::BUTTON_RELEASE.bits(),
);

/// The numeric X11 keysym for every [`XKeySym`] this crate's binding
/// vocabulary covers (`X11/keysymdef.h`). `keysyms` only carries the
/// symbolic name table; turning a name into a keycode needs the numeric
/// value to look up in the server's keyboard mapping, which is this
/// module's job, not that crate's (`keysyms::XKeySym` doc comment).
fn keysym_value(sym: XKeySym) -> u32 {
    use XKeySym::*;
    match sym {
        XK_BackSpace => 0xff08,
        XK_Tab => 0xff09,
        XK_Return => 0xff0d,
        XK_Escape => 0xff1b,
        XK_Delete => 0xffff,
        XK_Home => 0xff50,
        XK_Left => 0xff51,
        XK_Up => 0xff52,
        XK_Right => 0xff53,
        XK_Down => 0xff54,
        XK_Prior => 0xff55,
        XK_Next => 0xff56,
        XK_End => 0xff57,
        XK_space => 0x0020,
        XK_F1 => 0xffbe,
        XK_F2 => 0xffbf,
        XK_F3 => 0xffc0,
        XK_F4 => 0xffc1,
        XK_F5 => 0xffc2,
        XK_F6 => 0xffc3,
        XK_F7 => 0xffc4,
        XK_F8 => 0xffc5,
        XK_F9 => 0xffc6,
        XK_F10 => 0xffc7,
        XK_F11 => 0xffc8,
        XK_F12 => 0xffc9,
        XK_0 => 0x0030,
        XK_1 => 0x0031,
        XK_2 => 0x0032,
        XK_3 => 0x0033,
        XK_4 => 0x0034,
        XK_5 => 0x0035,
        XK_6 => 0x0036,
        XK_7 => 0x0037,
        XK_8 => 0x0038,
        XK_9 => 0x0039,
        XK_a => 0x0061,
        XK_b => 0x0062,
        XK_c => 0x0063,
        XK_d => 0x0064,
        XK_e => 0x0065,
        XK_f => 0x0066,
        XK_g => 0x0067,
        XK_h => 0x0068,
        XK_i => 0x0069,
        XK_j => 0x006a,
        XK_k => 0x006b,
        XK_l => 0x006c,
        XK_m => 0x006d,
        XK_n => 0x006e,
        XK_o => 0x006f,
        XK_p => 0x0070,
        XK_q => 0x0071,
        XK_r => 0x0072,
        XK_s => 0x0073,
        XK_t => 0x0074,
        XK_u => 0x0075,
        XK_v => 0x0076,
        XK_w => 0x0077,
        XK_x => 0x0078,
        XK_y => 0x0079,
        XK_z => 0x007a,
    }
}

/// Translate this crate's normalized [`ModMask`] into the wire-format
/// `xproto::ModMask`. The two enumerations intentionally use different bit
/// assignments (`ModMask`'s doc comment): `CONTROL` is bit 1 here but bit 2
/// on the wire, for instance.
fn to_x11_mods(m: ModMask) -> u16 {
    let mut bits = 0u16;
    if m.contains(ModMask::SHIFT) {
        bits |= u16::from(XModMask::SHIFT);
    }
    if m.contains(ModMask::LOCK) {
        bits |= u16::from(XModMask::LOCK);
    }
    if m.contains(ModMask::CONTROL) {
        bits |= u16::from(XModMask::CONTROL);
    }
    if m.contains(ModMask::MOD1) {
        bits |= u16::from(XModMask::M1);
    }
    if m.contains(ModMask::MOD2) {
        bits |= u16::from(XModMask::M2);
    }
    if m.contains(ModMask::MOD3) {
        bits |= u16::from(XModMask::M3);
    }
    if m.contains(ModMask::MOD4) {
        bits |= u16::from(XModMask::M4);
    }
    if m.contains(ModMask::MOD5) {
        bits |= u16::from(XModMask::M5);
    }
    bits
}

fn from_x11_mods(bits: u16) -> ModMask {
    let mut m = ModMask::empty();
    if bits & u16::from(XModMask::SHIFT) != 0 {
        m |= ModMask::SHIFT;
    }
    if bits & u16::from(XModMask::LOCK) != 0 {
        m |= ModMask::LOCK;
    }
    if bits & u16::from(XModMask::CONTROL) != 0 {
        m |= ModMask::CONTROL;
    }
    if bits & u16::from(XModMask::M1) != 0 {
        m |= ModMask::MOD1;
    }
    if bits & u16::from(XModMask::M2) != 0 {
        m |= ModMask::MOD2;
    }
    if bits & u16::from(XModMask::M3) != 0 {
        m |= ModMask::MOD3;
    }
    if bits & u16::from(XModMask::M4) != 0 {
        m |= ModMask::MOD4;
    }
    if bits & u16::from(XModMask::M5) != 0 {
        m |= ModMask::MOD5;
    }
    m
}

fn button_code(button: MouseButton) -> u8 {
    match button {
        MouseButton::Left => 1,
        MouseButton::Middle => 2,
        MouseButton::Right => 3,
        MouseButton::ScrollUp => 4,
        MouseButton::ScrollDown => 5,
        MouseButton::Other(n) => n,
    }
}

fn button_from_code(code: u8) -> MouseButton {
    match code {
        1 => MouseButton::Left,
        2 => MouseButton::Middle,
        3 => MouseButton::Right,
        4 => MouseButton::ScrollUp,
        5 => MouseButton::ScrollDown,
        n => MouseButton::Other(n),
    }
}

/// `XC_*` glyph indices from the standard X11 cursor font, used with
/// `CreateGlyphCursor` so a themed Xcursor lookup isn't required just to
/// show a move/resize cursor during a modal drag.
fn cursor_glyph(cursor: WmCursor) -> u16 {
    match cursor {
        WmCursor::Default => 68,  // XC_left_ptr
        WmCursor::Move => 52,     // XC_fleur
        WmCursor::Resize(g) => match g {
            Gravity::NorthWest => 134, // XC_top_left_corner
            Gravity::North => 138,     // XC_top_side
            Gravity::NorthEast => 136, // XC_top_right_corner
            Gravity::West => 70,       // XC_left_side
            Gravity::Center => 52,     // XC_fleur
            Gravity::East => 96,       // XC_right_side
            Gravity::SouthWest => 12,  // XC_bottom_left_corner
            Gravity::South => 16,      // XC_bottom_side
            Gravity::SouthEast => 14,  // XC_bottom_right_corner
            Gravity::Static => 68,     // XC_left_ptr
        },
    }
}

fn proto_err(e: impl std::fmt::Display) -> Error {
    Error::Protocol(e.to_string())
}

fn win(id: Xid) -> Window {
    id.0
}

fn xid(w: Window) -> Xid {
    Xid(w)
}

fn rect_from_geometry(x: i16, y: i16, w: u16, h: u16) -> Rect {
    Rect::new(x.max(0) as u32, y.max(0) as u32, w as u32, h as u32)
}

fn point_from_root(x: i16, y: i16) -> Point {
    Point::new(x.max(0) as u32, y.max(0) as u32)
}

/// A live connection to an X display, implementing [`XConn`] by issuing
/// real requests through `x11rb`. Generic over the connection type so
/// tests could (in principle) plug in `x11rb`'s own mock transport, though
/// [`crate::x::mock::MockXConn`] is what the rest of this crate's test
/// suite actually uses.
pub struct X11rbConn<C> {
    conn: C,
    root: Xid,
    check_win: Xid,
    screen_num: usize,
    atoms: RefCell<HashMap<String, Xid>>,
    extensions: ExtensionSupport,
    keysym_to_keycode: HashMap<XKeySym, u8>,
    cursor_font: xproto::Font,
    cursors: RefCell<HashMap<WmCursor, xproto::Cursor>>,
}

impl<C> X11rbConn<C>
where
    C: Connection,
{
    /// Connect to `display` (the `DISPLAY` environment variable's value if
    /// `None`), claim the root window's substructure redirect, and probe
    /// the optional extensions this core can use.
    pub fn new(conn: C, screen_num: usize) -> Result<Self> {
        let root = conn.setup().roots[screen_num].root;

        let atom_cookies: Vec<(Atom, Cookie<'_, C, xproto::InternAtomReply>)> = Atom::iter()
            .map(|atom| {
                let cookie = conn
                    .intern_atom(false, atom.as_ref().as_bytes())
                    .map_err(proto_err)?;
                Ok((atom, cookie))
            })
            .collect::<Result<Vec<_>>>()?;
        let atoms: HashMap<String, Xid> = atom_cookies
            .into_iter()
            .map(|(atom, cookie)| {
                let reply = cookie.reply().map_err(proto_err)?;
                Ok((atom.name().to_string(), Xid(reply.atom)))
            })
            .collect::<Result<_>>()?;

        let randr = conn
            .extension_information(randr::X11_EXTENSION_NAME)
            .map_err(proto_err)?
            .is_some();
        let xinerama_present = conn
            .extension_information(xinerama::X11_EXTENSION_NAME)
            .map_err(proto_err)?
            .is_some();
        let shape = conn
            .extension_information(x11rb::protocol::shape::X11_EXTENSION_NAME)
            .map_err(proto_err)?
            .is_some();

        if randr {
            let mask = randr::NotifyMask::OUTPUT_CHANGE
                | randr::NotifyMask::CRTC_CHANGE
                | randr::NotifyMask::SCREEN_CHANGE;
            conn.randr_select_input(root, mask).map_err(proto_err)?;
        }

        let check_win = conn.generate_id().map_err(proto_err)?;
        let aux = CreateWindowAux::new().override_redirect(1);
        conn.create_window(
            0,
            check_win,
            root,
            -1,
            -1,
            1,
            1,
            0,
            XWindowClass::INPUT_OUTPUT,
            0,
            &aux,
        )
        .map_err(proto_err)?;

        let aux = ChangeWindowAttributesAux::new().event_mask(ROOT_EVENT_MASK);
        conn.change_window_attributes(root, &aux)
            .map_err(proto_err)?;

        let setup = conn.setup();
        let min_keycode = setup.min_keycode;
        let max_keycode = setup.max_keycode;
        let mapping = conn
            .get_keyboard_mapping(min_keycode, max_keycode - min_keycode + 1)
            .map_err(proto_err)?
            .reply()
            .map_err(proto_err)?;
        let per_keycode = mapping.keysyms_per_keycode as usize;
        let mut keysym_to_keycode = HashMap::new();
        for sym in XKeySym::iter() {
            let value = keysym_value(sym);
            for (i, row) in mapping.keysyms.chunks(per_keycode.max(1)).enumerate() {
                if row.contains(&value) {
                    keysym_to_keycode.insert(sym, min_keycode + i as u8);
                    break;
                }
            }
        }

        let cursor_font = conn.generate_id().map_err(proto_err)?;
        conn.open_font(cursor_font, b"cursor").map_err(proto_err)?;

        conn.flush().map_err(proto_err)?;

        Ok(Self {
            conn,
            root: xid(root),
            check_win: xid(check_win),
            screen_num,
            atoms: RefCell::new(atoms),
            extensions: ExtensionSupport {
                shape,
                randr,
                xinerama: xinerama_present,
            },
            keysym_to_keycode,
            cursor_font,
            cursors: RefCell::new(HashMap::new()),
        })
    }

    /// The window used to claim `_NET_SUPPORTING_WM_CHECK`, not otherwise
    /// exposed through [`XConn`].
    pub fn check_window(&self) -> Xid {
        self.check_win
    }

    fn atom(&self, name: &str) -> Result<Xid> {
        if let Some(id) = self.atoms.borrow().get(name) {
            return Ok(*id);
        }
        let reply = self
            .conn
            .intern_atom(false, name.as_bytes())
            .map_err(proto_err)?
            .reply()
            .map_err(proto_err)?;
        let id = Xid(reply.atom);
        self.atoms.borrow_mut().insert(name.to_string(), id);
        Ok(id)
    }

    fn cursor_for(&self, cursor: WmCursor) -> Result<xproto::Cursor> {
        if let Some(id) = self.cursors.borrow().get(&cursor) {
            return Ok(*id);
        }
        let glyph = cursor_glyph(cursor);
        let id = self.conn.generate_id().map_err(proto_err)?;
        self.conn
            .create_glyph_cursor(
                id,
                self.cursor_font,
                self.cursor_font,
                glyph as u16,
                glyph as u16 + 1,
                0,
                0,
                0,
                0xffff,
                0xffff,
                0xffff,
            )
            .map_err(proto_err)?;
        self.cursors.borrow_mut().insert(cursor, id);
        Ok(id)
    }

    fn keycode_for(&self, sym: XKeySym) -> Option<u8> {
        self.keysym_to_keycode.get(&sym).copied()
    }

    fn translate_event(&self, event: Event) -> Option<XEvent> {
        match event {
            Event::MapRequest(ev) => Some(XEvent::MapRequest(xid(ev.window))),
            Event::DestroyNotify(ev) => Some(XEvent::Destroy(xid(ev.window))),
            Event::UnmapNotify(ev) => Some(XEvent::UnmapNotify(xid(ev.window))),
            Event::MappingNotify(_) => Some(XEvent::MappingNotify),
            Event::ConfigureRequest(ev) => Some(XEvent::ConfigureRequest(ConfigureEvent {
                id: xid(ev.window),
                r: rect_from_geometry(ev.x, ev.y, ev.width, ev.height),
                is_root: ev.window == win(self.root),
            })),
            Event::ConfigureNotify(ev) => Some(XEvent::ConfigureNotify(ConfigureEvent {
                id: xid(ev.window),
                r: rect_from_geometry(ev.x, ev.y, ev.width, ev.height),
                is_root: ev.window == win(self.root),
            })),
            Event::KeyPress(ev) => {
                let sym = self
                    .keysym_to_keycode
                    .iter()
                    .find(|&(_, &code)| code == ev.detail)
                    .map(|(&sym, _)| sym)?;
                Some(XEvent::KeyPress(KeyPress::new(
                    from_x11_mods(u16::from(ev.state)),
                    sym,
                )))
            }
            Event::ButtonPress(ev) => Some(XEvent::ButtonPress(ButtonEvent {
                id: xid(ev.event),
                state: MouseState::new(from_x11_mods(u16::from(ev.state)), button_from_code(ev.detail)),
                abs: point_from_root(ev.root_x, ev.root_y),
                relative: point_from_root(ev.event_x, ev.event_y),
            })),
            Event::ButtonRelease(ev) => Some(XEvent::ButtonRelease(ButtonEvent {
                id: xid(ev.event),
                state: MouseState::new(from_x11_mods(u16::from(ev.state)), button_from_code(ev.detail)),
                abs: point_from_root(ev.root_x, ev.root_y),
                relative: point_from_root(ev.event_x, ev.event_y),
            })),
            Event::MotionNotify(ev) => Some(XEvent::MotionNotify(PointerChange {
                id: xid(ev.event),
                abs: point_from_root(ev.root_x, ev.root_y),
                relative: point_from_root(ev.event_x, ev.event_y),
                same_screen: ev.same_screen,
            })),
            Event::EnterNotify(ev) => Some(XEvent::Enter(PointerChange {
                id: xid(ev.event),
                abs: point_from_root(ev.root_x, ev.root_y),
                relative: point_from_root(ev.event_x, ev.event_y),
                same_screen: ev.same_screen,
            })),
            Event::LeaveNotify(ev) => Some(XEvent::Leave(PointerChange {
                id: xid(ev.event),
                abs: point_from_root(ev.root_x, ev.root_y),
                relative: point_from_root(ev.event_x, ev.event_y),
                same_screen: ev.same_screen,
            })),
            Event::FocusIn(ev) => Some(XEvent::FocusIn(xid(ev.event))),
            Event::FocusOut(ev) => Some(XEvent::FocusOut(xid(ev.event))),
            Event::Expose(ev) => Some(XEvent::Expose(ExposeEvent {
                id: xid(ev.window),
                r: rect_from_geometry(ev.x as i16, ev.y as i16, ev.width, ev.height),
                count: ev.count as usize,
            })),
            Event::PropertyNotify(ev) => {
                let name = self.atom_name(xid(ev.atom)).ok()?;
                Some(XEvent::PropertyNotify(PropertyEvent {
                    id: xid(ev.window),
                    atom: name,
                    is_root: ev.window == win(self.root),
                }))
            }
            Event::ClientMessage(ev) => {
                let dtype = self.atom_name(xid(ev.type_)).ok()?;
                let data = match ev.format {
                    8 => ClientMessageData::U8(ev.data.as_data8()),
                    16 => ClientMessageData::U16(ev.data.as_data16()),
                    _ => ClientMessageData::U32(ev.data.as_data32()),
                };
                Some(XEvent::ClientMessage(ClientMessage {
                    id: xid(ev.window),
                    mask: crate::x::event::ClientEventMask::NoEventMask,
                    dtype,
                    data,
                }))
            }
            Event::RandrNotify(_) | Event::RandrScreenChangeNotify(_) => Some(XEvent::RandrNotify),
            _ => {
                trace!("dropping unclassified X11 event");
                None
            }
        }
    }

    fn get_property_raw(
        &self,
        id: Xid,
        prop: xproto::Atom,
        prop_type: u32,
    ) -> Result<Option<xproto::GetPropertyReply>> {
        let reply = self
            .conn
            .get_property(false, win(id), prop, prop_type, 0, u32::MAX / 4)
            .map_err(proto_err)?
            .reply()
            .map_err(proto_err)?;
        if reply.type_ == 0 {
            Ok(None)
        } else {
            Ok(Some(reply))
        }
    }

    fn decode_strings(reply: &xproto::GetPropertyReply) -> Vec<String> {
        reply
            .value
            .split(|&b| b == 0)
            .filter(|s| !s.is_empty())
            .map(|s| String::from_utf8_lossy(s).into_owned())
            .collect()
    }
}

impl<C> XConn for X11rbConn<C>
where
    C: Connection + AsRawFd,
{
    fn root(&self) -> Xid {
        self.root
    }

    fn heads(&self) -> Result<Vec<Rect>> {
        if self.extensions.randr {
            let resources = self
                .conn
                .randr_get_screen_resources_current(win(self.root))
                .map_err(proto_err)?
                .reply()
                .map_err(proto_err)?;
            let crtcs: Vec<_> = resources
                .crtcs
                .iter()
                .filter_map(|&c| {
                    self.conn
                        .randr_get_crtc_info(c, 0)
                        .ok()
                        .and_then(|cookie| cookie.reply().ok())
                })
                .filter(|info| info.width > 0 && info.height > 0)
                .map(|info| rect_from_geometry(info.x, info.y, info.width, info.height))
                .collect();
            if !crtcs.is_empty() {
                return Ok(crtcs);
            }
        }
        if self.extensions.xinerama {
            if let Ok(reply) = self
                .conn
                .xinerama_query_screens()
                .map_err(proto_err)
                .and_then(|c| c.reply().map_err(proto_err))
            {
                let heads: Vec<Rect> = reply
                    .screen_info
                    .iter()
                    .map(|s| rect_from_geometry(s.x_org, s.y_org, s.width, s.height))
                    .collect();
                if !heads.is_empty() {
                    return Ok(heads);
                }
            }
        }
        let screen = &self.conn.setup().roots[self.screen_num];
        Ok(vec![Rect::new(0, 0, screen.width_in_pixels as u32, screen.height_in_pixels as u32)])
    }

    fn extensions(&self) -> ExtensionSupport {
        self.extensions
    }

    fn cursor_position(&self) -> Result<Point> {
        let reply = self
            .conn
            .query_pointer(win(self.root))
            .map_err(proto_err)?
            .reply()
            .map_err(proto_err)?;
        Ok(point_from_root(reply.root_x, reply.root_y))
    }

    fn warp_pointer(&self, id: Xid, x: i32, y: i32) -> Result<()> {
        self.conn
            .warp_pointer(x11rb::NONE, win(id), 0, 0, 0, 0, x as i16, y as i16)
            .map_err(proto_err)?;
        Ok(())
    }

    fn intern_atom(&self, name: &str) -> Result<Xid> {
        self.atom(name)
    }

    fn atom_name(&self, xid: Xid) -> Result<String> {
        if let Some((name, _)) = self.atoms.borrow().iter().find(|(_, &v)| v == xid) {
            return Ok(name.clone());
        }
        let reply = self
            .conn
            .get_atom_name(xid.0)
            .map_err(proto_err)?
            .reply()
            .map_err(proto_err)?;
        let name = String::from_utf8(reply.name).map_err(|e| Error::Protocol(e.to_string()))?;
        self.atoms.borrow_mut().insert(name.clone(), xid);
        Ok(name)
    }

    fn grab_key(&self, key: KeyPress, grab_window: Xid) -> Result<()> {
        let Some(code) = self.keycode_for(key.keysym) else {
            return Err(Error::Protocol(format!("no keycode for {:?}", key.keysym)));
        };
        for mods in key.modifiers.lock_equivalents() {
            self.conn
                .grab_key(
                    false,
                    win(grab_window),
                    to_x11_mods(mods),
                    code,
                    GrabMode::ASYNC,
                    GrabMode::ASYNC,
                )
                .map_err(proto_err)?;
        }
        Ok(())
    }

    fn ungrab_key(&self, key: KeyPress, grab_window: Xid) -> Result<()> {
        let Some(code) = self.keycode_for(key.keysym) else {
            return Ok(());
        };
        for mods in key.modifiers.lock_equivalents() {
            self.conn
                .ungrab_key(code, win(grab_window), to_x11_mods(mods))
                .map_err(proto_err)?;
        }
        Ok(())
    }

    fn grab_button(&self, state: MouseState, grab_window: Xid) -> Result<()> {
        let mask = EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::BUTTON_MOTION;
        let mask: u16 = u32::from(mask) as u16;
        for mods in state.modifiers.lock_equivalents() {
            self.conn
                .grab_button(
                    false,
                    win(grab_window),
                    mask,
                    GrabMode::ASYNC,
                    GrabMode::ASYNC,
                    x11rb::NONE,
                    x11rb::NONE,
                    button_code(state.button),
                    to_x11_mods(mods),
                )
                .map_err(proto_err)?;
        }
        Ok(())
    }

    fn ungrab_button(&self, state: MouseState, grab_window: Xid) -> Result<()> {
        for mods in state.modifiers.lock_equivalents() {
            self.conn
                .ungrab_button(button_code(state.button), win(grab_window), to_x11_mods(mods))
                .map_err(proto_err)?;
        }
        Ok(())
    }

    fn grab_pointer(&self, cursor: WmCursor) -> Result<()> {
        let cursor_id = self.cursor_for(cursor)?;
        let mask = EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION;
        let mask: u16 = u32::from(mask) as u16;
        self.conn
            .grab_pointer(
                false,
                win(self.root),
                mask,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                x11rb::NONE,
                cursor_id,
                CURRENT_TIME,
            )
            .map_err(proto_err)?
            .reply()
            .map_err(proto_err)?;
        Ok(())
    }

    fn ungrab_pointer(&self) -> Result<()> {
        self.conn.ungrab_pointer(CURRENT_TIME).map_err(proto_err)?;
        Ok(())
    }

    fn grab_keyboard(&self) -> Result<()> {
        self.conn
            .grab_keyboard(
                false,
                win(self.root),
                CURRENT_TIME,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
            )
            .map_err(proto_err)?
            .reply()
            .map_err(proto_err)?;
        Ok(())
    }

    fn ungrab_keyboard(&self) -> Result<()> {
        self.conn.ungrab_keyboard(CURRENT_TIME).map_err(proto_err)?;
        Ok(())
    }

    fn grab_server(&self) -> Result<()> {
        self.conn.grab_server().map_err(proto_err)?;
        Ok(())
    }

    fn ungrab_server(&self) -> Result<()> {
        self.conn.ungrab_server().map_err(proto_err)?;
        Ok(())
    }

    fn next_event(&self) -> Result<XEvent> {
        loop {
            let event = self.conn.wait_for_event().map_err(proto_err)?;
            if let Some(event) = self.translate_event(event) {
                return Ok(event);
            }
        }
    }

    fn poll_event(&self) -> Result<Option<XEvent>> {
        loop {
            let Some(event) = self.conn.poll_for_event().map_err(proto_err)? else {
                return Ok(None);
            };
            if let Some(event) = self.translate_event(event) {
                return Ok(Some(event));
            }
        }
    }

    fn flush(&self) {
        if let Err(e) = self.conn.flush() {
            warn!(error = %e, "failed to flush X11 connection");
        }
    }

    fn connection_fd(&self) -> i32 {
        self.conn.as_raw_fd()
    }

    fn create_window(&self, r: Rect, win_type: WinType) -> Result<Xid> {
        let id = self.conn.generate_id().map_err(proto_err)?;
        let (class, aux) = match win_type {
            WinType::CheckWin => (XWindowClass::INPUT_OUTPUT, CreateWindowAux::new().override_redirect(1)),
            WinType::InputOnly => (XWindowClass::INPUT_ONLY, CreateWindowAux::new().override_redirect(1)),
            WinType::InputOutput(_) => (XWindowClass::INPUT_OUTPUT, CreateWindowAux::new()),
        };
        self.conn
            .create_window(
                0,
                id,
                win(self.root),
                r.x as i16,
                r.y as i16,
                r.w.max(1) as u16,
                r.h.max(1) as u16,
                0,
                class,
                0,
                &aux,
            )
            .map_err(proto_err)?;

        if let WinType::InputOutput(type_atom) = win_type {
            let atom = self.atom(type_atom.as_ref())?;
            let net_wm_window_type = self.atom(Atom::NetWmWindowType.as_ref())?;
            self.conn
                .change_property32(
                    PropMode::REPLACE,
                    id,
                    net_wm_window_type.0,
                    AtomEnum::ATOM,
                    &[atom.0],
                )
                .map_err(proto_err)?;
        }
        Ok(xid(id))
    }

    fn destroy_window(&self, id: Xid) -> Result<()> {
        self.conn.destroy_window(win(id)).map_err(proto_err)?;
        Ok(())
    }

    fn reparent(&self, id: Xid, parent: Xid, offset: Point) -> Result<()> {
        self.conn
            .reparent_window(win(id), win(parent), offset.x as i16, offset.y as i16)
            .map_err(proto_err)?;
        Ok(())
    }

    fn client_geometry(&self, id: Xid) -> Result<Rect> {
        let reply = self
            .conn
            .get_geometry(win(id))
            .map_err(proto_err)?
            .reply()
            .map_err(proto_err)?;
        Ok(rect_from_geometry(reply.x, reply.y, reply.width, reply.height))
    }

    fn configure_window(&self, id: Xid, data: &[ClientConfig]) -> Result<()> {
        let mut aux = ConfigureWindowAux::new();
        for cfg in data {
            aux = match *cfg {
                ClientConfig::BorderPx(px) => aux.border_width(px),
                ClientConfig::Position(r) => aux
                    .x(r.x as i32)
                    .y(r.y as i32)
                    .width(r.w)
                    .height(r.h),
                ClientConfig::StackBelow(sibling) => {
                    aux.sibling(win(sibling)).stack_mode(StackMode::BELOW)
                }
                ClientConfig::StackAbove(sibling) => {
                    aux.sibling(win(sibling)).stack_mode(StackMode::ABOVE)
                }
                ClientConfig::StackTop => aux.stack_mode(StackMode::ABOVE),
                ClientConfig::StackBottom => aux.stack_mode(StackMode::BELOW),
            };
        }
        self.conn.configure_window(win(id), &aux).map_err(proto_err)?;
        Ok(())
    }

    fn existing_top_level_windows(&self) -> Result<Vec<Xid>> {
        let reply = self
            .conn
            .query_tree(win(self.root))
            .map_err(proto_err)?
            .reply()
            .map_err(proto_err)?;
        Ok(reply.children.into_iter().map(xid).collect())
    }

    fn map(&self, id: Xid) -> Result<()> {
        self.conn.map_window(win(id)).map_err(proto_err)?;
        Ok(())
    }

    fn unmap(&self, id: Xid) -> Result<()> {
        self.conn.unmap_window(win(id)).map_err(proto_err)?;
        Ok(())
    }

    fn kill(&self, id: Xid) -> Result<()> {
        self.conn.kill_client(win(id)).map_err(proto_err)?;
        Ok(())
    }

    fn focus(&self, id: Xid) -> Result<()> {
        self.conn
            .set_input_focus(InputFocus::PARENT, win(id), CURRENT_TIME)
            .map_err(proto_err)?;
        Ok(())
    }

    fn get_prop(&self, id: Xid, prop_name: &str) -> Result<Option<Prop>> {
        let atom = self.atom(prop_name)?;

        if prop_name == "WM_HINTS" {
            return match self.get_property_raw(id, atom.0, u32::from(AtomEnum::WM_HINTS))? {
                Some(reply) => {
                    let raw: Vec<u32> = reply.value32().map(|it| it.collect()).unwrap_or_default();
                    Ok(Some(Prop::WmHints(WmHints::try_from_bytes(&raw)?)))
                }
                None => Ok(None),
            };
        }
        if prop_name == "WM_NORMAL_HINTS" {
            return match self.get_property_raw(id, atom.0, u32::from(AtomEnum::WM_SIZE_HINTS))? {
                Some(reply) => {
                    let raw: Vec<u32> = reply.value32().map(|it| it.collect()).unwrap_or_default();
                    Ok(Some(Prop::WmNormalHints(size_hints_from_bytes(&raw))))
                }
                None => Ok(None),
            };
        }

        let Some(reply) = self.get_property_raw(id, atom.0, u32::from(AtomEnum::ANY))? else {
            return Ok(None);
        };

        let is_atom_type = reply.type_ == u32::from(AtomEnum::ATOM);
        let is_window_type = reply.type_ == u32::from(AtomEnum::WINDOW);
        let is_string_type = reply.type_ == u32::from(AtomEnum::STRING)
            || self
                .atoms
                .borrow()
                .get("UTF8_STRING")
                .map(|a| a.0 == reply.type_)
                .unwrap_or(false);

        if is_string_type {
            return Ok(Some(Prop::UTF8String(Self::decode_strings(&reply))));
        }
        if is_window_type {
            let ids: Vec<Xid> = reply
                .value32()
                .map(|it| it.map(xid).collect())
                .unwrap_or_default();
            return Ok(Some(Prop::Window(ids)));
        }
        if is_atom_type {
            let names: Result<Vec<String>> = reply
                .value32()
                .map(|it| it.map(|a| self.atom_name(xid(a))).collect())
                .unwrap_or_else(|| Ok(Vec::new()));
            return Ok(Some(Prop::Atom(names?)));
        }
        if reply.type_ == u32::from(AtomEnum::CARDINAL) {
            if let Some(mut it) = reply.value32() {
                if let Some(v) = it.next() {
                    return Ok(Some(Prop::Cardinal(v)));
                }
            }
        }

        let raw: Vec<u32> = reply.value32().map(|it| it.collect()).unwrap_or_default();
        Ok(Some(Prop::Bytes(raw)))
    }

    fn list_props(&self, id: Xid) -> Result<Vec<String>> {
        let reply = self
            .conn
            .list_properties(win(id))
            .map_err(proto_err)?
            .reply()
            .map_err(proto_err)?;
        reply.atoms.into_iter().map(|a| self.atom_name(xid(a))).collect()
    }

    fn get_wm_state(&self, id: Xid) -> Result<Option<WmState>> {
        let atom = self.atom(Atom::WmState.as_ref())?;
        match self.get_property_raw(id, atom.0, atom.0)? {
            Some(reply) => {
                let mut it = reply.value32().ok_or_else(|| {
                    Error::InvalidProperty("WM_STATE is not format 32".to_string())
                })?;
                let state = it.next().unwrap_or(0);
                Ok(Some(match state {
                    0 => WmState::Withdrawn,
                    2 => WmState::Iconic,
                    _ => WmState::Normal,
                }))
            }
            None => Ok(None),
        }
    }

    fn get_window_attributes(&self, id: Xid) -> Result<WindowAttributes> {
        let reply = self
            .conn
            .get_window_attributes(win(id))
            .map_err(proto_err)?
            .reply()
            .map_err(proto_err)?;
        let map_state = match reply.map_state {
            xproto::MapState::UNMAPPED => MapState::Unmapped,
            xproto::MapState::UNVIEWABLE => MapState::UnViewable,
            _ => MapState::Viewable,
        };
        let window_class = match reply.class {
            xproto::WindowClass::INPUT_ONLY => WindowClass::InputOnly,
            xproto::WindowClass::INPUT_OUTPUT => WindowClass::InputOutput,
            _ => WindowClass::CopyFromParent,
        };
        Ok(WindowAttributes::new(
            reply.override_redirect,
            map_state,
            window_class,
        ))
    }

    fn set_wm_state(&self, id: Xid, wm_state: WmState) -> Result<()> {
        let atom = self.atom(Atom::WmState.as_ref())?;
        let state = match wm_state {
            WmState::Withdrawn => 0u32,
            WmState::Normal => 1,
            WmState::Iconic => 2,
        };
        self.conn
            .change_property32(PropMode::REPLACE, win(id), atom.0, atom.0, &[state, 0])
            .map_err(proto_err)?;
        Ok(())
    }

    fn set_prop(&self, id: Xid, name: &str, val: Prop) -> Result<()> {
        let atom = self.atom(name)?;
        match val {
            Prop::Atom(names) => {
                let ids: Result<Vec<u32>> = names.iter().map(|n| self.atom(n).map(|a| a.0)).collect();
                self.conn
                    .change_property32(PropMode::REPLACE, win(id), atom.0, AtomEnum::ATOM, &ids?)
                    .map_err(proto_err)?;
            }
            Prop::Bytes(data) => {
                self.conn
                    .change_property32(PropMode::REPLACE, win(id), atom.0, AtomEnum::CARDINAL, &data)
                    .map_err(proto_err)?;
            }
            Prop::Cardinal(v) => {
                self.conn
                    .change_property32(PropMode::REPLACE, win(id), atom.0, AtomEnum::CARDINAL, &[v])
                    .map_err(proto_err)?;
            }
            Prop::UTF8String(strs) => {
                let utf8 = self.atom("UTF8_STRING")?;
                let joined = strs.join("\0");
                self.conn
                    .change_property8(PropMode::REPLACE, win(id), atom.0, utf8.0, joined.as_bytes())
                    .map_err(proto_err)?;
            }
            Prop::Window(ids) => {
                let raw: Vec<u32> = ids.iter().map(|i| i.0).collect();
                self.conn
                    .change_property32(PropMode::REPLACE, win(id), atom.0, AtomEnum::WINDOW, &raw)
                    .map_err(proto_err)?;
            }
            Prop::WmHints(_) | Prop::WmNormalHints(_) => {
                return Err(Error::Protocol(
                    "setting WM_HINTS/WM_NORMAL_HINTS is not supported; the window manager only reads them".into(),
                ));
            }
        }
        Ok(())
    }

    fn delete_prop(&self, id: Xid, prop_name: &str) -> Result<()> {
        let atom = self.atom(prop_name)?;
        self.conn.delete_property(win(id), atom.0).map_err(proto_err)?;
        Ok(())
    }

    fn set_client_attributes(&self, id: Xid, attrs: &[ClientAttr]) -> Result<()> {
        let mut aux = ChangeWindowAttributesAux::new();
        for attr in attrs {
            aux = match *attr {
                ClientAttr::BorderColor(color) => aux.border_pixel(color),
                ClientAttr::ClientEventMask => aux.event_mask(CLIENT_EVENT_MASK),
                ClientAttr::ClientUnmapMask => aux.event_mask(CLIENT_UNMAP_MASK),
                ClientAttr::RootEventMask => aux.event_mask(ROOT_EVENT_MASK),
            };
        }
        self.conn
            .change_window_attributes(win(id), &aux)
            .map_err(proto_err)?;
        Ok(())
    }

    fn send_client_message(&self, msg: ClientMessage) -> Result<()> {
        let dtype = self.atom(&msg.dtype)?;
        let format: u8 = match &msg.data {
            ClientMessageData::U8(_) => 8,
            ClientMessageData::U16(_) => 16,
            ClientMessageData::U32(_) => 32,
        };
        let data = match msg.data {
            ClientMessageData::U8(d) => XClientMessageData::from(d),
            ClientMessageData::U16(d) => XClientMessageData::from(d),
            ClientMessageData::U32(d) => XClientMessageData::from(d),
        };
        let event = ClientMessageEvent {
            response_type: xproto::CLIENT_MESSAGE_EVENT,
            format,
            sequence: 0,
            window: win(msg.id),
            type_: dtype.0,
            data,
        };
        let mask = match msg.mask {
            crate::x::event::ClientEventMask::SubstructureNotify => EventMask::SUBSTRUCTURE_NOTIFY,
            crate::x::event::ClientEventMask::StructureNotify => EventMask::STRUCTURE_NOTIFY,
            crate::x::event::ClientEventMask::NoEventMask => EventMask::NO_EVENT,
        };
        self.conn
            .send_event(false, win(msg.id), mask, event)
            .map_err(proto_err)?;
        Ok(())
    }
}

/// Parse a raw `WM_SIZE_HINTS` payload (ICCCM section 4.1.2.3: `flags`
/// followed by 17 more `u32` fields in a fixed layout) into the pure
/// [`SizeHints`] shape.
fn size_hints_from_bytes(raw: &[u32]) -> SizeHints {
    const P_MIN_SIZE: u32 = 1 << 4;
    const P_MAX_SIZE: u32 = 1 << 5;
    const P_RESIZE_INC: u32 = 1 << 6;
    const P_ASPECT: u32 = 1 << 7;
    const P_BASE_SIZE: u32 = 1 << 8;

    if raw.len() < 18 {
        return SizeHints::default();
    }
    let flags = raw[0];
    let min = (flags & P_MIN_SIZE != 0).then_some((raw[5], raw[6]));
    let max = (flags & P_MAX_SIZE != 0).then_some((raw[7], raw[8]));
    let inc = (flags & P_RESIZE_INC != 0).then_some((raw[9], raw[10]));
    let aspect = (flags & P_ASPECT != 0).then_some(((raw[11], raw[12]), (raw[13], raw[14])));
    let base = (flags & P_BASE_SIZE != 0).then_some((raw[15], raw[16]));

    SizeHints {
        min,
        max,
        base,
        inc,
        aspect,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mod_mask_round_trips_through_the_wire_format() {
        let m = ModMask::CONTROL | ModMask::MOD4;
        assert_eq!(from_x11_mods(to_x11_mods(m)), m);
    }

    #[test]
    fn button_code_round_trips() {
        for b in [
            MouseButton::Left,
            MouseButton::Middle,
            MouseButton::Right,
            MouseButton::ScrollUp,
            MouseButton::ScrollDown,
            MouseButton::Other(9),
        ] {
            assert_eq!(button_from_code(button_code(b)), b);
        }
    }

    #[test]
    fn size_hints_reads_min_and_aspect_flags() {
        let mut raw = [0u32; 18];
        raw[0] = (1 << 4) | (1 << 7);
        raw[5] = 10;
        raw[6] = 20;
        raw[11] = 4;
        raw[12] = 3;
        raw[13] = 16;
        raw[14] = 9;
        let hints = size_hints_from_bytes(&raw);
        assert_eq!(hints.min, Some((10, 20)));
        assert_eq!(hints.aspect, Some(((4, 3), (16, 9))));
        assert_eq!(hints.max, None);
    }
}
