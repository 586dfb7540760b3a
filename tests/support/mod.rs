//! Shared fixtures for the end-to-end tests in this directory: a
//! [`FakeServer`] standing in for a real display (mapped windows, their
//! geometry, and their properties) plus helpers for wiring up a [`State`]
//! with a client already wrapped in a frame.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use pekwm_core::client::Client;
use pekwm_core::config::Config;
use pekwm_core::frame::Frame;
use pekwm_core::harbour::NoHarbour;
use pekwm_core::pure::geometry::{Point, Rect};
use pekwm_core::state::State;
use pekwm_core::theme::BuiltinTheme;
use pekwm_core::wo::{WindowObject, WoId};
use pekwm_core::x::event::{ClientMessage, XEvent};
use pekwm_core::x::mock::MockXConn;
use pekwm_core::x::property::{Prop, WindowAttributes, WmState};
use pekwm_core::x::{ClientAttr, ClientConfig, WinType};
use pekwm_core::{Error, Result, Xid};

/// A minimal in-memory stand-in for an X server: enough state for the
/// window-creation/geometry/property calls a client-management pass makes,
/// with everything else answered the same inert way the `mock` module's
/// defaults do.
#[derive(Default)]
pub struct FakeServer {
    pub heads: Vec<Rect>,
    pub geometry: RefCell<HashMap<Xid, Rect>>,
    pub attrs: RefCell<HashMap<Xid, WindowAttributes>>,
    pub props: RefCell<HashMap<(Xid, String), Prop>>,
    pub existing: Vec<Xid>,
    pub sent_messages: RefCell<Vec<ClientMessage>>,
    pub next_xid: RefCell<u32>,
    /// Events handed out one at a time by `mock_poll_event`, front first.
    pub queued_events: RefCell<VecDeque<XEvent>>,
}

impl FakeServer {
    pub fn new(heads: Vec<Rect>) -> Self {
        Self {
            heads,
            next_xid: RefCell::new(1000),
            ..Default::default()
        }
    }

    pub fn set_geometry(&self, id: Xid, r: Rect) {
        self.geometry.borrow_mut().insert(id, r);
    }

    pub fn set_attrs(&self, id: Xid, attrs: WindowAttributes) {
        self.attrs.borrow_mut().insert(id, attrs);
    }

    pub fn set_prop(&self, id: Xid, name: &str, prop: Prop) {
        self.props.borrow_mut().insert((id, name.to_string()), prop);
    }

    pub fn push_event(&self, event: XEvent) {
        self.queued_events.borrow_mut().push_back(event);
    }
}

impl MockXConn for FakeServer {
    fn mock_heads(&self) -> Result<Vec<Rect>> {
        if self.heads.is_empty() {
            Ok(vec![Rect::new(0, 0, 1920, 1080)])
        } else {
            Ok(self.heads.clone())
        }
    }

    fn mock_cursor_position(&self) -> Result<Point> {
        Ok(Point::new(0, 0))
    }

    fn mock_warp_pointer(&self, _id: Xid, _x: i32, _y: i32) -> Result<()> {
        Ok(())
    }

    fn mock_map(&self, _id: Xid) -> Result<()> {
        Ok(())
    }

    fn mock_unmap(&self, _id: Xid) -> Result<()> {
        Ok(())
    }

    fn mock_focus(&self, _id: Xid) -> Result<()> {
        Ok(())
    }

    fn mock_kill(&self, _id: Xid) -> Result<()> {
        Ok(())
    }

    fn mock_flush(&self) {}

    fn mock_poll_event(&self) -> Result<Option<XEvent>> {
        Ok(self.queued_events.borrow_mut().pop_front())
    }

    fn mock_create_window(&self, r: Rect, _win_type: WinType) -> Result<Xid> {
        let mut next = self.next_xid.borrow_mut();
        let id = Xid(*next);
        *next += 1;
        self.geometry.borrow_mut().insert(id, r);
        Ok(id)
    }

    fn mock_destroy_window(&self, id: Xid) -> Result<()> {
        self.geometry.borrow_mut().remove(&id);
        Ok(())
    }

    fn mock_reparent(&self, _id: Xid, _parent: Xid, _offset: Point) -> Result<()> {
        Ok(())
    }

    fn mock_client_geometry(&self, id: Xid) -> Result<Rect> {
        self.geometry
            .borrow()
            .get(&id)
            .copied()
            .ok_or(Error::UnimplementedMock)
    }

    fn mock_configure_window(&self, id: Xid, data: &[ClientConfig]) -> Result<()> {
        let mut geometry = self.geometry.borrow_mut();
        let current = geometry.get(&id).copied().unwrap_or(Rect::new(0, 0, 1, 1));
        let mut next = current;
        for change in data {
            if let ClientConfig::Position(r) = change {
                next = *r;
            }
        }
        geometry.insert(id, next);
        Ok(())
    }

    fn mock_existing_top_level_windows(&self) -> Result<Vec<Xid>> {
        Ok(self.existing.clone())
    }

    fn mock_get_window_attributes(&self, id: Xid) -> Result<WindowAttributes> {
        self.attrs
            .borrow()
            .get(&id)
            .cloned()
            .ok_or(Error::UnimplementedMock)
    }

    fn mock_get_prop(&self, id: Xid, prop_name: &str) -> Result<Option<Prop>> {
        Ok(self.props.borrow().get(&(id, prop_name.to_string())).cloned())
    }

    fn mock_set_prop(&self, id: Xid, name: &str, val: Prop) -> Result<()> {
        self.props.borrow_mut().insert((id, name.to_string()), val);
        Ok(())
    }

    fn mock_set_wm_state(&self, id: Xid, wm_state: WmState) -> Result<()> {
        self.props.borrow_mut().insert(
            (id, "WM_STATE".to_string()),
            Prop::Cardinal(match wm_state {
                WmState::Withdrawn => 0,
                WmState::Normal => 1,
                WmState::Iconic => 3,
            }),
        );
        Ok(())
    }

    fn mock_set_client_attributes(&self, _id: Xid, _attrs: &[ClientAttr]) -> Result<()> {
        Ok(())
    }

    fn mock_send_client_message(&self, msg: ClientMessage) -> Result<()> {
        self.sent_messages.borrow_mut().push(msg);
        Ok(())
    }
}

/// A freshly constructed [`State`] with no managed windows.
pub fn empty_state() -> State {
    empty_state_with_config(Config::default())
}

pub fn empty_state_with_config(config: Config) -> State {
    State::new(config, Box::new(BuiltinTheme::default()), Box::new(NoHarbour))
}

/// Wrap a bare client in a new single-tenant frame, as [`pekwm_core::manage`]
/// would, and insert both into the stacking order. Returns the frame's and
/// client's handles.
pub fn add_framed_client(state: &mut State, xid: Xid, geometry: Rect) -> (WoId, WoId) {
    let placeholder = WoId { index: 0, generation: 0 };
    let client_id = state
        .registry
        .insert(Some(xid), WindowObject::Client(Client::new(placeholder, xid, geometry)));
    let frame_id = state
        .registry
        .insert(None, WindowObject::Frame(Frame::new(placeholder, geometry, client_id)));

    if let Some(WindowObject::Frame(f)) = state.registry.get_mut(frame_id) {
        f.base.id = frame_id;
    }
    if let Some(WindowObject::Client(c)) = state.registry.get_mut(client_id) {
        c.frame_id = Some(frame_id);
        c.wm_hints.input = true;
        c.base.mapped = true;
    }
    state.insert_into_stacking(frame_id);
    (frame_id, client_id)
}
