//! A mock implementation of [`XConn`], easier to hand-implement per test
//! than the full trait. Exposed unconditionally (not gated on
//! `#[cfg(test)]`) so integration tests under `tests/` can drive [`State`](
//! crate::state::State) and [`EventLoop`](crate::event_loop::EventLoop)
//! against it without a display connection.
use crate::{
    bindings::{keys::KeyPress, mouse::MouseState},
    pure::geometry::{Point, Rect},
    x::{
        event::{ClientMessage, XEvent},
        property::{Prop, WindowAttributes, WmState},
        ClientAttr, ClientConfig, Cursor, ExtensionSupport, WinType, XConn,
    },
    Error, Result, Xid,
};

/// Every fallible method on this trait returns `Error::UnimplementedMock`
/// unless the test overrides it. `mock_root` defaults to window 0,
/// `mock_flush` is a no-op, and `mock_extensions` defaults to nothing
/// probed. Implementing this trait for a type automatically implements
/// [`XConn`] for it by forwarding each call to `mock_$method`.
#[allow(unused_variables)]
pub trait MockXConn {
    fn mock_root(&self) -> Xid {
        Xid(0)
    }

    fn mock_heads(&self) -> Result<Vec<Rect>> {
        Err(Error::UnimplementedMock)
    }

    fn mock_extensions(&self) -> ExtensionSupport {
        ExtensionSupport::default()
    }

    fn mock_cursor_position(&self) -> Result<Point> {
        Err(Error::UnimplementedMock)
    }

    fn mock_warp_pointer(&self, id: Xid, x: i32, y: i32) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_intern_atom(&self, name: &str) -> Result<Xid> {
        Err(Error::UnimplementedMock)
    }

    fn mock_atom_name(&self, xid: Xid) -> Result<String> {
        Err(Error::UnimplementedMock)
    }

    fn mock_grab_key(&self, key: KeyPress, grab_window: Xid) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_ungrab_key(&self, key: KeyPress, grab_window: Xid) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_grab_button(&self, state: MouseState, grab_window: Xid) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_ungrab_button(&self, state: MouseState, grab_window: Xid) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_grab_pointer(&self, cursor: Cursor) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_ungrab_pointer(&self) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_grab_keyboard(&self) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_ungrab_keyboard(&self) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_grab_server(&self) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_ungrab_server(&self) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_next_event(&self) -> Result<XEvent> {
        Err(Error::UnimplementedMock)
    }

    fn mock_poll_event(&self) -> Result<Option<XEvent>> {
        Err(Error::UnimplementedMock)
    }

    fn mock_flush(&self) {}

    fn mock_connection_fd(&self) -> i32 {
        -1
    }

    fn mock_create_window(&self, r: Rect, win_type: WinType) -> Result<Xid> {
        Err(Error::UnimplementedMock)
    }

    fn mock_destroy_window(&self, id: Xid) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_reparent(&self, id: Xid, parent: Xid, offset: Point) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_client_geometry(&self, id: Xid) -> Result<Rect> {
        Err(Error::UnimplementedMock)
    }

    fn mock_configure_window(&self, id: Xid, data: &[ClientConfig]) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_existing_top_level_windows(&self) -> Result<Vec<Xid>> {
        Err(Error::UnimplementedMock)
    }

    fn mock_map(&self, id: Xid) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_unmap(&self, id: Xid) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_kill(&self, id: Xid) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_focus(&self, id: Xid) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_get_prop(&self, id: Xid, prop_name: &str) -> Result<Option<Prop>> {
        Err(Error::UnimplementedMock)
    }

    fn mock_list_props(&self, id: Xid) -> Result<Vec<String>> {
        Err(Error::UnimplementedMock)
    }

    fn mock_get_wm_state(&self, id: Xid) -> Result<Option<WmState>> {
        Err(Error::UnimplementedMock)
    }

    fn mock_get_window_attributes(&self, id: Xid) -> Result<WindowAttributes> {
        Err(Error::UnimplementedMock)
    }

    fn mock_set_wm_state(&self, id: Xid, wm_state: WmState) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_set_prop(&self, id: Xid, name: &str, val: Prop) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_delete_prop(&self, id: Xid, prop_name: &str) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_set_client_attributes(&self, id: Xid, attrs: &[ClientAttr]) -> Result<()> {
        Err(Error::UnimplementedMock)
    }

    fn mock_send_client_message(&self, msg: ClientMessage) -> Result<()> {
        Err(Error::UnimplementedMock)
    }
}

impl<T> XConn for T
where
    T: MockXConn,
{
    fn root(&self) -> Xid {
        self.mock_root()
    }

    fn heads(&self) -> Result<Vec<Rect>> {
        self.mock_heads()
    }

    fn extensions(&self) -> ExtensionSupport {
        self.mock_extensions()
    }

    fn cursor_position(&self) -> Result<Point> {
        self.mock_cursor_position()
    }

    fn warp_pointer(&self, id: Xid, x: i32, y: i32) -> Result<()> {
        self.mock_warp_pointer(id, x, y)
    }

    fn intern_atom(&self, name: &str) -> Result<Xid> {
        self.mock_intern_atom(name)
    }

    fn atom_name(&self, xid: Xid) -> Result<String> {
        self.mock_atom_name(xid)
    }

    fn grab_key(&self, key: KeyPress, grab_window: Xid) -> Result<()> {
        self.mock_grab_key(key, grab_window)
    }

    fn ungrab_key(&self, key: KeyPress, grab_window: Xid) -> Result<()> {
        self.mock_ungrab_key(key, grab_window)
    }

    fn grab_button(&self, state: MouseState, grab_window: Xid) -> Result<()> {
        self.mock_grab_button(state, grab_window)
    }

    fn ungrab_button(&self, state: MouseState, grab_window: Xid) -> Result<()> {
        self.mock_ungrab_button(state, grab_window)
    }

    fn grab_pointer(&self, cursor: Cursor) -> Result<()> {
        self.mock_grab_pointer(cursor)
    }

    fn ungrab_pointer(&self) -> Result<()> {
        self.mock_ungrab_pointer()
    }

    fn grab_keyboard(&self) -> Result<()> {
        self.mock_grab_keyboard()
    }

    fn ungrab_keyboard(&self) -> Result<()> {
        self.mock_ungrab_keyboard()
    }

    fn grab_server(&self) -> Result<()> {
        self.mock_grab_server()
    }

    fn ungrab_server(&self) -> Result<()> {
        self.mock_ungrab_server()
    }

    fn next_event(&self) -> Result<XEvent> {
        self.mock_next_event()
    }

    fn poll_event(&self) -> Result<Option<XEvent>> {
        self.mock_poll_event()
    }

    fn flush(&self) {
        self.mock_flush()
    }

    fn connection_fd(&self) -> i32 {
        self.mock_connection_fd()
    }

    fn create_window(&self, r: Rect, win_type: WinType) -> Result<Xid> {
        self.mock_create_window(r, win_type)
    }

    fn destroy_window(&self, id: Xid) -> Result<()> {
        self.mock_destroy_window(id)
    }

    fn reparent(&self, id: Xid, parent: Xid, offset: Point) -> Result<()> {
        self.mock_reparent(id, parent, offset)
    }

    fn client_geometry(&self, id: Xid) -> Result<Rect> {
        self.mock_client_geometry(id)
    }

    fn configure_window(&self, id: Xid, data: &[ClientConfig]) -> Result<()> {
        self.mock_configure_window(id, data)
    }

    fn existing_top_level_windows(&self) -> Result<Vec<Xid>> {
        self.mock_existing_top_level_windows()
    }

    fn map(&self, id: Xid) -> Result<()> {
        self.mock_map(id)
    }

    fn unmap(&self, id: Xid) -> Result<()> {
        self.mock_unmap(id)
    }

    fn kill(&self, id: Xid) -> Result<()> {
        self.mock_kill(id)
    }

    fn focus(&self, id: Xid) -> Result<()> {
        self.mock_focus(id)
    }

    fn get_prop(&self, id: Xid, prop_name: &str) -> Result<Option<Prop>> {
        self.mock_get_prop(id, prop_name)
    }

    fn list_props(&self, id: Xid) -> Result<Vec<String>> {
        self.mock_list_props(id)
    }

    fn get_wm_state(&self, id: Xid) -> Result<Option<WmState>> {
        self.mock_get_wm_state(id)
    }

    fn get_window_attributes(&self, id: Xid) -> Result<WindowAttributes> {
        self.mock_get_window_attributes(id)
    }

    fn set_wm_state(&self, id: Xid, wm_state: WmState) -> Result<()> {
        self.mock_set_wm_state(id, wm_state)
    }

    fn set_prop(&self, id: Xid, name: &str, val: Prop) -> Result<()> {
        self.mock_set_prop(id, name, val)
    }

    fn delete_prop(&self, id: Xid, prop_name: &str) -> Result<()> {
        self.mock_delete_prop(id, prop_name)
    }

    fn set_client_attributes(&self, id: Xid, attrs: &[ClientAttr]) -> Result<()> {
        self.mock_set_client_attributes(id, attrs)
    }

    fn send_client_message(&self, msg: ClientMessage) -> Result<()> {
        self.mock_send_client_message(msg)
    }
}
