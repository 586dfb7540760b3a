//! Pluggable modal event handlers: while one is
//! installed in [`crate::state::State::modal`], the event loop offers it
//! every pointer/key event before falling through to the normal per-WO
//! dispatch path. The source models this as virtual dispatch plus a slot
//! pointer; here it is a tagged enum of handler states implementing a
//! single outcome-returning `handle` per event kind, so no allocation is
//! needed per drag and a target that disappears mid-drag is just a
//! [`WoId`] lookup that comes back empty.
use keysyms::XKeySym;
use tracing::{debug, trace};

use crate::{
    bindings::keys::{KeyPress, ModMask},
    pure::geometry::{Gravity, KeepAnchor, Point, Rect},
    state::State,
    wo::WoId,
    x::{
        event::{ButtonEvent, ExposeEvent, PointerChange},
        ClientConfig, Cursor, XConnExt,
    },
    Result,
};

/// Outcome of offering one event to a modal handler. `Processed`/`Skip` leave the handler installed; `Stop*` variants
/// tell the event loop to uninstall it after this call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    Processed,
    Skip,
    StopProcessed,
    StopSkip,
}

impl HandlerOutcome {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::StopProcessed | Self::StopSkip)
    }

    pub fn is_consumed(self) -> bool {
        matches!(self, Self::Processed | Self::StopProcessed)
    }
}

/// The original's own keyboard move/resize vocabulary (`Action.hh`'s
/// `MoveResizeActionType`), kept distinct from the top-level [`crate::
/// action::Action`] enum because it is never bound through the generic key
/// grabber: the keyboard move/resize handler interprets raw key presses
/// itself while it is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResizeAction {
    MoveHorizontal(i32),
    MoveVertical(i32),
    ResizeHorizontal(i32),
    ResizeVertical(i32),
    MoveSnap,
    MoveCancel,
    MoveEnd,
}

/// Stock keyboard move/resize bindings: arrows move, shift+arrows resize,
/// space snaps to the nearest edge, Return commits, Escape cancels. Matches
/// pekwm's documented defaults for this context.
fn classify_move_resize_key(press: KeyPress, step: i32) -> Option<MoveResizeAction> {
    let resizing = press.modifiers.contains(ModMask::SHIFT);
    match press.keysym {
        XKeySym::XK_Left if resizing => Some(MoveResizeAction::ResizeHorizontal(-step)),
        XKeySym::XK_Right if resizing => Some(MoveResizeAction::ResizeHorizontal(step)),
        XKeySym::XK_Up if resizing => Some(MoveResizeAction::ResizeVertical(-step)),
        XKeySym::XK_Down if resizing => Some(MoveResizeAction::ResizeVertical(step)),
        XKeySym::XK_Left => Some(MoveResizeAction::MoveHorizontal(-step)),
        XKeySym::XK_Right => Some(MoveResizeAction::MoveHorizontal(step)),
        XKeySym::XK_Up => Some(MoveResizeAction::MoveVertical(-step)),
        XKeySym::XK_Down => Some(MoveResizeAction::MoveVertical(step)),
        XKeySym::XK_space => Some(MoveResizeAction::MoveSnap),
        XKeySym::XK_Return => Some(MoveResizeAction::MoveEnd),
        XKeySym::XK_Escape => Some(MoveResizeAction::MoveCancel),
        _ => None,
    }
}

/// Which edges of the frame a mouse-driven resize is dragging, reusing
/// [`Gravity`] the same way [`Cursor::Resize`] already names a resize
/// cursor by the corner/edge it represents.
pub(crate) fn resize_edges(gravity: Gravity) -> (bool, bool, bool, bool) {
    let west = matches!(gravity, Gravity::NorthWest | Gravity::West | Gravity::SouthWest);
    let east = matches!(gravity, Gravity::NorthEast | Gravity::East | Gravity::SouthEast);
    let north = matches!(gravity, Gravity::NorthWest | Gravity::North | Gravity::NorthEast);
    let south = matches!(gravity, Gravity::SouthWest | Gravity::South | Gravity::SouthEast);
    (west, east, north, south)
}

/// Apply a pointer delta to `origin` along the edges `gravity` names,
/// clamping each dimension to at least one pixel.
pub(crate) fn resize_from_gravity(origin: Rect, gravity: Gravity, dx: i32, dy: i32) -> Rect {
    let (west, east, north, south) = resize_edges(gravity);
    let mut r = origin;

    if west {
        let new_x = (origin.x as i32 + dx).max(0);
        r.w = (origin.w as i32 - dx).max(1) as u32;
        r.x = new_x as u32;
    } else if east {
        r.w = (origin.w as i32 + dx).max(1) as u32;
    }

    if north {
        let new_y = (origin.y as i32 + dy).max(0);
        r.h = (origin.h as i32 - dy).max(1) as u32;
        r.y = new_y as u32;
    } else if south {
        r.h = (origin.h as i32 + dy).max(1) as u32;
    }

    r
}

pub(crate) fn move_by(origin: Rect, dx: i32, dy: i32) -> Rect {
    Rect::new(
        (origin.x as i32 + dx).max(0) as u32,
        (origin.y as i32 + dy).max(0) as u32,
        origin.w,
        origin.h,
    )
}

/// Snap `candidate` to the workarea edge or a neighbouring frame's edge
/// within `threshold` pixels, independently on each axis.
pub(crate) fn snap_to_edges(candidate: Rect, workarea: Rect, neighbours: &[Rect], threshold: u32) -> Rect {
    let mut r = candidate;
    let threshold = threshold as i32;

    let mut x_edges = vec![workarea.x, workarea.x + workarea.w];
    let mut y_edges = vec![workarea.y, workarea.y + workarea.h];
    for n in neighbours {
        x_edges.push(n.x);
        x_edges.push(n.x + n.w);
        y_edges.push(n.y);
        y_edges.push(n.y + n.h);
    }

    let snap_axis = |pos: u32, len: u32, edges: &[u32]| -> u32 {
        let near = |target: u32, at: u32| (target as i32 - at as i32).unsigned_abs() as i32 <= threshold;
        for &edge in edges {
            if near(pos, edge) {
                return edge;
            }
            if near(pos + len, edge) {
                return edge.saturating_sub(len);
            }
        }
        pos
    };

    r.x = snap_axis(r.x, r.w, &x_edges);
    r.y = snap_axis(r.y, r.h, &y_edges);
    r
}

/// Read back the active client's size hints and the frame's decoration
/// extent, used to run every candidate geometry through the same
/// normalizer the rest of the core uses.
pub(crate) fn normalize_candidate(state: &State, frame_id: WoId, candidate: Rect, anchor: KeepAnchor) -> Rect {
    let Some(frame) = state.registry.get(frame_id).and_then(|wo| wo.as_frame()) else {
        return candidate;
    };
    let decor = frame.decoration_extent(state.config.border_width, state.config.title_height);
    let Some(client) = state
        .registry
        .get(frame.active_client())
        .and_then(|wo| wo.as_client())
    else {
        return candidate;
    };
    client.size_hints.normalize_frame(&decor, candidate, anchor)
}

/// Kind of a mouse-driven geometry drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MouseDragKind {
    Move,
    Resize(Gravity),
}

/// Button drag on a frame's title (move) or border (resize).
#[derive(Debug, Clone)]
pub struct MouseMoveResize {
    target: WoId,
    kind: MouseDragKind,
    origin: Rect,
    pointer_origin: Point,
    /// `true` when every motion reshapes the real window directly;
    /// `false` when geometry is only committed on release and an XOR
    /// outline stands in for it while the server is grabbed.
    live: bool,
}

impl MouseMoveResize {
    pub fn new(target: WoId, kind_is_resize: Option<Gravity>, origin: Rect, pointer_origin: Point, live: bool) -> Self {
        Self {
            target,
            kind: match kind_is_resize {
                Some(g) => MouseDragKind::Resize(g),
                None => MouseDragKind::Move,
            },
            origin,
            pointer_origin,
            live,
        }
    }

    /// Grab the pointer with a cursor naming the drag kind and, in
    /// outline mode, the server, so XOR outline rectangles cannot be left
    /// behind by an interleaved repaint.
    pub fn init<X: XConnExt>(&self, x: &X) -> Result<()> {
        let cursor = match self.kind {
            MouseDragKind::Move => Cursor::Move,
            MouseDragKind::Resize(g) => Cursor::Resize(g),
        };
        x.grab_pointer(cursor)?;
        if !self.live {
            x.grab_server()?;
        }
        Ok(())
    }

    fn candidate(&self, state: &State, change: PointerChange, head: Rect) -> Rect {
        let dx = change.abs.x as i32 - self.pointer_origin.x as i32;
        let dy = change.abs.y as i32 - self.pointer_origin.y as i32;

        match self.kind {
            MouseDragKind::Move => {
                let raw = move_by(self.origin, dx, dy);
                let workarea = state.root_state().workarea(head);
                let neighbours: Vec<Rect> = state
                    .frames()
                    .filter(|(id, _)| *id != self.target)
                    .map(|(_, f)| f.base.geometry)
                    .collect();
                snap_to_edges(raw, workarea, &neighbours, state.config.edge_snap_width)
            }
            MouseDragKind::Resize(g) => {
                let (west, _east, north, _south) = resize_edges(g);
                let anchor = KeepAnchor {
                    keep_x: !west,
                    keep_y: !north,
                };
                let raw = resize_from_gravity(self.origin, g, dx, dy);
                normalize_candidate(state, self.target, raw, anchor)
            }
        }
    }

    pub fn handle_motion_notify<X: XConnExt>(
        &mut self,
        state: &mut State,
        change: PointerChange,
        x: &X,
    ) -> Result<HandlerOutcome> {
        let head = x.heads()?.into_iter().next().unwrap_or(self.origin);
        let next = self.candidate(state, change, head);
        if self.live {
            apply_geometry(state, self.target, next, x)?;
        }
        self.origin = next;
        self.pointer_origin = change.abs;
        Ok(HandlerOutcome::Processed)
    }

    pub fn handle_button_press(&mut self, _state: &mut State, _ev: ButtonEvent) -> HandlerOutcome {
        HandlerOutcome::Skip
    }

    pub fn handle_button_release<X: XConnExt>(
        &mut self,
        state: &mut State,
        _ev: ButtonEvent,
        x: &X,
    ) -> Result<HandlerOutcome> {
        apply_geometry(state, self.target, self.origin, x)?;
        x.ungrab_pointer()?;
        if !self.live {
            x.ungrab_server()?;
        }
        debug!(target = %self.target, "mouse move/resize released");
        Ok(HandlerOutcome::StopProcessed)
    }

    pub fn handle_key_press<X: XConnExt>(
        &mut self,
        state: &mut State,
        press: KeyPress,
        x: &X,
    ) -> Result<HandlerOutcome> {
        if press.keysym == XKeySym::XK_Escape {
            apply_geometry(state, self.target, original_geometry(state, self.target), x)?;
            x.ungrab_pointer()?;
            if !self.live {
                x.ungrab_server()?;
            }
            return Ok(HandlerOutcome::StopProcessed);
        }
        Ok(HandlerOutcome::Skip)
    }

    pub fn handle_expose(&mut self, _ev: ExposeEvent) -> HandlerOutcome {
        trace!("outline repaint skipped: no renderer in core");
        HandlerOutcome::Processed
    }
}

fn original_geometry(state: &State, id: WoId) -> Rect {
    state
        .registry
        .get(id)
        .and_then(|wo| wo.as_frame())
        .map(|f| f.base.geometry)
        .unwrap_or_default()
}

pub(crate) fn apply_geometry<X: XConnExt>(state: &mut State, id: WoId, geometry: Rect, x: &X) -> Result<()> {
    let Some(active_client) = state.registry.get_mut(id).and_then(|wo| wo.as_frame_mut()).map(|f| {
        f.base.geometry = geometry;
        f.active_client()
    }) else {
        return Ok(());
    };

    if let Some(xid) = state.registry.get(active_client).and_then(|wo| wo.as_client()).map(|c| c.xid) {
        x.configure_window(xid, &[ClientConfig::Position(geometry)])?;
    }
    Ok(())
}

/// Keyboard-driven move/resize, installed by `Action::MoveResize` bound to
/// a key rather than a button.
#[derive(Debug, Clone)]
pub struct KeyboardMoveResize {
    target: WoId,
    origin: Rect,
    current: Rect,
    step: i32,
    gravity: Gravity,
}

impl KeyboardMoveResize {
    pub fn new(target: WoId, origin: Rect, step: i32) -> Self {
        Self {
            target,
            origin,
            current: origin,
            step,
            gravity: Gravity::SouthEast,
        }
    }

    pub fn init<X: XConnExt>(&self, x: &X) -> Result<()> {
        x.grab_keyboard()?;
        x.grab_pointer(Cursor::Move)
    }

    pub fn handle_key_press<X: XConnExt>(
        &mut self,
        state: &mut State,
        press: KeyPress,
        x: &X,
    ) -> Result<HandlerOutcome> {
        let Some(action) = classify_move_resize_key(press, self.step) else {
            return Ok(HandlerOutcome::Skip);
        };

        match action {
            MoveResizeAction::MoveHorizontal(d) => {
                self.current = move_by(self.current, d, 0);
                apply_geometry(state, self.target, self.current, x)?;
                Ok(HandlerOutcome::Processed)
            }
            MoveResizeAction::MoveVertical(d) => {
                self.current = move_by(self.current, 0, d);
                apply_geometry(state, self.target, self.current, x)?;
                Ok(HandlerOutcome::Processed)
            }
            MoveResizeAction::ResizeHorizontal(d) => {
                let raw = resize_from_gravity(self.current, self.gravity, d, 0);
                self.current = normalize_candidate(state, self.target, raw, KeepAnchor { keep_x: true, keep_y: true });
                apply_geometry(state, self.target, self.current, x)?;
                Ok(HandlerOutcome::Processed)
            }
            MoveResizeAction::ResizeVertical(d) => {
                let raw = resize_from_gravity(self.current, self.gravity, 0, d);
                self.current = normalize_candidate(state, self.target, raw, KeepAnchor { keep_x: true, keep_y: true });
                apply_geometry(state, self.target, self.current, x)?;
                Ok(HandlerOutcome::Processed)
            }
            MoveResizeAction::MoveSnap => {
                let neighbours: Vec<Rect> = state
                    .frames()
                    .filter(|(id, _)| *id != self.target)
                    .map(|(_, f)| f.base.geometry)
                    .collect();
                let workarea = state.root_state().workarea(self.current);
                self.current = snap_to_edges(self.current, workarea, &neighbours, state.config.edge_snap_width);
                apply_geometry(state, self.target, self.current, x)?;
                Ok(HandlerOutcome::Processed)
            }
            MoveResizeAction::MoveCancel => {
                apply_geometry(state, self.target, self.origin, x)?;
                end(x)?;
                Ok(HandlerOutcome::StopProcessed)
            }
            MoveResizeAction::MoveEnd => {
                end(x)?;
                Ok(HandlerOutcome::StopProcessed)
            }
        }
    }

    pub fn handle_button_press(&mut self, _state: &mut State, _ev: ButtonEvent) -> HandlerOutcome {
        HandlerOutcome::Skip
    }

    pub fn handle_button_release<X: XConnExt>(&mut self, x: &X, _ev: ButtonEvent) -> Result<HandlerOutcome> {
        end(x)?;
        Ok(HandlerOutcome::StopProcessed)
    }

    pub fn handle_motion_notify(&mut self, _change: PointerChange) -> HandlerOutcome {
        HandlerOutcome::Skip
    }

    pub fn handle_expose(&mut self, _ev: ExposeEvent) -> HandlerOutcome {
        HandlerOutcome::Processed
    }
}

fn end<X: XConnExt>(x: &X) -> Result<()> {
    x.ungrab_keyboard()?;
    x.ungrab_pointer()
}

/// Dragging a client by its tab/title with the intent of grouping it into
/// another frame. On release, a drop
/// inside another frame's bounds attaches the client there; otherwise a
/// new single-client frame is created at the drop point.
#[derive(Debug, Clone)]
pub struct GroupingDrag {
    client: WoId,
    origin_frame: WoId,
    pointer_origin: Point,
}

impl GroupingDrag {
    pub fn new(client: WoId, origin_frame: WoId, pointer_origin: Point) -> Self {
        Self {
            client,
            origin_frame,
            pointer_origin,
        }
    }

    pub fn init<X: XConnExt>(&self, x: &X) -> Result<()> {
        x.grab_pointer(Cursor::Move)
    }

    pub fn handle_motion_notify(&mut self, change: PointerChange) -> HandlerOutcome {
        self.pointer_origin = change.abs;
        HandlerOutcome::Processed
    }

    pub fn handle_key_press<X: XConnExt>(&mut self, x: &X, press: KeyPress) -> Result<HandlerOutcome> {
        if press.keysym == XKeySym::XK_Escape {
            x.ungrab_pointer()?;
            return Ok(HandlerOutcome::StopProcessed);
        }
        Ok(HandlerOutcome::Skip)
    }

    pub fn handle_button_press(&mut self, _ev: ButtonEvent) -> HandlerOutcome {
        HandlerOutcome::Skip
    }

    /// Attach the dragged client into whatever frame the pointer lands on,
    /// or leave it in its own frame if it lands on empty space.
    pub fn handle_button_release<X: XConnExt>(
        &mut self,
        state: &mut State,
        ev: ButtonEvent,
        x: &X,
    ) -> Result<HandlerOutcome> {
        x.ungrab_pointer()?;

        let drop_target = state
            .frames()
            .filter(|(id, _)| *id != self.origin_frame)
            .find(|(_, f)| f.base.geometry.contains_point(ev.abs))
            .map(|(id, _)| id);

        match drop_target {
            Some(dest) => {
                // Detach in place (rather than via `Frame::detach`, which
                // consumes `self` by value) so the origin frame keeps its
                // `WoId` when it survives with remaining tabs; only an
                // emptied frame is removed from the registry outright.
                let frame_emptied = match state.registry.get_mut(self.origin_frame).and_then(|wo| wo.as_frame_mut()) {
                    Some(f) if f.is_empty_after_remove(&self.client) => true,
                    Some(f) => {
                        let (_, remainder) = f.clients.clone().remove(&self.client);
                        if let Some(stack) = remainder {
                            f.clients = stack;
                        }
                        false
                    }
                    None => false,
                };

                if frame_emptied {
                    state.remove_from_stacking(self.origin_frame);
                    state.registry.remove(self.origin_frame);
                }

                if let Some(crate::wo::WindowObject::Frame(f)) = state.registry.get_mut(dest) {
                    f.attach(self.client);
                }
                if let Some(crate::wo::WindowObject::Client(c)) = state.registry.get_mut(self.client) {
                    c.frame_id = Some(dest);
                }
                state.refresh_client_lists();
                debug!(client = %self.client, dest = %dest, "grouping drag attached client");
            }
            None => {
                trace!(client = %self.client, "grouping drag dropped on empty space, leaving frame as-is");
            }
        }

        Ok(HandlerOutcome::StopProcessed)
    }

    pub fn handle_expose(&mut self, _ev: ExposeEvent) -> HandlerOutcome {
        HandlerOutcome::Processed
    }
}

/// A modal handler occupying [`State::modal`] for the duration of a drag
/// or keyboard-driven geometry session.
#[derive(Debug, Clone)]
pub enum ModalHandler {
    MouseMoveResize(MouseMoveResize),
    KeyboardMoveResize(KeyboardMoveResize),
    GroupingDrag(GroupingDrag),
}

impl ModalHandler {
    pub fn key_context(&self) -> crate::bindings::keys::KeyContext {
        crate::bindings::keys::KeyContext::MoveResize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pure::geometry::Rect as R;

    #[test]
    fn resize_from_gravity_south_east_only_grows() {
        let origin = R::new(10, 10, 100, 100);
        let r = resize_from_gravity(origin, Gravity::SouthEast, 20, 5);
        assert_eq!(r, R::new(10, 10, 120, 105));
    }

    #[test]
    fn resize_from_gravity_north_west_moves_and_shrinks() {
        let origin = R::new(10, 10, 100, 100);
        let r = resize_from_gravity(origin, Gravity::NorthWest, 20, 5);
        assert_eq!(r, R::new(30, 15, 80, 95));
    }

    #[test]
    fn move_by_clamps_to_non_negative_origin() {
        let origin = R::new(5, 5, 100, 100);
        let r = move_by(origin, -20, -20);
        assert_eq!(r.x, 0);
        assert_eq!(r.y, 0);
    }

    #[test]
    fn snap_to_edges_snaps_within_threshold() {
        let workarea = R::new(0, 0, 1920, 1080);
        let candidate = R::new(4, 4, 400, 300);
        let snapped = snap_to_edges(candidate, workarea, &[], 10);
        assert_eq!(snapped.x, 0);
        assert_eq!(snapped.y, 0);
    }

    #[test]
    fn snap_to_edges_leaves_far_geometry_alone() {
        let workarea = R::new(0, 0, 1920, 1080);
        let candidate = R::new(500, 500, 400, 300);
        let snapped = snap_to_edges(candidate, workarea, &[], 10);
        assert_eq!(snapped, candidate);
    }

    #[test]
    fn classify_move_resize_key_escape_cancels() {
        let press = KeyPress::new(ModMask::empty(), XKeySym::XK_Escape);
        assert_eq!(classify_move_resize_key(press, 10), Some(MoveResizeAction::MoveCancel));
    }

    #[test]
    fn classify_move_resize_key_shift_left_resizes() {
        let press = KeyPress::new(ModMask::SHIFT, XKeySym::XK_Left);
        assert_eq!(
            classify_move_resize_key(press, 10),
            Some(MoveResizeAction::ResizeHorizontal(-10))
        );
    }
}
