//! The action handler: takes an [`ActionPerformed`]
//! record and dispatches each action in order to a mutator that may touch
//! the target WO, its ancestors, or global state. Every mutator that
//! changes a published bit is responsible for re-publishing it through
//! [`crate::ewmh`] and for routing any geometry change back through the
//! normalizer in [`crate::handlers`], so this module never duplicates
//! either pipeline.
use std::process::{Command, Stdio};

use tracing::{debug, trace, warn};

use crate::{
    action::{Action, ActionEvent, ActionPerformed, OriginatingEvent, StateAction},
    client::CfgDeny,
    ewmh,
    handlers::{
        apply_geometry, move_by, normalize_candidate, resize_from_gravity, GroupingDrag,
        KeyboardMoveResize, ModalHandler, MouseMoveResize,
    },
    pure::{geometry::KeepAnchor, geometry::Point, geometry::Rect, RelativePosition},
    state::State,
    wo::{Layer, Wo, WoId, WindowObject},
    x::XConnExt,
    Result,
};

/// Pixel step used by keyboard-triggered `Move`/`Resize`/`GrowDirection`
/// when no explicit delta is given and by the keyboard move/resize modal
/// handler's default granularity. The original keys this off a themed
/// `MoveResize` option the parser owns; since config parsing is out of
/// scope here this is a fixed, documented
/// fallback instead (recorded as an open decision in DESIGN.md).
const KEYBOARD_STEP: i32 = 10;

/// Run every action in `performed.event` against `performed.target` in
/// order.
pub fn perform<X: XConnExt>(state: &mut State, x: &X, performed: ActionPerformed) -> Result<()> {
    let ActionPerformed {
        target,
        event: ActionEvent { actions },
        originating,
    } = performed;

    for action in actions {
        dispatch_one(state, x, target, &action, originating)?;
    }
    Ok(())
}

fn dispatch_one<X: XConnExt>(
    state: &mut State,
    x: &X,
    target: WoId,
    action: &Action,
    originating: Option<OriginatingEvent>,
) -> Result<()> {
    match action {
        Action::FocusDirection(dir) => focus_direction(state, x, target, *dir),
        Action::FocusMruNext => focus_mru(state, x, target, true),
        Action::FocusMruPrev => focus_mru(state, x, target, false),

        Action::Move { dx, dy } => move_frame(state, x, target, *dx, *dy),
        Action::Resize { dw, dh } => resize_frame(state, x, target, *dw, *dh),
        Action::MoveToEdge(dir) => move_to_edge(state, x, target, *dir),
        Action::MoveToHead(n) => move_to_head(state, x, target, *n),
        Action::GrowDirection(dir) => grow_direction(state, x, target, *dir),
        Action::SetGeometry(rect) => set_geometry(state, x, target, *rect),

        Action::SetMaximizedHorz(how) => set_maximized_horz(state, x, target, *how),
        Action::SetMaximizedVert(how) => set_maximized_vert(state, x, target, *how),
        Action::SetFullscreen(how) => set_fullscreen(state, x, target, *how),
        Action::SetShade(how) => set_shade(state, x, target, *how),
        Action::SetSticky(how) => set_sticky(state, x, target, *how),
        Action::SetStickySkip(how) => set_sticky_skip(state, target, *how),

        Action::Iconify => set_iconified(state, x, target, true),
        Action::Deiconify => set_iconified(state, x, target, false),
        Action::Detach => detach(state, target),
        Action::AttachMarked => {
            trace!("AttachMarked has no marked-window selection model in this core; ignored");
            Ok(())
        }

        Action::GotoWorkspace(n) => {
            state.switch_workspace(*n, x)?;
            Ok(())
        }
        Action::SendToWorkspace(n) => {
            state.move_to_workspace(target, *n);
            state.refresh_client_lists();
            ewmh::publish_client_lists(state, x)
        }
        Action::Warp(n) => warp_to_workspace(state, x, target, *n),

        Action::ShowMenu(kind) => {
            debug!(?kind, "ShowMenu has no in-core menu renderer; deferred to the menu collaborator");
            Ok(())
        }
        Action::FindClient => {
            trace!("FindClient has no in-core search dialog; deferred to the dialog collaborator");
            Ok(())
        }
        Action::GotoClientById(xid) => goto_client_by_xid(state, x, *xid),

        Action::Raise => raise(state, x, target),
        Action::Lower => lower(state, x, target),
        Action::Close => close(state, x, target),

        Action::Reload => {
            debug!("Reload requested; config/theme reload is owned by the embedding binary");
            Ok(())
        }
        Action::Restart => {
            debug!("Restart requested; re-exec is owned by the embedding binary");
            state.running = false;
            Ok(())
        }
        Action::Exit => {
            debug!("Exit requested");
            state.running = false;
            Ok(())
        }

        Action::Exec(cmd) => spawn(cmd),
        Action::ShellExec(cmd) => spawn_shell(cmd),

        Action::MoveResize => start_move_resize(state, x, target, originating),
        Action::GroupingDrag => start_grouping_drag(state, x, target),
    }
}

// --- focus movement ---------------------------------------------------

/// The on-screen center of a frame, used to rank candidates by direction
/// and distance.
fn center(r: Rect) -> Point {
    Point::new(r.x + r.w / 2, r.y + r.h / 2)
}

fn in_direction(from: Point, to: Point, dir: RelativePosition) -> bool {
    match dir {
        RelativePosition::Left => to.x < from.x,
        RelativePosition::Right => to.x > from.x,
        RelativePosition::Above => to.y < from.y,
        RelativePosition::Below => to.y > from.y,
    }
}

fn focus_direction<X: XConnExt>(state: &mut State, x: &X, target: WoId, dir: RelativePosition) -> Result<()> {
    let Some(origin) = state
        .registry
        .get(target)
        .and_then(|wo| wo.as_frame())
        .map(|f| center(f.base.geometry))
    else {
        return Ok(());
    };

    let best = state
        .frames()
        .filter(|(id, _)| *id != target)
        .filter(|(_, f)| f.mapped() && !f.base.iconified)
        .map(|(id, f)| (id, center(f.base.geometry)))
        .filter(|(_, c)| in_direction(origin, *c, dir))
        .min_by_key(|(_, c)| {
            let dx = c.x as i64 - origin.x as i64;
            let dy = c.y as i64 - origin.y as i64;
            dx * dx + dy * dy
        })
        .map(|(id, _)| id);

    match best {
        Some(id) => state.focus(Some(id), x),
        None => Ok(()),
    }
}

fn focus_mru<X: XConnExt>(state: &mut State, x: &X, target: WoId, next: bool) -> Result<()> {
    let order: Vec<WoId> = state.current_workspace().mru_iter().copied().collect();
    if order.is_empty() {
        return Ok(());
    }

    let current = state.focused.unwrap_or(target);
    let pos = order.iter().position(|id| *id == current);
    let new_index = match pos {
        Some(i) if next => (i + 1) % order.len(),
        Some(i) => (i + order.len() - 1) % order.len(),
        None => 0,
    };

    state.focus(Some(order[new_index]), x)
}

// --- geometry -----------------------------------------------------------

/// The head a frame's geometry currently sits on, falling back to the
/// first head.
fn head_for<X: XConnExt>(x: &X, geometry: Rect) -> Result<Rect> {
    let heads = x.heads()?;
    let c = center(geometry);
    Ok(heads
        .iter()
        .find(|h| h.contains_point(c))
        .copied()
        .or_else(|| heads.into_iter().next())
        .unwrap_or(geometry))
}

fn commit_geometry<X: XConnExt>(
    state: &mut State,
    x: &X,
    target: WoId,
    candidate: Rect,
    fullscreen: bool,
) -> Result<()> {
    let head = head_for(x, candidate)?;
    let clamped = if fullscreen {
        candidate.clamp_to_head(head)
    } else {
        let workarea = state.root_state().workarea(head);
        candidate.clamp_to_head(workarea)
    };
    apply_geometry(state, target, clamped, x)?;
    ewmh::publish_wm_state(state, x, target)
}

fn move_frame<X: XConnExt>(state: &mut State, x: &X, target: WoId, dx: i32, dy: i32) -> Result<()> {
    let Some(origin) = frame_geometry(state, target) else {
        return Ok(());
    };
    if !client_allows(state, target, CfgDeny::DENY_MOVE) {
        return Ok(());
    }
    let next = move_by(origin, dx, dy);
    commit_geometry(state, x, target, next, false)
}

fn resize_frame<X: XConnExt>(state: &mut State, x: &X, target: WoId, dw: i32, dh: i32) -> Result<()> {
    let Some(origin) = frame_geometry(state, target) else {
        return Ok(());
    };
    if !client_allows(state, target, CfgDeny::DENY_RESIZE) {
        return Ok(());
    }
    let raw = resize_from_gravity(origin, crate::pure::geometry::Gravity::SouthEast, dw, dh);
    let candidate = normalize_candidate(state, target, raw, KeepAnchor { keep_x: true, keep_y: true });
    commit_geometry(state, x, target, candidate, false)
}

fn move_to_edge<X: XConnExt>(state: &mut State, x: &X, target: WoId, dir: RelativePosition) -> Result<()> {
    let Some(origin) = frame_geometry(state, target) else {
        return Ok(());
    };
    if !client_allows(state, target, CfgDeny::DENY_MOVE) {
        return Ok(());
    }
    let head = head_for(x, origin)?;
    let workarea = state.root_state().workarea(head);

    let mut r = origin;
    match dir {
        RelativePosition::Left => r.x = workarea.x,
        RelativePosition::Right => r.x = workarea.x + workarea.w.saturating_sub(r.w),
        RelativePosition::Above => r.y = workarea.y,
        RelativePosition::Below => r.y = workarea.y + workarea.h.saturating_sub(r.h),
    }
    commit_geometry(state, x, target, r, false)
}

fn move_to_head<X: XConnExt>(state: &mut State, x: &X, target: WoId, n: usize) -> Result<()> {
    let Some(origin) = frame_geometry(state, target) else {
        return Ok(());
    };
    let heads = x.heads()?;
    let Some(dest) = heads.get(n) else {
        return Ok(());
    };
    let current_head = head_for(x, origin)?;
    let dx = dest.x as i32 - current_head.x as i32;
    let dy = dest.y as i32 - current_head.y as i32;
    let moved = move_by(origin, dx, dy);
    let clamped = moved.clamp_to_head(state.root_state().workarea(*dest));
    apply_geometry(state, target, clamped, x)?;
    ewmh::publish_wm_state(state, x, target)
}

/// Grow a single named edge toward the nearest obstacle or workarea
/// boundary, distinct from [`crate::frame::Frame::max_fill`], which grows
/// both edges of an axis symmetrically.
fn grow_direction<X: XConnExt>(state: &mut State, x: &X, target: WoId, dir: RelativePosition) -> Result<()> {
    let Some(origin) = frame_geometry(state, target) else {
        return Ok(());
    };
    if !client_allows(state, target, CfgDeny::DENY_RESIZE) {
        return Ok(());
    }
    let head = head_for(x, origin)?;
    let workarea = state.root_state().workarea(head);
    let obstacles: Vec<Rect> = state
        .frames()
        .filter(|(id, _)| *id != target)
        .map(|(_, f)| f.base.geometry)
        .collect();

    let mut r = origin;
    match dir {
        RelativePosition::Left => {
            let edge = obstacles
                .iter()
                .filter(|o| o.y < r.y + r.h && o.y + o.h > r.y && o.x + o.w <= r.x)
                .map(|o| o.x + o.w)
                .max()
                .unwrap_or(workarea.x);
            r.w = (r.x + r.w).saturating_sub(edge);
            r.x = edge;
        }
        RelativePosition::Right => {
            let edge = obstacles
                .iter()
                .filter(|o| o.y < r.y + r.h && o.y + o.h > r.y && o.x >= r.x + r.w)
                .map(|o| o.x)
                .min()
                .unwrap_or(workarea.x + workarea.w);
            r.w = edge.saturating_sub(r.x);
        }
        RelativePosition::Above => {
            let edge = obstacles
                .iter()
                .filter(|o| o.x < r.x + r.w && o.x + o.w > r.x && o.y + o.h <= r.y)
                .map(|o| o.y + o.h)
                .max()
                .unwrap_or(workarea.y);
            r.h = (r.y + r.h).saturating_sub(edge);
            r.y = edge;
        }
        RelativePosition::Below => {
            let edge = obstacles
                .iter()
                .filter(|o| o.x < r.x + r.w && o.x + o.w > r.x && o.y >= r.y + r.h)
                .map(|o| o.y)
                .min()
                .unwrap_or(workarea.y + workarea.h);
            r.h = edge.saturating_sub(r.y);
        }
    }

    let anchor = match dir {
        RelativePosition::Left => KeepAnchor { keep_x: false, keep_y: true },
        RelativePosition::Right => KeepAnchor { keep_x: true, keep_y: true },
        RelativePosition::Above => KeepAnchor { keep_x: true, keep_y: false },
        RelativePosition::Below => KeepAnchor { keep_x: true, keep_y: true },
    };
    let candidate = normalize_candidate(state, target, r, anchor);
    commit_geometry(state, x, target, candidate, false)
}

fn set_geometry<X: XConnExt>(state: &mut State, x: &X, target: WoId, rect: Rect) -> Result<()> {
    if !client_allows(state, target, CfgDeny::DENY_MOVE | CfgDeny::DENY_RESIZE) {
        return Ok(());
    }
    let candidate = normalize_candidate(state, target, rect, KeepAnchor { keep_x: true, keep_y: true });
    commit_geometry(state, x, target, candidate, false)
}

fn frame_geometry(state: &State, target: WoId) -> Option<Rect> {
    state.registry.get(target).and_then(|wo| wo.as_frame()).map(|f| f.base.geometry)
}

/// Whether the active client of `target`'s frame permits `deny`.
fn client_allows(state: &State, target: WoId, deny: CfgDeny) -> bool {
    let Some(frame) = state.registry.get(target).and_then(|wo| wo.as_frame()) else {
        return true;
    };
    state
        .registry
        .get(frame.active_client())
        .and_then(|wo| wo.as_client())
        .map(|c| c.allows(deny))
        .unwrap_or(true)
}

// --- state toggles --------------------------------------------------

fn resolve(how: StateAction, current: bool) -> bool {
    match how {
        StateAction::Set => true,
        StateAction::Unset => false,
        StateAction::Toggle => !current,
    }
}

fn set_maximized_horz<X: XConnExt>(state: &mut State, x: &X, target: WoId, how: StateAction) -> Result<()> {
    if !client_allows(state, target, CfgDeny::DENY_MAXIMIZE_HORZ) {
        return force_unset_maximized_horz(state, x, target);
    }
    let Some(origin) = frame_geometry(state, target) else {
        return Ok(());
    };
    let head = head_for(x, origin)?;
    let workarea = state.root_state().workarea(head);
    let max_w = max_size_hint(state, target).map(|(w, _)| w);

    let currently = state.registry.get(target).and_then(|wo| wo.as_frame()).map(|f| f.base.maximized_horz).unwrap_or(false);
    let want = resolve(how, currently);

    if let Some(frame) = state.registry.get_mut(target).and_then(|wo| wo.as_frame_mut()) {
        if want {
            frame.set_maximized_horz(workarea, max_w);
        } else {
            frame.unset_maximized_horz();
        }
    }
    let geom = frame_geometry(state, target).unwrap_or(origin);
    apply_geometry(state, target, geom, x)?;
    ewmh::publish_wm_state(state, x, target)
}

fn force_unset_maximized_horz<X: XConnExt>(state: &mut State, x: &X, target: WoId) -> Result<()> {
    if let Some(frame) = state.registry.get_mut(target).and_then(|wo| wo.as_frame_mut()) {
        frame.unset_maximized_horz();
    }
    ewmh::publish_wm_state(state, x, target)
}

fn set_maximized_vert<X: XConnExt>(state: &mut State, x: &X, target: WoId, how: StateAction) -> Result<()> {
    if !client_allows(state, target, CfgDeny::DENY_MAXIMIZE_VERT) {
        if let Some(frame) = state.registry.get_mut(target).and_then(|wo| wo.as_frame_mut()) {
            frame.unset_maximized_vert();
        }
        return ewmh::publish_wm_state(state, x, target);
    }
    let Some(origin) = frame_geometry(state, target) else {
        return Ok(());
    };
    let head = head_for(x, origin)?;
    let workarea = state.root_state().workarea(head);
    let max_h = max_size_hint(state, target).map(|(_, h)| h);

    let currently = state.registry.get(target).and_then(|wo| wo.as_frame()).map(|f| f.base.maximized_vert).unwrap_or(false);
    let want = resolve(how, currently);

    if let Some(frame) = state.registry.get_mut(target).and_then(|wo| wo.as_frame_mut()) {
        if want {
            frame.set_maximized_vert(workarea, max_h);
        } else {
            frame.unset_maximized_vert();
        }
    }
    let geom = frame_geometry(state, target).unwrap_or(origin);
    apply_geometry(state, target, geom, x)?;
    ewmh::publish_wm_state(state, x, target)
}

fn max_size_hint(state: &State, target: WoId) -> Option<(u32, u32)> {
    let frame = state.registry.get(target).and_then(|wo| wo.as_frame())?;
    state.registry.get(frame.active_client()).and_then(|wo| wo.as_client())?.size_hints.max
}

fn set_fullscreen<X: XConnExt>(state: &mut State, x: &X, target: WoId, how: StateAction) -> Result<()> {
    if !client_allows(state, target, CfgDeny::DENY_STATE_FULLSCREEN) {
        return Ok(());
    }
    let Some(origin) = frame_geometry(state, target) else {
        return Ok(());
    };
    let head = head_for(x, origin)?;
    let above_dock = state.config.fullscreen_above_on_raise.then_some(Layer::AboveDock);

    let currently = state.registry.get(target).and_then(|wo| wo.as_frame()).map(|f| f.base.fullscreen).unwrap_or(false);
    let want = resolve(how, currently);

    if let Some(frame) = state.registry.get_mut(target).and_then(|wo| wo.as_frame_mut()) {
        if want {
            frame.set_fullscreen(head, above_dock);
        } else {
            frame.unset_fullscreen();
        }
    }
    let geom = frame_geometry(state, target).unwrap_or(origin);
    apply_geometry(state, target, geom, x)?;
    ewmh::publish_wm_state(state, x, target)
}

fn set_shade<X: XConnExt>(state: &mut State, x: &X, target: WoId, how: StateAction) -> Result<()> {
    if !client_allows(state, target, CfgDeny::DENY_SHADE) {
        return Ok(());
    }
    let currently = state.registry.get(target).and_then(|wo| wo.as_frame()).map(|f| f.base.shaded).unwrap_or(false);
    let want = resolve(how, currently);

    if let Some(frame) = state.registry.get_mut(target).and_then(|wo| wo.as_frame_mut()) {
        if want {
            frame.set_shade();
        } else {
            frame.unset_shade();
        }
    }
    ewmh::publish_wm_state(state, x, target)
}

fn set_sticky<X: XConnExt>(state: &mut State, x: &X, target: WoId, how: StateAction) -> Result<()> {
    if !client_allows(state, target, CfgDeny::DENY_STICK) {
        return Ok(());
    }
    let currently = state.registry.get(target).map(|wo| wo.workspace().is_none()).unwrap_or(false);
    let want = resolve(how, currently);
    state.set_sticky(target, want);
    ewmh::publish_wm_state(state, x, target)
}

fn set_sticky_skip(state: &mut State, target: WoId, how: StateAction) -> Result<()> {
    use crate::wo::SkipFlags;
    let Some(wo) = state.registry.get_mut(target) else {
        return Ok(());
    };
    let skip = match wo {
        WindowObject::Client(c) => &mut c.base.skip,
        WindowObject::Frame(f) => &mut f.base.skip,
        _ => return Ok(()),
    };
    let currently = skip.contains(SkipFlags::SKIP_FOCUS_TOGGLE);
    skip.set(SkipFlags::SKIP_FOCUS_TOGGLE, resolve(how, currently));
    Ok(())
}

fn set_iconified<X: XConnExt>(state: &mut State, x: &X, target: WoId, iconified: bool) -> Result<()> {
    if iconified && !client_allows(state, target, CfgDeny::DENY_ICONIFY) {
        return Ok(());
    }
    if let Some(frame) = state.registry.get_mut(target).and_then(|wo| wo.as_frame_mut()) {
        frame.base.iconified = iconified;
    }
    if let Some(xid) = state.window_xid(target) {
        if iconified {
            x.unmap(xid)?;
        } else {
            x.map(xid)?;
        }
    }
    if iconified && state.focused == Some(target) {
        state.focus(None, x)?;
    }
    ewmh::publish_wm_state(state, x, target)
}

// --- frame composition ------------------------------------------------

/// Detach the active client of `target`'s frame into its own new frame
/// placed at a fixed offset from the origin frame. The new frame's creation
/// (registry insertion, initial stacking) mirrors how
/// [`GroupingDrag::handle_button_release`] already folds an emptied frame
/// out of the registry, run in reverse.
fn detach(state: &mut State, target: WoId) -> Result<()> {
    const DETACH_OFFSET: i32 = 24;

    let Some((client, origin_geom)) = state
        .registry
        .get(target)
        .and_then(|wo| wo.as_frame())
        .map(|f| (f.active_client(), f.base.geometry))
    else {
        return Ok(());
    };

    let frame_emptied = match state.registry.get_mut(target).and_then(|wo| wo.as_frame_mut()) {
        Some(f) if f.is_empty_after_remove(&client) => true,
        Some(f) => {
            let (_, remainder) = f.clients.clone().remove(&client);
            if let Some(stack) = remainder {
                f.clients = stack;
            }
            false
        }
        None => return Ok(()),
    };

    if frame_emptied {
        // A single-client frame has nothing left to detach from.
        return Ok(());
    }

    let new_geom = move_by(origin_geom, DETACH_OFFSET, DETACH_OFFSET);
    let new_frame = crate::frame::Frame::new(
        WoId { index: 0, generation: 0 },
        new_geom,
        client,
    );
    let new_id = state.registry.insert(None, WindowObject::Frame(new_frame));
    // The placeholder id baked into `Frame::new` is cosmetic; fix it up to
    // the id the registry actually assigned.
    if let Some(crate::wo::WindowObject::Frame(f)) = state.registry.get_mut(new_id) {
        f.base.id = new_id;
    }
    if let Some(crate::wo::WindowObject::Client(c)) = state.registry.get_mut(client) {
        c.frame_id = Some(new_id);
    }
    state.insert_into_stacking(new_id);
    state.refresh_client_lists();
    debug!(client = %client, new_frame = %new_id, "detached client into new frame");
    Ok(())
}

// --- workspace ----------------------------------------------------------

fn warp_to_workspace<X: XConnExt>(state: &mut State, x: &X, target: WoId, dir_count: usize) -> Result<()> {
    let n = state.current_workspace;
    let count = state.workspaces.len();
    if count == 0 {
        return Ok(());
    }
    let dest = (n + dir_count) % count;

    if state.registry.contains(target) && state.registry.get(target).and_then(|wo| wo.as_frame()).is_some() {
        state.move_to_workspace(target, dest);
    }
    state.switch_workspace(dest, x)
}

fn goto_client_by_xid<X: XConnExt>(state: &mut State, x: &X, xid: crate::Xid) -> Result<()> {
    let Some((id, _)) = state.clients().find(|(_, c)| c.xid == xid) else {
        return Ok(());
    };
    if let Some(frame) = state.frame_of_client(id) {
        if let Some(ws) = state.registry.get(frame).and_then(|wo| wo.workspace()) {
            state.switch_workspace(ws, x)?;
        }
        state.focus(Some(frame), x)?;
    }
    Ok(())
}

// --- stacking -----------------------------------------------------------

fn raise<X: XConnExt>(state: &mut State, x: &X, target: WoId) -> Result<()> {
    if !client_allows(state, target, CfgDeny::DENY_STACKING) {
        return Ok(());
    }
    state.raise(target);
    restack_on_wire(state, x, target)?;
    ewmh::publish_client_lists(state, x)
}

fn lower<X: XConnExt>(state: &mut State, x: &X, target: WoId) -> Result<()> {
    if !client_allows(state, target, CfgDeny::DENY_STACKING) {
        return Ok(());
    }
    state.lower(target);
    restack_on_wire(state, x, target)?;
    ewmh::publish_client_lists(state, x)
}

/// Push the in-memory stacking order for the target's workspace out to the
/// X server by restacking every sibling `ClientConfig::StackBelow` the one
/// above it, bottom to top.
fn restack_on_wire<X: XConnExt>(state: &State, x: &X, target: WoId) -> Result<()> {
    let Some(ws) = state.registry.get(target).and_then(|wo| wo.workspace()) else {
        return Ok(());
    };
    let order: Vec<crate::Xid> = state
        .workspace(ws)
        .iter()
        .filter_map(|&id| state.window_xid(id))
        .collect();

    let mut prev: Option<crate::Xid> = None;
    for xid in order {
        if let Some(below) = prev {
            x.configure_window(xid, &[crate::x::ClientConfig::StackAbove(below)])?;
        }
        prev = Some(xid);
    }
    Ok(())
}

fn close<X: XConnExt>(state: &mut State, x: &X, target: WoId) -> Result<()> {
    if !client_allows(state, target, CfgDeny::DENY_CLOSE) {
        return Ok(());
    }
    let Some(frame) = state.registry.get(target).and_then(|wo| wo.as_frame()) else {
        return Ok(());
    };
    let client_id = frame.active_client();
    let Some(xid) = state.registry.get(client_id).and_then(|wo| wo.as_client()).map(|c| c.xid) else {
        return Ok(());
    };

    if x.client_supports_protocol(xid, "WM_DELETE_WINDOW").unwrap_or(false) {
        let msg = crate::x::event::ClientMessageKind::DeleteWindow(xid).as_message(x)?;
        x.send_client_message(msg)
    } else {
        x.kill(xid)
    }
}

// --- modal handlers -------------------------------------------------

fn start_move_resize<X: XConnExt>(
    state: &mut State,
    x: &X,
    target: WoId,
    originating: Option<OriginatingEvent>,
) -> Result<()> {
    let Some(origin) = frame_geometry(state, target) else {
        return Ok(());
    };

    let handler = match originating {
        Some(OriginatingEvent::Button) => {
            let pointer_origin = x.cursor_position()?;
            let modal = MouseMoveResize::new(target, None, origin, pointer_origin, !state.config.wire_move);
            modal.init(x)?;
            ModalHandler::MouseMoveResize(modal)
        }
        _ => {
            let modal = KeyboardMoveResize::new(target, origin, KEYBOARD_STEP);
            modal.init(x)?;
            ModalHandler::KeyboardMoveResize(modal)
        }
    };

    state.modal = Some(handler);
    Ok(())
}

fn start_grouping_drag<X: XConnExt>(state: &mut State, x: &X, target: WoId) -> Result<()> {
    let Some(frame) = state.registry.get(target).and_then(|wo| wo.as_frame()) else {
        return Ok(());
    };
    let client = frame.active_client();
    let pointer_origin = x.cursor_position()?;

    let modal = GroupingDrag::new(client, target, pointer_origin);
    modal.init(x)?;
    state.modal = Some(ModalHandler::GroupingDrag(modal));
    Ok(())
}

// --- external processes -----------------------------------------------

/// Run an external command with no shell interpretation, redirecting
/// stdout/stderr to avoid interfering with the WM's own terminal.
fn spawn(cmd: &str) -> Result<()> {
    let parts: Vec<&str> = cmd.split_whitespace().collect();
    let Some(program) = parts.first() else {
        return Ok(());
    };

    let result = Command::new(program)
        .args(&parts[1..])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    if let Err(e) = result {
        warn!(cmd, error = %e, "failed to spawn subprocess");
    }
    Ok(())
}

/// Run a command through `sh -c`, used when the bound string itself needs
/// shell features (pipes, globs, `&&`) rather than a single `exec`.
fn spawn_shell(cmd: &str) -> Result<()> {
    let result = Command::new("sh")
        .arg("-c")
        .arg(cmd)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    if let Err(e) = result {
        warn!(cmd, error = %e, "failed to spawn shell subprocess");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        action::ActionEvent,
        client::Client,
        frame::Frame,
        harbour::NoHarbour,
        pure::geometry::Rect as R,
        theme::BuiltinTheme,
        wo::WindowObject,
        x::mock::MockXConn,
        Xid,
    };

    #[derive(Default)]
    struct TestXConn;

    impl MockXConn for TestXConn {
        fn mock_heads(&self) -> Result<Vec<R>> {
            Ok(vec![R::new(0, 0, 1920, 1080)])
        }
        fn mock_cursor_position(&self) -> Result<Point> {
            Ok(Point::new(0, 0))
        }
        fn mock_configure_window(&self, _id: Xid, _data: &[crate::x::ClientConfig]) -> Result<()> {
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
        fn mock_set_prop(&self, _id: Xid, _name: &str, _val: crate::x::property::Prop) -> Result<()> {
            Ok(())
        }
        fn mock_delete_prop(&self, _id: Xid, _prop_name: &str) -> Result<()> {
            Ok(())
        }
    }

    fn state_with_frame() -> (State, WoId) {
        let mut state = State::new(crate::config::Config::default(), Box::new(BuiltinTheme::default()), Box::new(NoHarbour));
        let client_id = state.registry.insert(
            Some(Xid(100)),
            WindowObject::Client(Client::new(WoId { index: 0, generation: 0 }, Xid(100), R::new(100, 100, 200, 150))),
        );
        let frame_id = state.registry.insert(
            None,
            WindowObject::Frame(Frame::new(WoId { index: 0, generation: 0 }, R::new(100, 100, 200, 150), client_id)),
        );
        if let Some(WindowObject::Frame(f)) = state.registry.get_mut(frame_id) {
            f.base.id = frame_id;
        }
        if let Some(WindowObject::Client(c)) = state.registry.get_mut(client_id) {
            c.frame_id = Some(frame_id);
        }
        state.insert_into_stacking(frame_id);
        (state, frame_id)
    }

    #[test]
    fn move_action_shifts_frame_geometry() {
        let (mut state, frame_id) = state_with_frame();
        let x = TestXConn::default();

        perform(
            &mut state,
            &x,
            ActionPerformed::new(frame_id, ActionEvent::single(Action::Move { dx: 10, dy: 5 }), None),
        )
        .unwrap();

        let g = frame_geometry(&state, frame_id).unwrap();
        assert_eq!((g.x, g.y), (110, 105));
    }

    #[test]
    fn move_is_rejected_when_client_denies_it() {
        let (mut state, frame_id) = state_with_frame();
        let x = TestXConn::default();
        let client_id = state.registry.get(frame_id).unwrap().as_frame().unwrap().active_client();
        if let Some(WindowObject::Client(c)) = state.registry.get_mut(client_id) {
            c.cfg_deny.insert(CfgDeny::DENY_MOVE);
        }

        perform(
            &mut state,
            &x,
            ActionPerformed::new(frame_id, ActionEvent::single(Action::Move { dx: 10, dy: 5 }), None),
        )
        .unwrap();

        let g = frame_geometry(&state, frame_id).unwrap();
        assert_eq!((g.x, g.y), (100, 100));
    }

    #[test]
    fn set_fullscreen_clamps_to_the_head_extent() {
        let (mut state, frame_id) = state_with_frame();
        let x = TestXConn::default();

        perform(
            &mut state,
            &x,
            ActionPerformed::new(frame_id, ActionEvent::single(Action::SetFullscreen(StateAction::Set)), None),
        )
        .unwrap();

        let g = frame_geometry(&state, frame_id).unwrap();
        assert_eq!(g, R::new(0, 0, 1920, 1080));
    }

    #[test]
    fn move_to_edge_left_snaps_x_to_the_workarea_origin() {
        let (mut state, frame_id) = state_with_frame();
        let x = TestXConn::default();

        perform(
            &mut state,
            &x,
            ActionPerformed::new(frame_id, ActionEvent::single(Action::MoveToEdge(RelativePosition::Left)), None),
        )
        .unwrap();

        let g = frame_geometry(&state, frame_id).unwrap();
        assert_eq!(g.x, 0);
        assert_eq!(g.y, 100);
    }

    #[test]
    fn raise_action_moves_frame_to_the_top_of_its_band() {
        let (mut state, frame_id) = state_with_frame();
        let x = TestXConn::default();

        let other_client = state.registry.insert(
            Some(Xid(200)),
            WindowObject::Client(Client::new(WoId { index: 0, generation: 0 }, Xid(200), R::new(0, 0, 50, 50))),
        );
        let other_frame = state.registry.insert(
            None,
            WindowObject::Frame(Frame::new(WoId { index: 0, generation: 0 }, R::new(0, 0, 50, 50), other_client)),
        );
        if let Some(WindowObject::Frame(f)) = state.registry.get_mut(other_frame) {
            f.base.id = other_frame;
        }
        state.insert_into_stacking(other_frame);

        perform(&mut state, &x, ActionPerformed::new(frame_id, ActionEvent::single(Action::Raise), None)).unwrap();

        let top = *state.current_workspace().top().unwrap();
        assert_eq!(top, frame_id);
    }
}
