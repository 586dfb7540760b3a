//! Client lifecycle: creation on `MapRequest`/startup scan, and teardown
//! on `DestroyNotify`.
use tracing::{debug, trace};

use crate::{
    autoprops::{ApplyScope, AutoPropAction},
    client::{ClassHint, Client},
    config::PlacementStrategy,
    ewmh,
    frame::Frame,
    pure::geometry::Rect,
    state::State,
    wo::{Layer, Wo, WoId, WindowObject},
    x::{
        property::{MapState, Prop},
        query,
        ClientConfig, XConnExt,
    },
    Result, Xid,
};

/// Hints read off a top-level window before it is wrapped in a frame.
struct ClientHints {
    class_hint: ClassHint,
    role: Option<String>,
    title: String,
    wm_hints: crate::client::WmHints,
    size_hints: crate::pure::geometry::SizeHints,
    transient_for: Option<Xid>,
    strut: crate::Strut,
    requested_geometry: Rect,
}

fn read_hints<X: XConnExt>(x: &X, xid: Xid) -> Result<ClientHints> {
    let class_hint = match x.get_prop(xid, "WM_CLASS")? {
        Some(Prop::UTF8String(mut strs)) if !strs.is_empty() => {
            let class = strs.pop().unwrap_or_default();
            let instance = strs.pop().unwrap_or_default();
            ClassHint { instance, class }
        }
        _ => ClassHint::default(),
    };

    let role = match query::str_prop("WM_WINDOW_ROLE", xid, x)? {
        Some(mut strs) if !strs.is_empty() => Some(strs.remove(0)),
        _ => None,
    };

    let title = x.window_title(xid)?;

    let wm_hints = match x.get_prop(xid, "WM_HINTS")? {
        Some(Prop::WmHints(h)) => h.to_client_hints(),
        _ => crate::client::WmHints {
            input: true,
            ..Default::default()
        },
    };

    let size_hints = match x.get_prop(xid, "WM_NORMAL_HINTS")? {
        Some(Prop::WmNormalHints(h)) => h,
        _ => Default::default(),
    };

    let transient_for = match x.get_prop(xid, "WM_TRANSIENT_FOR")? {
        Some(Prop::Window(ids)) => ids.into_iter().next(),
        _ => None,
    };

    let strut = match x.get_prop(xid, "_NET_WM_STRUT")? {
        Some(Prop::Bytes(v)) if v.len() >= 4 => crate::Strut::new(v[0], v[1], v[2], v[3]),
        _ => crate::Strut::default(),
    };

    let requested_geometry = x.client_geometry(xid).unwrap_or(Rect::new(0, 0, 1, 1));

    Ok(ClientHints {
        class_hint,
        role,
        title,
        wm_hints,
        size_hints,
        transient_for,
        strut,
        requested_geometry,
    })
}

/// Scan every already-mapped top-level window at startup and manage the
/// ones this window manager should take over.
pub fn scan_existing<X: XConnExt>(state: &mut State, x: &X) -> Result<()> {
    for xid in x.existing_top_level_windows()? {
        let attrs = x.get_window_attributes(xid)?;
        if !attrs.should_manage() || attrs.map_state == MapState::Unmapped {
            continue;
        }
        manage(state, x, xid, ApplyScope::APPLY_ON_START)?;
    }
    Ok(())
}

/// Handle a `MapRequest` for a top-level window: manage it if it isn't
/// already, then map it.
pub fn handle_map_request<X: XConnExt>(state: &mut State, x: &X, xid: Xid) -> Result<()> {
    if state.registry.by_xid(xid).is_some() {
        x.map(xid)?;
        return Ok(());
    }

    let attrs = x.get_window_attributes(xid)?;
    if !attrs.should_manage() {
        x.map(xid)?;
        return Ok(());
    }

    manage(state, x, xid, ApplyScope::APPLY_ON_NEW)
}

fn placement_geometry<X: XConnExt>(
    state: &State,
    x: &X,
    hints: &ClientHints,
    workarea: Rect,
) -> Result<Rect> {
    let (base_w, base_h) = hints.size_hints.base.unwrap_or((
        if hints.requested_geometry.w > 1 { hints.requested_geometry.w } else { 200 },
        if hints.requested_geometry.h > 1 { hints.requested_geometry.h } else { 150 },
    ));
    let (w, h) = hints.size_hints.normalize(base_w, base_h);

    let pointer = x.cursor_position().unwrap_or(crate::pure::geometry::Point::new(
        workarea.x + workarea.w / 2,
        workarea.y + workarea.h / 2,
    ));

    for strategy in &state.config.placement {
        let candidate = match strategy {
            PlacementStrategy::MouseCentered => Rect::new(
                pointer.x.saturating_sub(w / 2).max(workarea.x),
                pointer.y.saturating_sub(h / 2).max(workarea.y),
                w,
                h,
            ),
            PlacementStrategy::MouseTopLeft => Rect::new(pointer.x, pointer.y, w, h),
            PlacementStrategy::Cascade => {
                let n = state.frames().count() as u32;
                let offset = 20 * (n % 10);
                Rect::new(workarea.x + offset, workarea.y + offset, w, h)
            }
            PlacementStrategy::Smart => {
                let occupied: Vec<Rect> = state
                    .frames()
                    .filter(|(_, f)| f.mapped() && !f.base.iconified)
                    .map(|(_, f)| f.base.geometry)
                    .collect();
                let step = 40;
                let mut found = None;
                let mut y = workarea.y;
                'search: while y + h <= workarea.y + workarea.h {
                    let mut xp = workarea.x;
                    while xp + w <= workarea.x + workarea.w {
                        let candidate = Rect::new(xp, y, w, h);
                        if !occupied.iter().any(|o| o.overlaps(&candidate)) {
                            found = Some(candidate);
                            break 'search;
                        }
                        xp += step;
                    }
                    y += step;
                }
                match found {
                    Some(r) => r,
                    None => continue,
                }
            }
        };
        return Ok(candidate.clamp_to_head(workarea));
    }

    Ok(Rect::new(workarea.x, workarea.y, w, h).clamp_to_head(workarea))
}

/// Find an existing frame eligible to take a new client into its group.
fn find_group_frame(state: &State, group_name: &str, max: u32) -> Option<WoId> {
    state
        .frames()
        .find(|(_, f)| f.decor.decor_name == group_name && (f.clients.len() as u32) < max.max(1))
        .map(|(id, _)| id)
}

fn manage<X: XConnExt>(state: &mut State, x: &X, xid: Xid, scope: ApplyScope) -> Result<()> {
    let hints = read_hints(x, xid)?;

    let action = state
        .autoprops
        .matching(&hints.class_hint, hints.role.as_deref(), &hints.title, scope)
        .cloned();

    let head = x.heads()?.into_iter().next().ok_or(crate::Error::NoScreens)?;
    let workarea = state.root_state().workarea(head);

    let geometry = match action.as_ref().and_then(|a| a.geometry) {
        Some(g) => g,
        None if action.as_ref().and_then(|a| a.place_new) == Some(false) => hints.requested_geometry,
        None => placement_geometry(state, x, &hints, workarea)?,
    };

    let client_id = state.registry.insert(Some(xid), WindowObject::Client(Client::new(
        WoId { index: 0, generation: 0 },
        xid,
        geometry,
    )));
    if let Some(WindowObject::Client(c)) = state.registry.get_mut(client_id) {
        c.base.id = client_id;
        c.class_hint = hints.class_hint.clone();
        c.wm_role = hints.role.clone();
        c.title_real = hints.title.clone();
        c.wm_hints = hints.wm_hints;
        c.size_hints = hints.size_hints;
        c.transient_for = hints.transient_for;
        c.strut = hints.strut;
        c.base.iconified = hints.wm_hints.initial_iconic;
    }

    let existing_group_frame = action
        .as_ref()
        .and_then(|a| a.group.as_ref())
        .and_then(|group| find_group_frame(state, &group.name, group.max));

    let frame_id = match existing_group_frame {
        Some(frame_id) => {
            if let Some(WindowObject::Frame(f)) = state.registry.get_mut(frame_id) {
                f.attach(client_id);
            }
            if let Some(WindowObject::Client(c)) = state.registry.get_mut(client_id) {
                c.frame_id = Some(frame_id);
            }
            frame_id
        }
        None => {
            let frame_id = state.registry.insert(
                None,
                WindowObject::Frame(Frame::new(
                    WoId { index: 0, generation: 0 },
                    geometry,
                    client_id,
                )),
            );
            if let Some(WindowObject::Frame(f)) = state.registry.get_mut(frame_id) {
                f.base.id = frame_id;
                f.base.workspace = state.current_workspace as i32;
            }
            if let Some(WindowObject::Client(c)) = state.registry.get_mut(client_id) {
                c.frame_id = Some(frame_id);
            }
            frame_id
        }
    };

    if let Some(action) = &action {
        apply_autoprop_action(state, frame_id, client_id, action, head);
    }

    state.insert_into_stacking(frame_id);

    let decor = state
        .registry
        .get(frame_id)
        .and_then(|wo| wo.as_frame())
        .map(|f| f.decoration_extent(state.config.border_width, state.config.title_height))
        .unwrap_or_default();
    let client_geometry = decor.inset(geometry);
    x.configure_window(xid, &[ClientConfig::Position(client_geometry)])?;
    x.map(xid)?;
    if let Some(WindowObject::Client(c)) = state.registry.get_mut(client_id) {
        c.base.mapped = true;
    }
    if let Some(WindowObject::Frame(f)) = state.registry.get_mut(frame_id) {
        f.base.mapped = true;
    }

    state.refresh_client_lists();
    ewmh::publish_client_lists(state, x)?;
    ewmh::publish_wm_state(state, x, frame_id)?;

    let focusable = state
        .registry
        .get(client_id)
        .map(|wo| wo.focusable())
        .unwrap_or(false);
    if focusable && !hints.wm_hints.initial_iconic {
        state.focus(Some(frame_id), x)?;
    }

    debug!(client = %client_id, frame = %frame_id, "managed new client");
    Ok(())
}

fn apply_autoprop_action(
    state: &mut State,
    frame_id: WoId,
    client_id: WoId,
    action: &AutoPropAction,
    head: Rect,
) {
    let workarea = state.root_state().workarea(head);
    if let Some(n) = action.workspace {
        if let Some(WindowObject::Frame(f)) = state.registry.get_mut(frame_id) {
            f.base.workspace = n as i32;
        }
    }
    if let Some(sticky) = action.sticky {
        if let Some(WindowObject::Frame(f)) = state.registry.get_mut(frame_id) {
            f.base.sticky = sticky;
        }
    }
    if action.shaded == Some(true) {
        if let Some(WindowObject::Frame(f)) = state.registry.get_mut(frame_id) {
            f.set_shade();
        }
    }
    if let Some(border) = action.border {
        if let Some(WindowObject::Frame(f)) = state.registry.get_mut(frame_id) {
            f.decor.has_border = border;
        }
    }
    if let Some(titlebar) = action.titlebar {
        if let Some(WindowObject::Frame(f)) = state.registry.get_mut(frame_id) {
            f.decor.has_titlebar = titlebar;
        }
    }
    if let Some(layer) = action.layer {
        if let Some(WindowObject::Frame(f)) = state.registry.get_mut(frame_id) {
            f.base.layer = layer;
        }
    }
    if let Some(name) = &action.decor_name {
        if let Some(WindowObject::Frame(f)) = state.registry.get_mut(frame_id) {
            f.decor.decor_name = name.clone();
        }
    }
    if action.iconified == Some(true) {
        if let Some(WindowObject::Frame(f)) = state.registry.get_mut(frame_id) {
            f.base.iconified = true;
        }
    }
    if action.fullscreen == Some(true) {
        if let Some(WindowObject::Frame(f)) = state.registry.get_mut(frame_id) {
            let above = if state.config.fullscreen_above_on_raise { Some(Layer::AboveDock) } else { None };
            f.set_fullscreen(head, above);
        }
    }
    if let Some(horz) = action.maximized_horz {
        if let Some(WindowObject::Frame(f)) = state.registry.get_mut(frame_id) {
            if horz {
                f.set_maximized_horz(workarea, None);
            } else {
                f.unset_maximized_horz();
            }
        }
    }
    if let Some(vert) = action.maximized_vert {
        if let Some(WindowObject::Frame(f)) = state.registry.get_mut(frame_id) {
            if vert {
                f.set_maximized_vert(workarea, None);
            } else {
                f.unset_maximized_vert();
            }
        }
    }
    if let Some(skip) = action.skip {
        if let Some(WindowObject::Client(c)) = state.registry.get_mut(client_id) {
            c.base.skip = skip;
        }
    }
    if let Some(focusable) = action.focusable {
        if let Some(WindowObject::Client(c)) = state.registry.get_mut(client_id) {
            c.wm_hints.input = focusable;
        }
    }
    if let Some(deny) = action.cfg_deny {
        if let Some(WindowObject::Client(c)) = state.registry.get_mut(client_id) {
            c.cfg_deny = deny;
        }
    }
    if action.opacity.is_some() {
        trace!("opacity autoproperty accepted but has no WoBase field to apply to yet");
    }
}

/// Re-evaluate autoproperty rules under `scope` against every live client,
/// applying any bits the matching rule flips.
pub fn reevaluate_autoprops<X: XConnExt>(state: &mut State, x: &X, scope: ApplyScope) -> Result<()> {
    let head = x.heads()?.into_iter().next().unwrap_or(Rect::new(0, 0, 1, 1));
    let targets: Vec<(WoId, WoId)> = state
        .clients()
        .filter_map(|(id, c)| c.frame_id.map(|f| (id, f)))
        .collect();

    for (client_id, frame_id) in targets {
        let Some(client) = state.registry.get(client_id).and_then(|wo| wo.as_client()) else {
            continue;
        };
        let class_hint = client.class_hint.clone();
        let role = client.wm_role.clone();
        let title = client.title_real.clone();

        let actions: Vec<AutoPropAction> = state
            .autoprops
            .all_matching(&class_hint, role.as_deref(), &title, scope)
            .cloned()
            .collect();

        for action in &actions {
            apply_autoprop_action(state, frame_id, client_id, action, head);
        }
        if !actions.is_empty() {
            ewmh::publish_wm_state(state, x, frame_id)?;
        }
    }

    Ok(())
}

/// Handle `DestroyNotify`: detach the client from its frame, destroying
/// the frame too if it is now empty.
pub fn handle_destroy_notify<X: XConnExt>(state: &mut State, x: &X, xid: Xid) -> Result<()> {
    let Some(client_id) = state.registry.by_xid(xid) else {
        return Ok(());
    };

    let frame_id = state.frame_of_client(client_id);
    state.registry.remove(client_id);

    if let Some(frame_id) = frame_id {
        let frame = match state.registry.remove(frame_id) {
            Some(WindowObject::Frame(f)) => f,
            Some(other) => {
                // Not actually a frame; put it back untouched.
                state.registry.insert(None, other);
                return finish_destroy(state, x, None);
            }
            None => return finish_destroy(state, x, None),
        };

        match frame.detach(&client_id) {
            Some(remaining) => {
                let remaining_id = state.registry.insert(None, WindowObject::Frame(remaining));
                if let Some(WindowObject::Frame(f)) = state.registry.get_mut(remaining_id) {
                    f.base.id = remaining_id;
                }
                state.insert_into_stacking(remaining_id);
                return finish_destroy(state, x, Some(remaining_id));
            }
            None => {
                state.remove_from_stacking(frame_id);
                return finish_destroy(state, x, None);
            }
        }
    }

    finish_destroy(state, x, None)
}

fn finish_destroy<X: XConnExt>(state: &mut State, x: &X, surviving_frame: Option<WoId>) -> Result<()> {
    state.refresh_client_lists();
    ewmh::publish_client_lists(state, x)?;

    if state.focused.is_none() {
        let next = surviving_frame.or_else(|| state.current_workspace().mru_iter().next().copied());
        match next {
            Some(id) if state.registry.contains(id) => state.focus(Some(id), x)?,
            _ => state.focus(None, x)?,
        }
    }

    Ok(())
}

/// A frame's active client changed tab: re-run `APPLY_ON_TITLE` rules
/// since a title-dependent decor variant may need to change.
pub fn on_active_client_changed<X: XConnExt>(state: &mut State, x: &X, frame_id: WoId) -> Result<()> {
    reevaluate_autoprops_for_frame(state, x, frame_id, ApplyScope::APPLY_ON_TITLE)
}

fn reevaluate_autoprops_for_frame<X: XConnExt>(
    state: &mut State,
    x: &X,
    frame_id: WoId,
    scope: ApplyScope,
) -> Result<()> {
    let Some(client_id) = state.registry.get(frame_id).and_then(|wo| wo.as_frame()).map(|f| f.active_client())
    else {
        return Ok(());
    };
    let Some(client) = state.registry.get(client_id).and_then(|wo| wo.as_client()) else {
        return Ok(());
    };
    let class_hint = client.class_hint.clone();
    let role = client.wm_role.clone();
    let title = client.title_real.clone();

    if let Some(action) = state
        .autoprops
        .matching(&class_hint, role.as_deref(), &title, scope)
        .cloned()
    {
        let head = x.heads()?.into_iter().next().unwrap_or(Rect::new(0, 0, 1, 1));
        apply_autoprop_action(state, frame_id, client_id, &action, head);
        ewmh::publish_wm_state(state, x, frame_id)?;
    }
    Ok(())
}

/// Re-evaluate `APPLY_ON_WORKSPACE` rules for a frame that just moved to
/// a new workspace.
pub fn on_workspace_changed<X: XConnExt>(state: &mut State, x: &X, frame_id: WoId) -> Result<()> {
    reevaluate_autoprops_for_frame(state, x, frame_id, ApplyScope::APPLY_ON_WORKSPACE)
}
