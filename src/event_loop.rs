//! The main dispatch loop: wait for the next thing that
//! needs attention (a pending signal, a due timeout, or X11 traffic on
//! the connection fd), then drain and classify whatever arrived. Nothing
//! here talks to the X server directly except through [`XConnExt`]; this
//! module only decides *what* to call, never *how*.
use std::os::unix::io::RawFd;
use std::time::Duration;

use nix::poll::{poll, PollFd, PollFlags};
use tracing::{debug, error, trace, warn};

use crate::{
    action::{ActionEvent, ActionPerformed, OriginatingEvent},
    autoprops::ApplyScope,
    bindings::{
        keys::{ChainOutcome, KeyContext},
        mouse::ActionContext,
    },
    config::FocusModel,
    dispatch, ewmh,
    handlers::{HandlerOutcome, ModalHandler},
    manage,
    signal::Signals,
    state::{State, TimeoutPayload},
    wo::{Wo, WoId, WoType},
    x::event::{ButtonEvent, PointerChange, XEvent},
    x::XConnExt,
    Result, Xid,
};

/// How long `poll(2)` is allowed to block when no timeout is pending, so
/// a signal delivered between two calls to `take_pending` is still
/// noticed in bounded time (signal delivery does not interrupt `poll`
/// reliably once `SaFlags::empty()` handlers are installed without
/// `SA_RESTART` semantics we want to rely on).
const FALLBACK_POLL: Duration = Duration::from_millis(500);

/// Owns the process-global signal handles and runs the main dispatch
/// loop. Everything else the loop touches lives in [`State`], which is
/// deliberately a separate value so tests can drive the dispatch
/// functions below without installing signal handlers.
pub struct EventLoop {
    signals: Signals,
}

impl EventLoop {
    pub fn new(signals: Signals) -> Self {
        Self { signals }
    }

    /// Run until a shutdown signal arrives or an action sets
    /// `state.running = false` (`Action::Exit`/`Action::Restart`).
    pub fn run<X: XConnExt>(&mut self, state: &mut State, x: &X) -> Result<()> {
        while state.running {
            self.step(state, x)?;
        }
        Ok(())
    }

    /// Run a single iteration: signals, due timeouts, one bounded wait,
    /// then every event that is immediately available. Exposed
    /// separately from `run` so tests can drive it one step at a time.
    pub fn step<X: XConnExt>(&mut self, state: &mut State, x: &X) -> Result<()> {
        let pending = self.signals.take_pending();
        if pending.shutdown {
            debug!("shutdown signal received");
            state.running = false;
            return Ok(());
        }
        if pending.reload {
            debug!("reload signal received");
            if let Err(e) = manage::reevaluate_autoprops(state, x, ApplyScope::APPLY_ON_RELOAD) {
                warn!(error = %e, "autoprops reload failed");
            }
        }

        while let Some(payload) = state.timeouts.pop_due() {
            handle_timeout(state, x, payload)?;
        }

        let wait = state.timeouts.next_wait().unwrap_or(FALLBACK_POLL).min(FALLBACK_POLL);
        wait_for_readable(x.connection_fd(), wait);

        while let Some(event) = x.poll_event()? {
            trace!(%event, "dispatching event");
            if let Err(e) = self.dispatch_event(state, x, event) {
                error!(error = %e, "event dispatch failed");
                if e.is_fatal() {
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    fn dispatch_event<X: XConnExt>(&mut self, state: &mut State, x: &X, event: XEvent) -> Result<()> {
        if let Some(outcome) = offer_to_modal(state, x, &event)? {
            if outcome.is_terminal() {
                state.modal = None;
            }
            if outcome.is_consumed() {
                return Ok(());
            }
        }

        match event {
            XEvent::MapRequest(xid) => manage::handle_map_request(state, x, xid),
            XEvent::Destroy(xid) => manage::handle_destroy_notify(state, x, xid),
            XEvent::UnmapNotify(xid) => handle_unmap_notify(state, x, xid),
            XEvent::ClientMessage(msg) => ewmh::handle_client_message(state, x, &msg),
            XEvent::ConfigureRequest(cfg) => handle_configure_request(state, x, cfg),
            XEvent::ConfigureNotify(_) => Ok(()),
            XEvent::KeyPress(press) => handle_key_press(state, x, press),
            XEvent::ButtonPress(ev) => handle_button_press(state, x, ev),
            XEvent::ButtonRelease(_) => Ok(()),
            XEvent::MotionNotify(_) => Ok(()),
            XEvent::Enter(change) => handle_enter(state, x, change),
            XEvent::Leave(change) => handle_leave(state, x, change),
            XEvent::FocusIn(_) | XEvent::FocusOut(_) => Ok(()),
            XEvent::PropertyNotify(prop) => handle_property_notify(state, x, prop.id, &prop.atom),
            XEvent::MappingNotify => regrab_bindings(state, x),
            XEvent::RandrNotify => handle_randr_notify(state, x),
            XEvent::Expose(ev) => {
                if let Some(modal) = state.modal.as_mut() {
                    modal.handle_expose(ev);
                }
                Ok(())
            }
        }
    }
}

/// Block until `fd` is readable or `timeout` elapses. `fd < 0` (the mock
/// connection's sentinel) skips the wait entirely rather than asking
/// `poll(2)` to watch a bogus descriptor.
fn wait_for_readable(fd: RawFd, timeout: Duration) {
    if fd < 0 {
        return;
    }
    let mut fds = [PollFd::new(fd, PollFlags::POLLIN)];
    let timeout_ms = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
    if let Err(e) = poll(&mut fds, timeout_ms) {
        trace!(error = %e, "poll interrupted");
    }
}

fn handle_timeout<X: XConnExt>(state: &mut State, x: &X, payload: TimeoutPayload) -> Result<()> {
    match payload {
        TimeoutPayload::KeyChainReset => {
            state.keys.reset_chain();
            state.key_chain_timeout = None;
            Ok(())
        }
        TimeoutPayload::FocusStealExpired(_) => {
            // `State::allows_focus_steal` reads the deadline directly; the
            // timeout queue entry only exists to wake the loop up so a
            // blocked `poll` doesn't hide the moment it elapses.
            Ok(())
        }
        TimeoutPayload::DoubleClickExpired(_) => Ok(()),
    }
}

// --- modal offering -------------------------------------------------------

/// Offer `event` to the installed modal handler, if any. Each
/// [`ModalHandler`] variant has its own, non-uniform set of `handle_*`
/// methods: a mouse-driven drag
/// reads pointer motion and commits on button release, a keyboard drag
/// reads key presses directly and ignores motion, and a grouping drag
/// reads both but needs no `State`/`XConnExt` access to track the
/// pointer. This function is the one place that has to know all three
/// shapes.
fn offer_to_modal<X: XConnExt>(state: &mut State, x: &X, event: &XEvent) -> Result<Option<HandlerOutcome>> {
    let Some(modal) = state.modal.take() else {
        return Ok(None);
    };

    let (next, outcome) = match modal {
        ModalHandler::MouseMoveResize(mut h) => {
            let outcome = match event {
                XEvent::MotionNotify(change) => h.handle_motion_notify(state, *change, x)?,
                XEvent::ButtonPress(ev) => h.handle_button_press(state, *ev),
                XEvent::ButtonRelease(ev) => h.handle_button_release(state, *ev, x)?,
                XEvent::KeyPress(press) => h.handle_key_press(state, *press, x)?,
                XEvent::Expose(ev) => h.handle_expose(*ev),
                _ => HandlerOutcome::Skip,
            };
            (ModalHandler::MouseMoveResize(h), outcome)
        }
        ModalHandler::KeyboardMoveResize(mut h) => {
            let outcome = match event {
                XEvent::KeyPress(press) => h.handle_key_press(state, *press, x)?,
                XEvent::ButtonPress(ev) => h.handle_button_press(state, *ev),
                XEvent::ButtonRelease(ev) => h.handle_button_release(x, *ev)?,
                XEvent::MotionNotify(change) => h.handle_motion_notify(*change),
                XEvent::Expose(ev) => h.handle_expose(*ev),
                _ => HandlerOutcome::Skip,
            };
            (ModalHandler::KeyboardMoveResize(h), outcome)
        }
        ModalHandler::GroupingDrag(mut h) => {
            let outcome = match event {
                XEvent::MotionNotify(change) => h.handle_motion_notify(*change),
                XEvent::KeyPress(press) => h.handle_key_press(x, *press)?,
                XEvent::ButtonPress(ev) => h.handle_button_press(*ev),
                XEvent::ButtonRelease(ev) => h.handle_button_release(state, *ev, x)?,
                XEvent::Expose(ev) => h.handle_expose(*ev),
                _ => HandlerOutcome::Skip,
            };
            (ModalHandler::GroupingDrag(h), outcome)
        }
    };

    if !outcome.is_terminal() {
        state.modal = Some(next);
    }
    Ok(Some(outcome))
}

// --- key dispatch ---------------------------------------------------------

fn active_key_context(state: &State) -> KeyContext {
    state.modal.as_ref().map(|m| m.key_context()).unwrap_or(KeyContext::Global)
}

fn handle_key_press<X: XConnExt>(state: &mut State, x: &X, press: crate::bindings::keys::KeyPress) -> Result<()> {
    let context = active_key_context(state);
    let outcome = state.keys.on_key_press(context, press);
    if let Some(id) = state.key_chain_timeout.take() {
        state.timeouts.cancel(id);
    }

    match outcome {
        ChainOutcome::Terminal(actions) => run_actions(state, x, actions, Some(OriginatingEvent::Key)),
        ChainOutcome::Descended => {
            let timeout = state.keys.chain_timeout;
            state.key_chain_timeout = Some(state.timeouts.schedule(timeout, TimeoutPayload::KeyChainReset));
            Ok(())
        }
        ChainOutcome::NoMatch => Ok(()),
    }
}

/// Run `actions` against whichever window should receive them: the
/// keyboard always targets the currently focused window-object, falling
/// back to the root so global bindings (workspace switches, spawning a
/// terminal) still fire with nothing focused.
fn run_actions<X: XConnExt>(
    state: &mut State,
    x: &X,
    actions: ActionEvent,
    originating: Option<OriginatingEvent>,
) -> Result<()> {
    let target = state.focused.unwrap_or(state.root);
    dispatch::perform(state, x, ActionPerformed::new(target, actions, originating))
}

// --- mouse dispatch ---------------------------------------------------

/// The binding-table context a button landed in, derived from which
/// window-object (if any) owns the event's xid. Frame decoration windows
/// have no xid of their own in this core, so
/// `ActionContext::FRAME_TITLE`/`FRAME_BORDER` can never be produced
/// here; they remain in the binding vocabulary for a collaborator that
/// forwards its own button events back into `dispatch::perform` directly
/// (recorded as an open decision in DESIGN.md).
fn action_context_for(state: &State, xid: Xid) -> (ActionContext, Option<WoId>) {
    if state.window_xid(state.root) == Some(xid) {
        return (ActionContext::ROOT, Some(state.root));
    }
    if let Some(client_id) = state.registry.by_xid(xid) {
        let target = state.frame_of_client(client_id).unwrap_or(client_id);
        return (ActionContext::CLIENT, Some(target));
    }
    (ActionContext::empty(), None)
}

fn handle_button_press<X: XConnExt>(state: &mut State, x: &X, ev: ButtonEvent) -> Result<()> {
    let (context, target) = action_context_for(state, ev.id);
    let Some(target) = target else {
        return Ok(());
    };

    if matches!(state.config.focus_model, FocusModel::Click) {
        state.focus(Some(target), x)?;
    }

    let Some(actions) = state.mouse.lookup(context | ActionContext::BUTTON, ev.state).cloned() else {
        return Ok(());
    };
    run_actions(state, x, actions, Some(OriginatingEvent::Button))
}

// --- focus-follows-pointer ---------------------------------------------

fn handle_enter<X: XConnExt>(state: &mut State, x: &X, change: PointerChange) -> Result<()> {
    if state.skip_enter {
        state.skip_enter = false;
        return Ok(());
    }
    if !matches!(state.config.focus_model, FocusModel::Sloppy | FocusModel::Follow) {
        return Ok(());
    }
    let Some(client_id) = state.registry.by_xid(change.id) else {
        return Ok(());
    };
    let target = state.frame_of_client(client_id).unwrap_or(client_id);
    if !state.allows_focus_steal(target) {
        return Ok(());
    }
    state.focus(Some(target), x)
}

fn handle_leave<X: XConnExt>(state: &mut State, x: &X, change: PointerChange) -> Result<()> {
    if state.config.focus_model != FocusModel::Sloppy {
        return Ok(());
    }
    // Only clear focus when the pointer left into nothing we manage
    // (bare root background); moving between two of our own windows
    // raises its own `Enter` that will re-focus immediately after.
    if state.registry.by_xid(change.id).is_some() {
        return Ok(());
    }
    state.focus(None, x)
}

// --- lifecycle glue -------------------------------------------------------

fn handle_unmap_notify<X: XConnExt>(state: &mut State, x: &X, xid: Xid) -> Result<()> {
    // A withdrawing client unmaps itself before (or instead of) being
    // destroyed; ICCCM 4.1.4 treats this the same as a destroy for
    // management purposes, so the teardown path is shared.
    manage::handle_destroy_notify(state, x, xid)
}

fn handle_property_notify<X: XConnExt>(state: &mut State, x: &X, xid: Xid, atom: &str) -> Result<()> {
    let Some(id) = state.registry.by_xid(xid) else {
        return Ok(());
    };
    match atom {
        "WM_NAME" | "_NET_WM_NAME" | "WM_CLASS" | "WM_NORMAL_HINTS" | "_NET_WM_STRUT" => {
            if let Some(frame_id) = state.frame_of_client(id) {
                manage::on_active_client_changed(state, x, frame_id)?;
            }
            ewmh::publish_wm_state(state, x, state.frame_of_client(id).unwrap_or(id))
        }
        _ => Ok(()),
    }
}

fn handle_randr_notify<X: XConnExt>(state: &mut State, x: &X) -> Result<()> {
    debug!("RANDR change notified; workarea follows head geometry on next query");
    ewmh::publish_root_desktop_properties(state, x)
}

/// Re-grab every bound key and button on every managed top-level window
/// after the keyboard mapping changes.
fn regrab_bindings<X: XConnExt>(state: &State, x: &X) -> Result<()> {
    let windows: Vec<Xid> = state
        .registry
        .iter()
        .filter(|(_, wo)| wo.wo_type() == WoType::Client)
        .filter_map(|(_, wo)| wo.as_client())
        .map(|c| c.xid)
        .collect();

    for xid in windows {
        for (_, mods, sym) in state.keys.root_bindings() {
            let press = crate::bindings::keys::KeyPress::new(mods, sym);
            x.ungrab_key(press, xid).ok();
            x.grab_key(press, xid)?;
        }
        for mouse_state in state.mouse.grabbed_states() {
            x.ungrab_button(mouse_state, xid).ok();
            x.grab_button(mouse_state, xid)?;
        }
    }
    Ok(())
}

/// Turn an unmanaged `ConfigureRequest` (or one from a client this core
/// does not yet know about) into the ICCCM-mandated "honor it verbatim"
/// response, and a managed client's request into a normalized,
/// head-clamped frame geometry.
fn handle_configure_request<X: XConnExt>(
    state: &mut State,
    x: &X,
    cfg: crate::x::event::ConfigureEvent,
) -> Result<()> {
    if cfg.is_root {
        return Ok(());
    }

    let Some(client_id) = state.registry.by_xid(cfg.id) else {
        return x.configure_window(cfg.id, &[crate::x::ClientConfig::Position(cfg.r)]);
    };
    let Some(frame_id) = state.frame_of_client(client_id) else {
        return x.configure_window(cfg.id, &[crate::x::ClientConfig::Position(cfg.r)]);
    };

    let locked = state
        .registry
        .get(client_id)
        .and_then(|wo| wo.as_client())
        .map(|c| c.configure_locked())
        .unwrap_or(false);
    if locked {
        return Ok(());
    }

    let decor = state
        .registry
        .get(frame_id)
        .and_then(|wo| wo.as_frame())
        .map(|f| f.decoration_extent(state.config.border_width, state.config.title_height))
        .unwrap_or_else(|| crate::pure::geometry::Decoration::new(0, 0));
    let requested_frame = decor.outset(cfg.r);

    let heads = x.heads()?;
    let head = heads
        .iter()
        .find(|h| h.contains_point(requested_frame.midpoint()))
        .copied()
        .or_else(|| heads.into_iter().next())
        .unwrap_or(requested_frame);
    let workarea = state.root_state().workarea(head);
    let clamped = requested_frame.clamp_to_head(workarea);

    crate::handlers::apply_geometry(state, frame_id, clamped, x)?;
    ewmh::publish_wm_state(state, x, frame_id)
}
