//! The single value that owns every piece of mutable window-manager
//! state: the window-object arena, the per-workspace stacks, the key and
//! mouse binding tables, auto-properties, and the collaborator handles
//! for theme and harbour. Every other module
//! (`dispatch`, `ewmh`, `handlers`, `event_loop`) takes `&mut State`
//! rather than reaching for globals or thread-locals.
use std::time::Instant;

use tracing::{debug, trace};

use crate::{
    autoprops::AutoProps,
    bindings::{keys::KeyGrabber, mouse::MouseTable},
    config::Config,
    harbour::Harbour,
    handlers::ModalHandler,
    pure::Workspace,
    root::Root,
    theme::Theme,
    util::Timeouts,
    wo::{registry::Registry, Layer, Wo, WoId, WoType, WindowObject},
    x::XConnExt,
    Error, Result, Xid,
};

/// Payloads carried by the event loop's timeout queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeoutPayload {
    /// The key grabber's chain pointer should reset; no follow-up key
    /// arrived within `Config::key_chain_timeout`.
    KeyChainReset,
    /// A keyboard-focused client's protection against an unrelated
    /// `_NET_ACTIVE_WINDOW` focus steal has expired.
    FocusStealExpired(WoId),
    /// A double-click window on a frame's titlebar has expired without a
    /// second click arriving.
    DoubleClickExpired(WoId),
}

/// The central, single-threaded window-manager state. Signal
/// handling is deliberately NOT part of this value: installing signal
/// handlers is a one-time, process-global action unrelated to window
/// state, and keeping it out lets tests build a `State` freely without
/// touching process-wide signal disposition.
pub struct State {
    pub config: Config,
    pub registry: Registry,
    pub root: WoId,
    pub workspaces: Vec<Workspace>,
    pub current_workspace: usize,
    pub previous_workspace: usize,
    pub focused: Option<WoId>,
    /// When the currently focused client last received focus via an
    /// explicit user action (key/button), as opposed to a sloppy-focus
    /// pointer crossing; gates `_NET_ACTIVE_WINDOW` focus-steal checks.
    pub focus_steal_protect_until: Option<Instant>,
    pub keys: KeyGrabber,
    pub mouse: MouseTable,
    pub autoprops: AutoProps,
    pub theme: Box<dyn Theme>,
    pub harbour: Box<dyn Harbour>,
    pub timeouts: Timeouts<TimeoutPayload>,
    /// The active modal handler, if a mouse move/resize, keyboard
    /// move/resize or grouping-drag session is in progress.
    pub modal: Option<ModalHandler>,
    /// Set after a synthetic pointer warp so the resulting `EnterNotify`
    /// is not mistaken for a user-initiated sloppy-focus crossing.
    pub skip_enter: bool,
    /// The pending [`TimeoutPayload::KeyChainReset`] entry, if the key
    /// grabber is mid-chain, so a new key press that completes or resets
    /// the chain can cancel the stale timer instead of leaving it to fire
    /// and cut a newer, still-valid chain wait short.
    pub key_chain_timeout: Option<crate::util::TimeoutId>,
    pub running: bool,
    /// In-flight `_PEKWM_CMD` reassembly buffers, keyed by the window the
    /// multi-message sequence is addressed to.
    pub pekwm_cmd_buffers: std::collections::HashMap<Xid, Vec<u8>>,
}

impl State {
    /// Build a fresh `State` with a newly inserted root WO and `config`'s
    /// configured number of empty workspaces.
    pub fn new(config: Config, theme: Box<dyn Theme>, harbour: Box<dyn Harbour>) -> Self {
        let mut registry = Registry::new();
        let root = registry.insert(
            None,
            WindowObject::Root(Root::new(WoId {
                index: 0,
                generation: 0,
            })),
        );

        let workspaces = (0..config.number_of_workspaces).map(Workspace::new).collect();

        Self {
            config,
            registry,
            root,
            workspaces,
            current_workspace: 0,
            previous_workspace: 0,
            focused: None,
            focus_steal_protect_until: None,
            keys: KeyGrabber::default(),
            mouse: MouseTable::default(),
            autoprops: AutoProps::default(),
            theme,
            harbour,
            timeouts: Timeouts::new(),
            modal: None,
            skip_enter: false,
            key_chain_timeout: None,
            running: true,
            pekwm_cmd_buffers: std::collections::HashMap::new(),
        }
    }

    /// Bind the root WO to its actual X11 window ID once a connection is
    /// established; called once at startup.
    pub fn bind_root(&mut self, xid: Xid) -> Result<()> {
        self.registry.rebind_xid(self.root, xid)?;
        if let Some(WindowObject::Root(r)) = self.registry.get_mut(self.root) {
            r.xid = xid;
        }
        Ok(())
    }

    pub fn root_state(&self) -> &crate::root::RootState {
        match self.registry.get(self.root) {
            Some(WindowObject::Root(r)) => &r.state,
            _ => unreachable!("root WO is never removed"),
        }
    }

    pub fn root_state_mut(&mut self) -> &mut crate::root::RootState {
        match self.registry.get_mut(self.root) {
            Some(WindowObject::Root(r)) => &mut r.state,
            _ => unreachable!("root WO is never removed"),
        }
    }

    /// The layer a live WO currently occupies, or [`Layer::Normal`] for a
    /// stale handle. Suitable to hand to [`Workspace`] methods that take
    /// a `layer_of` closure.
    pub fn layer_of(&self, id: WoId) -> Layer {
        self.registry.get(id).map(|wo| wo.layer()).unwrap_or(Layer::Normal)
    }

    /// Like [`State::layer_of`] but borrows only the registry field, so it
    /// can be handed to a [`Workspace`] method at the same time another
    /// field (e.g. `workspaces`) is mutably borrowed.
    fn layer_lookup(registry: &Registry) -> impl Fn(WoId) -> Layer + '_ {
        move |id| registry.get(id).map(|wo| wo.layer()).unwrap_or(Layer::Normal)
    }

    pub fn workspace(&self, n: usize) -> &Workspace {
        &self.workspaces[n]
    }

    pub fn workspace_mut(&mut self, n: usize) -> &mut Workspace {
        &mut self.workspaces[n]
    }

    pub fn current_workspace(&self) -> &Workspace {
        &self.workspaces[self.current_workspace]
    }

    pub fn current_workspace_mut(&mut self) -> &mut Workspace {
        &mut self.workspaces[self.current_workspace]
    }

    /// Insert `id` into the workspace it is assigned, or every workspace
    /// if sticky. A WO not yet
    /// carrying a workspace assignment is placed on the current one.
    pub fn insert_into_stacking(&mut self, id: WoId) {
        let layer = self.layer_of(id);
        let target = self.registry.get(id).and_then(|wo| wo.workspace());

        match target {
            Some(n) => {
                let layer_of = Self::layer_lookup(&self.registry);
                self.workspaces[n].insert(id, layer, layer_of);
            }
            None => {
                let layer_of = Self::layer_lookup(&self.registry);
                for ws in &mut self.workspaces {
                    ws.insert(id, layer, &layer_of);
                }
            }
        }
    }

    /// Remove `id` from every workspace's stack, its MRU list, and clear
    /// it as the focus target if it was focused.
    pub fn remove_from_stacking(&mut self, id: WoId) {
        for ws in &mut self.workspaces {
            ws.remove(&id);
        }
        if self.focused == Some(id) {
            self.focused = None;
        }
    }

    /// Move `id` to the top of its own layer band on whichever
    /// workspace(s) it is a member of.
    pub fn raise(&mut self, id: WoId) {
        let layer_of = Self::layer_lookup(&self.registry);
        for ws in &mut self.workspaces {
            if ws.contains(&id) {
                ws.raise(&id, &layer_of);
            }
        }
    }

    pub fn lower(&mut self, id: WoId) {
        let layer_of = Self::layer_lookup(&self.registry);
        for ws in &mut self.workspaces {
            if ws.contains(&id) {
                ws.lower(&id, &layer_of);
            }
        }
    }

    /// Every stacking-order frame/wo on the current workspace, bottom to
    /// top, including sticky WOs registered on every workspace.
    pub fn visible_stacking_order(&self) -> impl Iterator<Item = &WoId> {
        self.workspaces[self.current_workspace].iter()
    }

    /// Refresh `_NET_CLIENT_LIST`/`_NET_CLIENT_LIST_STACKING` from the
    /// current registry contents. Creation order for
    /// the former, current-workspace stacking order for the latter.
    pub fn refresh_client_lists(&mut self) {
        let creation_order: Vec<Xid> = self
            .registry
            .iter()
            .filter(|(_, wo)| wo.wo_type() == WoType::Client)
            .filter_map(|(_, wo)| wo.as_client().map(|c| c.xid))
            .collect();

        let stacking_order: Vec<Xid> = self
            .workspaces
            .iter()
            .flat_map(|ws| ws.iter())
            .filter_map(|&id| self.registry.get(id).and_then(|wo| wo.as_client()).map(|c| c.xid))
            .collect();

        let root = self.root_state_mut();
        root.client_list = creation_order;
        root.client_list_stacking = stacking_order;
    }

    /// Set input focus to `target` (or to nobody), updating MRU order,
    /// the previous/new WO's `base.focused` bit, and the focus-steal
    /// protect window.
    pub fn focus<X: XConnExt>(&mut self, target: Option<WoId>, x: &X) -> Result<()> {
        if self.focused == target {
            return Ok(());
        }

        if let Some(prev) = self.focused {
            if let Some(wo) = self.registry.get_mut(prev) {
                set_focused_bit(wo, false);
            }
        }

        match target {
            Some(id) => {
                let wo = self.registry.try_get_mut(id)?;
                if !wo.focusable() {
                    return Err(Error::UnmanagedWindow(x.root()));
                }
                set_focused_bit(wo, true);

                let xid = focus_xid(wo).unwrap_or_else(|| x.root());
                x.focus(xid)?;

                if let Some(ws_n) = wo.workspace() {
                    self.workspaces[ws_n].touch_mru(id);
                    self.workspaces[ws_n].last_focused = Some(id);
                }

                self.focus_steal_protect_until =
                    Some(Instant::now() + self.config.focus_steal_protect);
                debug!(target = %id, "focus changed");
            }
            None => {
                x.focus(x.root())?;
                self.focus_steal_protect_until = None;
                trace!("focus cleared to root");
            }
        }

        self.focused = target;
        let active_window = target.and_then(|id| self.window_xid(id));
        self.root_state_mut().active_window = active_window;
        Ok(())
    }

    /// Whether an unrelated `_NET_ACTIVE_WINDOW` request targeting
    /// `requester` should be allowed to steal focus right now.
    pub fn allows_focus_steal(&self, requester: WoId) -> bool {
        if self.focused == Some(requester) {
            return true;
        }
        match self.focus_steal_protect_until {
            Some(deadline) => Instant::now() >= deadline,
            None => true,
        }
    }

    /// The X11 resource ID backing a window-object, if it has one
    /// (frames, menus and dialogs have their own top-level window;
    /// clients do too, but focus is usually routed to the frame).
    pub fn window_xid(&self, id: WoId) -> Option<Xid> {
        self.registry.get(id).and_then(focus_xid)
    }

    /// Switch the active workspace: unmap the old workspace's non-sticky members,
    /// map the new one's, restore its last focus, and warp the pointer if
    /// no frame ends up focused.
    pub fn switch_workspace<X: XConnExt>(&mut self, n: usize, x: &X) -> Result<()> {
        if n == self.current_workspace || n >= self.workspaces.len() {
            return Ok(());
        }

        let old = self.current_workspace;
        self.previous_workspace = old;

        // Step 1-2: unmap every non-sticky WO currently on the old
        // workspace.
        let leaving: Vec<WoId> = self.workspaces[old]
            .iter()
            .copied()
            .filter(|id| self.registry.get(*id).map(|wo| wo.workspace().is_some()).unwrap_or(false))
            .collect();
        for id in &leaving {
            if let Some(xid) = self.window_xid(*id) {
                x.unmap(xid)?;
            }
        }

        // Step 3-4: map every WO assigned to the new workspace (sticky
        // WOs are already mapped and present in both lists).
        self.current_workspace = n;
        let entering: Vec<WoId> = self.workspaces[n].iter().copied().collect();
        for id in &entering {
            if let Some(xid) = self.window_xid(*id) {
                x.map(xid)?;
            }
        }

        // Step 5-6: restore the workspace's last focus, or clear focus
        // and warp to the head if it is now empty.
        let restore = self.workspaces[n].last_focused;
        match restore {
            Some(id) if self.registry.contains(id) => {
                self.focus(Some(id), x)?;
            }
            _ => {
                self.focus(None, x)?;
                if let Some(head) = x.heads()?.into_iter().next() {
                    x.warp_pointer_to_head(head)?;
                    self.skip_enter = true;
                }
            }
        }

        self.root_state_mut().current_desktop = n as u32;
        self.refresh_client_lists();
        Ok(())
    }

    /// Toggle a WO's sticky bit, re-registering it on every workspace (if
    /// becoming sticky) or just its current one (if becoming ordinary).
    pub fn set_sticky(&mut self, id: WoId, sticky: bool) {
        self.remove_from_stacking(id);

        if let Some(wo) = self.registry.get_mut(id) {
            set_sticky_bit(wo, sticky, self.current_workspace as i32);
        }

        self.insert_into_stacking(id);
    }

    /// Move `id` from its current workspace to `n`, updating both
    /// workspace stacks.
    pub fn move_to_workspace(&mut self, id: WoId, n: usize) {
        self.remove_from_stacking(id);
        if let Some(wo) = self.registry.get_mut(id) {
            set_workspace(wo, n as i32);
        }
        self.insert_into_stacking(id);
    }

    /// Iterate every live client in the registry.
    pub fn clients(&self) -> impl Iterator<Item = (WoId, &crate::client::Client)> {
        self.registry.iter().filter_map(|(id, wo)| wo.as_client().map(|c| (id, c)))
    }

    /// Iterate every live frame in the registry.
    pub fn frames(&self) -> impl Iterator<Item = (WoId, &crate::frame::Frame)> {
        self.registry.iter().filter_map(|(id, wo)| wo.as_frame().map(|f| (id, f)))
    }

    /// The frame wrapping a given client, if the client is currently
    /// attached to one.
    pub fn frame_of_client(&self, client: WoId) -> Option<WoId> {
        self.registry.get(client)?.as_client()?.frame_id
    }
}

fn focus_xid(wo: &WindowObject) -> Option<Xid> {
    match wo {
        WindowObject::Client(c) => Some(c.xid),
        WindowObject::Frame(f) => {
            // The frame itself owns no xid in this model: focus the
            // active tab's client window instead.
            let _ = f;
            None
        }
        WindowObject::Menu(m) => Some(m.xid),
        WindowObject::Dialog(d) => Some(d.xid),
        WindowObject::Dockapp(d) => Some(d.xid),
        WindowObject::Root(r) => Some(r.xid),
    }
}

fn set_focused_bit(wo: &mut WindowObject, focused: bool) {
    match wo {
        WindowObject::Client(c) => c.base.focused = focused,
        WindowObject::Frame(f) => f.base.focused = focused,
        WindowObject::Menu(m) => m.base.focused = focused,
        WindowObject::Dialog(d) => d.base.focused = focused,
        WindowObject::Dockapp(d) => d.base.focused = focused,
        WindowObject::Root(r) => r.base.focused = focused,
    }
}

fn set_sticky_bit(wo: &mut WindowObject, sticky: bool, workspace: i32) {
    match wo {
        WindowObject::Client(c) => {
            c.base.sticky = sticky;
            if !sticky {
                c.base.workspace = workspace;
            }
        }
        WindowObject::Frame(f) => {
            f.base.sticky = sticky;
            if !sticky {
                f.base.workspace = workspace;
            }
        }
        _ => {}
    }
}

fn set_workspace(wo: &mut WindowObject, n: i32) {
    match wo {
        WindowObject::Client(c) => {
            c.base.sticky = false;
            c.base.workspace = n;
        }
        WindowObject::Frame(f) => {
            f.base.sticky = false;
            f.base.workspace = n;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        harbour::NoHarbour,
        pure::geometry::{Point as PurePoint, Rect as PureRect},
        theme::BuiltinTheme,
        x::mock::MockXConn,
    };

    fn state() -> State {
        State::new(
            Config::default(),
            Box::new(BuiltinTheme::default()),
            Box::new(NoHarbour),
        )
    }

    /// A minimal [`MockXConn`] that accepts every map/unmap/focus/warp
    /// call unconditionally, used to drive [`State`] methods that need a
    /// working (if inert) `XConn` behind them.
    #[derive(Default)]
    struct AcceptingXConn;

    impl MockXConn for AcceptingXConn {
        fn mock_heads(&self) -> Result<Vec<PureRect>> {
            Ok(vec![PureRect::new(0, 0, 1920, 1080)])
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
        fn mock_cursor_position(&self) -> Result<PurePoint> {
            Ok(PurePoint::new(0, 0))
        }
    }

    #[test]
    fn new_state_has_the_configured_workspace_count() {
        let s = state();
        assert_eq!(s.workspaces.len(), 4);
        assert_eq!(s.current_workspace, 0);
    }

    #[test]
    fn root_wo_is_reachable_immediately() {
        let s = state();
        assert!(s.registry.contains(s.root));
    }

    #[test]
    fn switch_workspace_is_a_no_op_for_the_current_workspace() {
        let mut s = state();
        let x = AcceptingXConn::default();
        s.switch_workspace(0, &x).unwrap();
        assert_eq!(s.current_workspace, 0);
    }

    #[test]
    fn switch_workspace_updates_current_desktop() {
        let mut s = state();
        let x = AcceptingXConn::default();
        s.switch_workspace(2, &x).unwrap();
        assert_eq!(s.current_workspace, 2);
        assert_eq!(s.root_state().current_desktop, 2);
    }

    #[test]
    fn set_sticky_moves_a_wo_onto_every_workspace() {
        let mut s = state();
        let xid = Xid(100);
        let id = s.registry.insert(
            Some(xid),
            WindowObject::Client(crate::client::Client::new(
                WoId {
                    index: 0,
                    generation: 0,
                },
                xid,
                PureRect::new(0, 0, 100, 100),
            )),
        );
        s.insert_into_stacking(id);
        assert!(s.workspaces[0].contains(&id));
        assert!(!s.workspaces[1].contains(&id));

        s.set_sticky(id, true);
        for ws in &s.workspaces {
            assert!(ws.contains(&id));
        }
    }
}
