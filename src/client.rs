//! The managed top-level application window.
use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    pure::geometry::{Gravity, SizeHints},
    wo::{base::WoBase, Layer, SkipFlags, Wo, WoId, WoType},
    Strut, Xid,
};

bitflags! {
    /// Per-client action deny mask, derived from autoproperties. Folds in
    /// the original's finer-grained `ActionAccessMask` bits alongside the
    /// coarser deny flags, since both gate the same action handler
    /// dispatch.
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[derive(Default)]
    pub struct CfgDeny: u32 {
        const DENY_STACKING           = 1 << 0;
        const DENY_ACTIVE_WINDOW      = 1 << 1;
        const DENY_STATE_FULLSCREEN   = 1 << 2;
        const DENY_MOVE               = 1 << 3;
        const DENY_RESIZE             = 1 << 4;
        const DENY_ICONIFY            = 1 << 5;
        const DENY_SHADE              = 1 << 6;
        const DENY_STICK              = 1 << 7;
        const DENY_MAXIMIZE_HORZ      = 1 << 8;
        const DENY_MAXIMIZE_VERT      = 1 << 9;
        const DENY_CHANGE_DESKTOP     = 1 << 10;
        const DENY_CLOSE              = 1 << 11;
    }
}

/// `WM_CLASS`: application instance and class strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassHint {
    pub instance: String,
    pub class: String,
}

/// `WM_HINTS`: initial iconic/normal state, whether the client accepts
/// keyboard input directly, and its group leader window if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WmHints {
    pub initial_iconic: bool,
    pub input: bool,
    pub group_leader: Option<Xid>,
}

#[derive(Debug, Clone)]
pub struct Client {
    pub base: WoBase,
    pub xid: Xid,
    pub class_hint: ClassHint,
    pub wm_role: Option<String>,
    pub title_user: Option<String>,
    pub title_real: String,
    pub size_hints: SizeHints,
    pub gravity: Gravity,
    pub wm_hints: WmHints,
    pub transient_for: Option<Xid>,
    pub transient_children: Vec<Xid>,
    /// While nonzero, synthetic `ConfigureNotify`s for this client are
    /// coalesced rather than sent immediately.
    pub configure_request_lock: u32,
    pub strut: Strut,
    pub frame_id: Option<WoId>,
    pub order_in_frame: u32,
    pub cfg_deny: CfgDeny,
}

impl Client {
    pub fn new(id: WoId, xid: Xid, geometry: crate::Rect) -> Self {
        Self {
            base: WoBase::new(id, geometry, Layer::Normal),
            xid,
            class_hint: ClassHint::default(),
            wm_role: None,
            title_user: None,
            title_real: String::new(),
            size_hints: SizeHints::default(),
            gravity: Gravity::default(),
            wm_hints: WmHints::default(),
            transient_for: None,
            transient_children: Vec::new(),
            configure_request_lock: 0,
            strut: Strut::default(),
            frame_id: None,
            order_in_frame: 0,
            cfg_deny: CfgDeny::empty(),
        }
    }

    /// The name this client should display: the user's `_NET_WM_VISIBLE_NAME`
    /// override if one was set via a client-message, else the client's own
    /// `_NET_WM_NAME`/`WM_NAME`.
    pub fn display_title(&self) -> &str {
        self.title_user.as_deref().unwrap_or(&self.title_real)
    }

    pub fn lock_configure(&mut self) {
        self.configure_request_lock += 1;
    }

    pub fn unlock_configure(&mut self) {
        self.configure_request_lock = self.configure_request_lock.saturating_sub(1);
    }

    pub fn configure_locked(&self) -> bool {
        self.configure_request_lock > 0
    }

    pub fn allows(&self, deny: CfgDeny) -> bool {
        !self.cfg_deny.intersects(deny)
    }
}

impl Wo for Client {
    fn wo_id(&self) -> WoId {
        self.base.id
    }

    fn wo_type(&self) -> WoType {
        WoType::Client
    }

    fn mapped(&self) -> bool {
        self.base.mapped
    }

    fn focusable(&self) -> bool {
        self.base.mapped && !self.base.iconified && self.wm_hints.input
    }

    fn skip(&self) -> SkipFlags {
        self.base.skip
    }

    fn layer(&self) -> Layer {
        self.base.layer
    }

    fn workspace(&self) -> Option<usize> {
        self.base.workspace()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client::new(
            WoId {
                index: 0,
                generation: 0,
            },
            Xid(1),
            crate::Rect::new(0, 0, 100, 100),
        )
    }

    #[test]
    fn display_title_falls_back_to_real_title() {
        let mut c = client();
        c.title_real = "xterm".into();
        assert_eq!(c.display_title(), "xterm");

        c.title_user = Some("renamed".into());
        assert_eq!(c.display_title(), "renamed");
    }

    #[test]
    fn configure_lock_is_a_counter() {
        let mut c = client();
        assert!(!c.configure_locked());

        c.lock_configure();
        c.lock_configure();
        assert!(c.configure_locked());

        c.unlock_configure();
        assert!(c.configure_locked());

        c.unlock_configure();
        assert!(!c.configure_locked());
    }

    #[test]
    fn cfg_deny_gates_allows() {
        let mut c = client();
        assert!(c.allows(CfgDeny::DENY_CLOSE));

        c.cfg_deny.insert(CfgDeny::DENY_CLOSE);
        assert!(!c.allows(CfgDeny::DENY_CLOSE));
    }

    #[test]
    fn unmapped_client_is_not_focusable() {
        let mut c = client();
        c.wm_hints.input = true;
        assert!(!c.focusable());

        c.base.mapped = true;
        assert!(c.focusable());
    }
}
