//! Collaborator interfaces for the menu and dialog helpers the core does
//! not implement itself. The core owns just enough of a WO shape for these to be
//! registered, stacked and focused like any other window-object; input
//! handling, history and rendering live in the collaborator process.
use crate::{
    action::{Action, ActionEvent},
    wo::{base::WoBase, Layer, SkipFlags, Wo, WoId, WoType},
    Rect, Xid,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKind {
    Root,
    Window,
    Icon,
    Harbour,
    Generic,
}

#[derive(Debug, Clone)]
pub struct MenuEntry {
    pub label: String,
    pub action: Action,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct Menu {
    pub base: WoBase,
    pub xid: Xid,
    pub kind: MenuKind,
    pub entries: Vec<MenuEntry>,
    pub highlighted: Option<usize>,
}

impl Menu {
    pub fn new(id: WoId, xid: Xid, kind: MenuKind, geometry: Rect) -> Self {
        Self {
            base: WoBase::new(id, geometry, Layer::Menu),
            xid,
            kind,
            entries: Vec::new(),
            highlighted: None,
        }
    }
}

impl Wo for Menu {
    fn wo_id(&self) -> WoId {
        self.base.id
    }
    fn wo_type(&self) -> WoType {
        WoType::Menu
    }
    fn mapped(&self) -> bool {
        self.base.mapped
    }
    fn focusable(&self) -> bool {
        self.base.mapped
    }
    fn skip(&self) -> SkipFlags {
        SkipFlags::SKIP_PAGER | SkipFlags::SKIP_TASKBAR
    }
    fn layer(&self) -> Layer {
        Layer::Menu
    }
    fn workspace(&self) -> Option<usize> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Cmd,
    Search,
    Status,
}

#[derive(Debug, Clone)]
pub struct Dialog {
    pub base: WoBase,
    pub xid: Xid,
    pub kind: DialogKind,
    pub input: String,
}

impl Dialog {
    pub fn new(id: WoId, xid: Xid, kind: DialogKind, geometry: Rect) -> Self {
        Self {
            base: WoBase::new(id, geometry, Layer::AboveDock),
            xid,
            kind,
            input: String::new(),
        }
    }
}

impl Wo for Dialog {
    fn wo_id(&self) -> WoId {
        self.base.id
    }
    fn wo_type(&self) -> WoType {
        WoType::Dialog
    }
    fn mapped(&self) -> bool {
        self.base.mapped
    }
    fn focusable(&self) -> bool {
        self.base.mapped
    }
    fn skip(&self) -> SkipFlags {
        SkipFlags::SKIP_PAGER | SkipFlags::SKIP_TASKBAR
    }
    fn layer(&self) -> Layer {
        Layer::AboveDock
    }
    fn workspace(&self) -> Option<usize> {
        None
    }
}

/// Routes `KeyPress` events to a dialog and gets back the action list it
/// produced. Implemented by the out-of-tree dialog helper process; the
/// core only calls through this trait.
pub trait DialogHandler {
    fn handle_key_press(&mut self, dialog: WoId, key: crate::bindings::keys::KeyPress) -> Vec<ActionEvent>;
    fn close(&mut self, dialog: WoId);
}
