//! The process-wide WO representing the X11 root window and the EWMH
//! aggregate state published on it.
use crate::{
    wo::{base::WoBase, Layer, SkipFlags, Wo, WoId, WoType},
    Rect, Strut, Xid,
};

/// EWMH-published aggregate state that has no single owning client or
/// frame: desktop count/names, the current active window, and the
/// workarea derived from every registered strut.
#[derive(Debug, Clone, Default)]
pub struct RootState {
    pub number_of_desktops: u32,
    pub current_desktop: u32,
    pub desktop_names: Vec<String>,
    pub active_window: Option<Xid>,
    /// Creation order, published as `_NET_CLIENT_LIST`.
    pub client_list: Vec<Xid>,
    /// Current z-order, published as `_NET_CLIENT_LIST_STACKING`.
    pub client_list_stacking: Vec<Xid>,
    pub struts: Vec<Strut>,
}

impl RootState {
    /// The screen rectangle minus the union of every registered strut.
    pub fn workarea(&self, screen: Rect) -> Rect {
        self.struts
            .iter()
            .fold(screen, |area, strut| area.less_strut(strut))
    }
}

#[derive(Debug, Clone)]
pub struct Root {
    pub base: WoBase,
    pub xid: Xid,
    pub state: RootState,
}

impl Root {
    pub fn new(id: WoId) -> Self {
        Self {
            base: WoBase::new(id, Rect::default(), Layer::Desktop),
            xid: Xid::default(),
            state: RootState::default(),
        }
    }
}

impl Wo for Root {
    fn wo_id(&self) -> WoId {
        self.base.id
    }

    fn wo_type(&self) -> WoType {
        WoType::Root
    }

    fn mapped(&self) -> bool {
        true
    }

    fn focusable(&self) -> bool {
        true
    }

    fn skip(&self) -> SkipFlags {
        SkipFlags::empty()
    }

    fn layer(&self) -> Layer {
        Layer::Desktop
    }

    fn workspace(&self) -> Option<usize> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workarea_subtracts_every_strut() {
        let mut state = RootState::default();
        state.struts = vec![Strut::new(0, 0, 30, 0), Strut::new(0, 0, 0, 20)];

        let screen = Rect::new(0, 0, 1920, 1080);
        assert_eq!(state.workarea(screen), Rect::new(0, 30, 1920, 1030));
    }
}
