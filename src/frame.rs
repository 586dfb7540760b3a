//! The decorated container that wraps one or more clients, their
//! geometry state machine and their tab strip.
use crate::{
    pure::Stack,
    wo::{base::WoBase, Layer, SkipFlags, Wo, WoId, WoType},
    Rect,
};

/// Decoration visibility and theme-variant selection for a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decor {
    pub has_titlebar: bool,
    pub has_border: bool,
    pub decor_name: String,
}

impl Default for Decor {
    fn default() -> Self {
        Self {
            has_titlebar: true,
            has_border: true,
            decor_name: "DEFAULT".into(),
        }
    }
}

/// State saved before entering fullscreen, restored on exit.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SavedFullscreen {
    geometry: Rect,
    decor: Decor,
    layer: Layer,
}

/// Per-axis geometry saved before maximizing, restored on unmaximize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SavedMaximize {
    horz: Option<(u32, u32)>, // (x, w)
    vert: Option<(u32, u32)>, // (y, h)
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub base: WoBase,
    /// Tab strip: the active client is the zipper's focus, hidden siblings
    /// are the up/down lists. Reused from the generic stack zipper since
    /// the access pattern (one visible item, cycle through the rest) is
    /// the same one it was built for.
    pub clients: Stack<WoId>,
    pub decor: Decor,
    saved_fullscreen: Option<SavedFullscreen>,
    saved_maximize: SavedMaximize,
    pub attention_count: u32,
}

impl Frame {
    pub fn new(id: WoId, geometry: Rect, client: WoId) -> Self {
        Self {
            base: WoBase::new(id, geometry, Layer::Normal),
            clients: stack!(client),
            decor: Decor::default(),
            saved_fullscreen: None,
            saved_maximize: SavedMaximize::default(),
            attention_count: 0,
        }
    }

    pub fn active_client(&self) -> WoId {
        *self.clients.focused()
    }

    pub fn is_empty_after_remove(&self, removing: &WoId) -> bool {
        self.clients.len() == 1 && self.clients.focused() == removing
    }

    /// Remove `client` from the tab strip. Returns `None` if the frame has
    /// no clients left and should be destroyed before the next dispatch.
    pub fn detach(mut self, client: &WoId) -> Option<Self> {
        let (_, remainder) = self.clients.clone().remove(client);
        match remainder {
            Some(stack) => {
                self.clients = stack;
                Some(self)
            }
            None => None,
        }
    }

    /// Attach a client transferred from another frame, placed after the
    /// current active client and left inactive (caller decides whether to
    /// switch focus to it).
    pub fn attach(&mut self, client: WoId) {
        self.clients.insert_at(crate::pure::Position::After, client);
    }

    pub fn decoration_extent(&self, border: u32, title_height: u32) -> crate::pure::geometry::Decoration {
        crate::pure::geometry::Decoration::new(
            if self.decor.has_border { border } else { 0 },
            if self.decor.has_titlebar { title_height } else { 0 },
        )
    }

    /// Height actually occupied on screen: decoration only while shaded,
    /// the full frame height otherwise.
    pub fn displayed_height(&self, decor: &crate::pure::geometry::Decoration) -> u32 {
        if self.base.shaded {
            decor.height()
        } else {
            self.base.geometry.h
        }
    }

    pub fn set_fullscreen(&mut self, head: Rect, above_dock_layer: Option<Layer>) {
        if self.base.fullscreen {
            return;
        }

        self.saved_fullscreen = Some(SavedFullscreen {
            geometry: self.base.geometry,
            decor: self.decor.clone(),
            layer: self.base.layer,
        });

        self.decor.has_border = false;
        self.decor.has_titlebar = false;
        self.base.geometry = head;
        if let Some(layer) = above_dock_layer {
            self.base.layer = layer;
        }
        self.base.fullscreen = true;
    }

    pub fn unset_fullscreen(&mut self) {
        if let Some(saved) = self.saved_fullscreen.take() {
            self.base.geometry = saved.geometry;
            self.decor = saved.decor;
            self.base.layer = saved.layer;
        }
        self.base.fullscreen = false;
    }

    pub fn toggle_fullscreen(&mut self, head: Rect, above_dock_layer: Option<Layer>) {
        if self.base.fullscreen {
            self.unset_fullscreen();
        } else {
            self.set_fullscreen(head, above_dock_layer);
        }
    }

    /// No-op while fullscreen, per the composition rules.
    pub fn set_shade(&mut self) {
        if self.base.fullscreen {
            return;
        }
        self.base.shaded = true;
    }

    pub fn unset_shade(&mut self) {
        self.base.shaded = false;
    }

    pub fn toggle_shade(&mut self) {
        if self.base.shaded {
            self.unset_shade();
        } else {
            self.set_shade();
        }
    }

    /// Grow the frame to fill `workarea` along the horizontal axis,
    /// clamped to `max_w` if the active client has a max-size hint.
    pub fn set_maximized_horz(&mut self, workarea: Rect, max_w: Option<u32>) {
        self.saved_maximize.horz = Some((self.base.geometry.x, self.base.geometry.w));
        let w = max_w.map_or(workarea.w, |m| workarea.w.min(m));
        self.base.geometry.x = workarea.x;
        self.base.geometry.w = w;
        self.base.maximized_horz = true;
    }

    pub fn unset_maximized_horz(&mut self) {
        if let Some((x, w)) = self.saved_maximize.horz.take() {
            self.base.geometry.x = x;
            self.base.geometry.w = w;
        }
        self.base.maximized_horz = false;
    }

    pub fn set_maximized_vert(&mut self, workarea: Rect, max_h: Option<u32>) {
        self.saved_maximize.vert = Some((self.base.geometry.y, self.base.geometry.h));
        let h = max_h.map_or(workarea.h, |m| workarea.h.min(m));
        self.base.geometry.y = workarea.y;
        self.base.geometry.h = h;
        self.base.maximized_vert = true;
    }

    pub fn unset_maximized_vert(&mut self) {
        if let Some((y, h)) = self.saved_maximize.vert.take() {
            self.base.geometry.y = y;
            self.base.geometry.h = h;
        }
        self.base.maximized_vert = false;
    }

    /// "MaxFill": grow in each requested axis until the frame's edge
    /// touches the nearest obstacle in `obstacles`, without setting the
    /// persistent maximized bit.
    pub fn max_fill(&mut self, workarea: Rect, obstacles: &[Rect], horz: bool, vert: bool) {
        let mut g = self.base.geometry;

        if horz {
            let left = obstacles
                .iter()
                .filter(|o| o.y < g.y + g.h && o.y + o.h > g.y && o.x + o.w <= g.x)
                .map(|o| o.x + o.w)
                .max()
                .unwrap_or(workarea.x);
            let right = obstacles
                .iter()
                .filter(|o| o.y < g.y + g.h && o.y + o.h > g.y && o.x >= g.x + g.w)
                .map(|o| o.x)
                .min()
                .unwrap_or(workarea.x + workarea.w);

            g.x = left;
            g.w = right.saturating_sub(left);
        }

        if vert {
            let top = obstacles
                .iter()
                .filter(|o| o.x < g.x + g.w && o.x + o.w > g.x && o.y + o.h <= g.y)
                .map(|o| o.y + o.h)
                .max()
                .unwrap_or(workarea.y);
            let bottom = obstacles
                .iter()
                .filter(|o| o.x < g.x + g.w && o.x + o.w > g.x && o.y >= g.y + g.h)
                .map(|o| o.y)
                .min()
                .unwrap_or(workarea.y + workarea.h);

            g.y = top;
            g.h = bottom.saturating_sub(top);
        }

        self.base.geometry = g;
    }
}

impl Wo for Frame {
    fn wo_id(&self) -> WoId {
        self.base.id
    }

    fn wo_type(&self) -> WoType {
        WoType::Frame
    }

    fn mapped(&self) -> bool {
        self.base.mapped
    }

    fn focusable(&self) -> bool {
        self.base.mapped && !self.base.iconified
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

    fn id(i: u32) -> WoId {
        WoId {
            index: i,
            generation: 0,
        }
    }

    fn frame() -> Frame {
        Frame::new(id(0), Rect::new(0, 0, 800, 600), id(1))
    }

    #[test]
    fn fullscreen_round_trip_restores_geometry_and_decor() {
        let mut f = frame();
        let original = f.base.geometry;
        let original_decor = f.decor.clone();

        f.set_fullscreen(Rect::new(0, 0, 1920, 1080), None);
        assert!(f.base.fullscreen);
        assert!(!f.decor.has_border);

        f.unset_fullscreen();
        assert!(!f.base.fullscreen);
        assert_eq!(f.base.geometry, original);
        assert_eq!(f.decor, original_decor);
    }

    #[test]
    fn shade_is_rejected_while_fullscreen() {
        let mut f = frame();
        f.set_fullscreen(Rect::new(0, 0, 1920, 1080), None);
        f.set_shade();
        assert!(!f.base.shaded);
    }

    #[test]
    fn maximize_round_trip_per_axis() {
        let mut f = frame();
        let original = f.base.geometry;

        f.set_maximized_horz(Rect::new(0, 0, 1920, 1080), None);
        f.set_maximized_vert(Rect::new(0, 0, 1920, 1080), None);
        assert!(f.base.maximized_horz && f.base.maximized_vert);

        f.unset_maximized_horz();
        f.unset_maximized_vert();
        assert_eq!(f.base.geometry, original);
    }

    #[test]
    fn detach_destroys_a_single_client_frame() {
        let f = frame();
        let only = f.active_client();
        assert!(f.detach(&only).is_none());
    }

    #[test]
    fn attach_does_not_change_active_client() {
        let mut f = frame();
        let active = f.active_client();
        f.attach(id(2));
        assert_eq!(f.active_client(), active);
        assert_eq!(f.clients.len(), 2);
    }
}
