//! Fields every window-object kind carries, factored out so `Client`,
//! `Frame`, `Root`, `Menu`, `Dialog` and `Dockapp` don't each reimplement
//! the bookkeeping the [`Wo`](super::Wo) trait exposes.
use std::time::Instant;

use crate::{
    wo::{Layer, SkipFlags, WoId},
    Rect,
};

/// Sentinel workspace number meaning "visible on every workspace".
pub const STICKY: i32 = -1;

#[derive(Debug, Clone)]
pub struct WoBase {
    pub id: WoId,
    pub geometry: Rect,
    pub workspace: i32,
    pub layer: Layer,
    pub mapped: bool,
    pub iconified: bool,
    pub focused: bool,
    pub sticky: bool,
    pub fullscreen: bool,
    pub maximized_horz: bool,
    pub maximized_vert: bool,
    pub shaded: bool,
    pub skip: SkipFlags,
    pub parent: Option<WoId>,
    pub children: Vec<WoId>,
    pub last_activity: Option<Instant>,
}

impl WoBase {
    pub fn new(id: WoId, geometry: Rect, layer: Layer) -> Self {
        Self {
            id,
            geometry,
            workspace: 0,
            layer,
            mapped: false,
            iconified: false,
            focused: false,
            sticky: false,
            fullscreen: false,
            maximized_horz: false,
            maximized_vert: false,
            shaded: false,
            skip: SkipFlags::empty(),
            parent: None,
            children: Vec::new(),
            last_activity: None,
        }
    }

    /// The workspace number this WO is considered to occupy, or `None`
    /// for a sticky WO (visible on every workspace).
    pub fn workspace(&self) -> Option<usize> {
        if self.sticky || self.workspace == STICKY {
            None
        } else {
            Some(self.workspace as usize)
        }
    }

    pub fn touch_activity(&mut self) {
        self.last_activity = Some(Instant::now());
    }
}
