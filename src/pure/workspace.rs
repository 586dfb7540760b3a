//! A single virtual desktop's stack: an ordered list of window-objects in
//! non-decreasing [`Layer`](crate::wo::Layer) order, an MRU list of frames
//! for focus cycling, and the last-focused WO to restore when the
//! workspace becomes active again.
use std::collections::VecDeque;

use crate::wo::{Layer, WoId};

/// One virtual desktop. Index 0 of `stack` is the bottom of the z-order,
/// the last index is the top; within that single `Vec` every WO appears
/// in non-decreasing layer order.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    pub number: usize,
    /// User-assigned name distinct from the index, published via
    /// `_NET_DESKTOP_NAMES`.
    pub name: Option<String>,
    stack: Vec<WoId>,
    /// Most-recently-used frames, front = most recent. Used for
    /// Alt-Tab-like cycling.
    mru: VecDeque<WoId>,
    /// The WO to refocus when this workspace becomes active again.
    pub last_focused: Option<WoId>,
}

impl Workspace {
    pub fn new(number: usize) -> Self {
        Self {
            number,
            name: None,
            stack: Vec::new(),
            mru: VecDeque::new(),
            last_focused: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn contains(&self, id: &WoId) -> bool {
        self.stack.contains(id)
    }

    /// Iterate bottom to top, the order `_NET_CLIENT_LIST_STACKING`
    /// expects.
    pub fn iter(&self) -> impl Iterator<Item = &WoId> {
        self.stack.iter()
    }

    pub fn top(&self) -> Option<&WoId> {
        self.stack.last()
    }

    /// Insert `id` at the top of its layer band, keeping the
    /// non-decreasing-layer invariant. `layer_of` must return `id`'s own
    /// layer for the id itself, and is consulted per existing entry to
    /// find the band boundary.
    pub fn insert(&mut self, id: WoId, layer: Layer, layer_of: impl Fn(WoId) -> Layer) {
        let pos = self
            .stack
            .iter()
            .rposition(|&o| layer_of(o) <= layer)
            .map(|i| i + 1)
            .unwrap_or(0);
        self.stack.insert(pos, id);
    }

    pub fn remove(&mut self, id: &WoId) {
        self.stack.retain(|o| o != id);
        self.mru.retain(|o| o != id);
        if self.last_focused.as_ref() == Some(id) {
            self.last_focused = None;
        }
    }

    /// Move `id` to the top of its own layer band. A request that would
    /// cross bands is clipped: the WO never leaves the index range its
    /// layer owns.
    pub fn raise(&mut self, id: &WoId, layer_of: impl Fn(WoId) -> Layer) {
        let Some(pos) = self.stack.iter().position(|o| o == id) else {
            return;
        };
        let layer = layer_of(*id);
        let top = self
            .stack
            .iter()
            .rposition(|&o| layer_of(o) == layer)
            .unwrap_or(pos);
        if top > pos {
            let wo = self.stack.remove(pos);
            self.stack.insert(top, wo);
        }
    }

    /// Move `id` to the bottom of its own layer band.
    pub fn lower(&mut self, id: &WoId, layer_of: impl Fn(WoId) -> Layer) {
        let Some(pos) = self.stack.iter().position(|o| o == id) else {
            return;
        };
        let layer = layer_of(*id);
        let bottom = self
            .stack
            .iter()
            .position(|&o| layer_of(o) == layer)
            .unwrap_or(pos);
        if bottom < pos {
            let wo = self.stack.remove(pos);
            self.stack.insert(bottom, wo);
        }
    }

    /// True if, scanning bottom to top, every entry's layer is >= the
    /// previous entry's layer.
    pub fn layers_are_non_decreasing(&self, layer_of: impl Fn(WoId) -> Layer) -> bool {
        self.stack
            .windows(2)
            .all(|w| layer_of(w[0]) <= layer_of(w[1]))
    }

    /// Move `id` to the front of the MRU list.
    pub fn touch_mru(&mut self, id: WoId) {
        self.mru.retain(|o| *o != id);
        self.mru.push_front(id);
    }

    pub fn mru_head(&self) -> Option<&WoId> {
        self.mru.front()
    }

    pub fn mru_iter(&self) -> impl Iterator<Item = &WoId> {
        self.mru.iter()
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

    fn layers(map: &[(u32, Layer)]) -> impl Fn(WoId) -> Layer + '_ {
        move |o| {
            map.iter()
                .find(|(i, _)| *i == o.index)
                .map(|(_, l)| *l)
                .unwrap_or(Layer::Normal)
        }
    }

    #[test]
    fn insert_keeps_non_decreasing_layer_order() {
        let mut ws = Workspace::new(0);
        let map = [
            (1, Layer::Normal),
            (2, Layer::Below),
            (3, Layer::Desktop),
            (4, Layer::OnTop),
        ];
        let layer_of = layers(&map);

        ws.insert(id(1), Layer::Normal, &layer_of);
        ws.insert(id(2), Layer::Below, &layer_of);
        ws.insert(id(3), Layer::Desktop, &layer_of);
        ws.insert(id(4), Layer::OnTop, &layer_of);

        assert!(ws.layers_are_non_decreasing(&layer_of));
        assert_eq!(
            ws.iter().copied().collect::<Vec<_>>(),
            vec![id(3), id(2), id(1), id(4)]
        );
    }

    #[test]
    fn raise_never_crosses_its_own_band() {
        let map = [(1, Layer::Normal), (2, Layer::Normal), (3, Layer::OnTop)];
        let layer_of = layers(&map);
        let mut ws = Workspace::new(0);
        ws.insert(id(1), Layer::Normal, &layer_of);
        ws.insert(id(2), Layer::Normal, &layer_of);
        ws.insert(id(3), Layer::OnTop, &layer_of);

        ws.raise(&id(1), &layer_of);

        let order = ws.iter().copied().collect::<Vec<_>>();
        assert_eq!(order, vec![id(2), id(1), id(3)]);
        assert!(ws.layers_are_non_decreasing(&layer_of));
    }

    #[test]
    fn lower_never_crosses_its_own_band() {
        let map = [(1, Layer::Desktop), (2, Layer::Normal), (3, Layer::Normal)];
        let layer_of = layers(&map);
        let mut ws = Workspace::new(0);
        ws.insert(id(1), Layer::Desktop, &layer_of);
        ws.insert(id(2), Layer::Normal, &layer_of);
        ws.insert(id(3), Layer::Normal, &layer_of);

        ws.lower(&id(3), &layer_of);

        let order = ws.iter().copied().collect::<Vec<_>>();
        assert_eq!(order, vec![id(1), id(3), id(2)]);
    }

    #[test]
    fn touch_mru_moves_to_front() {
        let mut ws = Workspace::new(0);
        ws.touch_mru(id(1));
        ws.touch_mru(id(2));
        assert_eq!(ws.mru_head(), Some(&id(2)));

        ws.touch_mru(id(1));
        assert_eq!(ws.mru_head(), Some(&id(1)));
    }

    #[test]
    fn remove_clears_last_focused_and_mru() {
        let mut ws = Workspace::new(0);
        let layer_of = layers(&[]);
        ws.insert(id(1), Layer::Normal, &layer_of);
        ws.touch_mru(id(1));
        ws.last_focused = Some(id(1));

        ws.remove(&id(1));

        assert!(ws.is_empty());
        assert_eq!(ws.mru_head(), None);
        assert_eq!(ws.last_focused, None);
    }

    const LAYERS: [Layer; 8] = [
        Layer::Desktop,
        Layer::Below,
        Layer::Normal,
        Layer::OnTop,
        Layer::Docked,
        Layer::Menu,
        Layer::AboveDock,
        Layer::Critical,
    ];

    /// For each workspace, iterating the stack must yield non-decreasing
    /// layer values; no stacking operation should produce an order that
    /// violates this. Exercised against arbitrary insert / raise / lower
    /// sequences rather than a handful of hand-picked cases.
    #[quickcheck_macros::quickcheck]
    fn any_sequence_of_inserts_raises_and_lowers_keeps_layers_sorted(ops: Vec<(u8, u8, bool)>) -> bool {
        let map: Vec<(u32, Layer)> = ops
            .iter()
            .enumerate()
            .map(|(i, &(_, layer_idx, _))| (i as u32, LAYERS[layer_idx as usize % LAYERS.len()]))
            .collect();
        let layer_of = layers(&map);

        let mut ws = Workspace::new(0);
        for (i, &(_, layer_idx, raise)) in ops.iter().enumerate() {
            let this_id = id(i as u32);
            let layer = LAYERS[layer_idx as usize % LAYERS.len()];
            ws.insert(this_id, layer, &layer_of);
            if raise {
                ws.raise(&this_id, &layer_of);
            } else {
                ws.lower(&this_id, &layer_of);
            }
        }

        ws.layers_are_non_decreasing(&layer_of)
    }
}
