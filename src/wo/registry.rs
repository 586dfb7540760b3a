//! The arena backing every [`WoId`](super::WoId) and the `Xid <-> WoId`
//! bijection used to route X11 events onto window-objects.
use std::collections::HashMap;

use crate::{wo::WindowObject, Error, Result, Xid};

use super::WoId;

enum Slot {
    Occupied {
        generation: u32,
        xid: Option<Xid>,
        wo: WindowObject,
    },
    Vacant {
        generation: u32,
    },
}

/// Owns every live [`WindowObject`] and the mapping from its X11 resource
/// ID, where it has one, to its [`WoId`]. Deleting an entry bumps the
/// slot's generation so any handle still pointing at the old occupant
/// fails to resolve instead of aliasing onto whatever moves in next.
#[derive(Default)]
pub struct Registry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    by_xid: HashMap<Xid, WoId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new window-object, optionally associating it with an X11
    /// resource ID for later lookup via [`Registry::by_xid`].
    pub fn insert(&mut self, xid: Option<Xid>, wo: WindowObject) -> WoId {
        let id = if let Some(index) = self.free.pop() {
            let generation = match &self.slots[index as usize] {
                Slot::Vacant { generation } => *generation,
                Slot::Occupied { .. } => unreachable!("free list points at an occupied slot"),
            };
            self.slots[index as usize] = Slot::Occupied {
                generation,
                xid,
                wo,
            };
            WoId { index, generation }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot::Occupied {
                generation: 0,
                xid,
                wo,
            });
            WoId {
                index,
                generation: 0,
            }
        };

        if let Some(xid) = xid {
            self.by_xid.insert(xid, id);
        }

        id
    }

    /// Remove the window-object at `id`, returning it if the handle was
    /// still live.
    pub fn remove(&mut self, id: WoId) -> Option<WindowObject> {
        let slot = self.slots.get_mut(id.index as usize)?;

        match slot {
            Slot::Occupied { generation, xid, .. } if *generation == id.generation => {
                let generation = *generation;
                let xid = *xid;
                let occupied = std::mem::replace(
                    slot,
                    Slot::Vacant {
                        generation: generation.wrapping_add(1),
                    },
                );
                self.free.push(id.index);

                if let Some(xid) = xid {
                    self.by_xid.remove(&xid);
                }

                match occupied {
                    Slot::Occupied { wo, .. } => Some(wo),
                    Slot::Vacant { .. } => None,
                }
            }
            _ => None,
        }
    }

    pub fn get(&self, id: WoId) -> Option<&WindowObject> {
        match self.slots.get(id.index as usize)? {
            Slot::Occupied { generation, wo, .. } if *generation == id.generation => Some(wo),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, id: WoId) -> Option<&mut WindowObject> {
        match self.slots.get_mut(id.index as usize)? {
            Slot::Occupied { generation, wo, .. } if *generation == id.generation => Some(wo),
            _ => None,
        }
    }

    pub fn try_get(&self, id: WoId) -> Result<&WindowObject> {
        self.get(id).ok_or(Error::UnknownWindow(id))
    }

    pub fn try_get_mut(&mut self, id: WoId) -> Result<&mut WindowObject> {
        self.get_mut(id).ok_or(Error::UnknownWindow(id))
    }

    pub fn contains(&self, id: WoId) -> bool {
        self.get(id).is_some()
    }

    /// Look up the [`WoId`] a given X11 resource ID was registered under,
    /// if any. Every occupied slot with an `xid` appears exactly once here
    /// and nowhere else, so this and [`Registry::insert`]/[`Registry::remove`]
    /// together keep the `Xid <-> WoId` mapping a bijection.
    pub fn by_xid(&self, xid: Xid) -> Option<WoId> {
        self.by_xid.get(&xid).copied()
    }

    /// Re-associate `id` with a (possibly new) X11 resource ID, e.g. when
    /// a frame's decoration window is recreated on theme reload.
    pub fn rebind_xid(&mut self, id: WoId, xid: Xid) -> Result<()> {
        match self.slots.get_mut(id.index as usize) {
            Some(Slot::Occupied {
                generation,
                xid: slot_xid,
                ..
            }) if *generation == id.generation => {
                if let Some(old) = slot_xid.replace(xid) {
                    self.by_xid.remove(&old);
                }
                self.by_xid.insert(xid, id);
                Ok(())
            }
            _ => Err(Error::UnknownWindow(id)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (WoId, &WindowObject)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            match slot {
                Slot::Occupied { generation, wo, .. } => Some((
                    WoId {
                        index: index as u32,
                        generation: *generation,
                    },
                    wo,
                )),
                Slot::Vacant { .. } => None,
            }
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::root::Root;

    fn dummy(id: WoId) -> WindowObject {
        WindowObject::Root(Root::new(id))
    }

    #[test]
    fn insert_then_get_round_trips() {
        let mut reg = Registry::new();
        let id = reg.insert(None, dummy(WoId { index: 0, generation: 0 }));

        assert!(reg.get(id).is_some());
    }

    #[test]
    fn by_xid_resolves_to_the_same_id_as_insert() {
        let mut reg = Registry::new();
        let xid = Xid(42);
        let id = reg.insert(Some(xid), dummy(WoId { index: 0, generation: 0 }));

        assert_eq!(reg.by_xid(xid), Some(id));
    }

    #[test]
    fn removed_slot_xid_lookup_returns_none() {
        let mut reg = Registry::new();
        let xid = Xid(7);
        let id = reg.insert(Some(xid), dummy(WoId { index: 0, generation: 0 }));

        reg.remove(id);

        assert_eq!(reg.by_xid(xid), None);
        assert!(reg.get(id).is_none());
    }

    #[test]
    fn stale_handle_does_not_alias_a_reused_slot() {
        let mut reg = Registry::new();
        let first = reg.insert(None, dummy(WoId { index: 0, generation: 0 }));
        reg.remove(first);

        let second = reg.insert(None, dummy(WoId { index: 0, generation: 0 }));

        assert_ne!(first, second);
        assert!(reg.get(first).is_none());
        assert!(reg.get(second).is_some());
    }

    #[test]
    fn len_reflects_only_live_entries() {
        let mut reg = Registry::new();
        let a = reg.insert(None, dummy(WoId { index: 0, generation: 0 }));
        let _b = reg.insert(None, dummy(WoId { index: 0, generation: 0 }));
        assert_eq!(reg.len(), 2);

        reg.remove(a);
        assert_eq!(reg.len(), 1);
    }
}
