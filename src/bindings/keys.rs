//! Chain-aware key grabber: bindings may require more than one key press
//! in sequence before an action fires, with lock-modifier variants grabbed
//! automatically for every registered combination.
use std::{collections::HashMap, time::Duration};

use bitflags::bitflags;
use keysyms::XKeySym;

use crate::action::ActionEvent;

bitflags! {
    /// Normalized modifier mask. NumLock/ScrollLock/CapsLock are tracked
    /// here only so [`KeyPress::normalize`] can strip them before any
    /// lookup; bindings are never stored with those bits set.
    #[derive(Default)]
    pub struct ModMask: u16 {
        const SHIFT      = 1 << 0;
        const CONTROL    = 1 << 1;
        const MOD1       = 1 << 2; // Alt
        const MOD2       = 1 << 3; // NumLock, stripped before matching
        const MOD3       = 1 << 4; // ScrollLock, stripped before matching
        const MOD4       = 1 << 5; // Super
        const MOD5       = 1 << 6;
        const LOCK       = 1 << 7; // CapsLock, stripped before matching
    }
}

impl ModMask {
    const LOCK_BITS: ModMask = ModMask::from_bits_truncate(
        ModMask::MOD2.bits() | ModMask::MOD3.bits() | ModMask::LOCK.bits(),
    );

    /// Strip NumLock/ScrollLock/CapsLock from the mask so a binding
    /// grabbed without those locks held still matches.
    pub fn normalized(self) -> Self {
        self.difference(Self::LOCK_BITS)
    }

    /// Every combination of the three lock modifiers overlaid onto a
    /// binding's base mask, used to grab all lock-state equivalents of a
    /// single logical binding.
    pub fn lock_equivalents(self) -> [Self; 8] {
        let base = self.normalized();
        let mut out = [base; 8];
        for (i, slot) in out.iter_mut().enumerate() {
            let mut bits = base;
            if i & 1 != 0 {
                bits |= ModMask::MOD2;
            }
            if i & 2 != 0 {
                bits |= ModMask::MOD3;
            }
            if i & 4 != 0 {
                bits |= ModMask::LOCK;
            }
            *slot = bits;
        }
        out
    }
}

/// A single observed key press after modifier normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyPress {
    pub modifiers: ModMask,
    pub keysym: XKeySym,
}

impl KeyPress {
    pub fn new(modifiers: ModMask, keysym: XKeySym) -> Self {
        Self {
            modifiers: modifiers.normalized(),
            keysym,
        }
    }
}

/// Which binding forest a key event is matched against. Separate forests
/// exist per context so the same key combination can mean different
/// things while moving/resizing or while an input dialog has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    MoveResize,
    InputDialog,
    Menu,
    CmdDialog,
}

#[derive(Debug, Clone)]
enum KeyChain {
    Terminal(ActionEvent),
    Chain(HashMap<(ModMask, XKeySym), KeyChain>),
}

/// Result of offering one key press to the grabber.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainOutcome {
    /// A terminal action list was reached; the chain pointer has reset.
    Terminal(ActionEvent),
    /// A sub-chain was entered; the grabber expects a follow-up key
    /// before `chain_timeout` elapses.
    Descended,
    /// No binding matched at the current chain position; the chain
    /// pointer has reset.
    NoMatch,
}

/// A forest of key chains per [`KeyContext`], with chain-pointer state
/// and the timeout that resets it if no follow-up key arrives.
pub struct KeyGrabber {
    forests: HashMap<KeyContext, HashMap<(ModMask, XKeySym), KeyChain>>,
    chain_path: Vec<(ModMask, XKeySym)>,
    chain_context: Option<KeyContext>,
    pub chain_timeout: Duration,
}

impl Default for KeyGrabber {
    fn default() -> Self {
        Self {
            forests: HashMap::new(),
            chain_path: Vec::new(),
            chain_context: None,
            chain_timeout: Duration::from_millis(1500),
        }
    }
}

impl KeyGrabber {
    pub fn new(chain_timeout: Duration) -> Self {
        Self {
            chain_timeout,
            ..Default::default()
        }
    }

    /// Bind a single (non-chained) key combination to an action list.
    pub fn bind(&mut self, context: KeyContext, keys: ModMask, sym: XKeySym, actions: ActionEvent) {
        let root = self.forests.entry(context).or_default();
        root.insert((keys.normalized(), sym), KeyChain::Terminal(actions));
    }

    /// Bind a multi-key chain: everything but the last `(mods, sym)` pair
    /// becomes an intermediate sub-chain node.
    pub fn bind_chain(&mut self, context: KeyContext, path: &[(ModMask, XKeySym)], actions: ActionEvent) {
        assert!(!path.is_empty(), "chain must have at least one key");
        let mut node = self.forests.entry(context).or_default();

        for &(mods, sym) in &path[..path.len() - 1] {
            let key = (mods.normalized(), sym);
            node = match node
                .entry(key)
                .or_insert_with(|| KeyChain::Chain(HashMap::new()))
            {
                KeyChain::Chain(map) => map,
                KeyChain::Terminal(_) => panic!("chain prefix collides with an existing terminal binding"),
            };
        }

        let (mods, sym) = path[path.len() - 1];
        node.insert((mods.normalized(), sym), KeyChain::Terminal(actions));
    }

    /// Offer a key press to the grabber. `context` should be the active
    /// modal handler's context if one is installed, else
    /// [`KeyContext::Global`].
    pub fn on_key_press(&mut self, context: KeyContext, press: KeyPress) -> ChainOutcome {
        if self.chain_context.is_some() && self.chain_context != Some(context) {
            self.reset_chain();
        }

        let Some(root) = self.forests.get(&context) else {
            self.reset_chain();
            return ChainOutcome::NoMatch;
        };

        let mut node_map = root;
        for step in &self.chain_path {
            match node_map.get(step) {
                Some(KeyChain::Chain(map)) => node_map = map,
                _ => {
                    self.reset_chain();
                    return ChainOutcome::NoMatch;
                }
            }
        }

        let key = (press.modifiers.normalized(), press.keysym);
        match node_map.get(&key) {
            Some(KeyChain::Terminal(actions)) => {
                let actions = actions.clone();
                self.reset_chain();
                ChainOutcome::Terminal(actions)
            }
            Some(KeyChain::Chain(_)) => {
                self.chain_path.push(key);
                self.chain_context = Some(context);
                ChainOutcome::Descended
            }
            None => {
                self.reset_chain();
                ChainOutcome::NoMatch
            }
        }
    }

    /// Reset the chain pointer to the root, e.g. after `chain_timeout`
    /// elapses with no follow-up key.
    pub fn reset_chain(&mut self) {
        self.chain_path.clear();
        self.chain_context = None;
    }

    pub fn is_mid_chain(&self) -> bool {
        !self.chain_path.is_empty()
    }

    /// The root `(context, mods, keysym)` triples that need an active
    /// X11 key grab. Only the first key of a chain is ever grabbed; the
    /// rest of the chain is read off subsequent `KeyPress` events on the
    /// same grab window while the chain pointer is non-empty.
    pub fn root_bindings(&self) -> impl Iterator<Item = (KeyContext, ModMask, XKeySym)> + '_ {
        self.forests
            .iter()
            .flat_map(|(&ctx, root)| root.keys().map(move |&(mods, sym)| (ctx, mods, sym)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use keysyms::XKeySym;

    fn grabber() -> KeyGrabber {
        let mut g = KeyGrabber::default();
        g.bind(
            KeyContext::Global,
            ModMask::MOD1,
            XKeySym::XK_Tab,
            ActionEvent::single(Action::FocusMruNext),
        );
        g.bind_chain(
            KeyContext::Global,
            &[
                (ModMask::MOD4, XKeySym::XK_a),
                (ModMask::empty(), XKeySym::XK_b),
            ],
            ActionEvent::single(Action::Exit),
        );
        g
    }

    #[test]
    fn terminal_binding_matches_directly() {
        let mut g = grabber();
        let outcome = g.on_key_press(
            KeyContext::Global,
            KeyPress::new(ModMask::MOD1, XKeySym::XK_Tab),
        );

        assert_eq!(
            outcome,
            ChainOutcome::Terminal(ActionEvent::single(Action::FocusMruNext))
        );
        assert!(!g.is_mid_chain());
    }

    #[test]
    fn chain_descends_then_resolves() {
        let mut g = grabber();

        let first = g.on_key_press(
            KeyContext::Global,
            KeyPress::new(ModMask::MOD4, XKeySym::XK_a),
        );
        assert_eq!(first, ChainOutcome::Descended);
        assert!(g.is_mid_chain());

        let second = g.on_key_press(
            KeyContext::Global,
            KeyPress::new(ModMask::empty(), XKeySym::XK_b),
        );
        assert_eq!(second, ChainOutcome::Terminal(ActionEvent::single(Action::Exit)));
        assert!(!g.is_mid_chain());
    }

    #[test]
    fn unmatched_follow_up_resets_the_chain() {
        let mut g = grabber();
        g.on_key_press(KeyContext::Global, KeyPress::new(ModMask::MOD4, XKeySym::XK_a));

        let outcome = g.on_key_press(
            KeyContext::Global,
            KeyPress::new(ModMask::empty(), XKeySym::XK_c),
        );

        assert_eq!(outcome, ChainOutcome::NoMatch);
        assert!(!g.is_mid_chain());
    }

    #[test]
    fn modifier_normalization_ignores_lock_keys() {
        let mut g = grabber();
        let with_numlock = ModMask::MOD1 | ModMask::MOD2;

        let outcome = g.on_key_press(
            KeyContext::Global,
            KeyPress::new(with_numlock, XKeySym::XK_Tab),
        );

        assert_eq!(
            outcome,
            ChainOutcome::Terminal(ActionEvent::single(Action::FocusMruNext))
        );
    }

    #[test]
    fn reset_chain_clears_mid_chain_state() {
        let mut g = grabber();
        g.on_key_press(KeyContext::Global, KeyPress::new(ModMask::MOD4, XKeySym::XK_a));
        assert!(g.is_mid_chain());

        g.reset_chain();
        assert!(!g.is_mid_chain());
    }
}
