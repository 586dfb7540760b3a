//! Context-aware mouse binding table.
use bitflags::bitflags;

use crate::{action::ActionEvent, bindings::keys::ModMask};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    ScrollUp,
    ScrollDown,
    Other(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseState {
    pub modifiers: ModMask,
    pub button: MouseButton,
}

impl MouseState {
    pub fn new(modifiers: ModMask, button: MouseButton) -> Self {
        Self {
            modifiers: modifiers.normalized(),
            button,
        }
    }
}

bitflags! {
    /// Which input contexts a binding is legal from. Carries the
    /// original's `ActionOk` context mask into the mouse table so a
    /// binding recorded for, say, frame-title clicks is rejected if it
    /// somehow fires from a root click.
    #[derive(Default)]
    pub struct ActionContext: u16 {
        const FRAME_TITLE  = 1 << 0;
        const CLIENT       = 1 << 1;
        const ROOT         = 1 << 2;
        const FRAME_BORDER = 1 << 3;
        const WINDOW_MENU  = 1 << 4;
        const ROOT_MENU    = 1 << 5;
        const SCREEN_EDGE  = 1 << 6;
        const BUTTON       = 1 << 7;
    }
}

#[derive(Debug, Clone)]
pub struct MouseBinding {
    pub state: MouseState,
    pub contexts: ActionContext,
    pub actions: ActionEvent,
}

/// The full mouse binding table. Unlike [`crate::bindings::keys::KeyGrabber`]
/// there is no chaining: a mouse binding either matches the pressed button
/// plus modifiers for the current context, or it doesn't.
#[derive(Default)]
pub struct MouseTable {
    bindings: Vec<MouseBinding>,
}

impl MouseTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, state: MouseState, contexts: ActionContext, actions: ActionEvent) {
        self.bindings.push(MouseBinding {
            state,
            contexts,
            actions,
        });
    }

    /// Look up the action list bound to `state` that is legal in
    /// `context`. The first matching binding wins, mirroring the key
    /// grabber's first-match-at-a-level semantics.
    pub fn lookup(&self, context: ActionContext, state: MouseState) -> Option<&ActionEvent> {
        self.bindings
            .iter()
            .find(|b| b.contexts.contains(context) && b.state == state)
            .map(|b| &b.actions)
    }

    /// The distinct `MouseState`s that need an active X11 button grab on
    /// a managed client window.
    pub fn grabbed_states(&self) -> impl Iterator<Item = MouseState> + '_ {
        self.bindings.iter().map(|b| b.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;

    #[test]
    fn lookup_respects_context_mask() {
        let mut table = MouseTable::new();
        let state = MouseState::new(ModMask::empty(), MouseButton::Left);

        table.bind(
            state,
            ActionContext::FRAME_TITLE,
            ActionEvent::single(Action::Raise),
        );

        assert!(table.lookup(ActionContext::FRAME_TITLE, state).is_some());
        assert!(table.lookup(ActionContext::ROOT, state).is_none());
    }

    #[test]
    fn lookup_ignores_lock_modifiers() {
        let mut table = MouseTable::new();
        table.bind(
            MouseState::new(ModMask::MOD1, MouseButton::Left),
            ActionContext::CLIENT,
            ActionEvent::single(Action::Raise),
        );

        let with_capslock = MouseState::new(ModMask::MOD1 | ModMask::LOCK, MouseButton::Left);
        assert!(table.lookup(ActionContext::CLIENT, with_capslock).is_some());
    }
}
