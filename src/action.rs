//! The action vocabulary dispatched by the action handler and the records
//! that carry it from a binding or protocol message to a mutator.
use crate::{dialogs::MenuKind, pure::RelativePosition, wo::WoId, Rect, Xid};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Whether a boolean WO state bit should be forced on, forced off, or
/// flipped. Named `StateAction` to match the original's own type for this
/// (`Action.hh`), carried through unchanged since auto-property state
/// toggles and the state-toggle action family both need exactly this
/// three-way choice.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateAction {
    Set,
    Unset,
    Toggle,
}

/// The full set of things a binding, menu entry or autoproperty-driven
/// mutator can ask the core to do. Dispatch happens by matching on this
/// enum rather than through a chain of per-action trait objects.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    FocusDirection(RelativePosition),
    FocusMruNext,
    FocusMruPrev,
    Move { dx: i32, dy: i32 },
    Resize { dw: i32, dh: i32 },
    MoveToEdge(RelativePosition),
    MoveToHead(usize),
    GrowDirection(RelativePosition),
    SetGeometry(Rect),
    SetMaximizedHorz(StateAction),
    SetMaximizedVert(StateAction),
    SetFullscreen(StateAction),
    SetShade(StateAction),
    SetSticky(StateAction),
    SetStickySkip(StateAction),
    Iconify,
    Deiconify,
    Detach,
    AttachMarked,
    GotoWorkspace(usize),
    SendToWorkspace(usize),
    Warp(usize),
    ShowMenu(MenuKind),
    FindClient,
    GotoClientById(Xid),
    Raise,
    Lower,
    Close,
    Reload,
    Restart,
    Exit,
    Exec(String),
    ShellExec(String),
    /// Installs the mouse-driven move/resize modal handler.
    MoveResize,
    /// Installs the grouping-drag modal handler.
    GroupingDrag,
}

/// An ordered list of [`Action`]s bound to a single key/button event, run
/// in sequence by the action handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionEvent {
    pub actions: Vec<Action>,
}

impl ActionEvent {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    pub fn single(action: Action) -> Self {
        Self {
            actions: vec![action],
        }
    }
}

/// What triggered an [`ActionEvent`]: used by mutators that behave
/// differently depending on whether they were reached via the keyboard,
/// the pointer, or a client message (e.g. focus-steal checks only apply
/// to `_NET_ACTIVE_WINDOW`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginatingEvent {
    Key,
    Button,
    ClientMessage,
}

/// The record the action handler's entry point accepts: a target WO, the
/// action list to run against it, and optionally what triggered it.
#[derive(Debug, Clone)]
pub struct ActionPerformed {
    pub target: WoId,
    pub event: ActionEvent,
    pub originating: Option<OriginatingEvent>,
}

impl ActionPerformed {
    pub fn new(target: WoId, event: ActionEvent, originating: Option<OriginatingEvent>) -> Self {
        Self {
            target,
            event,
            originating,
        }
    }
}
