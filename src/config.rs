//! Runtime configuration. Parsing of the on-disk file format is out
//! of scope; this module owns the parsed value
//! object and its defaults, which match the documented pekwm defaults
//! (`examples/original_source/src/config.cc`'s `Config::Config()`).
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How input focus follows the pointer and keyboard.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusModel {
    /// Focus follows the pointer; entering a window focuses it.
    #[default]
    Sloppy,
    /// Like `Sloppy`, but leaving a window to the root does not unfocus it.
    Follow,
    /// Focus changes only on an explicit click.
    Click,
    /// The window manager never changes focus on its own.
    NoFocus,
}

/// A single strategy the placer tries in order.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementStrategy {
    /// First free gap in a tiled scan of the workarea.
    Smart,
    /// Centered on the current pointer position.
    MouseCentered,
    /// Top-left corner at the current pointer position.
    MouseTopLeft,
    /// Cascaded from the previously placed frame.
    Cascade,
}

/// Parsed, effective configuration. `Default` reproduces pekwm's
/// documented built-in defaults so a core embedder can start from a known
/// baseline before layering a parsed config file on top.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub focus_model: FocusModel,
    /// Tried in order until one strategy succeeds.
    pub placement: Vec<PlacementStrategy>,
    /// How long a grabbed key chain waits for its next key before
    /// resetting.
    pub key_chain_timeout: Duration,
    /// How long a keyboard-active window is protected from an
    /// unrelated `_NET_ACTIVE_WINDOW` focus steal.
    pub focus_steal_protect: Duration,
    /// Whether a fullscreen window temporarily promotes to the
    /// above-dock layer so it can be reclaimed by focus.
    pub fullscreen_above_on_raise: bool,
    /// Two clicks within this long on the same client count as a
    /// double-click (tab-strip activation, titlebar shade toggle).
    pub double_click_time: Duration,
    /// Distance in pixels within which a dragged frame snaps to a head
    /// edge or a neighbouring frame.
    pub edge_snap_width: u32,
    /// Draw an XOR outline while moving/resizing under a server grab
    /// instead of live-reshaping the window on every motion event.
    pub wire_move: bool,
    /// Number of virtual desktops created at startup.
    pub number_of_workspaces: usize,
    /// Optional per-workspace display names, published via
    /// `_NET_DESKTOP_NAMES`. Workspaces past the end of this list keep
    /// `None`.
    pub workspace_names: Vec<String>,
    /// Default border width for new frames, in pixels.
    pub border_width: u32,
    /// Default titlebar height for new frames, in pixels.
    pub title_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            focus_model: FocusModel::Sloppy,
            placement: vec![PlacementStrategy::MouseCentered],
            key_chain_timeout: Duration::from_millis(1500),
            focus_steal_protect: Duration::from_millis(500),
            fullscreen_above_on_raise: true,
            double_click_time: Duration::from_millis(250),
            edge_snap_width: 10,
            wire_move: true,
            number_of_workspaces: 4,
            workspace_names: Vec::new(),
            border_width: 1,
            title_height: 18,
        }
    }
}

impl Config {
    /// Name for workspace `n`, falling back to a 1-indexed default the way
    /// `_NET_DESKTOP_NAMES` is conventionally populated.
    pub fn workspace_name(&self, n: usize) -> String {
        self.workspace_names
            .get(n)
            .cloned()
            .unwrap_or_else(|| format!("Workspace {}", n + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_pekwm_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.number_of_workspaces, 4);
        assert_eq!(cfg.edge_snap_width, 10);
        assert_eq!(cfg.double_click_time, Duration::from_millis(250));
        assert!(cfg.wire_move);
        assert_eq!(cfg.focus_model, FocusModel::Sloppy);
    }

    #[test]
    fn workspace_name_falls_back_to_1_indexed_default() {
        let mut cfg = Config::default();
        cfg.workspace_names.push("main".to_string());
        assert_eq!(cfg.workspace_name(0), "main");
        assert_eq!(cfg.workspace_name(1), "Workspace 2");
    }
}
