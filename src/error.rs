//! The crate-wide error type.
use crate::{wo::WoId, Xid};

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong inside the core. Most variants are
/// recoverable and handled locally by the caller; a few are fatal and
/// propagate out of the event loop to terminate the process.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A stacking/placement operation was attempted with no screens
    /// attached.
    #[error("no screens currently attached")]
    NoScreens,

    /// Not enough workspaces were configured to cover the attached screens.
    #[error("not enough workspaces ({n_ws}) to cover {n_screens} screens")]
    InsufficientWorkspaces { n_ws: usize, n_screens: usize },

    /// Two or more workspaces were given the same tag.
    #[error("workspace tags must be unique, duplicates: {tags:?}")]
    NonUniqueTags { tags: Vec<String> },

    /// A client referenced by caller code is not tracked by the
    /// [`crate::pure::workspaces::Workspaces`] it was looked up in.
    #[error("client {0} is not known to this workspace set")]
    UnknownClient(Xid),

    /// A window-object handle does not resolve to a live node in the
    /// arena (it was destroyed, or belongs to a different [`crate::state::State`]).
    #[error("window-object handle {0:?} is stale or unknown")]
    UnknownWindow(WoId),

    /// A client is known but not currently mapped to any screen, so no
    /// relative position can be computed for it.
    #[error("client {0} is not currently visible on a screen")]
    ClientIsNotVisible(Xid),

    /// Following a transient-for or group-membership chain revisited a
    /// window already seen, which would otherwise loop forever.
    #[error("cycle detected while following transient-for chain at {0}")]
    CycleDetected(Xid),

    /// An X11 request referenced a window that is not (or no longer)
    /// managed. Recovered by marking the window-object not-alive and
    /// letting `DestroyNotify` finish the cleanup.
    #[error("X11 request failed for unmanaged window {0}")]
    UnmanagedWindow(Xid),

    /// The root window produced a protocol error, almost always because
    /// another process already holds the `WM_Sn` selection. Fatal.
    #[error("lost control of the root window: {0}")]
    RootWindowLost(String),

    /// The configuration file or an included fragment failed to parse.
    /// Recovered by falling back to the last good configuration or to
    /// built-in defaults.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(String),

    /// A theme failed to load (missing files, unparseable description).
    /// Recovered by falling back to the built-in decor defaults; no decor
    /// reload is performed.
    #[error("failed to load theme {name}: {reason}")]
    ThemeLoad { name: String, reason: String },

    /// Spawning a supervised subprocess (background painter, tray helper,
    /// `pekwm_dialog`) failed.
    #[error("failed to spawn subprocess {program}: {reason}")]
    SpawnFailed { program: String, reason: String },

    /// A supervised subprocess exited unexpectedly.
    #[error("subprocess {program} exited unexpectedly (code {code:?})")]
    SubprocessExited { program: String, code: Option<i32> },

    /// The X11 window ID pool was exhausted. Should never happen in
    /// practice; treated as fatal.
    #[error("window ID pool exhausted")]
    WindowIdPoolExhausted,

    /// A raw X11 protocol error that does not fit a more specific variant.
    #[error("X11 protocol error: {0}")]
    Protocol(String),

    /// A property fetched from the X server did not have the shape its
    /// type requires (wrong length, out-of-range enum discriminant).
    #[error("malformed property: {0}")]
    InvalidProperty(String),

    /// A test double ([`crate::x::mock::MockXConn`]) was called on a
    /// method its test did not stub out.
    #[error("mock XConn method not implemented for this test")]
    UnimplementedMock,
}

impl Error {
    /// Whether this error should terminate the event loop rather than be
    /// logged and absorbed locally.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::RootWindowLost(_) | Error::WindowIdPoolExhausted
        )
    }
}
