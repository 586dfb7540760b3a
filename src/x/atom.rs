//! EWMH and ICCCM atom names, plus the pekwm-specific extensions this
//! window manager requires (`PEKWM_*`, `_PEKWM_CMD`).
use strum_macros::{AsRefStr, EnumIter, EnumString};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString, EnumIter)]
pub enum Atom {
    // ICCCM
    #[strum(serialize = "WM_STATE")]
    WmState,
    #[strum(serialize = "WM_CHANGE_STATE")]
    WmChangeState,
    #[strum(serialize = "WM_PROTOCOLS")]
    WmProtocols,
    #[strum(serialize = "WM_DELETE_WINDOW")]
    WmDeleteWindow,
    #[strum(serialize = "WM_TAKE_FOCUS")]
    WmTakeFocus,
    #[strum(serialize = "WM_CLASS")]
    WmClass,
    #[strum(serialize = "WM_NAME")]
    WmName,
    #[strum(serialize = "WM_HINTS")]
    WmHints,
    #[strum(serialize = "WM_NORMAL_HINTS")]
    WmNormalHints,
    #[strum(serialize = "WM_TRANSIENT_FOR")]
    WmTransientFor,
    #[strum(serialize = "WM_CLIENT_LEADER")]
    WmClientLeader,
    #[strum(serialize = "WM_WINDOW_ROLE")]
    WmWindowRole,

    // EWMH root properties
    #[strum(serialize = "_NET_SUPPORTED")]
    NetSupported,
    #[strum(serialize = "_NET_NUMBER_OF_DESKTOPS")]
    NetNumberOfDesktops,
    #[strum(serialize = "_NET_CURRENT_DESKTOP")]
    NetCurrentDesktop,
    #[strum(serialize = "_NET_DESKTOP_NAMES")]
    NetDesktopNames,
    #[strum(serialize = "_NET_DESKTOP_LAYOUT")]
    NetDesktopLayout,
    #[strum(serialize = "_NET_CLIENT_LIST")]
    NetClientList,
    #[strum(serialize = "_NET_CLIENT_LIST_STACKING")]
    NetClientListStacking,
    #[strum(serialize = "_NET_ACTIVE_WINDOW")]
    NetActiveWindow,
    #[strum(serialize = "_NET_WORKAREA")]
    NetWorkarea,
    #[strum(serialize = "_NET_SUPPORTING_WM_CHECK")]
    NetSupportingWmCheck,
    #[strum(serialize = "_NET_FRAME_EXTENTS")]
    NetFrameExtents,
    #[strum(serialize = "_NET_REQUEST_FRAME_EXTENTS")]
    NetRequestFrameExtents,
    #[strum(serialize = "_NET_RESTACK_WINDOW")]
    NetRestackWindow,
    #[strum(serialize = "_NET_CLOSE_WINDOW")]
    NetCloseWindow,

    // EWMH per-client properties
    #[strum(serialize = "_NET_WM_DESKTOP")]
    NetWmDesktop,
    #[strum(serialize = "_NET_WM_STATE")]
    NetWmState,
    #[strum(serialize = "_NET_WM_ALLOWED_ACTIONS")]
    NetWmAllowedActions,
    #[strum(serialize = "_NET_WM_STRUT")]
    NetWmStrut,
    #[strum(serialize = "_NET_WM_STRUT_PARTIAL")]
    NetWmStrutPartial,
    #[strum(serialize = "_NET_WM_WINDOW_TYPE")]
    NetWmWindowType,
    #[strum(serialize = "_NET_WM_NAME")]
    NetWmName,
    #[strum(serialize = "_NET_WM_VISIBLE_NAME")]
    NetWmVisibleName,
    #[strum(serialize = "_NET_WM_PID")]
    NetWmPid,

    // _NET_WM_ALLOWED_ACTIONS members
    #[strum(serialize = "_NET_WM_ACTION_MOVE")]
    NetWmActionMove,
    #[strum(serialize = "_NET_WM_ACTION_RESIZE")]
    NetWmActionResize,
    #[strum(serialize = "_NET_WM_ACTION_MINIMIZE")]
    NetWmActionMinimize,
    #[strum(serialize = "_NET_WM_ACTION_SHADE")]
    NetWmActionShade,
    #[strum(serialize = "_NET_WM_ACTION_STICK")]
    NetWmActionStick,
    #[strum(serialize = "_NET_WM_ACTION_MAXIMIZE_HORZ")]
    NetWmActionMaximizeHorz,
    #[strum(serialize = "_NET_WM_ACTION_MAXIMIZE_VERT")]
    NetWmActionMaximizeVert,
    #[strum(serialize = "_NET_WM_ACTION_FULLSCREEN")]
    NetWmActionFullscreen,
    #[strum(serialize = "_NET_WM_ACTION_CHANGE_DESKTOP")]
    NetWmActionChangeDesktop,
    #[strum(serialize = "_NET_WM_ACTION_CLOSE")]
    NetWmActionClose,

    // _NET_WM_STATE atoms carried in client messages
    #[strum(serialize = "_NET_WM_STATE_MAXIMIZED_HORZ")]
    NetWmStateMaximizedHorz,
    #[strum(serialize = "_NET_WM_STATE_MAXIMIZED_VERT")]
    NetWmStateMaximizedVert,
    #[strum(serialize = "_NET_WM_STATE_FULLSCREEN")]
    NetWmStateFullscreen,
    #[strum(serialize = "_NET_WM_STATE_SHADED")]
    NetWmStateShaded,
    #[strum(serialize = "_NET_WM_STATE_STICKY")]
    NetWmStateSticky,
    #[strum(serialize = "_NET_WM_STATE_SKIP_TASKBAR")]
    NetWmStateSkipTaskbar,
    #[strum(serialize = "_NET_WM_STATE_SKIP_PAGER")]
    NetWmStateSkipPager,
    #[strum(serialize = "_NET_WM_STATE_DEMANDS_ATTENTION")]
    NetWmStateDemandsAttention,

    // pekwm-specific
    #[strum(serialize = "_PEKWM_FRAME_ID")]
    PekwmFrameId,
    #[strum(serialize = "_PEKWM_FRAME_ORDER")]
    PekwmFrameOrder,
    #[strum(serialize = "_PEKWM_FRAME_ACTIVE")]
    PekwmFrameActive,
    #[strum(serialize = "_PEKWM_FRAME_DECOR")]
    PekwmFrameDecor,
    #[strum(serialize = "_PEKWM_TITLE")]
    PekwmTitle,
    #[strum(serialize = "_PEKWM_THEME_VARIANT")]
    PekwmThemeVariant,
    #[strum(serialize = "_PEKWM_CMD")]
    PekwmCmd,
}

impl Atom {
    pub fn name(&self) -> &str {
        self.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn round_trips_through_its_wire_name() {
        for atom in [Atom::NetWmState, Atom::PekwmCmd, Atom::WmTransientFor] {
            let parsed = Atom::from_str(atom.name()).unwrap();
            assert_eq!(parsed, atom);
        }
    }
}
