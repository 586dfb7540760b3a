//! Signal handling and subprocess reaping. The core is single-threaded; signal delivery only
//! ever sets flags checked at the top of the event loop, never runs logic
//! directly on the signal handler's stack.
use std::collections::HashMap;

use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use tracing::{debug, warn};

use crate::Result;

static SIGNAL_FLAGS: [std::sync::atomic::AtomicBool; 4] = [
    std::sync::atomic::AtomicBool::new(false), // shutdown
    std::sync::atomic::AtomicBool::new(false), // reload
    std::sync::atomic::AtomicBool::new(false), // restart
    std::sync::atomic::AtomicBool::new(false), // reap children
];

const SHUTDOWN: usize = 0;
const RELOAD: usize = 1;
const RESTART: usize = 2;
const REAP: usize = 3;

extern "C" fn on_terminate(_: i32) {
    SIGNAL_FLAGS[SHUTDOWN].store(true, std::sync::atomic::Ordering::SeqCst);
}

extern "C" fn on_hup(_: i32) {
    SIGNAL_FLAGS[RELOAD].store(true, std::sync::atomic::Ordering::SeqCst);
}

extern "C" fn on_chld(_: i32) {
    SIGNAL_FLAGS[REAP].store(true, std::sync::atomic::Ordering::SeqCst);
}

/// What the event loop should do in response to signals observed since the
/// last call to [`Signals::take_pending`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingSignals {
    pub shutdown: bool,
    pub reload: bool,
    pub restart: bool,
    pub reap_children: bool,
}

impl PendingSignals {
    pub fn any(&self) -> bool {
        self.shutdown || self.reload || self.restart || self.reap_children
    }
}

/// Installs `SIGINT`/`SIGTERM`/`SIGHUP`/`SIGCHLD` handlers and tracks the
/// pids of supervised subprocesses (background painter, tray helper,
/// `pekwm_dialog`) so a `SIGCHLD` can be resolved to "which one exited".
pub struct Signals {
    supervised: HashMap<Pid, String>,
}

impl Signals {
    /// Install the signal handlers. Should be called exactly once, before
    /// the event loop starts.
    pub fn install() -> Result<Self> {
        let term_action = SigAction::new(
            SigHandler::Handler(on_terminate),
            SaFlags::empty(),
            SigSet::empty(),
        );
        let hup_action = SigAction::new(
            SigHandler::Handler(on_hup),
            SaFlags::empty(),
            SigSet::empty(),
        );
        let chld_action = SigAction::new(
            SigHandler::Handler(on_chld),
            SaFlags::empty(),
            SigSet::empty(),
        );

        unsafe {
            signal::sigaction(Signal::SIGINT, &term_action)
                .map_err(|e| crate::Error::Protocol(format!("sigaction SIGINT: {e}")))?;
            signal::sigaction(Signal::SIGTERM, &term_action)
                .map_err(|e| crate::Error::Protocol(format!("sigaction SIGTERM: {e}")))?;
            signal::sigaction(Signal::SIGHUP, &hup_action)
                .map_err(|e| crate::Error::Protocol(format!("sigaction SIGHUP: {e}")))?;
            signal::sigaction(Signal::SIGCHLD, &chld_action)
                .map_err(|e| crate::Error::Protocol(format!("sigaction SIGCHLD: {e}")))?;
        }

        Ok(Self {
            supervised: HashMap::new(),
        })
    }

    /// Track a spawned helper process so its exit can be logged by name.
    pub fn supervise(&mut self, pid: Pid, program: impl Into<String>) {
        self.supervised.insert(pid, program.into());
    }

    /// Drain every flag set since the last call and reset them. Reaping
    /// runs here too (non-blocking): a `SIGCHLD` only tells us *a* child
    /// exited, so every known pid is polled with `WNOHANG`.
    pub fn take_pending(&mut self) -> PendingSignals {
        use std::sync::atomic::Ordering::SeqCst;

        let pending = PendingSignals {
            shutdown: SIGNAL_FLAGS[SHUTDOWN].swap(false, SeqCst),
            reload: SIGNAL_FLAGS[RELOAD].swap(false, SeqCst),
            restart: SIGNAL_FLAGS[RESTART].swap(false, SeqCst),
            reap_children: SIGNAL_FLAGS[REAP].swap(false, SeqCst),
        };

        if pending.reap_children {
            self.reap();
        }

        pending
    }

    fn reap(&mut self) {
        let mut exited = Vec::new();

        for (&pid, program) in self.supervised.iter() {
            match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::Exited(_, code)) => {
                    debug!(%program, code, "supervised subprocess exited");
                    exited.push(pid);
                }
                Ok(WaitStatus::Signaled(_, sig, _)) => {
                    warn!(%program, ?sig, "supervised subprocess killed by signal");
                    exited.push(pid);
                }
                Ok(WaitStatus::StillAlive) | Err(_) => {}
                _ => {}
            }
        }

        for pid in exited {
            self.supervised.remove(&pid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_any_is_false_when_nothing_set() {
        assert!(!PendingSignals::default().any());
    }

    #[test]
    fn pending_any_is_true_when_shutdown_set() {
        let pending = PendingSignals {
            shutdown: true,
            ..Default::default()
        };
        assert!(pending.any());
    }
}
