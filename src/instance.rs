//! Single-instance enforcement and the cross-process command channel.
//!
//! The first process to create the named mutex becomes the coordinator; any
//! later launch finds the mutex already present, locates the coordinator's
//! hidden window by class name, and posts it a command instead of starting a
//! second coordinator. Delivery is best-effort and unacknowledged; the
//! sender only learns whether a running instance was found.

use crate::error::OsError;
use tracing::{debug, warn};
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{
    CloseHandle, GetLastError, ERROR_ALREADY_EXISTS, FALSE, HANDLE, LPARAM, WPARAM,
};
use windows::Win32::System::Threading::{CreateMutexW, ReleaseMutex};
use windows::Win32::UI::WindowsAndMessaging::{FindWindowW, PostMessageW, RegisterWindowMessageW};

/// Class name of the coordinator's hidden window; also the discovery key for
/// second launches.
pub const WINDOW_CLASS: PCWSTR = w!("DeskToggle.MainWindow");

const MUTEX_NAME: PCWSTR = w!("Local\\DeskToggle.SingleInstance");

/// Commands a second launch can post to the running coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Flip icon visibility.
    Toggle,
    /// Shut the coordinator down.
    Exit,
    /// A plain re-launch happened; let the user know we are already here.
    Activate,
}

/// System-wide message id for `cmd`; identical across processes because the
/// id is derived from the registered message name.
pub fn message_id(cmd: Command) -> u32 {
    let name = match cmd {
        Command::Toggle => w!("DeskToggle.Command.Toggle"),
        Command::Exit => w!("DeskToggle.Command.Exit"),
        Command::Activate => w!("DeskToggle.Command.Activate"),
    };
    unsafe { RegisterWindowMessageW(name) }
}

/// Held by the first instance for its whole lifetime.
pub struct SingleInstance {
    handle: HANDLE,
}

/// `Ok(Some(..))`: we are the first instance and own the mutex.
/// `Ok(None)`: another instance already runs; do not build a coordinator.
pub fn acquire() -> Result<Option<SingleInstance>, OsError> {
    unsafe {
        let handle =
            CreateMutexW(None, FALSE, MUTEX_NAME).map_err(|e| OsError::from_win32("CreateMutexW", e))?;
        if GetLastError() == ERROR_ALREADY_EXISTS {
            let _ = CloseHandle(handle);
            return Ok(None);
        }
        Ok(Some(SingleInstance { handle }))
    }
}

impl Drop for SingleInstance {
    fn drop(&mut self) {
        unsafe {
            let _ = ReleaseMutex(self.handle);
            let _ = CloseHandle(self.handle);
        }
    }
}

/// Post `cmd` to a running coordinator. Returns false when none was found;
/// a true result only means the message was queued, not that it was acted on.
pub fn notify_running(cmd: Command) -> bool {
    unsafe {
        let hwnd = match FindWindowW(WINDOW_CLASS, None) {
            Ok(hwnd) if !hwnd.0.is_null() => hwnd,
            _ => {
                debug!(?cmd, "no running instance found");
                return false;
            }
        };
        match PostMessageW(hwnd, message_id(cmd), WPARAM(0), LPARAM(0)) {
            Ok(()) => {
                debug!(?cmd, "command posted to running instance");
                true
            }
            Err(e) => {
                warn!(?cmd, error = %e, "failed to post command");
                false
            }
        }
    }
}
