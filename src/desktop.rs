//! Desktop icon host discovery and the visibility toggle itself.
//!
//! The desktop icons live in a `SysListView32` inside `SHELLDLL_DefView`,
//! hosted by either `Progman` or one of the `WorkerW` windows (the host moves
//! when wallpaper slideshow or Spotlight is active). The toggle is the
//! shell's own command: `WM_COMMAND` 0x7402 posted at the host, the same
//! message the desktop context menu's "Show desktop icons" item sends.

use crate::error::OsError;
use tracing::debug;
use windows::core::w;
use windows::Win32::Foundation::{HWND, LPARAM, WPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    FindWindowExW, FindWindowW, IsWindowVisible, SendMessageW, WM_COMMAND,
};

/// Shell command id that flips desktop icon visibility.
const TOGGLE_DESKTOP_ICONS: usize = 0x7402;

fn list_view_under(parent: HWND) -> Option<HWND> {
    unsafe {
        let shell_view = FindWindowExW(parent, HWND::default(), w!("SHELLDLL_DefView"), None).ok()?;
        FindWindowExW(shell_view, HWND::default(), w!("SysListView32"), None).ok()
    }
}

/// Locate the desktop icon list-view, trying `Progman` first and then every
/// `WorkerW` top-level window.
pub fn find_icon_list() -> Option<HWND> {
    unsafe {
        if let Ok(progman) = FindWindowW(w!("Progman"), None) {
            if let Some(list) = list_view_under(progman) {
                return Some(list);
            }
        }

        let mut worker = HWND::default();
        loop {
            match FindWindowExW(HWND::default(), worker, w!("WorkerW"), None) {
                Ok(hwnd) if !hwnd.0.is_null() => {
                    worker = hwnd;
                    if let Some(list) = list_view_under(worker) {
                        return Some(list);
                    }
                }
                _ => break,
            }
        }
        None
    }
}

/// Ask the shell to flip icon visibility. Fire-and-forget: the shell redraws
/// on its own schedule, so callers re-query after a settle delay.
pub fn toggle_icons() -> Result<(), OsError> {
    unsafe {
        let host = FindWindowW(w!("Progman"), None)
            .ok()
            .filter(|h| !h.0.is_null())
            .or_else(|| {
                FindWindowW(w!("WorkerW"), None)
                    .ok()
                    .filter(|h| !h.0.is_null())
            })
            .ok_or_else(|| OsError::last_error("FindWindowW"))?;
        SendMessageW(host, WM_COMMAND, WPARAM(TOGGLE_DESKTOP_ICONS), LPARAM(0));
        debug!("toggle command sent to desktop host");
        Ok(())
    }
}

/// Current icon visibility; `None` when the list-view cannot be found.
pub fn icons_visible() -> Option<bool> {
    let list = find_icon_list()?;
    Some(unsafe { IsWindowVisible(list).as_bool() })
}
