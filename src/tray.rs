//! Tray icon, balloon notifications, and the context menu.
//!
//! The icon is bound to the hidden main window: clicks come back as
//! [`TRAY_CALLBACK`], menu picks as `WM_COMMAND` with one of the `CMD_*`
//! ids. The menu is rebuilt from a [`StatusView`] on every open, so check
//! marks always reflect current state. The shell drops icons when Explorer
//! restarts; the owner re-adds on the `TaskbarCreated` broadcast.

use crate::error::OsError;
use crate::status::StatusView;
use crate::winutil::to_wide;
use crate::APP_NAME;
use tracing::debug;
use windows::core::PCWSTR;
use windows::Win32::Foundation::HWND;
use windows::Win32::UI::Shell::{
    Shell_NotifyIconW, NIF_ICON, NIF_INFO, NIF_MESSAGE, NIF_TIP, NIIF_INFO, NIM_ADD,
    NIM_DELETE, NIM_MODIFY, NOTIFYICONDATAW,
};
use windows::Win32::UI::WindowsAndMessaging::{
    AppendMenuW, CheckMenuItem, CheckMenuRadioItem, CreatePopupMenu, DestroyMenu,
    GetCursorPos, LoadIconW, SetForegroundWindow, TrackPopupMenu, HMENU,
    IDI_APPLICATION, MF_BYCOMMAND, MF_CHECKED, MF_SEPARATOR, MF_STRING,
    TPM_BOTTOMALIGN, TPM_RIGHTBUTTON, WM_APP,
};

/// Tray clicks arrive at the owner window with this message; the original
/// mouse event is in the low word of `lParam`.
pub const TRAY_CALLBACK: u32 = WM_APP + 1;

const TRAY_ID: u32 = 1;

// Context menu command ids, delivered via WM_COMMAND.
pub const CMD_TOGGLE: u16 = 0x0100;
pub const CMD_GUIDE: u16 = 0x0101;
pub const CMD_MODE_HOTKEY: u16 = 0x0102;
pub const CMD_MODE_DOUBLE_CLICK: u16 = 0x0103;
pub const CMD_TOGGLE_TOAST: u16 = 0x0104;
pub const CMD_AUTOSTART: u16 = 0x0105;
pub const CMD_UPDATE: u16 = 0x0106;
pub const CMD_RESET: u16 = 0x0107;
pub const CMD_OPEN_CONFIG: u16 = 0x0108;
pub const CMD_EXIT: u16 = 0x0109;

pub struct TrayIcon {
    hwnd: HWND,
    visible: bool,
}

fn base_data(hwnd: HWND) -> NOTIFYICONDATAW {
    let mut data: NOTIFYICONDATAW = unsafe { std::mem::zeroed() };
    data.cbSize = std::mem::size_of::<NOTIFYICONDATAW>() as u32;
    data.hWnd = hwnd;
    data.uID = TRAY_ID;
    data
}

fn copy_utf16(dst: &mut [u16], src: &str) {
    // Leave room for the terminator the zeroed buffer already provides.
    let encoded: Vec<u16> = src.encode_utf16().collect();
    let len = encoded.len().min(dst.len() - 1);
    dst[..len].copy_from_slice(&encoded[..len]);
    for slot in dst[len..].iter_mut() {
        *slot = 0;
    }
}

impl TrayIcon {
    pub fn new(hwnd: HWND) -> Self {
        Self {
            hwnd,
            visible: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Add the icon if missing, otherwise just refresh the tooltip.
    pub fn ensure(&mut self, tooltip: &str) -> Result<(), OsError> {
        if self.visible {
            self.set_tooltip(tooltip);
            return Ok(());
        }
        let mut data = base_data(self.hwnd);
        data.uFlags = NIF_MESSAGE | NIF_ICON | NIF_TIP;
        data.uCallbackMessage = TRAY_CALLBACK;
        data.hIcon = unsafe { LoadIconW(None, IDI_APPLICATION).unwrap_or_default() };
        copy_utf16(&mut data.szTip, tooltip);
        let ok = unsafe { Shell_NotifyIconW(NIM_ADD, &data) };
        if !ok.as_bool() {
            return Err(OsError::last_error("Shell_NotifyIconW"));
        }
        self.visible = true;
        debug!("tray icon added");
        Ok(())
    }

    pub fn remove(&mut self) {
        if !self.visible {
            return;
        }
        let data = base_data(self.hwnd);
        unsafe {
            let _ = Shell_NotifyIconW(NIM_DELETE, &data);
        }
        self.visible = false;
    }

    /// Explorer restarted and dropped every tray icon; add ours back.
    pub fn re_add(&mut self, tooltip: &str) -> Result<(), OsError> {
        self.visible = false;
        self.ensure(tooltip)
    }

    pub fn set_tooltip(&self, tooltip: &str) {
        if !self.visible {
            return;
        }
        let mut data = base_data(self.hwnd);
        data.uFlags = NIF_TIP;
        copy_utf16(&mut data.szTip, tooltip);
        unsafe {
            let _ = Shell_NotifyIconW(NIM_MODIFY, &data);
        }
    }

    /// Transient balloon notification.
    pub fn balloon(&self, text: &str) {
        if !self.visible {
            return;
        }
        let mut data = base_data(self.hwnd);
        data.uFlags = NIF_INFO;
        data.dwInfoFlags = NIIF_INFO;
        copy_utf16(&mut data.szInfo, text);
        copy_utf16(&mut data.szInfoTitle, APP_NAME);
        unsafe {
            let _ = Shell_NotifyIconW(NIM_MODIFY, &data);
        }
    }
}

fn append(menu: HMENU, id: u16, label: &str) {
    let wide = to_wide(label);
    unsafe {
        let _ = AppendMenuW(menu, MF_STRING, id as usize, PCWSTR(wide.as_ptr()));
    }
}

fn append_separator(menu: HMENU) {
    unsafe {
        let _ = AppendMenuW(menu, MF_SEPARATOR, 0, PCWSTR::null());
    }
}

/// Build and track the context menu at the cursor. The selection arrives
/// back at `hwnd` as `WM_COMMAND`.
pub fn show_menu(hwnd: HWND, view: &StatusView) {
    unsafe {
        let Ok(menu) = CreatePopupMenu() else {
            return;
        };

        append(menu, CMD_TOGGLE, "Toggle desktop icons now");
        append(menu, CMD_GUIDE, "Quick start guide");
        append_separator(menu);
        append(menu, CMD_MODE_HOTKEY, "Mode: global hotkey");
        append(menu, CMD_MODE_DOUBLE_CLICK, "Mode: desktop double-click");
        append(menu, CMD_TOGGLE_TOAST, "Notify on toggle");
        append(menu, CMD_AUTOSTART, "Run at startup");
        append(menu, CMD_UPDATE, &view.update_label);
        append(menu, CMD_RESET, "Restore default settings");
        append(menu, CMD_OPEN_CONFIG, "Open config file");
        append_separator(menu);
        append(menu, CMD_EXIT, "Exit");

        let checked_mode = if view.double_click_mode_checked {
            CMD_MODE_DOUBLE_CLICK
        } else {
            CMD_MODE_HOTKEY
        };
        let _ = CheckMenuRadioItem(
            menu,
            CMD_MODE_HOTKEY as u32,
            CMD_MODE_DOUBLE_CLICK as u32,
            checked_mode as u32,
            MF_BYCOMMAND.0,
        );
        if view.toast_checked {
            CheckMenuItem(menu, CMD_TOGGLE_TOAST as u32, (MF_BYCOMMAND | MF_CHECKED).0);
        }
        if view.autostart_checked {
            CheckMenuItem(menu, CMD_AUTOSTART as u32, (MF_BYCOMMAND | MF_CHECKED).0);
        }
        if view.update_checks_checked {
            CheckMenuItem(menu, CMD_UPDATE as u32, (MF_BYCOMMAND | MF_CHECKED).0);
        }

        // Required before TrackPopupMenu so the menu dismisses when the user
        // clicks elsewhere.
        let _ = SetForegroundWindow(hwnd);
        let mut pt = std::mem::zeroed();
        let _ = GetCursorPos(&mut pt);
        let _ = TrackPopupMenu(
            menu,
            TPM_RIGHTBUTTON | TPM_BOTTOMALIGN,
            pt.x,
            pt.y,
            0,
            hwnd,
            None,
        );
        let _ = DestroyMenu(menu);
    }
}
