//! Small Win32 helpers shared by the OS-facing modules.

use crate::APP_NAME;
use windows::core::PCWSTR;
use windows::Win32::Foundation::HWND;
use windows::Win32::UI::WindowsAndMessaging::{
    GetClassNameW, MessageBoxW, MB_ICONINFORMATION, MB_ICONWARNING, MB_OK, MB_YESNO,
    MESSAGEBOX_RESULT, IDYES,
};

/// Null-terminated UTF-16 for passing dynamic strings to Win32.
pub fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

pub fn class_name(hwnd: HWND) -> Option<String> {
    let mut buf = [0u16; 256];
    let len = unsafe { GetClassNameW(hwnd, &mut buf) };
    if len <= 0 {
        return None;
    }
    Some(String::from_utf16_lossy(&buf[..len as usize]))
}

/// Modal info/warning box owned by `hwnd` (which may be null at startup).
pub fn message_box(hwnd: HWND, text: &str, warning: bool) {
    let wide = to_wide(text);
    let caption = to_wide(APP_NAME);
    let icon = if warning { MB_ICONWARNING } else { MB_ICONINFORMATION };
    unsafe {
        MessageBoxW(hwnd, PCWSTR(wide.as_ptr()), PCWSTR(caption.as_ptr()), MB_OK | icon);
    }
}

/// Yes/no confirmation; true when the user picked Yes.
pub fn confirm(hwnd: HWND, text: &str) -> bool {
    let wide = to_wide(text);
    let caption = to_wide(APP_NAME);
    let result: MESSAGEBOX_RESULT = unsafe {
        MessageBoxW(
            hwnd,
            PCWSTR(wide.as_ptr()),
            PCWSTR(caption.as_ptr()),
            MB_YESNO | MB_ICONWARNING,
        )
    };
    result == IDYES
}
