//! Run-at-startup registration via the HKCU Run key.

use crate::error::OsError;
use crate::winutil::to_wide;
use windows::core::{w, PCWSTR};
use windows::Win32::System::Registry::{
    RegCloseKey, RegCreateKeyExW, RegDeleteValueW, RegOpenKeyExW, RegQueryValueExW,
    RegSetValueExW, HKEY, HKEY_CURRENT_USER, KEY_QUERY_VALUE, KEY_SET_VALUE,
    KEY_WOW64_64KEY, REG_OPTION_NON_VOLATILE, REG_SZ,
};

const RUN_KEY: PCWSTR = w!("Software\\Microsoft\\Windows\\CurrentVersion\\Run");
const RUN_VALUE: PCWSTR = w!("DeskToggle");

struct Key(HKEY);

impl Drop for Key {
    fn drop(&mut self) {
        unsafe {
            let _ = RegCloseKey(self.0);
        }
    }
}

/// Register the current executable to start with the session.
pub fn enable() -> Result<(), OsError> {
    let exe = std::env::current_exe().map_err(|_| OsError::new("current_exe", 0))?;
    let command = format!("\"{}\"", exe.display());
    let data = to_wide(&command);
    // REG_SZ payload is the UTF-16 bytes including the terminator.
    let bytes =
        unsafe { std::slice::from_raw_parts(data.as_ptr() as *const u8, data.len() * 2) };

    unsafe {
        let mut hkey = HKEY::default();
        let status = RegCreateKeyExW(
            HKEY_CURRENT_USER,
            RUN_KEY,
            0,
            PCWSTR::null(),
            REG_OPTION_NON_VOLATILE,
            KEY_SET_VALUE | KEY_WOW64_64KEY,
            None,
            &mut hkey,
            None,
        );
        if status.is_err() {
            return Err(OsError::new("RegCreateKeyExW", status.0 as i32));
        }
        let key = Key(hkey);
        let status = RegSetValueExW(key.0, RUN_VALUE, 0, REG_SZ, Some(bytes));
        if status.is_err() {
            return Err(OsError::new("RegSetValueExW", status.0 as i32));
        }
    }
    Ok(())
}

/// Remove the startup registration; missing key or value is fine.
pub fn disable() -> Result<(), OsError> {
    unsafe {
        let mut hkey = HKEY::default();
        let status = RegOpenKeyExW(
            HKEY_CURRENT_USER,
            RUN_KEY,
            0,
            KEY_SET_VALUE | KEY_WOW64_64KEY,
            &mut hkey,
        );
        if status.is_err() {
            return Ok(());
        }
        let key = Key(hkey);
        let _ = RegDeleteValueW(key.0, RUN_VALUE);
    }
    Ok(())
}

/// Whether a startup registration currently exists.
pub fn is_enabled() -> bool {
    unsafe {
        let mut hkey = HKEY::default();
        let status = RegOpenKeyExW(
            HKEY_CURRENT_USER,
            RUN_KEY,
            0,
            KEY_QUERY_VALUE | KEY_WOW64_64KEY,
            &mut hkey,
        );
        if status.is_err() {
            return false;
        }
        let key = Key(hkey);
        let mut size = 0u32;
        RegQueryValueExW(key.0, RUN_VALUE, None, None, None, Some(&mut size)).is_ok() && size > 0
    }
}

/// Flip the registration to `desired`.
pub fn set_enabled(desired: bool) -> Result<(), OsError> {
    if desired {
        enable()
    } else {
        disable()
    }
}
