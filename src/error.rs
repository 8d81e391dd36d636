//! Typed failure condition for Win32 calls.
//!
//! Every OS-facing operation reports failures as an [`OsError`] carrying the
//! name of the originating call and the platform error code. Callers decide
//! whether to log, surface a warning dialog, or retry later; nothing in this
//! crate treats an `OsError` as fatal after startup.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{op} failed (error code {code})")]
pub struct OsError {
    /// Name of the Win32 call that failed, e.g. `"RegisterHotKey"`.
    pub op: &'static str,
    pub code: i32,
}

impl OsError {
    pub fn new(op: &'static str, code: i32) -> Self {
        Self { op, code }
    }
}

#[cfg(windows)]
impl OsError {
    /// Capture the calling thread's last-error code for `op`.
    pub fn last_error(op: &'static str) -> Self {
        let code = unsafe { windows::Win32::Foundation::GetLastError() };
        Self { op, code: code.0 as i32 }
    }

    pub fn from_win32(op: &'static str, err: windows::core::Error) -> Self {
        Self { op, code: err.code().0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_operation_and_code() {
        let err = OsError::new("SetWindowsHookExW", 5);
        assert_eq!(err.to_string(), "SetWindowsHookExW failed (error code 5)");
    }
}
