//! Fullscreen-foreground heuristic.
//!
//! A toggle triggered by a desktop double click is suppressed while a
//! fullscreen application holds the foreground, so stray clicks in a game
//! never rearrange the desktop underneath it. "Fullscreen" means the
//! foreground window's size matches its monitor's size within a per-axis
//! tolerance. Every query failure answers "not fullscreen": the guard fails
//! open rather than swallowing toggles.

/// Axis-wise size comparison between a window and its monitor.
pub fn covers_monitor(win_w: i32, win_h: i32, mon_w: i32, mon_h: i32, tolerance: i32) -> bool {
    (win_w - mon_w).abs() <= tolerance && (win_h - mon_h).abs() <= tolerance
}

#[cfg(windows)]
mod foreground {
    use super::covers_monitor;
    use tracing::debug;
    use windows::Win32::Foundation::RECT;
    use windows::Win32::Graphics::Gdi::{
        GetMonitorInfoW, MonitorFromWindow, MONITORINFO, MONITOR_DEFAULTTONEAREST,
    };
    use windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowRect};

    /// Does the current foreground window cover its monitor within
    /// `tolerance` pixels per axis?
    pub fn foreground_is_fullscreen(tolerance: i32) -> bool {
        unsafe {
            let fg = GetForegroundWindow();
            if fg.0.is_null() {
                return false;
            }
            let mut rect = RECT::default();
            if GetWindowRect(fg, &mut rect).is_err() {
                return false;
            }
            let monitor = MonitorFromWindow(fg, MONITOR_DEFAULTTONEAREST);
            if monitor.0.is_null() {
                return false;
            }
            let mut info = MONITORINFO {
                cbSize: std::mem::size_of::<MONITORINFO>() as u32,
                ..Default::default()
            };
            if !GetMonitorInfoW(monitor, &mut info).as_bool() {
                return false;
            }
            let m = info.rcMonitor;
            let fullscreen = covers_monitor(
                rect.right - rect.left,
                rect.bottom - rect.top,
                m.right - m.left,
                m.bottom - m.top,
                tolerance,
            );
            if fullscreen {
                debug!("foreground window covers its monitor");
            }
            fullscreen
        }
    }
}

#[cfg(windows)]
pub use foreground::foreground_is_fullscreen;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_suppresses_at_zero_tolerance() {
        assert!(covers_monitor(1920, 1080, 1920, 1080, 0));
    }

    #[test]
    fn tolerance_bounds_each_axis() {
        // 10px smaller than the monitor: outside tolerance 3, inside 10.
        assert!(!covers_monitor(1910, 1070, 1920, 1080, 3));
        assert!(covers_monitor(1910, 1070, 1920, 1080, 10));
    }

    #[test]
    fn axes_are_independent() {
        // Width matches, height is a taskbar short: not fullscreen.
        assert!(!covers_monitor(1920, 1040, 1920, 1080, 3));
        // Height matches, width off by a docked sidebar: not fullscreen.
        assert!(!covers_monitor(1600, 1080, 1920, 1080, 3));
    }

    #[test]
    fn oversized_windows_count_within_tolerance() {
        assert!(covers_monitor(1922, 1082, 1920, 1080, 2));
        assert!(!covers_monitor(1930, 1080, 1920, 1080, 2));
    }
}
