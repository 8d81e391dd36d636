//! Low-level mouse hook for desktop double-click detection.
//!
//! WH_MOUSE_LL is a process-wide singleton resource: install/uninstall go
//! through guarded statics so there is never more than one live hook, and
//! the handle is always released on mode exit and shutdown. The callback
//! runs on the installing thread inside the system's synchronous hook chain,
//! so it only classifies the click and posts a message back to the main
//! window; the toggle side effect never runs inline.

use crate::click::{ClickClassifier, ClickSample, DoubleClickLimits, WindowProbe};
use crate::error::OsError;
use crate::winutil;
use parking_lot::Mutex;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::debug;
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, POINT, WPARAM};
use windows::Win32::Graphics::Gdi::ScreenToClient;
use windows::Win32::UI::Controls::{LVHITTESTINFO, LVM_HITTEST};
use windows::Win32::UI::Input::KeyboardAndMouse::GetDoubleClickTime;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, GetAncestor, GetSystemMetrics, PostMessageW, SendMessageW,
    SetWindowsHookExW, UnhookWindowsHookEx, WindowFromPoint, GA_PARENT, HHOOK,
    MSLLHOOKSTRUCT, SM_CXDOUBLECLK, SM_CYDOUBLECLK, WH_MOUSE_LL, WM_LBUTTONDOWN,
};

/// Raw hook handle; kept as the pointer value so the static is Send.
static HOOK_HANDLE: OnceLock<Mutex<Option<isize>>> = OnceLock::new();

static HOOK_CONTEXT: OnceLock<Mutex<Option<HookContext>>> = OnceLock::new();

struct HookContext {
    classifier: ClickClassifier,
    /// Window that receives the posted toggle request.
    notify_window: isize,
    notify_message: u32,
    started: Instant,
}

fn handle_slot() -> &'static Mutex<Option<isize>> {
    HOOK_HANDLE.get_or_init(|| Mutex::new(None))
}

fn context_slot() -> &'static Mutex<Option<HookContext>> {
    HOOK_CONTEXT.get_or_init(|| Mutex::new(None))
}

/// Install the hook; double-click hits post `notify_message` to `notify`.
/// Installing while already installed is a no-op.
pub fn install(notify: HWND, notify_message: u32) -> Result<(), OsError> {
    if handle_slot().lock().is_some() {
        return Ok(());
    }

    let limits = unsafe {
        DoubleClickLimits {
            max_interval_ms: GetDoubleClickTime() as u64,
            max_dx: GetSystemMetrics(SM_CXDOUBLECLK),
            max_dy: GetSystemMetrics(SM_CYDOUBLECLK),
        }
    };
    *context_slot().lock() = Some(HookContext {
        classifier: ClickClassifier::new(limits),
        notify_window: notify.0 as isize,
        notify_message,
        started: Instant::now(),
    });

    let hook = unsafe {
        SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_proc), None, 0)
            .map_err(|e| OsError::from_win32("SetWindowsHookExW", e))
    };
    match hook {
        Ok(handle) => {
            *handle_slot().lock() = Some(handle.0 as isize);
            debug!("mouse hook installed");
            Ok(())
        }
        Err(e) => {
            *context_slot().lock() = None;
            Err(e)
        }
    }
}

/// Remove the hook if installed.
pub fn uninstall() {
    if let Some(raw) = handle_slot().lock().take() {
        unsafe {
            let _ = UnhookWindowsHookEx(HHOOK(raw as *mut _));
        }
        debug!("mouse hook uninstalled");
    }
    *context_slot().lock() = None;
}

pub fn is_installed() -> bool {
    handle_slot().lock().is_some()
}

/// Window hierarchy queries backed by the live desktop session.
pub struct LiveWindowProbe;

impl WindowProbe for LiveWindowProbe {
    fn class_name(&self, window: isize) -> Option<String> {
        winutil::class_name(HWND(window as *mut _))
    }

    fn parent(&self, window: isize) -> Option<isize> {
        let parent = unsafe { GetAncestor(HWND(window as *mut _), GA_PARENT) };
        if parent.0.is_null() {
            None
        } else {
            Some(parent.0 as isize)
        }
    }

    fn icon_at(&self, window: isize, x: i32, y: i32) -> Option<bool> {
        let hwnd = HWND(window as *mut _);
        let mut point = POINT { x, y };
        unsafe {
            if !ScreenToClient(hwnd, &mut point).as_bool() {
                return None;
            }
            let mut hit = LVHITTESTINFO {
                pt: point,
                ..Default::default()
            };
            let item = SendMessageW(
                hwnd,
                LVM_HITTEST,
                WPARAM(0),
                LPARAM(&mut hit as *mut LVHITTESTINFO as isize),
            );
            Some(item.0 != -1)
        }
    }
}

unsafe extern "system" fn mouse_proc(n_code: i32, w_param: WPARAM, l_param: LPARAM) -> LRESULT {
    if n_code >= 0 && w_param.0 as u32 == WM_LBUTTONDOWN {
        let info = &*(l_param.0 as *const MSLLHOOKSTRUCT);
        let target = WindowFromPoint(info.pt);

        // try_lock: the hit-test inside `observe` can pump messages and
        // re-enter this callback on the same thread; a blocking lock here
        // would deadlock against our own outer frame.
        let mut notify: Option<(isize, u32)> = None;
        if let Some(mut guard) = context_slot().try_lock() {
            if let Some(ctx) = guard.as_mut() {
                let sample = ClickSample {
                    time_ms: ctx.started.elapsed().as_millis() as u64,
                    x: info.pt.x,
                    y: info.pt.y,
                    window: target.0 as isize,
                };
                if ctx.classifier.observe(sample, &LiveWindowProbe) {
                    notify = Some((ctx.notify_window, ctx.notify_message));
                }
            }
        }
        if let Some((window, message)) = notify {
            // Posted, not executed: the hook chain must not wait on the shell.
            let _ = PostMessageW(HWND(window as *mut _), message, WPARAM(0), LPARAM(0));
        }
    }
    CallNextHookEx(None, n_code, w_param, l_param)
}
