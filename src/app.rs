//! The coordinator: hidden window, message loop, and command handling.
//!
//! Every UI-visible transition (hotkey fire, hook hit, tray click, menu
//! pick, cross-process command) arrives on this window's message queue and
//! is handled strictly sequentially, so the components need no locking
//! against each other. Application state lives in a thread-local slot owned
//! by the loop thread; handlers snapshot what they need and drop the borrow
//! before anything that can re-enter the window procedure (message boxes,
//! popup menus).

use crate::config::{Config, Mode};
use crate::error::OsError;
use crate::hotkey::{self, HotkeyBinding};
use crate::mode::{Detection, ModeController};
use crate::status;
use crate::updater::{self, UpdateSlot};
use crate::{autostart, desktop, fullscreen, instance, tray, winutil, APP_NAME};
use anyhow::{anyhow, Result};
use std::cell::RefCell;
use std::time::Duration;
use tracing::{error, info, warn};
use windows::core::w;
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW,
    LoadCursorW, PostMessageW, PostQuitMessage, RegisterClassW, RegisterWindowMessageW,
    TranslateMessage, UnregisterClassW, IDC_ARROW, MSG, WINDOW_EX_STYLE, WM_APP,
    WM_COMMAND, WM_CREATE, WM_DESTROY, WM_HOTKEY, WM_LBUTTONDBLCLK, WM_LBUTTONUP,
    WM_RBUTTONUP, WNDCLASSW, WS_OVERLAPPED,
};

/// Posted by the mouse hook when a double click lands on blank desktop.
pub const WM_TOGGLE_REQUEST: u32 = WM_APP + 2;
/// Posted by the update worker once a release is in the shared slot.
pub const WM_UPDATE_READY: u32 = WM_APP + 3;

const HOTKEY_ID: i32 = 1;

/// The shell needs a moment to show/hide the list-view after the toggle
/// command; visibility is re-read after this delay.
const SETTLE_DELAY: Duration = Duration::from_millis(50);

thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
}

/// Production wiring of the two detection mechanisms.
struct WinDetection {
    hwnd: HWND,
}

impl Detection for WinDetection {
    fn arm_hotkey(&mut self, binding: &HotkeyBinding) -> Result<(), OsError> {
        hotkey::register(self.hwnd, HOTKEY_ID, binding)
    }

    fn disarm_hotkey(&mut self) {
        hotkey::unregister(self.hwnd, HOTKEY_ID);
    }

    fn arm_double_click(&mut self) -> Result<(), OsError> {
        crate::hook::install(self.hwnd, WM_TOGGLE_REQUEST)
    }

    fn disarm_double_click(&mut self) {
        crate::hook::uninstall();
    }
}

struct App {
    hwnd: HWND,
    cfg: Config,
    /// Last successfully parsed shortcut; kept registered when a newly
    /// configured string fails to parse.
    binding: HotkeyBinding,
    mode: ModeController<WinDetection>,
    tray: tray::TrayIcon,
    icons_visible: bool,
    update: UpdateSlot,
    msg_toggle: u32,
    msg_exit: u32,
    msg_activate: u32,
    taskbar_created_msg: u32,
}

/// Start the coordinator and run the message loop until exit.
///
/// Window-class registration or window creation failing here is the one
/// fatal condition: without the hidden window nothing else can function.
pub fn run() -> Result<()> {
    unsafe {
        let hinstance: HINSTANCE = GetModuleHandleW(None)
            .map_err(|e| anyhow!("GetModuleHandleW failed: {e}"))?
            .into();
        let wc = WNDCLASSW {
            lpfnWndProc: Some(wndproc),
            hInstance: hinstance,
            hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
            lpszClassName: instance::WINDOW_CLASS,
            ..Default::default()
        };
        if RegisterClassW(&wc) == 0 {
            return Err(OsError::last_error("RegisterClassW").into());
        }

        let created = CreateWindowExW(
            WINDOW_EX_STYLE(0),
            instance::WINDOW_CLASS,
            instance::WINDOW_CLASS,
            WS_OVERLAPPED,
            0,
            0,
            0,
            0,
            None,
            None,
            hinstance,
            None,
        );
        let hwnd = match created {
            Ok(hwnd) => hwnd,
            Err(e) => {
                let _ = UnregisterClassW(instance::WINDOW_CLASS, hinstance);
                return Err(OsError::from_win32("CreateWindowExW", e).into());
            }
        };

        // WM_CREATE stored the state; now apply config and greet the user.
        finish_startup(hwnd);

        let mut msg = MSG::default();
        while GetMessageW(&mut msg, None, 0, 0).into() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
        let _ = UnregisterClassW(instance::WINDOW_CLASS, hinstance);
    }
    Ok(())
}

fn bootstrap(hwnd: HWND) {
    let cfg = Config::load();
    info!(?cfg, "configuration loaded");

    let binding = hotkey::parse(crate::config::DEFAULT_HOTKEY).expect("default hotkey parses");
    let app = App {
        hwnd,
        cfg,
        binding,
        mode: ModeController::new(WinDetection { hwnd }),
        tray: tray::TrayIcon::new(hwnd),
        icons_visible: desktop::icons_visible().unwrap_or(true),
        update: updater::new_slot(),
        msg_toggle: instance::message_id(instance::Command::Toggle),
        msg_exit: instance::message_id(instance::Command::Exit),
        msg_activate: instance::message_id(instance::Command::Activate),
        taskbar_created_msg: unsafe { RegisterWindowMessageW(w!("TaskbarCreated")) },
    };
    APP.with(|slot| *slot.borrow_mut() = Some(app));
}

fn finish_startup(hwnd: HWND) {
    let applied = APP.with(|slot| {
        slot.borrow_mut()
            .as_mut()
            .map(|app| apply_config(app, true))
    });
    let Some((warnings, show_guide)) = applied else {
        return;
    };
    for text in warnings {
        winutil::message_box(hwnd, &text, true);
    }
    if show_guide {
        show_guide_box(hwnd);
    }
}

/// Push the current config into every subsystem. Returns user-facing
/// warnings and whether the first-run guide should be shown; the caller
/// displays both after releasing the state borrow.
fn apply_config(app: &mut App, initial: bool) -> (Vec<String>, bool) {
    app.cfg.normalize();
    let mut warnings = Vec::new();

    if app.cfg.show_tray_icon {
        let tooltip = current_view(app).tooltip;
        if let Err(e) = app.tray.ensure(&tooltip) {
            warn!(error = %e, "failed to show tray icon");
        }
    } else {
        app.tray.remove();
    }

    match hotkey::parse(&app.cfg.hotkey) {
        Ok(binding) => app.binding = binding,
        Err(e) => {
            error!(hotkey = %app.cfg.hotkey, error = %e, "hotkey parse failed");
            warnings.push(format!("Could not use the configured hotkey: {e}"));
        }
    }

    if let Err(e) = app.mode.apply(app.cfg.mode, &app.binding) {
        error!(error = %e, mode = ?app.cfg.mode, "detection mechanism failed to arm");
        warnings.push(match app.cfg.mode {
            Mode::Hotkey => {
                "The hotkey could not be registered; it may conflict with another application."
                    .to_string()
            }
            Mode::DesktopDoubleClick => {
                "The mouse hook could not be installed; try restarting the application."
                    .to_string()
            }
        });
    }

    if app.cfg.auto_start {
        let actual = autostart::is_enabled();
        if !actual {
            warn!("autostart registration is missing, adopting actual state");
            app.cfg.auto_start = false;
            warnings.extend(persist(app));
        }
    }

    if app.cfg.check_updates {
        start_update_check(app);
    }

    let show_guide = initial && app.cfg.show_first_run_guide;
    if show_guide {
        app.cfg.show_first_run_guide = false;
        warnings.extend(persist(app));
    }

    (warnings, show_guide)
}

fn current_view(app: &App) -> status::StatusView {
    let update = app.update.lock();
    status::project(&app.cfg, app.icons_visible, update.as_ref())
}

fn refresh_tray(app: &App) {
    if app.tray.is_visible() {
        app.tray.set_tooltip(&current_view(app).tooltip);
    }
}

/// Save the config and refresh the tray; returns a user-facing warning on
/// save failure for the caller to display once its borrow is released.
fn persist(app: &mut App) -> Option<String> {
    let warning = match app.cfg.save() {
        Ok(()) => {
            info!("configuration saved");
            None
        }
        Err(e) => {
            error!(error = %e, "failed to save configuration");
            Some(format!("Failed to save settings: {e}"))
        }
    };
    refresh_tray(app);
    warning
}

fn start_update_check(app: &App) {
    let slot = app.update.clone();
    let hwnd = app.hwnd.0 as isize;
    updater::spawn_check(slot, move || unsafe {
        let _ = PostMessageW(
            HWND(hwnd as *mut _),
            WM_UPDATE_READY,
            WPARAM(0),
            LPARAM(0),
        );
    });
}

fn show_guide_box(hwnd: HWND) {
    let text = format!(
        "Welcome to {APP_NAME}!\n\n\
         \u{2022} Press Ctrl+Alt+F1 to toggle desktop icons\n\
         \u{2022} Right-click the tray icon to change the mode and settings\n\
         \u{2022} Double-click on empty desktop space also toggles (when enabled)",
    );
    winutil::message_box(hwnd, &text, false);
}

/// Central toggle path; every trigger funnels here.
fn handle_toggle_request(hwnd: HWND) {
    struct Plan {
        guard_fullscreen: bool,
        tolerance: i32,
        toast: bool,
    }
    let plan = APP.with(|slot| {
        slot.borrow().as_ref().map(|app| Plan {
            guard_fullscreen: app.mode.mode() == Some(Mode::DesktopDoubleClick)
                && app.cfg.suppress_in_fullscreen,
            tolerance: app.cfg.fullscreen_tolerance,
            toast: app.cfg.show_toggle_toast,
        })
    });
    let Some(plan) = plan else {
        return;
    };

    // Hotkey-triggered toggles are never suppressed; the guard only covers
    // the double-click mode where fullscreen apps generate stray clicks.
    if plan.guard_fullscreen && fullscreen::foreground_is_fullscreen(plan.tolerance) {
        info!("foreground window is fullscreen, toggle suppressed");
        return;
    }

    if let Err(e) = desktop::toggle_icons() {
        error!(error = %e, "failed to toggle desktop icons");
        winutil::message_box(
            hwnd,
            "Failed to toggle desktop icons. Check that Explorer is running.",
            true,
        );
        return;
    }

    std::thread::sleep(SETTLE_DELAY);
    let visible = desktop::icons_visible().unwrap_or(true);
    let toast_text = status::toggle_toast_text(visible);
    APP.with(|slot| {
        if let Some(app) = slot.borrow_mut().as_mut() {
            app.icons_visible = visible;
            refresh_tray(app);
            if plan.toast {
                app.tray.balloon(&toast_text);
            }
        }
    });
}

fn handle_tray_event(hwnd: HWND, lparam: LPARAM) {
    match lparam.0 as u32 {
        WM_LBUTTONUP | WM_LBUTTONDBLCLK => handle_toggle_request(hwnd),
        WM_RBUTTONUP => {
            let view = APP.with(|slot| slot.borrow().as_ref().map(current_view));
            if let Some(view) = view {
                // The menu runs a modal loop; no state borrow may be live.
                tray::show_menu(hwnd, &view);
            }
        }
        _ => {}
    }
}

fn set_mode(hwnd: HWND, mode: Mode) {
    let warnings = APP.with(|slot| {
        slot.borrow_mut().as_mut().map(|app| {
            app.cfg.mode = mode;
            let mut warnings: Vec<String> = persist(app).into_iter().collect();
            let (mut applied, _) = apply_config(app, false);
            warnings.append(&mut applied);
            warnings
        })
    });
    for text in warnings.unwrap_or_default() {
        winutil::message_box(hwnd, &text, true);
    }
}

fn handle_command(hwnd: HWND, id: u16) {
    match id {
        tray::CMD_TOGGLE => handle_toggle_request(hwnd),
        tray::CMD_GUIDE => {
            show_guide_box(hwnd);
            APP.with(|slot| {
                if let Some(app) = slot.borrow_mut().as_mut() {
                    if app.cfg.show_first_run_guide {
                        app.cfg.show_first_run_guide = false;
                        let _ = persist(app);
                    }
                }
            });
        }
        tray::CMD_MODE_HOTKEY => set_mode(hwnd, Mode::Hotkey),
        tray::CMD_MODE_DOUBLE_CLICK => set_mode(hwnd, Mode::DesktopDoubleClick),
        tray::CMD_TOGGLE_TOAST => {
            let warnings = APP.with(|slot| {
                slot.borrow_mut().as_mut().map(|app| {
                    app.cfg.show_toggle_toast = !app.cfg.show_toggle_toast;
                    persist(app).into_iter().collect::<Vec<_>>()
                })
            });
            for text in warnings.unwrap_or_default() {
                winutil::message_box(hwnd, &text, true);
            }
        }
        tray::CMD_AUTOSTART => {
            let desired = APP.with(|slot| {
                slot.borrow().as_ref().map(|app| !app.cfg.auto_start)
            });
            let Some(desired) = desired else { return };
            match autostart::set_enabled(desired) {
                Ok(()) => {
                    APP.with(|slot| {
                        if let Some(app) = slot.borrow_mut().as_mut() {
                            app.cfg.auto_start = desired;
                            let _ = persist(app);
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "autostart change failed");
                    winutil::message_box(hwnd, &format!("Failed to update autostart: {e}"), true);
                }
            }
        }
        tray::CMD_UPDATE => {
            let known = APP.with(|slot| {
                slot.borrow()
                    .as_ref()
                    .and_then(|app| app.update.lock().clone())
            });
            if let Some(info) = known {
                if let Err(e) = open::that(&info.url) {
                    warn!(error = %e, url = %info.url, "failed to open release page");
                }
                return;
            }
            APP.with(|slot| {
                if let Some(app) = slot.borrow_mut().as_mut() {
                    app.cfg.check_updates = !app.cfg.check_updates;
                    let _ = persist(app);
                    if app.cfg.check_updates {
                        start_update_check(app);
                    }
                }
            });
        }
        tray::CMD_RESET => {
            if !winutil::confirm(hwnd, "Restore all settings to their defaults?") {
                return;
            }
            let warnings = APP.with(|slot| {
                slot.borrow_mut().as_mut().map(|app| {
                    app.cfg = Config::default();
                    let mut warnings: Vec<String> = persist(app).into_iter().collect();
                    let (mut applied, _) = apply_config(app, false);
                    warnings.append(&mut applied);
                    warnings
                })
            });
            for text in warnings.unwrap_or_default() {
                winutil::message_box(hwnd, &text, true);
            }
            winutil::message_box(hwnd, "Default settings restored.", false);
        }
        tray::CMD_OPEN_CONFIG => {
            let cfg = APP.with(|slot| slot.borrow().as_ref().map(|app| app.cfg.clone()));
            let Some(cfg) = cfg else { return };
            match crate::config::config_path() {
                Ok(path) => {
                    if !path.exists() {
                        if let Err(e) = cfg.save_to(&path) {
                            warn!(error = %e, "failed to write config before opening");
                        }
                    }
                    if let Err(e) = open::that(&path) {
                        warn!(error = %e, "failed to open config file");
                    }
                }
                Err(e) => warn!(error = %e, "config path unavailable"),
            }
        }
        tray::CMD_EXIT => unsafe {
            let _ = DestroyWindow(hwnd);
        },
        _ => {}
    }
}

fn handle_update_ready() {
    APP.with(|slot| {
        if let Some(app) = slot.borrow().as_ref() {
            let found = app.update.lock().clone();
            if let Some(info) = found {
                if app.cfg.show_toggle_toast {
                    app.tray.balloon(&format!("New version {} available", info.tag));
                }
            }
        }
    });
}

fn handle_activate() {
    APP.with(|slot| {
        if let Some(app) = slot.borrow().as_ref() {
            info!("second launch detected, announcing presence");
            app.tray.balloon(&format!("{APP_NAME} is already running"));
        }
    });
}

fn teardown() {
    APP.with(|slot| {
        if let Some(app) = slot.borrow_mut().as_mut() {
            app.tray.remove();
            app.mode.shutdown();
        }
    });
}

enum Routed {
    Toggle,
    Exit,
    Activate,
    TaskbarCreated,
}

extern "system" fn wndproc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    match msg {
        WM_CREATE => {
            bootstrap(hwnd);
            LRESULT(0)
        }
        WM_DESTROY => {
            teardown();
            unsafe { PostQuitMessage(0) };
            LRESULT(0)
        }
        WM_COMMAND => {
            handle_command(hwnd, (wparam.0 & 0xFFFF) as u16);
            LRESULT(0)
        }
        WM_HOTKEY => {
            handle_toggle_request(hwnd);
            LRESULT(0)
        }
        WM_TOGGLE_REQUEST => {
            handle_toggle_request(hwnd);
            LRESULT(0)
        }
        WM_UPDATE_READY => {
            handle_update_ready();
            LRESULT(0)
        }
        tray::TRAY_CALLBACK => {
            handle_tray_event(hwnd, lparam);
            LRESULT(0)
        }
        other => {
            let routed = APP.with(|slot| {
                slot.borrow().as_ref().and_then(|app| {
                    if other == app.msg_toggle {
                        Some(Routed::Toggle)
                    } else if other == app.msg_exit {
                        Some(Routed::Exit)
                    } else if other == app.msg_activate {
                        Some(Routed::Activate)
                    } else if other == app.taskbar_created_msg {
                        Some(Routed::TaskbarCreated)
                    } else {
                        None
                    }
                })
            });
            match routed {
                Some(Routed::Toggle) => {
                    handle_toggle_request(hwnd);
                    LRESULT(0)
                }
                Some(Routed::Exit) => {
                    unsafe {
                        let _ = DestroyWindow(hwnd);
                    }
                    LRESULT(0)
                }
                Some(Routed::Activate) => {
                    handle_activate();
                    LRESULT(0)
                }
                Some(Routed::TaskbarCreated) => {
                    APP.with(|slot| {
                        if let Some(app) = slot.borrow_mut().as_mut() {
                            if app.cfg.show_tray_icon {
                                let tooltip = current_view(app).tooltip;
                                if let Err(e) = app.tray.re_add(&tooltip) {
                                    warn!(error = %e, "failed to re-add tray icon");
                                }
                            }
                        }
                    });
                    LRESULT(0)
                }
                None => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
            }
        }
    }
}
