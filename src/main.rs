#![windows_subsystem = "windows"]

use std::process::ExitCode;

#[cfg(windows)]
fn main() -> ExitCode {
    use desk_toggle::{app, config, instance, logging, winutil, APP_NAME};
    use tracing::{error, info};
    use windows::Win32::Foundation::HWND;

    let mut args = std::env::args().skip(1);
    if let Some(command) = args.next() {
        return match command.as_str() {
            "toggle" => send_command(instance::Command::Toggle),
            "exit" => send_command(instance::Command::Exit),
            other => {
                winutil::message_box(
                    HWND::default(),
                    &format!("Unknown command `{other}`.\nUsage: desk_toggle [toggle|exit]"),
                    true,
                );
                ExitCode::from(2)
            }
        };
    }

    // Keep the guard alive so buffered log lines flush on exit.
    let _log_guard = config::data_dir().ok().map(|dir| logging::init(&dir));

    let lock = match instance::acquire() {
        Ok(Some(lock)) => lock,
        Ok(None) => {
            // Expected hand-off path, not an error: tell the running
            // instance to announce itself and bow out.
            info!("another instance is already running, forwarding activation");
            instance::notify_running(instance::Command::Activate);
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            error!(error = %e, "failed to create the single-instance mutex");
            winutil::message_box(HWND::default(), &format!("{APP_NAME} failed to start: {e}"), true);
            return ExitCode::FAILURE;
        }
    };

    let result = app::run();
    drop(lock);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "coordinator exited with an error");
            winutil::message_box(HWND::default(), &format!("{APP_NAME} failed to start: {e}"), true);
            ExitCode::FAILURE
        }
    }
}

/// Forward `cmd` to a running instance: exit 0 when one was found, 1 when
/// not (delivery itself is fire-and-forget).
#[cfg(windows)]
fn send_command(cmd: desk_toggle::instance::Command) -> ExitCode {
    use desk_toggle::{instance, winutil, APP_NAME};
    use windows::Win32::Foundation::HWND;

    if instance::notify_running(cmd) {
        ExitCode::SUCCESS
    } else {
        winutil::message_box(
            HWND::default(),
            &format!("{APP_NAME} is not running, nothing to signal."),
            true,
        );
        ExitCode::from(1)
    }
}

#[cfg(not(windows))]
fn main() -> ExitCode {
    eprintln!("desk_toggle only runs on Windows.");
    ExitCode::FAILURE
}
