//! Tray status projection.
//!
//! Pure mapping from (config, last observed visibility, update info) to the
//! strings and check flags the tray renders. Keeping this side-effect free
//! means the menu state can never drift from the domain state it mirrors.

use crate::config::Config;
use crate::updater::UpdateInfo;
use crate::APP_NAME;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    pub tooltip: String,
    pub hotkey_mode_checked: bool,
    pub double_click_mode_checked: bool,
    pub toast_checked: bool,
    pub autostart_checked: bool,
    /// The update menu item doubles as the "checks enabled" toggle until a
    /// release is known, at which point it becomes a download action.
    pub update_checks_checked: bool,
    pub update_label: String,
}

pub fn project(cfg: &Config, icons_visible: bool, update: Option<&UpdateInfo>) -> StatusView {
    use crate::config::Mode;

    let state = if icons_visible { "shown" } else { "hidden" };
    StatusView {
        tooltip: format!("{APP_NAME} - icons {state}"),
        hotkey_mode_checked: cfg.mode == Mode::Hotkey,
        double_click_mode_checked: cfg.mode == Mode::DesktopDoubleClick,
        toast_checked: cfg.show_toggle_toast,
        autostart_checked: cfg.auto_start,
        update_checks_checked: cfg.check_updates && update.is_none(),
        update_label: match update {
            Some(info) => format!("Download version {}", info.tag),
            None if cfg.check_updates => "Check for updates".to_string(),
            None => "Enable update checks".to_string(),
        },
    }
}

/// Body of the toggle toast balloon.
pub fn toggle_toast_text(icons_visible: bool) -> String {
    if icons_visible {
        "Desktop icons are now shown".to_string()
    } else {
        "Desktop icons are now hidden".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;

    #[test]
    fn tooltip_tracks_visibility() {
        let cfg = Config::default();
        assert_eq!(project(&cfg, true, None).tooltip, "Desk Toggle - icons shown");
        assert_eq!(project(&cfg, false, None).tooltip, "Desk Toggle - icons hidden");
    }

    #[test]
    fn mode_checks_are_mutually_exclusive() {
        let mut cfg = Config::default();
        let view = project(&cfg, true, None);
        assert!(view.hotkey_mode_checked);
        assert!(!view.double_click_mode_checked);

        cfg.mode = Mode::DesktopDoubleClick;
        let view = project(&cfg, true, None);
        assert!(!view.hotkey_mode_checked);
        assert!(view.double_click_mode_checked);
    }

    #[test]
    fn flag_checks_mirror_config() {
        let mut cfg = Config::default();
        cfg.show_toggle_toast = false;
        cfg.auto_start = true;
        let view = project(&cfg, true, None);
        assert!(!view.toast_checked);
        assert!(view.autostart_checked);
    }

    #[test]
    fn update_label_states() {
        let mut cfg = Config::default();
        let view = project(&cfg, true, None);
        assert_eq!(view.update_label, "Check for updates");
        assert!(view.update_checks_checked);

        cfg.check_updates = false;
        let view = project(&cfg, true, None);
        assert_eq!(view.update_label, "Enable update checks");
        assert!(!view.update_checks_checked);

        cfg.check_updates = true;
        let info = UpdateInfo {
            tag: "v1.4.0".into(),
            url: "https://example.invalid/releases/v1.4.0".into(),
        };
        let view = project(&cfg, true, Some(&info));
        assert_eq!(view.update_label, "Download version v1.4.0");
        // A known release turns the item into a download action.
        assert!(!view.update_checks_checked);
    }

    #[test]
    fn toast_text() {
        assert_eq!(toggle_toast_text(false), "Desktop icons are now hidden");
        assert_eq!(toggle_toast_text(true), "Desktop icons are now shown");
    }
}
