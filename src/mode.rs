//! Detection-mode state machine.
//!
//! Exactly one toggle-detection mechanism is live at a time: the global
//! hotkey, or the desktop double-click mouse hook. The controller tears the
//! outgoing mechanism down completely before standing the incoming one up,
//! so there is never a window where both could fire. The mechanisms
//! themselves sit behind [`Detection`], which keeps the transition logic
//! testable without touching the hotkey table or the hook chain.

use crate::config::Mode;
use crate::error::OsError;
use crate::hotkey::HotkeyBinding;
use tracing::{debug, info};

/// The two arm/disarm-able detection mechanisms.
///
/// `arm_hotkey` must be idempotent (replace any registration it already
/// holds); `disarm_*` on an inactive mechanism must be a no-op.
pub trait Detection {
    fn arm_hotkey(&mut self, binding: &HotkeyBinding) -> Result<(), OsError>;
    fn disarm_hotkey(&mut self);
    fn arm_double_click(&mut self) -> Result<(), OsError>;
    fn disarm_double_click(&mut self);
}

pub struct ModeController<D: Detection> {
    detection: D,
    /// None until the first `apply`; nothing is armed before that.
    current: Option<Mode>,
}

impl<D: Detection> ModeController<D> {
    pub fn new(detection: D) -> Self {
        Self {
            detection,
            current: None,
        }
    }

    pub fn mode(&self) -> Option<Mode> {
        self.current
    }

    /// Switch to `target`, re-arming as needed.
    ///
    /// Re-applying the current mode re-registers the hotkey (the shortcut
    /// string may have changed) and leaves a running hook untouched. An arm
    /// failure is returned for reporting but never rolls the mode back: a
    /// hotkey conflict leaves the app running with no active hotkey, and
    /// never blocks hook activation in the other mode.
    pub fn apply(&mut self, target: Mode, binding: &HotkeyBinding) -> Result<(), OsError> {
        if self.current == Some(target) {
            return match target {
                Mode::Hotkey => self.detection.arm_hotkey(binding),
                Mode::DesktopDoubleClick => Ok(()),
            };
        }

        match self.current {
            Some(Mode::Hotkey) => self.detection.disarm_hotkey(),
            Some(Mode::DesktopDoubleClick) => self.detection.disarm_double_click(),
            None => {}
        }

        info!(mode = ?target, "switching detection mode");
        self.current = Some(target);
        match target {
            Mode::Hotkey => self.detection.arm_hotkey(binding),
            Mode::DesktopDoubleClick => self.detection.arm_double_click(),
        }
    }

    /// Disarm everything; used on shutdown.
    pub fn shutdown(&mut self) {
        debug!("disarming detection mechanisms");
        self.detection.disarm_hotkey();
        self.detection.disarm_double_click();
        self.current = None;
    }

    pub fn detection(&self) -> &D {
        &self.detection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotkey;

    #[derive(Default)]
    struct FakeDetection {
        hotkey_armed: bool,
        hook_armed: bool,
        hotkey_arms: u32,
        hook_arms: u32,
        hotkey_fails: bool,
        last_binding: Option<String>,
    }

    impl Detection for FakeDetection {
        fn arm_hotkey(&mut self, binding: &HotkeyBinding) -> Result<(), OsError> {
            self.hotkey_arms += 1;
            self.last_binding = Some(binding.raw.clone());
            if self.hotkey_fails {
                return Err(OsError::new("RegisterHotKey", 1409));
            }
            self.hotkey_armed = true;
            Ok(())
        }

        fn disarm_hotkey(&mut self) {
            self.hotkey_armed = false;
        }

        fn arm_double_click(&mut self) -> Result<(), OsError> {
            self.hook_arms += 1;
            self.hook_armed = true;
            Ok(())
        }

        fn disarm_double_click(&mut self) {
            self.hook_armed = false;
        }
    }

    fn binding(text: &str) -> HotkeyBinding {
        hotkey::parse(text).unwrap()
    }

    #[test]
    fn first_apply_arms_only_the_target_mechanism() {
        let mut ctl = ModeController::new(FakeDetection::default());
        ctl.apply(Mode::Hotkey, &binding("Ctrl+Alt+F1")).unwrap();
        assert!(ctl.detection().hotkey_armed);
        assert!(!ctl.detection().hook_armed);
        assert_eq!(ctl.mode(), Some(Mode::Hotkey));
    }

    #[test]
    fn switching_is_exclusive_both_directions() {
        let mut ctl = ModeController::new(FakeDetection::default());
        let b = binding("Ctrl+Alt+F1");

        ctl.apply(Mode::DesktopDoubleClick, &b).unwrap();
        assert!(!ctl.detection().hotkey_armed);
        assert!(ctl.detection().hook_armed);

        ctl.apply(Mode::Hotkey, &b).unwrap();
        assert!(ctl.detection().hotkey_armed);
        assert!(!ctl.detection().hook_armed);
    }

    #[test]
    fn reapplying_double_click_leaves_hook_untouched() {
        let mut ctl = ModeController::new(FakeDetection::default());
        let b = binding("Ctrl+Alt+F1");
        ctl.apply(Mode::DesktopDoubleClick, &b).unwrap();
        ctl.apply(Mode::DesktopDoubleClick, &b).unwrap();
        assert_eq!(ctl.detection().hook_arms, 1);
        assert_eq!(ctl.detection().hotkey_arms, 0);
    }

    #[test]
    fn reapplying_hotkey_mode_reregisters_new_binding() {
        let mut ctl = ModeController::new(FakeDetection::default());
        ctl.apply(Mode::Hotkey, &binding("Ctrl+Alt+F1")).unwrap();
        ctl.apply(Mode::Hotkey, &binding("Win+D")).unwrap();
        assert_eq!(ctl.detection().hotkey_arms, 2);
        assert_eq!(ctl.detection().last_binding.as_deref(), Some("Win+D"));
        assert_eq!(ctl.detection().hook_arms, 0);
    }

    #[test]
    fn hotkey_failure_keeps_mode_and_reports() {
        let mut ctl = ModeController::new(FakeDetection {
            hotkey_fails: true,
            ..Default::default()
        });
        let err = ctl.apply(Mode::Hotkey, &binding("Ctrl+Alt+F1")).unwrap_err();
        assert_eq!(err.op, "RegisterHotKey");
        assert_eq!(ctl.mode(), Some(Mode::Hotkey));
        assert!(!ctl.detection().hotkey_armed);

        // The failed hotkey never blocks switching into double-click mode.
        ctl.apply(Mode::DesktopDoubleClick, &binding("Ctrl+Alt+F1"))
            .unwrap();
        assert!(ctl.detection().hook_armed);
    }

    #[test]
    fn shutdown_disarms_everything() {
        let mut ctl = ModeController::new(FakeDetection::default());
        ctl.apply(Mode::DesktopDoubleClick, &binding("Ctrl+Alt+F1"))
            .unwrap();
        ctl.shutdown();
        assert!(!ctl.detection().hotkey_armed);
        assert!(!ctl.detection().hook_armed);
        assert_eq!(ctl.mode(), None);
    }
}
