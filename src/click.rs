//! Double-click-on-blank-desktop classification.
//!
//! The low-level mouse hook feeds every left-button-down through
//! [`ClickClassifier::observe`]. The classifier keeps exactly one sample of
//! memory, the previous click, and decides whether the current click (a)
//! completes a double click under the OS thresholds and (b) landed on blank
//! desktop space. Window lookups go through the [`WindowProbe`] trait so the
//! decision logic is testable without a desktop session.

/// OS double-click thresholds: maximum elapsed time and axis-wise distance.
#[derive(Debug, Clone, Copy)]
pub struct DoubleClickLimits {
    pub max_interval_ms: u64,
    pub max_dx: i32,
    pub max_dy: i32,
}

/// The most recent left-button-down. `window` is a raw handle value; zero
/// means the click hit no window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickSample {
    pub time_ms: u64,
    pub x: i32,
    pub y: i32,
    pub window: isize,
}

/// Window hierarchy queries needed to classify a click target.
///
/// Every method returns `None` when the underlying OS query fails; the
/// classifier treats any failure as "not blank desktop" so a broken query can
/// never produce a spurious toggle.
pub trait WindowProbe {
    fn class_name(&self, window: isize) -> Option<String>;
    fn parent(&self, window: isize) -> Option<isize>;
    /// For an icon list-view: does the point (screen coordinates) hit an icon?
    fn icon_at(&self, window: isize, x: i32, y: i32) -> Option<bool>;
}

pub struct ClickClassifier {
    limits: DoubleClickLimits,
    last: Option<ClickSample>,
}

impl ClickClassifier {
    pub fn new(limits: DoubleClickLimits) -> Self {
        Self { limits, last: None }
    }

    /// Feed one left-button-down; returns true when it is the second click of
    /// a double click on blank desktop space.
    ///
    /// The sample unconditionally becomes the new "previous click", so a
    /// triple click is evaluated as two overlapping pairs.
    pub fn observe(&mut self, sample: ClickSample, probe: &dyn WindowProbe) -> bool {
        let fired = self.is_double_click(&sample)
            && is_desktop_blank(probe, sample.window, sample.x, sample.y);
        self.last = Some(sample);
        fired
    }

    fn is_double_click(&self, next: &ClickSample) -> bool {
        let Some(prev) = &self.last else {
            return false;
        };
        if prev.window == 0 || prev.window != next.window {
            return false;
        }
        next.time_ms.saturating_sub(prev.time_ms) <= self.limits.max_interval_ms
            && (next.x - prev.x).abs() <= self.limits.max_dx
            && (next.y - prev.y).abs() <= self.limits.max_dy
    }
}

/// Walk the ownership chain upward from `window` to decide whether the point
/// is blank desktop space.
///
/// `SysListView32` (the icon list) is blank only where the hit test reports
/// no icon; `WorkerW` and `Progman` (the desktop host containers) are blank
/// everywhere; anything else defers to its parent. No parent, or any failed
/// query, means "not blank".
pub fn is_desktop_blank(probe: &dyn WindowProbe, window: isize, x: i32, y: i32) -> bool {
    let mut current = window;
    loop {
        if current == 0 {
            return false;
        }
        let Some(class) = probe.class_name(current) else {
            return false;
        };
        match class.as_str() {
            "SysListView32" => return probe.icon_at(current, x, y) == Some(false),
            "WorkerW" | "Progman" => return true,
            _ => match probe.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const LIMITS: DoubleClickLimits = DoubleClickLimits {
        max_interval_ms: 500,
        max_dx: 4,
        max_dy: 4,
    };

    struct FakeProbe {
        classes: HashMap<isize, &'static str>,
        parents: HashMap<isize, isize>,
        icon_hits: HashMap<isize, bool>,
    }

    impl FakeProbe {
        fn new() -> Self {
            Self {
                classes: HashMap::new(),
                parents: HashMap::new(),
                icon_hits: HashMap::new(),
            }
        }

        fn window(mut self, handle: isize, class: &'static str) -> Self {
            self.classes.insert(handle, class);
            self
        }

        fn child_of(mut self, child: isize, parent: isize) -> Self {
            self.parents.insert(child, parent);
            self
        }

        fn icon_hit(mut self, handle: isize, hit: bool) -> Self {
            self.icon_hits.insert(handle, hit);
            self
        }
    }

    impl WindowProbe for FakeProbe {
        fn class_name(&self, window: isize) -> Option<String> {
            self.classes.get(&window).map(|c| c.to_string())
        }

        fn parent(&self, window: isize) -> Option<isize> {
            self.parents.get(&window).copied()
        }

        fn icon_at(&self, window: isize, _x: i32, _y: i32) -> Option<bool> {
            self.icon_hits.get(&window).copied()
        }
    }

    fn sample(time_ms: u64, x: i32, y: i32, window: isize) -> ClickSample {
        ClickSample {
            time_ms,
            x,
            y,
            window,
        }
    }

    fn desktop_probe() -> FakeProbe {
        FakeProbe::new().window(10, "Progman")
    }

    #[test]
    fn pair_within_thresholds_fires() {
        let mut classifier = ClickClassifier::new(LIMITS);
        let probe = desktop_probe();
        assert!(!classifier.observe(sample(0, 100, 100, 10), &probe));
        assert!(classifier.observe(sample(400, 102, 99, 10), &probe));
    }

    #[test]
    fn slow_pair_does_not_fire() {
        let mut classifier = ClickClassifier::new(LIMITS);
        let probe = desktop_probe();
        assert!(!classifier.observe(sample(0, 100, 100, 10), &probe));
        assert!(!classifier.observe(sample(501, 100, 100, 10), &probe));
    }

    #[test]
    fn distant_pair_does_not_fire() {
        let mut classifier = ClickClassifier::new(LIMITS);
        let probe = desktop_probe();
        assert!(!classifier.observe(sample(0, 100, 100, 10), &probe));
        // One axis out of range is enough.
        assert!(!classifier.observe(sample(100, 105, 100, 10), &probe));
        assert!(!classifier.observe(sample(200, 105, 106, 10), &probe));
    }

    #[test]
    fn different_windows_do_not_pair() {
        let probe = FakeProbe::new().window(10, "Progman").window(11, "Progman");
        let mut classifier = ClickClassifier::new(LIMITS);
        assert!(!classifier.observe(sample(0, 100, 100, 10), &probe));
        assert!(!classifier.observe(sample(100, 100, 100, 11), &probe));
    }

    #[test]
    fn null_window_never_pairs() {
        let mut classifier = ClickClassifier::new(LIMITS);
        let probe = desktop_probe();
        assert!(!classifier.observe(sample(0, 100, 100, 0), &probe));
        assert!(!classifier.observe(sample(100, 100, 100, 0), &probe));
    }

    #[test]
    fn each_click_replaces_the_sample() {
        let mut classifier = ClickClassifier::new(LIMITS);
        let probe = desktop_probe();
        assert!(!classifier.observe(sample(0, 0, 0, 10), &probe));
        // Second click is too far to pair with the first, but primes a new
        // sample that the third click pairs with.
        assert!(!classifier.observe(sample(100, 50, 50, 10), &probe));
        assert!(classifier.observe(sample(200, 51, 50, 10), &probe));
    }

    #[test]
    fn host_containers_are_blank_everywhere() {
        let probe = FakeProbe::new().window(1, "WorkerW").window(2, "Progman");
        assert!(is_desktop_blank(&probe, 1, 0, 0));
        assert!(is_desktop_blank(&probe, 2, 9999, 9999));
    }

    #[test]
    fn icon_list_is_blank_only_off_icons() {
        let on_icon = FakeProbe::new()
            .window(5, "SysListView32")
            .icon_hit(5, true);
        assert!(!is_desktop_blank(&on_icon, 5, 10, 10));

        let off_icon = FakeProbe::new()
            .window(5, "SysListView32")
            .icon_hit(5, false);
        assert!(is_desktop_blank(&off_icon, 5, 10, 10));
    }

    #[test]
    fn walks_up_to_a_desktop_host() {
        let probe = FakeProbe::new()
            .window(7, "SHELLDLL_DefView")
            .window(8, "WorkerW")
            .child_of(7, 8);
        assert!(is_desktop_blank(&probe, 7, 0, 0));
    }

    #[test]
    fn unrelated_window_without_parent_is_not_blank() {
        let probe = FakeProbe::new().window(9, "Chrome_WidgetWin_1");
        assert!(!is_desktop_blank(&probe, 9, 0, 0));
    }

    #[test]
    fn failed_queries_fail_safe() {
        // Unknown handle: class lookup fails entirely.
        let probe = FakeProbe::new();
        assert!(!is_desktop_blank(&probe, 42, 0, 0));

        // Hit test fails on the icon list.
        let probe = FakeProbe::new().window(5, "SysListView32");
        assert!(!is_desktop_blank(&probe, 5, 0, 0));
    }

    #[test]
    fn double_click_on_app_window_does_not_fire() {
        let probe = FakeProbe::new().window(9, "Notepad");
        let mut classifier = ClickClassifier::new(LIMITS);
        assert!(!classifier.observe(sample(0, 10, 10, 9), &probe));
        assert!(!classifier.observe(sample(50, 10, 10, 9), &probe));
    }
}
