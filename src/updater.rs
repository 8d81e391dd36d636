//! Background release check.
//!
//! One daemon worker at a time fetches the latest release metadata and hands
//! the result to the main thread through an atomically replaced slot plus a
//! caller-supplied notification. The worker never touches application state,
//! is never joined, and a timeout or malformed response is an ordinary "no
//! update" outcome.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const RELEASES_URL: &str = "https://api.github.com/repos/desk-toggle/desk-toggle/releases/latest";
const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInfo {
    pub tag: String,
    pub url: String,
}

/// Last known release, shared between the worker and the main thread.
pub type UpdateSlot = Arc<Mutex<Option<UpdateInfo>>>;

pub fn new_slot() -> UpdateSlot {
    Arc::new(Mutex::new(None))
}

static CHECK_IN_FLIGHT: AtomicBool = AtomicBool::new(false);

/// Start a release check unless one is already running.
///
/// `notify` runs on the worker thread after a release newer than the slot's
/// content was stored; it should only post a message back to the main loop.
pub fn spawn_check(slot: UpdateSlot, notify: impl Fn() + Send + 'static) {
    if CHECK_IN_FLIGHT
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return;
    }
    std::thread::spawn(move || {
        match fetch_latest() {
            Ok(Some(found)) => {
                let fresh = {
                    let mut slot = slot.lock();
                    let fresh = slot.as_ref().map_or(true, |known| known.tag != found.tag);
                    if fresh {
                        info!(tag = %found.tag, "new release found");
                        *slot = Some(found);
                    }
                    fresh
                };
                if fresh {
                    notify();
                }
            }
            Ok(None) => info!("release feed had no usable version info"),
            Err(e) => warn!(error = %e, "release check failed"),
        }
        CHECK_IN_FLIGHT.store(false, Ordering::SeqCst);
    });
}

fn fetch_latest() -> anyhow::Result<Option<UpdateInfo>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(CHECK_TIMEOUT)
        .user_agent(concat!("desk_toggle/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let body = client.get(RELEASES_URL).send()?.error_for_status()?.text()?;
    Ok(parse_release(&body))
}

/// Pull `tag_name` and `html_url` out of a release document; anything less
/// counts as no update.
pub fn parse_release(body: &str) -> Option<UpdateInfo> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let tag = value.get("tag_name")?.as_str()?;
    let url = value.get("html_url")?.as_str()?;
    if tag.is_empty() || url.is_empty() {
        return None;
    }
    Some(UpdateInfo {
        tag: tag.to_string(),
        url: url.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_complete_release() {
        let body = r#"{"tag_name":"v2.1.0","html_url":"https://example.invalid/r/v2.1.0","name":"ignored"}"#;
        let info = parse_release(body).unwrap();
        assert_eq!(info.tag, "v2.1.0");
        assert_eq!(info.url, "https://example.invalid/r/v2.1.0");
    }

    #[test]
    fn incomplete_or_malformed_release_is_none() {
        assert_eq!(parse_release(r#"{"tag_name":"v2.1.0"}"#), None);
        assert_eq!(parse_release(r#"{"html_url":"https://x"}"#), None);
        assert_eq!(parse_release(r#"{"tag_name":"","html_url":""}"#), None);
        assert_eq!(parse_release("not json"), None);
        assert_eq!(parse_release(r#"["array"]"#), None);
    }

    #[test]
    fn slot_replacement_is_observable() {
        let slot = new_slot();
        *slot.lock() = Some(UpdateInfo {
            tag: "v1".into(),
            url: "u".into(),
        });
        assert_eq!(slot.lock().as_ref().unwrap().tag, "v1");
    }
}
